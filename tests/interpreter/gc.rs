//! Garbage collection tests: environment records reclaimed by the collector

use ecma_eval::{JsValue, Runtime, RuntimeConfig};

/// Live environments of a fresh runtime after a collection
fn baseline() -> usize {
    let mut runtime = Runtime::new();
    runtime.collect_garbage();
    runtime.live_environments()
}

/// Evaluate with automatic collection effectively disabled, then collect
fn eval_then_collect(source: &str) -> (Runtime, JsValue) {
    let mut runtime = Runtime::with_config(RuntimeConfig::default().with_gc_threshold(usize::MAX));
    let value = runtime.eval(source).unwrap();
    runtime.collect_garbage();
    (runtime, value)
}

#[test]
fn test_baseline_is_small() {
    let base = baseline();
    assert!(base >= 1, "the global environment is always live");
    assert!(base < 8, "baseline should be bounded, got {}", base);
}

#[test]
fn test_call_environments_reclaimed() {
    let (runtime, value) = eval_then_collect(
        r#"
        function square(n) { const result = n * n; return result; }
        let sum = 0;
        for (let i = 0; i < 200; i++) { sum += square(i); }
        sum
    "#,
    );
    assert_eq!(value, JsValue::Number(2_646_700.0));
    assert_eq!(runtime.live_environments(), baseline());
}

#[test]
fn test_self_referencing_closures_reclaimed() {
    let mut runtime = Runtime::with_config(RuntimeConfig::default().with_gc_threshold(usize::MAX));
    runtime
        .eval(
            r#"
            for (let i = 0; i < 100; i++) {
                (function () {
                    var self = function () { return self; };
                })();
            }
        "#,
        )
        .unwrap();
    let before = runtime.live_environments();
    let stats = runtime.collect_garbage();
    assert!(stats.collected >= 100, "collected only {}", stats.collected);
    assert_eq!(stats.live, before - stats.collected);
    assert_eq!(runtime.live_environments(), baseline());
}

#[test]
fn test_object_closure_cycles_reclaimed() {
    let (runtime, _) = eval_then_collect(
        r#"
        for (let i = 0; i < 50; i++) {
            const node = { id: i };
            node.describe = () => 'node ' + node.id;
            node.peer = { back: node };
        }
        'done';
    "#,
    );
    assert_eq!(runtime.live_environments(), baseline());
}

#[test]
fn test_class_cycles_reclaimed() {
    let (runtime, _) = eval_then_collect(
        r#"
        function makeClass(tag) {
            return class Tagged {
                #tag = tag;
                static create() { return new Tagged(); }
                get tag() { return this.#tag; }
            };
        }
        for (let i = 0; i < 30; i++) { makeClass(i).create().tag; }
    "#,
    );
    assert_eq!(runtime.live_environments(), baseline());
}

#[test]
fn test_reachable_state_preserved() {
    let (mut runtime, _) = eval_then_collect(
        r#"
        function makeStack() {
            const items = [];
            return {
                push(x) { items.push(x); return items.length; },
                pop() { return items.pop(); }
            };
        }
        var stack = makeStack();
        stack.push('a');
        stack.push('b');
        for (let i = 0; i < 20; i++) { makeStack().push(i); }
    "#,
    );
    runtime.collect_garbage();
    assert_eq!(runtime.eval("stack.pop() + stack.pop()").unwrap(), JsValue::from("ba"));
}

#[test]
fn test_closure_reachable_through_array_survives() {
    let (mut runtime, _) = eval_then_collect(
        r#"
        var handlers = [];
        for (let i = 0; i < 3; i++) { handlers.push(() => i * 10); }
    "#,
    );
    assert_eq!(
        runtime.eval("handlers.map(h => h()).join()").unwrap(),
        JsValue::from("0,10,20")
    );
}

#[test]
fn test_host_held_function_keeps_environment() {
    let mut runtime = Runtime::with_config(RuntimeConfig::default().with_gc_threshold(1));
    let counter = runtime
        .eval("(function () { let n = 0; return function () { return ++n; }; })()")
        .unwrap();
    for _ in 0..3 {
        runtime.eval("for (let i = 0; i < 5; i++) { (() => i)(); }").unwrap();
    }
    runtime.call(&counter, JsValue::Undefined, &[]).unwrap();
    runtime.collect_garbage();
    assert_eq!(runtime.call(&counter, JsValue::Undefined, &[]).unwrap(), JsValue::Number(2.0));
}

#[test]
fn test_dropped_host_function_is_reclaimed() {
    let mut runtime = Runtime::with_config(RuntimeConfig::default().with_gc_threshold(usize::MAX));
    let held = runtime
        .eval("(function () { let n = 0; const f = function () { return n; }; f.self = f; return f; })()")
        .unwrap();
    runtime.collect_garbage();
    let with_held = runtime.live_environments();
    assert!(with_held > baseline());

    drop(held);
    let stats = runtime.collect_garbage();
    assert!(stats.collected > 0);
    assert_eq!(runtime.live_environments(), baseline());
}

#[test]
fn test_automatic_collection_bounds_growth() {
    let mut runtime = Runtime::with_config(RuntimeConfig::default().with_gc_threshold(16));
    for _ in 0..20 {
        runtime
            .eval("for (let i = 0; i < 10; i++) { (function () { var f = function () { return f; }; })(); }")
            .unwrap();
    }
    assert!(
        runtime.live_environments() <= 16,
        "live environments grew to {}",
        runtime.live_environments()
    );
}

#[test]
fn test_no_collection_below_threshold() {
    let mut runtime = Runtime::with_config(RuntimeConfig::default().with_gc_threshold(usize::MAX));
    runtime.eval("for (let i = 0; i < 10; i++) { (() => i)(); }").unwrap();
    assert_eq!(runtime.interpreter().last_gc_stats().collected, 0);
    assert!(runtime.live_environments() > baseline());
}

#[test]
fn test_gc_stats_serialize() {
    let mut runtime = Runtime::new();
    let stats = runtime.collect_garbage();
    let json = serde_json::to_value(stats).unwrap();
    assert_eq!(json["live"], serde_json::json!(stats.live));
    assert_eq!(json["collected"], serde_json::json!(0));
}
