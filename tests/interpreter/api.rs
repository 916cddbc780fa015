//! Embedding API tests: Runtime entry points, globals, host functions and
//! JSON conversion

use super::create_test_runtime;
use ecma_eval::{CheapClone, Interpreter, JsError, JsValue, Runtime, RuntimeConfig};
use pretty_assertions::assert_eq;
use serde_json::json;

// ═══════════════════════════════════════════════════════════════════════════
// JsValue helpers
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_value_predicates() {
    let mut runtime = create_test_runtime();
    let func = runtime.eval("(function () {})").unwrap();
    let arrow = runtime.eval("(() => {})").unwrap();
    let object = runtime.eval("({})").unwrap();

    assert!(func.is_callable());
    assert!(func.is_constructor());
    assert!(arrow.is_callable());
    assert!(!arrow.is_constructor());
    assert!(object.is_object());
    assert!(!object.is_callable());
    assert!(JsValue::Null.is_nullish());
    assert!(JsValue::Undefined.is_undefined());
    assert!(!JsValue::Number(0.0).is_nullish());
}

#[test]
fn test_value_type_of() {
    let mut runtime = create_test_runtime();
    let cases = [
        ("undefined", "undefined"),
        ("null", "object"),
        ("true", "boolean"),
        ("1", "number"),
        ("1n", "bigint"),
        ("'s'", "string"),
        ("Symbol()", "symbol"),
        ("[]", "object"),
        ("Math.max", "function"),
        ("(class {})", "function"),
    ];
    for (source, expected) in cases {
        assert_eq!(runtime.eval(source).unwrap().type_of(), expected, "typeof {}", source);
    }
}

#[test]
fn test_value_equality_is_strict_equality() {
    assert_eq!(JsValue::Number(0.0), JsValue::Number(-0.0));
    assert!(JsValue::Number(f64::NAN) != JsValue::Number(f64::NAN));
    assert!(JsValue::Number(f64::NAN).same_value(&JsValue::Number(f64::NAN)));
    assert!(!JsValue::Number(0.0).same_value(&JsValue::Number(-0.0)));
    assert!(JsValue::from("1") != JsValue::Number(1.0));
}

#[test]
fn test_objects_compare_by_identity() {
    let mut runtime = create_test_runtime();
    let a = runtime.eval("globalThis.shared = {}; shared").unwrap();
    let b = runtime.eval("shared").unwrap();
    let c = runtime.eval("({})").unwrap();
    assert_eq!(a, b);
    assert!(a != c);
    assert_eq!(a.cheap_clone(), a);
}

#[test]
fn test_value_to_boolean() {
    for falsy in [
        JsValue::Undefined,
        JsValue::Null,
        JsValue::Boolean(false),
        JsValue::Number(0.0),
        JsValue::Number(-0.0),
        JsValue::Number(f64::NAN),
        JsValue::from(""),
    ] {
        assert!(!falsy.to_boolean(), "{:?} should be falsy", falsy);
    }
    assert!(JsValue::from("0").to_boolean());
    assert!(JsValue::Number(-1.0).to_boolean());
}

#[test]
fn test_value_describe() {
    let mut runtime = create_test_runtime();
    let cases = [
        ("'top'", "top"),
        ("['nested']", "[ 'nested' ]"),
        ("({ a: 1, b: { c: null } })", "{ a: 1, b: { c: null } }"),
        ("(function add() {})", "[Function: add]"),
        ("(() => {})", "[Function (anonymous)]"),
        ("(class Shape {})", "[class Shape]"),
        ("12n", "12n"),
        ("new RangeError('r')", "RangeError: r"),
        ("new Number(3)", "[Number: 3]"),
        ("Symbol('tag')", "Symbol(tag)"),
    ];
    for (source, expected) in cases {
        assert_eq!(runtime.eval(source).unwrap().describe(), expected, "describe {}", source);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Evaluation entry points
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_completion_value_of_script() {
    let mut runtime = create_test_runtime();
    assert_eq!(runtime.eval("1; 2; 3").unwrap(), JsValue::Number(3.0));
    assert_eq!(runtime.eval("var x = 5;").unwrap(), JsValue::Undefined);
    assert_eq!(runtime.eval("if (true) { 'then' } else { 'else' }").unwrap(), JsValue::from("then"));
    assert_eq!(runtime.eval("").unwrap(), JsValue::Undefined);
}

#[test]
fn test_state_persists_between_evals() {
    let mut runtime = create_test_runtime();
    runtime.eval("var total = 0; function add(n) { total += n; return total; }").unwrap();
    runtime.eval("add(2)").unwrap();
    assert_eq!(runtime.eval("add(3)").unwrap(), JsValue::Number(5.0));
}

#[test]
fn test_lexical_bindings_persist_between_evals() {
    let mut runtime = create_test_runtime();
    runtime.eval("let counter = 1; const LIMIT = 3;").unwrap();
    assert_eq!(runtime.eval("counter += LIMIT").unwrap(), JsValue::Number(4.0));
    assert!(matches!(runtime.eval("let counter = 2;"), Err(JsError::SyntaxError { .. })));
    assert!(matches!(runtime.eval("LIMIT = 4"), Err(JsError::TypeError { .. })));
}

#[test]
fn test_failed_eval_keeps_earlier_state() {
    let mut runtime = create_test_runtime();
    runtime.eval("var kept = 'yes';").unwrap();
    assert!(runtime.eval("kept = 'changed'; throw 1;").is_err());
    assert_eq!(runtime.eval("kept").unwrap(), JsValue::from("changed"));
    assert!(runtime.eval("var broken = ;").is_err());
    assert_eq!(runtime.eval("typeof broken").unwrap(), JsValue::from("undefined"));
}

#[test]
fn test_parse_then_execute() {
    let mut runtime = create_test_runtime();
    let program = runtime.parse("'use strict'; var runs = (globalThis.runs || 0) + 1; runs").unwrap();
    assert!(program.strict);
    assert_eq!(runtime.execute(&program).unwrap(), JsValue::Number(1.0));
    assert_eq!(runtime.execute(&program).unwrap(), JsValue::Number(2.0));
}

#[test]
fn test_parse_error_does_not_run_anything() {
    let mut runtime = create_test_runtime();
    let err = runtime.parse("globalThis.touched = true; )").unwrap_err();
    assert!(matches!(err, JsError::SyntaxError { .. }));
    assert_eq!(runtime.eval("typeof touched").unwrap(), JsValue::from("undefined"));
}

// ═══════════════════════════════════════════════════════════════════════════
// Calling into script code
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_call_script_function() {
    let mut runtime = create_test_runtime();
    let func = runtime.eval("(function (a, b) { return a * b + this.offset; })").unwrap();
    let receiver = runtime.eval("({ offset: 1 })").unwrap();
    let result = runtime
        .call(&func, receiver, &[JsValue::Number(6.0), JsValue::Number(7.0)])
        .unwrap();
    assert_eq!(result, JsValue::Number(43.0));
}

#[test]
fn test_call_propagates_exceptions() {
    let mut runtime = create_test_runtime();
    let func = runtime.eval("(function () { throw new TypeError('from script'); })").unwrap();
    let err = runtime.call(&func, JsValue::Undefined, &[]).unwrap_err();
    assert_eq!(err.to_string(), "Uncaught TypeError: from script");
}

#[test]
fn test_call_non_callable() {
    let mut runtime = create_test_runtime();
    let err = runtime.call(&JsValue::Number(1.0), JsValue::Undefined, &[]).unwrap_err();
    assert!(matches!(err, JsError::TypeError { .. }));
    assert!(err.to_string().contains("1 is not a function"));
}

#[test]
fn test_call_class_requires_construct() {
    let mut runtime = create_test_runtime();
    let class = runtime.eval("(class Point { constructor(x) { this.x = x; } })").unwrap();
    assert!(runtime.call(&class, JsValue::Undefined, &[]).is_err());

    let instance = runtime.construct(&class, &[JsValue::Number(4.0)]).unwrap();
    runtime.set_global("p", instance).unwrap();
    assert_eq!(runtime.eval("p.constructor.name + p.x").unwrap(), JsValue::from("Point4"));
}

#[test]
fn test_construct_builtin() {
    let mut runtime = create_test_runtime();
    let array_ctor = runtime.get_global("Array").unwrap();
    let array = runtime.construct(&array_ctor, &[JsValue::Number(3.0)]).unwrap();
    runtime.set_global("arr", array).unwrap();
    assert_eq!(runtime.eval("arr.length").unwrap(), JsValue::Number(3.0));

    let math = runtime.get_global("Math").unwrap();
    assert!(matches!(runtime.construct(&math, &[]), Err(JsError::TypeError { .. })));
}

// ═══════════════════════════════════════════════════════════════════════════
// Globals and host functions
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_get_missing_global_is_undefined() {
    let mut runtime = create_test_runtime();
    assert_eq!(runtime.get_global("nothingHere").unwrap(), JsValue::Undefined);
}

#[test]
fn test_get_global_runs_getters() {
    let mut runtime = create_test_runtime();
    runtime
        .eval("Object.defineProperty(globalThis, 'computed', { get() { return 6 * 7; } })")
        .unwrap();
    assert_eq!(runtime.get_global("computed").unwrap(), JsValue::Number(42.0));
}

#[test]
fn test_set_global_visible_to_scripts() {
    let mut runtime = create_test_runtime();
    let config = runtime.from_json(&json!({ "retries": 3, "hosts": ["a", "b"] }));
    runtime.set_global("config", config).unwrap();
    assert_eq!(
        runtime.eval("config.hosts.map(h => h + config.retries).join()").unwrap(),
        JsValue::from("a3,b3")
    );
}

fn sum(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut total = 0.0;
    for arg in args {
        total += interp.to_number(arg)?;
    }
    Ok(JsValue::Number(total))
}

fn fail(_interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let message = args.first().map(JsValue::describe).unwrap_or_default();
    Err(JsError::range_error(message))
}

fn receiver_type(_interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::from(this.type_of()))
}

#[test]
fn test_register_native() {
    let mut runtime = create_test_runtime();
    runtime.register_native("sum", 0, sum);
    assert_eq!(runtime.eval("sum(1, '2', true)").unwrap(), JsValue::Number(4.0));
    assert_eq!(runtime.eval("[sum.name, sum.length, typeof sum].join()").unwrap(), JsValue::from("sum,0,function"));
    assert_eq!(runtime.eval("Object.keys(globalThis).includes('sum')").unwrap(), JsValue::Boolean(false));
}

#[test]
fn test_native_errors_are_catchable() {
    let mut runtime = create_test_runtime();
    runtime.register_native("fail", 1, fail);
    assert_eq!(
        runtime
            .eval("try { fail('limit'); } catch (e) { e instanceof RangeError && e.message }")
            .unwrap(),
        JsValue::from("limit")
    );
}

#[test]
fn test_native_coercion_errors_propagate() {
    let mut runtime = create_test_runtime();
    runtime.register_native("sum", 0, sum);
    let err = runtime.eval("sum(1, Symbol())").unwrap_err();
    assert!(matches!(err, JsError::TypeError { .. }));
}

#[test]
fn test_native_receives_this() {
    let mut runtime = create_test_runtime();
    runtime.register_native("receiverType", 0, receiver_type);
    assert_eq!(
        runtime.eval("[receiverType(), receiverType.call('s'), ({ m: receiverType }).m()].join()").unwrap(),
        JsValue::from("undefined,string,object")
    );
}

#[test]
fn test_native_functions_are_not_constructors() {
    let mut runtime = create_test_runtime();
    runtime.register_native("sum", 0, sum);
    assert!(matches!(runtime.eval("new sum()"), Err(JsError::TypeError { .. })));
}

// ═══════════════════════════════════════════════════════════════════════════
// JSON conversion
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_to_json() {
    let mut runtime = create_test_runtime();
    let value = runtime
        .eval("({ id: 7, ratio: 0.5, name: 'n', ok: true, none: null, skip: undefined, fn() {}, list: [1, undefined, NaN] })")
        .unwrap();
    assert_eq!(
        runtime.to_json(&value).unwrap(),
        json!({ "id": 7, "ratio": 0.5, "name": "n", "ok": true, "none": null, "list": [1, null, null] })
    );
}

#[test]
fn test_to_json_keeps_key_order() {
    let mut runtime = create_test_runtime();
    let value = runtime.eval("({ z: 1, a: 2, m: 3 })").unwrap();
    let json = runtime.to_json(&value).unwrap();
    let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
}

#[test]
fn test_to_json_errors() {
    let mut runtime = create_test_runtime();
    let cyclic = runtime.eval("const c = {}; c.self = c; c").unwrap();
    assert!(matches!(runtime.to_json(&cyclic), Err(JsError::TypeError { .. })));
    let big = runtime.eval("({ n: 1n })").unwrap();
    assert!(matches!(runtime.to_json(&big), Err(JsError::TypeError { .. })));
}

#[test]
fn test_to_json_of_unrepresentable_top_level() {
    let mut runtime = create_test_runtime();
    assert_eq!(runtime.to_json(&JsValue::Undefined).unwrap(), serde_json::Value::Null);
}

#[test]
fn test_from_json() {
    let mut runtime = create_test_runtime();
    let value = runtime.from_json(&json!({ "user": { "name": "ada", "roles": ["admin"] }, "count": 2 }));
    runtime.set_global("data", value).unwrap();
    assert_eq!(
        runtime
            .eval("[data.user.name, Array.isArray(data.user.roles), data.count + 1, Object.keys(data).join('|')].join()")
            .unwrap(),
        JsValue::from("ada,true,3,user|count")
    );
}

#[test]
fn test_json_survives_round_trip_through_script() {
    let mut runtime = create_test_runtime();
    let input = json!({ "a": [1, 2, { "b": "c" }], "d": false });
    let value = runtime.from_json(&input);
    runtime.set_global("input", value).unwrap();
    let copied = runtime.eval("JSON.parse(JSON.stringify(input))").unwrap();
    assert_eq!(runtime.to_json(&copied).unwrap(), input);
}

// ═══════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_default_config() {
    let config = RuntimeConfig::default();
    assert_eq!(config.max_call_depth, ecma_eval::DEFAULT_MAX_CALL_DEPTH);
    assert_eq!(config.gc_threshold, ecma_eval::DEFAULT_GC_THRESHOLD);
}

#[test]
fn test_stack_overflow_is_range_error() {
    let mut runtime = Runtime::with_config(RuntimeConfig::default().with_max_call_depth(64));
    let err = runtime.eval("(function recurse() { return recurse(); })()").unwrap_err();
    assert_eq!(err.to_string(), "RangeError: Maximum call stack size exceeded");
    // The runtime stays usable
    assert_eq!(runtime.eval("1 + 1").unwrap(), JsValue::Number(2.0));
}

#[test]
fn test_stack_overflow_is_catchable() {
    let mut runtime = Runtime::with_config(RuntimeConfig::default().with_max_call_depth(64));
    assert_eq!(
        runtime
            .eval("function r() { return r(); } try { r(); } catch (e) { e.name }")
            .unwrap(),
        JsValue::from("RangeError")
    );
}

#[test]
fn test_deep_recursion_within_limit() {
    let mut runtime = Runtime::new();
    assert_eq!(
        runtime
            .eval("function depth(n) { return n === 0 ? 0 : 1 + depth(n - 1); } depth(400)")
            .unwrap(),
        JsValue::Number(400.0)
    );
}
