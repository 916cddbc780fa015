//! Destructuring tests: declarations, assignment patterns, defaults, rest

use super::{eval, eval_result, eval_string, throws_error};
use ecma_eval::{JsError, JsValue};

// ============================================================================
// Object patterns
// ============================================================================

#[test]
fn test_object_pattern_basic() {
    assert_eq!(eval("const { a, b } = { a: 1, b: 2 }; a + b"), JsValue::Number(3.0));
}

#[test]
fn test_object_pattern_rename_and_default() {
    assert_eq!(
        eval_string("const { a: first, b: second = 'dflt', c = 'unused' } = { a: 'x', c: 'y' }; [first, second, c].join()"),
        "x,dflt,y"
    );
}

#[test]
fn test_default_only_for_undefined() {
    assert_eq!(
        eval_string("const { a = 1, b = 2, c = 3 } = { a: null, b: 0 }; [a, b, c].join()"),
        ",0,3"
    );
}

#[test]
fn test_default_evaluated_lazily() {
    assert_eq!(
        eval(
            r#"
            let calls = 0;
            const next = () => ++calls;
            const { a = next(), b = next() } = { a: 'present' };
            calls
        "#
        ),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_defaults_see_earlier_bindings() {
    assert_eq!(eval("const { x = 2, y = x * 10 } = {}; y"), JsValue::Number(20.0));
    assert!(throws_error("const { x = y, y = 1 } = {};", "Cannot access 'y' before initialization"));
}

#[test]
fn test_computed_keys() {
    assert_eq!(
        eval_string("const key = 'dyn'; const { [key]: value, ['lit' + 'eral']: other } = { dyn: 'd', literal: 'l' }; value + other"),
        "dl"
    );
}

#[test]
fn test_object_rest() {
    assert_eq!(
        eval_string(
            r#"
            const { a, ...rest } = { a: 1, b: 2, c: 3 };
            Object.keys(rest).join() + ':' + rest.b
        "#
        ),
        "b,c:2"
    );
}

#[test]
fn test_object_rest_copies_own_enumerable_only() {
    assert_eq!(
        eval_string(
            r#"
            const proto = { inherited: 1 };
            const source = Object.create(proto);
            source.own = 2;
            Object.defineProperty(source, 'hidden', { value: 3, enumerable: false });
            const { ...copy } = source;
            Object.keys(copy).join() + '|' + ('inherited' in copy)
        "#
        ),
        "own|false"
    );
}

#[test]
fn test_object_pattern_on_primitives() {
    assert_eq!(eval("const { length } = 'hello'; length"), JsValue::Number(5.0));
    assert_eq!(eval("const { toFixed } = 1; typeof toFixed"), JsValue::from("function"));
}

#[test]
fn test_object_pattern_on_nullish() {
    assert!(throws_error(
        "const { a } = null;",
        "Cannot destructure property 'a' of 'null' as it is null."
    ));
    assert!(matches!(eval_result("const {} = undefined;"), Err(JsError::TypeError { .. })));
}

#[test]
fn test_object_pattern_runs_getters_in_order() {
    assert_eq!(
        eval_string(
            r#"
            const log = [];
            const source = {
                get b() { log.push('b'); return 2; },
                get a() { log.push('a'); return 1; }
            };
            const { a, b } = source;
            log.join()
        "#
        ),
        "a,b"
    );
}

// ============================================================================
// Array patterns
// ============================================================================

#[test]
fn test_array_pattern_basic() {
    assert_eq!(eval_string("const [a, , c] = ['x', 'y', 'z']; a + c"), "xz");
}

#[test]
fn test_array_pattern_short_source() {
    assert_eq!(
        eval_string("const [a, b = 'dflt', c] = [1]; [a, b, typeof c].join()"),
        "1,dflt,undefined"
    );
}

#[test]
fn test_array_rest() {
    assert_eq!(
        eval_string("const [head, ...tail] = [1, 2, 3]; head + '|' + tail.join() + '|' + Array.isArray(tail)"),
        "1|2,3|true"
    );
    assert_eq!(eval("const [...all] = []; all.length"), JsValue::Number(0.0));
}

#[test]
fn test_array_pattern_from_string() {
    assert_eq!(eval_string("const [first, ...others] = 'a😀b'; first + others.length"), "a2");
}

#[test]
fn test_array_pattern_requires_iterable() {
    assert!(throws_error("const [a] = {};", "is not iterable"));
    assert!(throws_error("const [a] = null;", "is not iterable"));
}

#[test]
fn test_array_pattern_stops_early_and_closes() {
    assert_eq!(
        eval_string(
            r#"
            let pulled = 0, closed = 0;
            const source = {
                [Symbol.iterator]() {
                    return {
                        next() { pulled++; return { value: pulled, done: false }; },
                        return() { closed++; return {}; }
                    };
                }
            };
            const [a, b] = source;
            [a, b, pulled, closed].join()
        "#
        ),
        "1,2,2,1"
    );
}

#[test]
fn test_array_rest_drains_without_close() {
    assert_eq!(
        eval_string(
            r#"
            let closed = 0;
            const source = {
                [Symbol.iterator]() {
                    let i = 0;
                    return {
                        next() { i++; return { value: i, done: i > 3 }; },
                        return() { closed++; return {}; }
                    };
                }
            };
            const [first, ...rest] = source;
            first + ':' + rest.join() + ':' + closed
        "#
        ),
        "1:2,3:0"
    );
}

// ============================================================================
// Nesting
// ============================================================================

#[test]
fn test_nested_patterns() {
    assert_eq!(
        eval_string(
            r#"
            const { user: { name, tags: [firstTag, ...moreTags] }, meta: { count = 0 } = {} } = {
                user: { name: 'ada', tags: ['x', 'y', 'z'] }
            };
            [name, firstTag, moreTags.length, count].join()
        "#
        ),
        "ada,x,2,0"
    );
}

#[test]
fn test_nested_default_patterns() {
    assert_eq!(
        eval_string("const [{ a = 'inner' } = {}, [b = 'deep'] = []] = []; a + ' ' + b"),
        "inner deep"
    );
}

// ============================================================================
// Assignment patterns
// ============================================================================

#[test]
fn test_swap() {
    assert_eq!(eval_string("let a = 1, b = 2; [a, b] = [b, a]; a + ',' + b"), "2,1");
}

#[test]
fn test_assignment_to_member_targets() {
    assert_eq!(
        eval_string(
            r#"
            const target = {};
            const list = [];
            ({ a: target.first, b: list[0], ...target.rest } = { a: 1, b: 2, c: 3 });
            [target.first, list[0], target.rest.c].join()
        "#
        ),
        "1,2,3"
    );
}

#[test]
fn test_assignment_pattern_value_is_source() {
    assert_eq!(
        eval("let a, b; const source = [1, 2]; ([a, b] = source) === source"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_assignment_target_resolved_before_value() {
    assert_eq!(
        eval_string(
            r#"
            const log = [];
            const obj = {};
            const key = () => { log.push('key'); return 'k'; };
            const source = { get v() { log.push('value'); return 1; } };
            ({ v: obj[key()] } = source);
            log.join()
        "#
        ),
        "key,value"
    );
}

#[test]
fn test_array_assignment_target_order() {
    assert_eq!(
        eval_string(
            r#"
            const log = [];
            const obj = {};
            const key = () => { log.push('key'); return 'k'; };
            const source = {
                [Symbol.iterator]() {
                    return { next() { log.push('next'); return { value: 1, done: false }; }, return() { return {}; } };
                }
            };
            [obj[key()]] = source;
            log.join()
        "#
        ),
        "key,next"
    );
}

#[test]
fn test_assignment_pattern_with_defaults() {
    assert_eq!(
        eval_string("let x, y; ({ x = 5, y = x + 1 } = { x: undefined }); x + ',' + y"),
        "5,6"
    );
}

#[test]
fn test_assignment_to_const_through_pattern() {
    assert!(throws_error("const c = 1; [c] = [2];", "Assignment to constant variable"));
}

#[test]
fn test_invalid_assignment_patterns() {
    assert!(matches!(eval_result("[a + 1] = [1];"), Err(JsError::SyntaxError { .. })));
    assert!(matches!(eval_result("({ a: 1 } = {});"), Err(JsError::SyntaxError { .. })));
    assert!(matches!(eval_result("({ ...rest, a } = {});"), Err(JsError::SyntaxError { .. })));
}

// ============================================================================
// Other binding positions
// ============================================================================

#[test]
fn test_var_pattern_hoists_names() {
    assert_eq!(
        eval_string("const before = typeof a; var { a } = { a: 1 }; before + ':' + a"),
        "undefined:1"
    );
}

#[test]
fn test_let_pattern_tdz() {
    assert!(throws_error("const { a = b } = {}; let b = 1;", "Cannot access 'b' before initialization"));
}

#[test]
fn test_for_of_with_patterns() {
    assert_eq!(
        eval_string(
            r#"
            const out = [];
            for (const [key, { value = '?' }] of [['a', { value: 1 }], ['b', {}]]) {
                out.push(key + value);
            }
            out.join()
        "#
        ),
        "a1,b?"
    );
}

#[test]
fn test_for_in_with_assignment_target() {
    assert_eq!(
        eval_string("const seen = {}; for (seen.last in { p: 1, q: 2 }); seen.last"),
        "q"
    );
}
