//! Tests for JSON object (parse and stringify)

use super::{eval, eval_string, throws_error};
use ecma_eval::JsValue;

#[test]
fn test_json_stringify_simple_object() {
    assert_eq!(
        eval(r#"JSON.stringify({ a: 1 })"#),
        JsValue::String(r#"{"a":1}"#.into())
    );
}

#[test]
fn test_json_stringify_with_indent() {
    // With indentation
    let result = eval(r#"JSON.stringify({ a: 1 }, null, 2)"#);
    if let JsValue::String(s) = result {
        assert!(
            s.as_str().contains("{\n"),
            "Expected formatted JSON with newlines"
        );
    } else {
        panic!("Expected String, got {:?}", result);
    }
}

#[test]
fn test_json_stringify_array() {
    assert_eq!(
        eval(r#"JSON.stringify([1, 2, 3])"#),
        JsValue::String("[1,2,3]".into())
    );
}

#[test]
fn test_json_stringify_nested() {
    assert_eq!(
        eval(r#"JSON.stringify({ a: { b: 1 } })"#),
        JsValue::String(r#"{"a":{"b":1}}"#.into())
    );
}

#[test]
fn test_json_parse_simple() {
    assert_eq!(eval(r#"JSON.parse('{"a":1}').a"#), JsValue::Number(1.0));
}

#[test]
fn test_json_parse_array() {
    assert_eq!(eval(r#"JSON.parse('[1,2,3]')[1]"#), JsValue::Number(2.0));
}

#[test]
fn test_json_round_trip() {
    assert_eq!(
        eval(r#"JSON.stringify(JSON.parse('{"a":1,"b":"hello"}'))"#),
        JsValue::String(r#"{"a":1,"b":"hello"}"#.into())
    );
}

#[test]
fn test_json_stringify_indent_forms() {
    assert_eq!(
        eval_string("JSON.stringify({ a: [1, 2] }, null, 2)"),
        "{\n  \"a\": [\n    1,\n    2\n  ]\n}"
    );
    assert_eq!(
        eval_string("JSON.stringify({ a: 1 }, null, '--')"),
        "{\n--\"a\": 1\n}"
    );
    assert_eq!(eval_string("JSON.stringify({ a: 1 }, null, 0)"), r#"{"a":1}"#);
}

#[test]
fn test_json_stringify_skips_unrepresentable_members() {
    assert_eq!(
        eval_string("JSON.stringify({ u: undefined, f() {}, s: Symbol('x'), [Symbol('k')]: 1, kept: null })"),
        r#"{"kept":null}"#
    );
    assert_eq!(
        eval_string("JSON.stringify([undefined, function () {}, Symbol('x'), NaN, -Infinity])"),
        "[null,null,null,null,null]"
    );
}

#[test]
fn test_json_stringify_top_level_undefined() {
    assert_eq!(eval("JSON.stringify(undefined)"), JsValue::Undefined);
    assert_eq!(eval("JSON.stringify(() => 1)"), JsValue::Undefined);
    assert_eq!(eval_string("JSON.stringify('he said \"hi\"')"), r#""he said \"hi\"""#);
}

#[test]
fn test_json_stringify_numbers() {
    assert_eq!(eval_string("JSON.stringify([1, -0, 1.5, 2e3])"), "[1,0,1.5,2000]");
}

#[test]
fn test_json_stringify_key_order_and_enumerability() {
    assert_eq!(
        eval_string(
            r#"
            const o = { b: 1, 2: "two", a: 2 };
            Object.defineProperty(o, "hidden", { value: 1, enumerable: false });
            JSON.stringify(Object.create(o)) + JSON.stringify(o)
        "#
        ),
        r#"{}{"2":"two","b":1,"a":2}"#
    );
}

#[test]
fn test_json_stringify_to_json_hook() {
    assert_eq!(
        eval_string(
            r#"
            const money = { cents: 1999, toJSON() { return (this.cents / 100).toFixed(2); } };
            JSON.stringify({ price: money })
        "#
        ),
        r#"{"price":"19.99"}"#
    );
}

#[test]
fn test_json_stringify_wrapper_objects() {
    assert_eq!(
        eval_string("JSON.stringify([new Number(3), new String('s'), new Boolean(false)])"),
        r#"[3,"s",false]"#
    );
}

#[test]
fn test_json_stringify_getters_run() {
    assert_eq!(
        eval_string("JSON.stringify({ get computed() { return 6 * 7; } })"),
        r#"{"computed":42}"#
    );
}

#[test]
fn test_json_stringify_circular_throws() {
    assert!(throws_error(
        "const o = {}; o.self = o; JSON.stringify(o)",
        "Converting circular structure to JSON"
    ));
    assert_eq!(
        eval_string("const shared = { x: 1 }; JSON.stringify([shared, shared])"),
        r#"[{"x":1},{"x":1}]"#
    );
}

#[test]
fn test_json_stringify_bigint_throws() {
    assert!(throws_error("JSON.stringify({ n: 1n })", "Do not know how to serialize a BigInt"));
}

#[test]
fn test_json_parse_values() {
    assert_eq!(eval("JSON.parse('null')"), JsValue::Null);
    assert_eq!(eval("JSON.parse(' true ')"), JsValue::Boolean(true));
    assert_eq!(eval("JSON.parse('-1.5e2')"), JsValue::Number(-150.0));
    assert_eq!(eval_string(r#"JSON.parse('"a\\u0041"')"#), "aA");
    assert_eq!(
        eval_string(r#"Object.keys(JSON.parse('{"z":1,"a":2,"m":3}')).join()"#),
        "z,a,m"
    );
}

#[test]
fn test_json_parse_result_is_ordinary() {
    assert_eq!(
        eval(r#"const o = JSON.parse('{"list":[1]}'); Array.isArray(o.list) && Object.getPrototypeOf(o) === Object.prototype"#),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_json_parse_rejects_invalid_text() {
    assert!(throws_error("JSON.parse('{a:1}')", "SyntaxError"));
    assert!(throws_error("JSON.parse(\"[1,]\")", "SyntaxError"));
    assert!(throws_error("JSON.parse('')", "SyntaxError"));
    assert_eq!(
        eval_string("try { JSON.parse('{'); } catch (e) { e.name }"),
        "SyntaxError"
    );
}

#[test]
fn test_json_object_shape() {
    assert_eq!(eval_string("Object.prototype.toString.call(JSON)"), "[object JSON]");
    assert_eq!(eval("JSON.stringify.length + JSON.parse.length"), JsValue::Number(5.0));
}
