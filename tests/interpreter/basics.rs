//! Operators, literals and completion values

use super::{eval, eval_string, throws_error};
use ecma_eval::JsValue;

#[test]
fn test_arithmetic() {
    assert_eq!(eval("1 + 2"), JsValue::Number(3.0));
    assert_eq!(eval("10 - 4 * 2"), JsValue::Number(2.0));
    assert_eq!(eval("7 / 2"), JsValue::Number(3.5));
    assert_eq!(eval("-7 % 3"), JsValue::Number(-1.0));
    assert_eq!(eval("2 ** 10"), JsValue::Number(1024.0));
    assert_eq!(eval("2 ** 3 ** 2"), JsValue::Number(512.0));
    assert_eq!(eval("(-2) ** 2"), JsValue::Number(4.0));
}

#[test]
fn test_unary_exponent_is_syntax_error() {
    assert!(throws_error("-2 ** 2", "SyntaxError"));
}

#[test]
fn test_string_concatenation_coerces() {
    assert_eq!(eval("'a' + 1 + 2"), JsValue::from("a12"));
    assert_eq!(eval("1 + 2 + 'a'"), JsValue::from("3a"));
    assert_eq!(eval("'x' + null + undefined + true"), JsValue::from("xnullundefinedtrue"));
    assert_eq!(eval("[1, 2] + ''"), JsValue::from("1,2"));
    assert_eq!(eval("({}) + ''"), JsValue::from("[object Object]"));
}

#[test]
fn test_numeric_coercion() {
    assert_eq!(eval("'6' * '7'"), JsValue::Number(42.0));
    assert_eq!(eval("'0x1f' - 0"), JsValue::Number(31.0));
    assert_eq!(eval("+'  12  '"), JsValue::Number(12.0));
    assert_eq!(eval("+''"), JsValue::Number(0.0));
    assert_eq!(eval("+true"), JsValue::Number(1.0));
    assert_eq!(eval("Number.isNaN(+'abc')"), JsValue::Boolean(true));
    assert_eq!(eval("Number.isNaN(undefined * 2)"), JsValue::Boolean(true));
}

#[test]
fn test_bitwise_operators() {
    assert_eq!(eval("5 & 3"), JsValue::Number(1.0));
    assert_eq!(eval("5 | 3"), JsValue::Number(7.0));
    assert_eq!(eval("5 ^ 3"), JsValue::Number(6.0));
    assert_eq!(eval("~5"), JsValue::Number(-6.0));
    assert_eq!(eval("1 << 31"), JsValue::Number(-2147483648.0));
    assert_eq!(eval("-16 >> 2"), JsValue::Number(-4.0));
    assert_eq!(eval("-1 >>> 28"), JsValue::Number(15.0));
}

#[test]
fn test_relational_comparison() {
    assert_eq!(eval("1 < 2"), JsValue::Boolean(true));
    assert_eq!(eval("'10' < '9'"), JsValue::Boolean(true));
    assert_eq!(eval("'10' < 9"), JsValue::Boolean(false));
    assert_eq!(eval("NaN < 1 || NaN > 1 || NaN <= 1 || NaN >= 1"), JsValue::Boolean(false));
    assert_eq!(eval("undefined <= 0"), JsValue::Boolean(false));
    assert_eq!(eval("null >= 0"), JsValue::Boolean(true));
}

#[test]
fn test_strict_equality() {
    assert_eq!(eval("1 === 1"), JsValue::Boolean(true));
    assert_eq!(eval("1 === '1'"), JsValue::Boolean(false));
    assert_eq!(eval("NaN === NaN"), JsValue::Boolean(false));
    assert_eq!(eval("0 === -0"), JsValue::Boolean(true));
    assert_eq!(eval("const o = {}; o === o"), JsValue::Boolean(true));
    assert_eq!(eval("({}) === ({})"), JsValue::Boolean(false));
}

#[test]
fn test_loose_equality() {
    assert_eq!(eval("null == undefined"), JsValue::Boolean(true));
    assert_eq!(eval("null == 0"), JsValue::Boolean(false));
    assert_eq!(eval("'1' == 1"), JsValue::Boolean(true));
    assert_eq!(eval("true == 1"), JsValue::Boolean(true));
    assert_eq!(eval("[1] == 1"), JsValue::Boolean(true));
    assert_eq!(eval("({ valueOf() { return 3; } }) == 3"), JsValue::Boolean(true));
    assert_eq!(eval("1n == 1"), JsValue::Boolean(true));
    assert_eq!(eval("'2' != 2"), JsValue::Boolean(false));
}

#[test]
fn test_logical_operators_return_operands() {
    assert_eq!(eval("0 || 'fallback'"), JsValue::from("fallback"));
    assert_eq!(eval("'first' || 'second'"), JsValue::from("first"));
    assert_eq!(eval("1 && 'second'"), JsValue::from("second"));
    assert_eq!(eval("'' && 'second'"), JsValue::from(""));
    assert_eq!(eval("0 ?? 'fallback'"), JsValue::Number(0.0));
    assert_eq!(eval("null ?? 'fallback'"), JsValue::from("fallback"));
}

#[test]
fn test_logical_operators_short_circuit() {
    let source = r#"
        let calls = 0;
        function hit() { calls++; return true; }
        true || hit();
        false && hit();
        1 ?? hit();
        false || hit();
        calls
    "#;
    assert_eq!(eval(source), JsValue::Number(1.0));
}

#[test]
fn test_logical_assignment() {
    let source = r#"
        let a = null, b = 1, c = 0;
        a ??= 'set';
        b ||= 'skipped';
        c &&= 'skipped';
        [a, b, c].join()
    "#;
    assert_eq!(eval(source), JsValue::from("set,1,0"));
}

#[test]
fn test_compound_assignment() {
    let source = r#"
        let x = 10;
        x += 5; x -= 3; x *= 2; x /= 4; x **= 2; x %= 7;
        x
    "#;
    assert_eq!(eval(source), JsValue::Number(1.0));
}

#[test]
fn test_update_expressions() {
    assert_eq!(eval("let i = 1; i++"), JsValue::Number(1.0));
    assert_eq!(eval("let i = 1; ++i"), JsValue::Number(2.0));
    assert_eq!(eval("let i = 1; i--; i"), JsValue::Number(0.0));
    assert_eq!(eval("let s = '5'; s++; s"), JsValue::Number(6.0));
    assert_eq!(eval("const o = { n: 1 }; o.n++; o['n']++; o.n"), JsValue::Number(3.0));
    assert_eq!(eval("let b = 10n; b++; b"), eval("11n"));
}

#[test]
fn test_update_reads_reference_once() {
    let source = r#"
        let reads = 0;
        const o = { get n() { reads++; return 1; }, set n(v) {} };
        o.n++;
        reads
    "#;
    assert_eq!(eval(source), JsValue::Number(1.0));
}

#[test]
fn test_typeof() {
    assert_eq!(eval("typeof 1"), JsValue::from("number"));
    assert_eq!(eval("typeof 'a'"), JsValue::from("string"));
    assert_eq!(eval("typeof true"), JsValue::from("boolean"));
    assert_eq!(eval("typeof undefined"), JsValue::from("undefined"));
    assert_eq!(eval("typeof null"), JsValue::from("object"));
    assert_eq!(eval("typeof {}"), JsValue::from("object"));
    assert_eq!(eval("typeof function () {}"), JsValue::from("function"));
    assert_eq!(eval("typeof class {}"), JsValue::from("function"));
    assert_eq!(eval("typeof Symbol()"), JsValue::from("symbol"));
    assert_eq!(eval("typeof 1n"), JsValue::from("bigint"));
}

#[test]
fn test_typeof_undeclared_does_not_throw() {
    assert_eq!(eval("typeof notDeclaredAnywhere"), JsValue::from("undefined"));
    assert!(throws_error("notDeclaredAnywhere", "ReferenceError: notDeclaredAnywhere is not defined"));
}

#[test]
fn test_typeof_in_tdz_throws() {
    assert!(throws_error("typeof x; let x = 1;", "Cannot access 'x' before initialization"));
}

#[test]
fn test_void_and_comma() {
    assert_eq!(eval("void 0"), JsValue::Undefined);
    assert_eq!(eval("let n = 0; void n++; n"), JsValue::Number(1.0));
    assert_eq!(eval("(1, 2, 3)"), JsValue::Number(3.0));
}

#[test]
fn test_conditional() {
    assert_eq!(eval("true ? 'yes' : 'no'"), JsValue::from("yes"));
    assert_eq!(eval("0 ? 'yes' : null ? 'maybe' : 'no'"), JsValue::from("no"));
}

#[test]
fn test_in_and_instanceof() {
    assert_eq!(eval("'a' in { a: undefined }"), JsValue::Boolean(true));
    assert_eq!(eval("'toString' in {}"), JsValue::Boolean(true));
    assert_eq!(eval("0 in [5]"), JsValue::Boolean(true));
    assert_eq!(eval("[] instanceof Array"), JsValue::Boolean(true));
    assert_eq!(eval("[] instanceof Object"), JsValue::Boolean(true));
    assert_eq!(eval("({}) instanceof Array"), JsValue::Boolean(false));
    assert!(throws_error("'a' in 'abc'", "TypeError"));
    assert!(throws_error("({}) instanceof 1", "TypeError"));
}

#[test]
fn test_optional_chaining() {
    assert_eq!(eval("const o = null; o?.a.b.c"), JsValue::Undefined);
    assert_eq!(eval("const o = { a: { b: 1 } }; o?.a?.b"), JsValue::Number(1.0));
    assert_eq!(eval("const o = {}; o.missing?.()"), JsValue::Undefined);
    assert_eq!(eval("const o = { f() { return 2; } }; o.f?.()"), JsValue::Number(2.0));
    assert_eq!(eval("const a = undefined; a?.[0]"), JsValue::Undefined);
}

#[test]
fn test_optional_chain_skips_side_effects() {
    let source = r#"
        let n = 0;
        const o = null;
        o?.[n++];
        o?.f(n++);
        n
    "#;
    assert_eq!(eval(source), JsValue::Number(0.0));
}

#[test]
fn test_parenthesized_optional_member_keeps_receiver() {
    assert_eq!(
        eval("const a = { v: 7, f() { return this.v; } }; (a?.f)()"),
        JsValue::Number(7.0)
    );
    assert_eq!(
        eval("const a = { b: { v: 3, f() { return this.v; } } }; ((a?.b.f))()"),
        JsValue::Number(3.0)
    );
    assert!(throws_error("const n = null; (n?.f)()", "TypeError"));
}

#[test]
fn test_member_on_nullish_base_throws() {
    assert!(throws_error("const o = undefined; o.x", "TypeError: Cannot read properties of undefined"));
    assert!(throws_error("null.x = 1", "TypeError"));
}

#[test]
fn test_nullish_base_fails_before_key_evaluation() {
    let source = r#"
        let evaluated = false;
        try { null[(evaluated = true, 'k')]; } catch (e) {}
        evaluated
    "#;
    assert_eq!(eval(source), JsValue::Boolean(true));
}

#[test]
fn test_template_literals() {
    assert_eq!(eval("const n = 3; `n is ${n}, doubled ${n * 2}`"), JsValue::from("n is 3, doubled 6"));
    assert_eq!(eval("`line1\\nline2`"), JsValue::from("line1\nline2"));
    assert_eq!(eval("`${[1, 2]}|${null}|${{}}`"), JsValue::from("1,2|null|[object Object]"));
}

#[test]
fn test_template_substitutions_evaluate_in_order() {
    assert_eq!(eval("let i = 0; `${i++}${i++}${i++}`"), JsValue::from("012"));
}

#[test]
fn test_tagged_template() {
    let source = r#"
        function tag(strings, ...values) {
            return strings.join('|') + ':' + values.join(',') + ':' + strings.raw[1];
        }
        tag`a${1}b\n${2}c`
    "#;
    assert_eq!(eval_string(source), "a|b\n|c:1,2:b\\n");
}

#[test]
fn test_tagged_template_object_is_frozen_and_cached() {
    let source = r#"
        function tag(strings) { return strings; }
        function site() { return tag`x${1}y`; }
        const first = site();
        [first === site(), Object.isFrozen(first), Object.isFrozen(first.raw)].join()
    "#;
    assert_eq!(eval(source), JsValue::from("true,true,true"));
}

#[test]
fn test_bigint_arithmetic() {
    assert_eq!(eval("(2n ** 64n).toString()"), JsValue::from("18446744073709551616"));
    assert_eq!(eval("(7n / 2n).toString()"), JsValue::from("3"));
    assert_eq!(eval("(-7n % 3n).toString()"), JsValue::from("-1"));
    assert_eq!(eval("1n < 2"), JsValue::Boolean(true));
    assert_eq!(eval("typeof (1n + 2n)"), JsValue::from("bigint"));
}

#[test]
fn test_bigint_mixing_throws() {
    assert!(throws_error("1n + 1", "Cannot mix BigInt and other types"));
    assert!(throws_error("1 * 2n", "TypeError"));
    assert!(throws_error("1n / 0n", "RangeError"));
    assert!(throws_error("+1n", "TypeError"));
}

#[test]
fn test_completion_value_of_script() {
    assert_eq!(eval("1; let x = 2;"), JsValue::Number(1.0));
    assert_eq!(eval("function f() {}"), JsValue::Undefined);
    assert_eq!(eval("if (true) { 'then' } else { 'else' }"), JsValue::from("then"));
    assert_eq!(eval("let i = 0; while (i < 3) { i++; }"), JsValue::Number(2.0));
    assert_eq!(eval("3; if (false) {}"), JsValue::Undefined);
}

#[test]
fn test_numeric_literals() {
    assert_eq!(eval("0x1F"), JsValue::Number(31.0));
    assert_eq!(eval("0o17"), JsValue::Number(15.0));
    assert_eq!(eval("0b101"), JsValue::Number(5.0));
    assert_eq!(eval("1_000_000"), JsValue::Number(1_000_000.0));
    assert_eq!(eval("1.5e3"), JsValue::Number(1500.0));
    assert_eq!(eval(".5"), JsValue::Number(0.5));
}

#[test]
fn test_number_to_string_formatting() {
    assert_eq!(eval("String(0.1 + 0.2)"), JsValue::from("0.30000000000000004"));
    assert_eq!(eval("String(1e21)"), JsValue::from("1e+21"));
    assert_eq!(eval("String(123e-20)"), JsValue::from("1.23e-18"));
    assert_eq!(eval("String(-0)"), JsValue::from("0"));
    assert_eq!(eval("String(100)"), JsValue::from("100"));
}

#[test]
fn test_automatic_semicolon_insertion() {
    let source = r#"
        let a = 1
        let b = 2
        function f() {
            return
            42
        }
        a + b + String(f())
    "#;
    assert_eq!(eval(source), JsValue::from("3undefined"));
}
