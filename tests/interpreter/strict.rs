//! Strict mode tests
//!
//! Scripts are sloppy unless a `"use strict"` directive opts in. Class
//! bodies are always strict.

use super::{eval, eval_result, eval_string, throws_error};
use ecma_eval::{JsError, JsValue};

fn is_syntax_error(source: &str) -> bool {
    matches!(eval_result(source), Err(JsError::SyntaxError { .. }))
}

// ============================================================================
// Directive prologue
// ============================================================================

#[test]
fn test_directive_applies_to_script() {
    assert_eq!(
        eval("'use strict'; (function () { return this; })()"),
        JsValue::Undefined
    );
}

#[test]
fn test_sloppy_this_is_global_object() {
    assert_eq!(
        eval("(function () { return this === globalThis; })()"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_sloppy_this_boxes_primitives() {
    assert_eq!(
        eval("(function () { return typeof this; }).call(5)"),
        JsValue::from("object")
    );
    assert_eq!(
        eval("'use strict'; (function () { return typeof this; }).call(5)"),
        JsValue::from("number")
    );
}

#[test]
fn test_directive_applies_to_function_only() {
    assert_eq!(
        eval_string(
            r#"
            function strictFn() { 'use strict'; return this === undefined; }
            function sloppyFn() { return this === undefined; }
            [strictFn(), sloppyFn()].join()
        "#
        ),
        "true,false"
    );
}

#[test]
fn test_nested_functions_inherit_strictness() {
    assert_eq!(
        eval("function outer() { 'use strict'; return (function () { return this; })(); } outer()"),
        JsValue::Undefined
    );
}

#[test]
fn test_escaped_directive_is_not_strict() {
    assert_eq!(
        eval(r#"function f() { 'use\x20strict'; return this === globalThis; } f()"#),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_directive_after_statement_is_ignored() {
    assert_eq!(
        eval("function f() { var a; 'use strict'; return this === globalThis; } f()"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_class_bodies_are_strict() {
    assert_eq!(
        eval("class C { static m() { return (function () { return this; })(); } } C.m()"),
        JsValue::Undefined
    );
}

#[test]
fn test_use_strict_with_non_simple_parameters() {
    assert!(is_syntax_error("function f(a = 1) { 'use strict'; }"));
    assert!(is_syntax_error("function f({ a }) { 'use strict'; }"));
}

// ============================================================================
// Assignments
// ============================================================================

#[test]
fn test_strict_undeclared_assignment() {
    assert!(throws_error("'use strict'; undeclaredName = 1;", "undeclaredName is not defined"));
    assert_eq!(eval("undeclaredName = 1; undeclaredName"), JsValue::Number(1.0));
}

#[test]
fn test_strict_assign_read_only_globals() {
    for name in ["Infinity", "NaN", "undefined"] {
        let source = format!("'use strict'; {} = 1;", name);
        assert!(
            matches!(eval_result(&source), Err(JsError::TypeError { .. })),
            "assigning {} should throw",
            name
        );
    }
}

#[test]
fn test_strict_can_shadow_infinity_in_function() {
    let result = eval(
        r#"
        'use strict';
        function test() {
            var Infinity = 42;
            return Infinity;
        }
        test()
        "#,
    );
    assert_eq!(result, JsValue::Number(42.0));
}

#[test]
fn test_strict_can_shadow_with_let() {
    let result = eval(
        r#"
        'use strict';
        {
            let Infinity = 42;
            Infinity
        }
        "#,
    );
    assert_eq!(result, JsValue::Number(42.0));
}

#[test]
fn test_frozen_object_writes() {
    assert_eq!(
        eval("const o = Object.freeze({ a: 1 }); o.a = 2; o.b = 3; [o.a, o.b].join()"),
        JsValue::from("1,")
    );
    assert!(throws_error(
        "'use strict'; const o = Object.freeze({ a: 1 }); o.a = 2;",
        "Cannot assign to read only property 'a'"
    ));
    assert!(matches!(
        eval_result("'use strict'; const o = Object.preventExtensions({}); o.fresh = 1;"),
        Err(JsError::TypeError { .. })
    ));
}

#[test]
fn test_getter_only_property_write() {
    assert_eq!(
        eval("const o = { get v() { return 1; } }; o.v = 5; o.v"),
        JsValue::Number(1.0)
    );
    assert!(matches!(
        eval_result("'use strict'; const o = { get v() { return 1; } }; o.v = 5;"),
        Err(JsError::TypeError { .. })
    ));
}

#[test]
fn test_primitive_property_write() {
    assert_eq!(eval("const s = 'abc'; s.extra = 1; s.extra"), JsValue::Undefined);
}

#[test]
fn test_const_assignment_throws_in_both_modes() {
    assert!(throws_error("const c = 1; c = 2;", "Assignment to constant variable"));
    assert!(throws_error("'use strict'; const c = 1; c = 2;", "Assignment to constant variable"));
}

#[test]
fn test_strict_no_assign_eval() {
    assert!(is_syntax_error("'use strict'; eval = 1;"));
    assert!(is_syntax_error("'use strict'; arguments = 1;"));
    assert!(is_syntax_error("'use strict'; [eval] = [1];"));
}

// ============================================================================
// Reserved binding names
// ============================================================================

#[test]
fn test_strict_no_eval_or_arguments_bindings() {
    for decl in ["var", "let", "const"] {
        for name in ["eval", "arguments"] {
            let source = format!("'use strict'; {} {} = 1;", decl, name);
            assert!(is_syntax_error(&source), "{} should be rejected", source);
        }
    }
}

#[test]
fn test_strict_no_eval_or_arguments_params() {
    assert!(is_syntax_error("'use strict'; function f(eval) { return eval; }"));
    assert!(is_syntax_error("'use strict'; function f(arguments) { return arguments; }"));
    assert!(is_syntax_error("function eval() { 'use strict'; }"));
}

#[test]
fn test_strict_reserved_words() {
    assert!(is_syntax_error("'use strict'; var interface = 1;"));
    assert!(is_syntax_error("'use strict'; let static = 1;"));
    assert_eq!(eval("var interface = 1; interface"), JsValue::Number(1.0));
}

// ============================================================================
// Duplicate parameter names
// ============================================================================

#[test]
fn test_duplicate_params() {
    assert_eq!(eval("function f(a, a) { return a; } f(1, 2)"), JsValue::Number(2.0));
    assert!(is_syntax_error("'use strict'; function f(a, a) { return a; }"));
    assert!(is_syntax_error("const f = (a, a) => a;"));
    assert!(is_syntax_error("function f(a, [a]) {}"));
}

// ============================================================================
// delete
// ============================================================================

#[test]
fn test_strict_no_delete_identifier() {
    assert!(is_syntax_error("'use strict'; var x = 1; delete x;"));
    assert!(is_syntax_error("'use strict'; var x = 1; delete (x);"));
}

#[test]
fn test_delete_non_configurable() {
    assert_eq!(eval("delete Math.PI"), JsValue::Boolean(false));
    assert!(throws_error(
        "'use strict'; delete Math.PI",
        "Cannot delete property 'PI'"
    ));
}

#[test]
fn test_strict_delete_property_allowed() {
    let result = eval("'use strict'; const obj = { x: 1 }; delete obj.x; obj.x");
    assert_eq!(result, JsValue::Undefined);
}

// ============================================================================
// Function declarations in statement position
// ============================================================================

#[test]
fn test_strict_function_in_if_body() {
    assert!(is_syntax_error("'use strict'; if (true) function f() {}"));
}

#[test]
fn test_block_function_visible_outside_in_sloppy_mode() {
    assert_eq!(
        eval("{ function inner() { return 1; } } typeof inner"),
        JsValue::from("function")
    );
    assert_eq!(
        eval("'use strict'; { function inner() { return 1; } } typeof inner"),
        JsValue::from("undefined")
    );
}

// ============================================================================
// arguments
// ============================================================================

#[test]
fn test_arguments_callee() {
    assert_eq!(
        eval("function f() { return arguments.callee === f; } f()"),
        JsValue::Boolean(true)
    );
    assert!(throws_error(
        "function f() { 'use strict'; return arguments.callee; } f()",
        "'callee' may not be accessed on strict mode arguments objects"
    ));
}

#[test]
fn test_arguments_not_linked_to_parameters() {
    assert_eq!(
        eval("function f(a) { a = 2; return arguments[0]; } f(1)"),
        JsValue::Number(1.0)
    );
}

// ============================================================================
// Unsupported legacy syntax
// ============================================================================

#[test]
fn test_no_legacy_octal() {
    assert!(is_syntax_error("0777"));
    assert_eq!(eval("0o777"), JsValue::Number(511.0));
}

#[test]
fn test_no_octal_escape() {
    assert!(is_syntax_error(r#""\077""#));
    assert_eq!(eval(r#""\0".length"#), JsValue::Number(1.0));
}

#[test]
fn test_no_with_statement() {
    assert!(is_syntax_error("with ({}) {}"));
}
