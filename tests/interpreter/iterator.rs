//! Iteration protocol tests: custom iterables, spread, and iterator closing

use super::{eval, eval_string, throws_error};
use ecma_eval::JsValue;

#[test]
fn test_spread_with_custom_iterator() {
    // Test spread operator using Symbol.iterator protocol
    assert_eq!(
        eval(
            r#"
            const iter = {};
            iter[Symbol.iterator] = function() {
                let count = 0;
                return {
                    next: function() {
                        count += 1;
                        return { done: count === 3, value: count };
                    }
                };
            };

            const result = [...iter];
            JSON.stringify(result)
        "#
        ),
        JsValue::from("[1,2]")
    );
}

#[test]
fn test_spread_in_function_call_with_custom_iterator() {
    // Test spread operator in function call using Symbol.iterator
    assert_eq!(
        eval(
            r#"
            const iter = {};
            iter[Symbol.iterator] = function() {
                let count = 0;
                return {
                    next: function() {
                        count += 1;
                        return { done: count === 3, value: count };
                    }
                };
            };

            function sum(a, b) {
                return a + b;
            }

            sum(...iter)
        "#
        ),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_for_of_with_custom_iterator() {
    // Test for-of loop using Symbol.iterator protocol
    assert_eq!(
        eval(
            r#"
            const iter = {};
            iter[Symbol.iterator] = function() {
                let count = 0;
                return {
                    next: function() {
                        count += 1;
                        return { done: count === 4, value: count * 10 };
                    }
                };
            };

            let sum = 0;
            for (const v of iter) {
                sum += v;
            }
            sum
        "#
        ),
        JsValue::Number(60.0) // 10 + 20 + 30 = 60
    );
}

#[test]
fn test_iterator_close_on_break() {
    // Iterator close protocol: return() should be called on early exit
    assert_eq!(
        eval(
            r#"
            let returnCalled = 0;
            const iter = {
                [Symbol.iterator]() {
                    return {
                        next() { return { value: 1, done: false }; },
                        return() {
                            returnCalled = 1;
                            return { done: true };
                        }
                    };
                }
            };
            for (const x of iter) {
                break;
            }
            returnCalled
        "#
        ),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_iterator_close_on_return() {
    // Iterator close protocol: return() called when function returns early
    assert_eq!(
        eval(
            r#"
            let returnCalled = 0;
            const iter = {
                [Symbol.iterator]() {
                    return {
                        next() { return { value: 1, done: false }; },
                        return() {
                            returnCalled = 1;
                            return { done: true };
                        }
                    };
                }
            };
            function test() {
                for (const x of iter) {
                    return 42;
                }
                return 0;
            }
            test();
            returnCalled
        "#
        ),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_iterator_close_on_throw() {
    // Iterator close protocol: return() called when exception is thrown
    assert_eq!(
        eval(
            r#"
            let returnCalled = 0;
            const iter = {
                [Symbol.iterator]() {
                    return {
                        next() { return { value: 1, done: false }; },
                        return() {
                            returnCalled = 1;
                            return { done: true };
                        }
                    };
                }
            };
            try {
                for (const x of iter) {
                    throw new Error("test");
                }
            } catch (e) {
                // caught
            }
            returnCalled
        "#
        ),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_iterator_close_not_called_on_normal_completion() {
    // return() should NOT be called when loop completes normally
    assert_eq!(
        eval(
            r#"
            let returnCalled = 0;
            const iter = {
                [Symbol.iterator]() {
                    let count = 0;
                    return {
                        next() {
                            count += 1;
                            return { value: count, done: count > 3 };
                        },
                        return() {
                            returnCalled = 1;
                            return { done: true };
                        }
                    };
                }
            };
            let sum = 0;
            for (const x of iter) {
                sum += x;
            }
            returnCalled  // Should be 0 - return() not called for normal completion
        "#
        ),
        JsValue::Number(0.0)
    );
}

/// Script prelude defining `tracked(values)`: an iterable over `values`
/// that counts `next` and `return` calls in `log`
const TRACKED: &str = r#"
    const log = { next: 0, returns: 0 };
    function tracked(values) {
        return {
            [Symbol.iterator]() {
                let i = 0;
                return {
                    next() {
                        log.next++;
                        return i < values.length ? { value: values[i++], done: false } : { value: undefined, done: true };
                    },
                    return() {
                        log.returns++;
                        return { done: true };
                    },
                };
            },
        };
    }
"#;

fn with_tracked(body: &str) -> String {
    format!("{}\n{}", TRACKED, body)
}

#[test]
fn test_close_exactly_once_on_each_abrupt_exit() {
    assert_eq!(
        eval_string(&with_tracked(
            r#"
            for (const x of tracked([1, 2, 3])) { if (x === 2) break; }
            (function () { for (const x of tracked([1, 2])) { return x; } })();
            try { for (const x of tracked([1])) { throw new Error("boom"); } } catch (e) {}
            outer: for (const a of [1, 2]) { for (const b of tracked([1, 2])) { continue outer; } }
            log.returns + ":" + log.next
        "#
        )),
        "5:6"
    );
}

#[test]
fn test_no_close_when_exhausted() {
    assert_eq!(
        eval_string(&with_tracked(
            r#"
            for (const x of tracked([1, 2])) {}
            [...tracked([1, 2, 3])];
            log.returns + ":" + log.next
        "#
        )),
        "0:7"
    );
}

#[test]
fn test_continue_does_not_close() {
    assert_eq!(
        eval(&with_tracked(
            r#"
            let sum = 0;
            for (const x of tracked([1, 2, 3])) { if (x === 2) continue; sum += x; }
            sum * 10 + log.returns
        "#
        )),
        JsValue::Number(40.0)
    );
}

#[test]
fn test_destructuring_closes_unfinished_iterator() {
    assert_eq!(
        eval_string(&with_tracked(
            r#"
            const [first] = tracked([1, 2, 3]);
            const [a, b, c] = tracked([1, 2]);
            const [...all] = tracked([1, 2]);
            first + "," + c + "," + all.length + "," + log.returns
        "#
        )),
        "1,undefined,2,1"
    );
}

#[test]
fn test_throw_inside_return_is_superseded() {
    assert_eq!(
        eval_string(
            r#"
            const iter = {
                [Symbol.iterator]() {
                    return {
                        next() { return { value: 1, done: false }; },
                        return() { throw new Error("from return"); },
                    };
                },
            };
            let message;
            try { for (const x of iter) { throw new Error("from body"); } } catch (e) { message = e.message; }
            message
        "#
        ),
        "from body"
    );
}

#[test]
fn test_throw_inside_return_surfaces_on_break() {
    assert!(throws_error(
        r#"
        const iter = {
            [Symbol.iterator]() {
                return {
                    next() { return { value: 1, done: false }; },
                    return() { throw new Error("from return"); },
                };
            },
        };
        for (const x of iter) { break; }
    "#,
        "from return"
    ));
}

#[test]
fn test_return_must_produce_object() {
    assert!(throws_error(
        r#"
        const iter = {
            [Symbol.iterator]() {
                return { next() { return { value: 1, done: false }; }, return() { return 1; } };
            },
        };
        for (const x of iter) { break; }
    "#,
        "Iterator result 1 is not an object"
    ));
}

#[test]
fn test_error_from_next_does_not_close() {
    assert_eq!(
        eval_string(
            r#"
            let closed = false;
            const iter = {
                [Symbol.iterator]() {
                    return {
                        next() { throw new Error("bad next"); },
                        return() { closed = true; return {}; },
                    };
                },
            };
            let message;
            try { for (const x of iter) {} } catch (e) { message = e.message; }
            message + ":" + closed
        "#
        ),
        "bad next:false"
    );
}

#[test]
fn test_non_object_iterator_results() {
    assert!(throws_error(
        "const it = { [Symbol.iterator]() { return { next() { return 5; } }; } }; for (const x of it) {}",
        "Iterator result 5 is not an object"
    ));
    assert!(throws_error(
        "const it = { [Symbol.iterator]() { return 5; } }; [...it]",
        "Result of the Symbol.iterator method is not an object"
    ));
}

#[test]
fn test_not_iterable_errors() {
    assert!(throws_error("for (const x of 5) {}", "5 is not iterable"));
    assert!(throws_error("[...{}]", "is not iterable"));
    assert!(throws_error("const [a] = null;", "null is not iterable"));
    assert!(throws_error("Math.max(...undefined)", "undefined is not iterable"));
}

#[test]
fn test_next_method_read_once() {
    assert_eq!(
        eval(
            r#"
            let reads = 0;
            const it = {
                [Symbol.iterator]() {
                    let n = 0;
                    const iterator = {};
                    Object.defineProperty(iterator, "next", {
                        get() { reads++; return () => ({ value: n, done: n++ >= 3 }); },
                    });
                    return iterator;
                },
            };
            [...it];
            reads
        "#
        ),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_string_iteration_by_code_point() {
    assert_eq!(
        eval_string("let out = []; for (const ch of 'a😀b') out.push(ch); out.join('|')"),
        "a|😀|b"
    );
}

#[test]
fn test_arguments_and_array_like_iteration() {
    assert_eq!(
        eval_string("function f() { return [...arguments].join(); } f(1, 2, 3)"),
        "1,2,3"
    );
    assert!(throws_error("[...{ length: 1, 0: 'a' }]", "is not iterable"));
}

#[test]
fn test_iterator_prototype_returns_itself() {
    assert_eq!(
        eval("const it = [1].values(); it[Symbol.iterator]() === it"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_for_of_with_var_and_destructuring_heads() {
    assert_eq!(
        eval_string(
            r#"
            var last;
            for (last of [1, 2, 3]) {}
            let pairs = [];
            for (const { k, v = "d" } of [{ k: "a", v: 1 }, { k: "b" }]) pairs.push(k + v);
            last + ":" + pairs.join()
        "#
        ),
        "3:a1,bd"
    );
}

#[test]
fn test_for_of_closures_capture_each_value() {
    assert_eq!(
        eval_string(
            r#"
            const fns = [];
            for (const x of ["a", "b", "c"]) fns.push(() => x);
            fns.map(f => f()).join()
        "#
        ),
        "a,b,c"
    );
}
