//! Stack growth for deeply recursive parsing and evaluation
//!
//! The parser and the tree-walking evaluator recurse once per nesting level
//! of the source, so a script with deep nesting or deep JS recursion would
//! otherwise exhaust the native stack before `max_call_depth` triggers.

/// Grow the stack when less than this remains
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment
const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

/// Run `f`, first moving to a fresh stack segment if the current one is
/// nearly exhausted
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
