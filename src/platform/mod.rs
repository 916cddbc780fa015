//! Platform hooks supplied by the embedder.
//!
//! The evaluator never writes to a terminal or suspends on its own. Console
//! output goes through a [`ConsoleProvider`], and every `await` is handed to
//! an [`AwaitHandler`].

#[cfg(feature = "std")]
mod std_impl;

#[cfg(feature = "std")]
pub use std_impl::StdConsoleProvider;

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{JsValue, PropertyKey};

/// Log level for console output.
///
/// Maps to the different console methods: console.log(), console.warn(), etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    /// console.log() - general output
    Log,
    /// console.info() - informational messages
    Info,
    /// console.debug() - debug messages
    Debug,
    /// console.warn() - warnings
    Warn,
    /// console.error() - errors
    Error,
}

/// Trait for handling console output.
pub trait ConsoleProvider {
    /// Write a message at the specified log level.
    fn write(&self, level: ConsoleLevel, message: &str);
}

/// A no-op console provider that discards all output.
pub struct NoOpConsoleProvider;

impl ConsoleProvider for NoOpConsoleProvider {
    fn write(&self, _level: ConsoleLevel, _message: &str) {}
}

/// Resolution of `await` operands.
///
/// Async function bodies run to completion synchronously. Each `await`
/// (and each step of a `for await` loop) passes its operand here and
/// continues with the returned value; an `Err` is thrown at the `await`.
pub trait AwaitHandler {
    fn await_value(&self, interp: &mut Interpreter, value: JsValue) -> Result<JsValue, JsError>;
}

/// Default await handler: plain values pass through, thenables are
/// rejected because there is no job queue to settle them on.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectThenables;

impl AwaitHandler for RejectThenables {
    fn await_value(&self, interp: &mut Interpreter, value: JsValue) -> Result<JsValue, JsError> {
        let JsValue::Object(obj) = &value else {
            return Ok(value);
        };
        let then_key = PropertyKey::from("then");
        let then = interp.get(obj, &then_key, &value)?;
        if then.is_callable() {
            tracing::warn!("await on a thenable without an await handler");
            return Err(JsError::type_error(
                "Cannot await a thenable: no await handler is configured",
            ));
        }
        Ok(value)
    }
}
