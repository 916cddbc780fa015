//! Tree-walking ECMAScript evaluator
//!
//! Scripts are parsed into an AST and evaluated directly. Statements produce
//! completion records, expressions produce values or references, and a
//! `throw` travels through the `Err` arm of `Result<_, JsError>`.
//!
//! # Example
//!
//! ```
//! use ecma_eval::{Runtime, JsValue};
//!
//! let mut runtime = Runtime::new();
//! let result = runtime.eval("let x = 2; x ** 3 + 1").unwrap();
//! assert_eq!(result, JsValue::Number(9.0));
//! ```

pub mod ast;
pub mod environment;
pub mod error;
pub mod gc;
pub mod hoist;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod platform;
pub mod stack;
pub mod string_dict;
pub mod value;

pub use error::{ErrorKind, JsError, SourceLocation};
pub use gc::GcStats;
pub use interpreter::{Completion, Interpreter};
pub use platform::{AwaitHandler, ConsoleLevel, ConsoleProvider, NoOpConsoleProvider, RejectThenables};
#[cfg(feature = "std")]
pub use platform::StdConsoleProvider;
pub use value::{CheapClone, JsBigInt, JsObjectRef, JsString, JsSymbol, JsValue, NativeFn, PropertyKey};

use std::rc::Rc;

use crate::ast::Program;
use crate::parser::Parser;

/// Default limit on nested calls before a RangeError is thrown
pub const DEFAULT_MAX_CALL_DEPTH: usize = 512;

/// Default number of live environments that triggers a collection
pub const DEFAULT_GC_THRESHOLD: usize = 1024;

/// Settings of a [`Runtime`]
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Calls nested deeper than this throw "Maximum call stack size exceeded"
    pub max_call_depth: usize,
    /// Live environment count above which a collection runs after a
    /// top-level evaluation
    pub gc_threshold: usize,
    /// Destination of `console.*` output
    pub console: Rc<dyn ConsoleProvider>,
    /// Resolution of `await` operands
    pub await_handler: Rc<dyn AwaitHandler>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            gc_threshold: DEFAULT_GC_THRESHOLD,
            console: default_console(),
            await_handler: Rc::new(RejectThenables),
        }
    }
}

#[cfg(feature = "std")]
fn default_console() -> Rc<dyn ConsoleProvider> {
    Rc::new(StdConsoleProvider::new())
}

#[cfg(not(feature = "std"))]
fn default_console() -> Rc<dyn ConsoleProvider> {
    Rc::new(NoOpConsoleProvider)
}

impl RuntimeConfig {
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_gc_threshold(mut self, threshold: usize) -> Self {
        self.gc_threshold = threshold;
        self
    }

    pub fn with_console(mut self, console: Rc<dyn ConsoleProvider>) -> Self {
        self.console = console;
        self
    }

    pub fn with_await_handler(mut self, handler: Rc<dyn AwaitHandler>) -> Self {
        self.await_handler = handler;
        self
    }
}

/// The main entry point: one realm plus the evaluator running in it
pub struct Runtime {
    interpreter: Interpreter,
}

impl Runtime {
    /// Create a runtime with the default configuration
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            interpreter: Interpreter::new(config),
        }
    }

    /// Parse a script without running it
    pub fn parse(&mut self, source: &str) -> Result<Program, JsError> {
        let mut parser = Parser::new(source, &mut self.interpreter.string_dict);
        parser.parse_program()
    }

    /// Parse and run a script. The result is the script's completion value;
    /// an uncaught exception is returned as the error.
    pub fn eval(&mut self, source: &str) -> Result<JsValue, JsError> {
        let program = self.parse(source)?;
        self.execute(&program)
    }

    /// Run an already parsed script
    pub fn execute(&mut self, program: &Program) -> Result<JsValue, JsError> {
        let result = self.interpreter.execute(program);
        self.interpreter.maybe_collect_garbage();
        result
    }

    /// Call a function value (script, native or bound)
    pub fn call(&mut self, callee: &JsValue, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
        let result = self.interpreter.call_function(callee, this, args);
        self.interpreter.maybe_collect_garbage();
        result
    }

    /// `new callee(...args)`
    pub fn construct(&mut self, callee: &JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
        let result = self.interpreter.construct(callee, args, None);
        self.interpreter.maybe_collect_garbage();
        result
    }

    /// Read a property of the global object
    pub fn get_global(&mut self, name: &str) -> Result<JsValue, JsError> {
        let global = self.interpreter.global_object().cheap_clone();
        let key = self.interpreter.key(name);
        let receiver = JsValue::Object(global.cheap_clone());
        self.interpreter.get(&global, &key, &receiver)
    }

    /// Write a property of the global object, as a sloppy assignment would
    pub fn set_global(&mut self, name: &str, value: JsValue) -> Result<(), JsError> {
        let global = self.interpreter.global_object().cheap_clone();
        let key = self.interpreter.key(name);
        let receiver = JsValue::Object(global.cheap_clone());
        if !self.interpreter.set(&global, &key, value, &receiver)? {
            return Err(JsError::type_error(format!(
                "Cannot assign to read only property '{}' of global object",
                name
            )));
        }
        Ok(())
    }

    /// Install a host function as a global
    ///
    /// ```
    /// use ecma_eval::{Interpreter, JsError, JsValue, Runtime};
    ///
    /// fn double(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    ///     let n = interp.to_number(&args.first().cloned().unwrap_or_default())?;
    ///     Ok(JsValue::Number(n * 2.0))
    /// }
    ///
    /// let mut runtime = Runtime::new();
    /// runtime.register_native("double", 1, double);
    /// assert_eq!(runtime.eval("double(21)").unwrap(), JsValue::Number(42.0));
    /// ```
    pub fn register_native(&mut self, name: &str, arity: usize, func: NativeFn) {
        let function = self.interpreter.create_native_function(name, func, arity);
        let global = self.interpreter.global_object().cheap_clone();
        self.interpreter.define_hidden(&global, name, JsValue::Object(function));
    }

    /// Reclaim unreachable environments now
    pub fn collect_garbage(&mut self) -> GcStats {
        self.interpreter.collect_garbage()
    }

    /// Number of environment records currently allocated
    pub fn live_environments(&self) -> usize {
        self.interpreter.live_environments()
    }

    /// Convert a script value to JSON data
    ///
    /// ```
    /// use ecma_eval::Runtime;
    /// use serde_json::json;
    ///
    /// let mut runtime = Runtime::new();
    /// let value = runtime.eval("({ name: 'x', tags: [1, 2] })").unwrap();
    /// assert_eq!(runtime.to_json(&value).unwrap(), json!({ "name": "x", "tags": [1, 2] }));
    /// ```
    pub fn to_json(&mut self, value: &JsValue) -> Result<serde_json::Value, JsError> {
        interpreter::builtins::js_value_to_json(&mut self.interpreter, value)
    }

    /// Convert JSON data to a script value
    pub fn from_json(&mut self, json: &serde_json::Value) -> JsValue {
        interpreter::builtins::json_to_js_value(&mut self.interpreter, json)
    }

    pub fn interpreter(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
