//! Console built-in methods, routed to the configured `ConsoleProvider`

use std::rc::Rc;

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::platform::ConsoleLevel;
use crate::value::{JsObjectRef, JsValue};

/// Create console object with log, error, warn, info, debug methods
pub fn create_console_object(interp: &mut Interpreter) -> JsObjectRef {
    let console = interp.create_object();

    interp.register_method(&console, "log", console_log, 0);
    interp.register_method(&console, "info", console_info, 0);
    interp.register_method(&console, "debug", console_debug, 0);
    interp.register_method(&console, "warn", console_warn, 0);
    interp.register_method(&console, "error", console_error, 0);

    console
}

/// Arguments rendered the way a REPL would show them, joined by spaces
pub fn format_console_args(args: &[JsValue]) -> String {
    args.iter().map(JsValue::describe).collect::<Vec<_>>().join(" ")
}

fn write(interp: &mut Interpreter, level: ConsoleLevel, args: &[JsValue]) -> Result<JsValue, JsError> {
    let message = format_console_args(args);
    let console = Rc::clone(&interp.config.console);
    console.write(level, &message);
    Ok(JsValue::Undefined)
}

pub fn console_log(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    write(interp, ConsoleLevel::Log, args)
}

pub fn console_info(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    write(interp, ConsoleLevel::Info, args)
}

pub fn console_debug(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    write(interp, ConsoleLevel::Debug, args)
}

pub fn console_warn(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    write(interp, ConsoleLevel::Warn, args)
}

pub fn console_error(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    write(interp, ConsoleLevel::Error, args)
}
