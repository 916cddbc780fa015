//! Boolean built-in constructor and prototype methods

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{CheapClone, ExoticObject, JsObjectRef, JsValue};

/// Initialize Boolean.prototype with toString, valueOf
pub fn init_boolean_prototype(interp: &mut Interpreter) {
    let proto = interp.intrinsics.boolean_prototype.cheap_clone();
    proto.borrow_mut().exotic = ExoticObject::Primitive(JsValue::Boolean(false));

    interp.register_method(&proto, "toString", boolean_to_string, 0);
    interp.register_method(&proto, "valueOf", boolean_value_of, 0);
}

/// Create Boolean constructor with prototype property
pub fn create_boolean_constructor(interp: &mut Interpreter) -> JsObjectRef {
    let constructor = interp.create_native_constructor("Boolean", boolean_constructor_fn, boolean_construct, 1);
    let proto = interp.intrinsics.boolean_prototype.cheap_clone();
    super::link_constructor(interp, &constructor, &proto);
    constructor
}

/// Boolean(value) converts value to a primitive boolean
pub fn boolean_constructor_fn(_interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(args.first().is_some_and(JsValue::to_boolean)))
}

/// `new Boolean(value)` returns a Boolean wrapper object
pub fn boolean_construct(interp: &mut Interpreter, args: &[JsValue], new_target: &JsObjectRef) -> Result<JsValue, JsError> {
    let value = JsValue::Boolean(args.first().is_some_and(JsValue::to_boolean));
    let default = interp.intrinsics.boolean_prototype.cheap_clone();
    super::create_primitive_wrapper(interp, value, new_target, default)
}

/// thisBooleanValue
fn this_boolean_value(this: &JsValue, method: &str) -> Result<bool, JsError> {
    match this {
        JsValue::Boolean(b) => Ok(*b),
        JsValue::Object(obj) => match &obj.borrow().exotic {
            ExoticObject::Primitive(JsValue::Boolean(b)) => Ok(*b),
            _ => Err(JsError::type_error(format!(
                "Boolean.prototype.{} requires that 'this' be a Boolean",
                method
            ))),
        },
        _ => Err(JsError::type_error(format!(
            "Boolean.prototype.{} requires that 'this' be a Boolean",
            method
        ))),
    }
}

pub fn boolean_to_string(_interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let b = this_boolean_value(&this, "toString")?;
    Ok(JsValue::from(if b { "true" } else { "false" }))
}

pub fn boolean_value_of(_interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(this_boolean_value(&this, "valueOf")?))
}
