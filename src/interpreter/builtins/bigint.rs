//! BigInt built-in function and prototype methods

use num_bigint::BigInt;
use num_traits::FromPrimitive;

use crate::error::JsError;
use crate::interpreter::{Interpreter, PreferredType};
use crate::interpreter::operations::string_to_bigint;
use crate::value::{CheapClone, ExoticObject, JsBigInt, JsObjectRef, JsValue};

/// Initialize BigInt.prototype with toString, valueOf
pub fn init_bigint_prototype(interp: &mut Interpreter) {
    let proto = interp.intrinsics.bigint_prototype.cheap_clone();

    interp.register_method(&proto, "toString", bigint_to_string, 0);
    interp.register_method(&proto, "valueOf", bigint_value_of, 0);
}

/// Create the BigInt function. `new BigInt()` is a TypeError.
pub fn create_bigint_constructor(interp: &mut Interpreter) -> JsObjectRef {
    let constructor = interp.create_native_function("BigInt", bigint_constructor_fn, 1);
    let proto = interp.intrinsics.bigint_prototype.cheap_clone();
    super::link_constructor(interp, &constructor, &proto);
    constructor
}

/// `BigInt(value)`: integral Numbers, numeric strings and booleans convert
pub fn bigint_constructor_fn(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let value = args.first().cloned().unwrap_or_default();
    let prim = interp.to_primitive(&value, PreferredType::Number)?;
    match prim {
        JsValue::Number(n) => {
            if !n.is_finite() || n.trunc() != n {
                return Err(JsError::range_error(format!(
                    "The number {} cannot be converted to a BigInt because it is not an integer",
                    prim.describe()
                )));
            }
            let b = BigInt::from_f64(n).unwrap_or_default();
            Ok(JsValue::BigInt(JsBigInt::from(b)))
        }
        other => Ok(JsValue::BigInt(to_bigint(&other)?)),
    }
}

/// ToBigInt on an already primitive value
pub fn to_bigint(value: &JsValue) -> Result<JsBigInt, JsError> {
    match value {
        JsValue::BigInt(b) => Ok(b.cheap_clone()),
        JsValue::Boolean(b) => Ok(JsBigInt::from(BigInt::from(u8::from(*b)))),
        JsValue::String(s) => string_to_bigint(s.as_str())
            .map(JsBigInt::from)
            .ok_or_else(|| JsError::syntax_error(format!("Cannot convert {} to a BigInt", s), 0, 0)),
        other => Err(JsError::type_error(format!(
            "Cannot convert {} to a BigInt",
            other.describe()
        ))),
    }
}

/// thisBigIntValue
fn this_bigint_value(this: &JsValue, method: &str) -> Result<JsBigInt, JsError> {
    match this {
        JsValue::BigInt(b) => Ok(b.cheap_clone()),
        JsValue::Object(obj) => match &obj.borrow().exotic {
            ExoticObject::Primitive(JsValue::BigInt(b)) => Ok(b.cheap_clone()),
            _ => Err(JsError::type_error(format!(
                "BigInt.prototype.{} requires that 'this' be a BigInt",
                method
            ))),
        },
        _ => Err(JsError::type_error(format!(
            "BigInt.prototype.{} requires that 'this' be a BigInt",
            method
        ))),
    }
}

/// BigInt.prototype.toString(radix)
pub fn bigint_to_string(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let b = this_bigint_value(&this, "toString")?;
    let radix = match args.first() {
        None | Some(JsValue::Undefined) => 10.0,
        Some(r) => interp.to_integer_or_infinity(r)?,
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(JsError::range_error("toString() radix must be between 2 and 36"));
    }
    Ok(JsValue::from(b.value().to_str_radix(radix as u32)))
}

pub fn bigint_value_of(_interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::BigInt(this_bigint_value(&this, "valueOf")?))
}
