//! Number built-in methods

use num_bigint::BigInt;
use num_traits::FromPrimitive;

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{CheapClone, ExoticObject, JsObjectRef, JsValue, bigint_to_f64, number_to_string};

/// Initialize Number.prototype with toString, toFixed, valueOf
pub fn init_number_prototype(interp: &mut Interpreter) {
    let proto = interp.intrinsics.number_prototype.cheap_clone();
    proto.borrow_mut().exotic = ExoticObject::Primitive(JsValue::Number(0.0));

    interp.register_method(&proto, "toString", number_to_string_method, 1);
    interp.register_method(&proto, "toFixed", number_to_fixed, 1);
    interp.register_method(&proto, "valueOf", number_value_of, 0);
}

/// Create Number constructor with static predicates and constants
pub fn create_number_constructor(interp: &mut Interpreter) -> JsObjectRef {
    let constructor = interp.create_native_constructor("Number", number_constructor_fn, number_construct, 1);

    interp.register_method(&constructor, "isNaN", number_is_nan, 1);
    interp.register_method(&constructor, "isFinite", number_is_finite, 1);
    interp.register_method(&constructor, "isInteger", number_is_integer, 1);
    interp.register_method(&constructor, "isSafeInteger", number_is_safe_integer, 1);

    let constants = [
        ("MAX_SAFE_INTEGER", 9_007_199_254_740_991.0),
        ("MIN_SAFE_INTEGER", -9_007_199_254_740_991.0),
        ("MAX_VALUE", f64::MAX),
        ("MIN_VALUE", 5e-324),
        ("EPSILON", f64::EPSILON),
        ("POSITIVE_INFINITY", f64::INFINITY),
        ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
        ("NaN", f64::NAN),
    ];
    for (name, value) in constants {
        let key = interp.key(name);
        constructor.borrow_mut().define_property(
            key,
            crate::value::Property::with_attributes(JsValue::Number(value), false, false, false),
        );
    }

    let proto = interp.intrinsics.number_prototype.cheap_clone();
    super::link_constructor(interp, &constructor, &proto);
    constructor
}

/// `Number(value)`: ToNumeric, with BigInts converted to Numbers
fn number_from_args(interp: &mut Interpreter, args: &[JsValue]) -> Result<f64, JsError> {
    let Some(value) = args.first() else {
        return Ok(0.0);
    };
    match interp.to_numeric(value)? {
        crate::interpreter::Numeric::Number(n) => Ok(n),
        crate::interpreter::Numeric::BigInt(b) => Ok(bigint_to_f64(b.value())),
    }
}

pub fn number_constructor_fn(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(number_from_args(interp, args)?))
}

pub fn number_construct(interp: &mut Interpreter, args: &[JsValue], new_target: &JsObjectRef) -> Result<JsValue, JsError> {
    let n = number_from_args(interp, args)?;
    let default = interp.intrinsics.number_prototype.cheap_clone();
    super::create_primitive_wrapper(interp, JsValue::Number(n), new_target, default)
}

// Number.isNaN - stricter, no type coercion
pub fn number_is_nan(_interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(matches!(args.first(), Some(JsValue::Number(n)) if n.is_nan())))
}

// Number.isFinite - stricter, no type coercion
pub fn number_is_finite(_interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(matches!(args.first(), Some(JsValue::Number(n)) if n.is_finite())))
}

pub fn number_is_integer(_interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(matches!(
        args.first(),
        Some(JsValue::Number(n)) if n.is_finite() && n.trunc() == *n
    )))
}

pub fn number_is_safe_integer(_interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(matches!(
        args.first(),
        Some(JsValue::Number(n)) if n.is_finite() && n.trunc() == *n && n.abs() <= 9_007_199_254_740_991.0
    )))
}

/// thisNumberValue
fn this_number_value(this: &JsValue, method: &str) -> Result<f64, JsError> {
    match this {
        JsValue::Number(n) => Ok(*n),
        JsValue::Object(obj) => match &obj.borrow().exotic {
            ExoticObject::Primitive(JsValue::Number(n)) => Ok(*n),
            _ => Err(JsError::type_error(format!(
                "Number.prototype.{} requires that 'this' be a Number",
                method
            ))),
        },
        _ => Err(JsError::type_error(format!(
            "Number.prototype.{} requires that 'this' be a Number",
            method
        ))),
    }
}

pub fn number_value_of(_interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(this_number_value(&this, "valueOf")?))
}

/// Number.prototype.toString(radix)
pub fn number_to_string_method(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let n = this_number_value(&this, "toString")?;
    let radix = match args.first() {
        None | Some(JsValue::Undefined) => 10.0,
        Some(r) => interp.to_integer_or_infinity(r)?,
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(JsError::range_error("toString() radix must be between 2 and 36"));
    }
    if radix == 10.0 {
        return Ok(JsValue::from(number_to_string(n)));
    }
    Ok(JsValue::from(number_to_radix_string(n, radix as u32)))
}

const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Render a Number in a radix other than 10. The fraction is cut after 52
/// digits, which is more than an f64 mantissa holds in base 2.
pub fn number_to_radix_string(n: f64, radix: u32) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let negative = n < 0.0;
    let abs = n.abs();
    let int_part = abs.trunc();
    let mut out = BigInt::from_f64(int_part)
        .map(|b| b.to_str_radix(radix))
        .unwrap_or_else(|| "0".to_string());

    let mut frac = abs - int_part;
    if frac > 0.0 {
        out.push('.');
        let r = f64::from(radix);
        for _ in 0..52 {
            frac *= r;
            let digit = frac.trunc();
            frac -= digit;
            if let Some(&c) = DIGITS.get(digit as usize) {
                out.push(char::from(c));
            }
            if frac <= 0.0 {
                break;
            }
        }
    }
    if negative { format!("-{}", out) } else { out }
}

/// Number.prototype.toFixed(digits)
pub fn number_to_fixed(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let n = this_number_value(&this, "toFixed")?;
    let digits = interp.to_integer_or_infinity(&args.first().cloned().unwrap_or_default())?;
    if !(0.0..=100.0).contains(&digits) {
        return Err(JsError::range_error("toFixed() digits argument must be between 0 and 100"));
    }
    if !n.is_finite() || n.abs() >= 1e21 {
        return Ok(JsValue::from(number_to_string(n)));
    }
    Ok(JsValue::from(fixed_notation(n, digits as usize)))
}

/// `n` with exactly `digits` fraction digits. Rust rounds exact ties to
/// even; toFixed rounds them away from zero.
fn fixed_notation(n: f64, digits: usize) -> String {
    let n = if n == 0.0 { 0.0 } else { n };
    let scaled = n.abs() * 10f64.powi(digits as i32);
    if scaled.fract() != 0.5 || scaled >= 9_007_199_254_740_992.0 {
        return format!("{:.*}", digits, n);
    }
    let mut units = format!("{:0>width$}", scaled.ceil() as u64, width = digits + 1);
    if digits > 0 {
        units.insert(units.len() - digits, '.');
    }
    if n < 0.0 { format!("-{}", units) } else { units }
}
