//! Math built-in methods

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::interpreter::operations::number_pow;
use crate::value::{CheapClone, JsObjectRef, JsValue, Property, PropertyKey};

/// Create Math object with all math methods and constants
pub fn create_math_object(interp: &mut Interpreter) -> JsObjectRef {
    let math = interp.create_object();

    let constants = [
        ("PI", std::f64::consts::PI),
        ("E", std::f64::consts::E),
        ("LN2", std::f64::consts::LN_2),
        ("LN10", std::f64::consts::LN_10),
        ("LOG2E", std::f64::consts::LOG2_E),
        ("LOG10E", std::f64::consts::LOG10_E),
        ("SQRT2", std::f64::consts::SQRT_2),
        ("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
    ];
    for (name, value) in constants {
        let key = interp.key(name);
        math.borrow_mut()
            .define_property(key, Property::with_attributes(JsValue::Number(value), false, false, false));
    }

    // Rounding methods
    interp.register_method(&math, "abs", math_abs, 1);
    interp.register_method(&math, "floor", math_floor, 1);
    interp.register_method(&math, "ceil", math_ceil, 1);
    interp.register_method(&math, "round", math_round, 1);
    interp.register_method(&math, "trunc", math_trunc, 1);
    interp.register_method(&math, "sign", math_sign, 1);

    // Min/max
    interp.register_method(&math, "min", math_min, 2);
    interp.register_method(&math, "max", math_max, 2);

    // Power, root and logarithm functions
    interp.register_method(&math, "pow", math_pow, 2);
    interp.register_method(&math, "sqrt", math_sqrt, 1);
    interp.register_method(&math, "cbrt", math_cbrt, 1);
    interp.register_method(&math, "hypot", math_hypot, 2);
    interp.register_method(&math, "exp", math_exp, 1);
    interp.register_method(&math, "log", math_log, 1);
    interp.register_method(&math, "log2", math_log2, 1);
    interp.register_method(&math, "log10", math_log10, 1);

    // Trigonometry
    interp.register_method(&math, "sin", math_sin, 1);
    interp.register_method(&math, "cos", math_cos, 1);
    interp.register_method(&math, "tan", math_tan, 1);
    interp.register_method(&math, "atan", math_atan, 1);
    interp.register_method(&math, "atan2", math_atan2, 2);

    let tag = PropertyKey::Symbol(interp.symbols.to_string_tag.cheap_clone());
    math.borrow_mut()
        .define_property(tag, Property::with_attributes(JsValue::from("Math"), false, false, true));

    math
}

/// ToNumber of the i-th argument; missing arguments are NaN
fn number_arg(interp: &mut Interpreter, args: &[JsValue], index: usize) -> Result<f64, JsError> {
    match args.get(index) {
        Some(v) => interp.to_number(v),
        None => Ok(f64::NAN),
    }
}

fn unary(interp: &mut Interpreter, args: &[JsValue], f: fn(f64) -> f64) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(f(number_arg(interp, args, 0)?)))
}

pub fn math_abs(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    unary(interp, args, libm::fabs)
}

pub fn math_floor(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    unary(interp, args, libm::floor)
}

pub fn math_ceil(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    unary(interp, args, libm::ceil)
}

pub fn math_trunc(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    unary(interp, args, libm::trunc)
}

/// Math.round rounds half-way cases towards +Infinity, keeping -0
pub fn math_round(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    unary(interp, args, js_round)
}

fn js_round(n: f64) -> f64 {
    if !n.is_finite() || n == 0.0 {
        return n;
    }
    if n < 0.0 && n >= -0.5 {
        return -0.0;
    }
    let floor = libm::floor(n);
    if n - floor >= 0.5 { floor + 1.0 } else { floor }
}

pub fn math_sign(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let n = number_arg(interp, args, 0)?;
    let result = if n.is_nan() || n == 0.0 {
        n
    } else if n > 0.0 {
        1.0
    } else {
        -1.0
    };
    Ok(JsValue::Number(result))
}

/// Every argument is converted before the result is decided
fn coerce_all(interp: &mut Interpreter, args: &[JsValue]) -> Result<Vec<f64>, JsError> {
    args.iter().map(|a| interp.to_number(a)).collect()
}

pub fn math_min(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut min = f64::INFINITY;
    for n in coerce_all(interp, args)? {
        if n.is_nan() {
            return Ok(JsValue::Number(f64::NAN));
        }
        // -0 is smaller than +0
        if n < min || (n == 0.0 && min == 0.0 && n.is_sign_negative()) {
            min = n;
        }
    }
    Ok(JsValue::Number(min))
}

pub fn math_max(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut max = f64::NEG_INFINITY;
    for n in coerce_all(interp, args)? {
        if n.is_nan() {
            return Ok(JsValue::Number(f64::NAN));
        }
        if n > max || (n == 0.0 && max == 0.0 && max.is_sign_negative()) {
            max = n;
        }
    }
    Ok(JsValue::Number(max))
}

pub fn math_pow(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let base = number_arg(interp, args, 0)?;
    let exponent = number_arg(interp, args, 1)?;
    Ok(JsValue::Number(number_pow(base, exponent)))
}

pub fn math_sqrt(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    unary(interp, args, libm::sqrt)
}

pub fn math_cbrt(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    unary(interp, args, libm::cbrt)
}

pub fn math_hypot(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let values = coerce_all(interp, args)?;
    if values.iter().any(|n| n.is_infinite()) {
        return Ok(JsValue::Number(f64::INFINITY));
    }
    let sum: f64 = values.iter().map(|n| n * n).sum();
    Ok(JsValue::Number(libm::sqrt(sum)))
}

pub fn math_exp(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    unary(interp, args, libm::exp)
}

pub fn math_log(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    unary(interp, args, libm::log)
}

pub fn math_log2(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    unary(interp, args, libm::log2)
}

pub fn math_log10(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    unary(interp, args, libm::log10)
}

pub fn math_sin(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    unary(interp, args, libm::sin)
}

pub fn math_cos(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    unary(interp, args, libm::cos)
}

pub fn math_tan(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    unary(interp, args, libm::tan)
}

pub fn math_atan(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    unary(interp, args, libm::atan)
}

pub fn math_atan2(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let y = number_arg(interp, args, 0)?;
    let x = number_arg(interp, args, 1)?;
    Ok(JsValue::Number(libm::atan2(y, x)))
}
