//! Global value properties and functions (globalThis, parseInt, parseFloat, isNaN, isFinite)

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{CheapClone, JsValue, Property, is_js_whitespace};

/// Register global value properties and functions on the global object
pub fn register_global_functions(interp: &mut Interpreter) {
    let global = interp.global.cheap_clone();
    super::define_global(interp, "globalThis", JsValue::Object(global.cheap_clone()));

    // undefined, NaN and Infinity are read-only and non-configurable
    let constants = [
        ("undefined", JsValue::Undefined),
        ("NaN", JsValue::Number(f64::NAN)),
        ("Infinity", JsValue::Number(f64::INFINITY)),
    ];
    for (name, value) in constants {
        let key = interp.key(name);
        global
            .borrow_mut()
            .define_property(key, Property::with_attributes(value, false, false, false));
    }

    let functions: [(&str, crate::value::NativeFn, usize); 4] = [
        ("parseInt", global_parse_int, 2),
        ("parseFloat", global_parse_float, 1),
        ("isNaN", global_is_nan, 1),
        ("isFinite", global_is_finite, 1),
    ];
    for (name, func, arity) in functions {
        let f = interp.create_native_function(name, func, arity);
        super::define_global(interp, name, JsValue::Object(f));
    }
}

/// parseInt(string, radix)
pub fn global_parse_int(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let string = interp.to_string(&args.first().cloned().unwrap_or_default())?;
    let radix = interp.to_int32(&args.get(1).cloned().unwrap_or_default())?;

    let s = string.as_str().trim_start_matches(is_js_whitespace);

    // Handle sign
    let (negative, s) = if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    };

    let strip_prefix = radix == 0 || radix == 16;
    let mut radix = if radix == 0 { 10 } else { radix };
    if !(2..=36).contains(&radix) {
        return Ok(JsValue::Number(f64::NAN));
    }

    // A 0x prefix selects radix 16 when no other radix was requested
    let s = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(rest) if strip_prefix => {
            radix = 16;
            rest
        }
        _ => s,
    };

    let mut result = 0.0;
    let mut found_digit = false;
    for c in s.chars() {
        let Some(digit) = c.to_digit(radix as u32) else {
            break;
        };
        found_digit = true;
        result = result * f64::from(radix) + f64::from(digit);
    }

    if !found_digit {
        return Ok(JsValue::Number(f64::NAN));
    }
    Ok(JsValue::Number(if negative { -result } else { result }))
}

/// parseFloat(string): the longest decimal literal prefix
pub fn global_parse_float(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let string = interp.to_string(&args.first().cloned().unwrap_or_default())?;
    Ok(JsValue::Number(parse_float_prefix(string.as_str())))
}

fn parse_float_prefix(input: &str) -> f64 {
    let s = input.trim_start_matches(is_js_whitespace);

    let (sign, body) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, s.strip_prefix('+').unwrap_or(s)),
    };
    if body.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }

    // Find the longest valid float prefix
    let mut num_str = String::new();
    let mut has_dot = false;
    let mut has_exp = false;
    let mut digits_before_exp = false;
    let mut chars = body.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '0'..='9' => {
                num_str.push(c);
                digits_before_exp = true;
                chars.next();
            }
            '.' if !has_dot && !has_exp => {
                has_dot = true;
                num_str.push(c);
                chars.next();
            }
            'e' | 'E' if !has_exp && digits_before_exp => {
                // Only take the exponent if digits follow it
                let mut lookahead = chars.clone();
                lookahead.next();
                let mut exponent = String::from("e");
                if let Some(&sign) = lookahead.peek().filter(|c| matches!(c, '-' | '+')) {
                    exponent.push(sign);
                    lookahead.next();
                }
                if !lookahead.peek().is_some_and(char::is_ascii_digit) {
                    break;
                }
                has_exp = true;
                num_str.push_str(&exponent);
                chars = lookahead;
            }
            _ => break,
        }
    }
    if !digits_before_exp {
        return f64::NAN;
    }
    num_str.parse::<f64>().map(|n| sign * n).unwrap_or(f64::NAN)
}

// Global isNaN - converts argument to number first
pub fn global_is_nan(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let n = interp.to_number(&args.first().cloned().unwrap_or_default())?;
    Ok(JsValue::Boolean(n.is_nan()))
}

// Global isFinite - converts argument to number first
pub fn global_is_finite(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let n = interp.to_number(&args.first().cloned().unwrap_or_default())?;
    Ok(JsValue::Boolean(n.is_finite()))
}
