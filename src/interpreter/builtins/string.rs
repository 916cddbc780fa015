//! String built-in methods
//!
//! Positions are UTF-16 code unit offsets, as in every other engine. Strings
//! are stored as UTF-8, so each method works on the encoded units and
//! re-assembles the result.

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{
    CheapClone, ExoticObject, IterationKind, JsObjectRef, JsString, JsValue, MAX_STRING_LENGTH, is_js_whitespace,
};

/// Initialize String.prototype with all string methods.
/// The prototype object must already exist in `interp.intrinsics.string_prototype`.
pub fn init_string_prototype(interp: &mut Interpreter) {
    let proto = interp.intrinsics.string_prototype.cheap_clone();
    proto.borrow_mut().exotic = ExoticObject::Primitive(JsValue::String(JsString::from("")));

    // Character access
    interp.register_method(&proto, "charAt", string_char_at, 1);
    interp.register_method(&proto, "charCodeAt", string_char_code_at, 1);
    interp.register_method(&proto, "at", string_at, 1);

    // Search methods
    interp.register_method(&proto, "indexOf", string_index_of, 1);
    interp.register_method(&proto, "includes", string_includes, 1);
    interp.register_method(&proto, "startsWith", string_starts_with, 1);
    interp.register_method(&proto, "endsWith", string_ends_with, 1);

    // Extraction methods
    interp.register_method(&proto, "slice", string_slice, 2);
    interp.register_method(&proto, "substring", string_substring, 2);

    // Case conversion
    interp.register_method(&proto, "toLowerCase", string_to_lower_case, 0);
    interp.register_method(&proto, "toUpperCase", string_to_upper_case, 0);

    // Whitespace handling
    interp.register_method(&proto, "trim", string_trim, 0);

    // Transformation methods
    interp.register_method(&proto, "split", string_split, 2);
    interp.register_method(&proto, "repeat", string_repeat, 1);
    interp.register_method(&proto, "padStart", string_pad_start, 2);
    interp.register_method(&proto, "concat", string_concat, 1);

    // Primitive conversion
    interp.register_method(&proto, "valueOf", string_value_of, 0);
    interp.register_method(&proto, "toString", string_to_string, 0);

    let iterator = interp.symbols.iterator.cheap_clone();
    interp.register_symbol_method(&proto, iterator, "[Symbol.iterator]", string_iterator, 0);
}

/// Create String constructor with `fromCharCode`
pub fn create_string_constructor(interp: &mut Interpreter) -> JsObjectRef {
    let constructor = interp.create_native_constructor("String", string_constructor_fn, string_construct, 1);
    interp.register_method(&constructor, "fromCharCode", string_from_char_code, 1);

    let proto = interp.intrinsics.string_prototype.cheap_clone();
    super::link_constructor(interp, &constructor, &proto);
    constructor
}

/// `String(value)`: symbols convert to their descriptive string here,
/// unlike in ToString
pub fn string_constructor_fn(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    match args.first() {
        None => Ok(JsValue::String(interp.intern(""))),
        Some(JsValue::Symbol(sym)) => Ok(JsValue::from(sym.descriptive_string())),
        Some(value) => Ok(JsValue::String(interp.to_string(value)?)),
    }
}

/// `new String(value)`: a String wrapper object
pub fn string_construct(interp: &mut Interpreter, args: &[JsValue], new_target: &JsObjectRef) -> Result<JsValue, JsError> {
    let s = match args.first() {
        None => interp.intern(""),
        Some(value) => interp.to_string(value)?,
    };
    let default = interp.intrinsics.string_prototype.cheap_clone();
    super::create_primitive_wrapper(interp, JsValue::String(s), new_target, default)
}

/// thisStringValue: the primitive behind a string or String wrapper
fn this_string_value(this: &JsValue, method: &str) -> Result<JsString, JsError> {
    match this {
        JsValue::String(s) => Ok(s.cheap_clone()),
        JsValue::Object(obj) => match &obj.borrow().exotic {
            ExoticObject::Primitive(JsValue::String(s)) => Ok(s.cheap_clone()),
            _ => Err(JsError::type_error(format!(
                "String.prototype.{} requires that 'this' be a String",
                method
            ))),
        },
        _ => Err(JsError::type_error(format!(
            "String.prototype.{} requires that 'this' be a String",
            method
        ))),
    }
}

/// RequireObjectCoercible(this) then ToString, as UTF-16 units
fn this_units(interp: &mut Interpreter, this: &JsValue, method: &str) -> Result<Vec<u16>, JsError> {
    if this.is_nullish() {
        return Err(JsError::type_error(format!(
            "String.prototype.{} called on null or undefined",
            method
        )));
    }
    Ok(interp.to_string(this)?.as_str().encode_utf16().collect())
}

fn arg_units(interp: &mut Interpreter, args: &[JsValue], index: usize) -> Result<Vec<u16>, JsError> {
    let value = args.get(index).cloned().unwrap_or_default();
    Ok(interp.to_string(&value)?.as_str().encode_utf16().collect())
}

fn units_value(units: &[u16]) -> JsValue {
    JsValue::from(String::from_utf16_lossy(units))
}

/// Clamp an integer argument into `0..=len`, with `default` for undefined
fn clamp_position(interp: &mut Interpreter, value: Option<&JsValue>, len: usize, default: usize) -> Result<usize, JsError> {
    match value.filter(|v| !v.is_undefined()) {
        None => Ok(default),
        Some(v) => Ok(interp.to_integer_or_infinity(v)?.clamp(0.0, len as f64) as usize),
    }
}

/// Like [`clamp_position`], but negative values count from the end
fn relative_position(interp: &mut Interpreter, value: Option<&JsValue>, len: usize, default: usize) -> Result<usize, JsError> {
    match value.filter(|v| !v.is_undefined()) {
        None => Ok(default),
        Some(v) => {
            let n = interp.to_integer_or_infinity(v)?;
            let len_f = len as f64;
            Ok(if n < 0.0 { (len_f + n).max(0.0) as usize } else { n.min(len_f) as usize })
        }
    }
}

fn find_units(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return (from <= haystack.len()).then_some(from);
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .skip(from)
        .find(|(_, window)| *window == needle)
        .map(|(i, _)| i)
}

pub fn string_value_of(_interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::String(this_string_value(&this, "valueOf")?))
}

pub fn string_to_string(_interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::String(this_string_value(&this, "toString")?))
}

pub fn string_char_at(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "charAt")?;
    let pos = interp.to_integer_or_infinity(&args.first().cloned().unwrap_or_default())?;
    if pos < 0.0 || pos >= units.len() as f64 {
        return Ok(JsValue::String(interp.intern("")));
    }
    let i = pos as usize;
    Ok(units_value(units.get(i..=i).unwrap_or_default()))
}

pub fn string_char_code_at(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "charCodeAt")?;
    let pos = interp.to_integer_or_infinity(&args.first().cloned().unwrap_or_default())?;
    if pos < 0.0 {
        return Ok(JsValue::Number(f64::NAN));
    }
    Ok(JsValue::Number(
        units.get(pos as usize).map_or(f64::NAN, |u| f64::from(*u)),
    ))
}

pub fn string_at(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "at")?;
    let n = interp.to_integer_or_infinity(&args.first().cloned().unwrap_or_default())?;
    let k = if n < 0.0 { units.len() as f64 + n } else { n };
    if k < 0.0 || k >= units.len() as f64 {
        return Ok(JsValue::Undefined);
    }
    let i = k as usize;
    Ok(units_value(units.get(i..=i).unwrap_or_default()))
}

pub fn string_index_of(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "indexOf")?;
    let search = arg_units(interp, args, 0)?;
    let from = clamp_position(interp, args.get(1), units.len(), 0)?;
    Ok(JsValue::Number(
        find_units(&units, &search, from).map_or(-1.0, |i| i as f64),
    ))
}

pub fn string_includes(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "includes")?;
    let search = arg_units(interp, args, 0)?;
    let from = clamp_position(interp, args.get(1), units.len(), 0)?;
    Ok(JsValue::Boolean(find_units(&units, &search, from).is_some()))
}

pub fn string_starts_with(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "startsWith")?;
    let search = arg_units(interp, args, 0)?;
    let start = clamp_position(interp, args.get(1), units.len(), 0)?;
    let rest = units.get(start..).unwrap_or_default();
    Ok(JsValue::Boolean(rest.starts_with(&search)))
}

pub fn string_ends_with(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "endsWith")?;
    let search = arg_units(interp, args, 0)?;
    let end = clamp_position(interp, args.get(1), units.len(), units.len())?;
    let head = units.get(..end).unwrap_or_default();
    Ok(JsValue::Boolean(head.ends_with(&search)))
}

pub fn string_slice(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "slice")?;
    let len = units.len();
    let start = relative_position(interp, args.first(), len, 0)?;
    let end = relative_position(interp, args.get(1), len, len)?;
    Ok(units_value(units.get(start..end.max(start)).unwrap_or_default()))
}

pub fn string_substring(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "substring")?;
    let len = units.len();
    let start = clamp_position(interp, args.first(), len, 0)?;
    let end = clamp_position(interp, args.get(1), len, len)?;
    let (from, to) = if start <= end { (start, end) } else { (end, start) };
    Ok(units_value(units.get(from..to).unwrap_or_default()))
}

pub fn string_to_lower_case(interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "toLowerCase")?;
    Ok(JsValue::from(String::from_utf16_lossy(&units).to_lowercase()))
}

pub fn string_to_upper_case(interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "toUpperCase")?;
    Ok(JsValue::from(String::from_utf16_lossy(&units).to_uppercase()))
}

pub fn string_trim(interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "trim")?;
    let s = String::from_utf16_lossy(&units);
    Ok(JsValue::from(s.trim_matches(is_js_whitespace)))
}

/// String.prototype.split(separator, limit) with a string separator
pub fn string_split(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "split")?;
    let limit = match args.get(1) {
        None | Some(JsValue::Undefined) => u32::MAX,
        Some(v) => interp.to_uint32(v)?,
    } as usize;
    let separator = match args.first() {
        None | Some(JsValue::Undefined) => None,
        Some(_) => Some(arg_units(interp, args, 0)?),
    };

    let mut parts: Vec<JsValue> = Vec::new();
    match separator {
        _ if limit == 0 => {}
        None => parts.push(units_value(&units)),
        Some(sep) if sep.is_empty() => {
            parts.extend(units.chunks(1).take(limit).map(units_value));
        }
        Some(sep) => {
            let mut start = 0;
            while let Some(found) = find_units(&units, &sep, start) {
                if parts.len() >= limit {
                    break;
                }
                parts.push(units_value(units.get(start..found).unwrap_or_default()));
                start = found + sep.len();
            }
            if parts.len() < limit {
                parts.push(units_value(units.get(start..).unwrap_or_default()));
            }
        }
    }
    Ok(JsValue::Object(interp.create_array(parts)))
}

pub fn string_repeat(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "repeat")?;
    let count = interp.to_integer_or_infinity(&args.first().cloned().unwrap_or_default())?;
    if count < 0.0 || count.is_infinite() {
        return Err(JsError::range_error(format!("Invalid count value: {}", count)));
    }
    let count = count as usize;
    if units.len().saturating_mul(count) > MAX_STRING_LENGTH {
        return Err(JsError::invalid_string_length());
    }
    let s = String::from_utf16_lossy(&units);
    Ok(JsValue::from(s.repeat(count)))
}

pub fn string_pad_start(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "padStart")?;
    let max_length = interp.to_integer_or_infinity(&args.first().cloned().unwrap_or_default())?;
    let filler = match args.get(1) {
        None | Some(JsValue::Undefined) => vec![u16::from(b' ')],
        Some(_) => arg_units(interp, args, 1)?,
    };
    if max_length <= units.len() as f64 || filler.is_empty() {
        return Ok(units_value(&units));
    }
    if max_length > MAX_STRING_LENGTH as f64 {
        return Err(JsError::invalid_string_length());
    }
    let fill_len = max_length as usize - units.len();
    let mut padded: Vec<u16> = filler.iter().copied().cycle().take(fill_len).collect();
    padded.extend_from_slice(&units);
    Ok(units_value(&padded))
}

pub fn string_concat(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "concat")?;
    let mut out = String::from_utf16_lossy(&units);
    for arg in args {
        out.push_str(interp.to_string(arg)?.as_str());
    }
    Ok(JsValue::from(out))
}

/// String.fromCharCode(...codes)
pub fn string_from_char_code(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut units = Vec::with_capacity(args.len());
    for arg in args {
        units.push(interp.to_uint32(arg)? as u16);
    }
    Ok(units_value(&units))
}

/// String.prototype[@@iterator]: iterates code points
pub fn string_iterator(interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let units = this_units(interp, &this, "[Symbol.iterator]")?;
    let code_points: Vec<JsValue> = char::decode_utf16(units.iter().copied())
        .map(|c| JsValue::from(c.unwrap_or(char::REPLACEMENT_CHARACTER).to_string()))
        .collect();
    let list = interp.create_array(code_points);
    Ok(JsValue::Object(super::create_array_iterator(
        interp,
        JsValue::Object(list),
        IterationKind::Values,
    )))
}
