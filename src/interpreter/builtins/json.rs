//! JSON built-in methods, backed by `serde_json`

use hashbrown::HashSet;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{CheapClone, ExoticObject, JsObjectRef, JsValue, PropertyKey};

/// Create the JSON namespace object
pub fn create_json_object(interp: &mut Interpreter) -> JsObjectRef {
    let json = interp.create_object();

    interp.register_method(&json, "stringify", json_stringify, 3);
    interp.register_method(&json, "parse", json_parse, 2);

    let tag = PropertyKey::Symbol(interp.symbols.to_string_tag.cheap_clone());
    json.borrow_mut().define_property(
        tag,
        crate::value::Property::with_attributes(JsValue::from("JSON"), false, false, true),
    );
    json
}

/// JSON.stringify(value, replacer, space). A replacer is not supported and
/// is ignored.
pub fn json_stringify(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let value = args.first().cloned().unwrap_or_default();
    let indent = match args.get(2) {
        Some(JsValue::Number(n)) if *n >= 1.0 => " ".repeat(n.min(10.0) as usize),
        Some(JsValue::String(s)) => s.as_str().chars().take(10).collect(),
        _ => String::new(),
    };

    let mut stack = HashSet::new();
    let Some(json) = serialize_value(interp, &value, &mut stack)? else {
        return Ok(JsValue::Undefined);
    };

    let output = if indent.is_empty() {
        json.to_string()
    } else {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(indent.as_bytes());
        let mut ser = Serializer::with_formatter(&mut buf, formatter);
        json.serialize(&mut ser)
            .map_err(|e| JsError::internal_error(format!("JSON serialization failed: {}", e)))?;
        String::from_utf8(buf).map_err(|e| JsError::internal_error(e.to_string()))?
    };
    Ok(JsValue::from(output))
}

/// JSON.parse(text). A reviver is not supported and is ignored.
pub fn json_parse(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let text = interp.to_string(&args.first().cloned().unwrap_or_default())?;
    let json: serde_json::Value = serde_json::from_str(text.as_str())
        .map_err(|e| JsError::syntax_error(format!("JSON.parse: {}", e), 0, 0))?;
    Ok(json_to_js_value(interp, &json))
}

/// Convert a script value to JSON data. Values JSON cannot represent at the
/// top level (undefined, functions, symbols) become `null`.
pub fn js_value_to_json(interp: &mut Interpreter, value: &JsValue) -> Result<serde_json::Value, JsError> {
    let mut stack = HashSet::new();
    Ok(serialize_value(interp, value, &mut stack)?.unwrap_or(serde_json::Value::Null))
}

/// Convert JSON data to a fresh script value
pub fn json_to_js_value(interp: &mut Interpreter, json: &serde_json::Value) -> JsValue {
    match json {
        serde_json::Value::Null => JsValue::Null,
        serde_json::Value::Bool(b) => JsValue::Boolean(*b),
        serde_json::Value::Number(n) => JsValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => JsValue::from(s.as_str()),
        serde_json::Value::Array(items) => {
            let elements = items.iter().map(|item| json_to_js_value(interp, item)).collect();
            JsValue::Object(interp.create_array(elements))
        }
        serde_json::Value::Object(map) => {
            let obj = interp.create_object();
            for (k, v) in map {
                let key = interp.key(k);
                let value = json_to_js_value(interp, v);
                obj.borrow_mut().set_property(key, value);
            }
            JsValue::Object(obj)
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    // Integral values print without a fraction, -0 included
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::Number(serde_json::Number::from(n as i64));
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// SerializeJSONProperty: `None` means the value is skipped
fn serialize_value(
    interp: &mut Interpreter,
    value: &JsValue,
    stack: &mut HashSet<usize>,
) -> Result<Option<serde_json::Value>, JsError> {
    let mut value = value.clone();

    // toJSON hook
    if let JsValue::Object(obj) = &value {
        let key = interp.key("toJSON");
        let to_json = interp.get(obj, &key, &value)?;
        if to_json.is_callable() {
            value = interp.call_function(&to_json, value.clone(), &[])?;
        }
    }

    // Unwrap Number/String/Boolean/BigInt wrapper objects
    if let JsValue::Object(obj) = &value {
        let inner = match &obj.borrow().exotic {
            ExoticObject::Primitive(p) if !matches!(p, JsValue::Symbol(_)) => Some(p.clone()),
            _ => None,
        };
        if let Some(inner) = inner {
            value = match inner {
                JsValue::Number(_) => JsValue::Number(interp.to_number(&value)?),
                JsValue::String(_) => JsValue::String(interp.to_string(&value)?),
                other => other,
            };
        }
    }

    Ok(match &value {
        JsValue::Undefined | JsValue::Symbol(_) => None,
        JsValue::Null => Some(serde_json::Value::Null),
        JsValue::Boolean(b) => Some(serde_json::Value::Bool(*b)),
        JsValue::Number(n) => Some(number_to_json(*n)),
        JsValue::String(s) => Some(serde_json::Value::String(s.to_string())),
        JsValue::BigInt(_) => return Err(JsError::type_error("Do not know how to serialize a BigInt")),
        JsValue::Object(obj) if obj.borrow().is_callable() => None,
        JsValue::Object(obj) => {
            let id = std::rc::Rc::as_ptr(obj) as usize;
            if !stack.insert(id) {
                return Err(JsError::type_error("Converting circular structure to JSON"));
            }
            let result = if obj.borrow().is_array() {
                serialize_array(interp, obj, stack)
            } else {
                serialize_object(interp, obj, stack)
            };
            stack.remove(&id);
            Some(result?)
        }
    })
}

fn serialize_array(
    interp: &mut Interpreter,
    obj: &JsObjectRef,
    stack: &mut HashSet<usize>,
) -> Result<serde_json::Value, JsError> {
    let len = interp.length_of_array_like(obj)?;
    let receiver = JsValue::Object(obj.cheap_clone());
    let mut items = Vec::new();
    for i in 0..len {
        let element = interp.get(obj, &PropertyKey::from_number(i as f64), &receiver)?;
        items.push(serialize_value(interp, &element, stack)?.unwrap_or(serde_json::Value::Null));
    }
    Ok(serde_json::Value::Array(items))
}

fn serialize_object(
    interp: &mut Interpreter,
    obj: &JsObjectRef,
    stack: &mut HashSet<usize>,
) -> Result<serde_json::Value, JsError> {
    let receiver = JsValue::Object(obj.cheap_clone());
    let mut map = serde_json::Map::new();
    for key in interp.own_property_keys(obj) {
        if key.is_symbol() {
            continue;
        }
        let enumerable = obj.borrow().get_own_property(&key).is_some_and(|p| p.enumerable);
        if !enumerable {
            continue;
        }
        let value = interp.get(obj, &key, &receiver)?;
        if let Some(json) = serialize_value(interp, &value, stack)? {
            map.insert(key.to_string(), json);
        }
    }
    Ok(serde_json::Value::Object(map))
}
