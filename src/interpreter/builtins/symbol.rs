//! Symbol built-in object implementation

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{CheapClone, ExoticObject, JsObjectRef, JsSymbol, JsValue, Property, PropertyKey};

/// Initialize Symbol.prototype with toString, valueOf and the `description` getter
pub fn init_symbol_prototype(interp: &mut Interpreter) {
    let proto = interp.intrinsics.symbol_prototype.cheap_clone();

    interp.register_method(&proto, "toString", symbol_to_string, 0);
    interp.register_method(&proto, "valueOf", symbol_value_of, 0);
    interp.register_getter(&proto, "description", symbol_description);

    let tag = PropertyKey::Symbol(interp.symbols.to_string_tag.cheap_clone());
    proto
        .borrow_mut()
        .define_property(tag, Property::with_attributes(JsValue::from("Symbol"), false, false, true));
}

/// Create the Symbol function. It cannot be used with `new`.
pub fn create_symbol_constructor(interp: &mut Interpreter) -> JsObjectRef {
    let symbol_fn = interp.create_native_function("Symbol", symbol_call, 0);

    // Symbol.for(key) and Symbol.keyFor(sym)
    interp.register_method(&symbol_fn, "for", symbol_for, 1);
    interp.register_method(&symbol_fn, "keyFor", symbol_key_for, 1);

    // Well-known symbols
    let well_known = [
        ("iterator", interp.symbols.iterator.cheap_clone()),
        ("asyncIterator", interp.symbols.async_iterator.cheap_clone()),
        ("hasInstance", interp.symbols.has_instance.cheap_clone()),
        ("toPrimitive", interp.symbols.to_primitive.cheap_clone()),
        ("toStringTag", interp.symbols.to_string_tag.cheap_clone()),
    ];
    for (name, symbol) in well_known {
        let key = interp.key(name);
        symbol_fn.borrow_mut().define_property(
            key,
            Property::with_attributes(JsValue::Symbol(symbol), false, false, false),
        );
    }

    let proto = interp.intrinsics.symbol_prototype.cheap_clone();
    super::link_constructor(interp, &symbol_fn, &proto);
    symbol_fn
}

/// `Symbol(description)`: a fresh, unique symbol
pub fn symbol_call(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let description = match args.first() {
        None | Some(JsValue::Undefined) => None,
        Some(value) => Some(interp.to_string(value)?),
    };
    Ok(JsValue::Symbol(JsSymbol::new(description)))
}

/// `Symbol.for(key)`: the registry symbol for `key`, created on first use
pub fn symbol_for(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let key = interp.to_string(&args.first().cloned().unwrap_or_default())?;
    let symbol = interp
        .symbol_registry
        .entry(key.cheap_clone())
        .or_insert_with(|| JsSymbol::new(Some(key)))
        .cheap_clone();
    Ok(JsValue::Symbol(symbol))
}

/// `Symbol.keyFor(sym)`: the registry key, or undefined for unregistered symbols
pub fn symbol_key_for(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let Some(JsValue::Symbol(symbol)) = args.first() else {
        return Err(JsError::type_error(format!(
            "{} is not a symbol",
            args.first().cloned().unwrap_or_default().describe()
        )));
    };
    Ok(interp
        .symbol_registry
        .iter()
        .find(|(_, registered)| *registered == symbol)
        .map(|(key, _)| JsValue::String(key.cheap_clone()))
        .unwrap_or_default())
}

/// thisSymbolValue
fn this_symbol_value(this: &JsValue) -> Result<JsSymbol, JsError> {
    match this {
        JsValue::Symbol(s) => Ok(s.cheap_clone()),
        JsValue::Object(obj) => match &obj.borrow().exotic {
            ExoticObject::Primitive(JsValue::Symbol(s)) => Ok(s.cheap_clone()),
            _ => Err(JsError::type_error("Symbol.prototype method called on incompatible receiver")),
        },
        _ => Err(JsError::type_error("Symbol.prototype method called on incompatible receiver")),
    }
}

pub fn symbol_to_string(_interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::from(this_symbol_value(&this)?.descriptive_string()))
}

pub fn symbol_value_of(_interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Symbol(this_symbol_value(&this)?))
}

pub fn symbol_description(_interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(this_symbol_value(&this)?
        .description()
        .map(|d| JsValue::String(d.cheap_clone()))
        .unwrap_or_default())
}
