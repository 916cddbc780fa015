//! Object built-in methods

use crate::error::JsError;
use crate::interpreter::{Interpreter, PropertyDescriptor};
use crate::value::{CheapClone, ExoticObject, JsObjectRef, JsValue, PropertyKey};

/// Initialize Object.prototype with hasOwnProperty, toString, valueOf, isPrototypeOf methods.
/// The prototype object must already exist in `interp.intrinsics.object_prototype`.
pub fn init_object_prototype(interp: &mut Interpreter) {
    let proto = interp.intrinsics.object_prototype.cheap_clone();

    interp.register_method(&proto, "hasOwnProperty", object_has_own_property, 1);
    interp.register_method(&proto, "isPrototypeOf", object_is_prototype_of, 1);
    interp.register_method(&proto, "propertyIsEnumerable", object_property_is_enumerable, 1);
    interp.register_method(&proto, "toString", object_to_string, 0);
    interp.register_method(&proto, "toLocaleString", object_to_locale_string, 0);
    interp.register_method(&proto, "valueOf", object_value_of, 0);
}

/// Create Object constructor with static methods (keys, values, entries, assign, etc.)
pub fn create_object_constructor(interp: &mut Interpreter) -> JsObjectRef {
    let constructor = interp.create_native_constructor("Object", object_constructor, object_construct, 1);

    // Property enumeration
    interp.register_method(&constructor, "keys", object_keys, 1);
    interp.register_method(&constructor, "values", object_values, 1);
    interp.register_method(&constructor, "entries", object_entries, 1);

    // Object manipulation
    interp.register_method(&constructor, "assign", object_assign, 2);
    interp.register_method(&constructor, "fromEntries", object_from_entries, 1);
    interp.register_method(&constructor, "create", object_create, 2);

    // Property checking
    interp.register_method(&constructor, "hasOwn", object_has_own, 2);

    // Freezing/sealing/extensibility
    interp.register_method(&constructor, "freeze", object_freeze, 1);
    interp.register_method(&constructor, "isFrozen", object_is_frozen, 1);
    interp.register_method(&constructor, "seal", object_seal, 1);
    interp.register_method(&constructor, "isSealed", object_is_sealed, 1);
    interp.register_method(&constructor, "preventExtensions", object_prevent_extensions, 1);
    interp.register_method(&constructor, "isExtensible", object_is_extensible, 1);

    // Comparison
    interp.register_method(&constructor, "is", object_is, 2);

    // Property descriptors
    interp.register_method(
        &constructor,
        "getOwnPropertyDescriptor",
        object_get_own_property_descriptor,
        2,
    );
    interp.register_method(&constructor, "getOwnPropertyNames", object_get_own_property_names, 1);
    interp.register_method(&constructor, "getOwnPropertySymbols", object_get_own_property_symbols, 1);
    interp.register_method(&constructor, "defineProperty", object_define_property, 3);
    interp.register_method(&constructor, "defineProperties", object_define_properties, 2);

    // Prototype access
    interp.register_method(&constructor, "getPrototypeOf", object_get_prototype_of, 1);
    interp.register_method(&constructor, "setPrototypeOf", object_set_prototype_of, 2);

    let proto = interp.intrinsics.object_prototype.cheap_clone();
    super::link_constructor(interp, &constructor, &proto);
    constructor
}

/// `Object(value)`: boxes primitives, passes objects through, and creates
/// a fresh object for `undefined`/`null`
pub fn object_constructor(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    match args.first() {
        Some(value) if !value.is_nullish() => Ok(JsValue::Object(interp.to_object(value)?)),
        _ => Ok(JsValue::Object(interp.create_object())),
    }
}

/// `new Object(value)`; a subclass `new.target` supplies the prototype
pub fn object_construct(
    interp: &mut Interpreter,
    args: &[JsValue],
    new_target: &JsObjectRef,
) -> Result<JsValue, JsError> {
    if let Some(value) = args.first().filter(|v| !v.is_nullish()) {
        return Ok(JsValue::Object(interp.to_object(value)?));
    }
    let default = interp.intrinsics.object_prototype.cheap_clone();
    let proto = interp.get_prototype_from_constructor(new_target, default)?;
    Ok(JsValue::Object(interp.create_object_with_proto(Some(proto))))
}

/// First argument converted with ToObject
fn object_arg(interp: &mut Interpreter, args: &[JsValue]) -> Result<JsObjectRef, JsError> {
    let value = args.first().cloned().unwrap_or_default();
    interp.to_object(&value)
}

/// Which parts of each enumerable own property `Object.keys` and friends return
#[derive(Clone, Copy)]
enum EnumerableOwn {
    Keys,
    Values,
    Entries,
}

/// EnumerableOwnProperties: string-keyed, enumerable own properties in
/// `[[OwnPropertyKeys]]` order
fn enumerable_own_properties(
    interp: &mut Interpreter,
    obj: &JsObjectRef,
    kind: EnumerableOwn,
) -> Result<Vec<JsValue>, JsError> {
    let receiver = JsValue::Object(obj.cheap_clone());
    let mut result = Vec::new();
    for key in interp.own_property_keys(obj) {
        if key.is_symbol() {
            continue;
        }
        // A getter may have deleted or hidden the property
        let enumerable = interp.get_own_property(obj, &key).is_some_and(|p| p.enumerable);
        if !enumerable {
            continue;
        }
        match kind {
            EnumerableOwn::Keys => result.push(key.to_value()),
            EnumerableOwn::Values => result.push(interp.get(obj, &key, &receiver)?),
            EnumerableOwn::Entries => {
                let value = interp.get(obj, &key, &receiver)?;
                let entry = interp.create_array(vec![key.to_value(), value]);
                result.push(JsValue::Object(entry));
            }
        }
    }
    Ok(result)
}

pub fn object_keys(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let obj = object_arg(interp, args)?;
    let keys = enumerable_own_properties(interp, &obj, EnumerableOwn::Keys)?;
    Ok(JsValue::Object(interp.create_array(keys)))
}

pub fn object_values(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let obj = object_arg(interp, args)?;
    let values = enumerable_own_properties(interp, &obj, EnumerableOwn::Values)?;
    Ok(JsValue::Object(interp.create_array(values)))
}

pub fn object_entries(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let obj = object_arg(interp, args)?;
    let entries = enumerable_own_properties(interp, &obj, EnumerableOwn::Entries)?;
    Ok(JsValue::Object(interp.create_array(entries)))
}

/// Object.assign(target, ...sources)
pub fn object_assign(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let target = object_arg(interp, args)?;
    for source in args.iter().skip(1) {
        if source.is_nullish() {
            continue;
        }
        let from = interp.to_object(source)?;
        let from_value = JsValue::Object(from.cheap_clone());
        for key in interp.own_property_keys(&from) {
            let enumerable = interp.get_own_property(&from, &key).is_some_and(|p| p.enumerable);
            if enumerable {
                let value = interp.get(&from, &key, &from_value)?;
                interp.set_or_throw(&target, &key, value)?;
            }
        }
    }
    Ok(JsValue::Object(target))
}

/// Object.fromEntries(iterable)
pub fn object_from_entries(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let iterable = args.first().cloned().unwrap_or_default();
    if iterable.is_nullish() {
        return Err(JsError::type_error(format!("{} is not iterable", iterable.describe())));
    }
    let result = interp.create_object();
    for entry in interp.iterate_to_vec(&iterable)? {
        if !entry.is_object() {
            return Err(JsError::type_error(format!(
                "Iterator value {} is not an entry object",
                entry.describe()
            )));
        }
        let key = interp.get_v(&entry, &PropertyKey::Index(0))?;
        let value = interp.get_v(&entry, &PropertyKey::Index(1))?;
        let key = interp.to_property_key(&key)?;
        interp.create_data_property_or_throw(&result, key, value)?;
    }
    Ok(JsValue::Object(result))
}

/// Object.create(proto, properties)
pub fn object_create(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let proto = match args.first() {
        Some(JsValue::Object(p)) => Some(p.cheap_clone()),
        Some(JsValue::Null) => None,
        other => {
            return Err(JsError::type_error(format!(
                "Object prototype may only be an Object or null: {}",
                other.cloned().unwrap_or_default().describe()
            )));
        }
    };
    let obj = interp.create_object_with_proto(proto);
    if let Some(properties) = args.get(1).filter(|p| !p.is_undefined()) {
        define_properties(interp, &obj, properties)?;
    }
    Ok(JsValue::Object(obj))
}

/// Object.hasOwn(obj, key)
pub fn object_has_own(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let obj = object_arg(interp, args)?;
    let key = interp.to_property_key(&args.get(1).cloned().unwrap_or_default())?;
    Ok(JsValue::Boolean(interp.get_own_property(&obj, &key).is_some()))
}

pub fn object_freeze(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let value = args.first().cloned().unwrap_or_default();
    if let JsValue::Object(obj) = &value {
        interp.set_integrity_level(obj, true);
    }
    Ok(value)
}

pub fn object_is_frozen(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(match args.first() {
        Some(JsValue::Object(obj)) => interp.test_integrity_level(obj, true),
        _ => true,
    }))
}

pub fn object_seal(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let value = args.first().cloned().unwrap_or_default();
    if let JsValue::Object(obj) = &value {
        interp.set_integrity_level(obj, false);
    }
    Ok(value)
}

pub fn object_is_sealed(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(match args.first() {
        Some(JsValue::Object(obj)) => interp.test_integrity_level(obj, false),
        _ => true,
    }))
}

pub fn object_prevent_extensions(
    _interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let value = args.first().cloned().unwrap_or_default();
    if let JsValue::Object(obj) = &value {
        obj.borrow_mut().extensible = false;
    }
    Ok(value)
}

pub fn object_is_extensible(
    _interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(match args.first() {
        Some(JsValue::Object(obj)) => obj.borrow().extensible,
        _ => false,
    }))
}

/// Object.is: SameValue
pub fn object_is(_interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let x = args.first().cloned().unwrap_or_default();
    let y = args.get(1).cloned().unwrap_or_default();
    Ok(JsValue::Boolean(x.same_value(&y)))
}

/// Object.prototype.hasOwnProperty(key)
pub fn object_has_own_property(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let key = interp.to_property_key(&args.first().cloned().unwrap_or_default())?;
    let obj = interp.to_object(&this)?;
    Ok(JsValue::Boolean(interp.get_own_property(&obj, &key).is_some()))
}

/// Object.prototype.isPrototypeOf(value)
pub fn object_is_prototype_of(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let Some(JsValue::Object(value)) = args.first() else {
        return Ok(JsValue::Boolean(false));
    };
    let obj = interp.to_object(&this)?;
    let mut current = interp.get_prototype_of(value);
    while let Some(proto) = current {
        if std::rc::Rc::ptr_eq(&proto, &obj) {
            return Ok(JsValue::Boolean(true));
        }
        current = interp.get_prototype_of(&proto);
    }
    Ok(JsValue::Boolean(false))
}

/// Object.prototype.propertyIsEnumerable(key)
pub fn object_property_is_enumerable(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let key = interp.to_property_key(&args.first().cloned().unwrap_or_default())?;
    let obj = interp.to_object(&this)?;
    Ok(JsValue::Boolean(
        interp.get_own_property(&obj, &key).is_some_and(|p| p.enumerable),
    ))
}

/// Object.prototype.toString: `[object Tag]`, with `@@toStringTag` taking
/// precedence over the builtin tag
pub fn object_to_string(interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let obj = match &this {
        JsValue::Undefined => return Ok(JsValue::from("[object Undefined]")),
        JsValue::Null => return Ok(JsValue::from("[object Null]")),
        other => interp.to_object(other)?,
    };
    let builtin_tag = match &obj.borrow().exotic {
        ExoticObject::Array { .. } => "Array",
        ExoticObject::Function(_) => "Function",
        ExoticObject::Error => "Error",
        ExoticObject::Arguments => "Arguments",
        ExoticObject::Primitive(JsValue::Boolean(_)) => "Boolean",
        ExoticObject::Primitive(JsValue::Number(_)) => "Number",
        ExoticObject::Primitive(JsValue::String(_)) => "String",
        _ => "Object",
    };
    let tag_key = PropertyKey::Symbol(interp.symbols.to_string_tag.cheap_clone());
    let tag = match interp.get(&obj, &tag_key, &JsValue::Object(obj.cheap_clone()))? {
        JsValue::String(s) => s.to_string(),
        _ => builtin_tag.to_string(),
    };
    Ok(JsValue::from(format!("[object {}]", tag)))
}

pub fn object_to_locale_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    interp.invoke(&this, "toString", &[])
}

pub fn object_value_of(interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Object(interp.to_object(&this)?))
}

/// Object.getOwnPropertyDescriptor(obj, key)
pub fn object_get_own_property_descriptor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let obj = object_arg(interp, args)?;
    let key = interp.to_property_key(&args.get(1).cloned().unwrap_or_default())?;
    match interp.get_own_property(&obj, &key) {
        Some(prop) => {
            let desc = PropertyDescriptor::from_property(&prop);
            Ok(JsValue::Object(from_property_descriptor(interp, &desc)?))
        }
        None => Ok(JsValue::Undefined),
    }
}

pub fn object_get_own_property_names(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let obj = object_arg(interp, args)?;
    let names: Vec<JsValue> = interp
        .own_property_keys(&obj)
        .iter()
        .filter(|k| !k.is_symbol())
        .map(PropertyKey::to_value)
        .collect();
    Ok(JsValue::Object(interp.create_array(names)))
}

pub fn object_get_own_property_symbols(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let obj = object_arg(interp, args)?;
    let symbols: Vec<JsValue> = interp
        .own_property_keys(&obj)
        .iter()
        .filter(|k| k.is_symbol())
        .map(PropertyKey::to_value)
        .collect();
    Ok(JsValue::Object(interp.create_array(symbols)))
}

/// Object.defineProperty(obj, key, attributes)
pub fn object_define_property(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let target = args.first().cloned().unwrap_or_default();
    let JsValue::Object(obj) = &target else {
        return Err(JsError::type_error("Object.defineProperty called on non-object"));
    };
    let key = interp.to_property_key(&args.get(1).cloned().unwrap_or_default())?;
    let desc = to_property_descriptor(interp, &args.get(2).cloned().unwrap_or_default())?;
    interp.define_property_or_throw(obj, key, &desc)?;
    Ok(target)
}

/// Object.defineProperties(obj, properties)
pub fn object_define_properties(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let target = args.first().cloned().unwrap_or_default();
    let JsValue::Object(obj) = &target else {
        return Err(JsError::type_error("Object.defineProperties called on non-object"));
    };
    define_properties(interp, obj, &args.get(1).cloned().unwrap_or_default())?;
    Ok(target)
}

/// ObjectDefineProperties: all descriptors are read before any is applied
fn define_properties(interp: &mut Interpreter, obj: &JsObjectRef, properties: &JsValue) -> Result<(), JsError> {
    let props = interp.to_object(properties)?;
    let props_value = JsValue::Object(props.cheap_clone());
    let mut descriptors = Vec::new();
    for key in interp.own_property_keys(&props) {
        let enumerable = interp.get_own_property(&props, &key).is_some_and(|p| p.enumerable);
        if enumerable {
            let desc_obj = interp.get(&props, &key, &props_value)?;
            descriptors.push((key, to_property_descriptor(interp, &desc_obj)?));
        }
    }
    for (key, desc) in descriptors {
        interp.define_property_or_throw(obj, key, &desc)?;
    }
    Ok(())
}

pub fn object_get_prototype_of(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let obj = object_arg(interp, args)?;
    Ok(interp
        .get_prototype_of(&obj)
        .map(JsValue::Object)
        .unwrap_or(JsValue::Null))
}

/// Object.setPrototypeOf(obj, proto)
pub fn object_set_prototype_of(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let target = args.first().cloned().unwrap_or_default();
    if target.is_nullish() {
        return Err(JsError::type_error("Object.setPrototypeOf called on null or undefined"));
    }
    let proto = match args.get(1) {
        Some(JsValue::Object(p)) => Some(p.cheap_clone()),
        Some(JsValue::Null) => None,
        other => {
            return Err(JsError::type_error(format!(
                "Object prototype may only be an Object or null: {}",
                other.cloned().unwrap_or_default().describe()
            )));
        }
    };
    if let JsValue::Object(obj) = &target {
        if !interp.set_prototype_of(obj, proto) {
            return Err(JsError::type_error("Cyclic __proto__ value or non-extensible object"));
        }
    }
    Ok(target)
}

/// ToPropertyDescriptor
pub fn to_property_descriptor(interp: &mut Interpreter, value: &JsValue) -> Result<PropertyDescriptor, JsError> {
    let JsValue::Object(obj) = value else {
        return Err(JsError::type_error(format!(
            "Property description must be an object: {}",
            value.describe()
        )));
    };
    let mut desc = PropertyDescriptor::default();
    let field = |interp: &mut Interpreter, name: &str| -> Result<Option<JsValue>, JsError> {
        let key = interp.key(name);
        if !interp.has_property(obj, &key) {
            return Ok(None);
        }
        Ok(Some(interp.get(obj, &key, value)?))
    };

    if let Some(v) = field(interp, "enumerable")? {
        desc.enumerable = Some(v.to_boolean());
    }
    if let Some(v) = field(interp, "configurable")? {
        desc.configurable = Some(v.to_boolean());
    }
    if let Some(v) = field(interp, "value")? {
        desc.value = Some(v);
    }
    if let Some(v) = field(interp, "writable")? {
        desc.writable = Some(v.to_boolean());
    }
    if let Some(v) = field(interp, "get")? {
        desc.get = Some(accessor_function(&v, "Getter")?);
    }
    if let Some(v) = field(interp, "set")? {
        desc.set = Some(accessor_function(&v, "Setter")?);
    }
    if desc.is_accessor_descriptor() && desc.is_data_descriptor() {
        return Err(JsError::type_error(
            "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute",
        ));
    }
    Ok(desc)
}

fn accessor_function(value: &JsValue, what: &str) -> Result<Option<JsObjectRef>, JsError> {
    match value {
        JsValue::Undefined => Ok(None),
        JsValue::Object(f) if f.borrow().is_callable() => Ok(Some(f.cheap_clone())),
        other => Err(JsError::type_error(format!(
            "{} must be a function: {}",
            what,
            other.describe()
        ))),
    }
}

/// FromPropertyDescriptor
pub fn from_property_descriptor(
    interp: &mut Interpreter,
    desc: &PropertyDescriptor,
) -> Result<JsObjectRef, JsError> {
    let obj = interp.create_object();
    let as_value = |f: &Option<JsObjectRef>| f.clone().map(JsValue::Object).unwrap_or_default();
    if let Some(value) = &desc.value {
        let key = interp.key("value");
        interp.create_data_property_or_throw(&obj, key, value.cheap_clone())?;
    }
    if let Some(writable) = desc.writable {
        let key = interp.key("writable");
        interp.create_data_property_or_throw(&obj, key, JsValue::Boolean(writable))?;
    }
    if let Some(get) = &desc.get {
        let key = interp.key("get");
        interp.create_data_property_or_throw(&obj, key, as_value(get))?;
    }
    if let Some(set) = &desc.set {
        let key = interp.key("set");
        interp.create_data_property_or_throw(&obj, key, as_value(set))?;
    }
    if let Some(enumerable) = desc.enumerable {
        let key = interp.key("enumerable");
        interp.create_data_property_or_throw(&obj, key, JsValue::Boolean(enumerable))?;
    }
    if let Some(configurable) = desc.configurable {
        let key = interp.key("configurable");
        interp.create_data_property_or_throw(&obj, key, JsValue::Boolean(configurable))?;
    }
    Ok(obj)
}

