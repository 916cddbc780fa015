//! Object internal methods: `[[Get]]`, `[[Set]]`, `[[Delete]]`,
//! `[[DefineOwnProperty]]` and friends, including the array `length` rules

use std::rc::Rc;

use super::Interpreter;
use crate::error::JsError;
use crate::value::{
    CheapClone, ExoticObject, JsObjectRef, JsValue, Property, PropertyKey, PropertySlot,
};

/// A property descriptor whose fields may be absent
#[derive(Clone, Default)]
pub struct PropertyDescriptor {
    pub value: Option<JsValue>,
    pub writable: Option<bool>,
    /// `Some(None)` is an explicit `get: undefined`
    pub get: Option<Option<JsObjectRef>>,
    pub set: Option<Option<JsObjectRef>>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    /// Fully populated data descriptor
    pub fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            value: Some(value),
            writable: Some(writable),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
            ..Self::default()
        }
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    pub fn is_data_descriptor(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    pub fn from_property(prop: &Property) -> Self {
        match &prop.slot {
            PropertySlot::Data { value, writable } => {
                Self::data(value.cheap_clone(), *writable, prop.enumerable, prop.configurable)
            }
            PropertySlot::Accessor { getter, setter } => Self {
                get: Some(getter.clone()),
                set: Some(setter.clone()),
                enumerable: Some(prop.enumerable),
                configurable: Some(prop.configurable),
                ..Self::default()
            },
        }
    }

    /// Property for a fresh key: absent fields default to `false`/`undefined`
    fn to_new_property(&self) -> Property {
        let enumerable = self.enumerable.unwrap_or(false);
        let configurable = self.configurable.unwrap_or(false);
        if self.is_accessor_descriptor() {
            Property {
                slot: PropertySlot::Accessor {
                    getter: self.get.clone().flatten(),
                    setter: self.set.clone().flatten(),
                },
                enumerable,
                configurable,
            }
        } else {
            Property::with_attributes(
                self.value.clone().unwrap_or_default(),
                self.writable.unwrap_or(false),
                enumerable,
                configurable,
            )
        }
    }

    /// `current` updated with the fields present in this descriptor
    fn merge_into(&self, current: &Property) -> Property {
        let enumerable = self.enumerable.unwrap_or(current.enumerable);
        let configurable = self.configurable.unwrap_or(current.configurable);
        let slot = match &current.slot {
            PropertySlot::Data { value, writable } if !self.is_accessor_descriptor() => {
                PropertySlot::Data {
                    value: self.value.clone().unwrap_or_else(|| value.cheap_clone()),
                    writable: self.writable.unwrap_or(*writable),
                }
            }
            PropertySlot::Accessor { getter, setter } if !self.is_data_descriptor() => {
                PropertySlot::Accessor {
                    getter: self.get.clone().unwrap_or_else(|| getter.clone()),
                    setter: self.set.clone().unwrap_or_else(|| setter.clone()),
                }
            }
            // Kind switch: the attributes carry over, the rest resets
            _ if self.is_accessor_descriptor() => PropertySlot::Accessor {
                getter: self.get.clone().flatten(),
                setter: self.set.clone().flatten(),
            },
            _ => PropertySlot::Data {
                value: self.value.clone().unwrap_or_default(),
                writable: self.writable.unwrap_or(false),
            },
        };
        Property {
            slot,
            enumerable,
            configurable,
        }
    }
}

fn same_object(a: &Option<JsObjectRef>, b: &Option<JsObjectRef>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

impl Interpreter {
    /// `[[GetOwnProperty]]`
    pub fn get_own_property(&self, obj: &JsObjectRef, key: &PropertyKey) -> Option<Property> {
        obj.borrow().get_own_property(key)
    }

    /// `[[Get]]` with an explicit receiver for accessor calls
    pub fn get(&mut self, obj: &JsObjectRef, key: &PropertyKey, receiver: &JsValue) -> Result<JsValue, JsError> {
        let mut current = obj.cheap_clone();
        loop {
            let (prop, proto) = {
                let o = current.borrow();
                (o.get_own_property(key), o.prototype.clone())
            };
            match prop {
                Some(Property {
                    slot: PropertySlot::Data { value, .. },
                    ..
                }) => return Ok(value),
                Some(Property {
                    slot: PropertySlot::Accessor { getter, .. },
                    ..
                }) => {
                    return match getter {
                        Some(getter) => {
                            self.call_function(&JsValue::Object(getter), receiver.cheap_clone(), &[])
                        }
                        None => Ok(JsValue::Undefined),
                    };
                }
                None => match proto {
                    Some(proto) => current = proto,
                    None => return Ok(JsValue::Undefined),
                },
            }
        }
    }

    /// GetV: property lookup on any value. Primitives read through their
    /// prototype with the primitive itself as receiver.
    pub fn get_v(&mut self, value: &JsValue, key: &PropertyKey) -> Result<JsValue, JsError> {
        match value {
            JsValue::Object(obj) => self.get(obj, key, value),
            JsValue::String(s) => {
                if key.is_length() {
                    return Ok(JsValue::Number(s.utf16_len() as f64));
                }
                if let PropertyKey::Index(i) = key {
                    if let Some(unit) = s.unit_at(*i as usize) {
                        return Ok(JsValue::String(unit));
                    }
                }
                let proto = self.intrinsics.string_prototype.cheap_clone();
                self.get(&proto, key, value)
            }
            JsValue::Undefined | JsValue::Null => Err(JsError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                value.describe(),
                key
            ))),
            primitive => match self.primitive_prototype(primitive) {
                Some(proto) => self.get(&proto, key, value),
                None => Ok(JsValue::Undefined),
            },
        }
    }

    /// Property lookup by name
    pub fn get_named(&mut self, value: &JsValue, name: &str) -> Result<JsValue, JsError> {
        let key = self.key(name);
        self.get_v(value, &key)
    }

    /// OrdinarySet. `Ok(false)` is a rejected write; the caller decides
    /// whether that throws.
    pub fn set(
        &mut self,
        obj: &JsObjectRef,
        key: &PropertyKey,
        value: JsValue,
        receiver: &JsValue,
    ) -> Result<bool, JsError> {
        let mut current = obj.cheap_clone();
        let own = loop {
            let (prop, proto) = {
                let o = current.borrow();
                (o.get_own_property(key), o.prototype.clone())
            };
            match (prop, proto) {
                (Some(prop), _) => break Some(prop),
                (None, Some(proto)) => current = proto,
                (None, None) => break None,
            }
        };

        match own {
            Some(Property {
                slot: PropertySlot::Accessor { setter, .. },
                ..
            }) => match setter {
                Some(setter) => {
                    self.call_function(&JsValue::Object(setter), receiver.cheap_clone(), &[value])?;
                    Ok(true)
                }
                None => Ok(false),
            },
            Some(Property {
                slot: PropertySlot::Data { writable: false, .. },
                ..
            }) => Ok(false),
            _ => {
                let JsValue::Object(target) = receiver else {
                    return Ok(false);
                };
                match self.get_own_property(target, key) {
                    Some(existing) => {
                        if existing.is_accessor() || !existing.writable() {
                            return Ok(false);
                        }
                        let desc = PropertyDescriptor {
                            value: Some(value),
                            ..PropertyDescriptor::default()
                        };
                        self.define_own_property(target, key.clone(), &desc)
                    }
                    None => self.create_data_property(target, key.clone(), value),
                }
            }
        }
    }

    /// `[[Set]]` that throws on rejection, for builtins and strict callers
    pub fn set_or_throw(&mut self, obj: &JsObjectRef, key: &PropertyKey, value: JsValue) -> Result<(), JsError> {
        let receiver = JsValue::Object(obj.cheap_clone());
        if self.set(obj, key, value, &receiver)? {
            Ok(())
        } else {
            Err(JsError::type_error(format!(
                "Cannot assign to read only property '{}' of object",
                key
            )))
        }
    }

    /// ValidateAndApplyPropertyDescriptor over an object's own property
    pub fn define_own_property(
        &mut self,
        obj: &JsObjectRef,
        key: PropertyKey,
        desc: &PropertyDescriptor,
    ) -> Result<bool, JsError> {
        if obj.borrow().is_array() && key.is_length() {
            return self.array_set_length(obj, desc);
        }

        let current = obj.borrow().get_own_property(&key);
        let Some(current) = current else {
            let mut o = obj.borrow_mut();
            if !o.extensible {
                return Ok(false);
            }
            if let (ExoticObject::Array { length, length_writable }, PropertyKey::Index(i)) =
                (&o.exotic, &key)
            {
                if *i >= *length && !*length_writable {
                    return Ok(false);
                }
            }
            o.define_property(key, desc.to_new_property());
            return Ok(true);
        };

        if !current.configurable {
            if desc.configurable == Some(true) {
                return Ok(false);
            }
            if desc.enumerable.is_some_and(|e| e != current.enumerable) {
                return Ok(false);
            }
            let generic = !desc.is_accessor_descriptor() && !desc.is_data_descriptor();
            if !generic {
                if current.is_accessor() != desc.is_accessor_descriptor() {
                    return Ok(false);
                }
                match &current.slot {
                    PropertySlot::Data { value, writable } => {
                        if !*writable {
                            if desc.writable == Some(true) {
                                return Ok(false);
                            }
                            if desc.value.as_ref().is_some_and(|v| !v.same_value(value)) {
                                return Ok(false);
                            }
                        }
                    }
                    PropertySlot::Accessor { getter, setter } => {
                        if desc.get.as_ref().is_some_and(|g| !same_object(g, getter)) {
                            return Ok(false);
                        }
                        if desc.set.as_ref().is_some_and(|s| !same_object(s, setter)) {
                            return Ok(false);
                        }
                    }
                }
            }
        }

        let mut o = obj.borrow_mut();
        // String wrapper indices are synthesized, not stored
        if matches!(o.exotic, ExoticObject::Primitive(JsValue::String(_)))
            && !o.properties.contains_key(&key)
        {
            return Ok(true);
        }
        let merged = desc.merge_into(&current);
        o.define_property(key, merged);
        Ok(true)
    }

    /// DefinePropertyOrThrow
    pub fn define_property_or_throw(
        &mut self,
        obj: &JsObjectRef,
        key: PropertyKey,
        desc: &PropertyDescriptor,
    ) -> Result<(), JsError> {
        let name = key.to_string();
        if self.define_own_property(obj, key, desc)? {
            Ok(())
        } else {
            Err(JsError::type_error(format!("Cannot redefine property: {}", name)))
        }
    }

    /// CreateDataProperty: writable, enumerable, configurable
    pub fn create_data_property(&mut self, obj: &JsObjectRef, key: PropertyKey, value: JsValue) -> Result<bool, JsError> {
        let desc = PropertyDescriptor::data(value, true, true, true);
        self.define_own_property(obj, key, &desc)
    }

    pub fn create_data_property_or_throw(
        &mut self,
        obj: &JsObjectRef,
        key: PropertyKey,
        value: JsValue,
    ) -> Result<(), JsError> {
        let desc = PropertyDescriptor::data(value, true, true, true);
        self.define_property_or_throw(obj, key, &desc)
    }

    /// ArraySetLength
    fn array_set_length(&mut self, obj: &JsObjectRef, desc: &PropertyDescriptor) -> Result<bool, JsError> {
        let (old_len, writable) = match obj.borrow().exotic {
            ExoticObject::Array {
                length,
                length_writable,
            } => (length, length_writable),
            _ => return Ok(false),
        };

        if desc.is_accessor_descriptor()
            || desc.configurable == Some(true)
            || desc.enumerable == Some(true)
        {
            return Ok(false);
        }

        let new_len = match &desc.value {
            Some(value) => self.to_array_length(value)?,
            None => old_len,
        };
        if new_len != old_len && !writable {
            return Ok(false);
        }
        if !writable && desc.writable == Some(true) {
            return Ok(false);
        }

        let mut o = obj.borrow_mut();
        let mut final_len = new_len;
        let mut ok = true;
        if new_len < old_len {
            let mut doomed: Vec<u32> = o
                .properties
                .keys()
                .filter_map(|k| match k {
                    PropertyKey::Index(i) if *i >= new_len => Some(*i),
                    _ => None,
                })
                .collect();
            doomed.sort_unstable_by(|a, b| b.cmp(a));
            for index in doomed {
                let key = PropertyKey::Index(index);
                if o.properties.get(&key).is_some_and(|p| !p.configurable) {
                    final_len = index.saturating_add(1);
                    ok = false;
                    break;
                }
                o.properties.shift_remove(&key);
            }
        }
        if let ExoticObject::Array {
            length,
            length_writable,
        } = &mut o.exotic
        {
            *length = final_len;
            if desc.writable == Some(false) {
                *length_writable = false;
            }
        }
        Ok(ok)
    }

    /// ToUint32 that insists on an exact array length
    pub(crate) fn to_array_length(&mut self, value: &JsValue) -> Result<u32, JsError> {
        let number = self.to_number(value)?;
        let len = super::operations::f64_to_uint32(number);
        if f64::from(len) != number {
            return Err(JsError::range_error("Invalid array length"));
        }
        Ok(len)
    }

    /// `[[Delete]]`. `false` means the property is non-configurable.
    pub fn delete_property(&mut self, obj: &JsObjectRef, key: &PropertyKey) -> bool {
        let current = obj.borrow().get_own_property(key);
        match current {
            None => true,
            Some(prop) if !prop.configurable => false,
            Some(_) => {
                obj.borrow_mut().remove_property(key);
                true
            }
        }
    }

    /// `[[HasProperty]]`
    pub fn has_property(&self, obj: &JsObjectRef, key: &PropertyKey) -> bool {
        let mut current = Some(obj.cheap_clone());
        while let Some(o) = current {
            let o_ref = o.borrow();
            if o_ref.has_own_property(key) {
                return true;
            }
            current = o_ref.prototype.clone();
        }
        false
    }

    /// `[[SetPrototypeOf]]`; refuses to create a cycle
    pub fn set_prototype_of(&mut self, obj: &JsObjectRef, proto: Option<JsObjectRef>) -> bool {
        {
            let o = obj.borrow();
            if same_object(&o.prototype, &proto) {
                return true;
            }
            if !o.extensible {
                return false;
            }
        }
        let mut current = proto.clone();
        while let Some(p) = current {
            if Rc::ptr_eq(&p, obj) {
                return false;
            }
            current = p.borrow().prototype.clone();
        }
        obj.borrow_mut().prototype = proto;
        true
    }

    pub fn get_prototype_of(&self, obj: &JsObjectRef) -> Option<JsObjectRef> {
        obj.borrow().prototype.clone()
    }

    /// SetIntegrityLevel: every own property non-configurable and, when
    /// `frozen`, every data property read-only. Always stops extension.
    pub fn set_integrity_level(&mut self, obj: &JsObjectRef, frozen: bool) {
        let mut o = obj.borrow_mut();
        o.extensible = false;
        for prop in o.properties.values_mut() {
            prop.configurable = false;
            if frozen {
                if let PropertySlot::Data { writable, .. } = &mut prop.slot {
                    *writable = false;
                }
            }
        }
        if frozen {
            if let ExoticObject::Array { length_writable, .. } = &mut o.exotic {
                *length_writable = false;
            }
        }
    }

    /// `Object.freeze` without the result value
    pub fn freeze_object(&mut self, obj: &JsObjectRef) {
        self.set_integrity_level(obj, true);
    }

    /// TestIntegrityLevel
    pub fn test_integrity_level(&self, obj: &JsObjectRef, frozen: bool) -> bool {
        let o = obj.borrow();
        if o.extensible {
            return false;
        }
        o.own_keys().iter().all(|key| match o.get_own_property(key) {
            Some(prop) => !prop.configurable && !(frozen && prop.writable()),
            None => true,
        })
    }

    /// `[[OwnPropertyKeys]]`
    pub fn own_property_keys(&self, obj: &JsObjectRef) -> Vec<PropertyKey> {
        obj.borrow().own_keys()
    }

    /// GetPrototypeFromConstructor: `ctor.prototype` if it is an object,
    /// otherwise `default`
    pub fn get_prototype_from_constructor(
        &mut self,
        ctor: &JsObjectRef,
        default: JsObjectRef,
    ) -> Result<JsObjectRef, JsError> {
        let key = self.key("prototype");
        let receiver = JsValue::Object(ctor.cheap_clone());
        match self.get(ctor, &key, &receiver)? {
            JsValue::Object(proto) => Ok(proto),
            _ => Ok(default),
        }
    }

    /// CopyDataProperties: enumerable own properties of `source` onto
    /// `target`, skipping `excluded`
    pub fn copy_data_properties(
        &mut self,
        target: &JsObjectRef,
        source: &JsValue,
        excluded: &[PropertyKey],
    ) -> Result<(), JsError> {
        if source.is_nullish() {
            return Ok(());
        }
        let from = self.to_object(source)?;
        let from_value = JsValue::Object(from.cheap_clone());
        for key in self.own_property_keys(&from) {
            if excluded.contains(&key) {
                continue;
            }
            let enumerable = self
                .get_own_property(&from, &key)
                .is_some_and(|p| p.enumerable);
            if enumerable {
                let value = self.get(&from, &key, &from_value)?;
                self.create_data_property_or_throw(target, key, value)?;
            }
        }
        Ok(())
    }

    /// LengthOfArrayLike
    pub fn length_of_array_like(&mut self, obj: &JsObjectRef) -> Result<u64, JsError> {
        let key = self.key("length");
        let receiver = JsValue::Object(obj.cheap_clone());
        let len = self.get(obj, &key, &receiver)?;
        let n = self.to_integer_or_infinity(&len)?;
        Ok(if n <= 0.0 {
            0
        } else {
            n.min(9_007_199_254_740_991.0) as u64
        })
    }

    /// Invoke: call the method `name` of `value`
    pub fn invoke(&mut self, value: &JsValue, name: &str, args: &[JsValue]) -> Result<JsValue, JsError> {
        let func = self.get_named(value, name)?;
        if !func.is_callable() {
            return Err(JsError::type_error(format!("{} is not a function", name)));
        }
        self.call_function(&func, value.cheap_clone(), args)
    }
}
