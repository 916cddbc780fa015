//! References: resolved lvalues that can be read, written or deleted
//!
//! A property reference keeps its lookup base apart from its receiver.
//! For `super.x` the base is the home object's prototype while getters and
//! setters still see the current `this`.

use super::{ExecutionContext, Interpreter};
use crate::environment::BindingLocation;
use crate::error::JsError;
use crate::value::{CheapClone, JsString, JsValue, PrivateElement, PrivateName, PropertyKey};

/// A resolved assignment target
#[derive(Clone)]
pub enum Reference {
    /// Identifier; `location` is `None` when no environment binds the name
    Binding {
        name: JsString,
        location: Option<BindingLocation>,
        strict: bool,
    },
    Property {
        base: JsValue,
        key: PropertyKey,
        /// Receiver for accessors. Equal to `base` except for `super` references.
        this: JsValue,
        strict: bool,
    },
    /// `obj.#name`
    Private { base: JsValue, name: PrivateName },
}

impl Reference {
    /// `this` for a call through this reference
    pub fn this_value(&self) -> JsValue {
        match self {
            Reference::Binding { .. } => JsValue::Undefined,
            Reference::Property { this, .. } => this.cheap_clone(),
            Reference::Private { base, .. } => base.cheap_clone(),
        }
    }

    pub fn is_unresolvable(&self) -> bool {
        matches!(self, Reference::Binding { location: None, .. })
    }
}

impl Interpreter {
    /// ResolveBinding against the running lexical environment
    pub(crate) fn resolve_binding(&self, name: &JsString, ctx: &ExecutionContext) -> Result<Reference, JsError> {
        Ok(Reference::Binding {
            name: name.cheap_clone(),
            location: self.envs.resolve(ctx.env, name.as_str())?,
            strict: ctx.strict,
        })
    }

    /// GetValue
    pub(crate) fn get_value(&mut self, reference: &Reference) -> Result<JsValue, JsError> {
        match reference {
            Reference::Binding { name, location, .. } => match location {
                None => Err(JsError::not_defined(name.as_str())),
                Some(BindingLocation::Declarative(env)) => self.envs.get_binding_value(*env, name.as_str()),
                Some(BindingLocation::GlobalObject(obj)) => {
                    let key = PropertyKey::from_js_string(name.cheap_clone());
                    let receiver = JsValue::Object(obj.cheap_clone());
                    self.get(obj, &key, &receiver)
                }
            },
            Reference::Property { base, key, this, .. } => match base {
                JsValue::Object(obj) => self.get(obj, key, this),
                other => self.get_v(other, key),
            },
            Reference::Private { base, name } => self.private_get(base, name),
        }
    }

    /// PutValue
    pub(crate) fn put_value(&mut self, reference: &Reference, value: JsValue) -> Result<(), JsError> {
        match reference {
            Reference::Binding {
                name,
                location,
                strict,
            } => match location {
                None if *strict => Err(JsError::not_defined(name.as_str())),
                None => {
                    let global = self.global.cheap_clone();
                    let key = PropertyKey::from_js_string(name.cheap_clone());
                    let receiver = JsValue::Object(global.cheap_clone());
                    self.set(&global, &key, value, &receiver)?;
                    Ok(())
                }
                Some(BindingLocation::Declarative(env)) => {
                    self.envs.set_mutable_binding(*env, name.as_str(), value, *strict)
                }
                Some(BindingLocation::GlobalObject(obj)) => {
                    let key = PropertyKey::from_js_string(name.cheap_clone());
                    let receiver = JsValue::Object(obj.cheap_clone());
                    let ok = self.set(obj, &key, value, &receiver)?;
                    if !ok && *strict {
                        return Err(JsError::type_error(format!(
                            "Cannot assign to read only property '{}' of object",
                            name
                        )));
                    }
                    Ok(())
                }
            },
            Reference::Property {
                base,
                key,
                this,
                strict,
            } => {
                let ok = match base {
                    JsValue::Object(obj) => self.set(obj, key, value, this)?,
                    JsValue::Undefined | JsValue::Null => {
                        return Err(JsError::type_error(format!(
                            "Cannot set properties of {} (setting '{}')",
                            base.describe(),
                            key
                        )));
                    }
                    primitive => match self.primitive_prototype(primitive) {
                        Some(proto) => self.set(&proto, key, value, this)?,
                        None => false,
                    },
                };
                if !ok && *strict {
                    return Err(match base {
                        JsValue::Object(_) => JsError::type_error(format!(
                            "Cannot assign to read only property '{}' of object '{}'",
                            key,
                            base.describe()
                        )),
                        _ => JsError::type_error(format!(
                            "Cannot create property '{}' on {} '{}'",
                            key,
                            base.type_of(),
                            base.describe()
                        )),
                    });
                }
                Ok(())
            }
            Reference::Private { base, name } => self.private_set(base, name, value),
        }
    }

    /// The `delete` operator applied to a reference
    pub(crate) fn delete_reference(&mut self, reference: &Reference) -> Result<bool, JsError> {
        match reference {
            Reference::Binding { name, location, .. } => match location {
                None => Ok(true),
                Some(BindingLocation::Declarative(env)) => self.envs.delete_binding(*env, name.as_str()),
                Some(BindingLocation::GlobalObject(obj)) => {
                    let key = PropertyKey::from_js_string(name.cheap_clone());
                    Ok(self.delete_property(obj, &key))
                }
            },
            Reference::Property {
                base, key, strict, ..
            } => {
                let obj = self.to_object(base)?;
                let deleted = self.delete_property(&obj, key);
                if !deleted && *strict {
                    return Err(JsError::type_error(format!(
                        "Cannot delete property '{}' of {}",
                        key,
                        base.describe()
                    )));
                }
                Ok(deleted)
            }
            Reference::Private { .. } => Err(JsError::type_error("Private fields can not be deleted")),
        }
    }

    /// PrivateGet
    pub(crate) fn private_get(&mut self, base: &JsValue, name: &PrivateName) -> Result<JsValue, JsError> {
        let element = match base {
            JsValue::Object(obj) => obj.borrow().private_elements.get(name).cloned(),
            _ => None,
        };
        match element {
            None => Err(JsError::type_error(format!(
                "Cannot read private member #{} from an object whose class did not declare it",
                name.description()
            ))),
            Some(PrivateElement::Field(value)) => Ok(value),
            Some(PrivateElement::Method(method)) => Ok(JsValue::Object(method)),
            Some(PrivateElement::Accessor { getter, .. }) => match getter {
                Some(getter) => self.call_function(&JsValue::Object(getter), base.cheap_clone(), &[]),
                None => Err(JsError::type_error(format!(
                    "'#{}' was defined without a getter",
                    name.description()
                ))),
            },
        }
    }

    /// PrivateSet
    pub(crate) fn private_set(&mut self, base: &JsValue, name: &PrivateName, value: JsValue) -> Result<(), JsError> {
        let JsValue::Object(obj) = base else {
            return Err(JsError::type_error(format!(
                "Cannot write private member #{} to an object whose class did not declare it",
                name.description()
            )));
        };
        let element = obj.borrow().private_elements.get(name).cloned();
        match element {
            None => Err(JsError::type_error(format!(
                "Cannot write private member #{} to an object whose class did not declare it",
                name.description()
            ))),
            Some(PrivateElement::Field(_)) => {
                obj.borrow_mut()
                    .private_elements
                    .insert(name.clone(), PrivateElement::Field(value));
                Ok(())
            }
            Some(PrivateElement::Method(_)) => Err(JsError::type_error("Private method is not writable")),
            Some(PrivateElement::Accessor { setter, .. }) => match setter {
                Some(setter) => {
                    self.call_function(&JsValue::Object(setter), base.cheap_clone(), &[value])?;
                    Ok(())
                }
                None => Err(JsError::type_error(format!(
                    "'#{}' was defined without a setter",
                    name.description()
                ))),
            },
        }
    }

    /// Resolve `#name` through the running private environment
    pub(crate) fn resolve_private_name(&self, name: &JsString, ctx: &ExecutionContext) -> Result<PrivateName, JsError> {
        ctx.private_env
            .as_ref()
            .and_then(|env| env.resolve(name.as_str()))
            .ok_or_else(|| {
                JsError::syntax_error(
                    format!("Private field '#{}' must be declared in an enclosing class", name),
                    0,
                    0,
                )
            })
    }
}
