//! Destructuring for declarations, parameters, catch clauses and
//! assignment expressions

use super::{ExecutionContext, Interpreter};
use crate::ast::{ArrayPattern, ObjectPattern, Pattern, PropertyName};
use crate::environment::EnvId;
use crate::error::JsError;
use crate::value::{CheapClone, JsString, JsValue, PropertyKey};

/// How a bound name receives its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    /// PutValue through a resolved reference (`var`, assignment patterns)
    Assign,
    /// InitializeBinding in the given environment (`let`, `const`, params)
    Initialize(EnvId),
}

type Fetch<'a> = &'a mut dyn FnMut(&mut Interpreter) -> Result<JsValue, JsError>;

impl Interpreter {
    /// BindingInitialization / DestructuringAssignmentEvaluation
    pub(crate) fn bind_pattern(
        &mut self,
        pattern: &Pattern,
        value: JsValue,
        mode: BindingMode,
        ctx: &ExecutionContext,
    ) -> Result<(), JsError> {
        match pattern {
            Pattern::Identifier(id) => self.bind_name(&id.name, value, mode, ctx),
            Pattern::Object(object) => self.bind_object_pattern(object, value, mode, ctx),
            Pattern::Array(array) => self.bind_array_pattern(array, value, mode, ctx),
            Pattern::Assignment(_) | Pattern::Expression(_) => {
                self.bind_target_with(pattern, mode, ctx, &mut |_| Ok(value.cheap_clone()))
            }
        }
    }

    fn bind_name(
        &mut self,
        name: &JsString,
        value: JsValue,
        mode: BindingMode,
        ctx: &ExecutionContext,
    ) -> Result<(), JsError> {
        match mode {
            BindingMode::Initialize(env) => self.envs.initialize_binding(env, name.as_str(), value),
            BindingMode::Assign => {
                let reference = self.resolve_binding(name, ctx)?;
                self.put_value(&reference, value)
            }
        }
    }

    /// Bind one element target. Member-expression targets are resolved
    /// before `fetch` runs; a default applies when the fetched value is
    /// `undefined`.
    fn bind_target_with(
        &mut self,
        target: &Pattern,
        mode: BindingMode,
        ctx: &ExecutionContext,
        fetch: Fetch<'_>,
    ) -> Result<(), JsError> {
        let (inner, default) = match target {
            Pattern::Assignment(assign) => (&*assign.target, Some(&*assign.default)),
            other => (other, None),
        };

        let reference = match inner {
            Pattern::Expression(expr) => Some(self.evaluate_reference(expr, ctx)?),
            Pattern::Identifier(id) if mode == BindingMode::Assign => Some(self.resolve_binding(&id.name, ctx)?),
            _ => None,
        };

        let mut value = fetch(self)?;
        if let Some(default) = default {
            if value.is_undefined() {
                value = match inner {
                    Pattern::Identifier(id) => self.evaluate_named(default, &id.name, ctx)?,
                    _ => self.evaluate(default, ctx)?,
                };
            }
        }

        match (reference, inner) {
            (Some(reference), _) => self.put_value(&reference, value),
            (None, Pattern::Identifier(id)) => self.bind_name(&id.name, value, mode, ctx),
            (None, nested) => self.bind_pattern(nested, value, mode, ctx),
        }
    }

    fn bind_object_pattern(
        &mut self,
        pattern: &ObjectPattern,
        value: JsValue,
        mode: BindingMode,
        ctx: &ExecutionContext,
    ) -> Result<(), JsError> {
        if value.is_nullish() {
            let source = match pattern.properties.first().map(|p| &p.key) {
                Some(PropertyName::Identifier(name)) => format!("Cannot destructure property '{}' of", name),
                _ => "Cannot destructure".to_string(),
            };
            return Err(JsError::type_error(format!(
                "{} '{}' as it is {}.",
                source,
                value.describe(),
                value.describe()
            )));
        }

        let mut read_keys: Vec<PropertyKey> = Vec::new();
        for prop in &pattern.properties {
            let key = self.evaluate_property_name(&prop.key, ctx)?;
            read_keys.push(key.clone());
            let source = value.cheap_clone();
            self.bind_target_with(&prop.value, mode, ctx, &mut |interp| interp.get_v(&source, &key))?;
        }

        if let Some(rest) = &pattern.rest {
            let source = value.cheap_clone();
            self.bind_target_with(rest, mode, ctx, &mut |interp| {
                let target = interp.create_object();
                interp.copy_data_properties(&target, &source, &read_keys)?;
                Ok(JsValue::Object(target))
            })?;
        }
        Ok(())
    }

    fn bind_array_pattern(
        &mut self,
        pattern: &ArrayPattern,
        value: JsValue,
        mode: BindingMode,
        ctx: &ExecutionContext,
    ) -> Result<(), JsError> {
        let mut record = self.get_iterator(&value, super::IteratorHint::Sync)?;

        let result = (|| -> Result<(), JsError> {
            for element in &pattern.elements {
                match element {
                    None => {
                        self.iterator_step_value(&mut record)?;
                    }
                    Some(target) => {
                        self.bind_target_with(target, mode, ctx, &mut |interp| {
                            Ok(interp.iterator_step_value(&mut record)?.unwrap_or_default())
                        })?;
                    }
                }
            }
            if let Some(rest) = &pattern.rest {
                self.bind_target_with(rest, mode, ctx, &mut |interp| {
                    let mut values = Vec::new();
                    while let Some(v) = interp.iterator_step_value(&mut record)? {
                        values.push(v);
                    }
                    Ok(JsValue::Object(interp.create_array(values)))
                })?;
            }
            Ok(())
        })();

        match result {
            Ok(()) if !record.done => self.iterator_close(&record),
            Ok(()) => Ok(()),
            Err(error) => {
                if !record.done && error.is_catchable() {
                    self.iterator_close_after_throw(&record);
                }
                Err(error)
            }
        }
    }

    /// Key of an object literal member or object pattern property
    pub(crate) fn evaluate_property_name(
        &mut self,
        name: &PropertyName,
        ctx: &ExecutionContext,
    ) -> Result<PropertyKey, JsError> {
        Ok(match name {
            PropertyName::Identifier(s) | PropertyName::String(s) => PropertyKey::from_js_string(s.cheap_clone()),
            PropertyName::Number(n) => PropertyKey::from_number(*n),
            PropertyName::Computed(expr) => {
                let value = self.evaluate(expr, ctx)?;
                self.to_property_key(&value)?
            }
            PropertyName::Private(name) => {
                return Err(JsError::internal_error(format!(
                    "private name #{} used as a property key",
                    name
                )));
            }
        })
    }
}
