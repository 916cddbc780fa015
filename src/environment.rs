//! Environment records
//!
//! Environments live in an arena and are addressed by [`EnvId`]. Closures hold
//! an `EnvId` rather than an owning pointer, so an environment may be shared
//! by any number of closures (including closures stored in that very
//! environment). Reclamation is the job of [`crate::gc`].

use rustc_hash::FxHashMap;

use crate::error::JsError;
use crate::value::{CheapClone, JsObjectRef, JsString, JsValue, PropertyKey};

/// Stable handle to an environment record.
///
/// The generation distinguishes a recycled slot from the record a stale
/// handle once pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvId {
    index: u32,
    generation: u32,
}

impl EnvId {
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// Variable binding
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: JsValue,
    pub mutable: bool,
    /// `false` while the binding is in its temporal dead zone
    pub initialized: bool,
    /// Writes to an immutable binding throw even in sloppy code. Only the
    /// name binding of a named function expression clears this.
    pub strict: bool,
}

/// `this` state of a function environment
#[derive(Clone)]
pub struct FunctionScope {
    /// `None` until `super()` returns in a derived constructor
    pub this_value: Option<JsValue>,
    pub function: JsObjectRef,
    pub home_object: Option<JsObjectRef>,
    pub new_target: Option<JsObjectRef>,
}

#[derive(Clone)]
pub enum EnvironmentKind {
    /// Block, catch, loop-iteration and arrow-function scopes
    Declarative,
    /// Non-arrow function body scope, which owns a `this` binding
    Function(FunctionScope),
    /// Script scope. `var` and function bindings live on the global object.
    Global { object: JsObjectRef },
}

/// An environment record
pub struct Environment {
    pub bindings: FxHashMap<JsString, Binding>,
    pub outer: Option<EnvId>,
    pub kind: EnvironmentKind,
}

/// Where an identifier resolved to
#[derive(Clone)]
pub enum BindingLocation {
    Declarative(EnvId),
    /// A property of the global object (global `var`s, builtins, implicit globals)
    GlobalObject(JsObjectRef),
}

struct Slot {
    generation: u32,
    env: Option<Environment>,
}

/// Arena owning every environment record
#[derive(Default)]
pub struct EnvironmentArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl EnvironmentArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of environments currently allocated
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Total slots, allocated or free
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn alloc(&mut self, outer: Option<EnvId>, kind: EnvironmentKind) -> EnvId {
        let env = Environment {
            bindings: FxHashMap::default(),
            outer,
            kind,
        };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index as usize) {
                slot.generation = slot.generation.wrapping_add(1);
                slot.env = Some(env);
                return EnvId {
                    index,
                    generation: slot.generation,
                };
            }
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            env: Some(env),
        });
        EnvId {
            index,
            generation: 0,
        }
    }

    /// Declarative child scope
    pub fn alloc_declarative(&mut self, outer: EnvId) -> EnvId {
        self.alloc(Some(outer), EnvironmentKind::Declarative)
    }

    pub fn get(&self, id: EnvId) -> Result<&Environment, JsError> {
        match self.slots.get(id.index()) {
            Some(Slot {
                generation,
                env: Some(env),
            }) if *generation == id.generation => Ok(env),
            _ => Err(JsError::internal_error("access to a reclaimed environment")),
        }
    }

    pub fn get_mut(&mut self, id: EnvId) -> Result<&mut Environment, JsError> {
        match self.slots.get_mut(id.index()) {
            Some(Slot {
                generation,
                env: Some(env),
            }) if *generation == id.generation => Ok(env),
            _ => Err(JsError::internal_error("access to a reclaimed environment")),
        }
    }

    pub fn contains(&self, id: EnvId) -> bool {
        self.get(id).is_ok()
    }

    // ═══════════════════════════════════════════════════════════════
    // Binding operations
    // ═══════════════════════════════════════════════════════════════

    pub fn has_own_binding(&self, id: EnvId, name: &str) -> Result<bool, JsError> {
        Ok(self.get(id)?.bindings.contains_key(name))
    }

    /// Create a binding in the temporal dead zone
    pub fn create_mutable_binding(&mut self, id: EnvId, name: JsString) -> Result<(), JsError> {
        self.get_mut(id)?.bindings.insert(
            name,
            Binding {
                value: JsValue::Undefined,
                mutable: true,
                initialized: false,
                strict: true,
            },
        );
        Ok(())
    }

    pub fn create_immutable_binding(&mut self, id: EnvId, name: JsString) -> Result<(), JsError> {
        self.get_mut(id)?.bindings.insert(
            name,
            Binding {
                value: JsValue::Undefined,
                mutable: false,
                initialized: false,
                strict: true,
            },
        );
        Ok(())
    }

    /// Create and initialize in one step (parameters, `var`, catch bindings)
    pub fn declare(
        &mut self,
        id: EnvId,
        name: JsString,
        value: JsValue,
        mutable: bool,
    ) -> Result<(), JsError> {
        self.get_mut(id)?.bindings.insert(
            name,
            Binding {
                value,
                mutable,
                initialized: true,
                strict: true,
            },
        );
        Ok(())
    }

    /// The read-only self binding of a named function expression.
    /// Sloppy-mode writes to it are silently dropped.
    pub fn declare_function_name(
        &mut self,
        id: EnvId,
        name: JsString,
        value: JsValue,
    ) -> Result<(), JsError> {
        self.get_mut(id)?.bindings.insert(
            name,
            Binding {
                value,
                mutable: false,
                initialized: true,
                strict: false,
            },
        );
        Ok(())
    }

    /// InitializeBinding: end the temporal dead zone of an existing binding
    pub fn initialize_binding(&mut self, id: EnvId, name: &str, value: JsValue) -> Result<(), JsError> {
        match self.get_mut(id)?.bindings.get_mut(name) {
            Some(binding) => {
                binding.value = value;
                binding.initialized = true;
                Ok(())
            }
            None => Err(JsError::internal_error(format!(
                "initializing undeclared binding '{}'",
                name
            ))),
        }
    }

    /// GetBindingValue for a declarative binding known to exist in `id`
    pub fn get_binding_value(&self, id: EnvId, name: &str) -> Result<JsValue, JsError> {
        match self.get(id)?.bindings.get(name) {
            Some(binding) if binding.initialized => Ok(binding.value.cheap_clone()),
            Some(_) => Err(JsError::uninitialized(name)),
            None => Err(JsError::not_defined(name)),
        }
    }

    /// SetMutableBinding for a declarative binding known to exist in `id`
    pub fn set_mutable_binding(
        &mut self,
        id: EnvId,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> Result<(), JsError> {
        match self.get_mut(id)?.bindings.get_mut(name) {
            Some(binding) if !binding.initialized => Err(JsError::uninitialized(name)),
            Some(binding) if !binding.mutable => {
                if binding.strict || strict {
                    Err(JsError::type_error("Assignment to constant variable."))
                } else {
                    Ok(())
                }
            }
            Some(binding) => {
                binding.value = value;
                Ok(())
            }
            None => Err(JsError::not_defined(name)),
        }
    }

    /// Declarative bindings cannot be deleted; this only reports whether
    /// the binding exists
    pub fn delete_binding(&self, id: EnvId, name: &str) -> Result<bool, JsError> {
        Ok(!self.get(id)?.bindings.contains_key(name))
    }

    /// Walk the chain from `id` outward and find the record that binds `name`.
    /// `Ok(None)` means the reference is unresolvable.
    pub fn resolve(&self, id: EnvId, name: &str) -> Result<Option<BindingLocation>, JsError> {
        let mut current = Some(id);
        while let Some(env_id) = current {
            let env = self.get(env_id)?;
            if env.bindings.contains_key(name) {
                return Ok(Some(BindingLocation::Declarative(env_id)));
            }
            if let EnvironmentKind::Global { object } = &env.kind {
                if object_has_property(object, &PropertyKey::from(name)) {
                    return Ok(Some(BindingLocation::GlobalObject(object.cheap_clone())));
                }
            }
            current = env.outer;
        }
        Ok(None)
    }

    // ═══════════════════════════════════════════════════════════════
    // `this` and function state
    // ═══════════════════════════════════════════════════════════════

    /// GetThisEnvironment: nearest function or global record. Arrow
    /// functions and blocks are declarative, which gives arrows lexical `this`.
    pub fn this_environment(&self, id: EnvId) -> Result<EnvId, JsError> {
        let mut current = Some(id);
        while let Some(env_id) = current {
            let env = self.get(env_id)?;
            match env.kind {
                EnvironmentKind::Function(_) | EnvironmentKind::Global { .. } => return Ok(env_id),
                EnvironmentKind::Declarative => current = env.outer,
            }
        }
        Err(JsError::internal_error("environment chain without a this binding"))
    }

    /// Function scope of the nearest non-arrow function, if any
    pub fn function_scope(&self, id: EnvId) -> Result<Option<&FunctionScope>, JsError> {
        let this_env = self.this_environment(id)?;
        match &self.get(this_env)?.kind {
            EnvironmentKind::Function(scope) => Ok(Some(scope)),
            _ => Ok(None),
        }
    }

    /// ResolveThisBinding
    pub fn this_value(&self, id: EnvId) -> Result<JsValue, JsError> {
        let this_env = self.this_environment(id)?;
        match &self.get(this_env)?.kind {
            EnvironmentKind::Function(scope) => scope.this_value.clone().ok_or_else(|| {
                JsError::reference_error(
                    "Must call super constructor in derived class before accessing 'this' or returning from derived constructor",
                )
            }),
            EnvironmentKind::Global { object } => Ok(JsValue::Object(object.cheap_clone())),
            EnvironmentKind::Declarative => Err(JsError::internal_error("declarative this environment")),
        }
    }

    /// BindThisValue. A second binding is the double `super()` error.
    pub fn bind_this_value(&mut self, id: EnvId, value: JsValue) -> Result<(), JsError> {
        let this_env = self.this_environment(id)?;
        match &mut self.get_mut(this_env)?.kind {
            EnvironmentKind::Function(scope) => {
                if scope.this_value.is_some() {
                    return Err(JsError::reference_error("Super constructor may only be called once"));
                }
                scope.this_value = Some(value);
                Ok(())
            }
            _ => Err(JsError::internal_error("binding this outside a function")),
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Reclamation support
    // ═══════════════════════════════════════════════════════════════

    /// Ids of every live record
    pub fn live_ids(&self) -> Vec<EnvId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.env.is_some())
            .map(|(index, slot)| EnvId {
                index: u32::try_from(index).unwrap_or(u32::MAX),
                generation: slot.generation,
            })
            .collect()
    }

    /// Free a record. Its bindings are dropped, which releases any closure
    /// cycles running through them.
    pub fn release(&mut self, id: EnvId) -> Option<Environment> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        let env = slot.env.take()?;
        self.free.push(id.index);
        self.live = self.live.saturating_sub(1);
        Some(env)
    }
}

/// Side-effect free HasProperty over the raw prototype chain
fn object_has_property(object: &JsObjectRef, key: &PropertyKey) -> bool {
    let mut current = Some(object.cheap_clone());
    while let Some(obj) = current {
        let obj_ref = obj.borrow();
        if obj_ref.has_own_property(key) {
            return true;
        }
        current = obj_ref.prototype.clone();
    }
    false
}
