//! Tree-walking evaluator
//!
//! [`Interpreter`] owns one realm: the global object, the intrinsic
//! prototypes and the environment arena. Statements evaluate to a
//! [`Completion`]; a `throw` travels through the `Err` arm of the result
//! instead, so `?` is the propagation rule for exceptions.
//!
//! The evaluator is split by concern:
//! - `expression`: every expression kind, including calls and templates
//! - `reference`: identifier and property references (`get`/`put`/`delete`)
//! - `statement`: statements, loops and completion propagation
//! - `declaration`: hoisting and binding instantiation for scopes
//! - `function`: closures, `[[Call]]` and `[[Construct]]`
//! - `class`: class definition evaluation and instance elements
//! - `pattern`: destructuring for declarations, parameters and assignment
//! - `iterator`: the iterator protocol and `for-in` key collection
//! - `operations` / `object`: abstract operations and object internal methods

pub mod builtins;
mod class;
mod declaration;
mod expression;
mod function;
mod iterator;
mod object;
mod operations;
mod pattern;
mod reference;
mod statement;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::RuntimeConfig;
use crate::ast::{Program, ScopeDeclarations, TemplateLiteral};
use crate::environment::{EnvId, EnvironmentArena, EnvironmentKind};
use crate::error::{ErrorKind, JsError};
use crate::gc::GcStats;
use crate::string_dict::StringDict;
use crate::value::{
    CheapClone, ExoticObject, JsFunction, JsObject, JsObjectRef, JsString, JsSymbol, JsValue,
    NativeCtorFn, NativeFn, NativeFunction, PrivateEnvironment, Property, PropertyKey,
};

pub use builtins::Intrinsics;
pub use iterator::{IteratorHint, IteratorRecord};
pub use object::PropertyDescriptor;
pub use operations::{Numeric, PreferredType};
pub use reference::Reference;

/// Completion record for statement evaluation.
///
/// `Normal(None)` is the empty completion. Break and Continue carry the
/// value of the statement list they interrupted so that `update_empty`
/// can thread completion values through loops.
#[derive(Debug)]
pub enum Completion {
    Normal(Option<JsValue>),
    Return(JsValue),
    Break(Option<JsString>, Option<JsValue>),
    Continue(Option<JsString>, Option<JsValue>),
}

impl Completion {
    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }

    /// Value carried by the completion, if it is not empty
    pub fn value(&self) -> Option<&JsValue> {
        match self {
            Completion::Normal(v) | Completion::Break(_, v) | Completion::Continue(_, v) => {
                v.as_ref()
            }
            Completion::Return(v) => Some(v),
        }
    }

    /// UpdateEmpty: fill an empty completion value with `value`
    pub fn update_empty(self, value: Option<JsValue>) -> Completion {
        match self {
            Completion::Normal(None) => Completion::Normal(value),
            Completion::Break(label, None) => Completion::Break(label, value),
            Completion::Continue(label, None) => Completion::Continue(label, value),
            other => other,
        }
    }
}

/// Running execution context, threaded through every evaluation call
#[derive(Clone)]
pub struct ExecutionContext {
    /// LexicalEnvironment
    pub env: EnvId,
    /// VariableEnvironment of the enclosing function or script
    pub var_env: EnvId,
    pub private_env: Option<Rc<PrivateEnvironment>>,
    /// Declarations of the enclosing function or script body
    pub var_scope: Rc<ScopeDeclarations>,
    pub strict: bool,
}

impl ExecutionContext {
    /// Same context with a different lexical environment
    pub fn with_env(&self, env: EnvId) -> Self {
        Self {
            env,
            ..self.clone()
        }
    }
}

/// Well-known symbols shared by the realm
pub struct WellKnownSymbols {
    pub iterator: JsSymbol,
    pub async_iterator: JsSymbol,
    pub has_instance: JsSymbol,
    pub to_primitive: JsSymbol,
    pub to_string_tag: JsSymbol,
}

impl WellKnownSymbols {
    fn new() -> Self {
        let make = |name: &str| JsSymbol::new(Some(JsString::from(format!("Symbol.{}", name))));
        Self {
            iterator: make("iterator"),
            async_iterator: make("asyncIterator"),
            has_instance: make("hasInstance"),
            to_primitive: make("toPrimitive"),
            to_string_tag: make("toStringTag"),
        }
    }
}

/// The evaluator and its realm
pub struct Interpreter {
    pub(crate) envs: EnvironmentArena,
    pub(crate) global: JsObjectRef,
    pub(crate) global_env: EnvId,
    pub(crate) intrinsics: Intrinsics,
    pub(crate) symbols: WellKnownSymbols,
    pub(crate) string_dict: StringDict,

    /// `Symbol.for` registry
    pub(crate) symbol_registry: FxHashMap<JsString, JsSymbol>,

    /// Template objects, one per tagged template site. The `Rc` keeps the
    /// site alive so its address cannot be reused as a key.
    pub(crate) template_cache: FxHashMap<usize, (Rc<TemplateLiteral>, JsObjectRef)>,

    /// Every script function object ever created, for the collector to find
    /// closures held only by the host
    pub(crate) closures: Vec<Weak<RefCell<JsObject>>>,

    /// Environments of in-flight frames
    pub(crate) frame_roots: Vec<EnvId>,

    pub(crate) call_depth: usize,
    pub(crate) config: RuntimeConfig,
    pub(crate) last_gc: GcStats,
}

impl Interpreter {
    /// Create an interpreter with a fresh realm
    pub fn new(config: RuntimeConfig) -> Self {
        let intrinsics = Intrinsics::allocate();
        let global = Rc::new(RefCell::new(JsObject::with_prototype(Some(
            intrinsics.object_prototype.cheap_clone(),
        ))));
        let mut envs = EnvironmentArena::new();
        let global_env = envs.alloc(
            None,
            EnvironmentKind::Global {
                object: global.cheap_clone(),
            },
        );

        let mut interp = Self {
            envs,
            global,
            global_env,
            intrinsics,
            symbols: WellKnownSymbols::new(),
            string_dict: StringDict::with_common_strings(),
            symbol_registry: FxHashMap::default(),
            template_cache: FxHashMap::default(),
            closures: Vec::new(),
            frame_roots: Vec::new(),
            call_depth: 0,
            config,
            last_gc: GcStats::default(),
        };
        builtins::install(&mut interp);
        tracing::debug!(
            globals = interp.global.borrow().properties.len(),
            "realm created"
        );
        interp
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn global_object(&self) -> &JsObjectRef {
        &self.global
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    pub fn symbols(&self) -> &WellKnownSymbols {
        &self.symbols
    }

    pub fn string_dict(&mut self) -> &mut StringDict {
        &mut self.string_dict
    }

    /// Number of live environment records
    pub fn live_environments(&self) -> usize {
        self.envs.live_count()
    }

    /// Statistics of the most recent collection
    pub fn last_gc_stats(&self) -> GcStats {
        self.last_gc
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Allocation helpers
    // ═══════════════════════════════════════════════════════════════════════

    /// Intern a string
    pub fn intern(&mut self, s: &str) -> JsString {
        self.string_dict.get_or_insert(s)
    }

    /// Interned property key
    pub fn key(&mut self, s: &str) -> PropertyKey {
        PropertyKey::from_js_string(self.intern(s))
    }

    /// Ordinary object inheriting from %Object.prototype%
    pub fn create_object(&mut self) -> JsObjectRef {
        self.create_object_with_proto(Some(self.intrinsics.object_prototype.cheap_clone()))
    }

    pub fn create_object_with_proto(&mut self, prototype: Option<JsObjectRef>) -> JsObjectRef {
        Rc::new(RefCell::new(JsObject::with_prototype(prototype)))
    }

    /// Array exotic object holding `elements`
    pub fn create_array(&mut self, elements: Vec<JsValue>) -> JsObjectRef {
        let mut obj = JsObject::with_prototype(Some(self.intrinsics.array_prototype.cheap_clone()));
        obj.exotic = ExoticObject::Array {
            length: 0,
            length_writable: true,
        };
        for (i, value) in elements.into_iter().enumerate() {
            let index = u32::try_from(i).unwrap_or(u32::MAX - 1);
            obj.define_property(PropertyKey::Index(index), Property::data(value));
        }
        Rc::new(RefCell::new(obj))
    }

    /// Function object wrapping `func`, inheriting from %Function.prototype%
    pub fn create_function(&mut self, func: JsFunction) -> JsObjectRef {
        let mut obj = JsObject::with_prototype(Some(self.intrinsics.function_prototype.cheap_clone()));
        obj.exotic = ExoticObject::Function(func);
        Rc::new(RefCell::new(obj))
    }

    /// Native function with `name` and `length` installed
    pub fn create_native_function(&mut self, name: &str, func: NativeFn, arity: usize) -> JsObjectRef {
        self.create_native(name, func, None, arity)
    }

    /// Native function that can also be called with `new`
    pub fn create_native_constructor(
        &mut self,
        name: &str,
        func: NativeFn,
        ctor: NativeCtorFn,
        arity: usize,
    ) -> JsObjectRef {
        self.create_native(name, func, Some(ctor), arity)
    }

    fn create_native(
        &mut self,
        name: &str,
        func: NativeFn,
        ctor: Option<NativeCtorFn>,
        arity: usize,
    ) -> JsObjectRef {
        let name = self.intern(name);
        let obj = self.create_function(JsFunction::Native(NativeFunction {
            name: name.cheap_clone(),
            func,
            arity,
            ctor,
        }));
        self.define_function_metadata(&obj, name, arity as f64);
        obj
    }

    /// `length` then `name`, both non-writable, non-enumerable, configurable
    pub(crate) fn define_function_metadata(&mut self, func: &JsObjectRef, name: JsString, length: f64) {
        let length_key = self.key("length");
        let name_key = self.key("name");
        let mut f = func.borrow_mut();
        f.define_property(
            length_key,
            Property::with_attributes(JsValue::Number(length), false, false, true),
        );
        f.define_property(
            name_key,
            Property::with_attributes(JsValue::String(name), false, false, true),
        );
    }

    /// Install a native method as a non-enumerable property
    pub fn register_method(&mut self, obj: &JsObjectRef, name: &str, func: NativeFn, arity: usize) {
        let func_obj = self.create_native_function(name, func, arity);
        let key = self.key(name);
        obj.borrow_mut()
            .define_property(key, Property::hidden(JsValue::Object(func_obj)));
    }

    /// Install a native method under a well-known symbol key
    pub fn register_symbol_method(
        &mut self,
        obj: &JsObjectRef,
        symbol: JsSymbol,
        name: &str,
        func: NativeFn,
        arity: usize,
    ) {
        let func_obj = self.create_native_function(name, func, arity);
        obj.borrow_mut().define_property(
            PropertyKey::Symbol(symbol),
            Property::hidden(JsValue::Object(func_obj)),
        );
    }

    /// Install a native accessor property with only a getter
    pub fn register_getter(&mut self, obj: &JsObjectRef, name: &str, func: NativeFn) {
        let getter = self.create_native_function(&format!("get {}", name), func, 0);
        let key = self.key(name);
        let mut prop = Property::accessor(Some(getter), None, false);
        prop.configurable = true;
        obj.borrow_mut().define_property(key, prop);
    }

    /// Non-enumerable data property
    pub fn define_hidden(&mut self, obj: &JsObjectRef, name: &str, value: JsValue) {
        let key = self.key(name);
        obj.borrow_mut().define_property(key, Property::hidden(value));
    }

    /// `{ value, done }` iterator result object
    pub fn create_iter_result(&mut self, value: JsValue, done: bool) -> JsValue {
        let obj = self.create_object();
        let value_key = self.key("value");
        let done_key = self.key("done");
        {
            let mut o = obj.borrow_mut();
            o.set_property(value_key, value);
            o.set_property(done_key, JsValue::Boolean(done));
        }
        JsValue::Object(obj)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Error instance of the given native kind
    pub fn create_error(&mut self, kind: ErrorKind, message: &str) -> JsObjectRef {
        let proto = self.intrinsics.error_prototype_for(kind);
        let obj = self.create_object_with_proto(Some(proto));
        obj.borrow_mut().exotic = ExoticObject::Error;
        if !message.is_empty() {
            self.define_hidden(&obj, "message", JsValue::from(message));
        }
        obj
    }

    /// Script-visible value of a caught error. Native error kinds are
    /// materialized as Error instances at this point.
    pub fn error_to_value(&mut self, error: JsError) -> JsValue {
        match error {
            JsError::Thrown { value } => value,
            other => match other.kind() {
                Some(kind) => JsValue::Object(self.create_error(kind, &other.message())),
                None => JsValue::from(other.message()),
            },
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Entry points
    // ═══════════════════════════════════════════════════════════════════════

    /// Context of top-level script code
    pub(crate) fn script_context(&self, program: &Program) -> ExecutionContext {
        ExecutionContext {
            env: self.global_env,
            var_env: self.global_env,
            private_env: None,
            var_scope: program.scope.cheap_clone(),
            strict: program.strict,
        }
    }

    /// Run a parsed script: instantiate its declarations on the global
    /// environment and execute its statements. The result is the script's
    /// completion value.
    pub fn execute(&mut self, program: &Program) -> Result<JsValue, JsError> {
        let ctx = self.script_context(program);
        self.frame_roots.push(self.global_env);
        let result = self
            .instantiate_global(program, &ctx)
            .and_then(|()| self.execute_statements(&program.body, &ctx));
        self.frame_roots.pop();

        match result {
            Ok(completion) => Ok(completion.value().cloned().unwrap_or(JsValue::Undefined)),
            Err(error) => {
                tracing::debug!(error = %error, "uncaught exception");
                Err(error)
            }
        }
    }

    /// Reclaim unreachable environments
    pub fn collect_garbage(&mut self) -> GcStats {
        let stats = crate::gc::collect(self);
        self.last_gc = stats;
        stats
    }

    /// Collect if the arena has grown past the configured threshold. Only
    /// runs between top-level evaluations.
    pub fn maybe_collect_garbage(&mut self) -> Option<GcStats> {
        if self.call_depth == 0
            && self.frame_roots.is_empty()
            && self.envs.live_count() > self.config.gc_threshold
        {
            return Some(self.collect_garbage());
        }
        None
    }

    /// Pass `value` to the configured await handler
    pub(crate) fn await_value(&mut self, value: JsValue) -> Result<JsValue, JsError> {
        let handler = Rc::clone(&self.config.await_handler);
        handler.await_value(self, value)
    }

    /// Count a call frame, failing once `max_call_depth` is reached
    pub(crate) fn enter_call(&mut self) -> Result<(), JsError> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(JsError::range_error("Maximum call stack size exceeded"));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub(crate) fn leave_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }
}
