//! Declaration instantiation
//!
//! Every scope is set up from the `ScopeDeclarations` the parser attached to
//! it before its first statement runs. `let`, `const` and `class` names start
//! out uninitialized, `var` names start as `undefined`, and function
//! declarations are bound to fresh closures. Name collisions are reported
//! here as SyntaxErrors, before anything in the scope executes.

use std::rc::Rc;

use rustc_hash::FxHashSet;

use super::pattern::BindingMode;
use super::{ExecutionContext, Interpreter, PropertyDescriptor};
use crate::ast::{FunctionNode, Program, ScopeDeclarations};
use crate::environment::EnvId;
use crate::error::JsError;
use crate::value::{
    CheapClone, Closure, ExoticObject, JsObject, JsObjectRef, JsString, JsValue, Property,
    PropertyKey,
};

fn already_declared(name: &JsString, span: crate::lexer::Span) -> JsError {
    JsError::syntax_error_at(format!("Identifier '{}' has already been declared", name), span)
}

/// A lexical name may appear once per scope and never alongside a `var` of
/// the same name. Sloppy blocks tolerate repeated function declarations.
fn check_lexical_collisions(scope: &ScopeDeclarations, allow_function_duplicates: bool) -> Result<(), JsError> {
    let mut seen: FxHashSet<&JsString> = FxHashSet::default();
    for (i, lexical) in scope.lexical.iter().enumerate() {
        if !seen.insert(&lexical.name) {
            let both_functions = lexical.is_function
                && scope
                    .lexical
                    .iter()
                    .take(i)
                    .filter(|l| l.name == lexical.name)
                    .all(|l| l.is_function);
            if !(allow_function_duplicates && both_functions) {
                return Err(already_declared(&lexical.name, lexical.span));
            }
        }
        if scope.var_names.iter().any(|v| v.name == lexical.name) {
            return Err(already_declared(&lexical.name, lexical.span));
        }
    }
    Ok(())
}

/// Name a function declaration binds
fn declared_name(func: &FunctionNode) -> Option<&JsString> {
    func.name.as_ref().map(|id| &id.name)
}

impl Interpreter {
    /// GlobalDeclarationInstantiation
    pub(crate) fn instantiate_global(&mut self, program: &Program, ctx: &ExecutionContext) -> Result<(), JsError> {
        let scope = &program.scope;
        let global_env = self.global_env;
        let global = self.global.cheap_clone();
        check_lexical_collisions(scope, false)?;

        for lexical in &scope.lexical {
            if self.envs.has_own_binding(global_env, lexical.name.as_str())? {
                return Err(already_declared(&lexical.name, lexical.span));
            }
            let key = PropertyKey::from_js_string(lexical.name.cheap_clone());
            if self.get_own_property(&global, &key).is_some_and(|p| !p.configurable) {
                return Err(already_declared(&lexical.name, lexical.span));
            }
        }
        for var in &scope.var_names {
            if self.envs.has_own_binding(global_env, var.name.as_str())? {
                return Err(already_declared(&var.name, var.span));
            }
        }

        // The last declaration of a name wins
        let mut declared: FxHashSet<JsString> = FxHashSet::default();
        let mut functions = Vec::new();
        for func in scope.functions.iter().rev() {
            let Some(name) = declared_name(func) else { continue };
            if !declared.insert(name.cheap_clone()) {
                continue;
            }
            let key = PropertyKey::from_js_string(name.cheap_clone());
            let can_declare = match self.get_own_property(&global, &key) {
                None => global.borrow().extensible,
                Some(existing) => existing.configurable || (existing.writable() && existing.enumerable),
            };
            if !can_declare {
                return Err(JsError::type_error(format!("Cannot redefine global function '{}'", name)));
            }
            functions.push(Rc::clone(func));
        }

        let var_names: Vec<JsString> = scope
            .var_names
            .iter()
            .map(|v| v.name.cheap_clone())
            .chain(scope.annex_b_names.iter().cloned())
            .filter(|name| !declared.contains(name))
            .collect();
        for name in &var_names {
            let key = PropertyKey::from_js_string(name.cheap_clone());
            if !global.borrow().has_own_property(&key) && !global.borrow().extensible {
                return Err(JsError::type_error(format!("Cannot define global variable '{}'", name)));
            }
        }

        for lexical in &scope.lexical {
            if lexical.is_const {
                self.envs.create_immutable_binding(global_env, lexical.name.cheap_clone())?;
            } else {
                self.envs.create_mutable_binding(global_env, lexical.name.cheap_clone())?;
            }
        }

        for func in functions.iter().rev() {
            let Some(name) = declared_name(func) else { continue };
            let closure = self.create_function_object(func, ctx.env, None, None, name.cheap_clone());
            let key = PropertyKey::from_js_string(name.cheap_clone());
            let value = JsValue::Object(closure);
            let replaceable = self.get_own_property(&global, &key).is_none_or(|p| p.configurable);
            if replaceable {
                let desc = PropertyDescriptor::data(value, true, true, false);
                self.define_property_or_throw(&global, key, &desc)?;
            } else {
                self.set_or_throw(&global, &key, value)?;
            }
        }

        for name in var_names {
            let key = PropertyKey::from_js_string(name);
            if !global.borrow().has_own_property(&key) {
                let desc = PropertyDescriptor::data(JsValue::Undefined, true, true, false);
                self.define_property_or_throw(&global, key, &desc)?;
            }
        }
        Ok(())
    }

    /// BlockDeclarationInstantiation. A block without declarations runs in
    /// the surrounding environment.
    pub(crate) fn instantiate_block(
        &mut self,
        scope: &ScopeDeclarations,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionContext, JsError> {
        if scope.lexical.is_empty() {
            return Ok(ctx.clone());
        }
        check_lexical_collisions(scope, !ctx.strict)?;

        let env = self.envs.alloc_declarative(ctx.env);
        for lexical in &scope.lexical {
            if self.envs.has_own_binding(env, lexical.name.as_str())? {
                continue;
            }
            if lexical.is_const {
                self.envs.create_immutable_binding(env, lexical.name.cheap_clone())?;
            } else {
                self.envs.create_mutable_binding(env, lexical.name.cheap_clone())?;
            }
        }

        for func in &scope.functions {
            let Some(name) = declared_name(func) else { continue };
            let closure = self.create_function_object(func, env, ctx.private_env.clone(), None, name.cheap_clone());
            self.envs
                .initialize_binding(env, name.as_str(), JsValue::Object(closure))?;
        }
        Ok(ctx.with_env(env))
    }

    /// FunctionDeclarationInstantiation: parameters, `arguments`, vars,
    /// lexical names and nested functions of a call's body
    pub(crate) fn instantiate_function(
        &mut self,
        func_obj: &JsObjectRef,
        closure: &Closure,
        env: EnvId,
        args: &[JsValue],
    ) -> Result<ExecutionContext, JsError> {
        let node = &closure.node;
        let scope = &node.scope;
        let strict = closure.strict;
        let param_ctx = ExecutionContext {
            env,
            var_env: env,
            private_env: closure.private_env.clone(),
            var_scope: Rc::clone(scope),
            strict,
        };

        let shadows_arguments = |name: &JsString| name.as_str() == "arguments";
        let needs_arguments = node.uses_arguments
            && !closure.kind.is_arrow()
            && !node.param_names.iter().any(shadows_arguments)
            && !scope
                .functions
                .iter()
                .filter_map(|f| declared_name(f))
                .any(shadows_arguments)
            && !scope.lexical.iter().any(|l| shadows_arguments(&l.name));

        if needs_arguments {
            let arguments = self.create_arguments_object(func_obj, args, strict);
            let name = self.intern("arguments");
            self.envs.declare(env, name, JsValue::Object(arguments), !strict)?;
        }

        if node.simple_params {
            // Repeated names in sloppy code: the last one wins
            for (i, name) in node.param_names.iter().enumerate() {
                let value = args.get(i).cloned().unwrap_or_default();
                self.envs.declare(env, name.cheap_clone(), value, true)?;
            }
        } else {
            for name in &node.param_names {
                self.envs.create_mutable_binding(env, name.cheap_clone())?;
            }
            for (i, param) in node.params.iter().enumerate() {
                let value = args.get(i).cloned().unwrap_or_default();
                self.bind_pattern(param, value, BindingMode::Initialize(env), &param_ctx)?;
            }
            if let Some(rest) = &node.rest {
                let values = args.get(node.params.len()..).map(<[JsValue]>::to_vec).unwrap_or_default();
                let array = self.create_array(values);
                self.bind_pattern(rest, JsValue::Object(array), BindingMode::Initialize(env), &param_ctx)?;
            }
        }

        // Parameter expressions get their own scope, so body vars live apart
        // and start with the value of a same-named parameter
        let var_env = if node.simple_params {
            env
        } else {
            self.envs.alloc_declarative(env)
        };
        let var_names = scope
            .var_names
            .iter()
            .map(|v| &v.name)
            .chain(scope.annex_b_names.iter());
        for name in var_names {
            if self.envs.has_own_binding(var_env, name.as_str())? {
                continue;
            }
            let initial = if var_env != env && self.envs.has_own_binding(env, name.as_str())? {
                self.envs.get_binding_value(env, name.as_str())?
            } else {
                JsValue::Undefined
            };
            self.envs.declare(var_env, name.cheap_clone(), initial, true)?;
        }

        check_lexical_collisions(scope, false)?;
        for lexical in &scope.lexical {
            if lexical.is_const {
                self.envs.create_immutable_binding(var_env, lexical.name.cheap_clone())?;
            } else {
                self.envs.create_mutable_binding(var_env, lexical.name.cheap_clone())?;
            }
        }

        let mut declared: FxHashSet<&JsString> = FxHashSet::default();
        for func in scope.functions.iter().rev() {
            let Some(name) = declared_name(func) else { continue };
            if !declared.insert(name) {
                continue;
            }
            let inner = self.create_function_object(
                func,
                var_env,
                closure.private_env.clone(),
                None,
                name.cheap_clone(),
            );
            self.envs.declare(var_env, name.cheap_clone(), JsValue::Object(inner), true)?;
        }

        Ok(ExecutionContext {
            env: var_env,
            var_env,
            ..param_ctx
        })
    }

    /// Sloppy block function: when its declaration is evaluated, the block
    /// binding's value is copied to the function-level var of the same name
    pub(crate) fn hoist_block_function(&mut self, func: &FunctionNode, ctx: &ExecutionContext) -> Result<(), JsError> {
        if ctx.strict || ctx.env == ctx.var_env {
            return Ok(());
        }
        let Some(name) = declared_name(func) else {
            return Ok(());
        };
        if !ctx.var_scope.annex_b_names.contains(name) {
            return Ok(());
        }
        let value = self.envs.get_binding_value(ctx.env, name.as_str())?;
        if ctx.var_env == self.global_env {
            let global = self.global.cheap_clone();
            let key = PropertyKey::from_js_string(name.cheap_clone());
            self.set_or_throw(&global, &key, value)
        } else {
            self.envs.set_mutable_binding(ctx.var_env, name.as_str(), value, false)
        }
    }

    /// Unmapped arguments object. Sloppy functions also expose `callee`.
    fn create_arguments_object(&mut self, func: &JsObjectRef, args: &[JsValue], strict: bool) -> JsObjectRef {
        let mut obj = JsObject::with_prototype(Some(self.intrinsics.object_prototype.cheap_clone()));
        obj.exotic = ExoticObject::Arguments;
        for (i, value) in args.iter().enumerate() {
            let index = u32::try_from(i).unwrap_or(u32::MAX - 1);
            obj.define_property(PropertyKey::Index(index), Property::data(value.cheap_clone()));
        }
        let length_key = self.key("length");
        obj.define_property(length_key, Property::hidden(JsValue::Number(args.len() as f64)));
        obj.define_property(
            PropertyKey::Symbol(self.symbols.iterator.cheap_clone()),
            Property::hidden(JsValue::Object(self.intrinsics.array_values.cheap_clone())),
        );

        let callee_key = self.key("callee");
        if strict {
            let thrower = self.create_native_function("", throw_callee_access, 0);
            let mut accessor = Property::accessor(Some(thrower.cheap_clone()), Some(thrower), false);
            accessor.configurable = false;
            obj.define_property(callee_key, accessor);
        } else {
            obj.define_property(callee_key, Property::hidden(JsValue::Object(func.cheap_clone())));
        }
        Rc::new(std::cell::RefCell::new(obj))
    }
}

fn throw_callee_access(_interp: &mut Interpreter, _this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Err(JsError::type_error(
        "'callee' may not be accessed on strict mode arguments objects",
    ))
}
