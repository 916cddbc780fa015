//! Function objects, `[[Call]]` and `[[Construct]]`

use std::cell::RefCell;
use std::rc::Rc;

use super::{Completion, ExecutionContext, Interpreter};
use crate::ast::{FunctionBody, FunctionFlavor, FunctionNode};
use crate::environment::{EnvId, EnvironmentKind, FunctionScope};
use crate::error::JsError;
use crate::value::{
    CheapClone, Closure, FunctionKind, JsFunction, JsObjectRef, JsString, JsValue,
    PrivateEnvironment, Property, PropertyKey, PropertySlot,
};

/// Kind a function node produces when instantiated
pub(crate) fn function_kind(node: &FunctionNode) -> FunctionKind {
    match (node.flavor, node.is_async, node.is_generator) {
        (FunctionFlavor::Arrow, true, _) => FunctionKind::AsyncArrow,
        (FunctionFlavor::Arrow, false, _) => FunctionKind::Arrow,
        (FunctionFlavor::ClassConstructor { derived: true }, ..) => FunctionKind::DerivedConstructor,
        (FunctionFlavor::ClassConstructor { derived: false }, ..) => FunctionKind::BaseConstructor,
        (_, true, true) => FunctionKind::AsyncGenerator,
        (_, false, true) => FunctionKind::Generator,
        (_, true, false) => FunctionKind::Async,
        (FunctionFlavor::Normal, false, false) => FunctionKind::Normal,
        _ => FunctionKind::Method,
    }
}

impl Interpreter {
    /// OrdinaryFunctionCreate plus MakeConstructor where the kind allows it.
    /// Class constructors get their `prototype` from class evaluation.
    pub(crate) fn create_function_object(
        &mut self,
        node: &Rc<FunctionNode>,
        env: EnvId,
        private_env: Option<Rc<PrivateEnvironment>>,
        home_object: Option<JsObjectRef>,
        name: JsString,
    ) -> JsObjectRef {
        let kind = function_kind(node);
        let closure = Closure {
            node: Rc::clone(node),
            env,
            private_env,
            home_object,
            kind,
            strict: node.strict,
            instance_elements: RefCell::new(Vec::new()),
        };
        let func = self.create_function(JsFunction::Interpreted(Rc::new(closure)));
        self.define_function_metadata(&func, name, f64::from(node.length));

        let prototype = match kind {
            FunctionKind::Normal => {
                let proto = self.create_object();
                self.define_hidden(&proto, "constructor", JsValue::Object(func.cheap_clone()));
                Some(proto)
            }
            FunctionKind::Generator | FunctionKind::AsyncGenerator => Some(self.create_object()),
            _ => None,
        };
        if let Some(proto) = prototype {
            let key = self.key("prototype");
            func.borrow_mut().define_property(
                key,
                Property::with_attributes(JsValue::Object(proto), true, false, false),
            );
        }

        self.closures.push(Rc::downgrade(&func));
        func
    }

    /// A named function expression sees its own name in an intermediate
    /// scope holding a read-only binding
    pub(crate) fn instantiate_function_expression(
        &mut self,
        node: &Rc<FunctionNode>,
        ctx: &ExecutionContext,
        name: Option<JsString>,
    ) -> Result<JsValue, JsError> {
        match &node.name {
            Some(id) => {
                let func_env = self.envs.alloc_declarative(ctx.env);
                let func = self.create_function_object(
                    node,
                    func_env,
                    ctx.private_env.clone(),
                    None,
                    id.name.cheap_clone(),
                );
                self.envs
                    .declare_function_name(func_env, id.name.cheap_clone(), JsValue::Object(func.cheap_clone()))?;
                Ok(JsValue::Object(func))
            }
            None => {
                let name = match name {
                    Some(name) => name,
                    None => self.intern(""),
                };
                Ok(JsValue::Object(self.create_function_object(
                    node,
                    ctx.env,
                    ctx.private_env.clone(),
                    None,
                    name,
                )))
            }
        }
    }

    /// `[[Call]]`
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn call_function(&mut self, callee: &JsValue, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
        let JsValue::Object(func_obj) = callee else {
            return Err(JsError::type_error(format!("{} is not a function", callee.describe())));
        };
        let func = func_obj.borrow().as_function().cloned();
        match func {
            None => Err(JsError::type_error(format!("{} is not a function", callee.describe()))),
            Some(JsFunction::Native(native)) => {
                self.enter_call()?;
                let result = (native.func)(self, this, args);
                self.leave_call();
                result
            }
            Some(JsFunction::Bound(bound)) => {
                let mut full_args = bound.args.clone();
                full_args.extend_from_slice(args);
                let target = JsValue::Object(bound.target.cheap_clone());
                self.call_function(&target, bound.this.cheap_clone(), &full_args)
            }
            Some(JsFunction::Interpreted(closure)) => {
                if closure.kind.is_class_constructor() {
                    return Err(JsError::type_error(format!(
                        "Class constructor {} cannot be invoked without 'new'",
                        function_display_name(func_obj)
                    )));
                }
                if closure.kind.is_generator() {
                    return Err(JsError::type_error(format!(
                        "Generator function {} cannot run without a suspension driver",
                        function_display_name(func_obj)
                    )));
                }

                let this = if closure.kind.is_arrow() {
                    None
                } else if closure.strict {
                    Some(this)
                } else if this.is_nullish() {
                    Some(JsValue::Object(self.global.cheap_clone()))
                } else {
                    Some(JsValue::Object(self.to_object(&this)?))
                };

                self.enter_call()?;
                let result = crate::stack::ensure_sufficient_stack(|| {
                    self.call_closure(func_obj, &closure, this, args, None)
                });
                self.leave_call();
                result.map(|(value, _)| value)
            }
        }
    }

    /// `[[Construct]]`. `new_target` defaults to the callee itself.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn construct(
        &mut self,
        callee: &JsValue,
        args: &[JsValue],
        new_target: Option<&JsObjectRef>,
    ) -> Result<JsValue, JsError> {
        let not_a_constructor = || JsError::type_error(format!("{} is not a constructor", callee.describe()));
        let JsValue::Object(func_obj) = callee else {
            return Err(not_a_constructor());
        };
        let new_target = new_target.cloned().unwrap_or_else(|| func_obj.cheap_clone());
        let func = func_obj.borrow().as_function().cloned();

        match func {
            Some(JsFunction::Native(native)) => {
                let Some(ctor) = native.ctor else {
                    return Err(not_a_constructor());
                };
                self.enter_call()?;
                let result = ctor(self, args, &new_target);
                self.leave_call();
                result
            }
            Some(JsFunction::Bound(bound)) => {
                let mut full_args = bound.args.clone();
                full_args.extend_from_slice(args);
                let new_target = if Rc::ptr_eq(&new_target, func_obj) {
                    bound.target.cheap_clone()
                } else {
                    new_target
                };
                let target = JsValue::Object(bound.target.cheap_clone());
                self.construct(&target, &full_args, Some(&new_target))
            }
            Some(JsFunction::Interpreted(closure)) if closure.kind.is_constructor() => {
                let derived = closure.kind == FunctionKind::DerivedConstructor;
                let this = if derived {
                    None
                } else {
                    let default = self.intrinsics.object_prototype.cheap_clone();
                    let proto = self.get_prototype_from_constructor(&new_target, default)?;
                    Some(JsValue::Object(self.create_object_with_proto(Some(proto))))
                };

                self.enter_call()?;
                let result = crate::stack::ensure_sufficient_stack(|| {
                    self.call_closure(func_obj, &closure, this, args, Some(new_target))
                });
                self.leave_call();
                let (value, env) = result?;

                if value.is_object() {
                    return Ok(value);
                }
                if derived && !value.is_undefined() {
                    return Err(JsError::type_error(
                        "Derived constructors may only return object or undefined",
                    ));
                }
                self.envs.this_value(env)
            }
            _ => Err(not_a_constructor()),
        }
    }

    /// Run a script function in a fresh environment. Returns the body's
    /// result and the function environment, which `construct` reads `this`
    /// from.
    fn call_closure(
        &mut self,
        func_obj: &JsObjectRef,
        closure: &Rc<Closure>,
        this: Option<JsValue>,
        args: &[JsValue],
        new_target: Option<JsObjectRef>,
    ) -> Result<(JsValue, EnvId), JsError> {
        let env = if closure.kind.is_arrow() {
            self.envs.alloc_declarative(closure.env)
        } else {
            self.envs.alloc(
                Some(closure.env),
                EnvironmentKind::Function(FunctionScope {
                    this_value: this.clone(),
                    function: func_obj.cheap_clone(),
                    home_object: closure.home_object.clone(),
                    new_target,
                }),
            )
        };

        self.frame_roots.push(env);
        let result = (|| -> Result<JsValue, JsError> {
            if closure.kind == FunctionKind::BaseConstructor {
                if let Some(JsValue::Object(instance)) = &this {
                    self.initialize_instance_elements(instance, func_obj)?;
                }
            }
            let ctx = self.instantiate_function(func_obj, closure, env, args)?;
            self.evaluate_function_body(func_obj, closure, &ctx)
        })();
        self.frame_roots.pop();

        result.map(|value| (value, env))
    }

    fn evaluate_function_body(
        &mut self,
        func_obj: &JsObjectRef,
        closure: &Closure,
        ctx: &ExecutionContext,
    ) -> Result<JsValue, JsError> {
        match &closure.node.body {
            FunctionBody::Block(body) => match self.execute_statements(body, ctx)? {
                Completion::Return(value) => Ok(value),
                _ => Ok(JsValue::Undefined),
            },
            FunctionBody::Expression(expr) => {
                if closure.node.flavor == FunctionFlavor::FieldInitializer {
                    // Field initializers pass the field name on to anonymous functions
                    let name = own_name(func_obj);
                    return self.evaluate_named(expr, &name, ctx);
                }
                self.evaluate(expr, ctx)
            }
        }
    }

    /// Bound function exotic object for `Function.prototype.bind`
    pub(crate) fn create_bound_function(
        &mut self,
        target: &JsObjectRef,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsObjectRef, JsError> {
        let bound = self.create_function(JsFunction::Bound(Rc::new(crate::value::BoundFunction {
            target: target.cheap_clone(),
            this,
            args: args.clone(),
        })));
        let proto = target.borrow().prototype.clone();
        bound.borrow_mut().prototype = proto;

        let target_value = JsValue::Object(target.cheap_clone());
        let length_key = self.key("length");
        let length = if target.borrow().has_own_property(&length_key) {
            match self.get(target, &length_key, &target_value)? {
                JsValue::Number(n) if n.is_infinite() && n > 0.0 => n,
                JsValue::Number(n) if n.is_finite() => (n.trunc() - args.len() as f64).max(0.0),
                _ => 0.0,
            }
        } else {
            0.0
        };
        let name = match self.get_named(&target_value, "name")? {
            JsValue::String(s) => s,
            _ => self.intern(""),
        };
        let name = self.intern(&format!("bound {}", name));
        self.define_function_metadata(&bound, name, length);
        Ok(bound)
    }
}

/// Own `name` data property of a function, or the empty string
fn own_name(func: &JsObjectRef) -> JsString {
    let key = PropertyKey::from("name");
    match func.borrow().get_own_property(&key).map(|p| p.slot) {
        Some(PropertySlot::Data {
            value: JsValue::String(s),
            ..
        }) => s,
        _ => JsString::from(""),
    }
}

fn function_display_name(func: &JsObjectRef) -> String {
    let name = own_name(func);
    if name.as_str().is_empty() {
        "anonymous".to_string()
    } else {
        name.to_string()
    }
}
