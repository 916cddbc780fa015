//! Expression evaluation
//!
//! `evaluate` reduces an expression to a value; a throw comes back as the
//! `Err` arm. Operands are evaluated left to right, and references are
//! resolved before the right-hand side of an assignment is evaluated.

use std::rc::Rc;

use num_bigint::BigInt;

use super::pattern::BindingMode;
use super::{ExecutionContext, Interpreter, Numeric, Reference};
use crate::ast::{
    Argument, ArrayElement, ArrayExpression, AssignmentExpression, AssignmentOp,
    AssignmentTarget, CallExpression, Expression, LiteralValue, LogicalOp, MemberExpression,
    MemberProperty, MethodKind, ObjectExpression, ObjectMember, PropertyName, TemplateLiteral,
    UnaryExpression, UnaryOp, UpdateExpression, UpdateOp,
};
use crate::error::JsError;
use crate::value::{
    CheapClone, ExoticObject, JsObjectRef, JsString, JsValue, Property, PropertyKey,
};

impl Interpreter {
    /// Evaluate an expression to a value
    pub fn evaluate(&mut self, expr: &Expression, ctx: &ExecutionContext) -> Result<JsValue, JsError> {
        crate::stack::ensure_sufficient_stack(|| self.evaluate_inner(expr, ctx))
    }

    fn evaluate_inner(&mut self, expr: &Expression, ctx: &ExecutionContext) -> Result<JsValue, JsError> {
        match expr {
            Expression::Literal(lit) => Ok(match &lit.value {
                LiteralValue::Null => JsValue::Null,
                LiteralValue::Boolean(b) => JsValue::Boolean(*b),
                LiteralValue::Number(n) => JsValue::Number(*n),
                LiteralValue::String(s) => JsValue::String(s.cheap_clone()),
                LiteralValue::BigInt(digits) => {
                    let value = BigInt::parse_bytes(digits.as_str().as_bytes(), 10)
                        .ok_or_else(|| JsError::syntax_error_at("Invalid BigInt literal", lit.span))?;
                    JsValue::from(value)
                }
            }),

            Expression::Array(array) => self.evaluate_array_literal(array, ctx),
            Expression::Object(object) => self.evaluate_object_literal(object, ctx),
            Expression::Function(node) => self.instantiate_function_expression(node, ctx, None),
            Expression::ArrowFunction(node) => {
                let empty = self.intern("");
                Ok(JsValue::Object(self.create_function_object(
                    node,
                    ctx.env,
                    ctx.private_env.clone(),
                    None,
                    empty,
                )))
            }
            Expression::Class(node) => self.evaluate_class(node, ctx, None),
            Expression::Template(template) => self.evaluate_template(template, ctx),
            Expression::TaggedTemplate(tagged) => {
                let (func, this) = self.evaluate_callee(&tagged.tag, ctx)?;
                if !func.is_callable() {
                    return Err(JsError::type_error(format!(
                        "{} is not a function",
                        callee_text(&tagged.tag)
                    )));
                }
                let template = self.get_template_object(&tagged.quasi);
                let mut args = vec![JsValue::Object(template)];
                for e in &tagged.quasi.expressions {
                    args.push(self.evaluate(e, ctx)?);
                }
                self.call_function(&func, this, &args)
            }

            Expression::Identifier(id) => {
                let reference = self.resolve_binding(&id.name, ctx)?;
                self.get_value(&reference)
            }
            Expression::This(_) => self.envs.this_value(ctx.env),
            Expression::Super(span) => Err(JsError::syntax_error_at("'super' keyword unexpected here", *span)),
            Expression::NewTarget(_) => Ok(self
                .envs
                .function_scope(ctx.env)?
                .and_then(|scope| scope.new_target.clone())
                .map(JsValue::Object)
                .unwrap_or_default()),

            Expression::Unary(unary) => self.evaluate_unary(unary, ctx),
            Expression::Binary(binary) => {
                let left = self.evaluate(&binary.left, ctx)?;
                let right = self.evaluate(&binary.right, ctx)?;
                self.apply_binary_op(binary.operator, &left, &right)
            }
            Expression::Logical(logical) => {
                let left = self.evaluate(&logical.left, ctx)?;
                let short_circuit = match logical.operator {
                    LogicalOp::And => !left.to_boolean(),
                    LogicalOp::Or => left.to_boolean(),
                    LogicalOp::NullishCoalescing => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(&logical.right, ctx)
                }
            }
            Expression::Conditional(cond) => {
                if self.evaluate(&cond.test, ctx)?.to_boolean() {
                    self.evaluate(&cond.consequent, ctx)
                } else {
                    self.evaluate(&cond.alternate, ctx)
                }
            }
            Expression::Assignment(assign) => self.evaluate_assignment(assign, ctx),
            Expression::Update(update) => self.evaluate_update(update, ctx),
            Expression::Sequence(seq) => {
                let mut last = JsValue::Undefined;
                for e in &seq.expressions {
                    last = self.evaluate(e, ctx)?;
                }
                Ok(last)
            }
            Expression::PrivateIn(private_in) => {
                let name = self.resolve_private_name(&private_in.name, ctx)?;
                let right = self.evaluate(&private_in.right, ctx)?;
                let JsValue::Object(obj) = &right else {
                    return Err(JsError::type_error(format!(
                        "Cannot use 'in' operator to search for '#{}' in {}",
                        private_in.name,
                        right.describe()
                    )));
                };
                Ok(JsValue::Boolean(obj.borrow().private_elements.contains_key(&name)))
            }

            Expression::Member(member) => {
                let reference = self.member_reference(member, ctx)?;
                self.get_value(&reference)
            }
            Expression::OptionalChain(chain) => Ok(self
                .evaluate_chain_link(&chain.base, ctx)?
                .map(|(value, _)| value)
                .unwrap_or_default()),
            Expression::Call(call) => self.evaluate_call(call, ctx),
            Expression::New(new) => {
                let ctor = self.evaluate(&new.callee, ctx)?;
                if !ctor.is_constructor() {
                    return Err(JsError::type_error(format!(
                        "{} is not a constructor",
                        callee_text(&new.callee)
                    )));
                }
                let args = self.evaluate_arguments(&new.arguments, ctx)?;
                self.construct(&ctor, &args, None)
            }

            Expression::Yield(_) => Err(JsError::type_error(
                "yield cannot be evaluated without a generator driver",
            )),
            Expression::Await(await_expr) => {
                let value = self.evaluate(&await_expr.argument, ctx)?;
                self.await_value(value)
            }

            Expression::Parenthesized(inner, _) => self.evaluate(inner, ctx),
        }
    }

    /// NamedEvaluation: anonymous functions and classes take `name`
    pub(crate) fn evaluate_named(
        &mut self,
        expr: &Expression,
        name: &JsString,
        ctx: &ExecutionContext,
    ) -> Result<JsValue, JsError> {
        match expr {
            Expression::Function(node) if node.name.is_none() => {
                self.instantiate_function_expression(node, ctx, Some(name.cheap_clone()))
            }
            Expression::ArrowFunction(node) => Ok(JsValue::Object(self.create_function_object(
                node,
                ctx.env,
                ctx.private_env.clone(),
                None,
                name.cheap_clone(),
            ))),
            Expression::Class(node) if node.name.is_none() => {
                self.evaluate_class(node, ctx, Some(name.cheap_clone()))
            }
            Expression::Parenthesized(inner, _) => self.evaluate_named(inner, name, ctx),
            _ => self.evaluate(expr, ctx),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // References
    // ═══════════════════════════════════════════════════════════════════════

    /// Evaluate an lvalue expression to a reference
    pub(crate) fn evaluate_reference(&mut self, expr: &Expression, ctx: &ExecutionContext) -> Result<Reference, JsError> {
        match expr {
            Expression::Identifier(id) => self.resolve_binding(&id.name, ctx),
            Expression::Member(member) => self.member_reference(member, ctx),
            Expression::Parenthesized(inner, _) => self.evaluate_reference(inner, ctx),
            other => Err(JsError::syntax_error_at(
                "Invalid left-hand side in assignment",
                other.span(),
            )),
        }
    }

    /// Reference for `obj.prop`, `obj[expr]`, `obj.#x` or `super.prop`
    fn member_reference(&mut self, member: &MemberExpression, ctx: &ExecutionContext) -> Result<Reference, JsError> {
        if let Expression::Super(_) = &*member.object {
            let this = self.envs.this_value(ctx.env)?;
            let key = match &member.property {
                MemberProperty::Identifier(name) => PropertyKey::from_js_string(name.cheap_clone()),
                MemberProperty::Expression(expr) => {
                    let value = self.evaluate(expr, ctx)?;
                    self.to_property_key(&value)?
                }
                MemberProperty::PrivateName(_) => {
                    return Err(JsError::syntax_error_at("Unexpected private field", member.span));
                }
            };
            let home = self
                .envs
                .function_scope(ctx.env)?
                .and_then(|scope| scope.home_object.clone());
            let base = home
                .and_then(|h| h.borrow().prototype.clone())
                .map(JsValue::Object)
                .unwrap_or(JsValue::Null);
            return Ok(Reference::Property {
                base,
                key,
                this,
                strict: ctx.strict,
            });
        }

        let base = self.evaluate(&member.object, ctx)?;
        self.member_reference_on(base, &member.property, ctx)
    }

    /// Property reference on an already evaluated base. A nullish base is a
    /// TypeError before any lookup happens.
    fn member_reference_on(
        &mut self,
        base: JsValue,
        property: &MemberProperty,
        ctx: &ExecutionContext,
    ) -> Result<Reference, JsError> {
        let key_value = match property {
            MemberProperty::Identifier(name) => JsValue::String(name.cheap_clone()),
            MemberProperty::Expression(expr) => self.evaluate(expr, ctx)?,
            MemberProperty::PrivateName(name) => {
                let name = self.resolve_private_name(name, ctx)?;
                return Ok(Reference::Private { base, name });
            }
        };
        if base.is_nullish() {
            return Err(JsError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                base.describe(),
                key_value.to_primitive_string()
            )));
        }
        let key = match key_value {
            JsValue::String(s) if matches!(property, MemberProperty::Identifier(_)) => {
                PropertyKey::from_js_string(s)
            }
            other => self.to_property_key(&other)?,
        };
        Ok(Reference::Property {
            this: base.cheap_clone(),
            base,
            key,
            strict: ctx.strict,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Calls
    // ═══════════════════════════════════════════════════════════════════════

    /// Callee value and the `this` it is called with
    fn evaluate_callee(&mut self, callee: &Expression, ctx: &ExecutionContext) -> Result<(JsValue, JsValue), JsError> {
        match callee {
            Expression::Member(member) => {
                let reference = self.member_reference(member, ctx)?;
                let func = self.get_value(&reference)?;
                Ok((func, reference.this_value()))
            }
            Expression::Parenthesized(inner, _)
                if matches!(
                    &**inner,
                    Expression::Member(_) | Expression::OptionalChain(_) | Expression::Parenthesized(..)
                ) =>
            {
                self.evaluate_callee(inner, ctx)
            }
            Expression::OptionalChain(chain) => Ok(self
                .evaluate_chain_link(&chain.base, ctx)?
                .unwrap_or((JsValue::Undefined, JsValue::Undefined))),
            other => Ok((self.evaluate(other, ctx)?, JsValue::Undefined)),
        }
    }

    fn evaluate_call(&mut self, call: &CallExpression, ctx: &ExecutionContext) -> Result<JsValue, JsError> {
        if let Expression::Super(_) = &*call.callee {
            return self.evaluate_super_call(call, ctx);
        }
        let (func, this) = self.evaluate_callee(&call.callee, ctx)?;
        if !func.is_callable() {
            return Err(JsError::type_error(format!(
                "{} is not a function",
                callee_text(&call.callee)
            )));
        }
        let args = self.evaluate_arguments(&call.arguments, ctx)?;
        self.call_function(&func, this, &args)
    }

    /// ArgumentListEvaluation: left to right, spreads drained through the
    /// iterator protocol
    pub(crate) fn evaluate_arguments(&mut self, arguments: &[Argument], ctx: &ExecutionContext) -> Result<Vec<JsValue>, JsError> {
        let mut values = Vec::with_capacity(arguments.len());
        for arg in arguments {
            match arg {
                Argument::Expression(expr) => values.push(self.evaluate(expr, ctx)?),
                Argument::Spread(expr) => {
                    let iterable = self.evaluate(expr, ctx)?;
                    values.extend(self.iterate_to_vec(&iterable)?);
                }
            }
        }
        Ok(values)
    }

    /// `super(...args)`: construct the parent with the active `new.target`,
    /// bind `this`, then run the field initializers
    fn evaluate_super_call(&mut self, call: &CallExpression, ctx: &ExecutionContext) -> Result<JsValue, JsError> {
        let scope = self
            .envs
            .function_scope(ctx.env)?
            .cloned()
            .ok_or_else(|| JsError::syntax_error_at("'super' keyword unexpected here", call.span))?;
        let active = scope.function.cheap_clone();
        let super_ctor = active.borrow().prototype.clone();
        let args = self.evaluate_arguments(&call.arguments, ctx)?;

        let super_ctor = match super_ctor {
            Some(ctor) if ctor.borrow().is_constructor() => ctor,
            other => {
                return Err(JsError::type_error(format!(
                    "Super constructor {} of anonymous class is not a constructor",
                    other.map(JsValue::Object).unwrap_or(JsValue::Null).describe()
                )));
            }
        };
        let new_target = scope
            .new_target
            .ok_or_else(|| JsError::syntax_error_at("'super' keyword unexpected here", call.span))?;

        let result = self.construct(&JsValue::Object(super_ctor), &args, Some(&new_target))?;
        self.envs.bind_this_value(ctx.env, result.cheap_clone())?;
        if let JsValue::Object(this_obj) = &result {
            self.initialize_instance_elements(this_obj, &active)?;
        }
        Ok(result)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Optional chains
    // ═══════════════════════════════════════════════════════════════════════

    /// One link of an optional chain: `None` once a `?.` saw a nullish base,
    /// which skips every remaining link
    fn evaluate_chain_link(
        &mut self,
        expr: &Expression,
        ctx: &ExecutionContext,
    ) -> Result<Option<(JsValue, JsValue)>, JsError> {
        match expr {
            Expression::Member(member) if !matches!(&*member.object, Expression::Super(_)) => {
                let Some((base, _)) = self.evaluate_chain_link(&member.object, ctx)? else {
                    return Ok(None);
                };
                if member.optional && base.is_nullish() {
                    return Ok(None);
                }
                let reference = self.member_reference_on(base, &member.property, ctx)?;
                let value = self.get_value(&reference)?;
                Ok(Some((value, reference.this_value())))
            }
            Expression::Call(call) if !matches!(&*call.callee, Expression::Super(_)) => {
                let Some((func, this)) = self.evaluate_chain_link(&call.callee, ctx)? else {
                    return Ok(None);
                };
                if call.optional && func.is_nullish() {
                    return Ok(None);
                }
                if !func.is_callable() {
                    return Err(JsError::type_error(format!(
                        "{} is not a function",
                        callee_text(&call.callee)
                    )));
                }
                let args = self.evaluate_arguments(&call.arguments, ctx)?;
                let value = self.call_function(&func, this, &args)?;
                Ok(Some((value, JsValue::Undefined)))
            }
            other => {
                let (value, this) = self.evaluate_callee(other, ctx)?;
                Ok(Some((value, this)))
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Operators
    // ═══════════════════════════════════════════════════════════════════════

    fn evaluate_unary(&mut self, unary: &UnaryExpression, ctx: &ExecutionContext) -> Result<JsValue, JsError> {
        match unary.operator {
            UnaryOp::Typeof => {
                if let Expression::Identifier(id) = &*unary.argument {
                    let reference = self.resolve_binding(&id.name, ctx)?;
                    if reference.is_unresolvable() {
                        return Ok(JsValue::from("undefined"));
                    }
                    let value = self.get_value(&reference)?;
                    return Ok(JsValue::from(value.type_of()));
                }
                let value = self.evaluate(&unary.argument, ctx)?;
                Ok(JsValue::from(value.type_of()))
            }
            UnaryOp::Delete => self.evaluate_delete(&unary.argument, ctx).map(JsValue::Boolean),
            UnaryOp::Void => {
                self.evaluate(&unary.argument, ctx)?;
                Ok(JsValue::Undefined)
            }
            UnaryOp::Not => Ok(JsValue::Boolean(!self.evaluate(&unary.argument, ctx)?.to_boolean())),
            UnaryOp::Plus => {
                let value = self.evaluate(&unary.argument, ctx)?;
                Ok(JsValue::Number(self.to_number(&value)?))
            }
            UnaryOp::Minus => {
                let value = self.evaluate(&unary.argument, ctx)?;
                Ok(match self.to_numeric(&value)? {
                    Numeric::Number(n) => JsValue::Number(-n),
                    Numeric::BigInt(b) => JsValue::from(-b.value()),
                })
            }
            UnaryOp::BitNot => {
                let value = self.evaluate(&unary.argument, ctx)?;
                Ok(match self.to_numeric(&value)? {
                    Numeric::Number(n) => JsValue::Number(f64::from(!super::operations::f64_to_int32(n))),
                    Numeric::BigInt(b) => JsValue::from(-b.value() - BigInt::from(1)),
                })
            }
        }
    }

    fn evaluate_delete(&mut self, argument: &Expression, ctx: &ExecutionContext) -> Result<bool, JsError> {
        match argument {
            Expression::Identifier(_) => {
                let reference = self.evaluate_reference(argument, ctx)?;
                self.delete_reference(&reference)
            }
            Expression::Member(member) => {
                if let Expression::Super(_) = &*member.object {
                    self.envs.this_value(ctx.env)?;
                    if let MemberProperty::Expression(expr) = &member.property {
                        self.evaluate(expr, ctx)?;
                    }
                    return Err(JsError::reference_error("Unsupported reference to 'super'"));
                }
                let reference = self.member_reference(member, ctx)?;
                self.delete_reference(&reference)
            }
            Expression::OptionalChain(chain) => match &*chain.base {
                Expression::Member(member) => {
                    let Some((base, _)) = self.evaluate_chain_link(&member.object, ctx)? else {
                        return Ok(true);
                    };
                    if member.optional && base.is_nullish() {
                        return Ok(true);
                    }
                    let reference = self.member_reference_on(base, &member.property, ctx)?;
                    self.delete_reference(&reference)
                }
                other => {
                    self.evaluate_chain_link(other, ctx)?;
                    Ok(true)
                }
            },
            Expression::Parenthesized(inner, _) => self.evaluate_delete(inner, ctx),
            other => {
                self.evaluate(other, ctx)?;
                Ok(true)
            }
        }
    }

    fn evaluate_assignment(&mut self, assign: &AssignmentExpression, ctx: &ExecutionContext) -> Result<JsValue, JsError> {
        let target = match &assign.target {
            AssignmentTarget::Pattern(pattern) => {
                let value = self.evaluate(&assign.value, ctx)?;
                self.bind_pattern(pattern, value.cheap_clone(), BindingMode::Assign, ctx)?;
                return Ok(value);
            }
            AssignmentTarget::Simple(target) => target,
        };

        let reference = self.evaluate_reference(target, ctx)?;
        // Only a bare identifier target names an anonymous function
        let name = match &**target {
            Expression::Identifier(id) => Some(&id.name),
            _ => None,
        };

        let value = match assign.operator {
            AssignmentOp::Assign => self.evaluate_rhs(&assign.value, name, ctx)?,
            AssignmentOp::AndAssign | AssignmentOp::OrAssign | AssignmentOp::NullishAssign => {
                let current = self.get_value(&reference)?;
                let keep = match assign.operator {
                    AssignmentOp::AndAssign => !current.to_boolean(),
                    AssignmentOp::OrAssign => current.to_boolean(),
                    _ => !current.is_nullish(),
                };
                if keep {
                    return Ok(current);
                }
                self.evaluate_rhs(&assign.value, name, ctx)?
            }
            compound => {
                let current = self.get_value(&reference)?;
                let right = self.evaluate(&assign.value, ctx)?;
                let op = compound
                    .binary_op()
                    .ok_or_else(|| JsError::internal_error("compound assignment without operator"))?;
                self.apply_binary_op(op, &current, &right)?
            }
        };
        self.put_value(&reference, value.cheap_clone())?;
        Ok(value)
    }

    fn evaluate_rhs(
        &mut self,
        value: &Expression,
        name: Option<&JsString>,
        ctx: &ExecutionContext,
    ) -> Result<JsValue, JsError> {
        match name {
            Some(name) => self.evaluate_named(value, name, ctx),
            None => self.evaluate(value, ctx),
        }
    }

    fn evaluate_update(&mut self, update: &UpdateExpression, ctx: &ExecutionContext) -> Result<JsValue, JsError> {
        let reference = self.evaluate_reference(&update.argument, ctx)?;
        let old = self.get_value(&reference)?;
        let old = self.to_numeric(&old)?;
        let delta = match update.operator {
            UpdateOp::Increment => 1,
            UpdateOp::Decrement => -1,
        };
        let new = match &old {
            Numeric::Number(n) => JsValue::Number(n + f64::from(delta)),
            Numeric::BigInt(b) => JsValue::from(b.value() + BigInt::from(delta)),
        };
        self.put_value(&reference, new.cheap_clone())?;
        Ok(if update.prefix { new } else { old.into_value() })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Literals
    // ═══════════════════════════════════════════════════════════════════════

    fn evaluate_array_literal(&mut self, array: &ArrayExpression, ctx: &ExecutionContext) -> Result<JsValue, JsError> {
        let arr = self.create_array(Vec::new());
        let mut index: u32 = 0;
        for element in &array.elements {
            match element {
                None => index = index.saturating_add(1),
                Some(ArrayElement::Expression(expr)) => {
                    let value = self.evaluate(expr, ctx)?;
                    arr.borrow_mut()
                        .define_property(PropertyKey::Index(index), Property::data(value));
                    index = index.saturating_add(1);
                }
                Some(ArrayElement::Spread(expr)) => {
                    let iterable = self.evaluate(expr, ctx)?;
                    for value in self.iterate_to_vec(&iterable)? {
                        arr.borrow_mut()
                            .define_property(PropertyKey::Index(index), Property::data(value));
                        index = index.saturating_add(1);
                    }
                }
            }
        }
        if let ExoticObject::Array { length, .. } = &mut arr.borrow_mut().exotic {
            *length = index;
        }
        Ok(JsValue::Object(arr))
    }

    fn evaluate_object_literal(&mut self, object: &ObjectExpression, ctx: &ExecutionContext) -> Result<JsValue, JsError> {
        let obj = self.create_object();
        for member in &object.properties {
            match member {
                ObjectMember::Property {
                    key,
                    value,
                    shorthand,
                    ..
                } => {
                    if !*shorthand && is_proto_key(key) {
                        let proto = self.evaluate(value, ctx)?;
                        match proto {
                            JsValue::Object(p) => {
                                self.set_prototype_of(&obj, Some(p));
                            }
                            JsValue::Null => {
                                self.set_prototype_of(&obj, None);
                            }
                            _ => {}
                        }
                        continue;
                    }
                    let key = self.evaluate_property_name(key, ctx)?;
                    let value = if value.is_anonymous_function_definition() {
                        let name = key.to_function_name();
                        self.evaluate_named(value, &name, ctx)?
                    } else {
                        self.evaluate(value, ctx)?
                    };
                    self.create_data_property_or_throw(&obj, key, value)?;
                }
                ObjectMember::Method {
                    key, kind, function, ..
                } => {
                    let key = self.evaluate_property_name(key, ctx)?;
                    let name = self.method_name(&key.to_function_name(), *kind);
                    let closure = self.create_function_object(
                        function,
                        ctx.env,
                        ctx.private_env.clone(),
                        Some(obj.cheap_clone()),
                        name,
                    );
                    self.define_method_property(&obj, key, *kind, closure, true)?;
                }
                ObjectMember::Spread(expr, _) => {
                    let source = self.evaluate(expr, ctx)?;
                    self.copy_data_properties(&obj, &source, &[])?;
                }
            }
        }
        Ok(JsValue::Object(obj))
    }

    /// `name` of a method or accessor (`get x`, `set x`)
    pub(crate) fn method_name(&mut self, base: &JsString, kind: MethodKind) -> JsString {
        match kind {
            MethodKind::Method => base.cheap_clone(),
            MethodKind::Get => self.intern(&format!("get {}", base)),
            MethodKind::Set => self.intern(&format!("set {}", base)),
        }
    }

    /// Install a method, getter or setter. Accessor halves merge with an
    /// existing accessor under the same key.
    pub(crate) fn define_method_property(
        &mut self,
        target: &JsObjectRef,
        key: PropertyKey,
        kind: MethodKind,
        closure: JsObjectRef,
        enumerable: bool,
    ) -> Result<(), JsError> {
        let desc = match kind {
            MethodKind::Method => super::PropertyDescriptor::data(JsValue::Object(closure), true, enumerable, true),
            MethodKind::Get => super::PropertyDescriptor {
                get: Some(Some(closure)),
                enumerable: Some(enumerable),
                configurable: Some(true),
                ..Default::default()
            },
            MethodKind::Set => super::PropertyDescriptor {
                set: Some(Some(closure)),
                enumerable: Some(enumerable),
                configurable: Some(true),
                ..Default::default()
            },
        };
        self.define_property_or_throw(target, key, &desc)
    }

    fn evaluate_template(&mut self, template: &TemplateLiteral, ctx: &ExecutionContext) -> Result<JsValue, JsError> {
        let mut out = String::new();
        let mut expressions = template.expressions.iter();
        for quasi in &template.quasis {
            if let Some(cooked) = &quasi.cooked {
                out.push_str(cooked.as_str());
            }
            if let Some(expr) = expressions.next() {
                let value = self.evaluate(expr, ctx)?;
                let s = self.to_string(&value)?;
                out.push_str(s.as_str());
            }
        }
        Ok(JsValue::from(out))
    }

    /// GetTemplateObject: one frozen strings array per call site, with a
    /// frozen `raw` array alongside
    fn get_template_object(&mut self, site: &Rc<TemplateLiteral>) -> JsObjectRef {
        let site_key = Rc::as_ptr(site) as usize;
        if let Some((_, template)) = self.template_cache.get(&site_key) {
            return template.cheap_clone();
        }

        let cooked: Vec<JsValue> = site
            .quasis
            .iter()
            .map(|q| q.cooked.clone().map(JsValue::String).unwrap_or_default())
            .collect();
        let raw: Vec<JsValue> = site
            .quasis
            .iter()
            .map(|q| JsValue::String(q.raw.cheap_clone()))
            .collect();
        let template = self.create_array(cooked);
        let raw = self.create_array(raw);
        self.freeze_object(&raw);
        let raw_key = self.key("raw");
        template.borrow_mut().define_property(
            raw_key,
            Property::with_attributes(JsValue::Object(raw), false, false, false),
        );
        self.freeze_object(&template);

        self.template_cache
            .insert(site_key, (Rc::clone(site), template.cheap_clone()));
        template
    }
}

/// `__proto__: value` in an object literal (not computed, not shorthand)
fn is_proto_key(key: &PropertyName) -> bool {
    matches!(key, PropertyName::Identifier(s) | PropertyName::String(s) if s.as_str() == "__proto__")
}

/// Source-like rendering of a callee for error messages
fn callee_text(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(id) => id.name.to_string(),
        Expression::This(_) => "this".to_string(),
        Expression::Super(_) => "super".to_string(),
        Expression::Member(member) => {
            let object = callee_text(&member.object);
            match &member.property {
                MemberProperty::Identifier(name) => format!("{}.{}", object, name),
                MemberProperty::PrivateName(name) => format!("{}.#{}", object, name),
                MemberProperty::Expression(_) => format!("{}[...]", object),
            }
        }
        Expression::Call(call) => format!("{}(...)", callee_text(&call.callee)),
        Expression::OptionalChain(chain) => callee_text(&chain.base),
        Expression::Parenthesized(inner, _) => callee_text(inner),
        Expression::Literal(lit) => match &lit.value {
            LiteralValue::String(s) => format!("\"{}\"", s),
            LiteralValue::Number(n) => crate::value::number_to_string(*n),
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::Null => "null".to_string(),
            LiteralValue::BigInt(digits) => format!("{}n", digits),
        },
        _ => "expression".to_string(),
    }
}
