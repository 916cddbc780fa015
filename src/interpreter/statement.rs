//! Statement execution and completion propagation
//!
//! Every statement produces a [`Completion`]. Loops absorb `continue`
//! completions aimed at them and turn a matching `break` into a normal
//! completion; everything else travels outward unchanged. Completion values
//! follow UpdateEmpty, which is what makes `eval`-style results of blocks,
//! loops and `try` statements come out right.

use super::pattern::BindingMode;
use super::{Completion, ExecutionContext, Interpreter, IteratorHint};
use crate::ast::{
    BlockStatement, CatchClause, ForInOfLeft, ForInStatement, ForInit, ForOfStatement,
    ForStatement, Pattern, Statement, SwitchStatement, TryStatement, VariableDeclaration,
    VariableKind,
};
use crate::environment::EnvId;
use crate::error::JsError;
use crate::value::{CheapClone, JsString, JsValue};

/// LoopContinues: whether a body completion lets the loop go on
fn loop_continues(completion: &Completion, labels: &[JsString]) -> bool {
    match completion {
        Completion::Normal(_) | Completion::Continue(None, _) => true,
        Completion::Continue(Some(label), _) => labels.contains(label),
        _ => false,
    }
}

/// Completion of a loop that stopped early. An unlabelled `break` ends here;
/// labelled ones are absorbed by their labelled statement.
fn exit_loop(completion: Completion, value: JsValue) -> Completion {
    match completion.update_empty(Some(value)) {
        Completion::Break(None, value) => Completion::Normal(value),
        other => other,
    }
}

fn bound_names(pattern: &Pattern) -> Vec<JsString> {
    let mut names = Vec::new();
    pattern.bound_names(&mut names);
    names
}

impl Interpreter {
    /// Evaluate a statement list, threading the completion value
    pub(crate) fn execute_statements(
        &mut self,
        statements: &[Statement],
        ctx: &ExecutionContext,
    ) -> Result<Completion, JsError> {
        let mut last: Option<JsValue> = None;
        for stmt in statements {
            match self.execute_statement(stmt, ctx)? {
                Completion::Normal(value) => {
                    if value.is_some() {
                        last = value;
                    }
                }
                abrupt => return Ok(abrupt.update_empty(last)),
            }
        }
        Ok(Completion::Normal(last))
    }

    pub(crate) fn execute_statement(&mut self, stmt: &Statement, ctx: &ExecutionContext) -> Result<Completion, JsError> {
        self.execute_labelled(stmt, ctx, &[])
    }

    /// LabelledEvaluation: `labels` is the label set of the enclosing
    /// labelled statements, used by loops to match `continue`
    fn execute_labelled(
        &mut self,
        stmt: &Statement,
        ctx: &ExecutionContext,
        labels: &[JsString],
    ) -> Result<Completion, JsError> {
        crate::stack::ensure_sufficient_stack(|| self.execute_statement_inner(stmt, ctx, labels))
    }

    fn execute_statement_inner(
        &mut self,
        stmt: &Statement,
        ctx: &ExecutionContext,
        labels: &[JsString],
    ) -> Result<Completion, JsError> {
        match stmt {
            Statement::Expression(expr) => {
                let value = self.evaluate(&expr.expression, ctx)?;
                Ok(Completion::Normal(Some(value)))
            }
            Statement::VariableDeclaration(decl) => {
                self.execute_variable_declaration(decl, ctx)?;
                Ok(Completion::Normal(None))
            }
            Statement::FunctionDeclaration(func) => {
                self.hoist_block_function(func, ctx)?;
                Ok(Completion::Normal(None))
            }
            Statement::ClassDeclaration(class) => {
                let value = self.evaluate_class(class, ctx, None)?;
                if let Some(id) = &class.name {
                    self.envs.initialize_binding(ctx.env, id.name.as_str(), value)?;
                }
                Ok(Completion::Normal(None))
            }

            Statement::Block(block) => self.execute_block(block, ctx),
            Statement::If(if_stmt) => {
                let completion = if self.evaluate(&if_stmt.test, ctx)?.to_boolean() {
                    self.execute_statement(&if_stmt.consequent, ctx)?
                } else if let Some(alternate) = &if_stmt.alternate {
                    self.execute_statement(alternate, ctx)?
                } else {
                    return Ok(Completion::Normal(Some(JsValue::Undefined)));
                };
                Ok(completion.update_empty(Some(JsValue::Undefined)))
            }
            Statement::Switch(switch_stmt) => self.execute_switch(switch_stmt, ctx),
            Statement::Try(try_stmt) => self.execute_try(try_stmt, ctx),

            Statement::While(while_stmt) => {
                let mut value = JsValue::Undefined;
                loop {
                    if !self.evaluate(&while_stmt.test, ctx)?.to_boolean() {
                        return Ok(Completion::Normal(Some(value)));
                    }
                    let completion = self.execute_statement(&while_stmt.body, ctx)?;
                    if !loop_continues(&completion, labels) {
                        return Ok(exit_loop(completion, value));
                    }
                    if let Some(v) = completion.value() {
                        value = v.cheap_clone();
                    }
                }
            }
            Statement::DoWhile(do_while) => {
                let mut value = JsValue::Undefined;
                loop {
                    let completion = self.execute_statement(&do_while.body, ctx)?;
                    if !loop_continues(&completion, labels) {
                        return Ok(exit_loop(completion, value));
                    }
                    if let Some(v) = completion.value() {
                        value = v.cheap_clone();
                    }
                    if !self.evaluate(&do_while.test, ctx)?.to_boolean() {
                        return Ok(Completion::Normal(Some(value)));
                    }
                }
            }
            Statement::For(for_stmt) => self.execute_for(for_stmt, ctx, labels),
            Statement::ForIn(for_in) => self.execute_for_in(for_in, ctx, labels),
            Statement::ForOf(for_of) => self.execute_for_of(for_of, ctx, labels),

            Statement::Return(ret) => {
                let value = match &ret.argument {
                    Some(expr) => self.evaluate(expr, ctx)?,
                    None => JsValue::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Statement::Break(brk) => Ok(Completion::Break(brk.label.clone(), None)),
            Statement::Continue(cont) => Ok(Completion::Continue(cont.label.clone(), None)),
            Statement::Throw(throw) => {
                let value = self.evaluate(&throw.argument, ctx)?;
                Err(JsError::thrown(value))
            }

            Statement::Labeled(labeled) => {
                let mut inner_labels = labels.to_vec();
                inner_labels.push(labeled.label.cheap_clone());
                match self.execute_labelled(&labeled.body, ctx, &inner_labels)? {
                    Completion::Break(Some(target), value) if target == labeled.label => {
                        Ok(Completion::Normal(value))
                    }
                    other => Ok(other),
                }
            }
            Statement::Empty(_) | Statement::Debugger(_) => Ok(Completion::Normal(None)),
        }
    }

    fn execute_block(&mut self, block: &BlockStatement, ctx: &ExecutionContext) -> Result<Completion, JsError> {
        let block_ctx = self.instantiate_block(&block.scope, ctx)?;
        self.execute_statements(&block.body, &block_ctx)
    }

    /// `var` declarators assign through a reference resolved before the
    /// initializer runs; `let`/`const` initialize their binding in place
    fn execute_variable_declaration(
        &mut self,
        decl: &VariableDeclaration,
        ctx: &ExecutionContext,
    ) -> Result<(), JsError> {
        for declarator in &decl.declarations {
            if decl.kind == VariableKind::Var {
                let Some(init) = &declarator.init else {
                    continue;
                };
                match &declarator.id {
                    Pattern::Identifier(id) => {
                        let reference = self.resolve_binding(&id.name, ctx)?;
                        let value = self.evaluate_named(init, &id.name, ctx)?;
                        self.put_value(&reference, value)?;
                    }
                    pattern => {
                        let value = self.evaluate(init, ctx)?;
                        self.bind_pattern(pattern, value, BindingMode::Assign, ctx)?;
                    }
                }
                continue;
            }

            let value = match (&declarator.init, &declarator.id) {
                (Some(init), Pattern::Identifier(id)) => self.evaluate_named(init, &id.name, ctx)?,
                (Some(init), _) => self.evaluate(init, ctx)?,
                (None, _) => JsValue::Undefined,
            };
            self.bind_pattern(&declarator.id, value, BindingMode::Initialize(ctx.env), ctx)?;
        }
        Ok(())
    }

    /// Uninitialized bindings for `names` in `env`
    fn create_lexical_bindings(&mut self, env: EnvId, names: &[JsString], is_const: bool) -> Result<(), JsError> {
        for name in names {
            if is_const {
                self.envs.create_immutable_binding(env, name.cheap_clone())?;
            } else {
                self.envs.create_mutable_binding(env, name.cheap_clone())?;
            }
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // for
    // ═══════════════════════════════════════════════════════════════════════

    fn execute_for(
        &mut self,
        for_stmt: &ForStatement,
        ctx: &ExecutionContext,
        labels: &[JsString],
    ) -> Result<Completion, JsError> {
        let mut per_iteration: Vec<JsString> = Vec::new();
        let mut loop_ctx = match &for_stmt.init {
            Some(ForInit::Variable(decl)) if decl.kind.is_lexical() => {
                let env = self.envs.alloc_declarative(ctx.env);
                let names: Vec<JsString> = decl
                    .declarations
                    .iter()
                    .flat_map(|d| bound_names(&d.id))
                    .collect();
                self.create_lexical_bindings(env, &names, decl.kind == VariableKind::Const)?;
                let loop_ctx = ctx.with_env(env);
                self.execute_variable_declaration(decl, &loop_ctx)?;
                if decl.kind == VariableKind::Let {
                    per_iteration = names;
                }
                loop_ctx
            }
            Some(ForInit::Variable(decl)) => {
                self.execute_variable_declaration(decl, ctx)?;
                ctx.clone()
            }
            Some(ForInit::Expression(expr)) => {
                self.evaluate(expr, ctx)?;
                ctx.clone()
            }
            None => ctx.clone(),
        };

        let mut value = JsValue::Undefined;
        loop_ctx = self.create_per_iteration_env(&per_iteration, loop_ctx)?;
        loop {
            if let Some(test) = &for_stmt.test {
                if !self.evaluate(test, &loop_ctx)?.to_boolean() {
                    return Ok(Completion::Normal(Some(value)));
                }
            }
            let completion = self.execute_statement(&for_stmt.body, &loop_ctx)?;
            if !loop_continues(&completion, labels) {
                return Ok(exit_loop(completion, value));
            }
            if let Some(v) = completion.value() {
                value = v.cheap_clone();
            }
            loop_ctx = self.create_per_iteration_env(&per_iteration, loop_ctx)?;
            if let Some(update) = &for_stmt.update {
                self.evaluate(update, &loop_ctx)?;
            }
        }
    }

    /// CreatePerIterationEnvironment: copy the `let` bindings into a fresh
    /// record so closures from one iteration keep that iteration's values
    fn create_per_iteration_env(
        &mut self,
        names: &[JsString],
        ctx: ExecutionContext,
    ) -> Result<ExecutionContext, JsError> {
        if names.is_empty() {
            return Ok(ctx);
        }
        let outer = self
            .envs
            .get(ctx.env)?
            .outer
            .ok_or_else(|| JsError::internal_error("loop environment without outer scope"))?;
        let next = self.envs.alloc_declarative(outer);
        for name in names {
            let value = self.envs.get_binding_value(ctx.env, name.as_str())?;
            self.envs.declare(next, name.cheap_clone(), value, true)?;
        }
        Ok(ctx.with_env(next))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // for-in / for-of
    // ═══════════════════════════════════════════════════════════════════════

    /// ForIn/OfHeadEvaluation: lexically declared loop names are in their
    /// temporal dead zone while the right-hand side runs
    fn evaluate_loop_head(
        &mut self,
        left: &ForInOfLeft,
        right: &crate::ast::Expression,
        ctx: &ExecutionContext,
    ) -> Result<JsValue, JsError> {
        match left {
            ForInOfLeft::Variable(kind, pattern) if kind.is_lexical() => {
                let tdz = self.envs.alloc_declarative(ctx.env);
                self.create_lexical_bindings(tdz, &bound_names(pattern), false)?;
                self.evaluate(right, &ctx.with_env(tdz))
            }
            _ => self.evaluate(right, ctx),
        }
    }

    /// Bind the loop target for one iteration. `let`/`const` get a fresh
    /// environment per iteration; `var` and bare targets assign.
    fn bind_loop_target(
        &mut self,
        left: &ForInOfLeft,
        value: JsValue,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionContext, JsError> {
        match left {
            ForInOfLeft::Variable(kind, pattern) if kind.is_lexical() => {
                let env = self.envs.alloc_declarative(ctx.env);
                self.create_lexical_bindings(env, &bound_names(pattern), *kind == VariableKind::Const)?;
                let iteration_ctx = ctx.with_env(env);
                self.bind_pattern(pattern, value, BindingMode::Initialize(env), &iteration_ctx)?;
                Ok(iteration_ctx)
            }
            ForInOfLeft::Variable(_, pattern) | ForInOfLeft::Pattern(pattern) => {
                self.bind_pattern(pattern, value, BindingMode::Assign, ctx)?;
                Ok(ctx.clone())
            }
        }
    }

    fn execute_for_in(
        &mut self,
        for_in: &ForInStatement,
        ctx: &ExecutionContext,
        labels: &[JsString],
    ) -> Result<Completion, JsError> {
        let subject = self.evaluate_loop_head(&for_in.left, &for_in.right, ctx)?;
        if subject.is_nullish() {
            return Ok(Completion::Normal(Some(JsValue::Undefined)));
        }
        let obj = self.to_object(&subject)?;
        let keys = self.for_in_keys(&obj);

        let mut value = JsValue::Undefined;
        for key in keys {
            // Deleted since the snapshot was taken
            if !self.has_property(&obj, &key) {
                continue;
            }
            let iteration_ctx = self.bind_loop_target(&for_in.left, key.to_value(), ctx)?;
            let completion = self.execute_statement(&for_in.body, &iteration_ctx)?;
            if !loop_continues(&completion, labels) {
                return Ok(exit_loop(completion, value));
            }
            if let Some(v) = completion.value() {
                value = v.cheap_clone();
            }
        }
        Ok(Completion::Normal(Some(value)))
    }

    fn execute_for_of(
        &mut self,
        for_of: &ForOfStatement,
        ctx: &ExecutionContext,
        labels: &[JsString],
    ) -> Result<Completion, JsError> {
        let iterable = self.evaluate_loop_head(&for_of.left, &for_of.right, ctx)?;
        let hint = if for_of.await_ {
            IteratorHint::Async
        } else {
            IteratorHint::Sync
        };
        let mut record = self.get_iterator(&iterable, hint)?;

        let mut value = JsValue::Undefined;
        loop {
            let Some(next) = self.iterator_step_value(&mut record)? else {
                return Ok(Completion::Normal(Some(value)));
            };
            let result = self
                .bind_loop_target(&for_of.left, next, ctx)
                .and_then(|iteration_ctx| self.execute_statement(&for_of.body, &iteration_ctx));
            match result {
                Err(error) => {
                    if error.is_catchable() {
                        self.iterator_close_after_throw(&record);
                    }
                    return Err(error);
                }
                Ok(completion) => {
                    if !loop_continues(&completion, labels) {
                        self.iterator_close(&record)?;
                        return Ok(exit_loop(completion, value));
                    }
                    if let Some(v) = completion.value() {
                        value = v.cheap_clone();
                    }
                }
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // switch / try
    // ═══════════════════════════════════════════════════════════════════════

    fn execute_switch(&mut self, switch_stmt: &SwitchStatement, ctx: &ExecutionContext) -> Result<Completion, JsError> {
        let discriminant = self.evaluate(&switch_stmt.discriminant, ctx)?;
        let block_ctx = self.instantiate_block(&switch_stmt.scope, ctx)?;

        let mut start = None;
        for (i, case) in switch_stmt.cases.iter().enumerate() {
            if let Some(test) = &case.test {
                let candidate = self.evaluate(test, &block_ctx)?;
                if discriminant.strict_equals(&candidate) {
                    start = Some(i);
                    break;
                }
            }
        }
        let Some(start) = start.or_else(|| switch_stmt.cases.iter().position(|c| c.test.is_none())) else {
            return Ok(Completion::Normal(Some(JsValue::Undefined)));
        };

        let mut value = JsValue::Undefined;
        for case in switch_stmt.cases.iter().skip(start) {
            let completion = self.execute_statements(&case.consequent, &block_ctx)?;
            if let Some(v) = completion.value() {
                value = v.cheap_clone();
            }
            if completion.is_abrupt() {
                return Ok(exit_loop(completion, value));
            }
        }
        Ok(Completion::Normal(Some(value)))
    }

    fn execute_try(&mut self, try_stmt: &TryStatement, ctx: &ExecutionContext) -> Result<Completion, JsError> {
        let mut result = self.execute_block(&try_stmt.block, ctx);

        if let Some(handler) = &try_stmt.handler {
            if let Err(error) = result {
                result = if error.is_catchable() {
                    self.execute_catch(handler, error, ctx)
                } else {
                    Err(error)
                };
            }
        }

        if let Some(finalizer) = &try_stmt.finalizer {
            if matches!(&result, Err(error) if !error.is_catchable()) {
                return result;
            }
            let finally_completion = self.execute_block(finalizer, ctx)?;
            if finally_completion.is_abrupt() {
                return Ok(finally_completion);
            }
        }

        result.map(|completion| completion.update_empty(Some(JsValue::Undefined)))
    }

    fn execute_catch(
        &mut self,
        handler: &CatchClause,
        error: JsError,
        ctx: &ExecutionContext,
    ) -> Result<Completion, JsError> {
        let thrown = self.error_to_value(error);
        let Some(param) = &handler.param else {
            return self.execute_block(&handler.body, ctx);
        };
        let env = self.envs.alloc_declarative(ctx.env);
        self.create_lexical_bindings(env, &bound_names(param), false)?;
        let catch_ctx = ctx.with_env(env);
        self.bind_pattern(param, thrown, BindingMode::Initialize(env), &catch_ctx)?;
        self.execute_block(&handler.body, &catch_ctx)
    }
}
