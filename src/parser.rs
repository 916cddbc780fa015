//! Parser for ECMAScript scripts
//!
//! Recursive descent for statements and a precedence climber for binary
//! expressions. Early errors that do not need runtime information (misplaced
//! `return`, unmatched labels, invalid assignment targets, undeclared private
//! names) are reported here as `SyntaxError`s.

use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::ast::*;
use crate::error::JsError;
use crate::hoist;
use crate::lexer::{Lexer, Span, TemplatePart, Token, TokenKind};
use crate::stack::ensure_sufficient_stack;
use crate::string_dict::StringDict;
use crate::value::{CheapClone, JsString};

/// Per-function parsing state. Arrow functions inherit the `super`,
/// `new.target` and `arguments` permissions of their enclosing function.
#[derive(Clone, Default)]
struct FunctionContext {
    strict: bool,
    in_function: bool,
    is_async: bool,
    is_generator: bool,
    uses_arguments: bool,
    allow_super_call: bool,
    allow_super_property: bool,
    allow_new_target: bool,
    /// Class field initializers and static blocks reject `arguments`
    forbid_arguments: bool,
    /// Static blocks reject `return` and `await`
    in_static_block: bool,
    labels: Vec<Label>,
    iteration_depth: u32,
    switch_depth: u32,
}

#[derive(Clone)]
struct Label {
    name: JsString,
    is_loop: bool,
}

/// Private names declared and referenced inside one class body
#[derive(Default)]
struct PrivateScope {
    declared: FxHashSet<JsString>,
    referenced: Vec<(JsString, Span)>,
}

/// Parser for ECMAScript source code
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
    ctx: FunctionContext,
    /// Labels that directly precede the statement being parsed
    pending_labels: usize,
    /// Set while parsing a `for` head, where `in` ends the left-hand side
    no_in: bool,
    private_scopes: Vec<PrivateScope>,
    /// Shorthand `{ a = 1 }` seen in an object literal that has not been
    /// reinterpreted as a pattern yet
    cover_initializer: Option<Span>,
    /// The next assignment expression may still become a pattern (array and
    /// object literal elements, `for` heads)
    cover_context: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, string_dict: &'a mut StringDict) -> Self {
        let mut lexer = Lexer::new(source, string_dict);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            previous: Token::eof(0, 1, 1),
            ctx: FunctionContext::default(),
            pending_labels: 0,
            no_in: false,
            private_scopes: Vec::new(),
            cover_initializer: None,
            cover_context: false,
        }
    }

    #[inline]
    fn intern(&mut self, s: &str) -> JsString {
        self.lexer.intern(s)
    }

    /// Parse a complete script
    pub fn parse_program(&mut self) -> Result<Program, JsError> {
        let start = self.current.span;
        let strict = self.parse_directives()?;
        self.ctx.strict = strict;

        let mut body = Vec::new();
        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        let scope = hoist::function_scope(&body, strict, &[]);
        Ok(Program {
            body,
            scope: Rc::new(scope),
            strict,
            span: self.span_from(start),
        })
    }

    /// Scan the directive prologue for `"use strict"`. The directives
    /// themselves are left in place and parsed as expression statements.
    fn parse_directives(&mut self) -> Result<bool, JsError> {
        let checkpoint = self.lexer.checkpoint();
        let saved_current = self.current.clone();
        let saved_previous = self.previous.clone();

        let mut strict = false;
        while let TokenKind::String(value) = &self.current.kind {
            let raw = self.lexer.slice(self.current.span);
            let is_use_strict = value.as_str() == "use strict" && raw.len() == 12;
            self.advance();
            if !matches!(
                self.current.kind,
                TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
            ) && !self.lexer.had_newline_before()
            {
                break;
            }
            if is_use_strict {
                strict = true;
            }
            self.match_token(&TokenKind::Semicolon);
        }

        self.lexer.restore(checkpoint);
        self.current = saved_current;
        self.previous = saved_previous;
        Ok(strict)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════════════

    fn parse_statement(&mut self) -> Result<Statement, JsError> {
        ensure_sufficient_stack(|| self.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> Result<Statement, JsError> {
        if self.check_identifier_like() && self.peek_is(&TokenKind::Colon) {
            return self.parse_labeled_statement();
        }
        let labels = std::mem::take(&mut self.pending_labels);

        match self.current.kind.clone() {
            TokenKind::Var | TokenKind::Const => Ok(Statement::VariableDeclaration(
                self.parse_variable_declaration(true)?,
            )),
            TokenKind::Let if self.let_starts_declaration() => Ok(
                Statement::VariableDeclaration(self.parse_variable_declaration(true)?),
            ),
            TokenKind::Function => {
                let func = self.parse_function(false, FunctionFlavor::Normal, true)?;
                Ok(Statement::FunctionDeclaration(func))
            }
            TokenKind::Async if self.async_function_ahead() => {
                let func = self.parse_function(true, FunctionFlavor::Normal, true)?;
                Ok(Statement::FunctionDeclaration(func))
            }
            TokenKind::Class => Ok(Statement::ClassDeclaration(self.parse_class(true)?)),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::For => self.parse_for_statement(labels),
            TokenKind::While => self.parse_while_statement(labels),
            TokenKind::Do => self.parse_do_while_statement(labels),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => self.parse_break_statement(),
            TokenKind::Continue => self.parse_continue_statement(),
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::LBrace => Ok(Statement::Block(self.parse_block_statement()?)),
            TokenKind::Semicolon => {
                let span = self.current.span;
                self.advance();
                Ok(Statement::Empty(span))
            }
            TokenKind::Debugger => {
                let span = self.current.span;
                self.advance();
                self.expect_semicolon()?;
                Ok(Statement::Debugger(span))
            }
            TokenKind::With => Err(self.error("'with' statements are not supported")),
            TokenKind::Import | TokenKind::Export => {
                Err(self.error("Cannot use import/export outside a module"))
            }
            _ => {
                let start = self.current.span;
                let expression = self.parse_expression()?;
                self.expect_semicolon()?;
                Ok(Statement::Expression(ExpressionStatement {
                    expression,
                    span: self.span_from(start),
                }))
            }
        }
    }

    /// Statement in a position that only admits a single statement (`if`
    /// and loop bodies, labelled items)
    fn parse_sub_statement(&mut self) -> Result<Statement, JsError> {
        match self.current.kind.clone() {
            TokenKind::Class | TokenKind::Const => {
                Err(self.error("Lexical declaration cannot appear in a single-statement context"))
            }
            TokenKind::Let if self.peek_is(&TokenKind::LBracket) => {
                Err(self.error("Lexical declaration cannot appear in a single-statement context"))
            }
            TokenKind::Function if self.ctx.strict => {
                Err(self.error("In strict mode code, functions can only be declared at top level or inside a block"))
            }
            TokenKind::Function => {
                // Sloppy `if (x) function f() {}` behaves like a braced block
                let start = self.current.span;
                let func = self.parse_function(false, FunctionFlavor::Normal, true)?;
                let body = vec![Statement::FunctionDeclaration(func)];
                let scope = hoist::block_scope(&body);
                Ok(Statement::Block(BlockStatement {
                    body,
                    scope: Rc::new(scope),
                    span: self.span_from(start),
                }))
            }
            _ => self.parse_statement(),
        }
    }

    fn parse_variable_declaration(&mut self, consume_semicolon: bool) -> Result<VariableDeclaration, JsError> {
        let start = self.current.span;
        let kind = match &self.current.kind {
            TokenKind::Let => VariableKind::Let,
            TokenKind::Const => VariableKind::Const,
            TokenKind::Var => VariableKind::Var,
            _ => return Err(self.unexpected_token("variable declaration")),
        };
        self.advance();

        let mut declarations = vec![self.parse_variable_declarator(kind)?];
        while self.match_token(&TokenKind::Comma) {
            declarations.push(self.parse_variable_declarator(kind)?);
        }

        if consume_semicolon {
            for decl in &declarations {
                if decl.init.is_none() {
                    if kind == VariableKind::Const {
                        return Err(JsError::syntax_error_at(
                            "Missing initializer in const declaration",
                            decl.span,
                        ));
                    }
                    if !matches!(decl.id, Pattern::Identifier(_)) {
                        return Err(JsError::syntax_error_at(
                            "Missing initializer in destructuring declaration",
                            decl.span,
                        ));
                    }
                }
            }
            self.expect_semicolon()?;
        }

        Ok(VariableDeclaration {
            kind,
            declarations,
            span: self.span_from(start),
        })
    }

    fn parse_variable_declarator(&mut self, kind: VariableKind) -> Result<VariableDeclarator, JsError> {
        let start = self.current.span;
        let id = self.parse_binding_target()?;
        if kind.is_lexical() {
            let mut names = Vec::new();
            id.bound_names(&mut names);
            if names.iter().any(|n| n == "let") {
                return Err(JsError::syntax_error_at(
                    "let is disallowed as a lexically bound name",
                    start,
                ));
            }
        }

        let init = if self.match_token(&TokenKind::Eq) {
            Some(self.parse_assignment_expression()?)
        } else {
            None
        };

        Ok(VariableDeclarator {
            id,
            init,
            span: self.span_from(start),
        })
    }

    fn parse_block_statement(&mut self) -> Result<BlockStatement, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::LBrace)?;

        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        self.require_token(&TokenKind::RBrace)?;

        let scope = hoist::block_scope(&body);
        Ok(BlockStatement {
            body,
            scope: Rc::new(scope),
            span: self.span_from(start),
        })
    }

    fn parse_if_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::If)?;
        self.require_token(&TokenKind::LParen)?;
        let test = self.parse_expression()?;
        self.require_token(&TokenKind::RParen)?;

        let consequent = Box::new(self.parse_sub_statement()?);
        let alternate = if self.match_token(&TokenKind::Else) {
            Some(Box::new(self.parse_sub_statement()?))
        } else {
            None
        };

        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
            span: self.span_from(start),
        }))
    }

    /// Mark the labels directly in front of a loop as loop labels, so
    /// `continue label` can target it
    fn mark_loop_labels(&mut self, count: usize) {
        let len = self.ctx.labels.len();
        for label in self.ctx.labels.iter_mut().skip(len.saturating_sub(count)) {
            label.is_loop = true;
        }
    }

    fn parse_loop_body(&mut self) -> Result<Statement, JsError> {
        self.ctx.iteration_depth += 1;
        let body = self.parse_sub_statement();
        self.ctx.iteration_depth -= 1;
        body
    }

    fn parse_for_statement(&mut self, labels: usize) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.mark_loop_labels(labels);
        self.require_token(&TokenKind::For)?;

        let await_ = if self.check(&TokenKind::Await) {
            if !self.ctx.is_async {
                return Err(self.error("for await is only valid in async functions"));
            }
            self.advance();
            true
        } else {
            false
        };
        self.require_token(&TokenKind::LParen)?;

        let init = if self.check(&TokenKind::Semicolon) {
            None
        } else if matches!(self.current.kind, TokenKind::Var | TokenKind::Const)
            || (self.check(&TokenKind::Let) && self.let_starts_declaration())
        {
            let saved_no_in = std::mem::replace(&mut self.no_in, true);
            let decl = self.parse_variable_declaration(false);
            self.no_in = saved_no_in;
            let decl = decl?;

            if self.check(&TokenKind::Of) || self.check(&TokenKind::In) {
                let is_of = self.check(&TokenKind::Of);
                if decl.declarations.len() != 1 {
                    return Err(self.error("Invalid left-hand side in for-in/of loop: must have a single binding"));
                }
                let Some(declarator) = decl.declarations.into_iter().next() else {
                    return Err(self.unexpected_token("binding"));
                };
                if declarator.init.is_some() {
                    return Err(JsError::syntax_error_at(
                        "for-in/of loop variable declaration may not have an initializer",
                        declarator.span,
                    ));
                }
                let left = ForInOfLeft::Variable(decl.kind, declarator.id);
                return self.parse_for_in_of_rest(start, left, is_of, await_);
            }

            if decl.kind == VariableKind::Const {
                if let Some(d) = decl.declarations.iter().find(|d| d.init.is_none()) {
                    return Err(JsError::syntax_error_at(
                        "Missing initializer in const declaration",
                        d.span,
                    ));
                }
            }
            Some(ForInit::Variable(decl))
        } else {
            let saved_no_in = std::mem::replace(&mut self.no_in, true);
            self.cover_context = true;
            let expr = self.parse_expression();
            self.no_in = saved_no_in;
            let expr = expr?;

            if self.check(&TokenKind::Of) || self.check(&TokenKind::In) {
                let is_of = self.check(&TokenKind::Of);
                let pattern = self.expression_to_pattern(&expr)?;
                self.cover_initializer = None;
                return self.parse_for_in_of_rest(start, ForInOfLeft::Pattern(pattern), is_of, await_);
            }
            self.check_cover_initializer()?;
            Some(ForInit::Expression(expr))
        };

        if await_ {
            return Err(self.unexpected_token("'of'"));
        }
        self.require_token(&TokenKind::Semicolon)?;

        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.require_token(&TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.require_token(&TokenKind::RParen)?;

        let body = Box::new(self.parse_loop_body()?);
        if let Some(ForInit::Variable(decl)) = &init {
            if decl.kind != VariableKind::Var {
                let mut names = Vec::new();
                for declarator in &decl.declarations {
                    declarator.id.bound_names(&mut names);
                }
                check_loop_head_collision(&names, &body)?;
            }
        }
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_for_in_of_rest(
        &mut self,
        start: Span,
        left: ForInOfLeft,
        is_of: bool,
        await_: bool,
    ) -> Result<Statement, JsError> {
        self.advance(); // `of` / `in`
        let right = if is_of {
            self.parse_assignment_expression()?
        } else {
            self.parse_expression()?
        };
        self.require_token(&TokenKind::RParen)?;
        let body = Box::new(self.parse_loop_body()?);
        if let ForInOfLeft::Variable(kind, pattern) = &left {
            if *kind != VariableKind::Var {
                let mut names = Vec::new();
                pattern.bound_names(&mut names);
                check_loop_head_collision(&names, &body)?;
            }
        }
        let span = self.span_from(start);

        if is_of {
            Ok(Statement::ForOf(ForOfStatement {
                left,
                right,
                body,
                await_,
                span,
            }))
        } else if await_ {
            Err(JsError::syntax_error_at("for await requires 'of'", span))
        } else {
            Ok(Statement::ForIn(ForInStatement {
                left,
                right,
                body,
                span,
            }))
        }
    }

    fn parse_while_statement(&mut self, labels: usize) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.mark_loop_labels(labels);
        self.require_token(&TokenKind::While)?;
        self.require_token(&TokenKind::LParen)?;
        let test = self.parse_expression()?;
        self.require_token(&TokenKind::RParen)?;
        let body = Box::new(self.parse_loop_body()?);

        Ok(Statement::While(WhileStatement {
            test,
            body,
            span: self.span_from(start),
        }))
    }

    fn parse_do_while_statement(&mut self, labels: usize) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.mark_loop_labels(labels);
        self.require_token(&TokenKind::Do)?;
        let body = Box::new(self.parse_loop_body()?);
        self.require_token(&TokenKind::While)?;
        self.require_token(&TokenKind::LParen)?;
        let test = self.parse_expression()?;
        self.require_token(&TokenKind::RParen)?;
        // A semicolon after do-while is always optional
        self.match_token(&TokenKind::Semicolon);

        Ok(Statement::DoWhile(DoWhileStatement {
            body,
            test,
            span: self.span_from(start),
        }))
    }

    fn parse_switch_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::Switch)?;
        self.require_token(&TokenKind::LParen)?;
        let discriminant = self.parse_expression()?;
        self.require_token(&TokenKind::RParen)?;
        self.require_token(&TokenKind::LBrace)?;

        self.ctx.switch_depth += 1;
        let mut cases = Vec::new();
        let mut seen_default = false;
        let result = (|| {
            while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
                let case_start = self.current.span;
                let test = if self.match_token(&TokenKind::Case) {
                    Some(self.parse_expression()?)
                } else {
                    self.require_token(&TokenKind::Default)?;
                    if seen_default {
                        return Err(JsError::syntax_error_at(
                            "More than one default clause in switch statement",
                            case_start,
                        ));
                    }
                    seen_default = true;
                    None
                };
                self.require_token(&TokenKind::Colon)?;

                let mut consequent = Vec::new();
                while !matches!(
                    self.current.kind,
                    TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
                ) {
                    consequent.push(self.parse_statement()?);
                }
                cases.push(SwitchCase {
                    test,
                    consequent,
                    span: self.span_from(case_start),
                });
            }
            Ok(())
        })();
        self.ctx.switch_depth -= 1;
        result?;
        self.require_token(&TokenKind::RBrace)?;

        let scope = hoist::block_scope(cases.iter().flat_map(|c| c.consequent.iter()));
        Ok(Statement::Switch(SwitchStatement {
            discriminant,
            cases,
            scope: Rc::new(scope),
            span: self.span_from(start),
        }))
    }

    fn parse_try_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::Try)?;
        let block = self.parse_block_statement()?;

        let handler = if self.check(&TokenKind::Catch) {
            let catch_start = self.current.span;
            self.advance();
            let param = if self.match_token(&TokenKind::LParen) {
                let param = self.parse_binding_target()?;
                self.require_token(&TokenKind::RParen)?;
                Some(param)
            } else {
                None
            };
            let body = self.parse_block_statement()?;

            if let Some(param) = &param {
                let mut names = Vec::new();
                param.bound_names(&mut names);
                if let Some(clash) = body.scope.lexical.iter().find(|l| names.contains(&l.name)) {
                    return Err(JsError::syntax_error_at(
                        format!("Identifier '{}' has already been declared", clash.name),
                        clash.span,
                    ));
                }
            }

            Some(CatchClause {
                param,
                body,
                span: self.span_from(catch_start),
            })
        } else {
            None
        };

        let finalizer = if self.match_token(&TokenKind::Finally) {
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }

        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
            span: self.span_from(start),
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        if !self.ctx.in_function || self.ctx.in_static_block {
            return Err(self.error("Illegal return statement"));
        }
        self.require_token(&TokenKind::Return)?;

        let argument = if self.statement_ends_here() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon()?;

        Ok(Statement::Return(ReturnStatement {
            argument,
            span: self.span_from(start),
        }))
    }

    fn parse_break_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::Break)?;

        let label = if self.check_identifier_like() && !self.lexer.had_newline_before() {
            let name = self.parse_label_identifier()?;
            if !self.ctx.labels.iter().any(|l| l.name == name) {
                return Err(JsError::syntax_error_at(
                    format!("Undefined label '{}'", name),
                    self.previous.span,
                ));
            }
            Some(name)
        } else {
            if self.ctx.iteration_depth == 0 && self.ctx.switch_depth == 0 {
                return Err(JsError::syntax_error_at("Illegal break statement", start));
            }
            None
        };
        self.expect_semicolon()?;

        Ok(Statement::Break(BreakStatement {
            label,
            span: self.span_from(start),
        }))
    }

    fn parse_continue_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::Continue)?;
        if self.ctx.iteration_depth == 0 {
            return Err(JsError::syntax_error_at(
                "Illegal continue statement: no surrounding iteration statement",
                start,
            ));
        }

        let label = if self.check_identifier_like() && !self.lexer.had_newline_before() {
            let name = self.parse_label_identifier()?;
            match self.ctx.labels.iter().rev().find(|l| l.name == name) {
                Some(label) if label.is_loop => {}
                Some(_) => {
                    return Err(JsError::syntax_error_at(
                        format!("Illegal continue statement: '{}' does not denote an iteration statement", name),
                        self.previous.span,
                    ));
                }
                None => {
                    return Err(JsError::syntax_error_at(
                        format!("Undefined label '{}'", name),
                        self.previous.span,
                    ));
                }
            }
            Some(name)
        } else {
            None
        };
        self.expect_semicolon()?;

        Ok(Statement::Continue(ContinueStatement {
            label,
            span: self.span_from(start),
        }))
    }

    fn parse_throw_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::Throw)?;
        if self.lexer.had_newline_before() {
            return Err(self.error("Illegal newline after throw"));
        }
        let argument = self.parse_expression()?;
        self.expect_semicolon()?;

        Ok(Statement::Throw(ThrowStatement {
            argument,
            span: self.span_from(start),
        }))
    }

    fn parse_labeled_statement(&mut self) -> Result<Statement, JsError> {
        let start = self.current.span;
        let label = self.parse_label_identifier()?;
        if self.ctx.labels.iter().any(|l| l.name == label) {
            return Err(JsError::syntax_error_at(
                format!("Label '{}' has already been declared", label),
                start,
            ));
        }
        self.require_token(&TokenKind::Colon)?;

        self.ctx.labels.push(Label {
            name: label.cheap_clone(),
            is_loop: false,
        });
        self.pending_labels += 1;
        let body = if self.check(&TokenKind::Function) {
            if self.ctx.strict {
                Err(self.error("In strict mode code, functions can only be declared at top level or inside a block"))
            } else {
                self.pending_labels = 0;
                self.parse_function(false, FunctionFlavor::Normal, true)
                    .map(Statement::FunctionDeclaration)
            }
        } else {
            self.parse_sub_statement()
        };
        self.pending_labels = 0;
        self.ctx.labels.pop();

        Ok(Statement::Labeled(LabeledStatement {
            label,
            body: Box::new(body?),
            span: self.span_from(start),
        }))
    }

    fn parse_label_identifier(&mut self) -> Result<JsString, JsError> {
        Ok(self.parse_binding_identifier()?.name)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Functions
    // ═══════════════════════════════════════════════════════════════════════════

    /// `function` / `async function` declarations and expressions
    fn parse_function(
        &mut self,
        is_async: bool,
        flavor: FunctionFlavor,
        is_declaration: bool,
    ) -> Result<Rc<FunctionNode>, JsError> {
        let start = self.current.span;
        if is_async {
            self.require_token(&TokenKind::Async)?;
        }
        self.require_token(&TokenKind::Function)?;
        let is_generator = self.match_token(&TokenKind::Star);

        let name = if self.check(&TokenKind::LParen) {
            if is_declaration {
                return Err(self.error("Function statements require a function name"));
            }
            None
        } else if is_declaration {
            Some(self.parse_binding_identifier()?)
        } else {
            // The name of a function expression lives in the function's own
            // scope, so `yield`/`await` restrictions follow its own kind
            let saved = self.ctx.clone();
            self.ctx.is_generator = is_generator;
            self.ctx.is_async = is_async;
            let name = self.parse_binding_identifier();
            self.ctx = saved;
            Some(name?)
        };

        self.parse_function_rest(start, name, flavor, is_async, is_generator)
    }

    /// Parameters and body, starting at `(`
    fn parse_function_rest(
        &mut self,
        start: Span,
        name: Option<Identifier>,
        flavor: FunctionFlavor,
        is_async: bool,
        is_generator: bool,
    ) -> Result<Rc<FunctionNode>, JsError> {
        let outer = self.enter_function(flavor, is_async, is_generator);
        let result = self.parse_function_parts(start, name, flavor, is_async, is_generator);
        self.leave_function(outer, flavor);
        result.map(Rc::new)
    }

    fn enter_function(&mut self, flavor: FunctionFlavor, is_async: bool, is_generator: bool) -> FunctionContext {
        let outer = self.ctx.clone();
        let is_arrow = flavor == FunctionFlavor::Arrow;
        self.ctx = FunctionContext {
            strict: outer.strict,
            in_function: true,
            is_async,
            is_generator,
            uses_arguments: false,
            allow_super_call: if is_arrow {
                outer.allow_super_call
            } else {
                matches!(flavor, FunctionFlavor::ClassConstructor { derived: true })
            },
            allow_super_property: if is_arrow {
                outer.allow_super_property
            } else {
                !matches!(flavor, FunctionFlavor::Normal)
            },
            allow_new_target: if is_arrow { outer.allow_new_target } else { true },
            forbid_arguments: if is_arrow {
                outer.forbid_arguments
            } else {
                matches!(flavor, FunctionFlavor::FieldInitializer | FunctionFlavor::StaticBlock)
            },
            in_static_block: flavor == FunctionFlavor::StaticBlock,
            labels: Vec::new(),
            iteration_depth: 0,
            switch_depth: 0,
        };
        outer
    }

    fn leave_function(&mut self, outer: FunctionContext, flavor: FunctionFlavor) {
        let inner_uses_arguments = self.ctx.uses_arguments;
        self.ctx = outer;
        if flavor == FunctionFlavor::Arrow && inner_uses_arguments {
            self.ctx.uses_arguments = true;
        }
    }

    fn parse_function_parts(
        &mut self,
        start: Span,
        name: Option<Identifier>,
        flavor: FunctionFlavor,
        is_async: bool,
        is_generator: bool,
    ) -> Result<FunctionNode, JsError> {
        let (params, rest) = self.parse_formal_parameters()?;
        match flavor {
            FunctionFlavor::Getter if !params.is_empty() || rest.is_some() => {
                return Err(JsError::syntax_error_at("Getter must not have any formal parameters", start));
            }
            FunctionFlavor::Setter if params.len() != 1 || rest.is_some() => {
                return Err(JsError::syntax_error_at("Setter must have exactly one formal parameter", start));
            }
            _ => {}
        }
        let had_strict = self.ctx.strict;
        let body = self.parse_function_body()?;
        if self.ctx.strict && !had_strict && !is_simple_parameter_list(&params, rest.as_ref()) {
            return Err(JsError::syntax_error_at(
                "Illegal 'use strict' directive in function with non-simple parameter list",
                start,
            ));
        }
        self.finish_function(start, name, params, rest, FunctionBody::Block(body), flavor, is_async, is_generator)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_function(
        &mut self,
        start: Span,
        name: Option<Identifier>,
        params: Vec<Pattern>,
        rest: Option<Pattern>,
        body: FunctionBody,
        flavor: FunctionFlavor,
        is_async: bool,
        is_generator: bool,
    ) -> Result<FunctionNode, JsError> {
        let span = self.span_from(start);
        let simple_params = is_simple_parameter_list(&params, rest.as_ref());
        let strict = self.ctx.strict;

        let mut param_names = Vec::new();
        for param in &params {
            param.bound_names(&mut param_names);
        }
        if let Some(rest) = &rest {
            rest.bound_names(&mut param_names);
        }

        let duplicates_forbidden = strict
            || !simple_params
            || !matches!(flavor, FunctionFlavor::Normal);
        if duplicates_forbidden {
            let mut seen = FxHashSet::default();
            for param_name in &param_names {
                if !seen.insert(param_name.cheap_clone()) {
                    return Err(JsError::syntax_error_at(
                        "Duplicate parameter name not allowed in this context",
                        span,
                    ));
                }
            }
        }
        if strict {
            if let Some(id) = &name {
                self.validate_strict_binding(&id.name, id.span)?;
            }
            for param_name in &param_names {
                self.validate_strict_binding(param_name, span)?;
            }
        }

        let scope = match &body {
            FunctionBody::Block(statements) => {
                let scope = hoist::function_scope(statements, strict, &param_names);
                if let Some(clash) = scope.lexical.iter().find(|l| param_names.contains(&l.name)) {
                    return Err(JsError::syntax_error_at(
                        format!("Identifier '{}' has already been declared", clash.name),
                        clash.span,
                    ));
                }
                scope
            }
            FunctionBody::Expression(_) => ScopeDeclarations::default(),
        };

        let length = params
            .iter()
            .take_while(|p| !matches!(p, Pattern::Assignment(_)))
            .count();
        let source = JsString::from(self.lexer.slice(span));
        let uses_arguments = flavor != FunctionFlavor::Arrow && self.ctx.uses_arguments;

        Ok(FunctionNode {
            name,
            params,
            rest,
            body,
            flavor,
            is_async,
            is_generator,
            strict,
            simple_params,
            uses_arguments,
            param_names,
            length: u32::try_from(length).unwrap_or(u32::MAX),
            scope: Rc::new(scope),
            source,
            span,
        })
    }

    /// `( a, b = 1, {c}, ...rest )`
    fn parse_formal_parameters(&mut self) -> Result<(Vec<Pattern>, Option<Pattern>), JsError> {
        self.require_token(&TokenKind::LParen)?;
        let mut params = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            if self.match_token(&TokenKind::DotDotDot) {
                rest = Some(self.parse_binding_target()?);
                if !self.check(&TokenKind::RParen) {
                    return Err(self.error("Rest parameter must be last formal parameter"));
                }
                break;
            }
            params.push(self.parse_binding_element()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.require_token(&TokenKind::RParen)?;
        Ok((params, rest))
    }

    /// `{ directives; statements }`. A `"use strict"` directive switches the
    /// current function context to strict mode.
    fn parse_function_body(&mut self) -> Result<Vec<Statement>, JsError> {
        self.require_token(&TokenKind::LBrace)?;
        if self.parse_directives()? {
            self.ctx.strict = true;
        }

        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let mut body = Vec::new();
        let result = (|| {
            while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
                body.push(self.parse_statement()?);
            }
            self.require_token(&TokenKind::RBrace)
        })();
        self.no_in = saved_no_in;
        result?;
        Ok(body)
    }

    /// Arrow function once its head has been recognized by lookahead
    fn parse_arrow_function(&mut self, start: Span, is_async: bool) -> Result<Expression, JsError> {
        let outer = self.enter_function(FunctionFlavor::Arrow, is_async, false);
        let result = self.parse_arrow_parts(start, is_async);
        self.leave_function(outer, FunctionFlavor::Arrow);
        Ok(Expression::ArrowFunction(Rc::new(result?)))
    }

    fn parse_arrow_parts(&mut self, start: Span, is_async: bool) -> Result<FunctionNode, JsError> {
        let (params, rest) = if self.check(&TokenKind::LParen) {
            self.parse_formal_parameters()?
        } else {
            (vec![Pattern::Identifier(self.parse_binding_identifier()?)], None)
        };

        if self.lexer.had_newline_before() && self.check(&TokenKind::Arrow) {
            return Err(self.error("Line terminator not permitted before arrow"));
        }
        self.require_token(&TokenKind::Arrow)?;

        let body = if self.check(&TokenKind::LBrace) {
            let had_strict = self.ctx.strict;
            let statements = self.parse_function_body()?;
            if self.ctx.strict && !had_strict && !is_simple_parameter_list(&params, rest.as_ref()) {
                return Err(self.error("Illegal 'use strict' directive in function with non-simple parameter list"));
            }
            FunctionBody::Block(statements)
        } else {
            FunctionBody::Expression(Box::new(self.parse_assignment_expression()?))
        };

        self.finish_function(start, None, params, rest, body, FunctionFlavor::Arrow, is_async, false)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Classes
    // ═══════════════════════════════════════════════════════════════════════════

    fn parse_class(&mut self, is_declaration: bool) -> Result<Rc<ClassNode>, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::Class)?;

        // Class bodies and heritage are always strict
        let saved_strict = std::mem::replace(&mut self.ctx.strict, true);
        let result = self.parse_class_inner(start, is_declaration);
        self.ctx.strict = saved_strict;
        result.map(Rc::new)
    }

    fn parse_class_inner(&mut self, start: Span, is_declaration: bool) -> Result<ClassNode, JsError> {
        let name = if self.check_identifier_like() && !self.check(&TokenKind::Extends) {
            Some(self.parse_binding_identifier()?)
        } else if is_declaration {
            return Err(self.error("Class statements require a class name"));
        } else {
            None
        };

        let super_class = if self.match_token(&TokenKind::Extends) {
            Some(Box::new(self.parse_left_hand_side_expression()?))
        } else {
            None
        };
        let derived = super_class.is_some();

        self.require_token(&TokenKind::LBrace)?;
        self.private_scopes.push(PrivateScope::default());
        let members = self.parse_class_body(derived);
        let scope = self.private_scopes.pop().unwrap_or_default();
        let (constructor, members) = members?;
        self.require_token(&TokenKind::RBrace)?;

        // References to names this class does not declare must resolve in
        // an enclosing class
        for (referenced, span) in scope.referenced {
            if scope.declared.contains(&referenced) {
                continue;
            }
            match self.private_scopes.last_mut() {
                Some(outer) => outer.referenced.push((referenced, span)),
                None => {
                    return Err(JsError::syntax_error_at(
                        format!("Private field '#{}' must be declared in an enclosing class", referenced),
                        span,
                    ));
                }
            }
        }

        let span = self.span_from(start);
        let constructor = match constructor {
            Some(ctor) => ctor,
            None => self.default_constructor(derived, span),
        };

        Ok(ClassNode {
            name,
            super_class,
            constructor,
            members,
            source: JsString::from(self.lexer.slice(span)),
            span,
        })
    }

    fn parse_class_body(
        &mut self,
        derived: bool,
    ) -> Result<(Option<Rc<FunctionNode>>, Vec<ClassMember>), JsError> {
        let mut constructor = None;
        let mut members = Vec::new();
        // Private accessor halves seen so far: (name, is_static, has_getter, has_setter)
        let mut private_accessors: Vec<(JsString, bool, bool, bool)> = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.match_token(&TokenKind::Semicolon) {
                continue;
            }
            let member_start = self.current.span;

            let is_static = self.check(&TokenKind::Static) && !self.next_ends_member_name();
            if is_static {
                self.advance();
                if self.check(&TokenKind::LBrace) {
                    let body = self.parse_static_block(member_start)?;
                    members.push(ClassMember::StaticBlock {
                        body,
                        span: self.span_from(member_start),
                    });
                    continue;
                }
            }

            let (kind, is_async, is_generator) = self.parse_method_modifiers()?;
            let key_span = self.current.span;
            let key = self.parse_property_name()?;

            if let PropertyName::Private(private) = &key {
                if private == "constructor" {
                    return Err(JsError::syntax_error_at("Classes may not have a private field named '#constructor'", key_span));
                }
                let scope_declared = self
                    .private_scopes
                    .last()
                    .is_some_and(|s| s.declared.contains(private));
                match kind {
                    MethodKind::Get | MethodKind::Set if self.check(&TokenKind::LParen) => {
                        let is_get = kind == MethodKind::Get;
                        match private_accessors.iter_mut().find(|(n, _, _, _)| n == private) {
                            Some((_, was_static, has_get, has_set))
                                if *was_static == is_static && !(is_get && *has_get) && !(!is_get && *has_set) =>
                            {
                                if is_get {
                                    *has_get = true;
                                } else {
                                    *has_set = true;
                                }
                            }
                            None if !scope_declared => {
                                private_accessors.push((private.cheap_clone(), is_static, is_get, !is_get));
                            }
                            _ => return Err(self.duplicate_private(private, key_span)),
                        }
                    }
                    _ if scope_declared => return Err(self.duplicate_private(private, key_span)),
                    _ => {}
                }
                if let Some(scope) = self.private_scopes.last_mut() {
                    scope.declared.insert(private.cheap_clone());
                }
            }

            if self.check(&TokenKind::LParen) {
                let is_constructor = !is_static && property_name_is(&key, "constructor");
                if is_constructor {
                    if kind != MethodKind::Method || is_async || is_generator {
                        return Err(JsError::syntax_error_at("Class constructor may not be an accessor, generator or async", key_span));
                    }
                    if constructor.is_some() {
                        return Err(JsError::syntax_error_at("A class may only have one constructor", key_span));
                    }
                    let flavor = FunctionFlavor::ClassConstructor { derived };
                    let ctor = self.parse_function_rest(member_start, None, flavor, false, false)?;
                    constructor = Some(ctor);
                    continue;
                }
                if is_static && property_name_is(&key, "prototype") {
                    return Err(JsError::syntax_error_at("Classes may not have a static property named 'prototype'", key_span));
                }

                let flavor = match kind {
                    MethodKind::Method => FunctionFlavor::Method,
                    MethodKind::Get => FunctionFlavor::Getter,
                    MethodKind::Set => FunctionFlavor::Setter,
                };
                let function = self.parse_function_rest(member_start, None, flavor, is_async, is_generator)?;
                members.push(ClassMember::Method {
                    key,
                    kind,
                    is_static,
                    function,
                    span: self.span_from(member_start),
                });
                continue;
            }

            if kind != MethodKind::Method || is_async || is_generator {
                return Err(self.unexpected_token("'('"));
            }
            if property_name_is(&key, "constructor") || (is_static && property_name_is(&key, "prototype")) {
                return Err(JsError::syntax_error_at("Classes may not have a field with this name", key_span));
            }

            let initializer = if self.check(&TokenKind::Eq) {
                let init_start = self.current.span;
                self.advance();
                Some(self.parse_field_initializer(init_start)?)
            } else {
                None
            };
            self.expect_semicolon()?;
            members.push(ClassMember::Field {
                key,
                is_static,
                initializer,
                span: self.span_from(member_start),
            });
        }

        Ok((constructor, members))
    }

    fn duplicate_private(&self, name: &JsString, span: Span) -> JsError {
        JsError::syntax_error_at(format!("Identifier '#{}' has already been declared", name), span)
    }

    /// `get`, `set`, `async` and `*` prefixes of a method definition
    fn parse_method_modifiers(&mut self) -> Result<(MethodKind, bool, bool), JsError> {
        let mut is_async = false;
        if self.check(&TokenKind::Async) && !self.next_ends_member_name() && !self.next_on_new_line() {
            self.advance();
            is_async = true;
        }
        let is_generator = self.match_token(&TokenKind::Star);

        let mut kind = MethodKind::Method;
        if !is_async && !is_generator {
            let is_get = self.check_contextual("get");
            let is_set = self.check_contextual("set");
            if (is_get || is_set) && !self.next_ends_member_name() {
                self.advance();
                kind = if is_get { MethodKind::Get } else { MethodKind::Set };
            }
        }
        Ok((kind, is_async, is_generator))
    }

    /// Whether the token after the current one ends a member name, meaning
    /// the current `static`/`get`/`set`/`async` is itself the name
    fn next_ends_member_name(&mut self) -> bool {
        let checkpoint = self.lexer.checkpoint();
        let next = self.lexer.next_token();
        self.lexer.restore(checkpoint);
        matches!(
            next.kind,
            TokenKind::LParen
                | TokenKind::Eq
                | TokenKind::Semicolon
                | TokenKind::RBrace
                | TokenKind::Colon
                | TokenKind::Comma
                | TokenKind::Eof
        )
    }

    fn next_on_new_line(&mut self) -> bool {
        let checkpoint = self.lexer.checkpoint();
        self.lexer.next_token();
        let newline = self.lexer.had_newline_before();
        self.lexer.restore(checkpoint);
        newline
    }

    fn parse_field_initializer(&mut self, start: Span) -> Result<Rc<FunctionNode>, JsError> {
        let flavor = FunctionFlavor::FieldInitializer;
        let outer = self.enter_function(flavor, false, false);
        let result = (|| {
            let expr = self.parse_assignment_expression()?;
            self.finish_function(start, None, Vec::new(), None, FunctionBody::Expression(Box::new(expr)), flavor, false, false)
        })();
        self.leave_function(outer, flavor);
        result.map(Rc::new)
    }

    fn parse_static_block(&mut self, start: Span) -> Result<Rc<FunctionNode>, JsError> {
        let flavor = FunctionFlavor::StaticBlock;
        let outer = self.enter_function(flavor, false, false);
        let result = (|| {
            self.require_token(&TokenKind::LBrace)?;
            let mut body = Vec::new();
            while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
                body.push(self.parse_statement()?);
            }
            self.require_token(&TokenKind::RBrace)?;
            self.finish_function(start, None, Vec::new(), None, FunctionBody::Block(body), flavor, false, false)
        })();
        self.leave_function(outer, flavor);
        result.map(Rc::new)
    }

    /// `constructor() {}` or `constructor(...args) { super(...args); }`
    fn default_constructor(&mut self, derived: bool, span: Span) -> Rc<FunctionNode> {
        let (rest, body) = if derived {
            let args = self.intern("args");
            let call = Expression::Call(CallExpression {
                callee: Box::new(Expression::Super(span)),
                arguments: vec![Argument::Spread(Expression::Identifier(Identifier {
                    name: args.cheap_clone(),
                    span,
                }))],
                optional: false,
                span,
            });
            (
                Some(Pattern::Identifier(Identifier { name: args, span })),
                vec![Statement::Expression(ExpressionStatement {
                    expression: call,
                    span,
                })],
            )
        } else {
            (None, Vec::new())
        };

        let mut param_names = Vec::new();
        if let Some(rest) = &rest {
            rest.bound_names(&mut param_names);
        }
        Rc::new(FunctionNode {
            name: None,
            params: Vec::new(),
            simple_params: rest.is_none(),
            rest,
            body: FunctionBody::Block(body),
            flavor: FunctionFlavor::ClassConstructor { derived },
            is_async: false,
            is_generator: false,
            strict: true,
            uses_arguments: false,
            param_names,
            length: 0,
            scope: Rc::new(ScopeDeclarations::default()),
            source: JsString::from(self.lexer.slice(span)),
            span,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Patterns
    // ═══════════════════════════════════════════════════════════════════════════

    /// Identifier, object pattern or array pattern
    fn parse_binding_target(&mut self) -> Result<Pattern, JsError> {
        match &self.current.kind {
            TokenKind::LBrace => self.parse_object_binding_pattern(),
            TokenKind::LBracket => self.parse_array_binding_pattern(),
            _ => Ok(Pattern::Identifier(self.parse_binding_identifier()?)),
        }
    }

    /// Binding target with an optional `= default`
    fn parse_binding_element(&mut self) -> Result<Pattern, JsError> {
        let start = self.current.span;
        let target = self.parse_binding_target()?;
        if self.match_token(&TokenKind::Eq) {
            let default = self.with_in(|p| p.parse_assignment_expression())?;
            return Ok(Pattern::Assignment(AssignmentPattern {
                target: Box::new(target),
                default: Box::new(default),
                span: self.span_from(start),
            }));
        }
        Ok(target)
    }

    fn parse_object_binding_pattern(&mut self) -> Result<Pattern, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::LBrace)?;
        let mut properties = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.match_token(&TokenKind::DotDotDot) {
                rest = Some(Box::new(Pattern::Identifier(self.parse_binding_identifier()?)));
                break;
            }

            let prop_start = self.current.span;
            let shorthand = self.check_identifier_like()
                && !self.peek_is(&TokenKind::Colon)
                && !self.peek_is(&TokenKind::LParen);
            if shorthand {
                let id = self.parse_binding_identifier()?;
                let key = PropertyName::Identifier(id.name.cheap_clone());
                let mut value = Pattern::Identifier(id);
                if self.match_token(&TokenKind::Eq) {
                    let default = self.with_in(|p| p.parse_assignment_expression())?;
                    value = Pattern::Assignment(AssignmentPattern {
                        target: Box::new(value),
                        default: Box::new(default),
                        span: self.span_from(prop_start),
                    });
                }
                properties.push(ObjectPatternProperty {
                    key,
                    value,
                    span: self.span_from(prop_start),
                });
            } else {
                let key = self.parse_property_name()?;
                if matches!(key, PropertyName::Private(_)) {
                    return Err(JsError::syntax_error_at("Unexpected private name in pattern", prop_start));
                }
                self.require_token(&TokenKind::Colon)?;
                let value = self.parse_binding_element()?;
                properties.push(ObjectPatternProperty {
                    key,
                    value,
                    span: self.span_from(prop_start),
                });
            }

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.require_token(&TokenKind::RBrace)?;

        Ok(Pattern::Object(ObjectPattern {
            properties,
            rest,
            span: self.span_from(start),
        }))
    }

    fn parse_array_binding_pattern(&mut self) -> Result<Pattern, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::LBracket)?;
        let mut elements = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RBracket) && !self.is_at_end() {
            if self.match_token(&TokenKind::Comma) {
                elements.push(None);
                continue;
            }
            if self.match_token(&TokenKind::DotDotDot) {
                rest = Some(Box::new(self.parse_binding_target()?));
                break;
            }
            elements.push(Some(self.parse_binding_element()?));
            if !self.check(&TokenKind::RBracket) {
                self.require_token(&TokenKind::Comma)?;
            }
        }
        self.require_token(&TokenKind::RBracket)?;

        Ok(Pattern::Array(ArrayPattern {
            elements,
            rest,
            span: self.span_from(start),
        }))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════════════

    fn parse_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let first = self.parse_assignment_expression()?;

        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.match_token(&TokenKind::Comma) {
            expressions.push(self.parse_assignment_expression()?);
        }
        Ok(Expression::Sequence(SequenceExpression {
            expressions,
            span: self.span_from(start),
        }))
    }

    fn parse_assignment_expression(&mut self) -> Result<Expression, JsError> {
        ensure_sufficient_stack(|| self.parse_assignment_expression_inner())
    }

    fn parse_assignment_expression_inner(&mut self) -> Result<Expression, JsError> {
        let allow_cover = std::mem::take(&mut self.cover_context);
        let outer_cover = self.cover_initializer.take();
        let result = self.parse_assignment_expression_body(allow_cover);
        if self.cover_initializer.is_none() {
            self.cover_initializer = outer_cover;
        }
        result
    }

    fn parse_assignment_expression_body(&mut self, allow_cover: bool) -> Result<Expression, JsError> {
        if self.check(&TokenKind::Yield) && self.ctx.is_generator {
            return self.parse_yield_expression();
        }

        // Arrow functions: `x =>`, `(...) =>`, `async x =>`, `async (...) =>`
        if self.check_identifier_like() && self.peek_is(&TokenKind::Arrow) {
            let start = self.current.span;
            return self.parse_arrow_function(start, false);
        }
        if self.check(&TokenKind::Async) && !self.next_on_new_line() {
            let start = self.current.span;
            if self.async_arrow_ahead() {
                self.advance();
                return self.parse_arrow_function(start, true);
            }
        }
        if self.check(&TokenKind::LParen) && self.arrow_after_parens() {
            let start = self.current.span;
            return self.parse_arrow_function(start, false);
        }

        let start = self.current.span;
        let expr = self.parse_conditional_expression()?;

        if let Some(op) = self.current_assignment_op() {
            let target = if op == AssignmentOp::Assign
                && matches!(expr, Expression::Object(_) | Expression::Array(_))
            {
                let pattern = self.expression_to_pattern(&expr)?;
                self.cover_initializer = None;
                AssignmentTarget::Pattern(pattern)
            } else {
                AssignmentTarget::Simple(Box::new(self.expression_to_simple_target(expr, "assignment")?))
            };
            self.advance();
            let value = self.parse_assignment_expression()?;
            return Ok(Expression::Assignment(AssignmentExpression {
                operator: op,
                target,
                value: Box::new(value),
                span: self.span_from(start),
            }));
        }

        if self.cover_initializer.is_some()
            && !(allow_cover && matches!(expr, Expression::Object(_) | Expression::Array(_)))
        {
            self.check_cover_initializer()?;
        }
        Ok(expr)
    }

    fn parse_yield_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::Yield)?;

        let delegate = !self.lexer.had_newline_before() && self.match_token(&TokenKind::Star);
        let argument = if delegate
            || (!self.lexer.had_newline_before()
                && !matches!(
                    self.current.kind,
                    TokenKind::Semicolon
                        | TokenKind::RBrace
                        | TokenKind::RParen
                        | TokenKind::RBracket
                        | TokenKind::Comma
                        | TokenKind::Colon
                        | TokenKind::Eof
                ))
        {
            Some(Box::new(self.parse_assignment_expression()?))
        } else {
            None
        };

        Ok(Expression::Yield(YieldExpression {
            argument,
            delegate,
            span: self.span_from(start),
        }))
    }

    fn parse_conditional_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let test = self.parse_binary_expression(0)?;

        if self.match_token(&TokenKind::Question) {
            let consequent = self.with_in(|p| p.parse_assignment_expression())?;
            self.require_token(&TokenKind::Colon)?;
            let alternate = self.parse_assignment_expression()?;
            return Ok(Expression::Conditional(ConditionalExpression {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
                span: self.span_from(start),
            }));
        }

        Ok(test)
    }

    /// Precedence climbing over binary and logical operators
    fn parse_binary_expression(&mut self, min_prec: u8) -> Result<Expression, JsError> {
        let start = self.current.span;
        let mut left = if let TokenKind::PrivateName(name) = &self.current.kind {
            // `#x in obj`
            let name = name.cheap_clone();
            let name_span = self.current.span;
            self.advance();
            if !self.check(&TokenKind::In) || self.no_in {
                return Err(JsError::syntax_error_at("Unexpected private name", name_span));
            }
            if min_prec > PREC_RELATIONAL {
                return Err(JsError::syntax_error_at("Unexpected private name", name_span));
            }
            self.reference_private(&name, name_span)?;
            self.advance();
            let right = self.parse_binary_expression(PREC_RELATIONAL + 1)?;
            Expression::PrivateIn(PrivateInExpression {
                name,
                right: Box::new(right),
                span: self.span_from(start),
            })
        } else {
            self.parse_unary_expression()?
        };

        while let Some((op, prec)) = self.current_binary_op() {
            if prec < min_prec {
                break;
            }
            if op == BinaryOperator::Binary(BinaryOp::Exp)
                && matches!(left, Expression::Unary(_))
            {
                return Err(self.error("Unary operator used immediately before exponentiation expression. Parenthesis must be used to disambiguate operator precedence"));
            }
            self.advance();

            // `**` is right-associative
            let next_prec = if op == BinaryOperator::Binary(BinaryOp::Exp) { prec } else { prec + 1 };
            let right = self.parse_binary_expression(next_prec)?;

            let span = self.span_from(start);
            left = match op {
                BinaryOperator::Logical(operator) => {
                    let mixes_nullish = |e: &Expression, other: LogicalOp| {
                        matches!(e, Expression::Logical(l) if l.operator == other)
                    };
                    let invalid_mix = match operator {
                        LogicalOp::NullishCoalescing => {
                            mixes_nullish(&left, LogicalOp::And)
                                || mixes_nullish(&left, LogicalOp::Or)
                                || mixes_nullish(&right, LogicalOp::And)
                                || mixes_nullish(&right, LogicalOp::Or)
                        }
                        LogicalOp::And | LogicalOp::Or => {
                            mixes_nullish(&left, LogicalOp::NullishCoalescing)
                                || mixes_nullish(&right, LogicalOp::NullishCoalescing)
                        }
                    };
                    if invalid_mix {
                        return Err(JsError::syntax_error_at("Cannot mix ?? with && or || without parentheses", span));
                    }
                    Expression::Logical(LogicalExpression {
                        operator,
                        left: Box::new(left),
                        right: Box::new(right),
                        span,
                    })
                }
                BinaryOperator::Binary(operator) => Expression::Binary(BinaryExpression {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                }),
            };
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, JsError> {
        ensure_sufficient_stack(|| self.parse_unary_expression_inner())
    }

    fn parse_unary_expression_inner(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;

        if let Some(operator) = self.current_unary_op() {
            self.advance();
            let argument = self.parse_unary_expression()?;

            if operator == UnaryOp::Delete && self.ctx.strict {
                if let Expression::Identifier(id) = unparenthesize(&argument) {
                    return Err(JsError::syntax_error_at(
                        format!("Delete of an unqualified identifier '{}' in strict mode", id.name),
                        id.span,
                    ));
                }
            }
            if operator == UnaryOp::Delete {
                if let Expression::Member(MemberExpression {
                    property: MemberProperty::PrivateName(_),
                    ..
                }) = unparenthesize(&argument)
                {
                    return Err(self.error("Private fields can not be deleted"));
                }
            }

            return Ok(Expression::Unary(UnaryExpression {
                operator,
                argument: Box::new(argument),
                span: self.span_from(start),
            }));
        }

        if self.check(&TokenKind::Await) && self.ctx.is_async {
            self.advance();
            let argument = self.parse_unary_expression()?;
            return Ok(Expression::Await(AwaitExpression {
                argument: Box::new(argument),
                span: self.span_from(start),
            }));
        }
        if self.check(&TokenKind::Await) && self.ctx.in_static_block {
            return Err(self.error("await is not allowed in class static blocks"));
        }

        if let Some(operator) = self.current_update_op() {
            self.advance();
            let argument = self.parse_unary_expression()?;
            let argument = self.expression_to_simple_target(argument, "prefix operation")?;
            return Ok(Expression::Update(UpdateExpression {
                operator,
                argument: Box::new(argument),
                prefix: true,
                span: self.span_from(start),
            }));
        }

        self.parse_postfix_expression()
    }

    fn parse_postfix_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let expr = self.parse_left_hand_side_expression()?;

        if !self.lexer.had_newline_before() {
            if let Some(operator) = self.current_update_op() {
                let argument = self.expression_to_simple_target(expr, "postfix operation")?;
                self.advance();
                return Ok(Expression::Update(UpdateExpression {
                    operator,
                    argument: Box::new(argument),
                    prefix: false,
                    span: self.span_from(start),
                }));
            }
        }

        Ok(expr)
    }

    /// Member accesses, calls, tagged templates and optional chains
    fn parse_left_hand_side_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let mut expr = if self.check(&TokenKind::New) {
            self.parse_new_expression()?
        } else if self.check(&TokenKind::Super) {
            self.parse_super()?
        } else {
            self.parse_primary_expression()?
        };

        let mut in_chain = false;
        loop {
            match &self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    expr = self.parse_dot_member(expr, start, false)?;
                }
                TokenKind::LBracket => {
                    self.advance();
                    expr = self.parse_computed_member(expr, start, false)?;
                }
                TokenKind::LParen => {
                    let arguments = self.parse_arguments()?;
                    expr = Expression::Call(CallExpression {
                        callee: Box::new(expr),
                        arguments,
                        optional: false,
                        span: self.span_from(start),
                    });
                }
                TokenKind::QuestionDot => {
                    self.advance();
                    in_chain = true;
                    expr = match &self.current.kind {
                        TokenKind::LParen => {
                            let arguments = self.parse_arguments()?;
                            Expression::Call(CallExpression {
                                callee: Box::new(expr),
                                arguments,
                                optional: true,
                                span: self.span_from(start),
                            })
                        }
                        TokenKind::LBracket => {
                            self.advance();
                            self.parse_computed_member(expr, start, true)?
                        }
                        TokenKind::TemplateHead(_) | TokenKind::TemplateNoSub(_) => {
                            return Err(self.error("Invalid tagged template on optional chain"));
                        }
                        _ => self.parse_dot_member(expr, start, true)?,
                    };
                }
                TokenKind::TemplateHead(_) | TokenKind::TemplateNoSub(_) => {
                    if in_chain {
                        return Err(self.error("Invalid tagged template on optional chain"));
                    }
                    let quasi = self.parse_template(true)?;
                    expr = Expression::TaggedTemplate(TaggedTemplateExpression {
                        tag: Box::new(expr),
                        quasi: Rc::new(quasi),
                        span: self.span_from(start),
                    });
                }
                _ => break,
            }
        }

        if in_chain {
            expr = Expression::OptionalChain(OptionalChainExpression {
                base: Box::new(expr),
                span: self.span_from(start),
            });
        }
        Ok(expr)
    }

    fn parse_dot_member(&mut self, object: Expression, start: Span, optional: bool) -> Result<Expression, JsError> {
        let property = if let TokenKind::PrivateName(name) = &self.current.kind {
            let name = name.cheap_clone();
            let span = self.current.span;
            self.advance();
            self.reference_private(&name, span)?;
            MemberProperty::PrivateName(name)
        } else {
            MemberProperty::Identifier(self.parse_identifier_name()?)
        };
        Ok(Expression::Member(MemberExpression {
            object: Box::new(object),
            property,
            optional,
            span: self.span_from(start),
        }))
    }

    fn parse_computed_member(&mut self, object: Expression, start: Span, optional: bool) -> Result<Expression, JsError> {
        let property = self.with_in(|p| p.parse_expression())?;
        self.require_token(&TokenKind::RBracket)?;
        Ok(Expression::Member(MemberExpression {
            object: Box::new(object),
            property: MemberProperty::Expression(Box::new(property)),
            optional,
            span: self.span_from(start),
        }))
    }

    /// `new X(args)`, `new X`, `new new X()()` and `new.target`
    fn parse_new_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::New)?;

        if self.match_token(&TokenKind::Dot) {
            if !self.check_contextual("target") {
                return Err(self.unexpected_token("'target'"));
            }
            self.advance();
            if !self.ctx.allow_new_target {
                return Err(JsError::syntax_error_at("new.target expression is not allowed here", start));
            }
            return Ok(Expression::NewTarget(self.span_from(start)));
        }

        let mut callee = if self.check(&TokenKind::New) {
            self.parse_new_expression()?
        } else if self.check(&TokenKind::Super) {
            self.parse_super()?
        } else {
            self.parse_primary_expression()?
        };

        loop {
            match &self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    callee = self.parse_dot_member(callee, start, false)?;
                }
                TokenKind::LBracket => {
                    self.advance();
                    callee = self.parse_computed_member(callee, start, false)?;
                }
                TokenKind::TemplateHead(_) | TokenKind::TemplateNoSub(_) => {
                    let quasi = self.parse_template(true)?;
                    callee = Expression::TaggedTemplate(TaggedTemplateExpression {
                        tag: Box::new(callee),
                        quasi: Rc::new(quasi),
                        span: self.span_from(start),
                    });
                }
                TokenKind::QuestionDot => {
                    return Err(self.error("Invalid optional chain from new expression"));
                }
                _ => break,
            }
        }

        let arguments = if self.check(&TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Ok(Expression::New(NewExpression {
            callee: Box::new(callee),
            arguments,
            span: self.span_from(start),
        }))
    }

    /// `super` must be followed by a call (derived constructors) or a
    /// property access (methods)
    fn parse_super(&mut self) -> Result<Expression, JsError> {
        let span = self.current.span;
        self.require_token(&TokenKind::Super)?;
        match &self.current.kind {
            TokenKind::LParen if self.ctx.allow_super_call => Ok(Expression::Super(span)),
            TokenKind::LParen => Err(JsError::syntax_error_at("'super' keyword unexpected here", span)),
            TokenKind::Dot | TokenKind::LBracket if self.ctx.allow_super_property => {
                Ok(Expression::Super(span))
            }
            _ => Err(JsError::syntax_error_at("'super' keyword unexpected here", span)),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Argument>, JsError> {
        self.require_token(&TokenKind::LParen)?;
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let result = (|| {
            let mut arguments = Vec::new();
            while !self.check(&TokenKind::RParen) && !self.is_at_end() {
                if self.match_token(&TokenKind::DotDotDot) {
                    arguments.push(Argument::Spread(self.parse_assignment_expression()?));
                } else {
                    arguments.push(Argument::Expression(self.parse_assignment_expression()?));
                }
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.require_token(&TokenKind::RParen)?;
            Ok(arguments)
        })();
        self.no_in = saved_no_in;
        result
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;

        let value = match self.current.kind.clone() {
            TokenKind::Number(n) => LiteralValue::Number(n),
            TokenKind::String(s) => LiteralValue::String(s),
            TokenKind::BigInt(s) => LiteralValue::BigInt(s),
            TokenKind::True => LiteralValue::Boolean(true),
            TokenKind::False => LiteralValue::Boolean(false),
            TokenKind::Null => LiteralValue::Null,
            TokenKind::This => {
                self.advance();
                return Ok(Expression::This(start));
            }
            TokenKind::LParen => return self.parse_parenthesized(),
            TokenKind::LBracket => return self.parse_array_literal(),
            TokenKind::LBrace => return self.parse_object_literal(),
            TokenKind::Function => {
                let func = self.parse_function(false, FunctionFlavor::Normal, false)?;
                return Ok(Expression::Function(func));
            }
            TokenKind::Async if self.async_function_ahead() => {
                let func = self.parse_function(true, FunctionFlavor::Normal, false)?;
                return Ok(Expression::Function(func));
            }
            TokenKind::Class => return Ok(Expression::Class(self.parse_class(false)?)),
            TokenKind::TemplateHead(_) | TokenKind::TemplateNoSub(_) => {
                return Ok(Expression::Template(self.parse_template(false)?));
            }
            TokenKind::Slash | TokenKind::SlashEq => {
                return Err(self.error("Regular expression literals are not supported"));
            }
            TokenKind::Unterminated => return Err(self.error("Unterminated literal or comment")),
            TokenKind::Invalid(c) => {
                return Err(self.error(&format!("Invalid or unexpected token '{}'", c)));
            }
            _ if self.check_identifier_like() => {
                let id = self.parse_identifier_reference()?;
                return Ok(Expression::Identifier(id));
            }
            _ => return Err(self.unexpected_token("expression")),
        };

        self.advance();
        Ok(Expression::Literal(Literal {
            value,
            span: self.span_from(start),
        }))
    }

    fn parse_parenthesized(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::LParen)?;
        let expr = self.with_in(|p| p.parse_expression())?;
        self.require_token(&TokenKind::RParen)?;
        Ok(Expression::Parenthesized(Box::new(expr), self.span_from(start)))
    }

    fn parse_array_literal(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::LBracket)?;
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let result = (|| {
            let mut elements = Vec::new();
            while !self.check(&TokenKind::RBracket) && !self.is_at_end() {
                if self.match_token(&TokenKind::Comma) {
                    elements.push(None);
                    continue;
                }
                let spread = self.match_token(&TokenKind::DotDotDot);
                self.cover_context = true;
                let value = self.parse_assignment_expression()?;
                let element = if spread {
                    ArrayElement::Spread(value)
                } else {
                    ArrayElement::Expression(value)
                };
                elements.push(Some(element));
                if !self.check(&TokenKind::RBracket) {
                    self.require_token(&TokenKind::Comma)?;
                }
            }
            self.require_token(&TokenKind::RBracket)?;
            Ok(elements)
        })();
        self.no_in = saved_no_in;

        Ok(Expression::Array(ArrayExpression {
            elements: result?,
            span: self.span_from(start),
        }))
    }

    fn parse_object_literal(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::LBrace)?;
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let result = (|| {
            let mut properties = Vec::new();
            while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
                properties.push(self.parse_object_member()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.require_token(&TokenKind::RBrace)?;
            Ok(properties)
        })();
        self.no_in = saved_no_in;

        Ok(Expression::Object(ObjectExpression {
            properties: result?,
            span: self.span_from(start),
        }))
    }

    fn parse_object_member(&mut self) -> Result<ObjectMember, JsError> {
        let start = self.current.span;
        if self.match_token(&TokenKind::DotDotDot) {
            let argument = self.parse_assignment_expression()?;
            return Ok(ObjectMember::Spread(argument, self.span_from(start)));
        }

        // Shorthand `{ a }` and cover-initialized `{ a = 1 }`
        if self.check_identifier_like()
            && matches!(self.peek_kind(), TokenKind::Comma | TokenKind::RBrace | TokenKind::Eq)
        {
            let id = self.parse_identifier_reference()?;
            let key = PropertyName::Identifier(id.name.cheap_clone());
            let mut value = Expression::Identifier(id);
            if self.check(&TokenKind::Eq) {
                let eq_span = self.current.span;
                self.advance();
                let default = self.parse_assignment_expression()?;
                if self.cover_initializer.is_none() {
                    self.cover_initializer = Some(eq_span);
                }
                value = Expression::Assignment(AssignmentExpression {
                    operator: AssignmentOp::Assign,
                    target: AssignmentTarget::Simple(Box::new(value)),
                    value: Box::new(default),
                    span: self.span_from(start),
                });
            }
            return Ok(ObjectMember::Property {
                key,
                value,
                shorthand: true,
                span: self.span_from(start),
            });
        }

        let (kind, is_async, is_generator) = self.parse_method_modifiers()?;
        let key = self.parse_property_name()?;
        if matches!(key, PropertyName::Private(_)) {
            return Err(JsError::syntax_error_at("Unexpected private name in object literal", start));
        }

        if self.check(&TokenKind::LParen) {
            let flavor = match kind {
                MethodKind::Method => FunctionFlavor::Method,
                MethodKind::Get => FunctionFlavor::Getter,
                MethodKind::Set => FunctionFlavor::Setter,
            };
            let function = self.parse_function_rest(start, None, flavor, is_async, is_generator)?;
            return Ok(ObjectMember::Method {
                key,
                kind,
                function,
                span: self.span_from(start),
            });
        }

        if kind != MethodKind::Method || is_async || is_generator {
            return Err(self.unexpected_token("'('"));
        }
        self.require_token(&TokenKind::Colon)?;
        self.cover_context = true;
        let value = self.parse_assignment_expression()?;
        Ok(ObjectMember::Property {
            key,
            value,
            shorthand: false,
            span: self.span_from(start),
        })
    }

    /// Template literal starting at the current token. Invalid escapes are
    /// an error unless the template is tagged.
    fn parse_template(&mut self, tagged: bool) -> Result<TemplateLiteral, JsError> {
        let start = self.current.span;
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();

        let first = match &self.current.kind {
            TokenKind::TemplateNoSub(part) => {
                let part = part.clone();
                self.advance();
                quasis.push(self.template_quasi(part, tagged, start)?);
                return Ok(TemplateLiteral {
                    quasis,
                    expressions,
                    span: self.span_from(start),
                });
            }
            TokenKind::TemplateHead(part) => part.clone(),
            _ => return Err(self.unexpected_token("template literal")),
        };
        quasis.push(self.template_quasi(first, tagged, start)?);
        self.advance();

        loop {
            expressions.push(self.with_in(|p| p.parse_expression())?);
            if !self.check(&TokenKind::RBrace) {
                return Err(self.unexpected_token("'}' in template literal"));
            }
            let continuation = self.lexer.rescan_template_continuation(self.current.span);
            let span = continuation.span;
            self.current = continuation;
            match &self.current.kind {
                TokenKind::TemplateMiddle(part) => {
                    let part = part.clone();
                    quasis.push(self.template_quasi(part, tagged, span)?);
                    self.advance();
                }
                TokenKind::TemplateTail(part) => {
                    let part = part.clone();
                    quasis.push(self.template_quasi(part, tagged, span)?);
                    self.advance();
                    break;
                }
                _ => return Err(self.error("Unterminated template literal")),
            }
        }

        Ok(TemplateLiteral {
            quasis,
            expressions,
            span: self.span_from(start),
        })
    }

    fn template_quasi(&self, part: TemplatePart, tagged: bool, span: Span) -> Result<TemplateQuasi, JsError> {
        if part.cooked.is_none() && !tagged {
            return Err(JsError::syntax_error_at("Invalid escape sequence in template", span));
        }
        Ok(TemplateQuasi {
            cooked: part.cooked,
            raw: part.raw,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Cover grammar conversions
    // ═══════════════════════════════════════════════════════════════════════════

    /// Reinterpret an object/array literal (or a simple target) as an
    /// assignment pattern
    fn expression_to_pattern(&self, expr: &Expression) -> Result<Pattern, JsError> {
        match expr {
            Expression::Identifier(id) => {
                if self.ctx.strict {
                    self.validate_strict_binding(&id.name, id.span)?;
                }
                Ok(Pattern::Identifier(id.clone()))
            }
            Expression::Member(member) => Ok(Pattern::Expression(Box::new(Expression::Member(member.clone())))),
            Expression::Parenthesized(inner, _) if is_simple_target(inner) => self.expression_to_pattern(inner),
            Expression::Assignment(assign) if assign.operator == AssignmentOp::Assign => {
                let target = match &assign.target {
                    AssignmentTarget::Simple(target) => self.expression_to_pattern(target)?,
                    AssignmentTarget::Pattern(pattern) => pattern.clone(),
                };
                Ok(Pattern::Assignment(AssignmentPattern {
                    target: Box::new(target),
                    default: assign.value.clone(),
                    span: assign.span,
                }))
            }
            Expression::Object(obj) => {
                let mut properties = Vec::new();
                let mut rest = None;
                for (index, member) in obj.properties.iter().enumerate() {
                    match member {
                        ObjectMember::Property { key, value, span, .. } => {
                            properties.push(ObjectPatternProperty {
                                key: key.clone(),
                                value: self.expression_to_pattern(value)?,
                                span: *span,
                            });
                        }
                        ObjectMember::Spread(argument, span) => {
                            if index + 1 != obj.properties.len()
                                || !matches!(argument, Expression::Identifier(_) | Expression::Member(_))
                            {
                                return Err(JsError::syntax_error_at("Invalid rest element", *span));
                            }
                            rest = Some(Box::new(self.expression_to_pattern(argument)?));
                        }
                        ObjectMember::Method { span, .. } => {
                            return Err(JsError::syntax_error_at("Invalid destructuring assignment target", *span));
                        }
                    }
                }
                Ok(Pattern::Object(ObjectPattern {
                    properties,
                    rest,
                    span: obj.span,
                }))
            }
            Expression::Array(arr) => {
                let mut elements = Vec::new();
                let mut rest = None;
                for (index, element) in arr.elements.iter().enumerate() {
                    match element {
                        None => elements.push(None),
                        Some(ArrayElement::Expression(e)) => elements.push(Some(self.expression_to_pattern(e)?)),
                        Some(ArrayElement::Spread(e)) => {
                            if index + 1 != arr.elements.len() || matches!(e, Expression::Assignment(_)) {
                                return Err(JsError::syntax_error_at("Rest element must be last element", arr.span));
                            }
                            rest = Some(Box::new(self.expression_to_pattern(e)?));
                        }
                    }
                }
                Ok(Pattern::Array(ArrayPattern {
                    elements,
                    rest,
                    span: arr.span,
                }))
            }
            other => Err(JsError::syntax_error_at(
                "Invalid destructuring assignment target",
                other.span(),
            )),
        }
    }

    /// Identifier or (non-optional) member expression, possibly parenthesized
    fn expression_to_simple_target(&self, expr: Expression, context: &str) -> Result<Expression, JsError> {
        match expr {
            Expression::Identifier(id) => {
                if self.ctx.strict {
                    self.validate_strict_binding(&id.name, id.span)?;
                }
                Ok(Expression::Identifier(id))
            }
            Expression::Member(member) => Ok(Expression::Member(member)),
            Expression::Parenthesized(inner, span) => {
                if is_simple_target(&inner) {
                    self.expression_to_simple_target(*inner, context)
                } else {
                    Err(JsError::syntax_error_at(format!("Invalid left-hand side in {}", context), span))
                }
            }
            other => Err(JsError::syntax_error_at(
                format!("Invalid left-hand side in {}", context),
                other.span(),
            )),
        }
    }

    /// `{ a = 1 }` is only valid once reinterpreted as a pattern
    fn check_cover_initializer(&mut self) -> Result<(), JsError> {
        match self.cover_initializer.take() {
            Some(span) => Err(JsError::syntax_error_at("Invalid shorthand property initializer", span)),
            None => Ok(()),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Lookahead
    // ═══════════════════════════════════════════════════════════════════════════

    /// With the current token on `(`, whether the matching `)` is followed
    /// by `=>`
    fn arrow_after_parens(&mut self) -> bool {
        let checkpoint = self.lexer.checkpoint();
        let result = self.scan_balanced_parens();
        self.lexer.restore(checkpoint);
        result
    }

    fn scan_balanced_parens(&mut self) -> bool {
        // Open groups: `(`, `[`, `{` and template substitutions
        let mut stack: Vec<char> = vec!['('];
        loop {
            let token = self.lexer.next_token();
            match &token.kind {
                TokenKind::LParen => stack.push('('),
                TokenKind::LBracket => stack.push('['),
                TokenKind::LBrace => stack.push('{'),
                TokenKind::TemplateHead(_) => stack.push('`'),
                TokenKind::RParen | TokenKind::RBracket => {
                    stack.pop();
                    if stack.is_empty() {
                        let next = self.lexer.next_token();
                        return next.kind == TokenKind::Arrow && !self.lexer.had_newline_before();
                    }
                }
                TokenKind::RBrace => {
                    if stack.last() == Some(&'`') {
                        let continuation = self.lexer.rescan_template_continuation(token.span);
                        match continuation.kind {
                            TokenKind::TemplateMiddle(_) => {}
                            TokenKind::TemplateTail(_) => {
                                stack.pop();
                            }
                            _ => return false,
                        }
                    } else {
                        stack.pop();
                    }
                }
                TokenKind::Eof | TokenKind::Unterminated | TokenKind::Invalid(_) => return false,
                _ => {}
            }
        }
    }

    /// `async x =>` or `async (...) =>`
    fn async_arrow_ahead(&mut self) -> bool {
        let checkpoint = self.lexer.checkpoint();
        let next = self.lexer.next_token();
        let result = match next.kind {
            TokenKind::LParen => self.scan_balanced_parens(),
            TokenKind::Identifier(_) | TokenKind::Of | TokenKind::Static | TokenKind::Let | TokenKind::Yield => {
                !self.lexer.had_newline_before() && self.lexer.next_token().kind == TokenKind::Arrow
            }
            _ => false,
        };
        self.lexer.restore(checkpoint);
        result
    }

    /// `async function` with no line break in between
    fn async_function_ahead(&mut self) -> bool {
        let checkpoint = self.lexer.checkpoint();
        let next = self.lexer.next_token();
        let result = next.kind == TokenKind::Function && !self.lexer.had_newline_before();
        self.lexer.restore(checkpoint);
        result
    }

    /// `let` followed by a binding starts a declaration; otherwise `let` is
    /// an identifier (sloppy mode only)
    fn let_starts_declaration(&mut self) -> bool {
        if self.ctx.strict {
            return true;
        }
        matches!(
            self.peek_kind(),
            TokenKind::Identifier(_)
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Yield
                | TokenKind::Await
                | TokenKind::Async
                | TokenKind::Of
                | TokenKind::Static
                | TokenKind::Let
        )
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Identifiers and names
    // ═══════════════════════════════════════════════════════════════════════════

    /// Tokens that can act as an identifier in the current context
    fn check_identifier_like(&self) -> bool {
        match &self.current.kind {
            TokenKind::Identifier(_) | TokenKind::Async | TokenKind::Of => true,
            TokenKind::Let | TokenKind::Static => !self.ctx.strict,
            TokenKind::Yield => !self.ctx.strict && !self.ctx.is_generator,
            TokenKind::Await => !self.ctx.is_async && !self.ctx.in_static_block,
            _ => false,
        }
    }

    fn parse_binding_identifier(&mut self) -> Result<Identifier, JsError> {
        let id = self.parse_identifier()?;
        if self.ctx.strict {
            self.validate_strict_binding(&id.name, id.span)?;
        }
        Ok(id)
    }

    /// Identifier in expression position; records uses of `arguments`
    fn parse_identifier_reference(&mut self) -> Result<Identifier, JsError> {
        let id = self.parse_identifier()?;
        if id.name == "arguments" {
            if self.ctx.forbid_arguments {
                return Err(JsError::syntax_error_at(
                    "'arguments' is not allowed in class field initializer or static initialization block",
                    id.span,
                ));
            }
            self.ctx.uses_arguments = true;
        }
        Ok(id)
    }

    fn parse_identifier(&mut self) -> Result<Identifier, JsError> {
        if !self.check_identifier_like() {
            return Err(self.unexpected_token("identifier"));
        }
        let span = self.current.span;
        let name = match &self.current.kind {
            TokenKind::Identifier(name) => name.cheap_clone(),
            other => {
                let text = other.keyword_text().unwrap_or("");
                self.intern(text)
            }
        };
        self.advance();
        Ok(Identifier { name, span })
    }

    fn validate_strict_binding(&self, name: &JsString, span: Span) -> Result<(), JsError> {
        const STRICT_RESERVED: &[&str] = &[
            "eval",
            "arguments",
            "implements",
            "interface",
            "package",
            "private",
            "protected",
            "public",
            "static",
            "let",
            "yield",
        ];
        if STRICT_RESERVED.contains(&name.as_str()) {
            return Err(JsError::syntax_error_at(
                format!("Unexpected eval or arguments or reserved word '{}' in strict mode", name),
                span,
            ));
        }
        Ok(())
    }

    /// After `.`: any identifier or keyword
    fn parse_identifier_name(&mut self) -> Result<JsString, JsError> {
        let name = match &self.current.kind {
            TokenKind::Identifier(name) => name.cheap_clone(),
            other => match other.keyword_text() {
                Some(text) => self.intern(text),
                None => return Err(self.unexpected_token("property name")),
            },
        };
        self.advance();
        Ok(name)
    }

    /// Property name in object literals, classes and object patterns
    fn parse_property_name(&mut self) -> Result<PropertyName, JsError> {
        let key = match &self.current.kind {
            TokenKind::Identifier(name) => PropertyName::Identifier(name.cheap_clone()),
            TokenKind::String(s) => PropertyName::String(s.cheap_clone()),
            TokenKind::Number(n) => PropertyName::Number(*n),
            TokenKind::BigInt(digits) => PropertyName::String(digits.cheap_clone()),
            TokenKind::PrivateName(name) => {
                if self.private_scopes.is_empty() {
                    return Err(self.error("Private names are only valid in class bodies"));
                }
                PropertyName::Private(name.cheap_clone())
            }
            TokenKind::LBracket => {
                self.advance();
                let expr = self.with_in(|p| p.parse_assignment_expression())?;
                self.require_token(&TokenKind::RBracket)?;
                return Ok(PropertyName::Computed(Box::new(expr)));
            }
            other => match other.keyword_text() {
                Some(text) => {
                    let name = self.intern(text);
                    PropertyName::Identifier(name)
                }
                None => return Err(self.unexpected_token("property name")),
            },
        };
        self.advance();
        Ok(key)
    }

    fn reference_private(&mut self, name: &JsString, span: Span) -> Result<(), JsError> {
        match self.private_scopes.last_mut() {
            Some(scope) => {
                scope.referenced.push((name.cheap_clone(), span));
                Ok(())
            }
            None => Err(JsError::syntax_error_at(
                format!("Private field '#{}' must be declared in an enclosing class", name),
                span,
            )),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Token helpers
    // ═══════════════════════════════════════════════════════════════════════════

    fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.lexer.next_token());
    }

    fn require_token(&mut self, kind: &TokenKind) -> Result<(), JsError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected_token(&describe_token(kind)))
        }
    }

    fn expect_semicolon(&mut self) -> Result<(), JsError> {
        if self.match_token(&TokenKind::Semicolon) {
            return Ok(());
        }

        // ASI: accept if at end, before }, or after newline
        if self.is_at_end() || self.check(&TokenKind::RBrace) || self.lexer.had_newline_before() {
            return Ok(());
        }

        Err(self.unexpected_token("';'"))
    }

    /// `return`/`yield` take no argument when followed by these
    fn statement_ends_here(&self) -> bool {
        self.lexer.had_newline_before()
            || matches!(
                self.current.kind,
                TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
            )
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn check_contextual(&self, word: &str) -> bool {
        matches!(&self.current.kind, TokenKind::Identifier(s) if s == word)
    }

    fn peek_kind(&mut self) -> TokenKind {
        let checkpoint = self.lexer.checkpoint();
        let next = self.lexer.next_token();
        self.lexer.restore(checkpoint);
        next.kind
    }

    /// Check if the next token (after current) is of the given kind
    fn peek_is(&mut self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek_kind()) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    /// Run `f` with the `in` operator allowed again (inside brackets)
    fn with_in<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, JsError>) -> Result<T, JsError> {
        let saved = std::mem::replace(&mut self.no_in, false);
        let result = f(self);
        self.no_in = saved;
        result
    }

    fn span_from(&self, start: Span) -> Span {
        Span::new(start.start, self.previous.span.end.max(start.start), start.line, start.column)
    }

    fn error(&self, message: &str) -> JsError {
        JsError::syntax_error(message, self.current.span.line, self.current.span.column)
    }

    fn unexpected_token(&self, expected: &str) -> JsError {
        let message = match &self.current.kind {
            TokenKind::Eof => "Unexpected end of input".to_string(),
            TokenKind::Unterminated => "Unterminated literal or comment".to_string(),
            TokenKind::Invalid(c) => format!("Invalid or unexpected token '{}'", c),
            other => format!("Unexpected token {}, expected {}", describe_token(other), expected),
        };
        JsError::syntax_error(message, self.current.span.line, self.current.span.column)
    }

    fn current_binary_op(&self) -> Option<(BinaryOperator, u8)> {
        use BinaryOperator::{Binary, Logical};
        let op = match &self.current.kind {
            TokenKind::QuestionQuestion => (Logical(LogicalOp::NullishCoalescing), 1),
            TokenKind::PipePipe => (Logical(LogicalOp::Or), 2),
            TokenKind::AmpAmp => (Logical(LogicalOp::And), 3),
            TokenKind::Pipe => (Binary(BinaryOp::BitOr), 4),
            TokenKind::Caret => (Binary(BinaryOp::BitXor), 5),
            TokenKind::Amp => (Binary(BinaryOp::BitAnd), 6),
            TokenKind::EqEq => (Binary(BinaryOp::Eq), 7),
            TokenKind::BangEq => (Binary(BinaryOp::NotEq), 7),
            TokenKind::EqEqEq => (Binary(BinaryOp::StrictEq), 7),
            TokenKind::BangEqEq => (Binary(BinaryOp::StrictNotEq), 7),
            TokenKind::Lt => (Binary(BinaryOp::Lt), PREC_RELATIONAL),
            TokenKind::LtEq => (Binary(BinaryOp::LtEq), PREC_RELATIONAL),
            TokenKind::Gt => (Binary(BinaryOp::Gt), PREC_RELATIONAL),
            TokenKind::GtEq => (Binary(BinaryOp::GtEq), PREC_RELATIONAL),
            TokenKind::Instanceof => (Binary(BinaryOp::Instanceof), PREC_RELATIONAL),
            TokenKind::In if !self.no_in => (Binary(BinaryOp::In), PREC_RELATIONAL),
            TokenKind::LtLt => (Binary(BinaryOp::LShift), 9),
            TokenKind::GtGt => (Binary(BinaryOp::RShift), 9),
            TokenKind::GtGtGt => (Binary(BinaryOp::URShift), 9),
            TokenKind::Plus => (Binary(BinaryOp::Add), 10),
            TokenKind::Minus => (Binary(BinaryOp::Sub), 10),
            TokenKind::Star => (Binary(BinaryOp::Mul), 11),
            TokenKind::Slash => (Binary(BinaryOp::Div), 11),
            TokenKind::Percent => (Binary(BinaryOp::Mod), 11),
            TokenKind::StarStar => (Binary(BinaryOp::Exp), 12),
            _ => return None,
        };
        Some(op)
    }

    fn current_unary_op(&self) -> Option<UnaryOp> {
        match &self.current.kind {
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Delete => Some(UnaryOp::Delete),
            _ => None,
        }
    }

    fn current_update_op(&self) -> Option<UpdateOp> {
        match &self.current.kind {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        }
    }

    fn current_assignment_op(&self) -> Option<AssignmentOp> {
        match &self.current.kind {
            TokenKind::Eq => Some(AssignmentOp::Assign),
            TokenKind::PlusEq => Some(AssignmentOp::AddAssign),
            TokenKind::MinusEq => Some(AssignmentOp::SubAssign),
            TokenKind::StarEq => Some(AssignmentOp::MulAssign),
            TokenKind::SlashEq => Some(AssignmentOp::DivAssign),
            TokenKind::PercentEq => Some(AssignmentOp::ModAssign),
            TokenKind::StarStarEq => Some(AssignmentOp::ExpAssign),
            TokenKind::AmpEq => Some(AssignmentOp::BitAndAssign),
            TokenKind::PipeEq => Some(AssignmentOp::BitOrAssign),
            TokenKind::CaretEq => Some(AssignmentOp::BitXorAssign),
            TokenKind::LtLtEq => Some(AssignmentOp::LShiftAssign),
            TokenKind::GtGtEq => Some(AssignmentOp::RShiftAssign),
            TokenKind::GtGtGtEq => Some(AssignmentOp::URShiftAssign),
            TokenKind::AmpAmpEq => Some(AssignmentOp::AndAssign),
            TokenKind::PipePipeEq => Some(AssignmentOp::OrAssign),
            TokenKind::QuestionQuestionEq => Some(AssignmentOp::NullishAssign),
            _ => None,
        }
    }
}

const PREC_RELATIONAL: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOperator {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

fn is_simple_parameter_list(params: &[Pattern], rest: Option<&Pattern>) -> bool {
    rest.is_none() && params.iter().all(|p| matches!(p, Pattern::Identifier(_)))
}

/// A `let`/`const` loop head may not share a name with a `var` in the body
fn check_loop_head_collision(head_names: &[JsString], body: &Statement) -> Result<(), JsError> {
    match hoist::var_declared_names(body).into_iter().find(|v| head_names.contains(&v.name)) {
        Some(clash) => Err(JsError::syntax_error_at(
            format!("Identifier '{}' has already been declared", clash.name),
            clash.span,
        )),
        None => Ok(()),
    }
}

fn unparenthesize(expr: &Expression) -> &Expression {
    match expr {
        Expression::Parenthesized(inner, _) => unparenthesize(inner),
        other => other,
    }
}

fn is_simple_target(expr: &Expression) -> bool {
    match expr {
        Expression::Identifier(_) | Expression::Member(_) => true,
        Expression::Parenthesized(inner, _) => is_simple_target(inner),
        _ => false,
    }
}

fn property_name_is(key: &PropertyName, name: &str) -> bool {
    match key {
        PropertyName::Identifier(s) | PropertyName::String(s) => s == name,
        _ => false,
    }
}

fn describe_token(kind: &TokenKind) -> String {
    if let Some(text) = kind.keyword_text() {
        return format!("'{}'", text);
    }
    let text = match kind {
        TokenKind::Identifier(name) => return format!("identifier '{}'", name),
        TokenKind::PrivateName(name) => return format!("'#{}'", name),
        TokenKind::Number(n) => return format!("number {}", crate::value::number_to_string(*n)),
        TokenKind::String(_) => "string",
        TokenKind::BigInt(_) => "bigint",
        TokenKind::TemplateHead(_)
        | TokenKind::TemplateMiddle(_)
        | TokenKind::TemplateTail(_)
        | TokenKind::TemplateNoSub(_) => "template",
        TokenKind::LParen => "'('",
        TokenKind::RParen => "')'",
        TokenKind::LBrace => "'{'",
        TokenKind::RBrace => "'}'",
        TokenKind::LBracket => "'['",
        TokenKind::RBracket => "']'",
        TokenKind::Semicolon => "';'",
        TokenKind::Colon => "':'",
        TokenKind::Comma => "','",
        TokenKind::Dot => "'.'",
        TokenKind::DotDotDot => "'...'",
        TokenKind::Arrow => "'=>'",
        TokenKind::Eq => "'='",
        TokenKind::Eof => "end of input",
        other => return format!("{:?}", other),
    };
    text.to_string()
}
