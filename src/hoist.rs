//! Declaration collection for hoisting
//!
//! The parser calls into this module once per scope body to produce the
//! `ScopeDeclarations` the evaluator instantiates on scope entry. The walk
//! never descends into nested function bodies, which are separate scopes.

use rustc_hash::FxHashSet;

use crate::ast::{
    ForInOfLeft, ForInit, LexicalName, Pattern, ScopeDeclarations, Statement, VarName,
    VariableDeclaration, VariableKind,
};
use crate::lexer::Span;
use crate::value::{CheapClone, JsString};

/// Declarations of a function body or a script.
///
/// `excluded_names` are parameter names; sloppy block functions sharing one
/// of them do not get a var binding.
pub fn function_scope(
    body: &[Statement],
    strict: bool,
    excluded_names: &[JsString],
) -> ScopeDeclarations {
    let mut scope = ScopeDeclarations::default();
    let mut seen_vars: FxHashSet<JsString> = FxHashSet::default();

    for stmt in body {
        collect_top_level(stmt, &mut scope, &mut seen_vars);
    }

    let mut vars = Vec::new();
    for stmt in body {
        collect_vars(stmt, &mut vars);
    }
    for var in vars {
        if seen_vars.insert(var.name.cheap_clone()) {
            scope.var_names.push(var);
        }
    }

    if !strict {
        let lexical: FxHashSet<&JsString> = scope.lexical.iter().map(|l| &l.name).collect();
        let mut nested = Vec::new();
        for stmt in body {
            collect_block_functions(stmt, &mut nested, false);
        }
        let mut annex_b = Vec::new();
        for name in nested {
            if lexical.contains(&name) || excluded_names.contains(&name) || annex_b.contains(&name)
            {
                continue;
            }
            annex_b.push(name);
        }
        scope.annex_b_names = annex_b;
    }

    scope
}

/// Declarations of a block or a switch case block. Function declarations are
/// lexical here; `var_names` lists vars declared anywhere inside the block
/// and is used only to detect collisions.
pub fn block_scope<'a>(body: impl IntoIterator<Item = &'a Statement>) -> ScopeDeclarations {
    let mut scope = ScopeDeclarations::default();
    let mut vars = Vec::new();

    for stmt in body {
        match stmt {
            Statement::FunctionDeclaration(func) => {
                if let Some(id) = &func.name {
                    scope.lexical.push(LexicalName {
                        name: id.name.cheap_clone(),
                        is_const: false,
                        is_function: true,
                        span: func.span,
                    });
                }
                scope.functions.push(func.cheap_clone());
            }
            Statement::VariableDeclaration(decl) if decl.kind.is_lexical() => {
                push_lexical(decl, &mut scope.lexical);
            }
            Statement::ClassDeclaration(class) => {
                if let Some(id) = &class.name {
                    scope.lexical.push(LexicalName {
                        name: id.name.cheap_clone(),
                        is_const: false,
                        is_function: false,
                        span: class.span,
                    });
                }
            }
            _ => {}
        }
        collect_vars(stmt, &mut vars);
    }

    scope.var_names = vars;
    scope
}

/// Top-level declarations of a function or script body. Labelled function
/// declarations count as top level.
fn collect_top_level(
    stmt: &Statement,
    scope: &mut ScopeDeclarations,
    seen_vars: &mut FxHashSet<JsString>,
) {
    match stmt {
        Statement::FunctionDeclaration(func) => {
            if let Some(id) = &func.name {
                if seen_vars.insert(id.name.cheap_clone()) {
                    scope.var_names.push(VarName {
                        name: id.name.cheap_clone(),
                        span: func.span,
                    });
                }
            }
            scope.functions.push(func.cheap_clone());
        }
        Statement::Labeled(labeled) => collect_top_level(&labeled.body, scope, seen_vars),
        Statement::VariableDeclaration(decl) if decl.kind.is_lexical() => {
            push_lexical(decl, &mut scope.lexical);
        }
        Statement::ClassDeclaration(class) => {
            if let Some(id) = &class.name {
                scope.lexical.push(LexicalName {
                    name: id.name.cheap_clone(),
                    is_const: false,
                    is_function: false,
                    span: class.span,
                });
            }
        }
        _ => {}
    }
}

fn push_lexical(decl: &VariableDeclaration, out: &mut Vec<LexicalName>) {
    let mut names = Vec::new();
    for declarator in &decl.declarations {
        declarator.id.bound_names(&mut names);
        for name in names.drain(..) {
            out.push(LexicalName {
                name,
                is_const: decl.kind == VariableKind::Const,
                is_function: false,
                span: declarator.span,
            });
        }
    }
}

fn push_var_pattern(pattern: &Pattern, span: Span, out: &mut Vec<VarName>) {
    let mut names = Vec::new();
    pattern.bound_names(&mut names);
    out.extend(names.into_iter().map(|name| VarName { name, span }));
}

fn push_var_decl(decl: &VariableDeclaration, out: &mut Vec<VarName>) {
    if decl.kind != VariableKind::Var {
        return;
    }
    for declarator in &decl.declarations {
        push_var_pattern(&declarator.id, declarator.span, out);
    }
}

/// Var-declared names of a single statement, such as a loop body
pub fn var_declared_names(stmt: &Statement) -> Vec<VarName> {
    let mut out = Vec::new();
    collect_vars(stmt, &mut out);
    out
}

/// `var` declarations anywhere in `stmt` outside nested functions
fn collect_vars(stmt: &Statement, out: &mut Vec<VarName>) {
    match stmt {
        Statement::VariableDeclaration(decl) => push_var_decl(decl, out),
        Statement::Block(block) => {
            for s in &block.body {
                collect_vars(s, out);
            }
        }
        Statement::If(if_stmt) => {
            collect_vars(&if_stmt.consequent, out);
            if let Some(alt) = &if_stmt.alternate {
                collect_vars(alt, out);
            }
        }
        Statement::While(while_stmt) => collect_vars(&while_stmt.body, out),
        Statement::DoWhile(do_while) => collect_vars(&do_while.body, out),
        Statement::For(for_stmt) => {
            if let Some(ForInit::Variable(decl)) = &for_stmt.init {
                push_var_decl(decl, out);
            }
            collect_vars(&for_stmt.body, out);
        }
        Statement::ForIn(for_in) => {
            if let ForInOfLeft::Variable(VariableKind::Var, pattern) = &for_in.left {
                push_var_pattern(pattern, for_in.span, out);
            }
            collect_vars(&for_in.body, out);
        }
        Statement::ForOf(for_of) => {
            if let ForInOfLeft::Variable(VariableKind::Var, pattern) = &for_of.left {
                push_var_pattern(pattern, for_of.span, out);
            }
            collect_vars(&for_of.body, out);
        }
        Statement::Switch(switch_stmt) => {
            for case in &switch_stmt.cases {
                for s in &case.consequent {
                    collect_vars(s, out);
                }
            }
        }
        Statement::Try(try_stmt) => {
            for s in &try_stmt.block.body {
                collect_vars(s, out);
            }
            if let Some(handler) = &try_stmt.handler {
                for s in &handler.body.body {
                    collect_vars(s, out);
                }
            }
            if let Some(finalizer) = &try_stmt.finalizer {
                for s in &finalizer.body {
                    collect_vars(s, out);
                }
            }
        }
        Statement::Labeled(labeled) => collect_vars(&labeled.body, out),
        Statement::FunctionDeclaration(_)
        | Statement::ClassDeclaration(_)
        | Statement::Expression(_)
        | Statement::Return(_)
        | Statement::Break(_)
        | Statement::Continue(_)
        | Statement::Throw(_)
        | Statement::Empty(_)
        | Statement::Debugger(_) => {}
    }
}

/// Names of function declarations nested in blocks (not at the top level)
fn collect_block_functions(stmt: &Statement, out: &mut Vec<JsString>, in_block: bool) {
    let walk = |stmts: &[Statement], out: &mut Vec<JsString>| {
        for s in stmts {
            collect_block_functions(s, out, true);
        }
    };
    match stmt {
        Statement::FunctionDeclaration(func) if in_block => {
            if let Some(id) = &func.name {
                out.push(id.name.cheap_clone());
            }
        }
        Statement::Block(block) => walk(&block.body, out),
        Statement::If(if_stmt) => {
            collect_block_functions(&if_stmt.consequent, out, in_block);
            if let Some(alt) = &if_stmt.alternate {
                collect_block_functions(alt, out, in_block);
            }
        }
        Statement::While(s) => collect_block_functions(&s.body, out, in_block),
        Statement::DoWhile(s) => collect_block_functions(&s.body, out, in_block),
        Statement::For(s) => collect_block_functions(&s.body, out, in_block),
        Statement::ForIn(s) => collect_block_functions(&s.body, out, in_block),
        Statement::ForOf(s) => collect_block_functions(&s.body, out, in_block),
        Statement::Labeled(s) => collect_block_functions(&s.body, out, in_block),
        Statement::Switch(switch_stmt) => {
            for case in &switch_stmt.cases {
                walk(&case.consequent, out);
            }
        }
        Statement::Try(try_stmt) => {
            walk(&try_stmt.block.body, out);
            if let Some(handler) = &try_stmt.handler {
                walk(&handler.body.body, out);
            }
            if let Some(finalizer) = &try_stmt.finalizer {
                walk(&finalizer.body, out);
            }
        }
        _ => {}
    }
}
