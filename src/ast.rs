//! Abstract Syntax Tree types for ECMAScript scripts
//!
//! The tree is immutable once the parser returns it. Function and class
//! nodes sit behind `Rc` so closures can keep their code alive after the
//! `Program` that produced them is dropped.

use std::rc::Rc;

use crate::lexer::Span;
use crate::value::JsString;

/// A complete script
#[derive(Debug, Clone)]
pub struct Program {
    pub body: Vec<Statement>,
    pub scope: Rc<ScopeDeclarations>,
    /// Script begins with a `"use strict"` directive
    pub strict: bool,
    pub span: Span,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Declaration lists
// ═══════════════════════════════════════════════════════════════════════════════

/// Names a scope declares, computed once by `hoist` when the scope is parsed
#[derive(Debug, Clone, Default)]
pub struct ScopeDeclarations {
    /// `let`/`const`/`class` (and, in blocks, function) declarations
    pub lexical: Vec<LexicalName>,
    /// `var` names. For function and script scopes these are the bindings to
    /// create; for blocks they only feed the collision check.
    pub var_names: Vec<VarName>,
    /// Function declarations initialized on scope entry, in source order
    pub functions: Vec<Rc<FunctionNode>>,
    /// Sloppy-mode block functions that also get a function-level var binding
    pub annex_b_names: Vec<JsString>,
}

#[derive(Debug, Clone)]
pub struct LexicalName {
    pub name: JsString,
    pub is_const: bool,
    /// Function declared directly in a block
    pub is_function: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VarName {
    pub name: JsString,
    pub span: Span,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub enum Statement {
    // Declarations
    VariableDeclaration(VariableDeclaration),
    FunctionDeclaration(Rc<FunctionNode>),
    ClassDeclaration(Rc<ClassNode>),

    // Control Flow
    Block(BlockStatement),
    If(IfStatement),
    Switch(SwitchStatement),
    For(ForStatement),
    ForIn(ForInStatement),
    ForOf(ForOfStatement),
    While(WhileStatement),
    DoWhile(DoWhileStatement),
    Try(TryStatement),

    // Jump
    Return(ReturnStatement),
    Break(BreakStatement),
    Continue(ContinueStatement),
    Throw(ThrowStatement),

    // Other
    Expression(ExpressionStatement),
    Labeled(LabeledStatement),
    Empty(Span),
    Debugger(Span),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::VariableDeclaration(v) => v.span,
            Statement::FunctionDeclaration(f) => f.span,
            Statement::ClassDeclaration(c) => c.span,
            Statement::Block(b) => b.span,
            Statement::If(i) => i.span,
            Statement::Switch(s) => s.span,
            Statement::For(f) => f.span,
            Statement::ForIn(f) => f.span,
            Statement::ForOf(f) => f.span,
            Statement::While(w) => w.span,
            Statement::DoWhile(d) => d.span,
            Statement::Try(t) => t.span,
            Statement::Return(r) => r.span,
            Statement::Break(b) => b.span,
            Statement::Continue(c) => c.span,
            Statement::Throw(t) => t.span,
            Statement::Expression(e) => e.span,
            Statement::Labeled(l) => l.span,
            Statement::Empty(span) | Statement::Debugger(span) => *span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BlockStatement {
    pub body: Vec<Statement>,
    pub scope: Rc<ScopeDeclarations>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub kind: VariableKind,
    pub declarations: Vec<VariableDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Let,
    Const,
    Var,
}

impl VariableKind {
    pub fn is_lexical(self) -> bool {
        !matches!(self, VariableKind::Var)
    }
}

#[derive(Debug, Clone)]
pub struct VariableDeclarator {
    pub id: Pattern,
    pub init: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
    /// Declarations of the case block, which forms one scope
    pub scope: Rc<ScopeDeclarations>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub test: Option<Expression>, // None for default
    pub consequent: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ForInit {
    Variable(VariableDeclaration),
    Expression(Expression),
}

#[derive(Debug, Clone)]
pub struct ForInStatement {
    pub left: ForInOfLeft,
    pub right: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForOfStatement {
    pub left: ForInOfLeft,
    pub right: Expression,
    pub body: Box<Statement>,
    pub await_: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ForInOfLeft {
    /// `for (let x of ...)`: a single declarator without initializer
    Variable(VariableKind, Pattern),
    Pattern(Pattern),
}

#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub test: Expression,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TryStatement {
    pub block: BlockStatement,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<BlockStatement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: BlockStatement,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub argument: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BreakStatement {
    pub label: Option<JsString>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ContinueStatement {
    pub label: Option<JsString>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ThrowStatement {
    pub argument: Expression,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct LabeledStatement {
    pub label: JsString,
    pub body: Box<Statement>,
    pub span: Span,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Functions and classes
// ═══════════════════════════════════════════════════════════════════════════════

/// Syntactic form a function was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionFlavor {
    Normal,
    Arrow,
    Method,
    Getter,
    Setter,
    ClassConstructor { derived: bool },
    /// Class field initializer, wrapped so it runs with the instance as `this`
    FieldInitializer,
    StaticBlock,
}

#[derive(Debug, Clone)]
pub struct FunctionNode {
    pub name: Option<Identifier>,
    /// Parameters before the rest element; defaults are `Pattern::Assignment`
    pub params: Vec<Pattern>,
    pub rest: Option<Pattern>,
    pub body: FunctionBody,
    pub flavor: FunctionFlavor,
    pub is_async: bool,
    pub is_generator: bool,
    pub strict: bool,
    /// No defaults, rest or destructuring in the parameter list
    pub simple_params: bool,
    /// Body or parameters mention `arguments` outside nested non-arrow functions
    pub uses_arguments: bool,
    /// Bound names of all parameters, in order
    pub param_names: Vec<JsString>,
    /// Number of parameters before the first default or rest
    pub length: u32,
    pub scope: Rc<ScopeDeclarations>,
    /// Source text, for `Function.prototype.toString`
    pub source: JsString,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Block(Vec<Statement>),
    /// Concise arrow body or field initializer
    Expression(Box<Expression>),
}

#[derive(Debug, Clone)]
pub struct ClassNode {
    pub name: Option<Identifier>,
    pub super_class: Option<Box<Expression>>,
    /// Explicit constructor or a synthesized default one
    pub constructor: Rc<FunctionNode>,
    pub members: Vec<ClassMember>,
    pub source: JsString,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ClassMember {
    Method {
        key: PropertyName,
        kind: MethodKind,
        is_static: bool,
        function: Rc<FunctionNode>,
        span: Span,
    },
    Field {
        key: PropertyName,
        is_static: bool,
        initializer: Option<Rc<FunctionNode>>,
        span: Span,
    },
    StaticBlock {
        body: Rc<FunctionNode>,
        span: Span,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Get,
    Set,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub enum Expression {
    // Literals
    Literal(Literal),
    Array(ArrayExpression),
    Object(ObjectExpression),
    Function(Rc<FunctionNode>),
    ArrowFunction(Rc<FunctionNode>),
    Class(Rc<ClassNode>),
    Template(TemplateLiteral),
    TaggedTemplate(TaggedTemplateExpression),

    // Identifiers
    Identifier(Identifier),
    This(Span),
    /// Only valid as the object of a member access or the callee of a call
    Super(Span),
    NewTarget(Span),

    // Operations
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Logical(LogicalExpression),
    Conditional(ConditionalExpression),
    Assignment(AssignmentExpression),
    Update(UpdateExpression),
    Sequence(SequenceExpression),
    /// `#x in obj`
    PrivateIn(PrivateInExpression),

    // Access
    Member(MemberExpression),
    /// Boundary of an optional chain: a nullish `?.` link short-circuits to here
    OptionalChain(OptionalChainExpression),
    Call(CallExpression),
    New(NewExpression),

    // Suspension points
    Yield(YieldExpression),
    Await(AwaitExpression),

    Parenthesized(Box<Expression>, Span),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Literal(l) => l.span,
            Expression::Array(a) => a.span,
            Expression::Object(o) => o.span,
            Expression::Function(f) | Expression::ArrowFunction(f) => f.span,
            Expression::Class(c) => c.span,
            Expression::Template(t) => t.span,
            Expression::TaggedTemplate(t) => t.span,
            Expression::Identifier(i) => i.span,
            Expression::This(s) | Expression::Super(s) | Expression::NewTarget(s) => *s,
            Expression::Unary(u) => u.span,
            Expression::Binary(b) => b.span,
            Expression::Logical(l) => l.span,
            Expression::Conditional(c) => c.span,
            Expression::Assignment(a) => a.span,
            Expression::Update(u) => u.span,
            Expression::Sequence(s) => s.span,
            Expression::PrivateIn(p) => p.span,
            Expression::Member(m) => m.span,
            Expression::OptionalChain(o) => o.span,
            Expression::Call(c) => c.span,
            Expression::New(n) => n.span,
            Expression::Yield(y) => y.span,
            Expression::Await(a) => a.span,
            Expression::Parenthesized(_, s) => *s,
        }
    }

    /// Anonymous function or class definition, which takes its name from
    /// the binding or key it is assigned to
    pub fn is_anonymous_function_definition(&self) -> bool {
        match self {
            Expression::Function(f) => f.name.is_none(),
            Expression::ArrowFunction(_) => true,
            Expression::Class(c) => c.name.is_none(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    /// Decimal digits; parsed into a `BigInt` when evaluated
    BigInt(JsString),
}

#[derive(Debug, Clone)]
pub struct Identifier {
    pub name: JsString,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ArrayExpression {
    /// `None` marks a hole (`[1, , 3]`)
    pub elements: Vec<Option<ArrayElement>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ArrayElement {
    Expression(Expression),
    Spread(Expression),
}

#[derive(Debug, Clone)]
pub struct ObjectExpression {
    pub properties: Vec<ObjectMember>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ObjectMember {
    Property {
        key: PropertyName,
        value: Expression,
        shorthand: bool,
        span: Span,
    },
    Method {
        key: PropertyName,
        kind: MethodKind,
        function: Rc<FunctionNode>,
        span: Span,
    },
    Spread(Expression, Span),
}

/// Property name in object literals, classes and object patterns
#[derive(Debug, Clone)]
pub enum PropertyName {
    Identifier(JsString),
    String(JsString),
    Number(f64),
    Computed(Box<Expression>),
    /// `#name` (classes only)
    Private(JsString),
}

#[derive(Debug, Clone)]
pub struct TemplateLiteral {
    pub quasis: Vec<TemplateQuasi>,
    pub expressions: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TemplateQuasi {
    /// `None` when the text holds an invalid escape (tagged templates only)
    pub cooked: Option<JsString>,
    pub raw: JsString,
}

#[derive(Debug, Clone)]
pub struct TaggedTemplateExpression {
    pub tag: Box<Expression>,
    /// Shared so the template object can be cached per call site
    pub quasi: Rc<TemplateLiteral>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct UnaryExpression {
    pub operator: UnaryOp,
    pub argument: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,  // -
    Plus,   // +
    Not,    // !
    BitNot, // ~
    Typeof, // typeof
    Void,   // void
    Delete, // delete
}

#[derive(Debug, Clone)]
pub struct BinaryExpression {
    pub operator: BinaryOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    Mod, // %
    Exp, // **

    // Comparison
    Eq,          // ==
    NotEq,       // !=
    StrictEq,    // ===
    StrictNotEq, // !==
    Lt,          // <
    LtEq,        // <=
    Gt,          // >
    GtEq,        // >=

    // Bitwise
    BitAnd,  // &
    BitOr,   // |
    BitXor,  // ^
    LShift,  // <<
    RShift,  // >>
    URShift, // >>>

    // Other
    In,         // in
    Instanceof, // instanceof
}

#[derive(Debug, Clone)]
pub struct LogicalExpression {
    pub operator: LogicalOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,               // &&
    Or,                // ||
    NullishCoalescing, // ??
}

#[derive(Debug, Clone)]
pub struct ConditionalExpression {
    pub test: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct AssignmentExpression {
    pub operator: AssignmentOp,
    pub target: AssignmentTarget,
    pub value: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum AssignmentTarget {
    /// Identifier or member expression
    Simple(Box<Expression>),
    /// Destructuring, only with `=`
    Pattern(Pattern),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOp {
    Assign,        // =
    AddAssign,     // +=
    SubAssign,     // -=
    MulAssign,     // *=
    DivAssign,     // /=
    ModAssign,     // %=
    ExpAssign,     // **=
    BitAndAssign,  // &=
    BitOrAssign,   // |=
    BitXorAssign,  // ^=
    LShiftAssign,  // <<=
    RShiftAssign,  // >>=
    URShiftAssign, // >>>=
    AndAssign,     // &&=
    OrAssign,      // ||=
    NullishAssign, // ??=
}

impl AssignmentOp {
    /// Binary operator a compound assignment applies
    pub fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            AssignmentOp::AddAssign => BinaryOp::Add,
            AssignmentOp::SubAssign => BinaryOp::Sub,
            AssignmentOp::MulAssign => BinaryOp::Mul,
            AssignmentOp::DivAssign => BinaryOp::Div,
            AssignmentOp::ModAssign => BinaryOp::Mod,
            AssignmentOp::ExpAssign => BinaryOp::Exp,
            AssignmentOp::BitAndAssign => BinaryOp::BitAnd,
            AssignmentOp::BitOrAssign => BinaryOp::BitOr,
            AssignmentOp::BitXorAssign => BinaryOp::BitXor,
            AssignmentOp::LShiftAssign => BinaryOp::LShift,
            AssignmentOp::RShiftAssign => BinaryOp::RShift,
            AssignmentOp::URShiftAssign => BinaryOp::URShift,
            AssignmentOp::Assign
            | AssignmentOp::AndAssign
            | AssignmentOp::OrAssign
            | AssignmentOp::NullishAssign => return None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct UpdateExpression {
    pub operator: UpdateOp,
    pub argument: Box<Expression>,
    pub prefix: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment, // ++
    Decrement, // --
}

#[derive(Debug, Clone)]
pub struct SequenceExpression {
    pub expressions: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct PrivateInExpression {
    pub name: JsString,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: MemberProperty,
    /// Written as `?.`
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum MemberProperty {
    Identifier(JsString),
    Expression(Box<Expression>),
    PrivateName(JsString),
}

#[derive(Debug, Clone)]
pub struct OptionalChainExpression {
    pub base: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Argument>,
    /// Written as `?.(`
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Argument {
    Expression(Expression),
    Spread(Expression),
}

#[derive(Debug, Clone)]
pub struct NewExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Argument>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct YieldExpression {
    pub argument: Option<Box<Expression>>,
    pub delegate: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct AwaitExpression {
    pub argument: Box<Expression>,
    pub span: Span,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Patterns
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub enum Pattern {
    Identifier(Identifier),
    Object(ObjectPattern),
    Array(ArrayPattern),
    /// Target with a default value
    Assignment(AssignmentPattern),
    /// Member-expression target, only in assignment patterns
    Expression(Box<Expression>),
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Identifier(i) => i.span,
            Pattern::Object(o) => o.span,
            Pattern::Array(a) => a.span,
            Pattern::Assignment(a) => a.span,
            Pattern::Expression(e) => e.span(),
        }
    }

    /// Names this pattern binds, in source order
    pub fn bound_names(&self, out: &mut Vec<JsString>) {
        match self {
            Pattern::Identifier(id) => out.push(id.name.clone()),
            Pattern::Object(obj) => {
                for prop in &obj.properties {
                    prop.value.bound_names(out);
                }
                if let Some(rest) = &obj.rest {
                    rest.bound_names(out);
                }
            }
            Pattern::Array(arr) => {
                for elem in arr.elements.iter().flatten() {
                    elem.bound_names(out);
                }
                if let Some(rest) = &arr.rest {
                    rest.bound_names(out);
                }
            }
            Pattern::Assignment(assign) => assign.target.bound_names(out),
            Pattern::Expression(_) => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObjectPattern {
    pub properties: Vec<ObjectPatternProperty>,
    pub rest: Option<Box<Pattern>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ObjectPatternProperty {
    pub key: PropertyName,
    pub value: Pattern,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ArrayPattern {
    pub elements: Vec<Option<Pattern>>,
    pub rest: Option<Box<Pattern>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct AssignmentPattern {
    pub target: Box<Pattern>,
    pub default: Box<Expression>,
    pub span: Span,
}
