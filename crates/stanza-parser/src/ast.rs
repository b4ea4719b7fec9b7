//! AST node definitions.
//!
//! Nodes carry byte spans throughout; declared types are parsed straight
//! into `stanza_types::Union` values so downstream crates never touch the
//! annotation syntax.

use crate::docblock::Docblock;
use stanza_common::Span;
use stanza_types::Union;

#[derive(Debug, Clone)]
pub struct FileAst {
    pub path: String,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone)]
pub enum Declaration {
    Function(FunctionDecl),
    ClassLike(ClassDecl),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClassLikeKind {
    Class,
    Interface,
    Trait,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub kind: ClassLikeKind,
    pub parent: Option<String>,
    pub is_final: bool,
    pub is_abstract: bool,
    /// Trait names pulled in with `use X;` inside the body.
    pub uses: Vec<String>,
    pub properties: Vec<PropertyDecl>,
    pub methods: Vec<FunctionDecl>,
    pub docblock: Option<Docblock>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    /// From a preceding `@var` docblock tag.
    pub ty: Option<Union>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Option<Union>,
    pub variadic: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    /// Name as written (method ids are compared lower-cased elsewhere).
    pub name: String,
    pub params: Vec<Param>,
    /// Native signature return type (`: T`).
    pub return_type: Option<Union>,
    pub return_type_span: Option<Span>,
    /// `None` for abstract and interface methods.
    pub body: Option<Vec<Stmt>>,
    pub docblock: Option<Docblock>,
    pub visibility: Visibility,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_static: bool,
    pub variadic: bool,
    pub span: Span,
    pub name_span: Span,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub class: String,
    pub var: Option<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Return {
        expr: Option<Expr>,
        span: Span,
    },
    Throw {
        expr: Expr,
        span: Span,
    },
    Expression(Expr),
    If {
        cond: Expr,
        then: Vec<Stmt>,
        elseifs: Vec<(Expr, Vec<Stmt>)>,
        r#else: Option<Vec<Stmt>>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    DoWhile {
        body: Vec<Stmt>,
        cond: Expr,
        span: Span,
    },
    Switch {
        subject: Expr,
        cases: Vec<SwitchCase>,
        span: Span,
    },
    Try {
        body: Vec<Stmt>,
        catches: Vec<CatchClause>,
        finally: Option<Vec<Stmt>>,
        span: Span,
    },
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Return { span, .. }
            | Stmt::Throw { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::DoWhile { span, .. }
            | Stmt::Switch { span, .. }
            | Stmt::Try { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span } => *span,
            Stmt::Expression(expr) => expr.span(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Concat,
    And,
    Or,
    Eq,
    Identical,
    NotEq,
    NotIdentical,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone)]
pub enum Expr {
    IntLit(i64, Span),
    FloatLit(f64, Span),
    StringLit(String, Span),
    BoolLit(bool, Span),
    NullLit(Span),
    Variable(String, Span),
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    PropertyFetch {
        target: Box<Expr>,
        name: String,
        span: Span,
    },
    MethodCall {
        target: Box<Expr>,
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    FunctionCall {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    New {
        class: String,
        args: Vec<Expr>,
        span: Span,
    },
    Closure(Box<ClosureExpr>),
    Ternary {
        cond: Box<Expr>,
        then: Option<Box<Expr>>,
        r#else: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
        span: Span,
    },
    Yield {
        value: Option<Box<Expr>>,
        span: Span,
    },
}

#[derive(Debug, Clone)]
pub struct ClosureExpr {
    pub params: Vec<Param>,
    pub uses: Vec<String>,
    pub return_type: Option<Union>,
    pub return_type_span: Option<Span>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::IntLit(_, span)
            | Expr::FloatLit(_, span)
            | Expr::StringLit(_, span)
            | Expr::BoolLit(_, span)
            | Expr::NullLit(span)
            | Expr::Variable(_, span)
            | Expr::Assign { span, .. }
            | Expr::PropertyFetch { span, .. }
            | Expr::MethodCall { span, .. }
            | Expr::FunctionCall { span, .. }
            | Expr::New { span, .. }
            | Expr::Ternary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Yield { span, .. } => *span,
            Expr::Closure(closure) => closure.span,
        }
    }
}
