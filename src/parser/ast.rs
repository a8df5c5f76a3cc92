use crate::span::Span;
use std::fmt;
use std::rc::Rc;

/// A fully parsed source file. Immutable once produced; the interpreter
/// never mutates nodes, so function bodies can be shared via `Rc`.
#[derive(Debug, Clone)]
pub struct Program {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    /// `name = expr` — declares on first sight, reassigns afterwards.
    Var { name: String, value: Expr },
    If {
        condition: Expr,
        body: Vec<Stmt>,
        alternate: Option<Vec<Stmt>>,
    },
    /// `loop cond do ... end` — while-style, condition rechecked each pass.
    Loop { condition: Expr, body: Vec<Stmt> },
    /// `for i n do ... end` — the loop variable counts 1..=n in the
    /// global scope.
    For {
        varname: String,
        amount: Expr,
        body: Vec<Stmt>,
    },
    Func {
        name: String,
        params: Vec<Rc<str>>,
        body: Rc<[Stmt]>,
    },
    /// An expression at statement position (bare calls land here too).
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Num(f64),
    Str(Rc<str>),
    Bool(bool),
    Identifier(String),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    /// A function call: either the bare statement form `name a, b` or the
    /// bracketed expression form `[name a, b]`.
    Call { name: String, args: Vec<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogicalOp::Equal => "==",
            LogicalOp::NotEqual => "!=",
            LogicalOp::Less => "<",
            LogicalOp::LessEqual => "<=",
            LogicalOp::Greater => ">",
            LogicalOp::GreaterEqual => ">=",
            LogicalOp::And => "&",
            LogicalOp::Or => "|",
        };
        write!(f, "{}", s)
    }
}
