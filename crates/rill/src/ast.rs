//! Abstract syntax tree produced by the parser and consumed by the analyzer
//! and evaluator.
//!
//! Expressions and statements share one tree: every expression is also a
//! valid statement (an "expression statement"), so [`Node`] is the single
//! top-level shape and [`Expr`] nests within it.

use crate::token::CodeLoc;

/// A declared name, as it appears in `let`, function parameters, and
/// anywhere else a binding occurs (as opposed to [`Expr::Identifier`],
/// which is a *reference* to an existing binding).
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub mutable: bool,
    pub rest: bool,
    pub loc: CodeLoc,
}

/// How many enclosing lexical frames a function literal captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureDepth {
    /// `fn(...)` — no capture, body sees only its own parameters.
    None,
    /// `fn<>(...)` — captures every enclosing frame.
    Full,
    /// `fn<N>(...)` — captures the first `N` enclosing frames.
    Frames(u32),
}

/// A key/value pair inside a record or proto literal.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: Expr,
    pub value: Expr,
}

/// An argument or tuple element, optionally spread-expanded.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    NumLit {
        value: f64,
        loc: CodeLoc,
    },
    StrLit {
        value: String,
        loc: CodeLoc,
    },
    BoolLit {
        value: bool,
        loc: CodeLoc,
    },
    BottomLit {
        loc: CodeLoc,
    },
    Identifier {
        name: String,
        loc: CodeLoc,
    },
    Grouping {
        inner: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        loc: CodeLoc,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        loc: CodeLoc,
    },
    Tuple {
        items: Vec<Arg>,
        loc: CodeLoc,
    },
    Record {
        entries: Vec<KeyValue>,
        loc: CodeLoc,
    },
    Func {
        params: Vec<Binding>,
        depth: ClosureDepth,
        body: Box<Node>,
        loc: CodeLoc,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Arg>,
        loc: CodeLoc,
    },
    Get {
        target: Box<Expr>,
        field: Box<Expr>,
        loc: CodeLoc,
    },
    Me {
        loc: CodeLoc,
    },
    Proto {
        methods: Vec<KeyValue>,
        loc: CodeLoc,
    },
    Question {
        loc: CodeLoc,
    },
}

impl Expr {
    #[must_use]
    pub fn loc(&self) -> CodeLoc {
        match self {
            Expr::NumLit { loc, .. }
            | Expr::StrLit { loc, .. }
            | Expr::BoolLit { loc, .. }
            | Expr::BottomLit { loc }
            | Expr::Identifier { loc, .. }
            | Expr::Unary { loc, .. }
            | Expr::Binary { loc, .. }
            | Expr::Tuple { loc, .. }
            | Expr::Record { loc, .. }
            | Expr::Func { loc, .. }
            | Expr::Call { loc, .. }
            | Expr::Get { loc, .. }
            | Expr::Me { loc }
            | Expr::Proto { loc, .. }
            | Expr::Question { loc } => *loc,
            Expr::Grouping { inner } => inner.loc(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Pipe,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// A top-level program node: either a statement form or a bare expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Expr(Expr),
    VarDecl {
        names: Vec<Binding>,
        values: Vec<Expr>,
        loc: CodeLoc,
    },
    Assign {
        names: Vec<(String, CodeLoc)>,
        values: Vec<Expr>,
        loc: CodeLoc,
    },
    If {
        decl: Option<Box<Node>>,
        cond: Expr,
        then_block: Box<Node>,
        else_branch: Option<Box<Node>>,
        loc: CodeLoc,
    },
    While {
        decl: Option<Box<Node>>,
        cond: Expr,
        body: Box<Node>,
        loc: CodeLoc,
    },
    Block {
        statements: Vec<Node>,
        loc: CodeLoc,
    },
    Return {
        value: Option<Expr>,
        loc: CodeLoc,
    },
    Continue {
        loc: CodeLoc,
    },
    Break {
        loc: CodeLoc,
    },
}

impl Node {
    #[must_use]
    pub fn loc(&self) -> CodeLoc {
        match self {
            Node::Expr(e) => e.loc(),
            Node::VarDecl { loc, .. }
            | Node::Assign { loc, .. }
            | Node::If { loc, .. }
            | Node::While { loc, .. }
            | Node::Block { loc, .. }
            | Node::Return { loc, .. }
            | Node::Continue { loc }
            | Node::Break { loc } => *loc,
        }
    }
}
