use serde::Serialize;
use std::rc::Rc;

use crate::stmt::FunctionDecl;

/// Constant appearing in source text.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Not => "not",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
    In,
    NotIn,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::In => "in",
            BinaryOp::NotIn => "not in",
        }
    }
}

/// The `for ... in ... if ...` tail shared by every comprehension form.
#[derive(Debug, Clone, Serialize)]
pub struct Comprehension {
    pub targets: Vec<String>,
    pub iterable: Box<Expr>,
    pub condition: Option<Box<Expr>>,
}

#[derive(Debug, Clone, Serialize)]
pub enum Expr {
    // Constants: numbers, strings, booleans and None
    Literal {
        value: Literal,
        line: usize,
    },

    // A bare name, resolved through the scope chain
    Variable {
        name: String,
        line: usize,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        line: usize,
    },

    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        line: usize,
    },

    // `a if cond else b`
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
        line: usize,
    },

    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        line: usize,
    },

    // `object[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        line: usize,
    },

    // `object.name`
    Attribute {
        object: Box<Expr>,
        name: String,
        line: usize,
    },

    List {
        elements: Vec<Expr>,
        line: usize,
    },

    Set {
        elements: Vec<Expr>,
        line: usize,
    },

    Dict {
        entries: Vec<(Expr, Expr)>,
        line: usize,
    },

    ListComp {
        element: Box<Expr>,
        clause: Comprehension,
        line: usize,
    },

    DictComp {
        key: Box<Expr>,
        value: Box<Expr>,
        clause: Comprehension,
        line: usize,
    },

    // `(e for x in xs)`, materialised eagerly as a list
    TupleComp {
        element: Box<Expr>,
        clause: Comprehension,
        line: usize,
    },

    // A lambda is a function named `<lambda>` whose body is one `return`
    Lambda(Rc<FunctionDecl>),
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal { line, .. }
            | Expr::Variable { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Ternary { line, .. }
            | Expr::Call { line, .. }
            | Expr::Index { line, .. }
            | Expr::Attribute { line, .. }
            | Expr::List { line, .. }
            | Expr::Set { line, .. }
            | Expr::Dict { line, .. }
            | Expr::ListComp { line, .. }
            | Expr::DictComp { line, .. }
            | Expr::TupleComp { line, .. } => *line,

            Expr::Lambda(decl) => decl.line,
        }
    }

    /// Whether the expression may appear on the left of `=`.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Expr::Variable { .. } | Expr::Index { .. } | Expr::Attribute { .. }
        )
    }
}
