use serde::Serialize;
use std::rc::Rc;

use crate::expr::{BinaryOp, Expr};

/// A whole program (translation unit).
pub type Program = Vec<Stmt>;

/// A `def` (or the function synthesised for a `lambda`).
///
/// `params` holds the required names; `defaults` the trailing parameters
/// whose initialisers are evaluated once when the definition executes.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub defaults: Vec<(String, Expr)>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

impl FunctionDecl {
    /// Every parameter name in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .map(String::as_str)
            .chain(self.defaults.iter().map(|(name, _)| name.as_str()))
    }
}

/// `name = initializer` inside a class body.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDecl {
    pub name: String,
    pub initializer: Expr,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassDecl {
    pub name: String,
    pub bases: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<Rc<FunctionDecl>>,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub enum Stmt {
    Expression(Expr),

    // Target is a Variable, Index or Attribute expression
    Assign {
        target: Expr,
        value: Expr,
        line: usize,
    },

    // `target op= value`
    AugAssign {
        target: Expr,
        op: BinaryOp,
        value: Expr,
        line: usize,
    },

    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        elifs: Vec<(Expr, Vec<Stmt>)>,
        else_branch: Option<Vec<Stmt>>,
        line: usize,
    },

    While {
        condition: Expr,
        body: Vec<Stmt>,
        line: usize,
    },

    For {
        targets: Vec<String>,
        iterable: Expr,
        body: Vec<Stmt>,
        line: usize,
    },

    Return {
        value: Option<Expr>,
        line: usize,
    },

    Break {
        line: usize,
    },

    Continue {
        line: usize,
    },

    Pass {
        line: usize,
    },

    Assert {
        condition: Expr,
        message: Option<Expr>,
        line: usize,
    },

    Exit {
        code: Option<Expr>,
        line: usize,
    },

    Print {
        arguments: Vec<Expr>,
        line: usize,
    },

    Function(Rc<FunctionDecl>),

    Class(ClassDecl),
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Stmt::Expression(expr) => expr.line(),

            Stmt::Assign { line, .. }
            | Stmt::AugAssign { line, .. }
            | Stmt::If { line, .. }
            | Stmt::While { line, .. }
            | Stmt::For { line, .. }
            | Stmt::Return { line, .. }
            | Stmt::Break { line }
            | Stmt::Continue { line }
            | Stmt::Pass { line }
            | Stmt::Assert { line, .. }
            | Stmt::Exit { line, .. }
            | Stmt::Print { line, .. } => *line,

            Stmt::Function(decl) => decl.line,

            Stmt::Class(decl) => decl.line,
        }
    }
}
