//! Static resolver pass for the **minipy** interpreter.
//!
//! One AST walk before execution that rejects programs whose structure can
//! never run correctly:
//! 1. `return` outside of a function body.
//! 2. `break` / `continue` outside of a loop (a function body starts a fresh
//!    loop context, so a `break` inside a function nested in a loop is still
//!    rejected).
//! 3. The same parameter name declared twice by one function or lambda.
//!
//! Names and types are deliberately left alone: an undefined name stays a
//! runtime `NameError` so that globals defined after a function's definition
//! remain visible to it.

use crate::error::{PyError, Result};
use crate::expr::Expr;
use crate::stmt::{FunctionDecl, Stmt};
use log::{debug, info};
use std::collections::HashSet;

/// Are we inside a user function?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
}

/// Resolver: tracks function and loop nesting and enforces static rules.
pub struct Resolver {
    current_function: FunctionType,
    loop_depth: usize,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");

        Resolver {
            current_function: FunctionType::None,
            loop_depth: 0,
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) -> Result<()> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_block(statements)
    }

    fn resolve_block(&mut self, statements: &[Stmt]) -> Result<()> {
        for stmt in statements {
            self.resolve_stmt(stmt)?;
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        debug!("Resolving stmt at line {}", stmt.line());

        match stmt {
            Stmt::Expression(expr) => self.resolve_expr(expr)?,

            Stmt::Assign { target, value, .. } => {
                self.resolve_expr(value)?;
                self.resolve_expr(target)?;
            }

            Stmt::AugAssign { target, value, .. } => {
                self.resolve_expr(target)?;
                self.resolve_expr(value)?;
            }

            Stmt::If {
                condition,
                then_branch,
                elifs,
                else_branch,
                ..
            } => {
                self.resolve_expr(condition)?;
                self.resolve_block(then_branch)?;

                for (cond, body) in elifs {
                    self.resolve_expr(cond)?;
                    self.resolve_block(body)?;
                }

                if let Some(body) = else_branch {
                    self.resolve_block(body)?;
                }
            }

            Stmt::While {
                condition, body, ..
            } => {
                self.resolve_expr(condition)?;
                self.resolve_loop_body(body)?;
            }

            Stmt::For { iterable, body, .. } => {
                self.resolve_expr(iterable)?;
                self.resolve_loop_body(body)?;
            }

            Stmt::Return { value, line } => {
                if self.current_function == FunctionType::None {
                    return Err(PyError::resolve(*line, "'return' outside function"));
                }

                if let Some(expr) = value {
                    self.resolve_expr(expr)?;
                }
            }

            Stmt::Break { line } => {
                if self.loop_depth == 0 {
                    return Err(PyError::resolve(*line, "'break' outside loop"));
                }
            }

            Stmt::Continue { line } => {
                if self.loop_depth == 0 {
                    return Err(PyError::resolve(*line, "'continue' not properly in loop"));
                }
            }

            Stmt::Pass { .. } => {}

            Stmt::Assert {
                condition, message, ..
            } => {
                self.resolve_expr(condition)?;

                if let Some(m) = message {
                    self.resolve_expr(m)?;
                }
            }

            Stmt::Exit { code, .. } => {
                if let Some(c) = code {
                    self.resolve_expr(c)?;
                }
            }

            Stmt::Print { arguments, .. } => {
                for arg in arguments {
                    self.resolve_expr(arg)?;
                }
            }

            Stmt::Function(decl) => self.resolve_function(decl, FunctionType::Function)?,

            Stmt::Class(decl) => {
                for field in &decl.fields {
                    self.resolve_expr(&field.initializer)?;
                }

                for method in &decl.methods {
                    self.resolve_function(method, FunctionType::Method)?;
                }
            }
        }

        Ok(())
    }

    fn resolve_loop_body(&mut self, body: &[Stmt]) -> Result<()> {
        self.loop_depth += 1;

        let result = self.resolve_block(body);

        self.loop_depth -= 1;

        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Literal { .. } | Expr::Variable { .. } => {}

            Expr::Unary { operand, .. } => self.resolve_expr(operand)?,

            Expr::Binary { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)?;
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expr(condition)?;
                self.resolve_expr(then_branch)?;
                self.resolve_expr(else_branch)?;
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee)?;

                for arg in arguments {
                    self.resolve_expr(arg)?;
                }
            }

            Expr::Index { object, index, .. } => {
                self.resolve_expr(object)?;
                self.resolve_expr(index)?;
            }

            Expr::Attribute { object, .. } => self.resolve_expr(object)?,

            Expr::List { elements, .. } | Expr::Set { elements, .. } => {
                for e in elements {
                    self.resolve_expr(e)?;
                }
            }

            Expr::Dict { entries, .. } => {
                for (k, v) in entries {
                    self.resolve_expr(k)?;
                    self.resolve_expr(v)?;
                }
            }

            Expr::ListComp {
                element, clause, ..
            }
            | Expr::TupleComp {
                element, clause, ..
            } => {
                self.resolve_expr(&clause.iterable)?;

                if let Some(cond) = &clause.condition {
                    self.resolve_expr(cond)?;
                }

                self.resolve_expr(element)?;
            }

            Expr::DictComp {
                key, value, clause, ..
            } => {
                self.resolve_expr(&clause.iterable)?;

                if let Some(cond) = &clause.condition {
                    self.resolve_expr(cond)?;
                }

                self.resolve_expr(key)?;
                self.resolve_expr(value)?;
            }

            Expr::Lambda(decl) => self.resolve_function(decl, FunctionType::Function)?,
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Check parameters, then walk the body in a fresh function context.
    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) -> Result<()> {
        debug!("Resolving {:?} '{}'", kind, decl.name);

        let mut seen: HashSet<&str> = HashSet::new();

        for name in decl.param_names() {
            if !seen.insert(name) {
                return Err(PyError::resolve(
                    decl.line,
                    format!("duplicate argument '{}' in function definition", name),
                ));
            }
        }

        // Defaults are evaluated at the definition site, outside the body.
        for (_, default) in &decl.defaults {
            self.resolve_expr(default)?;
        }

        let enclosing_function = self.current_function;
        let enclosing_loops = self.loop_depth;

        self.current_function = kind;
        self.loop_depth = 0;

        let result = self.resolve_block(&decl.body);

        self.current_function = enclosing_function;
        self.loop_depth = enclosing_loops;

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;
    use crate::token::Token;

    fn resolve(source: &str) -> Result<()> {
        let tokens: Vec<Token> = Scanner::new(source).collect::<Result<_>>()?;
        let program = Parser::new(&tokens).parse()?;

        Resolver::new().resolve(&program)
    }

    #[test]
    fn return_at_top_level_is_rejected() {
        let err = resolve("x = 1\nreturn x\n").unwrap_err();

        assert!(matches!(err, PyError::Resolve { line: 2, .. }));
    }

    #[test]
    fn return_inside_method_is_allowed() {
        assert!(resolve("class A:\n    def f(self):\n        return 1\n").is_ok());
    }

    #[test]
    fn break_outside_loop_is_rejected() {
        assert!(resolve("if True:\n    break\n").is_err());
        assert!(resolve("while True:\n    break\n").is_ok());
    }

    #[test]
    fn function_body_resets_loop_context() {
        let source = "for i in range(3):\n    def f():\n        continue\n";

        assert!(resolve(source).is_err());
    }

    #[test]
    fn duplicate_parameters_are_rejected() {
        assert!(resolve("def f(a, a):\n    pass\n").is_err());
        assert!(resolve("def f(a, b=1, b=2):\n    pass\n").is_err());
        assert!(resolve("g = lambda x, x: x\n").is_err());
    }

    #[test]
    fn undefined_names_are_left_to_runtime() {
        assert!(resolve("def f():\n    return later\nlater = 1\n").is_ok());
    }
}
