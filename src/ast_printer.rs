use crate::expr::{Comprehension, Expr, Literal};
use crate::stmt::{ClassDecl, FunctionDecl, Stmt};

/// Converts the AST to a parenthesised prefix form, one top‑level statement
/// per line.  Used by the `parse` subcommand.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print_program(program: &[Stmt]) -> String {
        program
            .iter()
            .map(Self::print_stmt)
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => Self::print(expr),

            Stmt::Assign { target, value, .. } => {
                format!("(= {} {})", Self::print(target), Self::print(value))
            }

            Stmt::AugAssign {
                target, op, value, ..
            } => format!(
                "({}= {} {})",
                op.symbol(),
                Self::print(target),
                Self::print(value)
            ),

            Stmt::If {
                condition,
                then_branch,
                elifs,
                else_branch,
                ..
            } => {
                let mut s = format!("(if {} {}", Self::print(condition), Self::block(then_branch));

                for (cond, body) in elifs {
                    s.push_str(&format!(" (elif {} {})", Self::print(cond), Self::block(body)));
                }

                if let Some(body) = else_branch {
                    s.push_str(&format!(" (else {})", Self::block(body)));
                }

                s.push(')');
                s
            }

            Stmt::While {
                condition, body, ..
            } => format!("(while {} {})", Self::print(condition), Self::block(body)),

            Stmt::For {
                targets,
                iterable,
                body,
                ..
            } => format!(
                "(for ({}) {} {})",
                targets.join(" "),
                Self::print(iterable),
                Self::block(body)
            ),

            Stmt::Return { value: Some(v), .. } => format!("(return {})", Self::print(v)),

            Stmt::Return { value: None, .. } => "(return)".into(),

            Stmt::Break { .. } => "(break)".into(),

            Stmt::Continue { .. } => "(continue)".into(),

            Stmt::Pass { .. } => "(pass)".into(),

            Stmt::Assert {
                condition,
                message,
                ..
            } => match message {
                Some(m) => format!("(assert {} {})", Self::print(condition), Self::print(m)),
                None => format!("(assert {})", Self::print(condition)),
            },

            Stmt::Exit { code: Some(c), .. } => format!("(exit {})", Self::print(c)),

            Stmt::Exit { code: None, .. } => "(exit)".into(),

            Stmt::Print { arguments, .. } => Self::list("print", arguments),

            Stmt::Function(decl) => Self::function("def", decl),

            Stmt::Class(decl) => Self::class(decl),
        }
    }

    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal { value, .. } => match value {
                Literal::Bool(true) => "True".into(),

                Literal::Bool(false) => "False".into(),

                Literal::None => "None".into(),

                Literal::Str(s) => format!("{:?}", s),

                Literal::Int(n) => itoa::Buffer::new().format(*n).to_string(),

                Literal::Float(n) => {
                    if n.fract() == 0.0 && n.is_finite() {
                        // 3.0 → "3.0"
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            Expr::Variable { name, .. } => name.clone(),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { op, operand, .. } => format!("({} {})", op.symbol(), Self::print(operand)),

            Expr::Binary {
                left, op, right, ..
            } => format!(
                "({} {} {})",
                op.symbol(),
                Self::print(left),
                Self::print(right)
            ),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => format!(
                "(if-expr {} {} {})",
                Self::print(condition),
                Self::print(then_branch),
                Self::print(else_branch)
            ),

            // ── postfix ─────────────────────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Index { object, index, .. } => {
                format!("(index {} {})", Self::print(object), Self::print(index))
            }

            Expr::Attribute { object, name, .. } => format!("(. {} {})", Self::print(object), name),

            // ── displays ────────────────────────────────────────────────
            Expr::List { elements, .. } => Self::list("list", elements),

            Expr::Set { elements, .. } => Self::list("set", elements),

            Expr::Dict { entries, .. } => {
                let mut s = String::from("(dict");
                for (k, v) in entries {
                    s.push_str(&format!(" ({} {})", Self::print(k), Self::print(v)));
                }
                s.push(')');
                s
            }

            Expr::ListComp {
                element, clause, ..
            } => format!(
                "(list-comp {} {})",
                Self::print(element),
                Self::clause(clause)
            ),

            Expr::TupleComp {
                element, clause, ..
            } => format!(
                "(tuple-comp {} {})",
                Self::print(element),
                Self::clause(clause)
            ),

            Expr::DictComp {
                key, value, clause, ..
            } => format!(
                "(dict-comp ({} {}) {})",
                Self::print(key),
                Self::print(value),
                Self::clause(clause)
            ),

            Expr::Lambda(decl) => Self::function("lambda", decl),
        }
    }

    fn list(tag: &str, items: &[Expr]) -> String {
        let mut s = format!("({}", tag);
        for item in items {
            s.push(' ');
            s.push_str(&Self::print(item));
        }
        s.push(')');
        s
    }

    fn block(body: &[Stmt]) -> String {
        let inner: Vec<String> = body.iter().map(Self::print_stmt).collect();

        format!("(block {})", inner.join(" "))
    }

    fn clause(clause: &Comprehension) -> String {
        let mut s = format!(
            "(for ({}) {}",
            clause.targets.join(" "),
            Self::print(&clause.iterable)
        );

        if let Some(cond) = &clause.condition {
            s.push_str(&format!(" (if {})", Self::print(cond)));
        }

        s.push(')');
        s
    }

    fn function(tag: &str, decl: &FunctionDecl) -> String {
        let mut params: Vec<String> = decl.params.clone();

        for (name, default) in &decl.defaults {
            params.push(format!("(= {} {})", name, Self::print(default)));
        }

        format!(
            "({} {} ({}) {})",
            tag,
            decl.name,
            params.join(" "),
            Self::block(&decl.body)
        )
    }

    fn class(decl: &ClassDecl) -> String {
        let mut s = format!("(class {} ({})", decl.name, decl.bases.join(" "));

        for field in &decl.fields {
            s.push_str(&format!(
                " (field {} {})",
                field.name,
                Self::print(&field.initializer)
            ));
        }

        for method in &decl.methods {
            s.push(' ');
            s.push_str(&Self::function("def", method));
        }

        s.push(')');
        s
    }
}
