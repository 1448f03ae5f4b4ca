/*!
Time & Space Complexity: whole‑file overview
============================================

Definitions
-----------
* **n** = number of tokens (including layout tokens and the sole EOF).
* **m** = number of AST nodes (`m ≤ n`).

### Time

| Phase / function              | Cost | Rationale                                                    |
|-------------------------------|-----:|--------------------------------------------------------------|
| `Parser::parse` main loop     | Θ(n) | Each token is consumed once via `advance()`.                 |
| Individual productions        | O(1) per token | Recursive descent with one token of lookahead (two for `not in`). |
| Augmented assignment          | O(t) | The target sub‑tree (size t) is cloned into the right side.  |

**Overall:** **Θ(n)**.

### Space

| Structure                | Asymptotic | Notes                                                      |
|--------------------------|-----------:|------------------------------------------------------------|
| Borrowed token slice     | O(n)       | Zero‑copy from scanner.                                    |
| AST (`Vec`, `Box`, `Rc`) | O(m)       | Owned nodes; names and literals are copied out of tokens.  |

Call‑stack depth grows with syntactic nesting (≪ n in practice).

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `statement`, declarations    | `debug`| High‑level descent into grammar branches. |

--------------------------------------------------------------------------------
Grammar (condensed EBNF)
--------------------------

```text
program     → ( NEWLINE | statement )* EOF ;
statement   → funcDecl | classDecl | ifStmt | whileStmt | forStmt | simple NEWLINE ;
funcDecl    → "def" IDENT "(" params? ")" ":" block ;
params      → param ( "," param )* ;
param       → IDENT ( "=" expression )? ;
classDecl   → "class" IDENT ( "(" ( IDENT ( "," IDENT )* )? ")" )? ":" classBody ;
classBody   → NEWLINE INDENT member+ DEDENT | "pass" NEWLINE ;
member      → funcDecl | IDENT "=" expression NEWLINE | "pass" NEWLINE ;
block       → NEWLINE INDENT statement+ DEDENT | simple NEWLINE ;
ifStmt      → "if" expression ":" block ( "elif" expression ":" block )* ( "else" ":" block )? ;
whileStmt   → "while" expression ":" block ;
forStmt     → "for" IDENT ( "," IDENT )* "in" expression ":" block ;
simple      → "return" expression? | "break" | "continue" | "pass"
            | "assert" expression ( "," expression )?
            | "exit" "(" expression? ")"
            | expression ( ( "=" | "+=" | "-=" | "*=" | "/=" ) expression )? ;
expression  → lambda | ternary ;
lambda      → "lambda" ( IDENT ( "," IDENT )* )? ":" expression ;
ternary     → or ( "if" or "else" expression )? ;
or          → and ( "or" and )* ;
and         → not ( "and" not )* ;
not         → "not" not | comparison ;
comparison  → sum ( ( "==" | "!=" | "<" | ">" | "<=" | ">=" | "in" | "not" "in" ) sum )* ;
sum         → term ( ( "+" | "-" ) term )* ;
term        → unary ( ( "*" | "/" ) unary )* ;
unary       → ( "-" | "+" ) unary | postfix ;
postfix     → primary ( "(" arguments? ")" | "[" expression "]" | "." IDENT )* ;
primary     → INT | FLOAT | STRING | "True" | "False" | "None" | IDENT
            | "(" expression compFor? ")"
            | "[" ( expression compFor | items )? "]"
            | "{" ( expression ":" expression compFor | entries | items )? "}" ;
compFor     → "for" IDENT ( "," IDENT )* "in" or ( "if" or )? ;
```

A statement that is exactly a call of the name `print` becomes a dedicated
print statement; everywhere else `print` is an ordinary builtin name.
*/

use crate::error::{PyError, Result};
use crate::expr::{BinaryOp, Comprehension, Expr, Literal, UnaryOp};
use crate::stmt::{ClassDecl, FieldDecl, FunctionDecl, Program, Stmt};
use crate::token::{Token, TokenType};

use log::{debug, info};
use std::rc::Rc;

/// Name given to the function synthesised for a `lambda`.
pub const LAMBDA_NAME: &str = "<lambda>";

/// Top‑level parser over an immutable slice of tokens.
pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    current: usize,
}

impl<'a> Parser<'a> {
    /// Construct a new parser.  The slice must end with an `EOF` token.
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self { tokens, current: 0 }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program and return its statement list.
    pub fn parse(&mut self) -> Result<Program> {
        info!("Beginning parse phase");

        let mut statements: Program = Vec::new();

        while !self.is_at_end() {
            if self.matches(TokenType::NEWLINE) {
                continue;
            }

            statements.push(self.statement()?);
        }

        info!("Parsed {} top-level statements", statements.len());

        Ok(statements)
    }

    /// Parse the whole input as one expression (used by `evaluate`).
    pub fn parse_expression(&mut self) -> Result<Expr> {
        while self.matches(TokenType::NEWLINE) {}

        let expr: Expr = self.expression()?;

        while self.matches(TokenType::NEWLINE) {}

        if !self.is_at_end() {
            return Err(PyError::parse(
                self.peek().line,
                format!("Unexpected '{}' after expression", self.peek().lexeme),
            ));
        }

        Ok(expr)
    }

    // ──────────────────────── statement rules ─────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        debug!("Entering statement at line {}", self.peek().line);

        if self.matches(TokenType::DEF) {
            Ok(Stmt::Function(self.function_declaration()?))
        } else if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::FOR) {
            self.for_statement()
        } else {
            let stmt: Stmt = self.simple_statement()?;

            self.end_of_line()?;

            Ok(stmt)
        }
    }

    fn function_declaration(&mut self) -> Result<Rc<FunctionDecl>> {
        let line: usize = self.previous().line;
        let name: String = self.identifier("Expected function name")?;

        debug!("Parsing function '{}'", name);

        self.consume(TokenType::LEFT_PAREN, "Expected '(' after function name")?;

        let mut params: Vec<String> = Vec::new();
        let mut defaults: Vec<(String, Expr)> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                let param: String = self.identifier("Expected parameter name")?;

                if self.matches(TokenType::EQUAL) {
                    defaults.push((param, self.expression()?));
                } else if !defaults.is_empty() {
                    return Err(PyError::parse(
                        self.previous().line,
                        "non-default argument follows default argument",
                    ));
                } else {
                    params.push(param);
                }

                if !self.matches(TokenType::COMMA) || self.check(TokenType::RIGHT_PAREN) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters")?;
        self.consume(TokenType::COLON, "Expected ':' before function body")?;

        let body: Vec<Stmt> = self.block()?;

        Ok(Rc::new(FunctionDecl {
            name,
            params,
            defaults,
            body,
            line,
        }))
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let line: usize = self.previous().line;
        let name: String = self.identifier("Expected class name")?;

        debug!("Parsing class '{}'", name);

        let mut bases: Vec<String> = Vec::new();

        if self.matches(TokenType::LEFT_PAREN) {
            while !self.check(TokenType::RIGHT_PAREN) {
                bases.push(self.identifier("Expected base class name")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }

            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after base classes")?;
        }

        self.consume(TokenType::COLON, "Expected ':' before class body")?;

        let mut fields: Vec<FieldDecl> = Vec::new();
        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        // `class A: pass`
        if !self.check(TokenType::NEWLINE) {
            self.consume(TokenType::PASS, "Expected an indented class body")?;
            self.end_of_line()?;

            return Ok(Stmt::Class(ClassDecl {
                name,
                bases,
                fields,
                methods,
                line,
            }));
        }

        self.consume(TokenType::NEWLINE, "Expected newline before class body")?;
        self.consume(TokenType::INDENT, "Expected an indented class body")?;

        while !self.check(TokenType::DEDENT) && !self.is_at_end() {
            if self.matches(TokenType::DEF) {
                methods.push(self.function_declaration()?);
            } else if self.matches(TokenType::PASS) {
                self.end_of_line()?;
            } else if self.matches(TokenType::IDENTIFIER) {
                let field: &Token<'_> = self.previous();

                self.consume(TokenType::EQUAL, "Expected '=' after field name")?;

                let initializer: Expr = self.expression()?;

                self.end_of_line()?;

                fields.push(FieldDecl {
                    name: field.lexeme.to_string(),
                    initializer,
                    line: field.line,
                });
            } else {
                return Err(PyError::parse(
                    self.peek().line,
                    "Expected method or field declaration in class body",
                ));
            }
        }

        self.consume(TokenType::DEDENT, "Expected end of class body")?;

        Ok(Stmt::Class(ClassDecl {
            name,
            bases,
            fields,
            methods,
            line,
        }))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        let line: usize = self.previous().line;
        let condition: Expr = self.expression()?;

        self.consume(TokenType::COLON, "Expected ':' after if condition")?;

        let then_branch: Vec<Stmt> = self.block()?;
        let mut elifs: Vec<(Expr, Vec<Stmt>)> = Vec::new();

        while self.matches(TokenType::ELIF) {
            let condition: Expr = self.expression()?;

            self.consume(TokenType::COLON, "Expected ':' after elif condition")?;

            elifs.push((condition, self.block()?));
        }

        let else_branch: Option<Vec<Stmt>> = if self.matches(TokenType::ELSE) {
            self.consume(TokenType::COLON, "Expected ':' after 'else'")?;

            Some(self.block()?)
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            elifs,
            else_branch,
            line,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        let line: usize = self.previous().line;
        let condition: Expr = self.expression()?;

        self.consume(TokenType::COLON, "Expected ':' after while condition")?;

        let body: Vec<Stmt> = self.block()?;

        Ok(Stmt::While {
            condition,
            body,
            line,
        })
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        let line: usize = self.previous().line;
        let targets: Vec<String> = self.loop_targets()?;

        self.consume(TokenType::IN, "Expected 'in' after loop variables")?;

        let iterable: Expr = self.expression()?;

        self.consume(TokenType::COLON, "Expected ':' after for clause")?;

        let body: Vec<Stmt> = self.block()?;

        Ok(Stmt::For {
            targets,
            iterable,
            body,
            line,
        })
    }

    /// `NEWLINE INDENT statement+ DEDENT`, or a single simple statement on the
    /// header line.
    fn block(&mut self) -> Result<Vec<Stmt>> {
        if !self.matches(TokenType::NEWLINE) {
            let stmt: Stmt = self.simple_statement()?;

            self.end_of_line()?;

            return Ok(vec![stmt]);
        }

        self.consume(TokenType::INDENT, "Expected an indented block")?;

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::DEDENT) && !self.is_at_end() {
            statements.push(self.statement()?);
        }

        self.consume(TokenType::DEDENT, "Expected end of block")?;

        Ok(statements)
    }

    fn simple_statement(&mut self) -> Result<Stmt> {
        let line: usize = self.peek().line;

        if self.matches(TokenType::RETURN) {
            let value: Option<Expr> = if self.check(TokenType::NEWLINE) || self.is_at_end() {
                None
            } else {
                Some(self.expression()?)
            };

            return Ok(Stmt::Return { value, line });
        }

        if self.matches(TokenType::BREAK) {
            return Ok(Stmt::Break { line });
        }

        if self.matches(TokenType::CONTINUE) {
            return Ok(Stmt::Continue { line });
        }

        if self.matches(TokenType::PASS) {
            return Ok(Stmt::Pass { line });
        }

        if self.matches(TokenType::ASSERT) {
            let condition: Expr = self.expression()?;
            let message: Option<Expr> = if self.matches(TokenType::COMMA) {
                Some(self.expression()?)
            } else {
                None
            };

            return Ok(Stmt::Assert {
                condition,
                message,
                line,
            });
        }

        if self.matches(TokenType::EXIT) {
            self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'exit'")?;

            let code: Option<Expr> = if self.check(TokenType::RIGHT_PAREN) {
                None
            } else {
                Some(self.expression()?)
            };

            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after exit code")?;

            return Ok(Stmt::Exit { code, line });
        }

        self.assignment_or_expression()
    }

    fn assignment_or_expression(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        let augmented: Option<Option<BinaryOp>> = if self.matches(TokenType::EQUAL) {
            Some(None)
        } else if self.matches(TokenType::PLUS_EQUAL) {
            Some(Some(BinaryOp::Add))
        } else if self.matches(TokenType::MINUS_EQUAL) {
            Some(Some(BinaryOp::Sub))
        } else if self.matches(TokenType::STAR_EQUAL) {
            Some(Some(BinaryOp::Mul))
        } else if self.matches(TokenType::SLASH_EQUAL) {
            Some(Some(BinaryOp::Div))
        } else {
            None
        };

        let Some(op) = augmented else {
            return Ok(Self::expression_statement(expr));
        };

        let line: usize = self.previous().line;

        if !expr.is_assignable() {
            return Err(PyError::parse(line, "invalid assignment target"));
        }

        let value: Expr = self.expression()?;

        match op {
            Some(op) => Ok(Stmt::AugAssign {
                target: expr,
                op,
                value,
                line,
            }),

            None => Ok(Stmt::Assign {
                target: expr,
                value,
                line,
            }),
        }
    }

    fn expression_statement(expr: Expr) -> Stmt {
        match expr {
            Expr::Call {
                callee,
                arguments,
                line,
            } if matches!(callee.as_ref(), Expr::Variable { name, .. } if name == "print") => {
                Stmt::Print { arguments, line }
            }

            expr => Stmt::Expression(expr),
        }
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        if self.matches(TokenType::LAMBDA) {
            return self.lambda();
        }

        self.ternary()
    }

    fn lambda(&mut self) -> Result<Expr> {
        let line: usize = self.previous().line;
        let mut params: Vec<String> = Vec::new();

        while !self.check(TokenType::COLON) {
            params.push(self.identifier("Expected parameter name in lambda")?);

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        self.consume(TokenType::COLON, "Expected ':' after lambda parameters")?;

        let body: Expr = self.expression()?;

        Ok(Expr::Lambda(Rc::new(FunctionDecl {
            name: LAMBDA_NAME.to_string(),
            params,
            defaults: Vec::new(),
            body: vec![Stmt::Return {
                value: Some(body),
                line,
            }],
            line,
        })))
    }

    fn ternary(&mut self) -> Result<Expr> {
        let expr: Expr = self.or()?;

        if self.matches(TokenType::IF) {
            let line: usize = self.previous().line;
            let condition: Expr = self.or()?;

            self.consume(TokenType::ELSE, "Expected 'else' in conditional expression")?;

            let else_branch: Expr = self.expression()?;

            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                then_branch: Box::new(expr),
                else_branch: Box::new(else_branch),
                line,
            });
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.and()?;

        while self.matches(TokenType::OR) {
            let line: usize = self.previous().line;
            let right: Expr = self.and()?;

            expr = Self::binary(expr, BinaryOp::Or, right, line);
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.not()?;

        while self.matches(TokenType::AND) {
            let line: usize = self.previous().line;
            let right: Expr = self.not()?;

            expr = Self::binary(expr, BinaryOp::And, right, line);
        }

        Ok(expr)
    }

    fn not(&mut self) -> Result<Expr> {
        if self.matches(TokenType::NOT) {
            let line: usize = self.previous().line;
            let operand: Expr = self.not()?;

            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                line,
            });
        }

        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.sum()?;

        loop {
            let op: BinaryOp = if self.matches(TokenType::EQUAL_EQUAL) {
                BinaryOp::Eq
            } else if self.matches(TokenType::BANG_EQUAL) {
                BinaryOp::NotEq
            } else if self.matches(TokenType::LESS) {
                BinaryOp::Less
            } else if self.matches(TokenType::LESS_EQUAL) {
                BinaryOp::LessEq
            } else if self.matches(TokenType::GREATER) {
                BinaryOp::Greater
            } else if self.matches(TokenType::GREATER_EQUAL) {
                BinaryOp::GreaterEq
            } else if self.matches(TokenType::IN) {
                BinaryOp::In
            } else if self.check(TokenType::NOT) && self.check_next(TokenType::IN) {
                self.advance();
                self.advance();

                BinaryOp::NotIn
            } else {
                break;
            };

            let line: usize = self.previous().line;
            let right: Expr = self.sum()?;

            expr = Self::binary(expr, op, right, line);
        }

        Ok(expr)
    }

    fn sum(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.term()?;

        loop {
            let op: BinaryOp = if self.matches(TokenType::PLUS) {
                BinaryOp::Add
            } else if self.matches(TokenType::MINUS) {
                BinaryOp::Sub
            } else {
                break;
            };

            let line: usize = self.previous().line;
            let right: Expr = self.term()?;

            expr = Self::binary(expr, op, right, line);
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.unary()?;

        loop {
            let op: BinaryOp = if self.matches(TokenType::STAR) {
                BinaryOp::Mul
            } else if self.matches(TokenType::SLASH) {
                BinaryOp::Div
            } else {
                break;
            };

            let line: usize = self.previous().line;
            let right: Expr = self.unary()?;

            expr = Self::binary(expr, op, right, line);
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        let op: Option<UnaryOp> = if self.matches(TokenType::MINUS) {
            Some(UnaryOp::Neg)
        } else if self.matches(TokenType::PLUS) {
            Some(UnaryOp::Pos)
        } else {
            None
        };

        if let Some(op) = op {
            let line: usize = self.previous().line;
            let operand: Expr = self.unary()?;

            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                line,
            });
        }

        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::LEFT_BRACKET) {
                let line: usize = self.previous().line;
                let index: Expr = self.expression()?;

                self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after index")?;

                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    line,
                };
            } else if self.matches(TokenType::DOT) {
                let line: usize = self.previous().line;
                let name: String = self.identifier("Expected attribute name after '.'")?;

                expr = Expr::Attribute {
                    object: Box::new(expr),
                    name,
                    line,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let line: usize = self.previous().line;
        let arguments: Vec<Expr> = self.items(TokenType::RIGHT_PAREN)?;

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            arguments,
            line,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        let line: usize = self.peek().line;

        if self.matches(TokenType::TRUE) {
            return Ok(Self::literal(Literal::Bool(true), line));
        }

        if self.matches(TokenType::FALSE) {
            return Ok(Self::literal(Literal::Bool(false), line));
        }

        if self.matches(TokenType::NONE) {
            return Ok(Self::literal(Literal::None, line));
        }

        match self.peek().token_type {
            TokenType::INT(n) => {
                self.advance();

                return Ok(Self::literal(Literal::Int(n), line));
            }

            TokenType::FLOAT(n) => {
                self.advance();

                return Ok(Self::literal(Literal::Float(n), line));
            }

            TokenType::STRING(ref s) => {
                let s: String = s.clone();

                self.advance();

                return Ok(Self::literal(Literal::Str(s), line));
            }

            _ => {}
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::Variable {
                name: self.previous().lexeme.to_string(),
                line,
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            return self.parenthesized(line);
        }

        if self.matches(TokenType::LEFT_BRACKET) {
            return self.list_display(line);
        }

        if self.matches(TokenType::LEFT_BRACE) {
            return self.brace_display(line);
        }

        Err(PyError::parse(
            line,
            match self.peek().token_type {
                TokenType::EOF => "Expected expression, found end of input".to_string(),
                TokenType::NEWLINE => "Expected expression, found end of line".to_string(),
                TokenType::INDENT => "unexpected indent".to_string(),
                _ => format!("Expected expression, found '{}'", self.peek().lexeme),
            },
        ))
    }

    fn parenthesized(&mut self, line: usize) -> Result<Expr> {
        let expr: Expr = self.expression()?;

        if self.check(TokenType::FOR) {
            let clause: Comprehension = self.comprehension()?;

            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after comprehension")?;

            return Ok(Expr::TupleComp {
                element: Box::new(expr),
                clause,
                line,
            });
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression")?;

        Ok(expr)
    }

    fn list_display(&mut self, line: usize) -> Result<Expr> {
        if self.matches(TokenType::RIGHT_BRACKET) {
            return Ok(Expr::List {
                elements: Vec::new(),
                line,
            });
        }

        let first: Expr = self.expression()?;

        if self.check(TokenType::FOR) {
            let clause: Comprehension = self.comprehension()?;

            self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after comprehension")?;

            return Ok(Expr::ListComp {
                element: Box::new(first),
                clause,
                line,
            });
        }

        let mut elements: Vec<Expr> = vec![first];

        if self.matches(TokenType::COMMA) {
            elements.extend(self.items(TokenType::RIGHT_BRACKET)?);
        }

        self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after list elements")?;

        Ok(Expr::List { elements, line })
    }

    fn brace_display(&mut self, line: usize) -> Result<Expr> {
        // `{}` is an empty dict
        if self.matches(TokenType::RIGHT_BRACE) {
            return Ok(Expr::Dict {
                entries: Vec::new(),
                line,
            });
        }

        let first: Expr = self.expression()?;

        if !self.matches(TokenType::COLON) {
            if self.check(TokenType::FOR) {
                return Err(PyError::parse(
                    self.peek().line,
                    "set comprehensions are not supported",
                ));
            }

            let mut elements: Vec<Expr> = vec![first];

            if self.matches(TokenType::COMMA) {
                elements.extend(self.items(TokenType::RIGHT_BRACE)?);
            }

            self.consume(TokenType::RIGHT_BRACE, "Expected '}' after set elements")?;

            return Ok(Expr::Set { elements, line });
        }

        let value: Expr = self.expression()?;

        if self.check(TokenType::FOR) {
            let clause: Comprehension = self.comprehension()?;

            self.consume(TokenType::RIGHT_BRACE, "Expected '}' after comprehension")?;

            return Ok(Expr::DictComp {
                key: Box::new(first),
                value: Box::new(value),
                clause,
                line,
            });
        }

        let mut entries: Vec<(Expr, Expr)> = vec![(first, value)];

        while self.matches(TokenType::COMMA) && !self.check(TokenType::RIGHT_BRACE) {
            let key: Expr = self.expression()?;

            self.consume(TokenType::COLON, "Expected ':' after dict key")?;

            entries.push((key, self.expression()?));
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after dict entries")?;

        Ok(Expr::Dict { entries, line })
    }

    /// `for targets in iterable (if condition)?` after a comprehension element.
    fn comprehension(&mut self) -> Result<Comprehension> {
        self.consume(TokenType::FOR, "Expected 'for' in comprehension")?;

        let targets: Vec<String> = self.loop_targets()?;

        self.consume(TokenType::IN, "Expected 'in' in comprehension")?;

        let iterable: Expr = self.or()?;

        let condition: Option<Box<Expr>> = if self.matches(TokenType::IF) {
            Some(Box::new(self.or()?))
        } else {
            None
        };

        Ok(Comprehension {
            targets,
            iterable: Box::new(iterable),
            condition,
        })
    }

    // ────────────────────── utility helpers ───────────────────────

    /// Comma‑separated expressions up to (not including) `close`; a trailing
    /// comma is allowed.
    fn items(&mut self, close: TokenType) -> Result<Vec<Expr>> {
        let mut items: Vec<Expr> = Vec::new();

        while !self.check(close.clone()) {
            items.push(self.expression()?);

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        Ok(items)
    }

    fn loop_targets(&mut self) -> Result<Vec<String>> {
        let mut targets: Vec<String> = vec![self.identifier("Expected loop variable name")?];

        while self.matches(TokenType::COMMA) {
            targets.push(self.identifier("Expected loop variable name")?);
        }

        Ok(targets)
    }

    #[inline(always)]
    fn binary(left: Expr, op: BinaryOp, right: Expr, line: usize) -> Expr {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
            line,
        }
    }

    #[inline(always)]
    fn literal(value: Literal, line: usize) -> Expr {
        Expr::Literal { value, line }
    }

    fn identifier(&mut self, message: &str) -> Result<String> {
        Ok(self
            .consume(TokenType::IDENTIFIER, message)?
            .lexeme
            .to_string())
    }

    /// A simple statement must be followed by the end of its line.
    fn end_of_line(&mut self) -> Result<()> {
        if self.matches(TokenType::NEWLINE) || self.is_at_end() {
            return Ok(());
        }

        Err(PyError::parse(
            self.peek().line,
            format!("Expected end of line, found '{}'", self.peek().lexeme),
        ))
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token<'a>> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        debug!(
            "Parse error at line {}: found {:?}",
            self.peek().line,
            self.peek().token_type
        );

        Err(PyError::parse(self.peek().line, message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn check_next(&self, ttype: TokenType) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|t| t.token_type == ttype)
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token<'a> {
        let last: usize = self.tokens.len().saturating_sub(1);

        &self.tokens[self.current.min(last)]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token<'a> {
        &self.tokens[self.current.saturating_sub(1)]
    }
}
