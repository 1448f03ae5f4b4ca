//! Tree‑walking evaluator.
//!
//! Statements execute to a [`Completion`] that tells the enclosing construct
//! whether control continues normally or leaves through `return`, `break` or
//! `continue`.  Loops consume `Break`/`Continue`, calls consume `Return`; a
//! signal that reaches the program or a call boundary unconsumed is an
//! internal error.  Runtime faults travel as `PyError::Runtime` and abort the
//! whole evaluation.
//!
//! Scoping:
//! - the global frame is created once and holds the builtins;
//! - a call runs in a fresh child of the function's captured frame;
//! - a comprehension runs in a fresh child of the current frame;
//! - `for`, `if`, `while` and blocks bind into the current frame.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::builtins::{self, Builtins};
use crate::environment::{Environment, Symbol, SymbolKind};
use crate::error::{ErrorKind, Fault, PyError, Result};
use crate::expr::{BinaryOp, Comprehension, Expr, Literal, UnaryOp};
use crate::stmt::{ClassDecl, FunctionDecl, Stmt};
use crate::value::{Class, Dict, Function, Instance, Set, Value};

/// How a statement finished.
#[derive(Debug)]
pub enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Pins line‑less faults to the node being evaluated.
trait AtLine<T> {
    fn at(self, line: usize) -> Result<T>;
}

impl<T> AtLine<T> for std::result::Result<T, Fault> {
    #[inline]
    fn at(self, line: usize) -> Result<T> {
        self.map_err(|fault| fault.at(line))
    }
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter writing to the process' standard output and error.
    pub fn new() -> Self {
        Self::with_output(io::stdout(), io::stderr())
    }

    /// An interpreter writing `print` output to `out` and `exit` messages to
    /// `err`.
    pub fn with_output(out: impl Write + 'static, err: impl Write + 'static) -> Self {
        info!("Initializing Interpreter");

        let mut globals = Environment::new();
        let builtins = Builtins::standard();

        builtins.install(&mut globals);

        debug!(
            "Builtins available: {}",
            builtins.names().collect::<Vec<&str>>().join(", ")
        );

        let globals = Rc::new(RefCell::new(globals));

        Self {
            environment: globals.clone(),
            globals,
            out: Box::new(out),
            err: Box::new(err),
        }
    }

    /// The top‑level frame.
    pub fn globals(&self) -> Rc<RefCell<Environment>> {
        self.globals.clone()
    }

    /// Executes a whole program.  Output is flushed on every exit path.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        let result = self.run_top_level(statements);

        self.out.flush()?;

        if result.is_ok() {
            info!("Interpretation completed successfully");
        }

        result
    }

    fn run_top_level(&mut self, statements: &[Stmt]) -> Result<()> {
        for stmt in statements {
            match self.execute(stmt)? {
                Completion::Normal => {}
                signal => return Err(escaped(&signal)),
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Completion> {
        debug!("Executing statement at line {}", stmt.line());

        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Assign {
                target,
                value,
                line,
            } => {
                let value: Value = self.evaluate(value)?;

                self.assign(target, value, *line)?;
            }

            Stmt::AugAssign {
                target,
                op,
                value,
                line,
            } => {
                self.augmented_assign(target, *op, value, *line)?;
            }

            Stmt::If {
                condition,
                then_branch,
                elifs,
                else_branch,
                ..
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute_block(then_branch);
                }

                for (cond, body) in elifs {
                    if self.evaluate(cond)?.is_truthy() {
                        return self.execute_block(body);
                    }
                }

                if let Some(body) = else_branch {
                    return self.execute_block(body);
                }
            }

            Stmt::While {
                condition, body, ..
            } => {
                debug!("Entering while loop");

                while self.evaluate(condition)?.is_truthy() {
                    match self.execute_block(body)? {
                        Completion::Break => break,
                        Completion::Normal | Completion::Continue => {}
                        ret @ Completion::Return(_) => return Ok(ret),
                    }
                }

                debug!("Exited while loop");
            }

            Stmt::For {
                targets,
                iterable,
                body,
                line,
            } => {
                let items: Vec<Value> = self.evaluate(iterable)?.iterate().at(*line)?;

                debug!("Entering for loop over {} items", items.len());

                for item in items {
                    let frame = self.environment.clone();

                    bind_targets(&mut frame.borrow_mut(), targets, item, *line)?;

                    match self.execute_block(body)? {
                        Completion::Break => break,
                        Completion::Normal | Completion::Continue => {}
                        ret @ Completion::Return(_) => return Ok(ret),
                    }
                }
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(e) => self.evaluate(e)?,
                    None => Value::None,
                };

                debug!("Returning value: {}", value);

                return Ok(Completion::Return(value));
            }

            Stmt::Break { .. } => return Ok(Completion::Break),

            Stmt::Continue { .. } => return Ok(Completion::Continue),

            Stmt::Pass { .. } => {}

            Stmt::Assert {
                condition,
                message,
                line,
            } => {
                if !self.evaluate(condition)?.is_truthy() {
                    let message: String = match message {
                        Some(m) => self.evaluate(m)?.repr(),
                        None => String::new(),
                    };

                    return Err(Fault::new(ErrorKind::AssertionError, message).at(*line));
                }
            }

            Stmt::Exit { code, .. } => {
                let value: Value = match code {
                    Some(e) => self.evaluate(e)?,
                    None => Value::None,
                };

                return Err(self.exit(value)?);
            }

            Stmt::Print { arguments, line } => {
                let values: Vec<Value> = self.evaluate_all(arguments)?;

                builtins::print(self.out.as_mut(), &values).at(*line)?;
            }

            Stmt::Function(decl) => {
                let function: Value = self.make_function(decl)?;

                self.environment.borrow_mut().define(
                    &decl.name,
                    Symbol::new(SymbolKind::Function, function, Some(decl.line)),
                );

                info!("Function '{}' defined", decl.name);
            }

            Stmt::Class(decl) => self.declare_class(decl)?,
        }

        Ok(Completion::Normal)
    }

    /// Runs statements in order, stopping at the first non‑normal completion.
    fn execute_block(&mut self, statements: &[Stmt]) -> Result<Completion> {
        for stmt in statements {
            match self.execute(stmt)? {
                Completion::Normal => {}
                signal => return Ok(signal),
            }
        }

        Ok(Completion::Normal)
    }

    /// Runs `f` with `env` as the current frame, restoring the previous frame
    /// whether or not `f` fails.
    fn in_scope<T>(
        &mut self,
        env: Environment,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let previous = std::mem::replace(&mut self.environment, Rc::new(RefCell::new(env)));

        let result = f(self);

        self.environment = previous;

        result
    }

    fn assign(&mut self, target: &Expr, value: Value, line: usize) -> Result<()> {
        match target {
            Expr::Variable { name, .. } => {
                match self.environment.borrow().lookup_local(name) {
                    Some(previous) => debug!("Rebinding '{}' (was {:?})", name, previous.kind),
                    None => debug!("Binding new local '{}'", name),
                }

                self.environment.borrow_mut().define(
                    name,
                    Symbol::new(SymbolKind::Variable, value, Some(line)),
                );

                Ok(())
            }

            Expr::Index { object, index, .. } => {
                let object: Value = self.evaluate(object)?;
                let index: Value = self.evaluate(index)?;

                object.set_item(&index, value).at(line)
            }

            Expr::Attribute { object, name, .. } => {
                let object: Value = self.evaluate(object)?;

                object.set_attr(name, value).at(line)
            }

            _ => Err(Fault::type_error("invalid assignment target").at(line)),
        }
    }

    /// `t op= e`.  The target's object and index are evaluated once, before `e`.
    fn augmented_assign(
        &mut self,
        target: &Expr,
        op: BinaryOp,
        value: &Expr,
        line: usize,
    ) -> Result<()> {
        match target {
            Expr::Variable { name, .. } => {
                let current: Value = self.environment.borrow().get(name).at(line)?;
                let rhs: Value = self.evaluate(value)?;
                let result: Value = apply_binary(op, &current, &rhs).at(line)?;

                self.assign(target, result, line)
            }

            Expr::Index { object, index, .. } => {
                let object: Value = self.evaluate(object)?;
                let index: Value = self.evaluate(index)?;
                let current: Value = object.get_item(&index).at(line)?;
                let rhs: Value = self.evaluate(value)?;
                let result: Value = apply_binary(op, &current, &rhs).at(line)?;

                object.set_item(&index, result).at(line)
            }

            Expr::Attribute { object, name, .. } => {
                let object: Value = self.evaluate(object)?;
                let current: Value = object.get_attr(name).at(line)?;
                let rhs: Value = self.evaluate(value)?;
                let result: Value = apply_binary(op, &current, &rhs).at(line)?;

                object.set_attr(name, result).at(line)
            }

            _ => Err(Fault::type_error("invalid assignment target").at(line)),
        }
    }

    /// Flushes output and produces the `Exit` unwind for `value`.
    fn exit(&mut self, value: Value) -> Result<PyError> {
        let code: i32 = match value {
            Value::None => 0,
            Value::Int(n) => n as i32,
            Value::Bool(b) => b as i32,
            Value::Float(f) => f.trunc() as i32,
            other => {
                writeln!(self.err, "{}", other.repr())?;
                self.err.flush()?;

                1
            }
        };

        info!("exit({}) requested", code);

        self.out.flush()?;

        Ok(PyError::Exit { code })
    }

    fn make_function(&mut self, decl: &Rc<FunctionDecl>) -> Result<Value> {
        // Defaults are evaluated once, here, not per call.
        let mut defaults: Vec<Value> = Vec::with_capacity(decl.defaults.len());

        for (_, expr) in &decl.defaults {
            defaults.push(self.evaluate(expr)?);
        }

        Ok(Value::Function(Rc::new(Function {
            decl: decl.clone(),
            defaults,
            closure: self.environment.clone(),
        })))
    }

    fn declare_class(&mut self, decl: &ClassDecl) -> Result<()> {
        debug!("Declaring class '{}'", decl.name);

        let parent: Option<Rc<Class>> = match decl.bases.as_slice() {
            [] => None,

            [base] => match self.environment.borrow().get(base).at(decl.line)? {
                Value::Class(class) => Some(class),
                other => {
                    return Err(Fault::type_error(format!(
                        "base class must be a class, not '{}'",
                        other.type_name()
                    ))
                    .at(decl.line))
                }
            },

            _ => {
                return Err(
                    Fault::type_error("multiple inheritance is not supported").at(decl.line)
                )
            }
        };

        let class: Rc<Class> = Rc::new(Class::new(decl.name.clone(), parent));

        // Bound before the body runs so methods and fields can refer to it.
        self.environment.borrow_mut().define(
            &decl.name,
            Symbol::new(SymbolKind::Class, Value::Class(class.clone()), Some(decl.line)),
        );

        for field in &decl.fields {
            let value: Value = self.evaluate(&field.initializer)?;

            class.attrs.borrow_mut().insert(field.name.clone(), value);
        }

        for method in &decl.methods {
            let function: Value = self.make_function(method)?;

            class.attrs.borrow_mut().insert(method.name.clone(), function);
        }

        info!("Class '{}' declared", decl.name);

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                Literal::Int(n) => Value::Int(*n),
                Literal::Float(f) => Value::Float(*f),
                Literal::Str(s) => Value::Str(s.clone()),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::None => Value::None,
            }),

            Expr::Variable { name, line } => {
                debug!("Looking up variable '{}'", name);

                self.environment.borrow().get(name).at(*line)
            }

            Expr::Unary { op, operand, line } => {
                let value: Value = self.evaluate(operand)?;

                match op {
                    UnaryOp::Neg => value.neg().at(*line),
                    UnaryOp::Pos => value.pos().at(*line),
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                }
            }

            Expr::Binary {
                left,
                op,
                right,
                line,
            } => self.evaluate_binary(left, *op, right, *line),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Call {
                callee,
                arguments,
                line,
            } => self.evaluate_call(callee, arguments, *line),

            Expr::Index {
                object,
                index,
                line,
            } => {
                let object: Value = self.evaluate(object)?;
                let index: Value = self.evaluate(index)?;

                object.get_item(&index).at(*line)
            }

            Expr::Attribute { object, name, line } => {
                self.evaluate(object)?.get_attr(name).at(*line)
            }

            Expr::List { elements, .. } => Ok(Value::list(self.evaluate_all(elements)?)),

            Expr::Set { elements, line } => {
                let mut set = Set::new();

                for element in elements {
                    let value: Value = self.evaluate(element)?;

                    value.check_hashable().at(*line)?;
                    set.insert(value);
                }

                Ok(Value::Set(Rc::new(RefCell::new(set))))
            }

            Expr::Dict { entries, line } => {
                let mut dict = Dict::new();

                for (k, v) in entries {
                    let key: Value = self.evaluate(k)?;

                    key.check_hashable().at(*line)?;

                    let value: Value = self.evaluate(v)?;

                    dict.insert(key, value);
                }

                Ok(Value::Dict(Rc::new(RefCell::new(dict))))
            }

            Expr::ListComp {
                element,
                clause,
                line,
            }
            | Expr::TupleComp {
                element,
                clause,
                line,
            } => {
                let mut items: Vec<Value> = Vec::new();

                self.comprehend(clause, *line, |this| {
                    items.push(this.evaluate(element)?);

                    Ok(())
                })?;

                Ok(Value::list(items))
            }

            Expr::DictComp {
                key,
                value,
                clause,
                line,
            } => {
                let mut dict = Dict::new();

                self.comprehend(clause, *line, |this| {
                    let k: Value = this.evaluate(key)?;

                    k.check_hashable().at(*line)?;

                    let v: Value = this.evaluate(value)?;

                    dict.insert(k, v);

                    Ok(())
                })?;

                Ok(Value::Dict(Rc::new(RefCell::new(dict))))
            }

            Expr::Lambda(decl) => self.make_function(decl),
        }
    }

    fn evaluate_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>> {
        let mut values: Vec<Value> = Vec::with_capacity(exprs.len());

        for expr in exprs {
            values.push(self.evaluate(expr)?);
        }

        Ok(values)
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
        line: usize,
    ) -> Result<Value> {
        debug!("Evaluating binary operation: {}", op.symbol());

        let lhs: Value = self.evaluate(left)?;

        // Short‑circuit forms return an operand, not a coerced bool.
        match op {
            BinaryOp::Or if lhs.is_truthy() => return Ok(lhs),
            BinaryOp::And if !lhs.is_truthy() => return Ok(lhs),
            BinaryOp::Or | BinaryOp::And => return self.evaluate(right),
            _ => {}
        }

        let rhs: Value = self.evaluate(right)?;

        apply_binary(op, &lhs, &rhs).at(line)
    }

    /// Evaluates `clause`'s iterable, then runs `emit` once per element that
    /// passes the condition, with the loop variables bound in a fresh frame.
    fn comprehend(
        &mut self,
        clause: &Comprehension,
        line: usize,
        mut emit: impl FnMut(&mut Self) -> Result<()>,
    ) -> Result<()> {
        let items: Vec<Value> = self.evaluate(&clause.iterable)?.iterate().at(line)?;
        let frame = Environment::with_enclosing(self.environment.clone());

        self.in_scope(frame, |this| {
            for item in items {
                let frame = this.environment.clone();

                bind_targets(&mut frame.borrow_mut(), &clause.targets, item, line)?;

                if let Some(cond) = &clause.condition {
                    if !this.evaluate(cond)?.is_truthy() {
                        continue;
                    }
                }

                emit(this)?;
            }

            Ok(())
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Calls
    // ─────────────────────────────────────────────────────────────────────

    fn evaluate_call(&mut self, callee: &Expr, arguments: &[Expr], line: usize) -> Result<Value> {
        debug!("Evaluating function call at line {}", line);

        // `obj.method(args)` passes `obj` as the first argument when the
        // function was found on the instance's class chain.
        let (function, receiver) = match callee {
            Expr::Attribute { object, name, .. } => {
                let object: Value = self.evaluate(object)?;
                let function: Value = object.get_attr(name).at(line)?;

                let bound: bool = matches!(function, Value::Function(_))
                    && matches!(&object, Value::Instance(inst) if !inst.attrs.borrow().contains_key(name));

                (function, bound.then_some(object))
            }

            other => (self.evaluate(other)?, None),
        };

        let mut args: Vec<Value> = Vec::with_capacity(arguments.len() + 1);

        args.extend(receiver);
        args.extend(self.evaluate_all(arguments)?);

        self.call_value(&function, args, line)
    }

    /// Invokes a callable (user function, builtin or class).
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>, line: usize) -> Result<Value> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);

                builtins::check_arity(name, *arity, args.len()).at(line)?;

                func(self.out.as_mut(), &args).at(line)
            }

            Value::Function(function) => self.call_function(function, args, line),

            Value::Class(class) => self.instantiate(class, args, line),

            other => Err(Fault::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))
            .at(line)),
        }
    }

    fn call_function(&mut self, function: &Rc<Function>, args: Vec<Value>, line: usize) -> Result<Value> {
        let decl: &FunctionDecl = &function.decl;

        debug!("Calling user-defined function '{}'", decl.name);

        let frame: Environment = bind_arguments(function, args).at(line)?;

        let completion: Completion = self.in_scope(frame, |this| this.execute_block(&decl.body))?;

        match completion {
            Completion::Return(value) => Ok(value),
            Completion::Normal => Ok(Value::None),
            signal => Err(escaped(&signal)),
        }
    }

    fn instantiate(&mut self, class: &Rc<Class>, args: Vec<Value>, line: usize) -> Result<Value> {
        debug!("Instantiating class '{}'", class.name);

        let instance: Value = Value::Instance(Rc::new(Instance::new(class.clone())));

        if let Some(init) = class.find("__init__") {
            let mut init_args: Vec<Value> = Vec::with_capacity(args.len() + 1);

            init_args.push(instance.clone());
            init_args.extend(args);

            // Whatever `__init__` returns is discarded.
            self.call_value(&init, init_args, line)?;
        }

        Ok(instance)
    }
}

/// Builds the call frame: required parameters, then defaults (taken from the
/// overflow arguments when supplied, otherwise the values captured at `def`).
fn bind_arguments(function: &Function, args: Vec<Value>) -> std::result::Result<Environment, Fault> {
    let decl: &FunctionDecl = &function.decl;
    let required: usize = decl.params.len();
    let total: usize = required + decl.defaults.len();
    let given: usize = args.len();

    if given < required {
        let missing: Vec<String> = decl.params[given..]
            .iter()
            .map(|p| format!("'{}'", p))
            .collect();

        return Err(Fault::type_error(format!(
            "{}() missing {} required positional argument{}: {}",
            decl.name,
            missing.len(),
            if missing.len() == 1 { "" } else { "s" },
            missing.join(" and ")
        )));
    }

    if given > total {
        return Err(Fault::type_error(format!(
            "{}() takes from {} to {} positional arguments but {} were given",
            decl.name, required, total, given
        )));
    }

    let mut frame = Environment::with_enclosing(function.closure.clone());
    let mut args = args.into_iter();

    for name in &decl.params {
        if let Some(value) = args.next() {
            frame.define(name, Symbol::new(SymbolKind::Parameter, value, Some(decl.line)));
        }
    }

    for ((name, _), default) in decl.defaults.iter().zip(&function.defaults) {
        let value: Value = args.next().unwrap_or_else(|| default.clone());

        frame.define(name, Symbol::new(SymbolKind::Parameter, value, Some(decl.line)));
    }

    Ok(frame)
}

/// Every non-short-circuit binary operator on two evaluated operands.
fn apply_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> std::result::Result<Value, Fault> {
    match op {
        BinaryOp::Add => lhs.add(rhs),
        BinaryOp::Sub => lhs.sub(rhs),
        BinaryOp::Mul => lhs.mul(rhs),
        BinaryOp::Div => lhs.div(rhs),
        BinaryOp::In => rhs.contains(lhs).map(Value::Bool),
        BinaryOp::NotIn => rhs.contains(lhs).map(|found| Value::Bool(!found)),
        cmp => lhs.compare(cmp, rhs).map(Value::Bool),
    }
}

/// Binds loop variables, destructuring a list element when there are several.
fn bind_targets(frame: &mut Environment, targets: &[String], item: Value, line: usize) -> Result<()> {
    if let [name] = targets {
        frame.define(name, Symbol::new(SymbolKind::Variable, item, Some(line)));

        return Ok(());
    }

    let Value::List(items) = &item else {
        return Err(Fault::type_error(format!(
            "cannot unpack non-iterable {} object",
            item.type_name()
        ))
        .at(line));
    };

    let values: Vec<Value> = items.borrow().clone();

    if values.len() != targets.len() {
        let message: String = if values.len() < targets.len() {
            format!(
                "not enough values to unpack (expected {}, got {})",
                targets.len(),
                values.len()
            )
        } else {
            format!("too many values to unpack (expected {})", targets.len())
        };

        return Err(Fault::value(message).at(line));
    }

    for (name, value) in targets.iter().zip(values) {
        frame.define(name, Symbol::new(SymbolKind::Variable, value, Some(line)));
    }

    Ok(())
}

/// A control signal that left the construct meant to consume it.
fn escaped(signal: &Completion) -> PyError {
    let message: &str = match signal {
        Completion::Break => "'break' outside loop",
        Completion::Continue => "'continue' not properly in loop",
        Completion::Return(_) => "'return' outside function",
        Completion::Normal => "unexpected normal completion",
    };

    PyError::Internal(message.to_string())
}
