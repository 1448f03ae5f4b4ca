//! Runtime value model.
//!
//! `Value` is a closed tagged union.  Scalars are copied, containers and
//! instance tables are shared through `Rc<RefCell<_>>` so that mutation through
//! one alias is visible through every other.  Every operator the evaluator
//! dispatches lives here as a method returning `Result<_, Fault>`; the caller
//! attaches the source line.
//!
//! Dict keys and Set members are identified by their textual representation,
//! not by structural equality, and comparisons (`==`, `<`, ...) compare the
//! textual representations of both operands.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use crate::environment::Environment;
use crate::error::Fault;
use crate::expr::BinaryOp;
use crate::stmt::FunctionDecl;

/// Signature shared by every builtin.  Output goes to the interpreter's sink.
pub type NativeFn = fn(&mut dyn Write, &[Value]) -> Result<Value, Fault>;

#[derive(Clone)]
pub enum Value {
    None,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<Dict>>),
    Set(Rc<RefCell<Set>>),
    Function(Rc<Function>),
    NativeFunction {
        name: &'static str,
        /// `None` accepts any number of arguments.
        arity: Option<usize>,
        func: NativeFn,
    },
    Class(Rc<Class>),
    Instance(Rc<Instance>),
}

/// A user function: its declaration, the default values computed when the
/// `def` ran, and the scope it was defined in.
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub defaults: Vec<Value>,
    pub closure: Rc<RefCell<Environment>>,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.decl.name
    }
}

pub struct Class {
    pub name: String,
    pub attrs: RefCell<HashMap<String, Value>>,
    pub parent: Option<Rc<Class>>,
}

impl Class {
    pub fn new(name: impl Into<String>, parent: Option<Rc<Class>>) -> Self {
        Class {
            name: name.into(),
            attrs: RefCell::new(HashMap::new()),
            parent,
        }
    }

    /// Look `name` up in this class, then up the parent chain.
    pub fn find(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.attrs.borrow().get(name) {
            return Some(v.clone());
        }

        self.parent.as_ref().and_then(|p| p.find(name))
    }
}

pub struct Instance {
    pub class: Rc<Class>,
    pub attrs: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance {
            class,
            attrs: RefCell::new(HashMap::new()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dict / Set: insertion ordered, keyed by textual representation
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default, Clone)]
pub struct Dict {
    entries: Vec<(String, Value, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key_repr: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _, _)| k == key_repr)
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.position(&key.repr()).map(|i| self.entries[i].2.clone())
    }

    /// Insert or overwrite; an existing key keeps its position.
    pub fn insert(&mut self, key: Value, value: Value) {
        let repr: String = key.repr();

        self.insert_with_repr(repr, key, value);
    }

    /// `insert` for a key whose representation is already known.  The key may
    /// be the dict that owns `self`, so it must not be rendered here.
    pub fn insert_with_repr(&mut self, repr: String, key: Value, value: Value) {
        match self.position(&repr) {
            Some(i) => self.entries[i].2 = value,
            None => self.entries.push((repr, key, value)),
        }
    }

    pub fn contains(&self, key: &Value) -> bool {
        self.position(&key.repr()).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(_, k, v)| (k, v))
    }
}

#[derive(Default, Clone)]
pub struct Set {
    items: Vec<(String, Value)>,
}

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if an element with the same representation exists.
    pub fn insert(&mut self, value: Value) -> bool {
        let repr: String = value.repr();

        if self.items.iter().any(|(r, _)| *r == repr) {
            return false;
        }

        self.items.push((repr, value));

        true
    }

    pub fn contains(&self, value: &Value) -> bool {
        let repr: String = value.repr();

        self.items.iter().any(|(r, _)| *r == repr)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter().map(|(_, v)| v)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Numeric view used by the arithmetic operators
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(f) => f,
        }
    }
}

impl Value {
    // ─────────────────────────── constructors ──────────────────────────────

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn str(s: impl Into<String>) -> Value {
        Value::Str(s.into())
    }

    // ─────────────────────────── inspection ────────────────────────────────

    /// Python type name, used in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Set(_) => "set",
            Value::Function(_) => "function",
            Value::NativeFunction { .. } => "builtin_function_or_method",
            Value::Class(_) => "type",
            Value::Instance(inst) => &inst.class.name,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Dict(d) => !d.borrow().is_empty(),
            Value::Set(s) => !s.borrow().is_empty(),
            Value::Function(_)
            | Value::NativeFunction { .. }
            | Value::Class(_)
            | Value::Instance(_) => true,
        }
    }

    /// Element count of a container, `None` for everything else.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::List(items) => Some(items.borrow().len()),
            Value::Dict(d) => Some(d.borrow().len()),
            Value::Set(s) => Some(s.borrow().len()),
            _ => None,
        }
    }

    /// Textual representation: strings quoted, containers recursive.
    pub fn repr(&self) -> String {
        self.to_string()
    }

    /// List, Dict and Set may not appear in set or dict literals.
    pub fn check_hashable(&self) -> Result<(), Fault> {
        match self {
            Value::List(_) | Value::Dict(_) | Value::Set(_) => Err(Fault::type_error(format!(
                "unhashable type: '{}'",
                self.type_name()
            ))),
            _ => Ok(()),
        }
    }

    /// Elements visited by `for` and comprehensions.
    pub fn iterate(&self) -> Result<Vec<Value>, Fault> {
        match self {
            Value::List(items) => Ok(items.borrow().clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            other => Err(Fault::type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Integer index value; `Bool` counts as 0/1.
    pub fn as_index(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<Num> {
        match self {
            Value::Int(n) => Some(Num::Int(*n)),
            Value::Bool(b) => Some(Num::Int(*b as i64)),
            Value::Float(f) => Some(Num::Float(*f)),
            _ => None,
        }
    }

    // ─────────────────────────── arithmetic ────────────────────────────────

    fn unsupported(&self, op: &str, rhs: &Value) -> Fault {
        Fault::type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op,
            self.type_name(),
            rhs.type_name()
        ))
    }

    fn numeric(
        &self,
        rhs: &Value,
        op: &str,
        int: fn(i64, i64) -> i64,
        float: fn(f64, f64) -> f64,
    ) -> Result<Value, Fault> {
        match (self.as_number(), rhs.as_number()) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(Value::Int(int(a, b))),
            (Some(a), Some(b)) => Ok(Value::Float(float(a.as_f64(), b.as_f64()))),
            _ => Err(self.unsupported(op, rhs)),
        }
    }

    pub fn add(&self, rhs: &Value) -> Result<Value, Fault> {
        if let (Value::Str(a), Value::Str(b)) = (self, rhs) {
            return Ok(Value::Str(format!("{}{}", a, b)));
        }

        self.numeric(rhs, "+", i64::wrapping_add, |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Value) -> Result<Value, Fault> {
        self.numeric(rhs, "-", i64::wrapping_sub, |a, b| a - b)
    }

    pub fn mul(&self, rhs: &Value) -> Result<Value, Fault> {
        match (self, rhs) {
            (seq @ (Value::Str(_) | Value::List(_)), n) | (n, seq @ (Value::Str(_) | Value::List(_)))
                if n.as_index().is_some() =>
            {
                let count: usize = n.as_index().unwrap_or(0).max(0) as usize;

                seq.repeat(count)
            }

            _ => self.numeric(rhs, "*", i64::wrapping_mul, |a, b| a * b),
        }
    }

    /// `count` copies of a sequence.  A result that cannot be allocated is a
    /// `ValueError`, never an abort.
    fn repeat(&self, count: usize) -> Result<Value, Fault> {
        let too_long = || Fault::value("repeated sequence is too long");

        match self {
            Value::Str(s) => {
                let total: usize = s.len().checked_mul(count).ok_or_else(too_long)?;
                let mut out = String::new();

                out.try_reserve_exact(total).map_err(|_| too_long())?;

                if !s.is_empty() {
                    for _ in 0..count {
                        out.push_str(s);
                    }
                }

                Ok(Value::Str(out))
            }

            Value::List(items) => {
                let items = items.borrow();
                let total: usize = items.len().checked_mul(count).ok_or_else(too_long)?;
                let mut out: Vec<Value> = Vec::new();

                out.try_reserve_exact(total).map_err(|_| too_long())?;

                if !items.is_empty() {
                    for _ in 0..count {
                        out.extend(items.iter().cloned());
                    }
                }

                Ok(Value::list(out))
            }

            other => Ok(other.clone()),
        }
    }

    /// True division: always a `Float`.
    pub fn div(&self, rhs: &Value) -> Result<Value, Fault> {
        match (self.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => {
                let divisor: f64 = b.as_f64();

                if divisor == 0.0 {
                    return Err(Fault::zero_division("division by zero"));
                }

                Ok(Value::Float(a.as_f64() / divisor))
            }

            _ => Err(self.unsupported("/", rhs)),
        }
    }

    pub fn neg(&self) -> Result<Value, Fault> {
        match self.as_number() {
            Some(Num::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
            Some(Num::Float(f)) => Ok(Value::Float(-f)),
            None => Err(Fault::type_error(format!(
                "bad operand type for unary -: '{}'",
                self.type_name()
            ))),
        }
    }

    pub fn pos(&self) -> Result<Value, Fault> {
        match self.as_number() {
            Some(Num::Int(n)) => Ok(Value::Int(n)),
            Some(Num::Float(f)) => Ok(Value::Float(f)),
            None => Err(Fault::type_error(format!(
                "bad operand type for unary +: '{}'",
                self.type_name()
            ))),
        }
    }

    // ─────────────────────────── comparison ────────────────────────────────

    /// `== != < <= > >=` over textual representations.
    pub fn compare(&self, op: BinaryOp, rhs: &Value) -> Result<bool, Fault> {
        let (a, b) = (self.repr(), rhs.repr());

        match op {
            BinaryOp::Eq => Ok(a == b),
            BinaryOp::NotEq => Ok(a != b),
            BinaryOp::Less => Ok(a < b),
            BinaryOp::LessEq => Ok(a <= b),
            BinaryOp::Greater => Ok(a > b),
            BinaryOp::GreaterEq => Ok(a >= b),
            other => Err(Fault::type_error(format!(
                "'{}' is not a comparison operator",
                other.symbol()
            ))),
        }
    }

    /// Membership test backing `in` / `not in`; `self` is the container.
    pub fn contains(&self, item: &Value) -> Result<bool, Fault> {
        match self {
            Value::Str(s) => match item {
                Value::Str(needle) => Ok(s.contains(needle.as_str())),
                other => Err(Fault::type_error(format!(
                    "'in <string>' requires string as left operand, not {}",
                    other.type_name()
                ))),
            },

            Value::List(items) => {
                let repr: String = item.repr();

                Ok(items.borrow().iter().any(|v| v.repr() == repr))
            }

            Value::Dict(d) => Ok(d.borrow().contains(item)),

            Value::Set(s) => Ok(s.borrow().contains(item)),

            other => Err(Fault::type_error(format!(
                "argument of type '{}' is not iterable",
                other.type_name()
            ))),
        }
    }

    // ─────────────────────────── subscripts ────────────────────────────────

    pub fn get_item(&self, index: &Value) -> Result<Value, Fault> {
        match self {
            Value::Str(s) => {
                let i: i64 = index
                    .as_index()
                    .ok_or_else(|| Fault::type_error("string indices must be integers"))?;
                let len: usize = s.chars().count();
                let at: usize = normalize(i, len)
                    .ok_or_else(|| Fault::index("string index out of range"))?;

                Ok(s.chars()
                    .nth(at)
                    .map(|c| Value::Str(c.to_string()))
                    .unwrap_or(Value::None))
            }

            Value::List(items) => {
                let i: i64 = index
                    .as_index()
                    .ok_or_else(|| Fault::type_error("list indices must be integers"))?;
                let items = items.borrow();
                let at: usize = normalize(i, items.len())
                    .ok_or_else(|| Fault::index("list index out of range"))?;

                Ok(items[at].clone())
            }

            Value::Dict(d) => d
                .borrow()
                .get(index)
                .ok_or_else(|| Fault::key(index.repr())),

            other => Err(Fault::type_error(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            ))),
        }
    }

    pub fn set_item(&self, index: &Value, value: Value) -> Result<(), Fault> {
        match self {
            Value::List(items) => {
                let i: i64 = index
                    .as_index()
                    .ok_or_else(|| Fault::type_error("list indices must be integers"))?;
                let mut items = items.borrow_mut();
                let at: usize = normalize(i, items.len())
                    .ok_or_else(|| Fault::index("list assignment index out of range"))?;

                items[at] = value;

                Ok(())
            }

            Value::Dict(d) => {
                let repr: String = index.repr();

                d.borrow_mut().insert_with_repr(repr, index.clone(), value);

                Ok(())
            }

            other => Err(Fault::type_error(format!(
                "'{}' object does not support item assignment",
                other.type_name()
            ))),
        }
    }

    // ─────────────────────────── attributes ────────────────────────────────

    /// Instance table, then class chain.  Functions come back unbound.
    pub fn get_attr(&self, name: &str) -> Result<Value, Fault> {
        let found: Option<Value> = match self {
            Value::Instance(inst) => inst
                .attrs
                .borrow()
                .get(name)
                .cloned()
                .or_else(|| inst.class.find(name)),

            Value::Class(class) => class.find(name),

            _ => None,
        };

        found.ok_or_else(|| match self {
            Value::Class(class) => Fault::type_error(format!(
                "type object '{}' has no attribute '{}'",
                class.name, name
            )),

            other => Fault::type_error(format!(
                "'{}' object has no attribute '{}'",
                other.type_name(),
                name
            )),
        })
    }

    pub fn set_attr(&self, name: &str, value: Value) -> Result<(), Fault> {
        match self {
            Value::Instance(inst) => {
                inst.attrs.borrow_mut().insert(name.to_string(), value);

                Ok(())
            }

            Value::Class(class) => {
                class.attrs.borrow_mut().insert(name.to_string(), value);

                Ok(())
            }

            other => Err(Fault::type_error(format!(
                "'{}' object has no attribute '{}'",
                other.type_name(),
                name
            ))),
        }
    }
}

/// Map a possibly negative index into `[0, len)`.
fn normalize(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let at = if index < 0 { index + len } else { index };

    if (0..len).contains(&at) {
        Some(at as usize)
    } else {
        None
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        f.write_str("nan")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "inf" } else { "-inf" })
    } else if n.fract() == 0.0 {
        // 3 → "3.0"
        write!(f, "{:.1}", n)
    } else {
        write!(f, "{}", n)
    }
}

fn write_str_repr(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;

    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => write!(f, "{}", c)?,
        }
    }

    f.write_str("\"")
}

thread_local! {
    /// Addresses of the containers currently being rendered, outermost first.
    static RENDERING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Renders the container at `addr` with `body`, or `placeholder` when the
/// container is already being rendered further up (it contains itself).
fn write_guarded(
    f: &mut fmt::Formatter<'_>,
    addr: usize,
    placeholder: &str,
    body: impl FnOnce(&mut fmt::Formatter<'_>) -> fmt::Result,
) -> fmt::Result {
    let reentered: bool = RENDERING.with(|stack| {
        let mut stack = stack.borrow_mut();

        if stack.contains(&addr) {
            true
        } else {
            stack.push(addr);
            false
        }
    });

    if reentered {
        return f.write_str(placeholder);
    }

    let result: fmt::Result = body(f);

    RENDERING.with(|stack| stack.borrow_mut().pop());

    result
}

fn write_joined<'v>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'v Value>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }

        write!(f, "{}", item)?;
    }

    Ok(())
}

/// `Display` is the textual representation (`repr`).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),

            Value::Bool(true) => f.write_str("True"),

            Value::Bool(false) => f.write_str("False"),

            Value::Int(n) => f.write_str(itoa::Buffer::new().format(*n)),

            Value::Float(n) => write_float(f, *n),

            Value::Str(s) => write_str_repr(f, s),

            Value::List(items) => write_guarded(f, Rc::as_ptr(items) as usize, "[...]", |f| {
                f.write_str("[")?;
                write_joined(f, items.borrow().iter())?;
                f.write_str("]")
            }),

            Value::Dict(d) => write_guarded(f, Rc::as_ptr(d) as usize, "{...}", |f| {
                f.write_str("{")?;

                for (i, (k, v)) in d.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }

                    write!(f, "{}: {}", k, v)?;
                }

                f.write_str("}")
            }),

            Value::Set(s) => write_guarded(f, Rc::as_ptr(s) as usize, "{...}", |f| {
                f.write_str("{")?;
                write_joined(f, s.borrow().iter())?;
                f.write_str("}")
            }),

            Value::Function(func) => {
                write!(f, "<function {} at {:p}>", func.name(), Rc::as_ptr(func))
            }

            Value::NativeFunction { name, .. } => write!(f, "<built-in function {}>", name),

            Value::Class(class) => write!(f, "<class '{}'>", class.name),

            Value::Instance(inst) => {
                write!(f, "<{} object at {:p}>", inst.class.name, Rc::as_ptr(inst))
            }
        }
    }
}

// Closures point back at environments that hold the function itself, so a
// derived Debug would recurse forever.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn dict(pairs: Vec<(Value, Value)>) -> Value {
        let mut d = Dict::new();
        for (k, v) in pairs {
            d.insert(k, v);
        }
        Value::Dict(Rc::new(RefCell::new(d)))
    }

    #[test]
    fn promotion_table() {
        assert_eq!(Value::Int(2).add(&Value::Int(3)).unwrap().repr(), "5");
        assert_eq!(Value::Int(2).add(&Value::Float(0.5)).unwrap().repr(), "2.5");
        assert_eq!(Value::Bool(true).add(&Value::Int(1)).unwrap().repr(), "2");
        assert_eq!(Value::Bool(true).mul(&Value::Float(2.0)).unwrap().repr(), "2.0");
        assert_eq!(Value::Int(7).sub(&Value::Bool(false)).unwrap().repr(), "7");
    }

    #[test]
    fn division_is_always_float() {
        assert_eq!(Value::Int(4).div(&Value::Int(2)).unwrap().repr(), "2.0");
        assert_eq!(Value::Int(1).div(&Value::Int(4)).unwrap().repr(), "0.25");

        let err = Value::Int(1).div(&Value::Int(0)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ZeroDivisionError);
        assert_eq!(err.message, "division by zero");

        assert!(Value::Float(1.0).div(&Value::Bool(false)).is_err());
    }

    #[test]
    fn repetition_clamps_negative_counts() {
        assert_eq!(Value::str("ab").mul(&Value::Int(3)).unwrap().repr(), "\"ababab\"");
        assert_eq!(Value::Int(-2).mul(&Value::str("ab")).unwrap().repr(), "\"\"");

        let list = Value::list(vec![Value::Int(1)]);
        assert_eq!(list.mul(&Value::Int(2)).unwrap().repr(), "[1, 1]");
    }

    #[test]
    fn oversized_repetition_is_a_value_error() {
        let huge = Value::Int(i64::MAX);

        let err = Value::str("ab").mul(&huge).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueError);
        assert_eq!(err.message, "repeated sequence is too long");

        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(huge.mul(&list).unwrap_err().kind, ErrorKind::ValueError);

        assert_eq!(Value::list(vec![]).mul(&huge).unwrap().repr(), "[]");
        assert_eq!(Value::str("").mul(&huge).unwrap().repr(), "\"\"");
    }

    #[test]
    fn mismatched_operands_are_type_errors() {
        let err = Value::str("a").add(&Value::Int(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert_eq!(err.message, "unsupported operand type(s) for +: 'str' and 'int'");

        let a = Value::list(vec![]);
        assert!(a.add(&Value::list(vec![])).is_err());
        assert!(Value::str("a").mul(&Value::str("b")).is_err());
        assert!(Value::str("a").neg().is_err());
    }

    #[test]
    fn falsy_values() {
        let falsy = vec![
            Value::Bool(false),
            Value::Int(0),
            Value::Float(0.0),
            Value::str(""),
            Value::list(vec![]),
            dict(vec![]),
            Value::Set(Rc::new(RefCell::new(Set::new()))),
            Value::None,
        ];

        for v in falsy {
            assert!(!v.is_truthy(), "{} should be falsy", v);
        }

        assert!(Value::Int(-1).is_truthy());
        assert!(Value::str("0").is_truthy());
        assert!(Value::list(vec![Value::None]).is_truthy());
    }

    #[test]
    fn rendering() {
        assert_eq!(Value::Float(3.0).repr(), "3.0");
        assert_eq!(Value::Float(0.1).repr(), "0.1");
        assert_eq!(Value::Float(f64::INFINITY).repr(), "inf");
        assert_eq!(Value::Float(f64::NAN).repr(), "nan");
        assert_eq!(Value::str("a\"b\n").repr(), "\"a\\\"b\\n\"");

        let nested = Value::list(vec![Value::str("x"), dict(vec![(Value::Int(1), Value::None)])]);
        assert_eq!(nested.repr(), "[\"x\", {1: None}]");
        assert_eq!(nested.repr(), nested.repr());
    }

    #[test]
    fn comparisons_are_textual() {
        assert!(Value::Int(2).compare(BinaryOp::Eq, &Value::Int(2)).unwrap());
        assert!(!Value::Int(2).compare(BinaryOp::Eq, &Value::Float(2.0)).unwrap());
        // "10" < "9" as text
        assert!(Value::Int(10).compare(BinaryOp::Less, &Value::Int(9)).unwrap());
    }

    #[test]
    fn dict_keys_collide_on_representation() {
        let d = dict(vec![(Value::Int(1), Value::str("a"))]);

        d.set_item(&Value::Int(1), Value::str("b")).unwrap();
        assert_eq!(d.len(), Some(1));
        assert_eq!(d.get_item(&Value::Int(1)).unwrap().repr(), "\"b\"");

        // True renders as "True", not "1"
        assert!(d.get_item(&Value::Bool(true)).is_err());

        let err = d.get_item(&Value::str("k")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::KeyError);
    }

    #[test]
    fn dict_can_hold_itself() {
        let d = dict(vec![]);

        d.set_item(&d, Value::Int(1)).unwrap();
        assert_eq!(d.repr(), "{{...}: 1}");

        let list = Value::list(vec![Value::None]);
        list.set_item(&Value::Int(0), list.clone()).unwrap();
        assert_eq!(list.repr(), "[[...]]");
    }

    #[test]
    fn indexing_rules() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);

        assert_eq!(list.get_item(&Value::Int(-1)).unwrap().repr(), "3");
        assert_eq!(list.get_item(&Value::Bool(true)).unwrap().repr(), "2");
        assert_eq!(list.get_item(&Value::Int(3)).unwrap_err().kind, ErrorKind::IndexError);
        assert_eq!(list.get_item(&Value::Int(-4)).unwrap_err().kind, ErrorKind::IndexError);
        assert_eq!(list.get_item(&Value::str("0")).unwrap_err().kind, ErrorKind::TypeError);

        list.set_item(&Value::Int(0), Value::Int(9)).unwrap();
        assert_eq!(list.repr(), "[9, 2, 3]");

        let s = Value::str("héllo");
        assert_eq!(s.get_item(&Value::Int(1)).unwrap().repr(), "\"é\"");
        assert!(s.set_item(&Value::Int(0), Value::str("x")).is_err());

        let set = Value::Set(Rc::new(RefCell::new(Set::new())));
        assert_eq!(
            set.get_item(&Value::Int(0)).unwrap_err().message,
            "'set' object is not subscriptable"
        );
    }

    #[test]
    fn list_aliases_share_mutation() {
        let a = Value::list(vec![Value::Int(1)]);
        let b = a.clone();

        b.set_item(&Value::Int(0), Value::Int(5)).unwrap();
        assert_eq!(a.repr(), "[5]");
    }

    #[test]
    fn membership() {
        let list = Value::list(vec![Value::Int(1), Value::str("a")]);

        assert!(list.contains(&Value::str("a")).unwrap());
        assert!(!list.contains(&Value::Int(2)).unwrap());
        assert!(Value::str("hello").contains(&Value::str("ell")).unwrap());
        assert!(Value::Int(1).contains(&Value::Int(1)).is_err());
    }

    #[test]
    fn attribute_lookup_walks_the_class_chain() {
        let base = Rc::new(Class::new("A", None));
        base.attrs.borrow_mut().insert("x".into(), Value::Int(1));
        base.attrs.borrow_mut().insert("y".into(), Value::Int(2));

        let derived = Rc::new(Class::new("B", Some(base)));
        derived.attrs.borrow_mut().insert("y".into(), Value::Int(20));

        let obj = Value::Instance(Rc::new(Instance::new(derived)));
        obj.set_attr("z", Value::Int(300)).unwrap();

        assert_eq!(obj.get_attr("x").unwrap().repr(), "1");
        assert_eq!(obj.get_attr("y").unwrap().repr(), "20");
        assert_eq!(obj.get_attr("z").unwrap().repr(), "300");
        assert_eq!(obj.type_name(), "B");
        assert!(obj.get_attr("missing").is_err());
        assert!(Value::Int(1).get_attr("x").is_err());
    }

    #[test]
    fn containers_are_unhashable() {
        assert!(Value::list(vec![]).check_hashable().is_err());
        assert!(Value::str("a").check_hashable().is_ok());
    }
}
