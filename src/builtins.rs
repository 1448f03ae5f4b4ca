//! The standard library: `print`, `len`, `range`, `dir`, `enumerate`.
//!
//! Each interpreter builds its own [`Builtins`] and installs it into its
//! global frame, so independent interpreters never share state.

use std::io::Write;

use log::{debug, info};

use crate::environment::{Environment, Symbol, SymbolKind};
use crate::error::Fault;
use crate::value::{NativeFn, Value};

pub struct Builtins {
    entries: Vec<Value>,
}

impl Builtins {
    /// The fixed set of builtin functions.
    pub fn standard() -> Self {
        Builtins {
            entries: vec![
                native("print", None, print),
                native("len", Some(1), len),
                native("range", Some(1), range),
                native("dir", Some(1), dir),
                native("enumerate", Some(1), enumerate),
            ],
        }
    }

    /// Bind every builtin in `env` (normally the global frame).
    pub fn install(&self, env: &mut Environment) {
        for value in &self.entries {
            if let Value::NativeFunction { name, .. } = value {
                debug!("Installing builtin '{}'", name);

                if !env.insert(name, Symbol::new(SymbolKind::Builtin, value.clone(), None)) {
                    debug!("'{}' is already bound, keeping it", name);
                }
            }
        }

        info!("Installed {} builtins", self.entries.len());
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().filter_map(|v| match v {
            Value::NativeFunction { name, .. } => Some(*name),
            _ => None,
        })
    }
}

fn native(name: &'static str, arity: Option<usize>, func: NativeFn) -> Value {
    Value::NativeFunction { name, arity, func }
}

/// Reject a call whose argument count differs from a fixed arity.
pub fn check_arity(name: &str, arity: Option<usize>, given: usize) -> Result<(), Fault> {
    match arity {
        Some(1) if given != 1 => Err(Fault::type_error(format!(
            "{}() takes exactly one argument ({} given)",
            name, given
        ))),

        Some(n) if given != n => Err(Fault::type_error(format!(
            "{}() takes exactly {} arguments ({} given)",
            name, n, given
        ))),

        _ => Ok(()),
    }
}

pub(crate) fn print(out: &mut dyn Write, args: &[Value]) -> Result<Value, Fault> {
    let line: String = args
        .iter()
        .map(Value::repr)
        .collect::<Vec<String>>()
        .join(" ");

    writeln!(out, "{}", line).map_err(Fault::os)?;

    Ok(Value::None)
}

fn len(_: &mut dyn Write, args: &[Value]) -> Result<Value, Fault> {
    let arg: &Value = &args[0];

    arg.len().map(|n| Value::Int(n as i64)).ok_or_else(|| {
        Fault::type_error(format!(
            "object of type '{}' has no len()",
            arg.type_name()
        ))
    })
}

fn range(_: &mut dyn Write, args: &[Value]) -> Result<Value, Fault> {
    let n: i64 = args[0]
        .as_index()
        .ok_or_else(|| Fault::type_error("range() argument must be int"))?;

    Ok(Value::list((0..n.max(0)).map(Value::Int).collect()))
}

fn dir(_: &mut dyn Write, args: &[Value]) -> Result<Value, Fault> {
    let names: Vec<Value> = match &args[0] {
        Value::List(items) => (0..items.borrow().len())
            .map(|i| Value::Str(i.to_string()))
            .collect(),

        Value::Dict(d) => d.borrow().keys().map(|k| Value::Str(k.repr())).collect(),

        Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),

        Value::Set(s) => s.borrow().iter().map(|v| Value::Str(v.repr())).collect(),

        _ => Vec::new(),
    };

    Ok(Value::list(names))
}

fn enumerate(_: &mut dyn Write, args: &[Value]) -> Result<Value, Fault> {
    let items: Vec<Value> = match &args[0] {
        Value::Dict(d) => d.borrow().keys().cloned().collect(),
        other => other.iterate()?,
    };

    Ok(Value::list(
        items
            .into_iter()
            .enumerate()
            .map(|(i, v)| Value::list(vec![Value::Int(i as i64), v]))
            .collect(),
    ))
}
