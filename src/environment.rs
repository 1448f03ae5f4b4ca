use crate::error::Fault;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// What introduced a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
    Class,
    Builtin,
}

/// A bound name: its value, how it was introduced, and the line of the
/// binding site when there is one.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub value: Value,
    pub line: Option<usize>,
}

impl Symbol {
    pub fn new(kind: SymbolKind, value: Value, line: Option<usize>) -> Self {
        Symbol { kind, value, line }
    }
}

/// One scope frame.  Frames are shared (`Rc<RefCell<_>>`) because function
/// values keep their defining frame alive after it has been left.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Symbol>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in this frame, replacing any existing binding here.
    /// Outer frames are never touched.
    pub fn define(&mut self, name: &str, symbol: Symbol) {
        debug!("Defining '{}' as {:?}", name, symbol.kind);

        self.values.insert(name.to_string(), symbol);
    }

    /// Bind `name` only if this frame does not already have it.
    pub fn insert(&mut self, name: &str, symbol: Symbol) -> bool {
        if self.values.contains_key(name) {
            return false;
        }

        self.values.insert(name.to_string(), symbol);

        true
    }

    /// Search this frame, then the enclosing chain.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.values.get(name) {
            Some(symbol.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().lookup(name)
        } else {
            None
        }
    }

    /// This frame only.
    pub fn lookup_local(&self, name: &str) -> Option<Symbol> {
        self.values.get(name).cloned()
    }

    /// Value of `name` anywhere on the chain, or a `NameError`.
    pub fn get(&self, name: &str) -> Result<Value, Fault> {
        self.lookup(name)
            .map(|symbol| symbol.value)
            .ok_or_else(|| Fault::name(format!("name '{}' is not defined", name)))
    }
}
