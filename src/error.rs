//! Centralised error hierarchy for the **minipy interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! Runtime faults are raised without location by the value model, the
//! environment and the builtins (see [`Fault`]); the interpreter attaches the
//! line of the node being evaluated before the fault leaves it.
//!
//! The module **does not** print diagnostics itself

use std::fmt;
use std::io;
use thiserror::Error;

use log::info;

/// Python-style classification of a runtime fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NameError,
    TypeError,
    IndexError,
    KeyError,
    ZeroDivisionError,
    AssertionError,
    ValueError,
    OSError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NameError => "NameError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::IndexError => "IndexError",
            ErrorKind::KeyError => "KeyError",
            ErrorKind::ZeroDivisionError => "ZeroDivisionError",
            ErrorKind::AssertionError => "AssertionError",
            ErrorKind::ValueError => "ValueError",
            ErrorKind::OSError => "OSError",
        };

        f.write_str(name)
    }
}

/// A runtime fault that has not yet been tied to a source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Fault {
    pub kind: ErrorKind,
    pub message: String,
}

impl Fault {
    pub fn new<S: Into<String>>(kind: ErrorKind, msg: S) -> Self {
        Fault {
            kind,
            message: msg.into(),
        }
    }

    pub fn name<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::NameError, msg)
    }

    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::TypeError, msg)
    }

    pub fn index<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::IndexError, msg)
    }

    pub fn key<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::KeyError, msg)
    }

    pub fn zero_division<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::ZeroDivisionError, msg)
    }

    pub fn value<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::ValueError, msg)
    }

    /// A failed write to the output sink.
    pub fn os(err: std::io::Error) -> Self {
        Self::new(ErrorKind::OSError, err.to_string())
    }

    /// Pin the fault to the line of the node that raised it.
    pub fn at(self, line: usize) -> PyError {
        info!("Raising {} at line {}: {}", self.kind, line, self.message);

        PyError::Runtime { line, fault: self }
    }
}

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PyError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Static‑analysis failure (misplaced `return`/`break`, duplicate parameters).
    #[error("[line {line}] Error: {message}")]
    Resolve { message: String, line: usize },

    /// Runtime evaluation error.
    #[error("Line {line} {fault}")]
    Runtime { line: usize, fault: Fault },

    /// A control-flow signal escaped the construct that should have consumed it.
    #[error("InternalError: {0}")]
    Internal(String),

    /// `exit()` was executed; the driver terminates the process with `code`.
    #[error("exit with status {code}")]
    Exit { code: i32 },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl PyError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        PyError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        PyError::Parse { message, line }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", line, message);

        PyError::Resolve { message, line }
    }

    /// The runtime fault kind, if this is a runtime error.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            PyError::Runtime { fault, .. } => Some(fault.kind),
            _ => None,
        }
    }

    /// Whether the error was produced before execution started.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            PyError::Lex { .. } | PyError::Parse { .. } | PyError::Resolve { .. }
        )
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, PyError>;
