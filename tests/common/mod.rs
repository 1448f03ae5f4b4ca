#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use minipy as py;

use py::error::{PyError, Result};
use py::interpreter::Interpreter;

/// Shared in-memory writer so the test can read back what the interpreter
/// wrote after handing it a boxed copy.
#[derive(Clone, Default)]
pub struct Sink(Rc<RefCell<Vec<u8>>>);

impl Sink {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Outcome {
    pub stdout: String,
    pub stderr: String,
    pub result: Result<()>,
}

pub fn run(source: &str) -> Outcome {
    let out = Sink::default();
    let err = Sink::default();
    let mut interpreter = Interpreter::with_output(out.clone(), err.clone());

    let result = py::run(&mut interpreter, source);

    Outcome {
        stdout: out.contents(),
        stderr: err.contents(),
        result,
    }
}

/// Runs `source`, failing the test on any error, and returns stdout.
pub fn run_ok(source: &str) -> String {
    let outcome = run(source);

    if let Err(e) = &outcome.result {
        panic!("program failed: {}\n--- stdout ---\n{}", e, outcome.stdout);
    }

    outcome.stdout
}

/// Runs `source`, expecting it to fail, and returns stdout plus the error.
pub fn run_err(source: &str) -> (String, PyError) {
    let outcome = run(source);

    match outcome.result {
        Ok(()) => panic!("program succeeded:\n{}", outcome.stdout),
        Err(e) => (outcome.stdout, e),
    }
}
