mod common;

use common::{run, run_err, Sink};
use minipy as py;

use py::error::{ErrorKind, PyError};
use py::interpreter::Interpreter;
use py::parser::Parser;
use py::scanner::Scanner;
use py::token::Token;

use pretty_assertions::assert_eq;

fn runtime_message(source: &str) -> String {
    let (_, err) = run_err(source);

    assert!(
        matches!(err, PyError::Runtime { .. }),
        "expected a runtime error, got {:?}",
        err
    );

    err.to_string()
}

#[test]
fn division_by_zero_aborts_the_run() {
    let (stdout, err) = run_err("print('before')\nx = 1 / 0\nprint('after')\n");

    assert_eq!(stdout, "\"before\"\n");
    assert_eq!(err.kind(), Some(ErrorKind::ZeroDivisionError));
    assert_eq!(err.to_string(), "Line 2 ZeroDivisionError: division by zero");
}

#[test]
fn float_division_by_zero() {
    assert_eq!(
        runtime_message("print(1.5 / 0.0)\n"),
        "Line 1 ZeroDivisionError: division by zero"
    );
}

#[test]
fn undefined_name() {
    assert_eq!(
        runtime_message("x = 1\nprint(y)\n"),
        "Line 2 NameError: name 'y' is not defined"
    );
}

#[test]
fn missing_required_arguments() {
    let source = "\
def f(a, b=10):
    return a + b
f()
";

    assert_eq!(
        runtime_message(source),
        "Line 3 TypeError: f() missing 1 required positional argument: 'a'"
    );

    assert_eq!(
        runtime_message("def g(a, b):\n    pass\ng()\n"),
        "Line 3 TypeError: g() missing 2 required positional arguments: 'a' and 'b'"
    );
}

#[test]
fn too_many_arguments() {
    assert_eq!(
        runtime_message("def f(a):\n    pass\nf(1, 2)\n"),
        "Line 3 TypeError: f() takes from 1 to 1 positional arguments but 2 were given"
    );

    assert_eq!(
        runtime_message("def f(a, b=1):\n    pass\nf(1, 2, 3)\n"),
        "Line 3 TypeError: f() takes from 1 to 2 positional arguments but 3 were given"
    );

    assert_eq!(
        runtime_message("f = lambda: 0\nf(1)\n"),
        "Line 2 TypeError: <lambda>() takes from 0 to 0 positional arguments but 1 were given"
    );
}

#[test]
fn builtin_arity() {
    assert_eq!(
        runtime_message("len()\n"),
        "Line 1 TypeError: len() takes exactly one argument (0 given)"
    );
}

#[test]
fn destructuring_length_mismatch() {
    assert_eq!(
        runtime_message("for a, b in [[1, 2], [3]]:\n    pass\n"),
        "Line 1 ValueError: not enough values to unpack (expected 2, got 1)"
    );

    assert_eq!(
        runtime_message("for a, b in [[1, 2, 3]]:\n    pass\n"),
        "Line 1 ValueError: too many values to unpack (expected 2)"
    );

    assert_eq!(
        runtime_message("for a, b in [1]:\n    pass\n"),
        "Line 1 TypeError: cannot unpack non-iterable int object"
    );
}

#[test]
fn iterating_a_non_iterable() {
    assert_eq!(
        runtime_message("for x in 5:\n    pass\n"),
        "Line 1 TypeError: 'int' object is not iterable"
    );
}

#[test]
fn subscript_errors() {
    assert_eq!(
        runtime_message("xs = [1]\nxs[1]\n"),
        "Line 2 IndexError: list index out of range"
    );

    assert_eq!(
        runtime_message("d = {}\nd['x']\n"),
        "Line 2 KeyError: \"x\""
    );

    assert_eq!(
        runtime_message("s = 'abc'\ns[0] = 'z'\n"),
        "Line 2 TypeError: 'str' object does not support item assignment"
    );

    assert_eq!(
        runtime_message("{1, 2}[0]\n"),
        "Line 1 TypeError: 'set' object is not subscriptable"
    );

    assert_eq!(
        runtime_message("[1]['a']\n"),
        "Line 1 TypeError: list indices must be integers"
    );
}

#[test]
fn oversized_repetition() {
    assert_eq!(
        runtime_message("x = [1, 2] * 9223372036854775807\n"),
        "Line 1 ValueError: repeated sequence is too long"
    );

    assert_eq!(
        runtime_message("x = 9223372036854775807 * 'ab'\n"),
        "Line 1 ValueError: repeated sequence is too long"
    );
}

#[test]
fn unhashable_literal_keys() {
    assert_eq!(
        runtime_message("d = {[1]: 2}\n"),
        "Line 1 TypeError: unhashable type: 'list'"
    );

    assert_eq!(
        runtime_message("s = {1, {}}\n"),
        "Line 1 TypeError: unhashable type: 'dict'"
    );
}

#[test]
fn operator_type_errors() {
    assert_eq!(
        runtime_message("1 + 'a'\n"),
        "Line 1 TypeError: unsupported operand type(s) for +: 'int' and 'str'"
    );

    assert_eq!(
        runtime_message("-'a'\n"),
        "Line 1 TypeError: bad operand type for unary -: 'str'"
    );

    assert_eq!(
        runtime_message("1 in 2\n"),
        "Line 1 TypeError: argument of type 'int' is not iterable"
    );
}

#[test]
fn calling_a_non_callable() {
    assert_eq!(
        runtime_message("x = 3\nx()\n"),
        "Line 2 TypeError: 'int' object is not callable"
    );
}

#[test]
fn attribute_on_a_scalar() {
    assert_eq!(
        runtime_message("'s'.upper\n"),
        "Line 1 TypeError: 'str' object has no attribute 'upper'"
    );
}

#[test]
fn assertion_failure_carries_rendered_message() {
    let (_, err) = run_err("assert 1 == 2, 'bad'\n");

    assert_eq!(err.kind(), Some(ErrorKind::AssertionError));
    assert_eq!(err.to_string(), "Line 1 AssertionError: \"bad\"");

    let (_, err) = run_err("assert []\n");

    assert_eq!(err.kind(), Some(ErrorKind::AssertionError));
}

#[test]
fn error_inside_a_call_reports_the_inner_line() {
    let source = "\
def f(x):
    return x / 0
f(1)
";

    assert_eq!(
        runtime_message(source),
        "Line 2 ZeroDivisionError: division by zero"
    );
}

#[test]
fn static_errors_stop_before_execution() {
    let outcome = run("print('never')\nx = (1 +\n");

    assert_eq!(outcome.stdout, "");
    assert!(outcome.result.is_err_and(|e| e.is_static()));
}

#[test]
fn exit_codes() {
    let cases: &[(&str, i32)] = &[
        ("exit()\n", 0),
        ("exit(None)\n", 0),
        ("exit(3)\n", 3),
        ("exit(True)\n", 1),
        ("exit(False)\n", 0),
        ("exit(2.9)\n", 2),
        ("exit('bye')\n", 1),
    ];

    for (source, expected) in cases {
        let (_, err) = run_err(source);

        assert!(
            matches!(err, PyError::Exit { code } if code == *expected),
            "{:?} gave {:?}",
            source,
            err
        );
    }
}

#[test]
fn exit_stops_execution_and_keeps_output() {
    let source = "\
def stop():
    print('stopping')
    exit(4)
    print('unreachable')
stop()
print('unreachable')
";

    let outcome = run(source);

    assert_eq!(outcome.stdout, "\"stopping\"\n");
    assert!(matches!(outcome.result, Err(PyError::Exit { code: 4 })));
}

#[test]
fn exit_with_message_writes_to_stderr() {
    let outcome = run("exit('bye')\n");

    assert_eq!(outcome.stderr, "\"bye\"\n");
    assert_eq!(outcome.stdout, "");
}

#[test]
fn escaped_control_signal_is_internal() {
    // The resolver normally rejects this; drive the interpreter directly.
    let tokens: Vec<Token> = Scanner::new("break\n")
        .collect::<Result<_, PyError>>()
        .unwrap();
    let program = Parser::new(&tokens).parse().unwrap();

    let mut interpreter = Interpreter::with_output(Sink::default(), Sink::default());
    let err = interpreter.interpret(&program).unwrap_err();

    assert!(matches!(err, PyError::Internal(_)));
    assert_eq!(err.to_string(), "InternalError: 'break' outside loop");
}

#[test]
fn independent_interpreters_do_not_share_globals() {
    let mut first = Interpreter::with_output(Sink::default(), Sink::default());
    let mut second = Interpreter::with_output(Sink::default(), Sink::default());

    py::run(&mut first, "x = 1\n").unwrap();

    assert!(first.globals().borrow().lookup("x").is_some());
    assert!(second.globals().borrow().lookup("x").is_none());
    assert!(py::run(&mut second, "print(x)\n").is_err());
}
