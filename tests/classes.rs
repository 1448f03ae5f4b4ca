mod common;

use common::{run_err, run_ok};
use minipy::error::ErrorKind;
use pretty_assertions::assert_eq;

#[test]
fn inherited_constructor() {
    let source = "\
class A:
    def __init__(self, x):
        self.x = x
class B(A): pass
print(B(5).x)
";

    assert_eq!(run_ok(source), "5\n");
}

#[test]
fn attribute_resolution_order() {
    let source = "\
class Base:
    kind = 'base'
    def name(self):
        return 'Base'
    def greet(self):
        return 'hello from ' + self.name()
class Child(Base):
    def name(self):
        return 'Child'
c = Child()
print(c.greet(), c.kind)
c.kind = 'mine'
print(c.kind, Child.kind, Base().kind)
";

    assert_eq!(run_ok(source), "\"hello from Child\" \"base\"\n\"mine\" \"base\" \"base\"\n");
}

#[test]
fn class_fields_are_shared_until_shadowed() {
    let source = "\
class Counter:
    total = 0
Counter.total = 3
a = Counter()
b = Counter()
a.total = 1
print(a.total, b.total, Counter.total)
";

    assert_eq!(run_ok(source), "1 3 3\n");
}

#[test]
fn methods_mutate_instance_state() {
    let source = "\
class Stack:
    def __init__(self):
        self.items = [None] * 3
        self.size = 0
    def push(self, v):
        self.items[self.size] = v
        self.size += 1
        return self
s = Stack()
s.push(1).push(2)
print(s.items, s.size)
";

    assert_eq!(run_ok(source), "[1, 2, None] 2\n");
}

#[test]
fn function_read_from_class_is_unbound() {
    let source = "\
class A:
    def f(self, n):
        return n * 2
a = A()
print(A.f(a, 4), a.f(4))
";

    assert_eq!(run_ok(source), "8 8\n");
}

#[test]
fn function_stored_on_instance_is_not_bound() {
    let source = "\
class Box: pass
b = Box()
b.call = lambda x: x + 1
print(b.call(1))
";

    assert_eq!(run_ok(source), "2\n");
}

#[test]
fn init_return_value_is_ignored() {
    let source = "\
class A:
    def __init__(self):
        self.v = 1
        return 99
print(A().v)
";

    assert_eq!(run_ok(source), "1\n");
}

#[test]
fn class_and_instance_rendering() {
    let out = run_ok("class Point: pass\nprint(Point)\n");

    assert_eq!(out, "<class 'Point'>\n");

    let out = run_ok("class Point: pass\nprint(Point())\n");

    assert!(out.starts_with("<Point object at "), "got {}", out);
}

#[test]
fn missing_attribute() {
    let (_, err) = run_err("class A: pass\nA().missing\n");

    assert_eq!(err.kind(), Some(ErrorKind::TypeError));
    assert_eq!(err.to_string(), "Line 2 TypeError: 'A' object has no attribute 'missing'");
}

#[test]
fn constructor_arity_is_checked() {
    let source = "\
class A:
    def __init__(self, x):
        self.x = x
A()
";

    let (_, err) = run_err(source);

    assert_eq!(
        err.to_string(),
        "Line 4 TypeError: __init__() missing 1 required positional argument: 'x'"
    );
}

#[test]
fn multiple_inheritance_is_rejected() {
    let (_, err) = run_err("class A: pass\nclass B: pass\nclass C(A, B): pass\n");

    assert_eq!(
        err.to_string(),
        "Line 3 TypeError: multiple inheritance is not supported"
    );
}

#[test]
fn base_must_be_a_class() {
    let (_, err) = run_err("x = 1\nclass C(x): pass\n");

    assert_eq!(err.to_string(), "Line 2 TypeError: base class must be a class, not 'int'");
}
