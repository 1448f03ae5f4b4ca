mod common;

use common::run_ok;
use pretty_assertions::assert_eq;

#[test]
fn numeric_promotion() {
    let out = run_ok("print(1 + 2, 1 + 2.0, True + 1, 7 / 2, 4 / 2, 2 * 3.0, 3 - True)\n");

    assert_eq!(out, "3 3.0 2 3.5 2.0 6.0 2\n");
}

#[test]
fn sequence_repetition_and_concatenation() {
    let out = run_ok("print('ab' * 2, [1] * 3, 2 * 'x', 'a' + 'b', [0] * -1)\n");

    assert_eq!(out, "\"abab\" [1, 1, 1] \"xx\" \"ab\" []\n");
}

#[test]
fn falsy_values_are_exhaustive() {
    let out = run_ok(
        "print(['T' if v else 'F' for v in [False, 0, 0.0, '', [], {}, None, 1, 'a', [0], -0.5]])\n",
    );

    assert_eq!(
        out,
        "[\"F\", \"F\", \"F\", \"F\", \"F\", \"F\", \"F\", \"T\", \"T\", \"T\", \"T\"]\n"
    );
}

#[test]
fn logical_operators_return_operands() {
    assert_eq!(run_ok("print(0 or 'x', 1 and 2, None or 0, not [])\n"), "\"x\" 2 0 True\n");
}

#[test]
fn short_circuit_skips_right_operand() {
    assert_eq!(run_ok("print(1 or undefined_name, 0 and 1 / 0)\n"), "1 0\n");
}

#[test]
fn comparisons_are_textual() {
    let out = run_ok("print(1 == 1, 1 == 1.0, 'b' > 'a', 2 < 10, [1, 2] == [1, 2])\n");

    assert_eq!(out, "True False True False True\n");
}

#[test]
fn membership() {
    let source = "\
d = {'a': 1}
print('at' in 'cat', 3 not in [1, 2], 'a' in d, 2 in {1, 2}, 'z' in d)
";

    assert_eq!(run_ok(source), "True True True True False\n");
}

#[test]
fn list_item_assignment() {
    assert_eq!(run_ok("x = [1, 2, 3]\nx[0] = 9\nprint(x)\n"), "[9, 2, 3]\n");
}

#[test]
fn negative_indices() {
    assert_eq!(run_ok("x = [1, 2, 3]\nprint(x[-1], 'abc'[-3])\nx[-2] = 0\nprint(x)\n"), "3 \"a\"\n[1, 0, 3]\n");
}

#[test]
fn lists_are_shared_by_reference() {
    assert_eq!(run_ok("a = [1]\nb = a\nb[0] = 2\nprint(a)\n"), "[2]\n");
}

#[test]
fn dict_keeps_insertion_order() {
    let source = "\
d = {'a': 1}
d['b'] = 2
d['a'] = 5
print(d, len(d), d['b'])
";

    assert_eq!(run_ok(source), "{\"a\": 5, \"b\": 2} 2 2\n");
}

#[test]
fn set_drops_duplicates() {
    assert_eq!(run_ok("s = {1, 2, 1, 'x'}\nprint(s, len(s))\n"), "{1, 2, \"x\"} 3\n");
}

#[test]
fn rendering_is_stable() {
    let source = "\
v = [1.5, {'k': [None, True]}, 'q']
print(v)
print(v)
";

    assert_eq!(run_ok(source), "[1.5, {\"k\": [None, True]}, \"q\"]\n".repeat(2));
}

#[test]
fn while_with_break_and_continue() {
    let source = "\
i = 0
total = 0
while True:
    i += 1
    if i > 6:
        break
    if i == 3:
        continue
    total += i
print(i, total)
";

    assert_eq!(run_ok(source), "7 18\n");
}

#[test]
fn for_over_string_and_list() {
    let source = "\
for c in 'hi':
    print(c)
for n in range(3):
    print(n * n)
print(n)
";

    assert_eq!(run_ok(source), "\"h\"\n\"i\"\n0\n1\n4\n2\n");
}

#[test]
fn for_destructuring() {
    let source = "\
for i, c in enumerate('ab'):
    print(i, c)
for a, b in [[1, 2], [3, 4]]:
    print(a + b)
";

    assert_eq!(run_ok(source), "0 \"a\"\n1 \"b\"\n3\n7\n");
}

#[test]
fn if_elif_else() {
    let source = "\
def sign(n):
    if n > 0:
        return 'pos'
    elif n == 0:
        return 'zero'
    else:
        return 'neg'
print(sign(5), sign(0), sign(-1))
";

    assert_eq!(run_ok(source), "\"pos\" \"zero\" \"neg\"\n");
}

#[test]
fn function_defaults() {
    let source = "\
def f(a, b=10):
    return a + b
print(f(5), f(5, 1))
";

    assert_eq!(run_ok(source), "15 6\n");
}

#[test]
fn default_is_evaluated_once() {
    let source = "\
calls = [0]
def tick():
    calls[0] += 1
    return calls[0]
def f(x=tick()):
    return x
print(f(), f(), f(5))
print(calls[0])
";

    assert_eq!(run_ok(source), "1 1 5\n1\n");
}

#[test]
fn mutable_default_is_shared_between_calls() {
    let source = "\
def grow(acc=[0]):
    acc[0] += 1
    return acc[0]
print(grow(), grow(), grow([10]))
";

    assert_eq!(run_ok(source), "1 2 11\n");
}

#[test]
fn closures_are_independent_per_call() {
    let source = "\
def counter(start):
    box = [start]
    def next():
        box[0] += 1
        return box[0]
    return next
a = counter(0)
b = counter(10)
print(a(), a(), b(), a())
";

    assert_eq!(run_ok(source), "1 2 11 3\n");
}

#[test]
fn closure_sees_outer_locals() {
    let source = "\
def make(n):
    def add(x):
        return x + n
    return add
add5 = make(5)
n = 100
print(add5(1))
";

    assert_eq!(run_ok(source), "6\n");
}

#[test]
fn recursion() {
    let source = "\
def fib(n):
    if n == 0 or n == 1:
        return n
    return fib(n - 1) + fib(n - 2)
print(fib(15))
";

    assert_eq!(run_ok(source), "610\n");
}

#[test]
fn assignment_in_function_is_local() {
    let source = "\
x = 1
def f():
    x = 2
    return x
print(f(), x)
";

    assert_eq!(run_ok(source), "2 1\n");
}

#[test]
fn lambdas_and_ternaries() {
    let source = "\
pick = lambda a, b: a if len(a) > len(b) else b
noop = lambda: None
print(pick('abc', 'de'), noop())
";

    assert_eq!(run_ok(source), "\"abc\" None\n");
}

#[test]
fn comprehensions() {
    let source = "\
xs = [1, 2, 3, 4]
print([x * 10 for x in xs if x / 2 == 1.0 or x == 3])
print({k: v for k, v in [['a', 1], ['b', 2]]})
print((c + c for c in 'ab'))
";

    assert_eq!(run_ok(source), "[20, 30]\n{\"a\": 1, \"b\": 2}\n[\"aa\", \"bb\"]\n");
}

#[test]
fn comprehension_variables_do_not_leak() {
    let source = "\
x = 'outer'
ys = [x for x in [1, 2]]
print(x, ys)
";

    assert_eq!(run_ok(source), "\"outer\" [1, 2]\n");
}

#[test]
fn print_renders_strings_quoted() {
    assert_eq!(
        run_ok("print('a', \"b c\", ['d'], None, 2.0)\nprint()\n"),
        "\"a\" \"b c\" [\"d\"] None 2.0\n\n"
    );
}

#[test]
fn print_as_a_value() {
    assert_eq!(run_ok("p = print\np('via', 'alias')\n"), "\"via\" \"alias\"\n");
}

#[test]
fn assert_that_holds_is_silent() {
    assert_eq!(run_ok("assert 1 == 1, 'never'\nprint('ok')\n"), "\"ok\"\n");
}

#[test]
fn pass_everywhere() {
    let source = "\
def f():
    pass
if True: pass
print(f())
";

    assert_eq!(run_ok(source), "None\n");
}

#[test]
fn wrapping_integer_arithmetic() {
    assert_eq!(
        run_ok("big = 9223372036854775807\nprint(big + 1)\n"),
        "-9223372036854775808\n"
    );
}

#[test]
fn containers_may_contain_themselves() {
    let source = "\
d = {}
d[d] = 1
xs = [0]
xs[0] = xs
print(d, xs, len(d))
";

    assert_eq!(run_ok(source), "{{...}: 1} [[...]] 1\n");
}

#[test]
fn augmented_assignment_evaluates_target_once() {
    let source = "\
trace = ['']
def mark(tag, v):
    trace[0] = trace[0] + tag
    return v
xs = [10]
xs[mark('i', 0)] += mark('v', 5)
print(xs, trace[0])
";

    assert_eq!(run_ok(source), "[15] \"iv\"\n");
}
