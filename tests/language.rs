use std::fs;

use expreva::{
    ast::Value, error::RuntimeError, evaluate, parse, run_script, syntax_tree_to_pretty_string,
    value_to_pretty_string,
};
use walkdir::WalkDir;

#[test]
fn book_examples_work() {
    let mut count = 0;

    for entry in
        WalkDir::new("book/src").into_iter()
                                .filter_map(Result::ok)
                                .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
    {
        let path = entry.path();
        let content =
            fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));

        for (i, code) in extract_script_blocks(&content).into_iter().enumerate() {
            count += 1;
            if let Err(e) = run_script(&code, false) {
                panic!("Example {} in {:?} failed:\n{}\nError: {}", i + 1, path, code, e);
            }
        }
    }

    assert!(count > 0, "No expreva examples found in book/src");
}

fn extract_script_blocks(content: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut inside = false;
    let mut buf = String::new();

    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```expreva") {
            inside = true;
            buf.clear();
            continue;
        }
        if inside && trimmed.starts_with("```") {
            inside = false;
            blocks.push(buf.clone());
            continue;
        }
        if inside {
            buf.push_str(line);
            buf.push('\n');
        }
    }

    blocks
}

fn assert_success(src: &str) {
    if let Err(e) = run_script(src, false) {
        panic!("Script failed: {e}\n{src}");
    }
}

fn assert_failure(src: &str) {
    if run_script(src, false).is_ok() {
        panic!("Script succeeded but was expected to fail:\n{src}")
    }
}

fn assert_number(src: &str, expected: f64) {
    match run_script(src, false) {
        Ok(Value::Number(n)) => {
            assert!((n - expected).abs() < 1e-9, "{src} evaluated to {n}, expected {expected}")
        },
        other => panic!("{src} evaluated to {other:?}, expected the number {expected}"),
    }
}

fn assert_text(src: &str, expected: &str) {
    match run_script(src, false) {
        Ok(Value::Str(text)) => {
            assert_eq!(text.as_ref(), expected, "in script:\n{src}")
        },
        other => panic!("{src} evaluated to {other:?}, expected the string {expected:?}"),
    }
}

fn assert_display(src: &str, expected: &str) {
    match run_script(src, false) {
        Ok(value) => assert_eq!(value_to_pretty_string(&value), expected, "in script:\n{src}"),
        Err(e) => panic!("Script failed: {e}\n{src}"),
    }
}

fn assert_shape(src: &str, expected: &str) {
    let ast = parse(src).unwrap_or_else(|e| panic!("Failed to parse {src}: {e}"));
    assert_eq!(syntax_tree_to_pretty_string(&ast), expected, "for source:\n{src}");
}

fn assert_print_stable(src: &str) {
    let first = syntax_tree_to_pretty_string(&parse(src).unwrap());
    let second = syntax_tree_to_pretty_string(&parse(&first).unwrap_or_else(|e| {
                                                  panic!("Printed form failed to reparse: {first}\n{e}")
                                              }));
    assert_eq!(first, second, "printing is not stable for:\n{src}");
}

#[test]
fn arithmetic_and_precedence() {
    assert_number("1 + 1", 2.0);
    assert_number("1 + 2 * 3", 7.0);
    assert_number("(1 + 2) * 3", 9.0);
    assert_number("10 % 3", 1.0);
    assert_number("2 ^ 3 ^ 2", 512.0);
    assert_number("2 * -3", -6.0);
    assert_number("-(2 + 3)", -5.0);
    assert_number("7 - 2 - 1", 4.0);
}

#[test]
fn factorial_and_not() {
    assert_number("4!", 24.0);
    assert_number("-4!", -24.0);
    assert_success("assert(!false)");
    assert_success("assert(not false)");
    assert_success("assert(!0 == true)");
    assert_failure("(-4)!");
}

#[test]
fn comparisons_and_logic() {
    assert_success("assert(1 < 2)");
    assert_success("assert(2 <= 2)");
    assert_success("assert(3 > 2)");
    assert_success("assert(3 >= 3)");
    assert_success("assert(2 == 2)");
    assert_success("assert(2 != 3)");
    assert_success("assert('a' < 'b')");
    assert_success("assert(true and true)");
    assert_success("assert(false or true)");
    assert_success("assert(true && true)");
    assert_success("assert(false || true)");
    assert_number("0 || 5", 5.0);
    assert_number("3 && 5", 5.0);
}

#[test]
fn string_literals_and_escapes() {
    assert_text("'hello'", "hello");
    assert_text("\"a\\nb\"", "a\nb");
    assert_text("'it\\'s'", "it's");
    assert_text("\"\\u0041\"", "A");
    assert_text("'a' + 'b' + 1", "ab1");
}

#[test]
fn string_helpers() {
    assert_number("size('hello')", 5.0);
    assert_text("join(['a', 'b'], '-')", "a-b");
    assert_display("split('a,b', ',')", "['a', 'b']");
    assert_display("split('ab', '')", "['a', 'b']");
    assert_text("slice('hello', 1, 3)", "el");
    assert_text("char('hello', 1)", "e");
    assert_number("search('hello', 'llo')", 2.0);
    assert_text("repeat('ab', 3)", "ababab");
    assert_success("assert('ell' in 'hello')");
}

#[test]
fn variables_and_compound_assignment() {
    assert_number("x = 2 x += 3 x", 5.0);
    assert_number("x = 7 x -= 2 x", 5.0);
    assert_number("x = 4 x *= 2 x", 8.0);
    assert_number("x = 9 x /= 3 x", 3.0);
    assert_number("x = 2 x++ x", 3.0);
    assert_number("x = 2 x-- x", 1.0);
    assert_number("y = x = 3  y", 3.0);
}

#[test]
fn object_member_assignment() {
    assert_display("a = {} a.b = 'hi' a", "{ b: 'hi' }");
    assert_number("o = { a: { b: 1 } } o.a.b = 5 o.a.b", 5.0);
    assert_number("o = { n: 1 } o.n += 2 o.n", 3.0);
}

#[test]
fn list_literals() {
    assert_display("a = [1] b = [2] b", "[2]");
    assert_display("[1, ...[2, 3], 4]", "[1, 2, 3, 4]");
    assert_display("[1, 2] + 3", "[1, 2, 3]");
    assert_display("[1] + [2, 3]", "[1, 2, 3]");
    assert_display("[]", "[]");
}

#[test]
fn list_helpers() {
    assert_display("push([1], 2, 3)", "[1, 2, 3]");
    assert_display("pop([1, 2, 3])", "[1, 2]");
    assert_display("insert([1, 3], 1, 2)", "[1, 2, 3]");
    assert_display("slice([1, 2, 3, 4], 1, 3)", "[2, 3]");
    assert_display("keys([7, 8])", "[0, 1]");
    assert_number("search([4, 5, 6], 5)", 1.0);
    assert_success("assert(search([1], 9) == nil)");
    assert_number("size([1, 2, 3])", 3.0);
    assert_success("assert(2 in [1, 2])");
    assert_display("repeat([1, 2], 2)", "[1, 2, 1, 2]");
}

#[test]
fn higher_order_helpers() {
    assert_display("map([1, 2, 3], x => x * 2)", "[2, 4, 6]");
    assert_display("filter([1, 2, 3, 4], x => x % 2 == 0)", "[2, 4]");
    assert_number("reduce([1, 2, 3, 4], (acc, x) => acc + x, 0)", 10.0);
    assert_display("map([10, 20], (x, i) => i)", "[0, 1]");
}

#[test]
fn lambdas_and_calls() {
    assert_number("f = x => x*x  f(5)", 25.0);
    assert_number("add = (a, b) => a + b  add(2, 5)", 7.0);
    assert_number("five = () => 5  five()", 5.0);
    assert_number("(x => x)(3)", 3.0);
    assert_number("f = (x, y = 10) => x + y  f(1)", 11.0);
    assert_number("f = (x, y = 10) => x + y  f(1, 2)", 3.0);
    assert_number("f = (...rest) => size(rest)  f(1, 2, 3)", 3.0);
    // Missing arguments bind nil.
    assert_success("f = (a, b) => b  assert(f(1) == nil)");
}

#[test]
fn closures_are_lexical() {
    assert_number("make = v => (() => v)  g = make(42)  h = make(7)  g() + h()", 49.0);
    assert_number("x = 10  f = () => x  f()", 10.0);
}

#[test]
fn pipes() {
    assert_number("5 -> (x => x + 1)", 6.0);
    assert_number("square = x => x * x  5 -> square", 25.0);
    assert_number("add = (a, b) => a + b  3 -> add(4)", 7.0);
    assert_number("(3, 4) -> ((x, y) => x + y)", 7.0);
    assert_number("[1, 2, 3] -> size", 3.0);
    assert_number("5 -> (x => x * 2) -> (x => x + 1)", 11.0);
}

#[test]
fn conditionals() {
    assert_text("if 1 < 2 then 'yes' else 'no'", "yes");
    assert_text("if 1 > 2 then 'yes' else 'no'", "no");
    assert_text("if 1 < 2 'yes' else 'no'", "yes");
    assert_text("1 < 2 ? 'yes' : 'no'", "yes");
    assert_number("x = 5  x > 0 ? x : -x", 5.0);
    assert_success("assert((if false then 1) == nil)");
}

#[test]
fn tail_calls_run_in_constant_stack() {
    assert_text("loop = n => if n > 0 then loop(n - 1) else 'done'  loop(100000)", "done");
}

#[test]
fn member_access() {
    assert_number("o = { a: 1, b: { c: 2 } }  o.b.c", 2.0);
    assert_number("k = 'a'  o = { (k): 5 }  o.a", 5.0);
    assert_text("o = { 1: 'one' }  o.(1)", "one");
    assert_number("x = 2  o = { x }  o.x", 2.0);
    assert_number("o = { a: 1, ...{ b: 2 } }  o.a + o.b", 3.0);
    assert_success("o = {}  assert(o.missing == nil)");
    assert_success("o = { a: 1 }  assert(o.__proto__ == nil)");
    assert_success("assert('a' in { a: 1 })");
    assert_number("[10, 20, 30].(1)", 20.0);
    assert_success("assert([10].(5) == nil)");
}

#[test]
fn method_binding() {
    assert_number("o = { n: 5, f: () => this.n }  o.f()", 5.0);
    assert_number("o = { n: 2, double: () => this.n * 2 }  m = o.double  m()", 4.0);
}

#[test]
fn scope_objects() {
    assert_number("a = 1  global.a", 1.0);
    assert_number("local.y = 2  y", 2.0);
    assert_number("set(local, 'z', 9)  z", 9.0);
    assert_success("a = 1  assert('a' in global)");
    assert_number("use(local, { q: 4 })  q", 4.0);
}

#[test]
fn def_binds_in_the_global_scope() {
    // Assignment inside a function writes the evaluation's global scope.
    assert_number("f = () => (counter = 1)  f()  counter", 1.0);
    // `let` bindings stay local and shadow without writing through.
    assert_failure("let(['hidden', 1], hidden)  hidden");
}

#[test]
fn special_forms_through_call_syntax() {
    assert_number("do(a = 1, b = 2, a + b)", 3.0);
    assert_success("assert(do() == nil)");
    assert_number("let(['x', 1, 'y', 2], x + y)", 3.0);
    assert_number("x = 10  let(['x', 1], x) + x", 11.0);
    assert_number("eva(list(sym('+'), 1, 2))", 3.0);
    assert_success("assert(comment('anything') == nil)");
    assert_number("(1, 2, 3)", 3.0);
}

#[test]
fn macros_expand_before_evaluation() {
    assert_number("unless = macro (c, a, b) => list(sym('if'), c, b, a)  unless(false, 1, 2)",
                  1.0);
    assert_number("unless = macro (c, a, b) => list(sym('if'), c, b, a)  unless(true, 1, 2)",
                  2.0);
}

#[test]
fn try_and_catch() {
    assert_text("try(throw('boom'), catch(e, 'caught'))", "caught");
    assert_success("m = try(throw('boom'), catch(e, e.message))  assert(search(m, 'boom') != nil)");
    assert_text("try(1 / 0, catch(e, 'caught'))", "caught");
    assert_text("try(missing_name, catch(e, 'caught'))", "caught");
    assert_success("assert(try(missing_name) == nil)");
    assert_number("try(1 + 1)", 2.0);
}

#[test]
fn runtime_errors() {
    assert_failure("q");
    assert_failure("a = 5 a.b");
    assert_failure("1 / 0");
    assert_failure("assert(false)");
    assert_failure("size(1, 2)");
    assert_failure("3(4)");
    assert_failure("'a' - 1");
}

#[test]
fn undefined_symbol_is_reported_by_name() {
    let ast = parse("mystery").unwrap();
    let error = evaluate(&ast, None).unwrap_err();
    assert_eq!(error, RuntimeError::UndefinedSymbol { name: "mystery".to_string() });
}

#[test]
fn empty_and_nil() {
    assert_eq!(run_script("", false).unwrap(), Value::Nil);
    assert_eq!(run_script(";;;", false).unwrap(), Value::Nil);
    assert_eq!(run_script("()", false).unwrap(), Value::Nil);
    assert_eq!(run_script("// just a comment", false).unwrap(), Value::Nil);
    assert_success("assert(nil == nil)");
}

#[test]
fn grouping_needs_no_callee_adjacency() {
    // With a space, `(5)` is a grouped expression, not a call.
    assert_number("f = x => x  f (5)", 5.0);
    assert_number("f = x => x  f(5)", 5.0);
}

#[test]
fn deeply_nested_lists() {
    let depth = 1000;
    let source = format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
    let ast = parse(&source).unwrap();
    let value = evaluate(&ast, None).unwrap();
    let mut current = value;
    for _ in 0..depth {
        let Value::List(items) = current else {
            panic!("expected a list");
        };
        assert_eq!(items.len(), 1);
        current = items[0].clone();
    }
    assert_eq!(current, Value::Number(1.0));
}

#[test]
fn parse_errors_carry_position_and_partial() {
    let error = parse("a = 1; 3 +").unwrap_err();
    assert_eq!(error.line, 1);
    assert!(syntax_tree_to_pretty_string(&error.partial).contains("a = 1"));

    let error = parse("1 +\n)").unwrap_err();
    assert_eq!(error.line, 2);

    let error = parse("(1 + 2").unwrap_err();
    assert!(error.to_string().contains('('));
}

#[test]
fn lex_errors_report_position() {
    let error = parse("1 + \u{7}").unwrap_err();
    assert_eq!(error.line, 1);
    assert_eq!(error.column, 5);
}

#[test]
fn syntax_shapes() {
    assert_shape("x -> f", "f(x)");
    assert_shape("x -> f(y)", "f(x, y)");
    assert_shape("(a, b) -> f", "f(a, b)");
    assert_shape("a.b.c", "a.b.c");
    assert_shape("a and b", "a && b");
    assert_shape("not a", "!a");
    assert_shape("c ? 1 : 2", "if c then 1 else 2");
    assert_shape("x += 2", "x = x + 2");
    assert_shape("x++", "x = x + 1");
    assert_shape("{ k }", "{ k: k }");
    assert_shape("a = 1; b = 2", "a = 1; b = 2");
    assert_shape("1 + 2 * 3", "1 + 2 * 3");
    assert_shape("(1 + 2) * 3", "(1 + 2) * 3");
}

#[test]
fn printing_is_stable() {
    assert_print_stable("1 + 2 * 3");
    assert_print_stable("(1 + 2) * 3");
    assert_print_stable("f = x => x * x");
    assert_print_stable("if 1 < 2 then 'yes' else 'no'");
    assert_print_stable("a = {} ; a.b = 'hi' ; a");
    assert_print_stable("[1, ...xs, 2]");
    assert_print_stable("{ a: 1, 'b c': 2 }");
    assert_print_stable("o.a.b = 5");
    assert_print_stable("-x!");
    assert_print_stable("x -> f(y)");
    assert_print_stable("2 ^ 3 ^ 2");
    assert_print_stable("try(throw('x'), catch(e, e.message))");
}

#[test]
fn example_works() {
    let contents = fs::read_to_string("tests/example.expreva").unwrap();
    assert_success(&contents);
}
