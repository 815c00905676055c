//! End-to-end tests through the public entry points

use bamboo::{parse, run, Interpreter, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn run_ok(source: &str) -> Value {
    match run(source) {
        Ok(value) => value,
        Err(errors) => panic!("parse failed for {:?}: {:?}", source, errors.messages()),
    }
}

fn run_err(source: &str) -> String {
    match run_ok(source) {
        Value::Error(message) => message,
        other => panic!("expected runtime error for {:?}, got {:?}", source, other),
    }
}

proptest! {
    #[test]
    fn integer_literals_evaluate_to_themselves(n in 0..=i64::MAX) {
        prop_assert_eq!(run_ok(&n.to_string()), Value::Integer(n));
    }

    #[test]
    fn sums_match_host_arithmetic(a in -1000i64..1000, b in -1000i64..1000, c in 1i64..100) {
        let source = format!("({}) + ({}) * ({}) - ({}) / ({})", a, b, c, a, c);
        prop_assert_eq!(run_ok(&source), Value::Integer(a + b * c - a / c));
    }
}

#[test]
fn test_precedence_is_visible_in_serialization() {
    let program = parse("1 + 2 * 3").expect("valid program");
    assert_eq!(program.to_string(), "(1 + (2 * 3))");

    let reparsed = parse(&program.to_string()).expect("serialized form reparses");
    assert_eq!(reparsed, program);
}

#[test]
fn test_serialized_programs_reparse() {
    let sources = [
        "let f = fn(a, b) { if (a < b) { return a; } else { b } }; f(1, 2)",
        "let i = 0; while (i < 3) { i = i + 1 }",
        r#"{"k": [1, -2, !true]}["k"][0]"#,
    ];
    for source in sources {
        let program = parse(source).expect("valid program");
        let reparsed = parse(&program.to_string()).expect("serialized form reparses");
        assert_eq!(reparsed, program, "source: {}", source);
    }
}

#[test]
fn test_subtraction_is_left_associative() {
    assert_eq!(run_ok("1 - 2 - 3"), Value::Integer(-4));
}

#[test]
fn test_zero_is_truthy() {
    assert_eq!(run_ok("if (0) { 1 } else { 2 }"), Value::Integer(1));
    assert_eq!(run_ok("if (false) { 1 } else { 2 }"), Value::Integer(2));
}

#[test]
fn test_index_misses_are_null() {
    assert_eq!(run_ok("[1,2,3][10]"), Value::Null);
    assert_eq!(run_ok(r#"{"a":1}["b"]"#), Value::Null);
}

#[test]
fn test_errors_propagate_unchanged() {
    assert_eq!(run_err(r#"1 + "x""#), "type mismatch: INTEGER + STRING");
    assert_eq!(run_err(r#"(1 + "x") + 2"#), "type mismatch: INTEGER + STRING");
    assert_eq!(run_err(r#"len(1 + "x")"#), "type mismatch: INTEGER + STRING");
    assert_eq!(run_err(r#"[1][1 + "x"]"#), "type mismatch: INTEGER + STRING");
}

#[test]
fn test_return_short_circuits_block() {
    assert_eq!(run_ok("let f = fn() { if (true) { return 1; } 2; }; f()"), Value::Integer(1));
}

#[test]
fn test_parse_errors_are_collected() {
    let errors = run("let = 5; let x 10;").expect_err("invalid program");
    assert_eq!(
        errors.messages(),
        vec![
            "expected next token to be IDENT, got = instead".to_string(),
            "expected next token to be =, got INT instead".to_string(),
        ]
    );
}

#[test]
fn test_parse_error_display_includes_position() {
    let source = "let x = 1;\nlet = 2;";
    let errors = run(source).expect_err("invalid program").with_source(source);
    let first = errors.iter().next().expect("one error").to_string();
    assert!(first.starts_with("[line 2:"), "got {}", first);
    assert!(first.contains("let = 2;"), "got {}", first);
}

#[test]
fn test_session_keeps_bindings() {
    let mut interpreter = Interpreter::new();
    assert_eq!(interpreter.eval_source("let total = 0;"), Ok(Value::Null));
    assert_eq!(interpreter.eval_source("let add = fn(n) { total = total + n; total };"), Ok(Value::Null));
    assert_eq!(interpreter.eval_source("add(5)"), Ok(Value::Integer(5)));
    assert_eq!(interpreter.eval_source("add(7)"), Ok(Value::Integer(12)));
    assert_eq!(interpreter.eval_source("total"), Ok(Value::Integer(12)));
}

#[test]
fn test_runtime_error_does_not_poison_session() {
    let mut interpreter = Interpreter::new();
    interpreter.eval_source("let x = 1;").expect("valid");
    assert_eq!(
        interpreter.eval_source("x + true"),
        Ok(Value::Error("type mismatch: INTEGER + BOOLEAN".to_string()))
    );
    assert_eq!(interpreter.eval_source("x + 1"), Ok(Value::Integer(2)));
}

#[test]
fn test_builtins_end_to_end() {
    assert_eq!(run_ok(r#"len("bamboo")"#), Value::Integer(6));
    assert_eq!(run_ok("last(push([1, 2], 3))"), Value::Integer(3));
    assert_eq!(run_ok(r#"keys({"b": 1, "a": 2})"#).to_string(), "[b, a]");
    assert_eq!(run_ok(r#"type("x")"#), Value::string("String"));
    assert_eq!(run_err("first(1)"), "argument to `first` not supported, got INTEGER");
    assert_eq!(run_err("len()"), "wrong number of arguments. got=0, want=1");
}

#[test]
fn test_loops_and_assignment() {
    let source = r#"
        let fizz = fn(limit) {
            let i = 1;
            let out = [];
            while (i < limit + 1) {
                if (i / 3 * 3 == i) { out = push(out, "fizz"); } else { out = push(out, i); }
                i = i + 1;
            }
            out
        };
        fizz(6)
    "#;
    assert_eq!(run_ok(source).to_string(), "[1, 2, fizz, 4, 5, fizz]");
}

#[test]
fn test_value_rendering() {
    assert_eq!(run_ok("fn(x) { x * 2 }").to_string(), "fn(x) { (x * 2) }");
    assert_eq!(run_ok(r#"{"a": [1, true], 2: "two"}"#).to_string(), "{a: [1, true], 2: two}");
    assert_eq!(run_ok("if (false) { 1 }").to_string(), "NULL");
    assert_eq!(run_ok("1 / 0").to_string(), "ERROR: division by zero");
}

#[test]
fn test_deep_recursion_stays_in_process() {
    let sum = "let sum = fn(n) { if (n == 0) { 0 } else { n + sum(n - 1) } };";
    assert_eq!(run_ok(&format!("{} sum(5000)", sum)), Value::Integer(12_502_500));
    assert_eq!(run_err("let loop = fn(n) { loop(n + 1) }; loop(0)"), "stack overflow");
}

#[test]
fn test_deeply_nested_source_parses() {
    let depth = 20_000;
    let source = format!("{}7{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(run_ok(&source), Value::Integer(7));
}
