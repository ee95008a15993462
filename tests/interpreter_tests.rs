// ABOUTME: End-to-end tests driving the built CLI binary against the scenarios from the spec

use std::io::Write;
use std::process::Command;

fn script_path(name: &str, source: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("loxi_test_{name}_{}.lox", std::process::id()));
    let mut f = std::fs::File::create(&path).expect("create temp script");
    f.write_all(source.as_bytes()).expect("write temp script");
    path
}

fn run(command: &str, name: &str, source: &str) -> (String, String, i32) {
    let path = script_path(name, source);
    let output = Command::new(env!("CARGO_BIN_EXE_loxi"))
        .arg(command)
        .arg(&path)
        .output()
        .expect("run loxi binary");
    let _ = std::fs::remove_file(&path);
    (
        String::from_utf8(output.stdout).unwrap(),
        String::from_utf8(output.stderr).unwrap(),
        output.status.code().unwrap_or(-1),
    )
}

fn interpret(name: &str, source: &str) -> (String, String, i32) {
    run("interpret", name, source)
}

#[test]
fn arithmetic_and_print() {
    let (stdout, _, code) = interpret("arithmetic", "print 1 + 2 * 3;");
    assert_eq!(stdout, "Double: 7.000000\n");
    assert_eq!(code, 0);
}

#[test]
fn globals_and_mutation() {
    let (stdout, _, code) = interpret("globals", "var x = 1; x = x + 1; print x;");
    assert_eq!(stdout, "Double: 2.000000\n");
    assert_eq!(code, 0);
}

#[test]
fn assignment_without_prior_var_is_a_runtime_error_and_does_not_print() {
    let (stdout, stderr, code) = interpret("undeclared_assign", "x = 1;");
    assert_eq!(stdout, "");
    assert!(stderr.contains("Runtime Error"));
    assert_eq!(code, 0);
}

#[test]
fn block_scoping() {
    let (stdout, _, code) = interpret(
        "block_scoping",
        "var x=1; { var x=2; print x; } print x;",
    );
    assert_eq!(stdout, "Double: 2.000000\nDouble: 1.000000\n");
    assert_eq!(code, 0);
}

#[test]
fn closure_capture() {
    let (stdout, _, code) = interpret(
        "closure_capture",
        "fun mk(){ var n=0; fun step(){ n = n + 1; return n; } return step; } \
         var s = mk(); print s(); print s(); print s();",
    );
    assert_eq!(stdout, "Double: 1.000000\nDouble: 2.000000\nDouble: 3.000000\n");
    assert_eq!(code, 0);
}

#[test]
fn class_and_method_binding() {
    let (stdout, _, code) = interpret(
        "class_method",
        "class C { hi() { return \"hello\"; } } var c = C(); print c.hi(); \
         c.field = 42; print c.field;",
    );
    assert_eq!(stdout, "String: hello\nDouble: 42.000000\n");
    assert_eq!(code, 0);
}

#[test]
fn for_loop_desugar() {
    let (stdout, _, code) = interpret(
        "for_loop",
        "for (var i = 0; i < 3; i = i + 1) { print i; }",
    );
    assert_eq!(stdout, "Double: 0.000000\nDouble: 1.000000\nDouble: 2.000000\n");
    assert_eq!(code, 0);
}

#[test]
fn return_out_of_nested_block() {
    let (stdout, _, code) = interpret(
        "nested_return",
        "fun f(){ if (true) { return 7; } return 99; } print f();",
    );
    assert_eq!(stdout, "Double: 7.000000\n");
    assert_eq!(code, 0);
}

#[test]
fn independent_closures_do_not_share_state() {
    let (stdout, _, code) = interpret(
        "independent_closures",
        "fun make(x){ fun g(){ return x; } return g; } \
         var a=make(1); var b=make(2); print a(); print b();",
    );
    assert_eq!(stdout, "Double: 1.000000\nDouble: 2.000000\n");
    assert_eq!(code, 0);
}

#[test]
fn and_or_short_circuit_laws() {
    let (stdout, _, code) = interpret(
        "short_circuit",
        "print true and false; print true or false;",
    );
    assert_eq!(stdout, "Boolean: false\nBoolean: true\n");
    assert_eq!(code, 0);
}

#[test]
fn tokenize_emits_eof_as_last_token() {
    let (stdout, _, code) = run("tokenize", "tokenize_eof", "var x = 1;");
    assert!(stdout.lines().last().unwrap().starts_with("EOF"));
    assert_eq!(code, 0);
}

#[test]
fn tokenize_unterminated_string_exits_65() {
    let (_, stderr, code) = run("tokenize", "tokenize_unterminated", "\"abc");
    assert_eq!(code, 65);
    assert!(stderr.contains("Unterminated string"));
}

#[test]
fn parse_missing_semicolon_exits_66() {
    let (_, stderr, code) = run("parse", "parse_missing_semi", "var x = 1");
    assert_eq!(code, 66);
    assert!(stderr.contains("Syntax Error"));
}

#[test]
fn parse_pretty_prints_statement_tree() {
    let (stdout, _, code) = run("parse", "parse_pretty", "print 1 + 2 * 3;");
    assert_eq!(stdout.trim(), "(print (+ 1 (* 2 3)))");
    assert_eq!(code, 0);
}

#[test]
fn unreadable_file_exits_with_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_loxi"))
        .arg("interpret")
        .arg("/nonexistent/path/does/not/exist.lox")
        .output()
        .expect("run loxi binary");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn non_bool_condition_is_a_fatal_runtime_error() {
    let (stdout, stderr, code) = interpret("non_bool_condition", "if (\"x\") { print 1; }");
    assert_eq!(stdout, "");
    assert!(stderr.contains("Runtime Error"));
    assert_ne!(code, 0);
}

#[test]
fn division_by_zero_yields_nan() {
    let (stdout, _, code) = interpret("div_by_zero", "print 1 / 0;");
    assert_eq!(stdout, "Double: NaN\n");
    assert_eq!(code, 0);
}
