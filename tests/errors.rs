use rlox::error::LoxError;
use rlox::interpreter::Interpreter;
use rlox::value::Value;

fn run_err(source: &str) -> Vec<LoxError> {
    Interpreter::new()
        .run(source)
        .expect_err("program was expected to fail")
}

fn assert_single_runtime_error(source: &str, message: &str) {
    let errors = run_err(source);

    assert_eq!(errors.len(), 1);
    assert!(
        matches!(errors[0], LoxError::Runtime { .. }),
        "expected a runtime error, got {:?}",
        errors[0]
    );
    assert!(
        errors[0].to_string().contains(message),
        "diagnostic '{}' does not contain '{}'",
        errors[0],
        message
    );
}

// ---------------------------------------------------------------------
// Runtime errors
// ---------------------------------------------------------------------

#[test]
fn subtraction_rejects_strings() {
    assert_single_runtime_error("var x = \"x\" - 1;", "Operands must be numbers.");
}

#[test]
fn comparison_rejects_strings() {
    assert_single_runtime_error("var x = \"a\" < \"b\";", "Operands must be numbers.");
}

#[test]
fn addition_rejects_booleans() {
    assert_single_runtime_error(
        "var x = true + 1;",
        "Operands must be two numbers or two strings.",
    );
}

#[test]
fn unary_minus_rejects_non_numbers() {
    assert_single_runtime_error("var x = -\"x\";", "Operand must be a number.");
}

#[test]
fn division_by_zero() {
    assert_single_runtime_error("var x = 1 / 0;", "Divisor must be different from 0");
}

#[test]
fn reading_an_undefined_variable() {
    assert_single_runtime_error("var x = missing;", "Undefined variable 'missing'.");
}

#[test]
fn assigning_an_undefined_variable() {
    assert_single_runtime_error("missing = 1;", "Undefined variable 'missing'.");
}

#[test]
fn calling_a_non_callable() {
    assert_single_runtime_error("\"nope\"();", "Can only call functions and classes.");
}

#[test]
fn arity_mismatch() {
    assert_single_runtime_error(
        "fun f(a, b) {} f(1);",
        "Expected 2 arguments but got 1.",
    );
}

#[test]
fn runtime_error_diagnostic_format() {
    let errors = run_err("var x = 1;\nvar y = \"x\" - 1;");

    assert_eq!(
        errors[0].to_string(),
        "Operands must be numbers.\n[line 2]"
    );
}

#[test]
fn runtime_error_aborts_but_keeps_earlier_effects() {
    let mut interp = Interpreter::new();
    let errors = interp
        .run("var a = 1;\nvar b = \"x\" - 1;\nvar c = 3;")
        .unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(interp.get_global("a"), Some(Value::Number(1.0)));
    assert_eq!(interp.get_global("c"), None);
}

// ---------------------------------------------------------------------
// Static diagnostics
// ---------------------------------------------------------------------

#[test]
fn return_outside_a_function() {
    let errors = run_err("return 1;");

    assert!(matches!(errors[0], LoxError::Resolve { .. }));
    assert!(errors[0]
        .to_string()
        .contains("Can't return from top-level code."));
}

#[test]
fn escaped_return_signal_is_a_runtime_error() {
    // Driving interpret without the resolver lets the signal reach the top.
    let tokens = rlox::scanner::Scanner::new("return 1;")
        .filter_map(Result::ok)
        .collect();

    let mut parser = rlox::parser::Parser::new(tokens, 0);
    let statements = parser.parse();
    assert!(parser.take_errors().is_empty());

    let err = Interpreter::new()
        .interpret(&statements)
        .expect_err("the return signal has no call site to consume it");

    assert!(matches!(err, LoxError::Runtime { .. }));
    assert_eq!(
        err.to_string(),
        "Can't return from top-level code.\n[line 1]"
    );
}

#[test]
fn redeclaration_in_the_same_scope() {
    let errors = run_err("{ var a = 1; var a = 2; }");

    assert!(matches!(errors[0], LoxError::Resolve { .. }));
    assert!(errors[0]
        .to_string()
        .contains("Already a variable with this name in this scope."));
}

#[test]
fn reading_a_local_in_its_own_initializer() {
    let errors = run_err("var a = 1;\n{ var a = a; }");

    assert!(errors[0]
        .to_string()
        .contains("Can't read local variable in its own initializer."));
}

#[test]
fn global_redeclaration_is_allowed() {
    let mut interp = Interpreter::new();

    interp.run("var a = 1; var a = 2;").unwrap();

    assert_eq!(interp.get_global("a"), Some(Value::Number(2.0)));
}

#[test]
fn lex_and_parse_diagnostics_surface_together() {
    // The '@' is a lex error; with it skipped, the initializer is missing
    // and the parser reports too.
    let errors = run_err("var a = @;");

    assert_eq!(errors.len(), 2);
    assert!(matches!(errors[0], LoxError::Lex { .. }));
    assert!(errors[0].to_string().contains("Unexpected character."));
    assert!(matches!(errors[1], LoxError::Parse { .. }));
}

#[test]
fn static_errors_suppress_execution() {
    let mut interp = Interpreter::new();

    assert!(interp.run("var a = 1;\nvar b = ;").is_err());

    assert_eq!(interp.get_global("a"), None);
}

#[test]
fn missing_semicolon_diagnostic_format() {
    let errors = run_err("print 1");

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "[line 1] Error at end: Expected ';' after value."
    );
}
