//! Compile Error Integration Tests
//!
//! Every error is fatal: compilation stops at the first one and reports its
//! kind and source position.

use core_types::{CompileError, ErrorKind};
use integration_tests::{run_source, PipelineError};

fn compile_error(source: &str) -> CompileError {
    parser::compile(source).unwrap_err()
}

fn at(err: &CompileError) -> (u32, u32) {
    (err.position.line, err.position.column)
}

// =============================================================================
// Semantic errors
// =============================================================================

#[test]
fn test_duplicate_local_reported_at_second_declaration() {
    let err = compile_error(
        "fn main() -> void {\n    let x: int = 1;\n    let x: int = 1;\n}",
    );
    assert_eq!(err.kind, ErrorKind::DuplicateDeclaration("x".to_string()));
    assert_eq!(at(&err), (3, 9));
}

#[test]
fn test_duplicate_global() {
    let err = compile_error("let g: int;\nconst g: int = 1;\nfn main() -> void {}");
    assert_eq!(err.kind, ErrorKind::DuplicateDeclaration("g".to_string()));
    assert_eq!(at(&err), (2, 7));
}

#[test]
fn test_duplicate_parameter() {
    let err = compile_error("fn f(a: int, a: int) -> void {} fn main() -> void {}");
    assert_eq!(err.kind, ErrorKind::DuplicateDeclaration("a".to_string()));
}

#[test]
fn test_locals_in_different_functions_do_not_collide() {
    assert!(parser::compile(
        "fn f() -> void { let x: int; } fn main() -> void { let x: int; }"
    )
    .is_ok());
}

#[test]
fn test_assign_to_constant_at_assignment_site() {
    let err = compile_error("fn main() -> void {\n    const x: int = 1;\n    x = 2;\n}");
    assert_eq!(err.kind, ErrorKind::AssignToConstant("x".to_string()));
    assert_eq!(at(&err), (3, 5));
}

#[test]
fn test_assign_to_const_parameter() {
    let err = compile_error("fn f(const n: int) -> void { n = 1; } fn main() -> void {}");
    assert_eq!(err.kind, ErrorKind::AssignToConstant("n".to_string()));
}

#[test]
fn test_assign_void_call_result() {
    let err = compile_error("fn nothing() -> void {} fn main() -> void { let x: int; x = nothing(); }");
    assert_eq!(err.kind, ErrorKind::InvalidAssignment);
}

#[test]
fn test_not_declared() {
    let err = compile_error("fn main() -> void {\n  putint(missing);\n}");
    assert_eq!(err.kind, ErrorKind::NotDeclared("missing".to_string()));
    assert_eq!(at(&err), (2, 10));
}

#[test]
fn test_call_before_declaration() {
    let err = compile_error("fn main() -> void { later(); } fn later() -> void {}");
    assert_eq!(err.kind, ErrorKind::NotDeclared("later".to_string()));
}

#[test]
fn test_return_type_mismatch() {
    let err = compile_error("fn f() -> int {\n  return;\n}\nfn main() -> void {}");
    assert_eq!(err.kind, ErrorKind::ReturnTypeWrong);
    assert_eq!(at(&err), (2, 3));
}

#[test]
fn test_main_missing() {
    let err = compile_error("fn helper() -> void {}\n");
    assert_eq!(err.kind, ErrorKind::MainFunctionMissing);
    assert_eq!(
        run_source("let x: int;", &[]),
        Err(PipelineError::Compile(compile_error("let x: int;")))
    );
}

// =============================================================================
// Lexical and grammar errors
// =============================================================================

#[test]
fn test_unterminated_string() {
    let err = compile_error("fn main() -> void { putstr(\"abc); }");
    assert_eq!(err.kind, ErrorKind::UnterminatedLiteral);
    assert!(err.kind.is_lexical());
}

#[test]
fn test_invalid_escape() {
    let err = compile_error("fn main() -> void { putstr(\"a\\qb\"); }");
    assert_eq!(err.kind, ErrorKind::InvalidEscape('q'));
}

#[test]
fn test_invalid_char_literal() {
    let err = compile_error("fn main() -> void { putchar('ab'); }");
    assert_eq!(err.kind, ErrorKind::InvalidCharLiteral);
}

#[test]
fn test_integer_overflow() {
    let err = compile_error("fn main() -> void { putint(99999999999999999999); }");
    assert_eq!(
        err.kind,
        ErrorKind::IntegerOverflow("99999999999999999999".to_string())
    );
}

#[test]
fn test_unexpected_character() {
    let err = compile_error("fn main() -> void { @ }");
    assert_eq!(err.kind, ErrorKind::UnexpectedCharacter('@'));
    assert_eq!(at(&err), (1, 21));
}

#[test]
fn test_grammar_error_lists_expected_token() {
    let err = compile_error("fn main() -> void { let x int; }");
    assert!(err.kind.is_grammar());
    assert_eq!(
        err.kind,
        ErrorKind::ExpectedToken {
            expected: vec!["':'".to_string()],
            found: "identifier 'int'".to_string(),
        }
    );
    assert_eq!(at(&err), (1, 27));
}

#[test]
fn test_first_error_wins() {
    let err = compile_error("fn main() -> void { a = 1; let b: int; let b: int; }");
    assert_eq!(err.kind, ErrorKind::NotDeclared("a".to_string()));
}

#[test]
fn test_error_display() {
    let err = compile_error("fn main() -> int {\n  return 1.5;\n}");
    assert_eq!(
        err.to_string(),
        "2:3: return type does not match function signature"
    );
}
