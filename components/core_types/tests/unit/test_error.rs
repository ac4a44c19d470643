//! Unit tests for CompileError and ErrorKind

use core_types::{CompileError, CompileResult, ErrorKind, SourcePosition};

fn fails_at(line: u32) -> CompileResult<()> {
    Err(CompileError::new(
        ErrorKind::MainFunctionMissing,
        SourcePosition::new(line, 1, 0),
    ))
}

#[test]
fn test_error_carries_position() {
    let err = fails_at(12).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MainFunctionMissing);
    assert_eq!(err.position.line, 12);
}

#[test]
fn test_not_declared_message() {
    let kind = ErrorKind::NotDeclared("counter".to_string());
    assert!(kind.to_string().contains("not declared"));
    assert!(kind.to_string().contains("counter"));
}

#[test]
fn test_lexical_kinds() {
    assert!(ErrorKind::UnexpectedCharacter('#').is_lexical());
    assert!(ErrorKind::InvalidEscape('q').is_lexical());
    assert!(ErrorKind::InvalidCharLiteral.is_lexical());
    assert!(ErrorKind::IntegerOverflow("99999999999999999999".to_string()).is_lexical());
    assert!(!ErrorKind::InvalidAssignment.is_lexical());
}

#[test]
fn test_expected_token_is_grammar() {
    let kind = ErrorKind::ExpectedToken {
        expected: vec!["';'".to_string()],
        found: "'}'".to_string(),
    };
    assert!(kind.is_grammar());
    assert_eq!(kind.to_string(), "expected ';', found '}'");
}

#[test]
fn test_semantic_messages() {
    assert_eq!(
        ErrorKind::AssignToConstant("k".to_string()).to_string(),
        "cannot assign to constant 'k'"
    );
    assert_eq!(ErrorKind::MainFunctionMissing.to_string(), "main function missing");
    assert_eq!(
        ErrorKind::UnknownType("string".to_string()).to_string(),
        "unknown type 'string'"
    );
}

#[test]
fn test_error_is_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    let err = CompileError::new(ErrorKind::InvalidAssignment, SourcePosition::start());
    assert_error(&err);
}
