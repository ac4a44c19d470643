//! Parser error types and helpers

use crate::lexer::Token;
use core_types::{CompileError, ErrorKind, SourcePosition};

/// Result of a lexer operation
pub type LexResult<T> = Result<T, CompileError>;

/// Create a lexical error at a given position
pub fn lex_error(kind: ErrorKind, position: SourcePosition) -> CompileError {
    CompileError::new(kind, position)
}

/// Create an unexpected token error listing what would have been accepted
pub fn unexpected_token(expected: &[&str], found: &Token) -> CompileError {
    CompileError::new(
        ErrorKind::ExpectedToken {
            expected: expected.iter().map(|s| s.to_string()).collect(),
            found: found.kind.to_string(),
        },
        found.start,
    )
}

/// Create a semantic error at the start of a token
pub fn semantic_error(kind: ErrorKind, at: &Token) -> CompileError {
    CompileError::new(kind, at.start)
}
