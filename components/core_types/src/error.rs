//! Compile error types.
//!
//! Every failure in the compiler is fatal: the first error aborts the pass
//! and travels up the call chain as a [`CompileError`] carrying the source
//! position that triggered it.

use crate::SourcePosition;
use thiserror::Error;

/// The kind of compile error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    // Lexical errors
    /// A character that cannot start any token
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
    /// Unknown escape sequence inside a string or char literal
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),
    /// String or char literal without its closing quote
    #[error("unterminated literal")]
    UnterminatedLiteral,
    /// Char literal that is empty or holds more than one character
    #[error("char literal must hold exactly one character")]
    InvalidCharLiteral,
    /// Integer literal that does not fit in 64 bits
    #[error("integer literal '{0}' is too large")]
    IntegerOverflow(String),

    // Grammar errors
    /// The next token is not one of the accepted kinds
    #[error("expected {}, found {found}", .expected.join(" or "))]
    ExpectedToken {
        /// Token kinds that would have been accepted
        expected: Vec<String>,
        /// The token actually found
        found: String,
    },

    // Semantic errors
    /// Name already declared in an active scope
    #[error("duplicate declaration of '{0}'")]
    DuplicateDeclaration(String),
    /// Name not declared in any active scope
    #[error("'{0}' is not declared")]
    NotDeclared(String),
    /// Assignment to a constant
    #[error("cannot assign to constant '{0}'")]
    AssignToConstant(String),
    /// Assignment target or value is not valid
    #[error("invalid assignment")]
    InvalidAssignment,
    /// Returned value does not match the declared return type
    #[error("return type does not match function signature")]
    ReturnTypeWrong,
    /// Program has no function named `main`
    #[error("main function missing")]
    MainFunctionMissing,
    /// Type name that is not int, double or void
    #[error("unknown type '{0}'")]
    UnknownType(String),

    // Internal errors
    /// Instruction whose operand presence does not match its opcode
    #[error("unresolved operand for '{0}'")]
    UnresolvedOperand(String),
}

impl ErrorKind {
    /// Whether this error was raised by the tokenizer
    pub fn is_lexical(&self) -> bool {
        matches!(
            self,
            ErrorKind::UnexpectedCharacter(_)
                | ErrorKind::InvalidEscape(_)
                | ErrorKind::UnterminatedLiteral
                | ErrorKind::InvalidCharLiteral
                | ErrorKind::IntegerOverflow(_)
        )
    }

    /// Whether this error is a grammar mismatch
    pub fn is_grammar(&self) -> bool {
        matches!(self, ErrorKind::ExpectedToken { .. })
    }
}

/// A fatal compile error with the position that triggered it.
///
/// # Examples
///
/// ```
/// use core_types::{CompileError, ErrorKind, SourcePosition};
///
/// let error = CompileError::new(ErrorKind::ReturnTypeWrong, SourcePosition::new(4, 5, 60));
/// assert_eq!(error.to_string(), "4:5: return type does not match function signature");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{position}: {kind}")]
pub struct CompileError {
    /// What went wrong
    pub kind: ErrorKind,
    /// Where it went wrong
    pub position: SourcePosition,
}

impl CompileError {
    /// Create a new compile error
    pub fn new(kind: ErrorKind, position: SourcePosition) -> Self {
        Self { kind, position }
    }
}

/// Result alias used throughout the compiler
pub type CompileResult<T> = Result<T, CompileError>;
