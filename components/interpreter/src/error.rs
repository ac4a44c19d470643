//! Runtime errors

use thiserror::Error;

/// Result of a VM operation
pub type VmResult<T> = Result<T, VmError>;

/// Errors raised while executing a module
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// Pop from an empty stack or a frame larger than the stack
    #[error("stack underflow")]
    StackUnderflow,
    /// Load or store through an address that is neither a stack nor a global slot
    #[error("invalid address {0}")]
    InvalidAddress(i64),
    /// Branch target outside the function body
    #[error("branch to {target} outside function of {len} instructions")]
    InvalidJump {
        /// Computed target
        target: i64,
        /// Body length
        len: usize,
    },
    /// `call` to a function table entry that does not exist
    #[error("unknown function {0}")]
    UnknownFunction(i64),
    /// `callname` with an index outside the library functions
    #[error("unknown library function {0}")]
    UnknownBuiltin(i64),
    /// Instruction without the operand its opcode requires
    #[error("missing operand on {0}")]
    MissingOperand(String),
    /// Integer division by zero
    #[error("division by zero")]
    DivisionByZero,
    /// `getint`, `getdouble` or `getchar` with no input left
    #[error("input exhausted")]
    InputExhausted,
    /// `putchar` argument that is not a Unicode scalar value
    #[error("invalid character code {0}")]
    InvalidCharacter(i64),
    /// `putstr` argument that does not name a text global
    #[error("global {0} is not a string")]
    NotAString(i64),
    /// Execution ran past the configured step limit
    #[error("step limit of {0} exceeded")]
    StepLimitExceeded(u64),
}
