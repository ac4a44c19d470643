//! Bytecode instruction representation

use crate::opcode::Opcode;
use serde::Serialize;
use std::fmt;

/// A single instruction: an opcode plus an optional integer operand.
///
/// An absent operand is distinct from a zero operand. The compiler uses
/// absence for branch placeholders that have not been patched yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Instruction {
    /// The opcode for this instruction
    pub opcode: Opcode,
    /// Operand, if any
    pub operand: Option<i64>,
}

impl Instruction {
    /// Create an instruction without an operand
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            operand: None,
        }
    }

    /// Create an instruction with an operand
    pub fn with_operand(opcode: Opcode, operand: i64) -> Self {
        Self {
            opcode,
            operand: Some(operand),
        }
    }

    /// Whether operand presence matches what the opcode requires
    pub fn is_well_formed(&self) -> bool {
        self.opcode.has_operand() == self.operand.is_some()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Some(operand) => write!(f, "{}({})", self.opcode, operand),
            None => write!(f, "{}", self.opcode),
        }
    }
}
