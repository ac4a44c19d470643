//! Bytecode opcodes for the C0 stack machine
//!
//! Defines the fixed opcode byte table and operand widths of the module format.

use serde::Serialize;
use std::fmt;

/// Opcodes emitted by the compiler.
///
/// Each opcode has a fixed byte value and a fixed operand width in the
/// module format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Opcode {
    // Literals
    /// Push an 8-byte immediate
    Push,

    // Addressing
    /// Push the address of a local slot
    Loca,
    /// Push the address of an argument slot (slot 0 is the return slot)
    Arga,
    /// Push the address of a global slot
    Globa,
    /// Reserve zeroed slots on the stack
    StackAlloc,
    /// Replace an address with the 64-bit value it points to
    Load64,
    /// Pop value and address, store value at address
    Store64,

    // Integer arithmetic
    /// Integer addition
    AddI,
    /// Integer subtraction
    SubI,
    /// Integer multiplication
    #[serde(rename = "multi")]
    MulI,
    /// Integer division
    DivI,
    /// Integer negation
    NegI,

    // Comparison
    /// Compare two integers, pushing -1, 0 or 1
    CmpI,
    /// Replace a comparison result with 1 if it was less-than, else 0
    SetLt,
    /// Replace a comparison result with 1 if it was greater-than, else 0
    SetGt,

    // Control flow
    /// Unconditional relative branch
    Br,
    /// Branch if the popped value is zero
    BrFalse,
    /// Branch if the popped value is non-zero
    BrTrue,
    /// Call a user function by function-table index
    Call,
    /// Return from the current function
    Ret,
    /// Call a library function by global name index
    CallName,
}

/// Every opcode, in byte-table order
pub const ALL_OPCODES: [Opcode; 21] = [
    Opcode::Push,
    Opcode::Loca,
    Opcode::Arga,
    Opcode::Globa,
    Opcode::Load64,
    Opcode::Store64,
    Opcode::StackAlloc,
    Opcode::AddI,
    Opcode::SubI,
    Opcode::MulI,
    Opcode::DivI,
    Opcode::CmpI,
    Opcode::NegI,
    Opcode::SetLt,
    Opcode::SetGt,
    Opcode::Br,
    Opcode::BrFalse,
    Opcode::BrTrue,
    Opcode::Call,
    Opcode::Ret,
    Opcode::CallName,
];

impl Opcode {
    /// The byte written to the module for this opcode
    pub fn byte(self) -> u8 {
        match self {
            Opcode::Push => 0x01,
            Opcode::Loca => 0x0a,
            Opcode::Arga => 0x0b,
            Opcode::Globa => 0x0c,
            Opcode::Load64 => 0x13,
            Opcode::Store64 => 0x17,
            Opcode::StackAlloc => 0x1a,
            Opcode::AddI => 0x20,
            Opcode::SubI => 0x21,
            Opcode::MulI => 0x22,
            Opcode::DivI => 0x23,
            Opcode::CmpI => 0x30,
            Opcode::NegI => 0x34,
            Opcode::SetLt => 0x39,
            Opcode::SetGt => 0x3a,
            Opcode::Br => 0x41,
            Opcode::BrFalse => 0x42,
            Opcode::BrTrue => 0x43,
            Opcode::Call => 0x48,
            Opcode::Ret => 0x49,
            Opcode::CallName => 0x4a,
        }
    }

    /// Look up an opcode by its module byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        ALL_OPCODES.iter().copied().find(|op| op.byte() == byte)
    }

    /// Width in bytes of the operand that follows the opcode byte.
    ///
    /// Zero means the instruction carries no operand at all.
    pub fn operand_width(self) -> usize {
        match self {
            Opcode::Push => 8,
            Opcode::Loca
            | Opcode::Arga
            | Opcode::Globa
            | Opcode::StackAlloc
            | Opcode::Br
            | Opcode::BrFalse
            | Opcode::BrTrue
            | Opcode::Call
            | Opcode::CallName => 4,
            Opcode::Load64
            | Opcode::Store64
            | Opcode::AddI
            | Opcode::SubI
            | Opcode::MulI
            | Opcode::DivI
            | Opcode::NegI
            | Opcode::CmpI
            | Opcode::SetLt
            | Opcode::SetGt
            | Opcode::Ret => 0,
        }
    }

    /// Whether this opcode takes an operand
    pub fn has_operand(self) -> bool {
        self.operand_width() > 0
    }

    /// Whether this is `brtrue` or `brfalse`
    pub fn is_conditional_branch(self) -> bool {
        matches!(self, Opcode::BrTrue | Opcode::BrFalse)
    }

    /// Whether this opcode transfers control by a relative offset
    pub fn is_branch(self) -> bool {
        matches!(self, Opcode::Br | Opcode::BrTrue | Opcode::BrFalse)
    }

    /// Assembly mnemonic
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Push => "push",
            Opcode::Loca => "loca",
            Opcode::Arga => "arga",
            Opcode::Globa => "globa",
            Opcode::StackAlloc => "stackalloc",
            Opcode::Load64 => "load64",
            Opcode::Store64 => "store64",
            Opcode::AddI => "addi",
            Opcode::SubI => "subi",
            Opcode::MulI => "multi",
            Opcode::DivI => "divi",
            Opcode::NegI => "negi",
            Opcode::CmpI => "cmpi",
            Opcode::SetLt => "setlt",
            Opcode::SetGt => "setgt",
            Opcode::Br => "br",
            Opcode::BrFalse => "brfalse",
            Opcode::BrTrue => "brtrue",
            Opcode::Call => "call",
            Opcode::Ret => "ret",
            Opcode::CallName => "callname",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
