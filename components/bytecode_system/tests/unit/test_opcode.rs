//! Tests for the Opcode table

use bytecode_system::opcode::ALL_OPCODES;
use bytecode_system::Opcode;

#[test]
fn test_only_push_has_wide_operand() {
    for op in ALL_OPCODES {
        if op == Opcode::Push {
            assert_eq!(op.operand_width(), 8);
        } else {
            assert!(op.operand_width() == 0 || op.operand_width() == 4, "{}", op);
        }
    }
}

#[test]
fn test_branch_classification() {
    assert!(Opcode::BrTrue.is_conditional_branch());
    assert!(Opcode::BrFalse.is_conditional_branch());
    assert!(!Opcode::Br.is_conditional_branch());
    assert!(Opcode::Br.is_branch());
    assert!(!Opcode::Call.is_branch());
}

#[test]
fn test_bytes_are_unique() {
    let mut bytes: Vec<u8> = ALL_OPCODES.iter().map(|op| op.byte()).collect();
    bytes.sort_unstable();
    bytes.dedup();
    assert_eq!(bytes.len(), ALL_OPCODES.len());
}

#[test]
fn test_operandless_opcodes() {
    for op in [
        Opcode::Load64,
        Opcode::Store64,
        Opcode::AddI,
        Opcode::SubI,
        Opcode::MulI,
        Opcode::DivI,
        Opcode::NegI,
        Opcode::CmpI,
        Opcode::SetLt,
        Opcode::SetGt,
        Opcode::Ret,
    ] {
        assert!(!op.has_operand(), "{} should not take an operand", op);
    }
}
