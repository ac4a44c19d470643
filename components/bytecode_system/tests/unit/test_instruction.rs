//! Tests for Instruction

use bytecode_system::{Instruction, Opcode};

#[test]
fn test_with_operand_is_well_formed() {
    let inst = Instruction::with_operand(Opcode::Loca, 2);
    assert!(inst.is_well_formed());
    assert_eq!(inst.to_string(), "loca(2)");
}

#[test]
fn test_negative_branch_display() {
    let inst = Instruction::with_operand(Opcode::Br, -7);
    assert_eq!(inst.to_string(), "br(-7)");
}

#[test]
fn test_instruction_serializes_to_json() {
    let inst = Instruction::with_operand(Opcode::CallName, 3);
    let json = serde_json::to_value(inst).unwrap();
    assert_eq!(json["opcode"], "callname");
    assert_eq!(json["operand"], 3);
}
