//! Contract compliance tests for bytecode_system
//! Verifies the opcode byte table and module layout consumed by the VM

use bytecode_system::{Module, Opcode, MAGIC, VERSION};

/// Verify every opcode byte matches the published table
#[test]
fn test_contract_opcode_bytes() {
    let table = [
        (Opcode::Push, 0x01),
        (Opcode::Loca, 0x0a),
        (Opcode::Arga, 0x0b),
        (Opcode::Globa, 0x0c),
        (Opcode::StackAlloc, 0x1a),
        (Opcode::Load64, 0x13),
        (Opcode::Store64, 0x17),
        (Opcode::AddI, 0x20),
        (Opcode::SubI, 0x21),
        (Opcode::MulI, 0x22),
        (Opcode::DivI, 0x23),
        (Opcode::NegI, 0x34),
        (Opcode::CmpI, 0x30),
        (Opcode::SetLt, 0x39),
        (Opcode::SetGt, 0x3a),
        (Opcode::Br, 0x41),
        (Opcode::BrFalse, 0x42),
        (Opcode::BrTrue, 0x43),
        (Opcode::Call, 0x48),
        (Opcode::Ret, 0x49),
        (Opcode::CallName, 0x4a),
    ];
    for (op, byte) in table {
        assert_eq!(op.byte(), byte, "{}", op);
    }
}

/// Verify header constants
#[test]
fn test_contract_header() {
    assert_eq!(MAGIC, 0x72303b3e);
    assert_eq!(VERSION, 1);
}

/// Verify an empty module is header plus two zero counts
#[test]
fn test_contract_empty_module() {
    let bytes = Module::new().to_bytes();
    assert_eq!(
        bytes,
        vec![0x72, 0x30, 0x3b, 0x3e, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0]
    );
}
