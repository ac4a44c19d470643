//! Tests for Module serialization

use bytecode_system::{DecodeError, FunctionSlot, GlobalSlot, Instruction, Module, Opcode};

fn two_function_module() -> Module {
    Module {
        globals: vec![
            GlobalSlot::scalar(false),
            GlobalSlot::text("hello"),
            GlobalSlot::text("_start"),
            GlobalSlot::text("main"),
        ],
        functions: vec![
            FunctionSlot {
                name: 2,
                body: vec![
                    Instruction::with_operand(Opcode::StackAlloc, 1),
                    Instruction::with_operand(Opcode::Call, 1),
                ],
                ..FunctionSlot::default()
            },
            FunctionSlot {
                name: 3,
                ret_slots: 1,
                param_slots: 2,
                loc_slots: 1,
                body: vec![
                    Instruction::with_operand(Opcode::Arga, 0),
                    Instruction::with_operand(Opcode::Arga, 1),
                    Instruction::new(Opcode::Load64),
                    Instruction::with_operand(Opcode::Push, i64::MAX),
                    Instruction::new(Opcode::AddI),
                    Instruction::new(Opcode::Store64),
                    Instruction::with_operand(Opcode::BrFalse, -4),
                    Instruction::with_operand(Opcode::Globa, 0),
                    Instruction::new(Opcode::Ret),
                ],
            },
        ],
    }
}

#[test]
fn test_round_trip_preserves_tables() {
    let module = two_function_module();
    let decoded = Module::from_bytes(&module.to_bytes()).unwrap();
    assert_eq!(decoded.globals.len(), 4);
    assert_eq!(decoded.functions.len(), 2);
    assert_eq!(decoded.functions[1].param_slots, 2);
    assert_eq!(decoded.functions[1].body, module.functions[1].body);
}

#[test]
fn test_globa_bias_uses_function_count() {
    let module = two_function_module();
    assert_eq!(module.globa_bias(), 10);
}

#[test]
fn test_scalar_global_layout() {
    let module = Module {
        globals: vec![GlobalSlot::scalar(true)],
        functions: Vec::new(),
    };
    let bytes = module.to_bytes();
    assert_eq!(&bytes[8..12], &[0, 0, 0, 1]);
    assert_eq!(bytes[12], 1);
    assert_eq!(&bytes[13..17], &[0, 0, 0, 8]);
    assert_eq!(&bytes[17..25], &[0; 8]);
}

#[test]
fn test_unknown_opcode() {
    let mut bytes = Module {
        globals: vec![GlobalSlot::text("_start")],
        functions: vec![FunctionSlot {
            name: 0,
            body: vec![Instruction::new(Opcode::Ret)],
            ..FunctionSlot::default()
        }],
    }
    .to_bytes();
    let last = bytes.len() - 1;
    bytes[last] = 0xee;
    assert_eq!(
        Module::from_bytes(&bytes),
        Err(DecodeError::UnknownOpcode {
            byte: 0xee,
            offset: last
        })
    );
}

#[test]
fn test_trailing_bytes() {
    let mut bytes = Module::new().to_bytes();
    bytes.push(0);
    assert_eq!(Module::from_bytes(&bytes), Err(DecodeError::TrailingBytes(1)));
}

#[test]
fn test_unsupported_version() {
    let mut bytes = Module::new().to_bytes();
    bytes[7] = 2;
    assert_eq!(
        Module::from_bytes(&bytes),
        Err(DecodeError::UnsupportedVersion(2))
    );
}

#[test]
fn test_display_lists_functions() {
    let listing = two_function_module().to_string();
    assert!(listing.contains("main ret=1 params=2 locals=1"));
    assert!(listing.contains("brfalse(-4)"));
    assert!(listing.contains("\"hello\""));
}
