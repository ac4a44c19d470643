//! Unit tests for interpreter components

use bytecode_system::{FunctionSlot, GlobalSlot, Instruction, Module, Opcode};
use interpreter::{CallFrame, Console, Vm, VmError, DEFAULT_STEP_LIMIT};

fn with(opcode: Opcode, operand: i64) -> Instruction {
    Instruction::with_operand(opcode, operand)
}

fn op(opcode: Opcode) -> Instruction {
    Instruction::new(opcode)
}

fn entry(body: Vec<Instruction>) -> FunctionSlot {
    FunctionSlot {
        body,
        ..FunctionSlot::default()
    }
}

// ============================================================================
// VM Tests
// ============================================================================

#[test]
fn test_vm_creation() {
    let vm = Vm::new();
    assert_eq!(vm.call_stack_depth(), 0);
    assert_eq!(vm.steps(), 0);
    assert_eq!(vm.global(0), None);
}

#[test]
fn test_vm_counts_steps() {
    let module = Module {
        globals: Vec::new(),
        functions: vec![entry(vec![
            with(Opcode::Push, 1),
            with(Opcode::Push, 2),
            op(Opcode::SubI),
        ])],
    };
    let mut vm = Vm::new();
    assert_eq!(vm.run(&module), Ok(Some(-1)));
    assert_eq!(vm.steps(), 3);
}

#[test]
fn test_vm_reruns_from_clean_state() {
    let module = Module {
        globals: vec![GlobalSlot::scalar(false)],
        functions: vec![entry(vec![
            with(Opcode::Globa, 0),
            with(Opcode::Globa, 0),
            op(Opcode::Load64),
            with(Opcode::Push, 1),
            op(Opcode::AddI),
            op(Opcode::Store64),
        ])],
    };
    let mut vm = Vm::new();
    vm.run(&module).unwrap();
    vm.run(&module).unwrap();
    assert_eq!(vm.global(0), Some(1));
}

#[test]
fn test_vm_locals_are_zeroed() {
    // _start: call 1
    // f: locals 2; loca 1; load64
    let callee = FunctionSlot {
        loc_slots: 2,
        body: vec![with(Opcode::Loca, 1), op(Opcode::Load64)],
        ..FunctionSlot::default()
    };
    let module = Module {
        globals: Vec::new(),
        functions: vec![entry(vec![with(Opcode::Call, 1)]), callee],
    };
    let mut vm = Vm::new();
    // Falling off the callee truncates to its base, which has no return slots
    assert_eq!(vm.run(&module), Ok(None));
}

#[test]
fn test_vm_unknown_function() {
    let module = Module {
        globals: Vec::new(),
        functions: vec![entry(vec![with(Opcode::Call, 3)])],
    };
    assert_eq!(Vm::new().run(&module), Err(VmError::UnknownFunction(3)));
}

#[test]
fn test_vm_call_with_missing_arguments() {
    let callee = FunctionSlot {
        ret_slots: 1,
        param_slots: 2,
        ..FunctionSlot::default()
    };
    let module = Module {
        globals: Vec::new(),
        functions: vec![entry(vec![with(Opcode::Call, 1)]), callee],
    };
    assert_eq!(Vm::new().run(&module), Err(VmError::StackUnderflow));
}

#[test]
fn test_vm_putstr_requires_text_global() {
    let module = Module {
        globals: Vec::new(),
        functions: vec![entry(vec![
            with(Opcode::Push, 4),
            with(Opcode::CallName, 6),
        ])],
    };
    assert_eq!(Vm::new().run(&module), Err(VmError::NotAString(4)));
}

#[test]
fn test_vm_putchar_rejects_invalid_code() {
    let module = Module {
        globals: Vec::new(),
        functions: vec![entry(vec![
            with(Opcode::Push, -1),
            with(Opcode::CallName, 5),
        ])],
    };
    assert_eq!(Vm::new().run(&module), Err(VmError::InvalidCharacter(-1)));
}

#[test]
fn test_vm_default_step_limit() {
    let module = Module {
        globals: Vec::new(),
        functions: vec![entry(vec![with(Opcode::Br, -1)])],
    };
    assert_eq!(
        Vm::new().run(&module),
        Err(VmError::StepLimitExceeded(DEFAULT_STEP_LIMIT))
    );
}

// ============================================================================
// CallFrame Tests
// ============================================================================

#[test]
fn test_call_frame_layout() {
    let frame = CallFrame::new(3, 4, 1, 2);
    assert_eq!(frame.arg_address(0), 4);
    assert_eq!(frame.arg_address(1), 5);
    assert_eq!(frame.local_address(0), 7);
    assert_eq!(frame.local_address(1), 8);
}

// ============================================================================
// Console Tests
// ============================================================================

#[test]
fn test_console_drives_vm_input() {
    let mut console = Console::new();
    console.push_input(11);
    let module = Module {
        globals: Vec::new(),
        functions: vec![entry(vec![
            with(Opcode::StackAlloc, 1),
            with(Opcode::CallName, 0),
            with(Opcode::CallName, 3),
        ])],
    };
    let mut vm = Vm::with_console(console);
    assert_eq!(vm.run(&module), Ok(None));
    assert_eq!(vm.output(), "11");
}

#[test]
fn test_error_messages() {
    assert_eq!(VmError::DivisionByZero.to_string(), "division by zero");
    assert_eq!(
        VmError::StepLimitExceeded(5).to_string(),
        "step limit of 5 exceeded"
    );
}
