//! Reference interpreter for compiled C0 modules
//!
//! This crate provides a small stack machine that executes a [`Module`]:
//! - 64-bit slots for values and addresses
//! - Call frames laid out as return slots, parameters, locals
//! - The eight library functions over an integer input queue and a text output buffer
//! - A step limit so runaway loops end with an error
//!
//! [`Module`]: bytecode_system::Module
//!
//! # Example
//!
//! ```
//! use interpreter::Vm;
//! use bytecode_system::{FunctionSlot, Instruction, Module, Opcode};
//!
//! let mut module = Module::new();
//! module.functions.push(FunctionSlot {
//!     body: vec![
//!         Instruction::with_operand(Opcode::Push, 40),
//!         Instruction::with_operand(Opcode::Push, 2),
//!         Instruction::new(Opcode::AddI),
//!     ],
//!     ..FunctionSlot::default()
//! });
//!
//! let mut vm = Vm::new();
//! assert_eq!(vm.run(&module).unwrap(), Some(42));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call_frame;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod vm;

// Re-export main types at crate root
pub use call_frame::CallFrame;
pub use console::Console;
pub use error::{VmError, VmResult};
pub use vm::{Vm, DEFAULT_STEP_LIMIT};
