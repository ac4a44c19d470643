//! Bytecode system for the C0 compiler
//!
//! This crate provides the instruction set, the in-memory module model and
//! its binary serialization.
//!
//! # Features
//!
//! - Stack-machine opcode table with fixed byte values and operand widths
//! - Instructions with optional operands (absent is distinct from zero)
//! - Global and function tables
//! - Big-endian binary serialization with validation on decode
//!
//! # Example
//!
//! ```
//! use bytecode_system::{FunctionSlot, GlobalSlot, Instruction, Module, Opcode};
//!
//! let mut module = Module::new();
//! module.globals.push(GlobalSlot::text("_start"));
//! module.functions.push(FunctionSlot {
//!     name: 0,
//!     body: vec![Instruction::new(Opcode::Ret)],
//!     ..FunctionSlot::default()
//! });
//!
//! let bytes = module.to_bytes();
//! let restored = Module::from_bytes(&bytes).unwrap();
//! assert_eq!(restored, module);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod instruction;
pub mod module;
pub mod opcode;

// Re-export main types at crate root
pub use instruction::Instruction;
pub use module::{DecodeError, FunctionSlot, GlobalSlot, Module, BUILTIN_COUNT, MAGIC, VERSION};
pub use opcode::Opcode;
