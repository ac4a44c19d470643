//! Integration test suite for the C0 compiler
//!
//! This crate provides helpers that drive a program through every stage:
//! compile, encode to bytes, decode, and execute on the reference VM.

use bytecode_system::{DecodeError, Module};
use core_types::CompileError;
use interpreter::{Vm, VmError};
use thiserror::Error;

/// Re-export components for test convenience
pub mod components {
    pub use bytecode_system;
    pub use core_types;
    pub use interpreter;
    pub use parser;
}

/// Failure at any stage of the pipeline
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    /// Compilation failed
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// The encoded bytes did not decode
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Execution failed
    #[error(transparent)]
    Run(#[from] VmError),
}

/// Observable result of running a program
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Value left by the entry function, the return value of an `int` main
    pub result: Option<i64>,
    /// Text written through the library functions
    pub output: String,
}

/// Compile source text and return the module bytes
pub fn compile_to_bytes(source: &str) -> Result<Vec<u8>, PipelineError> {
    Ok(parser::compile(source)?.to_bytes())
}

/// Compile, encode and decode, returning the module the VM would load
pub fn load(source: &str) -> Result<Module, PipelineError> {
    let bytes = compile_to_bytes(source)?;
    Ok(Module::from_bytes(&bytes)?)
}

/// Run a program end to end with the given input values
pub fn run_source(source: &str, input: &[i64]) -> Result<Execution, PipelineError> {
    let module = load(source)?;
    let mut vm = Vm::with_input(input.iter().copied());
    let result = vm.run(&module)?;
    Ok(Execution {
        result,
        output: vm.take_output(),
    })
}
