//! Virtual Machine for module execution
//!
//! Main entry point for running a compiled module. Execution starts at
//! function table entry 0, the entry function, and ends when it returns.

use bytecode_system::Module;
use tracing::debug;

use crate::call_frame::CallFrame;
use crate::console::Console;
use crate::error::{VmError, VmResult};

/// Default bound on executed instructions
pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

/// Addresses at or above this value refer to global slots
pub(crate) const GLOBAL_BASE: i64 = 1 << 40;

/// Stack machine with 64-bit slots
#[derive(Debug)]
pub struct Vm {
    pub(crate) stack: Vec<i64>,
    pub(crate) globals: Vec<i64>,
    pub(crate) frames: Vec<CallFrame>,
    pub(crate) console: Console,
    step_limit: u64,
    steps: u64,
}

impl Vm {
    /// Create a VM with no input and the default step limit
    pub fn new() -> Self {
        Self::with_console(Console::new())
    }

    /// Create a VM reading library input from the given values
    pub fn with_input(values: impl IntoIterator<Item = i64>) -> Self {
        Self::with_console(Console::with_input(values))
    }

    /// Create a VM around an existing console
    pub fn with_console(console: Console) -> Self {
        Self {
            stack: Vec::with_capacity(256),
            globals: Vec::new(),
            frames: Vec::with_capacity(64),
            console,
            step_limit: DEFAULT_STEP_LIMIT,
            steps: 0,
        }
    }

    /// Set the maximum number of instructions a run may execute
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = limit;
        self
    }

    /// Execute a module from its entry function.
    ///
    /// Returns the value left on top of the stack, which for a program whose
    /// `main` returns `int` is that return value.
    pub fn run(&mut self, module: &Module) -> VmResult<Option<i64>> {
        self.stack.clear();
        self.frames.clear();
        self.steps = 0;
        self.globals = vec![0; module.globals.len()];

        if module.functions.is_empty() {
            return Err(VmError::UnknownFunction(0));
        }
        self.frames.push(CallFrame::new(0, 0, 0, 0));
        debug!(functions = module.functions.len(), "starting execution");

        while let Some(frame) = self.frames.last_mut() {
            let body = &module.functions[frame.function].body;
            let Some(&inst) = body.get(frame.pc) else {
                self.return_from_call();
                continue;
            };
            frame.pc += 1;

            self.steps += 1;
            if self.steps > self.step_limit {
                return Err(VmError::StepLimitExceeded(self.step_limit));
            }
            self.dispatch(module, inst)?;
        }

        debug!(steps = self.steps, "execution finished");
        Ok(self.stack.last().copied())
    }

    /// Instructions executed by the last run
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Text written by the program
    pub fn output(&self) -> &str {
        self.console.output()
    }

    /// Take the program's output
    pub fn take_output(&mut self) -> String {
        self.console.take_output()
    }

    /// Value of a global slot after a run
    pub fn global(&self, slot: usize) -> Option<i64> {
        self.globals.get(slot).copied()
    }

    /// Current call stack depth
    pub fn call_stack_depth(&self) -> usize {
        self.frames.len()
    }

    /// Pop the current frame, keeping only its return slots.
    ///
    /// The entry frame leaves the stack untouched so the result can be read.
    pub(crate) fn return_from_call(&mut self) {
        if let Some(frame) = self.frames.pop() {
            if !self.frames.is_empty() {
                self.stack.truncate(frame.base + frame.ret_slots);
            }
        }
    }

    pub(crate) fn push(&mut self, value: i64) {
        self.stack.push(value);
    }

    pub(crate) fn pop(&mut self) -> VmResult<i64> {
        self.stack.pop().ok_or(VmError::StackUnderflow)
    }

    pub(crate) fn load(&self, address: i64) -> VmResult<i64> {
        let slot = if address >= GLOBAL_BASE {
            self.globals.get((address - GLOBAL_BASE) as usize)
        } else {
            usize::try_from(address)
                .ok()
                .and_then(|index| self.stack.get(index))
        };
        slot.copied().ok_or(VmError::InvalidAddress(address))
    }

    pub(crate) fn store(&mut self, address: i64, value: i64) -> VmResult<()> {
        let slot = if address >= GLOBAL_BASE {
            self.globals.get_mut((address - GLOBAL_BASE) as usize)
        } else {
            usize::try_from(address)
                .ok()
                .and_then(|index| self.stack.get_mut(index))
        };
        let slot = slot.ok_or(VmError::InvalidAddress(address))?;
        *slot = value;
        Ok(())
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
