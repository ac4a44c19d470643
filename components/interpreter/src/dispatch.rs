//! Dispatch loop for bytecode execution
//!
//! Handles individual opcode execution.

use bytecode_system::{Instruction, Module, Opcode};
use tracing::trace;

use crate::call_frame::CallFrame;
use crate::error::{VmError, VmResult};
use crate::vm::{Vm, GLOBAL_BASE};

impl Vm {
    /// Execute one instruction of the current frame
    pub(crate) fn dispatch(&mut self, module: &Module, inst: Instruction) -> VmResult<()> {
        match inst.opcode {
            Opcode::Push => {
                let value = operand(&inst)?;
                self.push(value);
            }
            Opcode::Loca => {
                let index = slot_operand(&inst)?;
                let address = self.current_frame()?.local_address(index);
                self.push(address as i64);
            }
            Opcode::Arga => {
                let index = slot_operand(&inst)?;
                let address = self.current_frame()?.arg_address(index);
                self.push(address as i64);
            }
            Opcode::Globa => {
                let slot = operand(&inst)?;
                self.push(GLOBAL_BASE + slot);
            }
            Opcode::StackAlloc => {
                let count = slot_operand(&inst)?;
                self.stack.resize(self.stack.len() + count, 0);
            }
            Opcode::Load64 => {
                let address = self.pop()?;
                let value = self.load(address)?;
                self.push(value);
            }
            Opcode::Store64 => {
                let value = self.pop()?;
                let address = self.pop()?;
                self.store(address, value)?;
            }
            Opcode::AddI => self.binary(i64::wrapping_add)?,
            Opcode::SubI => self.binary(i64::wrapping_sub)?,
            Opcode::MulI => self.binary(i64::wrapping_mul)?,
            Opcode::DivI => {
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                if rhs == 0 {
                    return Err(VmError::DivisionByZero);
                }
                self.push(lhs.wrapping_div(rhs));
            }
            Opcode::NegI => {
                let value = self.pop()?;
                self.push(value.wrapping_neg());
            }
            Opcode::CmpI => self.binary(|lhs, rhs| lhs.cmp(&rhs) as i64)?,
            Opcode::SetLt => {
                let value = self.pop()?;
                self.push(i64::from(value < 0));
            }
            Opcode::SetGt => {
                let value = self.pop()?;
                self.push(i64::from(value > 0));
            }
            Opcode::Br => self.jump(module, operand(&inst)?)?,
            Opcode::BrFalse => {
                let offset = operand(&inst)?;
                if self.pop()? == 0 {
                    self.jump(module, offset)?;
                }
            }
            Opcode::BrTrue => {
                let offset = operand(&inst)?;
                if self.pop()? != 0 {
                    self.jump(module, offset)?;
                }
            }
            Opcode::Call => self.call(module, operand(&inst)?)?,
            Opcode::Ret => self.return_from_call(),
            Opcode::CallName => self.call_builtin(module, operand(&inst)?)?,
        }
        Ok(())
    }

    fn current_frame(&self) -> VmResult<&CallFrame> {
        self.frames.last().ok_or(VmError::StackUnderflow)
    }

    fn binary(&mut self, op: impl Fn(i64, i64) -> i64) -> VmResult<()> {
        let rhs = self.pop()?;
        let lhs = self.pop()?;
        self.push(op(lhs, rhs));
        Ok(())
    }

    /// Move the current frame's pc by `offset` relative to the next instruction
    fn jump(&mut self, module: &Module, offset: i64) -> VmResult<()> {
        let frame = self.frames.last_mut().ok_or(VmError::StackUnderflow)?;
        let len = module.functions[frame.function].body.len();
        let target = frame.pc as i64 + offset;
        if target < 0 || target > len as i64 {
            return Err(VmError::InvalidJump { target, len });
        }
        frame.pc = target as usize;
        Ok(())
    }

    /// Enter a function; the caller has already pushed return slots and arguments
    fn call(&mut self, module: &Module, index: i64) -> VmResult<()> {
        let function = usize::try_from(index)
            .ok()
            .and_then(|i| module.functions.get(i).map(|f| (i, f)));
        let (function, slot) = function.ok_or(VmError::UnknownFunction(index))?;

        let ret_slots = slot.ret_slots as usize;
        let param_slots = slot.param_slots as usize;
        let base = self
            .stack
            .len()
            .checked_sub(ret_slots + param_slots)
            .ok_or(VmError::StackUnderflow)?;

        trace!(function, base, depth = self.frames.len(), "call");
        self.frames
            .push(CallFrame::new(function, base, ret_slots, param_slots));
        self.stack.resize(self.stack.len() + slot.loc_slots as usize, 0);
        Ok(())
    }

    /// Run a library function.
    ///
    /// Arguments are on top of the stack; a returning function writes into
    /// the slot reserved below them.
    fn call_builtin(&mut self, module: &Module, index: i64) -> VmResult<()> {
        match index {
            // getint, getchar
            0 | 2 => {
                let value = self.console.read()?;
                self.set_return(value)?;
            }
            // getdouble
            1 => {
                let value = self.console.read()?;
                self.set_return((value as f64).to_bits() as i64)?;
            }
            // putint
            3 => {
                let value = self.pop()?;
                self.console.write(&value.to_string());
            }
            // putdouble
            4 => {
                let bits = self.pop()?;
                self.console.write(&f64::from_bits(bits as u64).to_string());
            }
            // putchar
            5 => {
                let code = self.pop()?;
                let c = u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(VmError::InvalidCharacter(code))?;
                self.console.write(c.encode_utf8(&mut [0; 4]));
            }
            // putstr
            6 => {
                let slot = self.pop()?;
                let text = usize::try_from(slot)
                    .ok()
                    .and_then(|i| module.globals.get(i))
                    .and_then(|global| global.as_text())
                    .ok_or(VmError::NotAString(slot))?;
                self.console.write(text);
            }
            // putln
            7 => self.console.write("\n"),
            _ => return Err(VmError::UnknownBuiltin(index)),
        }
        Ok(())
    }

    fn set_return(&mut self, value: i64) -> VmResult<()> {
        let slot = self.stack.last_mut().ok_or(VmError::StackUnderflow)?;
        *slot = value;
        Ok(())
    }
}

fn operand(inst: &Instruction) -> VmResult<i64> {
    inst.operand
        .ok_or_else(|| VmError::MissingOperand(inst.opcode.to_string()))
}

fn slot_operand(inst: &Instruction) -> VmResult<usize> {
    let value = operand(inst)?;
    usize::try_from(value).map_err(|_| VmError::InvalidAddress(value))
}
