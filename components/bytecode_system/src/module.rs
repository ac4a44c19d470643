//! Compiled module - the binary artifact handed to the virtual machine
//!
//! A module is a global table followed by a function table. The binary
//! layout is big-endian:
//!
//! ```text
//! magic u32 | version u32
//! global count u32 | { is_const u8 | length u32 | bytes }*
//! function count u32 | { name u32 | ret u32 | params u32 | locals u32 | body count u32 | instructions }*
//! ```

use crate::instruction::Instruction;
use crate::opcode::Opcode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Module magic number
pub const MAGIC: u32 = 0x7230_3b3e;

/// Module format version
pub const VERSION: u32 = 1;

/// Number of library functions that precede the entry function
pub const BUILTIN_COUNT: usize = 8;

/// Errors raised while decoding module bytes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input ended in the middle of a field
    #[error("unexpected end of module at byte {offset}, needed {needed} more")]
    UnexpectedEof {
        /// Where the read started
        offset: usize,
        /// How many bytes were missing
        needed: usize,
    },
    /// First four bytes are not the module magic
    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),
    /// Version other than the one this crate writes
    #[error("unsupported module version {0}")]
    UnsupportedVersion(u32),
    /// Opcode byte not in the instruction table
    #[error("unknown opcode {byte:#04x} at byte {offset}")]
    UnknownOpcode {
        /// The offending byte
        byte: u8,
        /// Where it was found
        offset: usize,
    },
    /// Bytes left over after the function table
    #[error("{0} trailing bytes after function table")]
    TrailingBytes(usize),
}

/// One entry of the global table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalSlot {
    /// Whether the global is read-only
    pub is_const: bool,
    /// Raw payload; 8 zero bytes for scalars, text bytes for strings and names
    pub value: Vec<u8>,
}

impl GlobalSlot {
    /// A zero-initialized 8-byte scalar slot
    pub fn scalar(is_const: bool) -> Self {
        Self {
            is_const,
            value: vec![0; 8],
        }
    }

    /// A constant slot holding raw text, used for string literals and function names
    pub fn text(text: &str) -> Self {
        Self {
            is_const: true,
            value: text.as_bytes().to_vec(),
        }
    }

    /// The payload as text, if it is valid UTF-8
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }
}

/// One entry of the function table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FunctionSlot {
    /// Index of the global holding this function's name
    pub name: u32,
    /// 1 for `int` functions, 0 otherwise
    pub ret_slots: u32,
    /// Number of declared parameters
    pub param_slots: u32,
    /// Number of local variables
    pub loc_slots: u32,
    /// Function body
    pub body: Vec<Instruction>,
}

/// A complete compiled module
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Module {
    /// Global table: variables and strings, then function names
    pub globals: Vec<GlobalSlot>,
    /// Function table: the entry function, then user functions
    pub functions: Vec<FunctionSlot>,
}

impl Module {
    /// Create an empty module
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount added to every `globa` operand in the binary form
    pub fn globa_bias(&self) -> i64 {
        (self.functions.len() + BUILTIN_COUNT) as i64
    }

    /// Name of a function table entry, resolved through the global table
    pub fn function_name(&self, function: &FunctionSlot) -> Option<&str> {
        self.globals
            .get(function.name as usize)
            .and_then(GlobalSlot::as_text)
    }

    /// Serialize the module to its binary format.
    ///
    /// Operands are written according to the opcode's width; an instruction
    /// that lacks a required operand is written with zero, so callers check
    /// [`Instruction::is_well_formed`] first.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        let bias = self.globa_bias();

        bytes.extend_from_slice(&MAGIC.to_be_bytes());
        bytes.extend_from_slice(&VERSION.to_be_bytes());

        bytes.extend_from_slice(&(self.globals.len() as u32).to_be_bytes());
        for global in &self.globals {
            bytes.push(u8::from(global.is_const));
            bytes.extend_from_slice(&(global.value.len() as u32).to_be_bytes());
            bytes.extend_from_slice(&global.value);
        }

        bytes.extend_from_slice(&(self.functions.len() as u32).to_be_bytes());
        for function in &self.functions {
            bytes.extend_from_slice(&function.name.to_be_bytes());
            bytes.extend_from_slice(&function.ret_slots.to_be_bytes());
            bytes.extend_from_slice(&function.param_slots.to_be_bytes());
            bytes.extend_from_slice(&function.loc_slots.to_be_bytes());
            bytes.extend_from_slice(&(function.body.len() as u32).to_be_bytes());
            for inst in &function.body {
                Self::encode_instruction(&mut bytes, inst, bias);
            }
        }

        bytes
    }

    fn encode_instruction(bytes: &mut Vec<u8>, inst: &Instruction, bias: i64) {
        bytes.push(inst.opcode.byte());
        let mut operand = inst.operand.unwrap_or_default();
        if inst.opcode == Opcode::Globa {
            operand += bias;
        }
        match inst.opcode.operand_width() {
            8 => bytes.extend_from_slice(&operand.to_be_bytes()),
            4 => bytes.extend_from_slice(&(operand as i32).to_be_bytes()),
            _ => {}
        }
    }

    /// Deserialize a module from its binary format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(bytes);

        let magic = reader.read_u32()?;
        if magic != MAGIC {
            return Err(DecodeError::BadMagic(magic));
        }
        let version = reader.read_u32()?;
        if version != VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }

        let global_count = reader.read_u32()? as usize;
        let mut globals = Vec::with_capacity(global_count.min(bytes.len()));
        for _ in 0..global_count {
            let is_const = reader.read_u8()? != 0;
            let len = reader.read_u32()? as usize;
            let value = reader.read_slice(len)?.to_vec();
            globals.push(GlobalSlot { is_const, value });
        }

        let function_count = reader.read_u32()? as usize;
        let bias = (function_count + BUILTIN_COUNT) as i64;
        let mut functions = Vec::with_capacity(function_count.min(bytes.len()));
        for _ in 0..function_count {
            let name = reader.read_u32()?;
            let ret_slots = reader.read_u32()?;
            let param_slots = reader.read_u32()?;
            let loc_slots = reader.read_u32()?;
            let body_count = reader.read_u32()? as usize;
            let mut body = Vec::with_capacity(body_count.min(bytes.len()));
            for _ in 0..body_count {
                body.push(Self::decode_instruction(&mut reader, bias)?);
            }
            functions.push(FunctionSlot {
                name,
                ret_slots,
                param_slots,
                loc_slots,
                body,
            });
        }

        if reader.remaining() > 0 {
            return Err(DecodeError::TrailingBytes(reader.remaining()));
        }

        Ok(Self { globals, functions })
    }

    fn decode_instruction(reader: &mut Reader<'_>, bias: i64) -> Result<Instruction, DecodeError> {
        let offset = reader.offset;
        let byte = reader.read_u8()?;
        let opcode = Opcode::from_byte(byte).ok_or(DecodeError::UnknownOpcode { byte, offset })?;
        let operand = match opcode.operand_width() {
            8 => Some(reader.read_i64()?),
            4 => Some(i64::from(reader.read_i32()?)),
            _ => None,
        };
        let operand = match (opcode, operand) {
            (Opcode::Globa, Some(value)) => Some(value - bias),
            (_, operand) => operand,
        };
        Ok(Instruction { opcode, operand })
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "globals ({}):", self.globals.len())?;
        for (i, global) in self.globals.iter().enumerate() {
            let kind = if global.is_const { "const" } else { "var" };
            match global.as_text() {
                Some(text) if global.value != [0; 8] => {
                    writeln!(f, "  [{}] {} {:?}", i, kind, text)?
                }
                _ => writeln!(f, "  [{}] {} <{} bytes>", i, kind, global.value.len())?,
            }
        }
        writeln!(f, "functions ({}):", self.functions.len())?;
        for (i, function) in self.functions.iter().enumerate() {
            writeln!(
                f,
                "  [{}] {} ret={} params={} locals={}",
                i,
                self.function_name(function).unwrap_or("?"),
                function.ret_slots,
                function.param_slots,
                function.loc_slots
            )?;
            for (pc, inst) in function.body.iter().enumerate() {
                writeln!(f, "    {:>4}: {}", pc, inst)?;
            }
        }
        Ok(())
    }
}

/// Big-endian cursor over module bytes
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEof {
                offset: self.offset,
                needed: len - self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }
}
