//! Symbol table for the single-pass analyser
//!
//! Entries live in an insertion-ordered store keyed by a monotonic sequence
//! number, so enumeration order (and therefore global slot numbering) is
//! stable. Name resolution goes through an explicit stack of per-layer name
//! maps; layer 0 is the global layer and is never closed.

use bytecode_system::{Instruction, Opcode, BUILTIN_COUNT};
use core_types::{ErrorKind, Type};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

/// Result of a symbol table operation; the caller attaches the position
pub type TableResult<T> = Result<T, ErrorKind>;

/// Name of the synthetic entry function
pub const ENTRY_FUNCTION: &str = "_start";

/// Function index of the synthetic entry function
pub const ENTRY_INDEX: u32 = BUILTIN_COUNT as u32;

/// Handle to an entry in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(u64);

/// What a symbol names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolCategory {
    /// Variable, constant or parameter
    Variable,
    /// Library, entry or user function
    Function,
    /// Anonymous string literal
    StringConstant,
}

/// Where a symbol's value lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Argument slot, numbered from 0 in declaration order
    Arg(u32),
    /// Local slot, numbered from 0 independently of arguments
    Local(u32),
    /// Global slot
    Global(u32),
    /// Function index
    Function(u32),
}

/// Per-function data
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    /// Function index: 0-7 library, 8 entry, 9.. user functions
    pub index: u32,
    /// Declared return type
    pub return_type: Type,
    /// Parameters in declaration order; the position is the argument index
    pub params: Vec<(String, Type)>,
    /// Locals in reservation order; the position is the local index
    pub locals: Vec<String>,
    /// Generated body
    pub body: Vec<Instruction>,
    /// Whether this is one of the library functions
    pub is_builtin: bool,
}

impl FunctionInfo {
    /// Create a function with an empty body
    pub fn new(index: u32, return_type: Type) -> Self {
        Self {
            index,
            return_type,
            params: Vec::new(),
            locals: Vec::new(),
            body: Vec::new(),
            is_builtin: false,
        }
    }

    /// Number of declared parameters
    pub fn arg_count(&self) -> u32 {
        self.params.len() as u32
    }

    /// Number of local slots reserved so far
    pub fn local_count(&self) -> u32 {
        self.locals.len() as u32
    }

    /// 1 if the function returns `int`, else 0
    pub fn return_slots(&self) -> u32 {
        self.return_type.return_slots()
    }

    /// Argument index of a parameter
    pub fn param_index(&self, name: &str) -> Option<u32> {
        self.params
            .iter()
            .position(|(param, _)| param == name)
            .map(|i| i as u32)
    }

    /// Function type of this signature
    pub fn signature(&self) -> Type {
        Type::Func {
            params: self.params.iter().map(|(_, ty)| ty.clone()).collect(),
            ret: Box::new(self.return_type.clone()),
        }
    }
}

/// A declared symbol
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolEntry {
    /// Name, or the literal text for string constants
    pub name: String,
    /// What the symbol names
    pub category: SymbolCategory,
    /// Value type, or the signature for functions
    pub ty: Type,
    /// Scope layer it was declared in
    pub layer: usize,
    /// Whether assignments are rejected
    pub is_constant: bool,
    /// Whether a value has been stored
    pub is_initialized: bool,
    /// Storage location
    pub slot: Slot,
    /// Function data, for functions only
    pub function: Option<FunctionInfo>,
}

impl SymbolEntry {
    /// A variable, constant or parameter
    pub fn variable(name: &str, ty: Type, layer: usize, is_constant: bool, slot: Slot) -> Self {
        Self {
            name: name.to_string(),
            category: SymbolCategory::Variable,
            ty,
            layer,
            is_constant,
            is_initialized: false,
            slot,
            function: None,
        }
    }

    /// A function, always registered in the global layer
    pub fn function(name: &str, info: FunctionInfo) -> Self {
        Self {
            name: name.to_string(),
            category: SymbolCategory::Function,
            ty: info.signature(),
            layer: 0,
            is_constant: true,
            is_initialized: true,
            slot: Slot::Function(info.index),
            function: Some(info),
        }
    }

    /// Whether this is a variable of type int that may be assigned
    pub fn is_assignable_int(&self) -> bool {
        self.category == SymbolCategory::Variable && self.ty == Type::Int
    }
}

/// Location of an instruction whose operand is patched later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchSite {
    /// Function index
    pub function: u32,
    /// Instruction position within the body
    pub position: usize,
}

/// The compiler's symbol table
#[derive(Debug, Clone)]
pub struct SymbolTable {
    entries: BTreeMap<SymbolId, SymbolEntry>,
    scopes: Vec<HashMap<String, SymbolId>>,
    functions: Vec<SymbolId>,
    next_id: u64,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table holding the library functions and the entry function
    pub fn new() -> Self {
        let mut table = Self {
            entries: BTreeMap::new(),
            scopes: vec![HashMap::new()],
            functions: Vec::new(),
            next_id: 0,
        };
        for (index, (name, ret, params)) in builtins().into_iter().enumerate() {
            let mut info = FunctionInfo::new(index as u32, ret);
            info.params = params
                .into_iter()
                .enumerate()
                .map(|(i, ty)| (format!("arg{}", i), ty))
                .collect();
            info.is_builtin = true;
            table.insert_function(name, info);
        }
        table.insert_function(ENTRY_FUNCTION, FunctionInfo::new(ENTRY_INDEX, Type::Void));
        table
    }

    fn insert_function(&mut self, name: &str, info: FunctionInfo) -> SymbolId {
        let id = self.insert(SymbolEntry::function(name, info));
        self.scopes[0].insert(name.to_string(), id);
        self.functions.push(id);
        id
    }

    fn insert(&mut self, entry: SymbolEntry) -> SymbolId {
        let id = SymbolId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, entry);
        id
    }

    /// Current scope depth; 0 is global
    pub fn current_layer(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Open a new innermost layer and return its depth
    pub fn open_scope(&mut self) -> usize {
        self.scopes.push(HashMap::new());
        self.current_layer()
    }

    /// Declare a named symbol.
    ///
    /// Variables collide with names in their own layer only, so a local may
    /// shadow a global. Functions collide with a name in any active layer.
    pub fn declare(&mut self, entry: SymbolEntry) -> TableResult<SymbolId> {
        let layer = entry.layer.min(self.current_layer());
        let collides = match entry.category {
            SymbolCategory::Function => self.scopes.iter().any(|s| s.contains_key(&entry.name)),
            _ => self.scopes[layer].contains_key(&entry.name),
        };
        if collides {
            return Err(ErrorKind::DuplicateDeclaration(entry.name));
        }

        let name = entry.name.clone();
        let function_index = entry.function.as_ref().map(|f| f.index as usize);
        let id = self.insert(SymbolEntry { layer, ..entry });
        self.scopes[layer].insert(name, id);

        if let Some(index) = function_index {
            if self.functions.len() <= index {
                self.functions.resize(index + 1, id);
            }
            self.functions[index] = id;
        }
        Ok(id)
    }

    /// Register an anonymous string constant and return its global slot
    pub fn declare_string(&mut self, text: &str) -> u32 {
        let slot = self.global_count();
        self.insert(SymbolEntry {
            name: text.to_string(),
            category: SymbolCategory::StringConstant,
            ty: Type::Int,
            layer: 0,
            is_constant: true,
            is_initialized: true,
            slot: Slot::Global(slot),
            function: None,
        });
        slot
    }

    /// Number of variable and string entries in the global layer
    pub fn global_count(&self) -> u32 {
        self.globals().count() as u32
    }

    /// Resolve a name, searching the innermost layer first
    pub fn lookup(&self, name: &str) -> TableResult<SymbolId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
            .ok_or_else(|| ErrorKind::NotDeclared(name.to_string()))
    }

    /// Borrow an entry
    pub fn get(&self, id: SymbolId) -> Option<&SymbolEntry> {
        self.entries.get(&id)
    }

    /// Record that a symbol has been assigned
    pub fn mark_initialized(&mut self, id: SymbolId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.is_initialized = true;
        }
    }

    /// Function data by function index
    pub fn function(&self, index: u32) -> TableResult<&FunctionInfo> {
        self.functions
            .get(index as usize)
            .and_then(|id| self.entries.get(id))
            .and_then(|entry| entry.function.as_ref())
            .ok_or_else(|| ErrorKind::NotDeclared(format!("function #{}", index)))
    }

    /// Mutable function data by function index
    pub fn function_mut(&mut self, index: u32) -> TableResult<&mut FunctionInfo> {
        let missing = || ErrorKind::NotDeclared(format!("function #{}", index));
        let id = *self.functions.get(index as usize).ok_or_else(missing)?;
        self.entries
            .get_mut(&id)
            .and_then(|entry| entry.function.as_mut())
            .ok_or_else(missing)
    }

    /// Append an instruction to a function body, returning its position
    pub fn append_instruction(&mut self, function: u32, inst: Instruction) -> TableResult<usize> {
        let body = &mut self.function_mut(function)?.body;
        body.push(inst);
        Ok(body.len() - 1)
    }

    /// Splice an instruction into a function body at `position`
    pub fn insert_instruction(
        &mut self,
        function: u32,
        inst: Instruction,
        position: usize,
    ) -> TableResult<()> {
        let body = &mut self.function_mut(function)?.body;
        let position = position.min(body.len());
        body.insert(position, inst);
        Ok(())
    }

    /// Append an instruction whose operand is filled in later by [`Self::patch`]
    pub fn emit_placeholder(&mut self, function: u32, opcode: Opcode) -> TableResult<PatchSite> {
        let position = self.append_instruction(function, Instruction::new(opcode))?;
        Ok(PatchSite { function, position })
    }

    /// Write the operand of a placeholder in place
    pub fn patch(&mut self, site: PatchSite, operand: i64) -> TableResult<()> {
        let inst = self
            .function_mut(site.function)?
            .body
            .get_mut(site.position)
            .ok_or_else(|| ErrorKind::UnresolvedOperand(format!("patch site {}", site.position)))?;
        inst.operand = Some(operand);
        Ok(())
    }

    /// Number of instructions emitted into a function so far
    pub fn instruction_count(&self, function: u32) -> TableResult<usize> {
        Ok(self.function(function)?.body.len())
    }

    /// Opcode of the last instruction of a function body
    pub fn last_opcode(&self, function: u32) -> TableResult<Option<Opcode>> {
        Ok(self.function(function)?.body.last().map(|inst| inst.opcode))
    }

    /// Remove every entry declared at `layer` and close that layer.
    ///
    /// Returns the number of entries removed. The global layer is never closed.
    pub fn close_scope(&mut self, layer: usize) -> usize {
        if layer == 0 || layer > self.current_layer() {
            return 0;
        }
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.layer != layer);
        self.scopes.truncate(layer);
        before - self.entries.len()
    }

    /// Variable and string entries of the global layer, in slot order
    pub fn globals(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.entries
            .values()
            .filter(|e| e.layer == 0 && e.category != SymbolCategory::Function)
    }

    /// All functions in index order
    pub fn functions(&self) -> impl Iterator<Item = &FunctionInfo> {
        self.functions
            .iter()
            .filter_map(move |id| self.entries.get(id))
            .filter_map(|entry| entry.function.as_ref())
    }

    /// Name of the function with the given index
    pub fn function_name(&self, index: u32) -> Option<&str> {
        self.functions
            .get(index as usize)
            .and_then(|id| self.entries.get(id))
            .map(|entry| entry.name.as_str())
    }

    /// Number of functions, including library functions and the entry function
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Render the table as an informational listing
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for entry in self.entries.values() {
            let category = match entry.category {
                SymbolCategory::Variable if entry.is_constant => "const",
                SymbolCategory::Variable => "var",
                SymbolCategory::Function => "fn",
                SymbolCategory::StringConstant => "str",
            };
            let _ = writeln!(
                out,
                "{:<6} {:<16} {:<24} layer={} slot={:?} init={}",
                category,
                format!("{:?}", entry.name),
                entry.ty.to_string(),
                entry.layer,
                entry.slot,
                entry.is_initialized
            );
            if let Some(info) = entry.function.as_ref().filter(|f| !f.is_builtin) {
                let _ = writeln!(
                    out,
                    "       args={} locals={} body={}",
                    info.arg_count(),
                    info.local_count(),
                    info.body.len()
                );
                for (pc, inst) in info.body.iter().enumerate() {
                    let _ = writeln!(out, "       {:>4}: {}", pc, inst);
                }
            }
        }
        out
    }
}

/// Library functions at indices 0-7: name, return type, parameter types
fn builtins() -> [(&'static str, Type, Vec<Type>); BUILTIN_COUNT] {
    [
        ("getint", Type::Int, vec![]),
        ("getdouble", Type::Double, vec![]),
        ("getchar", Type::Int, vec![]),
        ("putint", Type::Void, vec![Type::Int]),
        ("putdouble", Type::Void, vec![Type::Double]),
        ("putchar", Type::Void, vec![Type::Int]),
        ("putstr", Type::Void, vec![Type::Int]),
        ("putln", Type::Void, vec![]),
    ]
}
