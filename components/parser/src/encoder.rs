//! Module encoding
//!
//! Flattens an analysed program into the global and function tables of a
//! [`Module`]. Variables and strings keep the global slots the analyser gave
//! them; function names follow, one per function in index order, so the
//! name of function `i` is global `variable_count + i`.

use crate::analyser::AnalysedProgram;
use crate::symbol_table::{FunctionInfo, SymbolCategory, ENTRY_INDEX};
use bytecode_system::{FunctionSlot, GlobalSlot, Module};
use core_types::{CompileError, CompileResult, ErrorKind};
use tracing::debug;

/// Build the module for an analysed program
pub fn encode(program: &AnalysedProgram) -> CompileResult<Module> {
    let table = &program.table;
    let mut module = Module::new();

    for entry in table.globals() {
        let slot = match entry.category {
            SymbolCategory::StringConstant => GlobalSlot::text(&entry.name),
            _ => GlobalSlot::scalar(entry.is_constant),
        };
        module.globals.push(slot);
    }
    let variable_count = module.globals.len() as u32;

    for info in table.functions() {
        let name = table.function_name(info.index).ok_or_else(|| {
            CompileError::new(
                ErrorKind::UnresolvedOperand(format!("function {}", info.index)),
                program.end,
            )
        })?;
        module.globals.push(GlobalSlot::text(name));
    }

    for info in table.functions().filter(|f| f.index >= ENTRY_INDEX) {
        module
            .functions
            .push(encode_function(program, info, variable_count)?);
    }

    debug!(
        globals = module.globals.len(),
        variables = variable_count,
        functions = module.functions.len(),
        "encoded module"
    );
    Ok(module)
}

fn encode_function(
    program: &AnalysedProgram,
    info: &FunctionInfo,
    variable_count: u32,
) -> CompileResult<FunctionSlot> {
    if let Some(inst) = info.body.iter().find(|inst| !inst.is_well_formed()) {
        return Err(CompileError::new(
            ErrorKind::UnresolvedOperand(inst.to_string()),
            program.end,
        ));
    }

    Ok(FunctionSlot {
        name: variable_count + info.index,
        ret_slots: info.return_slots(),
        param_slots: info.arg_count(),
        loc_slots: info.local_count(),
        body: info.body.clone(),
    })
}
