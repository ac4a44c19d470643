//! C0 Compiler Front End
//!
//! Single-pass compilation of C0 source text into a bytecode [`Module`].
//!
//! # Overview
//!
//! - [`Lexer`] - Tokenizes C0 source, one token of lookahead
//! - [`SymbolTable`] - Layered scopes, function bodies and global slots
//! - [`Analyser`] - Parses, checks and emits instructions in one pass
//! - [`encode`] - Flattens the analysed program into a [`Module`]
//!
//! # Example
//!
//! ```
//! let module = parser::compile("fn main() -> int { return 0; }").unwrap();
//!
//! // The entry function followed by `main`
//! assert_eq!(module.functions.len(), 2);
//! assert_eq!(module.function_name(&module.functions[1]), Some("main"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyser;
pub mod encoder;
pub mod error;
pub mod lexer;
pub mod symbol_table;

pub use analyser::{AnalysedProgram, Analyser};
pub use encoder::encode;
pub use lexer::{Keyword, Lexer, Punctuator, Token, TokenKind};
pub use symbol_table::{
    FunctionInfo, Slot, SymbolCategory, SymbolEntry, SymbolId, SymbolTable, ENTRY_FUNCTION,
    ENTRY_INDEX,
};

use bytecode_system::Module;
use core_types::CompileResult;

/// Split source text into tokens, ending with the end-of-file token
pub fn tokenize(source: &str) -> CompileResult<Vec<Token>> {
    Lexer::new(source).collect()
}

/// Analyse a program without requiring `main`
pub fn analyse(source: &str) -> CompileResult<AnalysedProgram> {
    Analyser::new(source).analyse()
}

/// Compile a whole program into a module.
///
/// Fails with the first lexical, grammar or semantic error, or with
/// `MainFunctionMissing` once the source is exhausted without a `main`.
pub fn compile(source: &str) -> CompileResult<Module> {
    let program = analyse(source)?;
    program.ensure_main()?;
    encode(&program)
}
