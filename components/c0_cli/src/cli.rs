//! Command line arguments for `c0c`

use clap::Parser;
use std::path::PathBuf;

/// Extension given to compiled modules when no output path is named
pub const MODULE_EXTENSION: &str = "o0";

/// c0c - compile a C0 source file to a bytecode module
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "c0c")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// C0 source file
    pub input: PathBuf,

    /// Module file to write (default: input with .o0 extension)
    pub output: Option<PathBuf>,

    /// Print the token stream and stop
    #[arg(long)]
    pub tokens: bool,

    /// Print the symbol table after analysis
    #[arg(long)]
    pub dump_symbols: bool,

    /// Print the global and function tables with their instructions
    #[arg(long)]
    pub dump_instructions: bool,

    /// Print the encoded module as JSON
    #[arg(long)]
    pub emit_json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Where the module is written
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension(MODULE_EXTENSION))
    }

    /// Log filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}
