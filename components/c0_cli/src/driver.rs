//! Compilation driver
//!
//! The driver coordinates the compiler stages for one source file:
//! - Tokenizer, when only the token stream is wanted
//! - Analyser, then the `main` check, then the module encoder
//! - Informational listings requested on the command line
//! - Writing the encoded module

use crate::cli::Cli;
use crate::error::{CliError, CliResult};
use bytecode_system::Module;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// What a driver run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverOutput {
    /// Listings to show the user, in the order they were requested
    pub report: String,
    /// The module, unless only tokens were requested
    pub module: Option<Module>,
    /// Where the module was written
    pub written: Option<PathBuf>,
}

/// Runs the compiler stages selected by the command line
#[derive(Debug, Clone, Default)]
pub struct Driver {
    tokens_only: bool,
    dump_symbols: bool,
    dump_instructions: bool,
    emit_json: bool,
}

impl Driver {
    /// Create a driver that compiles and writes the module with no listings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a driver configured from command line arguments
    pub fn from_cli(cli: &Cli) -> Self {
        Self::new()
            .with_tokens_only(cli.tokens)
            .with_dump_symbols(cli.dump_symbols)
            .with_dump_instructions(cli.dump_instructions)
            .with_emit_json(cli.emit_json)
    }

    /// Stop after tokenizing and list the tokens
    pub fn with_tokens_only(mut self, enabled: bool) -> Self {
        self.tokens_only = enabled;
        self
    }

    /// List the symbol table after analysis
    pub fn with_dump_symbols(mut self, enabled: bool) -> Self {
        self.dump_symbols = enabled;
        self
    }

    /// List the encoded tables and instructions
    pub fn with_dump_instructions(mut self, enabled: bool) -> Self {
        self.dump_instructions = enabled;
        self
    }

    /// Render the encoded module as JSON
    pub fn with_emit_json(mut self, enabled: bool) -> Self {
        self.emit_json = enabled;
        self
    }

    /// Compile `input` and write the module to `output`
    pub fn run_file(&self, input: &Path, output: &Path) -> CliResult<DriverOutput> {
        let source = fs::read_to_string(input).map_err(|source| CliError::Io {
            path: input.to_path_buf(),
            source,
        })?;
        debug!(path = %input.display(), bytes = source.len(), "read source");

        let mut result = self
            .compile_source(&source)
            .map_err(|err| relocate(err, input))?;

        if let Some(module) = &result.module {
            let bytes = module.to_bytes();
            fs::write(output, &bytes).map_err(|source| CliError::Io {
                path: output.to_path_buf(),
                source,
            })?;
            info!(path = %output.display(), bytes = bytes.len(), "wrote module");
            result.written = Some(output.to_path_buf());
        }
        Ok(result)
    }

    /// Run the selected stages over source text without touching the filesystem.
    ///
    /// Compile errors are reported against the path `<source>`.
    pub fn compile_source(&self, source: &str) -> CliResult<DriverOutput> {
        let mut output = DriverOutput::default();
        let compile_error = |source| CliError::Compile {
            path: PathBuf::from("<source>"),
            source,
        };

        if self.tokens_only {
            let tokens = parser::tokenize(source).map_err(compile_error)?;
            for token in &tokens {
                let _ = writeln!(output.report, "{} {}", token.start, token.kind);
            }
            return Ok(output);
        }

        let started = Instant::now();
        let program = parser::analyse(source).map_err(compile_error)?;
        debug!(elapsed = ?started.elapsed(), "analysed");
        if self.dump_symbols {
            output.report.push_str(&program.table.dump());
        }

        program.ensure_main().map_err(compile_error)?;
        let module = parser::encode(&program).map_err(compile_error)?;
        debug!(elapsed = ?started.elapsed(), "encoded");

        if self.dump_instructions {
            let _ = write!(output.report, "{}", module);
        }
        if self.emit_json {
            output.report.push_str(&serde_json::to_string_pretty(&module)?);
            output.report.push('\n');
        }
        output.module = Some(module);
        Ok(output)
    }
}

/// Point a compile error at the real input path
fn relocate(err: CliError, input: &Path) -> CliError {
    match err {
        CliError::Compile { source, .. } => CliError::Compile {
            path: input.to_path_buf(),
            source,
        },
        other => other,
    }
}
