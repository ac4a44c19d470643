//! Error types for the CLI

use core_types::CompileError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading the source or writing the module failed
    #[error("{}: {source}", .path.display())]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The source did not compile
    #[error("{}:{source}", .path.display())]
    Compile {
        /// Source file
        path: PathBuf,
        /// First error found
        source: CompileError,
    },

    /// The module could not be rendered as JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// The compile error behind this failure, if any
    pub fn compile_error(&self) -> Option<&CompileError> {
        match self {
            CliError::Compile { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
