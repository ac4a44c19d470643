//! C0 Compiler CLI Library
//!
//! Provides the argument definitions and the compilation driver behind the
//! `c0c` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod driver;
pub mod error;

pub use cli::Cli;
pub use driver::{Driver, DriverOutput};
pub use error::{CliError, CliResult};
