//! Core types shared by every stage of the C0 compiler.
//!
//! This crate provides the foundational vocabulary of the compiler:
//! source locations, the closed set of value types, and the single
//! fatal error type that every stage propagates.
//!
//! # Overview
//!
//! - [`SourcePosition`] - Line/column/offset location in the source text
//! - [`Type`] - Closed tagged variant of the language's types
//! - [`CompileError`] - A fatal compilation error carrying its position
//! - [`ErrorKind`] - What went wrong
//!
//! # Examples
//!
//! ```
//! use core_types::{CompileError, ErrorKind, SourcePosition, Type};
//!
//! let pos = SourcePosition::new(3, 7, 42);
//! let err = CompileError::new(ErrorKind::NotDeclared("x".to_string()), pos);
//! assert_eq!(err.position.line, 3);
//! assert!(err.to_string().contains("not declared"));
//!
//! assert_eq!(Type::Int.return_slots(), 1);
//! assert_eq!(Type::Void.return_slots(), 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod source;
mod types;

pub use error::{CompileError, CompileResult, ErrorKind};
pub use source::SourcePosition;
pub use types::Type;
