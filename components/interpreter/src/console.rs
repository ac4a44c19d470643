//! Input queue and output buffer behind the library functions

use crate::error::{VmError, VmResult};
use std::collections::VecDeque;

/// Program I/O: integers in, text out
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Console {
    input: VecDeque<i64>,
    output: String,
}

impl Console {
    /// Create a console with no input
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a console that will serve the given values in order
    pub fn with_input(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            input: values.into_iter().collect(),
            output: String::new(),
        }
    }

    /// Queue one more input value
    pub fn push_input(&mut self, value: i64) {
        self.input.push_back(value);
    }

    /// Take the next input value
    pub fn read(&mut self) -> VmResult<i64> {
        self.input.pop_front().ok_or(VmError::InputExhausted)
    }

    /// Append text to the output
    pub fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// Everything written so far
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Take the output, leaving the buffer empty
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}
