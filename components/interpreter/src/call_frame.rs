//! Call frame for function call stack management

/// Call frame representing a function invocation.
///
/// The frame's slots start at `base`: return slots first, then parameters,
/// then locals.
#[derive(Debug, Clone, PartialEq)]
pub struct CallFrame {
    /// Function table index
    pub function: usize,
    /// Index of the next instruction to execute
    pub pc: usize,
    /// Stack index of the first return slot
    pub base: usize,
    /// Number of return slots
    pub ret_slots: usize,
    /// Number of parameter slots
    pub param_slots: usize,
}

impl CallFrame {
    /// Create a new call frame
    pub fn new(function: usize, base: usize, ret_slots: usize, param_slots: usize) -> Self {
        Self {
            function,
            pc: 0,
            base,
            ret_slots,
            param_slots,
        }
    }

    /// Stack index of argument slot `index`, counting return slots first
    pub fn arg_address(&self, index: usize) -> usize {
        self.base + index
    }

    /// Stack index of local slot `index`
    pub fn local_address(&self, index: usize) -> usize {
        self.base + self.ret_slots + self.param_slots + index
    }
}
