// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! Per-call-frame state.

use crate::bytecode::FunctionInfo;
use crate::value::Value;

/// State for one active function invocation.
///
/// Locals grow on demand: storing at index `k` ensures the locals vector
/// has length at least `k + 1`, backfilling any newly-visible slots with
/// [`Value::Nil`].
#[derive(Debug, Clone)]
pub struct Frame {
    locals: Vec<Value>,
    /// Instruction index to resume at in the caller, once this frame
    /// returns.
    pub return_ip: usize,
    /// Index of the caller's frame in the VM's frame vector.
    pub prev_fp: usize,
    /// The function this frame is executing, or `None` for the base frame
    /// running top-level code.
    pub func_info: Option<FunctionInfo>,
}

impl Frame {
    /// The base frame: no caller, no function, empty locals. Present for
    /// the whole run of top-level code.
    #[must_use]
    pub fn base() -> Self {
        Self {
            locals: Vec::new(),
            return_ip: 0,
            prev_fp: 0,
            func_info: None,
        }
    }

    /// A frame pushed by `CALL`, returning to `return_ip` in the frame at
    /// `prev_fp`.
    #[must_use]
    pub fn for_call(return_ip: usize, prev_fp: usize, func_info: FunctionInfo) -> Self {
        Self {
            locals: Vec::new(),
            return_ip,
            prev_fp,
            func_info: Some(func_info),
        }
    }

    /// Read local `index`, or `Nil` if it has never been stored to.
    #[must_use]
    pub fn load(&self, index: usize) -> Value {
        self.locals.get(index).cloned().unwrap_or(Value::Nil)
    }

    /// Store `value` into local `index`, growing the locals vector (with
    /// `Nil` filler) if needed.
    pub fn store(&mut self, index: usize, value: Value) {
        if index >= self.locals.len() {
            self.locals.resize(index + 1, Value::Nil);
        }
        self.locals[index] = value;
    }

    /// The current locals vector, in declaration-index order. Used by the
    /// garbage collector's mark pass and by the JIT cache when capturing
    /// an argument tuple.
    #[must_use]
    pub fn locals(&self) -> &[Value] {
        &self.locals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locals_grow_on_demand() {
        let mut frame = Frame::base();
        frame.store(3, Value::Int(9));
        assert_eq!(frame.locals().len(), 4);
        assert!(matches!(frame.load(0), Value::Nil));
        assert!(matches!(frame.load(3), Value::Int(9)));
    }

    #[test]
    fn load_past_end_yields_nil() {
        let frame = Frame::base();
        assert!(matches!(frame.load(10), Value::Nil));
    }
}
