// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! Runtime (VM) errors (§4.6).
//!
//! Every variant carries the failing instruction's index; [`RuntimeError`]
//! is constructed alongside the instruction's disassembled textual form so
//! the CLI can report both without re-walking the bytecode.

use thiserror::Error;

/// A fatal error raised while executing bytecode. The VM aborts the run
/// the moment one of these is produced; there is no recovery.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    /// An instruction tried to pop more values than the operand stack held.
    #[error("#{instruction}: stack underflow executing `{text}`")]
    StackUnderflow {
        /// The failing instruction's index.
        instruction: usize,
        /// The instruction's disassembled text.
        text: String,
    },
    /// The preallocated operand stack has no room for another push. This
    /// is the "overflow is not recovered" case of §4.3: a deeply
    /// recursive program that exhausts the stack aborts rather than
    /// growing without bound.
    #[error("#{instruction}: operand stack overflow executing `{text}`")]
    StackOverflow {
        /// The failing instruction's index.
        instruction: usize,
        /// The instruction's disassembled text.
        text: String,
    },
    /// `CONST` referenced a constant pool index past the end of the pool.
    #[error("#{instruction}: constant index out of range executing `{text}`")]
    ConstantOutOfRange {
        /// The failing instruction's index.
        instruction: usize,
        /// The instruction's disassembled text.
        text: String,
    },
    /// `fp` did not index a valid frame, or a `RETURN`/`RETURN_VOID` was
    /// executed with no active frame to pop.
    #[error("#{instruction}: no active frame executing `{text}`")]
    InvalidFramePointer {
        /// The failing instruction's index.
        instruction: usize,
        /// The instruction's disassembled text.
        text: String,
    },
    /// `CALL` targeted an address with no registered [`FunctionInfo`]
    /// (internal compiler inconsistency; never reachable for bytecode
    /// produced by `lumen-compiler`).
    ///
    /// [`FunctionInfo`]: lumen_bytecode::FunctionInfo
    #[error("#{instruction}: call target has no function metadata executing `{text}`")]
    UnknownCallTarget {
        /// The failing instruction's index.
        instruction: usize,
        /// The instruction's disassembled text.
        text: String,
    },
    /// An `ARRAY_*` instruction addressed a local whose content is not a
    /// `HeapPtr`.
    #[error("#{instruction}: local is not an array reference executing `{text}`")]
    NotAnArray {
        /// The failing instruction's index.
        instruction: usize,
        /// The instruction's disassembled text.
        text: String,
    },
    /// An `ARRAY_*` instruction's index operand was negative or past the
    /// array's declared length.
    #[error("#{instruction}: array index out of range executing `{text}`")]
    ArrayIndexOutOfRange {
        /// The failing instruction's index.
        instruction: usize,
        /// The instruction's disassembled text.
        text: String,
    },
    /// `ARRAY_ALLOC`'s length operand was negative.
    #[error("#{instruction}: negative array length executing `{text}`")]
    NegativeArrayLength {
        /// The failing instruction's index.
        instruction: usize,
        /// The instruction's disassembled text.
        text: String,
    },
    /// `ARRAY_ALLOC` addressed a heap pointer the heap does not recognize
    /// (internal inconsistency; the heap never returns an invalid index).
    #[error("#{instruction}: dangling heap pointer executing `{text}`")]
    DanglingHeapPointer {
        /// The failing instruction's index.
        instruction: usize,
        /// The instruction's disassembled text.
        text: String,
    },
    /// `SQRT` was applied to a non-numeric value.
    #[error("#{instruction}: `sqrt` of a non-numeric value executing `{text}`")]
    SqrtDomain {
        /// The failing instruction's index.
        instruction: usize,
        /// The instruction's disassembled text.
        text: String,
    },
    /// An arithmetic, comparison, or unary operator saw operand types it
    /// does not define behavior for. The compiler's static type checking
    /// prevents this for any program it accepts, so this is an internal
    /// invariant violation rather than a user-facing condition — see
    /// `DESIGN.md` on why Lumen rejects mixed `Int`/`Float` arithmetic at
    /// compile time instead of the source language's "return 0" rule.
    #[error("#{instruction}: operand type mismatch executing `{text}`")]
    OperandTypeMismatch {
        /// The failing instruction's index.
        instruction: usize,
        /// The instruction's disassembled text.
        text: String,
    },
}

impl RuntimeError {
    /// The instruction index this error was raised at, for diagnostic
    /// rendering (`lumen-diagnostics`) and test assertions.
    #[must_use]
    pub const fn instruction(&self) -> usize {
        match self {
            Self::StackUnderflow { instruction, .. }
            | Self::StackOverflow { instruction, .. }
            | Self::ConstantOutOfRange { instruction, .. }
            | Self::InvalidFramePointer { instruction, .. }
            | Self::UnknownCallTarget { instruction, .. }
            | Self::NotAnArray { instruction, .. }
            | Self::ArrayIndexOutOfRange { instruction, .. }
            | Self::NegativeArrayLength { instruction, .. }
            | Self::DanglingHeapPointer { instruction, .. }
            | Self::SqrtDomain { instruction, .. }
            | Self::OperandTypeMismatch { instruction, .. } => *instruction,
        }
    }
}
