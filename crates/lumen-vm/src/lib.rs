// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! The Lumen stack-machine virtual machine.
//!
//! Executes a [`lumen_bytecode::Bytecode`] program: a fetch-decode-execute
//! loop (§4.3) over frames and an operand stack, a tracing garbage
//! collector run before every frame pop (§4.4), and a memoizing
//! specialization cache for pure functions (§4.5).

mod error;
mod gc;
mod jit;
mod output;
mod vm;

pub use error::RuntimeError;
pub use jit::{ArgTuple, CallDecision, JitCache};
pub use output::{OutputSink, StdoutSink};
pub use vm::{RunOptions, Vm};
