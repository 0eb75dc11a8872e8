// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! AST-to-bytecode compiler for the Lumen language (§4.1).
//!
//! [`compile`] lowers a [`lumen_reader::Program`] into a
//! [`lumen_bytecode::Bytecode`] the VM can execute directly. This crate
//! owns static type checking; the VM trusts that any [`Bytecode`][bc] it
//! is handed already satisfies the language's type rules.
//!
//! [bc]: lumen_bytecode::Bytecode

mod compiler;
mod error;
mod scope;

pub use compiler::compile;
pub use error::CompileError;
pub use scope::{Binding, Scope};
