// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! Human-readable rendering of the four error stages a `lumenc` run can
//! fail at: lexical, syntactic, compile-time, and runtime.
//!
//! Each upstream crate's error type already carries a `thiserror` message;
//! this crate's job is only to prefix that message with the stage it came
//! from, the way a REPL reports "Error: " plus a stage-specific render
//! before dropping back to its prompt.

use lumen_compiler::CompileError;
use lumen_reader::{LexError, ParseError};
use lumen_vm::RuntimeError;

/// One of the four stages a run can fail at, carrying that stage's error.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// The lexer rejected the source text.
    Lexical(LexError),
    /// The parser rejected the token stream.
    Syntactic(ParseError),
    /// The compiler rejected the AST.
    Compile(CompileError),
    /// The VM aborted mid-execution.
    Runtime(RuntimeError),
}

impl Diagnostic {
    /// Render this diagnostic as a single human-readable line, prefixed
    /// with the stage it occurred at.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Lexical(e) => format!("lex error: {e}"),
            Self::Syntactic(e) => format!("parse error: {e}"),
            Self::Compile(e) => format!("compile error: {e}"),
            Self::Runtime(e) => format!("runtime error: {e}"),
        }
    }
}

impl From<LexError> for Diagnostic {
    fn from(e: LexError) -> Self {
        Self::Lexical(e)
    }
}

impl From<ParseError> for Diagnostic {
    fn from(e: ParseError) -> Self {
        Self::Syntactic(e)
    }
}

impl From<CompileError> for Diagnostic {
    fn from(e: CompileError) -> Self {
        Self::Compile(e)
    }
}

impl From<RuntimeError> for Diagnostic {
    fn from(e: RuntimeError) -> Self {
        Self::Runtime(e)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}
