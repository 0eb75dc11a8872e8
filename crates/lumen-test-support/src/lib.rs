// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! Shared test harness for `lumen-spec-tests` and any crate's own
//! integration tests: a capturing output sink, and a one-call helper that
//! runs a source string through the full pipeline.

use lumen_bytecode::Bytecode;
use lumen_compiler::CompileError;
use lumen_reader::{LexError, ParseError};
use lumen_vm::{OutputSink, RunOptions, RuntimeError, Vm};

/// An [`OutputSink`] that collects each printed line into a `Vec<String>`
/// instead of writing to a process stream, so tests can assert on
/// `PRINT` output without capturing stdout.
#[derive(Debug, Default, Clone)]
pub struct CapturingSink {
    lines: Vec<String>,
}

impl CapturingSink {
    /// A sink with no lines captured yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The lines captured so far, in `PRINT` order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl OutputSink for CapturingSink {
    fn print_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Every way the end-to-end pipeline can fail, flattened into one type so
/// scenario tests can use a single `?`.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The lexer rejected the source text.
    Lex(LexError),
    /// The parser rejected the token stream.
    Parse(ParseError),
    /// The compiler rejected the AST.
    Compile(CompileError),
    /// The VM aborted mid-execution.
    Runtime(RuntimeError),
}

impl From<LexError> for PipelineError {
    fn from(e: LexError) -> Self {
        Self::Lex(e)
    }
}

impl From<ParseError> for PipelineError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<CompileError> for PipelineError {
    fn from(e: CompileError) -> Self {
        Self::Compile(e)
    }
}

impl From<RuntimeError> for PipelineError {
    fn from(e: RuntimeError) -> Self {
        Self::Runtime(e)
    }
}

/// Compile `source` to [`Bytecode`] without running it, for tests that
/// assert on the compiled form (constant pool dedup, jump resolution).
///
/// # Errors
///
/// Returns the first lex, parse, or compile error encountered.
pub fn compile_source(source: &str) -> Result<Bytecode, PipelineError> {
    let tokens = lumen_reader::lex(source)?;
    let program = lumen_reader::parse(tokens)?;
    Ok(lumen_compiler::compile(&program)?)
}

/// Compile and run `source` to completion, returning every captured
/// `PRINT` line and the [`Vm`] for further inspection (heap/stack/frame
/// state after the run).
///
/// # Errors
///
/// Returns the first lex, parse, compile, or runtime error encountered.
pub fn run_source(
    source: &str,
    options: RunOptions,
) -> Result<(Vec<String>, Vm<CapturingSink>), PipelineError> {
    let bytecode = compile_source(source)?;
    let mut vm = Vm::new(bytecode, CapturingSink::new(), options);
    vm.run()?;
    let lines = vm.output().lines().to_vec();
    Ok((lines, vm))
}
