// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! `lumenc`: the command-line driver for the lex → parse → compile →
//! execute pipeline (§6).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lumen_diagnostics::Diagnostic;
use lumen_vm::{RunOptions, StdoutSink, Vm};
use tracing_subscriber::EnvFilter;

/// Compile and run a Lumen source file.
#[derive(Debug, Parser)]
#[command(name = "lumenc", version, about, long_about = None)]
struct Args {
    /// Path to the Lumen source file to run.
    source: PathBuf,

    /// Print one diagnostic line per JIT cache state transition.
    #[arg(long)]
    trace_cache: bool,

    /// Disable the memoizing JIT cache.
    #[arg(long)]
    no_jit: bool,

    /// Print the compiled bytecode instead of running it.
    #[arg(long)]
    disassemble: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.trace_cache {
        EnvFilter::new("lumen_vm::jit=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let source = match std::fs::read_to_string(&args.source) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("cannot read `{}`: {e}", args.source.display());
            return ExitCode::FAILURE;
        }
    };

    match run(&args, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(diag) => {
            eprintln!("{diag}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, source: &str) -> Result<(), Diagnostic> {
    let tokens = lumen_reader::lex(source)?;
    let program = lumen_reader::parse(tokens)?;
    let bytecode = lumen_compiler::compile(&program)?;

    if args.disassemble {
        print!("{}", lumen_bytecode::disassemble(&bytecode));
        return Ok(());
    }

    let options = RunOptions {
        jit_enabled: !args.no_jit,
    };
    let mut vm = Vm::new(bytecode, StdoutSink, options);
    vm.run()?;
    Ok(())
}
