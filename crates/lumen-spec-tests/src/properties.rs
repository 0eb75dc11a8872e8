// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! Property-based tests for the six invariants of §8: stack balance,
//! frame balance, heap reachability, cache fidelity, constant-pool
//! dedup, and jump resolution.
//!
//! Each invariant is checked over a family of programs parameterized by
//! `proptest`-generated integers rather than over one fixed literal, so
//! the check exercises more than the single value a hand-written test
//! would happen to pick.

use lumen_bytecode::Opcode;
use lumen_test_support::{compile_source, run_source};
use lumen_vm::RunOptions;
use proptest::prelude::*;

proptest! {
    /// A program made only of declarations, assignments, and `print`
    /// statements — no bare function-call statement, whose return value
    /// is deliberately left unpopped (§8 carves this case out) — returns
    /// the operand stack to depth 0 once every statement has run.
    #[test]
    fn stack_balance_over_non_call_statements(a in -1000i64..1000, b in -1000i64..1000) {
        let source = format!(
            "x int; x = {a} + {b}; y int; y = x * 2; if (y > 0) {{ print(y); }} else {{ print(0); }}"
        );
        let (_, vm) = run_source(&source, RunOptions::default()).expect("well-typed program runs");
        prop_assert_eq!(vm.stack_depth(), 0);
    }

    /// A `CALL … RETURN` pair restores `fp` and the frame count to their
    /// pre-call values, and leaves exactly one more value on the operand
    /// stack than before the call (the return value, consumed here by
    /// the assignment's `STORE`, so the net effect after the whole
    /// statement is zero).
    #[test]
    fn frame_balance_after_call_return(x in -100i64..100) {
        let source = format!("fn f(n int) int {{ return n + 1; }} r int; r = f({x});");
        let (_, vm) = run_source(&source, RunOptions::default()).expect("well-typed program runs");
        let (frame_count, fp) = vm.frame_state();
        prop_assert_eq!(frame_count, 1);
        prop_assert_eq!(fp, 0);
        prop_assert_eq!(vm.stack_depth(), 0);
    }

    /// Every array allocated by a function that does not escape is freed
    /// by the time the whole program halts, regardless of how many times
    /// the function is called or how large the array is.
    #[test]
    fn heap_reachability_after_non_escaping_allocations(len in 0i64..16, calls in 1u32..6) {
        let mut source = format!("fn g() {{ arr int[{len}]; }} ");
        for _ in 0..calls {
            source.push_str("g(); ");
        }
        source.push_str("print(0);");
        let (_, vm) = run_source(&source, RunOptions::default()).expect("well-typed program runs");
        prop_assert_eq!(vm.live_heap_count(), 0);
    }

    /// A pure function's memoized result is identical to what the same
    /// call produces with the cache disabled: the JIT cache may change
    /// *when* work happens, never *what* the program observes.
    #[test]
    fn cache_fidelity_matches_uncached_baseline(x in -50i64..50) {
        let source = format!(
            "fn pure(n int) int {{ return n * n; }} i int; for (i=0;i<3;i=i+1) {{ print(pure({x})); }}"
        );
        let (cached, _) = run_source(&source, RunOptions { jit_enabled: true })
            .expect("well-typed program runs");
        let (uncached, _) = run_source(&source, RunOptions { jit_enabled: false })
            .expect("well-typed program runs");
        prop_assert_eq!(cached, uncached);
    }

    /// Two `CONST` instructions pushing the same integer literal intern
    /// to the same constant-pool index, however many times the literal
    /// is repeated.
    #[test]
    fn constant_pool_deduplicates_repeated_literals(value in -1000i64..1000, repeats in 2u32..8) {
        let mut source = String::new();
        for _ in 0..repeats {
            source.push_str(&format!("print({value});"));
        }
        let bytecode = compile_source(&source).expect("well-typed program compiles");
        let matching = bytecode
            .constants()
            .iter()
            .filter(|c| matches!(c, lumen_bytecode::Value::Int(n) if *n == value))
            .count();
        prop_assert_eq!(matching, 1);
    }

    /// Every `JMP`/`JMP_IF_FALSE` emitted for an `if`/`for` construct
    /// addresses a valid instruction index, for arbitrarily many loop
    /// iterations and either branch of the conditional taken.
    #[test]
    fn jump_targets_stay_in_range(bound in 0i64..20, threshold in -20i64..20) {
        let source = format!(
            "i int; for (i=0;i<{bound};i=i+1) {{ if (i > {threshold}) {{ print(1); }} else {{ print(0); }} }}"
        );
        let bytecode = compile_source(&source).expect("well-typed program compiles");
        let len = bytecode.instructions().len();
        for instr in bytecode.instructions() {
            match instr.op {
                Opcode::Jmp(target) | Opcode::JmpIfFalse(target) => {
                    prop_assert!(target <= len);
                }
                _ => {}
            }
        }
    }
}

#[test]
fn integer_division_and_modulus_by_zero_yield_zero() {
    let (lines, _) = run_source(
        "x int; x = 7/0; y int; y = 7%0; print(x); print(y);",
        RunOptions::default(),
    )
    .expect("program runs to completion");
    assert_eq!(lines, vec!["0", "0"]);
}

#[test]
fn sqrt_of_four_is_two_point_zero() {
    let (lines, _) =
        run_source("print(sqrt(4));", RunOptions::default()).expect("program runs to completion");
    assert_eq!(lines, vec!["2"]);
}

#[test]
fn zero_length_array_allocates_but_any_index_errors() {
    use lumen_vm::RuntimeError;
    let err = run_source(
        "arr int[0]; print(arr[0]);",
        RunOptions::default(),
    )
    .expect_err("indexing a zero-length array must fail");
    assert!(matches!(
        err,
        lumen_test_support::PipelineError::Runtime(RuntimeError::ArrayIndexOutOfRange { .. })
    ));
}

#[test]
fn heap_slot_is_reused_after_its_owner_returns() {
    let (lines, vm) = run_source(
        "fn g() { arr int[2]; } g(); arr2 int[2]; print(0);",
        RunOptions::default(),
    )
    .expect("program runs to completion");
    assert_eq!(lines, vec!["0"]);
    // g()'s array is freed on return, leaving one vacant slot that the
    // top-level `arr2` allocation must reuse rather than growing the heap.
    assert_eq!(vm.live_heap_count(), 1);
}
