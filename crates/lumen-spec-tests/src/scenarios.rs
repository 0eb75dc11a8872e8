// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! The six literal end-to-end scenarios, run through the full pipeline
//! exactly as written.

use lumen_test_support::run_source;
use lumen_vm::RunOptions;

#[test]
fn recursion_free_call_and_return() {
    let (lines, _) = run_source(
        "fn f(x int) int { return x + 1; } r int; r = f(41); print(r);",
        RunOptions::default(),
    )
    .expect("program runs to completion");
    assert_eq!(lines, vec!["42"]);
}

#[test]
fn recursive_factorial() {
    let (lines, _) = run_source(
        "fn fact(n int) int { if (n <= 1) { return 1; } return n * fact(n-1); } print(fact(10));",
        RunOptions::default(),
    )
    .expect("program runs to completion");
    assert_eq!(lines, vec!["3628800"]);
}

#[test]
fn array_fill_and_print_in_a_loop() {
    let (lines, _) = run_source(
        "arr int[3]; arr[0]=10; arr[1]=20; arr[2]=30; i int; for (i=0;i<3;i=i+1) { print(arr[i]); }",
        RunOptions::default(),
    )
    .expect("program runs to completion");
    assert_eq!(lines, vec!["10", "20", "30"]);
}

#[test]
fn heap_is_reclaimed_across_repeated_void_calls() {
    let (lines, vm) = run_source(
        "fn g() { arr int[5]; } g(); g(); print(0);",
        RunOptions::default(),
    )
    .expect("program runs to completion");
    assert_eq!(lines, vec!["0"]);
    assert_eq!(vm.live_heap_count(), 0);
}

#[test]
fn repeated_pure_call_is_memoized_in_a_loop() {
    let (lines, _) = run_source(
        "fn pure(x int) int { return x * x; } i int; for (i=0;i<3;i=i+1) { print(pure(7)); }",
        RunOptions::default(),
    )
    .expect("program runs to completion");
    assert_eq!(lines, vec!["49", "49", "49"]);
}

#[test]
fn division_by_zero_yields_zero() {
    let (lines, _) = run_source("x int; x = 5/0; print(x);", RunOptions::default())
        .expect("program runs to completion");
    assert_eq!(lines, vec!["0"]);
}
