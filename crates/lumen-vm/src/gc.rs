// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! The reference-based tracing garbage collector (§4.4).
//!
//! Triggered immediately before a frame is popped on `RETURN`/`RETURN_VOID`.
//! Two-pass, index-based, non-moving: mark every `HeapPtr` local in every
//! frame except the one about to be popped, then sweep the popped frame's
//! own `HeapPtr` locals, freeing any whose index did not survive the mark.
//!
//! The scan ignores the operand stack: the language never lets a `HeapPtr`
//! reach the operand stack across a call boundary (arrays are addressed
//! only through the owning local at `ARRAY_*` sites). An implementation
//! that changes this contract must extend the scan to the operand stack.

use std::collections::HashSet;

use lumen_bytecode::{Frame, Heap, Value};

/// Run one mark-and-sweep pass, treating `popped_index` as the frame about
/// to be dismantled.
///
/// # Panics
///
/// Never panics; an out-of-range `popped_index` simply means the sweep
/// pass has nothing to do (every frame is marked, nothing is freed).
pub fn collect(frames: &[Frame], heap: &mut Heap, popped_index: usize) {
    let mut live = HashSet::new();
    for (index, frame) in frames.iter().enumerate() {
        if index == popped_index {
            continue;
        }
        mark_frame(frame, &mut live);
    }

    if let Some(popped) = frames.get(popped_index) {
        for local in popped.locals() {
            if let Value::HeapPtr(ptr) = local {
                if !live.contains(ptr) {
                    heap.free(*ptr);
                }
            }
        }
    }
}

fn mark_frame(frame: &Frame, live: &mut HashSet<usize>) {
    for local in frame.locals() {
        if let Value::HeapPtr(ptr) = local {
            live.insert(*ptr);
        }
    }
}
