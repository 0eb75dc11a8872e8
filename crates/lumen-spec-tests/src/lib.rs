// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! End-to-end scenario tests and property-based invariant tests for the
//! Lumen execution engine.
//!
//! This crate has no runtime behavior of its own; it is a test-only
//! workspace member, laid out one module per concern the way the
//! teacher's own `vm_test` submodules are, just at the crate root instead
//! of nested under `src/vm/`.

#[cfg(test)]
mod scenarios;

#[cfg(test)]
mod properties;
