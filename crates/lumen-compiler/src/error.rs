// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! Compile-time errors: unknown identifiers, undefined functions, arity
//! mismatches, unsupported AST shapes, unresolved jump labels, and static
//! type mismatches.

use thiserror::Error;

/// An error raised while lowering an AST into [`lumen_bytecode::Bytecode`].
///
/// Each variant carries the originating source line where the parser
/// recorded one, per §7's "reported with the AST node's originating token
/// where available".
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    /// An AST node shape the compiler does not know how to lower.
    #[error("line {line}: unsupported construct: {description}")]
    UnsupportedNode {
        /// A short description of the offending node.
        description: String,
        /// Source line.
        line: u32,
    },
    /// A variable was referenced before any declaration bound its name.
    #[error("line {line}: `{name}` used before declaration")]
    UsedBeforeDeclaration {
        /// The undeclared name.
        name: String,
        /// Source line.
        line: u32,
    },
    /// A name was declared twice in the same scope.
    #[error("line {line}: `{name}` is already declared in this scope")]
    Redeclaration {
        /// The redeclared name.
        name: String,
        /// Source line.
        line: u32,
    },
    /// The left-hand side of an assignment was neither a simple
    /// identifier nor an array index.
    #[error("line {line}: invalid assignment target")]
    InvalidAssignmentTarget {
        /// Source line.
        line: u32,
    },
    /// `print`/`sqrt` called with the wrong number of arguments (both take
    /// exactly one).
    #[error("line {line}: `{name}` expects 1 argument, got {got}")]
    IntrinsicArity {
        /// `print` or `sqrt`.
        name: &'static str,
        /// Arguments actually given.
        got: usize,
        /// Source line.
        line: u32,
    },
    /// A call named a function that was never declared.
    #[error("line {line}: undefined function `{name}`")]
    UndefinedFunction {
        /// The unresolved name.
        name: String,
        /// Source line.
        line: u32,
    },
    /// A call supplied the wrong number of arguments for the target
    /// function's declared parameter count.
    #[error("line {line}: `{name}` expects {expected} argument(s), got {got}")]
    ArityMismatch {
        /// The callee's name.
        name: String,
        /// Declared parameter count.
        expected: usize,
        /// Arguments actually given.
        got: usize,
        /// Source line.
        line: u32,
    },
    /// A jump was emitted whose label was never placed. Structured control
    /// flow (`if`/`for`) always places every label it emits; this
    /// indicates an internal compiler inconsistency rather than a user
    /// error, but is reported the same way per the source specification.
    #[error("internal error: jump at instruction {instruction} was never resolved")]
    UnresolvedJumpLabel {
        /// The instruction index holding the unresolved jump.
        instruction: usize,
    },
    /// An arithmetic, comparison, or unary operator was applied to
    /// operand types it does not support — most commonly mixed `Int` and
    /// `Float` operands. The source language's own VM would otherwise
    /// treat this as a runtime type mismatch that silently returns zero;
    /// Lumen's compiler has full static type information and rejects it
    /// instead (see `DESIGN.md`).
    #[error("line {line}: type mismatch: {description}")]
    TypeMismatch {
        /// What was incompatible.
        description: String,
        /// Source line.
        line: u32,
    },
}
