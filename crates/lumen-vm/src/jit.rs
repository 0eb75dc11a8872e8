// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! The memoizing JIT cache (§4.5).
//!
//! A deterministic specialization cache, not a general tracing JIT: when a
//! pure function is called repeatedly with structurally equal arguments,
//! re-execution is replaced by a stub that pushes the recorded result and
//! returns immediately.
//!
//! Per-function state machine, keyed by the function's entry address.
//! Analysis is lazy: a function is only inspected the first time a call
//! site for it actually executes.

use std::collections::HashMap;

use lumen_bytecode::{Bytecode, Instruction, Opcode, Value};
use tracing::debug;

/// An upper bound on how many times a function stuck in `CallingDynamic`
/// is re-examined before being conservatively marked `Dynamic`. The
/// source specification leaves this open ("either behavior is
/// acceptable"); this is Lumen's choice (see `DESIGN.md`).
const MAX_DYNAMIC_REEXAMINATIONS: u32 = 8;

/// An argument tuple, in call-site order (index 0 is the first argument,
/// i.e. the topmost operand-stack slot at call time).
pub type ArgTuple = Vec<Value>;

fn tuples_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structural_eq(y))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// Has side effects, or has been called with a `HeapPtr` argument:
    /// never cached, on any future call.
    Dynamic,
    /// Body calls another function whose state is not yet `JitCompiled`;
    /// re-examined (bounded) on each later call.
    CallingDynamic { reexamined: u32 },
    /// Analyzable and pure; awaiting a return for at least one pending
    /// argument tuple.
    PendingCompiledReturn,
    /// At least one `(args, result)` pair has a compiled stub. New tuples
    /// still add new pending entries.
    JitCompiled,
}

#[derive(Debug, Clone)]
struct FunctionCache {
    state: State,
    /// Tuples observed at a call site but not yet returned.
    pending: Vec<ArgTuple>,
    /// Tuples with a recorded result, and the stub's entry address.
    cached: Vec<(ArgTuple, usize)>,
}

/// What a call site should do after consulting the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallDecision {
    /// Jump straight to the compiled stub at this address.
    Hit(usize),
    /// No cached result for this tuple; execute the function body
    /// starting at its normal entry address.
    Miss,
}

/// The memoizing cache, keyed by function entry address.
#[derive(Debug, Default)]
pub struct JitCache {
    functions: HashMap<usize, FunctionCache>,
}

impl JitCache {
    /// A fresh cache with no functions observed yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consult (and, if first-seen, analyze) the cache for a call to
    /// `entry` with `args`. Returns whether to use a compiled stub.
    pub fn on_call(&mut self, bytecode: &Bytecode, entry: usize, args: &[Value]) -> CallDecision {
        let has_heap_arg = args.iter().any(|v| matches!(v, Value::HeapPtr(_)));

        if !self.functions.contains_key(&entry) {
            let state = if has_heap_arg {
                State::Dynamic
            } else {
                self.analyze(bytecode, entry)
            };
            debug!(entry, ?state, "compiling");
            self.functions.insert(
                entry,
                FunctionCache {
                    state,
                    pending: Vec::new(),
                    cached: Vec::new(),
                },
            );
        } else if has_heap_arg {
            // A function believed pure that is now observed with a
            // HeapPtr argument is retroactively disqualified: the cache
            // must never serve, or start tracking, a tuple it cannot
            // validate (§4.5's "No argument is a HeapPtr").
            self.functions.get_mut(&entry).expect("just checked").state = State::Dynamic;
        }

        if let State::CallingDynamic { reexamined } = self.functions[&entry].state {
            let reanalyzed = self.analyze(bytecode, entry);
            let entry_cache = self.functions.get_mut(&entry).expect("inserted above");
            entry_cache.state = if reexamined + 1 >= MAX_DYNAMIC_REEXAMINATIONS {
                debug!(entry, "compiling: re-examination limit reached, marking dynamic");
                State::Dynamic
            } else if matches!(reanalyzed, State::CallingDynamic { .. }) {
                State::CallingDynamic {
                    reexamined: reexamined + 1,
                }
            } else {
                debug!(entry, state = ?reanalyzed, "compiling: dependency resolved");
                reanalyzed
            };
        }

        let entry_cache = self.functions.get_mut(&entry).expect("inserted above");
        match entry_cache.state {
            State::Dynamic | State::CallingDynamic { .. } => CallDecision::Miss,
            State::PendingCompiledReturn | State::JitCompiled => {
                if let Some((_, stub)) = entry_cache.cached.iter().find(|(t, _)| tuples_equal(t, args))
                {
                    debug!(entry, stub, "using cached");
                    return CallDecision::Hit(*stub);
                }
                if !entry_cache.pending.iter().any(|t| tuples_equal(t, args)) {
                    entry_cache.pending.push(args.to_vec());
                }
                CallDecision::Miss
            }
        }
    }

    /// Record a function's return, matching it against a pending tuple,
    /// emitting a stub, and promoting the function to `JitCompiled` once
    /// every pending tuple has a recorded result.
    ///
    /// A no-op for functions the cache never tracked as pending (`Dynamic`,
    /// `CallingDynamic`, or untracked) — the cache only ever serves a
    /// result for a tuple it finished recording, per §4.5's soundness
    /// constraint.
    pub fn on_return(
        &mut self,
        bytecode: &mut Bytecode,
        entry: usize,
        args: &[Value],
        result: &Value,
    ) {
        let Some(entry_cache) = self.functions.get_mut(&entry) else {
            return;
        };
        if !matches!(
            entry_cache.state,
            State::PendingCompiledReturn | State::JitCompiled
        ) {
            return;
        }
        let Some(pos) = entry_cache.pending.iter().position(|t| tuples_equal(t, args)) else {
            return;
        };
        let tuple = entry_cache.pending.remove(pos);

        let Some(func_info) = bytecode.function_at(entry).cloned() else {
            return;
        };
        let stub_entry = emit_stub(bytecode, func_info.param_count, result);

        let entry_cache = self.functions.get_mut(&entry).expect("checked above");
        entry_cache.cached.push((tuple, stub_entry));
        debug!(entry, stub_entry, "cached");
        if entry_cache.pending.is_empty() {
            entry_cache.state = State::JitCompiled;
        }
    }

    /// Analyze `entry`'s body for the purity conditions of §4.5: no
    /// side-effecting instruction reachable before the first return that
    /// is not jumped over, and every nested call targets either the same
    /// function (recursion) or a function already `JitCompiled`.
    fn analyze(&self, bytecode: &Bytecode, entry: usize) -> State {
        let instructions = bytecode.instructions();
        let mut farthest_jump = entry;
        let mut boundary = instructions.len();
        for (offset, instr) in instructions.iter().enumerate().skip(entry) {
            match instr.op {
                Opcode::Jmp(target) | Opcode::JmpIfFalse(target) if target > offset => {
                    farthest_jump = farthest_jump.max(target);
                }
                Opcode::Return | Opcode::ReturnVoid if offset >= farthest_jump => {
                    boundary = offset;
                    break;
                }
                _ => {}
            }
        }

        let mut calls_dynamic_dependency = false;
        for instr in &instructions[entry..boundary] {
            if !instr.op.is_side_effecting() {
                continue;
            }
            match instr.op {
                Opcode::Call(target) if target == entry => {}
                Opcode::Call(target) => match self.functions.get(&target).map(|f| &f.state) {
                    Some(State::JitCompiled) => {}
                    _ => calls_dynamic_dependency = true,
                },
                _ => return State::Dynamic,
            }
        }

        if calls_dynamic_dependency {
            State::CallingDynamic { reexamined: 0 }
        } else {
            State::PendingCompiledReturn
        }
    }
}

/// Append `STORE 0; STORE 1; … STORE paramCount-1;` followed by either
/// `CONST c; RETURN` or `RETURN_VOID`, and return the stub's entry
/// address.
fn emit_stub(bytecode: &mut Bytecode, param_count: u32, result: &Value) -> usize {
    let stub_entry = bytecode.instructions().len();
    for index in 0..param_count {
        bytecode.push(Instruction::synthetic(Opcode::Store(index)));
    }
    if matches!(result, Value::Nil) {
        bytecode.push(Instruction::synthetic(Opcode::ReturnVoid));
    } else {
        let const_index = bytecode.intern_constant(result.clone());
        bytecode.push(Instruction::synthetic(Opcode::Const(const_index)));
        bytecode.push(Instruction::synthetic(Opcode::Return));
    }
    stub_entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_bytecode::{FunctionInfo, ValueType};

    fn pure_square() -> Bytecode {
        // fn pure(x int) int { return x * x; }
        let mut bc = Bytecode::new();
        bc.push(Instruction::synthetic(Opcode::Store(0)));
        bc.push(Instruction::synthetic(Opcode::Load(0)));
        bc.push(Instruction::synthetic(Opcode::Load(0)));
        bc.push(Instruction::synthetic(Opcode::Mul));
        bc.push(Instruction::synthetic(Opcode::Return));
        bc.register_function(FunctionInfo {
            name: "pure".into(),
            entry: 0,
            param_count: 1,
            local_count: 1,
            return_type: ValueType::Int,
        })
        .expect("register ok");
        bc
    }

    #[test]
    fn pure_function_becomes_jit_compiled_after_first_return() {
        let mut bc = pure_square();
        let mut cache = JitCache::new();

        let args = vec![Value::Int(7)];
        assert_eq!(cache.on_call(&bc, 0, &args), CallDecision::Miss);
        cache.on_return(&mut bc, 0, &args, &Value::Int(49));

        assert!(matches!(
            cache.functions.get(&0).map(|f| &f.state),
            Some(State::JitCompiled)
        ));
    }

    #[test]
    fn repeated_call_with_same_args_hits_cache() {
        let mut bc = pure_square();
        let mut cache = JitCache::new();
        let args = vec![Value::Int(7)];

        cache.on_call(&bc, 0, &args);
        cache.on_return(&mut bc, 0, &args, &Value::Int(49));

        match cache.on_call(&bc, 0, &args) {
            CallDecision::Hit(stub) => {
                assert!(stub >= bc.function_at(0).expect("registered").entry);
            }
            CallDecision::Miss => panic!("expected a cache hit"),
        }
    }

    #[test]
    fn different_args_never_hit_an_unrecorded_tuple() {
        let mut bc = pure_square();
        let mut cache = JitCache::new();
        let seven = vec![Value::Int(7)];
        let eight = vec![Value::Int(8)];

        cache.on_call(&bc, 0, &seven);
        cache.on_return(&mut bc, 0, &seven, &Value::Int(49));

        assert_eq!(cache.on_call(&bc, 0, &eight), CallDecision::Miss);
    }

    #[test]
    fn side_effecting_function_is_never_cached() {
        let mut bc = Bytecode::new();
        bc.push(Instruction::synthetic(Opcode::Store(0)));
        bc.push(Instruction::synthetic(Opcode::Load(0)));
        bc.push(Instruction::synthetic(Opcode::Print));
        bc.push(Instruction::synthetic(Opcode::ReturnVoid));
        bc.register_function(FunctionInfo {
            name: "noisy".into(),
            entry: 0,
            param_count: 1,
            local_count: 1,
            return_type: ValueType::Void,
        })
        .expect("register ok");
        let mut cache = JitCache::new();

        let args = vec![Value::Int(1)];
        cache.on_call(&bc, 0, &args);
        cache.on_return(&mut bc, 0, &args, &Value::Nil);

        assert_eq!(cache.on_call(&bc, 0, &args), CallDecision::Miss);
        assert!(matches!(
            cache.functions.get(&0).map(|f| &f.state),
            Some(State::Dynamic)
        ));
    }

    #[test]
    fn heap_pointer_argument_disqualifies_caching() {
        let bc = pure_square();
        let mut cache = JitCache::new();
        let args = vec![Value::HeapPtr(0)];

        assert_eq!(cache.on_call(&bc, 0, &args), CallDecision::Miss);
        assert!(matches!(
            cache.functions.get(&0).map(|f| &f.state),
            Some(State::Dynamic)
        ));
    }
}
