// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! AST-to-bytecode lowering (§4.1).
//!
//! The whole program is compiled in one pass over the AST. Function
//! bodies are emitted first, each starting at the current end of the
//! instruction stream; `programStart` is then set to the end of all
//! function bodies, and top-level statements are appended, terminated by
//! `HALT`.
//!
//! Calls to a function declared later in the source (including mutual
//! recursion between two functions) cannot know their target's entry
//! address at emission time, since that address depends on how large
//! every function compiled so far turned out to be. These are handled
//! the same way jump labels are: a placeholder operand is emitted and the
//! instruction's index is recorded for a patching pass once every
//! function's entry address is known.

use std::collections::HashMap;
use std::rc::Rc;

use lumen_bytecode::{Bytecode, FunctionInfo, Instruction, Opcode, Value, ValueType};
use lumen_reader::{BinOp, Expr, FunctionDecl, Program, Stmt, UnOp};

use crate::error::CompileError;
use crate::scope::{Binding, Scope};

/// Sentinel operand for a call/jump placeholder awaiting patching.
const UNRESOLVED: usize = usize::MAX;

/// A user function's call-site-relevant signature, known up front (before
/// any function body is compiled) so forward calls can be arity- and
/// type-checked without knowing the callee's address yet.
#[derive(Debug, Clone)]
struct Signature {
    param_types: Vec<ValueType>,
    return_type: ValueType,
}

/// Lower a whole [`Program`] into a [`Bytecode`].
///
/// # Errors
///
/// Returns the first [`CompileError`] encountered, covering unsupported
/// AST shapes, unknown identifiers, redeclaration, invalid assignment
/// targets, intrinsic/user-call arity mismatches, undefined functions,
/// unresolved jump labels, and static type mismatches.
pub fn compile(program: &Program) -> Result<Bytecode, CompileError> {
    let mut signatures = HashMap::new();
    for function in &program.functions {
        if signatures.contains_key(&function.name) {
            return Err(CompileError::Redeclaration {
                name: function.name.clone(),
                line: function.line,
            });
        }
        signatures.insert(
            function.name.clone(),
            Signature {
                param_types: function.params.iter().map(|p| p.ty).collect(),
                return_type: function.return_type,
            },
        );
    }

    let mut bytecode = Bytecode::new();
    let mut function_entries = HashMap::new();
    let mut pending_calls: Vec<(usize, String, u32)> = Vec::new();

    for function in &program.functions {
        compile_function(
            &mut bytecode,
            function,
            &signatures,
            &mut function_entries,
            &mut pending_calls,
        )?;
    }

    for (instr_index, callee, line) in pending_calls {
        let entry = function_entries
            .get(&callee)
            .copied()
            .ok_or(CompileError::UndefinedFunction { name: callee, line })?;
        bytecode.patch_jump_target(instr_index, entry);
    }

    let program_start = bytecode.instructions().len();
    bytecode
        .set_program_start(program_start)
        .expect("program_start is always the current instruction count");

    // Top-level code never calls a function that hasn't been compiled yet
    // (every function is emitted before `programStart`), so it never needs
    // forward-call patching; this sink is unused but keeps one `FnCompiler`
    // shape for both contexts.
    let mut top_level_pending_calls = Vec::new();
    let mut top_level = FnCompiler {
        bytecode: &mut bytecode,
        scope: Scope::new(),
        return_type: ValueType::Void,
        in_function: false,
        signatures: &signatures,
        function_entries: &function_entries,
        pending_calls: &mut top_level_pending_calls,
    };
    for stmt in &program.top_level {
        top_level.compile_stmt(stmt)?;
    }
    bytecode.push(Instruction::synthetic(Opcode::Halt));

    verify_jumps_resolved(&bytecode)?;

    Ok(bytecode)
}

fn verify_jumps_resolved(bytecode: &Bytecode) -> Result<(), CompileError> {
    for (index, instr) in bytecode.instructions().iter().enumerate() {
        let target = match &instr.op {
            Opcode::Jmp(t) | Opcode::JmpIfFalse(t) | Opcode::Call(t) => *t,
            _ => continue,
        };
        if target == UNRESOLVED {
            return Err(CompileError::UnresolvedJumpLabel { instruction: index });
        }
    }
    Ok(())
}

fn compile_function(
    bytecode: &mut Bytecode,
    function: &FunctionDecl,
    signatures: &HashMap<String, Signature>,
    function_entries: &mut HashMap<String, usize>,
    pending_calls: &mut Vec<(usize, String, u32)>,
) -> Result<(), CompileError> {
    let entry = bytecode.instructions().len();
    function_entries.insert(function.name.clone(), entry);

    let mut scope = Scope::new();
    for param in &function.params {
        scope.declare_param(&param.name, param.ty);
    }
    for index in 0..function.params.len() {
        bytecode.push(Instruction::new(Opcode::Store(index as u32), function.line));
    }

    // Reborrow rather than move: `bytecode` (and the other `&mut` inputs
    // still needed afterward) must still be usable once this nested
    // compiler is dropped at the end of the block.
    let local_count = {
        let mut compiler = FnCompiler {
            bytecode: &mut *bytecode,
            scope,
            return_type: function.return_type,
            in_function: true,
            signatures,
            function_entries: &*function_entries,
            pending_calls,
        };
        for stmt in &function.body {
            compiler.compile_stmt(stmt)?;
        }
        compiler.scope.local_count()
    };

    if !matches!(function.body.last(), Some(Stmt::Return { .. })) {
        let line = function.body.last().map_or(function.line, stmt_line);
        if function.return_type == ValueType::Void {
            bytecode.push(Instruction::new(Opcode::ReturnVoid, line));
        } else {
            let index = bytecode.intern_constant(Value::Int(0));
            bytecode.push(Instruction::new(Opcode::Const(index), line));
            bytecode.push(Instruction::new(Opcode::Return, line));
        }
    }

    bytecode
        .register_function(FunctionInfo {
            name: function.name.clone(),
            entry,
            param_count: function.params.len() as u32,
            local_count,
            return_type: function.return_type,
        })
        .map_err(|_| CompileError::Redeclaration {
            name: function.name.clone(),
            line: function.line,
        })?;

    Ok(())
}

fn stmt_line(stmt: &Stmt) -> u32 {
    match stmt {
        Stmt::VarDecl { line, .. }
        | Stmt::ArrayDecl { line, .. }
        | Stmt::Assign { line, .. }
        | Stmt::ArrayAssign { line, .. }
        | Stmt::If { line, .. }
        | Stmt::For { line, .. }
        | Stmt::Return { line, .. } => *line,
        Stmt::ExprStmt(expr) => expr.line().unwrap_or(0),
    }
}

/// Compiles one function body (or the top-level program) against its own
/// flat local namespace.
struct FnCompiler<'a> {
    bytecode: &'a mut Bytecode,
    scope: Scope,
    return_type: ValueType,
    in_function: bool,
    signatures: &'a HashMap<String, Signature>,
    function_entries: &'a HashMap<String, usize>,
    pending_calls: &'a mut Vec<(usize, String, u32)>,
}

impl FnCompiler<'_> {
    fn emit(&mut self, op: Opcode, line: u32) -> usize {
        self.bytecode.push(Instruction::new(op, line))
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::VarDecl { name, ty, line } => {
                self.scope
                    .declare(name, Binding::Scalar(*ty))
                    .ok_or_else(|| CompileError::Redeclaration {
                        name: name.clone(),
                        line: *line,
                    })?;
                Ok(())
            }
            Stmt::ArrayDecl {
                name,
                elem_ty,
                length,
                line,
            } => {
                let length_ty = self.compile_expr(length)?;
                if length_ty != ValueType::Int {
                    return Err(CompileError::TypeMismatch {
                        description: format!(
                            "array length must be `int`, found `{}`",
                            length_ty.name()
                        ),
                        line: *line,
                    });
                }
                let index = self
                    .scope
                    .declare(name, Binding::Array(*elem_ty))
                    .ok_or_else(|| CompileError::Redeclaration {
                        name: name.clone(),
                        line: *line,
                    })?;
                self.emit(Opcode::ArrayAlloc(index), *line);
                // ARRAY_ALLOC already stores the pointer in locals[index];
                // this STORE only consumes the duplicate it also pushes,
                // keeping the operand stack balanced without resorting to
                // POP (never emitted by this lowering, per the source
                // specification's own note on OP_POP).
                self.emit(Opcode::Store(index), *line);
                Ok(())
            }
            Stmt::Assign { name, value, line } => {
                let (index, binding) = self
                    .scope
                    .lookup(name)
                    .ok_or_else(|| CompileError::UsedBeforeDeclaration {
                        name: name.clone(),
                        line: *line,
                    })?;
                let Binding::Scalar(declared) = binding else {
                    return Err(CompileError::InvalidAssignmentTarget { line: *line });
                };
                let value_ty = self.compile_expr(value)?;
                if value_ty != declared {
                    return Err(CompileError::TypeMismatch {
                        description: format!(
                            "cannot assign `{}` to `{}` (declared `{}`)",
                            value_ty.name(),
                            name,
                            declared.name()
                        ),
                        line: *line,
                    });
                }
                self.emit(Opcode::Store(index), *line);
                Ok(())
            }
            Stmt::ArrayAssign {
                name,
                index,
                value,
                line,
            } => {
                let (local_index, binding) = self
                    .scope
                    .lookup(name)
                    .ok_or_else(|| CompileError::UsedBeforeDeclaration {
                        name: name.clone(),
                        line: *line,
                    })?;
                let Binding::Array(elem_ty) = binding else {
                    return Err(CompileError::TypeMismatch {
                        description: format!("`{name}` is not an array"),
                        line: *line,
                    });
                };
                let index_ty = self.compile_expr(index)?;
                if index_ty != ValueType::Int {
                    return Err(CompileError::TypeMismatch {
                        description: format!(
                            "array index must be `int`, found `{}`",
                            index_ty.name()
                        ),
                        line: *line,
                    });
                }
                let value_ty = self.compile_expr(value)?;
                if value_ty != elem_ty {
                    return Err(CompileError::TypeMismatch {
                        description: format!(
                            "cannot store `{}` into `{}[_]` (element type `{}`)",
                            value_ty.name(),
                            name,
                            elem_ty.name()
                        ),
                        line: *line,
                    });
                }
                self.emit(Opcode::ArrayStore(local_index), *line);
                Ok(())
            }
            Stmt::ExprStmt(expr) => {
                self.compile_expr(expr)?;
                Ok(())
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                line,
            } => {
                self.compile_expr(cond)?;
                let jmp_false = self.emit(Opcode::JmpIfFalse(UNRESOLVED), *line);
                for stmt in then_branch {
                    self.compile_stmt(stmt)?;
                }
                if let Some(else_branch) = else_branch {
                    let jmp_end = self.emit(Opcode::Jmp(UNRESOLVED), *line);
                    let else_start = self.bytecode.instructions().len();
                    self.bytecode.patch_jump_target(jmp_false, else_start);
                    for stmt in else_branch {
                        self.compile_stmt(stmt)?;
                    }
                    let end = self.bytecode.instructions().len();
                    self.bytecode.patch_jump_target(jmp_end, end);
                } else {
                    let end = self.bytecode.instructions().len();
                    self.bytecode.patch_jump_target(jmp_false, end);
                }
                Ok(())
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
                line,
            } => {
                if let Some(init) = init {
                    self.compile_stmt(init)?;
                }
                let loop_start = self.bytecode.instructions().len();
                let skip_condition = matches!(cond, None | Some(Expr::Bool(true)));
                let jmp_end = if skip_condition {
                    None
                } else {
                    let cond = cond.as_ref().expect("checked above");
                    self.compile_expr(cond)?;
                    Some(self.emit(Opcode::JmpIfFalse(UNRESOLVED), *line))
                };
                for stmt in body {
                    self.compile_stmt(stmt)?;
                }
                if let Some(post) = post {
                    self.compile_stmt(post)?;
                }
                self.emit(Opcode::Jmp(loop_start), *line);
                let end = self.bytecode.instructions().len();
                if let Some(jmp_end) = jmp_end {
                    self.bytecode.patch_jump_target(jmp_end, end);
                }
                Ok(())
            }
            Stmt::Return { value, line } => {
                if !self.in_function {
                    return Err(CompileError::UnsupportedNode {
                        description: "`return` outside a function".to_string(),
                        line: *line,
                    });
                }
                match value {
                    Some(expr) => {
                        let ty = self.compile_expr(expr)?;
                        if ty != self.return_type {
                            return Err(CompileError::TypeMismatch {
                                description: format!(
                                    "returning `{}` from a function declared to return `{}`",
                                    ty.name(),
                                    self.return_type.name()
                                ),
                                line: *line,
                            });
                        }
                        self.emit(Opcode::Return, *line);
                    }
                    None => {
                        if self.return_type != ValueType::Void {
                            return Err(CompileError::TypeMismatch {
                                description: format!(
                                    "bare `return;` in a function declared to return `{}`",
                                    self.return_type.name()
                                ),
                                line: *line,
                            });
                        }
                        self.emit(Opcode::ReturnVoid, *line);
                    }
                }
                Ok(())
            }
        }
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<ValueType, CompileError> {
        match expr {
            Expr::Int(n) => {
                let index = self.bytecode.intern_constant(Value::Int(*n));
                self.emit(Opcode::Const(index), 0);
                Ok(ValueType::Int)
            }
            Expr::Float(x) => {
                let index = self.bytecode.intern_constant(Value::Float(*x));
                self.emit(Opcode::Const(index), 0);
                Ok(ValueType::Float)
            }
            Expr::Bool(b) => {
                let index = self.bytecode.intern_constant(Value::Bool(*b));
                self.emit(Opcode::Const(index), 0);
                Ok(ValueType::Bool)
            }
            Expr::Str(s) => {
                let index = self
                    .bytecode
                    .intern_constant(Value::String(Rc::from(s.as_str())));
                self.emit(Opcode::Const(index), 0);
                Ok(ValueType::String)
            }
            Expr::Ident { name, line } => {
                let (index, binding) = self.scope.lookup(name).ok_or_else(|| {
                    CompileError::UsedBeforeDeclaration {
                        name: name.clone(),
                        line: *line,
                    }
                })?;
                self.emit(Opcode::Load(index), *line);
                Ok(match binding {
                    Binding::Scalar(ty) => ty,
                    Binding::Array(_) => ValueType::Array,
                })
            }
            Expr::ArrayIndex { name, index, line } => {
                let (local_index, binding) = self.scope.lookup(name).ok_or_else(|| {
                    CompileError::UsedBeforeDeclaration {
                        name: name.clone(),
                        line: *line,
                    }
                })?;
                let Binding::Array(elem_ty) = binding else {
                    return Err(CompileError::TypeMismatch {
                        description: format!("`{name}` is not an array"),
                        line: *line,
                    });
                };
                let index_ty = self.compile_expr(index)?;
                if index_ty != ValueType::Int {
                    return Err(CompileError::TypeMismatch {
                        description: format!(
                            "array index must be `int`, found `{}`",
                            index_ty.name()
                        ),
                        line: *line,
                    });
                }
                self.emit(Opcode::ArrayLoad(local_index), *line);
                Ok(elem_ty)
            }
            Expr::Unary { op, expr, line } => {
                let ty = self.compile_expr(expr)?;
                match op {
                    UnOp::Neg => {
                        if ty != ValueType::Int && ty != ValueType::Float {
                            return Err(CompileError::TypeMismatch {
                                description: format!("cannot negate `{}`", ty.name()),
                                line: *line,
                            });
                        }
                        self.emit(Opcode::Neg, *line);
                        Ok(ty)
                    }
                    UnOp::Not => {
                        self.emit(Opcode::Not, *line);
                        Ok(ValueType::Bool)
                    }
                }
            }
            Expr::Binary { op, lhs, rhs, line } => self.compile_binary(*op, lhs, rhs, *line),
            Expr::Call { callee, args, line } => self.compile_call(callee, args, *line),
        }
    }

    fn compile_binary(
        &mut self,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
        line: u32,
    ) -> Result<ValueType, CompileError> {
        let lhs_ty = self.compile_expr(lhs)?;
        let rhs_ty = self.compile_expr(rhs)?;
        match op {
            BinOp::Add => self.compile_arithmetic(Opcode::Add, "+", lhs_ty, rhs_ty, line),
            BinOp::Sub => self.compile_arithmetic(Opcode::Sub, "-", lhs_ty, rhs_ty, line),
            BinOp::Mul => self.compile_arithmetic(Opcode::Mul, "*", lhs_ty, rhs_ty, line),
            BinOp::Div => self.compile_arithmetic(Opcode::Div, "/", lhs_ty, rhs_ty, line),
            BinOp::Mod => {
                if lhs_ty == ValueType::Int && rhs_ty == ValueType::Int {
                    self.emit(Opcode::Mod, line);
                    Ok(ValueType::Int)
                } else {
                    Err(CompileError::TypeMismatch {
                        description: format!(
                            "`%` requires `int` operands, found `{}` and `{}`",
                            lhs_ty.name(),
                            rhs_ty.name()
                        ),
                        line,
                    })
                }
            }
            BinOp::Eq => self.compile_equality(Opcode::Eq, lhs_ty, rhs_ty, line),
            BinOp::Neq => self.compile_equality(Opcode::Neq, lhs_ty, rhs_ty, line),
            BinOp::Lt => self.compile_relational(Opcode::Lt, lhs_ty, rhs_ty, line),
            BinOp::Le => self.compile_relational(Opcode::Le, lhs_ty, rhs_ty, line),
            BinOp::Gt => self.compile_relational(Opcode::Gt, lhs_ty, rhs_ty, line),
            BinOp::Ge => self.compile_relational(Opcode::Ge, lhs_ty, rhs_ty, line),
            BinOp::And => {
                self.emit(Opcode::And, line);
                Ok(ValueType::Bool)
            }
            BinOp::Or => {
                self.emit(Opcode::Or, line);
                Ok(ValueType::Bool)
            }
        }
    }

    fn compile_arithmetic(
        &mut self,
        opcode: Opcode,
        symbol: &str,
        lhs_ty: ValueType,
        rhs_ty: ValueType,
        line: u32,
    ) -> Result<ValueType, CompileError> {
        match (lhs_ty, rhs_ty) {
            (ValueType::Int, ValueType::Int) => {
                self.emit(opcode, line);
                Ok(ValueType::Int)
            }
            (ValueType::Float, ValueType::Float) => {
                self.emit(opcode, line);
                Ok(ValueType::Float)
            }
            _ => Err(CompileError::TypeMismatch {
                description: format!(
                    "`{symbol}` requires matching `int` or `float` operands, found `{}` and `{}`",
                    lhs_ty.name(),
                    rhs_ty.name()
                ),
                line,
            }),
        }
    }

    fn compile_equality(
        &mut self,
        opcode: Opcode,
        lhs_ty: ValueType,
        rhs_ty: ValueType,
        line: u32,
    ) -> Result<ValueType, CompileError> {
        if lhs_ty == rhs_ty && is_equatable(lhs_ty) {
            self.emit(opcode, line);
            Ok(ValueType::Bool)
        } else {
            Err(CompileError::TypeMismatch {
                description: format!("cannot compare `{}` with `{}`", lhs_ty.name(), rhs_ty.name()),
                line,
            })
        }
    }

    fn compile_relational(
        &mut self,
        opcode: Opcode,
        lhs_ty: ValueType,
        rhs_ty: ValueType,
        line: u32,
    ) -> Result<ValueType, CompileError> {
        if lhs_ty == rhs_ty && is_ordered(lhs_ty) {
            self.emit(opcode, line);
            Ok(ValueType::Bool)
        } else {
            Err(CompileError::TypeMismatch {
                description: format!("cannot order `{}` against `{}`", lhs_ty.name(), rhs_ty.name()),
                line,
            })
        }
    }

    fn compile_call(
        &mut self,
        callee: &str,
        args: &[Expr],
        line: u32,
    ) -> Result<ValueType, CompileError> {
        match callee {
            "print" => {
                if args.len() != 1 {
                    return Err(CompileError::IntrinsicArity {
                        name: "print",
                        got: args.len(),
                        line,
                    });
                }
                self.compile_expr(&args[0])?;
                self.emit(Opcode::Print, line);
                Ok(ValueType::Void)
            }
            "sqrt" => {
                if args.len() != 1 {
                    return Err(CompileError::IntrinsicArity {
                        name: "sqrt",
                        got: args.len(),
                        line,
                    });
                }
                let ty = self.compile_expr(&args[0])?;
                if ty != ValueType::Int && ty != ValueType::Float {
                    return Err(CompileError::TypeMismatch {
                        description: format!("`sqrt` requires a numeric argument, found `{}`", ty.name()),
                        line,
                    });
                }
                self.emit(Opcode::Sqrt, line);
                Ok(ValueType::Float)
            }
            _ => {
                let signature = self
                    .signatures
                    .get(callee)
                    .cloned()
                    .ok_or_else(|| CompileError::UndefinedFunction {
                        name: callee.to_string(),
                        line,
                    })?;
                if args.len() != signature.param_types.len() {
                    return Err(CompileError::ArityMismatch {
                        name: callee.to_string(),
                        expected: signature.param_types.len(),
                        got: args.len(),
                        line,
                    });
                }
                // Evaluate arguments in reverse source order so argument 0
                // ends up on top of the operand stack at the callee's
                // entry (§4.1's calling convention).
                for (index, arg) in args.iter().enumerate().rev() {
                    let ty = self.compile_expr(arg)?;
                    let expected = signature.param_types[index];
                    if ty != expected {
                        return Err(CompileError::TypeMismatch {
                            description: format!(
                                "argument {index} to `{callee}` expects `{}`, found `{}`",
                                expected.name(),
                                ty.name()
                            ),
                            line,
                        });
                    }
                }
                let target = self.function_entries.get(callee).copied();
                let instr_index = self.emit(Opcode::Call(target.unwrap_or(UNRESOLVED)), line);
                if target.is_none() {
                    self.pending_calls
                        .push((instr_index, callee.to_string(), line));
                }
                Ok(signature.return_type)
            }
        }
    }
}

const fn is_equatable(ty: ValueType) -> bool {
    matches!(
        ty,
        ValueType::Int | ValueType::Float | ValueType::Bool | ValueType::String
    )
}

const fn is_ordered(ty: ValueType) -> bool {
    matches!(ty, ValueType::Int | ValueType::Float | ValueType::Bool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_bytecode::Opcode as Op;
    use lumen_reader::{lex, parse};

    fn compile_src(src: &str) -> Bytecode {
        let tokens = lex(src).expect("lex ok");
        let program = parse(tokens).expect("parse ok");
        compile(&program).expect("compile ok")
    }

    fn try_compile_src(src: &str) -> Result<Bytecode, CompileError> {
        let tokens = lex(src).expect("lex ok");
        let program = parse(tokens).expect("parse ok");
        compile(&program)
    }

    #[test]
    fn functions_compiled_before_program_start() {
        let bc = compile_src("fn f(x int) int { return x + 1; } r int; r = f(41); print(r);");
        assert!(bc.program_start() > 0);
        assert_eq!(bc.functions().len(), 1);
        let f = bc.function_at(0).expect("f registered at entry 0");
        assert_eq!(f.param_count, 1);
    }

    #[test]
    fn program_ends_with_halt() {
        let bc = compile_src("print(1);");
        assert_eq!(bc.instructions().last().map(|i| &i.op), Some(&Op::Halt));
    }

    #[test]
    fn recursive_call_resolves_own_entry() {
        let bc = compile_src(
            "fn fact(n int) int { if (n <= 1) { return 1; } return n * fact(n-1); } print(fact(10));",
        );
        let has_self_call = bc
            .instructions()
            .iter()
            .any(|i| matches!(&i.op, Op::Call(0)));
        assert!(has_self_call);
    }

    #[test]
    fn forward_call_is_patched() {
        let bc = compile_src("fn a() int { return b(); } fn b() int { return 1; } print(a());");
        assert!(
            bc.instructions()
                .iter()
                .all(|i| !matches!(&i.op, Op::Call(t) if *t == UNRESOLVED))
        );
    }

    #[test]
    fn undefined_function_is_a_compile_error() {
        let err = try_compile_src("print(nope());").unwrap_err();
        assert!(matches!(err, CompileError::UndefinedFunction { .. }));
    }

    #[test]
    fn arity_mismatch_is_a_compile_error() {
        let err =
            try_compile_src("fn f(x int) int { return x; } print(f(1, 2));").unwrap_err();
        assert!(matches!(err, CompileError::ArityMismatch { .. }));
    }

    #[test]
    fn mixed_int_float_arithmetic_is_rejected() {
        let err = try_compile_src("x int; x = 1 + 2.0; print(x);").unwrap_err();
        assert!(matches!(err, CompileError::TypeMismatch { .. }));
    }

    #[test]
    fn used_before_declaration_is_a_compile_error() {
        let err = try_compile_src("print(x);").unwrap_err();
        assert!(matches!(err, CompileError::UsedBeforeDeclaration { .. }));
    }

    #[test]
    fn redeclaration_is_a_compile_error() {
        let err = try_compile_src("x int; x int; print(x);").unwrap_err();
        assert!(matches!(err, CompileError::Redeclaration { .. }));
    }

    #[test]
    fn array_decl_balances_stack_with_store_not_pop() {
        let bc = compile_src("arr int[3]; print(arr[0]);");
        assert!(
            bc.instructions()
                .iter()
                .any(|i| matches!(&i.op, Op::ArrayAlloc(_)))
        );
        assert!(!bc.instructions().iter().any(|i| i.op == Op::Pop));
    }

    #[test]
    fn implicit_zero_return_appended_when_missing() {
        let bc = compile_src("fn f() int { x int; x = 1; } print(f());");
        let entry_instrs = &bc.instructions()[0..];
        let has_implicit = entry_instrs
            .windows(2)
            .any(|w| matches!((&w[0].op, &w[1].op), (Op::Const(_), Op::Return)));
        assert!(has_implicit);
    }
}
