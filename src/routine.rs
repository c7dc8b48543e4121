//! Compiled routines and the stack interpreter that runs them.
//!
//! Finalizing a definition lowers it into a `Vec<Op>` where every call
//! target is already a `CompiledRoutine` and every parameter index is
//! bounds-checked. The dispatch loop therefore never looks anything up by
//! name and never touches a `RoutineRef`.

use std::fmt;
use std::sync::Arc;

use log::trace;

use crate::{
    ir::RoutineDefinition,
    trap::{Result, Trap},
    types::{Signature, Val},
};

// ── Lowered ops (built once at finalize time) ─────────────────────────────────

#[derive(Clone)]
pub(crate) enum Op {
    LoadParameter(usize),
    LoadConstant(Val),
    Duplicate,
    Multiply,
    Add,
    Call(CompiledRoutine),
    Return,
}

impl Op {
    fn mnemonic(&self) -> &'static str {
        match self {
            Op::LoadParameter(_) => "ldarg",
            Op::LoadConstant(_) => "ldc",
            Op::Duplicate => "dup",
            Op::Multiply => "mul",
            Op::Add => "add",
            Op::Call(_) => "call",
            Op::Return => "ret",
        }
    }
}

struct Inner {
    id: u64,
    definition: RoutineDefinition,
    ops: Vec<Op>,
}

/// A finalized, invocable routine.
///
/// Cloning is a refcount bump. The instruction stream is never mutated after
/// finalize and every invocation gets its own value stack, so a routine can
/// be shared across threads freely.
#[derive(Clone)]
pub struct CompiledRoutine(Arc<Inner>);

impl CompiledRoutine {
    pub(crate) fn new(id: u64, definition: RoutineDefinition, ops: Vec<Op>) -> Self {
        CompiledRoutine(Arc::new(Inner { id, definition, ops }))
    }

    pub fn name(&self) -> &str {
        &self.0.definition.name
    }

    pub fn signature(&self) -> &Signature {
        &self.0.definition.signature
    }

    pub fn parameter_count(&self) -> usize {
        self.signature().arity()
    }

    /// The definition this routine was finalized from.
    pub fn definition(&self) -> &RoutineDefinition {
        &self.0.definition
    }

    /// Process-unique stand-in for a native entry point address.
    ///
    /// Only meant for printing and external inspection; two routines with
    /// identical bodies still get different identifiers.
    pub fn opaque_identifier(&self) -> u64 {
        self.0.id
    }

    /// Run the routine with `args`, which must match the signature exactly.
    pub fn invoke(&self, args: &[Val]) -> Result<Val> {
        let sig = self.signature();
        if args.len() != sig.arity() {
            return Err(Trap::ArityMismatch {
                routine: self.name().to_string(),
                expected: sig.arity(),
                actual: args.len(),
            });
        }
        for (&expected, arg) in sig.params.iter().zip(args) {
            if arg.ty() != expected {
                return Err(Trap::TypeMismatch {
                    expected,
                    found: arg.ty(),
                });
            }
        }
        trace!("invoke {} [{:016x}] args={:?}", self.name(), self.0.id, args);
        self.exec(args)
    }

    // ── Core dispatch loop ────────────────────────────────────────────────────

    fn exec(&self, args: &[Val]) -> Result<Val> {
        let mut stack: Vec<Val> = Vec::with_capacity(8);

        for op in &self.0.ops {
            match op {
                Op::LoadParameter(i) => {
                    let v = *args.get(*i).ok_or(Trap::InvalidOperand {
                        index: *i as u32,
                        arity: args.len(),
                    })?;
                    stack.push(v);
                }
                Op::LoadConstant(v) => stack.push(*v),
                Op::Duplicate => {
                    require(&stack, op, 1)?;
                    let top = stack[stack.len() - 1];
                    stack.push(top);
                }
                Op::Multiply | Op::Add => {
                    require(&stack, op, 2)?;
                    let b = pop(&mut stack, op)?;
                    let a = pop(&mut stack, op)?;
                    stack.push(arith(op, a, b)?);
                }
                Op::Call(callee) => {
                    let n = callee.parameter_count();
                    require(&stack, op, n)?;
                    let arg_start = stack.len() - n;
                    // Args are read straight off the caller's stack, then dropped.
                    let result = callee.invoke(&stack[arg_start..])?;
                    stack.truncate(arg_start);
                    stack.push(result);
                }
                Op::Return => {
                    let val = pop(&mut stack, op)?;
                    let expected = self.signature().result;
                    if val.ty() != expected {
                        return Err(Trap::TypeMismatch {
                            expected,
                            found: val.ty(),
                        });
                    }
                    return Ok(val);
                }
            }
        }

        // Finalize rejects bodies without a Return, so this only fires if a
        // lowered body was built by hand.
        Err(Trap::IncompleteRoutine(self.name().to_string()))
    }
}

fn require(stack: &[Val], op: &Op, needed: usize) -> Result<()> {
    if stack.len() < needed {
        return Err(Trap::StackUnderflow {
            op: op.mnemonic(),
            needed,
            available: stack.len(),
        });
    }
    Ok(())
}

fn pop(stack: &mut Vec<Val>, op: &Op) -> Result<Val> {
    stack.pop().ok_or(Trap::StackUnderflow {
        op: op.mnemonic(),
        needed: 1,
        available: 0,
    })
}

fn arith(op: &Op, a: Val, b: Val) -> Result<Val> {
    let mul = matches!(op, Op::Multiply);
    Ok(match (a, b) {
        (Val::I32(a), Val::I32(b)) if mul => Val::I32(a.wrapping_mul(b)),
        (Val::I32(a), Val::I32(b)) => Val::I32(a.wrapping_add(b)),
        (Val::I64(a), Val::I64(b)) if mul => Val::I64(a.wrapping_mul(b)),
        (Val::I64(a), Val::I64(b)) => Val::I64(a.wrapping_add(b)),
        (Val::F32(a), Val::F32(b)) if mul => Val::F32(a * b),
        (Val::F32(a), Val::F32(b)) => Val::F32(a + b),
        (Val::F64(a), Val::F64(b)) if mul => Val::F64(a * b),
        (Val::F64(a), Val::F64(b)) => Val::F64(a + b),
        (a, b) => {
            return Err(Trap::TypeMismatch {
                expected: a.ty(),
                found: b.ty(),
            })
        }
    })
}

impl PartialEq for CompiledRoutine {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl fmt::Debug for CompiledRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRoutine")
            .field("name", &self.name())
            .field("id", &format_args!("{:016x}", self.0.id))
            .field("signature", self.signature())
            .finish()
    }
}

impl fmt::Display for CompiledRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "// entry {:016x}", self.0.id)?;
        write!(f, "{}", self.0.definition)
    }
}
