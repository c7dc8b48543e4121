//! The two-routine inlining scenario.
//!
//! Routine B is `f(x, y) = x * x + y`; routine A is `g(x) = f(x, k)` with
//! `k = 1000` unless told otherwise. B is built first and A calls it by
//! reference, the same order a JIT would see them in.

use crate::{
    builder::RoutineBuilder,
    routine::CompiledRoutine,
    trap::Result,
    types::{Signature, ValType},
};

/// Constant A passes as B's second argument.
pub const DEFAULT_CONSTANT: i32 = 1000;

/// `ldarg.0; dup; mul; ldarg.1; add; ret`
pub fn emit_routine_b() -> Result<CompiledRoutine> {
    let mut b = RoutineBuilder::with_signature("MethodB", Signature::uniform(2, ValType::I32));
    b.append_load_parameter(0)?;
    b.append_duplicate()?;
    b.append_multiply()?;
    b.append_load_parameter(1)?;
    b.append_add()?;
    b.append_return()?;
    b.finalize()
}

/// `ldarg.0; ldc.i4 <constant>; call MethodB; ret`
pub fn emit_routine_a(second: &CompiledRoutine, constant: i32) -> Result<CompiledRoutine> {
    let mut a = RoutineBuilder::with_signature("MethodA", Signature::uniform(1, ValType::I32));
    a.append_load_parameter(0)?;
    a.append_load_constant(constant)?;
    a.append_call(second)?;
    a.append_return()?;
    a.finalize()
}

/// Both routines, B finalized before A.
pub struct Pair {
    pub a: CompiledRoutine,
    pub b: CompiledRoutine,
}

pub fn emit(constant: i32) -> Result<Pair> {
    let b = emit_routine_b()?;
    let a = emit_routine_a(&b, constant)?;
    Ok(Pair { a, b })
}
