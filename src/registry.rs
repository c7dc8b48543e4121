//! Finalization: definition → invocable routine.
//!
//! Validates a definition, lowers it into the interpreter's op stream with
//! every call target resolved, and hands out the routine's opaque
//! identifier.

use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use crate::{
    ir::{Instruction, RoutineDefinition},
    routine::{CompiledRoutine, Op},
    trap::{Result, Trap},
};

/// First identifier handed out. Chosen so identifiers print like 64-bit user
/// space addresses in the demo output.
pub const IDENTIFIER_BASE: u64 = 0x0000_7ff9_c500_0080;
/// Gap between consecutive identifiers.
pub const IDENTIFIER_STRIDE: u64 = 0x70;

static NEXT_IDENTIFIER: AtomicU64 = AtomicU64::new(IDENTIFIER_BASE);

fn next_identifier() -> u64 {
    NEXT_IDENTIFIER.fetch_add(IDENTIFIER_STRIDE, Ordering::Relaxed)
}

/// Finalize `definition` into a `CompiledRoutine`.
///
/// Every `Call` target must already be finalized; a pending reference whose
/// builder has not finalized yet fails with `UnresolvedTarget`. Since a
/// routine cannot reference itself before it exists, the call graph of
/// compiled routines is always acyclic.
///
/// A definition is finalized at most once; later attempts, including through
/// a clone, fail with `AlreadyFinalized`. A failed finalize does not seal.
pub fn finalize(definition: &RoutineDefinition) -> Result<CompiledRoutine> {
    if definition.is_sealed() {
        return Err(Trap::AlreadyFinalized(definition.name.clone()));
    }
    if !definition.has_return() {
        return Err(Trap::IncompleteRoutine(definition.name.clone()));
    }

    let arity = definition.signature.arity();
    let mut ops = Vec::with_capacity(definition.body.len());
    for ins in definition.body.iter() {
        let op = match ins {
            Instruction::LoadParameter(i) => {
                if *i as usize >= arity {
                    return Err(Trap::InvalidOperand { index: *i, arity });
                }
                Op::LoadParameter(*i as usize)
            }
            Instruction::LoadConstant(v) => Op::LoadConstant(*v),
            Instruction::Duplicate => Op::Duplicate,
            Instruction::Multiply => Op::Multiply,
            Instruction::Add => Op::Add,
            Instruction::Call(target) => {
                let callee = target
                    .resolve()
                    .ok_or_else(|| Trap::UnresolvedTarget(target.name().to_string()))?;
                Op::Call(callee)
            }
            Instruction::Return => Op::Return,
        };
        ops.push(op);
    }

    if !definition.seal() {
        return Err(Trap::AlreadyFinalized(definition.name.clone()));
    }
    let id = next_identifier();
    debug!(
        "finalized {} {} [{:016x}] ({} instructions)",
        definition.name,
        definition.signature,
        id,
        ops.len()
    );
    Ok(CompiledRoutine::new(id, definition.clone(), ops))
}
