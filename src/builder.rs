//! Incremental construction of routine bodies.

use std::sync::Arc;

use log::trace;

use crate::{
    ir::{CallTarget, Instruction, RoutineDefinition, RoutineRef},
    registry,
    routine::CompiledRoutine,
    trap::{Result, Trap},
    types::{Signature, Val, ValType},
};

/// Name given to routines built without one.
pub const ANONYMOUS: &str = "<dynamic>";

/// Accumulates the instruction sequence of one routine.
///
/// The builder owns its definition until `finalize` succeeds; after that
/// every append and any further `finalize` fail with `AlreadyFinalized`.
pub struct RoutineBuilder {
    definition: RoutineDefinition,
    slot: RoutineRef,
}

impl RoutineBuilder {
    /// An anonymous routine taking `parameter_count` parameters, all of
    /// `result_type`.
    pub fn new(parameter_count: usize, result_type: ValType) -> Self {
        Self::with_signature(ANONYMOUS, Signature::uniform(parameter_count, result_type))
    }

    pub fn with_signature(name: impl Into<String>, signature: Signature) -> Self {
        let name = name.into();
        RoutineBuilder {
            slot: RoutineRef::new(name.clone()),
            definition: RoutineDefinition::new(name, signature, Vec::new()),
        }
    }

    /// The instructions appended so far, with name and signature.
    pub fn definition(&self) -> &RoutineDefinition {
        &self.definition
    }

    /// Whether this builder's definition has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.definition.is_sealed()
    }

    /// A reference other builders can call through before this one is
    /// finalized.
    pub fn reference(&self) -> RoutineRef {
        self.slot.clone()
    }

    pub fn append_load_parameter(&mut self, index: u32) -> Result<()> {
        let arity = self.definition.signature.arity();
        if index as usize >= arity {
            return Err(Trap::InvalidOperand { index, arity });
        }
        self.push(Instruction::LoadParameter(index))
    }

    pub fn append_load_constant(&mut self, value: impl Into<Val>) -> Result<()> {
        self.push(Instruction::LoadConstant(value.into()))
    }

    /// Append a call. The target is not checked here; an unfinalized target
    /// surfaces as `UnresolvedTarget` when this builder finalizes.
    pub fn append_call(&mut self, target: impl Into<CallTarget>) -> Result<()> {
        self.push(Instruction::Call(target.into()))
    }

    pub fn append_duplicate(&mut self) -> Result<()> {
        self.push(Instruction::Duplicate)
    }

    pub fn append_multiply(&mut self) -> Result<()> {
        self.push(Instruction::Multiply)
    }

    pub fn append_add(&mut self) -> Result<()> {
        self.push(Instruction::Add)
    }

    pub fn append_return(&mut self) -> Result<()> {
        self.push(Instruction::Return)
    }

    /// Seal the builder and produce the invocable routine.
    ///
    /// On failure the builder stays open, so a caller can finalize a missing
    /// call target and try again.
    pub fn finalize(&mut self) -> Result<CompiledRoutine> {
        let compiled = registry::finalize(&self.definition)?;
        self.slot.fill(compiled.clone());
        Ok(compiled)
    }

    fn push(&mut self, ins: Instruction) -> Result<()> {
        if self.definition.is_sealed() {
            return Err(Trap::AlreadyFinalized(self.definition.name.clone()));
        }
        trace!("{}: IL_{:04x}: {}", self.definition.name, self.definition.body.len(), ins);
        // Unique until finalize hands a clone to the compiled routine.
        Arc::make_mut(&mut self.definition.body).push(ins);
        Ok(())
    }
}
