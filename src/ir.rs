use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::{
    routine::CompiledRoutine,
    types::{Signature, Val},
};

/// The dynemit instruction set.
///
/// Operands are consumed from a value stack in push order; every routine
/// body ends in (at least one) `Return`.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    // ── Stack ────────────────────────────────────────────────────────────────
    LoadParameter(u32),
    LoadConstant(Val),
    Duplicate,

    // ── Arithmetic ───────────────────────────────────────────────────────────
    Multiply,
    Add,

    // ── Control ──────────────────────────────────────────────────────────────
    Call(CallTarget),
    Return,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::LoadParameter(i) => write!(f, "ldarg.{i}"),
            Instruction::LoadConstant(Val::I32(v)) => write!(f, "ldc.i4 {v}"),
            Instruction::LoadConstant(Val::I64(v)) => write!(f, "ldc.i8 {v}"),
            Instruction::LoadConstant(Val::F32(v)) => write!(f, "ldc.r4 {v}"),
            Instruction::LoadConstant(Val::F64(v)) => write!(f, "ldc.r8 {v}"),
            Instruction::Duplicate => f.write_str("dup"),
            Instruction::Multiply => f.write_str("mul"),
            Instruction::Add => f.write_str("add"),
            Instruction::Call(target) => write!(f, "call {}", target.name()),
            Instruction::Return => f.write_str("ret"),
        }
    }
}

// ── Call targets ─────────────────────────────────────────────────────────────

struct RefSlot {
    name: String,
    compiled: OnceLock<CompiledRoutine>,
}

/// A handle to the routine a builder *will* produce.
///
/// Other builders may append calls through it before the referenced builder
/// finalizes; the reference only has to be filled by the time the caller
/// finalizes.
#[derive(Clone)]
pub struct RoutineRef(Arc<RefSlot>);

impl RoutineRef {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        RoutineRef(Arc::new(RefSlot {
            name: name.into(),
            compiled: OnceLock::new(),
        }))
    }

    /// Name of the routine this reference will resolve to.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The compiled routine, once the owning builder has finalized.
    pub fn get(&self) -> Option<&CompiledRoutine> {
        self.0.compiled.get()
    }

    /// Filled exactly once, by the owning builder's successful finalize.
    pub(crate) fn fill(&self, compiled: CompiledRoutine) {
        let _ = self.0.compiled.set(compiled);
    }
}

impl fmt::Debug for RoutineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutineRef")
            .field("name", &self.name())
            .field("resolved", &self.get().is_some())
            .finish()
    }
}

impl PartialEq for RoutineRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// What a `Call` instruction names.
#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    Compiled(CompiledRoutine),
    Pending(RoutineRef),
}

impl CallTarget {
    /// Name of the routine being called, resolved or not.
    pub fn name(&self) -> &str {
        match self {
            CallTarget::Compiled(c) => c.name(),
            CallTarget::Pending(r) => r.name(),
        }
    }

    /// Resolve to a finalized routine, if there is one yet.
    pub fn resolve(&self) -> Option<CompiledRoutine> {
        match self {
            CallTarget::Compiled(c) => Some(c.clone()),
            CallTarget::Pending(r) => r.get().cloned(),
        }
    }
}

impl From<CompiledRoutine> for CallTarget {
    fn from(c: CompiledRoutine) -> Self {
        CallTarget::Compiled(c)
    }
}

impl From<&CompiledRoutine> for CallTarget {
    fn from(c: &CompiledRoutine) -> Self {
        CallTarget::Compiled(c.clone())
    }
}

impl From<RoutineRef> for CallTarget {
    fn from(r: RoutineRef) -> Self {
        CallTarget::Pending(r)
    }
}

impl From<&RoutineRef> for CallTarget {
    fn from(r: &RoutineRef) -> Self {
        CallTarget::Pending(r.clone())
    }
}

// ── Definitions ──────────────────────────────────────────────────────────────

/// A routine body plus metadata, not yet invocable.
///
/// `body` sits behind an `Arc` so a finalized routine can keep the
/// definition around for listings without copying the instruction vector.
/// Clones share the seal: once any of them is finalized, all of them are.
#[derive(Debug, Clone)]
pub struct RoutineDefinition {
    pub name: String,
    pub signature: Signature,
    pub body: Arc<Vec<Instruction>>,
    sealed: Arc<AtomicBool>,
}

impl RoutineDefinition {
    pub fn new(name: impl Into<String>, signature: Signature, body: Vec<Instruction>) -> Self {
        RoutineDefinition {
            name: name.into(),
            signature,
            body: Arc::new(body),
            sealed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether this definition has already been finalized.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Marks the definition finalized. Returns false if it already was.
    pub(crate) fn seal(&self) -> bool {
        self.sealed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether the body contains a `Return` anywhere.
    pub fn has_return(&self) -> bool {
        self.body.iter().any(|i| matches!(i, Instruction::Return))
    }
}

impl fmt::Display for RoutineDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sig = &self.signature;
        write!(f, ".method {} {} (", sig.result, self.name)?;
        for (i, p) in sig.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{p}")?;
        }
        writeln!(f, ")")?;
        for (offset, ins) in self.body.iter().enumerate() {
            writeln!(f, "    IL_{offset:04x}: {ins}")?;
        }
        Ok(())
    }
}
