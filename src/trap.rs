use thiserror::Error;

use crate::types::ValType;

/// All ways building, finalizing or invoking a routine can fail.
///
/// Every variant is a programming error in the caller's instruction sequence
/// or call site. Nothing here is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Trap {
    #[error("parameter index {index} out of range for a routine with {arity} parameter(s)")]
    InvalidOperand { index: u32, arity: usize },

    #[error("routine `{0}` has no return instruction")]
    IncompleteRoutine(String),

    #[error("routine `{0}` is already finalized")]
    AlreadyFinalized(String),

    #[error("call target `{0}` has not been finalized")]
    UnresolvedTarget(String),

    #[error("routine `{routine}` expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        routine: String,
        expected: usize,
        actual: usize,
    },

    #[error("`{op}` needs {needed} operand(s) but the stack holds {available}")]
    StackUnderflow {
        op: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: ValType, found: ValType },
}

pub type Result<T> = std::result::Result<T, Trap>;
