//! dynemit — emit numeric stack routines at runtime, link them, and run them.
//!
//! # Quick start
//!
//! ```rust
//! use dynemit::{RoutineBuilder, Val, ValType};
//!
//! // f(x, y) = x * x + y
//! let mut b = RoutineBuilder::new(2, ValType::I32);
//! b.append_load_parameter(0).unwrap();
//! b.append_load_parameter(0).unwrap();
//! b.append_multiply().unwrap();
//! b.append_load_parameter(1).unwrap();
//! b.append_add().unwrap();
//! b.append_return().unwrap();
//! let f = b.finalize().unwrap();
//!
//! // g(x) = f(x, 1000)
//! let mut a = RoutineBuilder::new(1, ValType::I32);
//! a.append_load_parameter(0).unwrap();
//! a.append_load_constant(1000i32).unwrap();
//! a.append_call(&f).unwrap();
//! a.append_return().unwrap();
//! let g = a.finalize().unwrap();
//!
//! assert_eq!(g.invoke(&[Val::I32(5)]).unwrap(), Val::I32(1025));
//! assert_ne!(f.opaque_identifier(), g.opaque_identifier());
//! ```

pub mod builder;
pub mod ir;
pub mod registry;
pub mod routine;
pub mod scenario;
pub mod trap;
pub mod types;

pub use builder::RoutineBuilder;
pub use ir::{CallTarget, Instruction, RoutineDefinition, RoutineRef};
pub use routine::CompiledRoutine;
pub use trap::{Result, Trap};
pub use types::{Signature, Val, ValType};
