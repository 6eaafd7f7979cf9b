//! Microfluidics backend library.
//!
//! Translates a microfluidic device schematic into a system of nonlinear
//! real-arithmetic constraints (SMT-LIB2, logic QF_NRA) for feasibility
//! checking by an external solver such as dReal.

pub mod backend;
pub mod error;
pub mod params;
pub mod schematic;
pub mod smt2;
pub mod strategy;
pub mod types;

pub use backend::{sort_exprs, MicrofluidicsBackend};
pub use error::{CodeGenerationError, Result};
pub use params::{ProcessParameterArgs, ProcessParameterError, ProcessParameters};
pub use schematic::Schematic;
pub use types::PrimitiveTypeTable;
