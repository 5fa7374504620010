//! Constraint based type inference
//!
//! Binding code allocates type variables and registers constraints on a
//! [`Solver`](infer::Solver), which is then driven to a fixpoint. Solved
//! terms are turned into owned [`Type`](ty::Type)s by reconstruction.

pub use tyi_common as common;

pub mod infer;
pub mod trace;
pub mod ty;
