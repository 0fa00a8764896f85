//! Transient analysis engine.
//!
//! Fixed-step backward-Euler integration. Capacitors and inductors are replaced
//! by companion branches once per run (see [`tinyspice_core::TranAnalysisMat`]);
//! each step then only rebuilds the right-hand side from the previous solution
//! and the sources' instantaneous values.
//!
//! # Module Structure
//!
//! - [`types`] - Parameters and initial-state selection
//! - [`result`] - Time-series result type
//! - [`solver`] - Step loop and initial operating point

pub mod result;
pub mod solver;
pub mod types;

pub use result::{TimePoint, TranResult};
pub use solver::{solve_transient, step_count};
pub use tinyspice_core::mna::{TranAnalysisMat, assemble_transient};
pub use types::{InitialState, TranParams};
