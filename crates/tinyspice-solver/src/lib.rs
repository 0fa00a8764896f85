//! Analysis drivers for tinyspice.
//!
//! This crate provides:
//! - Dense real and complex linear solvers
//! - A bounded fixed-point iteration for diode circuits
//! - DC operating point and DC sweep analysis
//! - AC small-signal frequency sweeps (LIN, DEC, OCT)
//! - Fixed-step backward-Euler transient analysis
//! - Probes for extracting per-node traces from results

pub mod ac;
pub mod config;
pub mod dc;
pub mod error;
pub mod linear;
pub mod newton;
pub mod probe;
pub mod transient;

pub use ac::{AcParams, AcResult, AcSweepType, generate_frequencies, solve_ac};
pub use config::{AnalysisConfig, DC_SWEEP_EPSILON, MAX_POINTS, NewtonConfig};
pub use dc::{DcResult, DcSolution, DcSweepParams, solve_dc_operating_point, solve_dc_sweep};
pub use error::{Error, Result};
pub use newton::{NewtonOutcome, solve_nonlinear};
pub use probe::{Probe, Quantity, ResolvedProbe};
pub use transient::{InitialState, TimePoint, TranParams, TranResult, solve_transient};
