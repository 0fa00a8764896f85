//! Type definitions for transient analysis.

use serde::{Deserialize, Serialize};

/// State of the circuit at `tstart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialState {
    /// Every unknown is zero: all storage elements discharged.
    #[default]
    Zero,
    /// DC operating point with sources at their `tstart` values
    /// (capacitors open, inductors shorted).
    OperatingPoint,
}

/// Transient analysis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranParams {
    /// Fixed timestep (s).
    pub tstep: f64,
    /// Stop time (s).
    pub tstop: f64,
    /// Start time (s).
    #[serde(default)]
    pub tstart: f64,
    /// How the first time point is obtained.
    #[serde(default)]
    pub initial_state: InitialState,
}

impl TranParams {
    /// Run from t = 0 with a zero initial state.
    pub fn new(tstep: f64, tstop: f64) -> Self {
        Self {
            tstep,
            tstop,
            tstart: 0.0,
            initial_state: InitialState::Zero,
        }
    }

    pub fn with_tstart(mut self, tstart: f64) -> Self {
        self.tstart = tstart;
        self
    }

    pub fn with_initial_state(mut self, state: InitialState) -> Self {
        self.initial_state = state;
        self
    }
}
