//! Result types for transient analysis.

use nalgebra::DVector;

use crate::error::Result;
use crate::probe::Probe;

/// A single timepoint in a transient simulation result.
#[derive(Debug, Clone)]
pub struct TimePoint {
    /// Time value (s).
    pub time: f64,
    /// Solution vector at this time (reduced transient layout).
    pub solution: DVector<f64>,
}

/// Result of a transient simulation.
///
/// The first point is the initial state at `tstart`.
#[derive(Debug, Clone)]
pub struct TranResult {
    /// All computed timepoints.
    pub points: Vec<TimePoint>,
    /// Reduced unknown names, aligned with each solution.
    pub nodes: Vec<String>,
}

impl TranResult {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get all time values.
    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|tp| tp.time).collect()
    }

    /// (time, probe value) pairs.
    pub fn trace(&self, probe: &Probe) -> Result<Vec<(f64, f64)>> {
        let resolved = probe.resolve(&self.nodes)?;
        Ok(self
            .points
            .iter()
            .map(|tp| (tp.time, resolved.real(&tp.solution)))
            .collect())
    }

    /// Get the voltage at a node across all timepoints.
    pub fn voltage_waveform(&self, node: &str) -> Result<Vec<(f64, f64)>> {
        self.trace(&Probe::voltage(node))
    }
}
