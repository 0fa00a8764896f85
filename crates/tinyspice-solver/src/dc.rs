//! DC operating point and DC sweep analysis.

use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tinyspice_core::{Circuit, Device, DeviceKind, Excitation, NodeIndex, NonlinearTerms, mna};

use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::linear::solve_dense;
use crate::newton::solve_nonlinear;
use crate::probe::Probe;

/// DC sweep parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcSweepParams {
    /// Name of the independent voltage or current source to sweep.
    pub source: String,
    /// Start value.
    pub start: f64,
    /// Stop value (inclusive).
    pub stop: f64,
    /// Step size, must be positive.
    pub step: f64,
}

impl DcSweepParams {
    pub fn new(source: impl Into<String>, start: f64, stop: f64, step: f64) -> Self {
        Self {
            source: source.into(),
            start,
            stop,
            step,
        }
    }

    /// Sweep values: `start, start + step, ...` while `v <= stop + epsilon`.
    ///
    /// Values are accumulated by repeated addition. A sweep that would produce
    /// more than `max_points` values is rejected before anything is allocated.
    pub fn values(&self, epsilon: f64, max_points: usize) -> Result<Vec<f64>> {
        if !(self.start.is_finite() && self.stop.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "sweep bounds must be finite, got {} to {}",
                self.start, self.stop
            )));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "sweep step must be positive, got {}",
                self.step
            )));
        }

        let too_many = || {
            Error::InvalidParameter(format!(
                "sweep from {} to {} step {} exceeds {} points",
                self.start, self.stop, self.step, max_points
            ))
        };
        // floor(span) + 1 points, so span must stay below the cap.
        let span = (self.stop + epsilon - self.start) / self.step;
        if !(span < max_points as f64) {
            return Err(too_many());
        }

        let mut values = Vec::new();
        let mut v = self.start;
        while v <= self.stop + epsilon {
            if values.len() == max_points {
                return Err(too_many());
            }
            values.push(v);
            let next = v + self.step;
            if next == v {
                return Err(Error::InvalidParameter(format!(
                    "sweep step {} is below the resolution of {}",
                    self.step, v
                )));
            }
            v = next;
        }
        Ok(values)
    }
}

/// Result of a DC operating point analysis.
#[derive(Debug, Clone)]
pub struct DcSolution {
    /// Solution over the reduced unknowns.
    pub solution: DVector<f64>,
    /// Reduced unknown names, aligned with `solution`.
    pub nodes: Vec<String>,
    /// Nonlinear iterations used (0 for a linear circuit).
    pub iterations: usize,
}

impl DcSolution {
    /// Voltage of a node or current of an `i_` branch. Ground reads 0.
    pub fn voltage(&self, node: &str) -> Result<f64> {
        self.value(&Probe::voltage(node))
    }

    pub fn value(&self, probe: &Probe) -> Result<f64> {
        Ok(probe.resolve(&self.nodes)?.real(&self.solution))
    }
}

/// Result of a DC sweep analysis.
#[derive(Debug, Clone)]
pub struct DcResult {
    /// Name of the swept source.
    pub source: String,
    /// Sweep values at each point.
    pub values: Vec<f64>,
    /// Solution at each sweep point.
    pub solutions: Vec<DVector<f64>>,
    /// Reduced unknown names, aligned with each solution.
    pub nodes: Vec<String>,
}

impl DcResult {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// (sweep value, probe value) pairs.
    pub fn trace(&self, probe: &Probe) -> Result<Vec<(f64, f64)>> {
        let resolved = probe.resolve(&self.nodes)?;
        Ok(self
            .values
            .iter()
            .zip(&self.solutions)
            .map(|(&v, x)| (v, resolved.real(x)))
            .collect())
    }

    /// Voltage of a node across all sweep points.
    pub fn voltage_waveform(&self, node: &str) -> Result<Vec<(f64, f64)>> {
        self.trace(&Probe::voltage(node))
    }
}

/// Where a swept source writes into the reduced RHS.
#[derive(Debug, Clone, Copy)]
enum SweptSource {
    /// Branch row of a voltage source; overwritten with the sweep value.
    Voltage { row: usize },
    /// Node rows of a current source; shifted by the change from nominal.
    Current {
        pos: Option<usize>,
        neg: Option<usize>,
        nominal: f64,
    },
}

impl SweptSource {
    fn locate(circuit: &Circuit, index: &NodeIndex, name: &str) -> Result<Self> {
        if circuit.find(DeviceKind::VoltageSource, name).is_some() {
            let row = index.branch_index(name)? - 1;
            return Ok(SweptSource::Voltage { row });
        }
        if let Some(Device::CurrentSource(source)) = circuit.find(DeviceKind::CurrentSource, name)
        {
            return Ok(SweptSource::Current {
                pos: index.reduced_index(&source.pos)?,
                neg: index.reduced_index(&source.neg)?,
                nominal: source.stimulus.dc,
            });
        }
        Err(Error::SourceNotFound(name.to_string()))
    }

    fn patch(&self, base: &DVector<f64>, value: f64) -> DVector<f64> {
        let mut rhs = base.clone();
        match *self {
            SweptSource::Voltage { row } => rhs[row] = value,
            SweptSource::Current { pos, neg, nominal } => {
                let delta = value - nominal;
                if let Some(i) = pos {
                    rhs[i] += delta;
                }
                if let Some(i) = neg {
                    rhs[i] -= delta;
                }
            }
        }
        rhs
    }
}

/// Reduced real system for DC, ready to solve.
struct DcSystem {
    matrix: DMatrix<f64>,
    rhs: DVector<f64>,
    nonlinear: NonlinearTerms,
    index: NodeIndex,
}

impl DcSystem {
    fn assemble(circuit: &Circuit, config: &AnalysisConfig) -> Result<Self> {
        let assembled = mna::assemble_with(circuit, 0.0, Excitation::Nominal, &config.stamp)?;
        let (matrix, rhs) = assembled.reduce_real();
        Ok(Self {
            matrix,
            rhs,
            nonlinear: assembled.nonlinear,
            index: assembled.index,
        })
    }

    /// Solve with the given RHS; returns the solution and iteration count.
    fn solve(&self, rhs: &DVector<f64>, config: &AnalysisConfig) -> Result<(DVector<f64>, usize)> {
        if self.nonlinear.is_empty() {
            return Ok((solve_dense(&self.matrix, rhs)?, 0));
        }
        let initial = DVector::zeros(rhs.len());
        let outcome = solve_nonlinear(&self.matrix, rhs, &self.nonlinear, &initial, &config.newton)?;
        Ok((outcome.solution, outcome.iterations))
    }
}

/// Solve the DC operating point with nominal source values.
pub fn solve_dc_operating_point(circuit: &Circuit, config: &AnalysisConfig) -> Result<DcSolution> {
    let system = DcSystem::assemble(circuit, config)?;
    info!(
        "DC operating point: {} unknowns, {} nonlinear terms",
        system.rhs.len(),
        system.nonlinear.len()
    );

    let (solution, iterations) = system.solve(&system.rhs, config)?;
    Ok(DcSolution {
        solution,
        nodes: system.index.reduced_names(),
        iterations,
    })
}

/// Run a DC sweep analysis.
///
/// The system is assembled once; each point only patches the swept source's
/// RHS rows. Circuits with diodes restart the nonlinear iteration from zero at
/// every point. The first failing point aborts the sweep with
/// [`Error::SweepPoint`].
pub fn solve_dc_sweep(
    circuit: &Circuit,
    params: &DcSweepParams,
    config: &AnalysisConfig,
) -> Result<DcResult> {
    let values = params.values(config.dc_sweep_epsilon, config.max_points)?;
    let system = DcSystem::assemble(circuit, config)?;
    let swept = SweptSource::locate(circuit, &system.index, &params.source)?;

    info!(
        "DC sweep of {} from {} to {} step {} ({} points)",
        params.source,
        params.start,
        params.stop,
        params.step,
        values.len()
    );
    if values.is_empty() {
        warn!("DC sweep of {} produced no points", params.source);
    }

    let mut solutions = Vec::with_capacity(values.len());
    for &value in &values {
        let rhs = swept.patch(&system.rhs, value);
        let (solution, iterations) = system
            .solve(&rhs, config)
            .map_err(|e| e.at_point(value))?;
        debug!("{} = {}: solved ({} iterations)", params.source, value, iterations);
        solutions.push(solution);
    }

    Ok(DcResult {
        source: params.source.clone(),
        values,
        solutions,
        nodes: system.index.reduced_names(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_POINTS;

    #[test]
    fn test_sweep_values_include_end() {
        let params = DcSweepParams::new("V1", 0.0, 1.0, 0.1);
        let values = params.values(1e-4, MAX_POINTS).unwrap();

        assert_eq!(values.len(), 11);
        assert!((values[10] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_sweep_values_reject_bad_step() {
        for step in [0.0, -1.0, f64::NAN] {
            let params = DcSweepParams::new("V1", 0.0, 1.0, step);
            assert!(matches!(
                params.values(1e-4, MAX_POINTS),
                Err(Error::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_sweep_values_reject_too_many_points() {
        let params = DcSweepParams::new("V1", 0.0, 1.0, 1e-300);
        assert!(matches!(
            params.values(1e-4, MAX_POINTS),
            Err(Error::InvalidParameter(_))
        ));

        // 11 points fit exactly; 10 do not.
        let params = DcSweepParams::new("V1", 0.0, 1.0, 0.1);
        assert_eq!(params.values(1e-4, 11).unwrap().len(), 11);
        assert!(params.values(1e-4, 10).is_err());
    }

    #[test]
    fn test_sweep_rejects_tiny_step() {
        let mut circuit = Circuit::new();
        circuit
            .add_voltage_source("V1", "a", "0", 1.0)
            .add_resistor("R1", "a", "0", 1.0);

        let params = DcSweepParams::new("V1", 0.0, 1.0, 1e-300);
        assert!(matches!(
            solve_dc_sweep(&circuit, &params, &AnalysisConfig::default()),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_sweep_values_empty_when_reversed() {
        let params = DcSweepParams::new("V1", 2.0, 1.0, 0.5);
        assert!(params.values(1e-4, MAX_POINTS).unwrap().is_empty());
    }

    #[test]
    fn test_operating_point_divider() {
        let mut circuit = Circuit::new();
        circuit
            .add_voltage_source("V1", "a", "0", 10.0)
            .add_resistor("R1", "a", "b", 1e3)
            .add_resistor("R2", "b", "0", 1e3);

        let op = solve_dc_operating_point(&circuit, &AnalysisConfig::default()).unwrap();

        assert!((op.voltage("a").unwrap() - 10.0).abs() < 1e-9);
        assert!((op.voltage("b").unwrap() - 5.0).abs() < 1e-9);
        assert_eq!(op.voltage("0").unwrap(), 0.0);
        // Current flows out of the source's positive terminal.
        assert!((op.voltage("i_V1").unwrap() + 5e-3).abs() < 1e-12);
        assert_eq!(op.iterations, 0);
    }

    #[test]
    fn test_unknown_source() {
        let mut circuit = Circuit::new();
        circuit
            .add_voltage_source("V1", "a", "0", 1.0)
            .add_resistor("R1", "a", "0", 1.0);

        let params = DcSweepParams::new("V9", 0.0, 1.0, 1.0);
        assert!(matches!(
            solve_dc_sweep(&circuit, &params, &AnalysisConfig::default()),
            Err(Error::SourceNotFound(_))
        ));
    }

    #[test]
    fn test_current_source_sweep() {
        let mut circuit = Circuit::new();
        circuit
            .add_current_source("I1", "a", "0", 1.0)
            .add_current_source("I2", "a", "0", 0.5)
            .add_resistor("R1", "a", "0", 100.0);

        let params = DcSweepParams::new("I1", 0.0, 2e-2, 1e-2);
        let result = solve_dc_sweep(&circuit, &params, &AnalysisConfig::default()).unwrap();
        let trace = result.voltage_waveform("a").unwrap();

        assert_eq!(trace.len(), 3);
        for (i, v) in trace {
            // I2 stays at its nominal 0.5 A.
            let expected = (i + 0.5) * 100.0;
            assert!((v - expected).abs() < 1e-9, "V(a) = {v} at I1 = {i}");
        }
    }
}
