//! AC small-signal frequency-domain analysis.

use std::f64::consts::PI;

use log::{debug, info, warn};
use nalgebra::DVector;
use num_complex::Complex64;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tinyspice_core::{Circuit, Excitation, NodeIndex, mna};

use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::linear::solve_complex;
use crate::probe::{Probe, Quantity};

/// AC sweep type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcSweepType {
    /// Linear frequency spacing.
    #[serde(rename = "lin", alias = "linear")]
    Linear,
    /// Logarithmic spacing, points per decade.
    #[serde(rename = "dec", alias = "decade")]
    Decade,
    /// Logarithmic spacing, points per octave.
    #[serde(rename = "oct", alias = "octave")]
    Octave,
}

/// AC analysis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcParams {
    /// Sweep type.
    pub sweep_type: AcSweepType,
    /// Points in the sweep (LIN) or per decade/octave (DEC/OCT).
    pub points: usize,
    /// Start frequency (Hz).
    pub fstart: f64,
    /// Stop frequency (Hz).
    pub fstop: f64,
}

impl AcParams {
    pub fn new(sweep_type: AcSweepType, points: usize, fstart: f64, fstop: f64) -> Self {
        Self {
            sweep_type,
            points,
            fstart,
            fstop,
        }
    }
}

/// Generate frequency points for an AC sweep.
///
/// - LIN: `points` values `fstart + (fstop - fstart)·i/points`, then `fstop`.
/// - DEC/OCT: `fstart·base^(k + i/points)` for each decade/octave `k`, stopping
///   at the first value above `fstop`, then `fstop`.
///
/// `fstop` is always appended, so it appears twice when the generator already
/// landed on it.
pub fn generate_frequencies(params: &AcParams) -> Result<Vec<f64>> {
    let AcParams {
        sweep_type,
        points,
        fstart,
        fstop,
    } = *params;

    if points == 0 {
        return Err(Error::InvalidParameter(
            "AC sweep needs at least one point".to_string(),
        ));
    }
    if !(fstart.is_finite() && fstart > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "AC start frequency must be positive, got {fstart}"
        )));
    }
    if !(fstop.is_finite() && fstop >= fstart) {
        return Err(Error::InvalidParameter(format!(
            "AC stop frequency {fstop} is below start frequency {fstart}"
        )));
    }

    let n = points as f64;
    let mut freqs = match sweep_type {
        AcSweepType::Linear => (0..points)
            .map(|i| fstart + (fstop - fstart) * i as f64 / n)
            .collect(),
        AcSweepType::Decade => log_points(fstart, fstop, points, 10.0),
        AcSweepType::Octave => log_points(fstart, fstop, points, 2.0),
    };

    freqs.push(fstop);
    Ok(freqs)
}

fn log_points(fstart: f64, fstop: f64, points: usize, base: f64) -> Vec<f64> {
    let intervals = (fstop / fstart).log(base);
    let mut freqs = Vec::new();

    let mut k = 0;
    while (k as f64) < intervals {
        for i in 0..points {
            let f = fstart * base.powf(k as f64 + i as f64 / points as f64);
            if f > fstop {
                return freqs;
            }
            freqs.push(f);
        }
        k += 1;
    }
    freqs
}

/// Result of AC analysis.
#[derive(Debug, Clone)]
pub struct AcResult {
    /// Frequency of each point (Hz).
    pub frequencies: Vec<f64>,
    /// Complex solution at each frequency (reduced layout).
    pub solutions: Vec<DVector<Complex64>>,
    /// Reduced unknown names, aligned with each solution.
    pub nodes: Vec<String>,
}

impl AcResult {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// (frequency, probe value) pairs.
    pub fn trace(&self, probe: &Probe) -> Result<Vec<(f64, f64)>> {
        let resolved = probe.resolve(&self.nodes)?;
        Ok(self
            .frequencies
            .iter()
            .zip(&self.solutions)
            .map(|(&f, x)| (f, resolved.complex(x)))
            .collect())
    }

    /// Complex value of a node across all frequencies.
    pub fn voltage_at(&self, node: &str) -> Result<Vec<(f64, Complex64)>> {
        let real = self.trace(&Probe::voltage(node).with_quantity(Quantity::Real))?;
        let imag = self.trace(&Probe::voltage(node).with_quantity(Quantity::Imag))?;
        Ok(real
            .into_iter()
            .zip(imag)
            .map(|((f, re), (_, im))| (f, Complex64::new(re, im)))
            .collect())
    }

    /// Magnitude in dB of a node across all frequencies.
    pub fn magnitude_db(&self, node: &str) -> Result<Vec<(f64, f64)>> {
        self.trace(&Probe::voltage(node).with_quantity(Quantity::Db))
    }

    /// Phase in degrees of a node across all frequencies.
    pub fn phase_deg(&self, node: &str) -> Result<Vec<(f64, f64)>> {
        self.trace(&Probe::voltage(node).with_quantity(Quantity::Phase))
    }
}

/// Solve a single frequency point.
fn solve_point(circuit: &Circuit, freq: f64, config: &AnalysisConfig) -> Result<DVector<Complex64>> {
    let omega = 2.0 * PI * freq;
    let system = mna::assemble_with(circuit, omega, Excitation::Ac, &config.stamp)?;
    let (matrix, rhs) = system.reduce();
    let solution = solve_complex(&matrix, &rhs).map_err(|e| e.at_point(freq))?;
    debug!("f = {freq:e} Hz solved");
    Ok(solution)
}

/// Run an AC small-signal analysis.
///
/// Every frequency is assembled at ω = 2πf with the sources' AC magnitudes and
/// solved directly. Diodes contribute nothing in this mode. With the
/// `parallel` feature, points are solved on the rayon thread pool; the result
/// order is the frequency order either way.
pub fn solve_ac(circuit: &Circuit, params: &AcParams, config: &AnalysisConfig) -> Result<AcResult> {
    let frequencies = generate_frequencies(params)?;
    circuit.validate()?;
    let index = NodeIndex::frequency_domain(circuit)?;

    info!(
        "AC analysis {:?}: {} points from {} Hz to {} Hz",
        params.sweep_type,
        frequencies.len(),
        params.fstart,
        params.fstop
    );
    if circuit.has_diodes() {
        warn!("diodes are not modeled in AC analysis and will be ignored");
    }

    #[cfg(feature = "parallel")]
    let solutions: Result<Vec<_>> = frequencies
        .par_iter()
        .map(|&f| solve_point(circuit, f, config))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let solutions: Result<Vec<_>> = frequencies
        .iter()
        .map(|&f| solve_point(circuit, f, config))
        .collect();

    Ok(AcResult {
        frequencies,
        solutions: solutions?,
        nodes: index.reduced_names(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_linear_frequencies() {
        let params = AcParams::new(AcSweepType::Linear, 4, 1.0, 2.0);
        let freqs = generate_frequencies(&params).unwrap();

        assert_eq!(freqs, [1.0, 1.25, 1.5, 1.75, 2.0]);
    }

    #[test]
    fn test_generate_decade_frequencies() {
        let params = AcParams::new(AcSweepType::Decade, 10, 1.0, 1000.0);
        let freqs = generate_frequencies(&params).unwrap();

        assert_eq!(freqs.len(), 31);
        assert_eq!(freqs[0], 1.0);
        assert!((freqs[10] - 10.0).abs() < 1e-9);
        assert_eq!(*freqs.last().unwrap(), 1000.0);
        assert!(freqs.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_generate_decade_partial() {
        // 1 Hz to 50 Hz at 1 point per decade: 1, 10, then stop.
        let params = AcParams::new(AcSweepType::Decade, 1, 1.0, 50.0);
        let freqs = generate_frequencies(&params).unwrap();

        assert_eq!(freqs.len(), 3);
        assert!((freqs[1] - 10.0).abs() < 1e-9);
        assert_eq!(freqs[2], 50.0);
    }

    #[test]
    fn test_generate_octave_frequencies() {
        let params = AcParams::new(AcSweepType::Octave, 2, 100.0, 400.0);
        let freqs = generate_frequencies(&params).unwrap();

        assert_eq!(freqs.len(), 5);
        assert!((freqs[1] - 100.0 * 2f64.sqrt()).abs() < 1e-9);
        assert!((freqs[2] - 200.0).abs() < 1e-9);
        assert_eq!(freqs[4], 400.0);
    }

    #[test]
    fn test_stop_appended_after_landing_on_it() {
        // Two points per decade land on 10^1.5 exactly; the stop still follows.
        let fstop = 10f64.powf(1.5);
        let params = AcParams::new(AcSweepType::Decade, 2, 1.0, fstop);
        let freqs = generate_frequencies(&params).unwrap();

        assert_eq!(freqs.len(), 5);
        assert!((freqs[1] - 10f64.sqrt()).abs() < 1e-9);
        assert!((freqs[2] - 10.0).abs() < 1e-9);
        assert_eq!(freqs[3], fstop);
        assert_eq!(freqs[4], fstop);

        let params = AcParams::new(AcSweepType::Linear, 1, 50.0, 50.0);
        assert_eq!(generate_frequencies(&params).unwrap(), [50.0, 50.0]);
    }

    #[test]
    fn test_single_frequency() {
        let params = AcParams::new(AcSweepType::Decade, 5, 1e3, 1e3);
        assert_eq!(generate_frequencies(&params).unwrap(), [1e3]);
    }

    #[test]
    fn test_invalid_params() {
        for params in [
            AcParams::new(AcSweepType::Linear, 0, 1.0, 2.0),
            AcParams::new(AcSweepType::Decade, 10, 0.0, 2.0),
            AcParams::new(AcSweepType::Octave, 10, 5.0, 2.0),
        ] {
            assert!(matches!(
                generate_frequencies(&params),
                Err(Error::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_rl_lowpass() {
        // Series L, shunt R: corner at R/(2πL).
        let r = 100.0;
        let l = 10e-3;
        let mut circuit = Circuit::new();
        circuit
            .add_voltage_source(
                "V1",
                "in",
                "0",
                tinyspice_core::Stimulus::dc(0.0).with_ac(1.0),
            )
            .add_inductor("L1", "in", "out", l)
            .add_resistor("R1", "out", "0", r);

        let fc = r / (2.0 * PI * l);
        let params = AcParams::new(AcSweepType::Linear, 1, fc, fc);
        let result = solve_ac(&circuit, &params, &AnalysisConfig::default()).unwrap();
        let mag = result
            .trace(&Probe::voltage("out").with_quantity(Quantity::Magnitude))
            .unwrap();
        let phase = result.phase_deg("out").unwrap();

        assert!((mag[0].1 - 1.0 / 2f64.sqrt()).abs() < 1e-9, "|H| = {}", mag[0].1);
        assert!((phase[0].1 + 45.0).abs() < 1e-6, "phase = {}", phase[0].1);
    }
}
