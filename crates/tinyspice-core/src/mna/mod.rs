//! Modified Nodal Analysis matrix assembly.
//!
//! The assembled system is `A·x = b` over the full unknown vector of
//! [`NodeIndex`], ground row and column included. Solvers call
//! [`AnalysisMatrix::reduce`] (or [`AnalysisMatrix::reduce_real`] for DC) to
//! drop ground before factoring.

mod stamp;
mod transient;

pub use stamp::{stamp_admittance, stamp_branch, stamp_branch_control, stamp_transconductance};
pub use transient::{TranAnalysisMat, assemble_transient, assemble_transient_with};

use log::{debug, trace};
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

use crate::circuit::Circuit;
use crate::device::{Device, DeviceKind};
use crate::error::Result;
use crate::node::NodeIndex;
use crate::nonlinear::{DIODE_EXP_RATE, NonlinearTerms};

/// Which source value feeds the right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Excitation {
    /// Nominal DC values.
    #[default]
    Nominal,
    /// AC small-signal magnitudes.
    Ac,
}

/// Knobs that change how devices are stamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampOptions {
    /// Exponent coefficient `b` of the diode model `I = e^(b·V) - 1`.
    pub diode_rate: f64,
}

impl Default for StampOptions {
    fn default() -> Self {
        Self {
            diode_rate: DIODE_EXP_RATE,
        }
    }
}

impl StampOptions {
    pub fn with_diode_rate(mut self, rate: f64) -> Self {
        self.diode_rate = rate;
        self
    }
}

/// Assembled frequency-domain system.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisMatrix {
    /// Full N×N system matrix, ground included.
    pub matrix: DMatrix<Complex64>,
    /// Full right-hand side.
    pub rhs: DVector<Complex64>,
    /// Unknown layout used for this assembly.
    pub index: NodeIndex,
    /// Diode terms, in reduced indices.
    pub nonlinear: NonlinearTerms,
}

impl AnalysisMatrix {
    /// Number of unknowns, ground included.
    pub fn size(&self) -> usize {
        self.index.len()
    }

    /// Complex system with the ground row and column removed.
    pub fn reduce(&self) -> (DMatrix<Complex64>, DVector<Complex64>) {
        let matrix = self.matrix.clone().remove_row(0).remove_column(0);
        let rhs = self.rhs.clone().remove_row(0);
        (matrix, rhs)
    }

    /// Real part of the reduced system, for DC analysis.
    pub fn reduce_real(&self) -> (DMatrix<f64>, DVector<f64>) {
        let (matrix, rhs) = self.reduce();
        (matrix.map(|z| z.re), rhs.map(|z| z.re))
    }
}

/// Assemble with nominal source values at angular frequency `omega`.
pub fn assemble(circuit: &Circuit, omega: f64) -> Result<AnalysisMatrix> {
    assemble_with(circuit, omega, Excitation::Nominal, &StampOptions::default())
}

/// Assemble with AC source magnitudes at angular frequency `omega`.
pub fn assemble_ac(circuit: &Circuit, omega: f64) -> Result<AnalysisMatrix> {
    assemble_with(circuit, omega, Excitation::Ac, &StampOptions::default())
}

/// Assemble the full MNA system.
///
/// Devices are stamped kind by kind in [`DeviceKind::STAMP_ORDER`], and in
/// insertion order within a kind. Assembly has no side effects, so repeated
/// calls on the same circuit produce identical systems.
pub fn assemble_with(
    circuit: &Circuit,
    omega: f64,
    excitation: Excitation,
    options: &StampOptions,
) -> Result<AnalysisMatrix> {
    circuit.validate()?;
    let index = NodeIndex::frequency_domain(circuit)?;
    let n = index.len();

    let mut matrix = DMatrix::<Complex64>::zeros(n, n);
    let mut rhs = DVector::<Complex64>::zeros(n);
    let mut nonlinear = NonlinearTerms::new();

    let source_value = |device: &Device| {
        device.stimulus().map_or(0.0, |s| match excitation {
            Excitation::Nominal => s.dc,
            Excitation::Ac => s.ac_value(),
        })
    };

    for kind in DeviceKind::STAMP_ORDER {
        for device in circuit.devices_of(kind) {
            let (pos, neg) = device.terminals();
            let n1 = index.index_of(pos)?;
            let n2 = index.index_of(neg)?;

            match device {
                Device::Resistor(r) => {
                    stamp_admittance(&mut matrix, n1, n2, Complex64::from(1.0 / r.resistance));
                }
                Device::Capacitor(c) => {
                    stamp_admittance(&mut matrix, n1, n2, Complex64::new(0.0, omega * c.capacitance));
                }
                Device::CurrentSource(_) => {
                    let value = Complex64::from(source_value(device));
                    rhs[n1] += value;
                    rhs[n2] -= value;
                }
                Device::Vccs(g) => {
                    let c1 = index.index_of(&g.ctrl_pos)?;
                    let c2 = index.index_of(&g.ctrl_neg)?;
                    stamp_transconductance(&mut matrix, n1, n2, c1, c2, Complex64::from(g.gm));
                }
                Device::Inductor(l) => {
                    let br = index.branch_index(&l.name)?;
                    stamp_branch(&mut matrix, br, n1, n2);
                    matrix[(br, br)] -= Complex64::new(0.0, omega * l.inductance);
                }
                Device::VoltageSource(v) => {
                    let br = index.branch_index(&v.name)?;
                    stamp_branch(&mut matrix, br, n1, n2);
                    rhs[br] += Complex64::from(source_value(device));
                }
                Device::Vcvs(e) => {
                    let br = index.branch_index(&e.name)?;
                    let c1 = index.index_of(&e.ctrl_pos)?;
                    let c2 = index.index_of(&e.ctrl_neg)?;
                    stamp_branch(&mut matrix, br, n1, n2);
                    stamp_branch_control(&mut matrix, br, c1, c2, Complex64::from(e.gain));
                }
                Device::Diode(_) => {
                    nonlinear.add_diode(
                        index.reduced_index(pos)?,
                        index.reduced_index(neg)?,
                        options.diode_rate,
                    );
                }
            }
        }
    }

    debug!(
        "assembled {}x{} system at omega={} ({} nonlinear terms)",
        n,
        n,
        omega,
        nonlinear.len()
    );
    trace!("MNA matrix:\n{}", crate::dump::format_matrix(&matrix, index.names()));

    Ok(AnalysisMatrix {
        matrix,
        rhs,
        index,
        nonlinear,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn divider() -> Circuit {
        let mut circuit = Circuit::new();
        circuit
            .add_voltage_source("V1", "in", "0", 10.0)
            .add_resistor("R1", "in", "out", 1e3)
            .add_resistor("R2", "out", "0", 1e3);
        circuit
    }

    #[test]
    fn test_divider_stamps() {
        let a = assemble(&divider(), 0.0).unwrap();
        let names: Vec<&str> = a.index.names().collect();
        assert_eq!(names, ["0", "in", "out", "i_V1"]);

        let g = 1e-3;
        assert_eq!(a.matrix[(1, 1)].re, g);
        assert_eq!(a.matrix[(1, 2)].re, -g);
        assert_eq!(a.matrix[(2, 2)].re, 2.0 * g);
        assert_eq!(a.matrix[(3, 1)].re, 1.0);
        assert_eq!(a.matrix[(1, 3)].re, 1.0);
        assert_eq!(a.rhs[3].re, 10.0);
    }

    #[test]
    fn test_reduce_drops_ground() {
        let a = assemble(&divider(), 0.0).unwrap();
        let (m, b) = a.reduce_real();

        assert_eq!(m.nrows(), 3);
        assert_eq!(m.ncols(), 3);
        assert_eq!(b.len(), 3);
        assert_eq!(m[(0, 0)], 1e-3);
        assert_eq!(b[2], 10.0);
    }

    #[test]
    fn test_reactive_stamps() {
        let mut circuit = Circuit::new();
        circuit
            .add_capacitor("C1", "a", "0", 1e-6)
            .add_inductor("L1", "a", "0", 1e-3);

        let omega = 1e3;
        let a = assemble(&circuit, omega).unwrap();
        let br = a.index.branch_index("L1").unwrap();

        assert!((a.matrix[(1, 1)].im - 1e-3).abs() < 1e-15);
        assert!((a.matrix[(br, br)].im + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_capacitor_vanishes_at_dc() {
        let mut circuit = Circuit::new();
        circuit
            .add_capacitor("C1", "a", "0", 1e-6)
            .add_resistor("R1", "a", "0", 1.0);

        let a = assemble(&circuit, 0.0).unwrap();
        assert_eq!(a.matrix[(1, 1)], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_controlled_sources() {
        let mut circuit = Circuit::new();
        circuit
            .add_resistor("R1", "c", "0", 1.0)
            .add_vccs("G1", "o", "0", "c", "0", 0.5)
            .add_vcvs("E1", "e", "0", "c", "0", 3.0);

        let a = assemble(&circuit, 0.0).unwrap();
        let c = a.index.index_of("c").unwrap();
        let o = a.index.index_of("o").unwrap();
        let br = a.index.branch_index("E1").unwrap();

        assert_eq!(a.matrix[(o, c)].re, 0.5);
        assert_eq!(a.matrix[(br, c)].re, -3.0);
    }

    #[test]
    fn test_current_source_rhs() {
        let mut circuit = Circuit::new();
        circuit
            .add_current_source("I1", "a", "b", 2.0)
            .add_resistor("R1", "a", "0", 1.0)
            .add_resistor("R2", "b", "0", 1.0);

        let a = assemble(&circuit, 0.0).unwrap();
        assert_eq!(a.rhs[1].re, 2.0);
        assert_eq!(a.rhs[2].re, -2.0);
    }

    #[test]
    fn test_ac_excitation_uses_ac_magnitude() {
        use crate::device::Stimulus;

        let mut circuit = Circuit::new();
        circuit
            .add_voltage_source("V1", "a", "0", Stimulus::dc(5.0).with_ac(1.0))
            .add_resistor("R1", "a", "0", 1.0);

        assert_eq!(assemble(&circuit, 0.0).unwrap().rhs[2].re, 5.0);
        assert_eq!(assemble_ac(&circuit, 0.0).unwrap().rhs[2].re, 1.0);
    }

    #[test]
    fn test_diode_registers_terms_only() {
        let mut circuit = Circuit::new();
        circuit
            .add_resistor("R1", "a", "0", 1.0)
            .add_diode("D1", "a", "0");

        let a = assemble(&circuit, 0.0).unwrap();
        assert_eq!(a.nonlinear.len(), 6);
        assert_eq!(a.matrix[(1, 1)].re, 1.0);
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let mut circuit = divider();
        circuit
            .add_capacitor("C1", "out", "0", 1e-9)
            .add_diode("D1", "out", "0");

        let first = assemble(&circuit, 123.0).unwrap();
        let second = assemble(&circuit, 123.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_ground_fails() {
        let mut circuit = Circuit::new();
        circuit.add_resistor("R1", "a", "b", 1.0);

        assert_eq!(assemble(&circuit, 0.0), Err(Error::MissingGround));
    }
}
