//! Backward-Euler transient system.
//!
//! Reactive elements become companion branches with step `h`:
//!
//! ```text
//! capacitor:  (C/h)·(V1 - V2) - I = (C/h)·(V1' - V2')
//! inductor:   V1 - V2 - (L/h)·I   = -(L/h)·I'
//! ```
//!
//! where primed values come from the previous time point. The left-hand sides
//! form the constant `mna` matrix. The right-hand sides are linear in the
//! previous solution, so they are captured once as `rhs_gen` and each step
//! computes `rhs = rhs_gen · x_prev` before applying source values.

use log::debug;
use nalgebra::DMatrix;

use crate::circuit::Circuit;
use crate::device::{Device, DeviceKind};
use crate::error::{Error, Result};
use crate::node::NodeIndex;
use crate::nonlinear::NonlinearTerms;

use super::StampOptions;
use super::stamp::{stamp_admittance, stamp_branch, stamp_branch_control, stamp_transconductance};

/// Assembled transient system for a fixed step.
#[derive(Debug, Clone, PartialEq)]
pub struct TranAnalysisMat {
    /// Full N×N system matrix, ground included.
    pub mna: DMatrix<f64>,
    /// Maps the previous full solution to this step's right-hand side.
    pub rhs_gen: DMatrix<f64>,
    /// Transient unknown layout (capacitors own branches).
    pub index: NodeIndex,
    /// Diode terms, in reduced indices of the transient layout.
    pub nonlinear: NonlinearTerms,
    /// Time step the companion models were built for.
    pub step: f64,
}

impl TranAnalysisMat {
    /// Number of unknowns, ground included.
    pub fn size(&self) -> usize {
        self.index.len()
    }

    /// System matrix and RHS generator with ground removed.
    pub fn reduce(&self) -> (DMatrix<f64>, DMatrix<f64>) {
        let mna = self.mna.clone().remove_row(0).remove_column(0);
        let rhs_gen = self.rhs_gen.clone().remove_row(0).remove_column(0);
        (mna, rhs_gen)
    }
}

/// Assemble the transient system for step `h` with default stamp options.
pub fn assemble_transient(circuit: &Circuit, h: f64) -> Result<TranAnalysisMat> {
    assemble_transient_with(circuit, h, &StampOptions::default())
}

/// Assemble the transient system for step `h`.
pub fn assemble_transient_with(
    circuit: &Circuit,
    h: f64,
    options: &StampOptions,
) -> Result<TranAnalysisMat> {
    if !(h.is_finite() && h > 0.0) {
        return Err(Error::InvalidValue {
            name: "tstep".to_string(),
            value: h,
        });
    }
    circuit.validate()?;
    let index = NodeIndex::transient(circuit)?;
    let n = index.len();

    let mut mna = DMatrix::<f64>::zeros(n, n);
    let mut rhs_gen = DMatrix::<f64>::zeros(n, n);
    let mut nonlinear = NonlinearTerms::new();

    for kind in DeviceKind::STAMP_ORDER {
        for device in circuit.devices_of(kind) {
            let (pos, neg) = device.terminals();
            let n1 = index.index_of(pos)?;
            let n2 = index.index_of(neg)?;

            match device {
                Device::Resistor(r) => stamp_admittance(&mut mna, n1, n2, 1.0 / r.resistance),
                Device::Capacitor(c) => {
                    let br = index.branch_index(&c.name)?;
                    let geq = c.capacitance / h;

                    mna[(br, n1)] += geq;
                    mna[(br, n2)] -= geq;
                    mna[(br, br)] -= 1.0;
                    mna[(n1, br)] += 1.0;
                    mna[(n2, br)] -= 1.0;

                    rhs_gen[(br, n1)] += geq;
                    rhs_gen[(br, n2)] -= geq;
                }
                // Source values are applied per step.
                Device::CurrentSource(_) => {}
                Device::Vccs(g) => {
                    let c1 = index.index_of(&g.ctrl_pos)?;
                    let c2 = index.index_of(&g.ctrl_neg)?;
                    stamp_transconductance(&mut mna, n1, n2, c1, c2, g.gm);
                }
                Device::Inductor(l) => {
                    let br = index.branch_index(&l.name)?;
                    let req = l.inductance / h;

                    stamp_branch(&mut mna, br, n1, n2);
                    mna[(br, br)] -= req;
                    rhs_gen[(br, br)] -= req;
                }
                Device::VoltageSource(v) => {
                    let br = index.branch_index(&v.name)?;
                    stamp_branch(&mut mna, br, n1, n2);
                }
                Device::Vcvs(e) => {
                    let br = index.branch_index(&e.name)?;
                    let c1 = index.index_of(&e.ctrl_pos)?;
                    let c2 = index.index_of(&e.ctrl_neg)?;
                    stamp_branch(&mut mna, br, n1, n2);
                    stamp_branch_control(&mut mna, br, c1, c2, e.gain);
                }
                Device::Diode(_) => nonlinear.add_diode(
                    index.reduced_index(pos)?,
                    index.reduced_index(neg)?,
                    options.diode_rate,
                ),
            }
        }
    }

    debug!(
        "assembled {}x{} transient system for h={} ({} nonlinear terms)",
        n,
        n,
        h,
        nonlinear.len()
    );

    Ok(TranAnalysisMat {
        mna,
        rhs_gen,
        index,
        nonlinear,
        step: h,
    })
}
