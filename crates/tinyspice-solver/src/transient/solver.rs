//! Backward-Euler step loop.

use log::{debug, info, trace};
use nalgebra::{DMatrix, DVector};
use tinyspice_core::{Circuit, Device, DeviceKind, NodeIndex, Stimulus, TranAnalysisMat, mna};

use super::result::{TimePoint, TranResult};
use super::types::{InitialState, TranParams};
use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::linear::{CachedLu, solve_dense};
use crate::newton::solve_nonlinear;

/// Absorbs rounding in `(tstop - tstart) / tstep` so an exact multiple is not
/// truncated to one step short.
const STEP_COUNT_SLACK: f64 = 1e-9;

/// Number of steps after the initial point: `floor((tstop - tstart) / tstep)`.
///
/// The run holds `steps + 1` points including the initial one; runs with more
/// than `max_points` points are rejected.
pub fn step_count(params: &TranParams, max_points: usize) -> Result<usize> {
    if !(params.tstep.is_finite() && params.tstep > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "timestep must be positive, got {}",
            params.tstep
        )));
    }
    if !(params.tstart.is_finite() && params.tstop.is_finite() && params.tstop >= params.tstart) {
        return Err(Error::InvalidParameter(format!(
            "invalid time window {} to {}",
            params.tstart, params.tstop
        )));
    }

    let steps = ((params.tstop - params.tstart) / params.tstep + STEP_COUNT_SLACK).floor();
    if !(steps < max_points as f64) {
        return Err(Error::InvalidParameter(format!(
            "{} s to {} s at {} s exceeds {} time points",
            params.tstart, params.tstop, params.tstep, max_points
        )));
    }
    Ok(steps as usize)
}

/// RHS rows driven by an independent source.
#[derive(Debug, Clone, Copy)]
enum SourceRow {
    /// Branch row of a voltage source; overwritten with v(t).
    Voltage { row: usize, stimulus: Stimulus },
    /// Node rows of a current source; i(t) added to `pos`, subtracted from `neg`.
    Current {
        pos: Option<usize>,
        neg: Option<usize>,
        stimulus: Stimulus,
    },
}

fn source_rows(circuit: &Circuit, index: &NodeIndex) -> Result<Vec<SourceRow>> {
    let mut rows = Vec::new();
    for device in circuit.devices() {
        match device {
            Device::VoltageSource(v) => rows.push(SourceRow::Voltage {
                row: index.branch_index(&v.name)? - 1,
                stimulus: v.stimulus,
            }),
            Device::CurrentSource(i) => rows.push(SourceRow::Current {
                pos: index.reduced_index(&i.pos)?,
                neg: index.reduced_index(&i.neg)?,
                stimulus: i.stimulus,
            }),
            _ => {}
        }
    }
    Ok(rows)
}

fn apply_sources(sources: &[SourceRow], rhs: &mut DVector<f64>, t: f64) {
    for source in sources {
        match *source {
            SourceRow::Voltage { row, stimulus } => rhs[row] = stimulus.value_at(t),
            SourceRow::Current { pos, neg, stimulus } => {
                let value = stimulus.value_at(t);
                if let Some(i) = pos {
                    rhs[i] += value;
                }
                if let Some(i) = neg {
                    rhs[i] -= value;
                }
            }
        }
    }
}

/// DC solution at `t` in the transient layout.
///
/// Capacitor branch rows become `I = 0` and inductor branch rows lose their
/// `L/h` term, leaving `V(n1) - V(n2) = 0`.
fn operating_point(
    circuit: &Circuit,
    tran: &TranAnalysisMat,
    matrix: &DMatrix<f64>,
    sources: &[SourceRow],
    t: f64,
    config: &AnalysisConfig,
) -> Result<DVector<f64>> {
    let mut op = matrix.clone();
    for device in circuit.devices_of(DeviceKind::Capacitor) {
        let br = tran.index.branch_index(device.name())? - 1;
        op.row_mut(br).fill(0.0);
        op[(br, br)] = 1.0;
    }
    for device in circuit.devices_of(DeviceKind::Inductor) {
        let br = tran.index.branch_index(device.name())? - 1;
        op[(br, br)] = 0.0;
    }

    let mut rhs = DVector::zeros(op.nrows());
    apply_sources(sources, &mut rhs, t);

    if tran.nonlinear.is_empty() {
        solve_dense(&op, &rhs)
    } else {
        let initial = DVector::zeros(rhs.len());
        solve_nonlinear(&op, &rhs, &tran.nonlinear, &initial, &config.newton)
            .map(|outcome| outcome.solution)
    }
}

/// Run a fixed-step transient analysis.
///
/// Each step computes `rhs = RHS_gen · x(t - h)`, overwrites voltage-source
/// rows with v(t), adds current-source values to their node rows, and solves.
/// Linear circuits reuse one LU factorization for the whole run; circuits with
/// diodes run the nonlinear iteration warm-started from the previous point.
pub fn solve_transient(
    circuit: &Circuit,
    params: &TranParams,
    config: &AnalysisConfig,
) -> Result<TranResult> {
    let steps = step_count(params, config.max_points)?;
    let h = params.tstep;

    let tran = mna::assemble_transient_with(circuit, h, &config.stamp)?;
    let (matrix, rhs_gen) = tran.reduce();
    let sources = source_rows(circuit, &tran.index)?;
    let nodes = tran.index.reduced_names();

    info!(
        "transient analysis: {} steps of {} s from {} s ({} unknowns, {} nonlinear terms)",
        steps,
        h,
        params.tstart,
        nodes.len(),
        tran.nonlinear.len()
    );

    let initial = match params.initial_state {
        InitialState::Zero => DVector::zeros(nodes.len()),
        InitialState::OperatingPoint => {
            operating_point(circuit, &tran, &matrix, &sources, params.tstart, config)
                .map_err(|e| e.at_point(params.tstart))?
        }
    };

    let lu = if tran.nonlinear.is_empty() {
        Some(CachedLu::new(&matrix)?)
    } else {
        None
    };

    let capacity = steps
        .checked_add(1)
        .ok_or_else(|| Error::InvalidParameter(format!("{steps} steps overflow")))?;
    let mut points = Vec::with_capacity(capacity);
    let mut prev = initial.clone();
    points.push(TimePoint {
        time: params.tstart,
        solution: initial,
    });

    for k in 1..=steps {
        let t = params.tstart + k as f64 * h;

        let mut rhs = &rhs_gen * &prev;
        apply_sources(&sources, &mut rhs, t);

        let solution = match &lu {
            Some(lu) => lu.solve(&rhs),
            None => solve_nonlinear(&matrix, &rhs, &tran.nonlinear, &prev, &config.newton)
                .map(|outcome| outcome.solution),
        }
        .map_err(|e| e.at_point(t))?;
        trace!("t = {t:e}: {solution:?}");

        prev = solution.clone();
        points.push(TimePoint { time: t, solution });
    }

    debug!("transient analysis produced {} points", points.len());
    Ok(TranResult { points, nodes })
}
