//! Fixed-point iteration for circuits with diodes.
//!
//! Each iteration linearizes the exponential terms around the current iterate
//! ([`NonlinearTerms::apply`]) and solves the resulting linear system. The base
//! matrix and RHS are never modified, so callers can reuse them across sweep
//! points and time steps.

use log::{debug, trace};
use nalgebra::{DMatrix, DVector};
use tinyspice_core::NonlinearTerms;

use crate::config::NewtonConfig;
use crate::error::{Error, Result};
use crate::linear::solve_dense;

/// Converged nonlinear solution.
#[derive(Debug, Clone)]
pub struct NewtonOutcome {
    /// Solution vector (reduced layout).
    pub solution: DVector<f64>,
    /// Number of linear solves performed.
    pub iterations: usize,
    /// Largest component update of each iteration, in order.
    pub deltas: Vec<f64>,
}

/// Solve `A(x)·x = b(x)` starting from `initial`.
///
/// Fails with [`Error::ConvergenceFailed`] once `config.max_iterations` solves
/// have been made without meeting the tolerance.
pub fn solve_nonlinear(
    base_matrix: &DMatrix<f64>,
    base_rhs: &DVector<f64>,
    terms: &NonlinearTerms,
    initial: &DVector<f64>,
    config: &NewtonConfig,
) -> Result<NewtonOutcome> {
    if initial.len() != base_rhs.len() {
        return Err(Error::DimensionMismatch {
            expected: base_rhs.len(),
            actual: initial.len(),
        });
    }
    if config.max_iterations == 0 {
        return Err(Error::InvalidParameter(
            "max_iterations must be at least 1".to_string(),
        ));
    }

    let mut solution = initial.clone();
    let mut deltas = Vec::new();

    for iteration in 1..=config.max_iterations {
        let (matrix, rhs) = terms.apply(base_matrix, base_rhs, &solution);
        let next = solve_dense(&matrix, &rhs)?;

        let max_delta = (&next - &solution).amax();
        let done = check_convergence(&solution, &next, config);
        trace!("iteration {iteration}: max update {max_delta:e}");

        deltas.push(max_delta);
        solution = next;

        if done {
            debug!("nonlinear iteration converged in {iteration} iterations");
            return Ok(NewtonOutcome {
                solution,
                iterations: iteration,
                deltas,
            });
        }
    }

    Err(Error::ConvergenceFailed {
        iterations: config.max_iterations,
        max_delta: deltas.last().copied().unwrap_or(f64::INFINITY),
    })
}

/// Every component satisfies `|new - old| <= max(abs_tol, rel_tol * |old|)`.
pub fn check_convergence(old: &DVector<f64>, new: &DVector<f64>, config: &NewtonConfig) -> bool {
    old.iter().zip(new.iter()).all(|(&o, &n)| {
        let tol = config.abs_tol.max(config.rel_tol * o.abs());
        (n - o).abs() <= tol
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{dmatrix, dvector};
    use tinyspice_core::DIODE_EXP_RATE;

    /// 5 V through 1 kΩ into a diode, written as a Norton source at the anode.
    fn diode_resistor() -> (DMatrix<f64>, DVector<f64>, NonlinearTerms) {
        let mut terms = NonlinearTerms::new();
        terms.add_diode(Some(0), None, DIODE_EXP_RATE);
        (dmatrix![1e-3], dvector![5e-3], terms)
    }

    #[test]
    fn test_diode_resistor_converges() {
        let (m, b, terms) = diode_resistor();
        let out = solve_nonlinear(&m, &b, &terms, &dvector![0.0], &NewtonConfig::default())
            .unwrap();

        let v = out.solution[0];
        // KCL at the anode: (5 - v)/R = e^(40v) - 1
        let residual = (5.0 - v) / 1e3 - ((DIODE_EXP_RATE * v).exp() - 1.0);
        assert!(residual.abs() < 1e-9, "residual = {residual:e}");
        assert!(out.iterations < 10);
    }

    #[test]
    fn test_updates_non_increasing() {
        let (m, b, terms) = diode_resistor();
        let out = solve_nonlinear(&m, &b, &terms, &dvector![0.0], &NewtonConfig::default())
            .unwrap();

        for pair in out.deltas.windows(2) {
            assert!(pair[1] <= pair[0], "updates grew: {:?}", out.deltas);
        }
    }

    #[test]
    fn test_residual_non_increasing() {
        let (m, b, terms) = diode_resistor();
        // KCL at the anode with the exact diode current.
        let residual = |x: &DVector<f64>| {
            (&m * x - &b)[0] + ((DIODE_EXP_RATE * x[0]).exp() - 1.0)
        };

        let mut x = dvector![0.0];
        let mut norms = vec![residual(&x).abs()];
        for _ in 0..8 {
            let (matrix, rhs) = terms.apply(&m, &b, &x);
            x = solve_dense(&matrix, &rhs).unwrap();
            norms.push(residual(&x).abs());
        }

        for pair in norms.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-15, "residual grew: {norms:?}");
        }
        assert!(norms[norms.len() - 1] < 1e-12);
    }

    #[test]
    fn test_iteration_cap() {
        let (m, b, terms) = diode_resistor();
        let config = NewtonConfig::default()
            .with_abs_tol(0.0)
            .with_rel_tol(0.0)
            .with_max_iterations(1);

        let result = solve_nonlinear(&m, &b, &terms, &dvector![0.0], &config);
        assert!(matches!(
            result,
            Err(Error::ConvergenceFailed { iterations: 1, .. })
        ));
    }

    #[test]
    fn test_linear_system_converges_in_two() {
        let m = dmatrix![2.0];
        let b = dvector![4.0];
        let out = solve_nonlinear(
            &m,
            &b,
            &NonlinearTerms::new(),
            &dvector![0.0],
            &NewtonConfig::default(),
        )
        .unwrap();

        assert_eq!(out.solution[0], 2.0);
        assert_eq!(out.iterations, 2);
    }

    #[test]
    fn test_check_convergence_mixed_tolerance() {
        let config = NewtonConfig::default().with_abs_tol(1e-3).with_rel_tol(1e-2);

        assert!(check_convergence(&dvector![100.0], &dvector![100.9], &config));
        assert!(!check_convergence(&dvector![100.0], &dvector![101.1], &config));
        assert!(check_convergence(&dvector![0.0], &dvector![5e-4], &config));
    }
}
