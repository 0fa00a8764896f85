//! Dense linear system solvers.

use nalgebra::linalg::LU;
use nalgebra::{DMatrix, DVector, Dyn};
use num_complex::Complex64;

use crate::error::{Error, Result};

fn check_dimensions(rows: usize, cols: usize, rhs: usize) -> Result<()> {
    if rows != cols {
        return Err(Error::DimensionMismatch {
            expected: rows,
            actual: cols,
        });
    }
    if rows != rhs {
        return Err(Error::DimensionMismatch {
            expected: rows,
            actual: rhs,
        });
    }
    Ok(())
}

/// Solve a linear system Ax = b using LU decomposition.
///
/// A solution with non-finite entries is reported as [`Error::SingularMatrix`]:
/// LU on a numerically singular MNA matrix tends to return inf/NaN rather than fail.
pub fn solve_dense(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    check_dimensions(a.nrows(), a.ncols(), b.len())?;

    let x = a.clone().lu().solve(b).ok_or(Error::SingularMatrix)?;
    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(Error::SingularMatrix)
    }
}

/// Solve a complex linear system Ax = b using LU decomposition.
pub fn solve_complex(a: &DMatrix<Complex64>, b: &DVector<Complex64>) -> Result<DVector<Complex64>> {
    check_dimensions(a.nrows(), a.ncols(), b.len())?;

    let x = a.clone().lu().solve(b).ok_or(Error::SingularMatrix)?;
    if x.iter().all(|v| v.re.is_finite() && v.im.is_finite()) {
        Ok(x)
    } else {
        Err(Error::SingularMatrix)
    }
}

/// LU factorization kept across solves with the same matrix.
///
/// Used where the system matrix is constant and only the RHS changes, such as
/// the linear transient step.
pub struct CachedLu {
    lu: LU<f64, Dyn, Dyn>,
    size: usize,
}

impl CachedLu {
    /// Factor a square matrix.
    pub fn new(a: &DMatrix<f64>) -> Result<Self> {
        check_dimensions(a.nrows(), a.ncols(), a.nrows())?;

        let lu = a.clone().lu();
        if !lu.is_invertible() {
            return Err(Error::SingularMatrix);
        }
        Ok(Self {
            lu,
            size: a.nrows(),
        })
    }

    /// Solve for a new right-hand side.
    pub fn solve(&self, b: &DVector<f64>) -> Result<DVector<f64>> {
        if b.len() != self.size {
            return Err(Error::DimensionMismatch {
                expected: self.size,
                actual: b.len(),
            });
        }

        let x = self.lu.solve(b).ok_or(Error::SingularMatrix)?;
        if x.iter().all(|v| v.is_finite()) {
            Ok(x)
        } else {
            Err(Error::SingularMatrix)
        }
    }
}
