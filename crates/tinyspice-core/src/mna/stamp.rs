//! Element stamp primitives shared by the frequency-domain and transient assemblers.
//!
//! Indices are full-system indices; ground rows and columns are written like any
//! other and dropped when the system is reduced.

use nalgebra::{ComplexField, DMatrix};

/// Two-terminal admittance `y` between `n1` and `n2`.
pub fn stamp_admittance<T>(matrix: &mut DMatrix<T>, n1: usize, n2: usize, y: T)
where
    T: ComplexField<RealField = f64> + Copy,
{
    matrix[(n1, n1)] += y;
    matrix[(n2, n2)] += y;
    matrix[(n1, n2)] -= y;
    matrix[(n2, n1)] -= y;
}

/// KVL row and KCL columns linking branch `br` to nodes `n1` (+) and `n2` (-).
pub fn stamp_branch<T>(matrix: &mut DMatrix<T>, br: usize, n1: usize, n2: usize)
where
    T: ComplexField<RealField = f64> + Copy,
{
    let one = T::one();
    matrix[(br, n1)] += one;
    matrix[(br, n2)] -= one;
    matrix[(n1, br)] += one;
    matrix[(n2, br)] -= one;
}

/// Transconductance `g` from the control pair `(c1, c2)` into the output pair `(n1, n2)`.
pub fn stamp_transconductance<T>(
    matrix: &mut DMatrix<T>,
    n1: usize,
    n2: usize,
    c1: usize,
    c2: usize,
    g: T,
) where
    T: ComplexField<RealField = f64> + Copy,
{
    matrix[(n1, c1)] += g;
    matrix[(n1, c2)] -= g;
    matrix[(n2, c1)] -= g;
    matrix[(n2, c2)] += g;
}

/// Voltage-controlled term on a branch row: `(br, c1) -= gain`, `(br, c2) += gain`.
pub fn stamp_branch_control<T>(matrix: &mut DMatrix<T>, br: usize, c1: usize, c2: usize, gain: T)
where
    T: ComplexField<RealField = f64> + Copy,
{
    matrix[(br, c1)] -= gain;
    matrix[(br, c2)] += gain;
}
