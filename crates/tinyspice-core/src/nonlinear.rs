//! Exponential terms for nonlinear devices.
//!
//! Each term adds `zero_order(x) + first_order(x) * x` to one matrix entry or
//! one right-hand-side entry, where `x = V(sense_pos) - V(sense_neg)` is read
//! from the current iterate and every coefficient has the form
//! `scale * e^(rate * x) + constant`.
//!
//! All indices refer to the ground-reduced system; `None` is ground, which
//! reads as 0 V when sensing and is never written.

use nalgebra::{DMatrix, DVector};

/// Exponent coefficient of the built-in diode model (1/V).
pub const DIODE_EXP_RATE: f64 = 40.0;

/// `scale * e^(rate * x) + constant`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpCoeff {
    pub scale: f64,
    pub rate: f64,
    pub constant: f64,
}

impl ExpCoeff {
    /// Identically zero.
    pub const ZERO: ExpCoeff = ExpCoeff {
        scale: 0.0,
        rate: 0.0,
        constant: 0.0,
    };

    pub const fn new(scale: f64, rate: f64, constant: f64) -> Self {
        Self {
            scale,
            rate,
            constant,
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.scale * (self.rate * x).exp() + self.constant
    }
}

/// Where a term's contribution lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermTarget {
    Matrix {
        row: Option<usize>,
        col: Option<usize>,
    },
    Rhs {
        row: Option<usize>,
    },
}

/// One registered exponential term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpTerm {
    pub target: TermTarget,
    pub sense_pos: Option<usize>,
    pub sense_neg: Option<usize>,
    pub zero_order: ExpCoeff,
    pub first_order: ExpCoeff,
}

impl ExpTerm {
    /// Controlling voltage for this term at the given iterate.
    pub fn sense(&self, iterate: &DVector<f64>) -> f64 {
        let read = |idx: Option<usize>| idx.map_or(0.0, |i| iterate[i]);
        read(self.sense_pos) - read(self.sense_neg)
    }

    /// Value added to the target entry at the given iterate.
    pub fn contribution(&self, iterate: &DVector<f64>) -> f64 {
        let x = self.sense(iterate);
        self.zero_order.eval(x) + self.first_order.eval(x) * x
    }
}

/// Registry of exponential terms produced during assembly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NonlinearTerms {
    terms: Vec<ExpTerm>,
}

impl NonlinearTerms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, term: ExpTerm) {
        self.terms.push(term);
    }

    /// Register the six terms of a diode between `anode` and `cathode`.
    ///
    /// With `g = b·e^(b·x)` this linearizes `I = e^(b·x) - 1` around `x`:
    ///
    /// ```text
    ///            anode   cathode        rhs
    /// anode   [   +g       -g   ]   [ 1 - e^(bx) + g·x ]
    /// cathode [   -g       +g   ]   [ e^(bx) - 1 - g·x ]
    /// ```
    pub fn add_diode(&mut self, anode: Option<usize>, cathode: Option<usize>, rate: f64) {
        let g = ExpCoeff::new(rate, rate, 0.0);
        let neg_g = ExpCoeff::new(-rate, rate, 0.0);

        let entries = [
            (anode, anode, g),
            (anode, cathode, neg_g),
            (cathode, anode, neg_g),
            (cathode, cathode, g),
        ];
        for (row, col, coeff) in entries {
            self.push(ExpTerm {
                target: TermTarget::Matrix { row, col },
                sense_pos: anode,
                sense_neg: cathode,
                zero_order: coeff,
                first_order: ExpCoeff::ZERO,
            });
        }

        self.push(ExpTerm {
            target: TermTarget::Rhs { row: anode },
            sense_pos: anode,
            sense_neg: cathode,
            zero_order: ExpCoeff::new(-1.0, rate, 1.0),
            first_order: g,
        });
        self.push(ExpTerm {
            target: TermTarget::Rhs { row: cathode },
            sense_pos: anode,
            sense_neg: cathode,
            zero_order: ExpCoeff::new(1.0, rate, -1.0),
            first_order: neg_g,
        });
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExpTerm> {
        self.terms.iter()
    }

    /// Linearize around `iterate`: copies of the base system with every term added.
    ///
    /// The base matrix and RHS are left untouched, so the same base can be
    /// reused across iterations, sweep points and time steps.
    pub fn apply(
        &self,
        base_matrix: &DMatrix<f64>,
        base_rhs: &DVector<f64>,
        iterate: &DVector<f64>,
    ) -> (DMatrix<f64>, DVector<f64>) {
        let mut matrix = base_matrix.clone();
        let mut rhs = base_rhs.clone();

        for term in &self.terms {
            match term.target {
                TermTarget::Matrix {
                    row: Some(row),
                    col: Some(col),
                } => matrix[(row, col)] += term.contribution(iterate),
                TermTarget::Rhs { row: Some(row) } => rhs[row] += term.contribution(iterate),
                _ => {}
            }
        }

        (matrix, rhs)
    }
}
