//! Print variables: which unknown to read and how to present it.

use std::fmt;

use nalgebra::DVector;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tinyspice_core::node::{BRANCH_PREFIX, is_ground, normalize};

use crate::error::{Error, Result};

/// Quantity extracted from a (possibly complex) solution value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantity {
    /// |x|
    Magnitude,
    /// Re(x); the raw value for DC and transient results.
    #[default]
    Real,
    /// Im(x)
    Imag,
    /// arg(x) in degrees.
    Phase,
    /// 20·log10|x|
    Db,
}

impl Quantity {
    pub fn apply(self, z: Complex64) -> f64 {
        match self {
            Quantity::Magnitude => z.norm(),
            Quantity::Real => z.re,
            Quantity::Imag => z.im,
            Quantity::Phase => z.arg().to_degrees(),
            Quantity::Db => 20.0 * z.norm().log10(),
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Quantity::Magnitude => "M",
            Quantity::Real => "R",
            Quantity::Imag => "I",
            Quantity::Phase => "P",
            Quantity::Db => "DB",
        }
    }
}

/// A requested output: the value of `node` (minus `reference`, if given).
///
/// `node` may also name a branch-current unknown such as `i_V1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub node: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub quantity: Quantity,
}

impl Probe {
    /// Real value of a single unknown.
    pub fn voltage(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            reference: None,
            quantity: Quantity::Real,
        }
    }

    /// Real value of `node - reference`.
    pub fn differential(node: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            reference: Some(reference.into()),
            quantity: Quantity::Real,
        }
    }

    pub fn with_quantity(mut self, quantity: Quantity) -> Self {
        self.quantity = quantity;
        self
    }

    /// Locate the probe's unknowns in a reduced name list.
    pub fn resolve(&self, names: &[String]) -> Result<ResolvedProbe> {
        Ok(ResolvedProbe {
            pos: locate(names, &self.node)?,
            neg: match &self.reference {
                Some(reference) => locate(names, reference)?,
                None => None,
            },
            quantity: self.quantity,
        })
    }
}

impl fmt::Display for Probe {
    /// SPICE-style label such as `VDB(out)` or `IR(V1)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, node) = match self.node.strip_prefix(BRANCH_PREFIX) {
            Some(device) => ('I', device),
            None => ('V', self.node.as_str()),
        };
        let suffix = match self.quantity {
            Quantity::Real => "",
            q => q.suffix(),
        };
        match &self.reference {
            Some(reference) => write!(f, "{kind}{suffix}({node},{reference})"),
            None => write!(f, "{kind}{suffix}({node})"),
        }
    }
}

/// A probe bound to positions in a solution vector. Ground is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedProbe {
    pos: Option<usize>,
    neg: Option<usize>,
    quantity: Quantity,
}

impl ResolvedProbe {
    pub fn real(&self, solution: &DVector<f64>) -> f64 {
        let read = |idx: Option<usize>| idx.map_or(0.0, |i| solution[i]);
        self.quantity
            .apply(Complex64::from(read(self.pos) - read(self.neg)))
    }

    pub fn complex(&self, solution: &DVector<Complex64>) -> f64 {
        let read = |idx: Option<usize>| idx.map_or(Complex64::new(0.0, 0.0), |i| solution[i]);
        self.quantity.apply(read(self.pos) - read(self.neg))
    }
}

fn locate(names: &[String], name: &str) -> Result<Option<usize>> {
    if is_ground(name) {
        return Ok(None);
    }
    let name = normalize(name);
    names
        .iter()
        .position(|n| *n == name)
        .map(Some)
        .ok_or(Error::UnknownProbe(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    fn names() -> Vec<String> {
        vec!["in".into(), "out".into(), "i_V1".into()]
    }

    #[test]
    fn test_quantities() {
        let z = Complex64::new(0.0, 1.0);

        assert_eq!(Quantity::Magnitude.apply(z), 1.0);
        assert_eq!(Quantity::Imag.apply(z), 1.0);
        assert!((Quantity::Phase.apply(z) - 90.0).abs() < 1e-12);
        assert_eq!(Quantity::Db.apply(Complex64::new(10.0, 0.0)), 20.0);
    }

    #[test]
    fn test_ground_reads_zero() {
        let probe = Probe::voltage("gnd").resolve(&names()).unwrap();
        assert_eq!(probe.real(&dvector![1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_differential_and_branch() {
        let x = dvector![10.0, 4.0, -0.005];

        let diff = Probe::differential("in", "out").resolve(&names()).unwrap();
        assert_eq!(diff.real(&x), 6.0);

        let current = Probe::voltage("i_V1").resolve(&names()).unwrap();
        assert_eq!(current.real(&x), -0.005);
    }

    #[test]
    fn test_unknown_probe() {
        assert!(matches!(
            Probe::voltage("nope").resolve(&names()),
            Err(Error::UnknownProbe(_))
        ));
    }

    #[test]
    fn test_labels() {
        assert_eq!(Probe::voltage("out").to_string(), "V(out)");
        assert_eq!(
            Probe::voltage("out")
                .with_quantity(Quantity::Db)
                .to_string(),
            "VDB(out)"
        );
        assert_eq!(
            Probe::voltage("i_V1")
                .with_quantity(Quantity::Magnitude)
                .to_string(),
            "IM(V1)"
        );
        assert_eq!(Probe::differential("a", "b").to_string(), "V(a,b)");
    }
}
