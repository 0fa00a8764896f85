//! JSON simulation decks: a circuit, one analysis and the print variables.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tinyspice_core::Circuit;
use tinyspice_solver::{AcParams, DcSweepParams, Probe, Quantity, TranParams};

/// Analysis directive of a deck.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Analysis {
    /// DC operating point.
    Op,
    /// DC sweep of one independent source.
    Dc(DcSweepParams),
    /// AC small-signal sweep.
    Ac(AcParams),
    /// Fixed-step transient.
    Tran(TranParams),
}

impl Analysis {
    pub fn name(&self) -> &'static str {
        match self {
            Analysis::Op => "DC Operating Point",
            Analysis::Dc(_) => "DC Sweep",
            Analysis::Ac(_) => "AC",
            Analysis::Tran(_) => "Transient",
        }
    }
}

/// A parsed deck.
#[derive(Debug, Clone, Deserialize)]
pub struct Deck {
    pub circuit: Circuit,
    pub analysis: Analysis,
    /// Requested outputs. Empty means every unknown.
    #[serde(default)]
    pub print: Vec<Probe>,
}

impl Deck {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("malformed deck")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read deck: {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Probes to print, defaulting to every reduced unknown.
    ///
    /// AC defaults report magnitudes; DC and transient report raw values.
    pub fn probes(&self, nodes: &[String]) -> Vec<Probe> {
        if !self.print.is_empty() {
            return self.print.clone();
        }

        let quantity = match self.analysis {
            Analysis::Ac(_) => Quantity::Magnitude,
            _ => Quantity::Real,
        };
        nodes
            .iter()
            .map(|node| Probe::voltage(node.as_str()).with_quantity(quantity))
            .collect()
    }
}
