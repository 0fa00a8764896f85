//! Node naming and the unknown-vector layout.
//!
//! The full unknown vector is laid out as
//!
//! ```text
//! ┌────────┬──────────────┬──────────────────────┐
//! │ ground │ other nodes  │ branch currents i_X  │
//! │  "0"   │ (sorted)     │ (by device kind)     │
//! └────────┴──────────────┴──────────────────────┘
//! ```
//!
//! Assembled matrices keep the ground row and column; solvers work on the
//! reduced system with both removed, so a reduced index is always
//! `full index - 1`.

use indexmap::IndexSet;

use crate::circuit::Circuit;
use crate::device::DeviceKind;
use crate::error::{Error, Result};

/// Name of the ground node.
pub const GROUND: &str = "0";

/// Prefix of branch-current unknowns (`i_V1`, `i_L2`, ...).
pub const BRANCH_PREFIX: &str = "i_";

/// Map a user-facing node name to its canonical form ("gnd" becomes "0").
pub fn normalize(name: &str) -> String {
    if name.eq_ignore_ascii_case("gnd") {
        GROUND.to_string()
    } else {
        name.to_string()
    }
}

/// Check whether a name refers to ground.
pub fn is_ground(name: &str) -> bool {
    name == GROUND || name.eq_ignore_ascii_case("gnd")
}

/// Name of the branch-current unknown owned by a device.
pub fn branch_name(device: &str) -> String {
    format!("{BRANCH_PREFIX}{device}")
}

/// Which devices own a branch-current unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// DC and AC: inductors, voltage sources, VCVS.
    FrequencyDomain,
    /// Backward-Euler transient: capacitors get a branch as well.
    Transient,
}

impl Layout {
    /// Device kinds with a branch unknown, in layout order.
    pub fn branch_kinds(self) -> &'static [DeviceKind] {
        match self {
            Layout::FrequencyDomain => &[
                DeviceKind::Inductor,
                DeviceKind::VoltageSource,
                DeviceKind::Vcvs,
            ],
            Layout::Transient => &[
                DeviceKind::Inductor,
                DeviceKind::Capacitor,
                DeviceKind::VoltageSource,
                DeviceKind::Vcvs,
            ],
        }
    }
}

/// Ordered list of unknown names with O(1) name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIndex {
    names: IndexSet<String>,
    node_count: usize,
}

impl NodeIndex {
    /// Build the index for a given layout.
    ///
    /// Fails with [`Error::MissingGround`] when no device touches ground, and
    /// with [`Error::InvalidCircuit`] if a node name collides with a branch name.
    pub fn build(circuit: &Circuit, layout: Layout) -> Result<Self> {
        let nodes = circuit.nodes();
        if nodes.first().map(String::as_str) != Some(GROUND) {
            return Err(Error::MissingGround);
        }

        let node_count = nodes.len();
        let mut names: IndexSet<String> = nodes.into_iter().collect();

        for &kind in layout.branch_kinds() {
            for device in circuit.devices_of(kind) {
                let branch = branch_name(device.name());
                if !names.insert(branch.clone()) {
                    return Err(Error::InvalidCircuit(format!(
                        "unknown name {branch} is used twice"
                    )));
                }
            }
        }

        Ok(Self { names, node_count })
    }

    /// Layout used by DC and AC analysis.
    pub fn frequency_domain(circuit: &Circuit) -> Result<Self> {
        Self::build(circuit, Layout::FrequencyDomain)
    }

    /// Layout used by transient analysis.
    pub fn transient(circuit: &Circuit) -> Result<Self> {
        Self::build(circuit, Layout::Transient)
    }

    /// Full-system index of a node or branch name (ground is 0).
    pub fn index_of(&self, name: &str) -> Result<usize> {
        let name = normalize(name);
        self.names
            .get_index_of(&name)
            .ok_or(Error::NodeNotFound(name))
    }

    /// Index in the ground-reduced system; `None` for ground.
    pub fn reduced_index(&self, name: &str) -> Result<Option<usize>> {
        let index = self.index_of(name)?;
        Ok(index.checked_sub(1))
    }

    /// Full-system index of a device's branch-current unknown.
    pub fn branch_index(&self, device: &str) -> Result<usize> {
        self.index_of(&branch_name(device))
    }

    /// Total number of unknowns, ground included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a built index, which contains at least ground.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of circuit nodes, ground included.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of branch-current unknowns.
    pub fn branch_count(&self) -> usize {
        self.names.len() - self.node_count
    }

    /// All unknown names in full-system order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Unknown names of the reduced system (ground removed).
    pub fn reduced_names(&self) -> Vec<String> {
        self.names.iter().skip(1).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Circuit {
        let mut circuit = Circuit::new();
        circuit
            .add_voltage_source("V1", "in", "gnd", 10.0)
            .add_resistor("R1", "in", "out", 1e3)
            .add_inductor("L1", "out", "b", 1e-3)
            .add_capacitor("C1", "b", "0", 1e-6)
            .add_vcvs("E1", "e", "0", "in", "0", 2.0);
        circuit
    }

    #[test]
    fn test_frequency_domain_layout() {
        let index = NodeIndex::frequency_domain(&sample()).unwrap();
        let names: Vec<&str> = index.names().collect();

        assert_eq!(
            names,
            ["0", "b", "e", "in", "out", "i_L1", "i_V1", "i_E1"]
        );
        assert_eq!(index.node_count(), 5);
        assert_eq!(index.branch_count(), 3);
    }

    #[test]
    fn test_transient_layout_adds_capacitor_branch() {
        let index = NodeIndex::transient(&sample()).unwrap();
        let names: Vec<&str> = index.names().skip(5).collect();

        assert_eq!(names, ["i_L1", "i_C1", "i_V1", "i_E1"]);
    }

    #[test]
    fn test_ground_alias_and_reduced_index() {
        let index = NodeIndex::frequency_domain(&sample()).unwrap();

        assert_eq!(index.index_of("gnd").unwrap(), 0);
        assert_eq!(index.reduced_index("GND").unwrap(), None);
        assert_eq!(index.reduced_index("b").unwrap(), Some(0));
        assert_eq!(index.branch_index("V1").unwrap(), 6);
    }

    #[test]
    fn test_unknown_node() {
        let index = NodeIndex::frequency_domain(&sample()).unwrap();

        assert_eq!(
            index.index_of("nope"),
            Err(Error::NodeNotFound("nope".to_string()))
        );
    }

    #[test]
    fn test_missing_ground() {
        let mut circuit = Circuit::new();
        circuit.add_resistor("R1", "a", "b", 1.0);

        assert_eq!(
            NodeIndex::frequency_domain(&circuit),
            Err(Error::MissingGround)
        );
    }

    #[test]
    fn test_node_named_like_branch_rejected() {
        let mut circuit = Circuit::new();
        circuit
            .add_voltage_source("V1", "i_V1", "0", 1.0)
            .add_resistor("R1", "i_V1", "0", 1.0);

        assert!(matches!(
            NodeIndex::frequency_domain(&circuit),
            Err(Error::InvalidCircuit(_))
        ));
    }
}
