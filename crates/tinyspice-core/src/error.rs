//! Error types for circuit construction and matrix assembly.

use thiserror::Error;

use crate::device::DeviceKind;

/// Errors raised while building or assembling a circuit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A node or branch name does not exist in the unknown layout.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// The circuit has no ground node ("0" or "gnd").
    #[error("circuit has no ground node")]
    MissingGround,

    /// Two devices of the same kind share a name.
    #[error("duplicate {kind} name: {name}")]
    DuplicateDevice { kind: DeviceKind, name: String },

    /// A device value is out of range for its stamp.
    #[error("invalid value {value} for device {name}")]
    InvalidValue { name: String, value: f64 },

    /// Structural problem not covered by the other variants.
    #[error("invalid circuit: {0}")]
    InvalidCircuit(String),
}

/// Result type for circuit operations.
pub type Result<T> = std::result::Result<T, Error>;
