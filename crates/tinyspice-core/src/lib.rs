//! Core circuit representation and MNA assembly for tinyspice.
//!
//! A [`Circuit`] is an ordered list of [`Device`]s connected by named nodes.
//! [`mna::assemble`] turns it into a complex system over the unknown layout
//! given by [`NodeIndex`]; diode nonlinearities are carried alongside as
//! [`NonlinearTerms`] for the solver to linearize.

pub mod circuit;
pub mod device;
pub mod dump;
pub mod error;
pub mod mna;
pub mod node;
pub mod nonlinear;
pub mod waveform;

pub use circuit::Circuit;
pub use device::{
    Capacitor, CurrentSource, Device, DeviceKind, Diode, Inductor, Resistor, Stimulus, Vccs,
    Vcvs, VoltageSource,
};
pub use error::{Error, Result};
pub use mna::{
    AnalysisMatrix, Excitation, StampOptions, TranAnalysisMat, assemble, assemble_ac,
    assemble_transient, assemble_with,
};
pub use node::{GROUND, Layout, NodeIndex};
pub use nonlinear::{DIODE_EXP_RATE, ExpCoeff, ExpTerm, NonlinearTerms, TermTarget};
pub use waveform::Waveform;
