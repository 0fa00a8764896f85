//! Circuit container.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::device::{
    Capacitor, CurrentSource, Device, DeviceKind, Diode, Inductor, Resistor, Stimulus, Vccs,
    Vcvs, VoltageSource,
};
use crate::error::{Error, Result};
use crate::node::GROUND;

/// An ordered list of devices.
///
/// Ground aliases are normalized as devices are added, so every terminal
/// stored here is already canonical.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "CircuitDef")]
pub struct Circuit {
    /// Optional title line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    devices: Vec<Device>,
}

#[derive(Deserialize)]
struct CircuitDef {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    devices: Vec<Device>,
}

impl From<CircuitDef> for Circuit {
    fn from(def: CircuitDef) -> Self {
        let mut circuit = Circuit {
            title: def.title,
            devices: Vec::with_capacity(def.devices.len()),
        };
        for device in def.devices {
            circuit.add(device);
        }
        circuit
    }
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty circuit with a title.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            devices: Vec::new(),
        }
    }

    /// Append a device.
    pub fn add(&mut self, device: impl Into<Device>) -> &mut Self {
        let mut device = device.into();
        device.normalize_nodes();
        self.devices.push(device);
        self
    }

    pub fn add_resistor(
        &mut self,
        name: impl Into<String>,
        pos: impl Into<String>,
        neg: impl Into<String>,
        resistance: f64,
    ) -> &mut Self {
        self.add(Resistor {
            name: name.into(),
            pos: pos.into(),
            neg: neg.into(),
            resistance,
        })
    }

    pub fn add_capacitor(
        &mut self,
        name: impl Into<String>,
        pos: impl Into<String>,
        neg: impl Into<String>,
        capacitance: f64,
    ) -> &mut Self {
        self.add(Capacitor {
            name: name.into(),
            pos: pos.into(),
            neg: neg.into(),
            capacitance,
        })
    }

    pub fn add_inductor(
        &mut self,
        name: impl Into<String>,
        pos: impl Into<String>,
        neg: impl Into<String>,
        inductance: f64,
    ) -> &mut Self {
        self.add(Inductor {
            name: name.into(),
            pos: pos.into(),
            neg: neg.into(),
            inductance,
        })
    }

    /// Add a voltage source. Accepts a plain `f64` or a full [`Stimulus`].
    pub fn add_voltage_source(
        &mut self,
        name: impl Into<String>,
        pos: impl Into<String>,
        neg: impl Into<String>,
        stimulus: impl Into<Stimulus>,
    ) -> &mut Self {
        self.add(VoltageSource {
            name: name.into(),
            pos: pos.into(),
            neg: neg.into(),
            stimulus: stimulus.into(),
        })
    }

    /// Add a current source. Accepts a plain `f64` or a full [`Stimulus`].
    pub fn add_current_source(
        &mut self,
        name: impl Into<String>,
        pos: impl Into<String>,
        neg: impl Into<String>,
        stimulus: impl Into<Stimulus>,
    ) -> &mut Self {
        self.add(CurrentSource {
            name: name.into(),
            pos: pos.into(),
            neg: neg.into(),
            stimulus: stimulus.into(),
        })
    }

    pub fn add_vccs(
        &mut self,
        name: impl Into<String>,
        pos: impl Into<String>,
        neg: impl Into<String>,
        ctrl_pos: impl Into<String>,
        ctrl_neg: impl Into<String>,
        gm: f64,
    ) -> &mut Self {
        self.add(Vccs {
            name: name.into(),
            pos: pos.into(),
            neg: neg.into(),
            ctrl_pos: ctrl_pos.into(),
            ctrl_neg: ctrl_neg.into(),
            gm,
        })
    }

    pub fn add_vcvs(
        &mut self,
        name: impl Into<String>,
        pos: impl Into<String>,
        neg: impl Into<String>,
        ctrl_pos: impl Into<String>,
        ctrl_neg: impl Into<String>,
        gain: f64,
    ) -> &mut Self {
        self.add(Vcvs {
            name: name.into(),
            pos: pos.into(),
            neg: neg.into(),
            ctrl_pos: ctrl_pos.into(),
            ctrl_neg: ctrl_neg.into(),
            gain,
        })
    }

    pub fn add_diode(
        &mut self,
        name: impl Into<String>,
        anode: impl Into<String>,
        cathode: impl Into<String>,
    ) -> &mut Self {
        self.add(Diode {
            name: name.into(),
            anode: anode.into(),
            cathode: cathode.into(),
        })
    }

    /// All devices in insertion order.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Devices of one kind, in insertion order.
    pub fn devices_of(&self, kind: DeviceKind) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(move |d| d.kind() == kind)
    }

    /// Look up a device by kind and name.
    pub fn find(&self, kind: DeviceKind, name: &str) -> Option<&Device> {
        self.devices_of(kind).find(|d| d.name() == name)
    }

    /// Every node name, ground first (when present) and the rest sorted.
    pub fn nodes(&self) -> Vec<String> {
        let all: BTreeSet<&str> = self.devices.iter().flat_map(|d| d.nodes()).collect();

        let mut nodes = Vec::with_capacity(all.len());
        if all.contains(GROUND) {
            nodes.push(GROUND.to_string());
        }
        nodes.extend(
            all.into_iter()
                .filter(|n| *n != GROUND)
                .map(str::to_string),
        );
        nodes
    }

    /// Whether the circuit contains any nonlinear device.
    pub fn has_diodes(&self) -> bool {
        self.devices_of(DeviceKind::Diode).next().is_some()
    }

    /// Check structural and value constraints before assembly.
    pub fn validate(&self) -> Result<()> {
        if !self.nodes().iter().any(|n| n == GROUND) {
            return Err(Error::MissingGround);
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            if !seen.insert((device.kind(), device.name())) {
                return Err(Error::DuplicateDevice {
                    kind: device.kind(),
                    name: device.name().to_string(),
                });
            }

            if let Device::Resistor(r) = device {
                if !(r.resistance.is_finite() && r.resistance > 0.0) {
                    return Err(Error::InvalidValue {
                        name: r.name.clone(),
                        value: r.resistance,
                    });
                }
            }
        }

        Ok(())
    }
}
