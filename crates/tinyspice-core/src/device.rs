//! Circuit devices.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::normalize;
use crate::waveform::Waveform;

/// Device kinds, declared in stamping order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceKind {
    Resistor,
    Capacitor,
    CurrentSource,
    Vccs,
    Inductor,
    VoltageSource,
    Vcvs,
    Diode,
}

impl DeviceKind {
    /// All kinds in the order their stamps are applied.
    pub const STAMP_ORDER: [DeviceKind; 8] = [
        DeviceKind::Resistor,
        DeviceKind::Capacitor,
        DeviceKind::CurrentSource,
        DeviceKind::Vccs,
        DeviceKind::Inductor,
        DeviceKind::VoltageSource,
        DeviceKind::Vcvs,
        DeviceKind::Diode,
    ];
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceKind::Resistor => "resistor",
            DeviceKind::Capacitor => "capacitor",
            DeviceKind::CurrentSource => "current source",
            DeviceKind::Vccs => "VCCS",
            DeviceKind::Inductor => "inductor",
            DeviceKind::VoltageSource => "voltage source",
            DeviceKind::Vcvs => "VCVS",
            DeviceKind::Diode => "diode",
        };
        f.write_str(name)
    }
}

/// Value of an independent source in each analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    /// Nominal (DC) value.
    #[serde(default)]
    pub dc: f64,
    /// AC small-signal magnitude; falls back to `dc`.
    #[serde(default)]
    pub ac: Option<f64>,
    /// Transient waveform; falls back to a constant `dc`.
    #[serde(default)]
    pub waveform: Option<Waveform>,
}

impl Stimulus {
    /// Constant source.
    pub fn dc(value: f64) -> Self {
        Self {
            dc: value,
            ac: None,
            waveform: None,
        }
    }

    /// Set the AC magnitude.
    pub fn with_ac(mut self, magnitude: f64) -> Self {
        self.ac = Some(magnitude);
        self
    }

    /// Set the transient waveform.
    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = Some(waveform);
        self
    }

    /// Value used by AC assembly.
    pub fn ac_value(&self) -> f64 {
        self.ac.unwrap_or(self.dc)
    }

    /// Value at time `t` during a transient run.
    pub fn value_at(&self, t: f64) -> f64 {
        match &self.waveform {
            Some(waveform) => waveform.value_at(t),
            None => self.dc,
        }
    }
}

impl From<f64> for Stimulus {
    fn from(value: f64) -> Self {
        Stimulus::dc(value)
    }
}

/// Linear resistor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resistor {
    pub name: String,
    pub pos: String,
    pub neg: String,
    /// Resistance (ohms).
    pub resistance: f64,
}

/// Linear capacitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capacitor {
    pub name: String,
    pub pos: String,
    pub neg: String,
    /// Capacitance (F).
    pub capacitance: f64,
}

/// Linear inductor. Owns a branch-current unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inductor {
    pub name: String,
    pub pos: String,
    pub neg: String,
    /// Inductance (H).
    pub inductance: f64,
}

/// Independent voltage source. Owns a branch-current unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageSource {
    pub name: String,
    pub pos: String,
    pub neg: String,
    #[serde(flatten)]
    pub stimulus: Stimulus,
}

/// Independent current source.
///
/// A positive value adds to the right-hand side of the `pos` row and
/// subtracts from the `neg` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSource {
    pub name: String,
    pub pos: String,
    pub neg: String,
    #[serde(flatten)]
    pub stimulus: Stimulus,
}

/// Voltage-controlled current source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vccs {
    pub name: String,
    pub pos: String,
    pub neg: String,
    pub ctrl_pos: String,
    pub ctrl_neg: String,
    /// Transconductance (S).
    pub gm: f64,
}

/// Voltage-controlled voltage source. Owns a branch-current unknown.
///
/// V(pos, neg) = gain * V(ctrl_pos, ctrl_neg)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vcvs {
    pub name: String,
    pub pos: String,
    pub neg: String,
    pub ctrl_pos: String,
    pub ctrl_neg: String,
    pub gain: f64,
}

/// Junction diode with the fixed exponential model I = e^(b·V) - 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diode {
    pub name: String,
    pub anode: String,
    pub cathode: String,
}

/// Any device that can appear in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Device {
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    VoltageSource(VoltageSource),
    CurrentSource(CurrentSource),
    Vccs(Vccs),
    Vcvs(Vcvs),
    Diode(Diode),
}

impl Device {
    pub fn name(&self) -> &str {
        match self {
            Device::Resistor(d) => &d.name,
            Device::Capacitor(d) => &d.name,
            Device::Inductor(d) => &d.name,
            Device::VoltageSource(d) => &d.name,
            Device::CurrentSource(d) => &d.name,
            Device::Vccs(d) => &d.name,
            Device::Vcvs(d) => &d.name,
            Device::Diode(d) => &d.name,
        }
    }

    pub fn kind(&self) -> DeviceKind {
        match self {
            Device::Resistor(_) => DeviceKind::Resistor,
            Device::Capacitor(_) => DeviceKind::Capacitor,
            Device::Inductor(_) => DeviceKind::Inductor,
            Device::VoltageSource(_) => DeviceKind::VoltageSource,
            Device::CurrentSource(_) => DeviceKind::CurrentSource,
            Device::Vccs(_) => DeviceKind::Vccs,
            Device::Vcvs(_) => DeviceKind::Vcvs,
            Device::Diode(_) => DeviceKind::Diode,
        }
    }

    /// Positive and negative terminal.
    pub fn terminals(&self) -> (&str, &str) {
        match self {
            Device::Resistor(d) => (&d.pos, &d.neg),
            Device::Capacitor(d) => (&d.pos, &d.neg),
            Device::Inductor(d) => (&d.pos, &d.neg),
            Device::VoltageSource(d) => (&d.pos, &d.neg),
            Device::CurrentSource(d) => (&d.pos, &d.neg),
            Device::Vccs(d) => (&d.pos, &d.neg),
            Device::Vcvs(d) => (&d.pos, &d.neg),
            Device::Diode(d) => (&d.anode, &d.cathode),
        }
    }

    /// Controlling node pair of a dependent source.
    pub fn control(&self) -> Option<(&str, &str)> {
        match self {
            Device::Vccs(d) => Some((&d.ctrl_pos, &d.ctrl_neg)),
            Device::Vcvs(d) => Some((&d.ctrl_pos, &d.ctrl_neg)),
            _ => None,
        }
    }

    /// Every node the device references, control nodes included.
    pub fn nodes(&self) -> Vec<&str> {
        let (pos, neg) = self.terminals();
        let mut nodes = vec![pos, neg];
        if let Some((cp, cn)) = self.control() {
            nodes.push(cp);
            nodes.push(cn);
        }
        nodes
    }

    /// Stimulus of an independent source.
    pub fn stimulus(&self) -> Option<&Stimulus> {
        match self {
            Device::VoltageSource(d) => Some(&d.stimulus),
            Device::CurrentSource(d) => Some(&d.stimulus),
            _ => None,
        }
    }

    /// Rewrite ground aliases in every terminal.
    pub(crate) fn normalize_nodes(&mut self) {
        fn fix(node: &mut String) {
            *node = normalize(node);
        }

        match self {
            Device::Resistor(d) => {
                fix(&mut d.pos);
                fix(&mut d.neg);
            }
            Device::Capacitor(d) => {
                fix(&mut d.pos);
                fix(&mut d.neg);
            }
            Device::Inductor(d) => {
                fix(&mut d.pos);
                fix(&mut d.neg);
            }
            Device::VoltageSource(d) => {
                fix(&mut d.pos);
                fix(&mut d.neg);
            }
            Device::CurrentSource(d) => {
                fix(&mut d.pos);
                fix(&mut d.neg);
            }
            Device::Vccs(d) => {
                fix(&mut d.pos);
                fix(&mut d.neg);
                fix(&mut d.ctrl_pos);
                fix(&mut d.ctrl_neg);
            }
            Device::Vcvs(d) => {
                fix(&mut d.pos);
                fix(&mut d.neg);
                fix(&mut d.ctrl_pos);
                fix(&mut d.ctrl_neg);
            }
            Device::Diode(d) => {
                fix(&mut d.anode);
                fix(&mut d.cathode);
            }
        }
    }
}

macro_rules! impl_from_device {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for Device {
                fn from(device: $ty) -> Self {
                    Device::$ty(device)
                }
            }
        )*
    };
}

impl_from_device!(
    Resistor,
    Capacitor,
    Inductor,
    VoltageSource,
    CurrentSource,
    Vccs,
    Vcvs,
    Diode
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stimulus_fallbacks() {
        let s = Stimulus::dc(2.0);
        assert_eq!(s.ac_value(), 2.0);
        assert_eq!(s.value_at(1.0), 2.0);

        let s = s.with_ac(1.0).with_waveform(Waveform::sin(0.0, 1.0, 1.0));
        assert_eq!(s.ac_value(), 1.0);
        assert!((s.value_at(0.25) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_vcvs_nodes_include_control() {
        let device = Device::from(Vcvs {
            name: "E1".into(),
            pos: "out".into(),
            neg: "0".into(),
            ctrl_pos: "in".into(),
            ctrl_neg: "ref".into(),
            gain: 10.0,
        });

        assert_eq!(device.kind(), DeviceKind::Vcvs);
        assert_eq!(device.nodes(), ["out", "0", "in", "ref"]);
        assert_eq!(device.control(), Some(("in", "ref")));
    }

    #[test]
    fn test_normalize_ground_alias() {
        let mut device = Device::from(Diode {
            name: "D1".into(),
            anode: "a".into(),
            cathode: "GND".into(),
        });
        device.normalize_nodes();

        assert_eq!(device.terminals(), ("a", "0"));
    }

    #[test]
    fn test_deserialize_source() {
        let device: Device = serde_json::from_str(
            r#"{"kind":"voltage_source","name":"V1","pos":"in","neg":"0","dc":5,"ac":1}"#,
        )
        .unwrap();

        let stimulus = device.stimulus().unwrap();
        assert_eq!(stimulus.dc, 5.0);
        assert_eq!(stimulus.ac_value(), 1.0);
        assert!(stimulus.waveform.is_none());
    }
}
