//! Time-varying source waveforms for transient analysis.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// A time-varying waveform specification.
///
/// A source without a waveform holds its DC value for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Waveform {
    /// Pulse waveform: PULSE(V1 V2 TD TR TF PW PER)
    ///
    /// - V1: Initial value
    /// - V2: Pulsed value
    /// - TD: Delay time (before first pulse)
    /// - TR: Rise time
    /// - TF: Fall time
    /// - PW: Pulse width (at V2)
    /// - PER: Period (0 or negative for a single pulse)
    Pulse {
        v1: f64,
        v2: f64,
        #[serde(default)]
        td: f64,
        #[serde(default)]
        tr: f64,
        #[serde(default)]
        tf: f64,
        #[serde(default)]
        pw: f64,
        #[serde(default)]
        per: f64,
    },

    /// Damped sinusoid: SIN(V0 VA FREQ TD THETA)
    Sin {
        v0: f64,
        va: f64,
        freq: f64,
        #[serde(default)]
        td: f64,
        #[serde(default)]
        theta: f64,
    },
}

impl Waveform {
    /// Create a pulse waveform.
    pub fn pulse(v1: f64, v2: f64, td: f64, tr: f64, tf: f64, pw: f64, per: f64) -> Self {
        Waveform::Pulse {
            v1,
            v2,
            td,
            tr,
            tf,
            pw,
            per,
        }
    }

    /// Create an undamped sinusoid starting at t = 0.
    pub fn sin(v0: f64, va: f64, freq: f64) -> Self {
        Waveform::Sin {
            v0,
            va,
            freq,
            td: 0.0,
            theta: 0.0,
        }
    }

    /// Create a sinusoid with delay and damping.
    pub fn sin_damped(v0: f64, va: f64, freq: f64, td: f64, theta: f64) -> Self {
        Waveform::Sin {
            v0,
            va,
            freq,
            td,
            theta,
        }
    }

    /// Evaluate the waveform at a given time.
    pub fn value_at(&self, time: f64) -> f64 {
        match *self {
            Waveform::Pulse {
                v1,
                v2,
                td,
                tr,
                tf,
                pw,
                per,
            } => eval_pulse(v1, v2, td, tr, tf, pw, per, time),
            Waveform::Sin {
                v0,
                va,
                freq,
                td,
                theta,
            } => eval_sin(v0, va, freq, td, theta, time),
        }
    }

    /// Value before any delay has elapsed.
    pub fn initial_value(&self) -> f64 {
        match *self {
            Waveform::Pulse { v1, .. } => v1,
            Waveform::Sin { v0, .. } => v0,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn eval_pulse(v1: f64, v2: f64, td: f64, tr: f64, tf: f64, pw: f64, per: f64, t: f64) -> f64 {
    if t < td {
        return v1;
    }

    let t_rel = if per > 0.0 { (t - td) % per } else { t - td };

    // Zero-length edges never satisfy the strict comparisons, so they act as steps.
    if t_rel < tr {
        v1 + (v2 - v1) * t_rel / tr
    } else if t_rel < tr + pw {
        v2
    } else if t_rel < tr + pw + tf {
        v2 - (v2 - v1) * (t_rel - tr - pw) / tf
    } else {
        v1
    }
}

fn eval_sin(v0: f64, va: f64, freq: f64, td: f64, theta: f64, t: f64) -> f64 {
    if t < td {
        return v0;
    }

    let t_rel = t - td;
    v0 + va * (-t_rel * theta).exp() * (2.0 * PI * freq * t_rel).sin()
}
