//! Analysis configuration.

use tinyspice_core::StampOptions;

/// Slack added to the DC sweep end value so accumulated step rounding
/// still includes the last point.
pub const DC_SWEEP_EPSILON: f64 = 1e-4;

/// Upper bound on the points a single sweep or transient run may produce.
pub const MAX_POINTS: usize = 10_000_000;

/// Convergence settings for the nonlinear iteration.
///
/// A component has converged when `|new - old| <= max(abs_tol, rel_tol * |old|)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonConfig {
    /// Absolute tolerance (V or A).
    pub abs_tol: f64,
    /// Relative tolerance.
    pub rel_tol: f64,
    /// Iterations before giving up with a convergence error.
    pub max_iterations: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            abs_tol: 1e-6,
            rel_tol: 1e-6,
            max_iterations: 100,
        }
    }
}

impl NewtonConfig {
    pub fn with_abs_tol(mut self, tol: f64) -> Self {
        self.abs_tol = tol;
        self
    }

    pub fn with_rel_tol(mut self, tol: f64) -> Self {
        self.rel_tol = tol;
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }
}

/// Settings shared by all analysis drivers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// Nonlinear iteration settings.
    pub newton: NewtonConfig,
    /// Device stamping options (diode model rate).
    pub stamp: StampOptions,
    /// End-value slack for DC sweeps.
    pub dc_sweep_epsilon: f64,
    /// Largest number of sweep or time points a run may produce.
    pub max_points: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            newton: NewtonConfig::default(),
            stamp: StampOptions::default(),
            dc_sweep_epsilon: DC_SWEEP_EPSILON,
            max_points: MAX_POINTS,
        }
    }
}

impl AnalysisConfig {
    pub fn with_newton(mut self, newton: NewtonConfig) -> Self {
        self.newton = newton;
        self
    }

    pub fn with_stamp_options(mut self, stamp: StampOptions) -> Self {
        self.stamp = stamp;
        self
    }

    pub fn with_dc_sweep_epsilon(mut self, epsilon: f64) -> Self {
        self.dc_sweep_epsilon = epsilon;
        self
    }

    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinyspice_core::DIODE_EXP_RATE;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();

        assert_eq!(config.dc_sweep_epsilon, DC_SWEEP_EPSILON);
        assert_eq!(config.stamp.diode_rate, DIODE_EXP_RATE);
        assert_eq!(config.newton.max_iterations, 100);
        assert_eq!(config.max_points, MAX_POINTS);
    }

    #[test]
    fn test_builders() {
        let config = AnalysisConfig::default()
            .with_newton(NewtonConfig::default().with_max_iterations(7).with_abs_tol(1e-9))
            .with_dc_sweep_epsilon(0.0)
            .with_max_points(50);

        assert_eq!(config.newton.max_iterations, 7);
        assert_eq!(config.newton.abs_tol, 1e-9);
        assert_eq!(config.dc_sweep_epsilon, 0.0);
        assert_eq!(config.max_points, 50);
    }
}
