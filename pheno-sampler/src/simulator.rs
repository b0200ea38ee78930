//! Damped Oscillator - a closed-form stand-in for a reaction network
//!
//! The signal is the two-exponential decay model plus a sinusoid whose
//! envelope grows or shrinks with the balance of two rate constants:
//!
//! ```text
//! y(t) = 0.5 * (exp(-k1 t) + exp(-k2 t)) + A * exp((g - d) t) * sin(w t)
//! ```
//!
//! Parameters, in order: `k1, k2, w, A, g, d`.

use pheno_core::{SimulationFailure, Simulator, Trajectory};

const PARAMETER_NAMES: [&str; 6] = ["k1", "k2", "omega", "amplitude", "gain", "damping"];

/// Closed-form oscillator sampled on a fixed time grid
#[derive(Debug, Clone)]
pub struct DampedOscillator {
    base: [f64; 6],
    t_max: f64,
    samples: usize,
    /// Largest |y| accepted before the trajectory counts as diverged
    bound: f64,
}

impl DampedOscillator {
    pub fn new(t_max: f64, samples: usize) -> Self {
        Self {
            // Wildtype: slow and fast decay, period 25, envelope decaying at 0.004
            base: [0.02, 0.1, 2.0 * std::f64::consts::PI / 25.0, 0.5, 0.006, 0.01],
            t_max,
            samples,
            bound: 10.0,
        }
    }

    pub fn parameter_names(&self) -> &'static [&'static str] {
        &PARAMETER_NAMES
    }

    fn value(p: &[f64], t: f64) -> f64 {
        let decay = 0.5 * ((-p[0] * t).exp() + (-p[1] * t).exp());
        let envelope = p[3] * ((p[4] - p[5]) * t).exp();
        decay + envelope * (p[2] * t).sin()
    }
}

impl Simulator for DampedOscillator {
    fn parameter_count(&self) -> usize {
        self.base.len()
    }

    fn base_parameters(&self) -> Vec<f64> {
        self.base.to_vec()
    }

    fn simulate(&self, parameters: &[f64]) -> Result<Trajectory, SimulationFailure> {
        if parameters.len() != self.base.len() {
            return Err(SimulationFailure::Integration(format!(
                "expected {} parameters, got {}",
                self.base.len(),
                parameters.len()
            )));
        }

        let last = self.samples.saturating_sub(1).max(1) as f64;
        let mut times = Vec::with_capacity(self.samples);
        let mut values = Vec::with_capacity(self.samples);
        for i in 0..self.samples {
            let t = self.t_max * i as f64 / last;
            let y = Self::value(parameters, t);
            if !y.is_finite() || y.abs() > self.bound {
                return Err(SimulationFailure::Diverged { time: t });
            }
            times.push(t);
            values.push(y);
        }

        Trajectory::new(times, values).map_err(|e| SimulationFailure::Integration(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "damped-oscillator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pheno_core::estimate_period;

    #[test]
    fn test_wildtype_trajectory() {
        let sim = DampedOscillator::new(200.0, 2001);
        let traj = sim.simulate(&sim.base_parameters()).unwrap();
        assert_eq!(traj.len(), 2001);
        assert_eq!(traj.end(), 200.0);
        assert!((traj.values()[0] - 1.0).abs() < 1e-12);
        assert!(!traj.has_non_finite());
    }

    #[test]
    fn test_wildtype_period() {
        let sim = DampedOscillator::new(200.0, 2001);
        let traj = sim.simulate(&sim.base_parameters()).unwrap();
        let period = estimate_period(&traj).unwrap();
        assert!((period - 25.0).abs() < 2.0, "period {}", period);
    }

    #[test]
    fn test_wrong_parameter_count() {
        let sim = DampedOscillator::new(200.0, 2001);
        let result = sim.simulate(&[1.0, 2.0]);
        assert!(matches!(result, Err(SimulationFailure::Integration(_))));
    }

    #[test]
    fn test_runaway_envelope_diverges() {
        let sim = DampedOscillator::new(200.0, 2001);
        let mut p = sim.base_parameters();
        p[4] = 0.1; // envelope grows as exp(0.09 t)
        match sim.simulate(&p) {
            Err(SimulationFailure::Diverged { time }) => assert!(time > 0.0 && time < 200.0),
            other => panic!("expected divergence, got {:?}", other),
        }
    }

    #[test]
    fn test_nan_parameter_diverges_at_start() {
        let sim = DampedOscillator::new(200.0, 2001);
        let mut p = sim.base_parameters();
        p[0] = f64::NAN;
        assert_eq!(
            sim.simulate(&p),
            Err(SimulationFailure::Diverged { time: 0.0 })
        );
    }

    #[test]
    fn test_parameter_names_match_count() {
        let sim = DampedOscillator::new(10.0, 11);
        assert_eq!(sim.parameter_names().len(), sim.parameter_count());
    }
}
