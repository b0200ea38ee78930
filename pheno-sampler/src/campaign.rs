//! Campaign - independent perturbation trials feeding one tracker
//!
//! Each trial draws a genotype from its own seeded RNG, simulates, encodes
//! and scores the trajectory, then records it. Failed simulations are
//! skipped and never reach the tracker.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info};

use pheno_core::{
    coarse_grain, complexity, encode, estimate_period, Encoding, Genotype, PhenotypeTracker,
    RepresentativeSample, Simulator,
};

use crate::config::SamplerConfig;

const PROGRESS_EVERY: usize = 100;

/// One successful trial, ready for the tracker
struct Observation {
    encoding: Encoding,
    complexity: f64,
    sample: RepresentativeSample,
}

/// Summary of a finished campaign
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignReport {
    pub attempted: usize,
    pub successful: usize,
    pub skipped: usize,
    /// Mean complexity over successful trials
    pub mean_complexity: f64,
    /// Population standard deviation of complexity over successful trials
    pub std_complexity: f64,
}

impl CampaignReport {
    fn from_scores(attempted: usize, scores: &[f64]) -> Self {
        let successful = scores.len();
        let (mean, std) = if successful == 0 {
            (0.0, 0.0)
        } else {
            let n = successful as f64;
            let mean = scores.iter().sum::<f64>() / n;
            let var = scores.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
            (mean, var.sqrt())
        };
        Self {
            attempted,
            successful,
            skipped: attempted - successful,
            mean_complexity: mean,
            std_complexity: std,
        }
    }
}

impl fmt::Display for CampaignReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} successful, {} skipped | complexity mean {:.4}, std {:.4}",
            self.successful, self.skipped, self.mean_complexity, self.std_complexity
        )
    }
}

/// Runs trials of one simulator
pub struct Campaign<'a, S: Simulator> {
    simulator: &'a S,
    config: &'a SamplerConfig,
    n_bins: usize,
}

impl<'a, S: Simulator> Campaign<'a, S> {
    pub fn new(simulator: &'a S, config: &'a SamplerConfig, n_bins: usize) -> Self {
        Self {
            simulator,
            config,
            n_bins,
        }
    }

    /// Run every trial on the current thread
    pub fn run(&self, tracker: &mut PhenotypeTracker) -> CampaignReport {
        info!(
            "🧪 {} trials of {} ({} parameters)",
            self.config.trials,
            self.simulator.name(),
            self.simulator.parameter_count()
        );

        let mut scores = Vec::with_capacity(self.config.trials);
        for i in 0..self.config.trials {
            if let Some(obs) = self.trial(i) {
                scores.push(obs.complexity);
                tracker.update_with_sample(obs.encoding, obs.complexity, obs.sample);
            }
            if (i + 1) % PROGRESS_EVERY == 0 {
                info!(
                    "Completed {} trials | successful: {} | skipped: {}",
                    i + 1,
                    scores.len(),
                    i + 1 - scores.len()
                );
            }
        }

        CampaignReport::from_scores(self.config.trials, &scores)
    }

    /// Run trials across the rayon pool
    ///
    /// Trials only share the tracker; each update holds the lock once. The
    /// order of updates is unspecified, so which samples become
    /// representatives can differ from a sequential run with the same seed.
    pub fn run_parallel(&self, tracker: &Mutex<PhenotypeTracker>) -> CampaignReport {
        info!(
            "🧪 {} trials of {} on {} threads",
            self.config.trials,
            self.simulator.name(),
            rayon::current_num_threads()
        );

        let done = AtomicUsize::new(0);
        let scores: Vec<f64> = (0..self.config.trials)
            .into_par_iter()
            .filter_map(|i| {
                let obs = self.trial(i);
                let score = obs.map(|obs| {
                    tracker
                        .lock()
                        .update_with_sample(obs.encoding, obs.complexity, obs.sample);
                    obs.complexity
                });
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                if finished % PROGRESS_EVERY == 0 {
                    info!("Completed {} trials", finished);
                }
                score
            })
            .collect();

        CampaignReport::from_scores(self.config.trials, &scores)
    }

    /// Simulate trial `index`; `None` when it has to be skipped
    fn trial(&self, index: usize) -> Option<Observation> {
        let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(index as u64));
        let genotype = Genotype::random(self.simulator.parameter_count(), &mut rng);
        if genotype.is_wildtype() {
            debug!("Trial {} drew the wildtype genotype", index);
        }
        let parameters = genotype.apply(&self.simulator.base_parameters());

        let trajectory = match self.simulator.simulate(&parameters) {
            Ok(t) => t,
            Err(e) => {
                debug!("Trial {} skipped: {}", index, e);
                return None;
            }
        };

        let encoding = match encode(&trajectory, self.n_bins) {
            Ok(enc) => enc,
            Err(e) => {
                debug!("Trial {} skipped: {}", index, e);
                return None;
            }
        };
        let score = complexity(&encoding);

        let sample = RepresentativeSample::new(
            estimate_period(&trajectory).unwrap_or(0.0),
            genotype,
            coarse_grain(&trajectory, self.config.coarse_points),
        );

        Some(Observation {
            encoding,
            complexity: score,
            sample,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pheno_core::{SimulationFailure, TrackerConfig, Trajectory};

    /// Ramps whose direction flips with the first multiplier; fails when
    /// the second multiplier is the smallest one
    struct Flaky;

    impl Simulator for Flaky {
        fn parameter_count(&self) -> usize {
            2
        }

        fn base_parameters(&self) -> Vec<f64> {
            vec![1.0, 1.0]
        }

        fn simulate(&self, p: &[f64]) -> Result<Trajectory, SimulationFailure> {
            if p[1] < 0.3 {
                return Err(SimulationFailure::Diverged { time: 1.0 });
            }
            let k = p[0];
            Trajectory::from_fn(0.0, 10.0, 101, |t| ((k * t).sin() * 3.0).round())
                .map_err(|e| SimulationFailure::Integration(e.to_string()))
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    fn config(trials: usize) -> SamplerConfig {
        SamplerConfig {
            trials,
            seed: 7,
            coarse_points: 10,
            ..SamplerConfig::default()
        }
    }

    #[test]
    fn test_counts_add_up() {
        let config = config(200);
        let mut tracker = PhenotypeTracker::new(TrackerConfig::default()).unwrap();
        let report = Campaign::new(&Flaky, &config, 20).run(&mut tracker);

        assert_eq!(report.attempted, 200);
        assert_eq!(report.successful + report.skipped, 200);
        // 1 in 8 multipliers is 0.25
        assert!(report.skipped > 0 && report.skipped < 80);
        assert_eq!(tracker.total_samples(), report.successful as u64);
        assert!(report.mean_complexity > 0.0);
    }

    #[test]
    fn test_same_seed_same_run() {
        let config = config(50);
        let mut a = PhenotypeTracker::new(TrackerConfig::default()).unwrap();
        let mut b = PhenotypeTracker::new(TrackerConfig::default()).unwrap();
        let ra = Campaign::new(&Flaky, &config, 20).run(&mut a);
        let rb = Campaign::new(&Flaky, &config, 20).run(&mut b);
        assert_eq!(ra, rb);
        assert_eq!(a.frequencies(), b.frequencies());
    }

    #[test]
    fn test_parallel_matches_sequential_counts() {
        let config = config(300);
        let mut seq = PhenotypeTracker::new(TrackerConfig::default()).unwrap();
        let seq_report = Campaign::new(&Flaky, &config, 20).run(&mut seq);

        let par = Mutex::new(PhenotypeTracker::new(TrackerConfig::default()).unwrap());
        let par_report = Campaign::new(&Flaky, &config, 20).run_parallel(&par);
        let par = par.into_inner();

        assert_eq!(par_report.successful, seq_report.successful);
        assert_eq!(par_report.skipped, seq_report.skipped);
        assert!((par_report.mean_complexity - seq_report.mean_complexity).abs() < 1e-9);
        assert_eq!(par.frequencies(), seq.frequencies());
        assert_eq!(par.complexities(), seq.complexities());
        assert_eq!(par.stored_representatives(), seq.stored_representatives());
    }

    #[test]
    fn test_report_statistics() {
        let report = CampaignReport::from_scores(4, &[1.0, 3.0]);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.mean_complexity, 2.0);
        assert_eq!(report.std_complexity, 1.0);

        let empty = CampaignReport::from_scores(3, &[]);
        assert_eq!(empty.successful, 0);
        assert_eq!(empty.mean_complexity, 0.0);
    }
}
