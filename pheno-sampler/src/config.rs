//! Sampler Configuration
//!
//! Campaign settings read from the environment, with a startup banner

use std::env;
use std::path::PathBuf;

use pheno_core::TrackerConfig;

/// How trials are scheduled
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Schedule {
    /// One trial after another on the main thread
    Sequential,
    /// Trials spread over the rayon pool, tracker behind a mutex
    Parallel,
}

/// Campaign configuration
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Number of perturbation trials
    pub trials: usize,
    /// Simulation horizon
    pub t_max: f64,
    /// Samples per simulated trajectory
    pub samples: usize,
    /// Points kept in each representative's coarse trajectory
    pub coarse_points: usize,
    /// Base seed; trial `i` uses `seed + i`
    pub seed: u64,
    /// Sequential or parallel trials
    pub schedule: Schedule,
    /// Where the tracker snapshot is written
    pub output: PathBuf,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            trials: 5000,
            t_max: 200.0,
            samples: 2001,
            coarse_points: 100,
            seed: 0,
            schedule: Schedule::Sequential,
            output: PathBuf::from("data/phenotypes.bin"),
        }
    }
}

impl SamplerConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(trials) = env::var("PHENO_TRIALS") {
            if let Ok(n) = trials.parse() {
                config.trials = n;
            }
        }

        if let Ok(points) = env::var("PHENO_COARSE_POINTS") {
            if let Ok(n) = points.parse() {
                config.coarse_points = n;
            }
        }

        if let Ok(seed) = env::var("PHENO_SEED") {
            if let Ok(s) = seed.parse() {
                config.seed = s;
            }
        }

        if let Ok(output) = env::var("PHENO_OUTPUT") {
            if !output.is_empty() {
                config.output = PathBuf::from(output);
            }
        }

        let parallel = env::var("PHENO_PARALLEL")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        if parallel {
            config.schedule = Schedule::Parallel;
            tracing::info!("⚡ Parallel trials ({} rayon threads)", rayon::current_num_threads());
        } else {
            tracing::info!("🖥️ Sequential trials (use PHENO_PARALLEL=1 for rayon)");
        }

        config
    }
}

/// Print startup banner with config info
pub fn print_banner(config: &SamplerConfig, tracker: &TrackerConfig) {
    let schedule = match config.schedule {
        Schedule::Sequential => "seq",
        Schedule::Parallel => "rayon",
    };

    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║          🧬 Pheno Sampler - Phenotype Diversity 🧬        ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  Trials: {:>10}                                      ║", config.trials);
    println!("║  Schedule: {:>8}                                      ║", schedule);
    println!("║  Seed: {:>12}                                      ║", config.seed);
    println!("║  Bins: {:>12}                                      ║", tracker.n_bins);
    println!(
        "║  Reps/phenotype: {:>2}                                      ║",
        tracker.max_reps_per_phenotype
    );
    println!(
        "║  Memory: {:>8.1}GB                                      ║",
        tracker.memory_limit_gb()
    );
    println!("║  Output: {}", config.output.display());
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SamplerConfig::default();
        assert_eq!(config.trials, 5000);
        assert_eq!(config.samples, 2001);
        assert_eq!(config.t_max, 200.0);
        assert_eq!(config.coarse_points, 100);
        assert_eq!(config.schedule, Schedule::Sequential);
        assert_eq!(config.output, PathBuf::from("data/phenotypes.bin"));
    }
}
