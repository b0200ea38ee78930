//! # Configuration - Tracker Parameters
//!
//! Fixed for the lifetime of a tracker; persisted alongside its state so a
//! restored tracker keeps the same admission policy.

use serde::{Deserialize, Serialize};

use crate::error::{PhenoError, PhenoResult};
use crate::DEFAULT_BINS;

const GIB: f64 = (1u64 << 30) as f64;

/// Tracker configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Number of top phenotypes reported in summaries
    pub n_track: usize,

    /// Encoding length; fixed for the whole run
    pub n_bins: usize,

    /// Representatives kept per phenotype (first arrivals win)
    pub max_reps_per_phenotype: usize,

    /// A phenotype must be seen this often before representatives are kept
    pub min_frequency_for_storage: u64,

    /// Admission stops once stored representatives exceed this many bytes
    pub memory_limit_bytes: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            n_track: 5,
            n_bins: DEFAULT_BINS,
            max_reps_per_phenotype: 9,
            min_frequency_for_storage: 2,
            memory_limit_bytes: 10 * (1usize << 30),
        }
    }
}

impl TrackerConfig {
    /// Memory limit given in GiB
    pub fn with_memory_limit_gb(mut self, gb: f64) -> Self {
        self.memory_limit_bytes = (gb * GIB) as usize;
        self
    }

    pub fn memory_limit_gb(&self) -> f64 {
        self.memory_limit_bytes as f64 / GIB
    }

    /// Reject configurations no tracker can run with
    pub fn validate(&self) -> PhenoResult<()> {
        if self.n_bins == 0 {
            return Err(PhenoError::config("n_bins must be at least 1"));
        }
        if self.max_reps_per_phenotype == 0 {
            return Err(PhenoError::config("max_reps_per_phenotype must be at least 1"));
        }
        if self.memory_limit_bytes == 0 {
            return Err(PhenoError::config("memory_limit_bytes must be positive"));
        }
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load(path: &str) -> PhenoResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &str) -> PhenoResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create config from environment variables
    ///
    /// Reads:
    /// - PHENO_BINS: Encoding length (default: 40)
    /// - PHENO_MAX_REPS: Representatives per phenotype (default: 9)
    /// - PHENO_MIN_FREQ: Frequency needed before storing (default: 2)
    /// - PHENO_MEMORY_LIMIT_GB: Representative memory budget (default: 10)
    /// - PHENO_TRACK: Top phenotypes reported (default: 5)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse("PHENO_BINS") {
            config.n_bins = v;
        }
        if let Some(v) = env_parse("PHENO_MAX_REPS") {
            config.max_reps_per_phenotype = v;
        }
        if let Some(v) = env_parse("PHENO_MIN_FREQ") {
            config.min_frequency_for_storage = v;
        }
        if let Some(gb) = env_parse::<f64>("PHENO_MEMORY_LIMIT_GB") {
            config = config.with_memory_limit_gb(gb);
        }
        if let Some(v) = env_parse("PHENO_TRACK") {
            config.n_track = v;
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.n_bins, 40);
        assert_eq!(config.max_reps_per_phenotype, 9);
        assert_eq!(config.min_frequency_for_storage, 2);
        assert_eq!(config.memory_limit_gb(), 10.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_bins() {
        let config = TrackerConfig {
            n_bins: 0,
            ..TrackerConfig::default()
        };
        assert!(matches!(config.validate(), Err(PhenoError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        let path = path.to_str().unwrap();

        let config = TrackerConfig::default().with_memory_limit_gb(0.5);
        config.save(path).unwrap();
        assert_eq!(TrackerConfig::load(path).unwrap(), config);
    }
}
