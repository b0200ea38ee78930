//! # Phenotype Tracker - Frequencies, Complexities and Representatives
//!
//! One tracker accumulates a whole sampling run. Every observation bumps a
//! phenotype's frequency; the first observation fixes its complexity; and
//! observations that carry a sample may store a representative, subject to
//! the admission policy:
//!
//! 1. the phenotype has been seen at least `min_frequency_for_storage` times
//! 2. it holds fewer than `max_reps_per_phenotype` representatives
//! 3. stored representatives do not exceed the memory limit
//!
//! Representatives are indexed by complexity bin (width 0.5) so they can be
//! pulled up by complexity when reading a frequency–complexity diagram.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::encoding::Encoding;
use crate::error::PhenoResult;
use crate::representative::{
    bin_index, Admission, Representative, RepresentativeSample, RepresentativeStore,
};
use crate::COMPLEXITY_BIN_SIZE;

/// Ordering key for complexity queries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    /// Total observed frequency of the representative's phenotype
    Frequency,
    /// Recorded complexity of the representative's phenotype
    Complexity,
}

/// Parameters of a complexity range query
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComplexityQuery {
    pub target: f64,
    pub tolerance: f64,
    pub sort_by: SortKey,
    pub ascending: bool,
    pub max_results: usize,
}

impl ComplexityQuery {
    /// Highest-frequency representatives within ±0.5 of `target`, at most 9
    pub fn around(target: f64) -> Self {
        Self {
            target,
            tolerance: 0.5,
            sort_by: SortKey::Frequency,
            ascending: false,
            max_results: 9,
        }
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn sort_by(mut self, key: SortKey) -> Self {
        self.sort_by = key;
        self
    }

    pub fn ascending(mut self, ascending: bool) -> Self {
        self.ascending = ascending;
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

/// Memory and sampling statistics
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub current_bytes: usize,
    pub limit_bytes: usize,
    pub usage_percent: f64,
    pub stored_representatives: usize,
    pub phenotypes_with_representatives: usize,
    pub total_samples: u64,
    pub overflow_count: u64,
}

impl MemoryStats {
    pub fn current_mb(&self) -> f64 {
        self.current_bytes as f64 / (1024.0 * 1024.0)
    }

    pub fn limit_mb(&self) -> f64 {
        self.limit_bytes as f64 / (1024.0 * 1024.0)
    }
}

impl fmt::Display for MemoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}/{:.1} MB ({:.2}%), {} representatives over {} phenotypes, {} samples, {} overflows",
            self.current_mb(),
            self.limit_mb(),
            self.usage_percent,
            self.stored_representatives,
            self.phenotypes_with_representatives,
            self.total_samples,
            self.overflow_count
        )
    }
}

/// Registry of observed phenotypes for one sampling run
#[derive(Clone, Debug)]
pub struct PhenotypeTracker {
    config: TrackerConfig,
    frequencies: HashMap<Encoding, u64>,
    complexities: HashMap<Encoding, f64>,
    store: RepresentativeStore,
    total_samples: u64,
}

impl PhenotypeTracker {
    /// Create an empty tracker; the configuration is fixed from here on
    pub fn new(config: TrackerConfig) -> PhenoResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            frequencies: HashMap::new(),
            complexities: HashMap::new(),
            store: RepresentativeStore::default(),
            total_samples: 0,
        })
    }

    /// Reassemble a tracker from persisted parts; the store is rebuilt from
    /// the representative lists so derived counters cannot drift
    pub(crate) fn from_parts(
        config: TrackerConfig,
        frequencies: HashMap<Encoding, u64>,
        complexities: HashMap<Encoding, f64>,
        representatives: impl IntoIterator<Item = (Encoding, Vec<Representative>)>,
        total_samples: u64,
        overflow_count: u64,
    ) -> Self {
        let store = RepresentativeStore::rebuild(
            representatives,
            |e| complexities.get(e).copied(),
            overflow_count,
        );
        Self {
            config,
            frequencies,
            complexities,
            store,
            total_samples,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Record one observation without a representative sample
    pub fn update(&mut self, encoding: Encoding, complexity: f64) {
        self.observe(encoding, complexity, None);
    }

    /// Record one observation and offer its sample for storage
    ///
    /// Returns whether a representative was stored.
    pub fn update_with_sample(
        &mut self,
        encoding: Encoding,
        complexity: f64,
        sample: RepresentativeSample,
    ) -> bool {
        self.observe(encoding, complexity, Some(sample))
    }

    fn observe(
        &mut self,
        encoding: Encoding,
        complexity: f64,
        sample: Option<RepresentativeSample>,
    ) -> bool {
        if encoding.len() != self.config.n_bins {
            warn!(
                "Encoding {} has {} bins, tracker is configured for {}",
                encoding,
                encoding.len(),
                self.config.n_bins
            );
        }
        self.total_samples += 1;

        let frequency = {
            let count = self.frequencies.entry(encoding.clone()).or_insert(0);
            *count += 1;
            *count
        };

        let recorded = *self
            .complexities
            .entry(encoding.clone())
            .or_insert(complexity);
        if recorded != complexity {
            warn!(
                "Complexity mismatch for {}: recorded {} kept, got {}",
                encoding, recorded, complexity
            );
        }

        let Some(sample) = sample else {
            return false;
        };

        let admission = self.store.check(
            &encoding,
            frequency,
            self.config.min_frequency_for_storage,
            self.config.max_reps_per_phenotype,
            self.config.memory_limit_bytes,
        );
        match admission {
            Admission::Accepted => {
                self.store.admit(Representative::new(
                    encoding,
                    recorded,
                    sample.period,
                    sample.genotype,
                    sample.coarse,
                    frequency,
                ));
                true
            }
            Admission::MemoryExceeded => {
                if self.store.overflow_count() == 1 {
                    warn!(
                        "Representative memory limit reached ({} bytes); further samples are dropped",
                        self.config.memory_limit_bytes
                    );
                } else {
                    debug!("Memory overflow #{} for {}", self.store.overflow_count(), encoding);
                }
                false
            }
            Admission::BelowMinFrequency | Admission::PhenotypeFull => false,
        }
    }

    /// Representatives of phenotypes whose complexity lies in
    /// `[target - tolerance, target + tolerance]`
    ///
    /// Candidates are gathered bin by bin in ascending order, phenotypes in
    /// sorted order within a bin and representatives in arrival order; the
    /// stable sort keeps that order among equal keys.
    pub fn query_by_complexity(&self, query: &ComplexityQuery) -> Vec<&Representative> {
        let min_c = query.target - query.tolerance;
        let max_c = query.target + query.tolerance;
        let first = bin_index(min_c, COMPLEXITY_BIN_SIZE);
        let last = bin_index(max_c, COMPLEXITY_BIN_SIZE);

        let mut candidates: Vec<(&Representative, u64, f64)> = Vec::new();
        for phenotype in self.store.phenotypes_in_bins(first, last) {
            let Some(&complexity) = self.complexities.get(phenotype) else {
                continue;
            };
            if complexity < min_c || complexity > max_c {
                continue;
            }
            let frequency = self.frequency(phenotype);
            candidates.extend(
                self.store
                    .for_phenotype(phenotype)
                    .iter()
                    .map(|rep| (rep, frequency, complexity)),
            );
        }

        match (query.sort_by, query.ascending) {
            (SortKey::Frequency, true) => candidates.sort_by(|a, b| a.1.cmp(&b.1)),
            (SortKey::Frequency, false) => candidates.sort_by(|a, b| b.1.cmp(&a.1)),
            (SortKey::Complexity, true) => candidates.sort_by(|a, b| a.2.total_cmp(&b.2)),
            (SortKey::Complexity, false) => candidates.sort_by(|a, b| b.2.total_cmp(&a.2)),
        }

        candidates
            .into_iter()
            .take(query.max_results)
            .map(|(rep, _, _)| rep)
            .collect()
    }

    /// Stored representatives of one phenotype, in arrival order
    pub fn query_by_phenotype(&self, encoding: &Encoding) -> &[Representative] {
        self.store.for_phenotype(encoding)
    }

    /// Summed frequency per complexity bin, ascending by bin
    ///
    /// Phenotypes seen fewer than `min_frequency_for_storage` times are left
    /// out.
    pub fn complexity_distribution(&self, bin_size: f64) -> Vec<(f64, u64)> {
        let mut distribution: BTreeMap<i64, u64> = BTreeMap::new();
        for (phenotype, &complexity) in &self.complexities {
            let frequency = self.frequency(phenotype);
            if frequency >= self.config.min_frequency_for_storage {
                *distribution.entry(bin_index(complexity, bin_size)).or_insert(0) += frequency;
            }
        }
        distribution
            .into_iter()
            .map(|(bin, frequency)| (bin as f64 * bin_size, frequency))
            .collect()
    }

    pub fn memory_stats(&self) -> MemoryStats {
        let current = self.store.memory_usage();
        let limit = self.config.memory_limit_bytes;
        MemoryStats {
            current_bytes: current,
            limit_bytes: limit,
            usage_percent: current as f64 / limit as f64 * 100.0,
            stored_representatives: self.store.stored_count(),
            phenotypes_with_representatives: self.store.phenotype_count(),
            total_samples: self.total_samples,
            overflow_count: self.store.overflow_count(),
        }
    }

    /// Observations of `encoding` so far (0 if never seen)
    pub fn frequency(&self, encoding: &Encoding) -> u64 {
        self.frequencies.get(encoding).copied().unwrap_or(0)
    }

    /// Complexity recorded at the first observation of `encoding`
    pub fn complexity(&self, encoding: &Encoding) -> Option<f64> {
        self.complexities.get(encoding).copied()
    }

    pub fn frequencies(&self) -> &HashMap<Encoding, u64> {
        &self.frequencies
    }

    pub fn complexities(&self) -> &HashMap<Encoding, f64> {
        &self.complexities
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    pub fn unique_phenotypes(&self) -> usize {
        self.frequencies.len()
    }

    pub fn memory_usage(&self) -> usize {
        self.store.memory_usage()
    }

    pub fn stored_representatives(&self) -> usize {
        self.store.stored_count()
    }

    /// All stored representatives grouped by phenotype (unordered)
    pub fn representatives(&self) -> impl Iterator<Item = (&Encoding, &[Representative])> {
        self.store.lists().map(|(e, reps)| (e, reps.as_slice()))
    }

    /// Complexity index as `(bin value, phenotypes)` pairs, ascending by bin
    pub fn complexity_index(&self) -> Vec<(f64, Vec<&Encoding>)> {
        self.store
            .index()
            .map(|(bin, set)| (bin as f64 * COMPLEXITY_BIN_SIZE, set.iter().collect()))
            .collect()
    }

    /// Phenotypes by descending frequency; ties in encoding order
    pub fn rank_frequency(&self) -> Vec<(&Encoding, u64)> {
        let mut ranked: Vec<(&Encoding, u64)> =
            self.frequencies.iter().map(|(e, &f)| (e, f)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    /// 1-based position of `encoding` in [`rank_frequency`](Self::rank_frequency)
    pub fn rank_of(&self, encoding: &Encoding) -> Option<usize> {
        self.rank_frequency()
            .iter()
            .position(|(e, _)| *e == encoding)
            .map(|i| i + 1)
    }

    /// The `n_track` most frequent phenotypes
    pub fn top_phenotypes(&self) -> Vec<(&Encoding, u64)> {
        let mut ranked = self.rank_frequency();
        ranked.truncate(self.config.n_track);
        ranked
    }
}
