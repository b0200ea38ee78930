//! # Representatives - Compact Samples of a Phenotype
//!
//! A representative keeps enough of one trial to inspect it after the run:
//! the genotype that produced it and a coarse copy of its trajectory. The
//! store admits representatives per phenotype until a cap is reached and
//! never evicts them afterwards, so the first arrivals are the ones kept.
//!
//! ## Footprint
//!
//! ```text
//! encoding bytes + 8 (complexity) + 8 (period) + 4 (frequency)
//!   + genotype  (4 bytes × parameters)
//!   + coarse    (4 bytes × points × 2)
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::encoding::Encoding;
use crate::genotype::Genotype;
use crate::trajectory::CoarseTrajectory;
use crate::COMPLEXITY_BIN_SIZE;

/// Fixed bytes charged for the scalar fields of a representative
pub const SCALAR_OVERHEAD_BYTES: usize = 8 + 8 + 4;

/// A stored sample of one phenotype; immutable once built
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Representative {
    encoding: Encoding,
    complexity: f64,
    period: f64,
    genotype: Vec<f32>,
    coarse: CoarseTrajectory,
    frequency: u64,
}

impl Representative {
    pub fn new(
        encoding: Encoding,
        complexity: f64,
        period: f64,
        genotype: Vec<f32>,
        coarse: CoarseTrajectory,
        frequency: u64,
    ) -> Self {
        Self {
            encoding,
            complexity,
            period,
            genotype,
            coarse,
            frequency,
        }
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn complexity(&self) -> f64 {
        self.complexity
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn genotype(&self) -> &[f32] {
        &self.genotype
    }

    pub fn coarse(&self) -> &CoarseTrajectory {
        &self.coarse
    }

    /// Phenotype frequency at the moment this sample was captured
    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    /// Estimated bytes held by this representative
    pub fn memory_size(&self) -> usize {
        self.encoding.len()
            + SCALAR_OVERHEAD_BYTES
            + self.genotype.len() * std::mem::size_of::<f32>()
            + self.coarse.nbytes()
    }
}

/// The optional payload of an observation, needed to store a representative
///
/// Either all of period, genotype and coarse trajectory are present, or the
/// observation carries no sample at all.
#[derive(Clone, Debug, PartialEq)]
pub struct RepresentativeSample {
    pub period: f64,
    pub genotype: Vec<f32>,
    pub coarse: CoarseTrajectory,
}

impl RepresentativeSample {
    pub fn new(period: f64, genotype: impl Into<Vec<f32>>, coarse: CoarseTrajectory) -> Self {
        Self {
            period,
            genotype: genotype.into(),
            coarse,
        }
    }

    /// Assemble a sample from optional parts; `None` unless all three are given
    pub fn from_parts(
        period: Option<f64>,
        genotype: Option<Genotype>,
        coarse: Option<CoarseTrajectory>,
    ) -> Option<Self> {
        match (period, genotype, coarse) {
            (Some(period), Some(genotype), Some(coarse)) => {
                Some(Self::new(period, genotype, coarse))
            }
            _ => None,
        }
    }
}

/// Index of the complexity bin containing `complexity`
///
/// Halfway values round to the even bin, so 0.25 falls in bin 0 and 0.75 in
/// bin 2 (of width 0.5).
pub fn bin_index(complexity: f64, bin_size: f64) -> i64 {
    (complexity / bin_size).round_ties_even() as i64
}

/// Centre value of the bin containing `complexity`
pub fn complexity_bin(complexity: f64, bin_size: f64) -> f64 {
    bin_index(complexity, bin_size) as f64 * bin_size
}

/// Why a representative was not admitted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    BelowMinFrequency,
    PhenotypeFull,
    MemoryExceeded,
}

/// Per-phenotype representative lists plus the complexity-bin index over them
///
/// All mutation goes through [`RepresentativeStore::admit`], which keeps
/// the index and the memory counter in step with the lists.
#[derive(Clone, Debug, Default)]
pub(crate) struct RepresentativeStore {
    by_phenotype: HashMap<Encoding, Vec<Representative>>,
    complexity_index: BTreeMap<i64, BTreeSet<Encoding>>,
    memory_usage: usize,
    stored_count: usize,
    overflow_count: u64,
}

impl RepresentativeStore {
    /// Admission policy for one more representative of `phenotype`
    ///
    /// A memory-limit rejection is counted as an overflow.
    pub fn check(
        &mut self,
        phenotype: &Encoding,
        frequency: u64,
        min_frequency: u64,
        max_per_phenotype: usize,
        memory_limit_bytes: usize,
    ) -> Admission {
        if frequency < min_frequency {
            return Admission::BelowMinFrequency;
        }
        if self.count_for(phenotype) >= max_per_phenotype {
            return Admission::PhenotypeFull;
        }
        if self.memory_usage > memory_limit_bytes {
            self.overflow_count += 1;
            return Admission::MemoryExceeded;
        }
        Admission::Accepted
    }

    /// Append a representative and index its phenotype
    pub fn admit(&mut self, representative: Representative) {
        let bin = bin_index(representative.complexity(), COMPLEXITY_BIN_SIZE);
        self.complexity_index
            .entry(bin)
            .or_default()
            .insert(representative.encoding().clone());
        self.memory_usage += representative.memory_size();
        self.stored_count += 1;
        self.by_phenotype
            .entry(representative.encoding().clone())
            .or_default()
            .push(representative);
    }

    /// Rebuild a store from loaded lists, recomputing every derived value
    ///
    /// `complexity_of` supplies the recorded complexity used for indexing.
    pub fn rebuild(
        lists: impl IntoIterator<Item = (Encoding, Vec<Representative>)>,
        complexity_of: impl Fn(&Encoding) -> Option<f64>,
        overflow_count: u64,
    ) -> Self {
        let mut store = Self {
            overflow_count,
            ..Self::default()
        };
        for (phenotype, reps) in lists {
            if reps.is_empty() {
                continue;
            }
            if let Some(c) = complexity_of(&phenotype) {
                store
                    .complexity_index
                    .entry(bin_index(c, COMPLEXITY_BIN_SIZE))
                    .or_default()
                    .insert(phenotype.clone());
            }
            store.memory_usage += reps.iter().map(Representative::memory_size).sum::<usize>();
            store.stored_count += reps.len();
            store.by_phenotype.insert(phenotype, reps);
        }
        store
    }

    pub fn count_for(&self, phenotype: &Encoding) -> usize {
        self.by_phenotype.get(phenotype).map_or(0, Vec::len)
    }

    pub fn for_phenotype(&self, phenotype: &Encoding) -> &[Representative] {
        self.by_phenotype
            .get(phenotype)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Phenotypes indexed under bins `first..=last`, bins ascending and
    /// phenotypes sorted within a bin; empty when `first > last`
    pub fn phenotypes_in_bins(&self, first: i64, last: i64) -> impl Iterator<Item = &Encoding> {
        (first <= last)
            .then(|| self.complexity_index.range(first..=last))
            .into_iter()
            .flatten()
            .flat_map(|(_, set)| set.iter())
    }

    pub fn lists(&self) -> impl Iterator<Item = (&Encoding, &Vec<Representative>)> {
        self.by_phenotype.iter()
    }

    pub fn index(&self) -> impl Iterator<Item = (i64, &BTreeSet<Encoding>)> {
        self.complexity_index.iter().map(|(k, v)| (*k, v))
    }

    pub fn memory_usage(&self) -> usize {
        self.memory_usage
    }

    pub fn stored_count(&self) -> usize {
        self.stored_count
    }

    pub fn overflow_count(&self) -> u64 {
        self.overflow_count
    }

    pub fn phenotype_count(&self) -> usize {
        self.by_phenotype.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rep(encoding: &str, complexity: f64) -> Representative {
        Representative::new(
            encoding.parse().unwrap(),
            complexity,
            30.0,
            vec![1.0; 10],
            CoarseTrajectory::new(vec![0.0; 5], vec![1.0; 5]),
            2,
        )
    }

    #[test]
    fn test_memory_size() {
        // 4 + 20 + 40 + 40
        assert_eq!(rep("0101", 1.0).memory_size(), 104);
    }

    #[test]
    fn test_bins_round_half_to_even() {
        assert_eq!(complexity_bin(1.2, 0.5), 1.0);
        assert_eq!(complexity_bin(1.3, 0.5), 1.5);
        assert_eq!(complexity_bin(0.25, 0.5), 0.0);
        assert_eq!(complexity_bin(0.75, 0.5), 1.0);
        assert_eq!(complexity_bin(5.32, 0.5), 5.5);
        assert_eq!(bin_index(-0.8, 0.5), -2);
    }

    #[test]
    fn test_admit_tracks_memory_and_index() {
        let mut store = RepresentativeStore::default();
        store.admit(rep("0101", 1.1));
        store.admit(rep("0101", 1.1));
        store.admit(rep("0011", 2.0));

        assert_eq!(store.stored_count(), 3);
        assert_eq!(store.memory_usage(), 3 * 104);
        assert_eq!(store.count_for(&"0101".parse().unwrap()), 2);
        let bin_one: Vec<_> = store.phenotypes_in_bins(2, 2).collect();
        assert_eq!(bin_one.len(), 1);
        assert_eq!(bin_one[0].as_str(), "0101");

        let all: Vec<&str> = store
            .phenotypes_in_bins(i64::MIN, i64::MAX)
            .map(|e| e.as_str())
            .collect();
        assert_eq!(all, vec!["0101", "0011"]);
        assert_eq!(store.phenotypes_in_bins(5, 1).count(), 0);
    }

    #[test]
    fn test_check_order() {
        let mut store = RepresentativeStore::default();
        let e: Encoding = "0101".parse().unwrap();
        assert_eq!(store.check(&e, 1, 2, 1, 1_000), Admission::BelowMinFrequency);
        assert_eq!(store.check(&e, 2, 2, 1, 1_000), Admission::Accepted);
        store.admit(rep("0101", 1.0));
        assert_eq!(store.check(&e, 3, 2, 1, 1_000), Admission::PhenotypeFull);
        assert_eq!(store.overflow_count(), 0);

        let other: Encoding = "0011".parse().unwrap();
        assert_eq!(store.check(&other, 3, 2, 1, 10), Admission::MemoryExceeded);
        assert_eq!(store.overflow_count(), 1);
    }

    #[test]
    fn test_partial_sample_is_none() {
        let coarse = CoarseTrajectory::default();
        assert!(RepresentativeSample::from_parts(Some(1.0), None, Some(coarse.clone())).is_none());
        let partial = RepresentativeSample::from_parts(None, Some(Genotype::wildtype(2)), None);
        assert!(partial.is_none());
        assert!(
            RepresentativeSample::from_parts(Some(1.0), Some(Genotype::wildtype(2)), Some(coarse))
                .is_some()
        );
    }
}
