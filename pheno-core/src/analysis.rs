//! # Analysis - Troubleshooting Frequency–Complexity Diagrams
//!
//! Helpers for the question "what do the phenotypes at this complexity
//! actually look like?". They only read from a tracker.

use std::collections::HashMap;

use crate::representative::Representative;
use crate::tracker::{ComplexityQuery, PhenotypeTracker, SortKey};

/// Which representatives the troubleshooter pulls up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TroubleshootMode {
    /// Most frequent phenotypes first (tolerance 0.25)
    HighestFrequency,
    /// Rarest phenotypes first (tolerance 0.25)
    LowestFrequency,
    /// Spread across the complexity range (tolerance 0.5)
    MostDiverse,
}

impl std::str::FromStr for TroubleshootMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "highest_freq" | "highest" => Ok(Self::HighestFrequency),
            "lowest_freq" | "lowest" => Ok(Self::LowestFrequency),
            "most_diverse" | "diverse" => Ok(Self::MostDiverse),
            other => Err(format!("unknown troubleshoot mode: {}", other)),
        }
    }
}

/// Representatives around `target` complexity, chosen by `mode`
pub fn troubleshoot(
    tracker: &PhenotypeTracker,
    target: f64,
    mode: TroubleshootMode,
    num_results: usize,
) -> Vec<&Representative> {
    match mode {
        TroubleshootMode::HighestFrequency => tracker.query_by_complexity(
            &ComplexityQuery::around(target)
                .tolerance(0.25)
                .max_results(num_results),
        ),
        TroubleshootMode::LowestFrequency => tracker.query_by_complexity(
            &ComplexityQuery::around(target)
                .tolerance(0.25)
                .ascending(true)
                .max_results(num_results),
        ),
        TroubleshootMode::MostDiverse => {
            let reps = tracker.query_by_complexity(
                &ComplexityQuery::around(target)
                    .tolerance(0.5)
                    .sort_by(SortKey::Complexity)
                    .max_results(num_results * 2),
            );
            spread(reps, num_results)
        }
    }
}

/// Keep `n` items at evenly spaced positions, first and last included
fn spread<T: Copy>(items: Vec<T>, n: usize) -> Vec<T> {
    if items.len() <= n {
        return items;
    }
    if n == 1 {
        return vec![items[0]];
    }
    let last = (items.len() - 1) as f64;
    (0..n)
        .map(|i| items[(last * i as f64 / (n - 1) as f64) as usize])
        .collect()
}

/// One representative per phenotype whose complexity falls in `[lo, hi]`,
/// most frequent (at capture) first
///
/// Sweeps targets from `lo` to `hi` in steps of 0.1 with a tolerance of 0.1, so
/// phenotypes up to 0.1 beyond either end can appear. The latest
/// representative found for a phenotype wins.
pub fn analyze_complexity_range(
    tracker: &PhenotypeTracker,
    lo: f64,
    hi: f64,
) -> Vec<&Representative> {
    const STEP: f64 = 0.1;

    let mut unique: Vec<&Representative> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();

    if hi < lo {
        return unique;
    }
    let steps = ((hi - lo) / STEP + 1e-9).floor() as usize + 1;
    for i in 0..steps {
        let target = lo + STEP * i as f64;
        let reps = tracker.query_by_complexity(
            &ComplexityQuery::around(target).tolerance(STEP).max_results(100),
        );
        for rep in reps {
            match position.get(rep.encoding().as_str()) {
                Some(&at) => unique[at] = rep,
                None => {
                    position.insert(rep.encoding().as_str(), unique.len());
                    unique.push(rep);
                }
            }
        }
    }

    unique.sort_by(|a, b| b.frequency().cmp(&a.frequency()));
    unique
}
