//! # Genotype - Sampled Parameter Multipliers
//!
//! A genotype is the vector of multipliers applied to a model's kinetic
//! parameters for one trial. Multipliers are drawn from a fixed ladder
//! around the wildtype value of 1.0:
//!
//! ```text
//! 0.25  0.50  0.75 │1.00│ 1.25  1.50  1.75  2.00
//!                  wildtype
//! ```
//!
//! Genotypes are stored as `f32`; the precision loss is irrelevant for the
//! ladder values and halves a representative's footprint.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Multipliers a perturbed parameter may take
pub const MULTIPLIERS: [f32; 8] = [0.25, 0.50, 0.75, 1.00, 1.25, 1.50, 1.75, 2.00];

/// Parameter multipliers for one trial
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genotype {
    multipliers: Vec<f32>,
}

impl Genotype {
    /// Genotype with an explicit multiplier per parameter
    pub fn new(multipliers: Vec<f32>) -> Self {
        Self { multipliers }
    }

    /// Draw every multiplier uniformly from [`MULTIPLIERS`]
    pub fn random<R: Rng + ?Sized>(parameter_count: usize, rng: &mut R) -> Self {
        let multipliers = (0..parameter_count)
            .map(|_| *MULTIPLIERS.choose(rng).unwrap_or(&1.0))
            .collect();
        Self { multipliers }
    }

    /// Unperturbed genotype (all multipliers 1.0)
    pub fn wildtype(parameter_count: usize) -> Self {
        Self {
            multipliers: vec![1.0; parameter_count],
        }
    }

    pub fn multipliers(&self) -> &[f32] {
        &self.multipliers
    }

    pub fn len(&self) -> usize {
        self.multipliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.multipliers.is_empty()
    }

    pub fn is_wildtype(&self) -> bool {
        self.multipliers.iter().all(|&m| m == 1.0)
    }

    /// Scale base parameters element-wise
    ///
    /// Parameters beyond the genotype's length are left untouched.
    pub fn apply(&self, base: &[f64]) -> Vec<f64> {
        base.iter()
            .enumerate()
            .map(|(i, &p)| match self.multipliers.get(i) {
                Some(&m) => p * m as f64,
                None => p,
            })
            .collect()
    }
}

impl From<Genotype> for Vec<f32> {
    fn from(genotype: Genotype) -> Self {
        genotype.multipliers
    }
}
