//! # Pheno Core
//!
//! Phenotype diversity analysis for perturbed biochemical oscillators.
//!
//! A sampling run perturbs a model's kinetic parameters many times and asks
//! what shapes the resulting trajectories take. This crate provides the
//! pieces of that pipeline that do not depend on a particular simulator:
//! - **Trajectory**: a simulated time course and its coarse copy
//! - **Encoding**: the up/down shape string that names a phenotype
//! - **Complexity**: a Lempel-Ziv score of how irregular a shape is
//! - **Tracker**: phenotype frequencies, complexities and stored
//!   representatives, with range queries and snapshots
//!
//! ## Pipeline
//!
//! ```text
//! genotype ──▶ Simulator ──▶ Trajectory ──▶ encode ──▶ complexity
//!                                 │                        │
//!                                 └── coarse, period ──────┴──▶ PhenotypeTracker
//! ```

pub mod analysis;
pub mod complexity;
pub mod config;
pub mod encoding;
pub mod error;
pub mod genotype;
pub mod persistence;
pub mod representative;
pub mod tracker;
pub mod traits;
pub mod trajectory;

// Re-export main types at crate root
pub use analysis::{analyze_complexity_range, troubleshoot, TroubleshootMode};
pub use complexity::{complexity, normalized_complexity};
pub use config::TrackerConfig;
pub use encoding::{encode, Encoding};
pub use error::{PhenoError, PhenoResult};
pub use genotype::Genotype;
pub use persistence::TrackerSnapshot;
pub use representative::{Representative, RepresentativeSample};
pub use tracker::{ComplexityQuery, MemoryStats, PhenotypeTracker, SortKey};
pub use traits::{SimulationFailure, Simulator};
pub use trajectory::{coarse_grain, estimate_period, CoarseTrajectory, Trajectory};

/// Current version of the tracker snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Default encoding length (time bins per trajectory)
pub const DEFAULT_BINS: usize = 40;

/// Width of the complexity bins used for indexing and range queries
pub const COMPLEXITY_BIN_SIZE: f64 = 0.5;
