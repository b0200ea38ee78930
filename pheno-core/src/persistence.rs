//! Snapshot persistence for the phenotype tracker
//!
//! Snapshots are written with bincode; a path ending in `.json` switches to
//! serde_json for inspection by hand. On restore the derived values (memory
//! usage, stored count, complexity index) are recomputed from the loaded
//! representatives, never taken from the file.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::TrackerConfig;
use crate::encoding::Encoding;
use crate::error::{PhenoError, PhenoResult};
use crate::representative::Representative;
use crate::tracker::{MemoryStats, PhenotypeTracker};
use crate::SNAPSHOT_VERSION;

/// On-disk layout of a tracker
#[derive(Serialize, Deserialize)]
pub struct TrackerSnapshot {
    /// Format version (for future migrations)
    pub version: u32,

    pub representatives: BTreeMap<Encoding, Vec<Representative>>,
    pub complexities: BTreeMap<Encoding, f64>,
    pub frequencies: BTreeMap<Encoding, u64>,

    /// `(bin value, phenotypes)`; informational, rebuilt on restore
    pub complexity_index: Vec<(f64, Vec<Encoding>)>,

    pub config: TrackerConfig,

    /// Statistics at save time; informational, recomputed on restore
    pub stats: MemoryStats,
}

/// Encoding used for a snapshot file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotFormat {
    Bincode,
    Json,
}

impl SnapshotFormat {
    /// `.json` files are JSON, everything else bincode
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Bincode,
        }
    }
}

impl TrackerSnapshot {
    pub fn capture(tracker: &PhenotypeTracker) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            representatives: tracker
                .representatives()
                .map(|(e, reps)| (e.clone(), reps.to_vec()))
                .collect(),
            complexities: tracker
                .complexities()
                .iter()
                .map(|(e, &c)| (e.clone(), c))
                .collect(),
            frequencies: tracker
                .frequencies()
                .iter()
                .map(|(e, &f)| (e.clone(), f))
                .collect(),
            complexity_index: tracker
                .complexity_index()
                .into_iter()
                .map(|(bin, set)| (bin, set.into_iter().cloned().collect()))
                .collect(),
            config: tracker.config().clone(),
            stats: tracker.memory_stats(),
        }
    }

    /// Check the snapshot against the tracker invariants and rebuild a tracker
    pub fn into_tracker(self) -> PhenoResult<PhenotypeTracker> {
        if self.version != SNAPSHOT_VERSION {
            return Err(PhenoError::format(format!(
                "unsupported snapshot version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        self.config
            .validate()
            .map_err(|e| PhenoError::format(format!("snapshot config: {}", e)))?;

        for (phenotype, reps) in &self.representatives {
            if !self.complexities.contains_key(phenotype) {
                return Err(PhenoError::format(format!(
                    "phenotype {} has representatives but no complexity",
                    phenotype
                )));
            }
            if !self.frequencies.contains_key(phenotype) {
                return Err(PhenoError::format(format!(
                    "phenotype {} has representatives but no frequency",
                    phenotype
                )));
            }
            if reps.len() > self.config.max_reps_per_phenotype {
                return Err(PhenoError::format(format!(
                    "phenotype {} holds {} representatives, limit is {}",
                    phenotype,
                    reps.len(),
                    self.config.max_reps_per_phenotype
                )));
            }
            if let Some(stray) = reps.iter().find(|r| r.encoding() != phenotype) {
                return Err(PhenoError::format(format!(
                    "representative {} filed under phenotype {}",
                    stray.encoding(),
                    phenotype
                )));
            }
        }

        // Every sample bumps exactly one frequency
        let total_samples = self.frequencies.values().sum();
        let overflow_count = self.stats.overflow_count;
        let persisted_index = self.complexity_index;

        let tracker = PhenotypeTracker::from_parts(
            self.config,
            self.frequencies.into_iter().collect::<HashMap<_, _>>(),
            self.complexities.into_iter().collect::<HashMap<_, _>>(),
            self.representatives,
            total_samples,
            overflow_count,
        );

        let rebuilt: Vec<(f64, Vec<Encoding>)> = tracker
            .complexity_index()
            .into_iter()
            .map(|(bin, set)| (bin, set.into_iter().cloned().collect()))
            .collect();
        if !same_index(&persisted_index, &rebuilt) {
            warn!("Persisted complexity index disagrees with representatives; rebuilt it");
        }

        Ok(tracker)
    }
}

fn same_index(a: &[(f64, Vec<Encoding>)], b: &[(f64, Vec<Encoding>)]) -> bool {
    let normalize = |index: &[(f64, Vec<Encoding>)]| {
        let mut v: Vec<(i64, Vec<Encoding>)> = index
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(bin, set)| {
                let mut set = set.clone();
                set.sort();
                ((bin * 2.0).round() as i64, set)
            })
            .collect();
        v.sort();
        v
    };
    normalize(a) == normalize(b)
}

impl PhenotypeTracker {
    /// Write a full snapshot to `path`, creating parent directories
    pub fn persist(&self, path: &Path) -> PhenoResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let snapshot = TrackerSnapshot::capture(self);
        let mut writer = BufWriter::new(File::create(path)?);
        match SnapshotFormat::for_path(path) {
            SnapshotFormat::Bincode => bincode::serialize_into(&mut writer, &snapshot)?,
            SnapshotFormat::Json => serde_json::to_writer(&mut writer, &snapshot)?,
        }
        writer.flush()?;
        drop(writer);

        let size_mb = fs::metadata(path)?.len() as f64 / (1024.0 * 1024.0);
        info!(
            "Saved {} representatives to {} ({:.1} MB)",
            self.stored_representatives(),
            path.display(),
            size_mb
        );
        Ok(())
    }

    /// Load a tracker from a snapshot written by [`persist`](Self::persist)
    pub fn restore(path: &Path) -> PhenoResult<Self> {
        let data = fs::read(path)?;
        let snapshot: TrackerSnapshot = match SnapshotFormat::for_path(path) {
            SnapshotFormat::Bincode => bincode::deserialize(&data)
                .map_err(|e| PhenoError::format(format!("{}: {}", path.display(), e)))?,
            SnapshotFormat::Json => serde_json::from_slice(&data)
                .map_err(|e| PhenoError::format(format!("{}: {}", path.display(), e)))?,
        };

        let tracker = snapshot.into_tracker()?;
        info!(
            "Snapshot loaded: {} phenotypes, {} representatives, {} samples",
            tracker.unique_phenotypes(),
            tracker.stored_representatives(),
            tracker.total_samples()
        );
        Ok(tracker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::representative::RepresentativeSample;
    use crate::tracker::ComplexityQuery;
    use crate::trajectory::CoarseTrajectory;
    use tempfile::tempdir;

    fn populated() -> PhenotypeTracker {
        let mut tracker = PhenotypeTracker::new(TrackerConfig::default()).unwrap();
        let observations = [("0110", 6.0, 4), ("0011", 6.0, 3), ("0101", 7.5, 1)];
        for (s, c, n) in observations {
            for i in 0..n {
                let sample = RepresentativeSample::new(
                    10.0 + i as f64,
                    vec![0.25, 1.0, 2.0],
                    CoarseTrajectory::new(vec![0.0, 100.0, 200.0], vec![1.0, 0.5, i as f32]),
                );
                tracker.update_with_sample(s.parse().unwrap(), c, sample);
            }
        }
        tracker
    }

    fn assert_same_state(a: &PhenotypeTracker, b: &PhenotypeTracker) {
        assert_eq!(a.frequencies(), b.frequencies());
        assert_eq!(a.complexities(), b.complexities());
        assert_eq!(a.total_samples(), b.total_samples());
        for (e, reps) in a.representatives() {
            assert_eq!(b.query_by_phenotype(e), reps);
        }
        assert_eq!(a.memory_usage(), b.memory_usage());
        assert_eq!(a.stored_representatives(), b.stored_representatives());
    }

    #[test]
    fn test_bincode_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run").join("tracker.bin");

        let tracker = populated();
        tracker.persist(&path).unwrap();
        let loaded = PhenotypeTracker::restore(&path).unwrap();

        assert_same_state(&tracker, &loaded);
        assert_eq!(loaded.config(), tracker.config());
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracker.json");

        let tracker = populated();
        tracker.persist(&path).unwrap();
        let loaded = PhenotypeTracker::restore(&path).unwrap();

        assert_same_state(&tracker, &loaded);
    }

    #[test]
    fn test_restore_recomputes_memory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        populated().persist(&path).unwrap();

        // Corrupt the informational counters
        let mut value: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        value["stats"]["current_bytes"] = serde_json::json!(123_456_789u64);
        value["stats"]["stored_representatives"] = serde_json::json!(999u64);
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        let loaded = PhenotypeTracker::restore(&path).unwrap();
        let summed: usize = loaded
            .representatives()
            .flat_map(|(_, reps)| reps.iter())
            .map(Representative::memory_size)
            .sum();
        assert_eq!(loaded.memory_usage(), summed);
        assert_eq!(loaded.stored_representatives(), 3 + 2);
    }

    #[test]
    fn test_missing_key_is_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        populated().persist(&path).unwrap();

        let mut value: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        value.as_object_mut().unwrap().remove("frequencies");
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        assert!(matches!(
            PhenotypeTracker::restore(&path),
            Err(PhenoError::Format(_))
        ));
    }

    #[test]
    fn test_orphan_representatives_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        populated().persist(&path).unwrap();

        let mut value: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        value["complexities"].as_object_mut().unwrap().remove("0110");
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        assert!(matches!(
            PhenotypeTracker::restore(&path),
            Err(PhenoError::Format(_))
        ));
    }

    #[test]
    fn test_blank_index_is_rebuilt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        populated().persist(&path).unwrap();

        let mut value: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        value["complexity_index"] = serde_json::json!([]);
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        let loaded = PhenotypeTracker::restore(&path).unwrap();
        let hits = loaded.query_by_complexity(&ComplexityQuery::around(6.0).tolerance(0.1));
        assert_eq!(hits.len(), 3 + 2);
        let index = loaded.complexity_index();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].0, 6.0);
        assert_eq!(index[0].1.len(), 2);
    }

    #[test]
    fn test_too_many_representatives_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        populated().persist(&path).unwrap();

        // "0110" holds three representatives
        let mut value: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        value["config"]["max_reps_per_phenotype"] = serde_json::json!(2);
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        assert!(matches!(
            PhenotypeTracker::restore(&path),
            Err(PhenoError::Format(_))
        ));
    }

    #[test]
    fn test_misfiled_representative_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        populated().persist(&path).unwrap();

        let mut value: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        value["representatives"]["0110"][0]["encoding"] = serde_json::json!("0011");
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

        assert!(matches!(
            PhenotypeTracker::restore(&path),
            Err(PhenoError::Format(_))
        ));
    }

    #[test]
    fn test_truncated_bincode_is_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracker.bin");
        populated().persist(&path).unwrap();

        let data = fs::read(&path).unwrap();
        fs::write(&path, &data[..data.len() / 2]).unwrap();

        assert!(matches!(
            PhenotypeTracker::restore(&path),
            Err(PhenoError::Format(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            PhenotypeTracker::restore(&dir.path().join("absent.bin")),
            Err(PhenoError::Io(_))
        ));
    }

    #[test]
    fn test_restored_tracker_keeps_accumulating() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracker.bin");
        populated().persist(&path).unwrap();

        let mut loaded = PhenotypeTracker::restore(&path).unwrap();
        let e: Encoding = "0101".parse().unwrap();
        let sample = RepresentativeSample::new(
            3.0,
            vec![1.0],
            CoarseTrajectory::new(vec![0.0], vec![0.0]),
        );
        assert!(loaded.update_with_sample(e.clone(), 7.5, sample));
        assert_eq!(loaded.frequency(&e), 2);
        assert_eq!(loaded.query_by_phenotype(&e).len(), 1);
    }
}
