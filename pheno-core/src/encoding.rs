//! # Encoding - The Phenotype Identity
//!
//! A trajectory's shape is reduced to a fixed-length up/down string: bit `i`
//! is `1` when the signal is non-decreasing across time bin `i`. Two
//! trajectories with the same string are the same phenotype, whatever their
//! numeric differences.
//!
//! ```text
//!  value
//!    │    ╱╲      ╱╲
//!    │   ╱  ╲    ╱  ╲
//!    │  ╱    ╲__╱    ╲
//!    └──┬──┬──┬──┬──┬──┬── time
//!       1  1  0  0  1  0   ← one bit per bin
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PhenoError, PhenoResult};
use crate::trajectory::Trajectory;

/// Binary up/down shape string; the phenotype's identity key
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Encoding(String);

impl Encoding {
    /// Number of bins (bits)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// All bits equal (including the empty string)
    pub fn is_constant(&self) -> bool {
        let bytes = self.as_bytes();
        bytes.iter().all(|&b| b == bytes[0])
    }

    /// Same bits in reverse order
    pub fn reversed(&self) -> Encoding {
        Encoding(self.0.chars().rev().collect())
    }

    /// Every bit inverted
    pub fn flipped(&self) -> Encoding {
        Encoding(
            self.0
                .chars()
                .map(|c| if c == '1' { '0' } else { '1' })
                .collect(),
        )
    }
}

impl FromStr for Encoding {
    type Err = PhenoError;

    fn from_str(s: &str) -> PhenoResult<Self> {
        if let Some(bad) = s.chars().find(|c| *c != '0' && *c != '1') {
            return Err(PhenoError::domain(format!(
                "encoding may only contain '0' and '1', found {:?}",
                bad
            )));
        }
        Ok(Encoding(s.to_string()))
    }
}

impl TryFrom<String> for Encoding {
    type Error = PhenoError;

    fn try_from(s: String) -> PhenoResult<Self> {
        s.parse()
    }
}

impl From<Encoding> for String {
    fn from(encoding: Encoding) -> Self {
        encoding.0
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode a trajectory's slope signs over `nbins` equal time bins
///
/// Sample points are `t0 + i·Δt` for `i in 0..nbins` with
/// `Δt = (tN - t0) / nbins`; the final time is never a sample point. The
/// signal is linearly interpolated at each point and at point + Δt, and the
/// bit is `1` when the later value is greater than or equal to the earlier.
pub fn encode(trajectory: &Trajectory, nbins: usize) -> PhenoResult<Encoding> {
    if nbins < 1 {
        return Err(PhenoError::domain("encoding needs at least one bin"));
    }

    let t0 = trajectory.start();
    let dt = trajectory.span() / nbins as f64;

    let bits = (0..nbins)
        .map(|i| {
            let t = t0 + dt * i as f64;
            let now = trajectory.interpolate(t);
            let next = trajectory.interpolate(t + dt);
            if next >= now {
                '1'
            } else {
                '0'
            }
        })
        .collect();

    Ok(Encoding(bits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_BINS;

    fn oscillation() -> Trajectory {
        Trajectory::from_fn(0.0, 200.0, 2001, |t| (t / 10.0).sin() * (-t / 150.0).exp()).unwrap()
    }

    #[test]
    fn test_constant_signal_is_all_up() {
        let flat = Trajectory::from_fn(0.0, 200.0, 2001, |_| 3.5).unwrap();
        let encoding = encode(&flat, DEFAULT_BINS).unwrap();
        assert_eq!(encoding.as_str(), "1".repeat(DEFAULT_BINS));
    }

    #[test]
    fn test_length_matches_bins() {
        let traj = oscillation();
        for nbins in [1, 2, 7, 40, 333] {
            assert_eq!(encode(&traj, nbins).unwrap().len(), nbins);
        }
    }

    #[test]
    fn test_deterministic() {
        let traj = oscillation();
        assert_eq!(encode(&traj, 40).unwrap(), encode(&traj, 40).unwrap());
    }

    #[test]
    fn test_rise_then_fall() {
        let tent = Trajectory::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]).unwrap();
        assert_eq!(encode(&tent, 4).unwrap().as_str(), "1100");
    }

    #[test]
    fn test_zero_bins_is_domain_error() {
        assert!(matches!(encode(&oscillation(), 0), Err(PhenoError::Domain(_))));
    }

    #[test]
    fn test_parse_rejects_other_symbols() {
        assert!("0110".parse::<Encoding>().is_ok());
        assert!("01a0".parse::<Encoding>().is_err());
    }

    #[test]
    fn test_flip_and_reverse() {
        let e: Encoding = "0011".parse().unwrap();
        assert_eq!(e.flipped().as_str(), "1100");
        assert_eq!(e.reversed().as_str(), "1100");
        assert!(!e.is_constant());
        assert!("1111".parse::<Encoding>().unwrap().is_constant());
    }
}
