//! # Trajectory - Simulated Time Courses
//!
//! A trajectory is what the simulator hands back for one trial: an ordered
//! series of `(time, value)` samples. It lives only as long as the trial;
//! what survives is its encoding and, for stored representatives, a coarse
//! `f32` copy.

use serde::{Deserialize, Serialize};

use crate::error::{PhenoError, PhenoResult};

/// A simulated time course with strictly increasing sample times
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl Trajectory {
    /// Build a trajectory from parallel time and value samples
    ///
    /// Requires at least two samples, matching lengths and strictly
    /// increasing finite times whose span is itself finite.
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> PhenoResult<Self> {
        if times.len() != values.len() {
            return Err(PhenoError::domain(format!(
                "trajectory has {} times but {} values",
                times.len(),
                values.len()
            )));
        }
        if times.len() < 2 {
            return Err(PhenoError::domain(format!(
                "trajectory needs at least 2 samples, got {}",
                times.len()
            )));
        }
        if let Some(i) = times.iter().position(|t| !t.is_finite()) {
            return Err(PhenoError::domain(format!(
                "trajectory time at index {} is not finite",
                i
            )));
        }
        if let Some(i) = times.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(PhenoError::domain(format!(
                "trajectory times must be strictly increasing (index {})",
                i + 1
            )));
        }

        if !(times[times.len() - 1] - times[0]).is_finite() {
            return Err(PhenoError::domain("trajectory time span overflows"));
        }

        Ok(Self { times, values })
    }

    /// Sample a function at `n` evenly spaced points over `[t0, t1]`
    pub fn from_fn(t0: f64, t1: f64, n: usize, f: impl Fn(f64) -> f64) -> PhenoResult<Self> {
        if n < 2 {
            return Err(PhenoError::domain(format!(
                "trajectory needs at least 2 samples, got {}",
                n
            )));
        }
        let step = (t1 - t0) / (n - 1) as f64;
        let times: Vec<f64> = (0..n).map(|i| t0 + step * i as f64).collect();
        let values = times.iter().map(|&t| f(t)).collect();
        Self::new(times, values)
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always false: construction rejects trajectories with fewer than 2 samples
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// First sample time
    pub fn start(&self) -> f64 {
        self.times[0]
    }

    /// Last sample time
    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// Time span covered by the samples
    pub fn span(&self) -> f64 {
        self.end() - self.start()
    }

    /// Piecewise-linear interpolation, clamped to the boundary values
    /// outside `[start, end]`.
    pub fn interpolate(&self, t: f64) -> f64 {
        let last = self.times.len() - 1;
        if t <= self.times[0] {
            return self.values[0];
        }
        if t >= self.times[last] {
            return self.values[last];
        }

        // First knot strictly greater than t; a NaN t lands on the first segment
        let hi = self.times.partition_point(|&x| x <= t).clamp(1, last);
        let lo = hi - 1;
        let (t0, t1) = (self.times[lo], self.times[hi]);
        let (v0, v1) = (self.values[lo], self.values[hi]);
        v0 + (v1 - v0) * (t - t0) / (t1 - t0)
    }

    /// True when any value is NaN or infinite
    pub fn has_non_finite(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }
}

/// Reduced-precision resampling of a trajectory kept for later inspection
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoarseTrajectory {
    pub times: Vec<f32>,
    pub values: Vec<f32>,
}

impl CoarseTrajectory {
    pub fn new(times: Vec<f32>, values: Vec<f32>) -> Self {
        Self { times, values }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Bytes held by both buffers
    pub fn nbytes(&self) -> usize {
        (self.times.len() + self.values.len()) * std::mem::size_of::<f32>()
    }
}

/// Resample `trajectory` at `points` evenly spaced times over `[start, end]`
///
/// `points == 0` yields an empty coarse trajectory; `points == 1` keeps the
/// first sample only.
pub fn coarse_grain(trajectory: &Trajectory, points: usize) -> CoarseTrajectory {
    let (t0, span) = (trajectory.start(), trajectory.span());
    let step = if points > 1 {
        span / (points - 1) as f64
    } else {
        0.0
    };

    let mut times = Vec::with_capacity(points);
    let mut values = Vec::with_capacity(points);
    for i in 0..points {
        let t = t0 + step * i as f64;
        times.push(t as f32);
        values.push(trajectory.interpolate(t) as f32);
    }

    CoarseTrajectory { times, values }
}

/// Mean interval between successive upward crossings of the signal mean
///
/// Returns `None` when the signal crosses its mean upward fewer than two
/// times (non-oscillating trajectories).
pub fn estimate_period(trajectory: &Trajectory) -> Option<f64> {
    let values = trajectory.values();
    let times = trajectory.times();
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    let mut crossings = Vec::new();
    for i in 1..values.len() {
        let (a, b) = (values[i - 1] - mean, values[i] - mean);
        if a < 0.0 && b >= 0.0 {
            // Linear estimate of where the crossing happened
            let frac = -a / (b - a);
            crossings.push(times[i - 1] + frac * (times[i] - times[i - 1]));
        }
    }

    if crossings.len() < 2 {
        return None;
    }
    let first = crossings[0];
    let last = crossings[crossings.len() - 1];
    Some((last - first) / (crossings.len() - 1) as f64)
}
