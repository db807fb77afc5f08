//! Running moments using Welford's online algorithm.
//!
//! Provides numerically stable running mean and variance for observation and
//! intrinsic reward normalization. Every accumulation happens in `f64`, even
//! though samples arrive as `f32` pixels or rewards.
//!
//! # Features
//! - Batch updates merged with the parallel Welford formula
//! - Per-dimension statistics (e.g. one entry per pixel of a frame)
//! - Thread-safe handle via `parking_lot::RwLock` for shared use
//!
//! # Example
//! ```ignore
//! use rnd_rl::core::RunningMoments;
//!
//! let mut moments = RunningMoments::new(4);
//! moments.update_batch(&[1.0, 2.0, 3.0, 4.0, 2.0, 3.0, 4.0, 5.0]);
//!
//! let std = moments.std_vec(1e-8);
//! ```

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Running mean and variance over vectors of a fixed dimension.
///
/// Variance is the population variance (`var_sum / count`). Before any sample
/// has been seen the variance reads as 1.0, so dividing by the standard
/// deviation is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunningMoments {
    /// Running mean per dimension
    mean: Vec<f64>,
    /// Sum of squared deviations per dimension
    var_sum: Vec<f64>,
    /// Number of samples seen
    count: f64,
}

impl RunningMoments {
    /// Create moments tracking `dim` values per sample.
    pub fn new(dim: usize) -> Self {
        Self {
            mean: vec![0.0; dim],
            var_sum: vec![0.0; dim],
            count: 0.0,
        }
    }

    /// Moments over scalar samples.
    pub fn scalar() -> Self {
        Self::new(1)
    }

    /// Update statistics with a single sample.
    ///
    /// # Panics
    /// Panics if the sample dimensionality doesn't match.
    pub fn update(&mut self, sample: &[f32]) {
        assert_eq!(sample.len(), self.mean.len(), "Sample dimension mismatch");

        self.count += 1.0;
        for (i, &x) in sample.iter().enumerate() {
            let x = x as f64;
            let delta = x - self.mean[i];
            self.mean[i] += delta / self.count;
            let delta2 = x - self.mean[i];
            self.var_sum[i] += delta * delta2;
        }
    }

    /// Update statistics with a flattened batch `[s0, s1, ...]`.
    ///
    /// The batch moments are computed first and then merged, so a batch
    /// counts exactly like the same samples fed one by one.
    ///
    /// # Panics
    /// Panics if the batch length is not a multiple of the dimension.
    pub fn update_batch(&mut self, batch: &[f32]) {
        let dim = self.mean.len();
        assert!(dim > 0, "Moments must track at least one dimension");
        assert_eq!(batch.len() % dim, 0, "Batch size must be multiple of dimension");

        let n = batch.len() / dim;
        if n == 0 {
            return;
        }

        let mut batch_mean = vec![0.0f64; dim];
        for sample in batch.chunks_exact(dim) {
            for (m, &x) in batch_mean.iter_mut().zip(sample) {
                *m += x as f64;
            }
        }
        for m in &mut batch_mean {
            *m /= n as f64;
        }

        let mut batch_var_sum = vec![0.0f64; dim];
        for sample in batch.chunks_exact(dim) {
            for i in 0..dim {
                let d = sample[i] as f64 - batch_mean[i];
                batch_var_sum[i] += d * d;
            }
        }

        self.merge_parts(&batch_mean, &batch_var_sum, n as f64);
    }

    /// Merge statistics from another instance using parallel Welford.
    ///
    /// # Panics
    /// Panics if dimensionalities don't match.
    pub fn merge(&mut self, other: &RunningMoments) {
        assert_eq!(self.mean.len(), other.mean.len(), "Dimension mismatch in merge");
        self.merge_parts(&other.mean, &other.var_sum, other.count);
    }

    fn merge_parts(&mut self, mean: &[f64], var_sum: &[f64], count: f64) {
        if count == 0.0 {
            return;
        }
        if self.count == 0.0 {
            self.mean.copy_from_slice(mean);
            self.var_sum.copy_from_slice(var_sum);
            self.count = count;
            return;
        }

        let total_count = self.count + count;
        for i in 0..self.mean.len() {
            let delta = mean[i] - self.mean[i];
            // M2 = M2_a + M2_b + delta^2 * n_a * n_b / (n_a + n_b)
            self.var_sum[i] += var_sum[i] + delta * delta * self.count * count / total_count;
            self.mean[i] += delta * count / total_count;
        }
        self.count = total_count;
    }

    /// Mean vector.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Population variance vector.
    pub fn variance(&self) -> Vec<f64> {
        if self.count == 0.0 {
            vec![1.0; self.mean.len()]
        } else {
            self.var_sum.iter().map(|&v| v / self.count).collect()
        }
    }

    /// Standard deviation vector, floored at `epsilon`.
    pub fn std_vec(&self, epsilon: f64) -> Vec<f64> {
        self.variance()
            .into_iter()
            .map(|v| v.sqrt().max(epsilon))
            .collect()
    }

    /// Number of entries whose variance is at or below `epsilon²`.
    ///
    /// Dividing by the standard deviation of such an entry would blow up
    /// without the floor applied by [`std_vec`](Self::std_vec).
    pub fn degenerate_dims(&self, epsilon: f64) -> usize {
        let floor = epsilon * epsilon;
        self.variance().iter().filter(|&&v| !(v > floor)).count()
    }

    /// Number of samples seen.
    pub fn count(&self) -> f64 {
        self.count
    }

    /// Dimensionality of a sample.
    pub fn dim(&self) -> usize {
        self.mean.len()
    }
}

/// Thread-safe handle to [`RunningMoments`].
///
/// The generator and the pseudo-rollout storage own plain `RunningMoments`.
/// This handle is for hosts that gather statistics on several threads: each
/// thread updates or [`merge`](Self::merge)s into it, and readers take a
/// [`snapshot`](Self::snapshot).
///
/// Each update holds the write lock for its whole duration, so concurrent
/// batches are merged one after the other.
#[derive(Debug, Clone)]
pub struct SharedRunningMoments {
    inner: Arc<RwLock<RunningMoments>>,
}

impl SharedRunningMoments {
    /// Create a new shared instance tracking `dim` values per sample.
    pub fn new(dim: usize) -> Self {
        Self::from_moments(RunningMoments::new(dim))
    }

    /// Wrap existing moments.
    pub fn from_moments(moments: RunningMoments) -> Self {
        Self {
            inner: Arc::new(RwLock::new(moments)),
        }
    }

    /// Update with a flattened batch.
    pub fn update_batch(&self, batch: &[f32]) {
        self.inner.write().update_batch(batch);
    }

    /// Merge statistics from another source.
    pub fn merge(&self, other: &RunningMoments) {
        self.inner.write().merge(other);
    }

    /// Snapshot of the current statistics.
    pub fn snapshot(&self) -> RunningMoments {
        self.inner.read().clone()
    }

    /// Number of samples seen.
    pub fn count(&self) -> f64 {
        self.inner.read().count()
    }
}
