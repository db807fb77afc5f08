//! Numerical health report for normalization steps.

use serde::{Deserialize, Serialize};

use super::running_stats::RunningMoments;

/// Records where a standard deviation had to be floored.
///
/// Degenerate variance is not an error: divisors are clamped to `epsilon` and
/// the event is reported here and through `log::warn!`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NumericalDiagnostics {
    /// Observation pixels whose running variance was at or below `epsilon²`
    pub degenerate_obs_pixels: usize,
    /// Whether the reward standard deviation was floored
    pub reward_std_floored: bool,
    /// Reward standard deviation actually divided by
    pub reward_std: f64,
    /// Reward samples seen by the moments
    pub reward_count: f64,
}

impl NumericalDiagnostics {
    /// Diagnostics of scalar reward moments.
    pub fn for_rewards(moments: &RunningMoments, epsilon: f64) -> Self {
        let std = moments.std_vec(epsilon).first().copied().unwrap_or(1.0);
        let floored = moments.degenerate_dims(epsilon) > 0;
        if floored {
            log::warn!(
                "Degenerate reward variance after {} samples, dividing by epsilon={}",
                moments.count(),
                epsilon
            );
        }
        Self {
            degenerate_obs_pixels: 0,
            reward_std_floored: floored,
            reward_std: std,
            reward_count: moments.count(),
        }
    }

    /// Add the observation pixel report of `moments`.
    pub fn with_observations(mut self, moments: &RunningMoments, epsilon: f64) -> Self {
        self.degenerate_obs_pixels = moments.degenerate_dims(epsilon);
        if self.degenerate_obs_pixels > 0 {
            log::warn!(
                "{} of {} observation pixels have degenerate variance",
                self.degenerate_obs_pixels,
                moments.dim()
            );
        }
        self
    }

    /// Whether any divisor was floored.
    pub fn is_degenerate(&self) -> bool {
        self.reward_std_floored || self.degenerate_obs_pixels > 0
    }
}
