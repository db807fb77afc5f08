//! Non-episodic discounted return filter for intrinsic rewards.
//!
//! Keeps one running discounted sum of raw intrinsic rewards per worker:
//!
//! ```text
//! R_t = R_{t-1} * decay(γ) + r_t
//! ```
//!
//! The sum is never reset on episode termination. Novelty is treated as a
//! continuing signal, so the filter ignores done flags entirely and runs for
//! the whole training lifetime.

use serde::{Deserialize, Serialize};

use super::error::RndError;

/// How the accumulated return decays between updates.
///
/// The reward generator discounts (`R * γ`). The pseudo-rollout storage can
/// optionally divide by γ instead, which makes the accumulator grow by `1/γ`
/// per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FilterDecay {
    /// `R = R * γ + r`
    #[default]
    Discount,
    /// `R = R / γ + r`
    InverseDiscount,
}

/// Per-worker discounted running sum of rewards, decoupled from episodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonEpisodicReturnFilter {
    gamma: f32,
    decay: FilterDecay,
    returns: Vec<f32>,
}

impl NonEpisodicReturnFilter {
    /// Create a discounting filter for `n_workers` workers.
    pub fn new(gamma: f32, n_workers: usize) -> Self {
        Self::with_decay(gamma, n_workers, FilterDecay::Discount)
    }

    /// Create a filter with an explicit decay variant.
    pub fn with_decay(gamma: f32, n_workers: usize, decay: FilterDecay) -> Self {
        debug_assert!(gamma > 0.0 && gamma <= 1.0, "gamma must be in (0, 1]");
        Self {
            gamma,
            decay,
            returns: vec![0.0; n_workers],
        }
    }

    /// Fold one time step of raw rewards into the running returns.
    ///
    /// Returns a copy of the updated returns; later updates never touch
    /// values already handed out.
    pub fn update(&mut self, rewards: &[f32]) -> Result<Vec<f32>, RndError> {
        if rewards.len() != self.returns.len() {
            return Err(RndError::shape(
                "return filter row",
                self.returns.len(),
                rewards.len(),
            ));
        }

        let gamma = self.gamma;
        for (ret, &r) in self.returns.iter_mut().zip(rewards) {
            *ret = match self.decay {
                FilterDecay::Discount => *ret * gamma + r,
                FilterDecay::InverseDiscount => *ret / gamma + r,
            };
        }
        Ok(self.returns.clone())
    }

    /// Current accumulated returns.
    pub fn returns(&self) -> &[f32] {
        &self.returns
    }

    /// Discount factor.
    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Decay variant.
    pub fn decay(&self) -> FilterDecay {
        self.decay
    }

    /// Number of workers tracked.
    pub fn n_workers(&self) -> usize {
        self.returns.len()
    }
}
