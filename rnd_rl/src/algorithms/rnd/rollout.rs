//! Rollout storage with a parallel intrinsic (pseudo) reward stream.
//!
//! Wraps the extrinsic [`RolloutStorage`] and records, per step, the
//! intrinsic rewards and the intrinsic value head's estimates. At the end of
//! the cycle the pseudo rewards are rescaled by their own running standard
//! deviation and turned into GAE returns.
//!
//! Phases of one cycle:
//!
//! ```text
//! Collecting --(horizon pushes, compute_returns)--> Finalized --reset--> Collecting
//! ```

use super::config::RndConfig;
use super::generator::IntrinsicRewardSample;
use crate::algorithms::gae::masked_gae_returns_f64;
use crate::core::{
    FilterDecay, NonEpisodicReturnFilter, NumericalDiagnostics, RndError, RolloutStorage,
    RunningMoments,
};
use burn::tensor::backend::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Collecting,
    Finalized,
}

/// Rollout storage for RND agents.
///
/// # Type Parameters
///
/// - `A`: Action value type stored by the base storage
#[derive(Debug, Clone)]
pub struct RndRolloutStorage<A: Clone> {
    base: RolloutStorage<A>,
    /// Forward filter applied to pushed rewards
    filter: Option<NonEpisodicReturnFilter>,
    /// Statistics of every pseudo reward pushed so far
    reward_moments: RunningMoments,
    pseudo_rewards: Vec<f32>,
    pseudo_values: Vec<f32>,
    /// [(horizon + 1) * n_workers], last row holds the bootstrap
    pseudo_returns: Vec<f32>,
    pushed: usize,
    horizon: usize,
    epsilon: f64,
    phase: Phase,
}

impl<A: Clone> RndRolloutStorage<A> {
    /// Create storage for `horizon` steps of `n_workers` workers.
    pub fn new(n_workers: usize, horizon: usize, obs_size: usize) -> Result<Self, RndError> {
        Ok(Self::from_base(RolloutStorage::new(n_workers, horizon, obs_size)?))
    }

    /// Create storage sized by `config`, with its pseudo filter and epsilon.
    pub fn from_config(config: &RndConfig, obs_size: usize) -> Result<Self, RndError> {
        config.validate()?;
        let storage = Self::new(config.n_workers, config.horizon, obs_size)?
            .with_epsilon(config.epsilon);
        Ok(match config.pseudo_filter {
            Some(decay) => storage.with_filter(config.int_gamma, decay),
            None => storage,
        })
    }

    /// Wrap an existing base storage.
    pub fn from_base(base: RolloutStorage<A>) -> Self {
        let n_workers = base.n_workers();
        let horizon = base.rollout_len();
        Self {
            base,
            filter: None,
            reward_moments: RunningMoments::scalar(),
            pseudo_rewards: Vec::with_capacity(horizon * n_workers),
            pseudo_values: Vec::with_capacity((horizon + 1) * n_workers),
            pseudo_returns: vec![0.0; (horizon + 1) * n_workers],
            pushed: 0,
            horizon,
            epsilon: 1e-8,
            phase: Phase::Collecting,
        }
    }

    /// Pass pushed rewards through a non-episodic filter before storing.
    pub fn with_filter(mut self, gamma: f32, decay: FilterDecay) -> Self {
        self.filter = Some(NonEpisodicReturnFilter::with_decay(
            gamma,
            self.base.n_workers(),
            decay,
        ));
        self
    }

    /// Floor of the reward standard deviation.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Append one step of intrinsic rewards and intrinsic value estimates.
    pub fn push_pseudo(&mut self, rewards: &[f32], values: &[f32]) -> Result<(), RndError> {
        let n = self.base.n_workers();
        if self.phase == Phase::Finalized || self.pushed() >= self.horizon {
            return Err(self.out_of_order("push_pseudo"));
        }
        if rewards.len() != n {
            return Err(RndError::shape("pseudo rewards", n, rewards.len()));
        }
        if values.len() != n {
            return Err(RndError::shape("pseudo values", n, values.len()));
        }

        match self.filter.as_mut() {
            Some(filter) => {
                let filtered = filter.update(rewards)?;
                self.pseudo_rewards.extend_from_slice(&filtered);
            }
            None => self.pseudo_rewards.extend_from_slice(rewards),
        }
        self.pseudo_values.extend_from_slice(values);
        self.pushed += 1;
        Ok(())
    }

    /// Push every step of a generated sample.
    ///
    /// `values` holds the intrinsic value estimates, time-major like the
    /// sample's rewards.
    pub fn push_sample<B: Backend>(
        &mut self,
        sample: &IntrinsicRewardSample<B>,
        values: &[f32],
    ) -> Result<(), RndError> {
        if sample.n_workers != self.base.n_workers() {
            return Err(RndError::shape("sample workers", self.base.n_workers(), sample.n_workers));
        }
        if values.len() != sample.rewards.len() {
            return Err(RndError::shape("sample values", sample.rewards.len(), values.len()));
        }
        if self.pushed() + sample.horizon > self.horizon {
            return Err(self.out_of_order("push_sample"));
        }

        for (rewards, values) in sample
            .rewards
            .chunks_exact(sample.n_workers)
            .zip(values.chunks_exact(sample.n_workers))
        {
            self.push_pseudo(rewards, values)?;
        }
        Ok(())
    }

    /// Compute pseudo GAE returns after exactly `horizon` pushes.
    ///
    /// `bootstrap` holds the intrinsic value estimates of the states after
    /// the last step. When `use_masks` is false the returns ignore episode
    /// boundaries.
    pub fn compute_returns(
        &mut self,
        bootstrap: &[f32],
        gamma: f32,
        gae_lambda: f32,
        use_masks: bool,
    ) -> Result<NumericalDiagnostics, RndError> {
        let n = self.base.n_workers();
        if self.phase == Phase::Finalized || self.pushed() != self.horizon {
            return Err(self.out_of_order("compute_returns"));
        }
        if bootstrap.len() != n {
            return Err(RndError::shape("bootstrap values", n, bootstrap.len()));
        }

        let masks = if use_masks {
            let masks = self.base.masks();
            if masks.len() != (self.horizon + 1) * n {
                return Err(RndError::shape(
                    "base masks",
                    (self.horizon + 1) * n,
                    masks.len(),
                ));
            }
            masks.to_vec()
        } else {
            vec![1.0; (self.horizon + 1) * n]
        };

        self.reward_moments.update_batch(&self.pseudo_rewards);
        let diagnostics = NumericalDiagnostics::for_rewards(&self.reward_moments, self.epsilon);
        let std = diagnostics.reward_std;
        let rewards: Vec<f64> = self
            .pseudo_rewards
            .iter()
            .map(|&r| r as f64 / std)
            .collect();

        self.pseudo_values.extend_from_slice(bootstrap);
        let returns = masked_gae_returns_f64(
            &rewards,
            &self.pseudo_values,
            &masks,
            n,
            gamma as f64,
            gae_lambda as f64,
        );

        let steps = self.horizon * n;
        self.pseudo_returns[..steps].copy_from_slice(&returns);
        self.pseudo_returns[steps..].copy_from_slice(bootstrap);
        self.phase = Phase::Finalized;

        log::debug!(
            "Pseudo returns computed: steps={} workers={} reward_std={:.6}",
            self.horizon,
            n,
            std
        );
        Ok(diagnostics)
    }

    /// [`compute_returns`](Self::compute_returns) with `int_gamma`,
    /// `gae_lambda` and `use_int_masks` taken from `config`.
    pub fn compute_returns_from_config(
        &mut self,
        bootstrap: &[f32],
        config: &RndConfig,
    ) -> Result<NumericalDiagnostics, RndError> {
        self.compute_returns(bootstrap, config.int_gamma, config.gae_lambda, config.use_int_masks)
    }

    /// Intrinsic value estimates `[horizon * n_workers]`, time-major.
    pub fn batched_values(&self) -> &[f32] {
        let len = self.pushed() * self.base.n_workers();
        &self.pseudo_values[..len]
    }

    /// Pseudo returns `[horizon * n_workers]`, time-major.
    pub fn batched_returns(&self) -> Result<&[f32], RndError> {
        if self.phase != Phase::Finalized {
            return Err(self.out_of_order("batched_returns"));
        }
        Ok(&self.pseudo_returns[..self.horizon * self.base.n_workers()])
    }

    /// Stored pseudo rewards, after the optional filter.
    pub fn pseudo_rewards(&self) -> &[f32] {
        &self.pseudo_rewards
    }

    /// Clear both streams for the next cycle.
    ///
    /// Reward statistics and filter state persist across cycles.
    pub fn reset(&mut self) {
        self.base.reset();
        self.pseudo_rewards.clear();
        self.pseudo_values.clear();
        self.pushed = 0;
        self.phase = Phase::Collecting;
    }

    /// Number of pseudo steps pushed this cycle.
    pub fn pushed(&self) -> usize {
        self.pushed
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn is_finalized(&self) -> bool {
        self.phase == Phase::Finalized
    }

    pub fn reward_moments(&self) -> &RunningMoments {
        &self.reward_moments
    }

    pub fn base(&self) -> &RolloutStorage<A> {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut RolloutStorage<A> {
        &mut self.base
    }

    fn out_of_order(&self, operation: &'static str) -> RndError {
        RndError::OutOfOrder {
            operation,
            pushed: self.pushed(),
            horizon: self.horizon,
        }
    }
}
