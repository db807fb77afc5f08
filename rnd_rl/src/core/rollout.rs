//! Base rollout storage for on-policy training.
//!
//! Collects one fixed-length rollout of vectorized transitions and computes
//! extrinsic GAE returns over it. Everything is stored time-major: step `t`
//! of worker `w` lives at index `t * n_workers + w`.
//!
//! # Continuation masks
//!
//! `masks` holds `steps + 1` rows. Row 0 is the mask of the first state of the
//! rollout and is carried over from the last row of the previous rollout on
//! [`reset`](RolloutStorage::reset); row `t + 1` is `1 - done_t`.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::error::{ConfigError, RndError};
use crate::algorithms::gae::masked_gae_returns;

/// Rollout storage for on-policy algorithms.
///
/// # Type Parameters
///
/// - `A`: Action value type stored per transition
#[derive(Debug, Clone)]
pub struct RolloutStorage<A: Clone> {
    /// Flattened observations: [step * n_workers * obs_size]
    states: Vec<f32>,
    /// Actions taken at each step
    actions: Vec<A>,
    /// Extrinsic rewards received
    rewards: Vec<f32>,
    /// Continuation masks: [(step + 1) * n_workers]
    masks: Vec<f32>,
    /// Value estimates from the extrinsic value head
    values: Vec<f32>,
    /// Log probabilities of the actions under the collecting policy
    old_log_probs: Vec<f32>,
    /// Extrinsic GAE returns (empty until computed)
    returns: Vec<f32>,

    n_workers: usize,
    obs_size: usize,
    rollout_len: usize,
    step_count: usize,
}

impl<A: Clone> RolloutStorage<A> {
    /// Create storage for `rollout_len` steps of `n_workers` workers.
    pub fn new(n_workers: usize, rollout_len: usize, obs_size: usize) -> Result<Self, ConfigError> {
        for (field, value) in [("n_workers", n_workers), ("rollout_len", rollout_len)] {
            if value == 0 {
                return Err(ConfigError::InvalidCount { field, value });
            }
        }

        let capacity = n_workers * rollout_len;
        let mut masks = Vec::with_capacity(capacity + n_workers);
        masks.resize(n_workers, 1.0);

        Ok(Self {
            states: Vec::with_capacity(capacity * obs_size),
            actions: Vec::with_capacity(capacity),
            rewards: Vec::with_capacity(capacity),
            masks,
            values: Vec::with_capacity(capacity),
            old_log_probs: Vec::with_capacity(capacity),
            returns: Vec::with_capacity(capacity),
            n_workers,
            obs_size,
            rollout_len,
            step_count: 0,
        })
    }

    /// Push one vectorized step.
    ///
    /// # Arguments
    ///
    /// - `states`: Flattened observations [n_workers * obs_size]
    /// - `actions`: Actions for each worker [n_workers]
    /// - `rewards`: Extrinsic rewards [n_workers]
    /// - `dones`: Episode-end flags [n_workers]
    /// - `values`: Value estimates [n_workers]
    /// - `log_probs`: Log probabilities of `actions` [n_workers]
    pub fn push_step(
        &mut self,
        states: &[f32],
        actions: Vec<A>,
        rewards: &[f32],
        dones: &[bool],
        values: &[f32],
        log_probs: &[f32],
    ) -> Result<(), RndError> {
        if self.step_count >= self.rollout_len {
            return Err(RndError::OutOfOrder {
                operation: "push_step",
                pushed: self.step_count,
                horizon: self.rollout_len,
            });
        }
        let n = self.n_workers;
        check_len("states", n * self.obs_size, states.len())?;
        check_len("actions", n, actions.len())?;
        check_len("rewards", n, rewards.len())?;
        check_len("dones", n, dones.len())?;
        check_len("values", n, values.len())?;
        check_len("log_probs", n, log_probs.len())?;

        self.states.extend_from_slice(states);
        self.actions.extend(actions);
        self.rewards.extend_from_slice(rewards);
        self.masks
            .extend(dones.iter().map(|&d| if d { 0.0 } else { 1.0 }));
        self.values.extend_from_slice(values);
        self.old_log_probs.extend_from_slice(log_probs);

        self.step_count += 1;
        Ok(())
    }

    /// Compute extrinsic GAE returns once the rollout is full.
    ///
    /// `next_values` are the value estimates of the states after the last step.
    pub fn compute_returns(
        &mut self,
        next_values: &[f32],
        gamma: f32,
        gae_lambda: f32,
    ) -> Result<(), RndError> {
        if !self.is_full() {
            return Err(RndError::OutOfOrder {
                operation: "compute_returns",
                pushed: self.step_count,
                horizon: self.rollout_len,
            });
        }
        check_len("next_values", self.n_workers, next_values.len())?;

        let mut values = Vec::with_capacity(self.values.len() + self.n_workers);
        values.extend_from_slice(&self.values);
        values.extend_from_slice(next_values);

        self.returns = masked_gae_returns(
            &self.rewards,
            &values,
            &self.masks,
            self.n_workers,
            gamma,
            gae_lambda,
        );
        Ok(())
    }

    /// Extrinsic advantages `returns - values`.
    pub fn advantages(&self) -> Result<Vec<f32>, RndError> {
        if self.returns.len() != self.values.len() || self.values.is_empty() {
            return Err(RndError::OutOfOrder {
                operation: "advantages",
                pushed: self.step_count,
                horizon: self.rollout_len,
            });
        }
        Ok(self
            .returns
            .iter()
            .zip(&self.values)
            .map(|(r, v)| r - v)
            .collect())
    }

    /// Clear storage for the next rollout.
    ///
    /// The last mask row becomes the first row of the next rollout.
    pub fn reset(&mut self) {
        let n = self.n_workers;
        let last_row = self.masks.len() - n;
        self.masks.drain(..last_row);

        self.states.clear();
        self.actions.clear();
        self.rewards.clear();
        self.values.clear();
        self.old_log_probs.clear();
        self.returns.clear();
        self.step_count = 0;
    }

    /// Check if the rollout is complete.
    pub fn is_full(&self) -> bool {
        self.step_count >= self.rollout_len
    }

    /// Total number of transitions.
    pub fn len(&self) -> usize {
        self.step_count * self.n_workers
    }

    /// Check if storage is empty.
    pub fn is_empty(&self) -> bool {
        self.step_count == 0
    }

    /// Number of steps pushed this cycle.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Number of workers.
    pub fn n_workers(&self) -> usize {
        self.n_workers
    }

    /// Rollout length.
    pub fn rollout_len(&self) -> usize {
        self.rollout_len
    }

    /// Flattened observation size.
    pub fn obs_size(&self) -> usize {
        self.obs_size
    }

    /// Flattened observations.
    pub fn states(&self) -> &[f32] {
        &self.states
    }

    /// Actions.
    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    /// Extrinsic rewards.
    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    /// Continuation masks, `steps + 1` rows.
    pub fn masks(&self) -> &[f32] {
        &self.masks
    }

    /// Masks of the collected steps, aligned with the transitions.
    pub fn step_masks(&self) -> &[f32] {
        &self.masks[..self.len()]
    }

    /// Extrinsic value estimates.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Log probabilities recorded during collection.
    pub fn old_log_probs(&self) -> &[f32] {
        &self.old_log_probs
    }

    /// Extrinsic returns, empty until [`compute_returns`](Self::compute_returns).
    pub fn returns(&self) -> &[f32] {
        &self.returns
    }

    /// States as tensor [transitions, obs_size].
    pub fn states_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::<B, 1>::from_floats(self.states.as_slice(), device)
            .reshape([self.len(), self.obs_size])
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), RndError> {
    if expected == actual {
        Ok(())
    } else {
        Err(RndError::shape(what, expected, actual))
    }
}
