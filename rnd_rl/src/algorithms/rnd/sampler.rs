//! Advantage blending and minibatch sampling for RND rollouts.
//!
//! Extrinsic and intrinsic advantages are estimated separately and combined
//! per transition:
//!
//! ```text
//! A = A_ext * ext_coeff + (R_int - V_int) * int_coeff
//! A = (A - mean(A)) / max(std(A), eps)        // if normalization is enabled
//! ```

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::config::RndConfig;
use super::rollout::RndRolloutStorage;
use crate::algorithms::gae::normalize_advantages;
use crate::core::RndError;

/// Coefficients of the advantage blend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdvantageBlendConfig {
    pub ext_coeff: f32,
    pub int_coeff: f32,
    /// Normalize the blend with this denominator floor; `None` disables it
    pub normalize_eps: Option<f32>,
    pub minibatch_size: usize,
}

impl AdvantageBlendConfig {
    pub fn from_config(config: &RndConfig) -> Self {
        Self {
            ext_coeff: config.ext_coeff,
            int_coeff: config.int_coeff,
            normalize_eps: config.adv_normalize_eps,
            minibatch_size: config.minibatch_size,
        }
    }
}

/// One minibatch of transitions with blended advantages.
#[derive(Debug, Clone, PartialEq)]
pub struct RndRolloutBatch<A> {
    /// Flattened observations [batch * obs_size]
    pub states: Vec<f32>,
    pub actions: Vec<A>,
    pub masks: Vec<f32>,
    pub returns: Vec<f32>,
    pub values: Vec<f32>,
    pub old_log_probs: Vec<f32>,
    pub pseudo_values: Vec<f32>,
    pub pseudo_returns: Vec<f32>,
    pub advantages: Vec<f32>,
}

impl<A> RndRolloutBatch<A> {
    pub fn len(&self) -> usize {
        self.advantages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advantages.is_empty()
    }
}

/// Flattened view of a finalized RND rollout.
///
/// Both the extrinsic returns of the base storage and the pseudo returns must
/// have been computed.
#[derive(Debug, Clone)]
pub struct RndRolloutSampler<A: Clone> {
    data: RndRolloutBatch<A>,
    obs_size: usize,
    minibatch_size: usize,
}

impl<A: Clone> RndRolloutSampler<A> {
    /// Copy the rollout and blend its advantages.
    pub fn new(
        storage: &RndRolloutStorage<A>,
        config: &AdvantageBlendConfig,
    ) -> Result<Self, RndError> {
        let base = storage.base();
        let ext_advantages = base.advantages()?;
        let pseudo_returns = storage.batched_returns()?;
        let pseudo_values = storage.batched_values();
        if pseudo_returns.len() != ext_advantages.len() {
            return Err(RndError::shape(
                "pseudo returns",
                ext_advantages.len(),
                pseudo_returns.len(),
            ));
        }

        let advantages = blend_advantages(&ext_advantages, pseudo_returns, pseudo_values, config);

        Ok(Self {
            data: RndRolloutBatch {
                states: base.states().to_vec(),
                actions: base.actions().to_vec(),
                masks: base.step_masks().to_vec(),
                returns: base.returns().to_vec(),
                values: base.values().to_vec(),
                old_log_probs: base.old_log_probs().to_vec(),
                pseudo_values: pseudo_values.to_vec(),
                pseudo_returns: pseudo_returns.to_vec(),
                advantages,
            },
            obs_size: base.obs_size(),
            minibatch_size: config.minibatch_size.max(1),
        })
    }

    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Blended advantages of the whole rollout.
    pub fn advantages(&self) -> &[f32] {
        &self.data.advantages
    }

    /// The whole rollout as a single batch.
    pub fn full_batch(&self) -> &RndRolloutBatch<A> {
        &self.data
    }

    /// Shuffled index groups of at most `minibatch_size` transitions.
    pub fn minibatch_indices<R: Rng>(&self, rng: &mut R) -> Vec<Vec<usize>> {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(rng);
        indices
            .chunks(self.minibatch_size)
            .map(|chunk| chunk.to_vec())
            .collect()
    }

    /// Gather the transitions at `indices`.
    pub fn make_batch(&self, indices: &[usize]) -> RndRolloutBatch<A> {
        let d = &self.data;
        let obs = self.obs_size;
        let pick = |v: &[f32]| indices.iter().map(|&i| v[i]).collect::<Vec<f32>>();

        RndRolloutBatch {
            states: indices
                .iter()
                .flat_map(|&i| &d.states[i * obs..(i + 1) * obs])
                .copied()
                .collect(),
            actions: indices.iter().map(|&i| d.actions[i].clone()).collect(),
            masks: pick(&d.masks),
            returns: pick(&d.returns),
            values: pick(&d.values),
            old_log_probs: pick(&d.old_log_probs),
            pseudo_values: pick(&d.pseudo_values),
            pseudo_returns: pick(&d.pseudo_returns),
            advantages: pick(&d.advantages),
        }
    }

    /// Shuffled minibatches covering every transition once.
    pub fn minibatches<R: Rng>(&self, rng: &mut R) -> Vec<RndRolloutBatch<A>> {
        self.minibatch_indices(rng)
            .iter()
            .map(|indices| self.make_batch(indices))
            .collect()
    }
}

/// Blend extrinsic advantages with intrinsic pseudo advantages.
pub fn blend_advantages(
    ext_advantages: &[f32],
    pseudo_returns: &[f32],
    pseudo_values: &[f32],
    config: &AdvantageBlendConfig,
) -> Vec<f32> {
    let mut advantages: Vec<f32> = ext_advantages
        .iter()
        .zip(pseudo_returns.iter().zip(pseudo_values))
        .map(|(&ext, (&ret, &val))| ext * config.ext_coeff + (ret - val) * config.int_coeff)
        .collect();

    if let Some(eps) = config.normalize_eps {
        normalize_advantages(&mut advantages, eps);
    }
    advantages
}
