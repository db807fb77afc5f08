//! Observation normalization for the RND networks.
//!
//! Both RND networks see whitened single frames: one channel of the stacked
//! observation, shifted by the per-pixel running mean, scaled by the
//! per-pixel running standard deviation and clipped.
//!
//! ```text
//! x̂ = clip((x[:, c] − μ) / σ, low, high)
//! ```
//!
//! Without whitening the target network's random features barely vary
//! across observations, and the prediction error carries little signal.

use burn::prelude::*;

use super::config::RndConfig;
use crate::core::{RndError, RunningMoments};

/// Strategy for turning pixel-range observations into network inputs.
///
/// `moments` hold per-pixel statistics of single frames (`H * W` entries) and
/// are already updated with `batch` when this is called.
pub trait ObservationNormalizer {
    /// Check that a batch of shape `dims` can be normalized, before any
    /// statistics are updated with it.
    fn validate(&self, dims: [usize; 4]) -> Result<(), RndError> {
        let _ = dims;
        Ok(())
    }

    /// Normalize `batch` of shape `[N, C, H, W]` into network input.
    fn normalize<B: Backend>(
        &self,
        batch: Tensor<B, 4>,
        moments: &RunningMoments,
    ) -> Result<Tensor<B, 4>, RndError>;
}

/// Default normalizer: select one channel, whiten per pixel, clip.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelNormalizer {
    /// Channel of the observation stack fed to the networks
    pub channel: usize,
    /// Symmetric clip range applied after whitening
    pub clip_range: (f32, f32),
    /// Floor for the per-pixel standard deviation
    pub epsilon: f64,
}

impl Default for PixelNormalizer {
    fn default() -> Self {
        Self {
            channel: 1,
            clip_range: (-5.0, 5.0),
            epsilon: 1e-8,
        }
    }
}

impl PixelNormalizer {
    /// Build from the RND config.
    pub fn from_config(config: &RndConfig) -> Self {
        Self {
            channel: config.norm_channel,
            clip_range: config.obs_clip,
            epsilon: config.epsilon,
        }
    }
}

impl ObservationNormalizer for PixelNormalizer {
    fn validate(&self, dims: [usize; 4]) -> Result<(), RndError> {
        let channels = dims[1];
        if self.channel >= channels {
            return Err(RndError::shape(
                "normalization channel",
                format!("index < {}", channels),
                self.channel,
            ));
        }
        Ok(())
    }

    fn normalize<B: Backend>(
        &self,
        batch: Tensor<B, 4>,
        moments: &RunningMoments,
    ) -> Result<Tensor<B, 4>, RndError> {
        let dims = batch.dims();
        self.validate(dims)?;
        let [_, _, height, width] = dims;
        if moments.dim() != height * width {
            return Err(RndError::shape("frame pixels", moments.dim(), height * width));
        }

        let device = batch.device();
        let mean: Vec<f32> = moments.mean().iter().map(|&m| m as f32).collect();
        let std: Vec<f32> = moments
            .std_vec(self.epsilon)
            .iter()
            .map(|&s| s as f32)
            .collect();

        let mean = Tensor::<B, 1>::from_floats(mean.as_slice(), &device)
            .reshape([1, 1, height, width]);
        let std = Tensor::<B, 1>::from_floats(std.as_slice(), &device)
            .reshape([1, 1, height, width]);

        let frames = batch.narrow(1, self.channel, 1);
        let (low, high) = self.clip_range;
        Ok(((frames - mean) / std).clamp(low, high))
    }
}
