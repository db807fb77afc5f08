//! Configuration for RND intrinsic rewards.

use serde::{Deserialize, Serialize};

use crate::core::{ConfigError, FilterDecay};

/// Configuration for the intrinsic reward generator, pseudo-rollout storage
/// and advantage blending.
///
/// Defaults follow Burda et al., "Exploration by Random Network Distillation"
/// (2018) where the paper states a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RndConfig {
    /// Number of parallel workers batched per step.
    pub n_workers: usize,
    /// Steps collected per training cycle.
    pub horizon: usize,
    /// Discount factor of the intrinsic return filter and pseudo returns.
    pub int_gamma: f32,
    /// GAE λ for pseudo returns.
    pub gae_lambda: f32,
    /// Weight of extrinsic advantages in the blend.
    pub ext_coeff: f32,
    /// Weight of intrinsic advantages in the blend.
    pub int_coeff: f32,
    /// Normalize blended advantages with this denominator floor.
    pub adv_normalize_eps: Option<f32>,
    /// Probability that a sample contributes to the predictor loss.
    pub aux_sample_ratio: f32,
    /// Clip range of normalized observations.
    pub obs_clip: (f32, f32),
    /// Observation channel fed to the RND networks.
    pub norm_channel: usize,
    /// Factor mapping raw observations to pixel range.
    pub pixel_scale: f32,
    /// Floor applied to standard deviations before dividing.
    pub epsilon: f64,
    /// Forward filter applied to pushed pseudo rewards (none by default).
    pub pseudo_filter: Option<FilterDecay>,
    /// Whether pseudo returns respect episode boundaries.
    pub use_int_masks: bool,
    /// Minibatch size used by the sampler.
    pub minibatch_size: usize,
}

impl RndConfig {
    /// Create a config for `n_workers` workers and `horizon` steps per cycle.
    pub fn new(n_workers: usize, horizon: usize) -> Self {
        Self {
            n_workers,
            horizon,
            int_gamma: 0.99,
            gae_lambda: 0.95,
            ext_coeff: 2.0,
            int_coeff: 1.0,
            adv_normalize_eps: Some(1e-8),
            aux_sample_ratio: 0.25,
            obs_clip: (-5.0, 5.0),
            norm_channel: 1,
            pixel_scale: 255.0,
            epsilon: 1e-8,
            pseudo_filter: None,
            use_int_masks: false,
            minibatch_size: 256,
        }
    }

    pub fn with_int_gamma(mut self, gamma: f32) -> Self {
        self.int_gamma = gamma;
        self
    }

    pub fn with_gae_lambda(mut self, lambda: f32) -> Self {
        self.gae_lambda = lambda;
        self
    }

    /// Set the extrinsic and intrinsic advantage weights.
    pub fn with_coefficients(mut self, ext_coeff: f32, int_coeff: f32) -> Self {
        self.ext_coeff = ext_coeff;
        self.int_coeff = int_coeff;
        self
    }

    pub fn with_adv_normalize_eps(mut self, eps: Option<f32>) -> Self {
        self.adv_normalize_eps = eps;
        self
    }

    pub fn with_aux_sample_ratio(mut self, ratio: f32) -> Self {
        self.aux_sample_ratio = ratio;
        self
    }

    pub fn with_obs_clip(mut self, low: f32, high: f32) -> Self {
        self.obs_clip = (low, high);
        self
    }

    pub fn with_norm_channel(mut self, channel: usize) -> Self {
        self.norm_channel = channel;
        self
    }

    pub fn with_pixel_scale(mut self, scale: f32) -> Self {
        self.pixel_scale = scale;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_pseudo_filter(mut self, decay: Option<FilterDecay>) -> Self {
        self.pseudo_filter = decay;
        self
    }

    pub fn with_int_masks(mut self, use_masks: bool) -> Self {
        self.use_int_masks = use_masks;
        self
    }

    pub fn with_minibatch_size(mut self, size: usize) -> Self {
        self.minibatch_size = size;
        self
    }

    /// Total transitions per cycle.
    pub fn transitions_per_rollout(&self) -> usize {
        self.n_workers * self.horizon
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("n_workers", self.n_workers),
            ("horizon", self.horizon),
            ("minibatch_size", self.minibatch_size),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidCount { field, value });
            }
        }

        // γ = 0 would make the inverse filter divide by zero
        if self.int_gamma <= 0.0 || self.int_gamma > 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "int_gamma",
                value: self.int_gamma,
                min: 0.0,
                max: 1.0,
            });
        }
        check_unit("gae_lambda", self.gae_lambda)?;
        check_unit("aux_sample_ratio", self.aux_sample_ratio)?;

        if let Some(eps) = self.adv_normalize_eps {
            if eps <= 0.0 {
                return Err(ConfigError::OutOfRange {
                    field: "adv_normalize_eps",
                    value: eps,
                    min: f32::MIN_POSITIVE,
                    max: f32::MAX,
                });
            }
        }
        if self.obs_clip.0 >= self.obs_clip.1 {
            return Err(ConfigError::OutOfRange {
                field: "obs_clip",
                value: self.obs_clip.0,
                min: f32::MIN,
                max: self.obs_clip.1,
            });
        }
        if self.pixel_scale <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "pixel_scale",
                value: self.pixel_scale,
                min: f32::MIN_POSITIVE,
                max: f32::MAX,
            });
        }
        if self.epsilon <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "epsilon",
                value: self.epsilon as f32,
                min: f32::MIN_POSITIVE,
                max: f32::MAX,
            });
        }

        Ok(())
    }
}

fn check_unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 1.0,
        })
    }
}
