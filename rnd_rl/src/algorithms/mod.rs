//! Algorithm components for RND training.
//!
//! - `gae`: Generalized Advantage Estimation over masked, vectorized rollouts
//! - `rnd`: Random Network Distillation intrinsic rewards and pseudo returns

pub mod gae;
pub mod rnd;

pub use gae::{masked_gae_returns, masked_gae_returns_f64, normalize_advantages};
pub use rnd::{
    AdvantageBlendConfig, IntrinsicRewardGenerator, IntrinsicRewardSample, ObservationNormalizer,
    PixelNormalizer, RndConfig, RndConvBody, RndConvConfig, RndNetwork, RndRolloutBatch,
    RndRolloutSampler, RndRolloutStorage,
};
