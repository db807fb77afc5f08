//! # RND: Random Network Distillation intrinsic rewards
//!
//! Exploration bonus for on-policy agents. A randomly initialized target
//! network stays frozen while a predictor learns to imitate it; the
//! prediction error on an observation is its novelty reward. The rewards are
//! turned into their own GAE returns and blended with the extrinsic
//! advantages before the policy update.
//!
//! ## Data Flow
//!
//! ```text
//! observations ──► ObservationNormalizer ──► target ─┐
//!                                       └──► predictor ─┴─► (t - p)² ──► return filter
//!                                                                          │
//!     advantages ◄── RndRolloutSampler ◄── RndRolloutStorage (GAE) ◄── reward moments
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rnd_rl::{IntrinsicRewardGenerator, RndConfig, RndConvConfig, RndRolloutStorage};
//!
//! let config = RndConfig::new(8, 128);
//! let nets = RndConvConfig::new([1, 84, 84]);
//! let mut generator = IntrinsicRewardGenerator::<B, _, _>::new(
//!     nets.init_target(&device),
//!     nets.init_predictor(&device),
//!     config.clone(),
//! )?;
//!
//! let mut storage = RndRolloutStorage::<u32>::from_config(&config, obs_size)?;
//!
//! let sample = generator.generate(observations)?;
//! storage.push_sample(&sample, &int_values)?;
//! storage.compute_returns_from_config(&int_bootstrap, &config)?;
//! ```

pub mod algorithms;
pub mod core;

pub use crate::algorithms::rnd::{
    AdvantageBlendConfig, IntrinsicRewardGenerator, IntrinsicRewardSample, ObservationNormalizer,
    PixelNormalizer, RndConfig, RndConvBody, RndConvConfig, RndNetwork, RndRolloutBatch,
    RndRolloutSampler, RndRolloutStorage,
};
pub use crate::core::{
    ConfigError, FilterDecay, NonEpisodicReturnFilter, NumericalDiagnostics, RndError,
    RolloutStorage, RunningMoments, SharedRunningMoments,
};
