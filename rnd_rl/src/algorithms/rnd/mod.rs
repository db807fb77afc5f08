//! Random Network Distillation (RND) components.
//!
//! This module provides the intrinsic reward pipeline:
//! - `IntrinsicRewardGenerator`: target/predictor surprise, filtered and normalized
//! - `ObservationNormalizer`: whitening of the frames fed to both networks
//! - `RndConvBody`: default convolutional target and predictor
//! - `RndRolloutStorage`: pseudo-reward stream with GAE returns
//! - `RndRolloutSampler`: blends extrinsic and intrinsic advantages into minibatches

mod config;
mod generator;
pub mod network;
pub mod normalizer;
mod rollout;
mod sampler;

#[cfg(test)]
mod tests;

pub use config::RndConfig;
pub use generator::{IntrinsicRewardGenerator, IntrinsicRewardSample};
pub use network::{RndConvBody, RndConvConfig, RndNetwork};
pub use normalizer::{ObservationNormalizer, PixelNormalizer};
pub use rollout::RndRolloutStorage;
pub use sampler::{blend_advantages, AdvantageBlendConfig, RndRolloutBatch, RndRolloutSampler};
