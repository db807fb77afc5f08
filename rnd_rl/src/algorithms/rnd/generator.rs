//! Intrinsic reward generation with Random Network Distillation.
//!
//! Each call to [`IntrinsicRewardGenerator::generate`] takes one rollout of
//! observations, laid out time-major as `[horizon * n_workers, C, H, W]`, and
//! returns a novelty reward per (step, worker):
//!
//! ```text
//! obs'   = normalize(obs * pixel_scale)          // observation moments updated first
//! raw    = mean_d (target(obs') - predictor(obs'))²
//! R_t    = filter(raw_t)                          // non-episodic discounted sum
//! reward = R_t / σ(R)                             // reward moments updated first
//! ```
//!
//! The predictor is trained separately on [`auxiliary_loss`] so that its
//! error shrinks on familiar states.
//!
//! [`auxiliary_loss`]: IntrinsicRewardGenerator::auxiliary_loss

use std::marker::PhantomData;

use burn::module::{AutodiffModule, Module, ModuleVisitor, Param, ParamId};
use burn::optim::{GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use rand::Rng;

use super::config::RndConfig;
use super::network::RndNetwork;
use super::normalizer::{ObservationNormalizer, PixelNormalizer};
use crate::core::{
    ConfigError, NonEpisodicReturnFilter, NumericalDiagnostics, RndError, RunningMoments,
};

/// Rewards for one rollout, time-major and worker-minor.
#[derive(Debug, Clone)]
pub struct IntrinsicRewardSample<B: Backend> {
    /// Squared prediction error per transition
    pub raw: Vec<f32>,
    /// Filtered returns before reward normalization
    pub filtered: Vec<f32>,
    /// Normalized intrinsic rewards
    pub rewards: Vec<f32>,
    pub horizon: usize,
    pub n_workers: usize,
    /// Target embeddings `[horizon * n_workers, D]`, regression targets for
    /// the predictor
    pub targets: Tensor<B, 2>,
    pub diagnostics: NumericalDiagnostics,
}

impl<B: Backend> IntrinsicRewardSample<B> {
    /// Normalized rewards of step `t`, one per worker; `None` past the horizon.
    pub fn row(&self, t: usize) -> Option<&[f32]> {
        if t >= self.horizon {
            return None;
        }
        self.rewards.get(t * self.n_workers..(t + 1) * self.n_workers)
    }
}

/// Produces intrinsic rewards from a frozen target and a trained predictor.
///
/// # Type Parameters
///
/// - `B`: Autodiff backend the predictor trains on
/// - `T`: Target network, kept on the inner backend and never updated
/// - `P`: Predictor network
/// - `N`: Observation normalization strategy
pub struct IntrinsicRewardGenerator<B, T, P, N = PixelNormalizer>
where
    B: AutodiffBackend,
    T: RndNetwork<B::InnerBackend>,
    P: RndNetwork<B> + AutodiffModule<B>,
    P::InnerModule: RndNetwork<B::InnerBackend>,
    N: ObservationNormalizer,
{
    target: T,
    predictor: P,
    normalizer: N,
    obs_moments: RunningMoments,
    return_filter: NonEpisodicReturnFilter,
    reward_moments: RunningMoments,
    config: RndConfig,
    _backend: PhantomData<B>,
}

impl<B, T, P> IntrinsicRewardGenerator<B, T, P, PixelNormalizer>
where
    B: AutodiffBackend,
    T: RndNetwork<B::InnerBackend>,
    P: RndNetwork<B> + AutodiffModule<B>,
    P::InnerModule: RndNetwork<B::InnerBackend>,
{
    /// Create a generator with the default pixel normalizer.
    pub fn new(target: T, predictor: P, config: RndConfig) -> Result<Self, RndError> {
        let normalizer = PixelNormalizer::from_config(&config);
        Self::with_normalizer(target, predictor, normalizer, config)
    }
}

impl<B, T, P, N> IntrinsicRewardGenerator<B, T, P, N>
where
    B: AutodiffBackend,
    T: RndNetwork<B::InnerBackend>,
    P: RndNetwork<B> + AutodiffModule<B>,
    P::InnerModule: RndNetwork<B::InnerBackend>,
    N: ObservationNormalizer,
{
    /// Create a generator with a custom observation normalizer.
    pub fn with_normalizer(
        target: T,
        predictor: P,
        normalizer: N,
        config: RndConfig,
    ) -> Result<Self, RndError> {
        config.validate()?;

        let target_shape = target.input_shape();
        if predictor.input_shape() != target_shape {
            return Err(RndError::shape(
                "predictor input",
                format!("{:?}", target_shape),
                format!("{:?}", predictor.input_shape()),
            ));
        }
        if predictor.output_dim() != target.output_dim() {
            return Err(RndError::shape(
                "predictor output",
                target.output_dim(),
                predictor.output_dim(),
            ));
        }

        let [_, height, width] = target_shape;
        Ok(Self {
            target,
            predictor,
            normalizer,
            obs_moments: RunningMoments::new(height * width),
            return_filter: NonEpisodicReturnFilter::new(config.int_gamma, config.n_workers),
            reward_moments: RunningMoments::scalar(),
            config,
            _backend: PhantomData,
        })
    }

    /// Compute intrinsic rewards for one rollout of observations.
    ///
    /// Updates the observation moments, the return filter and the reward
    /// moments, in that order.
    pub fn generate(
        &mut self,
        observations: Tensor<B::InnerBackend, 4>,
    ) -> Result<IntrinsicRewardSample<B::InnerBackend>, RndError> {
        let n_workers = self.config.n_workers;
        let dims = observations.dims();
        let [n, channels, height, width] = dims;
        self.check_frames(height, width)?;
        self.normalizer.validate(dims)?;
        if n == 0 || n % n_workers != 0 {
            return Err(RndError::shape(
                "observation batch",
                format!("positive multiple of {} workers", n_workers),
                n,
            ));
        }
        let horizon = n / n_workers;

        let scaled = observations.mul_scalar(self.config.pixel_scale);
        let pixels = tensor_to_vec(scaled.clone())?;
        debug_assert_eq!(pixels.len(), n * channels * height * width);
        self.obs_moments.update_batch(&pixels);

        let normalized = self.normalizer.normalize(scaled, &self.obs_moments)?;
        let targets = self.target.embed(normalized.clone());
        let predictions = self.predictor.valid().embed(normalized);

        let raw = tensor_to_vec(prediction_error(targets.clone(), predictions))?;

        let mut filtered = Vec::with_capacity(raw.len());
        for row in raw.chunks_exact(n_workers) {
            filtered.extend(self.return_filter.update(row)?);
        }

        self.reward_moments.update_batch(&filtered);
        let diagnostics = NumericalDiagnostics::for_rewards(&self.reward_moments, self.config.epsilon)
            .with_observations(&self.obs_moments, self.config.epsilon);
        let std = diagnostics.reward_std;
        let rewards: Vec<f32> = filtered.iter().map(|&r| (r as f64 / std) as f32).collect();

        log::debug!(
            "RND rewards: horizon={} workers={} raw_mean={:.6} reward_std={:.6}",
            horizon,
            n_workers,
            raw.iter().map(|&r| r as f64).sum::<f64>() / raw.len() as f64,
            std
        );

        Ok(IntrinsicRewardSample {
            raw,
            filtered,
            rewards,
            horizon,
            n_workers,
            targets,
            diagnostics,
        })
    }

    /// Predictor regression loss on a random subset of observations.
    ///
    /// Uses the configured `aux_sample_ratio` and the thread-local RNG.
    /// Returns `Ok(None)` when no sample is selected; the caller then skips
    /// the predictor update.
    pub fn auxiliary_loss(
        &self,
        observations: Tensor<B::InnerBackend, 4>,
        targets: Tensor<B::InnerBackend, 2>,
    ) -> Result<Option<Tensor<B, 1>>, RndError> {
        let ratio = self.config.aux_sample_ratio;
        self.auxiliary_loss_with_rng(observations, targets, ratio, &mut rand::thread_rng())
    }

    /// [`auxiliary_loss`](Self::auxiliary_loss) with an explicit ratio and RNG.
    ///
    /// Each row is kept independently with probability `sample_ratio`.
    /// Observation moments are read, not updated.
    pub fn auxiliary_loss_with_rng<R: Rng>(
        &self,
        observations: Tensor<B::InnerBackend, 4>,
        targets: Tensor<B::InnerBackend, 2>,
        sample_ratio: f32,
        rng: &mut R,
    ) -> Result<Option<Tensor<B, 1>>, RndError> {
        if !(0.0..=1.0).contains(&sample_ratio) {
            return Err(ConfigError::OutOfRange {
                field: "sample_ratio",
                value: sample_ratio,
                min: 0.0,
                max: 1.0,
            }
            .into());
        }

        let dims = observations.dims();
        let [n, _, height, width] = dims;
        self.check_frames(height, width)?;
        self.normalizer.validate(dims)?;
        let [target_rows, target_dim] = targets.dims();
        if target_rows != n {
            return Err(RndError::shape("target rows", n, target_rows));
        }
        if target_dim != self.target.output_dim() {
            return Err(RndError::shape("target dim", self.target.output_dim(), target_dim));
        }

        let selected = bernoulli_indices(n, sample_ratio, rng);
        if selected.is_empty() {
            log::debug!("Empty auxiliary mask for {} samples, skipping predictor loss", n);
            return Ok(None);
        }

        let device = observations.device();
        let indices = Tensor::<B::InnerBackend, 1, Int>::from_ints(selected.as_slice(), &device);

        let scaled = observations.mul_scalar(self.config.pixel_scale);
        let normalized = self.normalizer.normalize(scaled, &self.obs_moments)?;
        let inputs = Tensor::<B, 4>::from_inner(normalized.select(0, indices.clone()));
        let targets = Tensor::<B, 2>::from_inner(targets.select(0, indices));

        let predictions = self.predictor.embed(inputs);
        Ok(Some(prediction_error(targets, predictions).mean()))
    }

    /// Apply one optimizer step to the predictor.
    pub fn optimize_predictor<O: Optimizer<P, B>>(
        &mut self,
        optimizer: &mut O,
        learning_rate: f64,
        loss: Tensor<B, 1>,
    ) {
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.predictor);
        self.predictor = optimizer.step(learning_rate, self.predictor.clone(), grads);
    }

    /// Ids of the predictor parameters. The target has none to train.
    pub fn trainable_parameters(&self) -> Vec<ParamId> {
        let mut collector = ParamIdCollector::default();
        self.predictor.visit(&mut collector);
        collector.ids
    }

    /// Number of trainable scalars.
    pub fn num_trainable_params(&self) -> usize {
        self.predictor.num_params()
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    /// Replace the predictor, e.g. after an external optimizer step.
    pub fn set_predictor(&mut self, predictor: P) {
        self.predictor = predictor;
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// Per-pixel observation statistics.
    pub fn obs_moments(&self) -> &RunningMoments {
        &self.obs_moments
    }

    /// Statistics of the filtered rewards.
    pub fn reward_moments(&self) -> &RunningMoments {
        &self.reward_moments
    }

    pub fn return_filter(&self) -> &NonEpisodicReturnFilter {
        &self.return_filter
    }

    pub fn config(&self) -> &RndConfig {
        &self.config
    }

    fn check_frames(&self, height: usize, width: usize) -> Result<(), RndError> {
        let [_, want_h, want_w] = self.target.input_shape();
        if (height, width) != (want_h, want_w) {
            return Err(RndError::shape(
                "observation frame",
                format!("{}x{}", want_h, want_w),
                format!("{}x{}", height, width),
            ));
        }
        Ok(())
    }
}

/// Indices of `0..n`, each kept independently with probability `ratio`.
pub(crate) fn bernoulli_indices<R: Rng>(n: usize, ratio: f32, rng: &mut R) -> Vec<i32> {
    (0..n as i32).filter(|_| rng.gen::<f32>() < ratio).collect()
}

/// Per-row mean squared difference `[N, D] -> [N]`.
fn prediction_error<B: Backend>(targets: Tensor<B, 2>, predictions: Tensor<B, 2>) -> Tensor<B, 1> {
    (targets - predictions).powf_scalar(2.0).mean_dim(1).flatten(0, 1)
}

fn tensor_to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>, RndError> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| RndError::Tensor(format!("{:?}", e)))
}

#[derive(Default)]
struct ParamIdCollector {
    ids: Vec<ParamId>,
}

impl<B: Backend> ModuleVisitor<B> for ParamIdCollector {
    fn visit_float<const D: usize>(&mut self, param: &Param<Tensor<B, D>>) {
        self.ids.push(param.id);
    }
}
