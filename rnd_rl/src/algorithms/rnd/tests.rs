//! Behavioral tests for the RND submodule.
//!
//! # Test Categories
//!
//! 1. **Pseudo Returns**: GAE over normalized intrinsic rewards, λ limits, masks
//! 2. **Storage Lifecycle**: push ordering, reset, batched views
//! 3. **Generator**: reward shapes, filtering, auxiliary loss, parameters
//! 4. **Sampler**: advantage blending and minibatch coverage
//!
//! # Backend
//!
//! Tensor tests run on `Autodiff<NdArray<f32>>`.

#[cfg(test)]
mod tests {
    use super::super::*;
    use super::super::generator::bernoulli_indices;
    use crate::core::{ConfigError, FilterDecay, RndError};

    use burn::backend::{Autodiff, NdArray};
    use burn::module::Module;
    use burn::optim::AdamConfig;
    use burn::tensor::{Distribution, Tensor};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    type Inner = NdArray<f32>;
    type B = Autodiff<Inner>;
    type Generator = IntrinsicRewardGenerator<B, RndConvBody<Inner>, RndConvBody<B>>;

    const EPS: f64 = 1e-8;

    // ============================================================================
    // Helpers
    // ============================================================================

    fn assert_close(actual: &[f32], expected: &[f64], tol: f64) {
        assert_eq!(actual.len(), expected.len());
        for (i, (&a, &e)) in actual.iter().zip(expected).enumerate() {
            assert!(
                (a as f64 - e).abs() < tol,
                "index {}: expected {}, got {}",
                i,
                e,
                a
            );
        }
    }

    /// Push `rewards` (time-major) with zero values.
    fn push_rewards(storage: &mut RndRolloutStorage<u32>, rewards: &[f32]) {
        let n = storage.base().n_workers();
        for row in rewards.chunks(n) {
            storage.push_pseudo(row, &vec![0.0; n]).unwrap();
        }
    }

    fn reward_std(storage: &RndRolloutStorage<u32>) -> f64 {
        storage.reward_moments().std_vec(EPS)[0]
    }

    // ============================================================================
    // Pseudo Returns
    // ============================================================================

    #[test]
    fn test_end_to_end_pseudo_returns() {
        // horizon 3, 2 workers, rows are time steps
        let mut storage = RndRolloutStorage::<u32>::new(2, 3, 1).unwrap();
        push_rewards(&mut storage, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);

        let diag = storage.compute_returns(&[0.0, 0.0], 0.99, 0.95, false).unwrap();
        assert!((diag.reward_std - (2.0f64 / 9.0).sqrt()).abs() < 1e-12);
        assert!(!diag.reward_std_floored);

        let expected = [
            3.99771357, 3.87149501, //
            1.99510178, 4.11642213, //
            2.12132034, 2.12132034,
        ];
        assert_close(storage.batched_returns().unwrap(), &expected, 1e-6);
    }

    #[test]
    fn test_lambda_zero_gives_one_step_td() {
        let mut storage = RndRolloutStorage::<u32>::new(1, 3, 1).unwrap();
        let rewards = [1.0, 3.0, 2.0];
        let values = [0.5, -1.0, 2.0];
        for (r, v) in rewards.iter().zip(&values) {
            storage.push_pseudo(&[*r], &[*v]).unwrap();
        }
        let bootstrap = 4.0;
        storage.compute_returns(&[bootstrap], 0.9, 0.0, false).unwrap();

        let std = reward_std(&storage);
        let next = [values[1] as f64, values[2] as f64, bootstrap as f64];
        let expected: Vec<f64> = (0..3)
            .map(|t| rewards[t] as f64 / std + 0.9 * next[t])
            .collect();
        assert_close(storage.batched_returns().unwrap(), &expected, 1e-5);
    }

    #[test]
    fn test_lambda_one_gives_discounted_monte_carlo() {
        let mut storage = RndRolloutStorage::<u32>::new(1, 4, 1).unwrap();
        let rewards = [0.5, 1.0, 0.0, 2.0];
        let values = [3.0, -2.0, 0.25, 1.0];
        for (r, v) in rewards.iter().zip(&values) {
            storage.push_pseudo(&[*r], &[*v]).unwrap();
        }
        let bootstrap = 1.5f64;
        let gamma = 0.9f64;
        storage.compute_returns(&[bootstrap as f32], gamma as f32, 1.0, false).unwrap();

        let std = reward_std(&storage);
        let mut expected = vec![0.0; 4];
        let mut ret = bootstrap;
        for t in (0..4).rev() {
            ret = rewards[t] as f64 / std + gamma * ret;
            expected[t] = ret;
        }
        assert_close(storage.batched_returns().unwrap(), &expected, 1e-5);
    }

    #[test]
    fn test_mask_stops_gae_propagation() {
        let run = |use_masks: bool| -> Vec<f32> {
            let mut storage = RndRolloutStorage::<u32>::new(1, 3, 1).unwrap();
            for (t, r) in [1.0, 0.0, 2.0].iter().enumerate() {
                storage
                    .base_mut()
                    .push_step(&[0.0], vec![0], &[0.0], &[t == 0], &[0.0], &[0.0])
                    .unwrap();
                storage.push_pseudo(&[*r], &[0.0]).unwrap();
            }
            storage.compute_returns(&[0.0], 0.99, 0.95, use_masks).unwrap();
            storage.batched_returns().unwrap().to_vec()
        };

        let masked = run(true);
        let unmasked = run(false);
        let std = (2.0f64 / 3.0).sqrt();

        // Episode ended after step 0: mask row 1 is zero
        assert!(masked[1].abs() < 1e-6);
        assert!((unmasked[1] as f64 - 0.99 * 0.95 * 2.0 / std).abs() < 1e-5);
        assert!((masked[2] as f64 - 2.0 / std).abs() < 1e-5);
        assert_eq!(masked[2], unmasked[2]);
    }

    #[test]
    fn test_reward_moments_persist_across_cycles() {
        let mut storage = RndRolloutStorage::<u32>::new(2, 1, 1).unwrap();
        push_rewards(&mut storage, &[1.0, 3.0]);
        storage.compute_returns(&[0.0, 0.0], 0.99, 0.95, false).unwrap();
        storage.reset();

        push_rewards(&mut storage, &[1.0, 3.0]);
        storage.compute_returns(&[0.0, 0.0], 0.99, 0.95, false).unwrap();
        assert_eq!(storage.reward_moments().count(), 4.0);
        assert!((reward_std(&storage) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pseudo_filter_is_opt_in() {
        let mut plain = RndRolloutStorage::<u32>::new(1, 2, 1).unwrap();
        push_rewards(&mut plain, &[1.0, 1.0]);
        assert_eq!(plain.pseudo_rewards(), &[1.0, 1.0]);

        let mut discounted = RndRolloutStorage::<u32>::new(1, 2, 1).unwrap().with_filter(0.5, FilterDecay::Discount);
        push_rewards(&mut discounted, &[1.0, 1.0]);
        assert_eq!(discounted.pseudo_rewards(), &[1.0, 1.5]);

        let mut inverse =
            RndRolloutStorage::<u32>::new(1, 2, 1).unwrap().with_filter(0.5, FilterDecay::InverseDiscount);
        push_rewards(&mut inverse, &[1.0, 1.0]);
        assert_eq!(inverse.pseudo_rewards(), &[1.0, 3.0]);
    }

    #[test]
    fn test_from_config_applies_pseudo_filter() {
        let config = RndConfig::new(1, 2)
            .with_int_gamma(0.5)
            .with_pseudo_filter(Some(FilterDecay::Discount));
        let mut storage = RndRolloutStorage::<u32>::from_config(&config, 1).unwrap();
        push_rewards(&mut storage, &[1.0, 1.0]);
        assert_eq!(storage.pseudo_rewards(), &[1.0, 1.5]);

        let mut plain = RndRolloutStorage::<u32>::from_config(&RndConfig::new(1, 2), 1).unwrap();
        push_rewards(&mut plain, &[1.0, 1.0]);
        assert_eq!(plain.pseudo_rewards(), &[1.0, 1.0]);
    }

    #[test]
    fn test_compute_returns_from_config_defaults() {
        // Default int_gamma 0.99, gae_lambda 0.95, no episode masks
        let config = RndConfig::new(2, 3);
        let mut storage = RndRolloutStorage::<u32>::from_config(&config, 1).unwrap();
        push_rewards(&mut storage, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        storage.compute_returns_from_config(&[0.0, 0.0], &config).unwrap();

        let expected = [
            3.99771357, 3.87149501, //
            1.99510178, 4.11642213, //
            2.12132034, 2.12132034,
        ];
        assert_close(storage.batched_returns().unwrap(), &expected, 1e-6);
    }

    #[test]
    fn test_compute_returns_from_config_uses_masks() {
        let config = RndConfig::new(1, 3).with_int_masks(true);
        let mut storage = RndRolloutStorage::<u32>::from_config(&config, 1).unwrap();
        for (t, r) in [1.0, 0.0, 2.0].iter().enumerate() {
            storage
                .base_mut()
                .push_step(&[0.0], vec![0], &[0.0], &[t == 0], &[0.0], &[0.0])
                .unwrap();
            storage.push_pseudo(&[*r], &[0.0]).unwrap();
        }
        storage.compute_returns_from_config(&[0.0], &config).unwrap();
        assert!(storage.batched_returns().unwrap()[1].abs() < 1e-6);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = RndRolloutStorage::<u32>::new(0, 2, 1).unwrap_err();
        assert_eq!(
            err,
            RndError::Config(ConfigError::InvalidCount { field: "n_workers", value: 0 })
        );

        let err = RndRolloutStorage::<u32>::from_config(&RndConfig::new(0, 2), 1).unwrap_err();
        assert!(matches!(err, RndError::Config(ConfigError::InvalidCount { .. })));

        let err = RndRolloutStorage::<u32>::new(2, 0, 1).unwrap_err();
        assert!(matches!(err, RndError::Config(ConfigError::InvalidCount { field: "rollout_len", .. })));
    }

    // ============================================================================
    // Storage Lifecycle
    // ============================================================================

    #[test]
    fn test_batched_views_keep_push_layout() {
        let mut storage = RndRolloutStorage::<u32>::new(3, 2, 1).unwrap();
        storage.push_pseudo(&[1.0, 2.0, 3.0], &[0.1, 0.2, 0.3]).unwrap();
        storage.push_pseudo(&[4.0, 5.0, 6.0], &[0.4, 0.5, 0.6]).unwrap();
        storage.compute_returns(&[9.0, 9.0, 9.0], 0.99, 0.95, false).unwrap();

        assert_eq!(storage.batched_values(), &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        assert_eq!(storage.batched_returns().unwrap().len(), 6);
    }

    #[test]
    fn test_push_beyond_horizon_fails() {
        let mut storage = RndRolloutStorage::<u32>::new(1, 1, 1).unwrap();
        storage.push_pseudo(&[1.0], &[0.0]).unwrap();
        let err = storage.push_pseudo(&[1.0], &[0.0]).unwrap_err();
        assert!(matches!(err, RndError::OutOfOrder { operation: "push_pseudo", pushed: 1, horizon: 1 }));
    }

    #[test]
    fn test_compute_before_full_fails() {
        let mut storage = RndRolloutStorage::<u32>::new(1, 2, 1).unwrap();
        storage.push_pseudo(&[1.0], &[0.0]).unwrap();
        let err = storage.compute_returns(&[0.0], 0.99, 0.95, false).unwrap_err();
        assert!(matches!(err, RndError::OutOfOrder { operation: "compute_returns", .. }));
        assert!(storage.batched_returns().is_err());
    }

    #[test]
    fn test_compute_twice_fails() {
        let mut storage = RndRolloutStorage::<u32>::new(1, 1, 1).unwrap();
        storage.push_pseudo(&[1.0], &[0.0]).unwrap();
        storage.compute_returns(&[0.0], 0.99, 0.95, false).unwrap();
        assert!(storage.is_finalized());
        assert!(storage.compute_returns(&[0.0], 0.99, 0.95, false).is_err());
    }

    #[test]
    fn test_reset_returns_to_collecting() {
        let mut storage = RndRolloutStorage::<u32>::new(2, 1, 1).unwrap();
        push_rewards(&mut storage, &[1.0, 0.0]);
        storage.compute_returns(&[0.0, 0.0], 0.99, 0.95, false).unwrap();
        storage.reset();

        assert_eq!(storage.pushed(), 0);
        assert!(storage.batched_values().is_empty());
        let err = storage.compute_returns(&[0.0, 0.0], 0.99, 0.95, false).unwrap_err();
        assert!(matches!(err, RndError::OutOfOrder { pushed: 0, .. }));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut storage = RndRolloutStorage::<u32>::new(2, 1, 1).unwrap();
        let err = storage.push_pseudo(&[1.0], &[0.0, 0.0]).unwrap_err();
        assert!(matches!(err, RndError::ShapeMismatch { what: "pseudo rewards", .. }));
        assert_eq!(storage.pushed(), 0);
    }

    // ============================================================================
    // Generator
    // ============================================================================

    fn small_nets() -> RndConvConfig {
        RndConvConfig::new([1, 16, 16])
            .with_convs(vec![(4, 2), (3, 1)], vec![4, 4])
            .with_output_dim(8)
    }

    fn make_generator(n_workers: usize, horizon: usize) -> Generator {
        let device = Default::default();
        let nets = small_nets();
        let config = RndConfig::new(n_workers, horizon).with_int_gamma(0.9);
        IntrinsicRewardGenerator::new(
            nets.init_target::<Inner>(&device),
            nets.init_predictor::<B>(&device),
            config,
        )
        .unwrap()
    }

    fn observations(n: usize, size: usize) -> Tensor<Inner, 4> {
        let device = Default::default();
        Tensor::random([n, 2, size, size], Distribution::Default, &device)
    }

    #[test]
    fn test_generate_shapes_and_filtering() {
        let mut generator = make_generator(2, 3);
        let sample = generator.generate(observations(6, 16)).unwrap();

        assert_eq!(sample.horizon, 3);
        assert_eq!(sample.n_workers, 2);
        assert_eq!(sample.raw.len(), 6);
        assert_eq!(sample.rewards.len(), 6);
        assert_eq!(sample.targets.dims(), [6, 8]);
        assert_eq!(sample.row(2), Some(&sample.rewards[4..6]));
        assert_eq!(sample.row(3), None);
        assert!(sample.raw.iter().all(|r| *r >= 0.0 && r.is_finite()));

        // R_1 = R_0 * γ + raw_1
        for w in 0..2 {
            let expected = sample.filtered[w] * 0.9 + sample.raw[2 + w];
            assert!((sample.filtered[2 + w] - expected).abs() < 1e-5);
        }

        let std = generator.reward_moments().std_vec(EPS)[0];
        for (f, r) in sample.filtered.iter().zip(&sample.rewards) {
            assert!((*f as f64 / std - *r as f64).abs() < 1e-4);
        }
        assert_eq!(generator.reward_moments().count(), 6.0);
        // 6 observations with 2 channels each
        assert_eq!(generator.obs_moments().count(), 12.0);
    }

    #[test]
    fn test_filter_carries_over_between_calls() {
        let mut generator = make_generator(1, 1);
        let first = generator.generate(observations(1, 16)).unwrap();
        let second = generator.generate(observations(1, 16)).unwrap();

        let expected = first.filtered[0] * 0.9 + second.raw[0];
        assert!((second.filtered[0] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_generate_rejects_bad_shapes() {
        let mut generator = make_generator(2, 3);

        let err = generator.generate(observations(3, 16)).unwrap_err();
        assert!(matches!(err, RndError::ShapeMismatch { what: "observation batch", .. }));

        let err = generator.generate(observations(6, 12)).unwrap_err();
        assert!(matches!(err, RndError::ShapeMismatch { what: "observation frame", .. }));

        // Normalization channel 1 needs at least two channels
        let device = Default::default();
        let single_channel = Tensor::<Inner, 4>::random([6, 1, 16, 16], Distribution::Default, &device);
        let err = generator.generate(single_channel).unwrap_err();
        assert!(matches!(err, RndError::ShapeMismatch { what: "normalization channel", .. }));

        // Nothing was recorded by the failed calls
        assert_eq!(generator.obs_moments().count(), 0.0);
        assert_eq!(generator.reward_moments().count(), 0.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let device = Default::default();
        let nets = small_nets();
        let result: Result<Generator, _> = IntrinsicRewardGenerator::new(
            nets.init_target::<Inner>(&device),
            nets.init_predictor::<B>(&device),
            RndConfig::new(0, 4),
        );
        assert!(matches!(result, Err(RndError::Config(_))));
    }

    #[test]
    fn test_auxiliary_loss_sample_ratio() {
        let mut generator = make_generator(2, 2);
        let obs = observations(4, 16);
        let sample = generator.generate(obs.clone()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let none = generator
            .auxiliary_loss_with_rng(obs.clone(), sample.targets.clone(), 0.0, &mut rng)
            .unwrap();
        assert!(none.is_none());

        let loss = generator
            .auxiliary_loss_with_rng(obs.clone(), sample.targets.clone(), 1.0, &mut rng)
            .unwrap()
            .expect("ratio 1 selects every sample");
        let value = loss.into_scalar();
        assert!(value.is_finite() && value >= 0.0);

        // Full selection reproduces the mean of the raw rewards
        let raw_mean = sample.raw.iter().sum::<f32>() / sample.raw.len() as f32;
        assert!((value - raw_mean).abs() < 1e-4, "{} vs {}", value, raw_mean);

        let err = generator
            .auxiliary_loss_with_rng(obs, sample.targets, 1.5, &mut rng)
            .unwrap_err();
        assert!(matches!(err, RndError::Config(_)));
    }

    #[test]
    fn test_auxiliary_loss_fractional_ratio() {
        let mut generator = make_generator(4, 100);
        let obs = observations(400, 16);
        let sample = generator.generate(obs.clone()).unwrap();

        let selected = bernoulli_indices(400, 0.25, &mut StdRng::seed_from_u64(11));
        let fraction = selected.len() as f32 / 400.0;
        assert!((fraction - 0.25).abs() < 0.08, "selected fraction {}", fraction);

        let loss = generator
            .auxiliary_loss_with_rng(obs, sample.targets.clone(), 0.25, &mut StdRng::seed_from_u64(11))
            .unwrap()
            .expect("a quarter of 400 rows is never empty");
        let expected = selected.iter().map(|&i| sample.raw[i as usize]).sum::<f32>()
            / selected.len() as f32;
        let value = loss.into_scalar();
        assert!((value - expected).abs() < 1e-4, "{} vs {}", value, expected);
    }

    #[test]
    fn test_auxiliary_loss_rejects_mismatched_targets() {
        let mut generator = make_generator(2, 2);
        let sample = generator.generate(observations(4, 16)).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let err = generator
            .auxiliary_loss_with_rng(observations(2, 16), sample.targets, 1.0, &mut rng)
            .unwrap_err();
        assert!(matches!(err, RndError::ShapeMismatch { what: "target rows", .. }));
    }

    #[test]
    fn test_trainable_parameters_are_predictor_only() {
        let generator = make_generator(1, 1);
        // 2 convolutions and 3 linear layers, weight and bias each
        assert_eq!(generator.trainable_parameters().len(), 10);
        assert_eq!(generator.num_trainable_params(), generator.predictor().num_params());
        assert!(generator.num_trainable_params() > generator.target().num_params());
    }

    #[test]
    fn test_optimize_predictor_reduces_loss() {
        let mut generator = make_generator(2, 2);
        let obs = observations(4, 16);
        let sample = generator.generate(obs.clone()).unwrap();
        let mut optimizer = AdamConfig::new().init();
        let mut rng = StdRng::seed_from_u64(1);

        let mut first = None;
        let mut last = 0.0;
        for _ in 0..20 {
            let loss = generator
                .auxiliary_loss_with_rng(obs.clone(), sample.targets.clone(), 1.0, &mut rng)
                .unwrap()
                .unwrap();
            last = loss.clone().into_scalar();
            first.get_or_insert(last);
            generator.optimize_predictor(&mut optimizer, 1e-3, loss);
        }
        assert!(last < first.unwrap(), "loss did not decrease: {:?} -> {}", first, last);
    }

    #[test]
    fn test_push_sample_into_storage() {
        let mut generator = make_generator(2, 3);
        let sample = generator.generate(observations(6, 16)).unwrap();

        let mut storage = RndRolloutStorage::<u32>::new(2, 3, 1).unwrap();
        storage.push_sample(&sample, &[0.0; 6]).unwrap();
        assert_eq!(storage.pushed(), 3);
        assert_eq!(storage.pseudo_rewards(), sample.rewards.as_slice());

        let err = storage.push_sample(&sample, &[0.0; 6]).unwrap_err();
        assert!(matches!(err, RndError::OutOfOrder { operation: "push_sample", .. }));
    }

    // ============================================================================
    // Sampler
    // ============================================================================

    fn finalized_storage() -> RndRolloutStorage<u32> {
        let mut storage = RndRolloutStorage::<u32>::new(2, 3, 2).unwrap();
        for t in 0..3 {
            let state = [t as f32; 4];
            storage
                .base_mut()
                .push_step(&state, vec![t as u32, t as u32 + 10], &[1.0, 0.0], &[false, false], &[0.5, 0.5], &[-0.1, -0.2])
                .unwrap();
            storage.push_pseudo(&[0.0, 1.0], &[0.2, 0.2]).unwrap();
        }
        storage.base_mut().compute_returns(&[0.0, 0.0], 0.99, 0.95).unwrap();
        storage.compute_returns(&[0.0, 0.0], 0.99, 0.95, false).unwrap();
        storage
    }

    #[test]
    fn test_sampler_blends_advantages() {
        let storage = finalized_storage();
        let config = AdvantageBlendConfig {
            ext_coeff: 2.0,
            int_coeff: 1.0,
            normalize_eps: None,
            minibatch_size: 4,
        };
        let sampler = RndRolloutSampler::new(&storage, &config).unwrap();

        let ext = storage.base().advantages().unwrap();
        let ret = storage.batched_returns().unwrap();
        let val = storage.batched_values();
        for i in 0..sampler.len() {
            let expected = ext[i] * 2.0 + (ret[i] - val[i]);
            assert!((sampler.advantages()[i] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sampler_normalizes_when_enabled() {
        let storage = finalized_storage();
        let config = AdvantageBlendConfig::from_config(&RndConfig::new(2, 3));
        let sampler = RndRolloutSampler::new(&storage, &config).unwrap();

        let adv = sampler.advantages();
        let n = adv.len() as f32;
        let mean = adv.iter().sum::<f32>() / n;
        let var = adv.iter().map(|a| (a - mean).powi(2)).sum::<f32>() / n;
        assert!(mean.abs() < 1e-5);
        assert!((var.sqrt() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_minibatches_cover_every_transition_once() {
        let storage = finalized_storage();
        let config = AdvantageBlendConfig {
            ext_coeff: 1.0,
            int_coeff: 1.0,
            normalize_eps: None,
            minibatch_size: 4,
        };
        let sampler = RndRolloutSampler::new(&storage, &config).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let groups = sampler.minibatch_indices(&mut rng);
        assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![4, 2]);
        let mut seen: Vec<usize> = groups.into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..6).collect::<Vec<_>>());

        let batch = sampler.make_batch(&[5, 0]);
        assert_eq!(batch.states, vec![2.0, 2.0, 0.0, 0.0]);
        assert_eq!(batch.actions, vec![12, 0]);
        assert_eq!(batch.old_log_probs, vec![-0.2, -0.1]);
        assert_eq!(batch.pseudo_values, vec![0.2, 0.2]);
        assert_eq!(batch.len(), 2);

        let total: usize = sampler.minibatches(&mut rng).iter().map(|b| b.len()).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn test_sampler_requires_finalized_storage() {
        let mut storage = RndRolloutStorage::<u32>::new(1, 1, 1).unwrap();
        storage
            .base_mut()
            .push_step(&[0.0], vec![0], &[1.0], &[false], &[0.0], &[0.0])
            .unwrap();
        storage.base_mut().compute_returns(&[0.0], 0.99, 0.95).unwrap();
        storage.push_pseudo(&[1.0], &[0.0]).unwrap();

        let config = AdvantageBlendConfig::from_config(&RndConfig::new(1, 1));
        let err = RndRolloutSampler::new(&storage, &config).unwrap_err();
        assert!(matches!(err, RndError::OutOfOrder { operation: "batched_returns", .. }));
    }
}
