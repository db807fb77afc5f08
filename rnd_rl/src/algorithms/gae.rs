//! Generalized Advantage Estimation over time-major, worker-minor rollouts.
//!
//! GAE provides a family of advantage estimators parameterized by λ:
//! - λ = 0: one-step TD (low variance, high bias)
//! - λ = 1: Monte Carlo (high variance, low bias)
//! - λ ∈ (0, 1): interpolation
//!
//! ## Recurrence
//!
//! Rollouts are stored time-major: `[w0_t0, w1_t0, ..., w0_t1, w1_t1, ...]`.
//! Values and continuation masks carry one extra row (index `T`) holding the
//! bootstrap value and the mask of the state after the last step.
//!
//! ```text
//! δ_t   = r_t + γ V(s_{t+1}) m_{t+1} − V(s_t)
//! gae_t = δ_t + γ λ m_t gae_{t+1}
//! R_t   = gae_t + V(s_t)
//! ```
//!
//! `m_t` is 0 when `s_t` starts a new episode. Passing all-ones masks lets
//! values flow across episode boundaries, which is how non-episodic
//! intrinsic returns are treated.
//!
//! ## References
//!
//! - Schulman et al., "High-Dimensional Continuous Control Using
//!   Generalized Advantage Estimation" (2016)

/// Compute GAE returns for a vectorized rollout.
///
/// # Arguments
///
/// * `rewards` - rewards `[T * n_workers]`
/// * `values` - value estimates plus bootstrap row `[(T + 1) * n_workers]`
/// * `masks` - continuation masks `[(T + 1) * n_workers]`
/// * `n_workers` - number of parallel workers
/// * `gamma` - discount factor
/// * `gae_lambda` - GAE λ parameter
///
/// # Returns
///
/// Returns `R_t = gae_t + V(s_t)`, `[T * n_workers]`.
pub fn masked_gae_returns(
    rewards: &[f32],
    values: &[f32],
    masks: &[f32],
    n_workers: usize,
    gamma: f32,
    gae_lambda: f32,
) -> Vec<f32> {
    let rewards: Vec<f64> = rewards.iter().map(|&r| r as f64).collect();
    masked_gae_returns_f64(&rewards, values, masks, n_workers, gamma as f64, gae_lambda as f64)
}

/// [`masked_gae_returns`] with rewards already in double precision.
///
/// The recurrence itself always runs in `f64`.
pub fn masked_gae_returns_f64(
    rewards: &[f64],
    values: &[f32],
    masks: &[f32],
    n_workers: usize,
    gamma: f64,
    gae_lambda: f64,
) -> Vec<f32> {
    assert!(n_workers > 0, "n_workers must be positive");
    assert_eq!(rewards.len() % n_workers, 0, "rewards must hold whole steps");
    let steps = rewards.len() / n_workers;
    assert_eq!(values.len(), (steps + 1) * n_workers, "values need a bootstrap row");
    assert_eq!(masks.len(), (steps + 1) * n_workers, "masks need steps + 1 rows");

    let mut returns = vec![0.0f32; steps * n_workers];
    let mut gae = vec![0.0f64; n_workers];

    for t in (0..steps).rev() {
        for w in 0..n_workers {
            let idx = t * n_workers + w;
            let next = idx + n_workers;
            let value = values[idx] as f64;

            let td_error =
                rewards[idx] + gamma * values[next] as f64 * masks[next] as f64 - value;
            gae[w] = td_error + gamma * gae_lambda * masks[idx] as f64 * gae[w];

            returns[idx] = (gae[w] + value) as f32;
        }
    }

    returns
}

/// Normalize advantages to zero mean and unit variance in place.
///
/// The standard deviation is floored at `epsilon`, so a constant batch maps
/// to zeros instead of NaN.
pub fn normalize_advantages(advantages: &mut [f32], epsilon: f32) {
    if advantages.is_empty() {
        log::warn!("Cannot normalize empty advantages batch");
        return;
    }

    let n = advantages.len() as f64;
    let mean = advantages.iter().map(|&a| a as f64).sum::<f64>() / n;
    let variance = advantages
        .iter()
        .map(|&a| (a as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let std = variance.sqrt().max(epsilon as f64);

    if !mean.is_finite() || !std.is_finite() {
        log::warn!(
            "Non-finite statistics in advantage normalization: mean={}, std={}. Using raw advantages.",
            mean, std
        );
        return;
    }

    for a in advantages.iter_mut() {
        *a = ((*a as f64 - mean) / std) as f32;
    }
}
