//! Returns and advantage statistics.

/// Discounted returns `G_t = r_t + gamma * G_t+1` of a single episode.
pub fn discounted_sum_rewards(rewards: &[f64], gamma: f64) -> Vec<f64> {
    let mut returns = vec![0.0; rewards.len()];
    let mut acc = 0.0;
    for (t, r) in rewards.iter().enumerate().rev() {
        acc = r + gamma * acc;
        returns[t] = acc;
    }
    returns
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn variance(xs: &[f64]) -> f64 {
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64
}

/// Fraction of the variance of `y_true` explained by `y_pred`,
/// `1 - Var[y_true - y_pred] / Var[y_true]`.
///
/// 1 is a perfect prediction, 0 is no better than the mean, negative values
/// are worse. `NaN` when `y_true` is constant or empty.
pub fn explained_variance(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    if y_true.is_empty() {
        return f64::NAN;
    }
    let var_y = variance(y_true);
    if var_y == 0.0 {
        return f64::NAN;
    }
    let diff: Vec<f64> = y_true.iter().zip(y_pred).map(|(t, p)| t - p).collect();
    1.0 - variance(&diff) / var_y
}

/// Standardizes advantages in place, `(a - mean) / (std + eps)`.
pub fn normalize_advantages(advantages: &mut [f64], eps: f64) {
    if advantages.is_empty() {
        return;
    }
    let m = mean(advantages);
    let std = variance(advantages).sqrt();
    advantages.iter_mut().for_each(|a| *a = (*a - m) / (std + eps));
}
