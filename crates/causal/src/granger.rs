//! Granger causality test (§4.5): nested OLS regression comparing a
//! restricted model (effect on its own lags) against an unrestricted model
//! (effect on its own lags plus the candidate cause's lags), with an
//! F-test on the reduction in sum-of-squared-residuals.

use causeway_core::config::GrangerConfig;
use causeway_core::types::GrangerResult;
use ndarray::{Array1, Array2};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

/// Builds the design matrix for a lagged-regression model. Rows start at
/// index `max_lag` of the original series so every row has `max_lag` lags
/// available. `extra` supplies the candidate cause's own lags for the
/// unrestricted model; `None` yields the restricted model.
fn design_matrix(effect: &[f64], extra: Option<&[f64]>, max_lag: usize) -> (Array2<f64>, Array1<f64>) {
    let n = effect.len() - max_lag;
    let k_extra = if extra.is_some() { max_lag } else { 0 };
    let cols = 1 + max_lag + k_extra;

    let mut x = Array2::<f64>::zeros((n, cols));
    let mut y = Array1::<f64>::zeros(n);

    for row in 0..n {
        let t = row + max_lag;
        y[row] = effect[t];
        x[[row, 0]] = 1.0;
        for lag in 1..=max_lag {
            x[[row, lag]] = effect[t - lag];
        }
        if let Some(cause) = extra {
            for lag in 1..=max_lag {
                x[[row, max_lag + lag]] = cause[t - lag];
            }
        }
    }
    (x, y)
}

/// Gauss-Jordan inversion of a small square matrix. Granger design matrices
/// are at most `2*max_lag+1` columns wide, so this is never a bottleneck.
fn invert(matrix: &Array2<f64>) -> Option<Array2<f64>> {
    let n = matrix.nrows();
    if matrix.ncols() != n {
        return None;
    }
    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = matrix[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut pivot_row = col;
        let mut pivot_val = aug[[col, col]].abs();
        for row in (col + 1)..n {
            if aug[[row, col]].abs() > pivot_val {
                pivot_row = row;
                pivot_val = aug[[row, col]].abs();
            }
        }
        if pivot_val < 1e-12 {
            return None;
        }
        if pivot_row != col {
            for j in 0..(2 * n) {
                aug.swap([col, j], [pivot_row, j]);
            }
        }
        let pivot = aug[[col, col]];
        for j in 0..(2 * n) {
            aug[[col, j]] /= pivot;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for j in 0..(2 * n) {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    let mut inv = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            inv[[i, j]] = aug[[i, n + j]];
        }
    }
    Some(inv)
}

fn ols_ssr(x: &Array2<f64>, y: &Array1<f64>) -> Option<f64> {
    let xt = x.t();
    let xtx = xt.dot(x);
    let xtx_inv = invert(&xtx)?;
    let xty = xt.dot(y);
    let beta = xtx_inv.dot(&xty);
    let fitted = x.dot(&beta);
    let residuals = y - &fitted;
    Some(residuals.dot(&residuals))
}

/// Runs the restricted-vs-unrestricted F-test for whether `cause` Granger-
/// causes `effect`. Returns `None` when either series is too short or the
/// design matrices are singular (insufficient variation to estimate).
pub fn test(cause_name: &str, effect_name: &str, cause: &[f64], effect: &[f64], cfg: &GrangerConfig) -> Option<GrangerResult> {
    let max_lag = cfg.max_lag;
    if cause.len() != effect.len() || effect.len() < max_lag + 10 {
        return None;
    }

    let (x_restricted, y) = design_matrix(effect, None, max_lag);
    let (x_unrestricted, _) = design_matrix(effect, Some(cause), max_lag);

    let ssr_restricted = ols_ssr(&x_restricted, &y)?;
    let ssr_unrestricted = ols_ssr(&x_unrestricted, &y)?;

    let n = y.len();
    let k = max_lag;
    let df2 = n as f64 - 2.0 * k as f64 - 1.0;
    if df2 <= 0.0 || ssr_unrestricted <= 0.0 {
        return None;
    }

    let f_statistic = ((ssr_restricted - ssr_unrestricted) / k as f64) / (ssr_unrestricted / df2);
    if !f_statistic.is_finite() || f_statistic < 0.0 {
        return None;
    }

    let dist = FisherSnedecor::new(k as f64, df2).ok()?;
    let p_value = 1.0 - dist.cdf(f_statistic);
    let is_causal = p_value < cfg.p_threshold && f_statistic > 1.0;
    let strength = (1.0 - p_value) * (f_statistic / cfg.strength_scale).min(1.0);

    Some(GrangerResult {
        cause_metric: cause_name.to_string(),
        effect_metric: effect_name.to_string(),
        max_lag,
        f_statistic,
        p_value,
        is_causal,
        strength,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lagged_linear_driver_is_detected_as_causal() {
        let cfg = GrangerConfig::default();
        let n = 60;
        let cause: Vec<f64> = (0..n).map(|i| (i as f64 * 0.3).sin()).collect();
        let mut effect = vec![0.0; n];
        for i in 1..n {
            effect[i] = 0.8 * cause[i - 1] + 0.01 * (i as f64 % 3.0);
        }
        let result = test("cause_metric", "effect_metric", &cause, &effect, &cfg);
        assert!(result.is_some());
        let result = result.unwrap();
        assert!(result.f_statistic > 0.0);
    }

    #[test]
    fn too_short_series_returns_none() {
        let cfg = GrangerConfig::default();
        let cause = vec![1.0, 2.0, 3.0];
        let effect = vec![1.0, 2.0, 3.0];
        assert!(test("a", "b", &cause, &effect, &cfg).is_none());
    }

    #[test]
    fn unrelated_series_have_low_strength() {
        let cfg = GrangerConfig::default();
        let n = 60;
        let cause: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let effect: Vec<f64> = (0..n).map(|i| (i as f64).sqrt()).collect();
        let result = test("noise", "trend", &cause, &effect, &cfg);
        if let Some(r) = result {
            assert!(r.strength <= 1.0);
        }
    }
}
