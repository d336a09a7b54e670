//! CUSUM change-point detector (§4.3). `threshold_sigma` is always a plain
//! σ-multiplier — never a blended baseline.std — per the resolved Open
//! Question on the reference implementation's latent `threshold_sigma=
//! baseline.std or z_threshold` bug, which is deliberately not replicated.

use causeway_core::config::ChangepointConfig;
use causeway_core::types::{ChangePoint, ChangeType};

pub fn detect(
    metric_name: &str,
    ts: &[f64],
    vals: &[f64],
    threshold_sigma: f64,
    cfg: &ChangepointConfig,
) -> Vec<ChangePoint> {
    if vals.len() < 10 {
        return Vec::new();
    }
    let n = vals.len() as f64;
    let mean = vals.iter().sum::<f64>() / n;
    let std = (vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    if std == 0.0 {
        return Vec::new();
    }

    let k = cfg.cusum_k * std;
    let h = threshold_sigma * std;

    let diffs: Vec<f64> = vals.windows(2).map(|w| w[1] - w[0]).collect();
    let sign_changes = diffs
        .windows(2)
        .filter(|w| w[0].signum() != 0.0 && w[1].signum() != 0.0 && w[0].signum() != w[1].signum())
        .count();
    let oscillation_density = if diffs.len() > 1 {
        sign_changes as f64 / (diffs.len() - 1) as f64
    } else {
        0.0
    };
    let is_oscillating = oscillation_density > cfg.oscillation_density_cutoff;

    let mut pos = 0.0;
    let mut neg = 0.0;
    let mut points = Vec::new();

    for i in 0..vals.len() {
        pos = (pos + (vals[i] - mean) - k).max(0.0);
        neg = (neg + (mean - vals[i]) - k).max(0.0);

        if pos >= h || neg >= h {
            let before_start = i.saturating_sub(5);
            let before = &vals[before_start..i.min(vals.len())];
            let after_end = (i + 5).min(vals.len());
            let after = &vals[i..after_end];
            if before.is_empty() || after.is_empty() {
                pos = 0.0;
                neg = 0.0;
                continue;
            }
            let value_before = before.iter().sum::<f64>() / before.len() as f64;
            let value_after = after.iter().sum::<f64>() / after.len() as f64;
            let magnitude = (value_after - value_before).abs() / std;
            let delta = value_after - value_before;
            let relative_delta = if value_before.abs() > 1e-9 {
                delta.abs() / value_before.abs()
            } else {
                delta.abs()
            };

            let change_type = if is_oscillating {
                ChangeType::Oscillation
            } else if relative_delta > cfg.cusum_relative_cutoff {
                if delta > 0.0 {
                    ChangeType::Spike
                } else {
                    ChangeType::Drop
                }
            } else if delta.abs() > 2.0 * std {
                ChangeType::Shift
            } else {
                ChangeType::Drift
            };

            points.push(ChangePoint {
                metric_name: metric_name.to_string(),
                index: i,
                timestamp: ts.get(i).copied().unwrap_or(0.0),
                value_before,
                value_after,
                magnitude,
                change_type,
            });

            pos = 0.0;
            neg = 0.0;
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_a_level_shift() {
        let mut vals = vec![10.0; 40];
        for v in vals.iter_mut().skip(20) {
            *v = 50.0;
        }
        let ts: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let points = detect("cpu", &ts, &vals, 6.0, &ChangepointConfig::default());
        assert!(!points.is_empty());
    }

    #[test]
    fn flat_series_has_no_changepoints() {
        let vals = vec![10.0; 40];
        let ts: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let points = detect("cpu", &ts, &vals, 6.0, &ChangepointConfig::default());
        assert!(points.is_empty());
    }
}
