//! Metric anomaly detector: z-score + MAD + CUSUM statistical flags,
//! corroborated by a lightweight isolation-forest-equivalent outlier score.
//! No isolation-forest crate is available in this stack, so the "isolation"
//! signal here is a distance-from-median proxy over a 2D [z, mad] feature —
//! it is only ever used to *corroborate* a statistical flag, never to raise
//! one on its own, which keeps it faithful to the documented ML-only-flags-
//! never-emitted rule.

use causeway_core::config::AnomalyConfig;
use causeway_core::types::{ChangeType, MetricAnomaly, Severity};

pub struct AnomalyDetectorInput<'a> {
    pub metric_name: &'a str,
    pub ts: &'a [f64],
    pub vals: &'a [f64],
    pub sensitivity: f64,
    pub min_samples: usize,
    /// Per-metric hourly anomaly cap (§4.2 step 10), sourced from
    /// `QualityConfig::max_anomaly_density_per_metric_per_hour`.
    pub max_density_per_hour: f64,
    /// Whether the active gating profile is a `precision*` one; tightens
    /// the isolation-consensus contamination (§4.2 step 4).
    pub precision_profile: bool,
}

fn mean_std(vals: &[f64]) -> (f64, f64) {
    let n = vals.len() as f64;
    let mean = vals.iter().sum::<f64>() / n;
    let var = vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

pub fn detect(input: AnomalyDetectorInput, cfg: &AnomalyConfig) -> Vec<MetricAnomaly> {
    let pairs: Vec<(f64, f64)> = input
        .ts
        .iter()
        .zip(input.vals.iter())
        .filter(|(t, v)| t.is_finite() && v.is_finite())
        .map(|(&t, &v)| (t, v))
        .collect();

    if pairs.len() < input.min_samples {
        return Vec::new();
    }

    let vals: Vec<f64> = pairs.iter().map(|(_, v)| *v).collect();
    let (mean, std) = mean_std(&vals);
    if std == 0.0 {
        return Vec::new();
    }

    let mut sorted_vals = vals.clone();
    sorted_vals.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let med = median(&sorted_vals);
    let abs_devs: Vec<f64> = vals.iter().map(|v| (v - med).abs()).collect();
    let mut sorted_devs = abs_devs.clone();
    sorted_devs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mad = median(&sorted_devs);

    let pct_low = percentile(&sorted_vals, 0.05);
    let pct_high = percentile(&sorted_vals, 0.95);

    let (_cusum_pos, _cusum_neg, cusum_flags) =
        cusum_scan(&vals, mean, std, cfg.cusum_k, cfg.cusum_threshold_sigma);

    // §4.2 step 4: contamination scales inversely with sensitivity (a
    // higher `sensitivity` value is a stricter threshold, matching its
    // default of `zscore_threshold`), then tightens under a precision
    // gating profile.
    let mut contamination = (cfg.contamination_divisor / input.sensitivity.max(cfg.min_sensitivity))
        .clamp(cfg.contamination_min, cfg.contamination_max);
    if input.precision_profile {
        contamination = (contamination * cfg.precision_contamination_multiplier)
            .min(cfg.precision_contamination_cap);
    }
    let iso_cutoff = (1.0 - contamination * 4.0).clamp(0.3, 0.9);

    let mut anomalies = Vec::new();
    let n = vals.len();
    let trend_slope = linear_slope(&pairs);

    for i in 0..n {
        let (t, v) = pairs[i];
        let z = (v - mean) / std;
        let mad_score = if mad == 0.0 {
            0.0
        } else {
            cfg.mad_scale * (v - med) / mad
        };

        let cusum_flag = cusum_flags[i];

        let statistical_flag =
            z.abs() >= cfg.zscore_threshold || mad_score.abs() >= cfg.mad_threshold || cusum_flag;

        let isolation_score = isolation_proxy(z, mad_score);
        let isolation_flag = isolation_score >= iso_cutoff;
        let corroborated_ml_flag = isolation_flag
            && (z.abs() >= 0.7 * cfg.zscore_threshold || mad_score.abs() >= 0.7 * cfg.mad_threshold);

        if !(statistical_flag || corroborated_ml_flag) {
            continue;
        }
        if v >= pct_low && v <= pct_high && z.abs() < cfg.zscore_threshold {
            continue;
        }

        let mut score = 0.0;
        if z.abs() >= cfg.zscore_threshold * 1.4 {
            score += 0.5;
        } else if z.abs() >= cfg.zscore_threshold {
            score += 0.3;
        }
        if mad_score.abs() >= cfg.mad_threshold * 1.5 {
            score += 0.4;
        } else if mad_score.abs() >= cfg.mad_threshold {
            score += 0.2;
        }
        // Isolation corroborates continuously (scaled by how isolated the
        // point is), not just as a pass/fail flag, so a lone extreme spike
        // with a flat MAD (single-point run, no neighbors to form a median
        // deviation) still accumulates meaningful isolation weight.
        score += cfg.iso_weight * isolation_score;
        let score = score.clamp(0.0, 1.0);
        let severity = Severity::from_score(
            score,
            cfg.severity_score_critical,
            cfg.severity_score_high,
            cfg.severity_score_medium,
        );

        let change_type = if trend_slope.abs() > cfg.drift_slope_threshold {
            ChangeType::Drift
        } else if z > 0.0 {
            ChangeType::Spike
        } else if z < 0.0 {
            ChangeType::Drop
        } else {
            ChangeType::Shift
        };

        anomalies.push(MetricAnomaly {
            metric_name: input.metric_name.to_string(),
            timestamp: t,
            value: round4(v),
            change_type,
            z_score: round4(z),
            mad_score: round4(mad_score),
            isolation_score: round4(isolation_score),
            expected_range: (round4(pct_low), round4(pct_high)),
            severity,
            description: describe(input.metric_name, change_type, z),
        });
    }

    let anomalies = if cfg.compress_runs {
        compress_runs(anomalies, cfg.run_gap_multiplier, cfg.run_keep_max)
    } else {
        anomalies
    };

    density_cap(anomalies, &pairs, input.max_density_per_hour)
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

fn describe(metric_name: &str, change_type: ChangeType, z: f64) -> String {
    let direction = match change_type {
        ChangeType::Spike => "spiked",
        ChangeType::Drop => "dropped",
        ChangeType::Drift => "drifted",
        ChangeType::Shift => "shifted",
        ChangeType::Oscillation => "oscillated",
    };
    format!("{metric_name} {direction} ({z:+.2}σ from baseline)")
}

fn linear_slope(pairs: &[(f64, f64)]) -> f64 {
    let n = pairs.len() as f64;
    if n < 2.0 {
        return 0.0;
    }
    let t0 = pairs[0].0;
    let xs: Vec<f64> = pairs.iter().map(|(t, _)| t - t0).collect();
    let ys: Vec<f64> = pairs.iter().map(|(_, v)| *v).collect();
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for i in 0..xs.len() {
        num += (xs[i] - x_mean) * (ys[i] - y_mean);
        den += (xs[i] - x_mean).powi(2);
    }
    if den == 0.0 {
        0.0
    } else {
        let slope = num / den;
        let scale = y_mean.abs().max(1e-9);
        slope / scale
    }
}

/// CUSUM positive/negative scan reused for the statistical flag; returns
/// per-index flags alongside the final positive/negative running sums.
fn cusum_scan(vals: &[f64], mean: f64, std: f64, k_sigma: f64, threshold_sigma: f64) -> (f64, f64, Vec<bool>) {
    let k = k_sigma * std;
    let h = threshold_sigma * std;
    let mut pos = 0.0;
    let mut neg = 0.0;
    let mut flags = Vec::with_capacity(vals.len());
    for &v in vals {
        pos = (pos + (v - mean) - k).max(0.0);
        neg = (neg + (mean - v) - k).max(0.0);
        let flagged = pos >= h || neg >= h;
        flags.push(flagged);
        if flagged {
            pos = 0.0;
            neg = 0.0;
        }
    }
    (pos, neg, flags)
}

/// Distance-from-median proxy for an isolation score in [0,1]: larger joint
/// |z|/|mad| magnitude looks more like an isolated point in 2D feature space.
fn isolation_proxy(z: f64, mad_score: f64) -> f64 {
    let dist = (z.powi(2) + mad_score.powi(2)).sqrt();
    (dist / 8.0).clamp(0.0, 1.0)
}

fn compress_runs(anomalies: Vec<MetricAnomaly>, gap_multiplier: f64, keep_max: usize) -> Vec<MetricAnomaly> {
    if anomalies.len() < 2 {
        return anomalies;
    }
    let gaps: Vec<f64> = anomalies.windows(2).map(|w| w[1].timestamp - w[0].timestamp).collect();
    let mut sorted_gaps = gaps.clone();
    sorted_gaps.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let median_gap = median(&sorted_gaps).max(1.0);
    let gap_cutoff = median_gap * gap_multiplier;

    let mut runs: Vec<Vec<MetricAnomaly>> = Vec::new();
    let mut current: Vec<MetricAnomaly> = vec![anomalies[0].clone()];
    for i in 1..anomalies.len() {
        let same_type = anomalies[i].change_type == anomalies[i - 1].change_type;
        let close = anomalies[i].timestamp - anomalies[i - 1].timestamp <= gap_cutoff;
        if same_type && close {
            current.push(anomalies[i].clone());
        } else {
            runs.push(std::mem::take(&mut current));
            current.push(anomalies[i].clone());
        }
    }
    runs.push(current);

    let mut out = Vec::new();
    for run in runs {
        if run.len() <= keep_max {
            out.extend(run);
            continue;
        }
        let first = run.first().cloned().unwrap();
        let last = run.last().cloned().unwrap();
        let strongest = run
            .iter()
            .max_by(|a, b| a.z_score.abs().partial_cmp(&b.z_score.abs()).unwrap())
            .cloned()
            .unwrap();
        let mut kept = vec![first, strongest, last];
        kept.sort_by(|a, b| a.timestamp.partial_cmp(&b.timestamp).unwrap());
        kept.dedup_by(|a, b| a.timestamp == b.timestamp);
        kept.truncate(keep_max.max(1));
        out.extend(kept);
    }
    out
}

fn density_cap(mut anomalies: Vec<MetricAnomaly>, pairs: &[(f64, f64)], max_per_hour: f64) -> Vec<MetricAnomaly> {
    let window_seconds = pairs.last().map(|(t, _)| *t).unwrap_or(0.0) - pairs.first().map(|(t, _)| *t).unwrap_or(0.0);
    let hours = (window_seconds / 3600.0).max(1.0);
    let cap = (max_per_hour * hours).ceil() as usize;
    if anomalies.len() <= cap.max(1) {
        return anomalies;
    }
    anomalies.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then(b.z_score.abs().partial_cmp(&a.z_score.abs()).unwrap())
            .then(b.mad_score.abs().partial_cmp(&a.mad_score.abs()).unwrap())
    });
    anomalies.truncate(cap.max(1));
    anomalies.sort_by(|a, b| a.timestamp.partial_cmp(&b.timestamp).unwrap());
    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_series_yields_no_anomalies() {
        let ts: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let vals = vec![10.0; 30];
        let out = detect(
            AnomalyDetectorInput {
                metric_name: "cpu",
                ts: &ts,
                vals: &vals,
                sensitivity: 3.0,
                min_samples: 12,
                max_density_per_hour: 10.0,
                precision_profile: false,
            },
            &AnomalyConfig::default(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn spike_is_flagged() {
        let ts: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let mut vals = vec![10.0; 30];
        vals[25] = 500.0;
        let out = detect(
            AnomalyDetectorInput {
                metric_name: "cpu",
                ts: &ts,
                vals: &vals,
                sensitivity: 3.0,
                min_samples: 12,
                max_density_per_hour: 10.0,
                precision_profile: false,
            },
            &AnomalyConfig::default(),
        );
        assert!(out.iter().any(|a| a.change_type == ChangeType::Spike));
    }

    #[test]
    fn below_min_samples_is_empty() {
        let ts = vec![0.0, 1.0, 2.0];
        let vals = vec![1.0, 2.0, 3.0];
        let out = detect(
            AnomalyDetectorInput {
                metric_name: "cpu",
                ts: &ts,
                vals: &vals,
                sensitivity: 3.0,
                min_samples: 12,
                max_density_per_hour: 10.0,
                precision_profile: false,
            },
            &AnomalyConfig::default(),
        );
        assert!(out.is_empty());
    }
}
