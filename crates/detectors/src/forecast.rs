//! Trajectory forecaster (linear fit + R²) and degradation analyzer
//! (EMA + acceleration), gated by the analyzer on metric-name/window
//! thresholds before being invoked (§4.1 stage 4).

use causeway_core::config::ForecastConfig;
use causeway_core::types::{DegradationSignal, Severity, TrajectoryForecast};

fn linear_fit(ts: &[f64], vals: &[f64]) -> (f64, f64, f64) {
    let n = ts.len() as f64;
    let t0 = ts[0];
    let xs: Vec<f64> = ts.iter().map(|t| t - t0).collect();
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = vals.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for i in 0..xs.len() {
        num += (xs[i] - x_mean) * (vals[i] - y_mean);
        den += (xs[i] - x_mean).powi(2);
    }
    let slope = if den == 0.0 { 0.0 } else { num / den };
    let intercept = y_mean - slope * x_mean;

    let ss_tot: f64 = vals.iter().map(|v| (v - y_mean).powi(2)).sum();
    let ss_res: f64 = xs
        .iter()
        .zip(vals.iter())
        .map(|(x, v)| (v - (slope * x + intercept)).powi(2))
        .sum();
    let r2 = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };

    (slope, intercept, r2)
}

pub fn forecast_trajectory(
    metric_name: &str,
    ts: &[f64],
    vals: &[f64],
    threshold: f64,
    cfg: &ForecastConfig,
) -> Option<TrajectoryForecast> {
    if vals.len() < cfg.min_samples {
        return None;
    }
    let (slope, intercept, r2) = linear_fit(ts, vals);
    let t0 = ts[0];
    let last_t = ts[ts.len() - 1] - t0;
    let horizon_t = last_t + cfg.horizon_seconds;
    let current_value = vals[vals.len() - 1];
    let predicted_value = slope * horizon_t + intercept;

    let will_breach = if slope > 0.0 {
        predicted_value >= threshold
    } else if slope < 0.0 {
        predicted_value <= threshold
    } else {
        false
    };

    let time_to_threshold_seconds = if slope.abs() > 1e-9 {
        let t_cross = (threshold - intercept) / slope;
        let delta = t_cross - last_t;
        if delta > 0.0 {
            Some(delta)
        } else {
            None
        }
    } else {
        None
    };

    let confidence = r2.clamp(0.0, 1.0);
    let severity = if will_breach && confidence > 0.7 {
        Severity::High
    } else if will_breach {
        Severity::Medium
    } else {
        Severity::Low
    };

    Some(TrajectoryForecast {
        metric_name: metric_name.to_string(),
        current_value,
        predicted_value,
        threshold,
        will_breach,
        time_to_threshold_seconds,
        confidence,
        severity,
    })
}

/// EMA-smoothed trend plus second-derivative (acceleration) of the smoothed
/// series, used to flag a metric that isn't anomalous yet but is trending
/// toward one.
pub fn analyze_degradation(metric_name: &str, vals: &[f64], cfg: &ForecastConfig) -> Option<DegradationSignal> {
    if vals.len() < cfg.min_samples {
        return None;
    }
    let alpha = cfg.degradation_ema_alpha;
    let mut ema = vec![vals[0]];
    for &v in &vals[1..] {
        let prev = *ema.last().unwrap();
        ema.push(alpha * v + (1.0 - alpha) * prev);
    }

    let diffs: Vec<f64> = ema.windows(2).map(|w| w[1] - w[0]).collect();
    let slope = diffs.iter().sum::<f64>() / diffs.len().max(1) as f64;

    let accelerations: Vec<f64> = diffs.windows(2).map(|w| w[1] - w[0]).collect();
    let rate = accelerations.iter().sum::<f64>() / accelerations.len().max(1) as f64;

    let mean = vals.iter().sum::<f64>() / vals.len() as f64;
    let volatility = (vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / vals.len() as f64).sqrt();

    let relative_slope = if mean.abs() > 1e-9 { slope / mean.abs() } else { slope };

    let trend = if relative_slope > 0.01 {
        "worsening"
    } else if relative_slope < -0.01 {
        "improving"
    } else {
        "stable"
    };

    let severity = if trend == "worsening" && rate > 0.0 {
        Severity::High
    } else if trend == "worsening" {
        Severity::Medium
    } else {
        Severity::Low
    };

    Some(DegradationSignal {
        metric_name: metric_name.to_string(),
        slope,
        volatility,
        rate,
        trend: trend.to_string(),
        severity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rising_trend_predicts_breach() {
        let ts: Vec<f64> = (0..30).map(|i| i as f64 * 10.0).collect();
        let vals: Vec<f64> = (0..30).map(|i| 10.0 + i as f64 * 2.0).collect();
        let forecast = forecast_trajectory("mem_usage", &ts, &vals, 100.0, &ForecastConfig::default()).unwrap();
        assert!(forecast.will_breach);
    }

    #[test]
    fn worsening_trend_is_flagged() {
        let vals: Vec<f64> = (0..30).map(|i| 10.0 + i as f64).collect();
        let signal = analyze_degradation("latency", &vals, &ForecastConfig::default()).unwrap();
        assert_eq!(signal.trend, "worsening");
    }
}
