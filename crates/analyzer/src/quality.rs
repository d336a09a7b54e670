//! Precision quality gate (§4.1 stage 11). No counterpart exists in the
//! reference implementation — this stage is pure specification, built
//! straight from its prose: cap anomaly density per metric, suppress
//! low-confidence causes when a stronger one survives, and require at
//! least one multi-signal cause before keeping more than the configured
//! maximum single-signal finding.

use causeway_core::config::QualityConfig;
use causeway_core::types::{AnalysisQuality, MetricAnomaly, RankedCause, Signal, SuppressionDiagnostics};
use std::collections::HashMap;

/// Per-metric density cap: `ceil(max_density_per_hour * hours_in_window)`,
/// keeping the highest severity then `|z|` then `|mad|` within each metric.
/// Returns the surviving anomalies, the per-metric density, and the total
/// count suppressed by the cap (folded into `suppression_counts` under
/// `density_suppressed_metric_anomalies` by the caller).
pub fn cap_anomaly_density(
    anomalies: Vec<MetricAnomaly>,
    window_seconds: f64,
    cfg: &QualityConfig,
) -> (Vec<MetricAnomaly>, HashMap<String, f64>, usize) {
    let hours = (window_seconds / 3600.0).max(1.0);
    let cap = (cfg.max_anomaly_density_per_metric_per_hour * hours).ceil().max(1.0) as usize;

    let mut by_metric: HashMap<String, Vec<MetricAnomaly>> = HashMap::new();
    for a in anomalies {
        by_metric.entry(a.metric_name.clone()).or_default().push(a);
    }

    let mut density = HashMap::new();
    let mut out = Vec::new();
    let mut suppressed = 0usize;
    for (metric, mut group) in by_metric {
        density.insert(metric.clone(), group.len() as f64 / hours);
        if group.len() > cap {
            group.sort_by(|a, b| {
                b.severity
                    .cmp(&a.severity)
                    .then(b.z_score.abs().partial_cmp(&a.z_score.abs()).unwrap())
                    .then(b.mad_score.abs().partial_cmp(&a.mad_score.abs()).unwrap())
            });
            suppressed += group.len() - cap;
            group.truncate(cap);
        }
        out.extend(group);
    }
    out.sort_by(|a, b| a.timestamp.partial_cmp(&b.timestamp).unwrap());
    (out, density, suppressed)
}

fn distinct_signal_count(cause: &RankedCause) -> usize {
    let mut signals = cause.root_cause.contributing_signals.clone();
    signals.sort_by_key(signal_rank);
    signals.dedup();
    signals.len()
}

fn signal_rank(s: &Signal) -> u8 {
    match s {
        Signal::Metrics => 0,
        Signal::Logs => 1,
        Signal::Traces => 2,
        Signal::Events => 3,
    }
}

/// Low-confidence suppression plus the multi-signal requirement, applied in
/// that order. Returns the surviving causes (annotated) and the suppression
/// counters rolled into the final `AnalysisQuality` record.
pub fn gate(mut causes: Vec<RankedCause>, cfg: &QualityConfig) -> (Vec<RankedCause>, HashMap<String, usize>) {
    let mut suppressed: HashMap<String, usize> = HashMap::new();
    let confidence_floor = 0.10_f64;
    if causes.len() > 1 {
        let before = causes.len();
        causes.retain(|c| c.root_cause.confidence >= confidence_floor);
        let dropped = before - causes.len();
        if dropped > 0 {
            *suppressed.entry("low_confidence".to_string()).or_insert(0) += dropped;
        }
    }

    let has_multisignal = causes.iter().any(|c| distinct_signal_count(c) >= cfg.min_corroboration_signals);
    if !has_multisignal && causes.len() > cfg.max_root_causes_without_multisignal {
        causes.sort_by(|a, b| b.final_score.partial_cmp(&a.final_score).unwrap());
        let before = causes.len();
        causes.truncate(cfg.max_root_causes_without_multisignal.max(1));
        let dropped = before - causes.len();
        if dropped > 0 {
            *suppressed.entry("no_multisignal_corroboration".to_string()).or_insert(0) += dropped;
        }
    }

    for cause in &mut causes {
        let signal_count = distinct_signal_count(cause);
        let meets = signal_count >= cfg.min_corroboration_signals;
        cause.root_cause.corroboration_summary = format!(
            "{signal_count} distinct signal type(s); {}",
            if meets { "meets corroboration minimum" } else { "below corroboration minimum" }
        );
        cause.root_cause.suppression_diagnostics = Some(SuppressionDiagnostics {
            gating_profile: cfg.gating_profile.clone(),
            signal_count,
            meets_min_corroboration_signals: meets,
        });
    }

    (causes, suppressed)
}

pub fn build_quality_record(
    anomaly_density: HashMap<String, f64>,
    suppression_counts: HashMap<String, usize>,
    cfg: &QualityConfig,
) -> AnalysisQuality {
    AnalysisQuality {
        anomaly_density,
        suppression_counts,
        gating_profile: cfg.gating_profile.clone(),
        confidence_calibration_version: "v1".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causeway_core::types::{ChangeType, RcaCategory, RootCause, Severity};

    fn anomaly(metric: &str, ts: f64) -> MetricAnomaly {
        MetricAnomaly {
            metric_name: metric.to_string(),
            timestamp: ts,
            value: 1.0,
            change_type: ChangeType::Spike,
            z_score: 4.0,
            mad_score: 4.0,
            isolation_score: 0.5,
            expected_range: (0.0, 1.0),
            severity: Severity::High,
            description: String::new(),
        }
    }

    #[test]
    fn density_cap_trims_to_ceiling() {
        let anomalies: Vec<MetricAnomaly> = (0..20).map(|i| anomaly("cpu", i as f64 * 60.0)).collect();
        let (capped, density, suppressed) = cap_anomaly_density(anomalies, 3600.0, &QualityConfig::default());
        assert!(capped.len() <= 1);
        assert!(density["cpu"] > 0.0);
        assert_eq!(suppressed, 20 - capped.len());
    }

    fn ranked(confidence: f64, signals: Vec<Signal>) -> RankedCause {
        RankedCause {
            root_cause: RootCause {
                hypothesis: "h".to_string(),
                confidence,
                severity: Severity::Medium,
                category: RcaCategory::Unknown,
                evidence: vec![],
                contributing_signals: signals,
                affected_services: vec![],
                recommended_action: String::new(),
                corroboration_summary: String::new(),
                suppression_diagnostics: None,
                selection_score_components: None,
                deployment: None,
            },
            ml_score: confidence,
            final_score: confidence,
            feature_importance: Default::default(),
        }
    }

    #[test]
    fn low_confidence_cause_suppressed_when_another_survives() {
        let causes = vec![ranked(0.9, vec![Signal::Metrics, Signal::Logs]), ranked(0.01, vec![Signal::Metrics])];
        let (gated, suppressed) = gate(causes, &QualityConfig::default());
        assert_eq!(gated.len(), 1);
        assert_eq!(suppressed.get("low_confidence"), Some(&1));
    }

    #[test]
    fn single_signal_causes_capped_without_multisignal_corroboration() {
        let causes = vec![ranked(0.5, vec![Signal::Metrics]), ranked(0.4, vec![Signal::Logs])];
        let (gated, suppressed) = gate(causes, &QualityConfig::default());
        assert_eq!(gated.len(), 1);
        assert!(suppressed.contains_key("no_multisignal_corroboration"));
    }
}
