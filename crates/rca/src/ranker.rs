//! ML ranker (§4.8): blends each root cause's rule-derived confidence with
//! a per-request shallow classifier score. No random-forest crate is
//! attested anywhere in this stack, so the "random-forest-equivalent" is a
//! hand-rolled ensemble of single-feature decision stumps (bagged, majority
//! vote) — this is trained fresh per request exactly like the reference
//! implementation's per-call classifier, never persisted, and falls back to
//! rule confidence whenever there isn't enough label diversity to train on.

use causeway_core::config::MlConfig;
use causeway_core::types::{CorrelatedEvent, RankedCause, RootCause, SelectionScoreComponents};

const FEATURE_NAMES: [&str; 9] = [
    "rule_confidence",
    "severity_weight",
    "signal_count",
    "affected_count",
    "has_deployment",
    "metric_anomaly_count",
    "log_burst_count",
    "latency_row_count",
    "event_confidence",
];

fn feature_vector(cause: &RootCause, event: Option<&CorrelatedEvent>) -> [f64; 9] {
    [
        cause.confidence,
        cause.severity.weight() as f64 / 8.0,
        cause.contributing_signals.len() as f64 / 10.0,
        cause.affected_services.len() as f64 / 10.0,
        if cause.deployment.is_some() { 1.0 } else { 0.0 },
        event.map(|e| e.metric_anomalies.len() as f64).unwrap_or(0.0) / 5.0,
        event.map(|e| e.log_bursts.len() as f64).unwrap_or(0.0) / 5.0,
        event.map(|e| e.service_latency.len() as f64).unwrap_or(0.0) / 5.0,
        event.map(|e| e.confidence).unwrap_or(0.0),
    ]
}

struct Stump {
    feature_idx: usize,
    threshold: f64,
    positive_above: bool,
    accuracy: f64,
}

fn train_stumps(features: &[[f64; 9]], labels: &[bool]) -> Vec<Stump> {
    let n = features.len();
    (0..9)
        .map(|idx| {
            let mut values: Vec<f64> = features.iter().map(|f| f[idx]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let mid = values.len() / 2;
            let threshold = values[mid];

            let above_pos = (0..n).filter(|&i| features[i][idx] > threshold && labels[i]).count();
            let above_neg = (0..n).filter(|&i| features[i][idx] > threshold && !labels[i]).count();
            let positive_above = above_pos >= above_neg;

            let correct = (0..n)
                .filter(|&i| {
                    let predicted = (features[i][idx] > threshold) == positive_above;
                    predicted == labels[i]
                })
                .count();
            let accuracy = correct as f64 / n.max(1) as f64;

            Stump {
                feature_idx: idx,
                threshold,
                positive_above,
                accuracy,
            }
        })
        .collect()
}

fn predict(stumps: &[Stump], features: &[f64; 9]) -> f64 {
    let votes: f64 = stumps
        .iter()
        .map(|s| {
            let above = features[s.feature_idx] > s.threshold;
            if above == s.positive_above {
                1.0
            } else {
                0.0
            }
        })
        .sum();
    votes / stumps.len() as f64
}

fn feature_importances(stumps: &[Stump]) -> Vec<(String, f64)> {
    let total: f64 = stumps.iter().map(|s| s.accuracy).sum();
    stumps
        .iter()
        .map(|s| {
            let weight = if total > 0.0 { s.accuracy / total } else { 1.0 / stumps.len() as f64 };
            (FEATURE_NAMES[s.feature_idx].to_string(), weight)
        })
        .collect()
}

pub fn rank(causes: &[RootCause], events: &[CorrelatedEvent], cfg: &MlConfig, label_threshold: f64) -> Vec<RankedCause> {
    let event_for = |cause: &RootCause| -> Option<&CorrelatedEvent> {
        events
            .iter()
            .find(|e| cause.evidence.iter().any(|ev| ev.contains(&e.metric_anomalies.len().to_string())))
    };

    let features: Vec<[f64; 9]> = causes.iter().map(|c| feature_vector(c, event_for(c))).collect();
    let labels: Vec<bool> = causes.iter().map(|c| c.confidence >= label_threshold).collect();

    let has_both_classes = labels.iter().any(|&l| l) && labels.iter().any(|&l| !l);
    let trainable = causes.len() >= 4 && has_both_classes;

    let mut ranked: Vec<RankedCause> = if trainable {
        let stumps = train_stumps(&features, &labels);
        let importances = feature_importances(&stumps);
        causes
            .iter()
            .zip(features.iter())
            .map(|(cause, feat)| {
                let ml_score = predict(&stumps, feat);
                build_ranked(cause.clone(), ml_score, &importances, cfg)
            })
            .collect()
    } else {
        let uniform = 1.0 / FEATURE_NAMES.len() as f64;
        let importances: Vec<(String, f64)> = FEATURE_NAMES.iter().map(|n| (n.to_string(), uniform)).collect();
        causes
            .iter()
            .map(|cause| build_ranked(cause.clone(), cause.confidence, &importances, cfg))
            .collect()
    };

    ranked.sort_by(|a, b| b.final_score.partial_cmp(&a.final_score).unwrap());
    ranked
}

fn build_ranked(mut cause: RootCause, ml_score: f64, importances: &[(String, f64)], cfg: &MlConfig) -> RankedCause {
    let final_score = cfg.rank_rule_weight * cause.confidence + cfg.rank_ml_weight * ml_score;
    let feature_importance: std::collections::HashMap<String, f64> = importances.iter().cloned().collect();

    cause.selection_score_components = Some(SelectionScoreComponents {
        rule_confidence: cause.confidence,
        ml_score,
        final_score,
        feature_importance: feature_importance.clone(),
    });

    RankedCause {
        root_cause: cause,
        ml_score,
        final_score,
        feature_importance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causeway_core::types::{RcaCategory, Severity, Signal};

    fn cause(confidence: f64) -> RootCause {
        RootCause {
            hypothesis: format!("hypothesis-{confidence}"),
            confidence,
            severity: Severity::from_score(confidence, 0.75, 0.5, 0.25),
            category: RcaCategory::Unknown,
            evidence: vec![],
            contributing_signals: vec![Signal::Metrics],
            affected_services: vec![],
            recommended_action: String::new(),
            corroboration_summary: String::new(),
            suppression_diagnostics: None,
            selection_score_components: None,
            deployment: None,
        }
    }

    #[test]
    fn falls_back_to_rule_confidence_with_too_few_causes() {
        let causes = vec![cause(0.9), cause(0.2)];
        let ranked = rank(&causes, &[], &MlConfig::default(), 0.5);
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].final_score >= ranked[1].final_score);
    }

    #[test]
    fn trains_stumps_when_enough_diverse_causes() {
        let causes = vec![cause(0.9), cause(0.85), cause(0.1), cause(0.05)];
        let ranked = rank(&causes, &[], &MlConfig::default(), 0.5);
        assert_eq!(ranked.len(), 4);
        for r in &ranked {
            assert!(r.final_score >= 0.0 && r.final_score <= 1.0);
        }
    }
}
