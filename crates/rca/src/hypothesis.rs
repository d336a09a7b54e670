//! RCA hypothesis generation (§4.7): turns correlated events, error
//! propagation, and critical log patterns into ranked `RootCause` records.

use causeway_core::config::RcaConfig;
use causeway_core::types::{
    CorrelatedEvent, DeploymentEvent, ErrorPropagation, LogPattern, RcaCategory, RootCause, Severity, Signal,
};
use causeway_detectors::topology::DependencyGraph;

fn score_deployment_correlation(anchor_ts: f64, deployments: &[DeploymentEvent], window_seconds: f64) -> f64 {
    let nearby: Vec<&DeploymentEvent> = deployments
        .iter()
        .filter(|d| (d.timestamp - anchor_ts).abs() <= window_seconds)
        .collect();
    if nearby.is_empty() {
        return 0.0;
    }
    let closest_lag = nearby
        .iter()
        .map(|d| (d.timestamp - anchor_ts).abs())
        .fold(f64::MAX, f64::min);
    (1.0 - closest_lag / window_seconds).max(0.0)
}

fn score_correlated_event(event: &CorrelatedEvent) -> f64 {
    let metrics = 0.25 * (event.metric_anomalies.len() as f64).min(1.0);
    let logs = 0.40 * (event.log_bursts.len() as f64).min(1.0);
    let traces = 0.35 * (event.service_latency.len() as f64).min(1.0);
    (metrics + logs + traces).min(1.0)
}

fn score_error_propagation(propagation: &ErrorPropagation, cap: f64) -> f64 {
    let affected = propagation.affected_services.len() as f64;
    (0.5 + affected * 0.1).min(cap)
}

/// The "smoothed" categorize function (resolved Open Question): uses the
/// configured deploy-score cutoff rather than a hardcoded threshold, and
/// falls through the same deployment → resource → dependency → traffic →
/// unknown ladder as the reference scoring module.
fn categorize(event: &CorrelatedEvent, deployments: &[DeploymentEvent], cfg: &RcaConfig) -> RcaCategory {
    let deploy_score = if deployments.is_empty() {
        0.0
    } else {
        score_deployment_correlation(event.window_start, deployments, cfg.deploy_window_seconds)
    };
    if deploy_score > cfg.deploy_score_cutoff {
        return RcaCategory::Deployment;
    }

    let has_memory_or_cpu = event
        .metric_anomalies
        .iter()
        .any(|a| a.metric_name.contains("memory") || a.metric_name.contains("mem") || a.metric_name.contains("cpu"));
    if has_memory_or_cpu {
        return RcaCategory::ResourceExhaustion;
    }

    if !event.service_latency.is_empty() {
        return RcaCategory::DependencyFailure;
    }

    let has_traffic = event
        .metric_anomalies
        .iter()
        .any(|a| a.metric_name.contains("request") || a.metric_name.contains("rate"));
    if has_traffic {
        return RcaCategory::TrafficSurge;
    }

    RcaCategory::Unknown
}

fn action_for_category(category: RcaCategory, service: &str) -> String {
    let service = if service.is_empty() { "affected service" } else { service };
    match category {
        RcaCategory::Deployment => format!("Rollback recent deployment for {service}."),
        RcaCategory::ResourceExhaustion => "Check resource limits, scale horizontally or increase quotas.".to_string(),
        RcaCategory::DependencyFailure => "Inspect downstream dependencies and circuit breakers.".to_string(),
        RcaCategory::TrafficSurge => "Verify rate limits, auto-scaling triggers, and CDN caching.".to_string(),
        RcaCategory::ErrorPropagation => format!("Isolate {service} and check recent changes."),
        RcaCategory::SloBurn => "Immediate incident response; error budget critical.".to_string(),
        RcaCategory::Unknown => "Review correlated signals and recent changes.".to_string(),
    }
}

fn signals_from_event(event: &CorrelatedEvent) -> Vec<Signal> {
    let mut signals = Vec::new();
    if !event.metric_anomalies.is_empty() {
        signals.push(Signal::Metrics);
    }
    if !event.log_bursts.is_empty() {
        signals.push(Signal::Logs);
    }
    if !event.service_latency.is_empty() {
        signals.push(Signal::Traces);
    }
    if signals.is_empty() {
        signals.push(Signal::Metrics);
    }
    signals
}

pub struct HypothesisInput<'a> {
    pub correlated_events: &'a [CorrelatedEvent],
    pub error_propagation: &'a [ErrorPropagation],
    pub log_patterns: &'a [LogPattern],
    pub deployments: &'a [DeploymentEvent],
    pub graph: Option<&'a DependencyGraph>,
    pub rca_severity_weight_threshold: u8,
    pub log_pattern_score: f64,
    pub topology_max_depth: usize,
}

pub fn generate(input: &HypothesisInput, cfg: &RcaConfig) -> Vec<RootCause> {
    let mut causes = Vec::new();

    for event in input.correlated_events.iter().filter(|e| e.confidence >= cfg.event_confidence_threshold) {
        let category = categorize(event, input.deployments, cfg);
        let base_score = score_correlated_event(event);
        let deploy_score = score_deployment_correlation(event.window_start, input.deployments, cfg.deploy_window_seconds);
        let confidence = (base_score + deploy_score * 0.2).min(cfg.score_cap);

        let nearby_deploy = input
            .deployments
            .iter()
            .filter(|d| (d.timestamp - event.window_start).abs() <= cfg.deploy_window_seconds)
            .min_by(|a, b| {
                (a.timestamp - event.window_start)
                    .abs()
                    .partial_cmp(&(b.timestamp - event.window_start).abs())
                    .unwrap()
            })
            .cloned();

        let mut root_service = String::new();
        let mut affected_services = Vec::new();
        if let (Some(latency), Some(graph)) = (event.service_latency.first(), input.graph) {
            root_service = latency.service.clone();
            affected_services = graph.blast_radius(&root_service, input.topology_max_depth);
        }

        let mut metric_names: Vec<String> = event.metric_anomalies.iter().map(|a| a.metric_name.clone()).collect();
        metric_names.sort();
        metric_names.dedup();
        metric_names.truncate(2);

        let mut svc_names: Vec<String> = event.service_latency.iter().map(|s| s.service.clone()).collect();
        svc_names.sort();
        svc_names.dedup();
        svc_names.truncate(2);

        let mut parts = Vec::new();
        if let Some(d) = &nearby_deploy {
            parts.push(format!("deployment of {} v{}", d.service, d.version));
        }
        if !metric_names.is_empty() {
            parts.push(format!("metric anomaly in {}", metric_names.join(", ")));
        }
        if !svc_names.is_empty() {
            parts.push(format!("latency spike in {}", svc_names.join(", ")));
        }
        if !event.log_bursts.is_empty() {
            parts.push(format!("{} log burst(s)", event.log_bursts.len()));
        }
        let body = if parts.is_empty() {
            "multi-signal event".to_string()
        } else {
            parts.join(" + ")
        };
        let category_label = format!("{category:?}").to_lowercase();
        let hypothesis = format!("[{category_label}] Correlated incident: {body}");

        causes.push(RootCause {
            hypothesis,
            confidence,
            severity: Severity::from_score(confidence, 0.75, 0.50, 0.25),
            category,
            evidence: vec![
                format!("metrics={}", event.metric_anomalies.len()),
                format!("log_bursts={}", event.log_bursts.len()),
                format!("latency_services={}", event.service_latency.len()),
            ],
            contributing_signals: signals_from_event(event),
            affected_services,
            recommended_action: action_for_category(category, &root_service),
            corroboration_summary: format!(
                "{} metric, {} log, {} trace signal(s)",
                event.metric_anomalies.len(),
                event.log_bursts.len(),
                event.service_latency.len()
            ),
            suppression_diagnostics: None,
            selection_score_components: None,
            deployment: nearby_deploy,
        });
    }

    for prop in input.error_propagation {
        let confidence = score_error_propagation(prop, cfg.errorprop_max);
        let upstream = input
            .graph
            .map(|g| g.find_upstream_roots(&prop.source_service))
            .unwrap_or_default();
        let mut all_affected = upstream;
        all_affected.extend(prop.affected_services.iter().cloned());
        all_affected.sort();
        all_affected.dedup();

        let preview: Vec<String> = prop.affected_services.iter().take(3).cloned().collect();
        causes.push(RootCause {
            hypothesis: format!(
                "[error_propagation] Errors originating from {}, cascading to {}",
                prop.source_service,
                preview.join(", ")
            ),
            confidence,
            severity: Severity::High,
            category: RcaCategory::ErrorPropagation,
            evidence: vec![format!("error_rate={:.3}", prop.error_rate)],
            contributing_signals: vec![Signal::Traces],
            affected_services: all_affected,
            recommended_action: action_for_category(RcaCategory::ErrorPropagation, &prop.source_service),
            corroboration_summary: format!("trace propagation from {}", prop.source_service),
            suppression_diagnostics: None,
            selection_score_components: None,
            deployment: None,
        });
    }

    let critical_patterns: Vec<&LogPattern> = input
        .log_patterns
        .iter()
        .filter(|p| p.severity.weight() >= input.rca_severity_weight_threshold)
        .collect();
    if let Some(first) = critical_patterns.first() {
        causes.push(RootCause {
            hypothesis: format!(
                "[log_pattern] {} critical pattern(s): {}",
                critical_patterns.len(),
                &first.pattern.chars().take(80).collect::<String>()
            ),
            confidence: input.log_pattern_score,
            severity: Severity::High,
            category: RcaCategory::Unknown,
            evidence: vec![format!("pattern_count={}", critical_patterns.len())],
            contributing_signals: vec![Signal::Logs],
            affected_services: Vec::new(),
            recommended_action: "Review high-severity log patterns for error root cause.".to_string(),
            corroboration_summary: format!("{} critical log pattern(s)", critical_patterns.len()),
            suppression_diagnostics: None,
            selection_score_components: None,
            deployment: None,
        });
    }

    dedup_by_hypothesis(&mut causes);
    causes.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());

    let filtered: Vec<RootCause> = causes.iter().filter(|c| c.confidence >= cfg.min_confidence_display).cloned().collect();
    if !filtered.is_empty() {
        return filtered;
    }
    if let Some(mut top) = causes.into_iter().next() {
        top.hypothesis = format!("[low_confidence] {}", top.hypothesis);
        return vec![top];
    }
    Vec::new()
}

/// Mandated by the quality gate's determinism requirement: keeps the
/// highest-confidence cause per hypothesis string, independent of input
/// order.
fn dedup_by_hypothesis(causes: &mut Vec<RootCause>) {
    use std::collections::HashMap;
    let mut best: HashMap<String, RootCause> = HashMap::new();
    for c in causes.drain(..) {
        best.entry(c.hypothesis.clone())
            .and_modify(|existing| {
                if c.confidence > existing.confidence {
                    *existing = c.clone();
                }
            })
            .or_insert(c);
    }
    *causes = best.into_values().collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use causeway_core::types::{ChangeType, MetricAnomaly};

    fn event_with_metric(metric_name: &str) -> CorrelatedEvent {
        CorrelatedEvent {
            window_start: 1000.0,
            window_end: 1010.0,
            metric_anomalies: vec![MetricAnomaly {
                metric_name: metric_name.to_string(),
                timestamp: 1005.0,
                value: 10.0,
                change_type: ChangeType::Spike,
                z_score: 5.0,
                mad_score: 5.0,
                isolation_score: 0.5,
                expected_range: (0.0, 1.0),
                severity: Severity::High,
                description: String::new(),
            }],
            log_bursts: vec![],
            service_latency: vec![],
            signal_count: 2,
            confidence: 0.8,
        }
    }

    #[test]
    fn deployment_nearby_yields_deployment_category() {
        let event = event_with_metric("request_rate");
        let deployments = vec![DeploymentEvent {
            service: "payments".to_string(),
            timestamp: 1000.0,
            version: "1.2.3".to_string(),
            author: String::new(),
            environment: "production".to_string(),
            source: "ci".to_string(),
            metadata: Default::default(),
        }];
        let input = HypothesisInput {
            correlated_events: std::slice::from_ref(&event),
            error_propagation: &[],
            log_patterns: &[],
            deployments: &deployments,
            graph: None,
            rca_severity_weight_threshold: 4,
            log_pattern_score: 0.4,
            topology_max_depth: 6,
        };
        let causes = generate(&input, &RcaConfig::default());
        assert!(causes.iter().any(|c| c.category == RcaCategory::Deployment));
    }

    #[test]
    fn low_confidence_events_tagged_when_all_below_threshold() {
        let mut event = event_with_metric("custom_metric");
        event.metric_anomalies[0].metric_name = "custom_metric".to_string();
        event.confidence = 1.0;
        let mut cfg = RcaConfig::default();
        cfg.min_confidence_display = 2.0;
        let input = HypothesisInput {
            correlated_events: std::slice::from_ref(&event),
            error_propagation: &[],
            log_patterns: &[],
            deployments: &[],
            graph: None,
            rca_severity_weight_threshold: 4,
            log_pattern_score: 0.4,
            topology_max_depth: 6,
        };
        let causes = generate(&input, &cfg);
        assert_eq!(causes.len(), 1);
        assert!(causes[0].hypothesis.starts_with("[low_confidence]"));
    }
}
