//! Trace latency analyzer (percentiles + Apdex + severity) and
//! error-propagation detector, both driven off the span list a provider
//! returns for the request window.

use crate::topology::DependencyGraph;
use causeway_core::config::TracesConfig;
use causeway_core::types::{ErrorPropagation, ServiceLatency, Severity};
use std::collections::HashMap;

pub struct Span {
    pub service: String,
    pub operation: String,
    pub duration_ms: f64,
    pub is_error: bool,
    pub parent_service: Option<String>,
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

pub fn analyze_latency(spans: &[Span], cfg: &TracesConfig) -> Vec<ServiceLatency> {
    let mut groups: HashMap<(String, String), Vec<&Span>> = HashMap::new();
    for span in spans {
        groups
            .entry((span.service.clone(), span.operation.clone()))
            .or_default()
            .push(span);
    }

    let mut out = Vec::new();
    for ((service, operation), members) in groups {
        let mut durations: Vec<f64> = members.iter().map(|s| s.duration_ms).collect();
        durations.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let p50 = percentile(&durations, 0.50);
        let p95 = percentile(&durations, 0.95);
        let p99 = percentile(&durations, 0.99);

        let satisfied = members.iter().filter(|s| s.duration_ms <= cfg.apdex_threshold_ms).count();
        let tolerating = members
            .iter()
            .filter(|s| s.duration_ms > cfg.apdex_threshold_ms && s.duration_ms <= 4.0 * cfg.apdex_threshold_ms)
            .count();
        let apdex = (satisfied as f64 + 0.5 * tolerating as f64) / members.len() as f64;

        let errors = members.iter().filter(|s| s.is_error).count();
        let error_rate = errors as f64 / members.len() as f64;

        let severity = severity_for(p99, error_rate, cfg);

        out.push(ServiceLatency {
            service,
            operation,
            p50_ms: p50,
            p95_ms: p95,
            p99_ms: p99,
            apdex,
            error_rate,
            sample_count: members.len(),
            severity,
            window_start: None,
            window_end: None,
        });
    }
    out.sort_by(|a, b| b.severity.cmp(&a.severity));
    out
}

fn severity_for(p99: f64, error_rate: f64, cfg: &TracesConfig) -> Severity {
    let latency_severity = if p99 >= cfg.latency_p99_critical_ms {
        Severity::Critical
    } else if p99 >= cfg.latency_p99_high_ms {
        Severity::High
    } else if p99 >= cfg.latency_p99_medium_ms {
        Severity::Medium
    } else {
        Severity::Low
    };
    let error_severity = if error_rate >= cfg.error_rate_critical {
        Severity::Critical
    } else if error_rate >= cfg.error_rate_high {
        Severity::High
    } else if error_rate >= cfg.error_rate_medium {
        Severity::Medium
    } else {
        Severity::Low
    };
    latency_severity.max(error_severity)
}

/// `affected_services` is derived from the dependency graph's blast radius
/// when a graph is available; falls back to the naive co-occurrence list of
/// every other service seen erroring in the same window otherwise.
pub fn detect_propagation(
    spans: &[Span],
    graph: Option<&DependencyGraph>,
    max_depth: usize,
) -> Vec<ErrorPropagation> {
    let mut by_service: HashMap<String, Vec<&Span>> = HashMap::new();
    for span in spans {
        by_service.entry(span.service.clone()).or_default().push(span);
    }

    let error_services: Vec<&String> = by_service
        .iter()
        .filter(|(_, spans)| spans.iter().any(|s| s.is_error))
        .map(|(service, _)| service)
        .collect();

    let mut out = Vec::new();
    for service in &error_services {
        let spans_for_service = &by_service[*service];
        let errors = spans_for_service.iter().filter(|s| s.is_error).count();
        let error_rate = errors as f64 / spans_for_service.len() as f64;

        let affected_services = match graph {
            Some(g) => g.blast_radius(service, max_depth),
            None => error_services
                .iter()
                .filter(|s| *s != service)
                .map(|s| (*s).clone())
                .collect(),
        };

        if affected_services.is_empty() {
            continue;
        }

        let severity = if error_rate >= 0.5 {
            Severity::Critical
        } else if error_rate >= 0.2 {
            Severity::High
        } else {
            Severity::Medium
        };

        out.push(ErrorPropagation {
            source_service: (*service).clone(),
            affected_services,
            error_rate,
            severity,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_p99_is_flagged_critical() {
        let spans: Vec<Span> = (0..20)
            .map(|i| Span {
                service: "checkout".to_string(),
                operation: "charge".to_string(),
                duration_ms: if i == 19 { 5000.0 } else { 50.0 },
                is_error: false,
                parent_service: None,
            })
            .collect();
        let rows = analyze_latency(&spans, &TracesConfig::default());
        assert_eq!(rows[0].severity, Severity::Critical);
    }

    #[test]
    fn propagation_uses_graph_blast_radius() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("payments", "checkout");
        let spans = vec![
            Span {
                service: "payments".to_string(),
                operation: "charge".to_string(),
                duration_ms: 50.0,
                is_error: true,
                parent_service: None,
            },
            Span {
                service: "checkout".to_string(),
                operation: "db".to_string(),
                duration_ms: 50.0,
                is_error: true,
                parent_service: Some("payments".to_string()),
            },
        ];
        let rows = detect_propagation(&spans, Some(&graph), 5);
        assert!(rows
            .iter()
            .any(|r| r.source_service == "payments" && r.affected_services.contains(&"checkout".to_string())));
    }
}
