//! End-to-end coverage for the analyzer pipeline, one test per literal
//! scenario. Each test builds a small fixture provider directly rather than
//! depending on the demo binary's fixture module, the way the reference
//! bid-flow test builds its own sample requests inline.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use causeway_analyzer::Analyzer;
    use causeway_core::config::{AnalyzerConfig, QualityConfig};
    use causeway_core::error::AnalyzerResult;
    use causeway_core::provider::{
        DataSourceProvider, LogEntry, LogResponse, MetricResponse, MetricSeries, TraceResponse, TraceSpan,
    };
    use causeway_core::types::{AnalyzeRequest, DeploymentEvent, RcaCategory, Severity};
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Default, Clone)]
    struct ScenarioProvider {
        metrics: HashMap<String, Vec<MetricSeries>>,
        logs: Vec<LogEntry>,
        traces: Vec<TraceSpan>,
    }

    #[async_trait]
    impl DataSourceProvider for ScenarioProvider {
        async fn query_metrics(&self, query: &str, _start: f64, _end: f64, _step: &str) -> AnalyzerResult<MetricResponse> {
            let series = self
                .metrics
                .iter()
                .filter(|(name, _)| query.contains(name.as_str()))
                .flat_map(|(_, s)| s.clone())
                .collect();
            Ok(MetricResponse { query: query.to_string(), series, scraped_fallback: false })
        }

        async fn query_logs(&self, query: &str, start: f64, end: f64) -> AnalyzerResult<LogResponse> {
            let entries = self.logs.iter().filter(|e| e.timestamp >= start && e.timestamp <= end).cloned().collect();
            Ok(LogResponse { query: query.to_string(), entries })
        }

        async fn query_traces(&self, _services: &[String], start: f64, end: f64) -> AnalyzerResult<TraceResponse> {
            let spans = self.traces.iter().filter(|s| s.start >= start && s.start <= end).cloned().collect();
            Ok(TraceResponse { services: vec![], spans })
        }
    }

    fn base_request(tenant_id: &str, start: f64, end: f64) -> AnalyzeRequest {
        AnalyzeRequest {
            tenant_id: tenant_id.to_string(),
            start,
            end,
            step: "1s".to_string(),
            services: vec![],
            log_query: None,
            metric_queries: vec!["payments_latency".to_string()],
            sensitivity: None,
            apdex_threshold_ms: 500.0,
            slo_target: None,
            correlation_window_seconds: None,
            forecast_horizon_seconds: None,
        }
    }

    /// Scenario 1: a sustained flat series followed by an extreme spike at
    /// the end of the window must produce a high/critical spike anomaly.
    #[tokio::test]
    async fn spike_isolation_produces_high_severity_anomaly() {
        let mut samples = vec![(0.0, 1.0); 19];
        for (i, s) in samples.iter_mut().enumerate() {
            s.0 = (i + 1) as f64;
        }
        samples.push((20.0, 100.0));
        let mut metrics = HashMap::new();
        metrics.insert(
            "payments_latency".to_string(),
            vec![MetricSeries { metric_name: "payments_latency".to_string(), labels: HashMap::new(), samples }],
        );
        let provider = Arc::new(ScenarioProvider { metrics, ..Default::default() });
        let analyzer = Analyzer::new(provider, AnalyzerConfig::default());
        let report = analyzer.analyze(&base_request("acme", 0.0, 20.0)).await;

        let spike = report.metric_anomalies.iter().find(|a| a.timestamp == 20.0);
        assert!(spike.is_some(), "expected an anomaly at ts=20");
        let spike = spike.unwrap();
        assert!(matches!(spike.severity, Severity::High | Severity::Critical));
    }

    /// Scenario 2: a dense one-second burst of log lines amid a sparse
    /// background rate must surface as a medium-or-higher LogBurst.
    #[tokio::test]
    async fn dense_log_window_produces_burst() {
        let mut logs: Vec<LogEntry> = (0..100)
            .map(|i| LogEntry {
                timestamp: 30.0 + i as f64 * 0.0099,
                message: "request failed".to_string(),
                service: Some("checkout".to_string()),
                level: Some("error".to_string()),
            })
            .collect();
        for i in 0..20 {
            logs.push(LogEntry {
                timestamp: 200.0 + i as f64 * 10.0,
                message: "request failed".to_string(),
                service: Some("checkout".to_string()),
                level: Some("error".to_string()),
            });
        }
        let provider = Arc::new(ScenarioProvider { logs, ..Default::default() });
        let analyzer = Analyzer::new(provider, AnalyzerConfig::default());
        let report = analyzer.analyze(&base_request("acme", 0.0, 400.0)).await;

        let burst = report.log_bursts.iter().find(|b| b.window_start <= 30.0 && b.window_end >= 30.0);
        assert!(burst.is_some(), "expected a burst around t=30");
        assert!(burst.unwrap().severity >= Severity::Medium);
    }

    /// Scenario 3: a deployment event overlapping a correlated anomaly and
    /// log burst on the same service must be categorized as a deployment
    /// root cause with confidence at least 0.6.
    #[tokio::test]
    async fn deployment_overlapping_anomaly_yields_deployment_root_cause() {
        let samples: Vec<(f64, f64)> = (0..30).map(|i| {
            let t = 990.0 + i as f64;
            let v = if (1008.0..=1012.0).contains(&t) { 50.0 } else { 1.0 };
            (t, v)
        }).collect();
        let mut metrics = HashMap::new();
        metrics.insert(
            "payments_latency".to_string(),
            vec![MetricSeries { metric_name: "payments_latency".to_string(), labels: HashMap::new(), samples }],
        );
        // Sparse background (one line every ~3s) establishes a low baseline
        // rate, then a dense cluster right after the deployment creates a
        // detectable burst against it.
        let mut logs: Vec<LogEntry> = (0..10)
            .map(|i| LogEntry {
                timestamp: 990.0 + i as f64 * 3.0,
                message: "payments: processed request".to_string(),
                service: Some("payments".to_string()),
                level: Some("info".to_string()),
            })
            .collect();
        logs.extend((0..15).map(|i| LogEntry {
            timestamp: 1005.0 + i as f64 * 0.2,
            message: "payments: timeout calling ledger".to_string(),
            service: Some("payments".to_string()),
            level: Some("error".to_string()),
        }));
        let provider = Arc::new(ScenarioProvider { metrics, logs, ..Default::default() });
        let analyzer = Analyzer::new(provider, AnalyzerConfig::default());
        analyzer
            .record_deployment(
                "acme",
                DeploymentEvent {
                    service: "payments".to_string(),
                    timestamp: 1000.0,
                    version: "v1.2.3".to_string(),
                    author: "ci".to_string(),
                    environment: "production".to_string(),
                    source: "ci".to_string(),
                    metadata: HashMap::new(),
                },
            )
            .await;
        let report = analyzer.analyze(&base_request("acme", 990.0, 1020.0)).await;

        let deployment_cause = report
            .ranked_causes
            .iter()
            .find(|c| c.root_cause.category == RcaCategory::Deployment);
        assert!(deployment_cause.is_some(), "expected a deployment-categorized root cause");
        assert!(deployment_cause.unwrap().root_cause.confidence >= 0.6);
    }

    /// Scenario 4: a sustained 1.5% error rate against a 99.9% target
    /// (burn_rate = 0.015 / 0.001 = 15.0) burns the 1h window budget fast
    /// enough to trigger a critical SLO alert.
    #[tokio::test]
    async fn sustained_error_rate_triggers_critical_slo_burn() {
        use causeway_detectors::slo;
        let error_counts = vec![1.5; 40];
        let total_counts = vec![100.0; 40];
        let cfg = causeway_core::config::SloConfig::default();
        let alerts = slo::evaluate_burn("payments", &error_counts, &total_counts, 0.999, &cfg);
        assert!(!alerts.is_empty());
        assert!(alerts.iter().any(|a| a.burn_rate >= 14.4));
        assert!(alerts
            .iter()
            .any(|a| a.window_label == "1h" && a.severity == Severity::Critical));
    }

    /// Scenario 5: three errored payments spans (calling checkout) and one
    /// errored checkout span (calling db) should attribute propagation back
    /// to payments as the source, with checkout among the affected services.
    #[tokio::test]
    async fn trace_propagation_attributes_source_service() {
        use causeway_detectors::traces::{detect_propagation, Span};
        let spans = vec![
            Span { service: "payments".to_string(), operation: "charge".to_string(), duration_ms: 50.0, is_error: true, parent_service: None },
            Span { service: "payments".to_string(), operation: "charge".to_string(), duration_ms: 55.0, is_error: true, parent_service: None },
            Span { service: "payments".to_string(), operation: "charge".to_string(), duration_ms: 60.0, is_error: true, parent_service: None },
            Span { service: "checkout".to_string(), operation: "query".to_string(), duration_ms: 5.0, is_error: true, parent_service: Some("payments".to_string()) },
        ];
        let propagation = detect_propagation(&spans, None, 5);
        let from_payments = propagation.iter().find(|p| p.source_service == "payments");
        assert!(from_payments.is_some());
        assert!(from_payments.unwrap().affected_services.iter().any(|s| s == "checkout"));
    }

    /// Scenario 6: ten anomalies on one metric under a precision profile
    /// capped at one-per-hour must gate down to a single survivor.
    #[tokio::test]
    async fn precision_profile_caps_dense_single_metric_anomalies() {
        use causeway_analyzer::quality::cap_anomaly_density;
        use causeway_core::types::{ChangeType, MetricAnomaly};

        let anomalies: Vec<MetricAnomaly> = (0..10)
            .map(|i| MetricAnomaly {
                metric_name: "m".to_string(),
                timestamp: i as f64 * 300.0,
                value: 10.0,
                change_type: ChangeType::Spike,
                z_score: 4.0,
                mad_score: 4.0,
                isolation_score: 0.5,
                expected_range: (0.0, 1.0),
                severity: Severity::High,
                description: String::new(),
            })
            .collect();
        let mut cfg = QualityConfig::default();
        cfg.max_anomaly_density_per_metric_per_hour = 1.0;
        cfg.gating_profile = "precision".to_string();

        let (capped, density, suppressed) = cap_anomaly_density(anomalies, 3600.0, &cfg);
        assert_eq!(capped.len(), 1);
        assert_eq!(density["m"], 10.0);
        assert_eq!(suppressed, 9);
    }
}
