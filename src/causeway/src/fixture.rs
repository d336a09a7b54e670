//! Fixture/file-backed `DataSourceProvider` for the demo binary. Loads a
//! JSON scenario file shaped like [`Fixture`] when one is given, otherwise
//! synthesizes a small built-in scenario: a CPU spike on `checkout`
//! correlated with an error-log burst and a recent deployment event.

use async_trait::async_trait;
use causeway_core::error::AnalyzerResult;
use causeway_core::provider::{
    DataSourceProvider, LogEntry, LogResponse, MetricResponse, MetricSeries, TraceResponse, TraceSpan,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub metrics: HashMap<String, Vec<MetricSeries>>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub traces: Vec<TraceSpan>,
}

impl Fixture {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Memory-usage spike on `checkout` at the tail of the window, a handful
    /// of error lines right after it, and a matching deployment-flavored
    /// trace error. The metric name matches one of the default queries
    /// verbatim so it survives the query-substring filter below.
    pub fn builtin_spike(start: f64, end: f64) -> Self {
        let n = 60;
        let step = (end - start) / n as f64;
        let mut samples = Vec::with_capacity(n);
        for i in 0..n {
            let t = start + i as f64 * step;
            let v = if i >= n - 5 { 0.96 } else { 0.18 + (i % 3) as f64 * 0.01 };
            samples.push((t, v));
        }
        let mut metrics = HashMap::new();
        metrics.insert(
            "system_memory_usage_bytes".to_string(),
            vec![MetricSeries {
                metric_name: "system_memory_usage_bytes".to_string(),
                labels: HashMap::from([("service".to_string(), "checkout".to_string())]),
                samples,
            }],
        );

        let burst_start = end - step * 5.0;
        let logs = (0..20)
            .map(|i| LogEntry {
                timestamp: burst_start + i as f64 * 0.2,
                message: "ERROR checkout: connection refused calling payments-gateway".to_string(),
                service: Some("checkout".to_string()),
                level: Some("error".to_string()),
            })
            .collect();

        let traces = vec![TraceSpan {
            service: "payments-gateway".to_string(),
            operation: "charge".to_string(),
            start: burst_start,
            duration_ms: 2400.0,
            is_error: true,
            parent_service: Some("checkout".to_string()),
        }];

        Self { metrics, logs, traces }
    }
}

pub struct FixtureProvider {
    fixture: Fixture,
}

impl FixtureProvider {
    pub fn new(fixture: Fixture) -> Self {
        Self { fixture }
    }
}

#[async_trait]
impl DataSourceProvider for FixtureProvider {
    async fn query_metrics(&self, query: &str, _start: f64, _end: f64, _step: &str) -> AnalyzerResult<MetricResponse> {
        let series = self
            .fixture
            .metrics
            .iter()
            .filter(|(name, _)| query.contains(name.as_str()))
            .flat_map(|(_, s)| s.clone())
            .collect::<Vec<_>>();
        Ok(MetricResponse { query: query.to_string(), series, scraped_fallback: false })
    }

    async fn query_logs(&self, query: &str, start: f64, end: f64) -> AnalyzerResult<LogResponse> {
        let entries = self
            .fixture
            .logs
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .cloned()
            .collect();
        Ok(LogResponse { query: query.to_string(), entries })
    }

    async fn query_traces(&self, services: &[String], start: f64, end: f64) -> AnalyzerResult<TraceResponse> {
        let spans = self
            .fixture
            .traces
            .iter()
            .filter(|s| s.start >= start && s.start <= end)
            .filter(|s| services.is_empty() || services.contains(&s.service) || s.parent_service.as_ref().is_some_and(|p| services.contains(p)))
            .cloned()
            .collect();
        Ok(TraceResponse { services: services.to_vec(), spans })
    }
}
