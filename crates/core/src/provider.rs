use crate::error::AnalyzerResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One (timestamp, value) sample of a scraped or queried metric series.
pub type MetricSample = (f64, f64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSeries {
    pub metric_name: String,
    #[serde(default)]
    pub labels: std::collections::HashMap<String, String>,
    pub samples: Vec<MetricSample>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricResponse {
    pub query: String,
    pub series: Vec<MetricSeries>,
    /// Set when the query returned no series and the provider had to fall
    /// back to scraping a raw exposition endpoint.
    #[serde(default)]
    pub scraped_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: f64,
    pub message: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogResponse {
    pub query: String,
    pub entries: Vec<LogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSpan {
    pub service: String,
    pub operation: String,
    pub start: f64,
    pub duration_ms: f64,
    pub is_error: bool,
    #[serde(default)]
    pub parent_service: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceResponse {
    pub services: Vec<String>,
    pub spans: Vec<TraceSpan>,
}

/// Capability interface an analyzer run is driven against. Implementations
/// wrap a concrete backend (Prometheus, Loki, Tempo, a fixture, ...); the
/// analyzer only ever sees this trait.
#[async_trait]
pub trait DataSourceProvider: Send + Sync {
    async fn query_metrics(
        &self,
        query: &str,
        start: f64,
        end: f64,
        step: &str,
    ) -> AnalyzerResult<MetricResponse>;

    async fn query_logs(
        &self,
        query: &str,
        start: f64,
        end: f64,
    ) -> AnalyzerResult<LogResponse>;

    async fn query_traces(
        &self,
        services: &[String],
        start: f64,
        end: f64,
    ) -> AnalyzerResult<TraceResponse>;
}
