//! Fetch fan-out (§4.1 stages 1-3): builds the log selector, queries
//! metrics/logs/traces/SLO series concurrently bounded by a semaphore, and
//! synthesizes a flat fallback series when every metric query comes back
//! with zero result-series (mirrors the reference's scrape-fallback path).

use causeway_core::provider::{DataSourceProvider, LogResponse, MetricResponse, TraceResponse};
use causeway_core::types::AnalyzeRequest;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

/// Recovered from the reference implementation's `engine/constants.py` —
/// used when the request doesn't name its own metric queries.
pub const DEFAULT_METRIC_QUERIES: &[&str] = &[
    "sum(rate(traces_spanmetrics_calls_total[5m])) by (service)",
    "histogram_quantile(0.99, sum(rate(traces_spanmetrics_latency_bucket[5m])) by (le, service))",
    "sum(rate(traces_spanmetrics_calls_total{status_code='STATUS_CODE_ERROR'}[5m])) by (service)",
    "sum(rate(traces_service_graph_request_failed_total[5m])) by (client, server)",
    "sum(rate(traces_service_graph_request_total[5m])) by (client, server)",
    "sum(rate(system_cpu_time_seconds_total[5m])) by (cpu)",
    "system_memory_usage_bytes",
    "system_filesystem_usage_bytes",
];

pub const SLO_ERROR_QUERY: &str = r#"sum(rate(traces_spanmetrics_calls_total{status_code="STATUS_CODE_ERROR"}[5m]))"#;
pub const SLO_TOTAL_QUERY: &str = "sum(rate(traces_spanmetrics_calls_total[5m]))";

pub fn build_log_selector(request: &AnalyzeRequest) -> String {
    if let Some(q) = &request.log_query {
        return q.clone();
    }
    if request.services.is_empty() {
        return String::new();
    }
    format!("service=~\"{}\"", request.services.join("|"))
}

pub struct FetchResult {
    pub metric_responses: Vec<(String, MetricResponse)>,
    pub logs: Option<LogResponse>,
    pub traces: Option<TraceResponse>,
    pub slo_errors: Option<MetricResponse>,
    pub slo_total: Option<MetricResponse>,
    pub warnings: Vec<String>,
}

/// `provider` is `Arc`-owned so each fanned-out query can run as its own
/// bounded task rather than being serialized behind a shared reference.
pub async fn fetch_all<P: DataSourceProvider + 'static>(
    provider: Arc<P>,
    request: &AnalyzeRequest,
    max_parallel_metric_queries: usize,
) -> FetchResult {
    let mut warnings = Vec::new();

    // §4.1 stage 2: the union of the request's own metric queries and the
    // defaults, deduplicated, not one or the other.
    let mut queries: Vec<String> = request.metric_queries.clone();
    for q in DEFAULT_METRIC_QUERIES {
        if !queries.iter().any(|existing| existing == q) {
            queries.push(q.to_string());
        }
    }

    let log_selector = build_log_selector(request);

    let (metric_responses, logs, traces, slo_errors, slo_total) = tokio::join!(
        fetch_metrics_bounded(provider.clone(), queries.clone(), request.start, request.end, request.step.clone(), max_parallel_metric_queries),
        provider.query_logs(&log_selector, request.start, request.end),
        provider.query_traces(&request.services, request.start, request.end),
        provider.query_metrics(SLO_ERROR_QUERY, request.start, request.end, &request.step),
        provider.query_metrics(SLO_TOTAL_QUERY, request.start, request.end, &request.step),
    );

    let (metric_responses, mut metric_warnings) = metric_responses;
    warnings.append(&mut metric_warnings);

    let logs = match logs {
        Ok(resp) => Some(resp),
        Err(e) => {
            warn!(error = %e, "logs unavailable");
            warnings.push(format!("logs unavailable: {e}"));
            None
        }
    };

    let traces = match traces {
        Ok(resp) => Some(resp),
        Err(e) => {
            warn!(error = %e, "traces unavailable");
            warnings.push(format!("traces unavailable: {e}"));
            None
        }
    };

    let slo_errors = slo_errors.ok();
    let slo_total = slo_total.ok();
    if slo_errors.is_none() || slo_total.is_none() {
        warnings.push("slo metric query failed".to_string());
    }

    let synthesized = synthesize_scrape_fallback(&metric_responses, &queries, request);
    let metric_responses = if let Some(extra) = synthesized {
        warnings.push("all metric queries returned zero series; used scrape fallback".to_string());
        extra
    } else {
        metric_responses
    };

    FetchResult {
        metric_responses,
        logs,
        traces,
        slo_errors,
        slo_total,
        warnings,
    }
}

async fn fetch_metrics_bounded<P: DataSourceProvider + 'static>(
    provider: Arc<P>,
    queries: Vec<String>,
    start: f64,
    end: f64,
    step: String,
    max_parallel: usize,
) -> (Vec<(String, MetricResponse)>, Vec<String>) {
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
    let mut set: JoinSet<(String, Result<MetricResponse, String>)> = JoinSet::new();

    for query in queries {
        let provider = provider.clone();
        let semaphore = semaphore.clone();
        let step = step.clone();
        set.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let result = provider.query_metrics(&query, start, end, &step).await;
            (query, result.map_err(|e| e.to_string()))
        });
    }

    let mut results = Vec::new();
    let mut warnings = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((query, Ok(resp))) => results.push((query, resp)),
            Ok((query, Err(e))) => {
                warn!(error = %e, query = %query, "metric query failed");
                warnings.push(format!("metric query failed for '{query}': {e}"));
            }
            Err(e) => {
                warn!(error = %e, "metric query task panicked");
                warnings.push(format!("metric query task panicked: {e}"));
            }
        }
    }
    results.sort_by(|a: &(String, MetricResponse), b| a.0.cmp(&b.0));
    (results, warnings)
}

fn synthesize_scrape_fallback(
    responses: &[(String, MetricResponse)],
    queries: &[String],
    request: &AnalyzeRequest,
) -> Option<Vec<(String, MetricResponse)>> {
    if responses.is_empty() || responses.iter().any(|(_, r)| !r.series.is_empty()) {
        return None;
    }
    let synthesized: Vec<(String, MetricResponse)> = queries
        .iter()
        .map(|q| {
            (
                q.clone(),
                MetricResponse {
                    query: q.clone(),
                    series: vec![causeway_core::provider::MetricSeries {
                        metric_name: q.clone(),
                        labels: Default::default(),
                        samples: vec![(request.start, 0.0), (request.end, 0.0)],
                    }],
                    scraped_fallback: true,
                },
            )
        })
        .collect();
    Some(synthesized)
}
