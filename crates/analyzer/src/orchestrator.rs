//! Analyzer orchestrator (§4.1): the 13-stage pipeline tying every other
//! crate together behind the single `Analyzer::analyze` entrypoint, built
//! in the same sequential-pipeline-with-metrics-and-tracing style as the
//! reference bid-processing pipeline this workspace started from.

use crate::bayesian_table;
use crate::fetch::{self, FetchResult};
use crate::quality;
use causeway_causal::{bayesian, dag::CausalGraph, granger};
use causeway_correlation::{clustering, dedup, linker, temporal};
use causeway_core::config::AnalyzerConfig;
use causeway_core::provider::{DataSourceProvider, TraceSpan as RawSpan};
use causeway_core::types::{
    AnalysisQuality, AnalysisReport, AnalyzeRequest, ChangePoint, DeploymentEvent, MetricAnomaly, Severity,
};
use causeway_detectors::anomaly::{self, AnomalyDetectorInput};
use causeway_detectors::topology::DependencyGraph;
use causeway_detectors::{baseline, changepoint, forecast, logs as log_detectors, slo, traces};
use causeway_rca::{hypothesis, ranker};
use causeway_store::{BaselineStore, EventsStore, GrangerStore, TenantRegistry, WeightsStore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Recovered from the reference implementation's `engine/constants.py`
/// `FORECAST_THRESHOLDS` dict: substring-matched against the query string
/// that produced a series, gating which metrics get trajectory forecasts.
const FORECAST_THRESHOLDS: &[(&str, f64)] = &[
    ("system_memory_usage_bytes", 0.85),
    ("system_filesystem_usage_bytes", 0.90),
    ("traces_spanmetrics_latency", 2.0),
    ("traces_service_graph_request_failed", 0.05),
];

fn forecast_threshold(query: &str) -> Option<f64> {
    FORECAST_THRESHOLDS
        .iter()
        .find(|(substr, _)| query.contains(substr))
        .map(|(_, threshold)| *threshold)
}

/// ML ranker label cutoff: a cause is treated as a "strong" training example
/// when its rule confidence is at least this high. Fixed rather than tied to
/// `rca_min_confidence_display`, which gates display, not training labels.
const RANK_LABEL_THRESHOLD: f64 = 0.5;

fn variance(vals: &[f64]) -> f64 {
    let finite: Vec<f64> = vals.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < 2 {
        return 0.0;
    }
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

pub struct Analyzer<P> {
    provider: Arc<P>,
    config: AnalyzerConfig,
    baseline_store: BaselineStore,
    granger_store: GrangerStore,
    events_store: EventsStore,
    tenant_registry: TenantRegistry,
}

impl<P: DataSourceProvider + 'static> Analyzer<P> {
    pub fn new(provider: Arc<P>, config: AnalyzerConfig) -> Self {
        let baseline_store = BaselineStore::new(&config.store);
        let granger_store = GrangerStore::new(&config.store);
        let events_store = EventsStore::new(&config.store);
        let weights_store = WeightsStore::new(&config.store);
        let tenant_registry = TenantRegistry::new(weights_store, config.store.registry_alpha);
        Self {
            provider,
            config,
            baseline_store,
            granger_store,
            events_store,
            tenant_registry,
        }
    }

    /// Records a deployment event for a tenant so later `analyze` calls can
    /// correlate it against anomalies in its window (§4.1 stage 9 input).
    pub async fn record_deployment(&self, tenant_id: &str, event: DeploymentEvent) {
        self.events_store.append(tenant_id, event).await;
    }

    pub async fn analyze(&self, request: &AnalyzeRequest) -> AnalysisReport {
        let run_start = std::time::Instant::now();
        metrics::counter!("causeway.analyze.requests").increment(1);

        let mut warnings = Vec::new();
        let window_seconds = (request.end - request.start).max(1.0);
        let sensitivity = request.sensitivity.unwrap_or(self.config.anomaly.zscore_threshold);
        let precision_profile = self.config.quality.gating_profile.starts_with("precision");

        // Stages 1-3: log selector, fetch fan-out, scrape fallback.
        let fetch: FetchResult = fetch::fetch_all(
            self.provider.clone(),
            request,
            self.config.runtime.max_parallel_metric_queries,
        )
        .await;
        warnings.extend(fetch.warnings.iter().cloned());

        // Stage 4: per-series pipeline (baseline blend, anomaly, changepoint, forecast, degradation).
        let mut metric_anomalies: Vec<MetricAnomaly> = Vec::new();
        let mut change_points: Vec<ChangePoint> = Vec::new();
        let mut forecasts = Vec::new();
        let mut degradations = Vec::new();
        let mut series_by_metric: HashMap<String, Vec<f64>> = HashMap::new();

        for (query, resp) in &fetch.metric_responses {
            for series in &resp.series {
                let ts: Vec<f64> = series.samples.iter().map(|(t, _)| *t).collect();
                let vals: Vec<f64> = series.samples.iter().map(|(_, v)| *v).collect();
                if vals.len() < self.config.baseline.min_samples {
                    debug!(metric = %series.metric_name, "series below min_samples, skipping");
                    continue;
                }

                series_by_metric.entry(series.metric_name.clone()).or_insert_with(|| vals.clone());

                let cached = self.baseline_store.load(&request.tenant_id, &series.metric_name).await;
                let fresh = baseline::compute_fresh(&vals);
                let blended = baseline::blend(cached.as_ref(), &fresh);
                self.baseline_store.save(&request.tenant_id, &series.metric_name, &blended).await;

                let anomalies = anomaly::detect(
                    AnomalyDetectorInput {
                        metric_name: &series.metric_name,
                        ts: &ts,
                        vals: &vals,
                        sensitivity,
                        min_samples: self.config.baseline.min_samples,
                        max_density_per_hour: self.config.quality.max_anomaly_density_per_metric_per_hour,
                        precision_profile,
                    },
                    &self.config.anomaly,
                );
                metric_anomalies.extend(anomalies);

                let cps = changepoint::detect(
                    &series.metric_name,
                    &ts,
                    &vals,
                    self.config.changepoint.cusum_threshold_sigma,
                    &self.config.changepoint,
                );
                change_points.extend(cps);

                if window_seconds >= self.config.forecast.min_window_seconds {
                    if let Some(threshold) = forecast_threshold(query) {
                        if let Some(f) = forecast::forecast_trajectory(&series.metric_name, &ts, &vals, threshold, &self.config.forecast) {
                            forecasts.push(f);
                        }
                    }
                }
                if window_seconds >= self.config.forecast.degradation_min_window_seconds {
                    if let Some(d) = forecast::analyze_degradation(&series.metric_name, &vals, &self.config.forecast) {
                        degradations.push(d);
                    }
                }
            }
        }

        // Stage 5: deduplication.
        let metric_anomalies = dedup::dedup_metric_anomalies(metric_anomalies);
        let change_points = dedup::dedup_change_points(change_points);
        let forecasts = dedup::dedup_forecasts(forecasts);
        let degradations = dedup::dedup_degradations(degradations);

        // Stage 6: log/trace/SLO analysis.
        let log_lines: Vec<log_detectors::LogLine> = fetch
            .logs
            .as_ref()
            .map(|r| r.entries.iter().map(|e| log_detectors::LogLine { timestamp: e.timestamp, message: &e.message }).collect())
            .unwrap_or_default();
        let log_bursts = log_detectors::detect_bursts(&log_lines, &self.config.logs);
        let log_patterns = log_detectors::detect_patterns(&log_lines, &self.config.logs);

        let spans: Vec<RawSpan> = fetch.traces.as_ref().map(|t| t.spans.clone()).unwrap_or_default();
        if spans.is_empty() {
            warnings.push("traces empty; latency and propagation analysis skipped".to_string());
        }
        let mut graph = DependencyGraph::new();
        for span in &spans {
            if let Some(parent) = &span.parent_service {
                graph.add_edge(parent, &span.service);
            }
        }
        let trace_spans: Vec<traces::Span> = spans
            .iter()
            .map(|s| traces::Span {
                service: s.service.clone(),
                operation: s.operation.clone(),
                duration_ms: s.duration_ms,
                is_error: s.is_error,
                parent_service: s.parent_service.clone(),
            })
            .collect();
        let service_latency = traces::analyze_latency(&trace_spans, &self.config.traces);
        let error_propagation = traces::detect_propagation(&trace_spans, Some(&graph), self.config.topology.max_depth);

        let target_availability = request.slo_target.unwrap_or(self.config.slo.default_target_availability);
        let slo_alerts = match (&fetch.slo_errors, &fetch.slo_total) {
            (Some(errors), Some(total)) => {
                let error_vals: Vec<f64> = errors.series.first().map(|s| s.samples.iter().map(|(_, v)| *v).collect()).unwrap_or_default();
                let total_vals: Vec<f64> = total.series.first().map(|s| s.samples.iter().map(|(_, v)| *v).collect()).unwrap_or_default();
                if error_vals.len() != total_vals.len() {
                    warnings.push("slo error/total series length mismatch; trimmed to shortest".to_string());
                }
                let service = request.services.first().cloned().unwrap_or_else(|| request.tenant_id.clone());
                slo::evaluate_burn(&service, &error_vals, &total_vals, target_availability, &self.config.slo)
            }
            _ => Vec::new(),
        };

        // Stage 7: correlation.
        let correlated_events = temporal::correlate(&metric_anomalies, &log_bursts, &service_latency, &self.config.correlation);
        let log_metric_links = linker::link(&metric_anomalies, &log_bursts, &self.config.correlation);
        let anomaly_clusters = clustering::cluster(&metric_anomalies, self.config.ml.cluster_eps, self.config.ml.cluster_min_samples);

        // Stage 8: causality.
        let mut candidates: Vec<(String, Vec<f64>)> = series_by_metric
            .into_iter()
            .filter(|(_, vals)| vals.len() >= self.config.granger.min_samples && variance(vals) > 0.0)
            .collect();
        candidates.sort_by(|a, b| variance(&b.1).partial_cmp(&variance(&a.1)).unwrap());
        candidates.truncate(self.config.granger.max_series);

        let mut granger_results = Vec::new();
        for (i, (cause_name, cause_vals)) in candidates.iter().enumerate() {
            for (j, (effect_name, effect_vals)) in candidates.iter().enumerate() {
                if i == j {
                    continue;
                }
                if let Some(result) = granger::test(cause_name, effect_name, cause_vals, effect_vals, &self.config.granger) {
                    let merged = self.granger_store.save_and_merge(&request.tenant_id, result).await;
                    granger_results.push(merged);
                }
            }
        }
        let causal_graph = CausalGraph::from_granger_results(&granger_results);
        debug!(nodes = causal_graph.node_count(), "causal graph built");

        let evidence = bayesian_table::Evidence {
            has_deployment_event: false, // filled in after deployments are loaded below
            has_metric_spike: !metric_anomalies.is_empty(),
            has_log_burst: !log_bursts.is_empty(),
            has_latency_spike: !service_latency.is_empty(),
            has_error_propagation: !error_propagation.is_empty(),
        };

        // Stage 9: RCA generation & ranking.
        let deploy_window = self.config.rca.deploy_window_seconds;
        let deployments = self
            .events_store
            .in_window(&request.tenant_id, request.start - deploy_window, request.end + deploy_window)
            .await;

        let evidence = bayesian_table::Evidence {
            has_deployment_event: !deployments.is_empty(),
            ..evidence
        };
        let bayesian_scores = bayesian::score(&bayesian_table::models(), &evidence.into_map(), &self.config.bayesian);

        let hypothesis_input = hypothesis::HypothesisInput {
            correlated_events: &correlated_events,
            error_propagation: &error_propagation,
            log_patterns: &log_patterns,
            deployments: &deployments,
            graph: Some(&graph),
            rca_severity_weight_threshold: self.config.rca.severity_weight_threshold,
            log_pattern_score: self.config.rca.log_pattern_score,
            topology_max_depth: self.config.topology.max_depth,
        };
        let root_causes = hypothesis::generate(&hypothesis_input, &self.config.rca);
        let mut ranked_causes = ranker::rank(&root_causes, &correlated_events, &self.config.ml, RANK_LABEL_THRESHOLD);

        let tenant_state = self.tenant_registry.get_state(&request.tenant_id).await;
        for cause in &mut ranked_causes {
            let per_signal: HashMap<_, _> = cause
                .root_cause
                .contributing_signals
                .iter()
                .map(|s| (*s, cause.root_cause.confidence))
                .collect();
            let weighted = tenant_state.weighted_confidence(&per_signal);
            if weighted > 0.0 {
                cause.final_score = (cause.final_score + weighted) / 2.0;
            }
        }

        // Stage 10: output capping.
        let mut metric_anomalies = metric_anomalies;
        if metric_anomalies.len() > self.config.runtime.max_metric_anomalies {
            metric_anomalies.sort_by(|a, b| b.severity.cmp(&a.severity).then(b.z_score.abs().partial_cmp(&a.z_score.abs()).unwrap()));
            metric_anomalies.truncate(self.config.runtime.max_metric_anomalies);
            metric_anomalies.sort_by(|a, b| a.timestamp.partial_cmp(&b.timestamp).unwrap());
            warnings.push("metric_anomalies truncated to analyzer_max_metric_anomalies".to_string());
        }
        let mut change_points = change_points;
        if change_points.len() > self.config.runtime.max_change_points {
            change_points.sort_by(|a, b| b.magnitude.partial_cmp(&a.magnitude).unwrap());
            change_points.truncate(self.config.runtime.max_change_points);
            warnings.push("change_points truncated to analyzer_max_change_points".to_string());
        }
        let mut anomaly_clusters = anomaly_clusters;
        if anomaly_clusters.len() > self.config.runtime.max_clusters {
            anomaly_clusters.sort_by(|a, b| b.size.cmp(&a.size));
            anomaly_clusters.truncate(self.config.runtime.max_clusters);
            warnings.push("anomaly_clusters truncated to analyzer_max_clusters".to_string());
        }
        let mut granger_results = granger_results;
        if granger_results.len() > self.config.runtime.max_granger_pairs {
            granger_results.sort_by(|a, b| b.strength.partial_cmp(&a.strength).unwrap());
            granger_results.truncate(self.config.runtime.max_granger_pairs);
            warnings.push("granger_results truncated to analyzer_max_granger_pairs".to_string());
        }
        ranked_causes.sort_by(|a, b| b.final_score.partial_cmp(&a.final_score).unwrap());
        if ranked_causes.len() > self.config.runtime.max_root_causes {
            ranked_causes.truncate(self.config.runtime.max_root_causes);
            warnings.push("root_causes truncated to analyzer_max_root_causes".to_string());
        }

        // Stage 11: precision quality gate.
        let (metric_anomalies, anomaly_density, density_suppressed) = if precision_profile {
            quality::cap_anomaly_density(metric_anomalies, window_seconds, &self.config.quality)
        } else {
            (metric_anomalies, HashMap::new(), 0)
        };
        let (ranked_causes, mut suppression_counts) = if precision_profile {
            quality::gate(ranked_causes, &self.config.quality)
        } else {
            (ranked_causes, HashMap::new())
        };
        if density_suppressed > 0 {
            suppression_counts.insert("density_suppressed_metric_anomalies".to_string(), density_suppressed);
        }
        let quality_record: AnalysisQuality = quality::build_quality_record(anomaly_density, suppression_counts, &self.config.quality);

        // Stage 12: severity rollup and summary.
        let mut overall_severity = Severity::Low;
        for s in metric_anomalies.iter().map(|a| a.severity) {
            overall_severity = overall_severity.max(s);
        }
        for s in log_bursts.iter().map(|b| b.severity) {
            overall_severity = overall_severity.max(s);
        }
        for s in log_patterns.iter().map(|p| p.severity) {
            overall_severity = overall_severity.max(s);
        }
        for s in service_latency.iter().map(|l| l.severity) {
            overall_severity = overall_severity.max(s);
        }
        for s in slo_alerts.iter().map(|a| a.severity) {
            overall_severity = overall_severity.max(s);
        }
        for s in forecasts.iter().map(|f| f.severity) {
            overall_severity = overall_severity.max(s);
        }

        let has_actionable_signal = !metric_anomalies.is_empty()
            || !log_bursts.is_empty()
            || !log_patterns.is_empty()
            || !service_latency.is_empty()
            || !error_propagation.is_empty()
            || !slo_alerts.is_empty()
            || !ranked_causes.is_empty();
        let has_predictive_only = !forecasts.is_empty() || !degradations.is_empty() || !change_points.is_empty();
        if !has_actionable_signal && has_predictive_only && overall_severity > Severity::Medium {
            overall_severity = Severity::Medium;
            warnings.push("severity capped at medium: only predictive signals present".to_string());
        }

        let grouped_anomalies = dedup::group_metric_anomalies(&metric_anomalies, self.config.correlation.window_seconds);
        let top_hypothesis = ranked_causes
            .first()
            .map(|c| truncate_chars(&c.root_cause.hypothesis, 120))
            .unwrap_or_else(|| "no root cause identified".to_string());
        let summary = format!(
            "{} metric anomaly group(s), {} log burst(s), {} service latency issue(s), {} root cause(s). top: {}",
            grouped_anomalies.len(),
            log_bursts.len(),
            service_latency.len(),
            ranked_causes.len(),
            top_hypothesis,
        );

        metrics::histogram!("causeway.analyze.duration_ms").record(run_start.elapsed().as_millis() as f64);

        if !warnings.is_empty() {
            warn!(count = warnings.len(), "analysis completed with warnings");
        }

        let root_causes: Vec<_> = ranked_causes.iter().map(|r| r.root_cause.clone()).collect();

        AnalysisReport {
            tenant_id: request.tenant_id.clone(),
            start: request.start,
            end: request.end,
            duration_seconds: run_start.elapsed().as_secs_f64(),
            metric_anomalies,
            change_points,
            log_bursts,
            log_patterns,
            service_latency,
            error_propagation,
            slo_alerts,
            forecasts,
            degradation_signals: degradations,
            anomaly_clusters,
            log_metric_links,
            granger_results,
            bayesian_scores,
            root_causes,
            ranked_causes,
            overall_severity,
            summary,
            analysis_warnings: warnings,
            quality: quality_record,
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max.saturating_sub(3)).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use causeway_core::error::AnalyzerResult;
    use causeway_core::provider::{LogResponse, MetricResponse, MetricSeries, TraceResponse};

    struct FixtureProvider;

    #[async_trait]
    impl DataSourceProvider for FixtureProvider {
        async fn query_metrics(&self, query: &str, start: f64, end: f64, _step: &str) -> AnalyzerResult<MetricResponse> {
            let n = 30;
            let mut samples = Vec::new();
            for i in 0..n {
                let t = start + i as f64 * ((end - start) / n as f64);
                let v = if i == n - 5 { 500.0 } else { 10.0 };
                samples.push((t, v));
            }
            Ok(MetricResponse {
                query: query.to_string(),
                series: vec![MetricSeries {
                    metric_name: "payments_cpu".to_string(),
                    labels: Default::default(),
                    samples,
                }],
                scraped_fallback: false,
            })
        }

        async fn query_logs(&self, query: &str, _start: f64, _end: f64) -> AnalyzerResult<LogResponse> {
            Ok(LogResponse { query: query.to_string(), entries: vec![] })
        }

        async fn query_traces(&self, services: &[String], _start: f64, _end: f64) -> AnalyzerResult<TraceResponse> {
            Ok(TraceResponse { services: services.to_vec(), spans: vec![] })
        }
    }

    #[tokio::test]
    async fn produces_a_well_formed_report_for_a_spiking_metric() {
        let analyzer = Analyzer::new(Arc::new(FixtureProvider), AnalyzerConfig::default());
        let request = AnalyzeRequest {
            tenant_id: "acme".to_string(),
            start: 0.0,
            end: 1800.0,
            step: "60s".to_string(),
            services: vec!["payments".to_string()],
            log_query: None,
            metric_queries: vec!["payments_cpu".to_string()],
            sensitivity: None,
            apdex_threshold_ms: 500.0,
            slo_target: None,
            correlation_window_seconds: None,
            forecast_horizon_seconds: None,
        };
        let report = analyzer.analyze(&request).await;
        assert_eq!(report.tenant_id, "acme");
        assert!(!report.metric_anomalies.is_empty());
    }
}
