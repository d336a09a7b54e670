use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Severity ladder shared by every finding type. Ordering is the numeric
/// weight used for `max(severity)` rollups throughout the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Weight used for additive scoring and severity comparisons (1/2/4/8).
    pub fn weight(self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 4,
            Severity::Critical => 8,
        }
    }

    pub fn from_score(score: f64, critical: f64, high: f64, medium: f64) -> Self {
        if score >= critical {
            Severity::Critical
        } else if score >= high {
            Severity::High
        } else if score >= medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn max(self, other: Self) -> Self {
        if other.weight() > self.weight() {
            other
        } else {
            self
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Low
    }
}

/// One of the four evidence source families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Metrics,
    Logs,
    Traces,
    Events,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Spike,
    Drop,
    Drift,
    Shift,
    Oscillation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RcaCategory {
    Deployment,
    ResourceExhaustion,
    DependencyFailure,
    TrafficSurge,
    ErrorPropagation,
    SloBurn,
    Unknown,
}

/// Request envelope handed to the analyzer entrypoint. Validation (non-empty
/// tenant_id, start < end, sensitivity range, …) happens at the boundary
/// before core is entered — see causeway-core::error::AnalyzerError::Validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub tenant_id: String,
    pub start: f64,
    pub end: f64,
    #[serde(default = "default_step")]
    pub step: String,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub log_query: Option<String>,
    #[serde(default)]
    pub metric_queries: Vec<String>,
    #[serde(default)]
    pub sensitivity: Option<f64>,
    #[serde(default = "default_apdex_threshold_ms")]
    pub apdex_threshold_ms: f64,
    #[serde(default)]
    pub slo_target: Option<f64>,
    #[serde(default)]
    pub correlation_window_seconds: Option<f64>,
    #[serde(default)]
    pub forecast_horizon_seconds: Option<f64>,
}

fn default_step() -> String {
    "15s".to_string()
}
fn default_apdex_threshold_ms() -> f64 {
    500.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricAnomaly {
    pub metric_name: String,
    pub timestamp: f64,
    pub value: f64,
    pub change_type: ChangeType,
    pub z_score: f64,
    pub mad_score: f64,
    pub isolation_score: f64,
    pub expected_range: (f64, f64),
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePoint {
    pub metric_name: String,
    pub index: usize,
    pub timestamp: f64,
    pub value_before: f64,
    pub value_after: f64,
    pub magnitude: f64,
    pub change_type: ChangeType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogBurst {
    pub window_start: f64,
    pub window_end: f64,
    pub rate_per_second: f64,
    pub baseline_rate: f64,
    pub ratio: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPattern {
    pub pattern: String,
    pub count: usize,
    pub first_seen: f64,
    pub last_seen: f64,
    pub rate_per_minute: f64,
    pub entropy: f64,
    pub severity: Severity,
    pub sample: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceLatency {
    pub service: String,
    pub operation: String,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub apdex: f64,
    pub error_rate: f64,
    pub sample_count: usize,
    pub severity: Severity,
    #[serde(default)]
    pub window_start: Option<f64>,
    #[serde(default)]
    pub window_end: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPropagation {
    pub source_service: String,
    pub affected_services: Vec<String>,
    pub error_rate: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuppressionDiagnostics {
    pub gating_profile: String,
    pub signal_count: usize,
    pub meets_min_corroboration_signals: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionScoreComponents {
    pub rule_confidence: f64,
    pub ml_score: f64,
    pub final_score: f64,
    #[serde(flatten)]
    pub feature_importance: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootCause {
    pub hypothesis: String,
    pub confidence: f64,
    pub severity: Severity,
    pub category: RcaCategory,
    pub evidence: Vec<String>,
    pub contributing_signals: Vec<Signal>,
    pub affected_services: Vec<String>,
    pub recommended_action: String,
    #[serde(default)]
    pub corroboration_summary: String,
    #[serde(default)]
    pub suppression_diagnostics: Option<SuppressionDiagnostics>,
    #[serde(default)]
    pub selection_score_components: Option<SelectionScoreComponents>,
    #[serde(default)]
    pub deployment: Option<DeploymentEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCause {
    pub root_cause: RootCause,
    pub ml_score: f64,
    pub final_score: f64,
    pub feature_importance: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelatedEvent {
    pub window_start: f64,
    pub window_end: f64,
    pub metric_anomalies: Vec<MetricAnomaly>,
    pub log_bursts: Vec<LogBurst>,
    pub service_latency: Vec<ServiceLatency>,
    pub signal_count: usize,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    pub mean: f64,
    pub std: f64,
    pub lower: f64,
    pub upper: f64,
    #[serde(default)]
    pub seasonal_mean: Option<f64>,
    pub sample_count: usize,
}

impl Baseline {
    pub fn score(&self, value: f64) -> (bool, f64) {
        let z = (value - self.mean) / self.std;
        (value < self.lower || value > self.upper, z)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSignalWeights {
    pub weights: HashMap<Signal, f64>,
    pub update_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentEvent {
    pub service: String,
    pub timestamp: f64,
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

fn default_environment() -> String {
    "production".to_string()
}
fn default_source() -> String {
    "unknown".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrangerResult {
    pub cause_metric: String,
    pub effect_metric: String,
    pub max_lag: usize,
    pub f_statistic: f64,
    pub p_value: f64,
    pub is_causal: bool,
    pub strength: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BayesianScore {
    pub category: RcaCategory,
    pub posterior: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyCluster {
    pub cluster_id: i64,
    pub members: Vec<MetricAnomaly>,
    pub centroid_timestamp: f64,
    pub centroid_value: f64,
    pub metric_names: Vec<String>,
    pub size: usize,
    pub is_noise: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryForecast {
    pub metric_name: String,
    pub current_value: f64,
    pub predicted_value: f64,
    pub threshold: f64,
    pub will_breach: bool,
    #[serde(default)]
    pub time_to_threshold_seconds: Option<f64>,
    pub confidence: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegradationSignal {
    pub metric_name: String,
    pub slope: f64,
    pub volatility: f64,
    pub rate: f64,
    pub trend: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SloBurnAlert {
    pub service: String,
    pub window_label: String,
    pub burn_rate: f64,
    pub severity: Severity,
    pub error_budget_consumed_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub service: String,
    pub window_days: u32,
    pub target_availability: f64,
    pub current_availability: f64,
    pub budget_used_pct: f64,
    pub remaining_minutes: f64,
    pub on_track: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMetricLink {
    pub metric_name: String,
    pub log_window_start: f64,
    pub lag_seconds: f64,
    pub strength: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisQuality {
    pub anomaly_density: HashMap<String, f64>,
    pub suppression_counts: HashMap<String, usize>,
    pub gating_profile: String,
    pub confidence_calibration_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub tenant_id: String,
    pub start: f64,
    pub end: f64,
    pub duration_seconds: f64,
    pub metric_anomalies: Vec<MetricAnomaly>,
    pub change_points: Vec<ChangePoint>,
    pub log_bursts: Vec<LogBurst>,
    pub log_patterns: Vec<LogPattern>,
    pub service_latency: Vec<ServiceLatency>,
    pub error_propagation: Vec<ErrorPropagation>,
    pub slo_alerts: Vec<SloBurnAlert>,
    pub forecasts: Vec<TrajectoryForecast>,
    pub degradation_signals: Vec<DegradationSignal>,
    pub anomaly_clusters: Vec<AnomalyCluster>,
    pub log_metric_links: Vec<LogMetricLink>,
    pub granger_results: Vec<GrangerResult>,
    pub bayesian_scores: Vec<BayesianScore>,
    pub root_causes: Vec<RootCause>,
    pub ranked_causes: Vec<RankedCause>,
    pub overall_severity: Severity,
    pub summary: String,
    pub analysis_warnings: Vec<String>,
    pub quality: AnalysisQuality,
}
