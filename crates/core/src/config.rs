use serde::Deserialize;

/// Root analyzer configuration. Loaded from environment variables with the
/// prefix `CAUSEWAY__` and optional TOML config files, following the same
/// nested-struct-with-default-fn pattern throughout.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub baseline: BaselineConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
    #[serde(default)]
    pub changepoint: ChangepointConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub traces: TracesConfig,
    #[serde(default)]
    pub topology: TopologyConfig,
    #[serde(default)]
    pub correlation: CorrelationConfig,
    #[serde(default)]
    pub granger: GrangerConfig,
    #[serde(default)]
    pub causal: CausalConfig,
    #[serde(default)]
    pub bayesian: BayesianConfig,
    #[serde(default)]
    pub ml: MlConfig,
    #[serde(default)]
    pub rca: RcaConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub slo: SloConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            baseline: BaselineConfig::default(),
            anomaly: AnomalyConfig::default(),
            changepoint: ChangepointConfig::default(),
            logs: LogsConfig::default(),
            traces: TracesConfig::default(),
            topology: TopologyConfig::default(),
            correlation: CorrelationConfig::default(),
            granger: GrangerConfig::default(),
            causal: CausalConfig::default(),
            bayesian: BayesianConfig::default(),
            ml: MlConfig::default(),
            rca: RcaConfig::default(),
            quality: QualityConfig::default(),
            forecast: ForecastConfig::default(),
            slo: SloConfig::default(),
            store: StoreConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from environment variables and optional config file.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("CAUSEWAY")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(","),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

// ─── Baseline ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct BaselineConfig {
    #[serde(default = "default_blend_alpha")]
    pub blend_alpha: f64,
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    #[serde(default = "default_baseline_window_seconds")]
    pub window_seconds: f64,
}

fn default_blend_alpha() -> f64 {
    0.1
}
fn default_min_samples() -> usize {
    12
}
fn default_baseline_window_seconds() -> f64 {
    3600.0
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            blend_alpha: default_blend_alpha(),
            min_samples: default_min_samples(),
            window_seconds: default_baseline_window_seconds(),
        }
    }
}

// ─── Anomaly ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyConfig {
    #[serde(default = "default_zscore_threshold")]
    pub zscore_threshold: f64,
    #[serde(default = "default_mad_threshold")]
    pub mad_threshold: f64,
    #[serde(default = "default_mad_scale")]
    pub mad_scale: f64,
    #[serde(default = "default_iso_weight")]
    pub iso_weight: f64,
    #[serde(default = "default_severity_critical")]
    pub severity_score_critical: f64,
    #[serde(default = "default_severity_high")]
    pub severity_score_high: f64,
    #[serde(default = "default_severity_medium")]
    pub severity_score_medium: f64,
    #[serde(default = "default_drift_slope_threshold")]
    pub drift_slope_threshold: f64,
    #[serde(default = "default_compress_runs")]
    pub compress_runs: bool,
    #[serde(default = "default_run_gap_multiplier")]
    pub run_gap_multiplier: f64,
    #[serde(default = "default_run_keep_max")]
    pub run_keep_max: usize,
    #[serde(default = "default_cusum_k")]
    pub cusum_k: f64,
    #[serde(default = "default_cusum_threshold_sigma")]
    pub cusum_threshold_sigma: f64,
    #[serde(default = "default_contamination_divisor")]
    pub contamination_divisor: f64,
    #[serde(default = "default_min_sensitivity")]
    pub min_sensitivity: f64,
    #[serde(default = "default_contamination_min")]
    pub contamination_min: f64,
    #[serde(default = "default_contamination_max")]
    pub contamination_max: f64,
    #[serde(default = "default_precision_contamination_multiplier")]
    pub precision_contamination_multiplier: f64,
    #[serde(default = "default_precision_contamination_cap")]
    pub precision_contamination_cap: f64,
}

fn default_zscore_threshold() -> f64 {
    3.0
}
fn default_mad_threshold() -> f64 {
    4.0
}
fn default_mad_scale() -> f64 {
    0.6745
}
fn default_iso_weight() -> f64 {
    0.10
}
fn default_severity_critical() -> f64 {
    0.75
}
fn default_severity_high() -> f64 {
    0.50
}
fn default_severity_medium() -> f64 {
    0.25
}
fn default_drift_slope_threshold() -> f64 {
    0.15
}
fn default_compress_runs() -> bool {
    true
}
fn default_run_gap_multiplier() -> f64 {
    2.0
}
fn default_run_keep_max() -> usize {
    3
}
fn default_cusum_k() -> f64 {
    0.5
}
fn default_cusum_threshold_sigma() -> f64 {
    5.0
}
fn default_contamination_divisor() -> f64 {
    0.15
}
fn default_min_sensitivity() -> f64 {
    1.0
}
fn default_contamination_min() -> f64 {
    0.01
}
fn default_contamination_max() -> f64 {
    0.20
}
fn default_precision_contamination_multiplier() -> f64 {
    0.35
}
fn default_precision_contamination_cap() -> f64 {
    0.10
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            zscore_threshold: default_zscore_threshold(),
            mad_threshold: default_mad_threshold(),
            mad_scale: default_mad_scale(),
            iso_weight: default_iso_weight(),
            severity_score_critical: default_severity_critical(),
            severity_score_high: default_severity_high(),
            severity_score_medium: default_severity_medium(),
            drift_slope_threshold: default_drift_slope_threshold(),
            compress_runs: default_compress_runs(),
            run_gap_multiplier: default_run_gap_multiplier(),
            run_keep_max: default_run_keep_max(),
            cusum_k: default_cusum_k(),
            cusum_threshold_sigma: default_cusum_threshold_sigma(),
            contamination_divisor: default_contamination_divisor(),
            min_sensitivity: default_min_sensitivity(),
            contamination_min: default_contamination_min(),
            contamination_max: default_contamination_max(),
            precision_contamination_multiplier: default_precision_contamination_multiplier(),
            precision_contamination_cap: default_precision_contamination_cap(),
        }
    }
}

// ─── Changepoint (CUSUM) ────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ChangepointConfig {
    #[serde(default = "default_cusum_threshold_sigma")]
    pub cusum_threshold_sigma: f64,
    #[serde(default = "default_cusum_k")]
    pub cusum_k: f64,
    #[serde(default = "default_cusum_relative_cutoff")]
    pub cusum_relative_cutoff: f64,
    #[serde(default = "default_cusum_oscillation_density_cutoff")]
    pub oscillation_density_cutoff: f64,
}

fn default_cusum_threshold_sigma() -> f64 {
    6.0
}
fn default_cusum_k() -> f64 {
    0.5
}
fn default_cusum_relative_cutoff() -> f64 {
    0.6
}
fn default_cusum_oscillation_density_cutoff() -> f64 {
    0.3
}

impl Default for ChangepointConfig {
    fn default() -> Self {
        Self {
            cusum_threshold_sigma: default_cusum_threshold_sigma(),
            cusum_k: default_cusum_k(),
            cusum_relative_cutoff: default_cusum_relative_cutoff(),
            oscillation_density_cutoff: default_cusum_oscillation_density_cutoff(),
        }
    }
}

// ─── Logs ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_burst_ratio_critical")]
    pub burst_ratio_critical: f64,
    #[serde(default = "default_burst_ratio_high")]
    pub burst_ratio_high: f64,
    #[serde(default = "default_burst_ratio_medium")]
    pub burst_ratio_medium: f64,
    #[serde(default = "default_pattern_min_count")]
    pub pattern_min_count: usize,
    #[serde(default = "default_pattern_window_seconds")]
    pub pattern_window_seconds: f64,
}

fn default_burst_ratio_critical() -> f64 {
    10.0
}
fn default_burst_ratio_high() -> f64 {
    5.0
}
fn default_burst_ratio_medium() -> f64 {
    2.5
}
fn default_pattern_min_count() -> usize {
    5
}
fn default_pattern_window_seconds() -> f64 {
    300.0
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            burst_ratio_critical: default_burst_ratio_critical(),
            burst_ratio_high: default_burst_ratio_high(),
            burst_ratio_medium: default_burst_ratio_medium(),
            pattern_min_count: default_pattern_min_count(),
            pattern_window_seconds: default_pattern_window_seconds(),
        }
    }
}

// ─── Traces ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct TracesConfig {
    #[serde(default = "default_latency_p99_critical_ms")]
    pub latency_p99_critical_ms: f64,
    #[serde(default = "default_latency_p99_high_ms")]
    pub latency_p99_high_ms: f64,
    #[serde(default = "default_latency_p99_medium_ms")]
    pub latency_p99_medium_ms: f64,
    #[serde(default = "default_error_rate_critical")]
    pub error_rate_critical: f64,
    #[serde(default = "default_error_rate_high")]
    pub error_rate_high: f64,
    #[serde(default = "default_error_rate_medium")]
    pub error_rate_medium: f64,
    #[serde(default = "default_apdex_threshold_ms")]
    pub apdex_threshold_ms: f64,
}

fn default_latency_p99_critical_ms() -> f64 {
    2000.0
}
fn default_latency_p99_high_ms() -> f64 {
    1000.0
}
fn default_latency_p99_medium_ms() -> f64 {
    500.0
}
fn default_error_rate_critical() -> f64 {
    0.25
}
fn default_error_rate_high() -> f64 {
    0.10
}
fn default_error_rate_medium() -> f64 {
    0.02
}
fn default_apdex_threshold_ms() -> f64 {
    500.0
}

impl Default for TracesConfig {
    fn default() -> Self {
        Self {
            latency_p99_critical_ms: default_latency_p99_critical_ms(),
            latency_p99_high_ms: default_latency_p99_high_ms(),
            latency_p99_medium_ms: default_latency_p99_medium_ms(),
            error_rate_critical: default_error_rate_critical(),
            error_rate_high: default_error_rate_high(),
            error_rate_medium: default_error_rate_medium(),
            apdex_threshold_ms: default_apdex_threshold_ms(),
        }
    }
}

// ─── Topology ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct TopologyConfig {
    #[serde(default = "default_topology_max_depth")]
    pub max_depth: usize,
}

fn default_topology_max_depth() -> usize {
    6
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            max_depth: default_topology_max_depth(),
        }
    }
}

// ─── Correlation ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CorrelationConfig {
    #[serde(default = "default_correlation_window_seconds")]
    pub window_seconds: f64,
    #[serde(default = "default_max_lag_seconds")]
    pub max_lag_seconds: f64,
    #[serde(default = "default_weight_time")]
    pub weight_time: f64,
    #[serde(default = "default_weight_latency")]
    pub weight_latency: f64,
    #[serde(default = "default_weight_errors")]
    pub weight_errors: f64,
    #[serde(default = "default_errors_cap")]
    pub errors_cap: f64,
}

fn default_correlation_window_seconds() -> f64 {
    45.0
}
fn default_max_lag_seconds() -> f64 {
    90.0
}
fn default_weight_time() -> f64 {
    0.30
}
fn default_weight_latency() -> f64 {
    0.35
}
fn default_weight_errors() -> f64 {
    0.35
}
fn default_errors_cap() -> f64 {
    0.35
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_correlation_window_seconds(),
            max_lag_seconds: default_max_lag_seconds(),
            weight_time: default_weight_time(),
            weight_latency: default_weight_latency(),
            weight_errors: default_weight_errors(),
            errors_cap: default_errors_cap(),
        }
    }
}

// ─── Granger ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct GrangerConfig {
    #[serde(default = "default_granger_max_lag")]
    pub max_lag: usize,
    #[serde(default = "default_granger_p_threshold")]
    pub p_threshold: f64,
    #[serde(default = "default_granger_strength_scale")]
    pub strength_scale: f64,
    #[serde(default = "default_granger_max_series")]
    pub max_series: usize,
    #[serde(default = "default_granger_min_samples")]
    pub min_samples: usize,
}

fn default_granger_max_lag() -> usize {
    3
}
fn default_granger_p_threshold() -> f64 {
    0.05
}
fn default_granger_strength_scale() -> f64 {
    10.0
}
fn default_granger_max_series() -> usize {
    20
}
fn default_granger_min_samples() -> usize {
    20
}

impl Default for GrangerConfig {
    fn default() -> Self {
        Self {
            max_lag: default_granger_max_lag(),
            p_threshold: default_granger_p_threshold(),
            strength_scale: default_granger_strength_scale(),
            max_series: default_granger_max_series(),
            min_samples: default_granger_min_samples(),
        }
    }
}

// ─── Causal graph ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CausalConfig {
    #[serde(default = "default_causal_graph_max_depth")]
    pub graph_max_depth: usize,
    #[serde(default = "default_causal_round_precision")]
    pub round_precision: u32,
}

fn default_causal_graph_max_depth() -> usize {
    5
}
fn default_causal_round_precision() -> u32 {
    4
}

impl Default for CausalConfig {
    fn default() -> Self {
        Self {
            graph_max_depth: default_causal_graph_max_depth(),
            round_precision: default_causal_round_precision(),
        }
    }
}

// ─── Bayesian ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct BayesianConfig {
    #[serde(default = "default_bayesian_default_feature_prob")]
    pub default_feature_prob: f64,
}

fn default_bayesian_default_feature_prob() -> f64 {
    0.5
}

impl Default for BayesianConfig {
    fn default() -> Self {
        Self {
            default_feature_prob: default_bayesian_default_feature_prob(),
        }
    }
}

// ─── ML (clustering + ranking) ──────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct MlConfig {
    #[serde(default = "default_cluster_eps")]
    pub cluster_eps: f64,
    #[serde(default = "default_cluster_min_samples")]
    pub cluster_min_samples: usize,
    #[serde(default = "default_rank_rule_weight")]
    pub rank_rule_weight: f64,
    #[serde(default = "default_rank_ml_weight")]
    pub rank_ml_weight: f64,
}

fn default_cluster_eps() -> f64 {
    0.1
}
fn default_cluster_min_samples() -> usize {
    2
}
fn default_rank_rule_weight() -> f64 {
    0.6
}
fn default_rank_ml_weight() -> f64 {
    0.4
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            cluster_eps: default_cluster_eps(),
            cluster_min_samples: default_cluster_min_samples(),
            rank_rule_weight: default_rank_rule_weight(),
            rank_ml_weight: default_rank_ml_weight(),
        }
    }
}

// ─── RCA ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RcaConfig {
    #[serde(default = "default_rca_weight_metrics")]
    pub weight_metrics: f64,
    #[serde(default = "default_rca_weight_logs")]
    pub weight_logs: f64,
    #[serde(default = "default_rca_weight_traces")]
    pub weight_traces: f64,
    #[serde(default = "default_rca_deploy_score_cutoff")]
    pub deploy_score_cutoff: f64,
    #[serde(default = "default_rca_deploy_window_seconds")]
    pub deploy_window_seconds: f64,
    #[serde(default = "default_rca_errorprop_max")]
    pub errorprop_max: f64,
    #[serde(default = "default_rca_min_confidence_display")]
    pub min_confidence_display: f64,
    #[serde(default = "default_rca_event_confidence_threshold")]
    pub event_confidence_threshold: f64,
    #[serde(default = "default_rca_score_cap")]
    pub score_cap: f64,
    #[serde(default = "default_rca_severity_weight_threshold")]
    pub severity_weight_threshold: u8,
    #[serde(default = "default_rca_log_pattern_score")]
    pub log_pattern_score: f64,
}

fn default_rca_weight_metrics() -> f64 {
    0.40
}
fn default_rca_weight_logs() -> f64 {
    0.25
}
fn default_rca_weight_traces() -> f64 {
    0.35
}
fn default_rca_deploy_score_cutoff() -> f64 {
    0.65
}
fn default_rca_deploy_window_seconds() -> f64 {
    300.0
}
fn default_rca_errorprop_max() -> f64 {
    0.95
}
fn default_rca_min_confidence_display() -> f64 {
    0.12
}
fn default_rca_event_confidence_threshold() -> f64 {
    0.3
}
fn default_rca_score_cap() -> f64 {
    0.99
}
fn default_rca_severity_weight_threshold() -> u8 {
    4
}
fn default_rca_log_pattern_score() -> f64 {
    0.4
}

impl Default for RcaConfig {
    fn default() -> Self {
        Self {
            weight_metrics: default_rca_weight_metrics(),
            weight_logs: default_rca_weight_logs(),
            weight_traces: default_rca_weight_traces(),
            deploy_score_cutoff: default_rca_deploy_score_cutoff(),
            deploy_window_seconds: default_rca_deploy_window_seconds(),
            errorprop_max: default_rca_errorprop_max(),
            min_confidence_display: default_rca_min_confidence_display(),
            event_confidence_threshold: default_rca_event_confidence_threshold(),
            score_cap: default_rca_score_cap(),
            severity_weight_threshold: default_rca_severity_weight_threshold(),
            log_pattern_score: default_rca_log_pattern_score(),
        }
    }
}

// ─── Quality gating ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct QualityConfig {
    #[serde(default = "default_gating_profile")]
    pub gating_profile: String,
    #[serde(default = "default_max_anomaly_density_per_metric_per_hour")]
    pub max_anomaly_density_per_metric_per_hour: f64,
    #[serde(default = "default_max_root_causes_without_multisignal")]
    pub max_root_causes_without_multisignal: usize,
    #[serde(default = "default_min_corroboration_signals")]
    pub min_corroboration_signals: usize,
}

fn default_gating_profile() -> String {
    "precision_strict_v1".to_string()
}
fn default_max_anomaly_density_per_metric_per_hour() -> f64 {
    0.75
}
fn default_max_root_causes_without_multisignal() -> usize {
    1
}
fn default_min_corroboration_signals() -> usize {
    2
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            gating_profile: default_gating_profile(),
            max_anomaly_density_per_metric_per_hour: default_max_anomaly_density_per_metric_per_hour(),
            max_root_causes_without_multisignal: default_max_root_causes_without_multisignal(),
            min_corroboration_signals: default_min_corroboration_signals(),
        }
    }
}

// ─── Forecast / degradation ─────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_forecast_horizon_seconds")]
    pub horizon_seconds: f64,
    #[serde(default = "default_forecast_min_samples")]
    pub min_samples: usize,
    #[serde(default = "default_degradation_ema_alpha")]
    pub degradation_ema_alpha: f64,
    #[serde(default = "default_forecast_min_window_seconds")]
    pub min_window_seconds: f64,
    #[serde(default = "default_degradation_min_window_seconds")]
    pub degradation_min_window_seconds: f64,
}

fn default_forecast_horizon_seconds() -> f64 {
    900.0
}
fn default_forecast_min_samples() -> usize {
    10
}
fn default_degradation_ema_alpha() -> f64 {
    0.3
}
fn default_forecast_min_window_seconds() -> f64 {
    600.0
}
fn default_degradation_min_window_seconds() -> f64 {
    600.0
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_seconds: default_forecast_horizon_seconds(),
            min_samples: default_forecast_min_samples(),
            degradation_ema_alpha: default_degradation_ema_alpha(),
            min_window_seconds: default_forecast_min_window_seconds(),
            degradation_min_window_seconds: default_degradation_min_window_seconds(),
        }
    }
}

// ─── SLO ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SloConfig {
    #[serde(default = "default_slo_burn_windows")]
    pub burn_windows_minutes: Vec<u32>,
    #[serde(default = "default_slo_default_target_availability")]
    pub default_target_availability: f64,
}

fn default_slo_burn_windows() -> Vec<u32> {
    vec![5, 60, 360, 4320]
}
fn default_slo_default_target_availability() -> f64 {
    0.999
}

impl Default for SloConfig {
    fn default() -> Self {
        Self {
            burn_windows_minutes: default_slo_burn_windows(),
            default_target_availability: default_slo_default_target_availability(),
        }
    }
}

// ─── Store ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_redis_urls")]
    pub redis_urls: Vec<String>,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_retry_cooldown_seconds")]
    pub redis_retry_cooldown_seconds: f64,
    #[serde(default = "default_fallback_max_items")]
    pub fallback_max_items: usize,
    #[serde(default = "default_events_max_items")]
    pub events_max_items: usize,
    #[serde(default = "default_registry_alpha")]
    pub registry_alpha: f64,
}

fn default_redis_urls() -> Vec<String> {
    vec!["redis://localhost:6379".to_string()]
}
fn default_ttl_secs() -> u64 {
    3600
}
fn default_retry_cooldown_seconds() -> f64 {
    10.0
}
fn default_fallback_max_items() -> usize {
    10_000
}
fn default_events_max_items() -> usize {
    500
}
fn default_registry_alpha() -> f64 {
    0.2
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_urls: default_redis_urls(),
            ttl_secs: default_ttl_secs(),
            redis_retry_cooldown_seconds: default_retry_cooldown_seconds(),
            fallback_max_items: default_fallback_max_items(),
            events_max_items: default_events_max_items(),
            registry_alpha: default_registry_alpha(),
        }
    }
}

// ─── Analyzer runtime (timeouts, concurrency, output caps) ──────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_max_parallel_metric_queries")]
    pub max_parallel_metric_queries: usize,
    #[serde(default = "default_stage_timeout_ms")]
    pub stage_timeout_ms: u64,
    #[serde(default = "default_max_metric_anomalies")]
    pub max_metric_anomalies: usize,
    #[serde(default = "default_max_root_causes")]
    pub max_root_causes: usize,
    #[serde(default = "default_max_change_points")]
    pub max_change_points: usize,
    #[serde(default = "default_max_clusters")]
    pub max_clusters: usize,
    #[serde(default = "default_max_granger_pairs")]
    pub max_granger_pairs: usize,
}

fn default_max_parallel_metric_queries() -> usize {
    8
}
fn default_stage_timeout_ms() -> u64 {
    30_000
}
fn default_max_metric_anomalies() -> usize {
    180
}
fn default_max_root_causes() -> usize {
    20
}
fn default_max_change_points() -> usize {
    120
}
fn default_max_clusters() -> usize {
    40
}
fn default_max_granger_pairs() -> usize {
    60
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_parallel_metric_queries: default_max_parallel_metric_queries(),
            stage_timeout_ms: default_stage_timeout_ms(),
            max_metric_anomalies: default_max_metric_anomalies(),
            max_root_causes: default_max_root_causes(),
            max_change_points: default_max_change_points(),
            max_clusters: default_max_clusters(),
            max_granger_pairs: default_max_granger_pairs(),
        }
    }
}
