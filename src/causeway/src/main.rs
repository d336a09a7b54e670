//! Causeway — multi-tenant root cause analysis engine.
//!
//! Demo entry point: loads configuration, runs one `Analyze` call against a
//! fixture or file-backed data source, and prints the resulting report as
//! JSON. This is a harness for exercising the pipeline end to end, not the
//! HTTP surface such an engine would have in production.

mod fixture;

use causeway_analyzer::Analyzer;
use causeway_core::config::AnalyzerConfig;
use causeway_core::types::AnalyzeRequest;
use clap::Parser;
use fixture::{Fixture, FixtureProvider};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "causeway")]
#[command(about = "Multi-tenant root cause analysis engine")]
#[command(version)]
struct Cli {
    /// Tenant identifier (overrides config)
    #[arg(long, env = "CAUSEWAY__TENANT_ID", default_value = "demo")]
    tenant_id: String,

    /// Analysis window length in seconds, ending now
    #[arg(long, default_value_t = 1800)]
    window_seconds: u64,

    /// Comma-separated service names to scope the analysis to
    #[arg(long, value_delimiter = ',', default_value = "checkout")]
    services: Vec<String>,

    /// Path to a JSON fixture file (see fixture::Fixture); uses a built-in
    /// spike scenario when omitted
    #[arg(long)]
    fixture: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "causeway=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("causeway starting up");

    let config = AnalyzerConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        AnalyzerConfig::default()
    });

    let end = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    let start = end - cli.window_seconds as f64;

    let fixture = match &cli.fixture {
        Some(path) => Fixture::load(path)?,
        None => Fixture::builtin_spike(start, end),
    };
    let provider = Arc::new(FixtureProvider::new(fixture));
    let analyzer = Analyzer::new(provider, config);

    let request = AnalyzeRequest {
        tenant_id: cli.tenant_id,
        start,
        end,
        step: "15s".to_string(),
        services: cli.services,
        log_query: None,
        metric_queries: vec![],
        sensitivity: None,
        apdex_threshold_ms: 500.0,
        slo_target: None,
        correlation_window_seconds: None,
        forecast_horizon_seconds: None,
    };

    info!(tenant_id = %request.tenant_id, start, end, "running analysis");
    let report = analyzer.analyze(&request).await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    info!(
        root_causes = report.ranked_causes.len(),
        severity = ?report.overall_severity,
        "causeway analysis complete"
    );
    Ok(())
}
