//! Log↔metric linker (§4.4): pairs a metric anomaly with a preceding log
//! burst within the configured max lag, strength decaying linearly with lag.

use causeway_core::config::CorrelationConfig;
use causeway_core::types::{LogBurst, LogMetricLink, MetricAnomaly};

pub fn link(anomalies: &[MetricAnomaly], bursts: &[LogBurst], cfg: &CorrelationConfig) -> Vec<LogMetricLink> {
    let mut links = Vec::new();
    for anomaly in anomalies {
        for burst in bursts {
            let lag = anomaly.timestamp - burst.window_start;
            if lag >= 0.0 && lag <= cfg.max_lag_seconds {
                links.push(LogMetricLink {
                    metric_name: anomaly.metric_name.clone(),
                    log_window_start: burst.window_start,
                    lag_seconds: lag,
                    strength: 1.0 - lag / cfg.max_lag_seconds,
                });
            }
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use causeway_core::types::{ChangeType, Severity};

    #[test]
    fn lag_within_window_is_linked() {
        let anomalies = vec![MetricAnomaly {
            metric_name: "errors".to_string(),
            timestamp: 1020.0,
            value: 1.0,
            change_type: ChangeType::Spike,
            z_score: 4.0,
            mad_score: 4.0,
            isolation_score: 0.5,
            expected_range: (0.0, 1.0),
            severity: Severity::High,
            description: String::new(),
        }];
        let bursts = vec![LogBurst {
            window_start: 1000.0,
            window_end: 1010.0,
            rate_per_second: 20.0,
            baseline_rate: 2.0,
            ratio: 10.0,
            severity: Severity::High,
        }];
        let links = link(&anomalies, &bursts, &CorrelationConfig::default());
        assert_eq!(links.len(), 1);
        assert!(links[0].strength > 0.0 && links[0].strength < 1.0);
    }
}
