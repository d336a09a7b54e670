//! Temporal correlation (§4.4): anchored windows built from the union of
//! metric-anomaly timestamps and log-burst start times, collecting every
//! finding whose window overlaps and whose service matches.

use causeway_core::config::CorrelationConfig;
use causeway_core::types::{CorrelatedEvent, LogBurst, MetricAnomaly, ServiceLatency};

fn services_of_anomaly(a: &MetricAnomaly) -> Vec<String> {
    a.metric_name
        .split(['_', '.', ':'])
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

fn overlaps(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> bool {
    a_start <= b_end && b_start <= a_end
}

pub fn correlate(
    metric_anomalies: &[MetricAnomaly],
    log_bursts: &[LogBurst],
    service_latency: &[ServiceLatency],
    cfg: &CorrelationConfig,
) -> Vec<CorrelatedEvent> {
    let w = cfg.window_seconds;

    let mut anchors: Vec<f64> = metric_anomalies
        .iter()
        .map(|a| a.timestamp)
        .chain(log_bursts.iter().map(|b| b.window_start))
        .filter(|t| t.is_finite())
        .collect();
    anchors.sort_by(|a, b| a.partial_cmp(b).unwrap());
    anchors.dedup();

    let mut used_ma = vec![false; metric_anomalies.len()];
    let mut used_lb = vec![false; log_bursts.len()];
    let mut events = Vec::new();

    for &t in &anchors {
        let window_start = t - w;
        let window_end = t + w;

        let mut ma_in_window = Vec::new();
        for (i, a) in metric_anomalies.iter().enumerate() {
            if !used_ma[i] && a.timestamp >= window_start && a.timestamp <= window_end {
                ma_in_window.push(a.clone());
                used_ma[i] = true;
            }
        }

        let mut lb_in_window = Vec::new();
        for (i, b) in log_bursts.iter().enumerate() {
            if !used_lb[i] && overlaps(b.window_start, b.window_end, window_start, window_end) {
                lb_in_window.push(b.clone());
                used_lb[i] = true;
            }
        }

        let relevant_services: Vec<String> = ma_in_window
            .iter()
            .flat_map(services_of_anomaly)
            .collect();

        let sl_in_window: Vec<ServiceLatency> = service_latency
            .iter()
            .filter(|s| {
                let within_window = match (s.window_start, s.window_end) {
                    (Some(ws), Some(we)) => overlaps(ws, we, window_start, window_end),
                    _ => true,
                };
                within_window
                    && (relevant_services.is_empty()
                        || relevant_services.iter().any(|svc| s.service.to_lowercase().contains(svc)))
            })
            .cloned()
            .collect();

        let signal_count = ma_in_window.len() + lb_in_window.len() + sl_in_window.len();
        if signal_count < 2 {
            continue;
        }

        let confidence = (cfg.weight_time * ma_in_window.len() as f64
            + cfg.weight_latency * lb_in_window.len() as f64
            + (cfg.weight_errors * sl_in_window.len() as f64).min(cfg.errors_cap))
        .min(1.0);

        events.push(CorrelatedEvent {
            window_start,
            window_end,
            metric_anomalies: ma_in_window,
            log_bursts: lb_in_window,
            service_latency: sl_in_window,
            signal_count,
            confidence,
        });
    }

    events.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use causeway_core::types::{ChangeType, Severity};

    fn anomaly(name: &str, ts: f64) -> MetricAnomaly {
        MetricAnomaly {
            metric_name: name.to_string(),
            timestamp: ts,
            value: 1.0,
            change_type: ChangeType::Spike,
            z_score: 5.0,
            mad_score: 5.0,
            isolation_score: 0.8,
            expected_range: (0.0, 1.0),
            severity: Severity::High,
            description: String::new(),
        }
    }

    #[test]
    fn requires_at_least_two_signals() {
        let anomalies = vec![anomaly("payments_cpu", 1000.0)];
        let events = correlate(&anomalies, &[], &[], &CorrelationConfig::default());
        assert!(events.is_empty());
    }

    #[test]
    fn merges_anomaly_and_burst_into_one_event() {
        let anomalies = vec![anomaly("payments_cpu", 1010.0)];
        let bursts = vec![LogBurst {
            window_start: 1005.0,
            window_end: 1015.0,
            rate_per_second: 50.0,
            baseline_rate: 5.0,
            ratio: 10.0,
            severity: Severity::High,
        }];
        let events = correlate(&anomalies, &bursts, &[], &CorrelationConfig::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].signal_count, 2);
    }
}
