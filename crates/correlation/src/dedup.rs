//! Deduplication keyed on emission identity (§4.1 stage 5), resolved
//! deterministically regardless of input order so repeated runs over the
//! same multiset converge to the same output.

use causeway_core::types::{ChangePoint, DegradationSignal, MetricAnomaly, TrajectoryForecast};
use std::collections::HashMap;

pub fn dedup_metric_anomalies(mut anomalies: Vec<MetricAnomaly>) -> Vec<MetricAnomaly> {
    anomalies.sort_by(|a, b| {
        a.metric_name
            .cmp(&b.metric_name)
            .then(a.timestamp.round().partial_cmp(&b.timestamp.round()).unwrap())
            .then_with(|| format!("{:?}", a.change_type).cmp(&format!("{:?}", b.change_type)))
    });

    let mut best: HashMap<(String, i64, String), MetricAnomaly> = HashMap::new();
    for a in anomalies {
        let key = (a.metric_name.clone(), a.timestamp.round() as i64, format!("{:?}", a.change_type));
        best.entry(key)
            .and_modify(|existing| {
                if a.severity > existing.severity
                    || (a.severity == existing.severity && a.z_score.abs() > existing.z_score.abs())
                {
                    *existing = a.clone();
                }
            })
            .or_insert(a);
    }
    let mut out: Vec<MetricAnomaly> = best.into_values().collect();
    out.sort_by(|a, b| a.timestamp.partial_cmp(&b.timestamp).unwrap());
    out
}

pub fn dedup_change_points(points: Vec<ChangePoint>) -> Vec<ChangePoint> {
    let mut best: HashMap<(String, i64, String), ChangePoint> = HashMap::new();
    for p in points {
        let key = (p.metric_name.clone(), p.timestamp.round() as i64, format!("{:?}", p.change_type));
        best.entry(key)
            .and_modify(|existing| {
                if p.magnitude > existing.magnitude {
                    *existing = p.clone();
                }
            })
            .or_insert(p);
    }
    let mut out: Vec<ChangePoint> = best.into_values().collect();
    out.sort_by(|a, b| a.timestamp.partial_cmp(&b.timestamp).unwrap());
    out
}

pub fn dedup_forecasts(forecasts: Vec<TrajectoryForecast>) -> Vec<TrajectoryForecast> {
    let mut best: HashMap<String, TrajectoryForecast> = HashMap::new();
    for f in forecasts {
        best.entry(f.metric_name.clone())
            .and_modify(|existing| {
                if f.severity > existing.severity {
                    *existing = f.clone();
                }
            })
            .or_insert(f);
    }
    let mut out: Vec<TrajectoryForecast> = best.into_values().collect();
    out.sort_by(|a, b| a.metric_name.cmp(&b.metric_name));
    out
}

pub fn dedup_degradations(signals: Vec<DegradationSignal>) -> Vec<DegradationSignal> {
    let mut best: HashMap<String, DegradationSignal> = HashMap::new();
    for s in signals {
        best.entry(s.metric_name.clone())
            .and_modify(|existing| {
                if s.rate.abs() > existing.rate.abs() {
                    *existing = s.clone();
                }
            })
            .or_insert(s);
    }
    let mut out: Vec<DegradationSignal> = best.into_values().collect();
    out.sort_by(|a, b| a.metric_name.cmp(&b.metric_name));
    out
}

/// Run-compressed grouping of same-metric anomalies within `time_window`
/// seconds of one another, keeping the highest-severity representative —
/// mirrors the reference `group_metric_anomalies` grouping used for the
/// human-readable summary's "N metric anomaly group(s)" count.
pub fn group_metric_anomalies(anomalies: &[MetricAnomaly], time_window: f64) -> Vec<MetricAnomaly> {
    if anomalies.is_empty() {
        return Vec::new();
    }
    let mut sorted = anomalies.to_vec();
    sorted.sort_by(|a, b| a.timestamp.partial_cmp(&b.timestamp).unwrap());

    let mut groups: Vec<Vec<MetricAnomaly>> = Vec::new();
    let mut current = vec![sorted[0].clone()];
    for a in sorted.into_iter().skip(1) {
        let last = current.last().unwrap();
        if a.metric_name == last.metric_name && a.timestamp - last.timestamp <= time_window {
            current.push(a);
        } else {
            groups.push(std::mem::take(&mut current));
            current.push(a);
        }
    }
    groups.push(current);

    groups
        .into_iter()
        .map(|group| {
            group
                .into_iter()
                .max_by(|a, b| a.severity.cmp(&b.severity))
                .expect("non-empty group")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use causeway_core::types::{ChangeType, Severity};

    fn anomaly(ts: f64, severity: Severity) -> MetricAnomaly {
        MetricAnomaly {
            metric_name: "cpu".to_string(),
            timestamp: ts,
            value: 1.0,
            change_type: ChangeType::Spike,
            z_score: 5.0,
            mad_score: 5.0,
            isolation_score: 0.5,
            expected_range: (0.0, 1.0),
            severity,
            description: String::new(),
        }
    }

    #[test]
    fn dedup_keeps_higher_severity() {
        let anomalies = vec![anomaly(10.4, Severity::Medium), anomaly(10.2, Severity::High)];
        let out = dedup_metric_anomalies(anomalies);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].severity, Severity::High);
    }

    #[test]
    fn grouping_collapses_a_close_run() {
        let anomalies = vec![anomaly(0.0, Severity::Low), anomaly(5.0, Severity::High), anomaly(10.0, Severity::Medium)];
        let groups = group_metric_anomalies(&anomalies, 120.0);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].severity, Severity::High);
    }
}
