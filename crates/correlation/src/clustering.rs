//! Anomaly clustering over normalized [timestamp, value] features. No
//! DBSCAN crate is available in this stack; a minimal epsilon-neighborhood
//! DBSCAN is hand-rolled here (anomaly counts are capped well below a size
//! where O(n^2) neighbor search matters). Falls back to a single cluster
//! when fewer than `min_samples` points are present, matching the
//! reference implementation's `ImportError` fallback behavior.

use causeway_core::types::{AnomalyCluster, MetricAnomaly};

fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let lo = values.iter().cloned().fold(f64::MAX, f64::min);
    let hi = values.iter().cloned().fold(f64::MIN, f64::max);
    let range = (hi - lo).max(1e-9);
    values.iter().map(|v| (v - lo) / range).collect()
}

pub fn cluster(anomalies: &[MetricAnomaly], eps: f64, min_samples: usize) -> Vec<AnomalyCluster> {
    if anomalies.is_empty() {
        return Vec::new();
    }
    if anomalies.len() < min_samples {
        return vec![fallback_cluster(anomalies)];
    }

    let ts_norm = min_max_normalize(&anomalies.iter().map(|a| a.timestamp).collect::<Vec<_>>());
    let val_norm = min_max_normalize(&anomalies.iter().map(|a| a.value).collect::<Vec<_>>());
    let n = anomalies.len();

    let mut labels = vec![None; n]; // None = unvisited, Some(-1) = noise, Some(k) = cluster k
    let mut next_cluster = 0i64;

    let dist = |i: usize, j: usize| -> f64 {
        ((ts_norm[i] - ts_norm[j]).powi(2) + (val_norm[i] - val_norm[j]).powi(2)).sqrt()
    };

    let neighbors = |i: usize| -> Vec<usize> {
        (0..n).filter(|&j| j != i && dist(i, j) <= eps).collect()
    };

    for i in 0..n {
        if labels[i].is_some() {
            continue;
        }
        let neigh = neighbors(i);
        if neigh.len() + 1 < min_samples {
            labels[i] = Some(-1);
            continue;
        }
        labels[i] = Some(next_cluster);
        let mut seeds = neigh;
        let mut idx = 0;
        while idx < seeds.len() {
            let q = seeds[idx];
            if labels[q] == Some(-1) {
                labels[q] = Some(next_cluster);
            }
            if labels[q].is_none() {
                labels[q] = Some(next_cluster);
                let q_neigh = neighbors(q);
                if q_neigh.len() + 1 >= min_samples {
                    for nb in q_neigh {
                        if !seeds.contains(&nb) {
                            seeds.push(nb);
                        }
                    }
                }
            }
            idx += 1;
        }
        next_cluster += 1;
    }

    build_clusters(anomalies, &labels)
}

fn fallback_cluster(anomalies: &[MetricAnomaly]) -> AnomalyCluster {
    let centroid_timestamp = anomalies.iter().map(|a| a.timestamp).sum::<f64>() / anomalies.len() as f64;
    let centroid_value = anomalies.iter().map(|a| a.value).sum::<f64>() / anomalies.len() as f64;
    let mut metric_names: Vec<String> = anomalies.iter().map(|a| a.metric_name.clone()).collect();
    metric_names.sort();
    metric_names.dedup();
    AnomalyCluster {
        cluster_id: 0,
        members: anomalies.to_vec(),
        centroid_timestamp,
        centroid_value,
        metric_names,
        size: anomalies.len(),
        is_noise: false,
    }
}

fn build_clusters(anomalies: &[MetricAnomaly], labels: &[Option<i64>]) -> Vec<AnomalyCluster> {
    use std::collections::BTreeMap;
    let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        groups.entry(label.unwrap_or(-1)).or_default().push(i);
    }

    let mut out = Vec::new();
    for (cluster_id, indices) in groups {
        let members: Vec<MetricAnomaly> = indices.iter().map(|&i| anomalies[i].clone()).collect();
        let centroid_timestamp = members.iter().map(|a| a.timestamp).sum::<f64>() / members.len() as f64;
        let centroid_value = members.iter().map(|a| a.value).sum::<f64>() / members.len() as f64;
        let mut metric_names: Vec<String> = members.iter().map(|a| a.metric_name.clone()).collect();
        metric_names.sort();
        metric_names.dedup();
        out.push(AnomalyCluster {
            cluster_id,
            size: members.len(),
            is_noise: cluster_id == -1,
            members,
            centroid_timestamp,
            centroid_value,
            metric_names,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use causeway_core::types::{ChangeType, Severity};

    fn anomaly(name: &str, ts: f64, value: f64) -> MetricAnomaly {
        MetricAnomaly {
            metric_name: name.to_string(),
            timestamp: ts,
            value,
            change_type: ChangeType::Spike,
            z_score: 5.0,
            mad_score: 5.0,
            isolation_score: 0.5,
            expected_range: (0.0, 1.0),
            severity: Severity::High,
            description: String::new(),
        }
    }

    #[test]
    fn small_input_falls_back_to_single_cluster() {
        let anomalies = vec![anomaly("cpu", 0.0, 1.0)];
        let clusters = cluster(&anomalies, 0.1, 2);
        assert_eq!(clusters.len(), 1);
        assert!(!clusters[0].is_noise);
    }

    #[test]
    fn tight_group_forms_one_cluster() {
        let anomalies: Vec<MetricAnomaly> = (0..5)
            .map(|i| anomaly("cpu", i as f64, 10.0 + i as f64 * 0.01))
            .collect();
        let clusters = cluster(&anomalies, 0.5, 2);
        assert!(clusters.iter().any(|c| c.size >= 3));
    }
}
