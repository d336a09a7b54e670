//! Fixed category priors/likelihoods for the Bayesian posterior pass
//! (§4.5), recovered verbatim from the reference implementation's
//! `engine/causal/bayesian.py` `_PRIORS`/`_LIKELIHOODS` tables.

use causeway_causal::bayesian::CategoryModel;
use causeway_core::types::RcaCategory;
use std::collections::HashMap;

const HAS_DEPLOYMENT_EVENT: &str = "has_deployment_event";
const HAS_METRIC_SPIKE: &str = "has_metric_spike";
const HAS_LOG_BURST: &str = "has_log_burst";
const HAS_LATENCY_SPIKE: &str = "has_latency_spike";
const HAS_ERROR_PROPAGATION: &str = "has_error_propagation";

fn likelihoods(deploy: f64, metric: f64, log: f64, latency: f64, error: f64) -> HashMap<String, f64> {
    let mut m = HashMap::new();
    m.insert(HAS_DEPLOYMENT_EVENT.to_string(), deploy);
    m.insert(HAS_METRIC_SPIKE.to_string(), metric);
    m.insert(HAS_LOG_BURST.to_string(), log);
    m.insert(HAS_LATENCY_SPIKE.to_string(), latency);
    m.insert(HAS_ERROR_PROPAGATION.to_string(), error);
    m
}

pub fn models() -> Vec<CategoryModel> {
    vec![
        CategoryModel {
            category: RcaCategory::Deployment,
            prior: 0.35,
            likelihoods: likelihoods(0.95, 0.70, 0.60, 0.50, 0.40),
        },
        CategoryModel {
            category: RcaCategory::ResourceExhaustion,
            prior: 0.20,
            likelihoods: likelihoods(0.15, 0.90, 0.50, 0.70, 0.30),
        },
        CategoryModel {
            category: RcaCategory::DependencyFailure,
            prior: 0.20,
            likelihoods: likelihoods(0.10, 0.50, 0.70, 0.95, 0.80),
        },
        CategoryModel {
            category: RcaCategory::TrafficSurge,
            prior: 0.10,
            likelihoods: likelihoods(0.05, 0.95, 0.60, 0.60, 0.20),
        },
        CategoryModel {
            category: RcaCategory::ErrorPropagation,
            prior: 0.10,
            likelihoods: likelihoods(0.10, 0.60, 0.80, 0.85, 0.99),
        },
        CategoryModel {
            category: RcaCategory::SloBurn,
            prior: 0.03,
            likelihoods: likelihoods(0.20, 0.80, 0.50, 0.60, 0.50),
        },
        CategoryModel {
            category: RcaCategory::Unknown,
            prior: 0.02,
            likelihoods: likelihoods(0.05, 0.30, 0.30, 0.30, 0.10),
        },
    ]
}

/// Binary evidence flags the orchestrator derives from a correlated event
/// and its surrounding context before calling `causeway_causal::bayesian::score`.
pub struct Evidence {
    pub has_deployment_event: bool,
    pub has_metric_spike: bool,
    pub has_log_burst: bool,
    pub has_latency_spike: bool,
    pub has_error_propagation: bool,
}

impl Evidence {
    pub fn into_map(self) -> HashMap<String, bool> {
        let mut m = HashMap::new();
        m.insert(HAS_DEPLOYMENT_EVENT.to_string(), self.has_deployment_event);
        m.insert(HAS_METRIC_SPIKE.to_string(), self.has_metric_spike);
        m.insert(HAS_LOG_BURST.to_string(), self.has_log_burst);
        m.insert(HAS_LATENCY_SPIKE.to_string(), self.has_latency_spike);
        m.insert(HAS_ERROR_PROPAGATION.to_string(), self.has_error_propagation);
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priors_sum_close_to_one() {
        let total: f64 = models().iter().map(|m| m.prior).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn every_model_carries_all_five_features() {
        for model in models() {
            assert_eq!(model.likelihoods.len(), 5);
        }
    }
}
