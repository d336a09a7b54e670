//! Bayesian posterior scoring over RCA categories (§4.5): each category's
//! unnormalized posterior is its prior times the product, over every
//! observed feature, of the feature's likelihood under that category (or
//! its complement when the feature is absent).

use causeway_core::config::BayesianConfig;
use causeway_core::types::{BayesianScore, RcaCategory};
use std::collections::HashMap;

pub struct CategoryModel {
    pub category: RcaCategory,
    pub prior: f64,
    pub likelihoods: HashMap<String, f64>,
}

pub fn score(models: &[CategoryModel], evidence: &HashMap<String, bool>, cfg: &BayesianConfig) -> Vec<BayesianScore> {
    let mut feature_names: Vec<&String> = models.iter().flat_map(|m| m.likelihoods.keys()).collect();
    feature_names.sort();
    feature_names.dedup();

    let mut raw: Vec<(RcaCategory, f64)> = Vec::with_capacity(models.len());
    for model in models {
        let mut posterior = model.prior;
        for feature in &feature_names {
            let likelihood = model.likelihoods.get(*feature).copied().unwrap_or(cfg.default_feature_prob);
            let observed = evidence.get(*feature).copied().unwrap_or(false);
            posterior *= if observed { likelihood } else { 1.0 - likelihood };
        }
        raw.push((model.category, posterior));
    }

    let total: f64 = raw.iter().map(|(_, p)| p).sum();
    let mut scores: Vec<BayesianScore> = if total > 0.0 {
        raw.into_iter()
            .map(|(category, posterior)| BayesianScore {
                category,
                posterior: posterior / total,
            })
            .collect()
    } else {
        let uniform = 1.0 / raw.len().max(1) as f64;
        raw.into_iter()
            .map(|(category, _)| BayesianScore { category, posterior: uniform })
            .collect()
    };

    scores.sort_by(|a, b| b.posterior.partial_cmp(&a.posterior).unwrap());
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(category: RcaCategory, prior: f64, pairs: &[(&str, f64)]) -> CategoryModel {
        CategoryModel {
            category,
            prior,
            likelihoods: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn posteriors_sum_to_one() {
        let models = vec![
            model(RcaCategory::Deployment, 0.5, &[("deploy_recent", 0.9)]),
            model(RcaCategory::ResourceExhaustion, 0.5, &[("deploy_recent", 0.1)]),
        ];
        let mut evidence = HashMap::new();
        evidence.insert("deploy_recent".to_string(), true);
        let scores = score(&models, &evidence, &BayesianConfig::default());
        let total: f64 = scores.iter().map(|s| s.posterior).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(scores[0].category, RcaCategory::Deployment);
    }

    #[test]
    fn missing_feature_uses_default_probability() {
        let models = vec![
            model(RcaCategory::Deployment, 0.5, &[]),
            model(RcaCategory::Unknown, 0.5, &[]),
        ];
        let evidence = HashMap::new();
        let scores = score(&models, &evidence, &BayesianConfig::default());
        assert!((scores[0].posterior - scores[1].posterior).abs() < 1e-9);
    }
}
