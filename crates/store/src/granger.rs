//! Persistence for Granger causality results, merged across runs keeping
//! the higher-strength edge for any given metric pair (mirrors the
//! reference `store/granger.py::save_and_merge`).

use crate::client::TieredStore;
use crate::keys::{granger_key, pair_key};
use causeway_core::config::StoreConfig;
use causeway_core::types::GrangerResult;

pub struct GrangerStore {
    inner: TieredStore<GrangerResult>,
}

impl GrangerStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            inner: TieredStore::new(config, config.fallback_max_items),
        }
    }

    pub async fn load(
        &self,
        tenant_id: &str,
        cause_metric: &str,
        effect_metric: &str,
    ) -> Option<GrangerResult> {
        self.inner
            .get(&granger_key(tenant_id, cause_metric, effect_metric))
            .await
    }

    pub async fn save_and_merge(&self, tenant_id: &str, result: GrangerResult) -> GrangerResult {
        let key = granger_key(tenant_id, &result.cause_metric, &result.effect_metric);
        let merged = match self.inner.get(&key).await {
            Some(existing) if existing.strength >= result.strength => existing,
            _ => result,
        };
        self.inner.set(&key, &merged).await;
        merged
    }

    /// Load the strongest known relation for every pair among `metric_names`.
    pub async fn load_all(
        &self,
        tenant_id: &str,
        metric_names: &[String],
    ) -> Vec<GrangerResult> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for a in metric_names {
            for b in metric_names {
                if a == b {
                    continue;
                }
                let pk = pair_key(a, b);
                if !seen.insert(pk) {
                    continue;
                }
                if let Some(result) = self.load(tenant_id, a, b).await {
                    out.push(result);
                }
            }
        }
        out
    }
}
