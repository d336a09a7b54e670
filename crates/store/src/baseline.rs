//! Persistence for per-tenant, per-metric `Baseline` rows.

use crate::client::TieredStore;
use crate::keys::baseline_key;
use causeway_core::config::StoreConfig;
use causeway_core::types::Baseline;

pub struct BaselineStore {
    inner: TieredStore<Baseline>,
}

impl BaselineStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            inner: TieredStore::new(config, config.fallback_max_items),
        }
    }

    pub async fn load(&self, tenant_id: &str, metric_name: &str) -> Option<Baseline> {
        self.inner.get(&baseline_key(tenant_id, metric_name)).await
    }

    pub async fn save(&self, tenant_id: &str, metric_name: &str, baseline: &Baseline) {
        self.inner
            .set(&baseline_key(tenant_id, metric_name), baseline)
            .await;
    }
}
