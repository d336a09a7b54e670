//! Persistence for adaptive per-tenant signal weights
//! (`causeway_core::types::TenantSignalWeights`).

use crate::client::TieredStore;
use crate::keys::weights_key;
use causeway_core::config::StoreConfig;
use causeway_core::types::TenantSignalWeights;

pub struct WeightsStore {
    inner: TieredStore<TenantSignalWeights>,
}

impl WeightsStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            inner: TieredStore::new(config, config.fallback_max_items),
        }
    }

    pub async fn load(&self, tenant_id: &str) -> Option<TenantSignalWeights> {
        self.inner.get(&weights_key(tenant_id)).await
    }

    pub async fn save(&self, tenant_id: &str, weights: &TenantSignalWeights) {
        self.inner.set(&weights_key(tenant_id), weights).await;
    }

    pub async fn delete(&self, tenant_id: &str) {
        self.inner.delete(&weights_key(tenant_id)).await;
    }
}
