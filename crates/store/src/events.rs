//! Persistence for per-tenant deployment event logs, capped so a noisy
//! deployer can't grow a tenant's event log without bound (addition beyond
//! the uncapped reference `append`).

use crate::client::TieredStore;
use crate::keys::events_key;
use causeway_core::config::StoreConfig;
use causeway_core::types::DeploymentEvent;

pub struct EventsStore {
    inner: TieredStore<Vec<DeploymentEvent>>,
    max_items: usize,
}

impl EventsStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            inner: TieredStore::new(config, config.fallback_max_items),
            max_items: config.events_max_items,
        }
    }

    pub async fn load(&self, tenant_id: &str) -> Vec<DeploymentEvent> {
        self.inner.get(&events_key(tenant_id)).await.unwrap_or_default()
    }

    pub async fn append(&self, tenant_id: &str, event: DeploymentEvent) {
        let mut events = self.load(tenant_id).await;
        events.push(event);
        events.sort_by(|a, b| a.timestamp.partial_cmp(&b.timestamp).unwrap_or(std::cmp::Ordering::Equal));
        if events.len() > self.max_items {
            let overflow = events.len() - self.max_items;
            events.drain(0..overflow);
        }
        self.inner.set(&events_key(tenant_id), &events).await;
    }

    pub async fn clear(&self, tenant_id: &str) {
        self.inner.delete(&events_key(tenant_id)).await;
    }

    pub async fn in_window(&self, tenant_id: &str, start: f64, end: f64) -> Vec<DeploymentEvent> {
        self.load(tenant_id)
            .await
            .into_iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .collect()
    }
}
