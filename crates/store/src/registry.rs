//! In-memory tenant state: adaptive online signal weights, updated by an
//! exponential reward signal as each analysis run's root causes are
//! confirmed or rejected downstream. Mirrors `store/registry.py`'s
//! `TenantState`/`TenantRegistry`, persisted asynchronously through
//! `WeightsStore` rather than written back on every update.

use crate::weights::WeightsStore;
use causeway_core::types::{Signal, TenantSignalWeights};
use dashmap::DashMap;
use std::collections::HashMap;

const FALLBACK_METRICS_WEIGHT: f64 = 0.30;
const FALLBACK_LOGS_WEIGHT: f64 = 0.35;
const FALLBACK_TRACES_WEIGHT: f64 = 0.35;

#[derive(Debug, Clone)]
pub struct TenantState {
    weights: HashMap<Signal, f64>,
    update_count: u64,
    alpha: f64,
}

impl TenantState {
    pub fn new(alpha: f64) -> Self {
        Self {
            weights: HashMap::new(),
            update_count: 0,
            alpha,
        }
    }

    fn from_persisted(persisted: TenantSignalWeights, alpha: f64) -> Self {
        Self {
            weights: persisted.weights,
            update_count: persisted.update_count,
            alpha,
        }
    }

    /// Exponential-reward update: `w = (1-alpha)*w + alpha*reward`, then
    /// renormalize across every signal seen so far so weights sum to 1.
    pub fn update_weight(&mut self, signal: Signal, reward: f64) {
        let reward = reward.clamp(0.0, 1.0);
        let current = *self.weights.get(&signal).unwrap_or(&fallback_weight(signal));
        let updated = (1.0 - self.alpha) * current + self.alpha * reward;
        self.weights.insert(signal, updated);
        self.update_count += 1;
        self.normalize();
    }

    fn normalize(&mut self) {
        let total: f64 = self.weights.values().sum();
        if total <= 0.0 {
            return;
        }
        for value in self.weights.values_mut() {
            *value /= total;
        }
    }

    pub fn weighted_confidence(&self, per_signal: &HashMap<Signal, f64>) -> f64 {
        let mut total = 0.0;
        let mut weight_sum = 0.0;
        for (signal, confidence) in per_signal {
            let weight = *self.weights.get(signal).unwrap_or(&fallback_weight(*signal));
            total += weight * confidence;
            weight_sum += weight;
        }
        if weight_sum <= 0.0 {
            return 0.0;
        }
        total / weight_sum
    }

    pub fn reset(&mut self) {
        self.weights.clear();
        self.update_count = 0;
    }

    pub fn to_persisted(&self) -> TenantSignalWeights {
        TenantSignalWeights {
            weights: self.weights.clone(),
            update_count: self.update_count,
        }
    }
}

fn fallback_weight(signal: Signal) -> f64 {
    match signal {
        Signal::Metrics => FALLBACK_METRICS_WEIGHT,
        Signal::Logs => FALLBACK_LOGS_WEIGHT,
        Signal::Traces => FALLBACK_TRACES_WEIGHT,
        Signal::Events => 0.0,
    }
}

pub struct TenantRegistry {
    states: DashMap<String, TenantState>,
    weights_store: WeightsStore,
    alpha: f64,
}

impl TenantRegistry {
    pub fn new(weights_store: WeightsStore, alpha: f64) -> Self {
        Self {
            states: DashMap::new(),
            weights_store,
            alpha,
        }
    }

    /// Returns a snapshot of the tenant's current weighted state, loading
    /// from the backing store on first access for this process.
    pub async fn get_state(&self, tenant_id: &str) -> TenantState {
        if let Some(state) = self.states.get(tenant_id) {
            return state.clone();
        }
        let state = match self.weights_store.load(tenant_id).await {
            Some(persisted) => TenantState::from_persisted(persisted, self.alpha),
            None => TenantState::new(self.alpha),
        };
        self.states.insert(tenant_id.to_string(), state.clone());
        state
    }

    pub async fn update_weight(&self, tenant_id: &str, signal: Signal, reward: f64) {
        let mut state = self.get_state(tenant_id).await;
        state.update_weight(signal, reward);
        let persisted = state.to_persisted();
        self.states.insert(tenant_id.to_string(), state);
        self.weights_store.save(tenant_id, &persisted).await;
    }

    pub async fn reset_weights(&self, tenant_id: &str) {
        self.states.remove(tenant_id);
        self.weights_store.delete(tenant_id).await;
    }
}
