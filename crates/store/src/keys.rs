//! Redis key construction. Keys are namespaced by tenant and slugged with a
//! short sha2 digest so arbitrary tenant/service/pair strings never produce
//! unbounded or unsafe key segments.

use sha2::{Digest, Sha256};

fn slug(raw: &str) -> String {
    if raw.len() <= 48 && !raw.contains(['\n', '\r']) {
        return raw.to_string();
    }
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())[..16].to_string()
}

pub fn baseline_key(tenant_id: &str, metric_name: &str) -> String {
    format!("causeway:{}:baseline:{}", slug(tenant_id), slug(metric_name))
}

pub fn weights_key(tenant_id: &str) -> String {
    format!("causeway:{}:weights", slug(tenant_id))
}

pub fn events_key(tenant_id: &str) -> String {
    format!("causeway:{}:events", slug(tenant_id))
}

pub fn granger_key(tenant_id: &str, cause_metric: &str, effect_metric: &str) -> String {
    format!(
        "causeway:{}:granger:{}",
        slug(tenant_id),
        slug(&pair_key(cause_metric, effect_metric))
    )
}

/// Canonical, order-independent key for a (cause, effect) metric pair.
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}|{b}")
    } else {
        format!("{b}|{a}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_is_order_independent() {
        assert_eq!(pair_key("cpu", "latency"), pair_key("latency", "cpu"));
    }

    #[test]
    fn short_keys_are_not_hashed() {
        assert_eq!(slug("svc-a"), "svc-a");
    }
}
