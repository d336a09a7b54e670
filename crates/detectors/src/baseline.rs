//! Baseline computation and cache-blend (§4.1 stage 4). The 0.9/0.1 blend
//! split is the spec's explicit literal contract and is hardcoded here
//! deliberately, distinct from `AnalyzerConfig::BaselineConfig::blend_alpha`
//! which names the same constant for callers that want it overridable.

use causeway_core::types::Baseline;

const BLEND_Z: f64 = 3.0;
const BLEND_MIN_CACHED_SAMPLES: usize = 20;

pub fn compute_fresh(vals: &[f64]) -> Baseline {
    let n = vals.len();
    if n == 0 {
        return Baseline {
            mean: 0.0,
            std: 1e-9,
            lower: 0.0,
            upper: 0.0,
            seasonal_mean: None,
            sample_count: 0,
        };
    }
    let mean = vals.iter().sum::<f64>() / n as f64;
    let std = (vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64)
        .sqrt()
        .max(1e-9);
    Baseline {
        mean,
        std,
        lower: mean - BLEND_Z * std,
        upper: mean + BLEND_Z * std,
        seasonal_mean: None,
        sample_count: n,
    }
}

/// Blend a cached baseline with a freshly computed one. Per §4.1: if the
/// cached baseline has at least `BLEND_MIN_CACHED_SAMPLES` samples, blend
/// 0.9·cached + 0.1·fresh on mean and std; otherwise take fresh as-is.
pub fn blend(cached: Option<&Baseline>, fresh: &Baseline) -> Baseline {
    match cached {
        Some(cached) if cached.sample_count >= BLEND_MIN_CACHED_SAMPLES => {
            let mean = 0.9 * cached.mean + 0.1 * fresh.mean;
            let std = (0.9 * cached.std + 0.1 * fresh.std).max(1e-9);
            Baseline {
                mean,
                std,
                lower: mean - BLEND_Z * std,
                upper: mean + BLEND_Z * std,
                seasonal_mean: cached.seasonal_mean,
                sample_count: cached.sample_count + fresh.sample_count,
            }
        }
        _ => fresh.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_requires_warm_cache() {
        let fresh = compute_fresh(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let cold = Baseline {
            mean: 100.0,
            std: 1.0,
            lower: 97.0,
            upper: 103.0,
            seasonal_mean: None,
            sample_count: 3,
        };
        let blended = blend(Some(&cold), &fresh);
        assert_eq!(blended.mean, fresh.mean);
    }

    #[test]
    fn blend_weights_warm_cache_heavily() {
        let fresh = compute_fresh(&[10.0, 10.0, 10.0]);
        let warm = Baseline {
            mean: 100.0,
            std: 1.0,
            lower: 97.0,
            upper: 103.0,
            seasonal_mean: None,
            sample_count: 50,
        };
        let blended = blend(Some(&warm), &fresh);
        assert!(blended.mean > 80.0);
    }
}
