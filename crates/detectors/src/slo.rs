//! SLO burn-window evaluator plus the supplemental `BudgetStatus` view
//! (DESIGN.md Open Question #12): burn rate is the ratio of the observed
//! error fraction to the error budget allowed by the target availability,
//! evaluated across the standard multi-window burn-rate ladder.

use causeway_core::config::SloConfig;
use causeway_core::types::{BudgetStatus, Severity, SloBurnAlert};

fn window_label(minutes: u32) -> String {
    if minutes < 60 {
        format!("{minutes}m")
    } else if minutes < 1440 {
        format!("{}h", minutes / 60)
    } else {
        format!("{}d", minutes / 1440)
    }
}

fn severity_for_window(minutes: u32, burn_rate: f64) -> Severity {
    let (critical, high, medium) = match minutes {
        m if m <= 5 => (14.4, 6.0, 3.0),
        m if m <= 60 => (14.4, 6.0, 3.0),
        m if m <= 360 => (6.0, 3.0, 1.0),
        _ => (3.0, 1.0, 0.5),
    };
    if burn_rate >= critical {
        Severity::Critical
    } else if burn_rate >= high {
        Severity::High
    } else if burn_rate >= medium {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Evaluate burn rate for `service` over every configured window, given
/// the observed error/total counts restricted to each window's trailing
/// slice of the request range.
pub fn evaluate_burn(
    service: &str,
    error_counts: &[f64],
    total_counts: &[f64],
    target_availability: f64,
    cfg: &SloConfig,
) -> Vec<SloBurnAlert> {
    let n = error_counts.len().min(total_counts.len());
    if n == 0 {
        return Vec::new();
    }
    let total_errors: f64 = error_counts[..n].iter().sum();
    let total_requests: f64 = total_counts[..n].iter().sum();
    if total_requests <= 0.0 {
        return Vec::new();
    }
    let observed_error_fraction = total_errors / total_requests;
    let allowed_error_fraction = (1.0 - target_availability).max(1e-9);
    let burn_rate = observed_error_fraction / allowed_error_fraction;

    cfg.burn_windows_minutes
        .iter()
        .map(|&minutes| SloBurnAlert {
            service: service.to_string(),
            window_label: window_label(minutes),
            burn_rate,
            severity: severity_for_window(minutes, burn_rate),
            error_budget_consumed_pct: (burn_rate * 100.0).min(1000.0),
        })
        .collect()
}

pub fn budget_status(
    service: &str,
    window_days: u32,
    target_availability: f64,
    error_counts: &[f64],
    total_counts: &[f64],
) -> BudgetStatus {
    let n = error_counts.len().min(total_counts.len());
    let total_errors: f64 = error_counts[..n].iter().sum();
    let total_requests: f64 = total_counts[..n].iter().sum::<f64>().max(1.0);
    let current_availability = 1.0 - (total_errors / total_requests);
    let allowed_error_budget = (1.0 - target_availability).max(1e-9);
    let consumed_fraction = (1.0 - current_availability) / allowed_error_budget;
    let budget_used_pct = (consumed_fraction * 100.0).min(999.0);
    let total_window_minutes = window_days as f64 * 24.0 * 60.0;
    let remaining_minutes = (total_window_minutes * (1.0 - consumed_fraction).max(0.0)).max(0.0);

    BudgetStatus {
        service: service.to_string(),
        window_days,
        target_availability,
        current_availability,
        budget_used_pct,
        remaining_minutes,
        on_track: budget_used_pct < 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heavy_error_rate_burns_budget_fast() {
        // error_rate = 1.5/100 = 0.015, allowed = 1 - 0.999 = 0.001, burn_rate = 15.0.
        let errors = vec![1.5; 40];
        let totals = vec![100.0; 40];
        let alerts = evaluate_burn("checkout", &errors, &totals, 0.999, &SloConfig::default());
        assert!(alerts.iter().any(|a| a.burn_rate >= 14.4 && a.severity == Severity::Critical));
    }
}
