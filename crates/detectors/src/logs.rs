//! Log burst detector (sliding-window rate ratio) and log pattern analyzer
//! (noise-normalized template extraction + Shannon entropy over token
//! distribution), per §2's one-line descriptions.

use causeway_core::config::LogsConfig;
use causeway_core::types::{LogBurst, LogPattern, Severity};
use std::collections::HashMap;

pub struct LogLine<'a> {
    pub timestamp: f64,
    pub message: &'a str,
}

/// Sliding 1-second windows compared against the median window rate.
pub fn detect_bursts(lines: &[LogLine], cfg: &LogsConfig) -> Vec<LogBurst> {
    if lines.is_empty() {
        return Vec::new();
    }
    let start = lines.iter().map(|l| l.timestamp).fold(f64::MAX, f64::min);
    let end = lines.iter().map(|l| l.timestamp).fold(f64::MIN, f64::max);
    if !start.is_finite() || !end.is_finite() || end <= start {
        return Vec::new();
    }

    let bucket_width = 1.0_f64;
    let bucket_count = ((end - start) / bucket_width).ceil() as usize + 1;
    let mut counts = vec![0u32; bucket_count];
    for line in lines {
        let idx = ((line.timestamp - start) / bucket_width) as usize;
        if let Some(c) = counts.get_mut(idx.min(bucket_count - 1)) {
            *c += 1;
        }
    }

    let mut sorted_counts = counts.clone();
    sorted_counts.sort_unstable();
    let baseline_rate = if sorted_counts.is_empty() {
        0.0
    } else {
        sorted_counts[sorted_counts.len() / 2] as f64
    }
    .max(0.1);

    let mut bursts = Vec::new();
    let mut i = 0;
    while i < counts.len() {
        let rate = counts[i] as f64;
        let ratio = rate / baseline_rate;
        if ratio >= cfg.burst_ratio_medium {
            let mut j = i;
            while j < counts.len() && (counts[j] as f64 / baseline_rate) >= cfg.burst_ratio_medium {
                j += 1;
            }
            let window_start = start + i as f64 * bucket_width;
            let window_end = start + j as f64 * bucket_width;
            let window_total: u32 = counts[i..j].iter().sum();
            let window_seconds = (j - i) as f64 * bucket_width;
            let rate_per_second = window_total as f64 / window_seconds.max(1.0);
            let window_ratio = rate_per_second / baseline_rate;
            let severity = if window_ratio >= cfg.burst_ratio_critical {
                Severity::Critical
            } else if window_ratio >= cfg.burst_ratio_high {
                Severity::High
            } else {
                Severity::Medium
            };
            bursts.push(LogBurst {
                window_start,
                window_end,
                rate_per_second,
                baseline_rate,
                ratio: window_ratio,
                severity,
            });
            i = j;
        } else {
            i += 1;
        }
    }
    bursts
}

fn normalize_pattern(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut last_was_placeholder = false;
    for token in message.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        let is_numeric_ish = token.chars().any(|c| c.is_ascii_digit());
        let is_uuid_ish = token.len() >= 16 && token.chars().all(|c| c.is_ascii_hexdigit() || c == '-');
        if is_numeric_ish || is_uuid_ish {
            if !last_was_placeholder {
                out.push('#');
            }
            last_was_placeholder = true;
        } else {
            out.push_str(token);
            last_was_placeholder = false;
        }
    }
    out
}

fn shannon_entropy(counts: &HashMap<String, usize>) -> f64 {
    let total: usize = counts.values().sum();
    if total == 0 {
        return 0.0;
    }
    counts
        .values()
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

pub fn detect_patterns(lines: &[LogLine], cfg: &LogsConfig) -> Vec<LogPattern> {
    if lines.is_empty() {
        return Vec::new();
    }
    let mut groups: HashMap<String, Vec<&LogLine>> = HashMap::new();
    for line in lines {
        groups
            .entry(normalize_pattern(line.message))
            .or_default()
            .push(line);
    }

    let window_minutes = (cfg.pattern_window_seconds / 60.0).max(1.0);
    let mut patterns = Vec::new();
    for (pattern, members) in groups {
        if members.len() < cfg.pattern_min_count {
            continue;
        }
        let first_seen = members.iter().map(|l| l.timestamp).fold(f64::MAX, f64::min);
        let last_seen = members.iter().map(|l| l.timestamp).fold(f64::MIN, f64::max);
        let mut token_counts: HashMap<String, usize> = HashMap::new();
        for m in &members {
            for tok in m.message.split_whitespace() {
                *token_counts.entry(tok.to_string()).or_insert(0) += 1;
            }
        }
        let entropy = shannon_entropy(&token_counts);
        let rate_per_minute = members.len() as f64 / window_minutes;
        let severity = if rate_per_minute >= 20.0 {
            Severity::Critical
        } else if rate_per_minute >= 10.0 {
            Severity::High
        } else if rate_per_minute >= 3.0 {
            Severity::Medium
        } else {
            Severity::Low
        };
        patterns.push(LogPattern {
            pattern,
            count: members.len(),
            first_seen,
            last_seen,
            rate_per_minute,
            entropy,
            severity,
            sample: members[0].message.to_string(),
        });
    }
    patterns.sort_by(|a, b| b.count.cmp(&a.count));
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_a_dense_burst() {
        let mut lines = Vec::new();
        for i in 0..100 {
            lines.push(LogLine {
                timestamp: 30.0 + i as f64 * 0.005,
                message: "error processing request",
            });
        }
        for i in 0..20 {
            lines.push(LogLine {
                timestamp: 200.0 + i as f64 * 10.0,
                message: "ok",
            });
        }
        let bursts = detect_bursts(&lines, &LogsConfig::default());
        assert!(bursts.iter().any(|b| b.window_start <= 30.0 && b.window_end >= 30.0));
    }

    #[test]
    fn repeated_pattern_is_grouped() {
        let lines: Vec<LogLine> = (0..6)
            .map(|i| LogLine {
                timestamp: i as f64,
                message: "failed to connect to db after 3 retries",
            })
            .collect();
        let patterns = detect_patterns(&lines, &LogsConfig::default());
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].count, 6);
    }
}
