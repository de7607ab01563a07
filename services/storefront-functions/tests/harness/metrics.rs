// SPDX-FileCopyrightText: 2026 Blacklabspotsshop contributors
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Metrics collection for abuse simulation results.

use axum::http::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Collects metrics during attack simulation.
#[derive(Debug, Default)]
pub struct AttackMetrics {
    start_time: Option<Instant>,
    end_time: Option<Instant>,
    /// Count of requests by outcome
    outcomes: HashMap<Outcome, usize>,
    /// Count of requests by IP
    requests_per_ip: HashMap<String, usize>,
    /// Latency samples (microseconds)
    latencies: Vec<u64>,
}

/// Possible outcomes for a request, as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// 200 with the "sent" message
    Sent,
    /// 200 without a message
    SilentAccept,
    RateLimited,
    VerificationFailed,
    Invalid,
    ServerError,
}

impl Outcome {
    /// Classify a contact endpoint reply.
    pub fn classify(status: StatusCode, body: &Value) -> Self {
        match status {
            StatusCode::OK if body.get("message").is_some() => Outcome::Sent,
            StatusCode::OK => Outcome::SilentAccept,
            StatusCode::TOO_MANY_REQUESTS => Outcome::RateLimited,
            StatusCode::BAD_REQUEST => {
                let error = body["error"].as_str().unwrap_or_default();
                if error.starts_with("Verification") {
                    Outcome::VerificationFailed
                } else {
                    Outcome::Invalid
                }
            }
            _ => Outcome::ServerError,
        }
    }
}

impl AttackMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of the attack.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Mark the end of the attack.
    pub fn finish(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Record a request outcome.
    pub fn record(&mut self, outcome: Outcome, ip: &str, latency: Duration) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        *self.requests_per_ip.entry(ip.to_string()).or_insert(0) += 1;
        self.latencies.push(latency.as_micros() as u64);
    }

    /// Get total request count.
    pub fn total_requests(&self) -> usize {
        self.outcomes.values().sum()
    }

    /// Get count for a specific outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Get attack duration.
    pub fn duration(&self) -> Duration {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => end.duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    /// Ratio of requests that did not result in a sent email.
    pub fn block_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        (total - self.count(Outcome::Sent)) as f64 / total as f64
    }

    /// Get median latency in microseconds.
    pub fn median_latency_us(&self) -> u64 {
        if self.latencies.is_empty() {
            return 0;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        sorted[sorted.len() / 2]
    }

    /// Get number of unique IPs seen.
    pub fn unique_ips(&self) -> usize {
        self.requests_per_ip.len()
    }

    /// Generate a summary report.
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            total_requests: self.total_requests(),
            sent: self.count(Outcome::Sent),
            silent_accept: self.count(Outcome::SilentAccept),
            rate_limited: self.count(Outcome::RateLimited),
            verification_failed: self.count(Outcome::VerificationFailed),
            invalid: self.count(Outcome::Invalid),
            server_error: self.count(Outcome::ServerError),
            duration_ms: self.duration().as_millis() as u64,
            block_rate: self.block_rate(),
            median_latency_us: self.median_latency_us(),
            unique_ips: self.unique_ips(),
        }
    }
}

/// Summary report of attack metrics.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub total_requests: usize,
    pub sent: usize,
    pub silent_accept: usize,
    pub rate_limited: usize,
    pub verification_failed: usize,
    pub invalid: usize,
    pub server_error: usize,
    pub duration_ms: u64,
    pub block_rate: f64,
    pub median_latency_us: u64,
    pub unique_ips: usize,
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Abuse Simulation Report ===")?;
        writeln!(f, "Duration:            {} ms", self.duration_ms)?;
        writeln!(f, "Total Requests:      {}", self.total_requests)?;
        writeln!(f)?;
        writeln!(f, "--- Outcomes ---")?;
        writeln!(f, "Sent:                {}", self.sent)?;
        writeln!(f, "Silent Accept:       {}", self.silent_accept)?;
        writeln!(f, "Rate Limited:        {}", self.rate_limited)?;
        writeln!(f, "Verification Failed: {}", self.verification_failed)?;
        writeln!(f, "Invalid:             {}", self.invalid)?;
        writeln!(f, "Server Error:        {}", self.server_error)?;
        writeln!(f, "Block Rate:          {:.1}%", self.block_rate * 100.0)?;
        writeln!(f)?;
        writeln!(f, "Median Latency:      {} us", self.median_latency_us)?;
        writeln!(f, "Unique IPs:          {}", self.unique_ips)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify() {
        assert_eq!(
            Outcome::classify(StatusCode::OK, &json!({"success": true, "message": "x"})),
            Outcome::Sent
        );
        assert_eq!(
            Outcome::classify(StatusCode::OK, &json!({"success": true})),
            Outcome::SilentAccept
        );
        assert_eq!(
            Outcome::classify(
                StatusCode::BAD_REQUEST,
                &json!({"success": false, "error": "Verification failed. Please try again."})
            ),
            Outcome::VerificationFailed
        );
    }

    #[test]
    fn test_block_rate() {
        let mut metrics = AttackMetrics::new();
        for _ in 0..3 {
            metrics.record(Outcome::Sent, "10.0.0.1", Duration::ZERO);
        }
        for _ in 0..7 {
            metrics.record(Outcome::RateLimited, "10.0.0.1", Duration::ZERO);
        }
        assert!((metrics.block_rate() - 0.7).abs() < 0.01);
    }
}
