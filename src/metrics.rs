//! Per-source fetch metrics
//!
//! Tracks latency and success rate for each external data source so a
//! dashboard host can tell which feed is degrading when fields go stale.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples kept per source
const MAX_SAMPLES: usize = 100;

/// Computed metrics for a single data source
#[derive(Debug, Clone)]
pub struct SourceMetrics {
    /// Source name ("price", "collection", "activity")
    pub source: String,
    /// 50th percentile latency in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Total number of fetches tracked
    pub total_requests: u64,
    /// Number of failed fetches
    pub failed_requests: u64,
}

impl SourceMetrics {
    fn empty(source: &str) -> Self {
        Self {
            source: source.to_string(),
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_requests: 0,
            failed_requests: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct LatencySample {
    duration_ms: f64,
    success: bool,
}

#[derive(Default)]
struct SourceWindow {
    samples: VecDeque<LatencySample>,
    total_requests: u64,
    failed_requests: u64,
}

/// Collects fetch metrics keyed by source name
pub struct MetricsCollector {
    windows: Arc<RwLock<HashMap<String, SourceWindow>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Records one fetch for a source with its duration and outcome
    pub async fn record(&self, source: &str, duration: Duration, success: bool) {
        let mut windows = self.windows.write().await;
        let window = windows.entry(source.to_string()).or_default();

        window.total_requests += 1;
        if !success {
            window.failed_requests += 1;
        }
        if window.samples.len() >= MAX_SAMPLES {
            window.samples.pop_front();
        }
        window.samples.push_back(LatencySample {
            duration_ms: duration.as_secs_f64() * 1000.0,
            success,
        });
    }

    /// Computes current metrics for one source
    pub async fn source_metrics(&self, source: &str) -> SourceMetrics {
        let windows = self.windows.read().await;
        let Some(window) = windows.get(source) else {
            return SourceMetrics::empty(source);
        };
        if window.samples.is_empty() {
            return SourceMetrics::empty(source);
        }

        let mut latencies: Vec<f64> = window
            .samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.duration_ms)
            .collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let success_rate = if window.total_requests > 0 {
            (window.total_requests - window.failed_requests) as f64
                / window.total_requests as f64
        } else {
            1.0
        };

        SourceMetrics {
            source: source.to_string(),
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate,
            total_requests: window.total_requests,
            failed_requests: window.failed_requests,
        }
    }

    /// Computes metrics for every source seen so far
    pub async fn all_metrics(&self) -> Vec<SourceMetrics> {
        let sources: Vec<String> = {
            let windows = self.windows.read().await;
            windows.keys().cloned().collect()
        };
        let mut result = Vec::with_capacity(sources.len());
        for source in sources {
            result.push(self.source_metrics(&source).await);
        }
        result
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}
