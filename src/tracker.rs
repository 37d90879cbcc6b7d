//! Market tracker service
//!
//! Owns the store, cache and aggregator, seeds initial state from the cache
//! so a dashboard can render immediately on restart, and drives the two
//! periodic refresh loops.

use crate::aggregator::Aggregator;
use crate::cache::SnapshotCache;
use crate::config::MarketConfig;
use crate::error::FetchError;
use crate::metrics::{MetricsCollector, SourceMetrics};
use crate::store::SnapshotStore;
use crate::types::{MarketEvent, MarketSnapshot};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Overall tracker health
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// All sources are delivering data
    Healthy,
    /// At least one source is mostly failing; its fields are going stale
    Degraded,
}

/// Health check result
#[derive(Debug, Clone)]
pub struct TrackerHealth {
    pub status: HealthStatus,
    pub message: String,
    /// Per-source metrics backing the verdict
    pub sources: Vec<SourceMetrics>,
}

/// Periodically polls all market sources and serves the aggregated state
///
/// # Example
/// ```no_run
/// use market_snapshot_sdk::{MarketConfig, MarketTracker};
///
/// # async fn example(config: MarketConfig) -> Result<(), Box<dyn std::error::Error>> {
/// let tracker = MarketTracker::new(config)?;
/// tracker.start();
///
/// let snapshot = tracker.snapshot().await;
/// println!("floor: {:.4}", snapshot.floor_price);
/// # Ok(())
/// # }
/// ```
pub struct MarketTracker {
    config: MarketConfig,
    store: Arc<SnapshotStore>,
    aggregator: Arc<Aggregator>,
    metrics: Arc<MetricsCollector>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl MarketTracker {
    /// Creates a tracker, seeding the snapshot from the cache when a
    /// version-compatible entry exists
    pub fn new(config: MarketConfig) -> Result<Self, FetchError> {
        let cache = Arc::new(SnapshotCache::new(config.cache_path.clone()));
        let initial = match cache.load() {
            Ok(snapshot) => {
                tracing::info!("Seeded snapshot from cache");
                snapshot
            }
            Err(e) => {
                tracing::debug!(reason = %e, "No usable cached snapshot, starting from defaults");
                config.initial_snapshot()
            }
        };
        let store = Arc::new(SnapshotStore::new(initial));
        let metrics = Arc::new(MetricsCollector::new());
        let aggregator = Arc::new(Aggregator::from_config(
            &config,
            store.clone(),
            cache,
            metrics.clone(),
        )?);

        Ok(Self {
            config,
            store,
            aggregator,
            metrics,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Starts the periodic refresh loops
    ///
    /// Idempotent-ish by construction only: calling it twice doubles the
    /// polling rate, so call it once.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock().expect("tracker task list poisoned");
        tasks.push(Self::spawn_loop(
            "market",
            self.config.market_refresh_interval(),
            self.aggregator.clone(),
            |aggregator| async move {
                aggregator.refresh_market().await;
            },
        ));
        tasks.push(Self::spawn_loop(
            "activity",
            self.config.activity_refresh_interval(),
            self.aggregator.clone(),
            |aggregator| async move {
                aggregator.refresh_activity().await;
            },
        ));
    }

    fn spawn_loop<F, Fut>(
        name: &'static str,
        interval: Duration,
        aggregator: Arc<Aggregator>,
        refresh: F,
    ) -> JoinHandle<()>
    where
        F: Fn(Arc<Aggregator>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        tokio::spawn(async move {
            tracing::info!(
                loop_name = name,
                interval_secs = interval.as_secs(),
                "Starting refresh loop"
            );
            loop {
                refresh(aggregator.clone()).await;
                sleep(interval).await;
            }
        })
    }

    /// Stops the refresh loops
    ///
    /// In-flight requests are not aborted mid-await beyond task
    /// cancellation; their results are simply never merged.
    pub fn stop(&self) {
        let mut tasks = self.tasks.lock().expect("tracker task list poisoned");
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    /// Returns the current aggregated snapshot (always fully populated)
    pub async fn snapshot(&self) -> MarketSnapshot {
        self.store.snapshot().await
    }

    /// Returns the latest activity batch
    pub async fn events(&self) -> Vec<MarketEvent> {
        self.store.events().await
    }

    /// Forces an immediate full market refresh, bypassing the poll interval
    pub async fn refresh_now(&self) -> MarketSnapshot {
        self.aggregator.refresh_market().await
    }

    /// Forces an immediate price-only refresh (the faster path)
    pub async fn refresh_prices_now(&self) -> MarketSnapshot {
        self.aggregator.refresh_prices().await
    }

    /// Forces an immediate activity refresh
    pub async fn refresh_activity_now(&self) -> Vec<MarketEvent> {
        self.aggregator.refresh_activity().await
    }

    /// Reports per-source fetch health
    ///
    /// The snapshot itself never signals failure (stale fields keep their
    /// last-known or default values), so this is the only place a host can
    /// see that a source is down.
    pub async fn health_check(&self) -> TrackerHealth {
        let sources = self.metrics.all_metrics().await;
        let failing: Vec<&str> = sources
            .iter()
            .filter(|m| m.total_requests > 0 && m.success_rate < 0.5)
            .map(|m| m.source.as_str())
            .collect();

        if failing.is_empty() {
            TrackerHealth {
                status: HealthStatus::Healthy,
                message: "All market sources operational".to_string(),
                sources,
            }
        } else {
            TrackerHealth {
                status: HealthStatus::Degraded,
                message: format!("Sources mostly failing: {}", failing.join(", ")),
                sources,
            }
        }
    }
}

impl Drop for MarketTracker {
    fn drop(&mut self) {
        self.stop();
    }
}
