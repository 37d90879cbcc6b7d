//! Snapshot aggregation
//!
//! Runs the price and collection sources concurrently with no ordering
//! dependency between them. Each branch merges its typed partial into the
//! store and persists the merged snapshot to the cache as soon as it
//! resolves, so the price block and the floor block populate at different
//! times in practice. Disjoint field ownership between the partials makes
//! the merge order irrelevant.

use crate::cache::SnapshotCache;
use crate::config::MarketConfig;
use crate::error::FetchError;
use crate::fetchers::{ActivityFetcher, CollectionFetcher, PriceFetcher};
use crate::metrics::MetricsCollector;
use crate::source::{ActivitySource, CollectionSource, PriceSource};
use crate::store::SnapshotStore;
use crate::types::{MarketEvent, MarketSnapshot};
use std::sync::Arc;
use std::time::Instant;

/// Owns snapshot construction: fetch, merge, persist
pub struct Aggregator {
    price: Arc<dyn PriceSource>,
    collection: Arc<dyn CollectionSource>,
    activity: Arc<dyn ActivitySource>,
    store: Arc<SnapshotStore>,
    cache: Arc<SnapshotCache>,
    metrics: Arc<MetricsCollector>,
}

impl Aggregator {
    /// Builds an aggregator over the real HTTP fetchers
    pub fn from_config(
        config: &MarketConfig,
        store: Arc<SnapshotStore>,
        cache: Arc<SnapshotCache>,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self, FetchError> {
        Ok(Self::new(
            Arc::new(PriceFetcher::new(config.dex.clone())?),
            Arc::new(CollectionFetcher::new(config.marketplace.clone())?),
            Arc::new(ActivityFetcher::new(config.marketplace.clone())?),
            store,
            cache,
            metrics,
        ))
    }

    /// Builds an aggregator over arbitrary sources (tests use mocks here)
    pub fn new(
        price: Arc<dyn PriceSource>,
        collection: Arc<dyn CollectionSource>,
        activity: Arc<dyn ActivitySource>,
        store: Arc<SnapshotStore>,
        cache: Arc<SnapshotCache>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            price,
            collection,
            activity,
            store,
            cache,
            metrics,
        }
    }

    /// Refreshes prices and collection data concurrently and returns the
    /// merged snapshot
    pub async fn refresh_market(&self) -> MarketSnapshot {
        tokio::join!(self.refresh_price_branch(), self.refresh_collection_branch());
        self.store.snapshot().await
    }

    /// Faster path refreshing only the price-owned fields
    pub async fn refresh_prices(&self) -> MarketSnapshot {
        self.refresh_price_branch().await;
        self.store.snapshot().await
    }

    async fn refresh_price_branch(&self) {
        let start = Instant::now();
        let update = self.price.fetch().await;
        self.metrics
            .record(self.price.source_name(), start.elapsed(), !update.is_empty())
            .await;
        let merged = self.store.apply_price_update(&update).await;
        self.cache.store_best_effort(&merged);
    }

    async fn refresh_collection_branch(&self) {
        let start = Instant::now();
        let update = self.collection.fetch().await;
        self.metrics
            .record(
                self.collection.source_name(),
                start.elapsed(),
                !update.is_empty(),
            )
            .await;
        let merged = self.store.apply_collection_update(&update).await;
        self.cache.store_best_effort(&merged);
    }

    /// Refreshes the activity feed, replacing the whole batch
    ///
    /// A failed poll replaces the batch with an empty one; the next
    /// scheduled poll is the only retry mechanism.
    pub async fn refresh_activity(&self) -> Vec<MarketEvent> {
        let start = Instant::now();
        let events = match self.activity.fetch().await {
            Ok(events) => {
                self.metrics
                    .record(self.activity.source_name(), start.elapsed(), true)
                    .await;
                events
            }
            Err(e) => {
                tracing::warn!(error = %e, "Activity fetch failed");
                self.metrics
                    .record(self.activity.source_name(), start.elapsed(), false)
                    .await;
                Vec::new()
            }
        };
        self.store.replace_events(events.clone()).await;
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mock::{MockActivitySource, MockCollectionSource, MockPriceSource};
    use crate::types::{CollectionStats, CollectionUpdate, EventKind, PriceUpdate};
    use std::collections::BTreeMap;

    fn test_cache() -> Arc<SnapshotCache> {
        Arc::new(SnapshotCache::new(std::env::temp_dir().join(format!(
            "market-snapshot-agg-test-{}.json",
            uuid::Uuid::new_v4()
        ))))
    }

    fn aggregator(
        price: MockPriceSource,
        collection: MockCollectionSource,
        activity: MockActivitySource,
    ) -> (Aggregator, Arc<SnapshotStore>, Arc<SnapshotCache>) {
        let store = Arc::new(SnapshotStore::new(MarketSnapshot::default()));
        let cache = test_cache();
        let agg = Aggregator::new(
            Arc::new(price),
            Arc::new(collection),
            Arc::new(activity),
            store.clone(),
            cache.clone(),
            Arc::new(MetricsCollector::new()),
        );
        (agg, store, cache)
    }

    fn sample_price_update() -> PriceUpdate {
        PriceUpdate {
            base_price_usd: Some(3100.0),
            token_price_usd: Some(0.45),
            token_change_24h_pct: Some(1.2),
            price_history: None,
        }
    }

    fn sample_collection_update() -> CollectionUpdate {
        let mut tier_floors = BTreeMap::new();
        tier_floors.insert("Void".to_string(), 1.7);
        CollectionUpdate {
            floor_price: Some(0.2),
            floor_image_url: Some("https://img.example/floor.png".to_string()),
            floor_item_url: None,
            tier_floors,
            stats: Some(CollectionStats {
                total_volume: 10.0,
                total_sales: 2,
                total_owners: 2,
                average_price: 0.2,
            }),
        }
    }

    fn sample_event() -> MarketEvent {
        MarketEvent {
            id: "ev-1".to_string(),
            kind: EventKind::Sale,
            asset_name: "Item #1".to_string(),
            price: Some(0.2),
            occurred_at: "12:30".to_string(),
            link_url: "https://market.example/item/1".to_string(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn all_sources_failing_still_yields_a_populated_snapshot() {
        let (agg, _, _) = aggregator(
            MockPriceSource::failing(),
            MockCollectionSource::failing(),
            MockActivitySource {
                result: Err("down".to_string()),
            },
        );
        let snapshot = agg.refresh_market().await;
        assert_eq!(snapshot, MarketSnapshot::default());
        assert!(snapshot.base_price_usd > 0.0);
        assert!(snapshot.floor_price > 0.0);

        let events = agg.refresh_activity().await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn one_failing_source_does_not_block_the_other() {
        let (agg, _, _) = aggregator(
            MockPriceSource::failing(),
            MockCollectionSource::new(sample_collection_update()),
            MockActivitySource { result: Ok(vec![]) },
        );
        let snapshot = agg.refresh_market().await;
        // Collection fields fresh, price fields still at defaults
        assert_eq!(snapshot.floor_price, 0.2);
        assert_eq!(snapshot.tier_floors["Void"], 1.7);
        assert_eq!(
            snapshot.base_price_usd,
            MarketSnapshot::default().base_price_usd
        );
    }

    #[tokio::test]
    async fn each_branch_persists_to_the_cache() {
        let (agg, _, cache) = aggregator(
            MockPriceSource::new(sample_price_update()),
            MockCollectionSource::failing(),
            MockActivitySource { result: Ok(vec![]) },
        );
        agg.refresh_prices().await;
        let cached = cache.load().unwrap();
        assert_eq!(cached.token_price_usd, 0.45);
    }

    #[tokio::test]
    async fn refresh_prices_leaves_collection_fields_alone() {
        let (agg, store, _) = aggregator(
            MockPriceSource::new(sample_price_update()),
            MockCollectionSource::new(sample_collection_update()),
            MockActivitySource { result: Ok(vec![]) },
        );
        agg.refresh_prices().await;
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.token_price_usd, 0.45);
        assert_eq!(
            snapshot.floor_price,
            MarketSnapshot::default().floor_price
        );
    }

    #[tokio::test]
    async fn activity_batch_replaces_previous_batch() {
        let (agg, store, _) = aggregator(
            MockPriceSource::failing(),
            MockCollectionSource::failing(),
            MockActivitySource {
                result: Ok(vec![sample_event()]),
            },
        );
        agg.refresh_activity().await;
        assert_eq!(store.events().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_activity_poll_clears_the_batch() {
        let (agg, store, _) = aggregator(
            MockPriceSource::failing(),
            MockCollectionSource::failing(),
            MockActivitySource {
                result: Err("down".to_string()),
            },
        );
        store.replace_events(vec![sample_event()]).await;
        agg.refresh_activity().await;
        assert!(store.events().await.is_empty());
    }
}
