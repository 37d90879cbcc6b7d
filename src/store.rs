//! In-memory snapshot store
//!
//! Holds the current aggregated snapshot and the latest activity batch.
//! Fetchers never touch this directly; the aggregator applies their typed
//! partial updates, which own disjoint field sets, so the order in which
//! concurrent partials land does not affect the final snapshot.

use crate::types::{CollectionUpdate, MarketEvent, MarketSnapshot, PriceUpdate};
use tokio::sync::RwLock;

/// Store for the live snapshot and activity feed
pub struct SnapshotStore {
    snapshot: RwLock<MarketSnapshot>,
    events: RwLock<Vec<MarketEvent>>,
}

impl SnapshotStore {
    /// Creates a store seeded with an initial snapshot (static defaults,
    /// optionally overlaid with a cached snapshot)
    pub fn new(initial: MarketSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(initial),
            events: RwLock::new(Vec::new()),
        }
    }

    /// Applies a price partial and returns the merged snapshot
    pub async fn apply_price_update(&self, update: &PriceUpdate) -> MarketSnapshot {
        let mut snapshot = self.snapshot.write().await;
        update.apply(&mut snapshot);
        snapshot.clone()
    }

    /// Applies a collection partial and returns the merged snapshot
    pub async fn apply_collection_update(&self, update: &CollectionUpdate) -> MarketSnapshot {
        let mut snapshot = self.snapshot.write().await;
        update.apply(&mut snapshot);
        snapshot.clone()
    }

    /// Replaces the activity feed with the latest poll's batch
    pub async fn replace_events(&self, events: Vec<MarketEvent>) {
        let mut slot = self.events.write().await;
        *slot = events;
    }

    /// Returns a copy of the current snapshot
    pub async fn snapshot(&self) -> MarketSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Returns a copy of the latest activity batch
    pub async fn events(&self) -> Vec<MarketEvent> {
        self.events.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventKind;

    #[tokio::test]
    async fn price_update_merges_into_snapshot() {
        let store = SnapshotStore::new(MarketSnapshot::default());
        let merged = store
            .apply_price_update(&PriceUpdate {
                token_price_usd: Some(0.77),
                ..Default::default()
            })
            .await;
        assert_eq!(merged.token_price_usd, 0.77);
        // Untouched fields keep their defaults
        assert_eq!(
            merged.floor_price,
            MarketSnapshot::default().floor_price
        );
    }

    #[tokio::test]
    async fn events_are_replaced_not_merged() {
        let store = SnapshotStore::new(MarketSnapshot::default());
        let event = |id: &str| MarketEvent {
            id: id.to_string(),
            kind: EventKind::Sale,
            asset_name: "Item".to_string(),
            price: Some(0.1),
            occurred_at: "12:30".to_string(),
            link_url: "#".to_string(),
            image_url: None,
        };
        store.replace_events(vec![event("a"), event("b")]).await;
        store.replace_events(vec![event("c")]).await;
        let events = store.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "c");
    }
}
