//! Persistent snapshot cache
//!
//! The last successful aggregated snapshot is serialized to a single JSON
//! file so the presentation layer can render immediately on restart before
//! fresh data arrives. Writes are last-write-wins with no transactional
//! guarantee; each write is idempotent with respect to the fields its
//! producer owns, which makes that acceptable.

use crate::constants::SNAPSHOT_SCHEMA_VERSION;
use crate::error::CacheError;
use crate::types::MarketSnapshot;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// On-disk cache entry, keyed by a fixed schema-version string
///
/// A version mismatch means the snapshot field layout changed since the
/// entry was written; the stale entry is discarded rather than partially
/// trusted.
#[derive(Debug, Serialize, Deserialize)]
struct CachedSnapshot {
    schema_version: String,
    snapshot: MarketSnapshot,
}

/// File-backed cache for the last good snapshot
pub struct SnapshotCache {
    path: PathBuf,
}

impl SnapshotCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the cached snapshot, if present and version-compatible
    pub fn load(&self) -> Result<MarketSnapshot, CacheError> {
        let raw = std::fs::read_to_string(&self.path)?;
        let entry: CachedSnapshot = serde_json::from_str(&raw)?;
        if entry.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(CacheError::VersionMismatch {
                found: entry.schema_version,
                expected: SNAPSHOT_SCHEMA_VERSION.to_string(),
            });
        }
        Ok(entry.snapshot)
    }

    /// Persists a snapshot, overwriting any previous entry
    pub fn store(&self, snapshot: &MarketSnapshot) -> Result<(), CacheError> {
        let entry = CachedSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
            snapshot: snapshot.clone(),
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_vec(&entry)?)?;
        Ok(())
    }

    /// Best-effort persist used on every partial merge; failures are logged
    /// and otherwise ignored so a full disk never degrades the live snapshot
    pub fn store_best_effort(&self, snapshot: &MarketSnapshot) {
        if let Err(e) = self.store(snapshot) {
            tracing::warn!(error = %e, path = %self.path.display(), "Failed to persist snapshot cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CollectionStats, PricePoint, PriceSeries};
    use chrono::Utc;

    fn temp_cache() -> SnapshotCache {
        SnapshotCache::new(std::env::temp_dir().join(format!(
            "market-snapshot-cache-test-{}.json",
            uuid::Uuid::new_v4()
        )))
    }

    fn sample_snapshot() -> MarketSnapshot {
        let mut snapshot = MarketSnapshot {
            base_price_usd: 3000.0,
            token_price_usd: 0.5,
            token_change_24h_pct: 4.2,
            floor_price: 0.19,
            floor_image_url: "https://img.example/a.png".to_string(),
            floor_item_url: "https://market.example/item/1".to_string(),
            price_history: PriceSeries {
                points: vec![PricePoint {
                    timestamp: Utc::now(),
                    value: 0.5,
                }],
                synthetic: true,
            },
            stats: CollectionStats {
                total_volume: 99.0,
                total_sales: 12,
                total_owners: 7,
                average_price: 0.21,
            },
            ..MarketSnapshot::default()
        };
        snapshot.tier_floors.insert("Void".to_string(), 1.7);
        snapshot
    }

    #[test]
    fn round_trip_preserves_all_fields() {
        let cache = temp_cache();
        let snapshot = sample_snapshot();
        cache.store(&snapshot).unwrap();
        assert_eq!(cache.load().unwrap(), snapshot);
    }

    #[test]
    fn missing_file_is_an_error_not_a_panic() {
        let cache = temp_cache();
        assert!(cache.load().is_err());
    }

    #[test]
    fn version_mismatch_discards_entry() {
        let cache = temp_cache();
        let entry = serde_json::json!({
            "schema_version": "market_snapshot_v1",
            "snapshot": sample_snapshot(),
        });
        std::fs::write(&cache.path, entry.to_string()).unwrap();
        assert!(matches!(
            cache.load(),
            Err(CacheError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn store_overwrites_previous_entry() {
        let cache = temp_cache();
        cache.store(&MarketSnapshot::default()).unwrap();
        let newer = sample_snapshot();
        cache.store(&newer).unwrap();
        assert_eq!(cache.load().unwrap(), newer);
    }
}
