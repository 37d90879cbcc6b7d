//! # Market Snapshot SDK
//!
//! Polls third-party market APIs (a DEX aggregator token price feed, an NFT
//! marketplace listings/stats/events API) and aggregates the results into a
//! single always-fully-populated [`MarketSnapshot`] plus a bounded list of
//! recent [`MarketEvent`]s, ready for a dashboard to render.
//!
//! The sources are heterogeneous and unreliable, so every fetch degrades
//! gracefully: a failed request leaves its fields at their previous or
//! default values, and the next scheduled poll is the only retry mechanism.
//! There is no fatal error path.
//!
//! ## Usage
//!
//! ```no_run
//! use market_snapshot_sdk::{MarketConfig, MarketTracker};
//!
//! # async fn example(config: MarketConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = MarketTracker::new(config)?;
//! tracker.start();
//!
//! // Rendered immediately from the cache or static defaults,
//! // then refined as polls resolve.
//! let snapshot = tracker.snapshot().await;
//! println!(
//!     "floor {:.4} / token ${:.4} ({:+.2}% 24h)",
//!     snapshot.floor_price, snapshot.token_price_usd, snapshot.token_change_24h_pct
//! );
//!
//! for event in tracker.events().await {
//!     println!("{} {} @ {}", event.occurred_at, event.asset_name, event.link_url);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! MarketTracker::start()
//!     ├── market loop (60s) ──> Aggregator ──┬── PriceFetcher      (PriceUpdate)
//!     │                                      └── CollectionFetcher (CollectionUpdate)
//!     └── activity loop (10s) ─> Aggregator ──── ActivityFetcher   (Vec<MarketEvent>)
//!                                      │
//!                                SnapshotStore ── SnapshotCache (JSON file)
//! ```
//!
//! Each fetcher owns a disjoint set of snapshot fields via its typed partial
//! update, so concurrent merges are commutative and need no coordination
//! beyond the store's lock.

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod fetchers;
pub mod metrics;
pub mod source;
pub mod store;
pub mod tracker;
pub mod types;
pub mod units;

// Re-export commonly used types
pub use cache::SnapshotCache;
pub use config::{DexConfig, MarketConfig, MarketplaceConfig, TierSpec, TraitFilter};
pub use error::{CacheError, FetchError};
pub use metrics::SourceMetrics;
pub use tracker::{HealthStatus, MarketTracker, TrackerHealth};
pub use types::{
    CollectionStats, EventKind, MarketEvent, MarketSnapshot, PricePoint, PriceSeries,
};
