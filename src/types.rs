//! Types for the aggregated market snapshot

use crate::constants::{
    DEFAULT_BASE_PRICE_USD, DEFAULT_FLOOR_PRICE, DEFAULT_TOKEN_CHANGE_24H_PCT,
    DEFAULT_TOKEN_PRICE_USD,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single point of a price history series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Point timestamp
    pub timestamp: DateTime<Utc>,
    /// Price in USD
    pub value: f64,
}

/// A trailing price history series
///
/// When no real series is obtainable from any source, the price fetcher
/// synthesizes a display-fallback series. Synthesized series are flagged
/// `synthetic: true` so consumers can distinguish them from genuine history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    /// Ordered (oldest first) points
    pub points: Vec<PricePoint>,
    /// True if the series was synthesized rather than fetched
    pub synthetic: bool,
}

/// Aggregate collection statistics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Lifetime traded volume (native asset)
    pub total_volume: f64,
    /// Lifetime number of sales
    pub total_sales: u64,
    /// Current number of owners
    pub total_owners: u64,
    /// Average sale price (native asset)
    pub average_price: f64,
}

/// The complete aggregated market data record consumed by the presentation
/// layer
///
/// Every field carries a statically defined fallback default, so the
/// snapshot is always fully populated even when all network calls fail.
/// Construction is owned exclusively by the aggregator; fetchers only ever
/// produce [`PriceUpdate`] / [`CollectionUpdate`] partials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Base asset price in USD
    pub base_price_usd: f64,
    /// Tracked token price in USD
    pub token_price_usd: f64,
    /// Tracked token 24h change, percent
    pub token_change_24h_pct: f64,
    /// Collection-wide floor price (native asset)
    pub floor_price: f64,
    /// Per-tier floor prices (native asset)
    ///
    /// A value of `0.0` means the trait-filtered query found no listing; the
    /// presentation layer applies its own proportional-scale fallback
    /// against `floor_price` in that case.
    pub tier_floors: BTreeMap<String, f64>,
    /// Image URL of the current floor item
    pub floor_image_url: String,
    /// Marketplace URL of the current floor item (or the collection page)
    pub floor_item_url: String,
    /// Trailing token price history
    pub price_history: PriceSeries,
    /// Aggregate collection statistics
    pub stats: CollectionStats,
}

impl Default for MarketSnapshot {
    fn default() -> Self {
        Self {
            base_price_usd: DEFAULT_BASE_PRICE_USD,
            token_price_usd: DEFAULT_TOKEN_PRICE_USD,
            token_change_24h_pct: DEFAULT_TOKEN_CHANGE_24H_PCT,
            floor_price: DEFAULT_FLOOR_PRICE,
            tier_floors: BTreeMap::new(),
            floor_image_url: "#".to_string(),
            floor_item_url: "#".to_string(),
            price_history: PriceSeries::default(),
            stats: CollectionStats::default(),
        }
    }
}

/// Partial snapshot update owned by the price fetcher
///
/// `None` means "keep the previous value". The field set is disjoint from
/// [`CollectionUpdate`]; keeping these sets non-overlapping is what makes
/// concurrent merges commutative, so any new fetcher must claim fields that
/// no existing update type writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceUpdate {
    pub base_price_usd: Option<f64>,
    pub token_price_usd: Option<f64>,
    pub token_change_24h_pct: Option<f64>,
    pub price_history: Option<PriceSeries>,
}

impl PriceUpdate {
    /// True when no sub-request contributed real data (a synthesized
    /// fallback series alone does not count as fetched data)
    pub fn is_empty(&self) -> bool {
        self.base_price_usd.is_none()
            && self.token_price_usd.is_none()
            && self.token_change_24h_pct.is_none()
            && self.price_history.as_ref().map_or(true, |h| h.synthetic)
    }

    /// Merges this partial into a snapshot, writing only its owned fields
    pub fn apply(&self, snapshot: &mut MarketSnapshot) {
        if let Some(v) = self.base_price_usd {
            snapshot.base_price_usd = v;
        }
        if let Some(v) = self.token_price_usd {
            snapshot.token_price_usd = v;
        }
        if let Some(v) = self.token_change_24h_pct {
            snapshot.token_change_24h_pct = v;
        }
        if let Some(series) = &self.price_history {
            snapshot.price_history = series.clone();
        }
    }
}

/// Partial snapshot update owned by the collection stats fetcher
///
/// `tier_floors` uses key presence for merge semantics: a present key
/// overwrites the tier's floor (a `0.0` value is an explicit "no listing
/// found"), an absent key keeps the previous value (the tier query failed).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionUpdate {
    pub floor_price: Option<f64>,
    pub floor_image_url: Option<String>,
    pub floor_item_url: Option<String>,
    pub tier_floors: BTreeMap<String, f64>,
    pub stats: Option<CollectionStats>,
}

impl CollectionUpdate {
    /// True when no sub-request contributed anything (every source failed)
    pub fn is_empty(&self) -> bool {
        self.floor_price.is_none()
            && self.floor_image_url.is_none()
            && self.floor_item_url.is_none()
            && self.tier_floors.is_empty()
            && self.stats.is_none()
    }

    /// Merges this partial into a snapshot, writing only its owned fields
    pub fn apply(&self, snapshot: &mut MarketSnapshot) {
        if let Some(v) = self.floor_price {
            snapshot.floor_price = v;
        }
        if let Some(url) = &self.floor_image_url {
            snapshot.floor_image_url = url.clone();
        }
        if let Some(url) = &self.floor_item_url {
            snapshot.floor_item_url = url.clone();
        }
        for (tier, floor) in &self.tier_floors {
            snapshot.tier_floors.insert(tier.clone(), *floor);
        }
        if let Some(stats) = &self.stats {
            snapshot.stats = stats.clone();
        }
    }
}

/// Kind of a market activity event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Sale,
    Listing,
    Transfer,
}

/// A recent sale/listing event, normalized for display
///
/// Created fresh on each activity poll and never mutated; the whole list is
/// replaced per poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    /// Unique within a fetch batch; not guaranteed globally unique
    pub id: String,
    pub kind: EventKind,
    /// Display name of the asset involved
    pub asset_name: String,
    /// Sale/listing price (native asset), absent when the event carries no
    /// payment (never zero: zero would misrepresent a transfer as a free
    /// sale)
    pub price: Option<f64>,
    /// Locale-formatted `HH:MM` display time
    pub occurred_at: String,
    /// Marketplace URL of the asset
    pub link_url: String,
    pub image_url: Option<String>,
}
