//! Configuration for the market snapshot SDK
//!
//! Every fetcher takes its configuration explicitly at construction instead
//! of reading module-level globals, so tests can point them at fixed
//! endpoints. API credentials and base URLs are supplied by the embedding
//! application; this crate defines no environment-variable contract.

use crate::constants::{ACTIVITY_REFRESH_INTERVAL_SECS, MARKET_REFRESH_INTERVAL_SECS};
use crate::types::MarketSnapshot;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration for a [`crate::tracker::MarketTracker`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// DEX aggregator price source
    pub dex: DexConfig,
    /// NFT marketplace source
    pub marketplace: MarketplaceConfig,
    /// Where the last good snapshot is persisted
    pub cache_path: PathBuf,
    /// Market (prices + floors) refresh cadence, seconds
    #[serde(default = "default_market_interval")]
    pub market_refresh_interval_secs: u64,
    /// Activity feed refresh cadence, seconds
    #[serde(default = "default_activity_interval")]
    pub activity_refresh_interval_secs: u64,
}

fn default_market_interval() -> u64 {
    MARKET_REFRESH_INTERVAL_SECS
}

fn default_activity_interval() -> u64 {
    ACTIVITY_REFRESH_INTERVAL_SECS
}

impl MarketConfig {
    pub fn market_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.market_refresh_interval_secs)
    }

    pub fn activity_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.activity_refresh_interval_secs)
    }

    /// Builds the fully-populated snapshot the tracker starts from before
    /// any network round-trip (and before the cache, if any, is applied)
    pub fn initial_snapshot(&self) -> MarketSnapshot {
        let mut snapshot = MarketSnapshot {
            floor_image_url: self.marketplace.default_image_url.clone(),
            floor_item_url: self.marketplace.collection_url.clone(),
            ..MarketSnapshot::default()
        };
        for tier in &self.marketplace.tiers {
            snapshot
                .tier_floors
                .insert(tier.name.clone(), tier.default_floor);
        }
        snapshot
    }
}

/// DEX aggregator price source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexConfig {
    /// API base URL, e.g. `https://api.dexscreener.com`
    pub api_url: String,
    /// Chain identifier used in pair lookups, e.g. `ethereum`
    pub chain: String,
    /// Pair address of the base asset / stablecoin pool
    pub base_pair_address: String,
    /// Contract address of the tracked token
    pub token_address: String,
    /// Expected ticker of the tracked token, used to validate the first-pair
    /// fallback when no pair matches by address
    pub token_ticker: String,
    /// Optional historical market-chart endpoint returning
    /// `{"prices": [[timestamp_ms, price], ...]}` for a trailing window
    pub history_url: Option<String>,
}

/// NFT marketplace source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    /// API base URL, e.g. `https://api.opensea.io/api/v2`
    pub api_url: String,
    /// API key sent as the `x-api-key` header when present
    pub api_key: Option<String>,
    /// Chain identifier used in item lookups
    pub chain: String,
    /// Collection slug for stats/listings/events queries
    pub collection_slug: String,
    /// Collection contract address, used for direct item lookups
    pub contract_address: String,
    /// Collection page URL; the floor item link falls back to this
    pub collection_url: String,
    /// Image shown when no listing image can be resolved
    pub default_image_url: String,
    /// Trait-based tiers with their own floor queries
    pub tiers: Vec<TierSpec>,
}

/// A named trait-based subset of the collection with its own floor price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSpec {
    pub name: String,
    pub filter: TraitFilter,
    /// Floor used before the first successful fetch
    pub default_floor: f64,
}

/// Trait filter applied to a listings query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitFilter {
    /// Numeric-range filter keyed by trait name
    Range {
        trait_name: String,
        min: f64,
        max: f64,
    },
    /// Exact string-match filter keyed by trait name
    Exact { trait_name: String, value: String },
}

impl TraitFilter {
    /// Renders the filter as listings-search query parameters
    pub fn query_params(&self) -> Vec<(String, String)> {
        match self {
            TraitFilter::Range {
                trait_name,
                min,
                max,
            } => vec![
                (format!("float_traits[{trait_name}][min]"), min.to_string()),
                (format!("float_traits[{trait_name}][max]"), max.to_string()),
            ],
            TraitFilter::Exact { trait_name, value } => {
                vec![(format!("traits[{trait_name}]"), value.clone())]
            }
        }
    }
}
