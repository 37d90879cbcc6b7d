//! Constants for the market snapshot SDK
//!
//! Static fallback values and polling cadence are centralized here. Endpoint
//! addresses, collection identity and tier definitions are runtime concerns
//! and live in [`crate::config`] instead.

/// How often to refresh the market snapshot (prices + floors), in seconds
pub const MARKET_REFRESH_INTERVAL_SECS: u64 = 60;

/// How often to refresh the activity feed, in seconds
pub const ACTIVITY_REFRESH_INTERVAL_SECS: u64 = 10;

/// HTTP request timeout when fetching from any source (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "market-snapshot-sdk/0.1.0";

/// Static fallback for the base asset price (USD)
pub const DEFAULT_BASE_PRICE_USD: f64 = 2400.0;

/// Static fallback for the tracked token price (USD)
pub const DEFAULT_TOKEN_PRICE_USD: f64 = 0.892;

/// Static fallback for the token 24h change (percent)
pub const DEFAULT_TOKEN_CHANGE_24H_PCT: f64 = 0.0;

/// Static fallback for the collection-wide floor price (native asset)
pub const DEFAULT_FLOOR_PRICE: f64 = 0.142;

/// Number of points in a synthesized price history series
pub const SYNTHETIC_HISTORY_POINTS: usize = 7;

/// Maximum number of activity events kept per poll
pub const ACTIVITY_EVENT_LIMIT: usize = 5;

/// Base-unit decimals assumed when the API omits the `decimals` field
pub const DEFAULT_BASE_UNIT_DECIMALS: u32 = 18;

/// Schema version key for the persisted snapshot cache
///
/// Bump this whenever the snapshot field layout changes so a stale cache
/// entry is discarded instead of partially trusted.
pub const SNAPSHOT_SCHEMA_VERSION: &str = "market_snapshot_v2";
