//! Marketplace activity fetcher
//!
//! Pulls recent sale/listing events for the collection and normalizes them
//! into a bounded, display-ready batch. Events keep the API's order; no
//! independent sorting.

use crate::config::MarketplaceConfig;
use crate::constants::{ACTIVITY_EVENT_LIMIT, DEFAULT_BASE_UNIT_DECIMALS};
use crate::error::FetchError;
use crate::fetchers::{build_client, get_json};
use crate::source::ActivitySource;
use crate::types::{EventKind, MarketEvent};
use crate::units::base_units_to_decimal;
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    asset_events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: Option<String>,
    event_type: Option<String>,
    nft: Option<EventNft>,
    payment: Option<Payment>,
    /// Settlement timestamp, present on sales
    closing_date: Option<EventTime>,
    /// Creation timestamp
    event_timestamp: Option<EventTime>,
}

/// Event timestamp as delivered by the feed: unix seconds or an ISO-8601
/// string, depending on the event type
///
/// An unrecognizable string parses into the `Text` variant and resolves to no
/// timestamp, so one odd field never fails the whole batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EventTime {
    Seconds(i64),
    Text(String),
}

impl EventTime {
    fn unix_seconds(&self) -> Option<i64> {
        match self {
            EventTime::Seconds(s) => Some(*s),
            EventTime::Text(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.timestamp())
                .ok()
                .or_else(|| {
                    // The marketplace also emits offset-less timestamps; they
                    // are UTC
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                        .ok()
                        .map(|dt| dt.and_utc().timestamp())
                }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventNft {
    name: Option<String>,
    opensea_url: Option<String>,
    display_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Payment {
    quantity: Option<String>,
    decimals: Option<u32>,
}

/// Fetches recent collection events from the marketplace API
pub struct ActivityFetcher {
    client: Client,
    config: MarketplaceConfig,
}

impl ActivityFetcher {
    pub fn new(config: MarketplaceConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client()?,
            config,
        })
    }
}

#[async_trait]
impl ActivitySource for ActivityFetcher {
    async fn fetch(&self) -> Result<Vec<MarketEvent>, FetchError> {
        let url = format!(
            "{}/events/collection/{}",
            self.config.api_url, self.config.collection_slug
        );
        let query = vec![
            ("event_type".to_string(), "sale".to_string()),
            ("event_type".to_string(), "listing".to_string()),
            ("limit".to_string(), "20".to_string()),
        ];
        let response: EventsResponse =
            get_json(&self.client, &url, &query, self.config.api_key.as_deref()).await?;
        Ok(map_events(response, &self.config.collection_url))
    }

    fn source_name(&self) -> &'static str {
        "activity"
    }
}

/// Maps raw events to display events, bounded to the first
/// [`ACTIVITY_EVENT_LIMIT`] in API order
fn map_events(response: EventsResponse, fallback_url: &str) -> Vec<MarketEvent> {
    response
        .asset_events
        .into_iter()
        .take(ACTIVITY_EVENT_LIMIT)
        .map(|ev| {
            let nft = ev.nft.as_ref();
            MarketEvent {
                id: ev
                    .id
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
                kind: event_kind(ev.event_type.as_deref()),
                asset_name: nft
                    .and_then(|n| n.name.clone())
                    .unwrap_or_else(|| "Unknown item".to_string()),
                price: ev.payment.as_ref().and_then(payment_price),
                occurred_at: display_time(
                    ev.closing_date
                        .as_ref()
                        .and_then(EventTime::unix_seconds)
                        .or_else(|| ev.event_timestamp.as_ref().and_then(EventTime::unix_seconds)),
                ),
                link_url: nft
                    .and_then(|n| n.opensea_url.clone())
                    .unwrap_or_else(|| fallback_url.to_string()),
                image_url: nft.and_then(|n| n.display_image_url.clone()),
            }
        })
        .collect()
}

fn event_kind(event_type: Option<&str>) -> EventKind {
    match event_type {
        Some("sale") | Some("item_sold") => EventKind::Sale,
        Some("transfer") => EventKind::Transfer,
        _ => EventKind::Listing,
    }
}

/// An event with no payment quantity has no price; it is never coerced to
/// zero, which would misrepresent a transfer as a free sale
fn payment_price(payment: &Payment) -> Option<f64> {
    let quantity = payment.quantity.as_deref()?;
    base_units_to_decimal(
        quantity,
        payment.decimals.unwrap_or(DEFAULT_BASE_UNIT_DECIMALS),
    )
}

/// Formats a unix timestamp to local `HH:MM`
fn display_time(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ts| Local.timestamp_opt(ts, 0).single())
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}
