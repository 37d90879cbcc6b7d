//! Marketplace collection stats fetcher
//!
//! Issues parallel, independently-optional requests for aggregate collection
//! stats, the lowest-priced active listing, and one trait-filtered listing
//! query per configured tier. Any request that fails leaves its fields at
//! their previous values.

use crate::config::MarketplaceConfig;
use crate::constants::DEFAULT_BASE_UNIT_DECIMALS;
use crate::error::FetchError;
use crate::extract::first_non_empty;
use crate::fetchers::image::ImageResolver;
use crate::fetchers::{build_client, get_json};
use crate::source::CollectionSource;
use crate::types::{CollectionStats, CollectionUpdate};
use crate::units::base_units_to_decimal;
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Collection metadata response; only the display fields are read
#[derive(Debug, Deserialize)]
struct MetadataResponse {
    image_url: Option<String>,
}

/// Collection stats response; the aggregate numbers sit under `total`
#[derive(Debug, Deserialize)]
struct StatsResponse {
    total: Option<StatsTotal>,
}

#[derive(Debug, Default, Deserialize)]
struct StatsTotal {
    floor_price: Option<f64>,
    volume: Option<f64>,
    sales: Option<u64>,
    num_owners: Option<u64>,
    average_price: Option<f64>,
}

/// Listings search response
#[derive(Debug, Deserialize)]
pub struct ListingsResponse {
    #[serde(default)]
    pub listings: Vec<Listing>,
}

/// An active listing as returned by the listings search
///
/// The marketplace inconsistently omits sub-objects depending on query
/// parameters, so everything below the price is optional.
#[derive(Debug, Deserialize)]
pub struct Listing {
    pub price: Option<ListingPrice>,
    pub item: Option<ListingItem>,
    pub protocol_data: Option<ProtocolData>,
}

#[derive(Debug, Deserialize)]
pub struct ListingPrice {
    pub current: Option<CurrentPrice>,
}

/// Price in integer base units with its decimals
#[derive(Debug, Deserialize)]
pub struct CurrentPrice {
    pub value: Option<String>,
    pub decimals: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ListingItem {
    pub metadata: Option<ItemImages>,
    pub nft: Option<ItemImages>,
}

/// Image fields carried by both the `metadata` and `nft` sub-objects
#[derive(Debug, Default, Deserialize)]
pub struct ItemImages {
    pub image_preview_url: Option<String>,
    pub image_thumbnail_url: Option<String>,
    pub image_url: Option<String>,
    pub opensea_url: Option<String>,
}

/// Seaport-style on-chain offer structure carried by a listing
#[derive(Debug, Deserialize)]
pub struct ProtocolData {
    pub parameters: Option<ProtocolParameters>,
}

#[derive(Debug, Deserialize)]
pub struct ProtocolParameters {
    #[serde(default)]
    pub offer: Vec<OfferItem>,
}

#[derive(Debug, Deserialize)]
pub struct OfferItem {
    #[serde(rename = "identifierOrCriteria")]
    pub identifier_or_criteria: Option<String>,
    pub token: Option<String>,
}

/// Converts a listing's base-unit price to a decimal price
pub(crate) fn listing_price(listing: &Listing) -> Option<f64> {
    let current = listing.price.as_ref()?.current.as_ref()?;
    let value = current.value.as_deref()?;
    base_units_to_decimal(value, current.decimals.unwrap_or(DEFAULT_BASE_UNIT_DECIMALS))
}

/// Maps a tier listing query outcome to its merge semantics
///
/// A successful query with no listings is an explicit `0.0` (the tier has no
/// trait-filtered floor right now; the presentation layer applies its
/// proportional-scale fallback). It is never substituted with the
/// collection-wide floor here. A failed query or an unparsable price yields
/// `None` so the previous value survives.
fn tier_floor(result: Result<ListingsResponse, FetchError>, tier: &str) -> Option<f64> {
    match result {
        Ok(response) => match response.listings.first() {
            Some(listing) => {
                let price = listing_price(listing);
                if price.is_none() {
                    tracing::warn!(tier, "Tier floor listing had no parsable price");
                }
                price
            }
            None => Some(0.0),
        },
        Err(e) => {
            tracing::warn!(tier, error = %e, "Tier floor query failed, keeping previous value");
            None
        }
    }
}

/// Maps a collection metadata query outcome to its fallback image
///
/// The collection-wide image sits between a resolved floor-item image and the
/// configured static default: used whenever no item-specific image could be
/// resolved, skipped when the metadata request fails or carries no image.
fn metadata_image(result: Result<MetadataResponse, FetchError>) -> Option<String> {
    match result {
        Ok(metadata) => first_non_empty([metadata.image_url.as_deref()]),
        Err(e) => {
            tracing::warn!(error = %e, "Collection metadata fetch failed, keeping previous image");
            None
        }
    }
}

/// Fetches collection statistics and floor prices from the marketplace API
pub struct CollectionFetcher {
    client: Client,
    config: MarketplaceConfig,
    resolver: ImageResolver,
}

impl CollectionFetcher {
    pub fn new(config: MarketplaceConfig) -> Result<Self, FetchError> {
        let resolver = ImageResolver::new(config.clone())?;
        Ok(Self {
            client: build_client()?,
            config,
            resolver,
        })
    }

    fn api_key(&self) -> Option<&str> {
        self.config.api_key.as_deref()
    }

    async fn fetch_metadata(&self) -> Result<MetadataResponse, FetchError> {
        let url = format!(
            "{}/collections/{}",
            self.config.api_url, self.config.collection_slug
        );
        get_json(&self.client, &url, &[], self.api_key()).await
    }

    async fn fetch_stats(&self) -> Result<StatsTotal, FetchError> {
        let url = format!(
            "{}/collections/{}/stats",
            self.config.api_url, self.config.collection_slug
        );
        let response: StatsResponse = get_json(&self.client, &url, &[], self.api_key()).await?;
        Ok(response.total.unwrap_or_default())
    }

    async fn fetch_listings(
        &self,
        extra_query: Vec<(String, String)>,
    ) -> Result<ListingsResponse, FetchError> {
        let url = format!(
            "{}/listings/collection/{}/all",
            self.config.api_url, self.config.collection_slug
        );
        let mut query = vec![
            ("limit".to_string(), "1".to_string()),
            ("sort_by".to_string(), "price".to_string()),
        ];
        query.extend(extra_query);
        get_json(&self.client, &url, &query, self.api_key()).await
    }
}

#[async_trait]
impl CollectionSource for CollectionFetcher {
    async fn fetch(&self) -> CollectionUpdate {
        let tier_queries = join_all(
            self.config
                .tiers
                .iter()
                .map(|tier| self.fetch_listings(tier.filter.query_params())),
        );
        let (metadata, stats, floor, tiers) = tokio::join!(
            self.fetch_metadata(),
            self.fetch_stats(),
            self.fetch_listings(Vec::new()),
            tier_queries,
        );

        let mut update = CollectionUpdate::default();
        let collection_image = metadata_image(metadata);

        let stats_floor = match stats {
            Ok(total) => {
                update.stats = Some(CollectionStats {
                    total_volume: total.volume.unwrap_or(0.0),
                    total_sales: total.sales.unwrap_or(0),
                    total_owners: total.num_owners.unwrap_or(0),
                    average_price: total.average_price.unwrap_or(0.0),
                });
                total.floor_price
            }
            Err(e) => {
                tracing::warn!(error = %e, "Collection stats fetch failed, keeping previous values");
                None
            }
        };

        match floor {
            Ok(response) => {
                if let Some(listing) = response.listings.first() {
                    update.floor_price = listing_price(listing).or(stats_floor);
                    update.floor_image_url =
                        self.resolver.resolve(listing).await.or(collection_image);
                    update.floor_item_url = floor_item_url(listing);
                } else {
                    // No active listings; the stats floor is the only signal
                    update.floor_price = stats_floor;
                    update.floor_image_url = collection_image;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Floor listing fetch failed, keeping previous value");
                update.floor_price = stats_floor;
                update.floor_image_url = collection_image;
            }
        }

        let mut tier_floors = BTreeMap::new();
        for (tier, result) in self.config.tiers.iter().zip(tiers) {
            if let Some(price) = tier_floor(result, &tier.name) {
                tier_floors.insert(tier.name.clone(), price);
            }
        }
        update.tier_floors = tier_floors;

        update
    }

    fn source_name(&self) -> &'static str {
        "collection"
    }
}

/// Marketplace page URL of the listed item, when the payload carries one
fn floor_item_url(listing: &Listing) -> Option<String> {
    let item = listing.item.as_ref()?;
    first_non_empty([
        item.metadata.as_ref().and_then(|m| m.opensea_url.as_deref()),
        item.nft.as_ref().and_then(|n| n.opensea_url.as_deref()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing_json(json: &str) -> Listing {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_stats_under_total() {
        let response: StatsResponse = serde_json::from_str(
            r#"{"total":{"floor_price":0.142,"volume":1234.5,"sales":678,"num_owners":90,"average_price":0.18}}"#,
        )
        .unwrap();
        let total = response.total.unwrap();
        assert_eq!(total.floor_price, Some(0.142));
        assert_eq!(total.sales, Some(678));
        assert_eq!(total.num_owners, Some(90));
    }

    #[test]
    fn listing_price_divides_by_decimals() {
        let listing = listing_json(
            r#"{"price":{"current":{"value":"142000000000000000","decimals":18}}}"#,
        );
        assert_eq!(listing_price(&listing), Some(0.142));
    }

    #[test]
    fn listing_price_defaults_to_eighteen_decimals() {
        let listing =
            listing_json(r#"{"price":{"current":{"value":"1000000000000000000"}}}"#);
        assert_eq!(listing_price(&listing), Some(1.0));
    }

    #[test]
    fn listing_price_none_when_value_missing() {
        let listing = listing_json(r#"{"price":{"current":{"decimals":18}}}"#);
        assert_eq!(listing_price(&listing), None);
    }

    #[test]
    fn tier_floor_zero_results_is_explicit_zero() {
        let response: ListingsResponse = serde_json::from_str(r#"{"listings":[]}"#).unwrap();
        assert_eq!(tier_floor(Ok(response), "Void"), Some(0.0));
    }

    #[test]
    fn tier_floor_failed_query_keeps_previous() {
        let result: Result<ListingsResponse, FetchError> =
            Err(FetchError::ApiError("HTTP 500".to_string()));
        assert_eq!(tier_floor(result, "Void"), None);
    }

    #[test]
    fn tier_floor_uses_listing_price() {
        let response: ListingsResponse = serde_json::from_str(
            r#"{"listings":[{"price":{"current":{"value":"1650000000000000000","decimals":18}}}]}"#,
        )
        .unwrap();
        assert_eq!(tier_floor(Ok(response), "Void"), Some(1.65));
    }

    #[test]
    fn metadata_image_reads_the_collection_image() {
        let response: MetadataResponse =
            serde_json::from_str(r#"{"image_url":"https://img.example/collection.png"}"#).unwrap();
        assert_eq!(
            metadata_image(Ok(response)),
            Some("https://img.example/collection.png".to_string())
        );
    }

    #[test]
    fn metadata_image_skips_missing_or_failed() {
        let empty: MetadataResponse = serde_json::from_str(r#"{"image_url":""}"#).unwrap();
        assert_eq!(metadata_image(Ok(empty)), None);

        let absent: MetadataResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(metadata_image(Ok(absent)), None);

        let failed: Result<MetadataResponse, FetchError> =
            Err(FetchError::ApiError("HTTP 500".to_string()));
        assert_eq!(metadata_image(failed), None);
    }

    #[test]
    fn floor_item_url_prefers_metadata() {
        let listing = listing_json(
            r#"{"item":{"metadata":{"opensea_url":"https://market.example/item/1"},"nft":{"opensea_url":"https://market.example/item/2"}}}"#,
        );
        assert_eq!(
            floor_item_url(&listing),
            Some("https://market.example/item/1".to_string())
        );
    }
}
