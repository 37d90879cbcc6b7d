//! Listing image resolution
//!
//! The marketplace's listing payload inconsistently omits image fields
//! depending on query parameters, so the representative image of the floor
//! item is resolved through a cascade: preview, then thumbnail, then
//! original, checked on the listing's `metadata` sub-object before its `nft`
//! sub-object; then one direct item lookup derived from the on-chain offer
//! structure; and finally the caller keeps its configured default. The
//! resolver never fails, it only ever improves on the default.

use crate::config::MarketplaceConfig;
use crate::error::FetchError;
use crate::extract::first_non_empty;
use crate::fetchers::collection::{ItemImages, Listing};
use crate::fetchers::{build_client, get_json};
use reqwest::Client;
use serde::Deserialize;

/// Direct item lookup response
#[derive(Debug, Deserialize)]
struct ItemResponse {
    nft: Option<ItemImages>,
}

/// Resolves a representative image URL for a listing
pub struct ImageResolver {
    client: Client,
    config: MarketplaceConfig,
}

impl ImageResolver {
    pub fn new(config: MarketplaceConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_client()?,
            config,
        })
    }

    /// Resolves an image for the listing, or `None` when nothing better than
    /// the caller's default could be found
    pub async fn resolve(&self, listing: &Listing) -> Option<String> {
        if let Some(url) = listing_image(listing) {
            return Some(url);
        }

        let (contract, token_id) = offer_identity(listing, &self.config.contract_address)?;
        match self.fetch_item(&contract, &token_id).await {
            Ok(response) => first_image(response.nft.as_ref()),
            Err(e) => {
                tracing::warn!(error = %e, token_id, "Direct item lookup failed, keeping default image");
                None
            }
        }
    }

    async fn fetch_item(&self, contract: &str, token_id: &str) -> Result<ItemResponse, FetchError> {
        let url = format!(
            "{}/chain/{}/contract/{}/nfts/{}",
            self.config.api_url, self.config.chain, contract, token_id
        );
        get_json(&self.client, &url, &[], self.config.api_key.as_deref()).await
    }
}

/// Size-priority image extraction across the listing's two sub-objects
fn listing_image(listing: &Listing) -> Option<String> {
    let item = listing.item.as_ref()?;
    let metadata = item.metadata.as_ref();
    let nft = item.nft.as_ref();
    first_non_empty([
        metadata.and_then(|m| m.image_preview_url.as_deref()),
        nft.and_then(|n| n.image_preview_url.as_deref()),
        metadata.and_then(|m| m.image_thumbnail_url.as_deref()),
        nft.and_then(|n| n.image_thumbnail_url.as_deref()),
        metadata.and_then(|m| m.image_url.as_deref()),
        nft.and_then(|n| n.image_url.as_deref()),
    ])
}

/// Same size priority applied to a single image-bearing object
fn first_image(images: Option<&ItemImages>) -> Option<String> {
    let images = images?;
    first_non_empty([
        images.image_preview_url.as_deref(),
        images.image_thumbnail_url.as_deref(),
        images.image_url.as_deref(),
    ])
}

/// Derives (contract, token id) from the listing's on-chain offer structure
///
/// Falls back to the configured contract address when the offer omits the
/// token field, as some payloads do.
fn offer_identity(listing: &Listing, default_contract: &str) -> Option<(String, String)> {
    let offer = listing
        .protocol_data
        .as_ref()?
        .parameters
        .as_ref()?
        .offer
        .first()?;
    let token_id = offer
        .identifier_or_criteria
        .as_deref()
        .filter(|s| !s.is_empty())?
        .to_string();
    let contract = offer
        .token
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(default_contract)
        .to_string();
    Some((contract, token_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(json: &str) -> Listing {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn thumbnail_beats_original_when_preview_missing() {
        let listing = listing(
            r#"{"item":{"metadata":{
                "image_thumbnail_url":"https://img.example/thumb.png",
                "image_url":"https://img.example/full.png"
            }}}"#,
        );
        assert_eq!(
            listing_image(&listing),
            Some("https://img.example/thumb.png".to_string())
        );
    }

    #[test]
    fn preview_wins_over_everything() {
        let listing = listing(
            r#"{"item":{
                "metadata":{"image_url":"https://img.example/meta-full.png"},
                "nft":{"image_preview_url":"https://img.example/nft-preview.png"}
            }}"#,
        );
        assert_eq!(
            listing_image(&listing),
            Some("https://img.example/nft-preview.png".to_string())
        );
    }

    #[test]
    fn metadata_checked_before_nft_at_equal_size() {
        let listing = listing(
            r#"{"item":{
                "metadata":{"image_url":"https://img.example/meta.png"},
                "nft":{"image_url":"https://img.example/nft.png"}
            }}"#,
        );
        assert_eq!(
            listing_image(&listing),
            Some("https://img.example/meta.png".to_string())
        );
    }

    #[test]
    fn no_image_fields_resolves_nothing() {
        let listing = listing(r#"{"item":{"metadata":{},"nft":{}}}"#);
        assert_eq!(listing_image(&listing), None);
    }

    #[test]
    fn offer_identity_reads_seaport_offer() {
        let listing = listing(
            r#"{"protocol_data":{"parameters":{"offer":[
                {"identifierOrCriteria":"99","token":"0x4739"}
            ]}}}"#,
        );
        assert_eq!(
            offer_identity(&listing, "0xdefault"),
            Some(("0x4739".to_string(), "99".to_string()))
        );
    }

    #[test]
    fn offer_identity_falls_back_to_configured_contract() {
        let listing = listing(
            r#"{"protocol_data":{"parameters":{"offer":[
                {"identifierOrCriteria":"42"}
            ]}}}"#,
        );
        assert_eq!(
            offer_identity(&listing, "0xdefault"),
            Some(("0xdefault".to_string(), "42".to_string()))
        );
    }

    #[test]
    fn offer_identity_requires_a_token_id() {
        let listing = listing(r#"{"protocol_data":{"parameters":{"offer":[{"token":"0x4739"}]}}}"#);
        assert_eq!(offer_identity(&listing, "0xdefault"), None);
    }
}
