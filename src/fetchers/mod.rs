//! Fetchers for the external market data sources

use crate::constants::{REQUEST_TIMEOUT_SECS, USER_AGENT};
use crate::error::FetchError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub mod activity;
pub mod collection;
pub mod image;
pub mod price;

pub use activity::ActivityFetcher;
pub use collection::CollectionFetcher;
pub use image::ImageResolver;
pub use price::PriceFetcher;

/// Builds the HTTP client shared by a fetcher's requests
pub(crate) fn build_client() -> Result<Client, FetchError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(FetchError::NetworkError)?;
    Ok(client)
}

/// Issues a GET and decodes the JSON body
///
/// The marketplace key, when configured, travels as the `x-api-key` header.
/// HTTP 429 is distinguished from other non-2xx statuses so rate limiting
/// shows up as its own cause in the logs.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(String, String)],
    api_key: Option<&str>,
) -> Result<T, FetchError> {
    let mut request = client.get(url).header("accept", "application/json");
    if !query.is_empty() {
        request = request.query(query);
    }
    if let Some(key) = api_key {
        request = request.header("x-api-key", key);
    }

    let response = request.send().await.map_err(FetchError::NetworkError)?;

    if response.status().as_u16() == 429 {
        return Err(FetchError::RateLimitExceeded);
    }
    if !response.status().is_success() {
        return Err(FetchError::ApiError(format!(
            "HTTP {}: {}",
            response.status(),
            response.text().await.unwrap_or_default()
        )));
    }

    let response_text = response.text().await.map_err(FetchError::NetworkError)?;
    serde_json::from_str(&response_text).map_err(|e| {
        FetchError::InvalidResponse(format!("Failed to parse response: {e}"))
    })
}
