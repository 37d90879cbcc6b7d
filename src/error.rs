//! Error types for the market snapshot SDK

use thiserror::Error;

/// Errors that can occur when fetching from an external market API
///
/// These never escape a fetcher's public surface: every fetcher catches its
/// own errors and degrades the affected fields to their previous or default
/// values. The type exists so the internal request plumbing can use `?` and
/// log a precise cause.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Invalid response from the source
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Source API error (non-2xx status)
    #[error("API error: {0}")]
    ApiError(String),
}

/// Errors that can occur reading or writing the snapshot cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Cache file could not be read or written
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache entry could not be (de)serialized
    #[error("Cache serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Cache entry was written by a different snapshot schema version
    #[error("Cache schema version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: String, expected: String },
}
