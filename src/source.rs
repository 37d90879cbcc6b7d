//! Source abstractions over the concrete fetchers
//!
//! The aggregator depends on these traits rather than on the HTTP fetchers
//! directly, so tests can drive it with fixed or failing sources.

use crate::error::FetchError;
use crate::types::{CollectionUpdate, MarketEvent, PriceUpdate};
use async_trait::async_trait;

/// Produces the price-owned partial of the snapshot
///
/// Implementations never fail: a source that cannot reach its API returns an
/// empty partial and the previous values survive the merge.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self) -> PriceUpdate;

    /// Name used in logs and metrics
    fn source_name(&self) -> &'static str;
}

/// Produces the collection-owned partial of the snapshot
#[async_trait]
pub trait CollectionSource: Send + Sync {
    async fn fetch(&self) -> CollectionUpdate;

    fn source_name(&self) -> &'static str;
}

/// Produces the recent-activity batch
#[async_trait]
pub trait ActivitySource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<MarketEvent>, FetchError>;

    fn source_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Price source returning a fixed partial (or an empty one)
    pub struct MockPriceSource {
        pub update: PriceUpdate,
        pub calls: AtomicUsize,
    }

    impl MockPriceSource {
        pub fn new(update: PriceUpdate) -> Self {
            Self {
                update,
                calls: AtomicUsize::new(0),
            }
        }

        /// Simulates every sub-request failing
        pub fn failing() -> Self {
            Self::new(PriceUpdate::default())
        }
    }

    #[async_trait]
    impl PriceSource for MockPriceSource {
        async fn fetch(&self) -> PriceUpdate {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.update.clone()
        }

        fn source_name(&self) -> &'static str {
            "mock-price"
        }
    }

    /// Collection source returning a fixed partial (or an empty one)
    pub struct MockCollectionSource {
        pub update: CollectionUpdate,
    }

    impl MockCollectionSource {
        pub fn new(update: CollectionUpdate) -> Self {
            Self { update }
        }

        pub fn failing() -> Self {
            Self::new(CollectionUpdate::default())
        }
    }

    #[async_trait]
    impl CollectionSource for MockCollectionSource {
        async fn fetch(&self) -> CollectionUpdate {
            self.update.clone()
        }

        fn source_name(&self) -> &'static str {
            "mock-collection"
        }
    }

    /// Activity source returning a fixed batch or a transport error
    pub struct MockActivitySource {
        pub result: Result<Vec<MarketEvent>, String>,
    }

    #[async_trait]
    impl ActivitySource for MockActivitySource {
        async fn fetch(&self) -> Result<Vec<MarketEvent>, FetchError> {
            self.result
                .clone()
                .map_err(FetchError::ApiError)
        }

        fn source_name(&self) -> &'static str {
            "mock-activity"
        }
    }
}
