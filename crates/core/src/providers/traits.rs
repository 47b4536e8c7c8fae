use async_trait::async_trait;

use crate::errors::QuoteResult;

/// Trait abstraction for the external quote service.
///
/// The store and the refresh pipeline only see this trait, so the HTTP client can be
/// swapped for another provider, or for a scripted one in tests.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch the current price of `symbol`.
    ///
    /// Exactly one outbound request per call, no caching. `symbol` is already
    /// normalized by the caller.
    async fn fetch_quote(&self, symbol: &str) -> QuoteResult;
}
