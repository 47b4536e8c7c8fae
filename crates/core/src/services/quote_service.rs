use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{QuoteError, QuoteResult};
use crate::providers::traits::QuoteProvider;

/// Fetches quotes from the configured provider with a bounded wait per call.
///
/// A provider that hangs would otherwise leave the store stuck in `Loading`,
/// so every call is wrapped in a timeout that surfaces as `QuoteError::Network`.
#[derive(Clone)]
pub struct QuoteService {
    provider: Arc<dyn QuoteProvider>,
    timeout: Duration,
}

impl QuoteService {
    pub fn new(provider: Arc<dyn QuoteProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the current price of `symbol`.
    ///
    /// Validates that a successful price is finite and positive; anything else from
    /// the provider is downgraded to `NoData`.
    pub async fn fetch(&self, symbol: &str) -> QuoteResult {
        let result = match tokio::time::timeout(self.timeout, self.provider.fetch_quote(symbol)).await
        {
            Ok(result) => result,
            Err(_) => Err(QuoteError::Network(format!(
                "quote request for {symbol} timed out after {}ms",
                self.timeout.as_millis()
            ))),
        };

        match result {
            Ok(price) if price.is_finite() && price > 0.0 => {
                debug!("{} quoted {symbol} at {price}", self.provider.name());
                Ok(price)
            }
            Ok(price) => {
                warn!(
                    "{} returned unusable price for {symbol}: {price}",
                    self.provider.name()
                );
                Err(QuoteError::NoData(symbol.to_string()))
            }
            Err(e) => {
                warn!("{} quote for {symbol} failed: {e}", self.provider.name());
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for QuoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteService")
            .field("provider", &self.provider.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}
