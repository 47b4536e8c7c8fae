use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::traits::QuoteProvider;
use crate::errors::{QuoteError, QuoteResult};
use crate::models::settings::Settings;

const PROVIDER_NAME: &str = "Alpha Vantage";

/// Alpha Vantage `GLOBAL_QUOTE` client for stock prices.
///
/// - **Free tier**: ~5 requests/minute, 25/day. Throttled responses come back as
///   HTTP 200 with a "Note" or "Information" field instead of a quote.
/// - **Requires**: API key (from `Settings`).
/// - **Unknown symbols**: either an "Error Message" field or an empty "Global Quote".
pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(settings: &Settings) -> Self {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client, settings)
    }

    /// Use a preconfigured HTTP client (proxy, TLS or timeout policy owned by the app).
    pub fn with_client(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
        }
    }
}

impl std::fmt::Debug for AlphaVantageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaVantageClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

// ── Alpha Vantage API response types ────────────────────────────────

#[derive(Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<Value>,
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Classify a raw `GLOBAL_QUOTE` body.
///
/// Order matters: throttling markers win over error markers, which win over the
/// price field. A missing or unusable price is `NoData`, never `InvalidSymbol`.
pub fn classify_global_quote(symbol: &str, body: &str) -> QuoteResult {
    let resp: GlobalQuoteResponse = serde_json::from_str(body).map_err(|e| {
        QuoteError::Network(format!("Malformed quote response for {symbol}: {e}"))
    })?;

    if let Some(msg) = non_empty(&resp.note).or_else(|| non_empty(&resp.information)) {
        warn!("{PROVIDER_NAME} throttled quote for {symbol}: {msg}");
        return Err(QuoteError::RateLimited {
            provider: PROVIDER_NAME.to_string(),
        });
    }

    if let Some(msg) = non_empty(&resp.error_message) {
        debug!("{PROVIDER_NAME} rejected {symbol}: {msg}");
        return Err(QuoteError::InvalidSymbol(symbol.to_string()));
    }

    resp.global_quote
        .and_then(|q| q.price)
        .as_ref()
        .and_then(parse_price)
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| QuoteError::NoData(symbol.to_string()))
}

#[async_trait]
impl QuoteProvider for AlphaVantageClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_quote(&self, symbol: &str) -> QuoteResult {
        debug!("Fetching {PROVIDER_NAME} quote for {symbol}");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(QuoteError::RateLimited {
                provider: PROVIDER_NAME.to_string(),
            });
        }
        if !status.is_success() {
            return Err(QuoteError::Network(format!(
                "{PROVIDER_NAME} returned HTTP {status} for {symbol}"
            )));
        }

        let body = response.text().await?;
        classify_global_quote(symbol, &body)
    }
}
