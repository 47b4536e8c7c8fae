use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Outcome of a single quote lookup: a finite, positive price or a classified failure.
pub type QuoteResult = Result<f64, QuoteError>;

/// Classified failure of a single quote lookup.
///
/// The `Display` text of each variant is the message shown to the user, so it is
/// phrased as advice rather than as a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// The provider is throttling us ("Note" / "Information" payloads, HTTP 429).
    #[error("API limit hit ({provider}). Wait 30-60 seconds and try again.")]
    RateLimited { provider: String },

    /// The provider explicitly says the ticker does not exist.
    #[error("Invalid stock symbol: {0}")]
    InvalidSymbol(String),

    /// No usable price came back. Usually transient, not proof of a bad symbol.
    #[error(
        "No price returned for {0}. This is usually an API rate limit or a provider gap, \
         not necessarily an invalid symbol. Try again in 30-60s."
    )]
    NoData(String),

    /// Transport failure, HTTP error, timeout or unparseable body.
    #[error("Failed to fetch current price. Try again. ({0})")]
    Network(String),
}

impl QuoteError {
    /// True for failures that are worth retrying later without user changes.
    pub fn is_transient(&self) -> bool {
        !matches!(self, QuoteError::InvalidSymbol(_))
    }
}

impl From<reqwest::Error> for QuoteError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors embed the full request URL, api key included.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        if e.is_timeout() {
            QuoteError::Network(format!("request timed out: {sanitized}"))
        } else {
            QuoteError::Network(sanitized)
        }
    }
}

/// The input field a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoldingField {
    Symbol,
    Quantity,
    PurchasePrice,
}

impl fmt::Display for HoldingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoldingField::Symbol => write!(f, "symbol"),
            HoldingField::Quantity => write!(f, "quantity"),
            HoldingField::PurchasePrice => write!(f, "purchase price"),
        }
    }
}

/// Unified error type for the stock-tracker-core library.
/// Every public store operation returns `Result<T, CoreError>`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    // ── Input ───────────────────────────────────────────────────────
    #[error("Invalid {field}: {message}")]
    Validation {
        field: HoldingField,
        message: String,
    },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    // ── Quote service ───────────────────────────────────────────────
    #[error(transparent)]
    Quote(#[from] QuoteError),

    // ── Store ───────────────────────────────────────────────────────
    #[error("Another operation is already in progress. Wait for it to finish.")]
    Busy,

    #[error("Refresh cancelled after {processed} of {total} holdings.")]
    RefreshCancelled { processed: usize, total: usize },

    #[error("Failed to refresh prices: {0}")]
    RefreshFailed(String),

    #[error("Portfolio was cleared while the operation was in progress.")]
    Cleared,

    #[error("Holding not found: {0}")]
    HoldingNotFound(Uuid),
}

impl CoreError {
    pub(crate) fn validation(field: HoldingField, message: impl Into<String>) -> Self {
        CoreError::Validation {
            field,
            message: message.into(),
        }
    }

    /// The offending field, for validation failures.
    pub fn field(&self) -> Option<HoldingField> {
        match self {
            CoreError::Validation { field, .. } => Some(*field),
            _ => None,
        }
    }
}
