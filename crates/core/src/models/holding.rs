use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single tracked stock position (one lot).
///
/// Only `current_price` ever changes after creation. The same symbol may appear in
/// several holdings; each lot is independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Unique identifier
    pub id: Uuid,

    /// Ticker symbol, trimmed and uppercased (e.g., "AAPL")
    pub symbol: String,

    /// Number of shares (always positive)
    pub quantity: f64,

    /// Cost basis per share (always positive)
    pub purchase_price: f64,

    /// Last successfully quoted market price, if any
    pub current_price: Option<f64>,

    /// When the holding was recorded
    pub added_at: DateTime<Utc>,
}

impl Holding {
    /// Build a holding from already-validated parts.
    /// Callers go through `HoldingService::create_holding`, which enforces the invariants.
    pub(crate) fn new(
        symbol: String,
        quantity: f64,
        purchase_price: f64,
        current_price: Option<f64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol,
            quantity,
            purchase_price,
            current_price,
            added_at: Utc::now(),
        }
    }

    /// The current price, only if it is a usable quote.
    pub fn price(&self) -> Option<f64> {
        self.current_price.filter(|p| p.is_finite() && *p > 0.0)
    }

    pub fn has_price(&self) -> bool {
        self.price().is_some()
    }

    /// Unrealized gain/loss: `(current - purchase) * quantity`, or 0 without a price.
    pub fn profit_loss(&self) -> f64 {
        match self.price() {
            Some(current) => (current - self.purchase_price) * self.quantity,
            None => 0.0,
        }
    }

    pub fn is_profit(&self) -> bool {
        self.profit_loss() >= 0.0
    }

    /// Total amount paid for this lot.
    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.purchase_price
    }

    /// Value of this lot at the current price.
    pub fn market_value(&self) -> Option<f64> {
        self.price().map(|p| p * self.quantity)
    }
}

/// A request to start tracking a new holding, as submitted by the UI.
///
/// Nothing here is trusted; the store re-validates every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddHoldingRequest {
    pub symbol: String,
    pub quantity: f64,
    pub purchase_price: f64,
}

impl AddHoldingRequest {
    pub fn new(symbol: impl Into<String>, quantity: f64, purchase_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            purchase_price,
        }
    }
}
