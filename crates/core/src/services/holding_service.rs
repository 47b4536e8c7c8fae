use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::{CoreError, HoldingField};
use crate::models::holding::{AddHoldingRequest, Holding};

/// Validation and bookkeeping for the holdings list.
///
/// Pure business logic, no I/O, no API calls. Easy to test.
pub struct HoldingService;

impl HoldingService {
    pub fn new() -> Self {
        Self
    }

    /// Trim and uppercase a ticker.
    pub fn normalize_symbol(raw: &str) -> String {
        raw.trim().to_uppercase()
    }

    /// Validate a request from the UI and return it with the symbol normalized.
    ///
    /// Rules:
    /// - Symbol must be non-empty after trimming
    /// - Quantity must be finite and positive
    /// - Purchase price must be finite and positive
    pub fn validate_request(
        &self,
        request: &AddHoldingRequest,
    ) -> Result<AddHoldingRequest, CoreError> {
        let symbol = Self::normalize_symbol(&request.symbol);
        if symbol.is_empty() {
            return Err(CoreError::validation(
                HoldingField::Symbol,
                "stock symbol must not be empty",
            ));
        }

        if !request.quantity.is_finite() || request.quantity <= 0.0 {
            return Err(CoreError::validation(
                HoldingField::Quantity,
                format!("must be a positive number, got {}", request.quantity),
            ));
        }

        if !request.purchase_price.is_finite() || request.purchase_price <= 0.0 {
            return Err(CoreError::validation(
                HoldingField::PurchasePrice,
                format!("must be a positive number, got {}", request.purchase_price),
            ));
        }

        Ok(AddHoldingRequest {
            symbol,
            quantity: request.quantity,
            purchase_price: request.purchase_price,
        })
    }

    /// Build a new holding from a validated request and its first quote.
    pub fn create_holding(&self, request: AddHoldingRequest, price: f64) -> Holding {
        Holding::new(
            request.symbol,
            request.quantity,
            request.purchase_price,
            Some(price),
        )
    }

    /// Insert at the front: the list is kept newest-first.
    pub fn prepend(&self, holdings: &mut Vec<Holding>, holding: Holding) {
        holdings.insert(0, holding);
    }

    /// Copy refreshed prices onto the current holdings, matching by id.
    ///
    /// Holdings without a refreshed counterpart are left untouched, refreshed entries
    /// whose holding no longer exists are ignored. Length and order never change.
    /// Returns how many holdings were touched.
    pub fn merge_refreshed(&self, holdings: &mut [Holding], refreshed: &[Holding]) -> usize {
        let prices: HashMap<Uuid, Option<f64>> = refreshed
            .iter()
            .map(|h| (h.id, h.current_price))
            .collect();

        let mut merged = 0;
        for holding in holdings.iter_mut() {
            if let Some(price) = prices.get(&holding.id) {
                holding.current_price = *price;
                merged += 1;
            }
        }
        merged
    }

    /// Remove a holding by id.
    pub fn remove(&self, holdings: &mut Vec<Holding>, id: Uuid) -> Result<Holding, CoreError> {
        let idx = holdings
            .iter()
            .position(|h| h.id == id)
            .ok_or(CoreError::HoldingNotFound(id))?;
        Ok(holdings.remove(idx))
    }
}

impl Default for HoldingService {
    fn default() -> Self {
        Self::new()
    }
}
