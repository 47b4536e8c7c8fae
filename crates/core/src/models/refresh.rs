use uuid::Uuid;

use crate::errors::QuoteError;

/// One holding that kept its previous price because its quote failed.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshFailure {
    pub holding_id: Uuid,
    pub symbol: String,
    pub error: QuoteError,
}

/// What a refresh run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    /// Holdings in the snapshot
    pub total: usize,

    /// Holdings quoted before the run ended (equals `total` unless aborted)
    pub processed: usize,

    /// Holdings whose price was replaced
    pub updated: usize,

    /// Holdings whose quote failed, in snapshot order
    pub failures: Vec<RefreshFailure>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.processed == self.total && self.failures.is_empty()
    }

    /// Symbols that kept a stale price, for display.
    pub fn failed_symbols(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.symbol.as_str()).collect()
    }
}
