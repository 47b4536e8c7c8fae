use serde::{Deserialize, Serialize};

use super::holding::Holding;

/// Whether an add or refresh is currently in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Idle,
    Loading,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Idle => write!(f, "Idle"),
            Status::Loading => write!(f, "Loading"),
        }
    }
}

/// Everything the UI renders: the holdings plus the global status flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    /// Tracked holdings, newest first
    pub holdings: Vec<Holding>,

    pub status: Status,

    /// Message describing the most recent failure, cleared when a new operation starts
    pub last_error: Option<String>,
}

impl PortfolioState {
    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }
}
