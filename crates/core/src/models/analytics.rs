use serde::{Deserialize, Serialize};

/// Aggregate figures over the whole portfolio.
///
/// Market value and profit/loss only cover holdings with a usable price;
/// `priced_count` says how many that is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Total number of holdings (lots)
    pub holding_count: usize,

    /// Holdings that currently have a usable quote
    pub priced_count: usize,

    /// Sum of quantity × purchase price over all holdings
    pub total_cost_basis: f64,

    /// Sum of quantity × current price over priced holdings
    pub total_market_value: f64,

    /// Sum of per-holding profit/loss
    pub total_profit_loss: f64,

    /// total_profit_loss >= 0
    pub is_profit: bool,
}
