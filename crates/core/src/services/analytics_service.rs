use crate::models::analytics::PortfolioSummary;
use crate::models::holding::Holding;

/// Computes portfolio-wide totals from the holdings list.
///
/// Holdings without a usable price contribute their cost basis but no market value
/// and no profit/loss.
pub struct AnalyticsService;

impl AnalyticsService {
    pub fn new() -> Self {
        Self
    }

    pub fn summarize(&self, holdings: &[Holding]) -> PortfolioSummary {
        let mut summary = PortfolioSummary {
            holding_count: holdings.len(),
            ..PortfolioSummary::default()
        };

        for holding in holdings {
            summary.total_cost_basis += holding.cost_basis();
            if let Some(value) = holding.market_value() {
                summary.priced_count += 1;
                summary.total_market_value += value;
                summary.total_profit_loss += holding.profit_loss();
            }
        }

        summary.is_profit = summary.total_profit_loss >= 0.0;
        summary
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}
