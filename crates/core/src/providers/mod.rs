pub mod traits;

// Quote provider implementations
pub mod alphavantage;
