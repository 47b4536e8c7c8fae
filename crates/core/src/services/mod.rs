pub mod analytics_service;
pub mod holding_service;
pub mod quote_service;
pub mod refresh_service;
