pub mod analytics;
pub mod holding;
pub mod refresh;
pub mod settings;
pub mod state;
