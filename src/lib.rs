pub mod ai;
pub mod api;
pub mod cluster;
pub mod core;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod metrics;
pub mod orchestrator;
pub mod rate_limit;
pub mod scrape;
pub mod seeds;
pub mod store;
pub mod textkit;

pub use core::app_state::AppState;
pub use core::types;
pub use error::{AppError, AppResult};
