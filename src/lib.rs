pub mod aggregator;
pub mod config;
pub mod counter;
pub mod fetcher;
pub mod models;
pub mod orchestrator;
pub mod plugins;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use orchestrator::{Orchestrator, RunOutcome, RunState};
pub use utils::error::AppError;
