//! `Tripsmith` - trip planning orchestrator
//!
//! Queries weather, destination insights and booking providers concurrently,
//! merges whatever arrives before the deadline into one plan and optionally
//! asks a language model for a narrative itinerary.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod synthesis;
pub mod web;

// Re-export core types for public API
pub use cache::{CachePolicy, TripCache};
pub use config::TripConfig;
pub use error::{FieldViolation, TripError};
pub use models::{Source, SourceStatus, TripPlan, TripRequest};
pub use orchestrator::{OrchestratorPolicy, PlanOptions, RetryPolicy, TripOrchestrator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
