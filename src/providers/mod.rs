//! Provider clients: typed bridges to the weather, insights and booking backends
//!
//! Clients never retry. Retry and deadline policy belong to the orchestrator.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    BookingOptions, BookingQuery, FailureReason, InsightsQuery, InsightsResult, WeatherQuery,
    WeatherResult,
};

pub mod booking;
pub mod insights;
pub mod tool;
pub mod weather;

pub use booking::HttpBookingProvider;
pub use insights::HttpInsightsProvider;
pub use tool::ToolClient;
pub use weather::HttpWeatherProvider;

/// Failure of a single provider call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with data that failed validation
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Timeouts and outages may clear up; bad data will not
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Timeout(_) | ProviderError::Unavailable(_))
    }

    #[must_use]
    pub fn reason(&self) -> FailureReason {
        match self {
            ProviderError::Timeout(_) => FailureReason::Timeout,
            ProviderError::Unavailable(_) => FailureReason::Unavailable,
            ProviderError::InvalidResponse(_) => FailureReason::InvalidResponse,
        }
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch(&self, query: &WeatherQuery) -> ProviderResult<WeatherResult>;

    async fn health_check(&self) -> bool {
        true
    }
}

#[async_trait]
pub trait InsightsProvider: Send + Sync {
    async fn fetch(&self, query: &InsightsQuery) -> ProviderResult<InsightsResult>;

    async fn health_check(&self) -> bool {
        true
    }
}

#[async_trait]
pub trait BookingProvider: Send + Sync {
    async fn fetch(&self, query: &BookingQuery) -> ProviderResult<BookingOptions>;

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_errors_retry() {
        assert!(ProviderError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(ProviderError::Unavailable("503".to_string()).is_retryable());
        assert!(!ProviderError::InvalidResponse("missing field".to_string()).is_retryable());
    }

    #[test]
    fn test_reason_mapping() {
        assert_eq!(
            ProviderError::Timeout(Duration::from_secs(1)).reason(),
            FailureReason::Timeout
        );
        assert_eq!(
            ProviderError::InvalidResponse(String::new()).reason(),
            FailureReason::InvalidResponse
        );
    }
}
