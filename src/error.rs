//! Error types and handling for `Tripsmith`

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Source;

/// A single request field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Main error type for trip planning
#[derive(Error, Debug)]
pub enum TripError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The trip request was malformed; carries every violated field
    #[error("Invalid request: {}", join_violations(.violations))]
    InvalidRequest { violations: Vec<FieldViolation> },

    /// Strict-deadline mode only: the global deadline passed with calls outstanding
    #[error("Orchestration timed out after {deadline:?} waiting on {}", join_sources(.pending))]
    OrchestrationTimeout {
        deadline: Duration,
        pending: Vec<Source>,
    },

    /// The caller withdrew before the plan was assembled
    #[error("Trip planning was cancelled")]
    Cancelled,
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_sources(sources: &[Source]) -> String {
    sources
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl TripError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new invalid-request error from collected violations
    #[must_use]
    pub fn invalid_request(violations: Vec<FieldViolation>) -> Self {
        Self::InvalidRequest { violations }
    }

    /// Violations carried by an `InvalidRequest`, empty otherwise
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            TripError::InvalidRequest { violations } => violations,
            _ => &[],
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TripError::Config { .. } => {
                "Configuration error. Please check your config file and provider URLs.".to_string()
            }
            TripError::InvalidRequest { violations } => {
                let lines: Vec<String> = violations.iter().map(|v| format!("  - {v}")).collect();
                format!("The trip request is invalid:\n{}", lines.join("\n"))
            }
            TripError::OrchestrationTimeout { pending, .. } => format!(
                "Planning did not finish in time. Still waiting on: {}",
                join_sources(pending)
            ),
            TripError::Cancelled => "Trip planning was cancelled.".to_string(),
        }
    }
}
