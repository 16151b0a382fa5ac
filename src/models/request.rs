//! Trip request model, validation and fingerprinting

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{FieldViolation, TripError};

/// Largest party the planner accepts
pub const MAX_PARTY_SIZE: u32 = 20;

/// Longest trip, in days, the planner accepts
pub const MAX_TRIP_DAYS: i64 = 365;

/// Kind of trip being planned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelType {
    #[default]
    Leisure,
    Business,
    Adventure,
    Family,
    Other,
}

impl TravelType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelType::Leisure => "leisure",
            TravelType::Business => "business",
            TravelType::Adventure => "adventure",
            TravelType::Family => "family",
            TravelType::Other => "other",
        }
    }
}

impl fmt::Display for TravelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "leisure" => Ok(TravelType::Leisure),
            "business" => Ok(TravelType::Business),
            "adventure" => Ok(TravelType::Adventure),
            "family" => Ok(TravelType::Family),
            "other" => Ok(TravelType::Other),
            other => Err(format!(
                "unknown travel type '{other}', expected one of: leisure, business, adventure, family, other"
            )),
        }
    }
}

fn default_party_size() -> u32 {
    1
}

/// A request to plan one trip. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub destination: String,
    /// Where the travellers depart from
    pub departure: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Total budget, currency implicit
    pub budget: f64,
    #[serde(default)]
    pub travel_type: TravelType,
    #[serde(default = "default_party_size")]
    pub party_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requirements: Option<String>,
}

impl TripRequest {
    /// Check every field and report all violations at once
    pub fn validate(&self) -> crate::Result<()> {
        let mut violations = Vec::new();

        if self.destination.trim().is_empty() {
            violations.push(FieldViolation::new("destination", "must not be blank"));
        }
        if self.departure.trim().is_empty() {
            violations.push(FieldViolation::new("departure", "must not be blank"));
        }

        if self.end_date < self.start_date {
            violations.push(FieldViolation::new(
                "end_date",
                format!(
                    "must not be before start_date ({} < {})",
                    self.end_date, self.start_date
                ),
            ));
        } else if self.trip_days() > MAX_TRIP_DAYS {
            violations.push(FieldViolation::new(
                "end_date",
                format!("trip cannot be longer than {MAX_TRIP_DAYS} days"),
            ));
        }

        if !self.budget.is_finite() || self.budget <= 0.0 {
            violations.push(FieldViolation::new("budget", "must be a positive amount"));
        }

        if self.party_size == 0 {
            violations.push(FieldViolation::new("party_size", "must be at least 1"));
        } else if self.party_size > MAX_PARTY_SIZE {
            violations.push(FieldViolation::new(
                "party_size",
                format!("cannot exceed {MAX_PARTY_SIZE} travellers"),
            ));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(TripError::invalid_request(violations))
        }
    }

    /// Days between start and end; zero for a same-day trip
    #[must_use]
    pub fn trip_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Hotel nights covered by the trip
    #[must_use]
    pub fn nights(&self) -> u32 {
        u32::try_from(self.trip_days().max(0)).unwrap_or(0)
    }

    /// Normalized key identifying requests that produce the same provider data
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint(format!(
            "{}|{}|{}|{}|{}|{}",
            normalize(&self.destination),
            normalize(&self.departure),
            self.start_date,
            self.end_date,
            self.party_size,
            self.travel_type
        ))
    }
}

fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Cache and deduplication key derived from a [`TripRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Narrow the key with option-dependent detail. An empty scope keeps the key as is.
    #[must_use]
    pub fn scoped(&self, scope: &str) -> Fingerprint {
        if scope.is_empty() {
            self.clone()
        } else {
            Fingerprint(format!("{}#{}", self.0, scope))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
