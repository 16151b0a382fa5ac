//! The assembled trip plan and its per-source bookkeeping

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookingOptions, Fingerprint, InsightsResult, WeatherResult};

/// One of the three data providers a plan draws on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Weather,
    Insights,
    Booking,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Weather, Source::Insights, Source::Booking];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Weather => "weather",
            Source::Insights => "insights",
            Source::Booking => "booking",
        }
    }

    #[must_use]
    pub fn emoji(&self) -> &'static str {
        match self {
            Source::Weather => "🌤️",
            Source::Insights => "🗺️",
            Source::Booking => "✈️",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weather" => Ok(Source::Weather),
            "insights" => Ok(Source::Insights),
            "booking" => Ok(Source::Booking),
            other => Err(format!(
                "unknown source '{other}', expected weather, insights or booking"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Timeout,
    Unavailable,
    InvalidResponse,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Timeout => write!(f, "timeout"),
            FailureReason::Unavailable => write!(f, "unavailable"),
            FailureReason::InvalidResponse => write!(f, "invalid response"),
        }
    }
}

/// How one provider fared for this plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Ok {
        attempts: u32,
        elapsed_ms: u64,
    },
    Failed {
        reason: FailureReason,
        message: String,
        attempts: u32,
    },
    /// Excluded by the caller; never dispatched
    Skipped,
}

impl SourceStatus {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, SourceStatus::Ok { .. })
    }

    #[must_use]
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            SourceStatus::Failed { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            SourceStatus::Ok { attempts, .. } | SourceStatus::Failed { attempts, .. } => *attempts,
            SourceStatus::Skipped => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisFailure {
    Timeout,
    GenerationError,
}

/// What happened to the narrative step
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SynthesisStatus {
    #[default]
    NotRequested,
    Ok {
        elapsed_ms: u64,
    },
    Failed {
        reason: SynthesisFailure,
        message: String,
    },
    /// Requested but not attempted
    Skipped {
        reason: String,
    },
}

/// Rough trip cost from the cheapest offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Cheapest flight price times party size
    pub flights_total: Option<f64>,
    /// Cheapest hotel nightly price times nights
    pub lodging_total: Option<f64>,
    pub total: f64,
}

impl CostEstimate {
    /// `None` when there is nothing to price
    #[must_use]
    pub fn from_booking(booking: &BookingOptions, party_size: u32, nights: u32) -> Option<Self> {
        let flights_total = booking
            .cheapest_flight()
            .map(|f| f.price * f64::from(party_size));
        let lodging_total = booking
            .cheapest_hotel()
            .map(|h| h.nightly_price * f64::from(nights));

        if flights_total.is_none() && lodging_total.is_none() {
            return None;
        }

        Some(Self {
            flights_total,
            lodging_total,
            total: flights_total.unwrap_or(0.0) + lodging_total.unwrap_or(0.0),
        })
    }

    #[must_use]
    pub fn within_budget(&self, budget: f64) -> bool {
        self.total <= budget
    }
}

/// Orchestrator output. Built once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPlan {
    pub fingerprint: Fingerprint,
    pub weather: Option<WeatherResult>,
    pub insights: Option<InsightsResult>,
    pub booking: Option<BookingOptions>,
    pub estimated_cost: Option<CostEstimate>,
    pub narrative: Option<String>,
    /// Always holds exactly one entry per [`Source`]
    pub sources: BTreeMap<Source, SourceStatus>,
    pub synthesis: SynthesisStatus,
    pub generated_at: DateTime<Utc>,
}

impl TripPlan {
    /// At least one provider succeeded
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.sources.values().any(SourceStatus::is_ok)
    }

    /// Every provider succeeded
    #[must_use]
    pub fn is_complete(&self) -> bool {
        Source::ALL
            .iter()
            .all(|s| self.sources.get(s).is_some_and(SourceStatus::is_ok))
    }

    #[must_use]
    pub fn status(&self, source: Source) -> Option<&SourceStatus> {
        self.sources.get(&source)
    }

    #[must_use]
    pub fn failed_sources(&self) -> Vec<Source> {
        self.sources
            .iter()
            .filter(|(_, status)| matches!(status, SourceStatus::Failed { .. }))
            .map(|(source, _)| *source)
            .collect()
    }
}

impl fmt::Display for TripPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headline = if self.is_complete() {
            "🟢 Complete plan"
        } else if self.is_usable() {
            "🟡 Partial plan"
        } else {
            "🔴 No provider data available"
        };
        writeln!(f, "{headline}")?;

        for (source, status) in &self.sources {
            match status {
                SourceStatus::Ok { elapsed_ms, .. } => {
                    writeln!(f, "   {} {source}: ok ({elapsed_ms} ms)", source.emoji())?;
                }
                SourceStatus::Failed {
                    reason, attempts, ..
                } => {
                    writeln!(
                        f,
                        "   {} {source}: failed, {reason} after {attempts} attempt(s)",
                        source.emoji()
                    )?;
                }
                SourceStatus::Skipped => writeln!(f, "   {} {source}: skipped", source.emoji())?,
            }
        }

        if let Some(weather) = &self.weather {
            writeln!(f, "\n🌤️ Weather in {}", weather.location)?;
            for day in &weather.days {
                writeln!(
                    f,
                    "   {}  {:.0}°C - {:.0}°C  {:>3}% rain  {}",
                    day.date,
                    day.temperature_min_c,
                    day.temperature_max_c,
                    day.precipitation_probability,
                    day.condition
                )?;
            }
        }

        if let Some(insights) = &self.insights {
            writeln!(f, "\n🗺️ {}", insights.summary)?;
            for attraction in &insights.attractions {
                writeln!(
                    f,
                    "   ⭐ {:.1} {} ({})",
                    attraction.rating, attraction.name, attraction.category
                )?;
            }
            for restaurant in &insights.restaurants {
                writeln!(
                    f,
                    "   🍽️ {} - {} {}",
                    restaurant.name, restaurant.cuisine, restaurant.price_tier
                )?;
            }
            let facts = &insights.facts;
            if let (Some(currency), Some(language)) = (&facts.currency, &facts.language) {
                writeln!(f, "   💱 {currency}, 🗣️ {language}")?;
            }
            if !facts.local_transport.is_empty() {
                writeln!(f, "   🚇 {}", facts.local_transport.join(", "))?;
            }
        }

        if let Some(booking) = &self.booking {
            writeln!(f, "\n✈️ Flights")?;
            if booking.flights.is_empty() {
                writeln!(f, "   none found")?;
            }
            for flight in &booking.flights {
                writeln!(
                    f,
                    "   {} {}  {:.2}  {} -> {}",
                    flight.carrier,
                    flight.flight_number,
                    flight.price,
                    flight.departure_time.format("%Y-%m-%d %H:%M"),
                    flight.arrival_time.format("%Y-%m-%d %H:%M")
                )?;
            }
            writeln!(f, "🏨 Hotels")?;
            if booking.hotels.is_empty() {
                writeln!(f, "   none found")?;
            }
            for hotel in &booking.hotels {
                writeln!(
                    f,
                    "   {} ⭐ {:.1}  {:.2}/night",
                    hotel.name, hotel.rating, hotel.nightly_price
                )?;
            }
        }

        if let Some(cost) = &self.estimated_cost {
            writeln!(f, "\n💰 Estimated cost: {:.2}", cost.total)?;
        }

        if let Some(narrative) = &self.narrative {
            writeln!(f, "\n📝 Itinerary\n{narrative}")?;
        }
        Ok(())
    }
}
