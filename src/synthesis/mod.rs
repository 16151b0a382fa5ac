//! Narrative synthesis: turns merged trip data into a readable plan
//!
//! Best-effort. The orchestrator drops the narrative when synthesis fails and keeps
//! everything else.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::{
    BookingOptions, CostEstimate, DestinationFacts, InsightsResult, SynthesisFailure, TripRequest,
    WeatherResult,
};

pub mod openai;

pub use openai::OpenAiSynthesizer;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("synthesis timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation failed: {0}")]
    GenerationError(String),
}

impl SynthesisError {
    #[must_use]
    pub fn failure(&self) -> SynthesisFailure {
        match self {
            SynthesisError::Timeout(_) => SynthesisFailure::Timeout,
            SynthesisError::GenerationError(_) => SynthesisFailure::GenerationError,
        }
    }
}

/// Merged structured data handed to the synthesizer. Sources that failed are `None`.
#[derive(Debug, Clone, Serialize)]
pub struct TripBrief {
    pub request: TripRequest,
    pub weather: Option<WeatherResult>,
    pub insights: Option<InsightsResult>,
    pub booking: Option<BookingOptions>,
    pub estimated_cost: Option<CostEstimate>,
}

#[async_trait]
pub trait NarrativeSynthesizer: Send + Sync {
    async fn synthesize(&self, brief: &TripBrief) -> Result<String, SynthesisError>;
}

pub(crate) const SYSTEM_PROMPT: &str = "You are an expert travel advisor with deep knowledge of \
global destinations, weather patterns, local customs and travel logistics. Create a personalized \
travel plan from the trip details and the data provided. Only rely on the data given; when a \
section says it is not available, give general advice instead of inventing specifics.";

const PLAN_SECTIONS: [&str; 10] = [
    "Weather considerations for the travel dates",
    "Recommended activities and attractions",
    "Suggested accommodation areas",
    "Local transportation options",
    "Cultural tips and local customs",
    "Food recommendations",
    "Packing suggestions based on the weather",
    "Budget breakdown estimate",
    "Safety considerations",
    "Hidden gems and local favorites",
];

const NOT_AVAILABLE: &str = "Not available";

impl TripBrief {
    /// User prompt for a chat-style model
    #[must_use]
    pub fn to_prompt(&self) -> String {
        let r = &self.request;
        let mut lines = vec![
            "Create a detailed travel plan for:".to_string(),
            format!("- Destination: {}", r.destination.trim()),
            format!("- Departure from: {}", r.departure.trim()),
            format!("- Travel dates: {} to {}", r.start_date, r.end_date),
            format!("- Budget: {:.2}", r.budget),
            format!("- Travel type: {}", r.travel_type),
            format!("- Party size: {}", r.party_size),
            format!(
                "- Special requirements: {}",
                r.special_requirements.as_deref().unwrap_or("None")
            ),
        ];

        lines.push("\nWeather forecast:".to_string());
        match &self.weather {
            Some(weather) if !weather.days.is_empty() => {
                lines.extend(weather.days.iter().map(|day| {
                    format!(
                        "- {}: {}, {:.0}-{:.0}°C, {}% chance of rain",
                        day.date,
                        day.condition,
                        day.temperature_min_c,
                        day.temperature_max_c,
                        day.precipitation_probability
                    )
                }));
                let missing = weather.missing_days(r.start_date, r.end_date).len();
                if missing > 0 {
                    lines.push(format!("- No forecast yet for the remaining {missing} day(s)"));
                }
            }
            _ => lines.push(NOT_AVAILABLE.to_string()),
        }

        lines.push("\nLocal insights:".to_string());
        match &self.insights {
            Some(insights) => {
                lines.push(insights.summary.trim().to_string());
                lines.extend(insights.attractions.iter().map(|a| {
                    format!("- Attraction: {} ({}, rated {:.1})", a.name, a.category, a.rating)
                }));
                lines.extend(insights.restaurants.iter().map(|restaurant| {
                    format!(
                        "- Restaurant: {} ({}, {})",
                        restaurant.name, restaurant.cuisine, restaurant.price_tier
                    )
                }));
                lines.extend(fact_lines(&insights.facts));
            }
            None => lines.push(NOT_AVAILABLE.to_string()),
        }

        lines.push("\nBooking options:".to_string());
        match &self.booking {
            Some(booking) => {
                lines.extend(booking.flights.iter().map(|f| {
                    format!(
                        "- Flight {} {}: {:.2} per person, departs {}, arrives {}",
                        f.carrier, f.flight_number, f.price, f.departure_time, f.arrival_time
                    )
                }));
                lines.extend(booking.hotels.iter().map(|h| {
                    format!(
                        "- Hotel {}: {:.2} per night, rated {:.1}",
                        h.name, h.nightly_price, h.rating
                    )
                }));
                if booking.is_empty() {
                    lines.push("No offers found".to_string());
                }
            }
            None => lines.push(NOT_AVAILABLE.to_string()),
        }
        if let Some(cost) = &self.estimated_cost {
            lines.push(format!(
                "Estimated cost with the cheapest offers: {:.2} ({} budget)",
                cost.total,
                if cost.within_budget(r.budget) { "within" } else { "over" }
            ));
        }

        lines.push("\nPlease provide:".to_string());
        lines.extend(
            PLAN_SECTIONS
                .iter()
                .enumerate()
                .map(|(i, section)| format!("{}. {section}", i + 1)),
        );
        lines.push("\nFormat the response as a comprehensive travel guide.".to_string());
        lines.join("\n")
    }
}

/// One prompt line per destination fact the insights backend supplied
fn fact_lines(facts: &DestinationFacts) -> Vec<String> {
    let mut lines = Vec::new();
    let labelled = [
        ("Currency", &facts.currency),
        ("Language", &facts.language),
        ("Best time to visit", &facts.best_time_to_visit),
        ("Cost level", &facts.cost_level),
    ];
    for (label, value) in labelled {
        if let Some(value) = value {
            lines.push(format!("- {label}: {value}"));
        }
    }
    if let Some(rating) = facts.safety_rating {
        lines.push(format!("- Safety rating: {rating:.1}/10"));
    }
    if !facts.local_transport.is_empty() {
        lines.push(format!("- Local transport: {}", facts.local_transport.join(", ")));
    }
    if !facts.cultural_tips.is_empty() {
        lines.push(format!("- Cultural tips: {}", facts.cultural_tips.join("; ")));
    }
    lines
}
