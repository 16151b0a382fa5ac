//! Data models for trip planning
//!
//! - Request: the trip request, its validation and fingerprint
//! - Query: per-provider payloads derived from a request
//! - Weather, Insights, Booking: provider results
//! - Plan: the assembled trip plan with per-source status

pub mod booking;
pub mod insights;
pub mod plan;
pub mod query;
pub mod request;
pub mod weather;

pub use booking::{BookingOptions, FlightOffer, HotelOffer};
pub use insights::{Attraction, DestinationFacts, InsightsResult, PriceTier, Restaurant};
pub use plan::{
    CostEstimate, FailureReason, Source, SourceStatus, SynthesisFailure, SynthesisStatus, TripPlan,
};
pub use query::{BookingQuery, InsightsQuery, WeatherQuery};
pub use request::{Fingerprint, MAX_PARTY_SIZE, MAX_TRIP_DAYS, TravelType, TripRequest};
pub use weather::{DailyForecast, WeatherResult};
