//! Per-capability payloads derived from a [`TripRequest`]

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{TravelType, TripRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherQuery {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightsQuery {
    pub destination: String,
    pub travel_type: TravelType,
    pub party_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
    pub passengers: u32,
}

impl From<&TripRequest> for WeatherQuery {
    fn from(request: &TripRequest) -> Self {
        Self {
            destination: request.destination.trim().to_string(),
            start_date: request.start_date,
            end_date: request.end_date,
        }
    }
}

impl From<&TripRequest> for InsightsQuery {
    fn from(request: &TripRequest) -> Self {
        Self {
            destination: request.destination.trim().to_string(),
            travel_type: request.travel_type,
            party_size: request.party_size,
        }
    }
}

impl From<&TripRequest> for BookingQuery {
    fn from(request: &TripRequest) -> Self {
        Self {
            origin: request.departure.trim().to_string(),
            destination: request.destination.trim().to_string(),
            departure_date: request.start_date,
            return_date: request.end_date,
            passengers: request.party_size,
        }
    }
}
