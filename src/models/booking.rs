//! Flight and hotel offers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    pub carrier: String,
    pub flight_number: String,
    /// Price per traveller
    pub price: f64,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelOffer {
    pub name: String,
    /// Price of one room per night
    pub nightly_price: f64,
    /// 0.0 - 5.0
    pub rating: f32,
}

/// Offers in provider order. Either list may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingOptions {
    pub flights: Vec<FlightOffer>,
    pub hotels: Vec<HotelOffer>,
}

impl BookingOptions {
    #[must_use]
    pub fn cheapest_flight(&self) -> Option<&FlightOffer> {
        self.flights
            .iter()
            .min_by(|a, b| a.price.total_cmp(&b.price))
    }

    #[must_use]
    pub fn cheapest_hotel(&self) -> Option<&HotelOffer> {
        self.hotels
            .iter()
            .min_by(|a, b| a.nightly_price.total_cmp(&b.nightly_price))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flights.is_empty() && self.hotels.is_empty()
    }

    pub fn validate(&self) -> Result<(), String> {
        for flight in &self.flights {
            if !flight.price.is_finite() || flight.price < 0.0 {
                return Err(format!(
                    "flight {} has invalid price {}",
                    flight.flight_number, flight.price
                ));
            }
            if flight.arrival_time <= flight.departure_time {
                return Err(format!(
                    "flight {} arrives before it departs",
                    flight.flight_number
                ));
            }
        }
        for hotel in &self.hotels {
            if !hotel.nightly_price.is_finite() || hotel.nightly_price < 0.0 {
                return Err(format!(
                    "hotel '{}' has invalid nightly price {}",
                    hotel.name, hotel.nightly_price
                ));
            }
            if !(0.0..=5.0).contains(&hotel.rating) {
                return Err(format!(
                    "hotel '{}' has rating {} outside 0-5",
                    hotel.name, hotel.rating
                ));
            }
        }
        Ok(())
    }
}
