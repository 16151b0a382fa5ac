use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::{BookingProvider, ProviderError, ProviderResult, ToolClient};
use crate::config::ProviderEndpoint;
use crate::models::{BookingOptions, BookingQuery, FlightOffer, HotelOffer};

const FLIGHTS_TOOL: &str = "search_flights";
const HOTELS_TOOL: &str = "search_hotels";

/// Flight and hotel search backend. Both searches run concurrently and either failing
/// fails the whole capability.
pub struct HttpBookingProvider {
    tool: ToolClient,
}

#[derive(Debug, Deserialize)]
struct FlightSearch {
    #[serde(default)]
    flights: Vec<FlightEntry>,
}

#[derive(Debug, Deserialize)]
struct FlightEntry {
    airline: String,
    flight_number: String,
    price: f64,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct HotelSearch {
    #[serde(default)]
    hotels: Vec<HotelEntry>,
}

#[derive(Debug, Deserialize)]
struct HotelEntry {
    name: String,
    price_per_night: f64,
    rating: f32,
}

impl From<FlightEntry> for FlightOffer {
    fn from(entry: FlightEntry) -> Self {
        Self {
            carrier: entry.airline,
            flight_number: entry.flight_number,
            price: entry.price,
            departure_time: entry.departure_time,
            arrival_time: entry.arrival_time,
        }
    }
}

impl From<HotelEntry> for HotelOffer {
    fn from(entry: HotelEntry) -> Self {
        Self {
            name: entry.name,
            nightly_price: entry.price_per_night,
            rating: entry.rating,
        }
    }
}

impl HttpBookingProvider {
    pub fn new(endpoint: &ProviderEndpoint) -> anyhow::Result<Self> {
        Ok(Self {
            tool: ToolClient::new("booking", endpoint)?,
        })
    }
}

#[async_trait]
impl BookingProvider for HttpBookingProvider {
    async fn fetch(&self, query: &BookingQuery) -> ProviderResult<BookingOptions> {
        let flights = self.tool.call::<FlightSearch>(
            FLIGHTS_TOOL,
            json!({
                "origin": query.origin,
                "destination": query.destination,
                "departure_date": query.departure_date,
                "return_date": query.return_date,
                "passengers": query.passengers,
            }),
        );
        let hotels = self.tool.call::<HotelSearch>(
            HOTELS_TOOL,
            json!({
                "destination": query.destination,
                "check_in": query.departure_date,
                "check_out": query.return_date,
                "guests": query.passengers,
            }),
        );
        let (flights, hotels) = futures::try_join!(flights, hotels)?;

        let options = BookingOptions {
            flights: flights.flights.into_iter().map(FlightOffer::from).collect(),
            hotels: hotels.hotels.into_iter().map(HotelOffer::from).collect(),
        };
        options.validate().map_err(ProviderError::InvalidResponse)?;
        Ok(options)
    }

    async fn health_check(&self) -> bool {
        self.tool.health().await
    }
}
