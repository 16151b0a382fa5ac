//! Scripted providers and fixtures shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use tripsmith::models::{
    Attraction, BookingOptions, BookingQuery, DailyForecast, DestinationFacts, FlightOffer,
    HotelOffer, InsightsQuery, InsightsResult, PriceTier, Restaurant, TravelType, TripRequest,
    WeatherQuery, WeatherResult,
};
use tripsmith::providers::{
    BookingProvider, InsightsProvider, ProviderError, ProviderResult, WeatherProvider,
};
use tripsmith::synthesis::{NarrativeSynthesizer, SynthesisError, TripBrief};
use tripsmith::{OrchestratorPolicy, TripOrchestrator};

/// One scripted provider response
#[derive(Clone)]
pub struct Step<T> {
    pub delay: Duration,
    pub result: ProviderResult<T>,
}

pub fn ok<T>(value: T) -> Step<T> {
    Step {
        delay: Duration::from_millis(100),
        result: Ok(value),
    }
}

pub fn ok_after<T>(delay: Duration, value: T) -> Step<T> {
    Step {
        delay,
        result: Ok(value),
    }
}

pub fn fail<T>(error: ProviderError) -> Step<T> {
    Step {
        delay: Duration::from_millis(50),
        result: Err(error),
    }
}

/// Never answers within any sane timeout
pub fn hang<T>() -> Step<T> {
    Step {
        delay: Duration::from_secs(3600),
        result: Err(ProviderError::Unavailable("hung".to_string())),
    }
}

/// Plays its steps in order, repeating the last one forever
pub struct Scripted<T> {
    steps: Mutex<VecDeque<Step<T>>>,
    calls: AtomicUsize,
    healthy: bool,
}

impl<T: Clone> Scripted<T> {
    pub fn new(steps: Vec<Step<T>>) -> Arc<Self> {
        assert!(!steps.is_empty(), "a script needs at least one step");
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
            healthy: true,
        })
    }

    pub fn always(step: Step<T>) -> Arc<Self> {
        Self::new(vec![step])
    }

    pub fn unhealthy(step: Step<T>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(VecDeque::from([step])),
            calls: AtomicUsize::new(0),
            healthy: false,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn play(&self) -> ProviderResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = {
            let mut steps = self.steps.lock().unwrap();
            if steps.len() > 1 {
                steps.pop_front().unwrap()
            } else {
                steps.front().cloned().unwrap()
            }
        };
        tokio::time::sleep(step.delay).await;
        step.result
    }
}

#[async_trait]
impl WeatherProvider for Scripted<WeatherResult> {
    async fn fetch(&self, _query: &WeatherQuery) -> ProviderResult<WeatherResult> {
        self.play().await
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

#[async_trait]
impl InsightsProvider for Scripted<InsightsResult> {
    async fn fetch(&self, _query: &InsightsQuery) -> ProviderResult<InsightsResult> {
        self.play().await
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

#[async_trait]
impl BookingProvider for Scripted<BookingOptions> {
    async fn fetch(&self, _query: &BookingQuery) -> ProviderResult<BookingOptions> {
        self.play().await
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

pub enum Narration {
    Write(String),
    Fail(String),
    Hang,
}

pub struct ScriptedSynthesizer {
    narration: Narration,
    calls: AtomicUsize,
}

impl ScriptedSynthesizer {
    pub fn new(narration: Narration) -> Arc<Self> {
        Arc::new(Self {
            narration,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NarrativeSynthesizer for ScriptedSynthesizer {
    async fn synthesize(&self, brief: &TripBrief) -> Result<String, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.narration {
            Narration::Write(text) => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok(format!("{text} ({})", brief.request.destination))
            }
            Narration::Fail(message) => Err(SynthesisError::GenerationError(message.clone())),
            Narration::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }
    }
}

/// Handles on the scripted providers behind an orchestrator
pub struct Harness {
    pub weather: Arc<Scripted<WeatherResult>>,
    pub insights: Arc<Scripted<InsightsResult>>,
    pub booking: Arc<Scripted<BookingOptions>>,
}

impl Harness {
    pub fn new(
        weather: Step<WeatherResult>,
        insights: Step<InsightsResult>,
        booking: Step<BookingOptions>,
    ) -> Self {
        Self {
            weather: Scripted::always(weather),
            insights: Scripted::always(insights),
            booking: Scripted::always(booking),
        }
    }

    pub fn healthy() -> Self {
        Self::new(ok(weather_result()), ok(insights_result()), ok(booking_options()))
    }

    pub fn orchestrator(&self, policy: OrchestratorPolicy) -> TripOrchestrator {
        TripOrchestrator::new(
            self.weather.clone(),
            self.insights.clone(),
            self.booking.clone(),
            policy,
        )
    }

    pub fn total_calls(&self) -> usize {
        self.weather.calls() + self.insights.calls() + self.booking.calls()
    }
}

pub fn paris_request() -> TripRequest {
    TripRequest {
        destination: "Paris".to_string(),
        departure: "New York".to_string(),
        start_date: date(2026, 6, 15),
        end_date: date(2026, 6, 22),
        budget: 2000.0,
        travel_type: TravelType::Leisure,
        party_size: 2,
        special_requirements: None,
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn weather_result() -> WeatherResult {
    WeatherResult {
        location: "Paris, FR".to_string(),
        days: (15..=22)
            .map(|day| DailyForecast {
                date: date(2026, 6, day),
                temperature_min_c: 14.0,
                temperature_max_c: 24.5,
                precipitation_probability: 20,
                condition: "Partly cloudy".to_string(),
            })
            .collect(),
    }
}

pub fn insights_result() -> InsightsResult {
    InsightsResult {
        summary: "Paris in June: long evenings, busy museums, terraces everywhere.".to_string(),
        attractions: vec![
            Attraction {
                name: "Musée d'Orsay".to_string(),
                category: "museum".to_string(),
                rating: 4.8,
            },
            Attraction {
                name: "Canal Saint-Martin".to_string(),
                category: "walk".to_string(),
                rating: 4.4,
            },
        ],
        restaurants: vec![Restaurant {
            name: "Le Petit Bistrot".to_string(),
            cuisine: "French".to_string(),
            price_tier: PriceTier::Moderate,
        }],
        facts: DestinationFacts {
            currency: Some("EUR".to_string()),
            language: Some("French".to_string()),
            best_time_to_visit: Some("April-June, September-October".to_string()),
            safety_rating: Some(8.5),
            cost_level: Some("High".to_string()),
            local_transport: vec!["Metro".to_string(), "Vélib bikes".to_string()],
            cultural_tips: vec!["Greet shopkeepers with bonjour".to_string()],
        },
    }
}

pub fn booking_options() -> BookingOptions {
    BookingOptions {
        flights: vec![
            FlightOffer {
                carrier: "Air France".to_string(),
                flight_number: "AF007".to_string(),
                price: 650.0,
                departure_time: Utc.with_ymd_and_hms(2026, 6, 15, 22, 0, 0).unwrap(),
                arrival_time: Utc.with_ymd_and_hms(2026, 6, 16, 11, 30, 0).unwrap(),
            },
            FlightOffer {
                carrier: "Delta".to_string(),
                flight_number: "DL264".to_string(),
                price: 580.0,
                departure_time: Utc.with_ymd_and_hms(2026, 6, 15, 18, 0, 0).unwrap(),
                arrival_time: Utc.with_ymd_and_hms(2026, 6, 16, 7, 45, 0).unwrap(),
            },
        ],
        hotels: vec![HotelOffer {
            name: "Hôtel du Marais".to_string(),
            nightly_price: 180.0,
            rating: 4.2,
        }],
    }
}
