//! HTTP providers and the synthesizer against local stub backends

mod common;

use std::time::Duration;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

use common::*;
use tripsmith::config::{ProviderEndpoint, SynthesisConfig};
use tripsmith::models::{BookingQuery, InsightsQuery, PriceTier, WeatherQuery};
use tripsmith::providers::{
    BookingProvider, HttpBookingProvider, HttpInsightsProvider, HttpWeatherProvider,
    InsightsProvider, ProviderError, WeatherProvider,
};
use tripsmith::synthesis::{
    NarrativeSynthesizer, OpenAiSynthesizer, SynthesisError, TripBrief,
};

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn endpoint(base_url: String, timeout_ms: u64) -> ProviderEndpoint {
    ProviderEndpoint {
        base_url,
        timeout_ms,
    }
}

/// Backend answering every tool from one function, with a healthy `/health`
fn tool_backend(answer: fn(&str, &Value) -> Response) -> Router {
    Router::new()
        .route(
            "/call",
            post(move |Json(body): Json<Value>| async move {
                let tool = body["tool"].as_str().unwrap_or_default().to_string();
                answer(&tool, &body["parameters"])
            }),
        )
        .route("/health", get(|| async { "ok" }))
}

fn forecast_days(dates: &[&str]) -> Value {
    dates
        .iter()
        .map(|date| {
            json!({
                "date": date,
                "temperature": {"min": 14.0, "max": 25.0},
                "precipitation_probability": 10,
                "weather": {"main": "Clear", "description": "clear sky"}
            })
        })
        .collect()
}

fn weather_query() -> WeatherQuery {
    WeatherQuery::from(&paris_request())
}

#[tokio::test]
async fn test_weather_provider_decodes_forecast() {
    let base = spawn(tool_backend(|tool, params| {
        assert_eq!(tool, "get_weather_forecast");
        assert_eq!(params["location"], "Paris");
        assert_eq!(params["start_date"], "2026-06-15");
        Json(json!({
            "location": "Paris, FR",
            "forecast": forecast_days(&["2026-06-15", "2026-06-16 12:00:00", "2026-06-17"]),
        }))
        .into_response()
    }))
    .await;

    let provider = HttpWeatherProvider::new(&endpoint(base, 2_000)).unwrap();
    let result = provider.fetch(&weather_query()).await.unwrap();

    assert_eq!(result.location, "Paris, FR");
    assert_eq!(result.days.len(), 3);
    assert_eq!(result.days[1].date, date(2026, 6, 16));
    assert_eq!(result.days[0].condition, "clear sky");
    assert!(result.is_partial(date(2026, 6, 15), date(2026, 6, 22)));
    assert!(provider.health_check().await);
}

#[tokio::test]
async fn test_weather_outside_requested_range_is_invalid() {
    let base = spawn(tool_backend(|_, _| {
        Json(json!({
            "location": "Paris",
            "forecast": forecast_days(&["2026-07-01"]),
        }))
        .into_response()
    }))
    .await;

    let provider = HttpWeatherProvider::new(&endpoint(base, 2_000)).unwrap();
    let err = provider.fetch(&weather_query()).await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse(_)), "{err:?}");
}

#[tokio::test]
async fn test_insights_provider_decodes_price_range() {
    let base = spawn(tool_backend(|tool, params| {
        assert_eq!(tool, "get_destination_insights");
        assert_eq!(params["travel_type"], "leisure");
        assert_eq!(params["party_size"], 2);
        Json(json!({
            "summary": "Museums and long evenings",
            "attractions": [{"name": "Louvre", "category": "museum", "rating": 4.7}],
            "restaurants": [{"name": "Chez Janou", "cuisine": "Provençal", "price_range": "$$"}],
            "currency": "EUR",
            "language": "French",
            "local_transport": ["Metro", "Bus"],
            "cultural_tips": ["Dining etiquette is important"],
        }))
        .into_response()
    }))
    .await;

    let provider = HttpInsightsProvider::new(&endpoint(base, 2_000)).unwrap();
    let result = provider
        .fetch(&InsightsQuery::from(&paris_request()))
        .await
        .unwrap();

    assert_eq!(result.attractions[0].name, "Louvre");
    assert_eq!(result.restaurants[0].price_tier, PriceTier::Moderate);
    assert_eq!(result.facts.currency.as_deref(), Some("EUR"));
    assert_eq!(result.facts.local_transport, vec!["Metro", "Bus"]);
    assert!(result.facts.safety_rating.is_none());
}

#[tokio::test]
async fn test_server_errors_are_unavailable() {
    let base = spawn(tool_backend(|_, _| {
        (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response()
    }))
    .await;

    let provider = HttpInsightsProvider::new(&endpoint(base, 2_000)).unwrap();
    let err = provider
        .fetch(&InsightsQuery::from(&paris_request()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Unavailable(_)), "{err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_client_errors_are_invalid_response() {
    let base = spawn(tool_backend(|_, _| {
        (StatusCode::BAD_REQUEST, "unknown tool").into_response()
    }))
    .await;

    let provider = HttpInsightsProvider::new(&endpoint(base, 2_000)).unwrap();
    let err = provider
        .fetch(&InsightsQuery::from(&paris_request()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse(_)), "{err:?}");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let base = spawn(tool_backend(|_, _| {
        Json(json!({"attractions": []})).into_response()
    }))
    .await;

    let provider = HttpInsightsProvider::new(&endpoint(base, 2_000)).unwrap();
    let err = provider
        .fetch(&InsightsQuery::from(&paris_request()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse(_)), "{err:?}");
}

#[tokio::test]
async fn test_booking_provider_runs_both_searches() {
    let base = spawn(tool_backend(|tool, params| match tool {
        "search_flights" => {
            assert_eq!(params["origin"], "New York");
            assert_eq!(params["passengers"], 2);
            Json(json!({"flights": [{
                "airline": "Air France",
                "flight_number": "AF007",
                "price": 650.0,
                "departure_time": "2026-06-15T22:00:00Z",
                "arrival_time": "2026-06-16T11:30:00Z"
            }]}))
            .into_response()
        }
        "search_hotels" => {
            assert_eq!(params["check_out"], "2026-06-22");
            Json(json!({"hotels": [{
                "name": "Hôtel du Marais",
                "price_per_night": 180.0,
                "rating": 4.2
            }]}))
            .into_response()
        }
        other => (StatusCode::NOT_FOUND, format!("no tool {other}")).into_response(),
    }))
    .await;

    let provider = HttpBookingProvider::new(&endpoint(base, 2_000)).unwrap();
    let options = provider
        .fetch(&BookingQuery::from(&paris_request()))
        .await
        .unwrap();

    assert_eq!(options.flights.len(), 1);
    assert_eq!(options.flights[0].carrier, "Air France");
    assert_eq!(options.hotels[0].nightly_price, 180.0);
}

#[tokio::test]
async fn test_booking_with_negative_price_is_invalid() {
    let base = spawn(tool_backend(|tool, _| match tool {
        "search_flights" => Json(json!({"flights": []})).into_response(),
        _ => Json(json!({"hotels": [{"name": "Nowhere Inn", "price_per_night": -20.0, "rating": 3.0}]}))
            .into_response(),
    }))
    .await;

    let provider = HttpBookingProvider::new(&endpoint(base, 2_000)).unwrap();
    let err = provider
        .fetch(&BookingQuery::from(&paris_request()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse(_)), "{err:?}");
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let router = Router::new().route(
        "/call",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({}))
        }),
    );
    let base = spawn(router).await;

    let provider = HttpWeatherProvider::new(&endpoint(base, 200)).unwrap();
    let err = provider.fetch(&weather_query()).await.unwrap_err();
    assert_eq!(err, ProviderError::Timeout(Duration::from_millis(200)));
}

#[tokio::test]
async fn test_unreachable_backend_is_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let provider = HttpWeatherProvider::new(&endpoint(base, 2_000)).unwrap();
    let err = provider.fetch(&weather_query()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Unavailable(_)), "{err:?}");
    assert!(!provider.health_check().await);
}

fn chat_backend(content: Value) -> Router {
    Router::new().route(
        "/chat/completions",
        post(move |Json(body): Json<Value>| {
            let content = content.clone();
            async move {
                assert_eq!(body["model"], "gpt-4");
                assert_eq!(body["messages"][0]["role"], "system");
                Json(json!({"choices": [{"message": {"role": "assistant", "content": content}}]}))
            }
        }),
    )
}

fn brief() -> TripBrief {
    TripBrief {
        request: paris_request(),
        weather: Some(weather_result()),
        insights: Some(insights_result()),
        booking: None,
        estimated_cost: None,
    }
}

fn synthesis_config(base_url: String) -> SynthesisConfig {
    SynthesisConfig {
        base_url,
        ..tripsmith::TripConfig::default().synthesis
    }
}

#[tokio::test]
async fn test_openai_synthesizer_returns_narrative() {
    let base = spawn(chat_backend(json!("Day 1: arrive and stroll the Marais."))).await;
    let synthesizer =
        OpenAiSynthesizer::new(&synthesis_config(base), "sk-test".to_string(), Duration::from_secs(5))
            .unwrap();

    let narrative = synthesizer.synthesize(&brief()).await.unwrap();
    assert_eq!(narrative, "Day 1: arrive and stroll the Marais.");
}

#[tokio::test]
async fn test_openai_blank_answer_is_generation_error() {
    let base = spawn(chat_backend(json!("   "))).await;
    let synthesizer =
        OpenAiSynthesizer::new(&synthesis_config(base), "sk-test".to_string(), Duration::from_secs(5))
            .unwrap();

    let err = synthesizer.synthesize(&brief()).await.unwrap_err();
    assert!(matches!(err, SynthesisError::GenerationError(_)), "{err:?}");
}
