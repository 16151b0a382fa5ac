use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::{ProviderError, ProviderResult, ToolClient, WeatherProvider};
use crate::config::ProviderEndpoint;
use crate::models::{DailyForecast, WeatherQuery, WeatherResult};

const FORECAST_TOOL: &str = "get_weather_forecast";

/// Weather backend reached over the tool-call protocol
pub struct HttpWeatherProvider {
    tool: ToolClient,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    location: String,
    forecast: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ForecastDay {
    /// `YYYY-MM-DD`, optionally followed by a time
    date: String,
    temperature: TemperatureRange,
    #[serde(default)]
    precipitation_probability: u8,
    weather: Conditions,
}

#[derive(Debug, Deserialize)]
struct TemperatureRange {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct Conditions {
    main: String,
    #[serde(default)]
    description: Option<String>,
}

impl ForecastDay {
    fn into_daily(self) -> ProviderResult<DailyForecast> {
        let day = self.date.get(..10).unwrap_or(&self.date);
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
            ProviderError::InvalidResponse(format!("bad forecast date '{}': {e}", self.date))
        })?;
        let condition = self
            .weather
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(self.weather.main);

        Ok(DailyForecast {
            date,
            temperature_min_c: self.temperature.min,
            temperature_max_c: self.temperature.max,
            precipitation_probability: self.precipitation_probability,
            condition,
        })
    }
}

impl HttpWeatherProvider {
    pub fn new(endpoint: &ProviderEndpoint) -> anyhow::Result<Self> {
        Ok(Self {
            tool: ToolClient::new("weather", endpoint)?,
        })
    }
}

#[async_trait]
impl WeatherProvider for HttpWeatherProvider {
    async fn fetch(&self, query: &WeatherQuery) -> ProviderResult<WeatherResult> {
        let response: ForecastResponse = self
            .tool
            .call(
                FORECAST_TOOL,
                json!({
                    "location": query.destination,
                    "start_date": query.start_date,
                    "end_date": query.end_date,
                }),
            )
            .await?;

        let days = response
            .forecast
            .into_iter()
            .map(ForecastDay::into_daily)
            .collect::<ProviderResult<Vec<_>>>()?;

        let result = WeatherResult {
            location: response.location,
            days,
        };
        result
            .validate_for(query)
            .map_err(ProviderError::InvalidResponse)?;
        Ok(result)
    }

    async fn health_check(&self) -> bool {
        self.tool.health().await
    }
}
