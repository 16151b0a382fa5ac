//! Weather forecast model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::WeatherQuery;

/// One day of forecast at the destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    /// Minimum temperature in Celsius
    pub temperature_min_c: f64,
    /// Maximum temperature in Celsius
    pub temperature_max_c: f64,
    /// Chance of precipitation, 0-100
    pub precipitation_probability: u8,
    /// Short label such as "Sunny" or "Light rain"
    pub condition: String,
}

/// Forecast covering (part of) the requested date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub location: String,
    pub days: Vec<DailyForecast>,
}

impl WeatherResult {
    /// Requested dates the provider did not cover, usually past its horizon
    #[must_use]
    pub fn missing_days(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !self.days.iter().any(|f| f.date == *d))
            .collect()
    }

    #[must_use]
    pub fn is_partial(&self, start: NaiveDate, end: NaiveDate) -> bool {
        !self.missing_days(start, end).is_empty()
    }

    /// Check the forecast against the query it answers
    pub fn validate_for(&self, query: &WeatherQuery) -> Result<(), String> {
        let mut previous: Option<NaiveDate> = None;
        for day in &self.days {
            if day.date < query.start_date || day.date > query.end_date {
                return Err(format!(
                    "forecast date {} outside requested range {}..={}",
                    day.date, query.start_date, query.end_date
                ));
            }
            if previous.is_some_and(|p| day.date <= p) {
                return Err(format!("forecast dates out of order at {}", day.date));
            }
            if !day.temperature_min_c.is_finite() || !day.temperature_max_c.is_finite() {
                return Err(format!("non-numeric temperature on {}", day.date));
            }
            if day.temperature_min_c > day.temperature_max_c {
                return Err(format!("inverted temperature range on {}", day.date));
            }
            if day.precipitation_probability > 100 {
                return Err(format!(
                    "precipitation probability {} on {} exceeds 100",
                    day.precipitation_probability, day.date
                ));
            }
            previous = Some(day.date);
        }
        Ok(())
    }
}
