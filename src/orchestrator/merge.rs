//! Field-by-field assembly of provider outcomes

use std::collections::BTreeMap;

use super::dispatch::Outcome;
use crate::models::{BookingOptions, InsightsResult, Source, SourceStatus, WeatherResult};

/// Provider data after the fan-out, before synthesis
#[derive(Debug)]
pub(crate) struct Merged {
    pub weather: Option<WeatherResult>,
    pub insights: Option<InsightsResult>,
    pub booking: Option<BookingOptions>,
    pub sources: BTreeMap<Source, SourceStatus>,
}

impl Merged {
    pub fn is_usable(&self) -> bool {
        self.sources.values().any(SourceStatus::is_ok)
    }
}

/// Each source fills only its own field; a failure never clears another source's data.
pub(crate) fn merge(
    weather: Outcome<WeatherResult>,
    insights: Outcome<InsightsResult>,
    booking: Outcome<BookingOptions>,
) -> Merged {
    let mut sources = BTreeMap::new();
    Merged {
        weather: settle(Source::Weather, weather, &mut sources),
        insights: settle(Source::Insights, insights, &mut sources),
        booking: settle(Source::Booking, booking, &mut sources),
        sources,
    }
}

fn settle<T>(
    source: Source,
    outcome: Outcome<T>,
    sources: &mut BTreeMap<Source, SourceStatus>,
) -> Option<T> {
    let (value, status) = match outcome {
        Outcome::Skipped => (None, SourceStatus::Skipped),
        Outcome::Finished {
            result: Ok(value),
            attempts,
            elapsed,
            ..
        } => (
            Some(value),
            SourceStatus::Ok {
                attempts,
                elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            },
        ),
        Outcome::Finished {
            result: Err(error),
            attempts,
            ..
        } => (
            None,
            SourceStatus::Failed {
                reason: error.reason(),
                message: error.to_string(),
                attempts,
            },
        ),
    };
    sources.insert(source, status);
    value
}
