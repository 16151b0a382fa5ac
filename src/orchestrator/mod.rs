//! Trip orchestrator: validates a request, fans out to the three providers under one
//! deadline, merges whatever came back and optionally asks for a narrative.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{CachePolicy, TripCache};
use crate::config::TripConfig;
use crate::error::TripError;
use crate::models::{
    BookingQuery, CostEstimate, Fingerprint, InsightsQuery, Source, SynthesisStatus, TripPlan,
    TripRequest, WeatherQuery,
};
use crate::providers::{
    BookingProvider, HttpBookingProvider, HttpInsightsProvider, HttpWeatherProvider,
    InsightsProvider, WeatherProvider,
};
use crate::synthesis::{NarrativeSynthesizer, OpenAiSynthesizer, TripBrief};

mod dispatch;
mod merge;
pub mod policy;

use dispatch::{Outcome, call_with_retry};
use merge::{Merged, merge};
pub use policy::{OrchestratorPolicy, RetryPolicy};

/// Per-call switches for [`TripOrchestrator::plan_trip`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOptions {
    /// Ask the synthesizer for a narrative
    pub synthesize: bool,
    /// Read from and write to the plan cache, if one is configured
    pub use_cache: bool,
    /// Sources not to query; recorded as skipped
    pub skip: BTreeSet<Source>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            synthesize: false,
            use_cache: true,
            skip: BTreeSet::new(),
        }
    }
}

impl PlanOptions {
    /// Part of the cache key that depends on these options. Narrative plans also depend
    /// on budget and special requirements since both reach the prompt.
    fn cache_scope(&self, request: &TripRequest) -> String {
        let mut parts = Vec::new();
        if !self.skip.is_empty() {
            let skipped: Vec<&str> = self.skip.iter().map(Source::as_str).collect();
            parts.push(format!("skip={}", skipped.join("+")));
        }
        if self.synthesize {
            parts.push("narrative".to_string());
            parts.push(format!("budget={}", (request.budget * 100.0).round() as i64));
            if let Some(req) = request
                .special_requirements
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
            {
                parts.push(format!("req={}", req.to_lowercase()));
            }
        }
        parts.join(";")
    }
}

pub struct TripOrchestrator {
    weather: Arc<dyn WeatherProvider>,
    insights: Arc<dyn InsightsProvider>,
    booking: Arc<dyn BookingProvider>,
    synthesizer: Option<Arc<dyn NarrativeSynthesizer>>,
    cache: Option<Arc<TripCache>>,
    policy: OrchestratorPolicy,
}

impl TripOrchestrator {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        insights: Arc<dyn InsightsProvider>,
        booking: Arc<dyn BookingProvider>,
        policy: OrchestratorPolicy,
    ) -> Self {
        Self {
            weather,
            insights,
            booking,
            synthesizer: None,
            cache: None,
            policy,
        }
    }

    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn NarrativeSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<TripCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Wire up the HTTP providers, the synthesizer (when enabled and a key is found)
    /// and the plan cache (when enabled)
    pub fn from_config(config: &TripConfig) -> anyhow::Result<Self> {
        let policy = OrchestratorPolicy::from(config);
        let synthesis_timeout = policy.synthesis_timeout;

        let mut orchestrator = Self::new(
            Arc::new(HttpWeatherProvider::new(&config.providers.weather)?),
            Arc::new(HttpInsightsProvider::new(&config.providers.insights)?),
            Arc::new(HttpBookingProvider::new(&config.providers.booking)?),
            policy,
        );

        if config.synthesis.enabled {
            match config.synthesis.resolve_api_key() {
                Some(api_key) => {
                    let synthesizer =
                        OpenAiSynthesizer::new(&config.synthesis, api_key, synthesis_timeout)?;
                    orchestrator = orchestrator.with_synthesizer(Arc::new(synthesizer));
                }
                None => warn!(
                    env = %config.synthesis.api_key_env,
                    "Narrative synthesis enabled but no API key found; plans will have no narrative"
                ),
            }
        }

        if config.cache.enabled {
            let cache = TripCache::new(CachePolicy::from(&config.cache));
            orchestrator = orchestrator.with_cache(Arc::new(cache));
        }

        Ok(orchestrator)
    }

    #[must_use]
    pub fn policy(&self) -> &OrchestratorPolicy {
        &self.policy
    }

    #[must_use]
    pub fn cache(&self) -> Option<&Arc<TripCache>> {
        self.cache.as_ref()
    }

    #[must_use]
    pub fn has_synthesizer(&self) -> bool {
        self.synthesizer.is_some()
    }

    /// Plan one trip.
    ///
    /// Fails only for an invalid request, or in strict-deadline mode when the global
    /// deadline cuts a provider call short. Provider and synthesis failures are reported
    /// inside the plan.
    #[tracing::instrument(
        name = "plan_trip",
        skip_all,
        fields(destination = %request.destination, synthesize = options.synthesize)
    )]
    pub async fn plan_trip(
        &self,
        request: &TripRequest,
        options: &PlanOptions,
    ) -> crate::Result<TripPlan> {
        if let Err(err) = request.validate() {
            warn!(violations = err.violations().len(), "Rejecting invalid trip request");
            return Err(err);
        }
        let fingerprint = request.fingerprint();

        match &self.cache {
            Some(cache) if options.use_cache => {
                let key = fingerprint.scoped(&options.cache_scope(request));
                cache
                    .get_or_compute(&key, || self.compute(request, options, fingerprint.clone()))
                    .await
            }
            _ => self.compute(request, options, fingerprint).await,
        }
    }

    /// [`plan_trip`](Self::plan_trip) that stops as soon as `cancel` fires. In-flight
    /// provider calls are dropped and synthesis is not started.
    pub async fn plan_trip_with_cancel(
        &self,
        request: &TripRequest,
        options: &PlanOptions,
        cancel: &CancellationToken,
    ) -> crate::Result<TripPlan> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("Trip planning cancelled by caller");
                Err(TripError::Cancelled)
            }
            result = self.plan_trip(request, options) => result,
        }
    }

    /// Health of every provider, checked concurrently
    pub async fn health(&self) -> BTreeMap<Source, bool> {
        let (weather, insights, booking) = tokio::join!(
            self.weather.health_check(),
            self.insights.health_check(),
            self.booking.health_check(),
        );
        BTreeMap::from([
            (Source::Weather, weather),
            (Source::Insights, insights),
            (Source::Booking, booking),
        ])
    }

    async fn compute(
        &self,
        request: &TripRequest,
        options: &PlanOptions,
        fingerprint: Fingerprint,
    ) -> crate::Result<TripPlan> {
        let started = Instant::now();
        let merged = self.fan_out(request, &options.skip).await?;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            usable = merged.is_usable(),
            "Provider fan-out finished"
        );

        let estimated_cost = merged
            .booking
            .as_ref()
            .and_then(|b| CostEstimate::from_booking(b, request.party_size, request.nights()));

        let (narrative, synthesis) = if !options.synthesize {
            (None, SynthesisStatus::NotRequested)
        } else if !merged.is_usable() {
            (None, skipped("no provider data to synthesize from"))
        } else if let Some(synthesizer) = &self.synthesizer {
            let brief = TripBrief {
                request: request.clone(),
                weather: merged.weather.clone(),
                insights: merged.insights.clone(),
                booking: merged.booking.clone(),
                estimated_cost: estimated_cost.clone(),
            };
            self.synthesize(synthesizer.as_ref(), &brief).await
        } else {
            (None, skipped("no synthesizer configured"))
        };

        let Merged {
            weather,
            insights,
            booking,
            sources,
        } = merged;
        let plan = TripPlan {
            fingerprint,
            weather,
            insights,
            booking,
            estimated_cost,
            narrative,
            sources,
            synthesis,
            generated_at: Utc::now(),
        };

        info!(
            complete = plan.is_complete(),
            usable = plan.is_usable(),
            narrative = plan.narrative.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Trip plan assembled"
        );
        Ok(plan)
    }

    /// Query all providers concurrently under one deadline
    async fn fan_out(
        &self,
        request: &TripRequest,
        skip: &BTreeSet<Source>,
    ) -> crate::Result<Merged> {
        let deadline_budget = self.policy.global_deadline();
        let deadline = Instant::now() + deadline_budget;

        let weather_query = WeatherQuery::from(request);
        let insights_query = InsightsQuery::from(request);
        let booking_query = BookingQuery::from(request);

        let (weather, insights, booking) = tokio::join!(
            self.dispatch(Source::Weather, skip, deadline, || self.weather.fetch(&weather_query)),
            self.dispatch(Source::Insights, skip, deadline, || self.insights.fetch(&insights_query)),
            self.dispatch(Source::Booking, skip, deadline, || self.booking.fetch(&booking_query)),
        );

        if self.policy.strict_deadline {
            let pending: Vec<Source> = [
                (Source::Weather, weather.cut_by_deadline()),
                (Source::Insights, insights.cut_by_deadline()),
                (Source::Booking, booking.cut_by_deadline()),
            ]
            .into_iter()
            .filter_map(|(source, cut)| cut.then_some(source))
            .collect();

            if !pending.is_empty() {
                warn!(?pending, deadline_ms = deadline_budget.as_millis() as u64, "Global deadline reached in strict mode");
                return Err(TripError::OrchestrationTimeout {
                    deadline: deadline_budget,
                    pending,
                });
            }
        }

        Ok(merge(weather, insights, booking))
    }

    async fn dispatch<T, F, Fut>(
        &self,
        source: Source,
        skip: &BTreeSet<Source>,
        deadline: Instant,
        call: F,
    ) -> Outcome<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = crate::providers::ProviderResult<T>>,
    {
        if skip.contains(&source) {
            debug!(%source, "Source skipped by caller");
            return Outcome::Skipped;
        }
        call_with_retry(
            source,
            &self.policy.retry,
            self.policy.timeout_for(source),
            deadline,
            call,
        )
        .await
    }

    async fn synthesize(
        &self,
        synthesizer: &dyn NarrativeSynthesizer,
        brief: &TripBrief,
    ) -> (Option<String>, SynthesisStatus) {
        let started = Instant::now();
        let budget = self.policy.synthesis_timeout;

        let error = match tokio::time::timeout(budget, synthesizer.synthesize(brief)).await {
            Ok(Ok(narrative)) => {
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                return (Some(narrative), SynthesisStatus::Ok { elapsed_ms });
            }
            Ok(Err(error)) => error,
            Err(_) => crate::synthesis::SynthesisError::Timeout(budget),
        };

        warn!(%error, "Narrative synthesis failed, returning plan without narrative");
        (
            None,
            SynthesisStatus::Failed {
                reason: error.failure(),
                message: error.to_string(),
            },
        )
    }
}

fn skipped(reason: &str) -> SynthesisStatus {
    SynthesisStatus::Skipped {
        reason: reason.to_string(),
    }
}

impl<T> Outcome<T> {
    fn cut_by_deadline(&self) -> bool {
        matches!(self, Outcome::Finished { cut_by_deadline: true, .. })
    }
}
