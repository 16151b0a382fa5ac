use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    FieldViolation, PlanOptions, Source, TripError, TripOrchestrator, TripPlan, TripRequest,
    VERSION,
};

#[derive(Debug, Deserialize)]
pub struct PlanTripBody {
    #[serde(flatten)]
    pub request: TripRequest,
    #[serde(default)]
    pub synthesize: bool,
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
    #[serde(default)]
    pub skip: BTreeSet<Source>,
}

fn default_use_cache() -> bool {
    true
}

impl PlanTripBody {
    fn options(&self) -> PlanOptions {
        PlanOptions {
            synthesize: self.synthesize,
            use_cache: self.use_cache,
            skip: self.skip.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<FieldViolation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiHealth {
    pub version: String,
    pub healthy: bool,
    pub providers: BTreeMap<Source, bool>,
}

/// Error half of a handler result, rendered as `{error, violations}`
pub struct ApiFailure(StatusCode, ApiError);

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

impl From<TripError> for ApiFailure {
    fn from(err: TripError) -> Self {
        let status = match &err {
            TripError::InvalidRequest { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            TripError::OrchestrationTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            TripError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            TripError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self(
            status,
            ApiError {
                error: err.to_string(),
                violations: err.violations().to_vec(),
            },
        )
    }
}

impl From<JsonRejection> for ApiFailure {
    fn from(rejection: JsonRejection) -> Self {
        Self(
            rejection.status(),
            ApiError {
                error: rejection.body_text(),
                violations: Vec::new(),
            },
        )
    }
}

pub fn router(orchestrator: Arc<TripOrchestrator>) -> Router {
    Router::new()
        .route("/plan-trip", post(plan_trip))
        .route("/health", get(health))
        .with_state(orchestrator)
}

async fn plan_trip(
    State(orchestrator): State<Arc<TripOrchestrator>>,
    body: Result<Json<PlanTripBody>, JsonRejection>,
) -> Result<Json<TripPlan>, ApiFailure> {
    let Json(body) = body.inspect_err(|e| warn!(error = %e, "Rejected plan-trip body"))?;
    let plan = orchestrator.plan_trip(&body.request, &body.options()).await?;
    Ok(Json(plan))
}

async fn health(State(orchestrator): State<Arc<TripOrchestrator>>) -> Json<ApiHealth> {
    let providers = orchestrator.health().await;
    Json(ApiHealth {
        version: VERSION.to_string(),
        healthy: providers.values().all(|up| *up),
        providers,
    })
}
