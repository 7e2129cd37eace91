use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use sepsis_triage::{EarlyWarningInput, PatientRecord};

use crate::dto::{
    EarlyWarningResponse, Endpoint, HealthModels, HealthResponse, LivenessResponse, ModelsLoaded,
    SeverityResponse,
};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

pub const SEVERITY_PATHS: [&str; 2] = ["/severity", "/predict-severity"];
pub const WARNING_PATHS: [&str; 3] = ["/sepsis-warning", "/predict", "/sepsis-warnning"];

const ENDPOINTS: &[Endpoint] = &[
    Endpoint {
        method: "POST",
        path: "/severity",
        description: "Severity classification with clinical guardrails",
    },
    Endpoint {
        method: "POST",
        path: "/predict-severity",
        description: "Alias of /severity",
    },
    Endpoint {
        method: "POST",
        path: "/sepsis-warning",
        description: "Early-warning risk score",
    },
    Endpoint {
        method: "POST",
        path: "/predict",
        description: "Alias of /sepsis-warning",
    },
    Endpoint {
        method: "POST",
        path: "/sepsis-warnning",
        description: "Alias of /sepsis-warning (legacy spelling)",
    },
    Endpoint {
        method: "GET",
        path: "/test",
        description: "Liveness check",
    },
];

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let artifacts = state.context().ok().map(|ctx| ctx.status());
    let models_loaded = artifacts
        .as_ref()
        .map(|s| HealthModels {
            severity_model: s.severity_model,
            vitals_model: s.vitals_model,
            decision_engine: s.decision_engine,
        })
        .unwrap_or_default();

    Json(HealthResponse {
        service: "Sepsis Risk API",
        version: env!("CARGO_PKG_VERSION"),
        ready: artifacts.is_some(),
        models_loaded,
        artifacts,
        endpoints: ENDPOINTS,
    })
}

pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "ok",
        message: "Sepsis API is running",
    })
}

pub async fn severity(
    State(state): State<Arc<AppState>>,
    ApiJson(record): ApiJson<PatientRecord>,
) -> Result<Json<SeverityResponse>, ApiError> {
    let ctx = state.context()?;
    let result = ctx.severity()?.predict(&record)?;
    log::info!(
        "severity: {} (raw {}, override {})",
        result.prediction.label(),
        result.raw_prediction.label(),
        result.is_clinical_override
    );
    Ok(Json(result.into()))
}

pub async fn early_warning(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<EarlyWarningInput>,
) -> Result<Json<EarlyWarningResponse>, ApiError> {
    let ctx = state.context()?;
    let composer = ctx.early_warning();
    let result = composer.compose(&input);
    log::info!(
        "early warning: score {:.3}, {} (fallback {})",
        result.risk_score,
        result.status.label(),
        result.using_fallback()
    );
    let models_loaded = ModelsLoaded {
        vitals_model: composer.vitals_model().is_some_and(|m| m.is_usable()),
        decision_engine: composer.decision_engine().is_some(),
    };
    Ok(Json(EarlyWarningResponse::new(input, result, models_loaded)))
}

pub async fn method_guidance(path: &'static str) -> ApiError {
    ApiError::MethodNotAllowed(path)
}
