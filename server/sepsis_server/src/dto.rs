//! JSON response bodies

use serde::Serialize;

use sepsis_triage::{
    ContextStatus, EarlyWarningInput, EarlyWarningResult, FeatureBreakdown, FeatureVector,
    FieldResolution, PredictionResult,
};

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn as_percentage(fraction: f64) -> f64 {
    round_to(fraction * 100.0, 1)
}

#[derive(Debug, Serialize)]
pub struct ClassProbabilities {
    pub healthy: f64,
    pub mild: f64,
    pub severe: f64,
}

#[derive(Debug, Serialize)]
pub struct DebugInfo {
    pub raw_ai_output: usize,
    pub scaled_inputs: FeatureVector,
    pub unmatched_fields: Vec<String>,
    pub resolution: Vec<FieldResolution>,
}

#[derive(Debug, Serialize)]
pub struct SeverityResponse {
    pub prediction: usize,
    pub severity: &'static str,
    pub status: &'static str,
    pub confidence: f64,
    pub probabilities: ClassProbabilities,
    pub is_clinical_override: bool,
    pub override_reason: Option<String>,
    pub debug_info: DebugInfo,
}

impl From<PredictionResult> for SeverityResponse {
    fn from(result: PredictionResult) -> Self {
        let [healthy, mild, severe] = result.probabilities.map(as_percentage);
        let label = result.prediction.label();
        Self {
            prediction: result.prediction.index(),
            severity: label,
            status: label,
            confidence: as_percentage(result.confidence),
            probabilities: ClassProbabilities {
                healthy,
                mild,
                severe,
            },
            is_clinical_override: result.is_clinical_override,
            override_reason: result.override_reason,
            debug_info: DebugInfo {
                raw_ai_output: result.raw_prediction.index(),
                scaled_inputs: result.scaled.vector,
                unmatched_fields: result.scaled.unmatched,
                resolution: result.scaled.resolutions,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelsLoaded {
    pub vitals_model: bool,
    pub decision_engine: bool,
}

#[derive(Debug, Serialize)]
pub struct ModelStatus {
    pub using_fallback: bool,
    pub vitals_fallback: bool,
    pub decision_fallback: bool,
    pub models_loaded: ModelsLoaded,
}

#[derive(Debug, Serialize)]
pub struct EarlyWarningResponse {
    pub risk_score: f64,
    pub risk_percentage: f64,
    pub status: &'static str,
    pub is_alert: bool,
    pub feature_breakdown: FeatureBreakdown,
    pub primary_alert_factor: Option<&'static str>,
    pub all_alert_factors: Vec<&'static str>,
    pub raw_inputs: EarlyWarningInput,
    pub model_status: ModelStatus,
}

impl EarlyWarningResponse {
    pub fn new(
        input: EarlyWarningInput,
        result: EarlyWarningResult,
        models_loaded: ModelsLoaded,
    ) -> Self {
        Self {
            risk_score: round_to(result.risk_score, 3),
            risk_percentage: as_percentage(result.risk_score),
            status: result.status.label(),
            is_alert: result.is_alert(),
            primary_alert_factor: result.primary_factor().map(|f| f.label()),
            all_alert_factors: result.factors.iter().map(|f| f.label()).collect(),
            feature_breakdown: result.breakdown,
            raw_inputs: input,
            model_status: ModelStatus {
                using_fallback: result.using_fallback(),
                vitals_fallback: result.vitals_fallback,
                decision_fallback: result.decision_fallback,
                models_loaded,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub ready: bool,
    pub models_loaded: HealthModels,
    pub artifacts: Option<ContextStatus>,
    pub endpoints: &'static [Endpoint],
}

#[derive(Debug, Default, Serialize)]
pub struct HealthModels {
    pub severity_model: bool,
    pub vitals_model: bool,
    pub decision_engine: bool,
}

#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
    pub message: &'static str,
}
