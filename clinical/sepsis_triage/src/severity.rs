//! Severity classification: resolve, scale, infer, then apply guardrails

use serde::Serialize;
use std::sync::Arc;

use sepsis_model::{argmax, BackendError, InferenceAdapter};

use crate::error::TriageError;
use crate::guardrail::{Finding, GuardrailEngine, SeverityClass};
use crate::record::PatientRecord;
use crate::resolver::{FeatureResolver, MatchTier};
use crate::scaler::{ClinicalBridge, ScaleTrace};
use crate::vector::FeatureVector;

/// How one incoming field reached its slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldResolution {
    pub field: String,
    pub canonical: String,
    pub tier: MatchTier,
}

/// Scaled model input plus the bookkeeping collected while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledInput {
    pub vector: FeatureVector,
    pub traces: Vec<ScaleTrace>,
    pub resolutions: Vec<FieldResolution>,
    pub unmatched: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub prediction: SeverityClass,
    pub raw_prediction: SeverityClass,
    /// Healthy, Mild, Severe; sums to 1.
    pub probabilities: [f64; 3],
    pub confidence: f64,
    pub is_clinical_override: bool,
    pub override_reason: Option<String>,
    pub findings: Vec<Finding>,
    pub scaled: ScaledInput,
}

/// The primary severity classifier with its schema, statistics and
/// guardrails. Immutable once built.
#[derive(Debug, Clone)]
pub struct SeverityModel {
    model: Arc<InferenceAdapter>,
    feature_names: Arc<[String]>,
    resolver: FeatureResolver,
    bridge: Arc<ClinicalBridge>,
    guardrails: GuardrailEngine,
}

impl SeverityModel {
    pub fn new(
        model: Arc<InferenceAdapter>,
        feature_names: Arc<[String]>,
        resolver: FeatureResolver,
        bridge: Arc<ClinicalBridge>,
        guardrails: GuardrailEngine,
    ) -> Self {
        Self {
            model,
            feature_names,
            resolver,
            bridge,
            guardrails,
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn guardrails(&self) -> &GuardrailEngine {
        &self.guardrails
    }

    pub fn model(&self) -> &InferenceAdapter {
        &self.model
    }

    /// Map every field of the record onto the training schema.
    pub fn scale_inputs(&self, record: &PatientRecord) -> ScaledInput {
        let mut vector = FeatureVector::zeros(Arc::clone(&self.feature_names));
        let mut traces = Vec::new();
        let mut resolutions = Vec::new();
        let mut unmatched = Vec::new();

        for (field, value) in record.fields() {
            match self.resolver.resolve(field) {
                Some(hit) => {
                    let trace = self.bridge.scale(field, &hit.canonical, value);
                    vector.set(hit.slot, trace.scaled);
                    traces.push(trace);
                    resolutions.push(FieldResolution {
                        field: field.to_string(),
                        canonical: hit.canonical,
                        tier: hit.tier,
                    });
                }
                None => {
                    log::debug!("no feature slot for field {field}; skipped");
                    unmatched.push(field.to_string());
                }
            }
        }
        for field in record.non_numeric_fields() {
            log::debug!("field {field} is not numeric; skipped");
            unmatched.push(field.to_string());
        }

        ScaledInput {
            vector,
            traces,
            resolutions,
            unmatched,
        }
    }

    pub fn predict(&self, record: &PatientRecord) -> Result<PredictionResult, TriageError> {
        let mut record = record.clone();
        record.reconcile();

        let scaled = self.scale_inputs(&record);
        let raw_probs = self.model.predict_proba(scaled.vector.values())?;
        let probabilities = three_class_distribution(&raw_probs)?;

        let raw_index = argmax(&probabilities);
        let raw_prediction = SeverityClass::from_index(raw_index).unwrap_or(SeverityClass::Severe);
        let decision = self
            .guardrails
            .evaluate(raw_prediction, |field| record.get(field));

        Ok(PredictionResult {
            prediction: decision.final_class,
            raw_prediction,
            probabilities,
            confidence: probabilities[raw_index],
            is_clinical_override: decision.is_override,
            override_reason: decision.reason,
            findings: decision.findings,
            scaled,
        })
    }
}

/// Check the classifier produced three classes and renormalize them.
fn three_class_distribution(probs: &[f64]) -> Result<[f64; 3], BackendError> {
    let [healthy, mild, severe] = probs else {
        return Err(BackendError::InferenceError(format!(
            "severity model returned {} class probabilities, expected 3",
            probs.len()
        )));
    };
    let total = healthy + mild + severe;
    if !total.is_finite() || total <= 0.0 || probs.iter().any(|p| *p < 0.0) {
        return Err(BackendError::InferenceError(format!(
            "severity model returned an invalid distribution: {probs:?}"
        )));
    }
    Ok([healthy / total, mild / total, severe / total])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasTable;
    use crate::guardrail::GuardrailProfile;
    use crate::scaler::FeatureStats;
    use sepsis_model::{EstimatorSpec, LinearClassifier, ResolvedModel};
    use std::collections::HashMap;

    fn schema() -> Arc<[String]> {
        ["heart_rate", "lactate", "systolic_bp"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into()
    }

    /// Predicts Healthy regardless of input.
    fn always_healthy(width: usize) -> InferenceAdapter {
        InferenceAdapter::new(
            "severity",
            ResolvedModel::DirectClassifier(EstimatorSpec::Linear(LinearClassifier {
                coef: vec![vec![0.0; width]; 3],
                intercept: vec![3.0, 0.0, 0.0],
                classes: None,
                feature_names: None,
            })),
        )
    }

    fn model_with(adapter: InferenceAdapter) -> SeverityModel {
        let names = schema();
        let bridge = ClinicalBridge::new(HashMap::from([(
            "heart_rate".to_string(),
            FeatureStats {
                mean: 80.0,
                std: 10.0,
            },
        )]));
        SeverityModel::new(
            Arc::new(adapter),
            Arc::clone(&names),
            FeatureResolver::new(Arc::new(AliasTable::builtin()), &names),
            Arc::new(bridge),
            GuardrailEngine::new(GuardrailProfile::Basic),
        )
    }

    #[test]
    fn scaled_inputs_follow_training_order() {
        let model = model_with(always_healthy(3));
        let record = PatientRecord {
            hr: 100.0,
            ..PatientRecord::default()
        };
        let scaled = model.scale_inputs(&record);
        assert_eq!(scaled.vector.names(), &schema()[..]);
        assert_eq!(scaled.vector.get("heart_rate"), Some(2.0));
        // no bridge stats for lactate or SBP
        assert_eq!(scaled.vector.get("lactate"), Some(0.0));
        assert_eq!(scaled.resolutions.len(), 3);
        assert!(scaled.unmatched.contains(&"EtCO2".to_string()));
    }

    #[test]
    fn identifiers_in_the_record_are_reported_unmatched() {
        let record: PatientRecord =
            serde_json::from_str(r#"{"HR": 90, "patient_id": "A-17"}"#).unwrap();
        let result = model_with(always_healthy(3)).predict(&record).unwrap();
        assert!(result.scaled.unmatched.contains(&"patient_id".to_string()));
        assert!(result
            .scaled
            .resolutions
            .iter()
            .all(|r| r.field != "patient_id"));
    }

    #[test]
    fn healthy_defaults_are_not_overridden() {
        let result = model_with(always_healthy(3))
            .predict(&PatientRecord::default())
            .unwrap();
        assert_eq!(result.prediction, SeverityClass::Healthy);
        assert!(!result.is_clinical_override);
        assert!(result.override_reason.is_none());
        assert!((result.probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(result.confidence, result.probabilities[0]);
    }

    #[test]
    fn raw_lactate_triggers_override() {
        let record = PatientRecord {
            lactate: 5.0,
            ..PatientRecord::default()
        };
        let result = model_with(always_healthy(3)).predict(&record).unwrap();
        assert_eq!(result.raw_prediction, SeverityClass::Healthy);
        assert_eq!(result.prediction, SeverityClass::Severe);
        assert!(result.is_clinical_override);
        assert!(result.override_reason.unwrap().contains("Lactate"));
    }

    #[test]
    fn binary_model_output_is_an_inference_failure() {
        let adapter = InferenceAdapter::new(
            "severity",
            ResolvedModel::DirectClassifier(EstimatorSpec::Linear(LinearClassifier {
                coef: vec![vec![0.0; 3]],
                intercept: vec![0.0],
                classes: None,
                feature_names: None,
            })),
        );
        let err = model_with(adapter)
            .predict(&PatientRecord::default())
            .unwrap_err();
        assert!(matches!(err, TriageError::InferenceFailure(_)));
    }

    #[test]
    fn missing_estimator_fails_the_request() {
        let adapter = InferenceAdapter::new("severity", ResolvedModel::Unknown);
        assert!(model_with(adapter)
            .predict(&PatientRecord::default())
            .is_err());
    }
}
