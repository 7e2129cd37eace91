//! Label-only weighted rule

use serde::{Deserialize, Serialize};

use crate::backend::{check_width, BackendError, Estimator, LabelCapable, ProbabilityCapable};

/// Hard-decision rule: label is `1.0` when `w·x + bias >= cutoff`.
///
/// Exposes no probability capability; consumers that need a score must use
/// the label directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleClassifier {
    pub weights: Vec<f64>,
    #[serde(default)]
    pub bias: f64,
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

fn default_cutoff() -> f64 {
    0.5
}

impl RuleClassifier {
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.weights.is_empty() {
            return Err(BackendError::LoadError("rule has no weights".into()));
        }
        if !self.cutoff.is_finite() || !self.bias.is_finite() {
            return Err(BackendError::LoadError(
                "rule cutoff and bias must be finite".into(),
            ));
        }
        Ok(())
    }
}

impl LabelCapable for RuleClassifier {
    fn predict_label(&self, features: &[f64]) -> Result<f64, BackendError> {
        check_width(self.weights.len(), features)?;
        let s: f64 = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        if !s.is_finite() {
            return Err(BackendError::InferenceError(
                "rule score is not finite".into(),
            ));
        }
        Ok(if s >= self.cutoff { 1.0 } else { 0.0 })
    }
}

impl Estimator for RuleClassifier {
    fn kind(&self) -> &str {
        "rule"
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.weights.len())
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn as_probability(&self) -> Option<&dyn ProbabilityCapable> {
        None
    }

    fn as_label(&self) -> Option<&dyn LabelCapable> {
        Some(self)
    }
}
