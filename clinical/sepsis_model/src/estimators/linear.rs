//! Logistic / multinomial linear classifier

use serde::{Deserialize, Serialize};

use crate::backend::{
    check_finite, check_width, BackendError, Estimator, LabelCapable, ProbabilityCapable,
};

/// Linear classifier over a fixed feature vector.
///
/// A single coefficient row is a binary logistic regression whose output is
/// `[1 - p, p]`; several rows are a multinomial (softmax) model with one row
/// per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl LinearClassifier {
    pub fn validate(&self) -> Result<(), BackendError> {
        let width = self
            .coef
            .first()
            .map(Vec::len)
            .ok_or_else(|| BackendError::LoadError("linear model has no coefficients".into()))?;
        if self.coef.iter().any(|row| row.len() != width) {
            return Err(BackendError::LoadError(
                "linear model coefficient rows differ in length".into(),
            ));
        }
        if self.intercept.len() != self.coef.len() {
            return Err(BackendError::LoadError(format!(
                "linear model has {} coefficient rows but {} intercepts",
                self.coef.len(),
                self.intercept.len()
            )));
        }
        if let Some(classes) = &self.classes {
            if classes.len() != self.n_classes() {
                return Err(BackendError::LoadError(format!(
                    "linear model declares {} classes but produces {}",
                    classes.len(),
                    self.n_classes()
                )));
            }
        }
        if let Some(names) = &self.feature_names {
            if names.len() != width {
                return Err(BackendError::LoadError(format!(
                    "linear model declares {} feature names for {} coefficients",
                    names.len(),
                    width
                )));
            }
        }
        Ok(())
    }

    pub fn n_classes(&self) -> usize {
        if self.coef.len() == 1 {
            2
        } else {
            self.coef.len()
        }
    }

    fn width(&self) -> usize {
        self.coef.first().map(Vec::len).unwrap_or(0)
    }

    fn decision(&self, features: &[f64]) -> Result<Vec<f64>, BackendError> {
        check_width(self.width(), features)?;
        Ok(self
            .coef
            .iter()
            .zip(self.intercept.iter())
            .map(|(row, b)| row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect())
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = z.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl ProbabilityCapable for LinearClassifier {
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, BackendError> {
        let z = self.decision(features)?;
        let probs = if z.len() == 1 {
            let p = sigmoid(z[0]);
            vec![1.0 - p, p]
        } else {
            softmax(&z)
        };
        check_finite(&probs)?;
        Ok(probs)
    }
}

impl LabelCapable for LinearClassifier {
    fn predict_label(&self, features: &[f64]) -> Result<f64, BackendError> {
        let probs = self.predict_proba(features)?;
        let idx = super::argmax(&probs);
        Ok(match &self.classes {
            Some(classes) => classes.get(idx).copied().unwrap_or(idx as f64),
            None => idx as f64,
        })
    }
}

impl Estimator for LinearClassifier {
    fn kind(&self) -> &str {
        "linear"
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.width())
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn as_probability(&self) -> Option<&dyn ProbabilityCapable> {
        Some(self)
    }

    fn as_label(&self) -> Option<&dyn LabelCapable> {
        Some(self)
    }
}
