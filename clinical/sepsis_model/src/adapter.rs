//! Uniform "predict class probabilities" surface over a resolved artifact

use serde_json::Value;
use std::path::Path;

use crate::artifact::{declared_feature_names, load_document, ResolvedModel};
use crate::backend::{BackendError, Estimator};

/// Capability offered by a loaded model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Probability,
    LabelOnly,
    None,
}

/// Probabilities plus whether they came from the uniform fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbaOutcome {
    pub probabilities: Vec<f64>,
    pub using_fallback: bool,
}

/// Non-informative distribution over `n_classes` classes.
pub fn uniform(n_classes: usize) -> Vec<f64> {
    let n = n_classes.max(1);
    vec![1.0 / n as f64; n]
}

/// Wraps a model of unknown concrete shape.
///
/// The artifact is resolved once at construction; every call afterwards
/// delegates to the resolved estimator or reports that none exists.
#[derive(Debug, Clone)]
pub struct InferenceAdapter {
    name: String,
    resolved: ResolvedModel,
    feature_names: Option<Vec<String>>,
    fallback_classes: usize,
}

impl InferenceAdapter {
    pub fn new(name: impl Into<String>, resolved: ResolvedModel) -> Self {
        let feature_names = resolved
            .estimator()
            .and_then(|e| e.feature_names().map(<[String]>::to_vec));
        Self {
            name: name.into(),
            resolved,
            feature_names,
            fallback_classes: 2,
        }
    }

    /// Resolve a parsed artifact document. Container-level `feature_names`
    /// are used when the estimator declares none.
    pub fn from_document(name: impl Into<String>, document: &Value) -> Self {
        let mut adapter = Self::new(name, ResolvedModel::resolve(document));
        if adapter.feature_names.is_none() {
            adapter.feature_names = declared_feature_names(document);
        }
        adapter
    }

    pub fn load(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let name = name.into();
        let document = load_document(path.as_ref())?;
        let adapter = Self::from_document(name, &document);
        log::info!(
            "loaded model '{}' from {}: {}",
            adapter.name,
            path.as_ref().display(),
            adapter.resolved
        );
        Ok(adapter)
    }

    /// Number of classes reported by the uniform fallback.
    pub fn with_fallback_classes(mut self, n_classes: usize) -> Self {
        self.fallback_classes = n_classes.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolved(&self) -> &ResolvedModel {
        &self.resolved
    }

    /// True when a real estimator sits behind the handle.
    pub fn is_usable(&self) -> bool {
        self.resolved.estimator().is_some()
    }

    pub fn capability(&self) -> Capability {
        match self.resolved.estimator() {
            Some(e) if e.as_probability().is_some() => Capability::Probability,
            Some(e) if e.as_label().is_some() => Capability::LabelOnly,
            _ => Capability::None,
        }
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    pub fn n_features(&self) -> Option<usize> {
        self.resolved
            .estimator()
            .and_then(|e| e.n_features())
            .or_else(|| self.feature_names.as_ref().map(Vec::len))
    }

    /// Delegate to the estimator's probability capability.
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, BackendError> {
        let estimator = self.resolved.estimator().ok_or_else(|| {
            BackendError::Unsupported(format!("model '{}' has no usable estimator", self.name))
        })?;
        let proba = estimator.as_probability().ok_or_else(|| {
            BackendError::Unsupported(format!(
                "model '{}' ({}) cannot predict probabilities",
                self.name,
                estimator.kind()
            ))
        })?;
        proba.predict_proba(features)
    }

    pub fn predict_label(&self, features: &[f64]) -> Result<f64, BackendError> {
        let estimator = self.resolved.estimator().ok_or_else(|| {
            BackendError::Unsupported(format!("model '{}' has no usable estimator", self.name))
        })?;
        let labeler = estimator.as_label().ok_or_else(|| {
            BackendError::Unsupported(format!(
                "model '{}' ({}) cannot predict labels",
                self.name,
                estimator.kind()
            ))
        })?;
        labeler.predict_label(features)
    }

    /// Like [`predict_proba`](Self::predict_proba) but degrades to a uniform
    /// distribution instead of failing.
    pub fn predict_proba_or_uniform(&self, features: &[f64]) -> ProbaOutcome {
        match self.predict_proba(features) {
            Ok(probabilities) => ProbaOutcome {
                probabilities,
                using_fallback: false,
            },
            Err(e) => {
                log::warn!("model '{}' degraded to uniform output: {e}", self.name);
                ProbaOutcome {
                    probabilities: uniform(self.fallback_classes),
                    using_fallback: true,
                }
            }
        }
    }
}
