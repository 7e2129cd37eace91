//! Capability traits and error types shared by every estimator kind

use thiserror::Error;

/// Errors that can occur while loading or evaluating an estimator
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Model loading failed: {0}")]
    LoadError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Inference failed: {0}")]
    InferenceError(String),
    #[error("Capability not supported: {0}")]
    Unsupported(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// An estimator that returns one probability per class.
pub trait ProbabilityCapable: Send + Sync {
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, BackendError>;
}

/// An estimator that only returns a predicted label.
pub trait LabelCapable: Send + Sync {
    fn predict_label(&self, features: &[f64]) -> Result<f64, BackendError>;
}

/// Common surface of a concrete estimator.
///
/// Capabilities are exposed as optional trait objects so callers can ask
/// "can this predict probabilities?" without knowing the concrete kind.
pub trait Estimator: Send + Sync {
    /// Short identifier of the estimator kind (`linear`, `forest`, ...)
    fn kind(&self) -> &str;

    /// Number of input features, when the estimator knows it
    fn n_features(&self) -> Option<usize>;

    /// Training column names, when the artifact declares them
    fn feature_names(&self) -> Option<&[String]>;

    fn as_probability(&self) -> Option<&dyn ProbabilityCapable>;

    fn as_label(&self) -> Option<&dyn LabelCapable>;
}

pub(crate) fn check_width(expected: usize, features: &[f64]) -> Result<(), BackendError> {
    if features.len() != expected {
        return Err(BackendError::InvalidInput(format!(
            "Expected {} features, got {}",
            expected,
            features.len()
        )));
    }
    Ok(())
}

pub(crate) fn check_finite(values: &[f64]) -> Result<(), BackendError> {
    if values.is_empty() {
        return Err(BackendError::InferenceError(
            "estimator produced an empty output".into(),
        ));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(BackendError::InferenceError(format!(
            "estimator produced a non-finite value: {bad}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_mismatch_is_invalid_input() {
        let err = check_width(3, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, BackendError::InvalidInput(_)));
        assert_eq!(err.to_string(), "Invalid input: Expected 3 features, got 2");
    }

    #[test]
    fn non_finite_output_is_inference_error() {
        assert!(check_finite(&[0.2, 0.8]).is_ok());
        assert!(matches!(
            check_finite(&[0.2, f64::NAN]),
            Err(BackendError::InferenceError(_))
        ));
        assert!(check_finite(&[]).is_err());
    }
}
