use sepsis_model::BackendError;
use thiserror::Error;

/// Errors surfaced by the triage pipelines.
///
/// Unmatched fields and scaling problems are recovered locally and never
/// reach this type.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("Model artifacts not loaded: {0}")]
    ArtifactMissing(String),
    #[error("Malformed artifact: {0}")]
    MalformedArtifact(String),
    #[error("Severity inference failed: {0}")]
    InferenceFailure(#[from] BackendError),
}
