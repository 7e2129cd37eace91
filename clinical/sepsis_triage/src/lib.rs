//! Sepsis triage pipelines
//!
//! Severity requests are reconciled, resolved onto the model's training
//! schema, z-scaled, classified and finally checked by deterministic
//! guardrails. Early-warning requests go through a separate two-stage
//! composer with heuristic fallbacks. All artifacts live in a
//! [`ClinicalContext`] that is built once and then only read.

pub mod alias;
pub mod context;
pub mod early_warning;
pub mod error;
pub mod guardrail;
pub mod record;
pub mod resolver;
pub mod scaler;
pub mod severity;
pub mod vector;

pub use alias::{AliasTable, BUILTIN_ALIASES};
pub use context::{ArtifactPaths, ClinicalContext, ContextStatus};
pub use early_warning::{
    AlertFactor, AlertStatus, EarlyWarningComposer, EarlyWarningInput, EarlyWarningResult,
    FeatureBreakdown, VitalsLayout, ALERT_THRESHOLD,
};
pub use error::TriageError;
pub use guardrail::{
    Finding, GuardrailDecision, GuardrailEngine, GuardrailProfile, ProfileSelection,
    SeverityClass,
};
pub use record::{PatientRecord, SCHEMA_FIELDS};
pub use resolver::{FeatureResolver, MatchTier, Resolution};
pub use scaler::{ClinicalBridge, FeatureStats, ScaleTrace};
pub use severity::{FieldResolution, PredictionResult, ScaledInput, SeverityModel};
pub use vector::FeatureVector;
