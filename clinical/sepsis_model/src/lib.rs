//! Estimator artifacts and inference for sepsis risk models
//!
//! Model artifacts are JSON documents. A document is either an estimator
//! (tagged by `kind`) or a container holding one; the container is resolved
//! once into a [`ResolvedModel`] and wrapped by an [`InferenceAdapter`] that
//! exposes a uniform probability/label surface with an explicit degraded mode.

pub mod adapter;
pub mod artifact;
pub mod backend;
pub mod estimators;

pub use adapter::{uniform, Capability, InferenceAdapter, ProbaOutcome};
pub use artifact::{declared_feature_names, load_document, ResolvedModel, CONVENTIONAL_FIELDS};
pub use backend::{BackendError, Estimator, LabelCapable, ProbabilityCapable};
pub use estimators::{
    argmax, DecisionTree, EstimatorSpec, ForestClassifier, LinearClassifier, RuleClassifier,
    TreeNode,
};
