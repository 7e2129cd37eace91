//! Concrete estimator kinds understood by the artifact loader

pub mod forest;
pub mod linear;
pub mod rule;

pub use forest::{DecisionTree, ForestClassifier, TreeNode};
pub use linear::LinearClassifier;
pub use rule::RuleClassifier;

use serde::{Deserialize, Serialize};

use crate::backend::{BackendError, Estimator, LabelCapable, ProbabilityCapable};

/// An estimator document, discriminated by its `kind` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorSpec {
    Linear(LinearClassifier),
    Forest(ForestClassifier),
    Rule(RuleClassifier),
}

impl EstimatorSpec {
    pub fn validate(&self) -> Result<(), BackendError> {
        match self {
            EstimatorSpec::Linear(m) => m.validate(),
            EstimatorSpec::Forest(m) => m.validate(),
            EstimatorSpec::Rule(m) => m.validate(),
        }
    }

    fn inner(&self) -> &dyn Estimator {
        match self {
            EstimatorSpec::Linear(m) => m,
            EstimatorSpec::Forest(m) => m,
            EstimatorSpec::Rule(m) => m,
        }
    }
}

impl Estimator for EstimatorSpec {
    fn kind(&self) -> &str {
        self.inner().kind()
    }

    fn n_features(&self) -> Option<usize> {
        self.inner().n_features()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.inner().feature_names()
    }

    fn as_probability(&self) -> Option<&dyn ProbabilityCapable> {
        self.inner().as_probability()
    }

    fn as_label(&self) -> Option<&dyn LabelCapable> {
        self.inner().as_label()
    }
}

/// Index of the largest value; the first one wins on ties.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tag_selects_variant() {
        let spec: EstimatorSpec = serde_json::from_str(
            r#"{"kind":"rule","weights":[1.0,2.0],"bias":0.0,"cutoff":1.0}"#,
        )
        .unwrap();
        assert_eq!(spec.kind(), "rule");
        assert_eq!(spec.n_features(), Some(2));
        assert!(spec.as_probability().is_none());
        assert!(spec.as_label().is_some());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let parsed = serde_json::from_str::<EstimatorSpec>(r#"{"kind":"svm","weights":[1.0]}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.3, 0.3, 0.2]), 0);
        assert_eq!(argmax(&[0.1, 0.2, 0.7]), 2);
        assert_eq!(argmax(&[]), 0);
    }
}
