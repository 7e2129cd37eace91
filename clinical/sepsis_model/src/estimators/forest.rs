//! Decision tree ensembles with class-count leaves

use serde::{Deserialize, Serialize};

use crate::backend::{check_finite, BackendError, Estimator, LabelCapable, ProbabilityCapable};

/// A node of a flattened decision tree. Samples with
/// `x[feature] <= threshold` go to `left`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf and return its normalized distribution.
    pub fn leaf_distribution(&self, features: &[f64]) -> Result<Vec<f64>, BackendError> {
        let mut idx = 0usize;
        // a well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..=self.nodes.len() {
            let node = self.nodes.get(idx).ok_or_else(|| {
                BackendError::InferenceError(format!("tree references missing node {idx}"))
            })?;
            match node {
                TreeNode::Leaf { value } => return normalize(value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = features.get(*feature).ok_or_else(|| {
                        BackendError::InvalidInput(format!(
                            "tree splits on feature {} but only {} were supplied",
                            feature,
                            features.len()
                        ))
                    })?;
                    idx = if *x <= *threshold { *left } else { *right };
                }
            }
        }
        Err(BackendError::InferenceError(
            "tree traversal did not terminate".into(),
        ))
    }

    fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                TreeNode::Split { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }
}

fn normalize(counts: &[f64]) -> Result<Vec<f64>, BackendError> {
    let total: f64 = counts.iter().sum();
    if counts.is_empty() || total <= 0.0 || !total.is_finite() {
        return Err(BackendError::InferenceError(
            "leaf has no usable class counts".into(),
        ));
    }
    Ok(counts.iter().map(|c| c / total).collect())
}

/// Averaged ensemble of decision trees (random-forest style voting).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestClassifier {
    pub trees: Vec<DecisionTree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_features: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl ForestClassifier {
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.trees.is_empty() || self.trees.iter().any(|t| t.nodes.is_empty()) {
            return Err(BackendError::LoadError(
                "forest must contain non-empty trees".into(),
            ));
        }
        if let (Some(n), Some(max)) = (
            self.n_features(),
            self.trees.iter().filter_map(DecisionTree::max_feature).max(),
        ) {
            if max >= n {
                return Err(BackendError::LoadError(format!(
                    "forest splits on feature {max} but declares {n} features"
                )));
            }
        }
        Ok(())
    }
}

impl ProbabilityCapable for ForestClassifier {
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, BackendError> {
        if let Some(n) = self.n_features() {
            crate::backend::check_width(n, features)?;
        }
        let mut acc: Vec<f64> = Vec::new();
        for tree in &self.trees {
            let dist = tree.leaf_distribution(features)?;
            if acc.is_empty() {
                acc = vec![0.0; dist.len()];
            }
            if dist.len() != acc.len() {
                return Err(BackendError::InferenceError(format!(
                    "trees disagree on class count ({} vs {})",
                    dist.len(),
                    acc.len()
                )));
            }
            for (a, d) in acc.iter_mut().zip(dist) {
                *a += d;
            }
        }
        let n_trees = self.trees.len() as f64;
        let probs: Vec<f64> = acc.into_iter().map(|a| a / n_trees).collect();
        check_finite(&probs)?;
        Ok(probs)
    }
}

impl LabelCapable for ForestClassifier {
    fn predict_label(&self, features: &[f64]) -> Result<f64, BackendError> {
        let probs = self.predict_proba(features)?;
        let idx = super::argmax(&probs);
        Ok(match &self.classes {
            Some(classes) => classes.get(idx).copied().unwrap_or(idx as f64),
            None => idx as f64,
        })
    }
}

impl Estimator for ForestClassifier {
    fn kind(&self) -> &str {
        "forest"
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
            .or_else(|| self.feature_names.as_ref().map(Vec::len))
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
