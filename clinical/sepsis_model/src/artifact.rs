//! Model artifact documents and one-time container resolution
//!
//! A model artifact is either an estimator document (tagged by `kind`) or a
//! container object that holds one somewhere inside it. Resolution happens
//! once when the artifact is loaded; requests never search the document.

use serde_json::Value;
use std::fmt;
use std::path::Path;

use crate::backend::{BackendError, Estimator};
use crate::estimators::EstimatorSpec;

/// Field names conventionally used by training pipelines to hold the fitted
/// estimator, searched in this order before a full scan.
pub const CONVENTIONAL_FIELDS: &[&str] = &[
    "model",
    "estimator",
    "classifier",
    "clf",
    "best_estimator_",
    "base_estimator",
    "final_estimator",
    "pipeline",
];

/// Where the usable estimator of an artifact was found.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedModel {
    /// The document itself is an estimator.
    DirectClassifier(EstimatorSpec),
    /// Found under one of [`CONVENTIONAL_FIELDS`].
    ContainerWithNamedField {
        field: String,
        estimator: EstimatorSpec,
    },
    /// Found by scanning every field, one level of nesting deep.
    ContainerWithListedFields {
        path: String,
        estimator: EstimatorSpec,
    },
    /// No usable estimator anywhere in the document.
    Unknown,
}

impl ResolvedModel {
    pub fn resolve(document: &Value) -> Self {
        if let Some(estimator) = as_estimator(document) {
            return ResolvedModel::DirectClassifier(estimator);
        }

        let Some(fields) = document.as_object() else {
            log::warn!("model artifact is neither an estimator nor a container");
            return ResolvedModel::Unknown;
        };

        for name in CONVENTIONAL_FIELDS {
            if let Some(estimator) = fields.get(*name).and_then(as_estimator) {
                return ResolvedModel::ContainerWithNamedField {
                    field: (*name).to_string(),
                    estimator,
                };
            }
        }

        for (key, value) in fields {
            if let Some(estimator) = as_estimator(value) {
                return ResolvedModel::ContainerWithListedFields {
                    path: key.clone(),
                    estimator,
                };
            }
            match value {
                Value::Object(inner) => {
                    for (k, v) in inner {
                        if let Some(estimator) = as_estimator(v) {
                            return ResolvedModel::ContainerWithListedFields {
                                path: format!("{key}.{k}"),
                                estimator,
                            };
                        }
                    }
                }
                Value::Array(items) => {
                    for (i, v) in items.iter().enumerate() {
                        if let Some(estimator) = as_estimator(v) {
                            return ResolvedModel::ContainerWithListedFields {
                                path: format!("{key}[{i}]"),
                                estimator,
                            };
                        }
                    }
                }
                _ => {}
            }
        }

        log::warn!("no usable estimator found in model container");
        ResolvedModel::Unknown
    }

    pub fn estimator(&self) -> Option<&EstimatorSpec> {
        match self {
            ResolvedModel::DirectClassifier(e) => Some(e),
            ResolvedModel::ContainerWithNamedField { estimator, .. }
            | ResolvedModel::ContainerWithListedFields { estimator, .. } => Some(estimator),
            ResolvedModel::Unknown => None,
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            ResolvedModel::DirectClassifier(_) => "direct_classifier",
            ResolvedModel::ContainerWithNamedField { .. } => "container_named_field",
            ResolvedModel::ContainerWithListedFields { .. } => "container_listed_fields",
            ResolvedModel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ResolvedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedModel::DirectClassifier(e) => write!(f, "{} classifier", e.kind()),
            ResolvedModel::ContainerWithNamedField { field, estimator } => {
                write!(f, "{} classifier in field '{field}'", estimator.kind())
            }
            ResolvedModel::ContainerWithListedFields { path, estimator } => {
                write!(f, "{} classifier at '{path}'", estimator.kind())
            }
            ResolvedModel::Unknown => write!(f, "no usable estimator"),
        }
    }
}

/// Parse a value as a valid estimator document. Anything that is not an
/// object with a `kind` field, fails to parse, or fails validation is
/// simply not an estimator.
fn as_estimator(value: &Value) -> Option<EstimatorSpec> {
    value.as_object()?.get("kind")?;
    match serde_json::from_value::<EstimatorSpec>(value.clone()) {
        Ok(estimator) => match estimator.validate() {
            Ok(()) => Some(estimator),
            Err(e) => {
                log::warn!("ignoring invalid estimator document: {e}");
                None
            }
        },
        Err(e) => {
            log::debug!("value with a kind tag is not an estimator: {e}");
            None
        }
    }
}

/// Feature names declared at container level (`feature_names` array).
pub fn declared_feature_names(document: &Value) -> Option<Vec<String>> {
    let names = document.get("feature_names")?.as_array()?;
    names
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// Read and parse a JSON artifact from disk.
pub fn load_document(path: impl AsRef<Path>) -> Result<Value, BackendError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| BackendError::LoadError(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| BackendError::SerializationError(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn linear_doc() -> Value {
        json!({"kind": "linear", "coef": [[1.0, 0.0]], "intercept": [0.0]})
    }

    #[test]
    fn direct_document_resolves_directly() {
        let resolved = ResolvedModel::resolve(&linear_doc());
        assert_eq!(resolved.variant_name(), "direct_classifier");
        assert_eq!(resolved.to_string(), "linear classifier");
    }

    #[test]
    fn conventional_field_wins_over_scan_order() {
        let doc = json!({
            "aaa": linear_doc(),
            "classifier": {"kind": "rule", "weights": [1.0, 1.0]},
        });
        let resolved = ResolvedModel::resolve(&doc);
        match resolved {
            ResolvedModel::ContainerWithNamedField { field, estimator } => {
                assert_eq!(field, "classifier");
                assert_eq!(estimator.kind(), "rule");
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn nested_values_are_scanned_one_level_deep() {
        let doc = json!({
            "version": 3,
            "steps": [{"name": "scaler"}, linear_doc()],
        });
        match ResolvedModel::resolve(&doc) {
            ResolvedModel::ContainerWithListedFields { path, .. } => assert_eq!(path, "steps[1]"),
            other => panic!("unexpected resolution: {other:?}"),
        }

        let doc = json!({"wrapper": {"inner": linear_doc()}});
        match ResolvedModel::resolve(&doc) {
            ResolvedModel::ContainerWithListedFields { path, .. } => {
                assert_eq!(path, "wrapper.inner")
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn deeper_nesting_is_not_searched() {
        let doc = json!({"a": {"b": {"c": linear_doc()}}});
        assert_eq!(ResolvedModel::resolve(&doc), ResolvedModel::Unknown);
    }

    #[test]
    fn placeholder_container_is_unknown() {
        let doc = json!({"model": null, "notes": "placeholder", "feature_names": ["a"]});
        let resolved = ResolvedModel::resolve(&doc);
        assert_eq!(resolved, ResolvedModel::Unknown);
        assert!(resolved.estimator().is_none());
    }

    #[test]
    fn invalid_estimator_is_skipped() {
        let doc = json!({
            "model": {"kind": "linear", "coef": [], "intercept": []},
            "backup": linear_doc(),
        });
        assert_eq!(
            ResolvedModel::resolve(&doc).variant_name(),
            "container_listed_fields"
        );
    }

    #[test]
    fn container_feature_names_are_read() {
        let doc = json!({"model": linear_doc(), "feature_names": ["hr", "temp"]});
        assert_eq!(
            declared_feature_names(&doc),
            Some(vec!["hr".to_string(), "temp".to_string()])
        );
        assert_eq!(declared_feature_names(&json!({"feature_names": [1, 2]})), None);
    }

    #[test]
    fn load_document_reports_missing_file() {
        let err = load_document("/nonexistent/model.json").unwrap_err();
        assert!(matches!(err, BackendError::LoadError(_)));
    }
}
