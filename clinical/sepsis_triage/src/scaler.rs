//! Z-score scaling against training reference statistics

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::TriageError;

/// Reference mean and standard deviation of one canonical feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub mean: f64,
    pub std: f64,
}

/// Per-feature reference statistics, keyed by canonical name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClinicalBridge {
    stats: HashMap<String, FeatureStats>,
}

/// What happened to one incoming field on its way into the vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleTrace {
    pub field: String,
    pub slot: String,
    pub original: f64,
    pub scaled: f64,
    /// The raw value was used because scaling produced a non-finite number.
    pub passthrough: bool,
}

impl ClinicalBridge {
    pub fn new(stats: HashMap<String, FeatureStats>) -> Self {
        Self { stats }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TriageError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TriageError::ArtifactMissing(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| TriageError::MalformedArtifact(format!("{}: {e}", path.display())))
    }

    pub fn get(&self, canonical: &str) -> Option<FeatureStats> {
        self.stats.get(canonical).copied()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// `(value - mean) / std` for the slot's statistics.
    ///
    /// Without statistics the value scales to zero (mean = value, std = 1).
    /// A zero std is treated as 1. A non-finite result passes the raw value
    /// through unscaled.
    pub fn scale(&self, field: &str, slot: &str, value: f64) -> ScaleTrace {
        let stats = self.get(slot).unwrap_or(FeatureStats {
            mean: value,
            std: 1.0,
        });
        let std = if stats.std == 0.0 { 1.0 } else { stats.std };
        let z = (value - stats.mean) / std;

        let (scaled, passthrough) = if z.is_finite() {
            (z, false)
        } else {
            log::warn!("scaling {field} into {slot} was not finite; passing {value} through");
            (value, true)
        };
        log::debug!("{field}({value}) -> {slot} (scaled: {scaled:.3})");

        ScaleTrace {
            field: field.to_string(),
            slot: slot.to_string(),
            original: value,
            scaled,
            passthrough,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge() -> ClinicalBridge {
        ClinicalBridge::new(HashMap::from([
            (
                "heart_rate".to_string(),
                FeatureStats {
                    mean: 80.0,
                    std: 20.0,
                },
            ),
            (
                "gender".to_string(),
                FeatureStats {
                    mean: 0.5,
                    std: 0.0,
                },
            ),
            (
                "lactate".to_string(),
                FeatureStats {
                    mean: 1.0,
                    std: f64::MIN_POSITIVE,
                },
            ),
        ]))
    }

    #[test]
    fn z_score_uses_bridge_stats() {
        let t = bridge().scale("HR", "heart_rate", 120.0);
        assert_eq!(t.scaled, 2.0);
        assert!(!t.passthrough);
        assert_eq!(t.original, 120.0);
        assert_eq!(t.slot, "heart_rate");
    }

    #[test]
    fn missing_stats_scale_to_zero() {
        let t = bridge().scale("Age", "age", 67.0);
        assert_eq!(t.scaled, 0.0);
        assert!(!t.passthrough);
    }

    #[test]
    fn zero_std_is_treated_as_one() {
        let t = bridge().scale("Gender", "gender", 1.0);
        assert_eq!(t.scaled, 0.5);
    }

    #[test]
    fn overflow_passes_raw_value_through() {
        let t = bridge().scale("Lactate", "lactate", 1.0e300);
        assert!(t.passthrough);
        assert_eq!(t.scaled, 1.0e300);
    }

    #[test]
    fn bridge_deserializes_from_object() {
        let b: ClinicalBridge =
            serde_json::from_str(r#"{"lactate": {"mean": 1.5, "std": 0.8}}"#).unwrap();
        assert_eq!(
            b.get("lactate"),
            Some(FeatureStats {
                mean: 1.5,
                std: 0.8
            })
        );
        assert_eq!(b.len(), 1);
    }
}
