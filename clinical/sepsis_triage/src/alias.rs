//! External field name to canonical feature name table

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::TriageError;

/// Bedside/UI field names mapped onto model training columns.
///
/// `EtCO2` and `PaCO2` both feed `partial_co2`; when both are present the
/// later field in schema order overwrites the earlier one.
pub const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("HR", "heart_rate"),
    ("SBP", "systolic_bp"),
    ("DBP", "diastolic_bp"),
    ("MAP", "mean_bp"),
    ("O2Sat", "oxygen_saturation"),
    ("Temp", "temperature"),
    ("Resp", "respiratory_rate"),
    ("WBC", "leukocytes"),
    ("Platelets", "thrombocytes"),
    ("Lactate", "lactate"),
    ("Glucose", "blood_glucose"),
    ("Creatinine", "creatinine"),
    ("Age", "age"),
    ("EtCO2", "partial_co2"),
    ("PaCO2", "partial_co2"),
    ("BaseExcess", "base_excess"),
    ("HCO3", "bicarbonate"),
    ("FiO2", "fio2"),
    ("pH", "ph"),
    ("SaO2", "arterial_saturation"),
    ("AST", "ast"),
    ("BUN", "blood_urea_nitrogen"),
    ("Alkalinephos", "alkaline_phosphatase"),
    ("Calcium", "calcium"),
    ("Chloride", "chloride"),
    ("Bilirubin_direct", "bilirubin_direct"),
    ("Magnesium", "magnesium"),
    ("Phosphate", "phosphate"),
    ("Potassium", "potassium"),
    ("Bilirubin_total", "bilirubin_total"),
    ("TroponinI", "troponin_i"),
    ("Hct", "hematocrit"),
    ("Hgb", "hemoglobin"),
    ("PTT", "ptt"),
    ("Fibrinogen", "fibrinogen"),
    ("Gender", "gender"),
    ("HospAdmTime", "hospital_admission_time"),
    ("ICULOS", "icu_length_of_stay"),
    ("SOFA_score", "sofa_score"),
    ("SOFA_cardio", "sofa_cardio"),
    ("Shock_Index", "shock_index"),
];

/// Read-only alias table, loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    pub fn builtin() -> Self {
        Self::from_pairs(BUILTIN_ALIASES.iter().copied())
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TriageError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TriageError::ArtifactMissing(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| TriageError::MalformedArtifact(format!("{}: {e}", path.display())))
    }

    /// Canonical target for an external name (exact key match).
    pub fn get(&self, external: &str) -> Option<&str> {
        self.entries.get(external).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
