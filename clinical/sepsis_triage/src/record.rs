//! Severity request record: bedside vitals, labs and demographics

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

macro_rules! patient_fields {
    ($( $field:ident => $name:literal = $default:expr, $doc:literal; )*) => {
        /// Full clinical feature set of a severity request.
        ///
        /// Every field has a clinically normal default. Fields outside the
        /// schema are kept in `extra`; the numeric ones are routed through the
        /// resolver and the rest are reported as unmatched.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct PatientRecord {
            $(
                #[doc = $doc]
                #[serde(rename = $name)]
                pub $field: f64,
            )*
            #[serde(flatten)]
            pub extra: BTreeMap<String, Value>,
        }

        impl Default for PatientRecord {
            fn default() -> Self {
                Self {
                    $( $field: $default, )*
                    extra: BTreeMap::new(),
                }
            }
        }

        /// External names of the schema fields, in schema order.
        pub const SCHEMA_FIELDS: &[&str] = &[$( $name, )*];

        impl PatientRecord {
            fn schema_value(&self, name: &str) -> Option<f64> {
                match name {
                    $( $name => Some(self.$field), )*
                    _ => None,
                }
            }

            fn schema_pairs(&self) -> Vec<(&str, f64)> {
                vec![$( ($name, self.$field), )*]
            }
        }
    };
}

patient_fields! {
    hr => "HR" = 80.0, "Heart rate (beats/min)";
    o2_sat => "O2Sat" = 98.0, "Pulse oximetry (%)";
    temp => "Temp" = 37.0, "Temperature (°C)";
    sbp => "SBP" = 120.0, "Systolic blood pressure (mm Hg)";
    map => "MAP" = 90.0, "Mean arterial pressure (mm Hg)";
    dbp => "DBP" = 80.0, "Diastolic blood pressure (mm Hg)";
    resp => "Resp" = 18.0, "Respiration rate (breaths/min)";
    etco2 => "EtCO2" = 35.0, "End-tidal carbon dioxide (mm Hg)";
    base_excess => "BaseExcess" = 0.0, "Excess bicarbonate (mmol/L)";
    hco3 => "HCO3" = 24.0, "Bicarbonate (mmol/L)";
    fio2 => "FiO2" = 21.0, "Fraction of inspired oxygen (%)";
    ph => "pH" = 7.4, "Arterial pH";
    paco2 => "PaCO2" = 40.0, "Arterial partial pressure of CO2 (mm Hg)";
    sao2 => "SaO2" = 98.0, "Arterial oxygen saturation (%)";
    ast => "AST" = 25.0, "Aspartate transaminase (IU/L)";
    bun => "BUN" = 15.0, "Blood urea nitrogen (mg/dL)";
    alkalinephos => "Alkalinephos" = 80.0, "Alkaline phosphatase (IU/L)";
    calcium => "Calcium" = 9.5, "Calcium (mg/dL)";
    chloride => "Chloride" = 100.0, "Chloride (mmol/L)";
    creatinine => "Creatinine" = 1.0, "Creatinine (mg/dL)";
    bilirubin_direct => "Bilirubin_direct" = 0.2, "Direct bilirubin (mg/dL)";
    glucose => "Glucose" = 100.0, "Serum glucose (mg/dL)";
    lactate => "Lactate" = 1.0, "Lactic acid (mmol/L)";
    magnesium => "Magnesium" = 2.0, "Magnesium (mmol/dL)";
    phosphate => "Phosphate" = 3.5, "Phosphate (mg/dL)";
    potassium => "Potassium" = 4.0, "Potassium (mmol/L)";
    bilirubin_total => "Bilirubin_total" = 0.8, "Total bilirubin (mg/dL)";
    troponin_i => "TroponinI" = 0.01, "Troponin I (ng/mL)";
    hct => "Hct" = 42.0, "Hematocrit (%)";
    hgb => "Hgb" = 14.0, "Hemoglobin (g/dL)";
    ptt => "PTT" = 30.0, "Partial thromboplastin time (s)";
    wbc => "WBC" = 7.0, "Leukocyte count (10^3/µL)";
    fibrinogen => "Fibrinogen" = 300.0, "Fibrinogen (mg/dL)";
    platelets => "Platelets" = 250.0, "Platelet count (10^3/µL)";
    age => "Age" = 45.0, "Age (years)";
    gender => "Gender" = 1.0, "Female (0) or Male (1)";
    unit1 => "Unit1" = 0.0, "Administrative identifier for ICU unit (MICU)";
    unit2 => "Unit2" = 0.0, "Administrative identifier for ICU unit (SICU)";
    hosp_adm_time => "HospAdmTime" = 0.0, "Hours between hospital admit and ICU admit";
    iculos => "ICULOS" = 0.0, "ICU length of stay (hours)";
    hour => "Hour" = 0.0, "Hour of the observation window";
    sofa_score => "SOFA_score" = 0.0, "Sequential Organ Failure Assessment total";
    sofa_cardio => "SOFA_cardio" = 0.0, "Cardiovascular SOFA component";
    shock_index => "Shock_Index" = 0.67, "Heart rate over systolic pressure";
    map_calc => "MAP_Calc" = 90.0, "Mean arterial pressure derived from SBP/DBP";
}

fn derived_map(sbp: f64, dbp: f64) -> f64 {
    (sbp + 2.0 * dbp) / 3.0
}

impl PatientRecord {
    /// Raw (unscaled) value of a field, schema or extra.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema_value(name)
            .or_else(|| self.extra.get(name).and_then(Value::as_f64))
    }

    /// All numeric fields as `(external name, value)` pairs: schema order
    /// first, then numeric extra fields in name order.
    pub fn fields(&self) -> Vec<(&str, f64)> {
        let mut pairs = self.schema_pairs();
        pairs.extend(
            self.extra
                .iter()
                .filter_map(|(k, v)| v.as_f64().map(|v| (k.as_str(), v))),
        );
        pairs
    }

    /// Extra fields that carry no number (identifiers, notes, nulls).
    pub fn non_numeric_fields(&self) -> impl Iterator<Item = &str> {
        self.extra
            .iter()
            .filter(|(_, v)| v.as_f64().is_none())
            .map(|(k, _)| k.as_str())
    }

    /// Fill derived and inconsistent fields the way the bedside form does:
    /// SOFA total is never below its cardiovascular component, and missing
    /// MAP / MAP_Calc / Shock_Index are derived from the other vitals.
    pub fn reconcile(&mut self) {
        if self.sofa_cardio > self.sofa_score {
            self.sofa_score = self.sofa_cardio;
        }
        if self.map == 0.0 || !self.map.is_finite() {
            self.map = derived_map(self.sbp, self.dbp);
        }
        if self.map_calc == 0.0 || !self.map_calc.is_finite() {
            self.map_calc = derived_map(self.sbp, self.dbp);
        }
        if self.shock_index == 0.0 && self.sbp > 0.0 {
            self.shock_index = self.hr / self.sbp;
        }
    }
}
