//! Deterministic clinical overrides on top of the severity model
//!
//! Guardrails only ever escalate a Healthy prediction to Severe. Mild and
//! Severe predictions pass through untouched.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity classes in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityClass {
    Healthy,
    Mild,
    Severe,
}

impl SeverityClass {
    pub const ALL: [SeverityClass; 3] = [
        SeverityClass::Healthy,
        SeverityClass::Mild,
        SeverityClass::Severe,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            SeverityClass::Healthy => "Healthy",
            SeverityClass::Mild => "Mild Sepsis",
            SeverityClass::Severe => "Severe/Critical",
        }
    }
}

/// Which threshold set is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailProfile {
    /// Vitals, lactate and SOFA only.
    Basic,
    /// Basic plus organ-dysfunction labs.
    Extended,
}

/// Profile choice from configuration; `Auto` follows the model schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSelection {
    #[default]
    Auto,
    Basic,
    Extended,
}

/// Largest schema still treated as the compact vitals-and-core-labs layout.
pub const COMPACT_SCHEMA_MAX_FEATURES: usize = 14;

impl ProfileSelection {
    pub fn resolve(self, n_features: usize) -> GuardrailProfile {
        match self {
            ProfileSelection::Basic => GuardrailProfile::Basic,
            ProfileSelection::Extended => GuardrailProfile::Extended,
            ProfileSelection::Auto if n_features <= COMPACT_SCHEMA_MAX_FEATURES => {
                GuardrailProfile::Basic
            }
            ProfileSelection::Auto => GuardrailProfile::Extended,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    Above(f64),
    Below(f64),
    AtLeast(f64),
}

impl Comparison {
    fn holds(self, value: f64) -> bool {
        match self {
            Comparison::Above(t) => value > t,
            Comparison::Below(t) => value < t,
            Comparison::AtLeast(t) => value >= t,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Above(t) => write!(f, "> {t:?}"),
            Comparison::Below(t) => write!(f, "< {t:?}"),
            Comparison::AtLeast(t) => write!(f, ">= {t:?}"),
        }
    }
}

/// A critical threshold on one raw request field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardrailRule {
    pub field: &'static str,
    pub comparison: Comparison,
}

const fn rule(field: &'static str, comparison: Comparison) -> GuardrailRule {
    GuardrailRule { field, comparison }
}

pub const BASIC_RULES: &[GuardrailRule] = &[
    rule("HR", Comparison::Above(130.0)),
    rule("SBP", Comparison::Below(85.0)),
    rule("Lactate", Comparison::Above(4.0)),
    rule("O2Sat", Comparison::Below(88.0)),
    rule("SOFA_score", Comparison::AtLeast(10.0)),
];

pub const EXTENDED_RULES: &[GuardrailRule] = &[
    rule("WBC", Comparison::Above(30.0)),
    rule("WBC", Comparison::Below(2.0)),
    rule("Platelets", Comparison::Below(100.0)),
    rule("TroponinI", Comparison::Above(0.5)),
    rule("Creatinine", Comparison::Above(2.0)),
    rule("Bilirubin_total", Comparison::Above(3.0)),
    rule("BUN", Comparison::Above(40.0)),
];

/// A rule that held for this request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub field: &'static str,
    pub value: f64,
    pub threshold: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} {}", self.field, self.value, self.threshold)
    }
}

/// Findings listed in an override reason.
pub const MAX_REASON_FINDINGS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct GuardrailDecision {
    pub raw: SeverityClass,
    pub final_class: SeverityClass,
    pub is_override: bool,
    pub reason: Option<String>,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardrailEngine {
    profile: GuardrailProfile,
}

impl GuardrailEngine {
    pub fn new(profile: GuardrailProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> GuardrailProfile {
        self.profile
    }

    pub fn rules(&self) -> impl Iterator<Item = &'static GuardrailRule> {
        let extended: &'static [GuardrailRule] = match self.profile {
            GuardrailProfile::Basic => &[],
            GuardrailProfile::Extended => EXTENDED_RULES,
        };
        BASIC_RULES.iter().chain(extended.iter())
    }

    /// Every rule that holds for the raw observations, in rule order.
    pub fn findings(&self, observe: impl Fn(&str) -> Option<f64>) -> Vec<Finding> {
        self.rules()
            .filter_map(|r| {
                let value = observe(r.field)?;
                r.comparison.holds(value).then(|| Finding {
                    field: r.field,
                    value,
                    threshold: r.comparison.to_string(),
                })
            })
            .collect()
    }

    pub fn evaluate(
        &self,
        raw: SeverityClass,
        observe: impl Fn(&str) -> Option<f64>,
    ) -> GuardrailDecision {
        let findings = self.findings(observe);
        if raw != SeverityClass::Healthy || findings.is_empty() {
            return GuardrailDecision {
                raw,
                final_class: raw,
                is_override: false,
                reason: None,
                findings,
            };
        }

        let listed: Vec<String> = findings
            .iter()
            .take(MAX_REASON_FINDINGS)
            .map(Finding::to_string)
            .collect();
        let reason = format!(
            "GUARDRAIL: Critical findings detected (AI was too optimistic): {}",
            listed.join("; ")
        );
        log::info!("guardrail escalated Healthy to Severe: {}", listed.join("; "));

        GuardrailDecision {
            raw,
            final_class: SeverityClass::Severe,
            is_override: true,
            reason: Some(reason),
            findings,
        }
    }
}
