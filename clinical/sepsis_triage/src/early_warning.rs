//! Early-warning risk score from bedside vitals and lactate/creatinine trends
//!
//! Two models are chained: a vitals model turns raw vitals into a risk
//! probability, and a decision engine combines it with lab trends. Either
//! may be missing; each has its own heuristic substitute and the result
//! records which ones were used.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use sepsis_model::{Capability, InferenceAdapter};

use crate::alias::AliasTable;
use crate::resolver::FeatureResolver;

/// Scores at or above this raise an alert.
pub const ALERT_THRESHOLD: f64 = 0.30;

pub const NEUTRAL_DBP: f64 = 80.0;
pub const NEUTRAL_O2_SAT: f64 = 98.0;
pub const NEUTRAL_RESP: f64 = 16.0;

/// Slot order assumed for a vitals model that declares no feature names.
pub const FIXED_VITALS_LAYOUT: [&str; 7] = ["HR", "O2Sat", "Temp", "SBP", "MAP", "DBP", "Resp"];
/// Slot order for a three-feature vitals model.
pub const MINIMAL_VITALS_LAYOUT: [&str; 3] = ["HR", "Temp", "SBP"];

const VITALS_FACTOR_THRESHOLD: f64 = 0.65;
const LACTATE_FACTOR_THRESHOLD: f64 = 2.0;
const TREND_FACTOR_THRESHOLD: f64 = 0.5;
const CREATININE_FACTOR_THRESHOLD: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarlyWarningInput {
    #[serde(rename = "HR")]
    pub hr: f64,
    #[serde(rename = "Temp")]
    pub temp: f64,
    #[serde(rename = "SBP")]
    pub sbp: f64,
    #[serde(rename = "Lactate")]
    pub lactate: f64,
    #[serde(rename = "Baseline_Lactate")]
    pub baseline_lactate: f64,
    #[serde(rename = "Creatinine")]
    pub creatinine: f64,
}

impl Default for EarlyWarningInput {
    fn default() -> Self {
        Self {
            hr: 80.0,
            temp: 37.0,
            sbp: 120.0,
            lactate: 1.0,
            baseline_lactate: 1.0,
            creatinine: 1.0,
        }
    }
}

impl EarlyWarningInput {
    /// Value for a bedside vital; unmeasured vitals take neutral values.
    pub fn vital(&self, name: &str) -> Option<f64> {
        match name {
            "HR" => Some(self.hr),
            "Temp" => Some(self.temp),
            "SBP" => Some(self.sbp),
            "DBP" => Some(NEUTRAL_DBP),
            "O2Sat" => Some(NEUTRAL_O2_SAT),
            "Resp" => Some(NEUTRAL_RESP),
            "MAP" => Some((self.sbp + 2.0 * NEUTRAL_DBP) / 3.0),
            _ => None,
        }
    }

    /// `mean(|HR-80|/100, |Temp-37|/3, max(0, (120-SBP)/120))` in [0, 1].
    pub fn heuristic_vitals_risk(&self) -> f64 {
        let hr = (self.hr - 80.0).abs() / 100.0;
        let temp = (self.temp - 37.0).abs() / 3.0;
        let sbp = ((120.0 - self.sbp) / 120.0).max(0.0);
        clamp_unit((hr + temp + sbp) / 3.0)
    }
}

/// Inputs to the decision engine, in its column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureBreakdown {
    pub vitals_prob: f64,
    pub lactate_max: f64,
    pub lactate_trend: f64,
    pub creatinine_max: f64,
}

impl FeatureBreakdown {
    pub fn to_vec(self) -> Vec<f64> {
        vec![
            self.vitals_prob,
            self.lactate_max,
            self.lactate_trend,
            self.creatinine_max,
        ]
    }

    pub fn weighted_score(&self) -> f64 {
        0.4 * self.vitals_prob
            + 0.3 * (self.lactate_max / 4.0).min(1.0)
            + 0.2 * (self.lactate_trend / 2.0).max(0.0)
            + 0.1 * (self.creatinine_max / 2.0).min(1.0)
    }

    /// Triggered contributing factors, in reporting order.
    pub fn factors(&self) -> Vec<AlertFactor> {
        [
            (AlertFactor::HighVitalsRisk, self.vitals_prob > VITALS_FACTOR_THRESHOLD),
            (AlertFactor::ElevatedLactate, self.lactate_max > LACTATE_FACTOR_THRESHOLD),
            (AlertFactor::RisingLactateTrend, self.lactate_trend > TREND_FACTOR_THRESHOLD),
            (
                AlertFactor::ElevatedCreatinine,
                self.creatinine_max > CREATININE_FACTOR_THRESHOLD,
            ),
        ]
        .into_iter()
        .filter_map(|(factor, hit)| hit.then_some(factor))
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertFactor {
    #[serde(rename = "High vitals risk")]
    HighVitalsRisk,
    #[serde(rename = "Elevated lactate")]
    ElevatedLactate,
    #[serde(rename = "Rising lactate trend")]
    RisingLactateTrend,
    #[serde(rename = "Elevated creatinine")]
    ElevatedCreatinine,
}

impl AlertFactor {
    pub fn label(self) -> &'static str {
        match self {
            AlertFactor::HighVitalsRisk => "High vitals risk",
            AlertFactor::ElevatedLactate => "Elevated lactate",
            AlertFactor::RisingLactateTrend => "Rising lactate trend",
            AlertFactor::ElevatedCreatinine => "Elevated creatinine",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertStatus {
    #[serde(rename = "SEPSIS ALERT")]
    Alert,
    #[serde(rename = "Patient Stable")]
    Stable,
}

impl AlertStatus {
    pub fn from_score(score: f64) -> Self {
        if score >= ALERT_THRESHOLD {
            AlertStatus::Alert
        } else {
            AlertStatus::Stable
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AlertStatus::Alert => "SEPSIS ALERT",
            AlertStatus::Stable => "Patient Stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EarlyWarningResult {
    pub risk_score: f64,
    pub status: AlertStatus,
    pub breakdown: FeatureBreakdown,
    pub factors: Vec<AlertFactor>,
    pub vitals_fallback: bool,
    pub decision_fallback: bool,
}

impl EarlyWarningResult {
    pub fn is_alert(&self) -> bool {
        self.status == AlertStatus::Alert
    }

    pub fn using_fallback(&self) -> bool {
        self.vitals_fallback || self.decision_fallback
    }

    pub fn primary_factor(&self) -> Option<AlertFactor> {
        self.factors.first().copied()
    }
}

/// How the vitals vector is laid out for the loaded vitals model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VitalsLayout {
    /// One entry per declared model column: the bedside vital feeding it.
    Declared(Vec<Option<&'static str>>),
    Fixed,
    Minimal,
    /// No usable vitals model; the heuristic is used.
    Heuristic,
}

impl VitalsLayout {
    fn plan(model: &InferenceAdapter, aliases: &Arc<AliasTable>) -> Self {
        if !model.is_usable() {
            return VitalsLayout::Heuristic;
        }
        if let Some(declared) = model.feature_names() {
            let resolver = FeatureResolver::new(Arc::clone(aliases), declared);
            let mut slots = vec![None; declared.len()];
            for vital in FIXED_VITALS_LAYOUT {
                if let Some(hit) = resolver.resolve(vital) {
                    slots[hit.slot] = Some(vital);
                }
            }
            return VitalsLayout::Declared(slots);
        }
        match model.n_features() {
            Some(n) if n == MINIMAL_VITALS_LAYOUT.len() => VitalsLayout::Minimal,
            Some(n) if n == FIXED_VITALS_LAYOUT.len() => VitalsLayout::Fixed,
            None => VitalsLayout::Fixed,
            Some(n) => {
                log::warn!(
                    "vitals model '{}' expects {n} features and declares no names; using heuristic",
                    model.name()
                );
                VitalsLayout::Heuristic
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VitalsLayout::Declared(_) => "declared",
            VitalsLayout::Fixed => "fixed",
            VitalsLayout::Minimal => "minimal",
            VitalsLayout::Heuristic => "heuristic",
        }
    }

    fn build(&self, input: &EarlyWarningInput) -> Option<Vec<f64>> {
        let from_names = |names: &[&str]| -> Vec<f64> {
            names.iter().map(|n| input.vital(n).unwrap_or(0.0)).collect()
        };
        match self {
            VitalsLayout::Declared(slots) => Some(
                slots
                    .iter()
                    .map(|slot| slot.and_then(|v| input.vital(v)).unwrap_or(0.0))
                    .collect(),
            ),
            VitalsLayout::Fixed => Some(from_names(&FIXED_VITALS_LAYOUT)),
            VitalsLayout::Minimal => Some(from_names(&MINIMAL_VITALS_LAYOUT)),
            VitalsLayout::Heuristic => None,
        }
    }
}

fn clamp_unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Positive-class score from whatever capability the model offers.
fn positive_score(model: &InferenceAdapter, features: &[f64]) -> Option<f64> {
    let score = match model.capability() {
        Capability::Probability => model.predict_proba(features).map(|p| match p.as_slice() {
            [only] => *only,
            [_, positive, ..] => *positive,
            [] => f64::NAN,
        }),
        Capability::LabelOnly => model.predict_label(features),
        Capability::None => return None,
    };
    match score {
        Ok(s) if s.is_finite() => Some(s),
        Ok(s) => {
            log::warn!("model '{}' returned non-finite score {s}", model.name());
            None
        }
        Err(e) => {
            log::warn!("model '{}' failed: {e}", model.name());
            None
        }
    }
}

/// Stateless per-request composer over the optional vitals and decision models.
#[derive(Debug, Clone)]
pub struct EarlyWarningComposer {
    vitals: Option<Arc<InferenceAdapter>>,
    decision: Option<Arc<InferenceAdapter>>,
    layout: VitalsLayout,
}

impl EarlyWarningComposer {
    pub fn new(
        vitals: Option<Arc<InferenceAdapter>>,
        decision: Option<Arc<InferenceAdapter>>,
        aliases: &Arc<AliasTable>,
    ) -> Self {
        let layout = vitals
            .as_deref()
            .map(|m| VitalsLayout::plan(m, aliases))
            .unwrap_or(VitalsLayout::Heuristic);
        // a wrapper around nothing is no decision engine at all
        let decision = decision.filter(|d| {
            let usable = d.is_usable();
            if !usable {
                log::warn!("decision engine '{}' has no estimator; using weighted fallback", d.name());
            }
            usable
        });
        Self {
            vitals,
            decision,
            layout,
        }
    }

    /// Composer with no models; every request takes the heuristic paths.
    pub fn heuristic_only() -> Self {
        Self {
            vitals: None,
            decision: None,
            layout: VitalsLayout::Heuristic,
        }
    }

    pub fn layout(&self) -> &VitalsLayout {
        &self.layout
    }

    pub fn vitals_model(&self) -> Option<&InferenceAdapter> {
        self.vitals.as_deref()
    }

    pub fn decision_engine(&self) -> Option<&InferenceAdapter> {
        self.decision.as_deref()
    }

    fn vitals_probability(&self, input: &EarlyWarningInput) -> (f64, bool) {
        let model_score = self.vitals.as_deref().and_then(|model| {
            let features = self.layout.build(input)?;
            positive_score(model, &features)
        });
        match model_score {
            Some(p) => (clamp_unit(p), false),
            None => {
                log::debug!("vitals risk from heuristic");
                (input.heuristic_vitals_risk(), true)
            }
        }
    }

    pub fn compose(&self, input: &EarlyWarningInput) -> EarlyWarningResult {
        let (vitals_prob, vitals_fallback) = self.vitals_probability(input);
        let breakdown = FeatureBreakdown {
            vitals_prob,
            lactate_max: input.lactate.max(input.baseline_lactate),
            lactate_trend: input.lactate - input.baseline_lactate,
            creatinine_max: input.creatinine,
        };

        let engine_score = self
            .decision
            .as_deref()
            .and_then(|engine| positive_score(engine, &breakdown.to_vec()));
        let decision_fallback = engine_score.is_none();
        let raw = engine_score.unwrap_or_else(|| {
            log::debug!("decision score from weighted fallback");
            breakdown.weighted_score()
        });
        let risk_score = clamp_unit(raw);

        EarlyWarningResult {
            risk_score,
            status: AlertStatus::from_score(risk_score),
            factors: breakdown.factors(),
            breakdown,
            vitals_fallback,
            decision_fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sepsis_model::{EstimatorSpec, LinearClassifier, ResolvedModel, RuleClassifier};

    fn aliases() -> Arc<AliasTable> {
        Arc::new(AliasTable::builtin())
    }

    fn scenario() -> EarlyWarningInput {
        EarlyWarningInput {
            hr: 150.0,
            temp: 37.0,
            sbp: 80.0,
            lactate: 5.0,
            baseline_lactate: 1.0,
            creatinine: 1.2,
        }
    }

    fn linear(coef: Vec<f64>, intercept: f64, names: Option<Vec<&str>>) -> Arc<InferenceAdapter> {
        Arc::new(InferenceAdapter::new(
            "test",
            ResolvedModel::DirectClassifier(EstimatorSpec::Linear(LinearClassifier {
                coef: vec![coef],
                intercept: vec![intercept],
                classes: None,
                feature_names: names.map(|n| n.iter().map(|s| s.to_string()).collect()),
            })),
        ))
    }

    #[test]
    fn heuristic_matches_documented_formula() {
        let risk = scenario().heuristic_vitals_risk();
        assert!((risk - (0.7 + 0.0 + 40.0 / 120.0) / 3.0).abs() < 1e-12);
        assert_eq!(EarlyWarningInput::default().heuristic_vitals_risk(), 0.0);
    }

    #[test]
    fn no_models_uses_weighted_fallback() {
        let result = EarlyWarningComposer::heuristic_only().compose(&scenario());
        let v = (0.7 + 40.0 / 120.0) / 3.0;
        let expected = 0.4 * v + 0.3 + 0.2 * 2.0 + 0.1 * 0.6;
        assert!((result.risk_score - expected).abs() < 1e-9);
        assert!(result.is_alert());
        assert!(result.using_fallback());
        assert!(result.vitals_fallback && result.decision_fallback);
        assert_eq!(result.breakdown.lactate_max, 5.0);
        assert_eq!(result.breakdown.lactate_trend, 4.0);
        assert_eq!(result.primary_factor(), Some(AlertFactor::ElevatedLactate));
        assert_eq!(
            result.factors,
            vec![AlertFactor::ElevatedLactate, AlertFactor::RisingLactateTrend]
        );
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(AlertStatus::from_score(0.30), AlertStatus::Alert);
        assert_eq!(AlertStatus::from_score(0.2999), AlertStatus::Stable);
        assert_eq!(AlertStatus::Stable.label(), "Patient Stable");
    }

    #[test]
    fn weighted_score_is_clamped() {
        let input = EarlyWarningInput {
            hr: 250.0,
            temp: 42.0,
            sbp: 40.0,
            lactate: 20.0,
            baseline_lactate: 0.5,
            creatinine: 9.0,
        };
        let result = EarlyWarningComposer::heuristic_only().compose(&input);
        assert_eq!(result.risk_score, 1.0);
    }

    #[test]
    fn placeholder_decision_engine_counts_as_absent() {
        let placeholder = Arc::new(InferenceAdapter::new("decision", ResolvedModel::Unknown));
        let composer = EarlyWarningComposer::new(None, Some(placeholder), &aliases());
        assert!(composer.decision_engine().is_none());
        assert!(composer.compose(&scenario()).decision_fallback);
    }

    #[test]
    fn label_only_decision_engine_score_is_its_label() {
        let rule = Arc::new(InferenceAdapter::new(
            "decision",
            ResolvedModel::DirectClassifier(EstimatorSpec::Rule(RuleClassifier {
                weights: vec![0.0, 1.0, 0.0, 0.0],
                bias: 0.0,
                cutoff: 3.0,
                feature_names: None,
            })),
        ));
        let composer = EarlyWarningComposer::new(None, Some(rule), &aliases());
        let result = composer.compose(&scenario());
        assert!(!result.decision_fallback);
        assert!(result.vitals_fallback);
        assert_eq!(result.risk_score, 1.0);

        let calm = composer.compose(&EarlyWarningInput::default());
        assert_eq!(calm.risk_score, 0.0);
        assert_eq!(calm.status, AlertStatus::Stable);
    }

    #[test]
    fn declared_vitals_names_are_resolved() {
        // only heart rate matters; declared under its canonical name
        let vitals = linear(vec![0.0, 1.0], -100.0, Some(vec!["age", "heart_rate"]));
        let composer = EarlyWarningComposer::new(Some(vitals), None, &aliases());
        assert_eq!(
            composer.layout(),
            &VitalsLayout::Declared(vec![None, Some("HR")])
        );
        let result = composer.compose(&scenario());
        assert!(!result.vitals_fallback);
        // sigmoid(150 - 100) saturates
        assert!(result.breakdown.vitals_prob > 0.99);
    }

    #[test]
    fn undeclared_layouts_follow_feature_count() {
        let seven = linear(vec![0.0; 7], 0.0, None);
        let three = linear(vec![0.0; 3], 0.0, None);
        let five = linear(vec![0.0; 5], 0.0, None);
        let layout = |m| EarlyWarningComposer::new(Some(m), None, &aliases()).layout().clone();
        assert_eq!(layout(seven), VitalsLayout::Fixed);
        assert_eq!(layout(three), VitalsLayout::Minimal);
        assert_eq!(layout(five), VitalsLayout::Heuristic);
    }

    #[test]
    fn fixed_layout_fills_neutral_vitals() {
        let input = EarlyWarningInput {
            sbp: 110.0,
            ..EarlyWarningInput::default()
        };
        let v = VitalsLayout::Fixed.build(&input).unwrap();
        assert_eq!(v, vec![80.0, 98.0, 37.0, 110.0, 90.0, 80.0, 16.0]);
    }

    #[test]
    fn vitals_model_with_wrong_width_falls_back() {
        let vitals = linear(vec![1.0; 4], 0.0, Some(vec!["HR", "Temp", "SBP", "x", "y"]));
        let composer = EarlyWarningComposer::new(Some(vitals), None, &aliases());
        assert!(composer.compose(&scenario()).vitals_fallback);
    }

    #[test]
    fn defaults_fill_missing_inputs() {
        let input: EarlyWarningInput = serde_json::from_str(r#"{"HR": 120}"#).unwrap();
        assert_eq!(input.hr, 120.0);
        assert_eq!(input.baseline_lactate, 1.0);
    }
}
