use pretty_assertions::assert_eq;
use sepsis_triage::{
    ArtifactPaths, ClinicalContext, GuardrailProfile, MatchTier, PatientRecord, ProfileSelection,
    SeverityClass,
};
use std::path::Path;
use std::sync::Once;

static INIT: Once = Once::new();
fn setup_test_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

const FEATURES: &[&str] = &[
    "heart_rate",
    "systolic_bp",
    "temperature",
    "lactate",
    "creatinine",
    "thrombocytes",
    "leukocytes",
    "sofa_score",
];

/// Writes a severity artifact set whose model always favours `class`.
fn write_artifacts(dir: &Path, class: usize) {
    let width = FEATURES.len();
    let mut intercept = vec![0.0; 3];
    intercept[class] = 4.0;
    let model = serde_json::json!({
        "best_estimator_": {
            "kind": "linear",
            "coef": vec![vec![0.0; width]; 3],
            "intercept": intercept,
        },
        "metadata": {"trained_on": "synthetic"},
    });
    std::fs::write(
        dir.join("sepsis_production_model.json"),
        serde_json::to_string(&model).unwrap(),
    )
    .unwrap();
    std::fs::write(
        dir.join("feature_names.json"),
        serde_json::to_string(FEATURES).unwrap(),
    )
    .unwrap();
    std::fs::write(
        dir.join("clinical_bridge.json"),
        r#"{
            "heart_rate": {"mean": 85.0, "std": 15.0},
            "systolic_bp": {"mean": 120.0, "std": 20.0},
            "lactate": {"mean": 1.5, "std": 1.0},
            "thrombocytes": {"mean": 220.0, "std": 0.0}
        }"#,
    )
    .unwrap();
}

fn context(class: usize) -> (tempfile::TempDir, ClinicalContext) {
    setup_test_logger();
    let tmp = tempfile::tempdir().unwrap();
    write_artifacts(tmp.path(), class);
    let ctx = ClinicalContext::load(&ArtifactPaths::in_dir(tmp.path()), ProfileSelection::Auto);
    (tmp, ctx)
}

#[test]
fn healthy_defaults_stay_healthy() {
    let (_tmp, ctx) = context(0);
    let result = ctx
        .severity()
        .unwrap()
        .predict(&PatientRecord::default())
        .unwrap();
    assert_eq!(result.prediction, SeverityClass::Healthy);
    assert!(!result.is_clinical_override);
    assert_eq!(result.override_reason, None);
}

#[test]
fn raw_lactate_overrides_a_healthy_prediction() {
    let (_tmp, ctx) = context(0);
    let record: PatientRecord = serde_json::from_str(r#"{"Lactate": 5.0}"#).unwrap();
    let result = ctx.severity().unwrap().predict(&record).unwrap();
    assert_eq!(result.raw_prediction, SeverityClass::Healthy);
    assert_eq!(result.prediction, SeverityClass::Severe);
    assert!(result.is_clinical_override);
    let reason = result.override_reason.unwrap();
    assert!(reason.contains("Lactate 5.0 > 4.0"), "{reason}");
}

#[test]
fn guardrails_never_downgrade() {
    let (_tmp, ctx) = context(1);
    let record: PatientRecord = serde_json::from_str(r#"{"HR": 160, "SBP": 70}"#).unwrap();
    let result = ctx.severity().unwrap().predict(&record).unwrap();
    assert_eq!(result.prediction, SeverityClass::Mild);
    assert!(!result.is_clinical_override);
    assert_eq!(result.findings.len(), 2);
}

#[test]
fn compact_schema_selects_basic_guardrails() {
    let (_tmp, ctx) = context(0);
    let model = ctx.severity().unwrap();
    assert_eq!(model.guardrails().profile(), GuardrailProfile::Basic);
    // platelets are an extended-profile finding only
    let record: PatientRecord = serde_json::from_str(r#"{"Platelets": 40}"#).unwrap();
    assert!(!model.predict(&record).unwrap().is_clinical_override);
}

#[test]
fn scaling_and_resolution_are_traced() {
    let (_tmp, ctx) = context(0);
    let record: PatientRecord =
        serde_json::from_str(r#"{"HR": 115, "leukocytes_k": 12.0}"#).unwrap();
    let result = ctx.severity().unwrap().predict(&record).unwrap();
    let scaled = &result.scaled;

    assert_eq!(scaled.vector.names().len(), FEATURES.len());
    assert_eq!(scaled.vector.get("heart_rate"), Some(2.0));
    // zero std scales as one
    assert_eq!(scaled.vector.get("thrombocytes"), Some(30.0));

    let hr = scaled.resolutions.iter().find(|r| r.field == "HR").unwrap();
    assert_eq!(hr.tier, MatchTier::Alias);
    let extra = scaled
        .resolutions
        .iter()
        .find(|r| r.field == "leukocytes_k")
        .unwrap();
    assert_eq!(extra.canonical, "leukocytes");
    assert_eq!(extra.tier, MatchTier::Substring);
    assert!(scaled.unmatched.iter().any(|f| f == "Unit1"));
}

#[test]
fn identical_requests_give_identical_results() {
    let (_tmp, ctx) = context(2);
    let record: PatientRecord = serde_json::from_str(r#"{"HR": 99, "Temp": 38.4}"#).unwrap();
    let model = ctx.severity().unwrap();
    assert_eq!(model.predict(&record).unwrap(), model.predict(&record).unwrap());
}
