//! Process-wide clinical artifacts, loaded once and shared read-only

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sepsis_model::InferenceAdapter;

use crate::alias::AliasTable;
use crate::early_warning::EarlyWarningComposer;
use crate::error::TriageError;
use crate::guardrail::{GuardrailEngine, GuardrailProfile, ProfileSelection};
use crate::resolver::FeatureResolver;
use crate::scaler::ClinicalBridge;
use crate::severity::SeverityModel;

fn default_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_severity_model() -> String {
    "sepsis_production_model.json".to_string()
}

fn default_feature_names() -> String {
    "feature_names.json".to_string()
}

fn default_clinical_bridge() -> String {
    "clinical_bridge.json".to_string()
}

fn default_alias_table() -> String {
    "alias_table.json".to_string()
}

fn default_vitals_model() -> String {
    "vitals_model.json".to_string()
}

fn default_decision_engine() -> String {
    "decision_engine.json".to_string()
}

/// Artifact file names, relative to `dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_severity_model")]
    pub severity_model: String,
    #[serde(default = "default_feature_names")]
    pub feature_names: String,
    #[serde(default = "default_clinical_bridge")]
    pub clinical_bridge: String,
    #[serde(default = "default_alias_table")]
    pub alias_table: String,
    #[serde(default = "default_vitals_model")]
    pub vitals_model: String,
    #[serde(default = "default_decision_engine")]
    pub decision_engine: String,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            severity_model: default_severity_model(),
            feature_names: default_feature_names(),
            clinical_bridge: default_clinical_bridge(),
            alias_table: default_alias_table(),
            vitals_model: default_vitals_model(),
            decision_engine: default_decision_engine(),
        }
    }
}

impl ArtifactPaths {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

/// Summary of what loaded, for the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextStatus {
    pub severity_model: bool,
    pub severity_resolution: Option<&'static str>,
    pub severity_features: usize,
    pub guardrail_profile: Option<GuardrailProfile>,
    pub vitals_model: bool,
    pub vitals_resolution: Option<&'static str>,
    pub vitals_layout: &'static str,
    pub decision_engine: bool,
    pub decision_resolution: Option<&'static str>,
    pub alias_entries: usize,
    pub loaded_at: String,
}

/// Everything the request handlers read. Never mutated after construction.
#[derive(Debug)]
pub struct ClinicalContext {
    aliases: Arc<AliasTable>,
    severity: Result<SeverityModel, String>,
    early_warning: EarlyWarningComposer,
    loaded_at: DateTime<Utc>,
}

impl ClinicalContext {
    pub fn new(
        aliases: Arc<AliasTable>,
        severity: Result<SeverityModel, TriageError>,
        early_warning: EarlyWarningComposer,
    ) -> Self {
        Self {
            aliases,
            severity: severity.map_err(|e| match e {
                TriageError::ArtifactMissing(detail) => detail,
                other => other.to_string(),
            }),
            early_warning,
            loaded_at: Utc::now(),
        }
    }

    /// Load every artifact. Failures are logged and leave the affected
    /// model absent; loading itself never fails.
    pub fn load(paths: &ArtifactPaths, profile: ProfileSelection) -> Self {
        log::info!("loading clinical artifacts from {}", paths.dir.display());
        let aliases = Arc::new(load_aliases(&paths.path(&paths.alias_table)));

        let severity = load_severity(paths, &aliases, profile);
        match &severity {
            Ok(model) => log::info!(
                "severity model ready: {} features, {:?} guardrails",
                model.feature_names().len(),
                model.guardrails().profile()
            ),
            Err(e) => log::error!("severity model unavailable: {e}"),
        }

        let vitals = load_optional("vitals", &paths.path(&paths.vitals_model));
        let decision = load_optional("decision", &paths.path(&paths.decision_engine));
        let early_warning = EarlyWarningComposer::new(vitals, decision, &aliases);

        Self::new(aliases, severity, early_warning)
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn severity(&self) -> Result<&SeverityModel, TriageError> {
        self.severity
            .as_ref()
            .map_err(|e| TriageError::ArtifactMissing(e.clone()))
    }

    pub fn early_warning(&self) -> &EarlyWarningComposer {
        &self.early_warning
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn status(&self) -> ContextStatus {
        let severity = self.severity.as_ref().ok();
        let vitals = self.early_warning.vitals_model().filter(|m| m.is_usable());
        let decision = self.early_warning.decision_engine();
        ContextStatus {
            severity_model: severity.is_some(),
            severity_resolution: severity.map(|m| m.model().resolved().variant_name()),
            severity_features: severity.map_or(0, |m| m.feature_names().len()),
            guardrail_profile: severity.map(|m| m.guardrails().profile()),
            vitals_model: vitals.is_some(),
            vitals_resolution: vitals.map(|m| m.resolved().variant_name()),
            vitals_layout: self.early_warning.layout().name(),
            decision_engine: decision.is_some(),
            decision_resolution: decision.map(|m| m.resolved().variant_name()),
            alias_entries: self.aliases.len(),
            loaded_at: self.loaded_at.to_rfc3339(),
        }
    }
}

fn load_aliases(path: &Path) -> AliasTable {
    if !path.exists() {
        log::info!("no alias table at {}; using built-in aliases", path.display());
        return AliasTable::builtin();
    }
    match AliasTable::load(path) {
        Ok(table) => {
            log::info!("loaded {} aliases from {}", table.len(), path.display());
            table
        }
        Err(e) => {
            log::error!("{e}; using built-in aliases");
            AliasTable::builtin()
        }
    }
}

fn load_optional(name: &str, path: &Path) -> Option<Arc<InferenceAdapter>> {
    if !path.exists() {
        log::warn!("{name} model not found at {}; heuristic fallback active", path.display());
        return None;
    }
    match InferenceAdapter::load(name, path) {
        Ok(adapter) => Some(Arc::new(adapter)),
        Err(e) => {
            log::error!("{name} model failed to load: {e}");
            None
        }
    }
}

fn load_feature_names(path: &Path) -> Result<Vec<String>, TriageError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| TriageError::ArtifactMissing(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| TriageError::MalformedArtifact(format!("{}: {e}", path.display())))
}

fn load_severity(
    paths: &ArtifactPaths,
    aliases: &Arc<AliasTable>,
    profile: ProfileSelection,
) -> Result<SeverityModel, TriageError> {
    let model_path = paths.path(&paths.severity_model);
    let model = InferenceAdapter::load("severity", &model_path)
        .map_err(|e| TriageError::ArtifactMissing(e.to_string()))?;
    if !model.is_usable() {
        return Err(TriageError::ArtifactMissing(format!(
            "{} holds no usable estimator",
            model_path.display()
        )));
    }

    let names_path = paths.path(&paths.feature_names);
    let names = if names_path.exists() {
        load_feature_names(&names_path)?
    } else {
        log::warn!(
            "no feature list at {}; using names declared by the model",
            names_path.display()
        );
        model
            .feature_names()
            .map(<[String]>::to_vec)
            .ok_or_else(|| {
                TriageError::ArtifactMissing(format!(
                    "{} missing and the model declares no feature names",
                    names_path.display()
                ))
            })?
    };
    if let Some(n) = model.n_features() {
        if n != names.len() {
            return Err(TriageError::MalformedArtifact(format!(
                "severity model expects {n} features but the feature list has {}",
                names.len()
            )));
        }
    }

    let bridge = ClinicalBridge::load(paths.path(&paths.clinical_bridge))?;
    let names: Arc<[String]> = names.into();
    let guardrails = GuardrailEngine::new(profile.resolve(names.len()));

    Ok(SeverityModel::new(
        Arc::new(model),
        Arc::clone(&names),
        FeatureResolver::new(Arc::clone(aliases), &names),
        Arc::new(bridge),
        guardrails,
    ))
}
