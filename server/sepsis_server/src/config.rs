//! Server configuration: optional TOML file, overridden by CLI flags

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use sepsis_triage::{ArtifactPaths, ProfileSelection};

use crate::error::ApiError;

#[derive(Debug, Parser)]
#[command(
    name = "sepsis_server",
    version,
    about = "Sepsis severity and early-warning scoring service",
    long_about = "Serves the sepsis severity classifier (with clinical guardrails) and the \
        early-warning risk score over HTTP.\n\n\
        Artifacts are read once at startup from the artifacts directory; requests \
        arriving before loading completes receive 503."
)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory holding the model artifacts
    #[arg(long)]
    pub artifacts_dir: Option<PathBuf>,

    /// Enable debug logging (per-field scaling traces)
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub guardrail_profile: ProfileSelection,
    pub artifacts: ArtifactPaths,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            guardrail_profile: ProfileSelection::Auto,
            artifacts: ArtifactPaths::default(),
        }
    }
}

impl ServerConfig {
    pub fn parse(text: &str) -> Result<Self, ApiError> {
        toml::from_str(text).map_err(|e| ApiError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ApiError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Config(format!("{}: {e}", path.display())))?;
        Self::parse(&text)
    }

    /// File values (or defaults), then CLI overrides.
    pub fn from_cli(cli: &Cli) -> Result<Self, ApiError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(host) = &cli.host {
            config.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(dir) = &cli.artifacts_dir {
            config.artifacts.dir = dir.clone();
        }
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
