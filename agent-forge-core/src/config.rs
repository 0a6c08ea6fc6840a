//! Configuration for the generator, the pipeline and the service
//!
//! Values come from a TOML file when one is given, then environment
//! overrides are applied on top.

use crate::pipeline::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "agent-forge.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    /// Environment variables searched in order for the API key
    pub api_key_vars: Vec<String>,
    pub base_url: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_key_vars: vec!["GOOGLE_API_KEY".to_string(), "GEMINI_API_KEY".to_string()],
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            temperature: 0.1,
            max_output_tokens: 8192,
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub retry: RetryPolicy,
    /// Directory holding reference templates used as prompt context
    pub templates_dir: Option<PathBuf>,
    /// Known-good agent used for compliance scoring
    pub reference_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from("./generated_agents") }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8000 }
    }
}

impl ForgeConfig {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

        toml::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .map_err(|source| ConfigError::Write { path: path.to_path_buf(), source })
    }

    /// Load from `path`, or from the default file if it exists, then apply
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let default = Path::new(DEFAULT_CONFIG_FILE);
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if default.is_file() => Self::from_file(default)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Takes the lookup as a parameter so tests do not touch the process
    /// environment.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(model) = lookup("AGENT_FORGE_MODEL") {
            self.llm.model = model;
        }
        if let Some(dir) = lookup("AGENT_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("AGENT_FORGE_TEMPLATES") {
            self.pipeline.templates_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup("AGENT_FORGE_REFERENCE") {
            self.pipeline.reference_dir = Some(PathBuf::from(dir));
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        match lookup("PORT").map(|port| port.parse::<u16>()) {
            Some(Ok(port)) => self.server.port = port,
            Some(Err(e)) => debug!("ignoring invalid PORT: {e}"),
            None => {}
        }
    }
}
