use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, SubtransError};

fn default_source_lang() -> String {
    "auto".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub job: JobConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Which translation service to call
    pub kind: BackendKind,
    /// Base URL of the translation service
    pub endpoint: String,
    /// LLM model to use (Ollama only)
    pub model: String,
    /// Source language passed to the backend; "auto" lets it detect
    #[serde(default = "default_source_lang")]
    pub source_lang: String,
    /// Per-request HTTP timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Google: the public translate_a endpoint
    Google,
    /// Ollama: a local LLM prompted to translate
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// The only accepted upload extension, including the dot
    pub extension: String,
    /// Prefix of the downloadable artifact name
    pub output_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            job: JobConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Google,
            endpoint: "https://translate.googleapis.com".to_string(),
            model: "llama3.2:3b".to_string(),
            source_lang: default_source_lang(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            extension: ".srt".to_string(),
            output_prefix: "translated".to_string(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubtransError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;

        Ok(())
    }
}
