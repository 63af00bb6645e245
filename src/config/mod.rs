use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub pipeline: PipelineConfig,
    pub completion: CompletionConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Queue new meetings for the background worker. When false they are
    /// summarized before the create request returns.
    pub enable_jobs: bool,
    pub enable_embeddings: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// One of `mock`, `groq`, `openai`.
    pub provider: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_endpoint: Option<String>,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Defaults to `<data_dir>/meetnotes/meetnotes.db`.
    pub db_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enable_jobs: true,
            enable_embeddings: true,
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            api_key: None,
            model: None,
            api_endpoint: None,
            temperature: 0.2,
            timeout_seconds: 60,
        }
    }
}

impl Config {
    /// Load the user config (creating a default file if missing), then apply
    /// `MEETNOTES_*` environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config = Self::from_toml_str(&content)?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparseable values are ignored with
    /// a warning and the configured value is kept.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("MEETNOTES_PROVIDER") {
            self.completion.provider = provider;
        }
        if let Some(api_key) = lookup("MEETNOTES_API_KEY") {
            self.completion.api_key = Some(api_key);
        }
        if let Some(model) = lookup("MEETNOTES_MODEL") {
            self.completion.model = Some(model);
        }
        if let Some(host) = lookup("MEETNOTES_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("MEETNOTES_PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid MEETNOTES_PORT value: {}", port),
            }
        }
        if let Some(path) = lookup("MEETNOTES_DB_PATH") {
            self.storage.db_path = Some(PathBuf::from(path));
        }

        override_bool(
            &lookup,
            "MEETNOTES_ENABLE_JOBS",
            &mut self.pipeline.enable_jobs,
        );
        override_bool(
            &lookup,
            "MEETNOTES_ENABLE_EMBEDDINGS",
            &mut self.pipeline.enable_embeddings,
        );
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(path.clone()),
            None => global::db_file(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

fn override_bool<F>(lookup: &F, key: &str, target: &mut bool)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(key) {
        match parse_bool(&raw) {
            Some(value) => *target = value,
            None => warn!("Ignoring invalid {} value: {}", key, raw),
        }
    }
}

/// `1/true/yes/on` and `0/false/no/off`, case-insensitive.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
