//! Configuration management for pokeagent
//!
//! Loads and saves `~/.pokeagent/config.json`. Every field has a default, so
//! a partial file (or none at all) is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, conversations_dir, data_dir, expand_home, safe_filename};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const OLLAMA_API_BASE: &str = "http://localhost:11434/v1";

/// Chat model backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    OpenAi,
    OpenRouter,
    Ollama,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::OpenAi => "openai",
            Backend::OpenRouter => "openrouter",
            Backend::Ollama => "ollama",
        }
    }

    pub fn default_api_base(&self) -> &'static str {
        match self {
            Backend::OpenAi => OPENAI_API_BASE,
            Backend::OpenRouter => OPENROUTER_API_BASE,
            Backend::Ollama => OLLAMA_API_BASE,
        }
    }

    /// Environment variable consulted when no key is configured
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Backend::OpenAi => Some("OPENAI_API_KEY"),
            Backend::OpenRouter => Some("OPENROUTER_API_KEY"),
            Backend::Ollama => None,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Backend::Ollama)
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Backend::OpenAi),
            "openrouter" => Ok(Backend::OpenRouter),
            "ollama" => Ok(Backend::Ollama),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// Credentials and endpoint for one backend
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// All backend credentials
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: ProviderConfig,
    #[serde(default)]
    pub openrouter: ProviderConfig,
    #[serde(default)]
    pub ollama: ProviderConfig,
}

impl ProvidersConfig {
    pub fn get(&self, backend: Backend) -> &ProviderConfig {
        match backend {
            Backend::OpenAi => &self.openai,
            Backend::OpenRouter => &self.openrouter,
            Backend::Ollama => &self.ollama,
        }
    }

    pub fn get_mut(&mut self, backend: Backend) -> &mut ProviderConfig {
        match backend {
            Backend::OpenAi => &mut self.openai,
            Backend::OpenRouter => &mut self.openrouter,
            Backend::Ollama => &mut self.ollama,
        }
    }
}

/// Agent loop parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_history_messages")]
    pub history_messages: usize,
    #[serde(default = "default_conversation_max_entries")]
    pub conversation_max_entries: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_iterations: default_max_iterations(),
            history_messages: default_history_messages(),
            conversation_max_entries: default_conversation_max_entries(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_iterations() -> u32 {
    10
}

fn default_history_messages() -> usize {
    20
}

fn default_conversation_max_entries() -> usize {
    100
}

/// Lookup tool parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokedexConfig {
    #[serde(default = "default_index_path")]
    pub index_path: String,
    /// `first`, `last` or `reject`
    #[serde(default = "default_duplicate_policy")]
    pub duplicate_policy: String,
    /// Unset means no timeout on record fetches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_timeout_secs: Option<u64>,
    #[serde(default = "default_index_source_url")]
    pub index_source_url: String,
}

impl Default for PokedexConfig {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            duplicate_policy: default_duplicate_policy(),
            fetch_timeout_secs: None,
            index_source_url: default_index_source_url(),
        }
    }
}

fn default_index_path() -> String {
    "pokemon.json".to_string()
}

fn default_duplicate_policy() -> String {
    "first".to_string()
}

fn default_index_source_url() -> String {
    "https://pokeapi.co/api/v2/pokemon?limit=100000&offset=0".to_string()
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub pokedex: PokedexConfig,
}

impl Config {
    /// Load from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from a specific location; a missing file yields defaults
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("Reading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("Writing config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    pub fn backend(&self) -> Backend {
        self.agent.backend
    }

    /// API key for the active backend, falling back to its environment variable
    pub fn api_key(&self) -> Option<String> {
        let backend = self.backend();
        let key = &self.providers.get(backend).api_key;
        if !key.is_empty() {
            return Some(key.clone());
        }

        backend
            .api_key_env()
            .and_then(|var| std::env::var(var).ok())
            .filter(|k| !k.is_empty())
    }

    /// Whether the active backend can be used as configured
    pub fn has_api_key(&self) -> bool {
        !self.backend().requires_api_key() || self.api_key().is_some()
    }

    pub fn api_base(&self) -> String {
        let backend = self.backend();
        self.providers
            .get(backend)
            .api_base
            .clone()
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| backend.default_api_base().to_string())
    }

    pub fn default_model(&self) -> String {
        self.agent.model.clone()
    }

    /// Index path with `~` expanded
    pub fn index_path(&self) -> PathBuf {
        expand_home(&self.pokedex.index_path)
    }

    pub fn fetch_timeout(&self) -> Option<std::time::Duration> {
        self.pokedex
            .fetch_timeout_secs
            .map(std::time::Duration::from_secs)
    }
}

/// Write a default config if none exists, then load it
pub async fn init() -> Result<Config> {
    let config_path = config_path();

    if config_path.exists() {
        warn!("Config already exists at {:?}", config_path);
    } else {
        let config = Config::default();
        config.save().await?;
        info!("Created config at {:?}", config_path);
    }

    tokio::fs::create_dir_all(conversations_dir()).await?;

    Config::load().await
}
