//! Configuration for the extractor and its LLM backends
//!
//! Loads configuration from txt2kg.yml; environment variables (and `.env`)
//! take precedence over file values.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::Result;
use crate::integrations::nim::{NIM_API_URL, NIM_DEFAULT_MODEL, NIM_MAX_TOKENS};
use crate::integrations::ollama::{OLLAMA_DEFAULT_MODEL, OLLAMA_URL};
use crate::kg::DEFAULT_CHUNK_SIZE;

pub const CONFIG_FILE: &str = "txt2kg.yml";

/// YAML config structures
#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    remote: Option<RemoteConfig>,
    local: Option<LocalConfig>,
    chunk_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RemoteConfig {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LocalConfig {
    enabled: Option<bool>,
    url: Option<String>,
    model: Option<String>,
}

/// Main configuration struct
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Key for the hosted endpoint; required unless `local` is set
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Use the local model server instead of the hosted endpoint
    pub local: bool,
    pub ollama_url: String,
    pub local_model: String,
    /// Characters per chunk
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: NIM_API_URL.to_string(),
            model: NIM_DEFAULT_MODEL.to_string(),
            max_tokens: NIM_MAX_TOKENS,
            local: false,
            ollama_url: OLLAMA_URL.to_string(),
            local_model: OLLAMA_DEFAULT_MODEL.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from txt2kg.yml, falling back to environment-only defaults
    pub fn new() -> Self {
        Self::load_dotenv();
        Self::load_from_file(CONFIG_FILE)
            .or_else(|_| Self::load_from_file(format!("../{}", CONFIG_FILE)))
            .unwrap_or_else(|_| Self::from_yaml(YamlConfig::default()))
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Parse YAML content and apply environment overrides
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let yaml: YamlConfig = serde_yaml::from_str(content)?;
        Ok(Self::from_yaml(yaml))
    }

    fn from_yaml(yaml: YamlConfig) -> Self {
        let defaults = Self::default();
        let remote = yaml.remote.unwrap_or_default();
        let local = yaml.local.unwrap_or_default();

        let api_key = Some(Self::resolve_env_string(remote.api_key, "NVIDIA_API_KEY"))
            .filter(|key| !key.trim().is_empty());

        Self {
            api_key,
            base_url: non_empty_or(
                Self::resolve_env_string(remote.base_url, "TXT2KG_BASE_URL"),
                defaults.base_url,
            ),
            model: non_empty_or(
                Self::resolve_env_string(remote.model, "TXT2KG_MODEL"),
                defaults.model,
            ),
            max_tokens: Self::resolve_env_parse(remote.max_tokens, "TXT2KG_MAX_TOKENS")
                .unwrap_or(defaults.max_tokens),
            local: Self::resolve_env_parse(local.enabled, "TXT2KG_LOCAL")
                .unwrap_or(defaults.local),
            ollama_url: non_empty_or(
                Self::resolve_env_string(local.url, "OLLAMA_URL"),
                defaults.ollama_url,
            ),
            local_model: non_empty_or(
                Self::resolve_env_string(local.model, "TXT2KG_LOCAL_MODEL"),
                defaults.local_model,
            ),
            chunk_size: Self::resolve_env_parse(yaml.chunk_size, "TXT2KG_CHUNK_SIZE")
                .filter(|size| *size > 0)
                .unwrap_or(defaults.chunk_size),
        }
    }

    /// Resolve a value: `${VAR}` placeholders and `env_key` win over the file value
    fn resolve_env_string(value: Option<String>, env_key: &str) -> String {
        if let Some(ref v) = value {
            if v.starts_with("${") && v.ends_with('}') {
                let var_name = &v[2..v.len() - 1];
                if let Ok(env_val) = std::env::var(var_name) {
                    return env_val;
                }
            }
        }
        if let Ok(env_val) = std::env::var(env_key) {
            return env_val;
        }
        match value {
            Some(v) if v.starts_with("${") => String::new(),
            Some(v) => v,
            None => String::new(),
        }
    }

    /// Resolve a typed value, environment first
    fn resolve_env_parse<T: FromStr>(value: Option<T>, env_key: &str) -> Option<T> {
        std::env::var(env_key)
            .ok()
            .and_then(|raw| raw.trim().parse::<T>().ok())
            .or(value)
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }
}

fn non_empty_or(value: String, default: String) -> String {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}
