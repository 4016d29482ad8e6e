// src/config.rs
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::chunker::ChunkerConfig;
use crate::llm::{
    LLMConfig, DEFAULT_GROQ_BASE_URL, DEFAULT_GROQ_MODEL, DEFAULT_OLLAMA_MODEL,
    DEFAULT_OLLAMA_URL, DEFAULT_TEMPERATURE,
};
use crate::logging::{LogConfig, LogFormat};

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_CONTEXT_WARN_CHARS: usize = 24_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value}")]
    InvalidValue { key: String, value: String },
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),
    #[error("Unknown LLM provider: {0} (expected groq or ollama)")]
    UnknownProvider(String),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub chunker: ChunkerConfig,
    pub context_warn_chars: usize,
    pub llm: LLMConfig,
    pub log: LogConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests do not have to
    /// touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("BACKEND_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "BACKEND_PORT", 3010u16)?;
        let upload_dir = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("uploads"));
        let max_upload_bytes = parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        let defaults = ChunkerConfig::default();
        let chunker = ChunkerConfig {
            chunk_size: parse_or(&lookup, "CHUNK_SIZE", defaults.chunk_size)?,
            overlap: parse_or(&lookup, "CHUNK_OVERLAP", defaults.overlap)?,
        };
        chunker.validate().map_err(|e| ConfigError::InvalidValue {
            key: "CHUNK_SIZE/CHUNK_OVERLAP".to_string(),
            value: e.to_string(),
        })?;

        let context_warn_chars =
            parse_or(&lookup, "CONTEXT_WARN_CHARS", DEFAULT_CONTEXT_WARN_CHARS)?;

        let llm = Self::llm_from_lookup(&lookup)?;

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => LogFormat::from_str(&raw).map_err(|_| ConfigError::InvalidValue {
                key: "LOG_FORMAT".to_string(),
                value: raw,
            })?,
            None => LogFormat::Text,
        };
        let log = LogConfig {
            level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: log_format,
            log_dir: lookup("LOG_DIR").map(PathBuf::from),
        };

        Ok(Self {
            host,
            port,
            upload_dir,
            max_upload_bytes,
            chunker,
            context_warn_chars,
            llm,
            log,
        })
    }

    fn llm_from_lookup<F>(lookup: &F) -> Result<LLMConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = lookup("LLM_PROVIDER").unwrap_or_else(|| "groq".to_string());
        let timeout = Duration::from_secs(parse_or(lookup, "LLM_TIMEOUT_SECS", 60u64)?);

        match provider.to_lowercase().as_str() {
            "groq" => {
                let api_key = lookup("GROQ_API_KEY")
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| ConfigError::EnvVarNotSet("GROQ_API_KEY".to_string()))?;
                Ok(LLMConfig::Groq {
                    api_key,
                    base_url: lookup("LLM_BASE_URL")
                        .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
                    model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string()),
                    temperature: parse_or(lookup, "LLM_TEMPERATURE", DEFAULT_TEMPERATURE)?,
                    timeout,
                })
            }
            "ollama" => Ok(LLMConfig::Ollama {
                ollama_url: lookup("OLLAMA_URL")
                    .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
                model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
                timeout,
            }),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
