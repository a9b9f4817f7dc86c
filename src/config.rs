//! Service configuration from the process environment

use crate::auth::SUPPORTED_ALGORITHM;
use crate::conversation::{HistoryScope, DEFAULT_HISTORY_LIMIT};
use crate::runtime::GenerationSettings;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything `main` needs to start the service
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub google_api_key: String,
    /// Gateway base URL; requests go straight to Google when unset
    pub gateway: Option<String>,
    pub model: String,
    pub generation: GenerationSettings,
    pub secret_key: String,
    pub history_limit: usize,
    pub history_scope: HistoryScope,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let db_path = get("CONTRACT_CHAT_DB_PATH").map_or_else(
            || {
                let home = get("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".contract-chat").join("contracts.db")
            },
            PathBuf::from,
        );

        if let Some(algorithm) = get("ALGORITHM") {
            if algorithm != SUPPORTED_ALGORITHM {
                return Err(ConfigError::Invalid {
                    var: "ALGORITHM",
                    value: algorithm,
                    reason: format!("only {SUPPORTED_ALGORITHM} is supported"),
                });
            }
        }

        let history_scope = match get("CONTRACT_CHAT_HISTORY_SCOPE") {
            Some(value) => {
                HistoryScope::from_str(&value).map_err(|reason| ConfigError::Invalid {
                    var: "CONTRACT_CHAT_HISTORY_SCOPE",
                    value,
                    reason,
                })?
            }
            None => HistoryScope::default(),
        };

        let history_limit = parse_or(&get, "CONTRACT_CHAT_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT)?;
        if history_limit == 0 {
            return Err(ConfigError::Invalid {
                var: "CONTRACT_CHAT_HISTORY_LIMIT",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let defaults = GenerationSettings::default();

        Ok(Self {
            port: parse_or(&get, "CONTRACT_CHAT_PORT", DEFAULT_PORT)?,
            db_path,
            google_api_key: get("GOOGLE_API_KEY").ok_or(ConfigError::Missing("GOOGLE_API_KEY"))?,
            gateway: get("LLM_GATEWAY"),
            model: get("CONTRACT_CHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            generation: GenerationSettings {
                temperature: parse_or(&get, "CONTRACT_CHAT_TEMPERATURE", defaults.temperature)?,
                max_tokens: parse_or(&get, "CONTRACT_CHAT_MAX_TOKENS", defaults.max_tokens)?,
            },
            secret_key: get("SECRET_KEY").ok_or(ConfigError::Missing("SECRET_KEY"))?,
            history_limit,
            history_scope,
        })
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
