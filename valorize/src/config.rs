use serde::Deserialize;
use std::env;

pub const DEFAULT_HISTORY_KEY: &str = "valorize.history.v1";
pub const DEFAULT_UI_STATE_KEY: &str = "valorize.ui.v2";

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scoring: ScoringConfig,
    pub storage: StorageConfig,
}

/// Connection settings for the remote novelty scoring service.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub url: String,
    pub auth_token: Option<String>,
    pub local_path: Option<String>,
    pub busy_timeout_ms: u64,
    /// Key holding the serialized analysis collection.
    pub history_key: String,
    /// Key holding the serialized UI flags.
    pub ui_state_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: "file:valorize.db".to_string(),
            auth_token: None,
            local_path: None,
            busy_timeout_ms: 5000,
            history_key: DEFAULT_HISTORY_KEY.to_string(),
            ui_state_key: DEFAULT_UI_STATE_KEY.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig {
                base_url: env::var("VALORIZE_BACKEND_URL")
                    .unwrap_or_else(|_| "http://localhost:8000".to_string()),
                timeout_secs: parse_env_or("SCORING_TIMEOUT", 120),
                max_retries: parse_env_or("SCORING_MAX_RETRIES", 2),
            },
            storage: StorageConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "file:valorize.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
                local_path: env::var("DATABASE_LOCAL_PATH").ok(),
                busy_timeout_ms: parse_env_or("DATABASE_BUSY_TIMEOUT_MS", 5000),
                history_key: env::var("VALORIZE_HISTORY_KEY")
                    .unwrap_or_else(|_| DEFAULT_HISTORY_KEY.to_string()),
                ui_state_key: env::var("VALORIZE_UI_STATE_KEY")
                    .unwrap_or_else(|_| DEFAULT_UI_STATE_KEY.to_string()),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
