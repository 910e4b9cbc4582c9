//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// Gemini's OpenAI-compatible endpoint.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub plan_model: String,
    pub chat_model: String,
    pub image_model: String,
    pub data_dir: PathBuf,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        // --- Server Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Generator Settings ---
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?;
        let gemini_api_base = var_or("GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE);
        let plan_model = var_or("PLAN_MODEL", "gemini-2.5-flash");
        let chat_model = var_or("CHAT_MODEL", "gemini-2.5-flash");
        let image_model = var_or("IMAGE_MODEL", "imagen-3.0-generate-002");

        // --- Storage and Browser Settings ---
        let data_dir = PathBuf::from(var_or("DATA_DIR", "./data"));
        let cors_origin = var_or("CORS_ORIGIN", "http://localhost:3000");

        Ok(Self {
            bind_address,
            log_level,
            gemini_api_key,
            gemini_api_base,
            plan_model,
            chat_model,
            image_model,
            data_dir,
            cors_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "secret")])).unwrap();

        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.plan_model, "gemini-2.5-flash");
        assert_eq!(config.gemini_api_base, DEFAULT_GEMINI_API_BASE);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn missing_key_is_rejected() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(name) if name == "GEMINI_API_KEY"));
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "secret"),
            ("BIND_ADDRESS", "nowhere"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "BIND_ADDRESS"));
    }
}
