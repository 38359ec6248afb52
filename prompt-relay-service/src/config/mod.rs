use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

use crate::services::providers::GOOGLE_API_BASE;

/// Default upstream request timeout, in seconds.
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub common: core_config::Config,
    pub google: GoogleConfig,
    pub models: ModelConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: Secret<String>,
    pub api_base: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model that rewrites keywords (e.g., gemini-2.0-flash)
    pub text_model: String,
    /// Model that renders the rewritten prompt (e.g., imagen-3.0-generate-001)
    pub image_model: String,
    pub aspect_ratio: String,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Allowed origins; a single `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let timeout_secs = get_env(
            "RELAY_UPSTREAM_TIMEOUT_SECS",
            Some(&DEFAULT_UPSTREAM_TIMEOUT_SECS.to_string()),
            is_prod,
        )?
        .parse::<u64>()
        .map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "RELAY_UPSTREAM_TIMEOUT_SECS must be a number of seconds: {}",
                e
            ))
        })?;

        Ok(RelayConfig {
            common: common_config,
            google: GoogleConfig {
                api_key: Secret::new(api_key()?),
                api_base: get_env("GOOGLE_API_BASE", Some(GOOGLE_API_BASE), is_prod)?,
                timeout: Duration::from_secs(timeout_secs),
            },
            models: ModelConfig {
                text_model: get_env("RELAY_TEXT_MODEL", Some("gemini-2.0-flash"), is_prod)?,
                image_model: get_env(
                    "RELAY_IMAGE_MODEL",
                    Some("imagen-3.0-generate-001"),
                    is_prod,
                )?,
                aspect_ratio: get_env("RELAY_IMAGE_ASPECT_RATIO", Some("1:1"), is_prod)?,
            },
            cors: CorsConfig {
                allowed_origins: parse_origins(&get_env(
                    "CORS_ALLOWED_ORIGINS",
                    Some("*"),
                    is_prod,
                )?),
            },
        })
    }
}

fn api_key() -> Result<String, AppError> {
    api_key_from(|key| env::var(key).ok())
}

/// The credential has no default in any environment. A blank
/// `GEMINI_API_KEY` falls through to `GOOGLE_API_KEY`.
fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Result<String, AppError> {
    ["GEMINI_API_KEY", "GOOGLE_API_KEY"]
        .iter()
        .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()))
        .ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "GEMINI_API_KEY (or GOOGLE_API_KEY) is required but not set"
            ))
        })
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
