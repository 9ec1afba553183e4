use rand::Rng;
use std::time::Duration;

use crate::core::{
    RoundConfig, COOLDOWN_SECONDS, DEFAULT_AVATAR, OUTBOUND_QUEUE_CAPACITY,
    ROUND_DURATION_SECONDS, TICK_INTERVAL_MILLIS,
};

/// Deployment flavour, from `ENVIRONMENT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Server settings read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    /// HMAC key shared with the identity provider
    pub secret_key: String,
    pub public_url: String,
    pub default_avatar: String,
    pub round: RoundConfig,
}

impl AppConfig {
    /// Load settings, reading `.env` first if present
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("ENVIRONMENT").as_deref() {
            Some("development") | Some("dev") => Environment::Development,
            _ => Environment::Production,
        };

        let port = parse_or(&lookup, "PORT", 8000u16)?;

        let secret_key = lookup("SESSION_SECRET")
            .filter(|secret| !secret.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!("SESSION_SECRET not set, generating a random key");
                generate_secret_key()
            });

        let public_url = lookup("PUBLIC_URL").unwrap_or_else(|| match environment {
            Environment::Development => format!("http://localhost:{}", port),
            Environment::Production => "https://catchtheflag.app".to_string(),
        });

        let default_avatar = lookup("DEFAULT_AVATAR").unwrap_or_else(|| DEFAULT_AVATAR.to_string());

        let round = RoundConfig {
            duration: Duration::from_secs(parse_or(&lookup, "ROUND_SECONDS", ROUND_DURATION_SECONDS)?),
            cooldown: Duration::from_secs(parse_or(&lookup, "COOLDOWN_SECONDS", COOLDOWN_SECONDS)?),
            tick_interval: Duration::from_millis(parse_or(&lookup, "TICK_MILLIS", TICK_INTERVAL_MILLIS)?),
            outbound_queue: parse_or(&lookup, "OUTBOUND_QUEUE", OUTBOUND_QUEUE_CAPACITY)?,
            restart_when_empty: parse_or(&lookup, "RESTART_WHEN_EMPTY", false)?,
        };

        if round.duration.is_zero() {
            return Err(ConfigError::Invalid {
                key: "ROUND_SECONDS",
                value: "0".to_string(),
            });
        }
        if round.tick_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "TICK_MILLIS",
                value: "0".to_string(),
            });
        }
        if round.outbound_queue == 0 {
            return Err(ConfigError::Invalid {
                key: "OUTBOUND_QUEUE",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            environment,
            port,
            secret_key,
            public_url,
            default_avatar,
            round,
        })
    }

    /// Development settings with a fixed key, for tests
    pub fn for_tests(secret_key: &str) -> Self {
        Self {
            environment: Environment::Development,
            port: 8000,
            secret_key: secret_key.to_string(),
            public_url: "http://localhost:8000".to_string(),
            default_avatar: DEFAULT_AVATAR.to_string(),
            round: RoundConfig::default(),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

/// Random 64-character alphanumeric signing key
pub fn generate_secret_key() -> String {
    rand::rngs::OsRng
        .sample_iter(rand::distributions::Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}
