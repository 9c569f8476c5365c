use crate::vacuum::rooms::RoomMap;
use secrecy::{ExposeSecret, SecretBox};
use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://euiot.roborock.com";
pub const DEFAULT_BRIDGE_URL: &str = "ws://127.0.0.1:8765";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Roborock account credentials
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretBox<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretBox::new(Box::new(password.into())),
        }
    }

    /// Load credentials only (used by the session manager at startup)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let username = required_var("ROBOROCK_USERNAME")?;
        let password = required_var("ROBOROCK_PASSWORD")?;
        Ok(Self {
            username,
            password: SecretBox::new(Box::new(password)),
        })
    }

    /// Get the account password (use only when making API calls)
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Configuration for the vacuum services
#[derive(Debug)]
pub struct RoborockConfig {
    pub credentials: Credentials,
    pub base_url: String,
    pub bridge_url: String,
    pub request_timeout: Duration,
    pub rooms: RoomMap,
}

impl RoborockConfig {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (for development)
        dotenvy::dotenv().ok(); // Don't error if .env doesn't exist

        let credentials = Credentials::from_env()?;

        let base_url = optional_var("ROBOROCK_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let bridge_url = optional_var("ROBOROCK_BRIDGE_URL")
            .unwrap_or_else(|| DEFAULT_BRIDGE_URL.to_string());

        let request_timeout = match optional_var("ROBOROCK_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    var: "ROBOROCK_REQUEST_TIMEOUT_SECS".to_string(),
                    reason: format!("'{}' is not a whole number of seconds", raw),
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        var: "ROBOROCK_REQUEST_TIMEOUT_SECS".to_string(),
                        reason: "timeout must be greater than zero".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let rooms = match optional_var("ROBOROCK_SEGMENT_MAP") {
            Some(raw) => RoomMap::parse(&raw).map_err(|reason| ConfigError::InvalidValue {
                var: "ROBOROCK_SEGMENT_MAP".to_string(),
                reason,
            })?,
            None => RoomMap::default(),
        };

        Ok(Self {
            credentials,
            base_url,
            bridge_url,
            request_timeout,
            rooms,
        })
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    let value = env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
    if value.trim().is_empty() {
        return Err(ConfigError::MissingEnvVar(name.to_string()));
    }
    Ok(value)
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Load configuration with helpful error messages for development
pub fn load_config() -> Result<RoborockConfig, ConfigError> {
    match RoborockConfig::load() {
        Ok(config) => {
            log::info!("Successfully loaded Roborock configuration");
            Ok(config)
        }
        Err(ConfigError::MissingEnvVar(var)) => {
            log::error!("Missing required environment variable: {}", var);
            log::error!("Create a .env file in the project root with:");
            log::error!("{}=your_value_here", var);
            Err(ConfigError::MissingEnvVar(var))
        }
        Err(e) => {
            log::error!("Configuration error: {}", e);
            Err(e)
        }
    }
}
