use std::env;

use thiserror::Error;

use crate::domain::models::GuardConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid PORT: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),

    #[error("Invalid SECURE_TESTING value: {0}")]
    InvalidFlag(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub guard: GuardConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()?;

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let testing = match env::var("SECURE_TESTING") {
            Ok(value) => parse_flag(&value)?,
            Err(_) => false,
        };

        let allowed_hosts = env::var("ALLOWED_HOSTS")
            .map(|value| parse_host_list(&value))
            .unwrap_or_default();

        Ok(Config {
            port,
            host,
            guard: GuardConfig::new(testing, allowed_hosts),
        })
    }
}

fn parse_flag(value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag(value.to_string())),
    }
}

/// Split a comma-separated host list, dropping blank entries and keeping order.
fn parse_host_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .collect()
}
