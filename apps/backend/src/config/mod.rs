//! Process configuration read from the environment at startup.

pub mod db;

use std::env;

use crate::error::AppError;

/// HTTP server and realtime settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    /// Enables cross-instance realtime fan-out when set.
    pub redis_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            allowed_origins: Vec::new(),
            redis_url: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let port = match env::var("BACKEND_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::config(format!("BACKEND_PORT is not a port: '{raw}'")))?,
            Err(_) => defaults.port,
        };

        Ok(Self {
            host: env::var("BACKEND_HOST").unwrap_or(defaults.host),
            port,
            allowed_origins: parse_origins(&env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default()),
            redis_url: env::var("REDIS_URL").ok().filter(|s| !s.trim().is_empty()),
        })
    }
}

/// Comma-separated origins; blanks, `null` and non-http(s) entries are dropped.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "null")
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .map(str::to_string)
        .collect()
}
