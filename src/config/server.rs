//! HTTP listener, logging and CORS settings.

use serde::Deserialize;
use std::net::SocketAddr;

use super::error::ValidationError;

const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    /// `EnvFilter` directive applied when `RUST_LOG` is unset.
    pub log_level: String,
    pub request_timeout_secs: u64,
    /// Comma-separated. Unset allows any origin.
    pub cors_origins: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            environment: Environment::Development,
            log_level: "info,concurso_prep=debug,tower_http=info".into(),
            request_timeout_secs: 30,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse()
            .map_err(|_| ValidationError::InvalidSocketAddr(raw))
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }

    pub fn cors_origins_list(&self) -> Vec<String> {
        let Some(raw) = self.cors_origins.as_deref() else {
            return Vec::new();
        };
        raw.split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ValidationError::InvalidTimeout);
        }
        self.socket_addr().map(|_| ())
    }
}
