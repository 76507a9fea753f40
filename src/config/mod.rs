//! Runtime configuration.
//!
//! Typed settings loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `CONCURSO_PREP` prefix
//! and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use concurso_prep::config::AppConfig;
//!
//! # fn main() -> Result<(), concurso_prep::config::ConfigError> {
//! let config = AppConfig::load()?;
//! config.validate()?;
//! # Ok(())
//! # }
//! ```

mod access;
mod error;
mod payment;
mod server;
mod storage;

pub use access::AccessConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};
pub use storage::{StorageBackend, StorageConfig};

use serde::Deserialize;

use crate::application::CoreSettings;
use crate::domain::plan::PlanCatalog;

/// Every section has defaults, so an empty environment yields a runnable
/// in-memory development server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Admin allow-list and free plan allowance
    #[serde(default)]
    pub access: AccessConfig,

    /// Webhook secret and plan-request timing
    #[serde(default)]
    pub payment: PaymentConfig,
}

impl AppConfig {
    /// Reads `.env` (if any) and the process environment.
    ///
    /// - `CONCURSO_PREP__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CONCURSO_PREP__STORAGE__BACKEND=file` -> `storage.backend = file`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CONCURSO_PREP")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Stops at the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.storage.validate()?;
        self.access.validate()?;
        self.payment.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Plan, technique and admin data handed to the core services.
    pub fn core_settings(&self) -> CoreSettings {
        CoreSettings {
            plans: PlanCatalog::standard(self.access.free_question_limit),
            admins: self.access.admin_list(),
            payment_link_base: self.payment.payment_link_base.clone(),
            ..CoreSettings::default()
        }
    }
}
