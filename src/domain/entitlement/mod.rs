//! Entitlement domain module.
//!
//! - `grant` - Concurso/package access grants and their lifecycle
//! - `record` - Per-user entitlement record and the access policy

mod grant;
mod record;

pub use grant::{AccessGrant, GrantStatus};
pub use record::{AccessLedger, UserEntitlement};
