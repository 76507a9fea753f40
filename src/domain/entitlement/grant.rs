//! Access grants and their lifecycle.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{StateMachine, Timestamp, ValidationError};

/// Lifecycle status of an access grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantStatus {
    Active,
    /// Passed `expires_at`; set lazily the next time the grant is read.
    Expired,
    /// Withdrawn by an admin, or superseded by a newer grant.
    Revoked,
}

impl StateMachine for GrantStatus {
    fn valid_transitions(&self) -> &'static [Self] {
        use GrantStatus::*;
        match self {
            Active => &[Expired, Revoked],
            Expired | Revoked => &[],
        }
    }
}

/// Admin-issued permission to one concurso or package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    /// Concurso name or package id the grant opens.
    pub name: String,
    pub granted_at: Timestamp,
    /// `None` = never expires.
    pub expires_at: Option<Timestamp>,
    pub status: GrantStatus,
}

impl AccessGrant {
    /// Creates an active grant.
    pub fn new(
        name: impl Into<String>,
        granted_at: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::empty_field("grant_name"));
        }
        Ok(Self {
            name,
            granted_at,
            expires_at,
            status: GrantStatus::Active,
        })
    }

    /// True when the grant is still marked active but its expiry has passed.
    pub fn is_stale_at(&self, now: &Timestamp) -> bool {
        self.status == GrantStatus::Active
            && self.expires_at.map(|e| !e.is_after(now)).unwrap_or(false)
    }

    /// True when the grant currently opens its target.
    pub fn is_usable_at(&self, now: &Timestamp) -> bool {
        self.status == GrantStatus::Active && !self.is_stale_at(now)
    }

    pub(super) fn mark(&mut self, target: GrantStatus) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(target)?;
        Ok(())
    }
}
