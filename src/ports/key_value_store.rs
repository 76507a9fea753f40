//! Key-value store port.
//!
//! Every piece of mutable state lives behind this interface, one JSON value
//! per key. Keys are namespaced per user and, where it applies, per package
//! or subject, so two users or two packages never share a record.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::foundation::{PackageId, UserId};

/// Errors that can occur during store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt value at {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("IO error: {0}")]
    IoError(String),
}

/// Kind of record stored under a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Entitlement,
    Quota,
    SubjectProgress,
    /// Subjects with progress in one package.
    ProgressIndex,
    AnswerSheet,
    ErrorHistory,
    FavoriteTechniques,
    RecentTechniques,
    PlanRequests,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Entitlement => "entitlement",
            EntityKind::Quota => "quota",
            EntityKind::SubjectProgress => "subject_progress",
            EntityKind::ProgressIndex => "progress_index",
            EntityKind::AnswerSheet => "answer_sheet",
            EntityKind::ErrorHistory => "error_history",
            EntityKind::FavoriteTechniques => "favorite_techniques",
            EntityKind::RecentTechniques => "recent_techniques",
            EntityKind::PlanRequests => "plan_requests",
        }
    }
}

/// `(user, kind, scope)` address of one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub user: Option<UserId>,
    pub kind: EntityKind,
    pub scope: Option<String>,
}

impl StoreKey {
    /// Record owned by one user with no further scope.
    pub fn user(user: &UserId, kind: EntityKind) -> Self {
        Self {
            user: Some(user.clone()),
            kind,
            scope: None,
        }
    }

    /// Record shared by every user.
    pub fn global(kind: EntityKind) -> Self {
        Self {
            user: None,
            kind,
            scope: None,
        }
    }

    pub fn entitlement(user: &UserId) -> Self {
        Self::user(user, EntityKind::Entitlement)
    }

    pub fn quota(user: &UserId) -> Self {
        Self::user(user, EntityKind::Quota)
    }

    pub fn answer_sheet(user: &UserId, package: &PackageId) -> Self {
        Self::user(user, EntityKind::AnswerSheet).scoped(package.as_str())
    }

    pub fn progress_index(user: &UserId, package: &PackageId) -> Self {
        Self::user(user, EntityKind::ProgressIndex).scoped(package.as_str())
    }

    pub fn subject_progress(user: &UserId, package: &PackageId, subject: &str) -> Self {
        Self::user(user, EntityKind::SubjectProgress)
            .scoped(format!("{}/{}", escape(package.as_str()), escape(subject)))
    }

    pub fn error_history(user: &UserId) -> Self {
        Self::user(user, EntityKind::ErrorHistory)
    }

    pub fn favorites(user: &UserId) -> Self {
        Self::user(user, EntityKind::FavoriteTechniques)
    }

    pub fn recent_techniques(user: &UserId) -> Self {
        Self::user(user, EntityKind::RecentTechniques)
    }

    pub fn plan_requests() -> Self {
        Self::global(EntityKind::PlanRequests)
    }

    pub fn scoped(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

/// Escapes the separators used when rendering keys.
fn escape(part: &str) -> String {
    part.replace('%', "%25")
        .replace(':', "%3A")
        .replace('/', "%2F")
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user {
            Some(user) => write!(f, "user:{}", escape(user.as_str()))?,
            None => f.write_str("global")?,
        }
        write!(f, ":{}", self.kind.as_str())?;
        if let Some(scope) = &self.scope {
            // Pre-escaped composite scopes keep their '/' separator.
            if self.kind == EntityKind::SubjectProgress {
                write!(f, ":{}", scope)?;
            } else {
                write!(f, ":{}", escape(scope))?;
            }
        }
        Ok(())
    }
}

/// Port for the namespaced key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` if nothing is stored under `key`.
    async fn get(&self, key: &StoreKey) -> Result<Option<Value>, StoreError>;

    /// Replaces the value under `key`. Last write wins.
    async fn set(&self, key: &StoreKey, value: Value) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &StoreKey) -> Result<(), StoreError>;
}
