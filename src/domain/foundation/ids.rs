//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Canonical identifier for a user.
///
/// Every core component keys its records by this value only. Raw e-mail
/// addresses and usernames are folded into it at the boundary through
/// [`UserId::canonical`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Trimmed; blank input is rejected.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("user_id"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Resolves the canonical id for a signed-in user.
    ///
    /// A verified e-mail wins and is lowercased; otherwise the username is
    /// used as given (trimmed). An unverified e-mail never becomes the key.
    pub fn canonical(
        email: Option<&str>,
        email_verified: bool,
        username: Option<&str>,
    ) -> Result<Self, ValidationError> {
        if email_verified {
            if let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) {
                if !email.contains('@') {
                    return Err(ValidationError::invalid_format("email", "missing @ symbol"));
                }
                return Ok(Self(email.to_lowercase()));
            }
        }

        match username.map(str::trim).filter(|u| !u.is_empty()) {
            Some(username) => Ok(Self(username.to_string())),
            None => Err(ValidationError::empty_field("user_id")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-blank string identifiers taken verbatim from the content store.
macro_rules! content_id {
    ($(#[$doc:meta])* $name:ident, $field:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::empty_field($field));
                }
                Ok(Self(id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

content_id!(QuestionId, "question_id");
content_id!(
    /// A question package (pacote). Progress is scoped per package.
    PackageId,
    "package_id"
);

/// Random id of a plan purchase request; parsed back from URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanRequestId(Uuid);

impl PlanRequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlanRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlanRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PlanRequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_rejects_blank() {
        assert!(UserId::new("   ").is_err());
        assert!(UserId::new("").is_err());
    }

    #[test]
    fn user_id_trims_whitespace() {
        assert_eq!(UserId::new("  ana ").unwrap().as_str(), "ana");
    }

    #[test]
    fn canonical_prefers_verified_email() {
        let id = UserId::canonical(Some(" Ana@Example.COM "), true, Some("ana")).unwrap();
        assert_eq!(id.as_str(), "ana@example.com");
    }

    #[test]
    fn canonical_ignores_unverified_email() {
        let id = UserId::canonical(Some("ana@example.com"), false, Some("ana_s")).unwrap();
        assert_eq!(id.as_str(), "ana_s");
    }

    #[test]
    fn canonical_falls_back_to_username_when_email_blank() {
        let id = UserId::canonical(Some("  "), true, Some("joao")).unwrap();
        assert_eq!(id.as_str(), "joao");
    }

    #[test]
    fn canonical_rejects_malformed_verified_email() {
        assert!(UserId::canonical(Some("not-an-email"), true, Some("joao")).is_err());
    }

    #[test]
    fn canonical_requires_some_identity() {
        assert!(UserId::canonical(None, false, None).is_err());
    }

    #[test]
    fn plan_request_id_parses_from_display() {
        let id = PlanRequestId::new();
        let parsed: PlanRequestId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn content_ids_serialize_transparently_and_reject_blanks() {
        let id = QuestionId::new("q-42").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"q-42\"");
        assert!(matches!(
            PackageId::new(" "),
            Err(ValidationError::EmptyField { field: "package_id" })
        ));
    }
}
