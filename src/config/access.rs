//! Access policy configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::foundation::UserId;

#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// Canonical user ids allowed to call admin endpoints (comma-separated)
    pub admin_users: Option<String>,

    /// Lifetime question allowance of the free plan
    #[serde(default = "default_free_question_limit")]
    pub free_question_limit: u32,
}

impl AccessConfig {
    /// Admin ids in canonical form: emails lowercased, usernames as given.
    pub fn admin_list(&self) -> Vec<UserId> {
        self.admin_users
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| {
                if s.contains('@') {
                    UserId::new(s.to_lowercase()).ok()
                } else {
                    UserId::new(s).ok()
                }
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.free_question_limit == 0 {
            return Err(ValidationError::InvalidQuestionLimit);
        }
        Ok(())
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            admin_users: None,
            free_question_limit: default_free_question_limit(),
        }
    }
}

fn default_free_question_limit() -> u32 {
    10
}
