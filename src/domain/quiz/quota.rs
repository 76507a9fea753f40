use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::QuestionId;

/// Lifetime count of questions answered by one user.
///
/// The counter only grows; the single exception is a reset on plan upgrade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub answered: u32,
    /// Questions already counted, so re-answering does not consume quota.
    #[serde(default)]
    pub counted: BTreeSet<QuestionId>,
}

impl QuotaUsage {
    /// Unconditional bump.
    pub fn increment(&mut self) {
        self.answered = self.answered.saturating_add(1);
    }

    /// Counts `question` unless it was counted before. Returns true if counted.
    pub fn record(&mut self, question: &QuestionId) -> bool {
        if !self.counted.insert(question.clone()) {
            return false;
        }
        self.increment();
        true
    }

    pub fn has_counted(&self, question: &QuestionId) -> bool {
        self.counted.contains(question)
    }
}
