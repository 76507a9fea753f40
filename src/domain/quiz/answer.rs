use serde::{Deserialize, Serialize};

use crate::domain::foundation::{QuestionId, Timestamp, UserId};

/// A confirmed answer. Re-answering a question overwrites the previous
/// record for it within the same package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswerRecord {
    pub question_id: QuestionId,
    pub user_id: UserId,
    pub selected_answer: usize,
    pub is_correct: bool,
    pub answered_at: Timestamp,
    pub subject_name: String,
    pub time_spent_seconds: u32,
}
