//! Per-question answer lifecycle.
//!
//! ```text
//! Unanswered --select--> Selected --confirm--> Confirmed --reveal--> Revealed
//!                          ^   |
//!                          +---+ select (change choice)
//! ```
//!
//! Once confirmed, the selection is frozen. Late calls are no-ops, never
//! errors, because UI events may arrive after the state moved on.

use super::{Question, QuestionAnswerRecord};
use crate::domain::foundation::{QuestionId, Timestamp, UserId, ValidationError};

/// Where the machine currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerState {
    Unanswered,
    Selected { option: usize },
    Confirmed { record: QuestionAnswerRecord },
    Revealed { record: QuestionAnswerRecord },
}

impl AnswerState {
    pub fn name(&self) -> &'static str {
        match self {
            AnswerState::Unanswered => "unanswered",
            AnswerState::Selected { .. } => "selected",
            AnswerState::Confirmed { .. } => "confirmed",
            AnswerState::Revealed { .. } => "revealed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnswerMachine {
    question_id: QuestionId,
    subject_name: String,
    correct_answer: usize,
    option_count: usize,
    state: AnswerState,
}

impl AnswerMachine {
    /// Fresh machine for a question never answered before.
    pub fn new(question: &Question) -> Self {
        Self {
            question_id: question.id.clone(),
            subject_name: question.subject_name.clone(),
            correct_answer: question.correct_answer,
            option_count: question.option_count(),
            state: AnswerState::Unanswered,
        }
    }

    /// Machine for a question already answered: straight to `Revealed`.
    pub fn rehydrate(question: &Question, record: QuestionAnswerRecord) -> Self {
        let mut machine = Self::new(question);
        machine.state = AnswerState::Revealed { record };
        machine
    }

    pub fn state(&self) -> &AnswerState {
        &self.state
    }

    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    /// Picks an option. Returns `Ok(false)` when the selection is frozen.
    pub fn select(&mut self, option: usize) -> Result<bool, ValidationError> {
        if matches!(
            self.state,
            AnswerState::Confirmed { .. } | AnswerState::Revealed { .. }
        ) {
            return Ok(false);
        }
        if option >= self.option_count {
            return Err(ValidationError::out_of_range(
                "selected_answer",
                0,
                self.option_count as i32 - 1,
                option as i32,
            ));
        }
        match self.state {
            AnswerState::Unanswered | AnswerState::Selected { .. } => {
                self.state = AnswerState::Selected { option };
                Ok(true)
            }
            AnswerState::Confirmed { .. } | AnswerState::Revealed { .. } => Ok(false),
        }
    }

    /// Freezes the selection and produces the record.
    ///
    /// Returns `None` with nothing selected, or when already confirmed, so a
    /// double confirm yields exactly one record.
    pub fn confirm(
        &mut self,
        user_id: &UserId,
        time_spent_seconds: u32,
    ) -> Option<QuestionAnswerRecord> {
        let AnswerState::Selected { option } = self.state else {
            return None;
        };
        let record = QuestionAnswerRecord {
            question_id: self.question_id.clone(),
            user_id: user_id.clone(),
            selected_answer: option,
            is_correct: option == self.correct_answer,
            answered_at: Timestamp::now(),
            subject_name: self.subject_name.clone(),
            time_spent_seconds,
        };
        self.state = AnswerState::Confirmed {
            record: record.clone(),
        };
        Some(record)
    }

    /// Shows correctness and explanation. Returns the record on the first
    /// reveal only.
    pub fn reveal(&mut self) -> Option<QuestionAnswerRecord> {
        let AnswerState::Confirmed { record } = &self.state else {
            return None;
        };
        let record = record.clone();
        self.state = AnswerState::Revealed {
            record: record.clone(),
        };
        Some(record)
    }

    /// Selection currently held, confirmed or not.
    pub fn selected_option(&self) -> Option<usize> {
        match &self.state {
            AnswerState::Unanswered => None,
            AnswerState::Selected { option } => Some(*option),
            AnswerState::Confirmed { record } | AnswerState::Revealed { record } => {
                Some(record.selected_answer)
            }
        }
    }
}
