//! Per-subject progress and the answer sheet it is derived from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::QuestionAnswerRecord;
use crate::domain::foundation::{Percentage, QuestionId, Timestamp};

/// Progress of one user in one subject of one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectProgress {
    pub subject_name: String,
    pub answered_count: u32,
    pub correct_count: u32,
    /// Set by content administration; never touched by answering.
    pub total_questions_in_subject: u32,
    pub last_studied_at: Option<Timestamp>,
}

impl SubjectProgress {
    pub fn new(subject_name: impl Into<String>) -> Self {
        Self {
            subject_name: subject_name.into(),
            ..Default::default()
        }
    }

    pub fn accuracy(&self) -> Percentage {
        Percentage::from_ratio(self.correct_count, self.answered_count)
    }

    pub fn completion(&self) -> Percentage {
        Percentage::from_ratio(
            self.answered_count.min(self.total_questions_in_subject),
            self.total_questions_in_subject,
        )
    }

    /// Re-derives the counts from the answer sheet.
    pub fn recount(&mut self, sheet: &AnswerSheet, now: Timestamp) {
        let (answered, correct) = sheet.counts_for(&self.subject_name);
        self.answered_count = answered;
        self.correct_count = correct;
        self.last_studied_at = Some(now);
    }
}

/// Latest answer per question within one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSheet {
    pub records: BTreeMap<QuestionId, QuestionAnswerRecord>,
}

impl AnswerSheet {
    /// Stores `record`, replacing any earlier answer to the same question.
    ///
    /// Returns the replaced record.
    pub fn upsert(&mut self, record: QuestionAnswerRecord) -> Option<QuestionAnswerRecord> {
        self.records.insert(record.question_id.clone(), record)
    }

    pub fn get(&self, question_id: &QuestionId) -> Option<&QuestionAnswerRecord> {
        self.records.get(question_id)
    }

    /// `(answered, correct)` for a subject.
    pub fn counts_for(&self, subject: &str) -> (u32, u32) {
        self.records
            .values()
            .filter(|r| r.subject_name == subject)
            .fold((0, 0), |(answered, correct), r| {
                (answered + 1, correct + u32::from(r.is_correct))
            })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
