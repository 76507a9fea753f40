//! Question content as read from the content store.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PackageId, QuestionId, ValidationError};

/// Answer time assumed when the content store gives none.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 120;

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_SECS
}

/// A multiple-choice question. Read-only for the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
    pub subject_name: String,
    pub package_id: PackageId,
    pub concurso_name: String,
    #[serde(default = "default_time_limit")]
    pub time_limit_seconds: u32,
}

impl Question {
    /// Checks the structural invariants of a question loaded from outside.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.options.len() < 2 {
            return Err(ValidationError::out_of_range(
                "options",
                2,
                i32::MAX,
                self.options.len() as i32,
            ));
        }
        if self.correct_answer >= self.options.len() {
            return Err(ValidationError::out_of_range(
                "correct_answer",
                0,
                self.options.len() as i32 - 1,
                self.correct_answer as i32,
            ));
        }
        if self.subject_name.trim().is_empty() {
            return Err(ValidationError::empty_field("subject_name"));
        }
        Ok(())
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::question;
    use super::*;

    #[test]
    fn fixture_is_valid() {
        assert!(question("q1", "Português", "P1", "INSS").validate().is_ok());
    }

    #[test]
    fn correct_answer_out_of_range_is_invalid() {
        let mut q = question("q1", "Português", "P1", "INSS");
        q.correct_answer = 4;
        assert!(q.validate().is_err());
    }

    #[test]
    fn time_limit_defaults_when_missing() {
        let yaml = r#"
id: q9
title: Quanto é 2 + 2?
options: ["3", "4", "5", "22"]
correct_answer: 1
subject_name: Matemática
package_id: P1
concurso_name: Banco do Brasil
"#;
        let q: Question = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(q.time_limit_seconds, DEFAULT_TIME_LIMIT_SECS);
        assert!(q.explanation.is_empty());
    }
}
