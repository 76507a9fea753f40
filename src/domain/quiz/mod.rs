//! Quiz domain module.
//!
//! - `question` - Read-only question content
//! - `answer` - Confirmed answer records
//! - `machine` - Per-question answer lifecycle
//! - `progress` - Answer sheet and subject progress
//! - `quota` - Lifetime answered-question counter

mod answer;
mod machine;
mod progress;
pub(crate) mod question;
mod quota;

pub use answer::QuestionAnswerRecord;
pub use machine::{AnswerMachine, AnswerState};
pub use progress::{AnswerSheet, SubjectProgress};
pub use question::{Question, DEFAULT_TIME_LIMIT_SECS};
pub use quota::QuotaUsage;
