//! Coaching domain module.
//!
//! - `error_classifier` - Labels wrong answers and keeps the error history
//! - `techniques` - Study technique catalog and subject type table
//! - `recommendation` - Technique scoring and the recency list

mod error_classifier;
mod recommendation;
mod techniques;

pub use error_classifier::{
    classify, phrase_bank, ErrorHistory, ErrorInsight, ErrorRecord, ErrorType, WrongAnswer,
    ERROR_HISTORY_CAP,
};
pub use recommendation::{
    score, RecentTechniques, ScoringContext, JITTER_RANGE, RECENCY_WINDOW,
};
pub use techniques::{
    QuestionType, StudyTechnique, SubjectBuckets, TechniqueCatalog, TechniqueCategory,
};
