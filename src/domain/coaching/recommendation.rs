//! Deterministic part of technique scoring.
//!
//! The application layer adds a random jitter in `[0, 10)` on top of
//! [`score`] before picking the maximum.

use serde::{Deserialize, Serialize};

use super::{QuestionType, StudyTechnique, TechniqueCategory};

/// How many recent recommendations are remembered and penalised.
pub const RECENCY_WINDOW: usize = 4;

pub const SUBJECT_MATCH_BONUS: f64 = 30.0;
pub const QUESTION_TYPE_BONUS: f64 = 20.0;
pub const FAVORITE_BONUS: f64 = 15.0;
pub const ACTIVE_RECALL_AFTER_MISS_BONUS: f64 = 10.0;
pub const FOUNDATIONAL_FIRST_ATTEMPT_BONUS: f64 = 10.0;
pub const JITTER_RANGE: f64 = 10.0;

/// Technique ids recently recommended, most recent first, no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentTechniques {
    ids: Vec<String>,
}

impl RecentTechniques {
    pub fn push(&mut self, id: &str) {
        self.ids.retain(|existing| existing != id);
        self.ids.insert(0, id.to_string());
        self.ids.truncate(RECENCY_WINDOW);
    }

    /// Position in the list, 0 being the most recent.
    pub fn rank(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|existing| existing == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

/// Signals the score is computed from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringContext<'a> {
    pub subject_name: Option<&'a str>,
    pub subject_type: Option<QuestionType>,
    pub was_correct: Option<bool>,
    pub is_first_attempt_in_subject: Option<bool>,
    pub favorites: &'a [String],
    pub recent: Option<&'a RecentTechniques>,
}

/// Score of one technique before jitter.
pub fn score(technique: &StudyTechnique, ctx: &ScoringContext<'_>) -> f64 {
    let mut total = 0.0;

    if ctx
        .subject_name
        .map(|s| technique.matches_subject(s))
        .unwrap_or(false)
    {
        total += SUBJECT_MATCH_BONUS;
    }
    if ctx
        .subject_type
        .map(|t| technique.suits(t))
        .unwrap_or(false)
    {
        total += QUESTION_TYPE_BONUS;
    }
    if ctx.favorites.iter().any(|f| f == &technique.id) {
        total += FAVORITE_BONUS;
    }
    if let Some(rank) = ctx.recent.and_then(|r| r.rank(&technique.id)) {
        total -= (RECENCY_WINDOW - rank) as f64 * 10.0;
    }
    if ctx.was_correct == Some(false) && technique.has_category(TechniqueCategory::ActiveRecall) {
        total += ACTIVE_RECALL_AFTER_MISS_BONUS;
    }
    if ctx.is_first_attempt_in_subject == Some(true)
        && technique.has_category(TechniqueCategory::Foundational)
    {
        total += FOUNDATIONAL_FIRST_ATTEMPT_BONUS;
    }
    total
}
