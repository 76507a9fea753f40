//! Request and response bodies for the quiz endpoints.

use serde::{Deserialize, Serialize};

use crate::application::{ClassifiedError, RevealOutcome};
use crate::domain::coaching::StudyTechnique;
use crate::domain::foundation::Timestamp;
use crate::domain::quiz::{AnswerState, Question, QuestionAnswerRecord};

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: String,
    /// Zero-based option index.
    pub selected_answer: usize,
    #[serde(default)]
    pub time_spent_seconds: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub question_id: String,
    pub selected_answer: usize,
    pub is_correct: bool,
    pub correct_answer: usize,
    pub explanation: String,
    pub answered_at: Timestamp,
    /// True when the question had been answered before; nothing changed.
    pub already_answered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ClassifiedError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technique: Option<TechniqueResponse>,
}

impl From<RevealOutcome> for AnswerResponse {
    fn from(outcome: RevealOutcome) -> Self {
        Self {
            question_id: outcome.record.question_id.to_string(),
            selected_answer: outcome.record.selected_answer,
            is_correct: outcome.record.is_correct,
            correct_answer: outcome.correct_answer,
            explanation: outcome.explanation,
            answered_at: outcome.record.answered_at,
            already_answered: false,
            error: outcome.error,
            technique: outcome.technique.map(TechniqueResponse::from),
        }
    }
}

impl AnswerResponse {
    /// View of a stored answer, without fresh guidance.
    pub fn previous(question: &Question, record: &QuestionAnswerRecord) -> Self {
        Self {
            question_id: record.question_id.to_string(),
            selected_answer: record.selected_answer,
            is_correct: record.is_correct,
            correct_answer: question.correct_answer,
            explanation: question.explanation.clone(),
            answered_at: record.answered_at,
            already_answered: true,
            error: None,
            technique: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerStateResponse {
    pub question_id: String,
    pub state: &'static str,
    /// Present once the answer is revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<AnswerResponse>,
}

impl AnswerStateResponse {
    pub fn new(question: &Question, state: &AnswerState) -> Self {
        let answer = match state {
            AnswerState::Revealed { record } => Some(AnswerResponse::previous(question, record)),
            _ => None,
        };
        Self {
            question_id: question.id.to_string(),
            state: state.name(),
            answer,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TechniqueResponse {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<StudyTechnique> for TechniqueResponse {
    fn from(t: StudyTechnique) -> Self {
        Self {
            id: t.id,
            name: t.name,
            description: t.description,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationQuery {
    pub subject: Option<String>,
    pub was_correct: Option<bool>,
    pub first_attempt: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteRequest {
    pub favorite: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FavoritesResponse {
    pub favorites: Vec<String>,
}
