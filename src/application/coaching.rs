//! Post-answer guidance: error classification and technique recommendation.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use super::TypedStore;
use crate::domain::coaching::{
    classify, phrase_bank, score, ErrorHistory, ErrorInsight, ErrorRecord, ErrorType,
    RecentTechniques, ScoringContext, StudyTechnique, SubjectBuckets, TechniqueCatalog,
    WrongAnswer, JITTER_RANGE,
};
use crate::domain::foundation::{DomainError, ErrorCode, QuestionId, Timestamp, UserId};
use crate::ports::{RandomSource, StoreKey};

/// Classifier output shown after a wrong answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedError {
    pub error_type: ErrorType,
    pub insight: &'static str,
    pub correction_tip: &'static str,
}

/// Error totals per category, overall and per subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorSummary {
    pub total: u32,
    pub by_type: Vec<ErrorTypeCount>,
    pub by_subject: Vec<SubjectErrors>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectErrors {
    pub subject_name: String,
    pub total: u32,
    /// Only the types that occurred.
    pub by_type: Vec<ErrorTypeCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorTypeCount {
    pub error_type: ErrorType,
    pub count: u32,
}

pub struct ErrorClassifier {
    store: TypedStore,
    random: Arc<dyn RandomSource>,
}

impl ErrorClassifier {
    pub fn new(store: TypedStore, random: Arc<dyn RandomSource>) -> Self {
        Self { store, random }
    }

    /// Labels a wrong answer, appends it to the history and picks display text.
    pub async fn classify(
        &self,
        user: &UserId,
        question: &QuestionId,
        subject: &str,
        time_spent_seconds: u32,
        time_limit_seconds: u32,
    ) -> Result<ClassifiedError, DomainError> {
        let key = StoreKey::error_history(user);
        let _guard = self.store.lock(&key).await;
        let mut history: ErrorHistory = self.store.load_for_update(&key).await?.unwrap_or_default();

        let error_type = classify(
            &history,
            &WrongAnswer {
                question_id: question,
                subject_name: subject,
                time_spent_seconds,
                time_limit_seconds,
            },
        );
        history.push(ErrorRecord {
            question_id: question.clone(),
            user_id: user.clone(),
            subject_name: subject.to_string(),
            error_type,
            timestamp: Timestamp::now(),
        });
        self.store.save(&key, &history).await?;

        let bank = phrase_bank(error_type);
        let ErrorInsight {
            insight,
            correction_tip,
        } = bank[self.random.pick_index(bank.len())];

        tracing::debug!(user = %user, question = %question, error_type = %error_type, "error classified");
        Ok(ClassifiedError {
            error_type,
            insight,
            correction_tip,
        })
    }

    pub async fn history(&self, user: &UserId) -> ErrorHistory {
        self.store.load_or_default(&StoreKey::error_history(user)).await
    }

    pub async fn summary(&self, user: &UserId) -> ErrorSummary {
        let history = self.history(user).await;

        let mut subjects: BTreeMap<&str, BTreeMap<ErrorType, u32>> = BTreeMap::new();
        for record in history.iter() {
            *subjects
                .entry(record.subject_name.as_str())
                .or_default()
                .entry(record.error_type)
                .or_default() += 1;
        }
        let by_subject = subjects
            .into_iter()
            .map(|(subject, counts)| SubjectErrors {
                subject_name: subject.to_string(),
                total: counts.values().sum(),
                by_type: counts
                    .into_iter()
                    .map(|(error_type, count)| ErrorTypeCount { error_type, count })
                    .collect(),
            })
            .collect();

        ErrorSummary {
            total: history.len() as u32,
            by_type: history
                .counts_by_type()
                .into_iter()
                .map(|(error_type, count)| ErrorTypeCount { error_type, count })
                .collect(),
            by_subject,
        }
    }
}

/// Signals for one recommendation request. Unknown signals are `None`.
#[derive(Debug, Clone, Default)]
pub struct RecommendationRequest {
    pub subject_name: Option<String>,
    pub was_correct: Option<bool>,
    pub is_first_attempt_in_subject: Option<bool>,
}

pub struct TechniqueRecommender {
    store: TypedStore,
    catalog: Arc<TechniqueCatalog>,
    buckets: Arc<SubjectBuckets>,
    random: Arc<dyn RandomSource>,
}

impl TechniqueRecommender {
    pub fn new(
        store: TypedStore,
        catalog: Arc<TechniqueCatalog>,
        buckets: Arc<SubjectBuckets>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            store,
            catalog,
            buckets,
            random,
        }
    }

    pub fn catalog(&self) -> &TechniqueCatalog {
        &self.catalog
    }

    /// Picks the best-scoring technique and records it as recent.
    pub async fn recommend(
        &self,
        user: &UserId,
        request: &RecommendationRequest,
    ) -> Result<StudyTechnique, DomainError> {
        let favorites = self.favorites(user).await;
        let recent_key = StoreKey::recent_techniques(user);
        let _guard = self.store.lock(&recent_key).await;
        let mut recent: RecentTechniques = self
            .store
            .load_for_update(&recent_key)
            .await?
            .unwrap_or_default();

        let subject = request.subject_name.as_deref();
        let ctx = ScoringContext {
            subject_name: subject,
            subject_type: subject.and_then(|s| self.buckets.bucket_for(s)),
            was_correct: request.was_correct,
            is_first_attempt_in_subject: request.is_first_attempt_in_subject,
            favorites: &favorites,
            recent: Some(&recent),
        };

        let mut best: Option<(&StudyTechnique, f64)> = None;
        for technique in self.catalog.all() {
            let total = score(technique, &ctx) + self.random.next_unit() * JITTER_RANGE;
            if best.map(|(_, s)| total > s).unwrap_or(true) {
                best = Some((technique, total));
            }
        }
        let Some((chosen, chosen_score)) = best else {
            return Err(DomainError::new(
                ErrorCode::TechniqueNotFound,
                "Technique catalog is empty",
            ));
        };
        let chosen = chosen.clone();

        recent.push(&chosen.id);
        self.store.save(&recent_key, &recent).await?;
        tracing::debug!(user = %user, technique = %chosen.id, score = chosen_score, "technique recommended");
        Ok(chosen)
    }

    pub async fn favorites(&self, user: &UserId) -> Vec<String> {
        self.store.load_or_default(&StoreKey::favorites(user)).await
    }

    pub async fn recent(&self, user: &UserId) -> RecentTechniques {
        self.store.load_or_default(&StoreKey::recent_techniques(user)).await
    }

    /// Adds or removes a favorite. Returns the new favorite list.
    pub async fn set_favorite(
        &self,
        user: &UserId,
        technique_id: &str,
        favorite: bool,
    ) -> Result<Vec<String>, DomainError> {
        if self.catalog.get(technique_id).is_none() {
            return Err(DomainError::new(
                ErrorCode::TechniqueNotFound,
                format!("Unknown technique '{}'", technique_id),
            ));
        }
        self.store
            .update(&StoreKey::favorites(user), |favorites: &mut Vec<String>| {
                favorites.retain(|f| f != technique_id);
                if favorite {
                    favorites.push(technique_id.to_string());
                }
                Ok(favorites.clone())
            })
            .await
    }
}
