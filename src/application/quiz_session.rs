//! Quiz-taking flow around the answer state machine.
//!
//! A `QuizSession` follows one user through questions. Access is checked
//! when a question is opened. Quota is checked and consumed in one step when
//! an answer is confirmed, before the answer itself is written.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use super::{
    ClassifiedError, EntitlementResolver, ErrorClassifier, PackageProgress, ProgressAggregator,
    QuestionQuota, RecommendationRequest, TechniqueRecommender,
};
use crate::domain::coaching::StudyTechnique;
use crate::domain::foundation::{DomainError, ErrorCode, PackageId, QuestionId, UserId};
use crate::domain::quiz::{
    AnswerMachine, AnswerState, Question, QuestionAnswerRecord, SubjectProgress,
};
use crate::ports::QuestionCatalog;

/// What the user sees once an answer is revealed.
#[derive(Debug, Clone, Serialize)]
pub struct RevealOutcome {
    pub record: QuestionAnswerRecord,
    pub correct_answer: usize,
    pub explanation: String,
    /// Present for wrong answers.
    pub error: Option<ClassifiedError>,
    pub technique: Option<StudyTechnique>,
}

/// Shared collaborators of every session.
#[derive(Clone)]
pub struct QuizService {
    questions: Arc<dyn QuestionCatalog>,
    entitlements: Arc<EntitlementResolver>,
    quota: Arc<QuestionQuota>,
    progress: Arc<ProgressAggregator>,
    classifier: Arc<ErrorClassifier>,
    recommender: Arc<TechniqueRecommender>,
}

impl QuizService {
    pub fn new(
        questions: Arc<dyn QuestionCatalog>,
        entitlements: Arc<EntitlementResolver>,
        quota: Arc<QuestionQuota>,
        progress: Arc<ProgressAggregator>,
        classifier: Arc<ErrorClassifier>,
        recommender: Arc<TechniqueRecommender>,
    ) -> Self {
        Self {
            questions,
            entitlements,
            quota,
            progress,
            classifier,
            recommender,
        }
    }

    pub fn session(&self, user: UserId) -> QuizSession {
        QuizSession {
            service: self.clone(),
            user,
            current: None,
        }
    }

    /// Loads a question and checks the user may see it.
    pub async fn accessible_question(
        &self,
        user: &UserId,
        id: &QuestionId,
    ) -> Result<Question, DomainError> {
        let question = self.questions.find(id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::QuestionNotFound,
                format!("Question {} not found", id),
            )
        })?;

        if !self
            .entitlements
            .can_access_concurso(user, &question.concurso_name)
            .await
        {
            return Err(DomainError::new(
                ErrorCode::AccessDenied,
                format!("No access to concurso '{}'", question.concurso_name),
            )
            .with_detail("concurso", question.concurso_name.clone()));
        }
        if !self
            .entitlements
            .can_access_package(user, question.package_id.as_str())
            .await
        {
            return Err(DomainError::new(
                ErrorCode::AccessDenied,
                format!("No access to package '{}'", question.package_id),
            )
            .with_detail("package", question.package_id.to_string()));
        }
        Ok(question)
    }

    /// Package progress with subject sizes filled in from the catalog.
    ///
    /// Subjects without answers are listed with zero counts. Stored totals
    /// set by content administration take precedence.
    pub async fn package_progress(
        &self,
        user: &UserId,
        package: &PackageId,
    ) -> Result<PackageProgress, DomainError> {
        let mut sizes: BTreeMap<String, u32> = BTreeMap::new();
        for question in self.questions.list_by_package(package).await? {
            *sizes.entry(question.subject_name).or_default() += 1;
        }

        let mut view = self.progress.package(user, package).await;
        for subject in view.subjects.iter_mut() {
            if subject.total_questions_in_subject == 0 {
                subject.total_questions_in_subject =
                    sizes.get(&subject.subject_name).copied().unwrap_or(0);
            }
        }
        for (name, size) in sizes {
            if !view.subjects.iter().any(|s| s.subject_name == name) {
                let mut empty = SubjectProgress::new(name);
                empty.total_questions_in_subject = size;
                view.subjects.push(empty);
            }
        }
        view.subjects
            .sort_by(|a, b| a.subject_name.cmp(&b.subject_name));
        Ok(view)
    }
}

struct Current {
    question: Question,
    machine: AnswerMachine,
    first_attempt_in_subject: Option<bool>,
}

pub struct QuizSession {
    service: QuizService,
    user: UserId,
    current: Option<Current>,
}

impl QuizSession {
    pub fn state(&self) -> Option<&AnswerState> {
        self.current.as_ref().map(|c| c.machine.state())
    }

    pub fn question(&self) -> Option<&Question> {
        self.current.as_ref().map(|c| &c.question)
    }

    /// Moves to a question. Already-answered questions open as revealed.
    pub async fn navigate(&mut self, id: &QuestionId) -> Result<&AnswerState, DomainError> {
        let question = self.service.accessible_question(&self.user, id).await?;
        let stored = self
            .service
            .progress
            .answer(&self.user, &question.package_id, &question.id)
            .await;

        let machine = match stored {
            Some(record) => AnswerMachine::rehydrate(&question, record),
            None => AnswerMachine::new(&question),
        };
        let current = self.current.insert(Current {
            question,
            machine,
            first_attempt_in_subject: None,
        });
        Ok(current.machine.state())
    }

    fn current_mut(&mut self) -> Result<&mut Current, DomainError> {
        self.current.as_mut().ok_or_else(|| {
            DomainError::new(ErrorCode::ValidationFailed, "No question is open")
        })
    }

    /// Returns false when the selection is frozen.
    pub fn select(&mut self, option: usize) -> Result<bool, DomainError> {
        Ok(self.current_mut()?.machine.select(option)?)
    }

    /// Confirms the selection, writing record, progress and quota.
    ///
    /// `Ok(None)` when there is nothing to confirm.
    ///
    /// # Errors
    ///
    /// - `QuotaExceeded` with an upgrade prompt; nothing is written
    /// - `StorageUnavailable` if a write fails; the selection stays open
    pub async fn confirm(
        &mut self,
        time_spent_seconds: u32,
    ) -> Result<Option<QuestionAnswerRecord>, DomainError> {
        let service = self.service.clone();
        let user = self.user.clone();
        let current = self.current_mut()?;
        if !matches!(current.machine.state(), AnswerState::Selected { .. }) {
            return Ok(None);
        }

        let question_id = current.question.id.clone();
        let package = current.question.package_id.clone();
        let first_attempt = service
            .progress
            .is_first_attempt(&user, &package, &current.question.subject_name)
            .await;

        let mut machine = current.machine.clone();
        let Some(record) = machine.confirm(&user, time_spent_seconds) else {
            return Ok(None);
        };
        // Counted first so parallel confirms cannot overrun the limit. A
        // failed progress write leaves the question counted, and retrying
        // it is free.
        service.quota.consume(&user, &question_id).await?;
        service.progress.record(&package, record.clone()).await?;

        current.machine = machine;
        current.first_attempt_in_subject = Some(first_attempt);
        tracing::info!(
            user = %user,
            question = %question_id,
            correct = record.is_correct,
            "answer confirmed"
        );
        Ok(Some(record))
    }

    /// Unlocks correctness and guidance. `Ok(None)` unless just confirmed.
    ///
    /// Guidance is best-effort: a failing classifier or recommender leaves
    /// its field empty instead of failing the reveal.
    pub async fn reveal(&mut self) -> Result<Option<RevealOutcome>, DomainError> {
        let service = self.service.clone();
        let user = self.user.clone();
        let current = self.current_mut()?;
        let Some(record) = current.machine.reveal() else {
            return Ok(None);
        };
        let question = &current.question;

        let error = if record.is_correct {
            None
        } else {
            match service
                .classifier
                .classify(
                    &user,
                    &question.id,
                    &question.subject_name,
                    record.time_spent_seconds,
                    question.time_limit_seconds,
                )
                .await
            {
                Ok(classified) => Some(classified),
                Err(e) => {
                    tracing::warn!(user = %user, error = %e, "error classification skipped");
                    None
                }
            }
        };

        let request = RecommendationRequest {
            subject_name: Some(question.subject_name.clone()),
            was_correct: Some(record.is_correct),
            is_first_attempt_in_subject: current.first_attempt_in_subject,
        };
        let technique = match service.recommender.recommend(&user, &request).await {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "technique recommendation skipped");
                None
            }
        };

        Ok(Some(RevealOutcome {
            correct_answer: question.correct_answer,
            explanation: question.explanation.clone(),
            record,
            error,
            technique,
        }))
    }

    /// Open, select, confirm and reveal in one call.
    ///
    /// Answering an already-answered question returns `Ok(None)` and
    /// leaves the stored answer untouched.
    pub async fn answer(
        &mut self,
        id: &QuestionId,
        option: usize,
        time_spent_seconds: u32,
    ) -> Result<Option<RevealOutcome>, DomainError> {
        self.navigate(id).await?;
        if !self.select(option)? {
            return Ok(None);
        }
        if self.confirm(time_spent_seconds).await?.is_none() {
            return Ok(None);
        }
        self.reveal().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::content::InMemoryQuestionCatalog;
    use crate::adapters::random::SeededRandom;
    use crate::adapters::storage::InMemoryKeyValueStore;
    use crate::application::{TypedStore, UPGRADE_PROMPT};
    use crate::domain::coaching::{ErrorType, SubjectBuckets, TechniqueCatalog};
    use crate::domain::foundation::PackageId;
    use crate::domain::plan::{PlanCatalog, PlanTierId};
    use crate::domain::quiz::question::fixtures::question;

    struct Fixture {
        raw: InMemoryKeyValueStore,
        service: QuizService,
        quota: Arc<QuestionQuota>,
        progress: Arc<ProgressAggregator>,
        entitlements: Arc<EntitlementResolver>,
    }

    async fn fixture() -> Fixture {
        let raw = InMemoryKeyValueStore::new();
        let store = TypedStore::new(Arc::new(raw.clone()));
        let mut questions: Vec<_> = (0..12)
            .map(|n| question(&format!("q{}", n), "Matemática", "P1", "INSS"))
            .collect();
        questions.push(question("pf1", "Direito", "P2", "PF 2025"));
        let catalog = InMemoryQuestionCatalog::with_questions(questions).await.unwrap();

        let random = Arc::new(SeededRandom::new(5));
        let entitlements = Arc::new(EntitlementResolver::new(
            store.clone(),
            Arc::new(PlanCatalog::default()),
            vec![],
        ));
        let quota = Arc::new(QuestionQuota::new(store.clone(), entitlements.clone()));
        let progress = Arc::new(ProgressAggregator::new(store.clone()));
        let classifier = Arc::new(ErrorClassifier::new(store.clone(), random.clone()));
        let recommender = Arc::new(TechniqueRecommender::new(
            store,
            Arc::new(TechniqueCatalog::standard()),
            Arc::new(SubjectBuckets::standard()),
            random,
        ));
        let service = QuizService::new(
            Arc::new(catalog),
            entitlements.clone(),
            quota.clone(),
            progress.clone(),
            classifier,
            recommender,
        );
        Fixture {
            raw,
            service,
            quota,
            progress,
            entitlements,
        }
    }

    fn ana() -> UserId {
        UserId::new("ana@example.com").unwrap()
    }

    fn q(id: &str) -> QuestionId {
        QuestionId::new(id).unwrap()
    }

    #[tokio::test]
    async fn full_flow_correct_answer() {
        let f = fixture().await;
        let mut session = f.service.session(ana());

        session.navigate(&q("q0")).await.unwrap();
        assert!(session.select(2).unwrap());
        let record = session.confirm(30).await.unwrap().unwrap();
        assert!(record.is_correct);

        let outcome = session.reveal().await.unwrap().unwrap();
        assert!(outcome.error.is_none());
        assert!(outcome.technique.is_some());
        assert_eq!(f.quota.remaining(&ana()).await, Some(9));
    }

    #[tokio::test]
    async fn wrong_answer_is_classified() {
        let f = fixture().await;
        let mut session = f.service.session(ana());
        let outcome = session.answer(&q("q1"), 0, 50).await.unwrap().unwrap();
        assert_eq!(outcome.error.unwrap().error_type, ErrorType::Desconhecimento);
        assert_eq!(outcome.correct_answer, 2);
    }

    #[tokio::test]
    async fn double_confirm_writes_once() {
        let f = fixture().await;
        let mut session = f.service.session(ana());
        session.navigate(&q("q0")).await.unwrap();
        session.select(1).unwrap();

        assert!(session.confirm(10).await.unwrap().is_some());
        assert!(session.confirm(10).await.unwrap().is_none());
        assert_eq!(f.quota.status(&ana()).await.answered, 1);
        let p1 = PackageId::new("P1").unwrap();
        assert_eq!(
            f.progress.subject(&ana(), &p1, "Matemática").await.answered_count,
            1
        );
    }

    #[tokio::test]
    async fn confirm_without_selection_is_noop() {
        let f = fixture().await;
        let mut session = f.service.session(ana());
        session.navigate(&q("q0")).await.unwrap();
        assert!(session.confirm(10).await.unwrap().is_none());
        assert_eq!(f.raw.write_count(), 0);
    }

    #[tokio::test]
    async fn navigating_back_rehydrates_revealed() {
        let f = fixture().await;
        let mut session = f.service.session(ana());
        session.answer(&q("q0"), 1, 20).await.unwrap();

        session.navigate(&q("q1")).await.unwrap();
        assert_eq!(session.state().unwrap().name(), "unanswered");

        let state = session.navigate(&q("q0")).await.unwrap();
        assert_eq!(state.name(), "revealed");
        assert!(!session.select(2).unwrap());
        assert!(session.answer(&q("q0"), 2, 5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn quota_exhaustion_blocks_without_writing() {
        let f = fixture().await;
        let mut session = f.service.session(ana());
        for n in 0..10 {
            session.answer(&q(&format!("q{}", n)), 2, 30).await.unwrap();
        }
        assert!(f.quota.has_reached_limit(&ana()).await);

        session.navigate(&q("q10")).await.unwrap();
        session.select(2).unwrap();
        let err = session.confirm(30).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::QuotaExceeded);
        assert_eq!(
            err.details.get("upgrade_prompt").map(String::as_str),
            Some(UPGRADE_PROMPT)
        );
        assert_eq!(session.state().unwrap().name(), "selected");

        let p1 = PackageId::new("P1").unwrap();
        assert!(f.progress.answer(&ana(), &p1, &q("q10")).await.is_none());
    }

    #[tokio::test]
    async fn missing_question_is_not_found() {
        let f = fixture().await;
        let mut session = f.service.session(ana());
        let err = session.navigate(&q("nope")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::QuestionNotFound);
        assert!(session.select(0).is_err());
    }

    #[tokio::test]
    async fn scoped_individual_user_is_denied_other_concursos() {
        let f = fixture().await;
        f.entitlements
            .set_plan(&ana(), PlanTierId::Individual)
            .await
            .unwrap();
        f.entitlements
            .grant_concurso(&ana(), "INSS", None)
            .await
            .unwrap();

        let mut session = f.service.session(ana());
        session.navigate(&q("q0")).await.unwrap();
        let err = session.navigate(&q("pf1")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AccessDenied);
    }

    #[tokio::test]
    async fn package_progress_lists_catalog_subjects() {
        let f = fixture().await;
        let mut session = f.service.session(ana());
        session.answer(&q("q0"), 2, 20).await.unwrap();

        let p1 = PackageId::new("P1").unwrap();
        let view = f.service.package_progress(&ana(), &p1).await.unwrap();
        assert_eq!(view.subjects.len(), 1);
        assert_eq!(view.subjects[0].answered_count, 1);
        assert_eq!(view.subjects[0].total_questions_in_subject, 12);

        let p2 = PackageId::new("P2").unwrap();
        let untouched = f.service.package_progress(&ana(), &p2).await.unwrap();
        assert_eq!(untouched.subjects[0].subject_name, "Direito");
        assert_eq!(untouched.subjects[0].answered_count, 0);
        assert_eq!(untouched.answered_count, 0);
    }
}
