//! Progress aggregation over confirmed answers.
//!
//! Records:
//! - one answer sheet per user and package (latest answer per question)
//! - one `SubjectProgress` per user, package and subject
//! - one subject index per user and package, so a package view can list
//!   its subjects
//!
//! Writers hold the answer-sheet lock of their package for the whole update,
//! which covers the subject and index records of that package too.

use std::collections::BTreeSet;

use serde::Serialize;

use super::TypedStore;
use crate::domain::foundation::{DomainError, PackageId, Percentage, QuestionId, Timestamp, UserId};
use crate::domain::quiz::{AnswerSheet, QuestionAnswerRecord, SubjectProgress};
use crate::ports::StoreKey;

/// All subjects of a package for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageProgress {
    pub package_id: PackageId,
    pub subjects: Vec<SubjectProgress>,
    pub answered_count: u32,
    pub correct_count: u32,
    pub accuracy: Percentage,
}

pub struct ProgressAggregator {
    store: TypedStore,
}

impl ProgressAggregator {
    pub fn new(store: TypedStore) -> Self {
        Self { store }
    }

    /// Stores `record` and re-derives its subject's progress.
    ///
    /// Returns the updated progress.
    pub async fn record(
        &self,
        package: &PackageId,
        record: QuestionAnswerRecord,
    ) -> Result<SubjectProgress, DomainError> {
        let user = record.user_id.clone();
        let subject = record.subject_name.clone();

        let sheet_key = StoreKey::answer_sheet(&user, package);
        let _guard = self.store.lock(&sheet_key).await;
        let mut sheet: AnswerSheet = self
            .store
            .load_for_update(&sheet_key)
            .await?
            .unwrap_or_default();
        sheet.upsert(record);
        self.store.save(&sheet_key, &sheet).await?;

        let progress_key = StoreKey::subject_progress(&user, package, &subject);
        let mut progress: SubjectProgress = self
            .store
            .load_for_update(&progress_key)
            .await?
            .unwrap_or_else(|| SubjectProgress::new(subject.clone()));
        progress.recount(&sheet, Timestamp::now());
        self.store.save(&progress_key, &progress).await?;

        self.index_subject(&user, package, &subject).await?;

        tracing::debug!(
            user = %user,
            package = %package,
            subject = %subject,
            answered = progress.answered_count,
            correct = progress.correct_count,
            "progress updated"
        );
        Ok(progress)
    }

    async fn index_subject(
        &self,
        user: &UserId,
        package: &PackageId,
        subject: &str,
    ) -> Result<(), DomainError> {
        let key = StoreKey::progress_index(user, package);
        let mut subjects: BTreeSet<String> =
            self.store.load_for_update(&key).await?.unwrap_or_default();
        if subjects.insert(subject.to_string()) {
            self.store.save(&key, &subjects).await?;
        }
        Ok(())
    }

    /// Stored answer for a question, if any.
    pub async fn answer(
        &self,
        user: &UserId,
        package: &PackageId,
        question: &QuestionId,
    ) -> Option<QuestionAnswerRecord> {
        let sheet: AnswerSheet = self
            .store
            .load_or_default(&StoreKey::answer_sheet(user, package))
            .await;
        sheet.get(question).cloned()
    }

    pub async fn subject(
        &self,
        user: &UserId,
        package: &PackageId,
        subject: &str,
    ) -> SubjectProgress {
        self.store
            .load(&StoreKey::subject_progress(user, package, subject))
            .await
            .unwrap_or_else(|| SubjectProgress::new(subject))
    }

    pub async fn package(&self, user: &UserId, package: &PackageId) -> PackageProgress {
        let subjects: BTreeSet<String> = self
            .store
            .load_or_default(&StoreKey::progress_index(user, package))
            .await;

        let mut out = Vec::with_capacity(subjects.len());
        for subject in &subjects {
            out.push(self.subject(user, package, subject).await);
        }
        let answered_count = out.iter().map(|s| s.answered_count).sum();
        let correct_count = out.iter().map(|s| s.correct_count).sum();
        PackageProgress {
            package_id: package.clone(),
            subjects: out,
            answered_count,
            correct_count,
            accuracy: Percentage::from_ratio(correct_count, answered_count),
        }
    }

    /// True when nothing has been answered yet in `subject`.
    pub async fn is_first_attempt(
        &self,
        user: &UserId,
        package: &PackageId,
        subject: &str,
    ) -> bool {
        self.subject(user, package, subject).await.answered_count == 0
    }

    /// Sets the subject size from content administration.
    pub async fn set_subject_total(
        &self,
        user: &UserId,
        package: &PackageId,
        subject: &str,
        total: u32,
    ) -> Result<SubjectProgress, DomainError> {
        let _guard = self.store.lock(&StoreKey::answer_sheet(user, package)).await;
        let key = StoreKey::subject_progress(user, package, subject);
        let mut progress: SubjectProgress = self
            .store
            .load_for_update(&key)
            .await?
            .unwrap_or_else(|| SubjectProgress::new(subject));
        progress.total_questions_in_subject = total;
        self.store.save(&key, &progress).await?;
        self.index_subject(user, package, subject).await?;
        Ok(progress)
    }

    /// Clears every answer and subject record of one package.
    pub async fn reset_package(&self, user: &UserId, package: &PackageId) -> Result<(), DomainError> {
        let sheet_key = StoreKey::answer_sheet(user, package);
        let _guard = self.store.lock(&sheet_key).await;
        let index_key = StoreKey::progress_index(user, package);
        let subjects: BTreeSet<String> = self.store.load_or_default(&index_key).await;
        for subject in &subjects {
            self.store
                .remove(&StoreKey::subject_progress(user, package, subject))
                .await?;
        }
        self.store.remove(&index_key).await?;
        self.store.remove(&sheet_key).await?;
        tracing::info!(user = %user, package = %package, "package progress reset");
        Ok(())
    }
}
