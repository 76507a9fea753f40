//! Lifetime question quota.

use std::sync::Arc;

use serde::Serialize;

use super::{EntitlementResolver, TypedStore};
use crate::domain::foundation::{DomainError, ErrorCode, QuestionId, UserId};
use crate::domain::plan::PlanTierId;
use crate::domain::quiz::QuotaUsage;
use crate::ports::StoreKey;

pub const UPGRADE_PROMPT: &str =
    "Você atingiu o limite de questões do seu plano. Faça upgrade para continuar praticando.";

/// Quota view returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    pub plan: PlanTierId,
    pub answered: u32,
    /// `None` means unlimited.
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    pub limit_reached: bool,
}

pub struct QuestionQuota {
    store: TypedStore,
    entitlements: Arc<EntitlementResolver>,
}

impl QuestionQuota {
    pub fn new(store: TypedStore, entitlements: Arc<EntitlementResolver>) -> Self {
        Self {
            store,
            entitlements,
        }
    }

    async fn usage(&self, user: &UserId) -> QuotaUsage {
        self.store.load_or_default(&StoreKey::quota(user)).await
    }

    /// Questions left; `None` when the plan is unlimited.
    pub async fn remaining(&self, user: &UserId) -> Option<u32> {
        let plan = self.entitlements.resolve_plan(user).await;
        let usage = self.usage(user).await;
        self.entitlements
            .catalog()
            .tier(plan)
            .remaining_questions(usage.answered)
    }

    pub async fn has_reached_limit(&self, user: &UserId) -> bool {
        self.remaining(user).await == Some(0)
    }

    pub async fn status(&self, user: &UserId) -> QuotaStatus {
        let plan = self.entitlements.resolve_plan(user).await;
        let usage = self.usage(user).await;
        let tier = self.entitlements.catalog().tier(plan);
        let remaining = tier.remaining_questions(usage.answered);
        QuotaStatus {
            plan,
            answered: usage.answered,
            limit: tier.question_limit,
            remaining,
            limit_reached: remaining == Some(0),
        }
    }

    /// Unconditional bump of the counter.
    pub async fn increment(&self, user: &UserId) -> Result<u32, DomainError> {
        self.store
            .update(&StoreKey::quota(user), |usage: &mut QuotaUsage| {
                usage.increment();
                Ok(usage.answered)
            })
            .await
    }

    /// Counts `question` once per user. Returns true if it was counted now.
    pub async fn record_question(
        &self,
        user: &UserId,
        question: &QuestionId,
    ) -> Result<bool, DomainError> {
        let key = StoreKey::quota(user);
        let _guard = self.store.lock(&key).await;
        let mut usage: QuotaUsage = self.store.load_for_update(&key).await?.unwrap_or_default();
        if !usage.record(question) {
            return Ok(false);
        }
        self.store.save(&key, &usage).await?;
        tracing::debug!(user = %user, answered = usage.answered, "quota consumed");
        Ok(true)
    }

    /// Checks the limit and counts `question` in one locked step.
    ///
    /// Returns false when the question was already counted, which is free.
    ///
    /// # Errors
    ///
    /// - `QuotaExceeded` with an upgrade prompt; nothing is written
    pub async fn consume(&self, user: &UserId, question: &QuestionId) -> Result<bool, DomainError> {
        let key = StoreKey::quota(user);
        let _guard = self.store.lock(&key).await;
        let mut usage: QuotaUsage = self.store.load_for_update(&key).await?.unwrap_or_default();
        if usage.has_counted(question) {
            return Ok(false);
        }

        let plan = self.entitlements.resolve_plan(user).await;
        let remaining = self
            .entitlements
            .catalog()
            .tier(plan)
            .remaining_questions(usage.answered);
        if remaining == Some(0) {
            tracing::info!(user = %user, question = %question, "answer rejected, quota exhausted");
            return Err(DomainError::new(ErrorCode::QuotaExceeded, UPGRADE_PROMPT)
                .with_detail("upgrade_prompt", UPGRADE_PROMPT));
        }

        usage.record(question);
        self.store.save(&key, &usage).await?;
        tracing::debug!(user = %user, answered = usage.answered, "quota consumed");
        Ok(true)
    }

    /// True when `question` was already counted, so answering it again is free.
    pub async fn already_counted(&self, user: &UserId, question: &QuestionId) -> bool {
        self.usage(user).await.has_counted(question)
    }

    pub async fn reset(&self, user: &UserId) -> Result<(), DomainError> {
        let key = StoreKey::quota(user);
        let _guard = self.store.lock(&key).await;
        self.store.remove(&key).await?;
        tracing::info!(user = %user, "quota reset");
        Ok(())
    }

    /// Sets the plan and zeroes the counter when it is an upgrade.
    ///
    /// Returns the previous plan.
    pub async fn change_plan(
        &self,
        user: &UserId,
        plan: PlanTierId,
    ) -> Result<PlanTierId, DomainError> {
        let previous = self.entitlements.set_plan(user, plan).await?;
        if previous.is_upgrade_to(plan) {
            self.reset(user).await?;
        }
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryKeyValueStore;
    use crate::domain::plan::PlanCatalog;

    fn quota() -> QuestionQuota {
        let store = TypedStore::new(Arc::new(InMemoryKeyValueStore::new()));
        let resolver = Arc::new(EntitlementResolver::new(
            store.clone(),
            Arc::new(PlanCatalog::default()),
            vec![],
        ));
        QuestionQuota::new(store, resolver)
    }

    fn ana() -> UserId {
        UserId::new("ana@example.com").unwrap()
    }

    fn q(n: usize) -> QuestionId {
        QuestionId::new(format!("q{}", n)).unwrap()
    }

    #[tokio::test]
    async fn free_plan_counts_down_to_zero() {
        let quota = quota();
        assert_eq!(quota.remaining(&ana()).await, Some(10));

        for n in 0..10 {
            assert!(!quota.has_reached_limit(&ana()).await);
            assert!(quota.record_question(&ana(), &q(n)).await.unwrap());
        }
        assert_eq!(quota.remaining(&ana()).await, Some(0));
        assert!(quota.has_reached_limit(&ana()).await);
    }

    #[tokio::test]
    async fn same_question_counts_once() {
        let quota = quota();
        assert!(quota.record_question(&ana(), &q(1)).await.unwrap());
        assert!(!quota.record_question(&ana(), &q(1)).await.unwrap());
        assert_eq!(quota.remaining(&ana()).await, Some(9));
        assert!(quota.already_counted(&ana(), &q(1)).await);
    }

    #[tokio::test]
    async fn remaining_never_goes_negative() {
        let quota = quota();
        for _ in 0..12 {
            quota.increment(&ana()).await.unwrap();
        }
        assert_eq!(quota.remaining(&ana()).await, Some(0));
        assert_eq!(quota.status(&ana()).await.answered, 12);
    }

    #[tokio::test]
    async fn paid_plans_are_unlimited() {
        let quota = quota();
        quota.change_plan(&ana(), PlanTierId::Plus).await.unwrap();
        assert_eq!(quota.remaining(&ana()).await, None);
        assert!(!quota.has_reached_limit(&ana()).await);
    }

    #[tokio::test]
    async fn upgrade_resets_and_downgrade_keeps_count() {
        let quota = quota();
        for n in 0..4 {
            quota.record_question(&ana(), &q(n)).await.unwrap();
        }
        quota.change_plan(&ana(), PlanTierId::Individual).await.unwrap();
        assert_eq!(quota.status(&ana()).await.answered, 0);

        quota.record_question(&ana(), &q(7)).await.unwrap();
        quota.change_plan(&ana(), PlanTierId::Free).await.unwrap();
        assert_eq!(quota.remaining(&ana()).await, Some(9));
    }

    #[tokio::test]
    async fn consume_stops_at_the_limit_but_repeats_stay_free() {
        let quota = quota();
        for n in 0..10 {
            assert!(quota.consume(&ana(), &q(n)).await.unwrap());
        }
        let err = quota.consume(&ana(), &q(10)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::QuotaExceeded);
        assert_eq!(
            err.details.get("upgrade_prompt").map(String::as_str),
            Some(UPGRADE_PROMPT)
        );
        assert!(!quota.consume(&ana(), &q(3)).await.unwrap());
        assert_eq!(quota.status(&ana()).await.answered, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_answers_cannot_overrun_the_last_slot() {
        let quota = Arc::new(quota());
        for n in 0..9 {
            quota.consume(&ana(), &q(n)).await.unwrap();
        }

        let tasks: Vec<_> = (100..110)
            .map(|n| {
                let quota = quota.clone();
                tokio::spawn(async move { quota.consume(&ana(), &q(n)).await })
            })
            .collect();
        let mut accepted = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(true) => accepted += 1,
                Ok(false) => panic!("fresh question reported as already counted"),
                Err(e) => assert_eq!(e.code, ErrorCode::QuotaExceeded),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(quota.status(&ana()).await.answered, 10);
    }

    #[tokio::test]
    async fn status_reports_limit() {
        let quota = quota();
        let status = quota.status(&ana()).await;
        assert_eq!(status.plan, PlanTierId::Free);
        assert_eq!(status.limit, Some(10));
        assert!(!status.limit_reached);
    }
}
