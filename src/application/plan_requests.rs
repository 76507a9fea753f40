//! Plan request workflow.
//!
//! All requests live in one global list filtered by user on read; every
//! write holds the list's lock. Reaching `concluido` applies the plan to the
//! requester before the status is stored: the tier is set (quota reset on
//! upgrade) and, for individual plans, the desired concurso is granted in
//! place of the oldest one when the slot is taken.

use std::sync::Arc;

use super::{EntitlementResolver, QuestionQuota, TypedStore};
use crate::domain::foundation::{DomainError, ErrorCode, PlanRequestId, Timestamp, UserId};
use crate::domain::plan_request::{
    CreationProgress, NewPlanRequest, PaymentEvent, PlanRequest, PlanRequestStatus, RequestedPlan,
};
use crate::ports::StoreKey;

/// Input for a new request, as sent by the requester.
#[derive(Debug, Clone)]
pub struct CreatePlanRequest {
    pub user_id: UserId,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub plan_type: RequestedPlan,
    pub concurso_desejado: Option<String>,
}

pub struct PlanRequestWorkflow {
    store: TypedStore,
    entitlements: Arc<EntitlementResolver>,
    quota: Arc<QuestionQuota>,
    payment_link_base: Option<String>,
}

impl PlanRequestWorkflow {
    pub fn new(
        store: TypedStore,
        entitlements: Arc<EntitlementResolver>,
        quota: Arc<QuestionQuota>,
        payment_link_base: Option<String>,
    ) -> Self {
        Self {
            store,
            entitlements,
            quota,
            payment_link_base,
        }
    }

    async fn all(&self) -> Vec<PlanRequest> {
        self.store.load_or_default(&StoreKey::plan_requests()).await
    }

    async fn all_for_update(&self) -> Result<Vec<PlanRequest>, DomainError> {
        Ok(self
            .store
            .load_for_update(&StoreKey::plan_requests())
            .await?
            .unwrap_or_default())
    }

    async fn save_all(&self, requests: &[PlanRequest]) -> Result<(), DomainError> {
        self.store.save(&StoreKey::plan_requests(), &requests).await
    }

    pub async fn create(&self, input: CreatePlanRequest) -> Result<PlanRequest, DomainError> {
        if input.plan_type == RequestedPlan::Individual
            && input
                .concurso_desejado
                .as_deref()
                .map(str::trim)
                .unwrap_or("")
                .is_empty()
        {
            return Err(DomainError::validation(
                "concurso_desejado",
                "Individual plans need the desired concurso",
            ));
        }

        let id = PlanRequestId::new();
        let amount_cents = self
            .entitlements
            .catalog()
            .tier(input.plan_type.tier())
            .price_cents;
        let payment_link = self
            .payment_link_base
            .as_ref()
            .map(|base| format!("{}?ref={}", base.trim_end_matches('/'), id));

        let request = PlanRequest::create(
            id,
            NewPlanRequest {
                user_id: input.user_id,
                user_email: input.user_email,
                user_name: input.user_name,
                plan_type: input.plan_type,
                concurso_desejado: input.concurso_desejado,
                payment_link,
                amount_cents,
            },
        )?;

        let _guard = self.store.lock(&StoreKey::plan_requests()).await;
        let mut all = self.all_for_update().await?;
        all.push(request.clone());
        self.save_all(&all).await?;
        tracing::info!(
            request_id = %request.id,
            user = %request.user_id,
            plan = ?request.plan_type,
            amount_cents,
            "plan request created"
        );
        Ok(request)
    }

    pub async fn get(&self, id: &PlanRequestId) -> Result<PlanRequest, DomainError> {
        self.all()
            .await
            .into_iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| not_found(id))
    }

    /// Requests of one user, newest first.
    pub async fn list_for_user(&self, user: &UserId) -> Vec<PlanRequest> {
        let mut mine: Vec<_> = self
            .all()
            .await
            .into_iter()
            .filter(|r| &r.user_id == user)
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine
    }

    /// Every request, optionally filtered by status, newest first.
    pub async fn list(&self, status: Option<PlanRequestStatus>) -> Vec<PlanRequest> {
        let mut all: Vec<_> = self
            .all()
            .await
            .into_iter()
            .filter(|r| status.map(|s| r.status == s).unwrap_or(true))
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Applies `change` to one request and persists the list.
    async fn modify<F>(&self, id: &PlanRequestId, change: F) -> Result<PlanRequest, DomainError>
    where
        F: FnOnce(&mut PlanRequest) -> Result<(), DomainError>,
    {
        let _guard = self.store.lock(&StoreKey::plan_requests()).await;
        let mut all = self.all_for_update().await?;
        let request = all
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| not_found(id))?;
        change(request)?;
        let updated = request.clone();
        self.save_all(&all).await?;
        Ok(updated)
    }

    /// Admin transition. Terminal requests are rejected with `WorkflowTerminal`.
    ///
    /// A failure while applying the plan stores nothing, so the transition
    /// to `concluido` can be retried.
    pub async fn update_status(
        &self,
        id: &PlanRequestId,
        target: PlanRequestStatus,
    ) -> Result<PlanRequest, DomainError> {
        let _guard = self.store.lock(&StoreKey::plan_requests()).await;
        let mut all = self.all_for_update().await?;
        let index = all
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| not_found(id))?;

        let mut updated = all[index].clone();
        updated.transition(target)?;
        if updated.status == PlanRequestStatus::Concluido {
            self.apply_plan(&updated).await?;
        }
        all[index] = updated.clone();
        self.save_all(&all).await?;
        tracing::info!(request_id = %id, status = %updated.status, "plan request status updated");
        Ok(updated)
    }

    pub async fn confirm_payment(&self, id: &PlanRequestId) -> Result<PlanRequest, DomainError> {
        self.update_status(id, PlanRequestStatus::PagamentoConfirmado)
            .await
    }

    pub async fn cancel(&self, id: &PlanRequestId) -> Result<PlanRequest, DomainError> {
        self.update_status(id, PlanRequestStatus::Cancelado).await
    }

    /// Cancel on behalf of the requester; other users get `Forbidden`.
    pub async fn cancel_own(
        &self,
        user: &UserId,
        id: &PlanRequestId,
    ) -> Result<PlanRequest, DomainError> {
        let request = self.get(id).await?;
        if &request.user_id != user {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Plan request belongs to another user",
            ));
        }
        self.cancel(id).await
    }

    pub async fn update_progress(
        &self,
        id: &PlanRequestId,
        progress: CreationProgress,
    ) -> Result<PlanRequest, DomainError> {
        self.modify(id, |r| r.update_progress(progress)).await
    }

    /// Marks unpaid requests older than `max_age_hours` as abandoned.
    ///
    /// Returns the ids that changed.
    pub async fn abandon_stale(
        &self,
        max_age_hours: i64,
    ) -> Result<Vec<PlanRequestId>, DomainError> {
        let now = Timestamp::now();
        let _guard = self.store.lock(&StoreKey::plan_requests()).await;
        let mut all = self.all_for_update().await?;
        let mut abandoned = Vec::new();
        for request in all.iter_mut().filter(|r| r.is_abandoned_at(&now, max_age_hours)) {
            request.abandon()?;
            abandoned.push(request.id);
        }
        if !abandoned.is_empty() {
            self.save_all(&all).await?;
            tracing::info!(count = abandoned.len(), "stale plan requests abandoned");
        }
        Ok(abandoned)
    }

    /// Reacts to a verified payment provider event.
    pub async fn handle_payment_event(
        &self,
        event: &PaymentEvent,
    ) -> Result<PlanRequest, DomainError> {
        match event {
            PaymentEvent::Confirmed { request_id } => self.confirm_payment(request_id).await,
            PaymentEvent::Expired { request_id } => {
                self.update_status(request_id, PlanRequestStatus::PagamentoAbandonado)
                    .await
            }
        }
    }

    /// Idempotent, so a retried completion does not reset quota twice.
    async fn apply_plan(&self, request: &PlanRequest) -> Result<(), DomainError> {
        let user = &request.user_id;
        self.quota.change_plan(user, request.plan_type.tier()).await?;
        if let (RequestedPlan::Individual, Some(concurso)) =
            (request.plan_type, request.concurso_desejado.as_deref())
        {
            self.entitlements
                .grant_purchased_concurso(user, concurso)
                .await?;
        }
        tracing::info!(request_id = %request.id, user = %user, "plan applied");
        Ok(())
    }
}

fn not_found(id: &PlanRequestId) -> DomainError {
    DomainError::new(
        ErrorCode::PlanRequestNotFound,
        format!("Plan request {} not found", id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryKeyValueStore;
    use crate::domain::foundation::Percentage;
    use crate::domain::plan::{PlanCatalog, PlanTierId};

    struct Fixture {
        raw: InMemoryKeyValueStore,
        workflow: PlanRequestWorkflow,
        entitlements: Arc<EntitlementResolver>,
        quota: Arc<QuestionQuota>,
    }

    fn fixture() -> Fixture {
        let raw = InMemoryKeyValueStore::new();
        let store = TypedStore::new(Arc::new(raw.clone()));
        let entitlements = Arc::new(EntitlementResolver::new(
            store.clone(),
            Arc::new(PlanCatalog::default()),
            vec![],
        ));
        let quota = Arc::new(QuestionQuota::new(store.clone(), entitlements.clone()));
        let workflow = PlanRequestWorkflow::new(
            store,
            entitlements.clone(),
            quota.clone(),
            Some("https://pay.example.com/checkout/".into()),
        );
        Fixture {
            raw,
            workflow,
            entitlements,
            quota,
        }
    }

    async fn complete(workflow: &PlanRequestWorkflow, request: CreatePlanRequest) -> PlanRequest {
        let r = workflow.create(request).await.unwrap();
        workflow.confirm_payment(&r.id).await.unwrap();
        if r.plan_type == RequestedPlan::Individual {
            workflow
                .update_status(&r.id, PlanRequestStatus::EmCriacao)
                .await
                .unwrap();
        }
        workflow
            .update_status(&r.id, PlanRequestStatus::Concluido)
            .await
            .unwrap()
    }

    fn user(name: &str) -> UserId {
        UserId::new(format!("{}@example.com", name)).unwrap()
    }

    fn input(who: &str, plan: RequestedPlan) -> CreatePlanRequest {
        CreatePlanRequest {
            user_id: user(who),
            user_email: Some(format!("{}@example.com", who)),
            user_name: Some(who.into()),
            plan_type: plan,
            concurso_desejado: Some("PF 2025".into()),
        }
    }

    #[tokio::test]
    async fn create_prices_from_catalog_and_builds_link() {
        let f = fixture();
        let r = f.workflow.create(input("ana", RequestedPlan::Plus)).await.unwrap();
        assert_eq!(r.status, PlanRequestStatus::AguardandoPagamento);
        assert_eq!(r.amount_cents, 4990);
        assert_eq!(
            r.payment_link.as_deref(),
            Some(format!("https://pay.example.com/checkout?ref={}", r.id).as_str())
        );
    }

    #[tokio::test]
    async fn individual_requires_concurso() {
        let f = fixture();
        let mut req = input("ana", RequestedPlan::Individual);
        req.concurso_desejado = Some("   ".into());
        let err = f.workflow.create(req).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn individual_completion_applies_plan_and_grant() {
        let f = fixture();
        let ana = user("ana");
        for _ in 0..3 {
            f.quota.increment(&ana).await.unwrap();
        }
        let r = f
            .workflow
            .create(input("ana", RequestedPlan::Individual))
            .await
            .unwrap();

        f.workflow.confirm_payment(&r.id).await.unwrap();
        f.workflow
            .update_status(&r.id, PlanRequestStatus::EmCriacao)
            .await
            .unwrap();
        f.workflow
            .update_progress(
                &r.id,
                CreationProgress {
                    stage: "cronograma".into(),
                    percentage: Percentage::new(80),
                    message: "Quase pronto".into(),
                },
            )
            .await
            .unwrap();
        let done = f
            .workflow
            .update_status(&r.id, PlanRequestStatus::Concluido)
            .await
            .unwrap();

        assert!(done.completed_at.is_some());
        assert_eq!(f.entitlements.resolve_plan(&ana).await, PlanTierId::Individual);
        assert!(f.entitlements.can_access_concurso(&ana, "PF 2025").await);
        assert!(!f.entitlements.can_access_concurso(&ana, "INSS").await);
        assert_eq!(f.quota.status(&ana).await.answered, 0);
    }

    #[tokio::test]
    async fn concluded_request_is_locked() {
        let f = fixture();
        let r = f.workflow.create(input("ana", RequestedPlan::Plus)).await.unwrap();
        f.workflow.confirm_payment(&r.id).await.unwrap();
        let done = f
            .workflow
            .update_status(&r.id, PlanRequestStatus::Concluido)
            .await
            .unwrap();

        let err = f
            .workflow
            .update_status(&r.id, PlanRequestStatus::Cancelado)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::WorkflowTerminal);
        let reloaded = f.workflow.get(&r.id).await.unwrap();
        assert_eq!(reloaded.completed_at, done.completed_at);
        assert_eq!(reloaded.status, PlanRequestStatus::Concluido);
    }

    #[tokio::test]
    async fn lists_are_filtered_by_user() {
        let f = fixture();
        f.workflow.create(input("ana", RequestedPlan::Plus)).await.unwrap();
        f.workflow.create(input("bia", RequestedPlan::Plus)).await.unwrap();
        f.workflow.create(input("ana", RequestedPlan::Individual)).await.unwrap();

        assert_eq!(f.workflow.list_for_user(&user("ana")).await.len(), 2);
        assert_eq!(f.workflow.list_for_user(&user("bia")).await.len(), 1);
        assert_eq!(f.workflow.list(None).await.len(), 3);
        assert_eq!(
            f.workflow
                .list(Some(PlanRequestStatus::Concluido))
                .await
                .len(),
            0
        );
    }

    #[tokio::test]
    async fn unknown_request_is_not_found() {
        let f = fixture();
        let err = f
            .workflow
            .confirm_payment(&PlanRequestId::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PlanRequestNotFound);
    }

    #[tokio::test]
    async fn only_owner_can_cancel() {
        let f = fixture();
        let r = f.workflow.create(input("ana", RequestedPlan::Plus)).await.unwrap();
        let err = f.workflow.cancel_own(&user("bia"), &r.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        let cancelled = f.workflow.cancel_own(&user("ana"), &r.id).await.unwrap();
        assert_eq!(cancelled.status, PlanRequestStatus::Cancelado);
    }

    #[tokio::test]
    async fn payment_events_drive_transitions() {
        let f = fixture();
        let paid = f.workflow.create(input("ana", RequestedPlan::Plus)).await.unwrap();
        let expired = f.workflow.create(input("bia", RequestedPlan::Plus)).await.unwrap();

        let r = f
            .workflow
            .handle_payment_event(&PaymentEvent::Confirmed { request_id: paid.id })
            .await
            .unwrap();
        assert!(r.paid_at.is_some());

        let r = f
            .workflow
            .handle_payment_event(&PaymentEvent::Expired { request_id: expired.id })
            .await
            .unwrap();
        assert_eq!(r.status, PlanRequestStatus::PagamentoAbandonado);
    }

    #[tokio::test]
    async fn sweep_abandons_only_fresh_stale_requests() {
        let f = fixture();
        f.workflow.create(input("ana", RequestedPlan::Plus)).await.unwrap();
        assert!(f.workflow.abandon_stale(48).await.unwrap().is_empty());
        let swept = f.workflow.abandon_stale(0).await.unwrap();
        assert_eq!(swept.len(), 1);
        assert!(f.workflow.abandon_stale(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_individual_purchase_replaces_the_concurso() {
        let f = fixture();
        let ana = user("ana");
        complete(&f.workflow, input("ana", RequestedPlan::Individual)).await;

        let mut second = input("ana", RequestedPlan::Individual);
        second.concurso_desejado = Some("INSS".into());
        let done = complete(&f.workflow, second).await;

        assert_eq!(done.status, PlanRequestStatus::Concluido);
        assert_eq!(
            f.workflow.get(&done.id).await.unwrap().status,
            PlanRequestStatus::Concluido
        );
        assert!(f.entitlements.can_access_concurso(&ana, "INSS").await);
        assert!(!f.entitlements.can_access_concurso(&ana, "PF 2025").await);
    }

    #[tokio::test]
    async fn failed_plan_application_leaves_request_retryable() {
        let f = fixture();
        let ana = user("ana");
        let r = f.workflow.create(input("ana", RequestedPlan::Plus)).await.unwrap();
        f.workflow.confirm_payment(&r.id).await.unwrap();

        let entitlement_key = StoreKey::entitlement(&ana);
        f.raw.set_read_only(&entitlement_key, true);
        let err = f
            .workflow
            .update_status(&r.id, PlanRequestStatus::Concluido)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageUnavailable);
        f.raw.set_read_only(&entitlement_key, false);

        let stored = f.workflow.get(&r.id).await.unwrap();
        assert_eq!(stored.status, PlanRequestStatus::PagamentoConfirmado);
        assert!(stored.completed_at.is_none());
        assert_eq!(f.entitlements.resolve_plan(&ana).await, PlanTierId::Free);

        let done = f
            .workflow
            .update_status(&r.id, PlanRequestStatus::Concluido)
            .await
            .unwrap();
        assert_eq!(done.status, PlanRequestStatus::Concluido);
        assert_eq!(f.entitlements.resolve_plan(&ana).await, PlanTierId::Plus);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_creates_are_all_stored() {
        let f = fixture();
        let workflow = Arc::new(f.workflow);
        let tasks: Vec<_> = (0..20)
            .map(|n| {
                let workflow = workflow.clone();
                tokio::spawn(async move {
                    workflow
                        .create(input(&format!("u{}", n), RequestedPlan::Plus))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(workflow.list(None).await.len(), 20);
        assert_eq!(workflow.list_for_user(&user("u7")).await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_transitions_and_creates_do_not_lose_writes() {
        let f = fixture();
        let workflow = Arc::new(f.workflow);
        let mut existing = Vec::new();
        for n in 0..8 {
            existing.push(
                workflow
                    .create(input(&format!("a{}", n), RequestedPlan::Plus))
                    .await
                    .unwrap(),
            );
        }

        let mut tasks = Vec::new();
        for (n, request) in existing.iter().enumerate() {
            let confirm = workflow.clone();
            let id = request.id;
            tasks.push(tokio::spawn(async move {
                confirm.confirm_payment(&id).await.map(|_| ())
            }));
            let create = workflow.clone();
            tasks.push(tokio::spawn(async move {
                create
                    .create(input(&format!("b{}", n), RequestedPlan::Plus))
                    .await
                    .map(|_| ())
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(workflow.list(None).await.len(), 16);
        assert_eq!(
            workflow
                .list(Some(PlanRequestStatus::PagamentoConfirmado))
                .await
                .len(),
            8
        );
    }
}
