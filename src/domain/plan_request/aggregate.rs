//! Plan request aggregate.
//!
//! A user's request to buy a paid plan. Status only moves through explicit
//! transition calls; terminal requests refuse every further transition.

use serde::{Deserialize, Serialize};

use super::PlanRequestStatus;
use crate::domain::foundation::{
    DomainError, ErrorCode, Percentage, PlanRequestId, StateMachine, Timestamp, UserId,
};
use crate::domain::plan::PlanTierId;

/// Paid plans that can be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedPlan {
    Individual,
    Plus,
}

impl RequestedPlan {
    pub fn tier(&self) -> PlanTierId {
        match self {
            RequestedPlan::Individual => PlanTierId::Individual,
            RequestedPlan::Plus => PlanTierId::Plus,
        }
    }
}

impl TryFrom<PlanTierId> for RequestedPlan {
    type Error = DomainError;

    fn try_from(tier: PlanTierId) -> Result<Self, Self::Error> {
        match tier {
            PlanTierId::Individual => Ok(RequestedPlan::Individual),
            PlanTierId::Plus => Ok(RequestedPlan::Plus),
            other => Err(DomainError::validation(
                "plan_type",
                format!("Plan '{}' cannot be requested", other),
            )),
        }
    }
}

/// Latest progress report while an individual plan is being built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationProgress {
    pub stage: String,
    pub percentage: Percentage,
    pub message: String,
}

/// Everything needed to open a request.
#[derive(Debug, Clone)]
pub struct NewPlanRequest {
    pub user_id: UserId,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub plan_type: RequestedPlan,
    pub concurso_desejado: Option<String>,
    pub payment_link: Option<String>,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub id: PlanRequestId,
    pub user_id: UserId,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub plan_type: RequestedPlan,
    pub status: PlanRequestStatus,
    pub concurso_desejado: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub paid_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub progress: Option<CreationProgress>,
    pub payment_link: Option<String>,
    pub amount_cents: i64,
}

impl PlanRequest {
    /// Opens a request awaiting payment.
    pub fn create(id: PlanRequestId, new: NewPlanRequest) -> Result<Self, DomainError> {
        if new.amount_cents < 0 {
            return Err(DomainError::validation(
                "amount_cents",
                "Amount cannot be negative",
            ));
        }
        let concurso_desejado = new
            .concurso_desejado
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let now = Timestamp::now();
        Ok(Self {
            id,
            user_id: new.user_id,
            user_email: new.user_email,
            user_name: new.user_name,
            plan_type: new.plan_type,
            status: PlanRequestStatus::AguardandoPagamento,
            concurso_desejado,
            created_at: now,
            updated_at: now,
            paid_at: None,
            completed_at: None,
            progress: None,
            payment_link: new.payment_link,
            amount_cents: new.amount_cents,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Moves to `target`, stamping the matching timestamps.
    ///
    /// # Errors
    ///
    /// - `WorkflowTerminal` if the request already ended
    /// - `InvalidStateTransition` for edges not allowed for this plan type
    pub fn transition(&mut self, target: PlanRequestStatus) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::new(
                ErrorCode::WorkflowTerminal,
                format!(
                    "Plan request {} is {} and accepts no further transitions",
                    self.id, self.status
                ),
            )
            .with_detail("status", self.status.as_str()));
        }

        let plan_forbids = match (self.plan_type, self.status, target) {
            (RequestedPlan::Plus, _, PlanRequestStatus::EmCriacao) => true,
            (
                RequestedPlan::Individual,
                PlanRequestStatus::PagamentoConfirmado,
                PlanRequestStatus::Concluido,
            ) => true,
            _ => false,
        };
        if plan_forbids || !self.status.can_transition_to(&target) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot move {:?} plan request from {} to {}",
                    self.plan_type, self.status, target
                ),
            ));
        }

        let now = Timestamp::now();
        self.status = target;
        self.updated_at = now;
        match target {
            PlanRequestStatus::PagamentoConfirmado => self.paid_at = Some(now),
            PlanRequestStatus::Concluido => self.completed_at = Some(now),
            _ => {}
        }
        Ok(())
    }

    pub fn confirm_payment(&mut self) -> Result<(), DomainError> {
        self.transition(PlanRequestStatus::PagamentoConfirmado)
    }

    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.transition(PlanRequestStatus::Cancelado)
    }

    pub fn abandon(&mut self) -> Result<(), DomainError> {
        self.transition(PlanRequestStatus::PagamentoAbandonado)
    }

    /// Overwrites the creation progress. Only valid while `em_criacao`.
    pub fn update_progress(&mut self, progress: CreationProgress) -> Result<(), DomainError> {
        if self.status != PlanRequestStatus::EmCriacao {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Progress can only be reported while em_criacao, request is {}",
                    self.status
                ),
            ));
        }
        if progress.stage.trim().is_empty() {
            return Err(DomainError::validation("stage", "Stage cannot be empty"));
        }
        self.progress = Some(progress);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// True when still unpaid after `max_age_hours`.
    pub fn is_abandoned_at(&self, now: &Timestamp, max_age_hours: i64) -> bool {
        self.status == PlanRequestStatus::AguardandoPagamento
            && self.created_at.is_before(&now.minus_hours(max_age_hours))
    }
}
