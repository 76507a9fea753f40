//! Request and response bodies for the plan-request endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, Percentage, PlanRequestId};
use crate::domain::plan_request::{CreationProgress, PlanRequestStatus, RequestedPlan};

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanRequestBody {
    pub plan_type: RequestedPlan,
    #[serde(default)]
    pub concurso_desejado: Option<String>,
    /// Display name; defaults to the identity header.
    #[serde(default)]
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPlanRequestsQuery {
    pub status: Option<PlanRequestStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusBody {
    pub status: PlanRequestStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProgressBody {
    pub stage: String,
    pub percentage: u8,
    #[serde(default)]
    pub message: String,
}

impl UpdateProgressBody {
    pub fn into_progress(self) -> Result<CreationProgress, DomainError> {
        Ok(CreationProgress {
            stage: self.stage,
            percentage: Percentage::try_new(self.percentage)?,
            message: self.message,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SweepBody {
    /// Overrides the configured abandonment window.
    #[serde(default)]
    pub older_than_hours: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    pub abandoned: Vec<PlanRequestId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub request_id: PlanRequestId,
    pub status: PlanRequestStatus,
}

/// Parses a path id, answering 404 for anything that is not a request id.
pub fn parse_request_id(raw: &str) -> Result<PlanRequestId, DomainError> {
    raw.parse().map_err(|_| {
        DomainError::new(
            ErrorCode::PlanRequestNotFound,
            format!("Plan request {} not found", raw),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_parses_plan_type() {
        let body: CreatePlanRequestBody =
            serde_json::from_str(r#"{"plan_type":"individual","concurso_desejado":"PF"}"#)
                .unwrap();
        assert_eq!(body.plan_type, RequestedPlan::Individual);

        let plus: CreatePlanRequestBody = serde_json::from_str(r#"{"plan_type":"plus"}"#).unwrap();
        assert!(plus.concurso_desejado.is_none());
    }

    #[test]
    fn status_body_uses_snake_case() {
        let body: UpdateStatusBody =
            serde_json::from_str(r#"{"status":"pagamento_confirmado"}"#).unwrap();
        assert_eq!(body.status, PlanRequestStatus::PagamentoConfirmado);
    }

    #[test]
    fn progress_over_100_is_rejected() {
        let body = UpdateProgressBody {
            stage: "questoes".into(),
            percentage: 140,
            message: String::new(),
        };
        assert_eq!(body.into_progress().unwrap_err().code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn malformed_id_reads_as_not_found() {
        let err = parse_request_id("not-a-uuid").unwrap_err();
        assert_eq!(err.code, ErrorCode::PlanRequestNotFound);
    }
}
