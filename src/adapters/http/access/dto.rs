//! Request and response bodies for the access endpoints.

use serde::{Deserialize, Serialize};

use crate::application::QuotaStatus;
use crate::domain::entitlement::UserEntitlement;
use crate::domain::foundation::Timestamp;
use crate::domain::plan::{PlanTier, PlanTierId};

#[derive(Debug, Clone, Serialize)]
pub struct EntitlementResponse {
    pub user_id: String,
    pub plan: PlanTierId,
    pub plan_name: &'static str,
    /// `null` = unlimited.
    pub question_limit: Option<u32>,
    pub max_concursos: Option<u32>,
    pub active_concursos: Vec<String>,
    pub packages: Vec<String>,
    pub is_admin: bool,
}

impl EntitlementResponse {
    pub fn new(entitlement: &UserEntitlement, tier: &PlanTier, is_admin: bool) -> Self {
        Self {
            user_id: entitlement.user_id.to_string(),
            plan: entitlement.plan,
            plan_name: entitlement.plan.display_name(),
            question_limit: tier.question_limit,
            max_concursos: tier.max_concursos,
            active_concursos: entitlement.active_concursos().to_vec(),
            packages: entitlement.assigned_packages().to_vec(),
            is_admin,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessCheckResponse {
    pub resource: String,
    pub has_access: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotaResponse {
    pub plan: PlanTierId,
    pub limit: Option<u32>,
    pub used: u32,
    pub remaining: Option<u32>,
    pub has_reached_limit: bool,
}

impl From<QuotaStatus> for QuotaResponse {
    fn from(status: QuotaStatus) -> Self {
        Self {
            plan: status.plan,
            limit: status.limit,
            used: status.answered,
            remaining: status.remaining,
            has_reached_limit: status.limit_reached,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetPlanRequest {
    pub plan: PlanTierId,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanChangeResponse {
    pub user_id: String,
    pub previous_plan: PlanTierId,
    pub plan: PlanTierId,
    /// True when the change was an upgrade and the quota counter restarted.
    pub quota_reset: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrantConcursoRequest {
    pub concurso: String,
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrantPackageRequest {
    pub package_id: String,
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectTotalRequest {
    pub total: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::domain::plan::PlanCatalog;

    #[test]
    fn free_entitlement_response_shows_limit() {
        let user = UserId::new("ana@example.com").unwrap();
        let entitlement = UserEntitlement::new(user, PlanTierId::Free);
        let catalog = PlanCatalog::default();
        let response = EntitlementResponse::new(&entitlement, catalog.tier(PlanTierId::Free), false);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["plan"], "free");
        assert_eq!(json["question_limit"], 10);
        assert!(json["max_concursos"].is_null());
    }

    #[test]
    fn quota_response_renames_fields() {
        let response = QuotaResponse::from(QuotaStatus {
            plan: PlanTierId::Free,
            answered: 4,
            limit: Some(10),
            remaining: Some(6),
            limit_reached: false,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["used"], 4);
        assert_eq!(json["has_reached_limit"], false);
    }

    #[test]
    fn grant_request_expiry_is_optional() {
        let req: GrantConcursoRequest = serde_json::from_str(r#"{"concurso":"INSS"}"#).unwrap();
        assert!(req.expires_at.is_none());

        let req: GrantConcursoRequest = serde_json::from_str(
            r#"{"concurso":"INSS","expires_at":"2030-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(req.expires_at.is_some());
    }
}
