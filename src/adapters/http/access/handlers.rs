//! HTTP handlers for the access endpoints.

use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;

use super::dto::{
    AccessCheckResponse, EntitlementResponse, GrantConcursoRequest, GrantPackageRequest,
    PlanChangeResponse, QuotaResponse, SetPlanRequest, SubjectTotalRequest,
};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::extract::{AdminUser, AuthenticatedUser};
use crate::adapters::http::AppState;
use crate::domain::entitlement::UserEntitlement;
use crate::domain::foundation::{PackageId, UserId};

fn entitlement_response(state: &AppState, entitlement: &UserEntitlement) -> EntitlementResponse {
    let resolver = &state.services.entitlements;
    EntitlementResponse::new(
        entitlement,
        resolver.catalog().tier(entitlement.plan),
        resolver.is_admin(&entitlement.user_id),
    )
}

/// GET /api/access/plan
pub async fn get_plan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let entitlement = state.services.entitlements.entitlement(&user.user_id).await;
    Ok(Json(entitlement_response(&state, &entitlement)))
}

/// GET /api/access/concursos/:name
pub async fn check_concurso(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let has_access = state
        .services
        .entitlements
        .can_access_concurso(&user.user_id, &name)
        .await;
    Ok(Json(AccessCheckResponse {
        resource: name,
        has_access,
    }))
}

/// GET /api/access/packages/:id
pub async fn check_package(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let has_access = state
        .services
        .entitlements
        .can_access_package(&user.user_id, &id)
        .await;
    Ok(Json(AccessCheckResponse {
        resource: id,
        has_access,
    }))
}

/// GET /api/quota
pub async fn get_quota(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let status = state.services.quota.status(&user.user_id).await;
    Ok(Json(QuotaResponse::from(status)))
}

// ─── Admin ────────────────────────────────────────────────────────────────────

/// GET /api/admin/users/:user/entitlement
pub async fn admin_get_entitlement(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = UserId::new(user)?;
    let entitlement = state.services.entitlements.entitlement(&user).await;
    Ok(Json(entitlement_response(&state, &entitlement)))
}

/// PUT /api/admin/users/:user/plan
pub async fn admin_set_plan(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user): Path<String>,
    Json(request): Json<SetPlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = UserId::new(user)?;
    let previous = state.services.quota.change_plan(&user, request.plan).await?;
    tracing::info!(admin = %admin.user_id, user = %user, plan = %request.plan, "admin set plan");
    Ok(Json(PlanChangeResponse {
        user_id: user.to_string(),
        previous_plan: previous,
        plan: request.plan,
        quota_reset: previous.is_upgrade_to(request.plan),
    }))
}

/// POST /api/admin/users/:user/concursos
pub async fn admin_grant_concurso(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user): Path<String>,
    Json(request): Json<GrantConcursoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = UserId::new(user)?;
    let entitlement = state
        .services
        .entitlements
        .grant_concurso(&user, &request.concurso, request.expires_at)
        .await?;
    tracing::info!(admin = %admin.user_id, user = %user, concurso = %request.concurso, "admin granted concurso");
    Ok(Json(entitlement_response(&state, &entitlement)))
}

/// DELETE /api/admin/users/:user/concursos/:name
pub async fn admin_revoke_concurso(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((user, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let user = UserId::new(user)?;
    let entitlement = state
        .services
        .entitlements
        .revoke_concurso(&user, &name)
        .await?;
    Ok(Json(entitlement_response(&state, &entitlement)))
}

/// POST /api/admin/users/:user/packages
pub async fn admin_grant_package(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user): Path<String>,
    Json(request): Json<GrantPackageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = UserId::new(user)?;
    let package = PackageId::new(request.package_id)?;
    let resolver = &state.services.entitlements;
    let entitlement = match request.expires_at {
        Some(expires_at) => {
            resolver
                .grant_package(&user, package.as_str(), Some(expires_at))
                .await?
        }
        None => resolver.assign_package(&user, package.as_str()).await?,
    };
    Ok(Json(entitlement_response(&state, &entitlement)))
}

/// DELETE /api/admin/users/:user/packages/:id
pub async fn admin_revoke_package(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((user, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let user = UserId::new(user)?;
    let entitlement = state.services.entitlements.revoke_package(&user, &id).await?;
    Ok(Json(entitlement_response(&state, &entitlement)))
}

/// PUT /api/admin/users/:user/progress/:package_id/subjects/:subject
pub async fn admin_set_subject_total(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path((user, package, subject)): Path<(String, String, String)>,
    Json(request): Json<SubjectTotalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = UserId::new(user)?;
    let package = PackageId::new(package)?;
    let progress = state
        .services
        .progress
        .set_subject_total(&user, &package, &subject, request.total)
        .await?;
    Ok(Json(progress))
}
