//! HTTP handlers for the plan-request endpoints.

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use super::dto::{
    parse_request_id, CreatePlanRequestBody, ListPlanRequestsQuery, SweepBody, SweepResponse,
    UpdateProgressBody, UpdateStatusBody, WebhookAck,
};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::extract::{AdminUser, AuthenticatedUser};
use crate::adapters::http::AppState;
use crate::application::CreatePlanRequest;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::plan_request::WebhookError;

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// POST /api/plan-requests
pub async fn create_plan_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreatePlanRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let request = state
        .services
        .plan_requests
        .create(CreatePlanRequest {
            user_id: user.user_id,
            user_email: user.email,
            user_name: body.user_name.or(user.username),
            plan_type: body.plan_type,
            concurso_desejado: body.concurso_desejado,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/plan-requests
pub async fn list_own_plan_requests(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let requests = state
        .services
        .plan_requests
        .list_for_user(&user.user_id)
        .await;
    Ok(Json(requests))
}

/// GET /api/plan-requests/:id
///
/// Other users' requests read as not found.
pub async fn get_own_plan_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_request_id(&id)?;
    let request = state.services.plan_requests.get(&id).await?;
    if request.user_id != user.user_id {
        return Err(DomainError::new(
            ErrorCode::PlanRequestNotFound,
            format!("Plan request {} not found", id),
        )
        .into());
    }
    Ok(Json(request))
}

/// POST /api/plan-requests/:id/cancel
pub async fn cancel_own_plan_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_request_id(&id)?;
    let request = state
        .services
        .plan_requests
        .cancel_own(&user.user_id, &id)
        .await?;
    Ok(Json(request))
}

// ─── Admin ────────────────────────────────────────────────────────────────────

/// GET /api/admin/plan-requests
pub async fn admin_list_plan_requests(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ListPlanRequestsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.plan_requests.list(query.status).await))
}

/// POST /api/admin/plan-requests/:id/status
pub async fn admin_update_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_request_id(&id)?;
    let request = state
        .services
        .plan_requests
        .update_status(&id, body.status)
        .await?;
    tracing::info!(admin = %admin.user_id, request_id = %id, status = %body.status, "admin moved plan request");
    Ok(Json(request))
}

/// POST /api/admin/plan-requests/:id/progress
pub async fn admin_update_progress(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateProgressBody>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_request_id(&id)?;
    let request = state
        .services
        .plan_requests
        .update_progress(&id, body.into_progress()?)
        .await?;
    Ok(Json(request))
}

/// POST /api/admin/plan-requests/sweep
pub async fn admin_sweep(
    State(state): State<AppState>,
    _admin: AdminUser,
    body: Option<Json<SweepBody>>,
) -> Result<impl IntoResponse, ApiError> {
    let hours = body
        .and_then(|Json(b)| b.older_than_hours)
        .unwrap_or(state.abandon_after_hours);
    let abandoned = state
        .services
        .plan_requests
        .abandon_stale(i64::from(hours))
        .await?;
    Ok(Json(SweepResponse { abandoned }))
}

// ─── Webhook ──────────────────────────────────────────────────────────────────

/// POST /api/webhooks/payment
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let verifier = state
        .webhook_verifier
        .as_ref()
        .ok_or(WebhookError::NotConfigured)?;
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| WebhookError::ParseError(format!("Missing {} header", SIGNATURE_HEADER)))?;

    let event = verifier.verify_and_parse(&body, signature)?;
    tracing::info!(request_id = %event.request_id(), "payment webhook verified");

    let request = state
        .services
        .plan_requests
        .handle_payment_event(&event)
        .await?;
    Ok(Json(WebhookAck {
        received: true,
        request_id: request.id,
        status: request.status,
    }))
}
