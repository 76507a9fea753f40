//! Axum routes for the plan-request endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    admin_list_plan_requests, admin_sweep, admin_update_progress, admin_update_status,
    cancel_own_plan_request, create_plan_request, get_own_plan_request, handle_payment_webhook,
    list_own_plan_requests,
};
use crate::adapters::http::AppState;

/// Caller-scoped routes, mounted at `/api/plan-requests`.
pub fn plan_request_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_plan_request).get(list_own_plan_requests))
        .route("/:id", get(get_own_plan_request))
        .route("/:id/cancel", post(cancel_own_plan_request))
}

/// Mounted at `/api/admin/plan-requests`.
pub fn plan_request_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_list_plan_requests))
        .route("/sweep", post(admin_sweep))
        .route("/:id/status", post(admin_update_status))
        .route("/:id/progress", post(admin_update_progress))
}

/// Mounted at `/api/webhooks`.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/payment", post(handle_payment_webhook))
}
