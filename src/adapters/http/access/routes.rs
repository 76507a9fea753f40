//! Axum routes for the access endpoints.

use axum::routing::{delete, get, post, put};
use axum::Router;

use super::handlers::{
    admin_get_entitlement, admin_grant_concurso, admin_grant_package, admin_revoke_concurso,
    admin_revoke_package, admin_set_plan, admin_set_subject_total, check_concurso, check_package,
    get_plan, get_quota,
};
use crate::adapters::http::AppState;

/// Caller-scoped routes, mounted at `/api`.
pub fn access_routes() -> Router<AppState> {
    Router::new()
        .route("/access/plan", get(get_plan))
        .route("/access/concursos/:name", get(check_concurso))
        .route("/access/packages/:id", get(check_package))
        .route("/quota", get(get_quota))
}

/// Entitlement administration, mounted at `/api/admin`.
pub fn access_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users/:user/entitlement", get(admin_get_entitlement))
        .route("/users/:user/plan", put(admin_set_plan))
        .route("/users/:user/concursos", post(admin_grant_concurso))
        .route("/users/:user/concursos/:name", delete(admin_revoke_concurso))
        .route("/users/:user/packages", post(admin_grant_package))
        .route("/users/:user/packages/:id", delete(admin_revoke_package))
        .route(
            "/users/:user/progress/:package_id/subjects/:subject",
            put(admin_set_subject_total),
        )
}
