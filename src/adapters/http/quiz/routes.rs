//! Axum routes for the quiz endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    get_answer, get_error_summary, get_favorites, get_package_progress, get_recommendation,
    list_techniques, reset_package_progress, set_favorite, submit_answer,
};
use crate::adapters::http::AppState;

/// Mounted at `/api`.
pub fn quiz_routes() -> Router<AppState> {
    Router::new()
        .route("/quiz/answers", post(submit_answer))
        .route("/quiz/answers/:question_id", get(get_answer))
        .route("/progress/:package_id", get(get_package_progress))
        .route("/progress/:package_id/reset", post(reset_package_progress))
        .route("/errors/summary", get(get_error_summary))
        .route("/techniques", get(list_techniques))
        .route("/techniques/recommendation", get(get_recommendation))
        .route("/techniques/favorites", get(get_favorites))
        .route("/techniques/:id/favorite", post(set_favorite))
}
