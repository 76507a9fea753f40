//! HTTP handlers for the quiz endpoints.

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::dto::{
    AnswerResponse, AnswerStateResponse, FavoriteRequest, FavoritesResponse, RecommendationQuery,
    SubmitAnswerRequest, TechniqueResponse,
};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::extract::AuthenticatedUser;
use crate::adapters::http::AppState;
use crate::application::RecommendationRequest;
use crate::domain::foundation::{DomainError, ErrorCode, PackageId, QuestionId};
use crate::domain::quiz::AnswerState;

/// POST /api/quiz/answers
///
/// Re-submitting an answered question returns the stored answer unchanged.
pub async fn submit_answer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let question_id = QuestionId::new(request.question_id)?;
    let mut session = state.services.quiz.session(user.user_id);

    if let Some(outcome) = session
        .answer(&question_id, request.selected_answer, request.time_spent_seconds)
        .await?
    {
        return Ok((StatusCode::CREATED, Json(AnswerResponse::from(outcome))));
    }

    match (session.question(), session.state()) {
        (Some(question), Some(AnswerState::Revealed { record })) => Ok((
            StatusCode::OK,
            Json(AnswerResponse::previous(question, record)),
        )),
        _ => Err(DomainError::new(
            ErrorCode::InternalError,
            "Answer was neither recorded nor found",
        )
        .into()),
    }
}

/// GET /api/quiz/answers/:question_id
pub async fn get_answer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(question_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let question_id = QuestionId::new(question_id)?;
    let mut session = state.services.quiz.session(user.user_id);
    session.navigate(&question_id).await?;

    match (session.question(), session.state()) {
        (Some(question), Some(answer_state)) => {
            Ok(Json(AnswerStateResponse::new(question, answer_state)))
        }
        _ => Err(DomainError::new(ErrorCode::InternalError, "Question did not open").into()),
    }
}

/// GET /api/progress/:package_id
pub async fn get_package_progress(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(package_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let package = PackageId::new(package_id)?;
    let view = state
        .services
        .quiz
        .package_progress(&user.user_id, &package)
        .await?;
    Ok(Json(view))
}

/// POST /api/progress/:package_id/reset
pub async fn reset_package_progress(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(package_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let package = PackageId::new(package_id)?;
    state
        .services
        .progress
        .reset_package(&user.user_id, &package)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/errors/summary
pub async fn get_error_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.services.classifier.summary(&user.user_id).await))
}

/// GET /api/techniques
pub async fn list_techniques(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.services.recommender.catalog().all().to_vec())
}

/// GET /api/techniques/recommendation
pub async fn get_recommendation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<RecommendationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let request = RecommendationRequest {
        subject_name: query.subject.filter(|s| !s.trim().is_empty()),
        was_correct: query.was_correct,
        is_first_attempt_in_subject: query.first_attempt,
    };
    let technique = state
        .services
        .recommender
        .recommend(&user.user_id, &request)
        .await?;
    Ok(Json(TechniqueResponse::from(technique)))
}

/// GET /api/techniques/favorites
pub async fn get_favorites(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let favorites = state.services.recommender.favorites(&user.user_id).await;
    Ok(Json(FavoritesResponse { favorites }))
}

/// POST /api/techniques/:id/favorite
pub async fn set_favorite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(request): Json<FavoriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let favorites = state
        .services
        .recommender
        .set_favorite(&user.user_id, &id, request.favorite)
        .await?;
    Ok(Json(FavoritesResponse { favorites }))
}
