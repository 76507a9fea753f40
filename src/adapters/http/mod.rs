//! HTTP adapter - REST API over the core services.
//!
//! Each area has its own `dto` / `handlers` / `routes` module. This file
//! holds the shared state and assembles the full router.

pub mod access;
pub mod error;
pub mod extract;
pub mod plan_requests;
pub mod quiz;

use std::sync::Arc;
use std::time::Duration;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use http::{header, HeaderName, HeaderValue, Method};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorResponse};
pub use extract::{AdminUser, AuthenticatedUser};

use crate::application::CoreServices;
use crate::domain::plan_request::PaymentWebhookVerifier;

/// Shared state cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub services: CoreServices,
    /// `None` disables the payment webhook.
    pub webhook_verifier: Option<Arc<PaymentWebhookVerifier>>,
    pub abandon_after_hours: u32,
}

impl AppState {
    pub fn new(
        services: CoreServices,
        webhook_secret: Option<String>,
        abandon_after_hours: u32,
    ) -> Self {
        Self {
            services,
            webhook_verifier: webhook_secret
                .filter(|s| !s.is_empty())
                .map(|s| Arc::new(PaymentWebhookVerifier::new(s))),
            abandon_after_hours,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Every route, without middleware.
pub fn api_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(access::access_routes())
        .merge(quiz::quiz_routes())
        .nest("/plan-requests", plan_requests::plan_request_routes())
        .nest(
            "/admin",
            access::access_admin_routes()
                .nest("/plan-requests", plan_requests::plan_request_admin_routes()),
        )
        .nest("/webhooks", plan_requests::webhook_routes());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
}

/// HTTP middleware settings.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub request_timeout: Duration,
    /// Empty allows any origin.
    pub cors_origins: Vec<String>,
}

/// The router wrapped in tracing, CORS and timeout layers.
pub fn app_router(state: AppState, settings: &HttpSettings) -> Router {
    api_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(settings.request_timeout))
            .layer(cors_layer(&settings.cors_origins)),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-user-email"),
            HeaderName::from_static("x-email-verified"),
            HeaderName::from_static("x-username"),
            HeaderName::from_static("x-webhook-signature"),
        ])
}
