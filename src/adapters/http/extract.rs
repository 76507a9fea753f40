//! Request identity.
//!
//! Authentication happens upstream. The gateway forwards the identity
//! provider's claims as headers and the core derives the canonical user id
//! from them:
//!
//! - `X-User-Email` / `X-Email-Verified`: a verified email wins
//! - `X-Username`: fallback when no verified email is present

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use super::error::ApiError;
use super::AppState;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};

pub const EMAIL_HEADER: &str = "X-User-Email";
pub const EMAIL_VERIFIED_HEADER: &str = "X-Email-Verified";
pub const USERNAME_HEADER: &str = "X-Username";

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: Option<String>,
    pub username: Option<String>,
}

impl AuthenticatedUser {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let email = header(EMAIL_HEADER);
        let username = header(USERNAME_HEADER);
        let verified = header(EMAIL_VERIFIED_HEADER)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let user_id = UserId::canonical(email.as_deref(), verified, username.as_deref())
            .map_err(|_| ApiError::AuthenticationRequired)?;
        Ok(Self {
            user_id,
            email,
            username,
        })
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}

/// A caller on the admin allow-list.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_headers(&parts.headers)?;
        if !state.services.entitlements.is_admin(&user.user_id) {
            tracing::warn!(user = %user.user_id, path = %parts.uri.path(), "admin route refused");
            return Err(DomainError::new(ErrorCode::Forbidden, "Admin access required").into());
        }
        Ok(Self(user))
    }
}
