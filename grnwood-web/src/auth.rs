//! Authentication: federated identity, access tokens and refresh cookies

pub mod cookie;
pub mod google;
pub mod handlers;
pub mod jwt;
pub mod service;

pub use cookie::CredentialCookieStore;
pub use google::{FederatedProfile, GoogleIdentityProvider, IdentityProvider};
pub use jwt::{AuthError, Claims, JwtService};
pub use service::{AuthPayload, AuthService, AuthenticateRequest, RefreshPayload};

use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

/// A caller holding a valid access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        let claims = app_state.auth.tokens().verify_access_token(token)?;
        debug!(user_id = %claims.user_id, "Bearer token accepted");

        Ok(AuthenticatedUser {
            user_id: claims.user_id,
        })
    }
}
