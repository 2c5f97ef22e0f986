//! Authentication handlers

use super::{
    service::{AuthPayload, AuthenticateRequest, RefreshPayload},
    AuthenticatedUser,
};
use crate::{context::GraphContext, error::ApiError, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    Json as JsonExtractor,
};
use axum_extra::extract::cookie::CookieJar;
use grnwood_core::User;
use serde::Deserialize;
use tracing::info;

/// Sign in with a federated identity field and value
pub async fn authenticate(
    State(app_state): State<AppState>,
    GraphContext(ctx): GraphContext,
    jar: CookieJar,
    body: Result<JsonExtractor<AuthenticateRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthPayload>), ApiError> {
    let JsonExtractor(request) = body?;
    info!("Authentication attempt with {}", request.identity_field);

    let (jar, payload) = app_state.auth.authenticate(&ctx, jar, request).await?;
    Ok((jar, Json(payload)))
}

/// Google sign-in request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSignInRequest {
    pub access_token: String,
}

/// Sign in with a Google OAuth access token
pub async fn authenticate_google(
    State(app_state): State<AppState>,
    GraphContext(ctx): GraphContext,
    jar: CookieJar,
    body: Result<JsonExtractor<GoogleSignInRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthPayload>), ApiError> {
    let JsonExtractor(request) = body?;
    let provider = &app_state.identity_provider;
    let profile = provider.fetch_profile(&request.access_token).await?;
    info!("Google profile resolved for sign-in");

    let request = AuthenticateRequest {
        identity_field: provider.identity_field().to_string(),
        id: profile.id,
        display_name: profile.display_name,
        email: profile.email,
    };
    let (jar, payload) = app_state.auth.authenticate(&ctx, jar, request).await?;
    Ok((jar, Json(payload)))
}

/// Renew the access token from the refresh cookie; never an error response
pub async fn refresh_token(
    State(app_state): State<AppState>,
    GraphContext(ctx): GraphContext,
    jar: CookieJar,
) -> (CookieJar, Json<RefreshPayload>) {
    let (jar, payload) = app_state.auth.refresh_token(&ctx, jar).await;
    (jar, Json(payload))
}

/// Get current user information
pub async fn get_current_user(
    State(app_state): State<AppState>,
    GraphContext(ctx): GraphContext,
    user: AuthenticatedUser,
) -> Result<Json<User>, ApiError> {
    let user = app_state.auth.current_user(&ctx, &user.user_id).await?;
    Ok(Json(user))
}
