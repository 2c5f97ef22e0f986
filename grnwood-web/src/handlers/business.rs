//! Business handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    response::Json,
    Json as JsonExtractor,
};
use grnwood_core::{auth_error, Business, NewBusiness};
use tracing::{info, warn};

use super::bookmark_headers;
use crate::{auth::AuthenticatedUser, context::GraphContext, error::ApiError, AppState};

/// Create a business managed by the signed-in user
pub async fn create_business(
    State(app_state): State<AppState>,
    GraphContext(ctx): GraphContext,
    user: AuthenticatedUser,
    body: Result<JsonExtractor<NewBusiness>, JsonRejection>,
) -> Result<(HeaderMap, Json<Business>), ApiError> {
    let JsonExtractor(input) = body?;

    if input.user_id != user.user_id {
        warn!(
            caller = %user.user_id,
            requested = %input.user_id,
            "Business creation for another user refused"
        );
        return Err(auth_error!("userId does not match the signed-in user", "business").into());
    }
    info!("Business creation requested by {}", input.user_id);

    let created = app_state.businesses.create_business(&ctx, input).await?;
    Ok((
        bookmark_headers(created.bookmark.as_ref()),
        Json(created.value),
    ))
}

/// Get a business, assigning its slug on first read
pub async fn get_business(
    State(app_state): State<AppState>,
    GraphContext(ctx): GraphContext,
    Path(business_id): Path<String>,
) -> Result<(HeaderMap, Json<Business>), ApiError> {
    let business = app_state.businesses.get_business(&ctx, &business_id).await?;
    Ok((
        bookmark_headers(business.bookmark.as_ref()),
        Json(business.value),
    ))
}
