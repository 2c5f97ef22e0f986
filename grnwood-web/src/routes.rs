//! Route definitions for the grnwood web server

use crate::{auth, handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .nest("/auth", auth_routes())
        // Businesses
        .route("/businesses", post(handlers::create_business))
        .route("/businesses/{business_id}", get(handlers::get_business))
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/authenticate", post(auth::handlers::authenticate))
        .route("/google", post(auth::handlers::authenticate_google))
        .route("/refresh_token", post(auth::handlers::refresh_token))
        .route("/me", get(auth::handlers::get_current_user))
}
