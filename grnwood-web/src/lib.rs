//! Grnwood Web Server
//!
//! HTTP surface of the grnwood network gateway: federated sign-in, refresh
//! cookies and business records over the property graph.

pub mod auth;
pub mod business;
pub mod context;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use error::ApiError;
pub use server::GrnwoodServer;
pub use state::AppState;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    Router,
};
use grnwood_core::GrnwoodError;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true)
        .allow_headers([
            AUTHORIZATION,
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static(context::DATABASE_HEADER),
            HeaderName::from_static(context::BOOKMARKS_HEADER),
        ])
        .expose_headers([HeaderName::from_static(context::BOOKMARK_HEADER)]);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error(transparent)]
    Gateway(#[from] GrnwoodError),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;
