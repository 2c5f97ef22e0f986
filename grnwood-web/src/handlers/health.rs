//! Health check handlers

use axum::{extract::State, http::StatusCode, response::Json};
use grnwood_graph::{GraphQuery, RequestContext, Statement};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    /// Default database
    pub database: String,
    /// Every logical database the gateway serves
    pub databases: Vec<String>,
}

/// Health check endpoint; 503 when the default database cannot be queried
pub async fn health_check(State(app_state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let probe = GraphQuery::read(Statement::new("SELECT 1"));
    let (status, label) = match app_state
        .executor
        .execute(&RequestContext::default(), &probe)
        .await
    {
        Ok(_) => (StatusCode::OK, "healthy"),
        Err(e) => {
            e.log();
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            timestamp: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: app_state.config.graph.database.clone(),
            databases: app_state.driver.databases().map(str::to_string).collect(),
        }),
    )
}
