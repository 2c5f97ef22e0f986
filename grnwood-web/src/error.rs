//! Mapping of gateway errors onto HTTP responses

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use grnwood_core::{validation_error, GrnwoodError};
use serde_json::json;

use crate::auth::jwt::AuthError;

/// Error returned by every fallible handler.
///
/// The body is `{error, message, errorId, recoverable}`, where `errorId`
/// matches the `error_id` field of the log line recorded for the failure.
#[derive(Debug)]
pub struct ApiError(pub GrnwoodError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GrnwoodError::NotFound { .. } => StatusCode::NOT_FOUND,
            GrnwoodError::ConstraintViolation { .. } => StatusCode::CONFLICT,
            GrnwoodError::Validation { .. } => StatusCode::BAD_REQUEST,
            GrnwoodError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            GrnwoodError::Consistency { .. } => StatusCode::PRECONDITION_FAILED,
            GrnwoodError::Connectivity { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GrnwoodError> for ApiError {
    fn from(err: GrnwoodError) -> Self {
        Self(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err.into())
    }
}

/// Bodies that are not valid JSON for the target type are invalid input
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(validation_error!(rejection.body_text(), "body", "request"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.0.log();

        let status = self.status();
        // Internal details stay in the log
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };
        let error_id = self.0.context().map(|c| c.error_id.clone());

        let body = Json(json!({
            "error": self.0.code(),
            "message": message,
            "errorId": error_id,
            "recoverable": self.0.is_recoverable(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grnwood_core::{auth_error, not_found_error, validation_error, ErrorContext};

    #[test]
    fn test_status_per_kind() {
        let cases = [
            (not_found_error!("User u-1", "test"), StatusCode::NOT_FOUND),
            (
                validation_error!("name is required", "name", "test"),
                StatusCode::BAD_REQUEST,
            ),
            (auth_error!("expired", "test"), StatusCode::UNAUTHORIZED),
            (
                GrnwoodError::ConstraintViolation {
                    message: "duplicate".to_string(),
                    constraint: None,
                    context: ErrorContext::new("test"),
                },
                StatusCode::CONFLICT,
            ),
            (
                GrnwoodError::Consistency {
                    message: "bookmark ahead".to_string(),
                    context: ErrorContext::new("test"),
                },
                StatusCode::PRECONDITION_FAILED,
            ),
            (
                GrnwoodError::Connectivity {
                    message: "pool closed".to_string(),
                    source: None,
                    context: ErrorContext::new("test"),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                GrnwoodError::Storage {
                    message: "disk I/O".to_string(),
                    source: None,
                    context: ErrorContext::new("test"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError(error).status(), expected);
        }
    }

    #[tokio::test]
    async fn test_body_carries_error_id() {
        let error = not_found_error!("Business b-1", "test");
        let error_id = error.context().unwrap().error_id.clone();

        let response = ApiError(error).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["errorId"], error_id);
        assert_eq!(body["recoverable"], false);
        assert!(body["message"].as_str().unwrap().contains("Business b-1"));
    }

    #[tokio::test]
    async fn test_unavailable_store_is_marked_recoverable() {
        let error = GrnwoodError::Connectivity {
            message: "pool timed out".to_string(),
            source: None,
            context: ErrorContext::new("test"),
        };

        let response = ApiError(error).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["recoverable"], true);
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let error = GrnwoodError::Storage {
            message: "no such table: nodes".to_string(),
            source: None,
            context: ErrorContext::new("test"),
        };

        let response = ApiError(error).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "storage_error");
        assert_eq!(body["message"], "Internal server error");
    }
}
