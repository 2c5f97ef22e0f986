//! Access and refresh token signing

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use grnwood_core::{AuthConfig, ErrorContext, GrnwoodError};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

/// Access tokens expire after 15 minutes
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;
/// Refresh tokens expire after 7 days
pub const REFRESH_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// JWT signing and verification keys
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Claims carried by both token kinds
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl Claims {
    fn new(user_id: &str, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
        }
    }
}

/// JWT authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token creation failed")]
    TokenCreation,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing authorization header")]
    MissingAuthHeader,
    #[error("Missing refresh cookie")]
    MissingRefreshCookie,
}

impl AuthError {
    fn code(&self) -> &'static str {
        match self {
            AuthError::TokenCreation => "token_creation_failed",
            AuthError::InvalidToken => "invalid_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::MissingRefreshCookie => "missing_refresh_cookie",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::TokenCreation => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        };

        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<AuthError> for GrnwoodError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenCreation => GrnwoodError::Internal {
                message: err.to_string(),
                source: None,
                context: ErrorContext::new("auth").with_operation("issue_token"),
            },
            other => GrnwoodError::Authentication {
                message: other.to_string(),
                context: ErrorContext::new("auth").with_operation("verify_token"),
            },
        }
    }
}

/// Issues and verifies HS256 tokens.
///
/// Access and refresh tokens are signed with different secrets, so a token
/// of one kind never verifies as the other.
pub struct JwtService {
    access: Keys,
    refresh: Keys,
    validation: Validation,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            access: Keys::new(config.access_token_secret.as_bytes()),
            refresh: Keys::new(config.refresh_token_secret.as_bytes()),
            validation,
        }
    }

    pub fn issue_access_token(&self, user_id: &str) -> Result<String, AuthError> {
        sign(&Claims::new(user_id, ACCESS_TOKEN_TTL_SECONDS), &self.access)
    }

    pub fn issue_refresh_token(&self, user_id: &str) -> Result<String, AuthError> {
        sign(&Claims::new(user_id, REFRESH_TOKEN_TTL_SECONDS), &self.refresh)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, &self.access)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, &self.refresh)
    }

    fn verify(&self, token: &str, keys: &Keys) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &keys.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token verification failed: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })
    }
}

fn sign(claims: &Claims, keys: &Keys) -> Result<String, AuthError> {
    encode(&Header::new(Algorithm::HS256), claims, &keys.encoding).map_err(|e| {
        warn!("Failed to encode token: {}", e);
        AuthError::TokenCreation
    })
}
