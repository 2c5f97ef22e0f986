//! Federated identity providers

use async_trait::async_trait;
use grnwood_core::{ErrorContext, GrnwoodError, GrnwoodResult, IdentityField};
use serde::Deserialize;
use tracing::{debug, warn};

/// Profile returned by an identity provider for a provider access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedProfile {
    /// Provider's stable identifier for the account
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// Profile picture URL, empty when the provider has none
    pub image: String,
}

/// Resolves a provider-issued access token to the caller's profile
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// User property the provider's identifier is stored under
    fn identity_field(&self) -> IdentityField;

    async fn fetch_profile(&self, access_token: &str) -> GrnwoodResult<FederatedProfile>;
}

/// Google userinfo response
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

/// Google OAuth profile lookup through the userinfo endpoint
pub struct GoogleIdentityProvider {
    client: reqwest::Client,
    userinfo_url: String,
}

impl GoogleIdentityProvider {
    pub fn new(userinfo_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            userinfo_url: userinfo_url.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn identity_field(&self) -> IdentityField {
        IdentityField::GoogleId
    }

    async fn fetch_profile(&self, access_token: &str) -> GrnwoodResult<FederatedProfile> {
        debug!("Fetching Google profile from {}", self.userinfo_url);

        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| GrnwoodError::Connectivity {
                message: format!("Failed to reach Google userinfo endpoint: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("google_identity_provider")
                    .with_operation("fetch_profile"),
            })?;

        let status = response.status();
        if status.is_client_error() {
            warn!(status = %status, "Google rejected the access token");
            return Err(GrnwoodError::Authentication {
                message: format!("Google rejected the access token ({})", status),
                context: ErrorContext::new("google_identity_provider")
                    .with_operation("fetch_profile"),
            });
        }
        if !status.is_success() {
            return Err(GrnwoodError::Connectivity {
                message: format!("Google userinfo endpoint returned {}", status),
                source: None,
                context: ErrorContext::new("google_identity_provider")
                    .with_operation("fetch_profile"),
            });
        }

        let info: GoogleUserInfo = response.json().await.map_err(|e| GrnwoodError::Internal {
            message: format!("Unexpected Google userinfo response: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("google_identity_provider").with_operation("parse_profile"),
        })?;

        Ok(extract_profile(info))
    }
}

fn extract_profile(info: GoogleUserInfo) -> FederatedProfile {
    FederatedProfile {
        id: info.sub,
        display_name: info.name,
        email: info.email.filter(|e| !e.is_empty()),
        image: info.picture.unwrap_or_default(),
    }
}
