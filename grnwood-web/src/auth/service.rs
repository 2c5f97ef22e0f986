//! Federated sign-in and refresh token renewal

use std::sync::Arc;

use axum_extra::extract::cookie::CookieJar;
use grnwood_core::{
    auth_error, FederatedIdentity, GrnwoodError, GrnwoodResult, IdentityField, User,
};
use grnwood_graph::{NewUser, OptionalExt, RequestContext, UserRepository};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cookie::CredentialCookieStore;
use super::jwt::{AuthError, JwtService};

/// Input of `authenticate`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest {
    pub identity_field: String,
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub access_token: String,
    pub user: User,
}

/// Result of a refresh attempt; `ok` is false and the token empty on failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPayload {
    pub access_token: String,
    pub ok: bool,
}

impl RefreshPayload {
    fn rejected() -> Self {
        Self {
            access_token: String::new(),
            ok: false,
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    tokens: Arc<JwtService>,
    cookies: CredentialCookieStore,
}

impl AuthService {
    pub fn new(users: UserRepository, tokens: JwtService, cookies: CredentialCookieStore) -> Self {
        Self {
            users,
            tokens: Arc::new(tokens),
            cookies,
        }
    }

    pub fn tokens(&self) -> &JwtService {
        &self.tokens
    }

    /// Sign a caller in with a federated identity.
    ///
    /// The user is created on first sign-in. Tokens are issued and the
    /// refresh token is written to the returned cookie jar.
    pub async fn authenticate(
        &self,
        ctx: &RequestContext,
        jar: CookieJar,
        request: AuthenticateRequest,
    ) -> GrnwoodResult<(CookieJar, AuthPayload)> {
        let field: IdentityField = request.identity_field.parse()?;
        let identity = FederatedIdentity::new(field, request.id)?;

        let user = self
            .find_or_create_user(
                ctx,
                NewUser {
                    identity,
                    display_name: request.display_name,
                    email: request.email,
                },
            )
            .await?;

        let access_token = self.tokens.issue_access_token(&user.user_id)?;
        let refresh_token = self.tokens.issue_refresh_token(&user.user_id)?;
        let jar = self.cookies.set_refresh_cookie(jar, refresh_token);

        info!(user_id = %user.user_id, "User authenticated");
        Ok((jar, AuthPayload { access_token, user }))
    }

    /// Look the identity up, creating the user when it is unknown
    pub async fn find_or_create_user(
        &self,
        ctx: &RequestContext,
        new_user: NewUser,
    ) -> GrnwoodResult<User> {
        match self
            .users
            .find_by_identity(ctx, &new_user.identity)
            .await
            .optional()?
        {
            Some(user) => {
                debug!(user_id = %user.user_id, "Existing user found");
                Ok(user)
            }
            None => self.create_or_resolve(ctx, new_user).await,
        }
    }

    /// Create the user; if a concurrent sign-in created it first, return
    /// that user instead.
    pub async fn create_or_resolve(
        &self,
        ctx: &RequestContext,
        new_user: NewUser,
    ) -> GrnwoodResult<User> {
        let identity = new_user.identity.clone();
        match self.users.create(ctx, new_user).await {
            Ok(created) => Ok(created.value),
            Err(e) if e.is_constraint_violation() => {
                debug!(
                    field = %identity.field,
                    "User created concurrently, resolving existing record"
                );
                self.users.find_by_identity(ctx, &identity).await
            }
            Err(e) => Err(e),
        }
    }

    /// Renew the access token from the refresh cookie.
    ///
    /// Never fails: any problem yields `{accessToken: "", ok: false}` and the
    /// jar is returned unchanged.
    pub async fn refresh_token(
        &self,
        ctx: &RequestContext,
        jar: CookieJar,
    ) -> (CookieJar, RefreshPayload) {
        match self.try_refresh(ctx, &jar).await {
            Ok((access_token, refresh_token)) => {
                let jar = self.cookies.set_refresh_cookie(jar, refresh_token);
                (
                    jar,
                    RefreshPayload {
                        access_token,
                        ok: true,
                    },
                )
            }
            Err(e) => {
                match &e {
                    GrnwoodError::Authentication { .. } | GrnwoodError::NotFound { .. } => {
                        debug!(error = %e, "Refresh rejected")
                    }
                    _ => warn!(error = %e, "Refresh failed"),
                }
                (jar, RefreshPayload::rejected())
            }
        }
    }

    async fn try_refresh(
        &self,
        ctx: &RequestContext,
        jar: &CookieJar,
    ) -> GrnwoodResult<(String, String)> {
        let token = self
            .cookies
            .read_refresh_cookie(jar)
            .ok_or(AuthError::MissingRefreshCookie)?;
        let claims = self.tokens.verify_refresh_token(&token)?;

        let user = self.users.find_by_id(ctx, &claims.user_id).await?;

        let access_token = self.tokens.issue_access_token(&user.user_id)?;
        let refresh_token = self.tokens.issue_refresh_token(&user.user_id)?;
        debug!(user_id = %user.user_id, "Refresh token accepted");
        Ok((access_token, refresh_token))
    }

    /// The user behind a verified access token
    pub async fn current_user(&self, ctx: &RequestContext, user_id: &str) -> GrnwoodResult<User> {
        self.users.find_by_id(ctx, user_id).await.map_err(|e| {
            if e.is_not_found() {
                auth_error!("Token user no longer exists", "auth")
            } else {
                e
            }
        })
    }
}
