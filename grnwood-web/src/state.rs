//! Application state shared by every handler

use std::sync::Arc;

use grnwood_core::GatewayConfig;
use grnwood_graph::{
    BusinessRepository, GraphDriver, QueryExecutor, SessionManager, UserRepository,
};
use tracing::info;

use crate::auth::{
    AuthService, CredentialCookieStore, GoogleIdentityProvider, IdentityProvider, JwtService,
};
use crate::business::BusinessService;
use crate::WebResult;

#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<GatewayConfig>,
    pub driver: Arc<GraphDriver>,
    pub executor: QueryExecutor,
    pub auth: AuthService,
    pub businesses: BusinessService,
    /// Provider used by Google sign-in
    pub identity_provider: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Validate the configuration and connect to the graph
    pub async fn new(config: GatewayConfig) -> WebResult<Self> {
        config.validate()?;
        let driver = GraphDriver::connect(&config.graph).await?;
        info!(
            databases = ?driver.databases().collect::<Vec<_>>(),
            "Application state initialized"
        );
        Ok(Self::with_driver(config, Arc::new(driver)))
    }

    pub fn with_driver(config: GatewayConfig, driver: Arc<GraphDriver>) -> Self {
        let executor = QueryExecutor::new(SessionManager::new(Arc::clone(&driver)));

        let auth = AuthService::new(
            UserRepository::new(executor.clone()),
            JwtService::new(&config.auth),
            CredentialCookieStore::new(&config.auth),
        );
        let businesses = BusinessService::new(BusinessRepository::new(executor.clone()));
        let identity_provider: Arc<dyn IdentityProvider> = Arc::new(GoogleIdentityProvider::new(
            config.auth.google_userinfo_url.clone(),
        ));

        Self {
            config: Arc::new(config),
            driver,
            executor,
            auth,
            businesses,
            identity_provider,
        }
    }

    /// Replace the Google sign-in provider
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity_provider = provider;
        self
    }
}
