//! Configuration management
//!
//! Configuration is assembled in three layers: defaults, an optional TOML
//! file, then environment variables. The binary applies command line
//! overrides on top.

use crate::error::{ErrorContext, GrnwoodError, GrnwoodResult};
use crate::logging::{LogFormat, LoggingConfig};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const DEV_ACCESS_SECRET: &str = "grnwood-dev-access-secret-change-me";
const DEV_REFRESH_SECRET: &str = "grnwood-dev-refresh-secret-change-me";

/// Complete gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub graph: GraphConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to make credentialed cross-origin requests
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4001,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Graph datastore settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Connection URI of the default logical database
    pub uri: String,
    /// Name of the default logical database
    pub database: String,
    /// Additional logical databases, name to connection URI
    pub databases: BTreeMap<String, String>,
    pub max_connections: u32,
    /// Refuse to start when constraint assertion fails
    pub strict_schema: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "sqlite://grnwood.db".to_string(),
            database: "grnwood".to_string(),
            databases: BTreeMap::new(),
            max_connections: 8,
            strict_schema: true,
        }
    }
}

/// Token signing and credential cookie settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    /// `Domain` attribute of the refresh cookie; host-only when unset
    pub cookie_domain: Option<String>,
    /// `Secure` attribute of the refresh cookie
    pub cookie_secure: bool,
    /// Google userinfo endpoint used by the Google identity provider
    pub google_userinfo_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: DEV_ACCESS_SECRET.to_string(),
            refresh_token_secret: DEV_REFRESH_SECRET.to_string(),
            cookie_domain: None,
            cookie_secure: false,
            google_userinfo_url: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
        }
    }
}

impl AuthConfig {
    /// Whether either signing secret is still the built-in development value
    pub fn uses_dev_secrets(&self) -> bool {
        self.access_token_secret == DEV_ACCESS_SECRET
            || self.refresh_token_secret == DEV_REFRESH_SECRET
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> GrnwoodResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GrnwoodError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: GatewayConfig = toml::from_str(&content).map_err(|e| GrnwoodError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> GrnwoodResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| GrnwoodError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| GrnwoodError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Defaults overlaid with environment variables
    pub fn from_env() -> GrnwoodResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay environment variables onto this configuration
    pub fn apply_env(&mut self) -> GrnwoodResult<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars<F>(&mut self, var: F) -> GrnwoodResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("SERVER_PORT") {
            self.server.port = parse_var("SERVER_PORT", &port)?;
        }
        if let Some(origins) = var("ALLOWED_ORIGINS") {
            self.server.allowed_origins = split_list(&origins);
        }

        if let Some(uri) = var("GRAPH_DATABASE_URL") {
            self.graph.uri = uri;
        }
        if let Some(database) = var("GRAPH_DATABASE") {
            self.graph.database = database;
        }
        if let Some(databases) = var("GRAPH_DATABASES") {
            for entry in split_list(&databases) {
                let (name, uri) = entry.split_once('=').ok_or_else(|| {
                    crate::config_error!(
                        format!("GRAPH_DATABASES entry '{}' is not name=uri", entry),
                        "config"
                    )
                })?;
                self.graph
                    .databases
                    .insert(name.trim().to_string(), uri.trim().to_string());
            }
        }
        if let Some(max) = var("GRAPH_MAX_CONNECTIONS") {
            self.graph.max_connections = parse_var("GRAPH_MAX_CONNECTIONS", &max)?;
        }
        if let Some(strict) = var("GRAPH_STRICT_SCHEMA") {
            self.graph.strict_schema = parse_var("GRAPH_STRICT_SCHEMA", &strict)?;
        }

        if let Some(secret) = var("ACCESS_TOKEN_SECRET") {
            self.auth.access_token_secret = secret;
        }
        if let Some(secret) = var("REFRESH_TOKEN_SECRET") {
            self.auth.refresh_token_secret = secret;
        }
        if let Some(domain) = var("COOKIE_DOMAIN").or_else(|| var("DOMAIN")) {
            self.auth.cookie_domain = Some(domain).filter(|d| !d.is_empty());
        }
        if let Some(secure) = var("COOKIE_SECURE") {
            self.auth.cookie_secure = parse_var("COOKIE_SECURE", &secure)?;
        }

        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.logging.format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "compact" => LogFormat::Compact,
                "pretty" => LogFormat::Pretty,
                other => {
                    return Err(crate::config_error!(
                        format!("Unknown LOG_FORMAT '{}'", other),
                        "config"
                    ))
                }
            };
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> GrnwoodResult<()> {
        if self.auth.access_token_secret.is_empty() || self.auth.refresh_token_secret.is_empty() {
            return Err(GrnwoodError::Config {
                message: "Token signing secrets must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET"),
            });
        }

        if self.auth.access_token_secret == self.auth.refresh_token_secret {
            return Err(GrnwoodError::Config {
                message: "Access and refresh tokens must be signed with different secrets"
                    .to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use distinct values for the two token secrets"),
            });
        }

        if self.auth.cookie_secure && self.auth.uses_dev_secrets() {
            return Err(GrnwoodError::Config {
                message: "Secure cookies are enabled but the token secrets are the built-in development values".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET"),
            });
        }

        if self.graph.database.is_empty() {
            return Err(GrnwoodError::Config {
                message: "Default graph database name must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set graph.database or GRAPH_DATABASE"),
            });
        }

        if self.graph.max_connections == 0 {
            return Err(GrnwoodError::Config {
                message: "graph.max_connections must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        Ok(())
    }

    /// Listener address
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> GrnwoodResult<T> {
    value.trim().parse().map_err(|_| {
        crate::config_error!(format!("Invalid value '{}' for {}", value, key), "config")
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overlay() {
        let mut config = GatewayConfig::default();
        config
            .apply_vars(vars(&[
                ("SERVER_PORT", "8080"),
                ("ALLOWED_ORIGINS", "https://a.io, https://b.io"),
                ("GRAPH_DATABASES", "analytics=sqlite://analytics.db"),
                ("DOMAIN", "grnwood.network"),
                ("COOKIE_SECURE", "true"),
                ("LOG_FORMAT", "json"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.allowed_origins, vec!["https://a.io", "https://b.io"]);
        assert_eq!(
            config.graph.databases.get("analytics").map(String::as_str),
            Some("sqlite://analytics.db")
        );
        assert_eq!(config.auth.cookie_domain.as_deref(), Some("grnwood.network"));
        assert!(config.auth.cookie_secure);
        assert!(matches!(config.logging.format, LogFormat::Json));
    }

    #[test]
    fn test_cookie_domain_prefers_specific_variable() {
        let mut config = GatewayConfig::default();
        config
            .apply_vars(vars(&[("COOKIE_DOMAIN", "api.grnwood.network"), ("DOMAIN", "other")]))
            .unwrap();
        assert_eq!(config.auth.cookie_domain.as_deref(), Some("api.grnwood.network"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = GatewayConfig::default();
        assert!(config.apply_vars(vars(&[("SERVER_PORT", "http")])).is_err());
        assert!(config
            .apply_vars(vars(&[("GRAPH_DATABASES", "missing-separator")]))
            .is_err());
    }

    #[test]
    fn test_validate_rejects_shared_secret() {
        let mut config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.auth.uses_dev_secrets());

        config.auth.refresh_token_secret = config.auth.access_token_secret.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dev_secrets_with_secure_cookie() {
        let mut config = GatewayConfig::default();
        config.auth.cookie_secure = true;
        assert!(matches!(config.validate(), Err(GrnwoodError::Config { .. })));

        config.auth.access_token_secret = "prod-access".to_string();
        config.auth.refresh_token_secret = "prod-refresh".to_string();
        assert!(config.validate().is_ok());
        assert!(!config.auth.uses_dev_secrets());
    }
}
