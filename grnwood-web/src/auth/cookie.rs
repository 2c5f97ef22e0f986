//! Refresh token cookie

use axum_extra::extract::cookie::{Cookie, CookieJar};
use grnwood_core::AuthConfig;

/// Name of the cookie carrying the refresh token
pub const REFRESH_COOKIE_NAME: &str = "grnwood-network-refresh";

/// Writes and reads the HTTP-only refresh token cookie
#[derive(Debug, Clone, Default)]
pub struct CredentialCookieStore {
    domain: Option<String>,
    secure: bool,
}

impl CredentialCookieStore {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            domain: config.cookie_domain.clone(),
            secure: config.cookie_secure,
        }
    }

    pub fn set_refresh_cookie(&self, jar: CookieJar, token: String) -> CookieJar {
        let mut cookie = Cookie::build((REFRESH_COOKIE_NAME, token))
            .http_only(true)
            .path("/")
            .secure(self.secure);
        if let Some(domain) = &self.domain {
            cookie = cookie.domain(domain.clone());
        }
        jar.add(cookie)
    }

    /// The refresh token, or `None` when the cookie is missing or empty
    pub fn read_refresh_cookie(&self, jar: &CookieJar) -> Option<String> {
        jar.get(REFRESH_COOKIE_NAME)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_attributes() {
        let store = CredentialCookieStore::new(&AuthConfig {
            cookie_domain: Some("grnwood.network".to_string()),
            cookie_secure: true,
            ..AuthConfig::default()
        });

        let jar = store.set_refresh_cookie(CookieJar::new(), "token-1".to_string());
        let cookie = jar.get(REFRESH_COOKIE_NAME).unwrap();

        assert_eq!(cookie.value(), "token-1");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("grnwood.network"));
    }

    #[test]
    fn test_host_only_by_default() {
        let store = CredentialCookieStore::new(&AuthConfig::default());
        let jar = store.set_refresh_cookie(CookieJar::new(), "token-1".to_string());
        let cookie = jar.get(REFRESH_COOKIE_NAME).unwrap();

        assert_eq!(cookie.domain(), None);
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(store.read_refresh_cookie(&jar).as_deref(), Some("token-1"));
    }

    #[test]
    fn test_empty_cookie_is_absent() {
        let store = CredentialCookieStore::default();
        assert!(store.read_refresh_cookie(&CookieJar::new()).is_none());

        let jar = CookieJar::new().add(Cookie::new(REFRESH_COOKIE_NAME, ""));
        assert!(store.read_refresh_cookie(&jar).is_none());
    }
}
