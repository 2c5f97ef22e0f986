//! Shared test application for HTTP-level tests

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use grnwood_core::{auth_error, GatewayConfig, GrnwoodResult, IdentityField};
use grnwood_graph::{GraphQuery, RequestContext, Statement};
use grnwood_web::{
    auth::{FederatedProfile, IdentityProvider},
    create_app, AppState,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const GOOGLE_TOKEN: &str = "google-token-ada";
const REFRESH_COOKIE: &str = "grnwood-network-refresh";

/// Google stand-in accepting a single access token
pub struct FakeGoogle;

#[async_trait]
impl IdentityProvider for FakeGoogle {
    fn identity_field(&self) -> IdentityField {
        IdentityField::GoogleId
    }

    async fn fetch_profile(&self, access_token: &str) -> GrnwoodResult<FederatedProfile> {
        if access_token != GOOGLE_TOKEN {
            return Err(auth_error!("Invalid Google token", "test"));
        }
        Ok(FederatedProfile {
            id: "google-ada".to_string(),
            display_name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            image: String::new(),
        })
    }
}

pub struct TestApp {
    // Keeps the database files alive for the duration of the test
    pub dir: TempDir,
    pub state: AppState,
    pub router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// Value of the refresh cookie set by this response
    pub fn refresh_cookie(&self) -> Option<String> {
        self.set_cookie_header()
            .and_then(|cookie| cookie.split(';').next())
            .and_then(|pair| pair.strip_prefix(&format!("{}=", REFRESH_COOKIE)))
            .map(str::to_string)
    }

    pub fn set_cookie_header(&self) -> Option<&str> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with(REFRESH_COOKIE))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();

    let mut config = GatewayConfig::default();
    config.graph.uri = format!("sqlite://{}", dir.path().join("grnwood.db").display());
    config.graph.databases.insert(
        "archive".to_string(),
        format!("sqlite://{}", dir.path().join("archive.db").display()),
    );
    config.server.allowed_origins = vec![ALLOWED_ORIGIN.to_string()];

    let state = AppState::new(config)
        .await
        .unwrap()
        .with_identity_provider(Arc::new(FakeGoogle));
    let router = create_app(state.clone());

    TestApp { dir, state, router }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.send(json_request(Method::POST, uri, body)).await
    }

    /// POST a JSON body with a bearer access token
    pub async fn post_json_as(&self, uri: &str, access_token: &str, body: Value) -> TestResponse {
        let mut request = json_request(Method::POST, uri, body);
        request.headers_mut().insert(
            header::AUTHORIZATION,
            format!("Bearer {}", access_token).parse().unwrap(),
        );
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Sign in with a Google identity value
    pub async fn authenticate(&self, google_id: &str) -> TestResponse {
        self.post_json(
            "/api/auth/authenticate",
            json!({
                "identityField": "googleId",
                "id": google_id,
                "displayName": "Ada",
                "email": "ada@example.com"
            }),
        )
        .await
    }

    pub async fn refresh_with_cookie(&self, token: Option<&str>) -> TestResponse {
        let mut request = Request::post("/api/auth/refresh_token");
        if let Some(token) = token {
            request = request.header(header::COOKIE, format!("{}={}", REFRESH_COOKIE, token));
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn count_nodes(&self, label: &str) -> i64 {
        let query = GraphQuery::read(
            Statement::new("SELECT COUNT(*) FROM nodes WHERE label = ?1").bind(label),
        );
        self.state
            .executor
            .execute(&RequestContext::default(), &query)
            .await
            .unwrap()
            .decode()
            .unwrap()
    }
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
