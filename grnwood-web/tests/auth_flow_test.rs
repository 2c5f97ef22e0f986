//! Sign-in, refresh and current-user flows over HTTP

mod helpers;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use grnwood_core::{FederatedIdentity, IdentityField};
use grnwood_graph::{NewUser, RequestContext, UserRepository};
use helpers::{spawn_app, GOOGLE_TOKEN};
use serde_json::json;

#[tokio::test]
async fn test_authenticate_creates_user_and_sets_cookie() {
    let app = spawn_app().await;

    let response = app.authenticate("g-ada").await;
    assert_eq!(response.status, StatusCode::OK);

    let access_token = response.body["accessToken"].as_str().unwrap();
    assert!(!access_token.is_empty());
    let user_id = response.body["user"]["userId"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(user_id).is_ok());
    assert_eq!(response.body["user"]["displayName"], "Ada");
    assert_eq!(response.body["user"]["contact"]["email"], json!(["ada@example.com"]));

    let cookie = response.set_cookie_header().unwrap();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(!cookie.contains("Secure"));

    let claims = app.state.auth.tokens().verify_access_token(access_token).unwrap();
    assert_eq!(claims.user_id, user_id);
}

#[tokio::test]
async fn test_authenticate_is_idempotent() {
    let app = spawn_app().await;

    let first = app.authenticate("g-ada").await;
    let second = app.authenticate("g-ada").await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(first.body["user"]["userId"], second.body["user"]["userId"]);
    assert_eq!(app.count_nodes("User").await, 1);
    assert_eq!(app.count_nodes("Contact").await, 1);
}

#[tokio::test]
async fn test_concurrent_first_sign_in_yields_one_user() {
    let app = spawn_app().await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let router = app.router.clone();
        handles.push(tokio::spawn(async move {
            use tower::ServiceExt;
            let request = helpers::json_request(
                axum::http::Method::POST,
                "/api/auth/authenticate",
                json!({ "identityField": "googleId", "id": "g-race" }),
            );
            let response = router.oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            (status, body["user"]["userId"].as_str().unwrap_or_default().to_string())
        }));
    }

    let mut user_ids = Vec::new();
    for handle in handles {
        let (status, user_id) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        user_ids.push(user_id);
    }
    user_ids.dedup();
    assert_eq!(user_ids.len(), 1);
    assert_eq!(app.count_nodes("User").await, 1);
}

#[tokio::test]
async fn test_create_conflict_resolves_existing_user() {
    let app = spawn_app().await;
    let ctx = RequestContext::default();
    let new_user = || NewUser {
        identity: FederatedIdentity::new(IdentityField::GoogleId, "g-race").unwrap(),
        display_name: None,
        email: None,
    };

    let existing = UserRepository::new(app.state.executor.clone())
        .create(&ctx, new_user())
        .await
        .unwrap()
        .value;
    let resolved = app
        .state
        .auth
        .create_or_resolve(&ctx, new_user())
        .await
        .unwrap();

    assert_eq!(resolved, existing);
    assert_eq!(app.count_nodes("User").await, 1);
}

#[tokio::test]
async fn test_authenticate_rejects_bad_input() {
    let app = spawn_app().await;

    let unknown_field = app
        .post_json(
            "/api/auth/authenticate",
            json!({ "identityField": "userId", "id": "u-1" }),
        )
        .await;
    assert_eq!(unknown_field.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_field.body["error"], "validation_error");

    let empty_id = app
        .post_json(
            "/api/auth/authenticate",
            json!({ "identityField": "googleId", "id": "" }),
        )
        .await;
    assert_eq!(empty_id.status, StatusCode::BAD_REQUEST);
    assert!(empty_id.set_cookie_header().is_none());
    assert_eq!(app.count_nodes("User").await, 0);
}

#[tokio::test]
async fn test_authenticate_missing_fields_are_validation_errors() {
    let app = spawn_app().await;

    let missing_id = app
        .post_json(
            "/api/auth/authenticate",
            json!({ "identityField": "googleId" }),
        )
        .await;
    assert_eq!(missing_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing_id.body["error"], "validation_error");
    assert!(missing_id.body["errorId"].is_string());
    assert!(missing_id.body["message"].as_str().unwrap().contains("id"));

    let not_json = app
        .send(
            Request::post("/api/auth/authenticate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(not_json.status, StatusCode::BAD_REQUEST);
    assert_eq!(not_json.body["error"], "validation_error");

    let google_without_token = app.post_json("/api/auth/google", json!({})).await;
    assert_eq!(google_without_token.status, StatusCode::BAD_REQUEST);
    assert_eq!(google_without_token.body["error"], "validation_error");

    assert!(missing_id.set_cookie_header().is_none());
    assert_eq!(app.count_nodes("User").await, 0);
}

#[tokio::test]
async fn test_refresh_round_trip() {
    let app = spawn_app().await;
    let signed_in = app.authenticate("g-ada").await;
    let user_id = signed_in.body["user"]["userId"].as_str().unwrap().to_string();
    let cookie = signed_in.refresh_cookie().unwrap();

    let refreshed = app.refresh_with_cookie(Some(&cookie)).await;
    assert_eq!(refreshed.status, StatusCode::OK);
    assert_eq!(refreshed.body["ok"], true);

    let access_token = refreshed.body["accessToken"].as_str().unwrap();
    let claims = app.state.auth.tokens().verify_access_token(access_token).unwrap();
    assert_eq!(claims.user_id, user_id);

    // The refresh cookie is reissued for the same user
    let reissued = refreshed.refresh_cookie().unwrap();
    let refresh_claims = app.state.auth.tokens().verify_refresh_token(&reissued).unwrap();
    assert_eq!(refresh_claims.user_id, user_id);
}

#[tokio::test]
async fn test_refresh_failures_are_not_errors() {
    let app = spawn_app().await;
    let signed_in = app.authenticate("g-ada").await;
    let access_token = signed_in.body["accessToken"].as_str().unwrap().to_string();
    let ghost = app.state.auth.tokens().issue_refresh_token("ghost").unwrap();

    for cookie in [None, Some(""), Some("garbage"), Some(access_token.as_str()), Some(ghost.as_str())] {
        let response = app.refresh_with_cookie(cookie).await;
        assert_eq!(response.status, StatusCode::OK, "cookie {cookie:?}");
        assert_eq!(response.body, json!({ "accessToken": "", "ok": false }));
        assert!(response.refresh_cookie().is_none());
    }
}

#[tokio::test]
async fn test_me_requires_bearer_token() {
    let app = spawn_app().await;
    let signed_in = app.authenticate("g-ada").await;
    let access_token = signed_in.body["accessToken"].as_str().unwrap();

    let me = app
        .send(
            Request::get("/api/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["userId"], signed_in.body["user"]["userId"]);

    let anonymous = app.get("/api/auth/me").await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.body["error"], "missing_auth_header");

    let refresh_as_bearer = app
        .send(
            Request::get("/api/auth/me")
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", signed_in.refresh_cookie().unwrap()),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(refresh_as_bearer.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_google_sign_in() {
    let app = spawn_app().await;

    let response = app
        .post_json("/api/auth/google", json!({ "accessToken": GOOGLE_TOKEN }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["displayName"], "Ada Lovelace");
    assert!(response.refresh_cookie().is_some());

    let rejected = app
        .post_json("/api/auth/google", json!({ "accessToken": "forged" }))
        .await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.count_nodes("User").await, 1);
}
