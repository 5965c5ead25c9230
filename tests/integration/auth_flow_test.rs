//! Registration, login, rotation and revocation against a real database

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::common::{basic, bearer, TestApp};

#[tokio::test]
#[ignore = "requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_register_login_and_profile() {
    let app = TestApp::new().await.unwrap();
    let email = app.unique_email();

    let (status, user) = app
        .request(Method::POST, "/auth/register", Some(basic(&email, "pw")), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], email);
    assert_eq!(user["role"], "user");
    assert!(user.get("passwordHash").is_none());

    let (status, _) = app
        .request(Method::POST, "/auth/register", Some(basic(&email, "other")), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, tokens) = app
        .request(Method::POST, "/auth/login", Some(basic(&email, "pw")), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = tokens["accessToken"].as_str().unwrap().to_string();

    let (status, me) = app
        .request(Method::GET, "/users/me", Some(bearer(&access)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user["id"]);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_login_with_wrong_password() {
    let app = TestApp::new().await.unwrap();
    let email = app.unique_email();

    app.request(Method::POST, "/auth/register", Some(basic(&email, "right")), None)
        .await;

    let (status, body) = app
        .request(Method::POST, "/auth/login", Some(basic(&email, "wrong")), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");

    let (status, _) = app
        .request(
            Method::POST,
            "/auth/login",
            Some(basic("nobody@reelhouse.test", "right")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_rotate_then_block() {
    let app = TestApp::new().await.unwrap();
    let email = app.unique_email();

    app.request(Method::POST, "/auth/register", Some(basic(&email, "pw")), None)
        .await;
    let (_, tokens) = app
        .request(Method::POST, "/auth/login", Some(basic(&email, "pw")), None)
        .await;
    let refresh = tokens["refreshToken"].as_str().unwrap().to_string();

    let (status, rotated) = app
        .request(Method::POST, "/auth/token/access", Some(bearer(&refresh)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = rotated["accessToken"].as_str().unwrap().to_string();

    // Revoke the refresh token using the new access token
    let (status, body) = app
        .request(
            Method::POST,
            "/auth/token/block",
            Some(bearer(&access)),
            Some(json!({ "token": refresh })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(true));

    let (status, _) = app
        .request(Method::POST, "/auth/token/access", Some(bearer(&refresh)), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The access token itself is unaffected
    let (status, _) = app
        .request(Method::GET, "/users/me", Some(bearer(&access)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}
