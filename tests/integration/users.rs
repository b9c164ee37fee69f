//! Registration and login integration tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{bearer, TestApp};

async fn register(app: &TestApp, username: &str, email: &str) {
    app.server
        .post("/person/register")
        .json(&json!({
            "username": username,
            "email": email,
            "password": "hunter22"
        }))
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_register_then_login_issues_usable_credential() {
    let app = TestApp::new();
    register(&app, "asha", "asha@example.com").await;

    let response = app
        .server
        .post("/person/login")
        .json(&json!({ "email": "asha@example.com", "password": "hunter22" }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    let token = body["token"].as_str().expect("missing token");
    assert!(body["expires_at"].is_string());

    let subject = app.state.tokens.verify(token).expect("token should verify");
    let (name, value) = bearer(token);
    let protected = app
        .server
        .get("/api/v1/protected")
        .add_header(name, value)
        .await;
    protected.assert_status_ok();
    assert_eq!(protected.text(), format!("Pharmacy ID: {}", subject));
}

#[tokio::test]
async fn test_password_is_never_stored_in_plaintext() {
    let app = TestApp::new();
    register(&app, "asha", "asha@example.com").await;

    let users = medlr::DocumentStore::find_all(app.store.as_ref(), "users")
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
    let stored = users[0]["password"].as_str().unwrap();
    assert_ne!(stored, "hunter22");
    assert!(stored.starts_with("$argon2"));
}

#[tokio::test]
async fn test_register_rejects_duplicates() {
    let app = TestApp::new();
    register(&app, "asha", "asha@example.com").await;

    let same_email = app
        .server
        .post("/person/register")
        .json(&json!({
            "username": "other",
            "email": "asha@example.com",
            "password": "hunter22"
        }))
        .await;
    same_email.assert_status(StatusCode::CONFLICT);

    let same_username = app
        .server
        .post("/person/register")
        .json(&json!({
            "username": "asha",
            "email": "other@example.com",
            "password": "hunter22"
        }))
        .await;
    same_username.assert_status(StatusCode::CONFLICT);
    assert_eq!(app.store.count("users").await, 1);
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/person/register")
        .json(&json!({ "username": "asha", "email": "not-an-email", "password": "123" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "VALIDATION_ERROR"
    );
    assert_eq!(app.store.count("users").await, 0);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_rejected() {
    let app = TestApp::new();
    register(&app, "asha", "asha@example.com").await;

    let response = app
        .server
        .post("/person/login")
        .json(&json!({ "email": "asha@example.com", "password": "wrong-password" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "INVALID_CREDENTIALS"
    );
}

#[tokio::test]
async fn test_login_with_unknown_email_is_rejected() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/person/login")
        .json(&json!({ "email": "ghost@example.com", "password": "hunter22" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "INVALID_CREDENTIALS"
    );
}
