//! Integration tests for `POST /api/v1/auth` and bearer-token enforcement.

use notekeeper_service::errors::TokenError;
use notekeeper_service::models::{Identity, Role};
use notekeeper_test_utils::{
    test_signing_key, TestNoteServer, TestTokenBuilder, TokenAssertions, ADMIN_USERNAME,
    TEST_PASSWORD, USER_USERNAME,
};
use reqwest::{header, StatusCode};
use serde_json::json;

// ============================================================================
// Token issuance
// ============================================================================

#[tokio::test]
async fn test_login_returns_bearer_token() -> Result<(), anyhow::Error> {
    let server = TestNoteServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/api/v1/auth", server.url()))
        .json(&json!({ "username": ADMIN_USERNAME, "password": TEST_PASSWORD }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 3_600_000);

    let token = body["token"].as_str().unwrap_or_default().to_string();
    token
        .assert_valid_jwt()
        .assert_for_subject(ADMIN_USERNAME)
        .assert_has_role("ADMIN")
        .assert_expires_in(3600);

    assert_eq!(
        server.token_service().validate(&token),
        Ok(Identity::new(ADMIN_USERNAME, Role::Admin))
    );

    Ok(())
}

#[tokio::test]
async fn test_login_carries_user_role() -> Result<(), anyhow::Error> {
    let server = TestNoteServer::spawn().await?;

    let token = server.login(USER_USERNAME, TEST_PASSWORD).await?;

    token.assert_for_subject(USER_USERNAME).assert_has_role("USER");

    Ok(())
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user_look_identical() -> Result<(), anyhow::Error> {
    let server = TestNoteServer::spawn().await?;
    let url = format!("{}/api/v1/auth", server.url());

    let wrong_password = server
        .client()
        .post(&url)
        .json(&json!({ "username": ADMIN_USERNAME, "password": "not-the-password" }))
        .send()
        .await?;
    let unknown_user = server
        .client()
        .post(&url)
        .json(&json!({ "username": "nobody", "password": TEST_PASSWORD }))
        .send()
        .await?;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let wrong_password: serde_json::Value = wrong_password.json().await?;
    let unknown_user: serde_json::Value = unknown_user.json().await?;
    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password["error"]["code"], "AUTHENTICATION_FAILED");

    Ok(())
}

#[tokio::test]
async fn test_login_with_malformed_body_is_bad_request() -> Result<(), anyhow::Error> {
    let server = TestNoteServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/api/v1/auth", server.url()))
        .header(header::CONTENT_TYPE, "application/json")
        .body(r#"{"username": "admin""#)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");

    Ok(())
}

// ============================================================================
// Bearer-token enforcement
// ============================================================================

#[tokio::test]
async fn test_notes_require_authorization_header() -> Result<(), anyhow::Error> {
    let server = TestNoteServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/api/v1/notes", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok()),
        Some("Bearer realm=\"notekeeper\"")
    );

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    assert_eq!(server.note_store().find_all_calls(), 0);

    Ok(())
}

#[tokio::test]
async fn test_rejected_tokens_share_one_response() -> Result<(), anyhow::Error> {
    let server = TestNoteServer::spawn().await?;
    let url = format!("{}/api/v1/notes", server.url());

    let expired = TestTokenBuilder::new().expires_in(-60).build();
    let foreign = TestTokenBuilder::new()
        .signed_with(&test_signing_key(2))
        .build();
    let garbage = "not-a-token".to_string();

    assert_eq!(
        server.token_service().validate(&expired),
        Err(TokenError::Expired)
    );

    let mut bodies = Vec::new();
    for token in [&expired, &foreign, &garbage] {
        let response = server.client().get(&url).bearer_auth(token).send().await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        bodies.push(response.json::<serde_json::Value>().await?);
    }

    assert!(bodies.windows(2).all(|w| w.first() == w.last()));
    assert_eq!(server.note_store().find_all_calls(), 0);

    Ok(())
}

#[tokio::test]
async fn test_non_bearer_scheme_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestNoteServer::spawn().await?;
    let token = server.login(ADMIN_USERNAME, TEST_PASSWORD).await?;

    let response = server
        .client()
        .get(format!("{}/api/v1/notes", server.url()))
        .header(header::AUTHORIZATION, format!("Basic {token}"))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_hand_built_token_with_harness_key_is_accepted() -> Result<(), anyhow::Error> {
    let server = TestNoteServer::spawn().await?;
    let token = TestTokenBuilder::new()
        .for_user("carol")
        .with_role(Role::User)
        .with_claim("tenant", json!("acme"))
        .build();

    let response = server
        .client()
        .get(format!("{}/api/v1/notes", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}
