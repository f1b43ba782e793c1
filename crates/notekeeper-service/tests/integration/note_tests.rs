//! Integration tests for the note endpoints.

use notekeeper_test_utils::{TestNoteServer, ADMIN_USERNAME, TEST_PASSWORD};
use reqwest::{header, StatusCode};
use serde_json::json;

async fn logged_in() -> Result<(TestNoteServer, String), anyhow::Error> {
    let server = TestNoteServer::spawn().await?;
    let token = server.login(ADMIN_USERNAME, TEST_PASSWORD).await?;
    Ok((server, token))
}

async fn create(
    server: &TestNoteServer,
    token: &str,
    title: &str,
    content: &str,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(server
        .client()
        .post(format!("{}/api/v1/notes", server.url()))
        .bearer_auth(token)
        .json(&json!({ "title": title, "content": content }))
        .send()
        .await?)
}

#[tokio::test]
async fn test_create_note_returns_created_note() -> Result<(), anyhow::Error> {
    let (server, token) = logged_in().await?;

    let response = create(&server, &token, "Groceries", "milk, eggs").await?;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(
        body,
        json!({ "id": 1, "title": "Groceries", "content": "milk, eggs" })
    );
    assert_eq!(server.note_store().create_calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_list_notes_is_newest_first() -> Result<(), anyhow::Error> {
    let (server, token) = logged_in().await?;
    for title in ["one", "two", "three"] {
        create(&server, &token, title, "body").await?;
    }

    let body: serde_json::Value = server
        .client()
        .get(format!("{}/api/v1/notes", server.url()))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;

    let ids: Vec<i64> = body
        .as_array()
        .map(|notes| notes.iter().filter_map(|n| n["id"].as_i64()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec![3, 2, 1]);

    Ok(())
}

#[tokio::test]
async fn test_get_note_by_id() -> Result<(), anyhow::Error> {
    let (server, token) = logged_in().await?;
    create(&server, &token, "Title", "Content").await?;

    let response = server
        .client()
        .get(format!("{}/api/v1/notes/1", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["title"], "Title");

    Ok(())
}

#[tokio::test]
async fn test_get_missing_note_is_not_found() -> Result<(), anyhow::Error> {
    let (server, token) = logged_in().await?;

    let response = server
        .client()
        .get(format!("{}/api/v1/notes/99", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "Note with id 99 not found");

    Ok(())
}

#[tokio::test]
async fn test_invalid_notes_are_rejected_without_store_write() -> Result<(), anyhow::Error> {
    let (server, token) = logged_in().await?;
    let too_long_title = "x".repeat(256);

    for (title, content) in [
        ("", "content"),
        ("   ", "content"),
        ("title", ""),
        (too_long_title.as_str(), "content"),
    ] {
        let response = create(&server, &token, title, content).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    }

    assert_eq!(server.note_store().create_calls(), 0);

    Ok(())
}

#[tokio::test]
async fn test_title_limit_counts_characters() -> Result<(), anyhow::Error> {
    let (server, token) = logged_in().await?;
    let title = "é".repeat(255);

    let response = create(&server, &token, &title, "content").await?;

    assert_eq!(response.status(), StatusCode::CREATED);

    Ok(())
}

#[tokio::test]
async fn test_malformed_note_body_is_bad_request() -> Result<(), anyhow::Error> {
    let (server, token) = logged_in().await?;

    let response = server
        .client()
        .post(format!("{}/api/v1/notes", server.url()))
        .bearer_auth(&token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(r#"{"title": 5}"#)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_non_numeric_note_id_is_validation_error() -> Result<(), anyhow::Error> {
    let (server, token) = logged_in().await?;

    for id in ["abc", "1.5", "99999999999999999999"] {
        let response = server
            .client()
            .get(format!("{}/api/v1/notes/{id}", server.url()))
            .bearer_auth(&token)
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "id {id}");
        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
        assert_eq!(body["error"]["message"], "Invalid note id");
    }

    assert_eq!(server.note_store().find_by_id_calls(), 0);

    Ok(())
}
