//! Read-after-write and load-collapsing behavior observed over HTTP.

use futures::future::join_all;
use notekeeper_test_utils::{CountingNoteStore, TestNoteServer, ADMIN_USERNAME, TEST_PASSWORD};
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

async fn list(server: &TestNoteServer, token: &str) -> Result<serde_json::Value, anyhow::Error> {
    let response = server
        .client()
        .get(format!("{}/api/v1/notes", server.url()))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(response.json().await?)
}

#[tokio::test]
async fn test_list_reflects_create_immediately() -> Result<(), anyhow::Error> {
    let server = TestNoteServer::spawn().await?;
    let token = server.login(ADMIN_USERNAME, TEST_PASSWORD).await?;

    assert_eq!(list(&server, &token).await?, json!([]));

    let created: serde_json::Value = server
        .client()
        .post(format!("{}/api/v1/notes", server.url()))
        .bearer_auth(&token)
        .json(&json!({ "title": "fresh", "content": "note" }))
        .send()
        .await?
        .json()
        .await?;

    let after = list(&server, &token).await?;
    assert_eq!(after, json!([created]));
    assert_eq!(server.note_store().find_all_calls(), 2);

    Ok(())
}

#[tokio::test]
async fn test_repeated_list_is_served_from_cache() -> Result<(), anyhow::Error> {
    let server = TestNoteServer::spawn().await?;
    let token = server.login(ADMIN_USERNAME, TEST_PASSWORD).await?;

    for _ in 0..5 {
        list(&server, &token).await?;
    }

    assert_eq!(server.note_store().find_all_calls(), 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cold_reads_hit_store_once() -> Result<(), anyhow::Error> {
    let store = Arc::new(CountingNoteStore::with_latency(Duration::from_millis(200)));
    store.seed("shared", "note").await?;
    let server = TestNoteServer::spawn_with_note_store(Arc::clone(&store)).await?;
    let token = server.login(ADMIN_USERNAME, TEST_PASSWORD).await?;

    let requests = (0..10).map(|_| {
        server
            .client()
            .get(format!("{}/api/v1/notes/1", server.url()))
            .bearer_auth(&token)
            .send()
    });

    for response in join_all(requests).await {
        let response = response?;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["title"], "shared");
    }

    assert_eq!(store.find_by_id_calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_store_failure_is_not_cached() -> Result<(), anyhow::Error> {
    let store = Arc::new(CountingNoteStore::new());
    let server = TestNoteServer::spawn_with_note_store(Arc::clone(&store)).await?;
    let token = server.login(ADMIN_USERNAME, TEST_PASSWORD).await?;

    store.set_failing(true);
    let response = server
        .client()
        .get(format!("{}/api/v1/notes", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "STORE_ERROR");

    store.set_failing(false);
    assert_eq!(list(&server, &token).await?, json!([]));
    assert_eq!(store.find_all_calls(), 2);

    Ok(())
}
