//! Integration tests for web routes.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::json;
use tempfile::TempDir;
use thread_archiver::admission::AdmissionGate;
use thread_archiver::archiver::Archiver;
use thread_archiver::config::{Config, RedditCredentials};
use thread_archiver::db::{get_thread, Database};
use thread_archiver::reddit::{ContentFetcher, FetchError};
use thread_archiver::web::{create_app, AppState};
use tower::ServiceExt;

const THREAD_URL: &str = "https://www.reddit.com/r/test/comments/agi5zf/test/";

/// Serves canned thread payloads keyed by thread id.
struct StubFetcher {
    threads: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl ContentFetcher for StubFetcher {
    async fn fetch(
        &self,
        _category: &str,
        thread_id: &str,
        _comment_id: Option<&str>,
    ) -> Result<Vec<u8>, FetchError> {
        self.threads
            .get(thread_id)
            .cloned()
            .ok_or(FetchError::Status { status: 404 })
    }
}

fn thread_payload(thread_id: &str) -> Vec<u8> {
    serde_json::to_vec(&json!([
        {"kind": "Listing", "data": {"children": [
            {"kind": "t3", "data": {
                "id": thread_id,
                "title": "Archived thread title",
                "selftext_html": "&lt;p&gt;root body&lt;/p&gt;",
                "author": "op",
                "created": 1_546_300_800,
                "num_comments": 1
            }}
        ]}},
        {"kind": "Listing", "data": {"children": [
            {"kind": "t1", "data": {
                "id": "c1",
                "author": "alice",
                "body_html": "&lt;p&gt;first reply&lt;/p&gt;",
                "created": 1_546_300_900,
                "score": 7,
                "replies": ""
            }}
        ]}}
    ]))
    .unwrap()
}

fn create_test_config(db_path: &Path, rate_limit_capacity: u32) -> Config {
    Config {
        database_path: db_path.to_path_buf(),
        web_host: "127.0.0.1".to_string(),
        web_port: 0,
        get_cache_time: Duration::from_secs(60),
        post_cache_time: Duration::from_secs(3600),
        rate_limit_capacity,
        rate_limit_interval: Duration::from_secs(60),
        admission_sweep_interval: Duration::from_secs(300),
        max_comment_depth: 100,
        client_timeout: Duration::from_secs(5),
        reddit_api_base: "http://127.0.0.1:9".to_string(),
        reddit_token_url: "http://127.0.0.1:9/api/v1/access_token".to_string(),
        reddit: RedditCredentials {
            username: "archivist".to_string(),
            password: "hunter2".to_string(),
            app_id: "app-id".to_string(),
            app_secret: "app-secret".to_string(),
        },
    }
}

async fn create_test_app(rate_limit_capacity: u32) -> (Router, Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    let config = create_test_config(&db_path, rate_limit_capacity);

    let threads = ["agi5zf", "bbbbbb", "cccccc"]
        .into_iter()
        .map(|id| (id.to_string(), thread_payload(id)))
        .collect();
    let fetcher: Arc<dyn ContentFetcher> = Arc::new(StubFetcher { threads });

    let state = AppState {
        db: db.clone(),
        archiver: Arc::new(Archiver::new(
            db.clone(),
            Arc::clone(&fetcher),
            config.max_comment_depth,
        )),
        gate: Arc::new(AdmissionGate::from_config(&config)),
        fetcher,
        config: Arc::new(config),
    };

    let app = create_app(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
    (app, db, temp_dir)
}

fn submit(url: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/archive")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("archivef={}", urlencoding::encode(url))))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn wait_for_thread(db: &Database, thread_id: &str) {
    for _ in 0..200 {
        if get_thread(db.pool(), thread_id, "").await.unwrap().is_some() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("thread {thread_id} was never archived");
}

#[tokio::test]
async fn test_health() {
    let (app, _db, _temp_dir) = create_test_app(5).await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "API is live.");
}

#[tokio::test]
async fn test_archive_then_read_back() {
    let (app, db, _temp_dir) = create_test_app(5).await;

    let response = app.clone().oneshot(submit(THREAD_URL)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("url=/thread/agi5zf"));

    wait_for_thread(&db, "agi5zf").await;

    let response = app.clone().oneshot(get("/thread/agi5zf")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=60"
    );
    let body = body_string(response).await;
    assert!(body.contains("Archived thread title"));
    assert!(body.contains("<p>root body</p>"));
    assert!(body.contains("<p>first reply</p>"));

    let response = app.clone().oneshot(get("/api/thread/agi5zf")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(value["thread"]["sub"], "test");
    assert_eq!(value["replies"][0]["author"], "alice");

    let response = app.clone().oneshot(get("/")).await.unwrap();
    let body = body_string(response).await;
    assert!(body.contains("1 threads archived."));
    assert!(body.contains(r#"href="/thread/agi5zf""#));

    let response = app.clone().oneshot(get("/r/test")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Archived thread title"));

    let response = app.oneshot(get("/subs")).await.unwrap();
    assert!(body_string(response).await.contains(r#"href="/r/test""#));
}

#[tokio::test]
async fn test_resubmission_is_deduplicated() {
    let (app, db, _temp_dir) = create_test_app(5).await;

    let response = app.clone().oneshot(submit(THREAD_URL)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    wait_for_thread(&db, "agi5zf").await;

    let response = app.oneshot(submit(THREAD_URL)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Already requested"));
}

#[tokio::test]
async fn test_invalid_url_is_bad_request() {
    let (app, _db, _temp_dir) = create_test_app(5).await;

    let response = app
        .oneshot(submit("https://www.reddit.com/r/test/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rate_limited_submission() {
    let (app, db, _temp_dir) = create_test_app(1).await;

    let response = app.clone().oneshot(submit(THREAD_URL)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    wait_for_thread(&db, "agi5zf").await;

    let response = app
        .oneshot(submit("https://old.reddit.com/r/test/comments/bbbbbb/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_upstream_status_is_surfaced() {
    let (app, _db, _temp_dir) = create_test_app(5).await;

    let response = app
        .oneshot(submit("https://www.reddit.com/r/test/comments/gone00/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_fetch_can_be_resubmitted() {
    let (app, _db, _temp_dir) = create_test_app(5).await;
    let url = "https://www.reddit.com/r/test/comments/gone00/";

    let response = app.clone().oneshot(submit(url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The failed attempt must not count as a recent submission.
    let response = app.oneshot(submit(url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!body_string(response).await.contains("Already requested"));
}

#[tokio::test]
async fn test_thread_lookup_errors() {
    let (app, _db, _temp_dir) = create_test_app(5).await;

    let response = app.clone().oneshot(get("/thread/zzzzzz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.clone().oneshot(get("/thread/no")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.clone().oneshot(get("/api/thread/zzzzzz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/r/x")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
