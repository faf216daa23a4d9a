//! HTTP surface tests
//!
//! These tests drive the router with `oneshot` requests against an
//! in-memory store. No listener is bound.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use campaign_view_service::config::Settings;
use campaign_view_service::render::{ContentFetcher, FetchError};
use campaign_view_service::server::{create_app, AppState};
use campaign_view_service::store::{
    Message, MemoryCampaignStore, Recipient, Template, TemplateImage,
};

/// Fetcher that never reaches anything
struct OfflineFetcher;

#[async_trait]
impl ContentFetcher for OfflineFetcher {
    async fn fetch(&self, url: &str, _recipient: Option<&Recipient>) -> Result<String, FetchError> {
        Err(FetchError::Empty(url.to_string()))
    }
}

// 1x1 GIF
const GIF: &str = "R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

fn store() -> Arc<MemoryCampaignStore> {
    let store = MemoryCampaignStore::new();
    store.insert_template(Template {
        id: 1,
        body: "<html><body>[CONTENT]</body></html>".to_string(),
    });
    store.insert_template_image(TemplateImage {
        id: 42,
        template_id: 1,
        filename: "logo.gif".to_string(),
        mime_type: "image/gif".to_string(),
        data: GIF.to_string(),
    });
    store.insert_message(Message::new(5, "Spring news", "<p>Hello [EMAIL]</p>").with_template(1));
    store.insert_recipient(Recipient::new(1, "abc123", "ann@example.com"));
    Arc::new(store)
}

fn app_with(configure: impl FnOnce(&mut Settings)) -> Router {
    let mut settings = Settings::default();
    settings.site.website = "example.com".to_string();
    configure(&mut settings);

    let state = AppState::with_components(settings, store(), Arc::new(OfflineFetcher));
    create_app(state)
}

fn app() -> Router {
    app_with(|_| {})
}

async fn get(app: Router, uri: &str) -> (StatusCode, String, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, content_type, body.to_vec())
}

#[tokio::test]
async fn test_public_view_page() {
    let (status, content_type, body) = get(
        app(),
        "/lists/?p=view&pi=ViewBrowserPlugin&m=5&uid=abc123",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/html"));
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("<p>Hello ann@example.com</p>"));
}

#[tokio::test]
async fn test_legacy_view_file() {
    let (status, _, body) = get(app(), "/view.php?m=5&uid=abc123").await;

    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("Hello ann@example.com"));
}

#[tokio::test]
async fn test_render_error_is_html_page() {
    let (status, content_type, body) = get(app(), "/view.php?m=77&uid=abc123").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/html"));
    assert_eq!(String::from_utf8(body).unwrap(), "Message with id 77 does not exist");
}

#[tokio::test]
async fn test_invalid_message_id() {
    let (status, _, _) = get(app(), "/view.php?m=abc&uid=abc123").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_anonymous_view_refused() {
    let (status, content_type, _) = get(app(), "/view.php?m=5").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(content_type.starts_with("text/plain"));

    let app = app_with(|settings| settings.view_browser.anonymous = true);
    let (status, _, body) = get(app, "/view.php?m=5").await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("<p>Hello </p>"));
}

#[tokio::test]
async fn test_stored_image() {
    let (status, content_type, body) =
        get(app(), "/lists/?p=image&pi=ViewBrowserPlugin&m=5&id=42").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "image/gif");
    assert!(body.starts_with(b"GIF89a"));
}

#[tokio::test]
async fn test_missing_image_placeholder() {
    let (status, content_type, body) = get(app(), "/image.php?id=999999").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "image/png");
    assert!(body.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[tokio::test]
async fn test_non_numeric_image_rejected() {
    let (status, content_type, body) = get(app(), "/image.php?id=abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "A numeric template image id must be specified"
    );
}

#[tokio::test]
async fn test_unknown_plugin_page() {
    let (status, _, _) = get(app(), "/?p=view&pi=OtherPlugin&m=5&uid=abc123").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let (status, _, body) = get(app(), "/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["store"]["backend"], "memory");
    assert_eq!(json["render"]["hooks"][0], "view_browser");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let _ = get(app(), "/image.php?id=abc").await;

    let (status, content_type, body) = get(app(), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/plain"));
    assert!(String::from_utf8(body)
        .unwrap()
        .contains("campaign_view_images_served_total"));
}
