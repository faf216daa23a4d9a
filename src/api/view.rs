//! View-in-browser and template image pages.
//!
//! Served twice: through the public page dispatcher
//! (`/?p=view&pi=ViewBrowserPlugin&m=..`) and as the legacy standalone
//! files (`/view.php?m=..`).

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::error::AppError;
use crate::render::{load_template_image, IMAGE_PAGE, PLUGIN_NAME, VIEW_PAGE};
use crate::server::AppState;

const ANONYMOUS_DISABLED: &str = "Anonymous viewing of campaigns is not enabled";
const MISSING_MESSAGE_ID: &str = "A numeric message id must be specified";

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Public page name
    pub p: Option<String>,
    /// Plugin owning the page
    pub pi: Option<String>,
    pub m: Option<String>,
    pub uid: Option<String>,
    pub id: Option<String>,
}

impl PageQuery {
    fn message_id(&self) -> Result<i64, AppError> {
        self.m
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty() && m.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|m| m.parse().ok())
            .ok_or_else(|| AppError::Validation(MISSING_MESSAGE_ID.to_string()))
    }

    fn uid(&self) -> Option<&str> {
        self.uid.as_deref().map(str::trim).filter(|uid| !uid.is_empty())
    }
}

/// GET / - public page dispatcher
#[tracing::instrument(name = "api.public_page", skip(state))]
pub async fn public_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    if query.pi.as_deref() != Some(PLUGIN_NAME) {
        return Err(AppError::NotFound("Unknown plugin page".to_string()));
    }

    match query.p.as_deref() {
        Some(VIEW_PAGE) => render_view(&state, &query).await,
        Some(IMAGE_PAGE) => Ok(render_image(&state, &query).await),
        _ => Err(AppError::NotFound("Unknown plugin page".to_string())),
    }
}

/// GET /view.php
#[tracing::instrument(name = "api.view_file", skip(state))]
pub async fn view_file(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    render_view(&state, &query).await
}

/// GET /image.php
#[tracing::instrument(name = "api.image_file", skip(state))]
pub async fn image_file(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Response {
    render_image(&state, &query).await
}

async fn render_view(state: &AppState, query: &PageQuery) -> Result<Response, AppError> {
    let message_id = query.message_id()?;
    let uid = query.uid();

    if uid.is_none() && !state.settings.view_browser.anonymous {
        tracing::debug!(message_id, "Refused anonymous view");
        return Ok(text_response(StatusCode::FORBIDDEN, ANONYMOUS_DISABLED));
    }

    let html = state.assembler.create_content(message_id, uid).await;
    Ok(Html(html).into_response())
}

async fn render_image(state: &AppState, query: &PageQuery) -> Response {
    let raw_id = query.id.as_deref().unwrap_or("");

    match load_template_image(state.store.as_ref(), raw_id).await {
        Ok(image) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, image.mime_type),
                (header::CONTENT_LENGTH, image.data.len().to_string()),
            ],
            image.data,
        )
            .into_response(),
        Err(e) => text_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

fn text_response(status: StatusCode, body: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.to_string(),
    )
        .into_response()
}
