//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub store: StoreHealthResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgres: Option<PostgresHealthResponse>,
    pub render: RenderHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct StoreHealthResponse {
    pub backend: String,
}

#[derive(Debug, Serialize)]
pub struct PostgresHealthResponse {
    pub status: String,
    pub connected: bool,
    pub pool_size: u32,
    pub idle_connections: u32,
}

#[derive(Debug, Serialize)]
pub struct RenderHealthResponse {
    pub root_url: String,
    pub anonymous: bool,
    pub hooks: Vec<String>,
}

/// GET /health
#[tracing::instrument(name = "api.health", skip(state))]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let postgres = state.postgres_pool.as_ref().map(|pool| {
        let connected = !pool.is_closed();
        PostgresHealthResponse {
            status: if connected { "connected" } else { "closed" }.to_string(),
            connected,
            pool_size: pool.size(),
            idle_connections: pool.num_idle() as u32,
        }
    });

    // A postgres backend that fell back to memory is degraded
    let backend = state.store.backend_type();
    let status = if state.settings.database.backend == "postgres" && backend != "postgres" {
        "degraded"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        store: StoreHealthResponse {
            backend: backend.to_string(),
        },
        postgres,
        render: RenderHealthResponse {
            root_url: state.assembler.config().root_url.clone(),
            anonymous: state.settings.view_browser.anonymous,
            hooks: state.settings.view_browser.hooks.clone(),
        },
    })
}
