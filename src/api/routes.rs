use axum::{routing::get, Router};

use crate::server::AppState;

use super::health::health;
use super::metrics::prometheus_metrics;
use super::view::{image_file, public_page, view_file};

/// Routes of the service. The pages are mounted at the site root and again
/// below `page_root` when that is set.
pub fn api_routes(page_root: &str) -> Router<AppState> {
    let router = Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        // Pages
        .route("/", get(public_page))
        .route("/view.php", get(view_file))
        .route("/image.php", get(image_file));

    let root = page_root.trim_matches('/');
    if root.is_empty() {
        return router;
    }

    router
        .route(&format!("/{}", root), get(public_page))
        .route(&format!("/{}/", root), get(public_page))
        .route(&format!("/{}/view.php", root), get(view_file))
        .route(&format!("/{}/image.php", root), get(image_file))
}
