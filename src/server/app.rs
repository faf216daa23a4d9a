use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api::api_routes;

use super::AppState;

pub fn create_app(state: AppState) -> Router {
    let routes = api_routes(&state.settings.site.page_root);

    Router::new()
        .merge(routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
