//! API layer - HTTP endpoint handlers.

mod health;
mod metrics;
mod routes;
mod view;

pub use health::health;
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
pub use view::{image_file, public_page, view_file, PageQuery};
