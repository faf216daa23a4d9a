// Ambient layer
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Data access and rendering
pub mod render;
pub mod store;

// Application layer
pub mod api;
pub mod server;
