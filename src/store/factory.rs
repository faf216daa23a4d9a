//! Campaign store factory

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::DatabaseConfig;

use super::backend::CampaignStore;
use super::memory::MemoryCampaignStore;
use super::postgres::PostgresCampaignStore;

/// Create a campaign store based on configuration.
///
/// - `"postgres"`: a `PostgresCampaignStore` if a pool is provided
/// - `"memory"` (default): an empty `MemoryCampaignStore`
pub fn create_campaign_store(
    settings: &DatabaseConfig,
    postgres_pool: Option<PgPool>,
) -> Arc<dyn CampaignStore> {
    match settings.backend.as_str() {
        "postgres" => {
            if let Some(pool) = postgres_pool {
                tracing::info!(
                    backend = "postgres",
                    table_prefix = %settings.table_prefix,
                    "Creating PostgreSQL campaign store"
                );
                Arc::new(PostgresCampaignStore::new(
                    pool,
                    settings.table_prefix.clone(),
                ))
            } else {
                tracing::warn!(
                    "PostgreSQL backend requested but no pool provided, falling back to memory"
                );
                Arc::new(MemoryCampaignStore::new())
            }
        }
        "memory" => {
            tracing::info!(backend = "memory", "Creating in-memory campaign store");
            Arc::new(MemoryCampaignStore::new())
        }
        other => {
            tracing::warn!(
                backend = %other,
                "Unknown campaign store backend, falling back to memory"
            );
            Arc::new(MemoryCampaignStore::new())
        }
    }
}
