use std::sync::Arc;
use std::time::Instant;

use sqlx::PgPool;

use crate::config::Settings;
use crate::error::AppError;
use crate::render::{
    ContentAssembler, ContentFetcher, HookRegistry, HttpContentFetcher, RenderConfig, RenderHook,
    ViewBrowserHook,
};
use crate::store::{connect_postgres, create_campaign_store, CampaignStore};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn CampaignStore>,
    pub assembler: Arc<ContentAssembler>,
    pub postgres_pool: Option<PgPool>,
    pub start_time: Instant,
}

impl AppState {
    /// Build the state from configuration, connecting to PostgreSQL when
    /// that backend is selected.
    pub async fn new(settings: Settings) -> Result<Self, AppError> {
        let postgres_pool = if settings.database.backend == "postgres" {
            match connect_postgres(&settings.database).await {
                Ok(pool) => Some(pool),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                    None
                }
            }
        } else {
            None
        };

        let store = create_campaign_store(&settings.database, postgres_pool.clone());
        let fetcher: Arc<dyn ContentFetcher> = Arc::new(HttpContentFetcher::new(&settings.fetch)?);

        let mut state = Self::with_components(settings, store, fetcher);
        state.postgres_pool = postgres_pool;
        Ok(state)
    }

    /// Build the state around an existing store and fetcher
    pub fn with_components(
        settings: Settings,
        store: Arc<dyn CampaignStore>,
        fetcher: Arc<dyn ContentFetcher>,
    ) -> Self {
        let config = RenderConfig::from_settings(&settings);
        let view_browser = &settings.view_browser;

        let available: Vec<Arc<dyn RenderHook>> = vec![Arc::new(ViewBrowserHook::new(
            config.links(),
            view_browser.link_text.clone(),
            view_browser.attributes.clone(),
            view_browser.anonymous,
        ))];
        let hooks = HookRegistry::from_names(&view_browser.hooks, &available);
        tracing::info!(hooks = ?hooks.names(), "Render hooks configured");

        let assembler = Arc::new(ContentAssembler::new(
            store.clone(),
            fetcher,
            hooks,
            config,
        ));

        Self {
            settings: Arc::new(settings),
            store,
            assembler,
            postgres_pool: None,
            start_time: Instant::now(),
        }
    }
}
