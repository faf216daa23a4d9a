mod settings;

pub use settings::{
    DatabaseConfig, FetchConfig, LoggingConfig, RenderSettings, ServerConfig, Settings,
    SiteConfig, UrlsConfig, ViewBrowserConfig,
};
