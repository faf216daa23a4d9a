use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub urls: UrlsConfig,
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub view_browser: ViewBrowserConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `memory` or `postgres`
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Prefix of every list-management table
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
}

/// Public location of the list-management installation
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_website")]
    pub website: String,
    /// Path below the website, without trailing slash
    #[serde(default = "default_page_root")]
    pub page_root: String,
    #[serde(default = "default_website")]
    pub domain: String,
    /// Installed version of the host application; selects the link scheme
    #[serde(default = "default_host_version")]
    pub host_version: String,
}

/// Bases of the system placeholder links. Unset entries point at the
/// matching public page below the root URL.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UrlsConfig {
    pub unsubscribe: Option<String>,
    pub blacklist: Option<String>,
    pub subscribe: Option<String>,
    pub forward: Option<String>,
    pub preferences: Option<String>,
    pub confirmation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderSettings {
    /// Append a tracking pixel when the content has no `[USERTRACK]`
    #[serde(default = "default_true")]
    pub always_add_usertrack: bool,
    /// Wrap links of personalised renders for click tracking
    #[serde(default = "default_true")]
    pub click_track: bool,
    /// Use the text credit rather than the image credit as signature
    #[serde(default)]
    pub email_text_credits: bool,
    #[serde(default = "default_powered_by_text")]
    pub powered_by_text: String,
    #[serde(default = "default_powered_by_image")]
    pub powered_by_image: String,
    /// Style block used when the message has no template
    #[serde(default = "default_html_email_style")]
    pub html_email_style: String,
    #[serde(default = "default_unsubscribe_text")]
    pub unsubscribe_text: String,
    #[serde(default = "default_this_link_text")]
    pub this_link_text: String,
    #[serde(default = "default_forward_text")]
    pub forward_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewBrowserConfig {
    /// Text of the view-in-browser link
    #[serde(default = "default_link_text")]
    pub link_text: String,
    /// Additional attributes for the generated `<a>` element
    #[serde(default)]
    pub attributes: String,
    /// Whether views without a recipient are served
    #[serde(default)]
    pub anonymous: bool,
    /// Hooks applied during assembly, in order
    #[serde(default = "default_hooks")]
    pub hooks: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Emit logs as JSON lines
    #[serde(default)]
    pub json: bool,
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_database_url() -> String {
    "postgres://localhost/phplist".to_string()
}

fn default_pool_size() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_table_prefix() -> String {
    "phplist_".to_string()
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_website() -> String {
    "localhost".to_string()
}

fn default_page_root() -> String {
    "/lists".to_string()
}

fn default_host_version() -> String {
    "3.6.0".to_string()
}

fn default_powered_by_text() -> String {
    r#"<div class="poweredby">powered by <a href="https://www.phplist.com" target="_blank">phpList</a></div>"#
        .to_string()
}

fn default_powered_by_image() -> String {
    r#"<p class="poweredby"><a href="https://www.phplist.com/poweredby" title="visit the phpList website"><img src="https://www.phplist.com/images/power-phplist.png" width="70" height="30" border="0" alt="powered by phpList" /></a></p>"#
        .to_string()
}

fn default_html_email_style() -> String {
    r#"<style type="text/css">body { font-size: 11px; font-family: Verdana, Arial, Helvetica, sans-serif; } a { color: #0066cc; }</style>"#
        .to_string()
}

fn default_unsubscribe_text() -> String {
    "Unsubscribe".to_string()
}

fn default_this_link_text() -> String {
    "this link".to_string()
}

fn default_forward_text() -> String {
    "Forward".to_string()
}

fn default_link_text() -> String {
    "View in browser".to_string()
}

fn default_hooks() -> Vec<String> {
    vec!["view_browser".to_string()]
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("campaign-view-service/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("database.backend", default_backend())?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // CAMPAIGN__SERVER__PORT, CAMPAIGN__SITE__WEBSITE, CAMPAIGN__VIEW_BROWSER__HOOKS, etc.
            .add_source(
                Environment::with_prefix("CAMPAIGN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("view_browser.hooks"),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Root URL of the installation, always ending with `/`
    pub fn root_url(&self) -> String {
        format!(
            "{}://{}{}/",
            self.site.scheme,
            self.site.website,
            self.site.page_root.trim_end_matches('/')
        )
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: default_database_url(),
            pool_size: default_pool_size(),
            connect_timeout_seconds: default_connect_timeout(),
            table_prefix: default_table_prefix(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            website: default_website(),
            page_root: default_page_root(),
            domain: default_website(),
            host_version: default_host_version(),
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            always_add_usertrack: true,
            click_track: true,
            email_text_credits: false,
            powered_by_text: default_powered_by_text(),
            powered_by_image: default_powered_by_image(),
            html_email_style: default_html_email_style(),
            unsubscribe_text: default_unsubscribe_text(),
            this_link_text: default_this_link_text(),
            forward_text: default_forward_text(),
        }
    }
}

impl Default for ViewBrowserConfig {
    fn default() -> Self {
        Self {
            link_text: default_link_text(),
            attributes: String::new(),
            anonymous: false,
            hooks: default_hooks(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}
