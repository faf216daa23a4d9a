//! Campaign content rendering.
//!
//! This module provides:
//! - Link building for the public view and image pages and for tracking
//! - Placeholder substitution (`[FOOTER]`, `[EMAIL]`, `[NAME%%fallback]`, ...)
//! - The content assembler reconstructing a campaign for a recipient
//! - Document finalizing (image URLs, click tracking, title and styles)
//! - Render hooks, including the view-in-browser placeholders
//! - Template image lookup for the image page
//!
//! # Example
//!
//! ```ignore
//! let assembler = ContentAssembler::new(store, fetcher, hooks, RenderConfig::from_settings(&settings));
//!
//! // Personalised view
//! let html = assembler.create_content(5, Some("abc123")).await;
//!
//! // Anonymous view
//! let html = assembler.create_content(5, None).await;
//! ```

mod assembler;
mod document;
mod fetch;
mod hooks;
mod image;
mod links;
mod markup;
mod placeholder;
mod system;

pub use assembler::{
    ContentAssembler, ContentProvider, RenderConfig, RenderError, RenderResult, SystemUrls,
};
pub use document::{finalize, DocumentError, DocumentOptions};
pub use fetch::{personalise_url, ContentFetcher, FetchError, HttpContentFetcher};
pub use hooks::{HookRegistry, RenderHook, ViewBrowserHook, VIEWBROWSER, VIEWBROWSERURL};
pub use image::{
    load_template_image, parse_image_id, ImageContent, ImageError, DEFAULT_IMAGE_MIME,
    PLACEHOLDER_MIME,
};
pub use links::{
    compare_versions, query_separator, LinkBuilder, PageRouting, IMAGE_FILE, IMAGE_PAGE,
    PLUGIN_NAME, PUBLIC_PAGE_VERSION, VIEW_FILE, VIEW_PAGE,
};
pub use markup::{add_html_footer, escape_html};
pub use placeholder::{
    parse_placeholders, remove_token, replace_or_append, replace_token, replace_token_once,
    PlaceholderSet, CONTENT, FOOTER, SIGNATURE, USERTRACK,
};
pub use system::system_placeholders;
