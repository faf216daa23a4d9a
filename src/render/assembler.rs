//! Content assembly: reconstructs the HTML body of a campaign for one
//! recipient, or for nobody in particular.
//!
//! Source selection, in order of precedence:
//! 1. a caller-supplied content provider
//! 2. the remote URL of a message sent from a URL
//! 3. the template with `[CONTENT]` replaced by the stored body, or the
//!    stored body alone (which then gets the default style block)
//!
//! The content then passes through footer, signature, recipient field,
//! attribute, system placeholder and tracking pixel substitution, the
//! configured hooks, and finally the document rewrites.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::config::Settings;
use crate::error::is_production;
use crate::metrics::RenderMetrics;
use crate::store::{CampaignStore, Message, Recipient, SendMethod, StoreError};

use super::document::{finalize, DocumentError, DocumentOptions};
use super::fetch::ContentFetcher;
use super::hooks::HookRegistry;
use super::links::{LinkBuilder, PageRouting};
use super::markup::{add_html_footer, escape_html};
use super::placeholder::{
    parse_placeholders, replace_or_append, replace_token, replace_token_once, PlaceholderSet,
    CONTENT, FOOTER, SIGNATURE, USERTRACK,
};
use super::system::system_placeholders;

/// Render failures. The display text is shown to the browser as is.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Message with id {0} does not exist")]
    MessageNotFound(i64),

    #[error("User with uid {0} does not exist")]
    RecipientNotFound(String),

    #[error("Unable to retrieve URL {0}")]
    ContentUnavailable(String),

    #[error("Unable to load campaign data: {0}")]
    Store(#[from] StoreError),

    #[error("Unable to build document: {0}")]
    Document(#[from] DocumentError),
}

impl RenderError {
    /// Metric label
    pub fn outcome(&self) -> &'static str {
        match self {
            RenderError::MessageNotFound(_) => "message_not_found",
            RenderError::RecipientNotFound(_) => "recipient_not_found",
            RenderError::ContentUnavailable(_) => "content_unavailable",
            RenderError::Store(_) => "store_error",
            RenderError::Document(_) => "document_error",
        }
    }

    /// Text shown to the browser. Store and document failures are replaced
    /// by a generic line when `mask_internal` is set.
    pub fn browser_text(&self, mask_internal: bool) -> String {
        match self {
            RenderError::Store(_) | RenderError::Document(_) if mask_internal => {
                "Unable to display this campaign".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Final markup of a render
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub html: String,

    /// Recipient email after the hooks had their say
    pub destination_email: String,
}

/// Supplies the content directly, bypassing source resolution.
///
/// Receives the template body, if the message has one, and the message.
pub trait ContentProvider: Send + Sync {
    fn content(&self, template_body: Option<&str>, message: &Message) -> String;
}

impl<F> ContentProvider for F
where
    F: Fn(Option<&str>, &Message) -> String + Send + Sync,
{
    fn content(&self, template_body: Option<&str>, message: &Message) -> String {
        self(template_body, message)
    }
}

/// Bases of the system placeholder links
#[derive(Debug, Clone)]
pub struct SystemUrls {
    pub unsubscribe: String,
    pub blacklist: String,
    pub subscribe: String,
    pub forward: String,
    pub preferences: String,
    pub confirmation: String,
}

/// Everything the assembler needs from configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub root_url: String,
    pub routing: PageRouting,
    pub website: String,
    pub domain: String,
    pub urls: SystemUrls,
    pub always_add_usertrack: bool,
    pub click_track: bool,
    /// Signature markup (text or image credit)
    pub signature: String,
    /// Style block for messages without a template
    pub html_email_style: String,
    pub unsubscribe_text: String,
    pub this_link_text: String,
    pub forward_text: String,
}

impl RenderConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let root_url = settings.root_url();
        let page = |configured: &Option<String>, name: &str| {
            configured
                .clone()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| format!("{}?p={}", root_url, name))
        };
        let urls = SystemUrls {
            unsubscribe: page(&settings.urls.unsubscribe, "unsubscribe"),
            blacklist: page(&settings.urls.blacklist, "blacklist"),
            subscribe: page(&settings.urls.subscribe, "subscribe"),
            forward: page(&settings.urls.forward, "forward"),
            preferences: page(&settings.urls.preferences, "preferences"),
            confirmation: page(&settings.urls.confirmation, "confirm"),
        };

        let render = &settings.render;
        let signature = if render.email_text_credits {
            render.powered_by_text.clone()
        } else {
            render.powered_by_image.clone()
        };

        Self {
            routing: PageRouting::for_host_version(&settings.site.host_version),
            website: settings.site.website.clone(),
            domain: settings.site.domain.clone(),
            urls,
            always_add_usertrack: render.always_add_usertrack,
            click_track: render.click_track,
            signature,
            html_email_style: render.html_email_style.trim().to_string(),
            unsubscribe_text: render.unsubscribe_text.clone(),
            this_link_text: render.this_link_text.clone(),
            forward_text: render.forward_text.clone(),
            root_url,
        }
    }

    pub fn links(&self) -> LinkBuilder {
        LinkBuilder::new(self.root_url.clone(), self.routing)
    }
}

/// Builds the final document of a campaign
pub struct ContentAssembler {
    store: Arc<dyn CampaignStore>,
    fetcher: Arc<dyn ContentFetcher>,
    hooks: HookRegistry,
    config: RenderConfig,
    links: LinkBuilder,
}

impl ContentAssembler {
    pub fn new(
        store: Arc<dyn CampaignStore>,
        fetcher: Arc<dyn ContentFetcher>,
        hooks: HookRegistry,
        config: RenderConfig,
    ) -> Self {
        let links = config.links();
        Self {
            store,
            fetcher,
            hooks,
            config,
            links,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn links(&self) -> &LinkBuilder {
        &self.links
    }

    pub fn store(&self) -> &Arc<dyn CampaignStore> {
        &self.store
    }

    /// Render and return the markup, or the error text when the render fails
    pub async fn create_content(&self, message_id: i64, uid: Option<&str>) -> String {
        match self.assemble(message_id, uid).await {
            Ok(result) => result.html,
            Err(e) => e.browser_text(is_production()),
        }
    }

    /// Render a message, personalised when `uid` is non-empty
    pub async fn assemble(
        &self,
        message_id: i64,
        uid: Option<&str>,
    ) -> Result<RenderResult, RenderError> {
        self.assemble_with(message_id, uid, None).await
    }

    /// Render a message, taking the content from `provider` when given
    #[tracing::instrument(name = "render.assemble", skip(self, provider), fields(personalised))]
    pub async fn assemble_with(
        &self,
        message_id: i64,
        uid: Option<&str>,
        provider: Option<&dyn ContentProvider>,
    ) -> Result<RenderResult, RenderError> {
        let started = Instant::now();
        let uid = uid.unwrap_or("").trim();
        tracing::Span::current().record("personalised", !uid.is_empty());

        let result = self.render(message_id, uid, provider).await;

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(_) => {
                RenderMetrics::record("ok", elapsed);
                tracing::debug!(message_id, "Rendered campaign content");
            }
            Err(e) => {
                RenderMetrics::record(e.outcome(), elapsed);
                tracing::warn!(message_id, error = %e, "Campaign render failed");
            }
        }
        result
    }

    async fn render(
        &self,
        message_id: i64,
        uid: &str,
        provider: Option<&dyn ContentProvider>,
    ) -> Result<RenderResult, RenderError> {
        let message = self
            .store
            .message(message_id)
            .await?
            .ok_or(RenderError::MessageNotFound(message_id))?;

        let recipient = if uid.is_empty() {
            None
        } else {
            let recipient = self
                .store
                .recipient_by_uid(uid)
                .await?
                .ok_or_else(|| RenderError::RecipientNotFound(uid.to_string()))?;
            Some(recipient)
        };
        let attributes = self.store.attribute_values(recipient.as_ref()).await?;

        let template_body = match message.template_id {
            Some(id) => self
                .store
                .template(id)
                .await?
                .map(|t| t.unescaped_body())
                .filter(|body| !body.trim().is_empty()),
            None => None,
        };

        let mut styles = String::new();
        let content = match provider {
            Some(provider) => provider.content(template_body.as_deref(), &message),
            None => match message.send_method {
                SendMethod::RemoteUrl => self.fetch_remote(&message, recipient.as_ref()).await?,
                SendMethod::Inline => match &template_body {
                    Some(template) => replace_token(template, CONTENT, &message.body).0,
                    None => {
                        styles = self.config.html_email_style.clone();
                        message.body.clone()
                    }
                },
            },
        };

        let content = self.substitute(content, &message, recipient.as_ref(), &attributes);

        let email = recipient.as_ref().map(|r| r.email.as_str()).unwrap_or("");
        let destination_email =
            self.hooks
                .final_destination_email(message.id, &attributes, email);
        let content = self.hooks.parse_outgoing_html(
            message.id,
            content,
            &destination_email,
            recipient.as_ref(),
        );

        let images = match message.template_id {
            Some(id) => self.store.template_images(id).await?,
            None => Vec::new(),
        };
        let click_track_uid = (self.config.click_track && !uid.is_empty()).then_some(uid);

        let html = finalize(
            &self.links,
            &content,
            &DocumentOptions {
                message_id: message.id,
                images: &images,
                click_track_uid,
                subject: &message.subject,
                styles: &styles,
            },
        )?;

        Ok(RenderResult {
            html,
            destination_email,
        })
    }

    async fn fetch_remote(
        &self,
        message: &Message,
        recipient: Option<&Recipient>,
    ) -> Result<String, RenderError> {
        let url = message.send_url.clone().unwrap_or_default();
        if url.trim().is_empty() {
            return Err(RenderError::ContentUnavailable(url));
        }

        match self.fetcher.fetch(&url, recipient).await {
            Ok(content) if !content.trim().is_empty() => Ok(content),
            Ok(_) | Err(_) => Err(RenderError::ContentUnavailable(url)),
        }
    }

    /// Footer, signature, recipient, attribute, system and tracking
    /// placeholders, in that order
    fn substitute(
        &self,
        content: String,
        message: &Message,
        recipient: Option<&Recipient>,
        attributes: &BTreeMap<String, String>,
    ) -> String {
        let (content, _) = replace_or_append(&content, FOOTER, &message.footer, "<br />");

        let signature = if message.signature {
            self.config.signature.as_str()
        } else {
            ""
        };
        let (content, _) = replace_or_append(&content, SIGNATURE, signature, "");

        let uid = recipient.map(|r| r.uid.as_str()).unwrap_or("");
        let email = recipient.map(|r| r.email.as_str()).unwrap_or("");

        let fields: PlaceholderSet = [("email", email), ("uniqid", uid)].into_iter().collect();
        let content = parse_placeholders(&content, &fields);

        let attribute_set: PlaceholderSet = attributes.iter().collect();
        let content = parse_placeholders(&content, &attribute_set);

        let system = system_placeholders(&self.config, uid, email, message);
        let content = parse_placeholders(&content, &system);

        self.replace_user_track(&content, message.id, uid)
    }

    /// Insert the open-tracking pixel at the first `[USERTRACK]`, dropping
    /// any further occurrences
    fn replace_user_track(&self, content: &str, message_id: i64, uid: &str) -> String {
        let image = format!(
            r#"<img src="{}" width="1" height="1" border="0" alt="" />"#,
            escape_html(&self.links.tracking_pixel_url(message_id, uid))
        );

        let (content, count) = replace_token_once(content, USERTRACK, &image);

        if count == 0 {
            if self.config.always_add_usertrack {
                return add_html_footer(&content, &image);
            }
            return content;
        }
        replace_token(&content, USERTRACK, "").0
    }
}
