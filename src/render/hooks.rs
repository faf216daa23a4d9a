//! Collaborating hooks applied at the end of assembly.
//!
//! Hooks run in registration order. Each may rewrite the destination email
//! and the outgoing content; results are folded from one hook to the next.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::store::Recipient;

use super::links::LinkBuilder;
use super::markup::escape_html;
use super::placeholder::replace_token;

pub const VIEWBROWSER: &str = "VIEWBROWSER";
pub const VIEWBROWSERURL: &str = "VIEWBROWSERURL";

/// A collaborator taking part in content assembly
pub trait RenderHook: Send + Sync {
    /// Name used to enable the hook in configuration
    fn name(&self) -> &str;

    /// Rewrite the address the message is delivered to
    fn final_destination_email(
        &self,
        _message_id: i64,
        _attributes: &BTreeMap<String, String>,
        email: &str,
    ) -> String {
        email.to_string()
    }

    /// Rewrite HTML content
    fn parse_outgoing_html(
        &self,
        _message_id: i64,
        content: &str,
        _destination: &str,
        _recipient: Option<&Recipient>,
    ) -> String {
        content.to_string()
    }

    /// Rewrite plain-text content
    fn parse_outgoing_text(
        &self,
        _message_id: i64,
        content: &str,
        _destination: &str,
        _recipient: Option<&Recipient>,
    ) -> String {
        content.to_string()
    }
}

/// Ordered list of hooks
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn RenderHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook; it runs after every hook registered before it
    pub fn register(&mut self, hook: Arc<dyn RenderHook>) {
        self.hooks.push(hook);
    }

    /// Build a registry from configured names, picking from `available`.
    ///
    /// Names without a matching hook are skipped.
    pub fn from_names(names: &[String], available: &[Arc<dyn RenderHook>]) -> Self {
        let mut registry = Self::new();

        for name in names {
            match available.iter().find(|hook| hook.name() == name.trim()) {
                Some(hook) => registry.register(hook.clone()),
                None => {
                    tracing::warn!(hook = %name, "Configured render hook is not available, skipping");
                }
            }
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.hooks.iter().map(|hook| hook.name()).collect()
    }

    pub fn final_destination_email(
        &self,
        message_id: i64,
        attributes: &BTreeMap<String, String>,
        email: &str,
    ) -> String {
        self.hooks.iter().fold(email.to_string(), |destination, hook| {
            hook.final_destination_email(message_id, attributes, &destination)
        })
    }

    pub fn parse_outgoing_html(
        &self,
        message_id: i64,
        content: String,
        destination: &str,
        recipient: Option<&Recipient>,
    ) -> String {
        self.hooks.iter().fold(content, |content, hook| {
            hook.parse_outgoing_html(message_id, &content, destination, recipient)
        })
    }

    /// Run the hooks over the plain-text part a campaign is sent with.
    ///
    /// The browser view only renders HTML; this is the entry point for
    /// senders building the text alternative of the same message.
    pub fn parse_outgoing_text(
        &self,
        message_id: i64,
        content: String,
        destination: &str,
        recipient: Option<&Recipient>,
    ) -> String {
        self.hooks.iter().fold(content, |content, hook| {
            hook.parse_outgoing_text(message_id, &content, destination, recipient)
        })
    }
}

/// Replaces `[VIEWBROWSER]` with a link to the browser view and
/// `[VIEWBROWSERURL]` with its URL.
///
/// Without a recipient token the placeholders are removed unless anonymous
/// views are enabled.
pub struct ViewBrowserHook {
    links: LinkBuilder,
    link_text: String,
    attributes: String,
    anonymous: bool,
}

impl ViewBrowserHook {
    pub const NAME: &'static str = "view_browser";

    pub fn new(
        links: LinkBuilder,
        link_text: impl Into<String>,
        attributes: impl Into<String>,
        anonymous: bool,
    ) -> Self {
        Self {
            links,
            link_text: link_text.into(),
            attributes: attributes.into(),
            anonymous,
        }
    }

    fn anchor(&self, url: &str) -> String {
        let attributes = self.attributes.trim();
        let attributes = if attributes.is_empty() {
            String::new()
        } else {
            format!(" {}", attributes)
        };

        format!(
            r#"<a href="{}"{}>{}</a>"#,
            escape_html(url),
            attributes,
            escape_html(&self.link_text)
        )
    }

    /// Recipient token, or `None` when the placeholders must be removed
    fn view_uid<'a>(&self, recipient: Option<&'a Recipient>) -> Option<&'a str> {
        let uid = recipient.map(|r| r.uid.as_str()).unwrap_or("");
        if uid.is_empty() && !self.anonymous {
            None
        } else {
            Some(uid)
        }
    }

    fn replace(content: &str, link: &str, url: &str) -> String {
        let (content, _) = replace_token(content, VIEWBROWSER, link);
        let (content, _) = replace_token(&content, VIEWBROWSERURL, url);
        content
    }
}

impl RenderHook for ViewBrowserHook {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn parse_outgoing_html(
        &self,
        message_id: i64,
        content: &str,
        _destination: &str,
        recipient: Option<&Recipient>,
    ) -> String {
        let Some(uid) = self.view_uid(recipient) else {
            return Self::replace(content, "", "");
        };
        let url = self.links.view_url(message_id, uid);

        Self::replace(content, &self.anchor(&url), &escape_html(&url))
    }

    fn parse_outgoing_text(
        &self,
        message_id: i64,
        content: &str,
        _destination: &str,
        recipient: Option<&Recipient>,
    ) -> String {
        let Some(uid) = self.view_uid(recipient) else {
            return Self::replace(content, "", "");
        };
        let url = self.links.view_url(message_id, uid);

        Self::replace(content, &format!("{} {}", self.link_text, url), &url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::links::PageRouting;

    fn links() -> LinkBuilder {
        LinkBuilder::new("http://example.com/lists/", PageRouting::LegacyFile)
    }

    fn recipient() -> Recipient {
        Recipient::new(1, "abc123", "a@example.com")
    }

    struct Redirect(&'static str);

    impl RenderHook for Redirect {
        fn name(&self) -> &str {
            "redirect"
        }

        fn final_destination_email(
            &self,
            _message_id: i64,
            _attributes: &BTreeMap<String, String>,
            email: &str,
        ) -> String {
            format!("{}+{}", self.0, email)
        }

        fn parse_outgoing_html(
            &self,
            _message_id: i64,
            content: &str,
            destination: &str,
            _recipient: Option<&Recipient>,
        ) -> String {
            format!("{}<{}:{}>", content, self.0, destination)
        }
    }

    #[test]
    fn test_view_browser_html() {
        let hook = ViewBrowserHook::new(links(), "View in browser", r#"class="vb""#, false);
        let recipient = recipient();

        let result = hook.parse_outgoing_html(
            5,
            "[VIEWBROWSER] | [viewbrowserurl]",
            "a@example.com",
            Some(&recipient),
        );

        assert_eq!(
            result,
            concat!(
                r#"<a href="http://example.com/lists/view.php?m=5&amp;uid=abc123" class="vb">View in browser</a>"#,
                " | http://example.com/lists/view.php?m=5&amp;uid=abc123"
            )
        );
    }

    #[test]
    fn test_view_browser_text() {
        let hook = ViewBrowserHook::new(links(), "View in browser", "", false);
        let recipient = recipient();

        let result =
            hook.parse_outgoing_text(5, "[VIEWBROWSER]\n[VIEWBROWSERURL]", "", Some(&recipient));

        assert_eq!(
            result,
            "View in browser http://example.com/lists/view.php?m=5&uid=abc123\nhttp://example.com/lists/view.php?m=5&uid=abc123"
        );
    }

    #[test]
    fn test_view_browser_removed_without_recipient() {
        let hook = ViewBrowserHook::new(links(), "View", "", false);
        let result = hook.parse_outgoing_html(5, "a[VIEWBROWSER]b[VIEWBROWSERURL]c", "", None);
        assert_eq!(result, "abc");
    }

    #[test]
    fn test_view_browser_anonymous_link() {
        let hook = ViewBrowserHook::new(links(), "View", "", true);
        let result = hook.parse_outgoing_html(5, "[VIEWBROWSERURL]", "", None);
        assert_eq!(result, "http://example.com/lists/view.php?m=5");
    }

    #[test]
    fn test_registry_folds_in_order() {
        let mut registry = HookRegistry::new();
        registry.register(Arc::new(Redirect("first")));
        registry.register(Arc::new(Redirect("second")));

        let destination = registry.final_destination_email(1, &BTreeMap::new(), "a@example.com");
        assert_eq!(destination, "second+first+a@example.com");

        let content = registry.parse_outgoing_html(1, "x".to_string(), "d", None);
        assert_eq!(content, "x<first:d><second:d>");
    }

    #[test]
    fn test_registry_text_part() {
        let mut registry = HookRegistry::new();
        registry.register(Arc::new(ViewBrowserHook::new(links(), "Online", "", false)));
        let recipient = recipient();

        let text = registry.parse_outgoing_text(
            5,
            "Hello\n[VIEWBROWSERURL]".to_string(),
            "a@example.com",
            Some(&recipient),
        );
        assert_eq!(text, "Hello\nhttp://example.com/lists/view.php?m=5&uid=abc123");
    }

    #[test]
    fn test_registry_from_names_skips_unknown() {
        let available: Vec<Arc<dyn RenderHook>> = vec![
            Arc::new(ViewBrowserHook::new(links(), "View", "", false)),
            Arc::new(Redirect("r")),
        ];
        let names = vec![
            "redirect".to_string(),
            "ContentAreas".to_string(),
            "view_browser".to_string(),
        ];

        let registry = HookRegistry::from_names(&names, &available);
        assert_eq!(registry.names(), vec!["redirect", "view_browser"]);
    }
}
