//! Campaign records read by the renderer

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How the body of a campaign is obtained at send time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendMethod {
    /// Body is stored with the message
    #[default]
    Inline,
    /// Body is fetched from `send_url` when rendering
    RemoteUrl,
}

impl SendMethod {
    /// Parse the stored column value, anything unknown is treated as inline
    pub fn from_column(value: &str) -> Self {
        if value.eq_ignore_ascii_case("remoteurl") {
            SendMethod::RemoteUrl
        } else {
            SendMethod::Inline
        }
    }
}

/// A campaign message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,

    pub subject: String,

    /// Stored body, inserted at `[CONTENT]` when a template is used
    pub body: String,

    /// Template reference (optional)
    #[serde(default)]
    pub template_id: Option<i64>,

    #[serde(default)]
    pub footer: String,

    #[serde(default)]
    pub from_email: String,

    /// Whether the powered-by signature is applied
    #[serde(default = "default_signature")]
    pub signature: bool,

    #[serde(default)]
    pub send_method: SendMethod,

    /// Remote URL used in remote-fetch mode
    #[serde(default)]
    pub send_url: Option<String>,
}

fn default_signature() -> bool {
    true
}

impl Message {
    /// Create an inline message with the given id, subject and body
    pub fn new(id: i64, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            subject: subject.into(),
            body: body.into(),
            template_id: None,
            footer: String::new(),
            from_email: String::new(),
            signature: default_signature(),
            send_method: SendMethod::Inline,
            send_url: None,
        }
    }

    pub fn with_template(mut self, template_id: i64) -> Self {
        self.template_id = Some(template_id);
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = footer.into();
        self
    }

    pub fn with_from_email(mut self, from_email: impl Into<String>) -> Self {
        self.from_email = from_email.into();
        self
    }

    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.send_method = SendMethod::RemoteUrl;
        self.send_url = Some(url.into());
        self
    }

    pub fn without_signature(mut self) -> Self {
        self.signature = false;
        self
    }
}

/// A subscriber the message is personalised for.
///
/// `uid` and `email` are never empty for a stored recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub id: i64,

    /// Unique token used in links
    pub uid: String,

    pub email: String,

    /// Attribute values keyed by attribute name
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Recipient {
    pub fn new(id: i64, uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            uid: uid.into(),
            email: email.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// A campaign template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,

    /// Markup containing the `[CONTENT]` insertion marker
    pub body: String,
}

impl Template {
    /// Template body with stored escaped quotes restored
    pub fn unescaped_body(&self) -> String {
        self.body.replace("\\\"", "\"")
    }
}

/// Reference from a template to one of its stored images
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateImageRef {
    pub id: i64,

    /// Relative name as it appears in the template markup
    pub filename: String,
}

/// A stored template image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateImage {
    pub id: i64,

    pub template_id: i64,

    pub filename: String,

    /// MIME type, may be empty
    #[serde(default)]
    pub mime_type: String,

    /// Base64 encoded image bytes
    pub data: String,
}
