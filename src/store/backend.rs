//! Backend trait for campaign data access.
//!
//! The renderer only reads: messages, templates, recipients, attribute
//! definitions and template images. Storage is owned elsewhere.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use super::types::{Message, Recipient, Template, TemplateImage, TemplateImageRef};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// PostgreSQL operation failed
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Backend cannot serve requests
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the list-management data.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Backend type identifier
    fn backend_type(&self) -> &'static str;

    /// Load a message by id.
    async fn message(&self, id: i64) -> Result<Option<Message>, StoreError>;

    /// Load a template by id.
    async fn template(&self, id: i64) -> Result<Option<Template>, StoreError>;

    /// Load a recipient, with attribute values, by unique token.
    async fn recipient_by_uid(&self, uid: &str) -> Result<Option<Recipient>, StoreError>;

    /// Names of every defined attribute.
    async fn attribute_names(&self) -> Result<Vec<String>, StoreError>;

    /// Every defined attribute mapped to the recipient's value, or to an
    /// empty string when there is no recipient or no value.
    async fn attribute_values(
        &self,
        recipient: Option<&Recipient>,
    ) -> Result<BTreeMap<String, String>, StoreError> {
        let mut values: BTreeMap<String, String> = self
            .attribute_names()
            .await?
            .into_iter()
            .map(|name| (name, String::new()))
            .collect();

        if let Some(recipient) = recipient {
            values.extend(
                recipient
                    .attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone())),
            );
        }
        Ok(values)
    }

    /// Images belonging to a template.
    async fn template_images(&self, template_id: i64)
        -> Result<Vec<TemplateImageRef>, StoreError>;

    /// Load a template image by id.
    async fn template_image(&self, id: i64) -> Result<Option<TemplateImage>, StoreError>;
}
