//! In-memory campaign store using DashMap.
//!
//! Records live only for the lifetime of the process. Used for the
//! `memory` backend and for tests.

use std::sync::RwLock;

use async_trait::async_trait;
use dashmap::DashMap;

use super::backend::{CampaignStore, StoreError};
use super::types::{Message, Recipient, Template, TemplateImage, TemplateImageRef};

/// In-memory campaign store.
#[derive(Default)]
pub struct MemoryCampaignStore {
    messages: DashMap<i64, Message>,
    templates: DashMap<i64, Template>,
    recipients: DashMap<String, Recipient>,
    /// Attribute names in definition order
    attributes: RwLock<Vec<String>>,
    images: DashMap<i64, TemplateImage>,
}

impl MemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_message(&self, message: Message) {
        self.messages.insert(message.id, message);
    }

    pub fn insert_template(&self, template: Template) {
        self.templates.insert(template.id, template);
    }

    /// Insert a recipient; its attribute names become defined attributes.
    pub fn insert_recipient(&self, recipient: Recipient) {
        for name in recipient.attributes.keys() {
            self.define_attribute(name.clone());
        }
        self.recipients.insert(recipient.uid.clone(), recipient);
    }

    pub fn define_attribute(&self, name: impl Into<String>) {
        let name = name.into();
        if let Ok(mut names) = self.attributes.write() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    pub fn insert_template_image(&self, image: TemplateImage) {
        self.images.insert(image.id, image);
    }
}

#[async_trait]
impl CampaignStore for MemoryCampaignStore {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn message(&self, id: i64) -> Result<Option<Message>, StoreError> {
        Ok(self.messages.get(&id).map(|m| m.clone()))
    }

    async fn template(&self, id: i64) -> Result<Option<Template>, StoreError> {
        Ok(self.templates.get(&id).map(|t| t.clone()))
    }

    async fn recipient_by_uid(&self, uid: &str) -> Result<Option<Recipient>, StoreError> {
        Ok(self.recipients.get(uid).map(|r| r.clone()))
    }

    async fn attribute_names(&self) -> Result<Vec<String>, StoreError> {
        self.attributes
            .read()
            .map(|names| names.clone())
            .map_err(|_| StoreError::Unavailable("attribute list poisoned".to_string()))
    }

    async fn template_images(
        &self,
        template_id: i64,
    ) -> Result<Vec<TemplateImageRef>, StoreError> {
        let mut refs: Vec<TemplateImageRef> = self
            .images
            .iter()
            .filter(|entry| entry.value().template_id == template_id)
            .map(|entry| TemplateImageRef {
                id: entry.value().id,
                filename: entry.value().filename.clone(),
            })
            .collect();
        refs.sort_by_key(|r| r.id);
        Ok(refs)
    }

    async fn template_image(&self, id: i64) -> Result<Option<TemplateImage>, StoreError> {
        Ok(self.images.get(&id).map(|i| i.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: i64, template_id: i64, filename: &str) -> TemplateImage {
        TemplateImage {
            id,
            template_id,
            filename: filename.to_string(),
            mime_type: "image/gif".to_string(),
            data: String::new(),
        }
    }

    #[tokio::test]
    async fn test_message_lookup() {
        let store = MemoryCampaignStore::new();
        store.insert_message(Message::new(5, "Subject", "Body"));

        assert_eq!(store.message(5).await.unwrap().unwrap().subject, "Subject");
        assert!(store.message(6).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recipient_attributes_are_defined() {
        let store = MemoryCampaignStore::new();
        store.define_attribute("Country");
        store.insert_recipient(
            Recipient::new(1, "abc", "a@example.com")
                .with_attribute("First Name", "Ann")
                .with_attribute("Country", "NZ"),
        );

        let names = store.attribute_names().await.unwrap();
        assert_eq!(names, vec!["Country".to_string(), "First Name".to_string()]);
    }

    #[tokio::test]
    async fn test_attribute_values_cover_every_name() {
        let store = MemoryCampaignStore::new();
        store.define_attribute("Country");
        let recipient = Recipient::new(1, "abc", "a@example.com").with_attribute("City", "Oslo");
        store.insert_recipient(recipient.clone());

        let anonymous = store.attribute_values(None).await.unwrap();
        assert_eq!(anonymous.len(), 2);
        assert!(anonymous.values().all(|v| v.is_empty()));

        let values = store.attribute_values(Some(&recipient)).await.unwrap();
        assert_eq!(values["City"], "Oslo");
        assert_eq!(values["Country"], "");
    }

    #[tokio::test]
    async fn test_template_images_filtered_by_template() {
        let store = MemoryCampaignStore::new();
        store.insert_template_image(image(2, 1, "b.gif"));
        store.insert_template_image(image(1, 1, "a.gif"));
        store.insert_template_image(image(3, 9, "c.gif"));

        let refs = store.template_images(1).await.unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].filename, "a.gif");
        assert_eq!(refs[1].id, 2);
    }
}
