//! PostgreSQL-based campaign store.
//!
//! Reads the list-management tables directly. Every table name carries the
//! configured prefix (`phplist_` by default).
//!
//! Tables read:
//! - `{prefix}message` - id, subject, message, template, footer, fromemail,
//!   addsignature, sendmethod, sendurl
//! - `{prefix}template` - id, template
//! - `{prefix}templateimage` - id, template, filename, mimetype, data
//! - `{prefix}user_user` - id, uniqid, email
//! - `{prefix}user_attribute` - id, name, listorder
//! - `{prefix}user_user_attribute` - attributeid, userid, value
//!
//! Integer columns are `BIGINT`.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

use super::backend::{CampaignStore, StoreError};
use super::types::{Message, Recipient, SendMethod, Template, TemplateImage, TemplateImageRef};

type MessageRow = (
    i64,
    String,
    String,
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<bool>,
    Option<String>,
    Option<String>,
);

/// Open a connection pool from configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.pool_size)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .connect(&config.url)
        .await?;

    tracing::info!(
        pool_size = config.pool_size,
        "PostgreSQL connection pool created"
    );
    Ok(pool)
}

/// PostgreSQL-based campaign store.
pub struct PostgresCampaignStore {
    pool: PgPool,
    table_prefix: String,
}

impl PostgresCampaignStore {
    pub fn new(pool: PgPool, table_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            table_prefix: table_prefix.into(),
        }
    }

    fn table(&self, name: &str) -> String {
        format!("{}{}", self.table_prefix, name)
    }
}

#[async_trait]
impl CampaignStore for PostgresCampaignStore {
    fn backend_type(&self) -> &'static str {
        "postgres"
    }

    async fn message(&self, id: i64) -> Result<Option<Message>, StoreError> {
        let sql = format!(
            r#"
            SELECT id, subject, message, template, footer, fromemail,
                   addsignature, sendmethod, sendurl
            FROM {}
            WHERE id = $1
            "#,
            self.table("message")
        );

        let row: Option<MessageRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(
            |(id, subject, body, template_id, footer, from_email, signature, method, url)| {
                Message {
                    id,
                    subject,
                    body,
                    template_id: template_id.filter(|t| *t > 0),
                    footer: footer.unwrap_or_default(),
                    from_email: from_email.unwrap_or_default(),
                    signature: signature.unwrap_or(true),
                    send_method: method
                        .as_deref()
                        .map(SendMethod::from_column)
                        .unwrap_or_default(),
                    send_url: url.filter(|u| !u.is_empty()),
                }
            },
        ))
    }

    async fn template(&self, id: i64) -> Result<Option<Template>, StoreError> {
        let sql = format!("SELECT id, template FROM {} WHERE id = $1", self.table("template"));

        let row: Option<(i64, String)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id, body)| Template { id, body }))
    }

    async fn recipient_by_uid(&self, uid: &str) -> Result<Option<Recipient>, StoreError> {
        let sql = format!(
            "SELECT id, uniqid, email FROM {} WHERE uniqid = $1",
            self.table("user_user")
        );

        let row: Option<(i64, String, String)> = sqlx::query_as(&sql)
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        let Some((id, uid, email)) = row else {
            return Ok(None);
        };

        let sql = format!(
            r#"
            SELECT a.name, COALESCE(ua.value, '')
            FROM {} a
            LEFT JOIN {} ua ON ua.attributeid = a.id AND ua.userid = $1
            ORDER BY a.listorder, a.id
            "#,
            self.table("user_attribute"),
            self.table("user_user_attribute")
        );

        let values: Vec<(String, String)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        tracing::trace!(uid = %uid, attributes = values.len(), "Loaded recipient");

        Ok(Some(Recipient {
            id,
            uid,
            email,
            attributes: values.into_iter().collect(),
        }))
    }

    async fn attribute_names(&self) -> Result<Vec<String>, StoreError> {
        let sql = format!(
            "SELECT name FROM {} ORDER BY listorder, id",
            self.table("user_attribute")
        );

        let rows: Vec<(String,)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn template_images(
        &self,
        template_id: i64,
    ) -> Result<Vec<TemplateImageRef>, StoreError> {
        let sql = format!(
            "SELECT id, filename FROM {} WHERE template = $1 ORDER BY id",
            self.table("templateimage")
        );

        let rows: Vec<(i64, String)> = sqlx::query_as(&sql)
            .bind(template_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, filename)| TemplateImageRef { id, filename })
            .collect())
    }

    async fn template_image(&self, id: i64) -> Result<Option<TemplateImage>, StoreError> {
        let sql = format!(
            r#"
            SELECT id, template, filename, COALESCE(mimetype, ''), COALESCE(data, '')
            FROM {}
            WHERE id = $1
            "#,
            self.table("templateimage")
        );

        let row: Option<(i64, i64, String, String, String)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id, template_id, filename, mime_type, data)| TemplateImage {
            id,
            template_id,
            filename,
            mime_type,
            data,
        }))
    }
}
