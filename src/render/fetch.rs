//! Remote content retrieval for messages sent from a URL.
//!
//! A single attempt is made per render; timeouts are enforced by the HTTP
//! client, not by the assembler.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::FetchConfig;
use crate::metrics::FetchMetrics;
use crate::store::Recipient;

use super::placeholder::{parse_placeholders, PlaceholderSet};

/// Errors that can occur while fetching remote content.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Empty response from {0}")]
    Empty(String),
}

/// Retrieves message content from a remote URL
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the body at `url`, personalised for `recipient`
    async fn fetch(&self, url: &str, recipient: Option<&Recipient>) -> Result<String, FetchError>;
}

fn encode_component(value: &str) -> String {
    let pair: &[(&str, &str)] = &[("v", value)];
    serde_urlencoded::to_string(pair)
        .map(|pair| pair[2..].to_string())
        .unwrap_or_default()
}

/// Substitute recipient fields and attributes into `url`, URL-encoded.
///
/// Anonymous renders substitute empty values.
pub fn personalise_url(url: &str, recipient: Option<&Recipient>) -> String {
    let mut values = PlaceholderSet::new();
    let email = recipient.map(|r| r.email.as_str()).unwrap_or("");
    let uid = recipient.map(|r| r.uid.as_str()).unwrap_or("");
    values.insert("email", encode_component(email));
    values.insert("uniqid", encode_component(uid));

    if let Some(recipient) = recipient {
        for (name, value) in &recipient.attributes {
            values.insert(name, encode_component(value));
        }
    }

    parse_placeholders(url, &values)
}

/// `ContentFetcher` over HTTP
pub struct HttpContentFetcher {
    client: reqwest::Client,
}

impl HttpContentFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(FetchError::Empty(url.to_string()));
        }
        Ok(body)
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    #[tracing::instrument(name = "render.fetch_remote", skip(self, recipient))]
    async fn fetch(&self, url: &str, recipient: Option<&Recipient>) -> Result<String, FetchError> {
        let url = personalise_url(url, recipient);

        match self.get(&url).await {
            Ok(body) => {
                FetchMetrics::record_success();
                tracing::debug!(url = %url, bytes = body.len(), "Fetched remote content");
                Ok(body)
            }
            Err(e) => {
                FetchMetrics::record_failure();
                tracing::warn!(url = %url, error = %e, "Remote content fetch failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personalise_url() {
        let recipient =
            Recipient::new(1, "abc123", "a+b@example.com").with_attribute("City", "São Paulo");

        let url = personalise_url(
            "http://example.com/news?e=[EMAIL]&u=[uniqid]&c=[CITY]&x=[OTHER]",
            Some(&recipient),
        );
        assert_eq!(
            url,
            "http://example.com/news?e=a%2Bb%40example.com&u=abc123&c=S%C3%A3o+Paulo&x=[OTHER]"
        );
    }

    #[test]
    fn test_personalise_url_anonymous() {
        let url = personalise_url("http://example.com/news?e=[EMAIL]", None);
        assert_eq!(url, "http://example.com/news?e=");
    }

    #[test]
    fn test_fetcher_builds_from_config() {
        assert!(HttpContentFetcher::new(&FetchConfig::default()).is_ok());
    }
}
