//! Template image lookup for the image page.
//!
//! Stored images are base64 encoded. A missing or unreadable image is
//! answered with a 1x1 transparent PNG so already-sent campaigns never show
//! a broken image.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::metrics::ImageMetrics;
use crate::store::CampaignStore;

/// 1x1 transparent PNG
const PLACEHOLDER_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABAQMAAAAl21bKAAAABGdBTUEAALGPC/xhBQAAAAZQTFRF////AAAAVcLTfgAAAAF0Uk5TAEDm2GYAAAABYktHRACIBR1IAAAACXBIWXMAAAsSAAALEgHS3X78AAAAB3RJTUUH0gQCEx05cqKA8gAAAApJREFUeJxjYAAAAAIAAUivpHEAAAAASUVORK5CYII=";

pub const PLACEHOLDER_MIME: &str = "image/png";

/// Used when a stored image has no MIME type
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("A numeric template image id must be specified")]
    InvalidIdentifier(String),
}

/// Bytes and MIME type to return for an image request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageContent {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageContent {
    /// The transparent placeholder image
    pub fn placeholder() -> Self {
        Self {
            mime_type: PLACEHOLDER_MIME.to_string(),
            data: STANDARD.decode(PLACEHOLDER_PNG).unwrap_or_default(),
        }
    }
}

/// Validate a raw image identifier.
///
/// Only ASCII digits are accepted. Identifiers too large for a row id can
/// never match and yield `None`.
pub fn parse_image_id(raw: &str) -> Result<Option<i64>, ImageError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ImageError::InvalidIdentifier(raw.to_string()));
    }
    Ok(raw.parse().ok())
}

/// Resolve an image request against the store
pub async fn load_template_image(
    store: &dyn CampaignStore,
    raw_id: &str,
) -> Result<ImageContent, ImageError> {
    let id = match parse_image_id(raw_id) {
        Ok(id) => id,
        Err(e) => {
            ImageMetrics::record_rejected();
            return Err(e);
        }
    };

    let row = match id {
        Some(id) => match store.template_image(id).await {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(image_id = id, error = %e, "Template image lookup failed");
                None
            }
        },
        None => None,
    };

    let Some(row) = row else {
        ImageMetrics::record_placeholder();
        return Ok(ImageContent::placeholder());
    };

    match STANDARD.decode(row.data.trim()) {
        Ok(data) => {
            ImageMetrics::record_stored();
            let mime_type = if row.mime_type.is_empty() {
                DEFAULT_IMAGE_MIME.to_string()
            } else {
                row.mime_type
            };
            Ok(ImageContent { mime_type, data })
        }
        Err(e) => {
            tracing::warn!(image_id = row.id, error = %e, "Stored template image is not valid base64");
            ImageMetrics::record_placeholder();
            Ok(ImageContent::placeholder())
        }
    }
}
