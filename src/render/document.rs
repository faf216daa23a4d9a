//! Structural rewrites applied to assembled content.
//!
//! - Template image references become absolute image-page URLs
//! - Outbound links are wrapped for click tracking (personalised renders)
//! - A `<title>` and the default style block are placed in the head
//!
//! No placeholder substitution happens at this stage.

use std::cell::Cell;

use lol_html::errors::RewritingError;
use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, RewriteStrSettings};
use thiserror::Error;

use crate::store::TemplateImageRef;

use super::links::LinkBuilder;
use super::markup::escape_html;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Rewrite(#[from] RewritingError),
}

/// Inputs of the finalizing pass
#[derive(Debug, Clone, Copy)]
pub struct DocumentOptions<'a> {
    pub message_id: i64,

    /// Images of the message's template
    pub images: &'a [TemplateImageRef],

    /// Recipient token to attribute clicks to; `None` disables wrapping
    pub click_track_uid: Option<&'a str>,

    pub subject: &'a str,

    /// Style markup for the head, may be empty
    pub styles: &'a str,
}

#[derive(Debug, Default)]
struct Structure {
    html: bool,
    head: bool,
    body: bool,
    title: bool,
}

fn scan_structure(content: &str) -> Result<Structure, DocumentError> {
    let html = Cell::new(false);
    let head = Cell::new(false);
    let body = Cell::new(false);
    let title = Cell::new(false);

    rewrite_str(
        content,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("html", |_el| {
                    html.set(true);
                    Ok(())
                }),
                element!("head", |_el| {
                    head.set(true);
                    Ok(())
                }),
                element!("body", |_el| {
                    body.set(true);
                    Ok(())
                }),
                element!("title", |_el| {
                    title.set(true);
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )?;

    Ok(Structure {
        html: html.get(),
        head: head.get(),
        body: body.get(),
        title: title.get(),
    })
}

fn is_relative_reference(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    !(lower.contains("://")
        || lower.starts_with("//")
        || lower.starts_with('/')
        || lower.starts_with("data:")
        || lower.starts_with("cid:"))
}

/// Template image referenced by `src`, matched on the full relative path
/// or on its last segment
fn find_image<'a>(images: &'a [TemplateImageRef], src: &str) -> Option<&'a TemplateImageRef> {
    let src = src.trim();
    if src.is_empty() || !is_relative_reference(src) {
        return None;
    }

    let basename = src.rsplit('/').next().unwrap_or(src);
    images
        .iter()
        .find(|image| image.filename == src)
        .or_else(|| images.iter().find(|image| image.filename == basename))
}

fn is_outbound(href: &str) -> bool {
    let lower = href.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn attribute_value(url: &str) -> String {
    url.replace('&', "&amp;")
}

fn head_markup(structure: &Structure, subject: &str, styles: &str) -> String {
    let mut head = String::new();
    if !structure.title {
        head.push_str(&format!("<title>{}</title>", escape_html(subject)));
    }
    head.push_str(styles);
    head
}

/// Apply the structural rewrites to `content`
pub fn finalize(
    links: &LinkBuilder,
    content: &str,
    options: &DocumentOptions<'_>,
) -> Result<String, DocumentError> {
    let structure = scan_structure(content)?;
    let head = head_markup(&structure, options.subject, options.styles);

    let mut handlers = vec![element!("img[src]", |el| {
        if let Some(src) = el.get_attribute("src") {
            if let Some(image) = find_image(options.images, &src) {
                let url = links.image_url(options.message_id, image.id);
                el.set_attribute("src", &attribute_value(&url))?;
            }
        }
        Ok(())
    })];

    if let Some(uid) = options.click_track_uid {
        handlers.push(element!("a[href]", move |el| {
            if let Some(href) = el.get_attribute("href") {
                let target = href.trim().replace("&amp;", "&");
                if is_outbound(&target) && !links.is_click_track_url(&target) {
                    let tracked = links.click_track_url(options.message_id, uid, &target);
                    el.set_attribute("href", &attribute_value(&tracked))?;
                }
            }
            Ok(())
        }));
    }

    if structure.head {
        handlers.push(element!("head", |el| {
            el.prepend(&head, ContentType::Html);
            Ok(())
        }));
    } else if structure.html {
        handlers.push(element!("html", |el| {
            el.prepend(&format!("<head>{}</head>", head), ContentType::Html);
            Ok(())
        }));
    } else if structure.body {
        handlers.push(element!("body", |el| {
            el.before(&format!("<head>{}</head>", head), ContentType::Html);
            Ok(())
        }));
    }

    let rewritten = rewrite_str(
        content,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::new()
        },
    )?;

    if structure.html || structure.head {
        return Ok(rewritten);
    }
    if structure.body {
        return Ok(format!("<html>{}</html>", rewritten));
    }

    Ok(format!(
        "<html><head>{}</head><body>{}</body></html>",
        head, rewritten
    ))
}
