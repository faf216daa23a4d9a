//! Outward-facing URLs: view-in-browser page, template images, tracking.
//!
//! Hosts older than [`PUBLIC_PAGE_VERSION`] serve the view and image pages
//! as standalone files below the root URL. Newer hosts route every public
//! page through the root with `p` (page) and `pi` (plugin) parameters.

use std::cmp::Ordering;

/// Name the public pages are registered under
pub const PLUGIN_NAME: &str = "ViewBrowserPlugin";

/// First host version serving public plugin pages
pub const PUBLIC_PAGE_VERSION: &str = "3.0.7";

pub const VIEW_PAGE: &str = "view";
pub const IMAGE_PAGE: &str = "image";
pub const VIEW_FILE: &str = "view.php";
pub const IMAGE_FILE: &str = "image.php";

const USERTRACK_FILE: &str = "ut.php";
const LINKTRACK_FILE: &str = "lt.php";

/// How public pages are addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRouting {
    /// `{root}view.php?m=..`
    LegacyFile,
    /// `{root}?m=..&p=view&pi=ViewBrowserPlugin`
    PublicPage,
}

impl PageRouting {
    /// Select the routing for an installed host version
    pub fn for_host_version(version: &str) -> Self {
        if compare_versions(version, PUBLIC_PAGE_VERSION) == Ordering::Less {
            PageRouting::LegacyFile
        } else {
            PageRouting::PublicPage
        }
    }
}

/// Compare dotted version strings numerically.
///
/// Each component contributes its leading digits; missing components count
/// as zero, so `3.1` equals `3.1.0`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    fn parts(version: &str) -> Vec<u64> {
        version
            .trim()
            .split(['.', '-', '+'])
            .map(|part| {
                let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().unwrap_or(0)
            })
            .collect()
    }

    let (left, right) = (parts(a), parts(b));
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Separator for appending a parameter to `url`
pub fn query_separator(url: &str) -> &'static str {
    if url.contains('?') {
        "&"
    } else {
        "?"
    }
}

fn build_query(params: &[(&str, String)]) -> String {
    serde_urlencoded::to_string(params).unwrap_or_default()
}

/// Builds links below the root URL of the installation
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    root_url: String,
    routing: PageRouting,
}

impl LinkBuilder {
    /// `root_url` must end with `/`
    pub fn new(root_url: impl Into<String>, routing: PageRouting) -> Self {
        Self {
            root_url: root_url.into(),
            routing,
        }
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    pub fn routing(&self) -> PageRouting {
        self.routing
    }

    fn page_url(&self, file: &str, page: &str, mut params: Vec<(&str, String)>) -> String {
        let mut url = self.root_url.clone();

        match self.routing {
            PageRouting::LegacyFile => url.push_str(file),
            PageRouting::PublicPage => {
                params.push(("p", page.to_string()));
                params.push(("pi", PLUGIN_NAME.to_string()));
            }
        }

        format!("{}?{}", url, build_query(&params))
    }

    /// View-in-browser page; the recipient token is added only when non-empty
    pub fn view_url(&self, message_id: i64, uid: &str) -> String {
        let mut params = vec![("m", message_id.to_string())];

        if !uid.is_empty() {
            params.push(("uid", uid.to_string()));
        }

        self.page_url(VIEW_FILE, VIEW_PAGE, params)
    }

    /// Image-serving page for a stored template image
    pub fn image_url(&self, message_id: i64, image_id: i64) -> String {
        let params = vec![("m", message_id.to_string()), ("id", image_id.to_string())];
        self.page_url(IMAGE_FILE, IMAGE_PAGE, params)
    }

    /// Open-tracking pixel
    pub fn tracking_pixel_url(&self, message_id: i64, uid: &str) -> String {
        let params = [("u", uid.to_string()), ("m", message_id.to_string())];
        format!("{}{}?{}", self.root_url, USERTRACK_FILE, build_query(&params))
    }

    /// Click-tracking redirect for `target`
    pub fn click_track_url(&self, message_id: i64, uid: &str, target: &str) -> String {
        let params = [
            ("m", message_id.to_string()),
            ("uid", uid.to_string()),
            ("url", target.to_string()),
        ];
        format!("{}{}?{}", self.root_url, LINKTRACK_FILE, build_query(&params))
    }

    /// Whether `url` already points at the click-tracking redirect
    pub fn is_click_track_url(&self, url: &str) -> bool {
        url.starts_with(&format!("{}{}", self.root_url, LINKTRACK_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "http://example.com/lists/";

    #[test]
    fn test_version_comparison() {
        assert_eq!(compare_versions("3.0.6", "3.0.7"), Ordering::Less);
        assert_eq!(compare_versions("3.0.7", "3.0.7"), Ordering::Equal);
        assert_eq!(compare_versions("3.0.10", "3.0.7"), Ordering::Greater);
        assert_eq!(compare_versions("3.1", "3.1.0"), Ordering::Equal);
        assert_eq!(compare_versions("3.3.1-RC1", "3.3"), Ordering::Greater);
        assert_eq!(compare_versions("2.10.19", "3.0.7"), Ordering::Less);
    }

    #[test]
    fn test_routing_selected_by_version() {
        assert_eq!(PageRouting::for_host_version("3.0.6"), PageRouting::LegacyFile);
        assert_eq!(PageRouting::for_host_version("3.0.7"), PageRouting::PublicPage);
        assert_eq!(PageRouting::for_host_version("3.6.15"), PageRouting::PublicPage);
    }

    #[test]
    fn test_view_url_public_page() {
        let links = LinkBuilder::new(ROOT, PageRouting::PublicPage);
        assert_eq!(
            links.view_url(5, "abc123"),
            "http://example.com/lists/?m=5&uid=abc123&p=view&pi=ViewBrowserPlugin"
        );
    }

    #[test]
    fn test_view_url_legacy_file() {
        let links = LinkBuilder::new(ROOT, PageRouting::LegacyFile);
        assert_eq!(
            links.view_url(5, "abc123"),
            "http://example.com/lists/view.php?m=5&uid=abc123"
        );
    }

    #[test]
    fn test_view_url_without_uid() {
        let links = LinkBuilder::new(ROOT, PageRouting::LegacyFile);
        assert_eq!(links.view_url(7, ""), "http://example.com/lists/view.php?m=7");

        let links = LinkBuilder::new(ROOT, PageRouting::PublicPage);
        assert!(!links.view_url(7, "").contains("uid="));
    }

    #[test]
    fn test_image_url() {
        let links = LinkBuilder::new(ROOT, PageRouting::PublicPage);
        assert_eq!(
            links.image_url(5, 12),
            "http://example.com/lists/?m=5&id=12&p=image&pi=ViewBrowserPlugin"
        );

        let links = LinkBuilder::new(ROOT, PageRouting::LegacyFile);
        assert_eq!(
            links.image_url(5, 12),
            "http://example.com/lists/image.php?m=5&id=12"
        );
    }

    #[test]
    fn test_tracking_urls() {
        let links = LinkBuilder::new(ROOT, PageRouting::PublicPage);
        assert_eq!(
            links.tracking_pixel_url(5, "abc123"),
            "http://example.com/lists/ut.php?u=abc123&m=5"
        );

        let tracked = links.click_track_url(5, "abc123", "https://a.example/x?y=1");
        assert_eq!(
            tracked,
            "http://example.com/lists/lt.php?m=5&uid=abc123&url=https%3A%2F%2Fa.example%2Fx%3Fy%3D1"
        );
        assert!(links.is_click_track_url(&tracked));
        assert!(!links.is_click_track_url("https://a.example/"));
    }

    #[test]
    fn test_query_separator() {
        assert_eq!(query_separator("http://example.com/?p=unsubscribe"), "&");
        assert_eq!(query_separator("http://example.com/unsubscribe"), "?");
    }
}
