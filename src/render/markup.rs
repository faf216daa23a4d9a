//! Small markup helpers shared by the render stages

/// Escape text for use in HTML content or a quoted attribute value
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Insert `footer` before the closing body tag, or append it when the
/// content has none.
pub fn add_html_footer(content: &str, footer: &str) -> String {
    match content.to_ascii_lowercase().rfind("</body>") {
        Some(pos) => {
            let mut result = String::with_capacity(content.len() + footer.len());
            result.push_str(&content[..pos]);
            result.push_str(footer);
            result.push_str(&content[pos..]);
            result
        }
        None => format!("{}{}", content, footer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x?a=1&b=2">it's</a>"#),
            "&lt;a href=&quot;x?a=1&amp;b=2&quot;&gt;it&#039;s&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_footer_before_body_close() {
        assert_eq!(
            add_html_footer("<html><body>Hi</BODY></html>", "<p>F</p>"),
            "<html><body>Hi<p>F</p></BODY></html>"
        );
    }

    #[test]
    fn test_footer_appended_without_body() {
        assert_eq!(add_html_footer("Hi", "<p>F</p>"), "Hi<p>F</p>");
    }
}
