//! Placeholder substitution engine.
//!
//! Tokens are bracket delimited (`[FOOTER]`) and matched without regard to
//! ASCII case. Single-token operations report how many occurrences were
//! replaced so callers can decide on a fallback. The bulk pass replaces
//! every mapped name in one traversal and leaves unmapped tokens as they
//! are.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::markup::add_html_footer;

pub const CONTENT: &str = "CONTENT";
pub const SIGNATURE: &str = "SIGNATURE";
pub const FOOTER: &str = "FOOTER";
pub const USERTRACK: &str = "USERTRACK";

lazy_static! {
    /// `[name]` or `[name%%fallback]`
    static ref PLACEHOLDER: Regex = Regex::new(r"\[([^\[\]%]+)(?:%%([^\[\]]*))?\]").unwrap();
}

/// Named values for a bulk pass, matched case-insensitively
#[derive(Debug, Clone, Default)]
pub struct PlaceholderSet {
    values: HashMap<String, String>,
}

impl PlaceholderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing any earlier value for the name
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.values
            .insert(name.as_ref().to_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for PlaceholderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = PlaceholderSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

fn replace_matches(
    content: &str,
    token: &str,
    replacement: &str,
    limit: Option<usize>,
) -> (String, usize) {
    let needle = format!("[{}]", token).to_ascii_lowercase();
    // ASCII lowercasing keeps byte offsets valid for `content`
    let haystack = content.to_ascii_lowercase();

    let mut result = String::with_capacity(content.len());
    let mut last = 0;
    let mut count = 0;

    for (pos, matched) in haystack.match_indices(&needle) {
        if limit.is_some_and(|max| count >= max) {
            break;
        }
        result.push_str(&content[last..pos]);
        result.push_str(replacement);
        last = pos + matched.len();
        count += 1;
    }
    result.push_str(&content[last..]);

    (result, count)
}

/// Replace every occurrence of `[token]`
pub fn replace_token(content: &str, token: &str, replacement: &str) -> (String, usize) {
    replace_matches(content, token, replacement, None)
}

/// Replace the first occurrence of `[token]` only
pub fn replace_token_once(content: &str, token: &str, replacement: &str) -> (String, usize) {
    replace_matches(content, token, replacement, Some(1))
}

/// Remove every occurrence of `[token]`
pub fn remove_token(content: &str, token: &str) -> String {
    replace_token(content, token, "").0
}

/// Replace `[token]`; when it does not occur and `value` is non-empty, add
/// `miss_prefix` followed by `value` at the end of the content.
pub fn replace_or_append(
    content: &str,
    token: &str,
    value: &str,
    miss_prefix: &str,
) -> (String, usize) {
    let (replaced, count) = replace_token(content, token, value);

    if count == 0 && !value.is_empty() {
        let footer = format!("{}{}", miss_prefix, value);
        return (add_html_footer(&replaced, &footer), 0);
    }
    (replaced, count)
}

/// Replace every placeholder named in `values` in a single traversal.
///
/// `[name%%fallback]` takes the fallback when the mapped value is empty.
/// Replacement text is not scanned again.
pub fn parse_placeholders(content: &str, values: &PlaceholderSet) -> String {
    if values.is_empty() {
        return content.to_string();
    }

    PLACEHOLDER
        .replace_all(content, |caps: &Captures<'_>| {
            let Some(value) = values.get(&caps[1]) else {
                return caps[0].to_string();
            };

            match caps.get(2) {
                Some(fallback) if value.is_empty() => fallback.as_str().to_string(),
                _ => value.to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_token_case_insensitive() {
        for token in ["[Footer]", "[FOOTER]", "[footer]"] {
            let content = format!("a {} b", token);
            let (result, count) = replace_token(&content, FOOTER, "F");
            assert_eq!(result, "a F b");
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn test_replace_token_all_occurrences() {
        let (result, count) = replace_token("[x] and [X]", "x", "y");
        assert_eq!(result, "y and y");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_replace_token_once() {
        let (result, count) = replace_token_once("[USERTRACK][usertrack]", USERTRACK, "<img>");
        assert_eq!(result, "<img>[usertrack]");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_replacement_with_dollar_signs_is_literal() {
        let (result, _) = replace_token("price [P]", "P", "$1.00");
        assert_eq!(result, "price $1.00");
    }

    #[test]
    fn test_multibyte_content_around_token() {
        let (result, count) = replace_token("héllo [FOOTER] wörld", FOOTER, "ß");
        assert_eq!(result, "héllo ß wörld");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_footer_appended_on_miss() {
        let (result, count) = replace_or_append("<p>Body</p>", FOOTER, "Bye", "<br />");
        assert_eq!(result, "<p>Body</p><br />Bye");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_footer_not_appended_when_present() {
        let (result, count) = replace_or_append("<p>Body</p>[FOOTER]", FOOTER, "Bye", "<br />");
        assert_eq!(result, "<p>Body</p>Bye");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_empty_value_never_appended() {
        let (result, count) = replace_or_append("<p>Body</p>", SIGNATURE, "", "");
        assert_eq!(result, "<p>Body</p>");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_bulk_pass() {
        let values: PlaceholderSet = [("email", "a@example.com"), ("First Name", "Ann")]
            .into_iter()
            .collect();

        let result = parse_placeholders("[EMAIL] / [first name] / [UNKNOWN]", &values);
        assert_eq!(result, "a@example.com / Ann / [UNKNOWN]");
    }

    #[test]
    fn test_bulk_pass_fallback() {
        let values: PlaceholderSet = [("name", ""), ("city", "Oslo")].into_iter().collect();

        assert_eq!(
            parse_placeholders("Hi [NAME%%friend] from [CITY%%nowhere]", &values),
            "Hi friend from Oslo"
        );
        assert_eq!(
            parse_placeholders("[MISSING%%x]", &values),
            "[MISSING%%x]"
        );
    }

    #[test]
    fn test_bulk_pass_does_not_rescan_values() {
        let values: PlaceholderSet = [("a", "[B]"), ("b", "no")].into_iter().collect();
        assert_eq!(parse_placeholders("[A]", &values), "[B]");
    }

    #[test]
    fn test_later_insert_overwrites() {
        let mut values = PlaceholderSet::new();
        values.insert("Subject", "first");
        values.insert("SUBJECT", "second");
        assert_eq!(values.len(), 1);
        assert_eq!(values.get("subject"), Some("second"));
    }
}
