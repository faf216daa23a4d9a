//! System placeholder values: subscription management links, forwarding,
//! message and site details.
//!
//! Each `...url` entry is the raw link; the bare name wraps it in an anchor.

use crate::store::Message;

use super::assembler::RenderConfig;
use super::links::query_separator;
use super::markup::escape_html;
use super::placeholder::PlaceholderSet;

fn anchor(url: &str, text: &str) -> String {
    format!(r#"<a href="{}">{}</a>"#, url, text)
}

/// `url` followed by an HTML-escaped separator and `query`
fn with_query(url: &str, query: &str) -> String {
    format!("{}{}{}", url, escape_html(query_separator(url)), query)
}

fn forward_form(url: &str, uid: &str, message_id: i64, submit: &str) -> String {
    format!(
        r#"<form method="get" action="{url}" name="forwardform" class="forwardform">
    <input type="hidden" name="uid" value="{uid}" />
    <input type="hidden" name="mid" value="{message_id}" />
    <input type="hidden" name="p" value="forward" />
    <input type=text name="email" value="" class="forwardinput" />
    <input name="Send" type="submit" value="{submit}" class="forwardsubmit"/>
</form>"#
    )
}

/// Compute the system placeholders for one render
pub fn system_placeholders(
    config: &RenderConfig,
    uid: &str,
    email: &str,
    message: &Message,
) -> PlaceholderSet {
    let urls = &config.urls;
    let mut p = PlaceholderSet::new();

    let unsubscribe_url = with_query(&urls.unsubscribe, &format!("uid={}", uid));
    p.insert("unsubscribe", anchor(&unsubscribe_url, &config.unsubscribe_text));
    p.insert("unsubscribeurl", unsubscribe_url);

    let blacklist_url = with_query(&urls.blacklist, &format!("email={}", email));
    p.insert("blacklist", anchor(&blacklist_url, &config.unsubscribe_text));
    p.insert("blacklisturl", blacklist_url);

    p.insert("subscribe", anchor(&urls.subscribe, &config.this_link_text));
    p.insert("subscribeurl", urls.subscribe.clone());

    let forward_url = with_query(
        &urls.forward,
        &format!("uid={}&amp;mid={}", uid, message.id),
    );
    p.insert("forward", anchor(&forward_url, &config.this_link_text));
    p.insert("forwardurl", forward_url);
    p.insert(
        "forwardform",
        forward_form(&urls.forward, uid, message.id, &config.forward_text),
    );

    let preferences_url = with_query(&urls.preferences, &format!("uid={}", uid));
    p.insert("preferences", anchor(&preferences_url, &config.this_link_text));
    p.insert("preferencesurl", preferences_url);

    p.insert(
        "confirmationurl",
        with_query(&urls.confirmation, &format!("uid={}", uid)),
    );

    p.insert("messageid", message.id.to_string());
    p.insert("website", config.website.clone());
    p.insert("domain", config.domain.clone());
    p.insert("subject", message.subject.clone());
    p.insert("fromemail", message.from_email.clone());
    p
}
