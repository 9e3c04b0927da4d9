//! Message text to display markup.

use chrono::{DateTime, Local, TimeZone, Utc};
use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;
use url::Url;

fn link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:https?|ftp|file)://[-A-Z0-9+&@#/%?=~_|!:,.;]*[-A-Z0-9+&@#/%=~_|]")
            .expect("Invalid regex")
    })
}

/// Escapes the text and turns `http`, `https`, `ftp` and `file` URLs into
/// anchors labelled with their host.
#[must_use]
pub fn linkify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for found in link_regex().find_iter(text) {
        let href = found.as_str();

        out.push_str(&html_escape::encode_text(&text[last..found.start()]));
        let _ = write!(
            out,
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
            html_escape::encode_double_quoted_attribute(href),
            html_escape::encode_text(&link_label(href)),
        );
        last = found.end();
    }

    out.push_str(&html_escape::encode_text(&text[last..]));
    out
}

fn link_label(href: &str) -> String {
    Url::parse(href)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| href.to_string())
}

/// `HH:MM` in the local timezone.
#[must_use]
pub fn format_time(timestamp: &DateTime<Utc>) -> String {
    format_time_in(timestamp, &Local)
}

#[must_use]
pub fn format_time_in<Tz: TimeZone>(timestamp: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    timestamp.with_timezone(tz).format("%H:%M").to_string()
}
