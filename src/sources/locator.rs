use std::sync::LazyLock;

use regex::Regex;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^https?://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+(?:[A-Z]{2,6}\.?|[A-Z0-9-]{2,}\.?)",
        r"|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}",
        r"|\[?[A-F0-9]*:[A-F0-9:]+\]?)",
        r"(?::\d+)?",
        r"(?:/\S*)?$",
    ))
    .unwrap()
});

/// True for `http(s)` URLs with a real host.
pub fn is_http_url(text: &str) -> bool {
    URL_PATTERN.is_match(text.trim())
}

/// True when `text` names media directly; anything else is search text.
pub fn is_locator(text: &str) -> bool {
    let text = text.trim();
    is_http_url(text) || text.strip_prefix("file://").is_some_and(|p| !p.is_empty() && !p.contains(char::is_whitespace))
}
