use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use url::Url;

use crate::error::Result;

static ANCHOR_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<a\s[^>]*?href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("anchor pattern is valid")
});

/// Every `<a href>` on the page resolved against `base`, without fragments,
/// deduplicated and sorted
pub fn absolute_links(base: &str, html: &str) -> Result<Vec<String>> {
    let base = Url::parse(base)?;
    let mut links = BTreeSet::new();

    for captures in ANCHOR_HREF.captures_iter(html) {
        let href = captures
            .get(1)
            .or_else(|| captures.get(2))
            .or_else(|| captures.get(3))
            .map(|m| m.as_str().trim())
            .unwrap_or("");

        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        let lowered = href.to_lowercase();
        if lowered.starts_with("javascript:") || lowered.starts_with("mailto:") {
            continue;
        }

        if let Ok(mut url) = base.join(href) {
            url.set_fragment(None);
            links.insert(url.to_string());
        }
    }

    Ok(links.into_iter().collect())
}

/// Links on the page whose absolute URL matches `pattern` from its start
pub fn matching_links(base: &str, html: &str, pattern: &Regex) -> Result<Vec<String>> {
    Ok(absolute_links(base, html)?
        .into_iter()
        .filter(|link| pattern.find(link).map(|m| m.start() == 0).unwrap_or(false))
        .collect())
}
