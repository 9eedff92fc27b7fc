use url::form_urlencoded;
use url::Url;

use crate::{CrawlError, Result};

// Extensions that are never worth fetching for page analysis.
const SKIP_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico", ".pdf", ".zip", ".gz", ".exe",
    ".mp3", ".mp4", ".avi", ".webm", ".css", ".js", ".woff", ".woff2", ".ttf",
];

// Resolve a discovered href against the page it appeared on.
pub fn resolve(raw: &str, base: &Url) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Err(CrawlError::InvalidUrl(raw.to_string()));
    }
    base.join(trimmed)
        .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", raw, e)))
}

// Canonical form used for dedup equality only, never for fetching.
// The url crate already lower-cases scheme/host and strips default
// ports; on top of that we drop the fragment, drop trailing slashes
// (except root), and sort query pairs by key, keeping the original
// relative order of duplicate keys.
pub fn normalize(url: &Url) -> String {
    let mut out = url.clone();
    out.set_fragment(None);

    let path = out.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        out.set_path(&trimmed);
    }

    if out.query().is_some() {
        let mut pairs: Vec<(String, String)> = out
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        // Stable sort preserves first-seen order for duplicate keys.
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        if pairs.is_empty() {
            out.set_query(None);
        } else {
            let sorted = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish();
            out.set_query(Some(&sorted));
        }
    }

    out.to_string()
}

// Discovery-time filter: http(s) pages only, no obvious asset URLs.
pub fn is_crawlable(url: &Url) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let path = url.path().to_ascii_lowercase();
    !SKIP_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

pub fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str().map(|h| h.to_ascii_lowercase()) == b.host_str().map(|h| h.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(s: &str) -> String {
        normalize(&Url::parse(s).unwrap())
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "https://Example.COM:443/Path/?b=2&a=1#frag",
            "http://example.com:80/",
            "https://example.com/a/b/",
            "https://example.com/?z=1&a=2&a=1",
        ];
        for input in inputs {
            let once = norm(input);
            let twice = normalize(&Url::parse(&once).unwrap());
            assert_eq!(once, twice, "not idempotent for {}", input);
        }
    }

    #[test]
    fn test_normalize_strips_fragment_and_default_port() {
        assert_eq!(norm("https://example.com:443/page#top"), "https://example.com/page");
        assert_eq!(norm("http://EXAMPLE.com:80/page"), "http://example.com/page");
    }

    #[test]
    fn test_normalize_trailing_slash() {
        assert_eq!(norm("https://example.com/docs/"), "https://example.com/docs");
        // Root keeps its slash.
        assert_eq!(norm("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn test_normalize_sorts_query_keys() {
        assert_eq!(norm("https://example.com/p?b=2&a=1"), "https://example.com/p?a=1&b=2");
        // Duplicate keys keep their relative order.
        assert_eq!(
            norm("https://example.com/p?b=2&a=second&a=first"),
            norm("https://example.com/p?a=second&a=first&b=2")
        );
    }

    #[test]
    fn test_resolve_relative() {
        let base = Url::parse("https://example.com/dir/page").unwrap();
        assert_eq!(resolve("/about", &base).unwrap().as_str(), "https://example.com/about");
        assert_eq!(resolve("other", &base).unwrap().as_str(), "https://example.com/dir/other");
    }

    #[test]
    fn test_resolve_rejects_fragments_and_empty() {
        let base = Url::parse("https://example.com/").unwrap();
        assert!(resolve("#section", &base).is_err());
        assert!(resolve("   ", &base).is_err());
    }

    #[test]
    fn test_is_crawlable() {
        assert!(is_crawlable(&Url::parse("https://example.com/page").unwrap()));
        assert!(!is_crawlable(&Url::parse("https://example.com/logo.PNG").unwrap()));
        assert!(!is_crawlable(&Url::parse("https://example.com/app.js").unwrap()));
        assert!(!is_crawlable(&Url::parse("mailto:hi@example.com").unwrap()));
        assert!(!is_crawlable(&Url::parse("javascript:void(0)").unwrap()));
    }

    #[test]
    fn test_same_host() {
        let a = Url::parse("https://example.com/a").unwrap();
        let b = Url::parse("http://EXAMPLE.com/b").unwrap();
        let c = Url::parse("https://other.com/").unwrap();
        assert!(same_host(&a, &b));
        assert!(!same_host(&a, &c));
    }
}
