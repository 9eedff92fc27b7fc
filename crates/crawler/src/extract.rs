use scraper::{Html, Selector};
use url::Url;

use crate::normalize;

// Outbound anchor links from a page body, resolved against the final
// URL so relative links on redirected pages land in the right place.
// Unresolvable hrefs are dropped; the frontier applies its own filters.
pub fn page_links(body: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(body);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| normalize::resolve(href, base).ok())
        .collect()
}
