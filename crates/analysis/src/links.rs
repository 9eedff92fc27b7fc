use std::collections::HashMap;

use crate::config::AnalysisConfig;
use crate::issue::Issue;
use crate::page::PageView;
use crate::score::CategoryReport;

const GENERIC_ANCHORS: &[&str] = &[
    "click here", "here", "read more", "more", "link", "this", "page", "article", "website",
    "site", "url",
];

// Link graph shape of one page: internal/external balance, anchor text
// quality and unsafe link attributes.
pub fn analyze(page: &PageView, config: &AnalysisConfig) -> CategoryReport {
    let mut report = CategoryReport::new();
    let base = &page.record.final_url;

    let mut internal = 0usize;
    let mut external = 0usize;
    let mut anchor_texts: Vec<String> = Vec::new();
    let mut empty_anchors = 0usize;
    let mut unsafe_blank = false;

    let anchors = page.select("a[href]");
    let mut total = 0usize;
    for anchor in &anchors {
        let href = anchor.value().attr("href").unwrap_or_default().trim();
        if href.is_empty() || href == "#" {
            continue;
        }
        if href.starts_with("mailto:") || href.starts_with("tel:") || href.starts_with("javascript:") {
            continue;
        }
        total += 1;

        let resolved = base.join(href).ok();
        let is_internal = match &resolved {
            Some(url) => url.host_str() == base.host_str(),
            // Unresolvable href, count it as internal-ish noise.
            None => true,
        };
        if is_internal {
            internal += 1;
        } else {
            external += 1;
        }

        let text = anchor.text().collect::<String>().trim().to_lowercase();
        if text.is_empty() {
            empty_anchors += 1;
        } else {
            anchor_texts.push(text);
        }

        if anchor.value().attr("target") == Some("_blank") {
            let rel = anchor.value().attr("rel").unwrap_or_default().to_lowercase();
            if !rel.contains("noopener") {
                unsafe_blank = true;
            }
        }
    }

    if total == 0 {
        report.penalize(20.0, Issue::warning("no_links", "No links found on page"));
        return report;
    }

    if internal == 0 {
        report.penalize(15.0, Issue::warning("no_internal_links", "No internal links found"));
    }
    let external_ratio = external as f64 / total as f64;
    if external_ratio > config.external_link_ratio {
        report.penalize(
            10.0,
            Issue::warning(
                "too_many_external_links",
                format!("Too many external links ({}/{})", external, total),
            ),
        );
    }

    if total > config.max_links {
        report.penalize(
            10.0,
            Issue::warning(
                "too_many_links",
                format!("Too many links on page ({}), may dilute PageRank", total),
            ),
        );
    } else if total > config.many_links {
        report.penalize(
            5.0,
            Issue::notice("many_links", format!("Many links on page ({}), consider reducing", total)),
        );
    }

    let generic_count = anchor_texts
        .iter()
        .filter(|text| GENERIC_ANCHORS.contains(&text.as_str()))
        .count();
    if !anchor_texts.is_empty() {
        if generic_count as f64 > anchor_texts.len() as f64 * config.generic_anchor_ratio {
            report.penalize(
                10.0,
                Issue::warning(
                    "generic_anchor_text",
                    format!("Too many generic anchor texts ({}), use descriptive text", generic_count),
                ),
            );
        } else if generic_count > 0 {
            report.penalize(
                5.0,
                Issue::notice(
                    "generic_anchor_text",
                    format!("{} generic anchor texts found, use descriptive text", generic_count),
                ),
            );
        }
    }

    if empty_anchors > 0 {
        report.penalize(
            (3.0 * empty_anchors as f64).min(15.0),
            Issue::warning(
                "empty_anchor_text",
                format!("{} links with empty anchor text", empty_anchors),
            ),
        );
    }

    let mut anchor_counts: HashMap<&str, usize> = HashMap::new();
    for text in &anchor_texts {
        *anchor_counts.entry(text.as_str()).or_default() += 1;
    }
    if let Some((text, count)) = anchor_counts
        .iter()
        .filter(|(text, _)| text.len() > 3)
        .max_by_key(|(_, count)| **count)
    {
        if *count > config.repeated_anchor_limit {
            report.penalize(
                10.0,
                Issue::warning(
                    "repeated_anchor_text",
                    format!("Anchor text \"{}\" repeated {} times", text, count),
                ),
            );
        }
    }

    if unsafe_blank {
        report.penalize(
            5.0,
            Issue::warning(
                "unsafe_target_blank",
                "target=\"_blank\" link without rel=\"noopener\" (security risk)",
            ),
        );
    }

    if page.count("nav a[href]") + page.count("header a[href]") == 0 {
        report.penalize(
            10.0,
            Issue::warning("no_navigation_links", "No navigation links found in <nav> or <header>"),
        );
    }
    if page.count("footer") == 0 {
        report.penalize(3.0, Issue::notice("no_footer", "No footer element found"));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::tests::record_with_body;

    fn run(body: &str) -> CategoryReport {
        let record = record_with_body(body);
        let page = PageView::build(&record);
        analyze(&page, &AnalysisConfig::default()).finish()
    }

    fn has_issue(report: &CategoryReport, kind: &str) -> bool {
        report.issues.iter().any(|i| i.kind == kind)
    }

    const CHROME: &str = r#"<nav><a href="/">Home</a></nav><footer>f</footer>"#;

    #[test]
    fn test_no_links_at_all() {
        let report = run("<html><body><p>text only</p></body></html>");
        assert!(has_issue(&report, "no_links"));
    }

    #[test]
    fn test_internal_external_partition() {
        let body = format!(
            r#"<html><body>{}
            <a href="/a">internal one</a>
            <a href="https://example.com/b">internal two</a>
            <a href="https://elsewhere.com/">external one</a>
            </body></html>"#,
            CHROME
        );
        let report = run(&body);
        assert!(!has_issue(&report, "no_internal_links"));
        assert!(!has_issue(&report, "too_many_external_links"));
    }

    #[test]
    fn test_mostly_external_links() {
        let externals: String = (0..9)
            .map(|i| format!(r#"<a href="https://other{}.com/">partner {}</a>"#, i, i))
            .collect();
        let body = format!("<html><body>{}{}</body></html>", CHROME, externals);
        let report = run(&body);
        // Nav link keeps one internal, 9 of 10 are external.
        assert!(has_issue(&report, "too_many_external_links"));
    }

    #[test]
    fn test_generic_and_empty_anchors() {
        let body = format!(
            r#"<html><body>{}
            <a href="/a">click here</a>
            <a href="/b">read more</a>
            <a href="/c"></a>
            </body></html>"#,
            CHROME
        );
        let report = run(&body);
        assert!(has_issue(&report, "generic_anchor_text"));
        assert!(has_issue(&report, "empty_anchor_text"));
    }

    #[test]
    fn test_unsafe_target_blank() {
        let body = format!(
            r#"<html><body>{}
            <a href="https://x.com" target="_blank">external</a>
            </body></html>"#,
            CHROME
        );
        assert!(has_issue(&run(&body), "unsafe_target_blank"));

        let body = format!(
            r#"<html><body>{}
            <a href="https://x.com" target="_blank" rel="noopener noreferrer">external</a>
            </body></html>"#,
            CHROME
        );
        assert!(!has_issue(&run(&body), "unsafe_target_blank"));
    }

    #[test]
    fn test_repeated_anchor_text() {
        let repeats: String = (0..7)
            .map(|i| format!(r#"<a href="/p{}">best widgets</a>"#, i))
            .collect();
        let body = format!("<html><body>{}{}</body></html>", CHROME, repeats);
        assert!(has_issue(&run(&body), "repeated_anchor_text"));
    }

    #[test]
    fn test_missing_navigation_and_footer() {
        let report = run(r#"<html><body><a href="/a">a link text</a></body></html>"#);
        assert!(has_issue(&report, "no_navigation_links"));
        assert!(has_issue(&report, "no_footer"));
    }

    #[test]
    fn test_skips_mailto_and_fragment_links() {
        let body = format!(
            r##"<html><body>{}
            <a href="mailto:x@example.com">mail</a>
            <a href="#">top</a>
            </body></html>"##,
            CHROME
        );
        let report = run(&body);
        // Only the nav link counts.
        assert!(!has_issue(&report, "no_links"));
    }
}
