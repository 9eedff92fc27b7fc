use crate::config::AnalysisConfig;
use crate::issue::Issue;
use crate::page::PageView;
use crate::score::CategoryReport;

// Transport security, response headers, mobile-friendliness and markup
// hygiene.
pub fn analyze(page: &PageView, config: &AnalysisConfig) -> CategoryReport {
    let mut report = CategoryReport::new();

    let https = page.is_https();
    if !https {
        report.penalize(20.0, Issue::critical("no_https", "Site not using HTTPS"));
    }

    if let Some(status) = page.record.status {
        if status >= 400 {
            report.penalize(
                30.0,
                Issue::critical("error_status", format!("Page returns error status code {}", status)),
            );
        } else if status >= 300 {
            report.penalize(
                5.0,
                Issue::warning("redirect_status", format!("Page is redirecting (status {})", status)),
            );
        }
    }

    if https && page.header("strict-transport-security").is_none() {
        report.penalize(
            10.0,
            Issue::warning("missing_hsts", "Missing HSTS header (Strict-Transport-Security)"),
        );
    }
    if page.header("x-frame-options").is_none() {
        report.penalize(3.0, Issue::notice("missing_x_frame_options", "Missing X-Frame-Options header"));
    }
    if page.header("content-security-policy").is_none() {
        report.penalize(
            3.0,
            Issue::notice("missing_csp", "Missing Content-Security-Policy header"),
        );
    }

    match page.header("content-encoding") {
        Some(encoding) if encoding.contains("gzip") || encoding.contains("br") => {}
        _ => {
            report.penalize(
                10.0,
                Issue::warning("no_compression", "Content not compressed (missing gzip/brotli)"),
            );
        }
    }

    match page.header("cache-control") {
        None => {
            report.penalize(5.0, Issue::notice("missing_cache_control", "Missing Cache-Control header"));
        }
        Some(cache) if cache.contains("no-cache") || cache.contains("no-store") => {
            report.penalize(3.0, Issue::notice("not_cacheable", "Page not cacheable (no-cache/no-store)"));
        }
        _ => {}
    }

    if let Some(server) = page.header("server") {
        if discloses_version(server) {
            report.penalize(
                2.0,
                Issue::notice("server_version_disclosed", format!("Server version disclosed: {}", server)),
            );
        }
    }

    match page.first_attr(r#"meta[name="viewport"]"#, "content") {
        None => {
            report.penalize(
                20.0,
                Issue::critical("missing_viewport", "Missing viewport meta tag, page is not mobile-friendly"),
            );
        }
        Some(viewport) => {
            if !viewport.contains("width=device-width") {
                report.penalize(
                    10.0,
                    Issue::warning("viewport_not_responsive", "Viewport not set to device-width"),
                );
            }
            if viewport.contains("maximum-scale=1") || viewport.contains("user-scalable=no") {
                report.penalize(
                    5.0,
                    Issue::warning("viewport_blocks_zoom", "Viewport prevents zooming (accessibility issue)"),
                );
            }
        }
    }

    let images = page.select("img");
    if !images.is_empty() {
        let responsive = images
            .iter()
            .filter(|img| {
                img.value().attr("srcset").is_some()
                    || img.value().attr("style").map_or(false, |s| s.contains("max-width"))
            })
            .count();
        if responsive * 2 < images.len() {
            report.penalize(
                5.0,
                Issue::notice(
                    "images_not_responsive",
                    format!("Only {}/{} images are responsive", responsive, images.len()),
                ),
            );
        }
    }

    let has_charset = page.count("meta[charset]") > 0
        || page.count(r#"meta[http-equiv="Content-Type"]"#) > 0;
    if !has_charset {
        report.penalize(
            5.0,
            Issue::warning("missing_charset", "Missing character encoding declaration"),
        );
    }

    let iframes = page.count("iframe");
    if iframes > config.max_iframes {
        report.penalize(
            3.0,
            Issue::notice("many_iframes", format!("Many iframes found ({}), may impact performance", iframes)),
        );
    }

    let inline_styles = page.count("[style]");
    if inline_styles > config.max_inline_styles {
        report.penalize(
            3.0,
            Issue::notice(
                "many_inline_styles",
                format!("Many inline styles ({}), consider external CSS", inline_styles),
            ),
        );
    }
    let inline_scripts = page.count("script:not([src])");
    if inline_scripts > config.max_inline_scripts {
        report.penalize(
            5.0,
            Issue::warning(
                "many_inline_scripts",
                format!("Many inline scripts ({}), security and performance concern", inline_scripts),
            ),
        );
    }

    if https {
        let mut mixed = 0usize;
        for src in page.select_attr("img[src]", "src") {
            if src.starts_with("http://") {
                mixed += 1;
            }
        }
        for src in page.select_attr("script[src]", "src") {
            if src.starts_with("http://") {
                mixed += 1;
            }
        }
        for href in page.select_attr(r#"link[rel="stylesheet"]"#, "href") {
            if href.starts_with("http://") {
                mixed += 1;
            }
        }
        if mixed > 0 {
            report.penalize(
                15.0,
                Issue::critical(
                    "mixed_content",
                    format!("Mixed content: {} HTTP resources on an HTTPS page", mixed),
                ),
            );
        }
    }

    if !page.raw_body().is_empty()
        && !page.raw_body().trim_start().to_ascii_lowercase().starts_with("<!doctype")
    {
        report.penalize(5.0, Issue::warning("missing_doctype", "Missing DOCTYPE declaration"));
    }

    let url = &page.record.final_url;
    if url.as_str().len() > config.max_url_chars {
        report.penalize(
            2.0,
            Issue::notice("long_url", format!("Long URL ({} chars)", url.as_str().len())),
        );
    }
    let param_count = url.query_pairs().count();
    if param_count > config.max_url_params {
        report.penalize(
            3.0,
            Issue::notice(
                "many_url_params",
                format!("Many URL parameters ({}), consider cleaner URLs", param_count),
            ),
        );
    }

    report
}

// A bare "nginx/1.25.3" style token leaks patch-level information.
fn discloses_version(server: &str) -> bool {
    let bytes = server.as_bytes();
    bytes.windows(3).any(|w| {
        w[0].is_ascii_digit() && w[1] == b'.' && w[2].is_ascii_digit()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::tests::record_with_body;
    use crawler::PageRecord;

    fn run(record: &PageRecord) -> CategoryReport {
        let page = PageView::build(record);
        analyze(&page, &AnalysisConfig::default()).finish()
    }

    fn has_issue(report: &CategoryReport, kind: &str) -> bool {
        report.issues.iter().any(|i| i.kind == kind)
    }

    const DOC: &str = r#"<!DOCTYPE html><html><head><meta charset="utf-8">
        <meta name="viewport" content="width=device-width, initial-scale=1">
        </head><body><p>ok</p></body></html>"#;

    #[test]
    fn test_http_page_is_critical() {
        let mut record = record_with_body(DOC);
        record.final_url = url::Url::parse("http://example.com/page").unwrap();
        let report = run(&record);
        assert!(has_issue(&report, "no_https"));
    }

    #[test]
    fn test_security_headers() {
        let record = record_with_body(DOC);
        let report = run(&record);
        assert!(has_issue(&report, "missing_hsts"));
        assert!(has_issue(&report, "missing_csp"));
        assert!(has_issue(&report, "missing_x_frame_options"));

        let mut record = record_with_body(DOC);
        record.headers.insert("strict-transport-security".into(), "max-age=63072000".into());
        record.headers.insert("content-security-policy".into(), "default-src 'self'".into());
        record.headers.insert("x-frame-options".into(), "DENY".into());
        let report = run(&record);
        assert!(!has_issue(&report, "missing_hsts"));
        assert!(!has_issue(&report, "missing_csp"));
        assert!(!has_issue(&report, "missing_x_frame_options"));
    }

    #[test]
    fn test_viewport_checks() {
        let record = record_with_body("<!DOCTYPE html><html><body></body></html>");
        assert!(has_issue(&run(&record), "missing_viewport"));

        let record = record_with_body(
            r#"<!DOCTYPE html><html><head>
            <meta name="viewport" content="width=device-width, user-scalable=no">
            </head><body></body></html>"#,
        );
        let report = run(&record);
        assert!(!has_issue(&report, "missing_viewport"));
        assert!(has_issue(&report, "viewport_blocks_zoom"));
    }

    #[test]
    fn test_mixed_content_on_https() {
        let record = record_with_body(
            r#"<!DOCTYPE html><html><body>
            <img src="http://cdn.example.com/pic.png">
            <script src="http://cdn.example.com/app.js"></script>
            </body></html>"#,
        );
        let report = run(&record);
        assert!(has_issue(&report, "mixed_content"));
    }

    #[test]
    fn test_missing_doctype() {
        let record = record_with_body("<html><body>hi</body></html>");
        assert!(has_issue(&run(&record), "missing_doctype"));
        let record = record_with_body(DOC);
        assert!(!has_issue(&run(&record), "missing_doctype"));
    }

    #[test]
    fn test_error_status() {
        let mut record = record_with_body(DOC);
        record.status = Some(500);
        assert!(has_issue(&run(&record), "error_status"));
    }

    #[test]
    fn test_server_version_disclosure() {
        assert!(discloses_version("nginx/1.25.3"));
        assert!(discloses_version("Apache/2.4.57 (Debian)"));
        assert!(!discloses_version("nginx"));
        assert!(!discloses_version("cloudflare"));
    }

    #[test]
    fn test_compression_header() {
        let mut record = record_with_body(DOC);
        record.headers.insert("content-encoding".into(), "gzip".into());
        assert!(!has_issue(&run(&record), "no_compression"));

        let record = record_with_body(DOC);
        assert!(has_issue(&run(&record), "no_compression"));
    }
}
