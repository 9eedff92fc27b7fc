use crate::config::AnalysisConfig;
use crate::issue::Issue;
use crate::page::PageView;
use crate::score::CategoryReport;

// Load time, page weight, resource counts and loading hygiene. Core Web
// Vitals figures are coarse estimates derived from what a single fetch
// can see; a non-goal here is driving a real browser.
pub fn analyze(page: &PageView, config: &AnalysisConfig) -> CategoryReport {
    let mut report = CategoryReport::new();

    let load_time = page.load_time_secs();
    if load_time > config.very_slow_load_secs {
        report.penalize(
            30.0,
            Issue::critical(
                "very_slow_load",
                format!("Very slow page load time ({:.1}s), target < {:.0}s", load_time, config.slow_load_secs),
            ),
        );
    } else if load_time > config.slow_load_secs {
        report.penalize(
            15.0,
            Issue::warning(
                "slow_load",
                format!("Slow page load time ({:.1}s), target < {:.0}s", load_time, config.slow_load_secs),
            ),
        );
    } else if load_time > config.moderate_load_secs {
        report.penalize(
            5.0,
            Issue::notice(
                "moderate_load",
                format!("Moderate page load time ({:.1}s), target < {:.0}s", load_time, config.moderate_load_secs),
            ),
        );
    }

    let size = page.record.content_length;
    let size_mb = size as f64 / (1024.0 * 1024.0);
    if size > config.very_large_page_bytes {
        report.penalize(
            25.0,
            Issue::critical("very_large_page", format!("Very large page size ({:.1}MB), target < 2MB", size_mb)),
        );
    } else if size > config.large_page_bytes {
        report.penalize(
            15.0,
            Issue::warning("large_page", format!("Large page size ({:.1}MB), target < 2MB", size_mb)),
        );
    } else if size > config.moderate_page_bytes {
        report.penalize(
            5.0,
            Issue::notice("moderate_page_size", format!("Moderate page size ({:.1}MB), target < 1MB", size_mb)),
        );
    }

    let images = page.select("img");
    if images
        .iter()
        .any(|img| img.value().attr("width").is_none() || img.value().attr("height").is_none())
    {
        report.penalize(
            3.0,
            Issue::warning("images_missing_dimensions", "Images without dimensions cause layout shift"),
        );
    }

    let lazy_images = images
        .iter()
        .filter(|img| img.value().attr("loading") == Some("lazy"))
        .count();
    if images.len() > config.lazy_load_image_threshold && lazy_images == 0 {
        report.penalize(
            10.0,
            Issue::warning(
                "no_lazy_loading",
                format!("{} images found but none use lazy loading", images.len()),
            ),
        );
    }

    let scripts = page.select("script[src]");
    if scripts
        .iter()
        .any(|s| s.value().attr("async").is_none() && s.value().attr("defer").is_none())
    {
        report.penalize(
            3.0,
            Issue::notice("render_blocking_scripts", "Render-blocking JavaScript found (missing async/defer)"),
        );
    }
    if scripts.len() > config.max_scripts {
        report.penalize(
            10.0,
            Issue::warning(
                "too_many_scripts",
                format!("Too many JavaScript files ({}), consider bundling", scripts.len()),
            ),
        );
    }

    let stylesheets = page.select_attr(r#"link[rel="stylesheet"]"#, "href");
    if stylesheets.len() > config.max_stylesheets {
        report.penalize(
            10.0,
            Issue::warning(
                "too_many_stylesheets",
                format!("Too many CSS files ({}), consider bundling", stylesheets.len()),
            ),
        );
    }

    let has_inline_css = page.count("style") > 0;
    if !has_inline_css && !stylesheets.is_empty() {
        report.penalize(
            5.0,
            Issue::notice("no_critical_css", "No critical CSS found, consider inlining above-the-fold styles"),
        );
    }

    let hints = page.count(r#"link[rel="preload"]"#)
        + page.count(r#"link[rel="prefetch"]"#)
        + page.count(r#"link[rel="preconnect"]"#);
    if hints == 0 {
        report.penalize(
            5.0,
            Issue::notice("no_resource_hints", "No resource hints found (preload/prefetch/preconnect)"),
        );
    }

    let script_srcs = page.select_attr("script[src]", "src");
    let unminified = script_srcs
        .iter()
        .chain(stylesheets.iter())
        .filter(|src| !src.contains(".min.") && !src.contains("-min.") && !src.contains(".prod."))
        .count();
    if unminified > 3 {
        report.penalize(
            10.0,
            Issue::warning(
                "unminified_resources",
                format!("{} potentially unminified resources found", unminified),
            ),
        );
    }

    let total_resources = images.len() + script_srcs.len() + stylesheets.len();
    if total_resources > config.max_total_resources {
        report.penalize(
            20.0,
            Issue::critical(
                "too_many_resources",
                format!("Too many resources ({}), target < {}", total_resources, config.many_total_resources),
            ),
        );
    } else if total_resources > config.many_total_resources {
        report.penalize(
            10.0,
            Issue::warning(
                "many_resources",
                format!("Many resources ({}), target < {}", total_resources, config.many_total_resources),
            ),
        );
    }

    // Rough LCP estimate from the document fetch alone.
    let lcp_estimate = load_time * 0.8;
    if lcp_estimate > 4.0 {
        report.penalize(
            10.0,
            Issue::warning("poor_lcp", format!("Poor LCP estimate ({:.1}s), target < 2.5s", lcp_estimate)),
        );
    } else if lcp_estimate > 2.5 {
        report.penalize(
            5.0,
            Issue::notice("needs_improvement_lcp", format!("LCP estimate {:.1}s, target < 2.5s", lcp_estimate)),
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::tests::record_with_body;
    use crawler::PageRecord;
    use std::time::Duration;

    fn run(record: &PageRecord) -> CategoryReport {
        let page = PageView::build(record);
        analyze(&page, &AnalysisConfig::default()).finish()
    }

    fn has_issue(report: &CategoryReport, kind: &str) -> bool {
        report.issues.iter().any(|i| i.kind == kind)
    }

    #[test]
    fn test_load_time_bands() {
        let mut record = record_with_body("<html><body></body></html>");
        record.fetch_time = Duration::from_millis(100);
        assert!(!has_issue(&run(&record), "slow_load"));

        record.fetch_time = Duration::from_secs_f64(3.5);
        let report = run(&record);
        assert!(has_issue(&report, "slow_load"));

        record.fetch_time = Duration::from_secs_f64(6.0);
        let report = run(&record);
        assert!(has_issue(&report, "very_slow_load"));
        assert!(has_issue(&report, "poor_lcp"));
    }

    #[test]
    fn test_page_size_bands() {
        let mut record = record_with_body("<html><body></body></html>");
        record.content_length = 6 * 1024 * 1024;
        assert!(has_issue(&run(&record), "very_large_page"));

        record.content_length = 3 * 1024 * 1024;
        assert!(has_issue(&run(&record), "large_page"));

        record.content_length = 10 * 1024;
        let report = run(&record);
        assert!(!has_issue(&report, "large_page"));
        assert!(!has_issue(&report, "moderate_page_size"));
    }

    #[test]
    fn test_lazy_loading_and_dimensions() {
        let imgs: String = (0..8)
            .map(|i| format!(r#"<img src="/{}.png" alt="a">"#, i))
            .collect();
        let record = record_with_body(&format!("<html><body>{}</body></html>", imgs));
        let report = run(&record);
        assert!(has_issue(&report, "no_lazy_loading"));
        assert!(has_issue(&report, "images_missing_dimensions"));

        let imgs: String = (0..8)
            .map(|i| format!(r#"<img src="/{}.png" alt="a" width="10" height="10" loading="lazy">"#, i))
            .collect();
        let record = record_with_body(&format!("<html><body>{}</body></html>", imgs));
        let report = run(&record);
        assert!(!has_issue(&report, "no_lazy_loading"));
        assert!(!has_issue(&report, "images_missing_dimensions"));
    }

    #[test]
    fn test_render_blocking_scripts() {
        let record = record_with_body(
            r#"<html><head><script src="/app.js"></script></head><body></body></html>"#,
        );
        assert!(has_issue(&run(&record), "render_blocking_scripts"));

        let record = record_with_body(
            r#"<html><head><script src="/app.js" defer></script></head><body></body></html>"#,
        );
        assert!(!has_issue(&run(&record), "render_blocking_scripts"));
    }

    #[test]
    fn test_too_many_scripts() {
        let scripts: String = (0..12)
            .map(|i| format!(r#"<script src="/s{}.min.js" defer></script>"#, i))
            .collect();
        let record = record_with_body(&format!("<html><head>{}</head><body></body></html>", scripts));
        assert!(has_issue(&run(&record), "too_many_scripts"));
    }

    #[test]
    fn test_unminified_resources() {
        let scripts: String = (0..5)
            .map(|i| format!(r#"<script src="/s{}.js" defer></script>"#, i))
            .collect();
        let record = record_with_body(&format!("<html><head>{}</head><body></body></html>", scripts));
        assert!(has_issue(&run(&record), "unminified_resources"));
    }
}
