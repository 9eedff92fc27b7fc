use crate::config::AnalysisConfig;
use crate::issue::Issue;
use crate::page::PageView;
use crate::score::CategoryReport;

const REQUIRED_OG_TAGS: &[&str] = &["og:title", "og:description", "og:image", "og:url"];

// Meta tags, social markup, structured data and on-page SEO basics.
pub fn analyze(page: &PageView, config: &AnalysisConfig) -> CategoryReport {
    let mut report = CategoryReport::new();

    match page.title() {
        None => report.penalize(15.0, Issue::critical("missing_title", "Missing page title")),
        Some(title) => {
            let len = title.chars().count();
            if len < config.title_min_chars || len > config.title_max_chars {
                report.penalize(
                    5.0,
                    Issue::warning(
                        "title_length",
                        format!(
                            "Title is {} chars, recommended {}-{}",
                            len, config.title_min_chars, config.title_max_chars
                        ),
                    ),
                );
            }
        }
    }

    let description = page
        .first_attr(r#"meta[name="description"]"#, "content")
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    match description {
        None => report.penalize(
            15.0,
            Issue::critical("missing_description", "Missing meta description"),
        ),
        Some(description) => {
            let len = description.chars().count();
            if len < config.description_min_chars || len > config.description_max_chars {
                report.penalize(
                    5.0,
                    Issue::warning(
                        "description_length",
                        format!(
                            "Meta description is {} chars, recommended {}-{}",
                            len, config.description_min_chars, config.description_max_chars
                        ),
                    ),
                );
            }
        }
    }

    if page.first_attr(r#"meta[name="keywords"]"#, "content").is_some() {
        report.note(Issue::notice(
            "meta_keywords_deprecated",
            "Meta keywords tag is deprecated and ignored by search engines",
        ));
    }

    if page.first_attr(r#"link[rel="canonical"]"#, "href").is_none() {
        report.penalize(10.0, Issue::warning("missing_canonical", "Missing canonical URL"));
    }

    let og_properties = page.select_attr(r#"meta[property^="og:"]"#, "property");
    let missing_og: Vec<&str> = REQUIRED_OG_TAGS
        .iter()
        .filter(|tag| !og_properties.iter().any(|p| p == *tag))
        .copied()
        .collect();
    if !missing_og.is_empty() {
        report.penalize(
            5.0 * missing_og.len() as f64,
            Issue::warning(
                "missing_open_graph",
                format!("Missing Open Graph tags: {}", missing_og.join(", ")),
            ),
        );
    }

    if page.count(r#"meta[name^="twitter:"]"#) == 0 {
        report.penalize(
            3.0,
            Issue::notice(
                "missing_twitter_card",
                "Missing Twitter Card tags for better social sharing",
            ),
        );
    }

    let json_ld = page.select_text(r#"script[type="application/ld+json"]"#);
    if json_ld.is_empty() {
        report.penalize(
            10.0,
            Issue::warning("missing_structured_data", "No structured data (JSON-LD) found"),
        );
    } else {
        for block in &json_ld {
            if serde_json::from_str::<serde_json::Value>(block).is_err() {
                report.penalize(
                    5.0,
                    Issue::warning("invalid_structured_data", "Invalid JSON-LD structured data found"),
                );
            }
        }
    }

    if let Some(robots) = page.first_attr(r#"meta[name="robots"]"#, "content") {
        let robots = robots.to_ascii_lowercase();
        if robots.contains("noindex") {
            report.penalize(
                20.0,
                Issue::critical("noindex", "Page is set to noindex and will not appear in search results"),
            );
        }
        if robots.contains("nofollow") {
            report.penalize(
                10.0,
                Issue::warning("nofollow", "Page is set to nofollow, links will not pass PageRank"),
            );
        }
    }

    if page.first_attr("html", "lang").is_none() {
        report.penalize(
            5.0,
            Issue::warning("missing_lang", "Missing language declaration (lang attribute)"),
        );
    }

    if page.first_attr(r#"meta[name="viewport"]"#, "content").is_none() {
        report.penalize(
            15.0,
            Issue::critical("missing_viewport", "Missing viewport meta tag, page is not mobile-friendly"),
        );
    }

    if page.count(r#"link[rel*="icon"]"#) == 0 {
        report.penalize(2.0, Issue::notice("missing_favicon", "Missing favicon"));
    }

    let h1_count = page.count("h1");
    if h1_count == 0 {
        report.penalize(15.0, Issue::critical("missing_h1", "Missing H1 tag"));
    } else if h1_count > 1 {
        report.penalize(
            10.0,
            Issue::warning("multiple_h1", format!("{} H1 tags found, should have only one", h1_count)),
        );
    }

    let images = page.select("img");
    let missing_alt = images
        .iter()
        .filter(|img| img.value().attr("alt").map_or(true, |alt| alt.trim().is_empty()))
        .count();
    if missing_alt > 0 {
        report.penalize(
            (2.0 * missing_alt as f64).min(15.0),
            Issue::warning(
                "images_missing_alt",
                format!("{} images missing alt text", missing_alt),
            ),
        );
    }

    report
}
