use std::collections::HashMap;

use crate::config::AnalysisConfig;
use crate::issue::Issue;
use crate::page::PageView;
use crate::score::CategoryReport;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "up", "about", "into", "through", "during", "before", "after", "above", "below",
    "between", "under", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "must", "can",
    "shall", "if", "then", "else", "when", "where", "why", "how", "all", "both", "each", "few",
    "more", "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so",
    "than", "too", "very",
];

// Content quality: volume, readability, heading structure, keyword
// density and repetition.
pub fn analyze(page: &PageView, config: &AnalysisConfig) -> CategoryReport {
    let mut report = CategoryReport::new();
    let text = page.text();
    let word_count = page.word_count();

    if word_count < config.min_word_count {
        report.penalize(
            15.0,
            Issue::warning(
                "low_word_count",
                format!(
                    "Low word count ({}), recommended minimum {} words",
                    word_count, config.min_word_count
                ),
            ),
        );
    } else if word_count < config.good_word_count {
        report.penalize(
            5.0,
            Issue::notice(
                "moderate_word_count",
                format!(
                    "Moderate word count ({}), consider expanding to {}+ words",
                    word_count, config.good_word_count
                ),
            ),
        );
    }

    if word_count >= config.min_readability_words {
        let ease = flesch_reading_ease(text);
        if ease < 30.0 {
            report.penalize(
                10.0,
                Issue::warning(
                    "hard_to_read",
                    format!("Very difficult to read (Flesch score {:.1})", ease),
                ),
            );
        } else if ease < 50.0 {
            report.penalize(
                5.0,
                Issue::notice(
                    "fairly_hard_to_read",
                    format!("Fairly difficult to read (Flesch score {:.1})", ease),
                ),
            );
        }

        let grade = flesch_kincaid_grade(text);
        if grade > 12.0 {
            report.penalize(
                5.0,
                Issue::notice(
                    "college_reading_level",
                    format!("College-level reading required (grade {:.1})", grade),
                ),
            );
        }
    } else {
        report.penalize(
            10.0,
            Issue::warning(
                "insufficient_content",
                format!(
                    "Content too short for readability analysis (minimum {} words)",
                    config.min_readability_words
                ),
            ),
        );
    }

    let h1 = page.count("h1");
    let h2 = page.count("h2");
    let h3 = page.count("h3");
    if h1 == 0 {
        report.penalize(15.0, Issue::critical("missing_h1", "No H1 heading found"));
    } else if h1 > 1 {
        report.penalize(
            10.0,
            Issue::warning("multiple_h1", format!("{} H1 headings, should have only one", h1)),
        );
    }
    if h2 == 0 && word_count > config.min_word_count {
        report.penalize(
            5.0,
            Issue::warning("no_subheadings", "No H2 headings found, consider adding subheadings"),
        );
    }
    if h3 > 0 && h2 == 0 {
        report.penalize(
            3.0,
            Issue::notice("broken_heading_hierarchy", "H3 headings found without H2 headings"),
        );
    }

    if word_count >= 50 {
        for (word, density) in keyword_density(text, config.top_keywords) {
            if density > config.keyword_density_limit {
                report.penalize(
                    5.0,
                    Issue::warning(
                        "keyword_stuffing",
                        format!("Possible keyword stuffing: \"{}\" at {:.1}% density", word, density),
                    ),
                );
                break;
            }
        }
    }

    if !config.target_keywords.is_empty() {
        let lower = text.to_lowercase();
        let missing: Vec<&str> = config
            .target_keywords
            .iter()
            .filter(|k| !lower.contains(&k.to_lowercase()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            report.penalize(
                3.0 * missing.len() as f64,
                Issue::notice(
                    "target_keywords_missing",
                    format!("Target keywords not found: {}", missing.join(", ")),
                ),
            );
        }
    }

    let paragraphs = page.select_text("p");
    let long_paragraphs = paragraphs
        .iter()
        .filter(|p| p.split_whitespace().count() > config.long_paragraph_words)
        .count();
    if long_paragraphs > 0 {
        report.penalize(
            3.0,
            Issue::notice(
                "long_paragraphs",
                format!(
                    "{} very long paragraphs (>{} words), consider breaking them up",
                    long_paragraphs, config.long_paragraph_words
                ),
            ),
        );
    }

    if word_count > 500 {
        if page.count("ul") == 0 && page.count("ol") == 0 {
            report.penalize(
                3.0,
                Issue::notice("no_lists", "No lists found, consider bullet points for readability"),
            );
        }
        if page.count("img") == 0 {
            report.penalize(
                5.0,
                Issue::notice("no_images", "No images found, consider adding visual content"),
            );
        }
    }

    let repeated = repeated_sentences(text);
    if repeated > 0 {
        report.penalize(
            5.0,
            Issue::warning("repeated_content", format!("Found {} repeated sentences", repeated)),
        );
    }

    report
}

// Top-N non-stopword density as percentages of the filtered word total.
fn keyword_density(text: &str, top_n: usize) -> Vec<(String, f64)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut total = 0usize;
    for raw in text.split_whitespace() {
        let word: String = raw
            .chars()
            .filter(|c| c.is_alphabetic())
            .collect::<String>()
            .to_lowercase();
        if word.len() <= 2 || STOP_WORDS.contains(&word.as_str()) {
            continue;
        }
        *counts.entry(word).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(word, count)| (word, count as f64 / total as f64 * 100.0))
        .collect()
}

fn sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn repeated_sentences(text: &str) -> usize {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for sentence in sentences(text) {
        if sentence.len() > 20 {
            *counts.entry(sentence).or_default() += 1;
        }
    }
    counts.values().filter(|&&c| c > 1).count()
}

fn syllables(word: &str) -> usize {
    let letters: Vec<char> = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return 0;
    }

    let mut count = 0;
    let mut prev_was_vowel = false;
    for c in &letters {
        let is_vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !prev_was_vowel {
            count += 1;
        }
        prev_was_vowel = is_vowel;
    }
    // Silent trailing e, except in -le endings (ta-ble, sim-ple).
    if letters.ends_with(&['e']) && !letters.ends_with(&['l', 'e']) && count > 1 {
        count -= 1;
    }
    count.max(1)
}

pub fn flesch_reading_ease(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let sentence_count = sentences(text).len().max(1) as f64;
    let word_count = words.len() as f64;
    let syllable_count: usize = words.iter().map(|w| syllables(w)).sum();

    206.835 - 1.015 * (word_count / sentence_count) - 84.6 * (syllable_count as f64 / word_count)
}

pub fn flesch_kincaid_grade(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let sentence_count = sentences(text).len().max(1) as f64;
    let word_count = words.len() as f64;
    let syllable_count: usize = words.iter().map(|w| syllables(w)).sum();

    0.39 * (word_count / sentence_count) + 11.8 * (syllable_count as f64 / word_count) - 15.59
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

    #[test]
    fn test_thin_content_is_flagged() {
        let report = run("<html><body><h1>Hi</h1><p>Just a few words here.</p></body></html>");
        assert!(has_issue(&report, "low_word_count"));
        assert!(has_issue(&report, "insufficient_content"));
    }

    #[test]
    fn test_simple_prose_reads_easily() {
        let text = "The cat sat on the mat. The dog ran to the park. We like to read short words. ";
        let ease = flesch_reading_ease(text);
        assert!(ease > 80.0, "expected easy prose, got {}", ease);
        assert!(flesch_kincaid_grade(text) < 5.0);
    }

    #[test]
    fn test_dense_prose_reads_hard() {
        let text = "Institutional epistemological considerations necessitate comprehensive \
                    multidimensional organizational restructuring initiatives representing \
                    extraordinarily complicated bureaucratic administrative responsibilities.";
        assert!(flesch_reading_ease(text) < 30.0);
    }

    #[test]
    fn test_syllable_counting() {
        assert_eq!(syllables("cat"), 1);
        assert_eq!(syllables("table"), 2);
        assert_eq!(syllables("beautiful"), 3);
        assert_eq!(syllables("the"), 1);
    }

    #[test]
    fn test_keyword_density_excludes_stop_words() {
        let text = "rust is great and rust is fast because rust compiles quickly";
        let density = keyword_density(text, 10);
        let rust = density.iter().find(|(w, _)| w == "rust").unwrap();
        assert!(rust.1 > 30.0);
        assert!(!density.iter().any(|(w, _)| w == "is" || w == "and"));
    }

    #[test]
    fn test_keyword_stuffing_detection() {
        let stuffed = "buy widgets now ".repeat(40);
        let body = format!("<html><body><h1>Widgets</h1><p>{}</p></body></html>", stuffed);
        let report = run(&body);
        assert!(has_issue(&report, "keyword_stuffing"));
    }

    #[test]
    fn test_heading_hierarchy() {
        let report = run("<html><body><h1>Title</h1><h3>Skipped level</h3></body></html>");
        assert!(has_issue(&report, "broken_heading_hierarchy"));

        let report = run("<html><body><h3>No h1 here</h3></body></html>");
        assert!(has_issue(&report, "missing_h1"));
    }

    #[test]
    fn test_repeated_sentences() {
        let sentence = "This exact sentence appears more than one time in the text.";
        let body = format!("<html><body><p>{} {}</p></body></html>", sentence, sentence);
        let report = run(&body);
        assert!(has_issue(&report, "repeated_content"));
    }
}
