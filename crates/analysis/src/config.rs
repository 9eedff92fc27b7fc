use serde::{Deserialize, Serialize};

// Thresholds consumed by the category analyzers. Loaded by the
// embedding application (file/env); defaults mirror common SEO guidance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub title_min_chars: usize,
    pub title_max_chars: usize,
    pub description_min_chars: usize,
    pub description_max_chars: usize,

    pub min_word_count: usize,
    pub good_word_count: usize,
    pub min_readability_words: usize,
    pub keyword_density_limit: f64,
    pub top_keywords: usize,
    pub long_paragraph_words: usize,
    pub target_keywords: Vec<String>,

    pub moderate_load_secs: f64,
    pub slow_load_secs: f64,
    pub very_slow_load_secs: f64,
    pub moderate_page_bytes: u64,
    pub large_page_bytes: u64,
    pub very_large_page_bytes: u64,
    pub max_scripts: usize,
    pub max_stylesheets: usize,
    pub lazy_load_image_threshold: usize,
    pub max_total_resources: usize,
    pub many_total_resources: usize,

    pub many_links: usize,
    pub max_links: usize,
    pub external_link_ratio: f64,
    pub generic_anchor_ratio: f64,
    pub repeated_anchor_limit: usize,

    pub max_iframes: usize,
    pub max_inline_styles: usize,
    pub max_inline_scripts: usize,
    pub max_url_chars: usize,
    pub max_url_params: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            title_min_chars: 30,
            title_max_chars: 60,
            description_min_chars: 120,
            description_max_chars: 160,

            min_word_count: 300,
            good_word_count: 600,
            min_readability_words: 100,
            keyword_density_limit: 5.0,
            top_keywords: 10,
            long_paragraph_words: 150,
            target_keywords: Vec::new(),

            moderate_load_secs: 2.0,
            slow_load_secs: 3.0,
            very_slow_load_secs: 5.0,
            moderate_page_bytes: 1024 * 1024,
            large_page_bytes: 2 * 1024 * 1024,
            very_large_page_bytes: 5 * 1024 * 1024,
            max_scripts: 10,
            max_stylesheets: 5,
            lazy_load_image_threshold: 5,
            max_total_resources: 100,
            many_total_resources: 50,

            many_links: 50,
            max_links: 100,
            external_link_ratio: 0.8,
            generic_anchor_ratio: 0.2,
            repeated_anchor_limit: 5,

            max_iframes: 3,
            max_inline_styles: 10,
            max_inline_scripts: 5,
            max_url_chars: 100,
            max_url_params: 3,
        }
    }
}
