use crawler::{FailureKind, PageRecord};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::warn;
use url::Url;

use crate::config::AnalysisConfig;
use crate::issue::{Issue, Severity};
use crate::page::PageView;
use crate::{content, links, performance, seo, technical};

// Fixed category weights; must sum to 1.
const SEO_WEIGHT: f64 = 0.25;
const CONTENT_WEIGHT: f64 = 0.25;
const TECHNICAL_WEIGHT: f64 = 0.20;
const PERFORMANCE_WEIGHT: f64 = 0.20;
const LINKS_WEIGHT: f64 = 0.10;

// One analyzer's output for one page.
#[derive(Debug, Clone)]
pub struct CategoryReport {
    pub score: f64,
    pub issues: Vec<Issue>,
}

impl CategoryReport {
    pub fn new() -> Self {
        Self {
            score: 100.0,
            issues: Vec::new(),
        }
    }

    pub fn penalize(&mut self, points: f64, issue: Issue) {
        self.score -= points;
        self.issues.push(issue);
    }

    // Finding without a score deduction.
    pub fn note(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn finish(mut self) -> Self {
        self.score = self.score.clamp(0.0, 100.0);
        self
    }
}

impl Default for CategoryReport {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub seo: f64,
    pub content: f64,
    pub technical: f64,
    pub performance: f64,
    pub links: f64,
}

// Deterministic and order-independent: the same five sub-scores always
// produce the same overall score. Clamped to [0, 100], one decimal.
pub fn overall_score(scores: &CategoryScores) -> f64 {
    let raw = SEO_WEIGHT * scores.seo
        + CONTENT_WEIGHT * scores.content
        + TECHNICAL_WEIGHT * scores.technical
        + PERFORMANCE_WEIGHT * scores.performance
        + LINKS_WEIGHT * scores.links;
    (raw.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

pub type AnalyzerFn = fn(&PageView, &AnalysisConfig) -> CategoryReport;

// The analyzer pipeline is an ordered list of independent functions,
// not a trait hierarchy; each one is pure and safe to run concurrently.
pub const ANALYZERS: [(&str, AnalyzerFn); 5] = [
    ("seo", seo::analyze),
    ("content", content::analyze),
    ("technical", technical::analyze),
    ("performance", performance::analyze),
    ("links", links::analyze),
];

// One page's full findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub url: Url,
    pub final_url: Url,
    pub depth: u32,
    pub status: Option<u16>,
    pub load_time: f64,
    pub title: Option<String>,
    pub word_count: Option<usize>,
    pub failure: Option<FailureKind>,
    pub robots_denied: bool,
    pub scores: Option<CategoryScores>,
    pub overall_score: Option<f64>,
    pub issues: Vec<Issue>,
}

impl AnalysisResult {
    pub fn is_scored(&self) -> bool {
        self.scores.is_some()
    }

    pub fn severity_count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    fn unscored(record: &PageRecord, issue: Issue) -> Self {
        Self {
            url: record.url.clone(),
            final_url: record.final_url.clone(),
            depth: record.depth,
            status: record.status,
            load_time: record.fetch_time.as_secs_f64(),
            title: None,
            word_count: None,
            failure: record.failure.clone(),
            robots_denied: record.robots_denied,
            scores: None,
            overall_score: None,
            issues: vec![issue],
        }
    }
}

// Run every analyzer over one record and compose the page result. Never
// panics: an analyzer defect is confined to its own category.
pub fn analyze_page(record: &PageRecord, config: &AnalysisConfig) -> AnalysisResult {
    if record.robots_denied {
        return AnalysisResult::unscored(
            record,
            Issue::notice("robots_disallowed", format!("{} is disallowed by robots.txt", record.url)),
        );
    }
    if let Some(failure) = &record.failure {
        let message = match failure {
            FailureKind::HttpClient(status) | FailureKind::HttpServer(status) => {
                format!("Fetch failed with HTTP {} after {} attempts", status, record.attempts)
            }
            _ => format!("Fetch failed ({:?}) after {} attempts", failure, record.attempts),
        };
        return AnalysisResult::unscored(record, Issue::critical("fetch_failed", message));
    }

    let page = PageView::build(record);
    let mut issues: Vec<Issue> = page.parse_issue.clone().into_iter().collect();
    let mut scores = CategoryScores::default();

    for (name, analyze) in ANALYZERS {
        let report = match catch_unwind(AssertUnwindSafe(|| analyze(&page, config).finish())) {
            Ok(report) => report,
            Err(_) => {
                warn!("{} analyzer panicked on {}", name, record.url);
                let mut report = CategoryReport::new();
                report.score = 0.0;
                report.note(Issue::warning(
                    "analysis_error",
                    format!("{} analysis failed internally", name),
                ));
                report
            }
        };

        match name {
            "seo" => scores.seo = report.score,
            "content" => scores.content = report.score,
            "technical" => scores.technical = report.score,
            "performance" => scores.performance = report.score,
            "links" => scores.links = report.score,
            _ => {}
        }
        issues.extend(report.issues);
    }

    AnalysisResult {
        url: record.url.clone(),
        final_url: record.final_url.clone(),
        depth: record.depth,
        status: record.status,
        load_time: record.fetch_time.as_secs_f64(),
        title: page.title(),
        word_count: Some(page.word_count()),
        failure: None,
        robots_denied: false,
        scores: Some(scores),
        overall_score: Some(overall_score(&scores)),
        issues,
    }
}
