use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::issue::Severity;
use crate::score::{AnalysisResult, CategoryScores};

// Run-level rollup, folded incrementally as each page result arrives.
// Only the aggregation task ever mutates one of these; workers never
// touch shared counters directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteSummary {
    pub pages_total: usize,
    pub pages_scored: usize,
    pub pages_failed: usize,
    pub pages_denied: usize,
    // Means over scored pages.
    pub average_score: f64,
    pub average_load_time: f64,
    pub average_word_count: f64,
    pub category_averages: CategoryScores,
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub notice_issues: usize,
    pub issue_kinds: HashMap<String, usize>,
}

impl SiteSummary {
    pub fn record(&mut self, result: &AnalysisResult) {
        self.pages_total += 1;
        if result.failure.is_some() {
            self.pages_failed += 1;
        } else if result.robots_denied {
            self.pages_denied += 1;
        }

        if let (Some(overall), Some(scores)) = (result.overall_score, &result.scores) {
            self.pages_scored += 1;
            let n = self.pages_scored as f64;
            self.average_score += (overall - self.average_score) / n;
            self.average_load_time += (result.load_time - self.average_load_time) / n;
            let words = result.word_count.unwrap_or(0) as f64;
            self.average_word_count += (words - self.average_word_count) / n;

            let avg = &mut self.category_averages;
            avg.seo += (scores.seo - avg.seo) / n;
            avg.content += (scores.content - avg.content) / n;
            avg.technical += (scores.technical - avg.technical) / n;
            avg.performance += (scores.performance - avg.performance) / n;
            avg.links += (scores.links - avg.links) / n;
        }

        for issue in &result.issues {
            match issue.severity {
                Severity::Critical => self.critical_issues += 1,
                Severity::Warning => self.warning_issues += 1,
                Severity::Notice => self.notice_issues += 1,
            }
            *self.issue_kinds.entry(issue.kind.clone()).or_default() += 1;
        }
    }

    // Most frequent issue kinds, count-descending; ties break by name so
    // the ordering is stable across runs.
    pub fn top_issues(&self, limit: usize) -> Vec<(String, usize)> {
        let mut ranked: Vec<(String, usize)> = self
            .issue_kinds
            .iter()
            .map(|(kind, count)| (kind.clone(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Issue;
    use url::Url;

    fn scored_result(overall: f64, load_time: f64, issues: Vec<Issue>) -> AnalysisResult {
        let url = Url::parse("https://example.com/").unwrap();
        AnalysisResult {
            url: url.clone(),
            final_url: url,
            depth: 0,
            status: Some(200),
            load_time,
            title: None,
            word_count: Some(100),
            failure: None,
            robots_denied: false,
            scores: Some(CategoryScores {
                seo: overall,
                content: overall,
                technical: overall,
                performance: overall,
                links: overall,
            }),
            overall_score: Some(overall),
            issues,
        }
    }

    #[test]
    fn test_incremental_averages() {
        let mut summary = SiteSummary::default();
        summary.record(&scored_result(80.0, 1.0, vec![]));
        summary.record(&scored_result(60.0, 3.0, vec![]));

        assert_eq!(summary.pages_total, 2);
        assert_eq!(summary.pages_scored, 2);
        assert!((summary.average_score - 70.0).abs() < 1e-9);
        assert!((summary.average_load_time - 2.0).abs() < 1e-9);
        assert!((summary.category_averages.seo - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_failed_pages_do_not_skew_averages() {
        let mut summary = SiteSummary::default();
        summary.record(&scored_result(90.0, 1.0, vec![]));

        let url = Url::parse("https://example.com/404").unwrap();
        let failed = AnalysisResult {
            url: url.clone(),
            final_url: url,
            depth: 1,
            status: Some(404),
            load_time: 0.1,
            title: None,
            word_count: None,
            failure: Some(crawler::FailureKind::HttpClient(404)),
            robots_denied: false,
            scores: None,
            overall_score: None,
            issues: vec![Issue::critical("fetch_failed", "HTTP 404")],
        };
        summary.record(&failed);

        assert_eq!(summary.pages_total, 2);
        assert_eq!(summary.pages_scored, 1);
        assert_eq!(summary.pages_failed, 1);
        assert!((summary.average_score - 90.0).abs() < 1e-9);
        assert_eq!(summary.critical_issues, 1);
    }

    #[test]
    fn test_issue_counters_and_top_kinds() {
        let mut summary = SiteSummary::default();
        summary.record(&scored_result(
            50.0,
            1.0,
            vec![
                Issue::critical("missing_title", "x"),
                Issue::warning("title_length", "x"),
                Issue::warning("title_length", "x"),
                Issue::notice("missing_favicon", "x"),
            ],
        ));

        assert_eq!(summary.critical_issues, 1);
        assert_eq!(summary.warning_issues, 2);
        assert_eq!(summary.notice_issues, 1);

        let top = summary.top_issues(2);
        assert_eq!(top[0], ("title_length".to_string(), 2));
        assert_eq!(top.len(), 2);
    }
}
