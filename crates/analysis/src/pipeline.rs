use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crawler::{CrawlJob, Crawler};

use crate::config::AnalysisConfig;
use crate::score::{analyze_page, AnalysisResult};
use crate::summary::SiteSummary;
use crate::Result;

// Ties the crawl to the analyzers: page records stream out of the
// scheduler, get analyzed off the async runtime, and fold into the site
// summary through this single aggregation task.
pub struct Audit {
    job: CrawlJob,
    config: AnalysisConfig,
}

pub struct AuditRun {
    results: mpsc::Receiver<AnalysisResult>,
    summary: oneshot::Receiver<SiteSummary>,
}

impl Audit {
    pub fn new(job: CrawlJob) -> Self {
        Self {
            job,
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    // Start crawling; must be called from within a tokio runtime.
    pub fn start(self) -> Result<AuditRun> {
        let mut records = Crawler::new(self.job)?.run()?;
        let (tx, rx) = mpsc::channel(100);
        let (summary_tx, summary_rx) = oneshot::channel();
        let config = Arc::new(self.config);

        tokio::spawn(async move {
            let mut summary = SiteSummary::default();
            while let Some(record) = records.recv().await {
                let config = config.clone();
                let analyzed =
                    tokio::task::spawn_blocking(move || analyze_page(&record, &config)).await;
                let Ok(result) = analyzed else {
                    continue;
                };
                summary.record(&result);
                // Keep folding the summary even if the result consumer
                // has gone away.
                if tx.send(result).await.is_err() {
                    debug!("result receiver dropped, summary-only from here");
                }
            }
            info!(
                "audit complete: {} pages, average score {:.1}",
                summary.pages_total, summary.average_score
            );
            let _ = summary_tx.send(summary);
        });

        Ok(AuditRun {
            results: rx,
            summary: summary_rx,
        })
    }
}

impl AuditRun {
    // Next page result as it completes; None when the crawl is done.
    pub async fn recv(&mut self) -> Option<AnalysisResult> {
        self.results.recv().await
    }

    // Final rollup. Consumes the run; any unread results keep counting
    // toward the summary.
    pub async fn finish(self) -> SiteSummary {
        drop(self.results);
        self.summary.await.unwrap_or_default()
    }
}
