use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::client::{FetchClient, PageRecord};
use crate::extract;
use crate::frontier::{Frontier, FrontierEntry};
use crate::robots::RobotsCache;
use crate::throttle::HostThrottle;
use crate::{CrawlJob, Result};

// Drives the crawl: a pool of exactly `concurrency` workers drains the
// frontier, each worker doing robots check -> politeness wait -> fetch
// -> link discovery, then emitting the record downstream. The pool ends
// when the frontier closes and in-flight fetches have completed.
pub struct CrawlScheduler {
    job: Arc<CrawlJob>,
    client: Arc<FetchClient>,
    robots: RobotsCache,
    throttle: HostThrottle,
    frontier: Frontier,
}

impl CrawlScheduler {
    pub fn new(job: CrawlJob) -> Result<Self> {
        job.validate()?;
        let job = Arc::new(job);
        let client = Arc::new(FetchClient::new(job.clone())?);
        let robots = RobotsCache::new(client.clone(), job.user_agent.clone());
        let frontier = Frontier::new(&job)?;
        Ok(Self {
            job,
            client,
            robots,
            throttle: HostThrottle::new(),
            frontier,
        })
    }

    // Start the worker pool. Records arrive on the returned channel as
    // pages complete; the channel closes when the crawl is done.
    pub fn run(self) -> mpsc::Receiver<PageRecord> {
        let (tx, rx) = mpsc::channel(100);
        self.frontier.push_root();

        let scheduler = Arc::new(self);
        for id in 0..scheduler.job.concurrency {
            let scheduler = scheduler.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                scheduler.worker(id, tx).await;
            });
        }
        rx
    }

    async fn worker(&self, id: usize, tx: mpsc::Sender<PageRecord>) {
        while let Some(entry) = self.frontier.pop().await {
            let record = self.process(entry).await;
            self.frontier.task_done();
            if tx.send(record).await.is_err() {
                debug!("worker {}: receiver dropped, stopping", id);
                return;
            }
        }
        debug!(
            "worker {} finished, {} pages visited",
            id,
            self.frontier.visited_count()
        );
    }

    async fn process(&self, entry: FrontierEntry) -> PageRecord {
        let mut delay = self.job.per_host_delay;

        if self.job.respect_robots_txt {
            let policy = self.robots.policy_for(&entry.url).await;
            if !policy.is_allowed(&path_and_query(&entry.url)) {
                info!("robots.txt disallows {}", entry.url);
                return PageRecord::denied(entry.url, entry.depth, entry.origin);
            }
            delay = delay.max(policy.crawl_delay());
        }

        let host = entry.url.host_str().unwrap_or_default().to_string();
        self.throttle.wait_turn(&host, delay).await;

        let record = self
            .client
            .fetch_page(&entry.url, entry.depth, entry.origin.clone())
            .await;

        if record.is_success() && entry.depth < self.job.max_depth {
            if let Some(body) = &record.body {
                for link in extract::page_links(body, &record.final_url) {
                    self.frontier
                        .push(link, entry.depth + 1, Some(entry.url.clone()));
                }
            }
        }

        record
    }
}

fn path_and_query(url: &url::Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
