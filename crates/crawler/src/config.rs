use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::{CrawlError, Result};

pub const MAX_DEPTH_LIMIT: u32 = 10;
pub const MAX_CONCURRENCY_LIMIT: usize = 50;

// Parameters for one crawl run. Built once, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlJob {
    pub root_url: Url,
    pub max_depth: u32,
    pub max_pages: usize,
    pub concurrency: usize,
    pub per_host_delay: Duration,
    pub exclude_patterns: Vec<String>,
    pub include_external: bool,
    pub user_agent: String,
    pub timeout: Duration,
    pub max_redirects: u32,
    pub max_body_bytes: usize,
    pub max_attempts: u32,
    pub retry_base_delay: Duration,
    pub respect_robots_txt: bool,
}

impl CrawlJob {
    pub fn new(root_url: Url) -> Self {
        Self {
            root_url,
            max_depth: 3,
            max_pages: 100,
            concurrency: 10,
            per_host_delay: Duration::ZERO,
            exclude_patterns: Vec::new(),
            include_external: false,
            user_agent: "Mozilla/5.0 (compatible; SiteAudit/0.1; +https://github.com/site-audit)"
                .to_string(),
            timeout: Duration::from_secs(30),
            max_redirects: 5,
            max_body_bytes: 100 * 1024, // 100KB body cap, larger bodies are truncated
            max_attempts: 3,
            retry_base_delay: Duration::from_millis(500),
            respect_robots_txt: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_DEPTH_LIMIT).contains(&self.max_depth) {
            return Err(CrawlError::InvalidJob(format!(
                "max_depth must be between 1 and {}, got {}",
                MAX_DEPTH_LIMIT, self.max_depth
            )));
        }
        if !(1..=MAX_CONCURRENCY_LIMIT).contains(&self.concurrency) {
            return Err(CrawlError::InvalidJob(format!(
                "concurrency must be between 1 and {}, got {}",
                MAX_CONCURRENCY_LIMIT, self.concurrency
            )));
        }
        if self.max_pages == 0 {
            return Err(CrawlError::InvalidJob("max_pages must be at least 1".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(CrawlError::InvalidJob("max_attempts must be at least 1".to_string()));
        }
        if !matches!(self.root_url.scheme(), "http" | "https") {
            return Err(CrawlError::InvalidJob(format!(
                "root URL must be http(s), got {}",
                self.root_url.scheme()
            )));
        }
        Ok(())
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_per_host_delay(mut self, delay: Duration) -> Self {
        self.per_host_delay = delay;
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn with_include_external(mut self, include: bool) -> Self {
        self.include_external = include;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
