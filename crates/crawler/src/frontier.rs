use regex::RegexSet;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use tokio::sync::Notify;
use tracing::debug;
use url::Url;

use crate::normalize;
use crate::{CrawlJob, Result};

// A URL waiting to be visited. Consumed by exactly one worker.
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub url: Url,
    pub normalized: String,
    pub depth: u32,
    pub origin: Option<Url>,
}

// First-discovered, first-visited queue plus the dedup ledger. This is
// the single synchronization point for crawl state: the pending queue,
// the visited set and the in-flight count all move under one lock, so
// the page cap and dedup hold under any worker interleaving.
pub struct Frontier {
    state: Mutex<State>,
    notify: Notify,
    max_depth: u32,
    max_pages: usize,
    include_external: bool,
    root: Url,
    exclude: RegexSet,
}

struct State {
    queue: VecDeque<FrontierEntry>,
    pending: HashSet<String>,
    visited: HashSet<String>,
    in_flight: usize,
    closed: bool,
}

impl Frontier {
    pub fn new(job: &CrawlJob) -> Result<Self> {
        let exclude = RegexSet::new(&job.exclude_patterns)?;
        Ok(Self {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                pending: HashSet::new(),
                visited: HashSet::new(),
                in_flight: 0,
                closed: false,
            }),
            notify: Notify::new(),
            max_depth: job.max_depth,
            max_pages: job.max_pages,
            include_external: job.include_external,
            root: job.root_url.clone(),
            exclude,
        })
    }

    // Queue a discovered URL. A no-op when the URL is already visited or
    // pending, too deep, excluded by pattern, off-domain (unless
    // external domains are included), or not a crawlable page URL.
    pub fn push(&self, url: Url, depth: u32, origin: Option<Url>) {
        if depth > self.max_depth {
            return;
        }
        if !normalize::is_crawlable(&url) {
            return;
        }
        if !self.include_external && !normalize::same_host(&url, &self.root) {
            return;
        }
        if self.exclude.is_match(url.as_str()) {
            debug!("excluded by pattern: {}", url);
            return;
        }

        let normalized = normalize::normalize(&url);
        let mut state = self.state.lock().expect("frontier lock poisoned");
        if state.closed
            || state.visited.contains(&normalized)
            || state.pending.contains(&normalized)
        {
            return;
        }
        state.pending.insert(normalized.clone());
        state.queue.push_back(FrontierEntry {
            url,
            normalized,
            depth,
            origin,
        });
        drop(state);
        self.notify.notify_waiters();
    }

    pub fn push_root(&self) {
        let normalized = normalize::normalize(&self.root);
        let mut state = self.state.lock().expect("frontier lock poisoned");
        state.pending.insert(normalized.clone());
        state.queue.push_back(FrontierEntry {
            url: self.root.clone(),
            normalized,
            depth: 0,
            origin: None,
        });
    }

    // Take the next entry, waiting cooperatively while the queue is
    // empty but work is still in flight. The page-cap check and the
    // visited insert happen atomically here, so no two workers can ever
    // dispatch the same URL or overrun max_pages. Returns None once the
    // frontier is closed.
    pub async fn pop(&self) -> Option<FrontierEntry> {
        loop {
            let wait = self.notify.notified();
            tokio::pin!(wait);
            wait.as_mut().enable();

            {
                let mut state = self.state.lock().expect("frontier lock poisoned");
                if state.closed {
                    return None;
                }
                if let Some(entry) = state.queue.pop_front() {
                    state.pending.remove(&entry.normalized);
                    state.visited.insert(entry.normalized.clone());
                    state.in_flight += 1;
                    if state.visited.len() >= self.max_pages {
                        state.closed = true;
                        drop(state);
                        self.notify.notify_waiters();
                    }
                    return Some(entry);
                }
                if state.in_flight == 0 {
                    state.closed = true;
                    drop(state);
                    self.notify.notify_waiters();
                    return None;
                }
            }

            wait.as_mut().await;
        }
    }

    // Must be called exactly once per successful pop, after any
    // discovered links have been pushed back.
    pub fn task_done(&self) {
        let mut state = self.state.lock().expect("frontier lock poisoned");
        state.in_flight -= 1;
        if state.in_flight == 0 && state.queue.is_empty() {
            state.closed = true;
        }
        drop(state);
        self.notify.notify_waiters();
    }

    pub fn visited_count(&self) -> usize {
        self.state.lock().expect("frontier lock poisoned").visited.len()
    }
}
