use bytes::BytesMut;
use futures::StreamExt;
use rand::Rng;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

use crate::{CrawlJob, FailureKind, Result};

// One fetched (or failed) page. Immutable once produced; everything the
// analyzers need is captured here so no network handle escapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: Url,
    pub final_url: Url,
    pub depth: u32,
    pub origin: Option<Url>,
    // Absent when the request never produced a response.
    pub status: Option<u16>,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub content_length: u64,
    pub truncated: bool,
    pub fetch_time: Duration,
    pub attempts: u32,
    pub failure: Option<FailureKind>,
    pub robots_denied: bool,
}

impl PageRecord {
    pub fn is_success(&self) -> bool {
        self.failure.is_none() && !self.robots_denied
    }

    // Placeholder record for a URL robots.txt told us not to fetch.
    pub fn denied(url: Url, depth: u32, origin: Option<Url>) -> Self {
        Self {
            final_url: url.clone(),
            url,
            depth,
            origin,
            status: None,
            headers: HashMap::new(),
            body: None,
            content_length: 0,
            truncated: false,
            fetch_time: Duration::ZERO,
            attempts: 0,
            failure: None,
            robots_denied: true,
        }
    }
}

pub struct FetchClient {
    client: ReqwestClient,
    job: Arc<CrawlJob>,
}

impl FetchClient {
    pub fn new(job: Arc<CrawlJob>) -> Result<Self> {
        let client = ReqwestClient::builder()
            .user_agent(&job.user_agent)
            .timeout(job.timeout)
            .redirect(reqwest::redirect::Policy::limited(job.max_redirects as usize))
            .build()?;
        Ok(Self { client, job })
    }

    // Single-attempt text fetch, used for robots.txt probes.
    pub async fn fetch_text(&self, url: &Url) -> Result<(u16, String)> {
        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }

    // Fetch one page with the bounded retry ladder: network failures and
    // 5xx responses are retried with exponential backoff plus jitter,
    // 4xx responses are terminal. Always returns a record.
    pub async fn fetch_page(&self, url: &Url, depth: u32, origin: Option<Url>) -> PageRecord {
        let started = Instant::now();
        let mut backoff = self.job.retry_base_delay;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let failure = match self.try_fetch(url).await {
                Ok(raw) => match FailureKind::from_status(raw.status) {
                    None => {
                        debug!("fetched {} ({} bytes) in {:?}", url, raw.content_length, raw.elapsed);
                        return PageRecord {
                            url: url.clone(),
                            final_url: raw.final_url,
                            depth,
                            origin,
                            status: Some(raw.status),
                            headers: raw.headers,
                            body: Some(raw.body),
                            content_length: raw.content_length,
                            truncated: raw.truncated,
                            fetch_time: raw.elapsed,
                            attempts,
                            failure: None,
                            robots_denied: false,
                        };
                    }
                    Some(kind) => {
                        let record = PageRecord {
                            url: url.clone(),
                            final_url: raw.final_url,
                            depth,
                            origin: origin.clone(),
                            status: Some(raw.status),
                            headers: raw.headers,
                            body: None,
                            content_length: 0,
                            truncated: false,
                            fetch_time: started.elapsed(),
                            attempts,
                            failure: Some(kind.clone()),
                            robots_denied: false,
                        };
                        if !kind.is_retryable() || attempts >= self.job.max_attempts {
                            return record;
                        }
                        kind
                    }
                },
                Err(err) => {
                    let kind = FailureKind::from_reqwest(&err);
                    if attempts >= self.job.max_attempts {
                        warn!("giving up on {} after {} attempts: {}", url, attempts, err);
                        return PageRecord {
                            final_url: url.clone(),
                            url: url.clone(),
                            depth,
                            origin,
                            status: None,
                            headers: HashMap::new(),
                            body: None,
                            content_length: 0,
                            truncated: false,
                            fetch_time: started.elapsed(),
                            attempts,
                            failure: Some(kind),
                            robots_denied: false,
                        };
                    }
                    kind
                }
            };

            debug!("retrying {} after {:?} ({:?})", url, backoff, failure);
            tokio::time::sleep(backoff + jitter()).await;
            backoff *= 2;
        }
    }

    async fn try_fetch(&self, url: &Url) -> std::result::Result<RawResponse, reqwest::Error> {
        let started = Instant::now();
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let declared_length = response.content_length();

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }

        // Stream the body, keeping at most max_body_bytes of it.
        let cap = self.job.max_body_bytes;
        let mut buf = BytesMut::new();
        let mut truncated = false;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if buf.len() + chunk.len() > cap {
                buf.extend_from_slice(&chunk[..cap - buf.len()]);
                truncated = true;
                break;
            }
            buf.extend_from_slice(&chunk);
        }

        let content_length = declared_length.unwrap_or(buf.len() as u64);
        Ok(RawResponse {
            status,
            final_url,
            headers,
            body: String::from_utf8_lossy(&buf).into_owned(),
            content_length,
            truncated,
            elapsed: started.elapsed(),
        })
    }
}

struct RawResponse {
    status: u16,
    final_url: Url,
    headers: HashMap<String, String>,
    body: String,
    content_length: u64,
    truncated: bool,
    elapsed: Duration,
}

fn jitter() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(0..=250))
}
