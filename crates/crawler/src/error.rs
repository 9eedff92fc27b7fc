use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid crawl job: {0}")]
    InvalidJob(String),

    #[error("Invalid exclude pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, CrawlError>;

// Per-page failure classification. Carried as data on the PageRecord
// rather than raised: a failed fetch never aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    // Request never produced a response. Retried.
    Timeout,
    Connect,
    Network,
    // Response with a 4xx status. Terminal, never retried.
    HttpClient(u16),
    // Response with a 5xx status. Retried like a network failure.
    HttpServer(u16),
}

impl FailureKind {
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_connect() {
            FailureKind::Connect
        } else {
            FailureKind::Network
        }
    }

    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            400..=499 => Some(FailureKind::HttpClient(status)),
            500..=599 => Some(FailureKind::HttpServer(status)),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, FailureKind::HttpClient(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(FailureKind::from_status(200), None);
        assert_eq!(FailureKind::from_status(301), None);
        assert_eq!(FailureKind::from_status(404), Some(FailureKind::HttpClient(404)));
        assert_eq!(FailureKind::from_status(503), Some(FailureKind::HttpServer(503)));
    }

    #[test]
    fn test_client_errors_are_terminal() {
        assert!(!FailureKind::HttpClient(404).is_retryable());
        assert!(FailureKind::HttpServer(500).is_retryable());
        assert!(FailureKind::Timeout.is_retryable());
        assert!(FailureKind::Connect.is_retryable());
    }
}
