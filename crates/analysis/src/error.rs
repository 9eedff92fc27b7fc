use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("crawl error: {0}")]
    Crawl(#[from] crawler::CrawlError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
