pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod frontier;
pub mod normalize;
pub mod robots;
pub mod scheduler;
pub mod throttle;

pub use client::*;
pub use config::*;
pub use error::*;
pub use frontier::*;
pub use scheduler::*;
pub use throttle::*;

use tokio::sync::mpsc;

// Thin entry point over the scheduler.
pub struct Crawler {
    job: CrawlJob,
}

impl Crawler {
    pub fn new(job: CrawlJob) -> Result<Self> {
        job.validate()?;
        Ok(Self { job })
    }

    pub fn job(&self) -> &CrawlJob {
        &self.job
    }

    // Start the crawl; must be called from within a tokio runtime.
    pub fn run(self) -> Result<mpsc::Receiver<PageRecord>> {
        Ok(CrawlScheduler::new(self.job)?.run())
    }
}
