//! WHOIS lookups: resolver seam, cache, retry and the batch scheduler

pub mod cache;
pub mod client;
pub mod record;
pub mod retry;
pub mod scheduler;

pub use cache::{CacheEntry, WhoisCache};
pub use client::TcpWhoisResolver;
pub use record::WhoisRecord;
pub use retry::RetryPolicy;
pub use scheduler::WhoisScheduler;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Source of raw registration data for a domain
#[async_trait]
pub trait WhoisResolver: Send + Sync {
    /// Resolve `domain`, giving up after `timeout`.
    ///
    /// Unregistered domains are reported as `DomainSmithError::NotRegistered`.
    async fn resolve(&self, domain: &str, timeout: Duration) -> Result<WhoisRecord>;

    /// Resolver name for logs
    fn name(&self) -> &'static str;
}
