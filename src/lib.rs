//! Domain Smith - keyword-driven domain name generation
//!
//! Expands seed keywords into candidate domains, screens them against
//! sensitive-word lists and enriches them with cached WHOIS data.

pub mod config;
pub mod error;
pub mod generator;
pub mod sensitive;
pub mod service;
pub mod types;
pub mod web;
pub mod whois;

// Re-export commonly used types
pub use config::ServiceConfig;
pub use error::{DomainSmithError, Result};
pub use types::{
    CachePolicy, CacheWrites, DomainReport, LengthRange, LookupConfig, LookupResult,
    MetricsSnapshot, PerformanceMetrics, Statistics, TimingInfo, WhoisInfo,
};

// Re-export main functionality
pub use generator::DomainAssembler;
pub use sensitive::SensitiveWordChecker;
pub use service::{DomainService, GenerateRequest, GenerateResponse};
pub use whois::{TcpWhoisResolver, WhoisCache, WhoisResolver, WhoisScheduler};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();
    Ok(())
}
