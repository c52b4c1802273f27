//! Domain Smith - keyword-driven domain name generation
//!
//! Runs the HTTP service with `--web`, otherwise generates domains for the
//! keywords given on the command line and prints them.

use std::env;
use std::sync::Arc;

use anyhow::Context;
use domain_smith::{
    service::{DomainService, GenerateRequest, StringOrList},
    types::DomainReport,
    web, ServiceConfig,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    // Check for help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    domain_smith::init().context("Failed to initialize")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServiceConfig::from_env().context("Invalid configuration")?;
    let service = Arc::new(DomainService::from_config(&config).context("Failed to start service")?);

    if args.iter().any(|a| a == "--web") {
        web::serve(service, &config.bind_address()).await?;
        return Ok(());
    }

    let keywords: Vec<String> = args.into_iter().filter(|a| !a.starts_with("--")).collect();
    run_once(&service, keywords).await
}

/// One generation pass printed to stdout
async fn run_once(service: &DomainService, keywords: Vec<String>) -> anyhow::Result<()> {
    let request = GenerateRequest {
        keywords: Some(StringOrList::List(keywords)),
        ..Default::default()
    };

    let response = service.generate(&request).await?;

    println!("🔨 Domain Smith");
    println!("═══════════════");
    println!();

    for (index, report) in response.results.iter().enumerate() {
        println!("{:2}. {}", index + 1, describe(report));
    }

    println!();
    println!(
        "📊 {} domains, {} safe, {} flagged ({:.2} ms)",
        response.statistics.total_domains,
        response.statistics.safe_domains,
        response.statistics.unsafe_domains,
        response.total_time
    );

    service.shutdown();
    Ok(())
}

fn describe(report: &DomainReport) -> String {
    let safety = if report.is_safe {
        String::new()
    } else {
        format!(" ⚠️  [{}]", report.sensitive_words.join(", "))
    };

    let whois = match &report.whois {
        Some(info) if info.success => format!(
            "❌ taken ({})",
            info.registrar.as_deref().unwrap_or(domain_smith::types::UNKNOWN)
        ),
        Some(info) if info.is_unregistered() => "✅ available".to_string(),
        Some(info) => format!("❓ {}", info.error.as_deref().unwrap_or("unknown")),
        None => "❓ not checked".to_string(),
    };

    format!("{:<24} {}{}", report.domain, whois, safety)
}

fn print_help() {
    println!("🔨 Domain Smith - keyword-driven domain name generation");
    println!("═══════════════════════════════════════════════════════");
    println!();
    println!("USAGE:");
    println!("    domain-smith [KEYWORDS...]");
    println!("    domain-smith --web");
    println!();
    println!("EXAMPLES:");
    println!("    domain-smith cloud                # Generate domains for one keyword");
    println!("    domain-smith zhongguo nihao       # Romanized keywords are expanded too");
    println!("    domain-smith --web                # Serve the JSON API");
    println!();
    println!("ENDPOINTS (--web):");
    println!("    POST /generate        Generate, screen and look up domains");
    println!("    POST /refresh_whois   Re-query WHOIS for one domain");
    println!("    GET  /health          Cache size and lookup metrics");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("    DOMAIN_SMITH_HOST                  Listen host (default: 0.0.0.0)");
    println!("    DOMAIN_SMITH_PORT                  Listen port (default: 5000)");
    println!("    DOMAIN_SMITH_CACHE_FILE            WHOIS cache file (default: whois_cache.json)");
    println!("    DOMAIN_SMITH_CACHE_TTL_SECS        Cache freshness window (default: 86400)");
    println!("    DOMAIN_SMITH_WHOIS_MAX_WORKERS     Concurrent WHOIS queries (default: 5)");
    println!("    DOMAIN_SMITH_WHOIS_BATCH_TIMEOUT_SECS  Batch deadline (default: 5, max: 3600)");
    println!("    DOMAIN_SMITH_WHOIS_QUERY_TIMEOUT_MS    Per-query timeout (default: 3000)");
    println!("    DOMAIN_SMITH_WHOIS_RETRY_ATTEMPTS  Attempts per query (default: 3)");
    println!("    DOMAIN_SMITH_WHOIS_RETRY_DELAY_MS  Delay between attempts (default: 1000)");
    println!("    DOMAIN_SMITH_CACHE_BATCH_WRITES    all | success_only (default: all)");
    println!("    DOMAIN_SMITH_CACHE_REFRESH_WRITES  all | success_only (default: success_only)");
    println!("    DOMAIN_SMITH_SENSITIVE_WORDS_FILE  Extra {{category: [words]}} JSON file");
    println!("    RUST_LOG                           Log filter (default: info)");
    println!();
    println!("Made with 🦀 Rust");
}
