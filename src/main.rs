// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Dispatch to the appropriate subcommand handler
// 3. Run discovery (sitemaps + crawl), aggregate, and print/write the report
// 4. Exit with proper code (0 = clean run, 1 = some fetches failed, 2 = error)
//
// A Ctrl-C during a run cancels the remaining fetches but still aggregates
// and writes everything collected so far - completed work is never thrown
// away.
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;       // src/cli.rs - command-line parsing
mod config;    // src/config.rs - seeds/patterns config file
mod crawl;     // src/crawl/ - bounded breadth-first crawling
mod fetch;     // src/fetch.rs - fetch capability + rate limiter
mod normalize; // src/normalize.rs - URL canonicalization
mod report;    // src/report/ - aggregation and the inventory report
mod rules;     // src/rules.rs - include/exclude pattern classification
mod sitemap;   // src/sitemap/ - robots.txt + sitemap enumeration

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use url::Url;

use cli::{Cli, Commands};
use crawl::CrawlOutcome;
use fetch::{HttpFetcher, RateLimiter};
use report::InventoryReport;
use sitemap::SitemapOutcome;

// The #[tokio::main] attribute transforms our async main into a real main
// function - it creates a tokio runtime and runs our async code inside it
#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // Fatal (configuration-level) error: print the chain and bail
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = run completed, every fetch succeeded
//   Ok(1) = run completed, but some fetches failed (see report)
//   Err   = fatal error before/around the run (bad config, bad base URL)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Discover {
            base_url,
            config,
            out,
            json,
            max_depth,
            throttle,
        } => handle_discover(&base_url, &config, out.as_deref(), json, max_depth, throttle).await,
        Commands::Sitemap {
            base_url,
            json,
            throttle,
        } => handle_sitemap(&base_url, json, throttle).await,
    }
}

// Parses and sanity-checks the base URL the whole run is scoped to
fn parse_base(base_url: &str) -> Result<Url> {
    let base = Url::parse(base_url).with_context(|| format!("invalid base URL '{}'", base_url))?;
    if base.host_str().is_none() {
        bail!("base URL '{}' has no host", base_url);
    }
    match base.scheme() {
        "http" | "https" => Ok(base),
        other => bail!("base URL scheme must be http or https, got '{}'", other),
    }
}

// Builds the shared rate limiter from the --throttle flag
fn build_limiter(throttle: f64) -> Result<RateLimiter> {
    if !throttle.is_finite() || throttle < 0.0 {
        bail!("--throttle must be a non-negative number of seconds");
    }
    Ok(RateLimiter::new(Duration::from_secs_f64(throttle)))
}

// Wires Ctrl-C to a cancellation token; the run keeps whatever it has
// collected when the token fires
fn spawn_ctrl_c_handler() -> CancellationToken {
    let cancel = CancellationToken::new();
    let handle = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n🛑 Interrupted - flushing partial results...");
            handle.cancel();
        }
    });
    cancel
}

// Handles the 'discover' subcommand: the full sitemap + crawl pipeline
async fn handle_discover(
    base_url: &str,
    config_path: &Path,
    out: Option<&Path>,
    json: bool,
    max_depth: usize,
    throttle: f64,
) -> Result<i32> {
    let base = parse_base(base_url)?;
    let (config, rules) = config::load_config(config_path)?;
    let limiter = build_limiter(throttle)?;
    let fetcher = HttpFetcher::new(Duration::from_secs(config.fetch_timeout_secs))?;
    let cancel = spawn_ctrl_c_handler();

    println!("🔍 Discovering in-scope URLs on {}", base);
    println!("📊 Max crawl depth: {}, throttle: {}s", max_depth, throttle);

    // Source 1: sitemaps declared in robots.txt
    let SitemapOutcome {
        urls: sitemap_urls,
        failures: mut failures,
    } = sitemap::enumerate(&base, &fetcher, &limiter, &cancel).await;
    println!("🗺️  Sitemaps yielded {} URL(s)", sitemap_urls.len());

    // Source 2: bounded crawl from the configured seeds
    let CrawlOutcome {
        pages,
        failures: crawl_failures,
    } = crawl::crawl(
        &config.seeds,
        &base,
        max_depth,
        &fetcher,
        &limiter,
        &config.normalize,
        &cancel,
    )
    .await;
    println!("🕸️  Crawl fetched {} page(s)", pages.len());

    // Merge, dedupe, classify
    failures.extend(crawl_failures);
    let report = report::aggregate(sitemap_urls, &pages, &rules, &config.normalize, failures);

    write_report(&report, out, json)?;

    if report.fetch_failures.is_empty() {
        Ok(0)
    } else {
        Ok(1) // completed, but the report lists failed fetches
    }
}

// Handles the 'sitemap' subcommand: enumeration only, no crawl
async fn handle_sitemap(base_url: &str, json: bool, throttle: f64) -> Result<i32> {
    let base = parse_base(base_url)?;
    let limiter = build_limiter(throttle)?;
    let fetcher = HttpFetcher::new(Duration::from_secs(10))?;
    let cancel = spawn_ctrl_c_handler();

    let SitemapOutcome { urls, failures } = sitemap::enumerate(&base, &fetcher, &limiter, &cancel).await;

    // Sort for stable output; HashSet iteration order is arbitrary
    let mut urls: Vec<&String> = urls.iter().collect();
    urls.sort();

    if json {
        println!("{}", serde_json::to_string_pretty(&urls)?);
    } else {
        for url in &urls {
            println!("{}", url);
        }
        eprintln!("📋 {} sitemap URL(s), {} failure(s)", urls.len(), failures.len());
    }

    for failure in &failures {
        eprintln!("⚠️  {}", failure);
    }

    if failures.is_empty() {
        Ok(0)
    } else {
        Ok(1)
    }
}

// Writes the report where the flags say: JSON file, JSON stdout, or table
fn write_report(report: &InventoryReport, out: Option<&Path>, json: bool) -> Result<()> {
    if let Some(path) = out {
        let pretty = serde_json::to_string_pretty(report)?;
        std::fs::write(path, pretty)
            .with_context(|| format!("cannot write report to {}", path.display()))?;
        println!("📁 Report written to {}", path.display());
        print_summary(report);
    } else if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_table(report);
        print_summary(report);
    }
    Ok(())
}

// Prints the inventory as a human-readable table in the terminal
fn print_table(report: &InventoryReport) {
    println!();
    println!("{:<60} {:<12} {:<8} {:<5}", "URL", "CATEGORY", "SOURCE", "DEPTH");
    println!("{}", "=".repeat(88));

    for record in &report.records {
        // Truncate URL if too long for display
        let url_display = if record.url.len() > 57 {
            format!("{}...", &record.url[..57])
        } else {
            record.url.clone()
        };

        println!(
            "{:<60} {:<12} {:<8} {:<5}",
            url_display,
            record.category,
            format!("{:?}", record.source).to_lowercase(),
            record.depth
        );
    }
}

// Prints the per-category counts plus the skipped/failure tallies
fn print_summary(report: &InventoryReport) {
    println!();
    println!("📊 Summary:");
    for (category, count) in &report.summary {
        println!("   {:<12} {}", category, count);
    }
    println!("   {:<12} {}", "TOTAL", report.records.len());

    if !report.skipped.is_empty() {
        println!("   Skipped entries:");
        for (reason, count) in &report.skipped {
            println!("     {:<20} {}", reason, count);
        }
    }

    if !report.fetch_failures.is_empty() {
        println!("   ❌ Failed fetches: {}", report.fetch_failures.len());
        for failure in &report.fetch_failures {
            eprintln!("      {}", failure);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_accepts_http_and_https() {
        assert!(parse_base("https://example.com").is_ok());
        assert!(parse_base("http://example.com/start").is_ok());
    }

    #[test]
    fn test_parse_base_rejects_garbage() {
        assert!(parse_base("not a url").is_err());
        assert!(parse_base("ftp://example.com").is_err());
        assert!(parse_base("data:text/plain,hi").is_err());
    }

    #[test]
    fn test_build_limiter_rejects_negative_throttle() {
        assert!(build_limiter(-1.0).is_err());
        assert!(build_limiter(f64::NAN).is_err());
        assert!(build_limiter(0.0).is_ok());
        assert!(build_limiter(0.75).is_ok());
    }
}
