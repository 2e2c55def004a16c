// src/sitemap/enumerate.rs
// =============================================================================
// This file drives sitemap discovery for one host.
//
// Steps:
// 1. Fetch {base}/robots.txt and pull out every "Sitemap:" directive
//    (case-insensitive; the value is everything after the first colon)
// 2. Expand the sitemaps with a worklist. A urlset contributes page URLs;
//    a sitemap-index pushes its children back onto the worklist one level
//    deeper
//
// Two guards keep expansion finite even on hostile input:
// - a visited-sitemap set, so an index referencing itself is a no-op
// - a fixed nesting cap (MAX_INDEX_DEPTH), so a chain of indexes can't
//   recurse forever through ever-changing URLs
//
// Every failure here is soft. A dead robots.txt means zero sitemaps; a
// dead or malformed sitemap is logged and its siblings still expand.
// =============================================================================

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;
use url::Url;

use super::parse::{parse_sitemap_xml, SitemapDoc};
use crate::fetch::{FetchError, Fetcher, RateLimiter};

// How many levels of sitemap-index nesting we will follow. The protocol
// says indexes shouldn't nest beyond one level in practice; 3 is headroom.
const MAX_INDEX_DEPTH: usize = 3;

// Everything sitemap discovery produced for one run
#[derive(Debug, Default)]
pub struct SitemapOutcome {
    /// Page URLs from every urlset, raw (normalization happens later)
    pub urls: HashSet<String>,
    /// Sitemaps (or robots.txt) that failed to fetch or parse
    pub failures: Vec<FetchError>,
}

// Enumerates all sitemap-declared URLs for a base host
//
// Parameters:
//   base: the site root (only its scheme+host matter here)
//   fetcher: the injected fetch capability
//   limiter: the shared politeness throttle
//   cancel: stops expansion early; whatever was collected is returned
pub async fn enumerate(
    base: &Url,
    fetcher: &dyn Fetcher,
    limiter: &RateLimiter,
    cancel: &CancellationToken,
) -> SitemapOutcome {
    let mut outcome = SitemapOutcome::default();

    // Step 1: robots.txt
    let robots_url = match base.join("/robots.txt") {
        Ok(url) => url,
        Err(_) => return outcome, // base has no usable host; crawl-only run
    };

    limiter.wait().await;
    let sitemaps = match fetcher.fetch(robots_url.as_str()).await {
        Ok(response) if response.is_success() => sitemaps_from_robots(&response.body),
        Ok(response) => {
            // A site without robots.txt is perfectly normal - not a failure,
            // discovery just degrades to crawl-only
            eprintln!(
                "  No robots.txt (HTTP {}), sitemap discovery skipped",
                response.status
            );
            Vec::new()
        }
        Err(e) => {
            // An actual network error IS worth surfacing in the report
            outcome.failures.push(e);
            Vec::new()
        }
    };

    if sitemaps.is_empty() {
        return outcome;
    }
    println!("🗺️  Found {} sitemap(s) in robots.txt", sitemaps.len());

    // Step 2: expand, breadth-ish, with cycle and depth guards
    let mut pending: Vec<(String, usize)> = sitemaps.into_iter().map(|s| (s, 0)).collect();
    let mut seen: HashSet<String> = HashSet::new();

    while let Some((sitemap_url, depth)) = pending.pop() {
        if cancel.is_cancelled() {
            break;
        }
        // Depth cap first, WITHOUT marking the URL seen: the same sitemap
        // may be referenced again at a legal shallow depth and must still
        // expand then
        if depth > MAX_INDEX_DEPTH {
            outcome.failures.push(FetchError {
                url: sitemap_url,
                reason: format!("sitemap index nested deeper than {}", MAX_INDEX_DEPTH),
            });
            continue;
        }
        // Cycle guard: each sitemap URL is expanded at most once
        if !seen.insert(sitemap_url.clone()) {
            continue;
        }

        limiter.wait().await;
        let response = match fetcher.fetch(&sitemap_url).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                outcome.failures.push(FetchError {
                    url: sitemap_url,
                    reason: format!("HTTP {}", response.status),
                });
                continue;
            }
            Err(e) => {
                outcome.failures.push(e);
                continue;
            }
        };

        match parse_sitemap_xml(&response.body) {
            Ok(SitemapDoc::Index(children)) => {
                for child in children {
                    pending.push((child, depth + 1));
                }
            }
            Ok(SitemapDoc::UrlSet(locs)) => {
                outcome.urls.extend(locs);
            }
            Err(e) => {
                outcome.failures.push(FetchError {
                    url: sitemap_url,
                    reason: e.to_string(),
                });
            }
        }
    }

    outcome
}

// Extracts "Sitemap:" directive values from a robots.txt body
//
// Example line: "Sitemap: https://example.com/sitemap.xml"
fn sitemaps_from_robots(robots: &str) -> Vec<String> {
    robots
        .lines()
        .filter_map(|line| {
            let (directive, value) = line.trim().split_once(':')?;
            if !directive.trim().eq_ignore_ascii_case("sitemap") {
                return None;
            }
            let value = value.trim();
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        })
        .collect()
}
