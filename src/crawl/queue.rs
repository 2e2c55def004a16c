// src/crawl/queue.rs
// =============================================================================
// This file implements the breadth-first crawl with depth bookkeeping.
//
// How it works:
// 1. Normalize the seeds and put them in the depth-0 level
// 2. Fetch every URL in the current level (up to CRAWL_WORKERS at once,
//    all gated by the shared rate limiter)
// 3. Sequentially extract same-host links from the fetched pages, resolve
//    them against the page they came from, and collect the not-yet-visited
//    ones into the next level - as long as depth+1 fits under max_depth
// 4. Repeat until there is no next level (or the run is cancelled)
//
// The visited set and the level queues are only ever touched in step 3,
// which runs on one task - so every URL is fetched at most once even
// though the fetches themselves overlap.
//
// The visited set is keyed on NORMALIZED urls, so "/About/" and "/about"
// style duplicates (per policy) don't get fetched twice.
//
// Rust concepts:
// - HashSet: To track visited URLs (O(1) lookup)
// - buffer_unordered: Bounded concurrency over a stream of futures
// - CancellationToken: Cooperative early exit that keeps partial results
// =============================================================================

use futures::stream::{self, StreamExt};
use scraper::{Html, Selector};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::fetch::{FetchError, FetchResponse, Fetcher, RateLimiter};
use crate::normalize::{normalize_url, NormalizePolicy};

// How many page fetches may be in flight at once. The rate limiter still
// spaces their start times globally, so this is a latency cap, not a
// politeness loophole.
const CRAWL_WORKERS: usize = 8;

// A successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawledPage {
    /// Normalized URL (the same form the visited set is keyed on)
    pub url: String,
    /// Link hops from the nearest seed
    pub depth: usize,
}

// Everything one crawl produced
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub pages: Vec<CrawledPage>,
    pub failures: Vec<FetchError>,
}

// Crawls a site breadth-first from the seeds, up to max_depth hops
//
// Parameters:
//   seeds: configured starting URLs (off-host seeds are skipped with a warning)
//   base: the site root; only links whose host matches it are followed
//   max_depth: 0 = seeds only, 1 = seeds plus what they link to, etc.
//   fetcher: the injected fetch capability
//   limiter: the shared politeness throttle
//   policy: normalization policy (shared with the aggregator, so the
//           visited set and the final dedup key agree)
//   cancel: stops the crawl between fetches; collected pages are kept
pub async fn crawl(
    seeds: &[String],
    base: &Url,
    max_depth: usize,
    fetcher: &dyn Fetcher,
    limiter: &RateLimiter,
    policy: &NormalizePolicy,
    cancel: &CancellationToken,
) -> CrawlOutcome {
    let mut visited: HashSet<String> = HashSet::new();
    let mut outcome = CrawlOutcome::default();

    // Seed level (depth 0)
    let mut level: Vec<String> = Vec::new();
    for seed in seeds {
        match normalize_url(seed, None, policy) {
            Ok(url) if same_host(&url, base) => {
                let key = url.to_string();
                if visited.insert(key.clone()) {
                    level.push(key);
                }
            }
            Ok(url) => {
                eprintln!("⚠️  Skipping off-host seed: {}", url);
            }
            Err(e) => {
                eprintln!("⚠️  Skipping seed '{}': {}", seed, e);
            }
        }
    }

    let mut depth = 0usize;

    while !level.is_empty() && !cancel.is_cancelled() {
        println!("  Crawling {} page(s) at depth {}", level.len(), depth);

        // Fetch the whole level concurrently (bounded). Each future resolves
        // to None if cancellation won the race, and those are dropped.
        let fetched: Vec<(String, Result<FetchResponse, FetchError>)> = stream::iter(
            level.iter().map(|url| {
                let url = url.clone();
                async move {
                    tokio::select! {
                        _ = cancel.cancelled() => None,
                        result = async {
                            limiter.wait().await;
                            fetcher.fetch(&url).await
                        } => Some((url.clone(), result)),
                    }
                }
            }),
        )
        .buffer_unordered(CRAWL_WORKERS)
        .filter_map(|item| async move { item })
        .collect()
        .await;

        // Sequential phase: record results and build the next level.
        // This is the only place visited/next are mutated.
        let mut next: Vec<String> = Vec::new();
        for (url, result) in fetched {
            match result {
                Ok(response) if response.is_success() => {
                    // Only extract links if children would still be in bounds
                    if depth < max_depth {
                        if let Ok(page_url) = Url::parse(&url) {
                            for link in extract_same_host_links(&response.body, &page_url, base) {
                                if let Ok(normalized) = normalize_url(&link, Some(&page_url), policy)
                                {
                                    let key = normalized.to_string();
                                    if visited.insert(key.clone()) {
                                        next.push(key);
                                    }
                                }
                            }
                        }
                    }
                    outcome.pages.push(CrawledPage { url, depth });
                }
                Ok(response) => {
                    outcome.failures.push(FetchError {
                        url,
                        reason: format!("HTTP {}", response.status),
                    });
                }
                Err(e) => {
                    eprintln!("  Warning: Failed to fetch {}: {}", e.url, e.reason);
                    outcome.failures.push(e);
                }
            }
        }

        level = next;
        depth += 1;
    }

    outcome
}

// True when the URL's host is exactly the base host
fn same_host(url: &Url, base: &Url) -> bool {
    url.host_str().is_some() && url.host_str() == base.host_str()
}

// Extracts links from HTML that stay on the base host
//
// Parameters:
//   html: the HTML content to parse
//   page_url: the URL of the current page (for resolving relative links)
//   base: the site root we're restricting crawling to
//
// Returns: Vec of absolute URLs on the same host
fn extract_same_host_links(html: &str, page_url: &Url, base: &Url) -> Vec<String> {
    let mut links = Vec::new();

    let document = Html::parse_document(html);

    // "a[href]" is a constant selector, known valid
    let selector = Selector::parse("a[href]").unwrap();

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            let absolute = match resolve_link(page_url, href) {
                Some(url) => url,
                None => continue,
            };

            // Cross-host links are out of scope, full stop
            if (absolute.scheme() == "http" || absolute.scheme() == "https")
                && same_host(&absolute, base)
            {
                links.push(absolute.to_string());
            }
        }
    }

    links
}

// Resolves a link (possibly relative) to an absolute URL
fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    // Skip anchors and special protocols
    if href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    base.join(href).ok()
}
