// src/fetch.rs
// =============================================================================
// This module defines HOW pages get fetched, behind a trait.
//
// Key functionality:
// - Fetcher trait: the one capability the discovery engine needs from the
//   outside world (url in, status + body out). Injected everywhere, so
//   tests run against an in-memory mock instead of the network.
// - HttpFetcher: the real implementation on top of reqwest, with a timeout
//   on every request (a hung fetch becomes a fetch failure, never a stall)
//   and a bounded redirect policy.
// - RateLimiter: the politeness throttle. One global next-slot scheduler
//   shared by all workers, so the delay holds even with concurrent fetches.
//
// Rust concepts:
// - async-trait: Traits with async methods (not yet native in our edition)
// - Arc/Mutex: Sharing the limiter slot between concurrent tasks
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

// Identify ourselves politely, like a good crawler should
const USER_AGENT: &str = "Mozilla/5.0 (compatible; site-scout/0.1; +https://example.org)";

// A failed fetch, kept as data so it can land in the final report
//
// Every per-URL failure is non-fatal: the caller records it and moves on
// to siblings/neighbors.
#[derive(Debug, Clone, Serialize, Error)]
#[error("fetch of {url} failed: {reason}")]
pub struct FetchError {
    pub url: String,
    pub reason: String,
}

// A completed HTTP exchange
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    /// True for 2xx status codes
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// The fetch capability consumed by the sitemap enumerator and the crawler.
// The engine itself never touches the network directly.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

// Real fetcher backed by reqwest
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    // Builds the client once; reqwest clients are cheap to clone and pool
    // connections internally
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5)) // follow up to 5 redirects
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError {
                url: url.to_string(),
                reason: categorize_error(&e),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| FetchError {
            url: url.to_string(),
            reason: format!("failed reading body: {}", e),
        })?;

        Ok(FetchResponse { status, body })
    }
}

// Turns a reqwest error into a short human-readable reason
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure
// - SSL certificate issues
// - Too many redirects
// - etc.
fn categorize_error(error: &reqwest::Error) -> String {
    let error_string = error.to_string();

    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_connect() {
        // Connection errors often mean DNS issues or host unreachable
        if error_string.contains("dns") {
            "could not resolve hostname".to_string()
        } else {
            "connection failed".to_string()
        }
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        "SSL certificate error".to_string()
    } else {
        error_string
    }
}

// The politeness throttle
//
// Each caller asks for a slot before fetching; slots are handed out at
// least `delay` apart, globally. With concurrent workers this degrades
// gracefully into a queue of evenly spaced start times instead of a
// per-worker sleep (which would multiply the effective rate).
pub struct RateLimiter {
    delay: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(None),
        }
    }

    /// A limiter that never waits - for tests and for --throttle 0
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    // Waits until this caller's turn comes up
    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }

        // Claim the next slot while holding the lock, then sleep OUTSIDE
        // the lock so other workers can claim theirs
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let at = match *next {
                Some(n) if n > now => n,
                _ => now,
            };
            *next = Some(at + self.delay);
            at
        };

        tokio::time::sleep_until(slot).await;
    }
}
