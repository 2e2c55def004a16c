// src/crawl/mod.rs
// =============================================================================
// This module handles bounded website crawling.
//
// Features:
// - Breadth-first traversal from the configured seed URLs
// - Respects same-host restriction (doesn't crawl external sites)
// - Configurable depth limit (seeds are depth 0)
// - Polite crawling via the shared rate limiter
// - Per-page fetch failures are recorded, never fatal
//
// Why crawl at all, when we also read sitemaps?
// - Sitemaps are often stale or partial
// - The union of both sources is the inventory we actually want
// =============================================================================

mod queue;

// Re-export the main crawling entry point
pub use queue::{crawl, CrawlOutcome, CrawledPage};
