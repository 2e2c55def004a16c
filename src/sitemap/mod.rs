// src/sitemap/mod.rs
// =============================================================================
// This module discovers URLs via the sitemap protocol.
//
// Flow:
// - Fetch {base}/robots.txt and collect its "Sitemap:" directives
// - Fetch each sitemap; a sitemap-index lists further sitemaps (expanded
//   recursively, with a cycle guard), a urlset lists actual page URLs
// - Any single sitemap failing to fetch or parse is recorded and skipped
//
// Finding zero sitemaps is not an error - discovery just degrades to
// crawl-only.
//
// Submodules:
// - enumerate: robots.txt handling and the expansion loop
// - parse: the quick-xml document reader
// =============================================================================

mod enumerate;
mod parse;

// Re-export the public API
pub use enumerate::{enumerate, SitemapOutcome};
