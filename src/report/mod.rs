// src/report/mod.rs
// =============================================================================
// This module merges the sitemap and crawl discoveries into the final
// inventory report.
//
// Steps:
// 1. Normalize every raw URL from both sources; a URL that won't normalize
//    is dropped and counted in the "skipped" tally by reason
// 2. Deduplicate on the normalized form, keeping the MINIMUM depth seen
//    (sitemap entries count as depth 0) and the UNION of source tags
// 3. Classify each distinct URL against the rule set; out-of-scope URLs
//    are dropped
// 4. Sort by (category, url) so two runs over the same data produce
//    byte-identical output, and count per category - including zeros for
//    categories nothing matched
// =============================================================================

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use url::Url;

use crate::crawl::CrawledPage;
use crate::fetch::FetchError;
use crate::normalize::{normalize_url, NormalizePolicy};
use crate::rules::RuleSet;

// Where a URL was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Sitemap,
    Crawl,
    Both,
}

impl Source {
    // Union of two source tags
    fn merge(self, other: Source) -> Source {
        if self == other {
            self
        } else {
            Source::Both
        }
    }
}

// One row of the final inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedUrl {
    pub url: String,
    pub category: String,
    pub source: Source,
    /// Minimum link depth at which the URL was seen (sitemap = 0)
    pub depth: usize,
}

// The complete run report, serialized as-is with --json / --out
#[derive(Debug, Serialize)]
pub struct InventoryReport {
    /// In-scope URLs, sorted by (category, url)
    pub records: Vec<ClassifiedUrl>,
    /// Per-category counts, zeros included
    pub summary: BTreeMap<String, usize>,
    /// Entries dropped during normalization, counted by reason
    pub skipped: BTreeMap<String, usize>,
    /// Every fetch that failed during discovery (sitemap + crawl)
    pub fetch_failures: Vec<FetchError>,
}

// Builds the report from both discovery sources
//
// Parameters:
//   sitemap_urls: raw URLs out of the sitemap enumerator
//   crawled: pages the bounded crawler fetched, with their depths
//   rules: the compiled include/exclude rule set
//   policy: the same normalization policy the crawler used
//   fetch_failures: accumulated failure log from both sources
pub fn aggregate(
    sitemap_urls: impl IntoIterator<Item = String>,
    crawled: &[CrawledPage],
    rules: &RuleSet,
    policy: &NormalizePolicy,
    fetch_failures: Vec<FetchError>,
) -> InventoryReport {
    let mut skipped: BTreeMap<String, usize> = BTreeMap::new();

    // Normalized url -> (parsed form, min depth, merged source)
    let mut entries: HashMap<String, (Url, usize, Source)> = HashMap::new();

    let raw_occurrences = sitemap_urls
        .into_iter()
        .map(|url| (url, 0usize, Source::Sitemap))
        .chain(
            crawled
                .iter()
                .map(|page| (page.url.clone(), page.depth, Source::Crawl)),
        );

    for (raw, depth, source) in raw_occurrences {
        let url = match normalize_url(&raw, None, policy) {
            Ok(url) => url,
            Err(e) => {
                // One bad entry never aborts aggregation
                *skipped.entry(e.reason().to_string()).or_insert(0) += 1;
                continue;
            }
        };

        entries
            .entry(url.to_string())
            .and_modify(|(_, min_depth, merged)| {
                *min_depth = (*min_depth).min(depth);
                *merged = merged.merge(source);
            })
            .or_insert((url, depth, source));
    }

    // Classify; zero-initialize the summary so configured categories with
    // no matches still appear
    let mut summary: BTreeMap<String, usize> = rules
        .categories()
        .into_iter()
        .map(|c| (c.to_string(), 0))
        .collect();

    let mut records: Vec<ClassifiedUrl> = Vec::new();
    for (key, (url, depth, source)) in entries {
        if let Some(category) = rules.classify(&url) {
            *summary.entry(category.to_string()).or_insert(0) += 1;
            records.push(ClassifiedUrl {
                url: key,
                category: category.to_string(),
                source,
                depth,
            });
        }
    }

    records.sort_by(|a, b| (a.category.as_str(), a.url.as_str()).cmp(&(b.category.as_str(), b.url.as_str())));

    InventoryReport {
        records,
        summary,
        skipped,
        fetch_failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{PatternSpec, Polarity};

    fn rules() -> RuleSet {
        RuleSet::compile(&[
            PatternSpec {
                category: "plans".to_string(),
                polarity: Polarity::Include,
                pattern: "^/plans(/|$)".to_string(),
            },
            PatternSpec {
                category: "devices".to_string(),
                polarity: Polarity::Include,
                pattern: "^/devices(/|$)".to_string(),
            },
            PatternSpec {
                category: "plans".to_string(),
                polarity: Polarity::Exclude,
                pattern: "^/plans/billing/".to_string(),
            },
        ])
        .unwrap()
    }

    fn page(url: &str, depth: usize) -> CrawledPage {
        CrawledPage {
            url: url.to_string(),
            depth,
        }
    }

    fn build(sitemap: &[&str], crawled: &[CrawledPage]) -> InventoryReport {
        aggregate(
            sitemap.iter().map(|s| s.to_string()),
            crawled,
            &rules(),
            &NormalizePolicy::default(),
            Vec::new(),
        )
    }

    #[test]
    fn test_variants_collapse_to_one_record() {
        // Same page, four spellings, two sources
        let report = build(
            &["HTTPS://Example.com/plans/", "https://example.com/plans#top"],
            &[page("https://example.com/plans", 2), page("https://example.com/plans/", 1)],
        );
        assert_eq!(report.records.len(), 1);
        let record = &report.records[0];
        assert_eq!(record.url, "https://example.com/plans");
        assert_eq!(record.category, "plans");
        assert_eq!(record.source, Source::Both);
        assert_eq!(record.depth, 0); // sitemap occurrence wins the minimum
    }

    #[test]
    fn test_minimum_depth_is_kept_across_crawl_occurrences() {
        let report = build(
            &[],
            &[page("https://example.com/plans/a", 3), page("https://example.com/plans/a", 1)],
        );
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].depth, 1);
        assert_eq!(report.records[0].source, Source::Crawl);
    }

    #[test]
    fn test_excluded_url_never_appears() {
        let report = build(
            &["https://example.com/plans/billing/pay"],
            &[page("https://example.com/plans/billing/pay", 1)],
        );
        assert!(report.records.is_empty());
        assert_eq!(report.summary["plans"], 0);
    }

    #[test]
    fn test_out_of_scope_urls_are_dropped_silently() {
        let report = build(&["https://example.com/about"], &[]);
        assert!(report.records.is_empty());
        assert!(report.skipped.is_empty()); // out-of-scope is not "skipped"
    }

    #[test]
    fn test_malformed_entries_are_tallied_not_fatal() {
        let report = build(
            &["mailto:x@y.com", "http://[broken", "https://example.com/plans"],
            &[],
        );
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.skipped.get("unsupported-scheme"), Some(&1));
        assert_eq!(report.skipped.get("malformed-url"), Some(&1));
    }

    #[test]
    fn test_summary_includes_zero_count_categories() {
        let report = build(&["https://example.com/plans"], &[]);
        assert_eq!(report.summary["plans"], 1);
        assert_eq!(report.summary["devices"], 0);
    }

    #[test]
    fn test_records_sorted_by_category_then_url() {
        let report = build(
            &[
                "https://example.com/plans/b",
                "https://example.com/devices/z",
                "https://example.com/plans/a",
                "https://example.com/devices/a",
            ],
            &[],
        );
        let order: Vec<(&str, &str)> = report
            .records
            .iter()
            .map(|r| (r.category.as_str(), r.url.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("devices", "https://example.com/devices/a"),
                ("devices", "https://example.com/devices/z"),
                ("plans", "https://example.com/plans/a"),
                ("plans", "https://example.com/plans/b"),
            ]
        );
    }

    #[test]
    fn test_empty_inputs_still_produce_a_report() {
        // Every fetch failing must still yield a writable report
        let failures = vec![FetchError {
            url: "https://example.com/robots.txt".to_string(),
            reason: "connection failed".to_string(),
        }];
        let report = aggregate(
            std::iter::empty(),
            &[],
            &rules(),
            &NormalizePolicy::default(),
            failures,
        );
        assert!(report.records.is_empty());
        assert_eq!(report.summary.len(), 2);
        assert_eq!(report.fetch_failures.len(), 1);
    }
}
