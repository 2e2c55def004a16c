// src/normalize.rs
// =============================================================================
// This module canonicalizes raw URL strings into the form we use as the
// deduplication key everywhere else.
//
// Rules (applied in this order):
// 1. Parse (resolving against a base URL if the input is relative)
// 2. Reject anything that isn't http/https (mailto:, tel:, javascript:, ...)
// 3. Lower-case scheme and host, drop the default port (the url crate
//    does both for us on parse, along with resolving ./ and ../ segments)
// 4. Drop the fragment (#section never names a different page)
// 5. Strip a trailing slash unless the path is just "/" (policy flag)
// 6. Leave the query string alone by default - reordering parameters can
//    merge pages that are actually different (policy flag to sort anyway)
//
// This is a pure function: same input, same output, no I/O.
// =============================================================================

use serde::Deserialize;
use thiserror::Error;
use url::Url;

// Why a URL could not be normalized
//
// The aggregator turns these into entries in the "skipped" tally rather
// than aborting, so each variant maps to a stable reason key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The string is not a well-formed URL at all
    #[error("not a valid URL: {0}")]
    Malformed(String),
    /// Parsed fine, but the scheme is not http or https
    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),
    /// A relative URL was given with no base to resolve it against
    #[error("relative URL with no base: {0}")]
    NoBase(String),
}

impl NormalizeError {
    /// Stable short key for the skipped-reason tally
    pub fn reason(&self) -> &'static str {
        match self {
            NormalizeError::Malformed(_) => "malformed-url",
            NormalizeError::UnsupportedScheme(_) => "unsupported-scheme",
            NormalizeError::NoBase(_) => "relative-without-base",
        }
    }
}

// Policy knobs for the two normalization choices the target site might
// disagree with us on. Defaults: strip trailing slashes, keep query order.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizePolicy {
    /// Treat "/plans/" and "/plans" as the same page (default: true)
    pub strip_trailing_slash: bool,
    /// Sort query parameters alphabetically before comparing (default: false,
    /// because "?a=1&b=2" and "?b=2&a=1" may genuinely differ on some sites)
    pub sort_query: bool,
}

impl Default for NormalizePolicy {
    fn default() -> Self {
        Self {
            strip_trailing_slash: true,
            sort_query: false,
        }
    }
}

// Normalizes a raw URL string into its canonical Url form
//
// Parameters:
//   raw: the URL string (absolute, or relative if base is given)
//   base: the page the URL was found on (for resolving relative links)
//   policy: the trailing-slash / query-order knobs
//
// Returns: the canonical Url, or a NormalizeError describing why not
pub fn normalize_url(
    raw: &str,
    base: Option<&Url>,
    policy: &NormalizePolicy,
) -> Result<Url, NormalizeError> {
    let mut url = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            // join() resolves "/docs", "../other", "page.html" like a browser
            Some(base) => base
                .join(raw)
                .map_err(|_| NormalizeError::Malformed(raw.to_string()))?,
            None => return Err(NormalizeError::NoBase(raw.to_string())),
        },
        Err(_) => return Err(NormalizeError::Malformed(raw.to_string())),
    };

    // Only web pages are in scope; everything else is silently dropped
    // by the callers (it just never enters any set)
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(NormalizeError::UnsupportedScheme(other.to_string())),
    }

    // Fragments never change which page is served
    url.set_fragment(None);

    if policy.strip_trailing_slash {
        let path = url.path();
        if path.len() > 1 && path.ends_with('/') {
            let trimmed = path.trim_end_matches('/').to_string();
            if trimmed.is_empty() {
                url.set_path("/");
            } else {
                url.set_path(&trimmed);
            }
        }
    }

    if policy.sort_query {
        sort_query_pairs(&mut url);
    }

    Ok(url)
}

// Rewrites the query string with its key=value pairs in sorted order
fn sort_query_pairs(url: &mut Url) {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if pairs.is_empty() {
        // Also drops a bare "?" left over from an empty query
        url.set_query(None);
        return;
    }

    pairs.sort();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> Result<Url, NormalizeError> {
        normalize_url(raw, None, &NormalizePolicy::default())
    }

    #[test]
    fn test_lowercases_scheme_and_host() {
        let url = norm("HTTPS://Example.COM/Plans").unwrap();
        assert_eq!(url.as_str(), "https://example.com/Plans");
    }

    #[test]
    fn test_path_case_is_preserved() {
        // Only scheme and host are case-insensitive; paths are not
        let url = norm("https://example.com/Plans/Detail").unwrap();
        assert_eq!(url.path(), "/Plans/Detail");
    }

    #[test]
    fn test_drops_default_port() {
        let url = norm("https://example.com:443/a").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a");
    }

    #[test]
    fn test_strips_fragment() {
        let url = norm("https://example.com/a#section").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a");
    }

    #[test]
    fn test_strips_trailing_slash_but_not_root() {
        assert_eq!(
            norm("https://example.com/plans/").unwrap().as_str(),
            "https://example.com/plans"
        );
        assert_eq!(norm("https://example.com/").unwrap().as_str(), "https://example.com/");
    }

    #[test]
    fn test_trailing_slash_kept_when_policy_disabled() {
        let policy = NormalizePolicy {
            strip_trailing_slash: false,
            ..NormalizePolicy::default()
        };
        let url = normalize_url("https://example.com/plans/", None, &policy).unwrap();
        assert_eq!(url.as_str(), "https://example.com/plans/");
    }

    #[test]
    fn test_resolves_dot_segments() {
        let url = norm("https://example.com/a/../b/./c").unwrap();
        assert_eq!(url.path(), "/b/c");
    }

    #[test]
    fn test_resolves_relative_against_base() {
        let base = Url::parse("https://example.com/plans/detail").unwrap();
        let url = normalize_url("../devices", Some(&base), &NormalizePolicy::default()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/devices");
    }

    #[test]
    fn test_relative_without_base_is_rejected() {
        let err = norm("/plans").unwrap_err();
        assert_eq!(err.reason(), "relative-without-base");
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        for raw in ["mailto:a@b.com", "tel:+123", "javascript:void(0)", "ftp://x.com/f"] {
            let err = norm(raw).unwrap_err();
            assert_eq!(err.reason(), "unsupported-scheme", "for {}", raw);
        }
    }

    #[test]
    fn test_query_order_preserved_by_default() {
        let url = norm("https://example.com/a?b=2&a=1").unwrap();
        assert_eq!(url.query(), Some("b=2&a=1"));
    }

    #[test]
    fn test_query_sorted_when_policy_enabled() {
        let policy = NormalizePolicy {
            sort_query: true,
            ..NormalizePolicy::default()
        };
        let url = normalize_url("https://example.com/a?b=2&a=1", None, &policy).unwrap();
        assert_eq!(url.query(), Some("a=1&b=2"));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = [
            "HTTPS://Example.COM:443/Plans/?b=2&a=1#frag",
            "https://example.com/",
            "https://example.com/a/../b",
        ];
        for policy in [
            NormalizePolicy::default(),
            NormalizePolicy { strip_trailing_slash: false, sort_query: true },
        ] {
            for raw in inputs {
                let once = normalize_url(raw, None, &policy).unwrap();
                let twice = normalize_url(once.as_str(), None, &policy).unwrap();
                assert_eq!(once, twice, "not idempotent for {}", raw);
            }
        }
    }
}
