// src/sitemap/parse.rs
// =============================================================================
// This file parses sitemap XML with quick-xml's streaming event reader.
//
// The sitemap protocol has two document kinds, told apart by the root
// element:
// - <sitemapindex> : every <sitemap><loc> child names ANOTHER sitemap
// - <urlset>       : every <url><loc> child names an actual page
//
// We read events and keep a stack of element names so that when a text
// node arrives inside <loc>, we know whether its parent was <sitemap>
// or <url>. Namespaces are ignored (local names only) - real-world
// sitemaps use a mix of prefixed and default namespaces.
// =============================================================================

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid sitemap XML: {0}")]
pub struct SitemapParseError(pub String);

// A successfully parsed sitemap document
#[derive(Debug, PartialEq)]
pub enum SitemapDoc {
    /// A sitemap-index: these locs are sitemaps to expand further
    Index(Vec<String>),
    /// A urlset: these locs are page URLs
    UrlSet(Vec<String>),
}

// Parses one sitemap document
//
// Returns: the document kind with its <loc> values, or a parse error if
// the XML is malformed or the root element is neither known kind
pub fn parse_sitemap_xml(xml: &str) -> Result<SitemapDoc, SitemapParseError> {
    let mut reader = Reader::from_str(xml);

    // Element name stack; stack[0] is the root once we have seen it
    let mut stack: Vec<String> = Vec::new();
    let mut root: Option<String> = None;
    let mut locs: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                if root.is_none() {
                    root = Some(name.clone());
                }
                stack.push(name);
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(t)) => {
                if current_is_loc(&stack) {
                    let text = t
                        .unescape()
                        .map_err(|e| SitemapParseError(e.to_string()))?;
                    push_loc(&mut locs, &text);
                }
            }
            Ok(Event::CData(c)) => {
                // Some generators wrap locs in CDATA
                if current_is_loc(&stack) {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    push_loc(&mut locs, &text);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {} // declarations, comments, empty elements
            Err(e) => return Err(SitemapParseError(e.to_string())),
        }
    }

    // quick-xml tolerates some truncation; an unclosed element at EOF
    // means the document was cut off mid-transfer
    if !stack.is_empty() {
        return Err(SitemapParseError("document ends with unclosed elements".to_string()));
    }

    match root.as_deref() {
        Some("sitemapindex") => Ok(SitemapDoc::Index(locs)),
        Some("urlset") => Ok(SitemapDoc::UrlSet(locs)),
        Some(other) => Err(SitemapParseError(format!(
            "unexpected root element <{}>",
            other
        ))),
        None => Err(SitemapParseError("no root element".to_string())),
    }
}

fn current_is_loc(stack: &[String]) -> bool {
    stack.last().map(|s| s.as_str()) == Some("loc")
}

fn push_loc(locs: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        locs.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>https://example.com/plans</loc><lastmod>2024-01-01</lastmod></url>
              <url><loc> https://example.com/devices </loc></url>
            </urlset>"#;
        let doc = parse_sitemap_xml(xml).unwrap();
        assert_eq!(
            doc,
            SitemapDoc::UrlSet(vec![
                "https://example.com/plans".to_string(),
                "https://example.com/devices".to_string(),
            ])
        );
    }

    #[test]
    fn test_parses_sitemap_index() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sitemap><loc>https://example.com/sitemap-a.xml</loc></sitemap>
              <sitemap><loc>https://example.com/sitemap-b.xml</loc></sitemap>
            </sitemapindex>"#;
        let doc = parse_sitemap_xml(xml).unwrap();
        assert_eq!(
            doc,
            SitemapDoc::Index(vec![
                "https://example.com/sitemap-a.xml".to_string(),
                "https://example.com/sitemap-b.xml".to_string(),
            ])
        );
    }

    #[test]
    fn test_cdata_loc() {
        let xml = r#"<urlset><url><loc><![CDATA[https://example.com/a?x=1&y=2]]></loc></url></urlset>"#;
        let doc = parse_sitemap_xml(xml).unwrap();
        assert_eq!(
            doc,
            SitemapDoc::UrlSet(vec!["https://example.com/a?x=1&y=2".to_string()])
        );
    }

    #[test]
    fn test_unknown_root_is_an_error() {
        assert!(parse_sitemap_xml("<html><body>not a sitemap</body></html>").is_err());
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(parse_sitemap_xml("<urlset><url><loc>https://x").is_err());
        assert!(parse_sitemap_xml("").is_err());
    }
}
