// src/rules.rs
// =============================================================================
// This module decides which content category (if any) a URL belongs to.
//
// The configuration gives us an ordered list of (category, polarity, pattern)
// triples. Classification runs in two explicit passes:
// 1. Every EXCLUDE pattern, across all categories. One hit = rejected,
//    no matter what the include patterns say.
// 2. INCLUDE patterns in configured order; the first match wins and its
//    category is assigned. Order matters, so callers get deterministic
//    results when a URL could fit more than one category.
//
// A URL that matches nothing is simply out of scope - there is no default
// category.
//
// Patterns are case-insensitive regexes matched against the PATH component
// only (never the query string).
// =============================================================================

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use url::Url;

// Whether a pattern admits URLs into a category or blocks them outright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Include,
    Exclude,
}

// One pattern row as it appears in the config file
//
// Example: { "category": "plans", "polarity": "include", "pattern": "^/plans(/|$)" }
#[derive(Debug, Clone, Deserialize)]
pub struct PatternSpec {
    pub category: String,
    pub polarity: Polarity,
    pub pattern: String,
}

// A compiled rule, ready for matching
#[derive(Debug)]
struct Rule {
    category: String,
    polarity: Polarity,
    regex: Regex,
}

// The full ordered rule list
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    // Compiles the configured pattern rows into regexes
    //
    // A pattern that fails to compile is a configuration error and aborts
    // startup - there is no sensible way to "skip" a rule the user wrote.
    pub fn compile(specs: &[PatternSpec]) -> Result<Self> {
        let mut rules = Vec::with_capacity(specs.len());

        for spec in specs {
            let regex = RegexBuilder::new(&spec.pattern)
                .case_insensitive(true)
                .build()
                .with_context(|| {
                    format!(
                        "invalid pattern '{}' for category '{}'",
                        spec.pattern, spec.category
                    )
                })?;

            rules.push(Rule {
                category: spec.category.clone(),
                polarity: spec.polarity,
                regex,
            });
        }

        Ok(Self { rules })
    }

    // Classifies a URL
    //
    // Returns: Some(category) if the URL is in scope, None otherwise
    pub fn classify(&self, url: &Url) -> Option<&str> {
        let path = url.path();

        // Pass 1: excludes take precedence over everything
        for rule in self.rules.iter().filter(|r| r.polarity == Polarity::Exclude) {
            if rule.regex.is_match(path) {
                return None;
            }
        }

        // Pass 2: first matching include wins
        for rule in self.rules.iter().filter(|r| r.polarity == Polarity::Include) {
            if rule.regex.is_match(path) {
                return Some(&rule.category);
            }
        }

        None
    }

    /// The configured include categories, in configured order, deduplicated.
    /// Used by the reporter so categories with zero matches still show up.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for rule in &self.rules {
            if rule.polarity == Polarity::Include && !seen.contains(&rule.category.as_str()) {
                seen.push(rule.category.as_str());
            }
        }
        seen
    }

    /// Number of include rules (used by config validation)
    pub fn include_count(&self) -> usize {
        self.rules
            .iter()
            .filter(|r| r.polarity == Polarity::Include)
            .count()
    }
}
