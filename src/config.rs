// src/config.rs
// =============================================================================
// This module loads and validates the discovery configuration file.
//
// The config is a JSON document holding everything that describes WHAT to
// discover (seeds and patterns), while the command line holds the knobs
// for HOW (depth, throttle, output location):
//
// {
//   "seeds": ["https://example.com/plans"],
//   "patterns": [
//     { "category": "plans",  "polarity": "include", "pattern": "^/plans(/|$)" },
//     { "category": "plans",  "polarity": "exclude", "pattern": "^/plans/billing/" }
//   ],
//   "normalize": { "strip_trailing_slash": true, "sort_query": false },
//   "fetch_timeout_secs": 10
// }
//
// Config problems are the ONE fatal error class in this tool: without valid
// seeds and patterns there is nothing meaningful to discover, so we fail
// fast with a message naming the bad field instead of starting a run.
// =============================================================================

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::normalize::NormalizePolicy;
use crate::rules::{PatternSpec, RuleSet};

fn default_fetch_timeout_secs() -> u64 {
    10
}

// The raw deserialized config file
#[derive(Debug, Deserialize)]
pub struct DiscoveryConfig {
    /// Starting URLs for the crawl (must be on the base host)
    pub seeds: Vec<String>,
    /// Ordered (category, polarity, pattern) rows
    pub patterns: Vec<PatternSpec>,
    /// URL normalization policy knobs
    #[serde(default)]
    pub normalize: NormalizePolicy,
    /// Per-request timeout for the HTTP fetcher
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

// Loads the config file and compiles its patterns
//
// Returns: the config plus the ready-to-use RuleSet, or a fatal error
// naming the missing/invalid field
pub fn load_config(path: &Path) -> Result<(DiscoveryConfig, RuleSet)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    parse_config(&text).with_context(|| format!("invalid config file {}", path.display()))
}

// Parses and validates config JSON (split out from load_config so tests
// don't need files on disk)
pub fn parse_config(text: &str) -> Result<(DiscoveryConfig, RuleSet)> {
    let config: DiscoveryConfig = serde_json::from_str(text).context("config is not valid JSON")?;

    if config.seeds.is_empty() {
        bail!("'seeds' must list at least one starting URL");
    }

    // Compiling also reports which pattern is broken, if any
    let rules = RuleSet::compile(&config.patterns)?;

    if rules.include_count() == 0 {
        bail!("'patterns' must contain at least one include pattern");
    }

    Ok((config, rules))
}
