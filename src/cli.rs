// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Enums: Types that can be one of several variants
// - Derive macros: Automatically generate code for our types
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "site-scout",
    version = "0.1.0",
    about = "A CLI tool to discover and inventory in-scope URLs on a website",
    long_about = "site-scout combines sitemap enumeration with a bounded-depth crawl to find every \
                  URL on a site that matches your include/exclude patterns, deduplicates them, and \
                  writes a categorized inventory report."
)]
pub struct Cli {
    // The #[command(subcommand)] attribute tells clap that this field
    // will hold one of the subcommands defined in the Commands enum
    #[command(subcommand)]
    pub command: Commands,
}

// This enum defines our subcommands (discover, sitemap)
//
// Each variant represents a different subcommand the user can run
// The fields inside each variant become the arguments for that subcommand
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run full discovery (sitemaps + bounded crawl) and write the inventory
    ///
    /// Example: site-scout discover https://example.com --config scout.json --max-depth 2
    Discover {
        /// Base site URL; discovery never leaves this host
        base_url: String,

        /// Path to the JSON config with seeds and include/exclude patterns
        #[arg(long)]
        config: PathBuf,

        /// Write the report as pretty JSON to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the report as JSON on stdout instead of a table
        #[arg(long)]
        json: bool,

        /// Maximum crawl depth (0 = seeds only, default: 2)
        ///
        /// Depth counts link hops from a seed:
        /// 0 = just the seed pages
        /// 1 = seeds + everything they link to
        /// etc.
        #[arg(long, default_value_t = 2)]
        max_depth: usize,

        /// Minimum delay between requests, in seconds (default: 0.5)
        ///
        /// This is a global politeness throttle shared by all fetches
        #[arg(long, default_value_t = 0.5)]
        throttle: f64,
    },

    /// Enumerate sitemap-declared URLs only (no crawling, no patterns)
    ///
    /// Example: site-scout sitemap https://example.com
    Sitemap {
        /// Base site URL whose robots.txt declares the sitemaps
        base_url: String,

        /// Print the URL list as JSON instead of one URL per line
        #[arg(long)]
        json: bool,

        /// Minimum delay between requests, in seconds (default: 0.5)
        #[arg(long, default_value_t = 0.5)]
        throttle: f64,
    },
}
