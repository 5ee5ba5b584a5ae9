//! Command-line interface definitions for page_facts.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Fetch tunables can also be provided via environment variables or a YAML
//! config file (see [`crate::config`]).

use clap::Parser;

/// Command-line arguments for the page_facts binary.
///
/// # Examples
///
/// ```sh
/// # Print the record for one page as JSON
/// page_facts https://example.com
///
/// # Write JSON + CSV bundles for several pages
/// page_facts -o ./out example.com example.org
///
/// # Tune retries and timeouts
/// page_facts --max-attempts 5 --timeout-secs 10 -c page_facts.yaml https://example.com
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Page(s) to extract; `https://` is assumed when no scheme is given
    #[arg(required = true, num_args = 1..)]
    pub urls: Vec<String>,

    /// Directory for JSON and CSV bundles (one sub-directory per URL)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Per-attempt HTTP timeout in seconds
    #[arg(long, env = "PAGE_FACTS_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Total fetch attempts per URL
    #[arg(long, env = "PAGE_FACTS_MAX_ATTEMPTS")]
    pub max_attempts: Option<usize>,

    /// How many URLs to extract at the same time
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Print single-line JSON instead of pretty-printed JSON
    #[arg(long)]
    pub compact: bool,
}
