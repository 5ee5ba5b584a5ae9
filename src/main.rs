//! # page_facts
//!
//! Command-line front end: extracts one or more pages and prints the records
//! as JSON, or writes a JSON + CSV bundle per page.
//!
//! ```sh
//! page_facts https://example.com
//! page_facts -o ./out example.com example.org
//! ```

use clap::Parser;
use futures::stream::{self, StreamExt};
use page_facts::cli::Cli;
use page_facts::config::{self, FileConfig};
use page_facts::outputs::{self, json};
use page_facts::utils::{ensure_writable_dir, truncate_for_log};
use page_facts::{ExtractionRecord, Extractor};
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init (stderr, so stdout stays pure JSON) ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("page_facts starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let file_config = match &args.config {
        Some(path) => config::load_config(path).await?,
        None => FileConfig::default(),
    };
    let settings = config::resolve(&args, &file_config);
    info!(
        urls = args.urls.len(),
        concurrency = settings.concurrency,
        max_attempts = settings.fetch.max_attempts,
        timeout = ?settings.fetch.timeout,
        "Configuration resolved"
    );

    // Early check: fail before any network traffic if the output dir is unusable
    if let Some(dir) = &args.output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory is not writable");
            return Err(e);
        }
    }

    let extractor = Extractor::from_options(&settings.fetch)?;

    let results: Vec<(String, Option<ExtractionRecord>)> = stream::iter(args.urls.iter())
        .map(|url| {
            let extractor = &extractor;
            async move {
                match extractor.extract(url).await {
                    Ok(record) => (url.clone(), Some(record)),
                    Err(e) => {
                        error!(%url, error = %e, "Extraction failed");
                        (url.clone(), None)
                    }
                }
            }
        })
        .buffer_unordered(settings.concurrency)
        .collect()
        .await;

    let mut failed = 0usize;
    let mut records = Vec::new();
    for (url, record) in results {
        match record {
            Some(record) => records.push(record),
            None => {
                failed += 1;
                warn!(%url, "No record produced");
            }
        }
    }
    // buffer_unordered finishes in completion order; report in input order
    records.sort_by_key(|r| args.urls.iter().position(|u| normalized_eq(u, &r.url)));

    match &args.output_dir {
        Some(dir) => {
            for record in &records {
                if let Err(e) = outputs::write_all(record, dir).await {
                    error!(url = %record.url, error = %e, "Failed to write export bundle");
                    failed += 1;
                }
            }
        }
        None => emit_stdout(&records, args.compact)?,
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        succeeded = records.len(),
        failed,
        "Execution complete"
    );

    if failed > 0 {
        return Err(format!("{failed} of {} URL(s) failed", args.urls.len()).into());
    }
    Ok(())
}

fn emit_stdout(records: &[ExtractionRecord], compact: bool) -> Result<(), Box<dyn Error>> {
    let out = match records {
        [single] => json::to_json(single, compact)?,
        many => {
            if compact {
                serde_json::to_string(many)?
            } else {
                serde_json::to_string_pretty(many)?
            }
        }
    };
    debug!(preview = %truncate_for_log(&out, 200), "Emitting JSON");
    println!("{out}");
    Ok(())
}

/// Whether CLI input `raw` produced the record URL `url`.
fn normalized_eq(raw: &str, url: &str) -> bool {
    page_facts::utils::normalize_url(raw).is_ok_and(|(normalized, _)| normalized == url)
}
