//! # page_facts
//!
//! Fetches a single web page and extracts structured facts from it: title,
//! meta description and keywords, email addresses, phone numbers, links
//! (with social profiles grouped by platform), tables as row records,
//! form fields and normalized visible text.
//!
//! ## Usage
//!
//! ```no_run
//! # async fn run() -> Result<(), page_facts::ExtractError> {
//! let record = page_facts::extract("example.com").await?;
//! println!("{} has {} links", record.title, record.links.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: GET with browser headers, retried with linear backoff
//!    ([`fetch`])
//! 2. **Classification**: `Content-Type` picks the HTML or opaque path
//!    ([`classify`])
//! 3. **Extraction**: HTML facets ([`html`], [`tables`]), social buckets
//!    ([`social`]) and entity scanning ([`entities`])
//! 4. **Output**: an immutable [`ExtractionRecord`], optionally exported as
//!    JSON and CSV ([`outputs`])

pub mod classify;
pub mod cli;
pub mod config;
pub mod entities;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod html;
pub mod models;
pub mod outputs;
pub mod social;
pub mod tables;
pub mod utils;

pub use error::{ExtractError, FetchFailure};
pub use extract::{Extractor, extract};
pub use fetch::{FetchOptions, RetryFetch, Transport};
pub use models::{ExtractionRecord, FormField, Link, Meta, Table, TableRow};
