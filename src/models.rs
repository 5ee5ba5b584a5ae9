//! Data models for fetched pages and their extracted facts.
//!
//! This module defines the structures shared across the pipeline:
//! - [`FetchResult`]: The raw response handed over by the fetcher
//! - [`ExtractionRecord`]: The immutable output of one extraction
//! - Facet types: [`Meta`], [`Link`], [`Table`], [`TableRow`], [`FormField`]
//!
//! Everything in [`ExtractionRecord`] serializes with serde so callers can
//! turn it into JSON or hand it to the exporters in [`crate::outputs`].

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A successful HTTP response as seen by the rest of the pipeline.
///
/// Owned by the fetcher and consumed read-only by the extractors.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The effective URL after redirects.
    pub final_url: String,
    /// HTTP status code (always 2xx once it leaves the fetcher).
    pub status: u16,
    /// Raw `Content-Type` header value, if the server sent one.
    pub content_type: Option<String>,
    /// Decoded response body.
    pub body: String,
}

/// `description` and `keywords` meta tags, empty when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Meta {
    pub description: String,
    pub keywords: String,
}

/// An anchor found on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Trimmed anchor text, or the absolute URL when the anchor has no text.
    pub text: String,
    /// Absolute URL resolved against the request URL.
    pub href: String,
}

/// One form control, flattened together with its owning form's action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub action: String,
    pub input_name: String,
    pub input_type: String,
}

/// One table row keyed by column header.
///
/// Keeps insertion order so exports can follow the table's header order.
/// Inserting an existing column replaces its value in place.
pub type TableRow = IndexMap<String, String>;

/// A table as an ordered list of row records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Column names in order of first appearance across all rows.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .iter()
            .flat_map(IndexMap::keys)
            .unique()
            .cloned()
            .collect()
    }
}

/// The immutable result of extracting one page.
///
/// Built once per request by [`crate::extract`]; nothing in the crate
/// mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionRecord {
    /// The request URL, echoed (not the redirect target).
    pub url: String,
    /// Where the request actually ended up after redirects.
    pub final_url: String,
    /// The response `Content-Type`, empty if none was sent.
    pub content_type: String,
    /// Page title, or the request URL when the page has no `<title>`.
    pub title: String,
    pub meta: Meta,
    /// Unique email addresses, sorted.
    pub emails: BTreeSet<String>,
    /// Unique phone numbers, sorted.
    pub phones: BTreeSet<String>,
    /// Links in document order, duplicates kept.
    pub links: Vec<Link>,
    /// Platform name to sorted unique hrefs. Platforms without links are absent.
    pub social_links: BTreeMap<String, BTreeSet<String>>,
    /// Tables with at least one data row, in document order.
    pub tables: Vec<Table>,
    pub forms: Vec<FormField>,
    /// Whitespace-normalized visible text.
    pub text: String,
}
