//! Error types for page extraction.
//!
//! Every failure surfaced by [`crate::extract`] falls into one of a few
//! categories: the input URL was unusable, the page could not be fetched,
//! or the document could not be processed at all. Building the HTTP client
//! can also fail before any request is made.

use std::io;

/// A single failed fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    /// Connection, TLS, redirect or body-read failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

impl From<reqwest::Error> for FetchFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchFailure::Timeout
        } else {
            FetchFailure::Transport(e.to_string())
        }
    }
}

/// Error type for extraction operations.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Empty or unparseable URL; raised before any network activity.
    #[error("invalid input URL {input:?}: {reason}")]
    InvalidInput { input: String, reason: String },

    /// Every fetch attempt failed. Carries the last failure.
    #[error("fetch failed after {attempts} attempt(s): {cause}")]
    Fetch {
        attempts: usize,
        #[source]
        cause: FetchFailure,
    },

    /// The HTTP client could not be built from the fetch options, e.g. a
    /// header value that is not valid ASCII. No request was attempted.
    #[error("HTTP client setup failed: {0}")]
    Client(#[source] FetchFailure),

    /// The document could not be processed.
    #[error("HTML parsing failed: {0}")]
    Parse(String),
}

/// Error type for the CSV/JSON exporters.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error type for loading the YAML configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
