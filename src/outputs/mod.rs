//! Export of extraction records to files.
//!
//! # Submodules
//!
//! - [`json`]: Writes the whole record as `record.json`
//! - [`csv`]: Writes one CSV per facet plus the full text
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── example-com-about_20261017T093000Z/
//!     ├── record.json
//!     ├── contacts.csv
//!     ├── links.csv
//!     ├── forms.csv        # only when the page has forms
//!     ├── table_1.csv      # one per extracted table
//!     └── text.txt
//! ```

pub mod csv;
pub mod json;

use crate::error::ExportError;
use crate::models::ExtractionRecord;
use crate::utils::{slugify_url, timestamp_tag};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// Directory that will hold the bundle for `record` under `base`.
pub fn bundle_dir(base: &str, record: &ExtractionRecord) -> PathBuf {
    Path::new(base).join(format!("{}_{}", slugify_url(&record.url), timestamp_tag()))
}

/// Write `record.json` and the CSV bundle into a fresh directory under `base`.
///
/// When [`bundle_dir`] already exists (the same URL exported twice within
/// one second) the directory gets a `_2`, `_3`, ... suffix instead of
/// overwriting the earlier bundle.
///
/// # Returns
///
/// The bundle directory.
#[instrument(level = "info", skip_all, fields(%base, url = %record.url))]
pub async fn write_all(record: &ExtractionRecord, base: &str) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(base).await.map_err(|source| ExportError::Io {
        path: base.to_string(),
        source,
    })?;
    let dir = create_fresh_dir(bundle_dir(base, record)).await?;

    json::write_record(record, &dir).await?;
    let written = csv::write_bundle(record, &dir).await?;
    info!(dir = %dir.display(), files = written.len() + 1, "Wrote export bundle");
    Ok(dir)
}

async fn create_fresh_dir(preferred: PathBuf) -> Result<PathBuf, ExportError> {
    let stem = preferred
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut candidate = preferred.clone();
    let mut suffix = 1usize;
    loop {
        match fs::create_dir(&candidate).await {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                suffix += 1;
                debug!(taken = %candidate.display(), suffix, "Bundle directory exists");
                candidate = preferred.with_file_name(format!("{stem}_{suffix}"));
            }
            Err(source) => {
                return Err(ExportError::Io {
                    path: candidate.display().to_string(),
                    source,
                });
            }
        }
    }
}

pub(crate) async fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    fs::write(path, contents).await.map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}
