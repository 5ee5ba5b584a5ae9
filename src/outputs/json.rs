//! JSON output of extraction records.

use crate::error::ExportError;
use crate::models::ExtractionRecord;
use crate::outputs::write_file;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Serialize `record`, pretty-printed unless `compact`.
pub fn to_json(record: &ExtractionRecord, compact: bool) -> Result<String, ExportError> {
    let json = if compact {
        serde_json::to_string(record)?
    } else {
        serde_json::to_string_pretty(record)?
    };
    Ok(json)
}

/// Write `record` as `{dir}/record.json`.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn write_record(record: &ExtractionRecord, dir: &Path) -> Result<PathBuf, ExportError> {
    let path = dir.join("record.json");
    let json = to_json(record, false)?;
    write_file(&path, &json).await?;
    info!(path = %path.display(), bytes = json.len(), "Wrote JSON record");
    Ok(path)
}
