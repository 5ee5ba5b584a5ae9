//! Per-facet CSV export.
//!
//! Fields are never quoted. Instead every comma, carriage return and newline
//! inside a value is replaced by a space, so each record is exactly one line
//! with a fixed number of fields.

use crate::error::ExportError;
use crate::models::{ExtractionRecord, Table};
use crate::outputs::write_file;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Make a value safe to place in an unquoted CSV field.
pub fn sanitize(value: &str) -> String {
    value.replace([',', '\r', '\n'], " ")
}

fn push_row<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    let line = fields
        .into_iter()
        .map(sanitize)
        .collect::<Vec<_>>()
        .join(",");
    // writing to a String cannot fail
    let _ = writeln!(out, "{line}");
}

/// `type,value` rows: every email first, then every phone.
pub fn contacts_csv(record: &ExtractionRecord) -> String {
    let mut out = String::new();
    push_row(&mut out, ["type", "value"]);
    for email in &record.emails {
        push_row(&mut out, ["email", email.as_str()]);
    }
    for phone in &record.phones {
        push_row(&mut out, ["phone", phone.as_str()]);
    }
    out
}

/// `text,url` rows in document order.
///
/// Link text is trimmed after sanitizing, so a trailing comma or newline
/// does not leave a dangling space.
pub fn links_csv(record: &ExtractionRecord) -> String {
    let mut out = String::new();
    push_row(&mut out, ["text", "url"]);
    for link in &record.links {
        let text = sanitize(&link.text);
        push_row(&mut out, [text.trim(), link.href.as_str()]);
    }
    out
}

/// `action,input_name,input_type` rows.
pub fn forms_csv(record: &ExtractionRecord) -> String {
    let mut out = String::new();
    push_row(&mut out, ["action", "input_name", "input_type"]);
    for field in &record.forms {
        push_row(
            &mut out,
            [
                field.action.as_str(),
                field.input_name.as_str(),
                field.input_type.as_str(),
            ],
        );
    }
    out
}

/// One table in its header order; cells a row lacks are left empty.
pub fn table_csv(table: &Table) -> String {
    let columns = table.columns();
    let mut out = String::new();
    push_row(&mut out, columns.iter().map(String::as_str));
    for row in &table.rows {
        push_row(
            &mut out,
            columns.iter().map(|c| row.get(c).map_or("", String::as_str)),
        );
    }
    out
}

/// Write every CSV facet plus `text.txt` into `dir`.
///
/// `forms.csv` is only written when the page has forms; tables are written
/// as `table_1.csv`, `table_2.csv`, ... in document order.
///
/// # Returns
///
/// The paths written, in the order above.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn write_bundle(
    record: &ExtractionRecord,
    dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    let mut files: Vec<(PathBuf, String)> = vec![
        (dir.join("contacts.csv"), contacts_csv(record)),
        (dir.join("links.csv"), links_csv(record)),
    ];
    if !record.forms.is_empty() {
        files.push((dir.join("forms.csv"), forms_csv(record)));
    }
    for (i, table) in record.tables.iter().enumerate() {
        files.push((dir.join(format!("table_{}.csv", i + 1)), table_csv(table)));
    }
    files.push((dir.join("text.txt"), record.text.clone()));

    let mut written = Vec::with_capacity(files.len());
    for (path, contents) in files {
        write_file(&path, &contents).await?;
        debug!(path = %path.display(), bytes = contents.len(), "Wrote export file");
        written.push(path);
    }
    Ok(written)
}
