//! Conversion of HTML tables into row records.
//!
//! Real-world tables are rarely rectangular. Each table gets its own header
//! list, taken from `<thead>` or from the first row, and rows are reconciled
//! against it:
//!
//! - short rows are padded with empty cells up to the current header count
//! - long rows grow the header list with synthesized `col_N` names, and the
//!   grown list is used for every later row of the same table
//!
//! Every `<table>` is visited, nested ones included, and row lookups are
//! descendant-based, so an outer table also sees its inner tables' rows.

use crate::error::Result;
use crate::html::{PageDom, css, element_text};
use crate::models::{Table, TableRow};
use scraper::{ElementRef, Selector};
use tracing::debug;

struct TableSelectors {
    table: Selector,
    thead: Selector,
    th: Selector,
    tr: Selector,
    header_cell: Selector,
    td: Selector,
}

impl TableSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            table: css("table")?,
            thead: css("thead")?,
            th: css("th")?,
            tr: css("tr")?,
            header_cell: css("th, td")?,
            td: css("td")?,
        })
    }
}

/// Extract every table with at least one data row, in document order.
pub fn extract_tables(dom: &PageDom) -> Result<Vec<Table>> {
    let sel = TableSelectors::new()?;
    let mut tables = Vec::new();

    for (index, table) in dom.find_all(&sel.table).enumerate() {
        let mut headers = table_headers(table, &sel);
        let rows: Vec<TableRow> = table
            .select(&sel.tr)
            .filter_map(|tr| {
                let values: Vec<String> = tr.select(&sel.td).map(element_text).collect();
                if values.is_empty() {
                    None
                } else {
                    Some(build_row(values, &mut headers))
                }
            })
            .collect();

        if rows.is_empty() {
            debug!(index, "Skipping table without data rows");
            continue;
        }
        tables.push(Table { rows });
    }

    Ok(tables)
}

fn table_headers(table: ElementRef<'_>, sel: &TableSelectors) -> Vec<String> {
    let cells: Vec<String> = if let Some(thead) = table.select(&sel.thead).next() {
        thead.select(&sel.th).map(element_text).collect()
    } else if let Some(first_row) = table.select(&sel.tr).next() {
        first_row.select(&sel.header_cell).map(element_text).collect()
    } else {
        Vec::new()
    };

    cells
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            if text.is_empty() {
                synthesized_column(i)
            } else {
                text
            }
        })
        .collect()
}

/// Reconcile one row of cell values with the table's header list.
///
/// `headers` belongs to a single table and is only ever extended.
pub fn build_row(mut values: Vec<String>, headers: &mut Vec<String>) -> TableRow {
    if values.len() < headers.len() {
        values.resize(headers.len(), String::new());
    }
    while headers.len() < values.len() {
        headers.push(synthesized_column(headers.len()));
    }

    headers.iter().cloned().zip(values).collect()
}

fn synthesized_column(index: usize) -> String {
    format!("col_{}", index + 1)
}
