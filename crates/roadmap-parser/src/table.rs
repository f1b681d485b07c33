//! Table extraction
//!
//! Turns a `<table>` into a [`TabularRecord`]: header names plus one
//! column-keyed map per data row. Header rows are taken from `<thead>` when
//! present, otherwise from the first non-empty body row. A table with no
//! usable rows yet is waited on until its content changes.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

use crate::dom::Element;
use crate::source::TableSource;

/// Cells of one data row keyed by lower-cased column name
pub type TableRow = HashMap<String, Element>;

/// A table reduced to named columns
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TabularRecord {
    /// Header text as written
    pub column_names: Vec<String>,
    /// Lower-cased header text used for lookups
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl TabularRecord {
    fn new(header: &Element, rows: &[&Element]) -> Self {
        let column_names: Vec<String> = header
            .child_elements()
            .map(|cell| normalize_space(&cell.text()))
            .collect();
        let columns: Vec<String> = column_names.iter().map(|c| c.to_lowercase()).collect();
        let rows = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .cloned()
                    .zip(row.child_elements().cloned())
                    .collect()
            })
            .collect();
        Self {
            column_names,
            columns,
            rows,
        }
    }

    pub fn has_column(&self, key: &str) -> bool {
        self.columns.iter().any(|c| c == key)
    }
}

/// Waiting for table content failed
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("Table has no rows and its content can no longer change")]
    Closed,

    #[error("Timed out after {0:?} waiting for table rows")]
    TimedOut(Duration),
}

/// Trim with non-breaking spaces treated as ordinary spaces
pub fn normalize_space(text: &str) -> String {
    text.replace('\u{a0}', " ").trim().to_string()
}

/// `<tr>` children of the table body, in document order
fn body_rows(table: &Element) -> Vec<&Element> {
    let mut rows = Vec::new();
    for child in table.child_elements() {
        if child.is("tbody") {
            rows.extend(child.child_elements().filter(|e| e.is("tr")));
        } else if child.is("tr") {
            rows.push(child);
        }
    }
    rows
}

fn header_row(table: &Element) -> Option<&Element> {
    table
        .child_elements()
        .find(|e| e.is("thead"))
        .and_then(|head| head.child_elements().find(|e| e.is("tr")))
}

/// Extract a record if the table already has enough structure.
///
/// `None` means the table is still waiting for its rows.
pub fn try_extract(table: &Element) -> Option<TabularRecord> {
    let rows = body_rows(table);

    if let Some(header) = header_row(table) {
        return Some(TabularRecord::new(header, &rows));
    }

    // Some content macros emit a spurious empty <tr></tr> first
    let mut rows = rows.as_slice();
    while rows.len() >= 2 && rows[0].child_elements().next().is_none() {
        rows = &rows[1..];
    }
    match rows {
        [header, data @ ..] if !data.is_empty() && header.child_elements().next().is_some() => {
            Some(TabularRecord::new(header, data))
        }
        _ => None,
    }
}

/// Extract the table, waiting for content while it has no rows.
///
/// Each change restarts extraction from the top. Without a timeout the
/// wait only ends when rows arrive or the source closes.
pub async fn parse_table(
    source: &mut TableSource,
    timeout: Option<Duration>,
) -> Result<TabularRecord, TableError> {
    let wait = async {
        loop {
            let table = source.snapshot();
            if let Some(record) = try_extract(&table) {
                return Ok(record);
            }
            tracing::debug!("table has no rows yet, waiting for content");
            if !source.changed().await {
                return Err(TableError::Closed);
            }
        }
    };

    match timeout {
        Some(limit) => tokio::time::timeout(limit, wait)
            .await
            .map_err(|_| TableError::TimedOut(limit))?,
        None => wait.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_fragment;
    use pretty_assertions::assert_eq;

    fn table(html: &str) -> Element {
        parse_fragment(html)
            .unwrap()
            .find(|e| e.is("table"))
            .unwrap()
            .clone()
    }

    #[test]
    fn uses_thead_when_present() {
        let t = table(
            "<table><thead><tr><th>Swimlane</th><th> Title </th></tr></thead>\
             <tbody><tr><td>Backend</td><td>API</td></tr></tbody></table>",
        );
        let record = try_extract(&t).unwrap();
        assert_eq!(record.column_names, vec!["Swimlane", "Title"]);
        assert_eq!(record.columns, vec!["swimlane", "title"]);
        assert_eq!(record.rows.len(), 1);
        assert_eq!(record.rows[0]["title"].text(), "API");
    }

    #[test]
    fn thead_with_empty_body_is_ready() {
        let t = table("<table><thead><tr><th>A</th></tr></thead><tbody></tbody></table>");
        let record = try_extract(&t).unwrap();
        assert!(record.rows.is_empty());
    }

    #[test]
    fn first_body_row_becomes_header() {
        let t = table(
            "<table><tbody><tr><th>Swimlane</th><th>Title</th></tr>\
             <tr><td>Ops</td><td>Migrate</td></tr></tbody></table>",
        );
        let record = try_extract(&t).unwrap();
        assert_eq!(record.columns, vec!["swimlane", "title"]);
        assert_eq!(record.rows[0]["swimlane"].text(), "Ops");
    }

    #[test]
    fn skips_leading_empty_rows() {
        let t = table(
            "<table><tbody><tr></tr><tr><th>Key</th></tr><tr><td>ABC-1</td></tr></tbody></table>",
        );
        let record = try_extract(&t).unwrap();
        assert_eq!(record.columns, vec!["key"]);
        assert_eq!(record.rows.len(), 1);
    }

    #[test]
    fn short_rows_are_sparse() {
        let t = table(
            "<table><tr><th>A</th><th>B</th><th>C</th></tr><tr><td>1</td></tr></table>",
        );
        let record = try_extract(&t).unwrap();
        assert_eq!(record.rows[0].len(), 1);
        assert!(record.rows[0].contains_key("a"));
        assert!(!record.rows[0].contains_key("b"));
    }

    #[test]
    fn unpopulated_tables_are_pending() {
        assert!(try_extract(&table("<table></table>")).is_none());
        assert!(try_extract(&table("<table><tbody><tr><th>A</th></tr></tbody></table>")).is_none());
        assert!(try_extract(&table("<table><tbody><tr></tr><tr></tr></tbody></table>")).is_none());
    }

    #[tokio::test]
    async fn fixed_empty_table_reports_closed() {
        let mut source = TableSource::fixed(table("<table><tbody></tbody></table>"));
        assert_eq!(parse_table(&mut source, None).await, Err(TableError::Closed));
    }

    #[tokio::test]
    async fn waits_for_rows_to_arrive() {
        let (populator, mut source) = TableSource::channel(table("<table><tbody></tbody></table>"));

        let filler = async {
            tokio::task::yield_now().await;
            populator
                .append_rows("<tr><th>Swimlane</th></tr><tr><td>Late</td></tr>")
                .unwrap();
        };
        let (record, ()) = tokio::join!(parse_table(&mut source, None), filler);

        let record = record.unwrap();
        assert_eq!(record.rows[0]["swimlane"].text(), "Late");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_bounds_the_wait() {
        let (_populator, mut source) = TableSource::channel(table("<table></table>"));
        let limit = Duration::from_secs(5);
        assert_eq!(
            parse_table(&mut source, Some(limit)).await,
            Err(TableError::TimedOut(limit))
        );
    }
}
