//! # roadmap-parser
//!
//! Tolerant parser turning the HTML tables of a wiki page into roadmap
//! swimlanes.
//!
//! This crate provides:
//! - A light HTML element tree built on `lol_html` ([`dom`])
//! - Duration, date and status cell parsers
//! - Table extraction that waits for tables still being populated
//! - Event reconciliation with per-row error isolation ([`ddr`])
//! - The orchestrator running all tables of a page concurrently
//!
//! ## Example
//!
//! ```rust
//! use roadmap_parser::{parse_html, ParseOptions};
//!
//! let html = r#"
//! <table>
//!   <tr><th>Swimlane</th><th>Title</th><th>Status</th><th>Start</th><th>End</th></tr>
//!   <tr><td>Backend</td><td>Build API</td><td>Green</td><td>2024-01-01</td><td>2024-02-01</td></tr>
//! </table>
//! "#;
//!
//! let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
//! let swimlanes = runtime.block_on(parse_html(html, &ParseOptions::default())).unwrap();
//! assert_eq!(swimlanes.len(), 1);
//! assert_eq!(swimlanes[0].name, "Backend");
//! assert_eq!(swimlanes[0].events[0].status_color, "green");
//! ```

pub mod date;
pub mod ddr;
pub mod dom;
pub mod duration;
pub mod source;
pub mod status;
pub mod table;

pub use date::{parse_date, DateFormat};
pub use ddr::{parse_ddr_table, DdrTable};
pub use dom::{parse_fragment, DomError, Element, Node};
pub use duration::parse_duration;
pub use source::{DocumentRegion, TablePopulator, TableSource};
pub use status::parse_status;
pub use table::{parse_table, try_extract, TableError, TabularRecord};

use std::path::Path;
use std::time::Duration;

use futures::future::join_all;
use indexmap::IndexMap;
use roadmap_core::{ColumnOptions, ParseIssue, RoadmapConfig, Swimlane};
use thiserror::Error;

/// Parsing error
///
/// Problems inside tables are reported as [`ParseIssue`]s instead.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("HTML error: {0}")]
    Html(#[from] DomError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the orchestrator needs besides the document
#[derive(Clone, Debug, PartialEq)]
pub struct ParseOptions {
    pub columns: ColumnOptions,
    pub date_format: DateFormat,
    pub language: String,
    /// Upper bound on waiting for a table to be populated
    pub wait_timeout: Option<Duration>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            columns: ColumnOptions::default(),
            date_format: DateFormat::default(),
            language: roadmap_core::config::DEFAULT_LANGUAGE.to_string(),
            wait_timeout: None,
        }
    }
}

impl ParseOptions {
    pub fn from_config(config: &RoadmapConfig) -> Self {
        Self {
            columns: config.column_options(),
            date_format: DateFormat::from_host(config.date_format()),
            language: config.language().to_string(),
            wait_timeout: None,
        }
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }
}

/// An issue tagged with the table it came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableIssue {
    /// Index of the table in document order
    pub table: usize,
    pub issue: ParseIssue,
}

impl std::fmt::Display for TableIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.issue.row {
            Some(row) => write!(f, "table {}, row {}: {}", self.table, row, self.issue.title),
            None => write!(f, "table {}: {}", self.table, self.issue.title),
        }
    }
}

/// Merged swimlanes plus every issue met on the way
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParseReport {
    pub swimlanes: Vec<Swimlane>,
    pub issues: Vec<TableIssue>,
}

impl ParseReport {
    pub fn event_count(&self) -> usize {
        self.swimlanes.iter().map(|s| s.events.len()).sum()
    }
}

async fn parse_one(mut source: TableSource, options: &ParseOptions) -> DdrTable {
    match parse_table(&mut source, options.wait_timeout).await {
        Ok(record) => parse_ddr_table(
            &record,
            &options.columns,
            &options.date_format,
            &options.language,
        ),
        Err(e) => DdrTable {
            errors: vec![ParseIssue::table(e.to_string())],
            ..DdrTable::default()
        },
    }
}

/// Parse every table of the region and merge the results.
///
/// Tables are processed concurrently and joined once all of them settled.
/// Swimlanes from different tables merge only on an exact name match.
pub async fn parse_with_report(region: &DocumentRegion, options: &ParseOptions) -> ParseReport {
    let tasks = region
        .tables()
        .iter()
        .cloned()
        .map(|source| parse_one(source, options));
    let results = join_all(tasks).await;

    let mut merged: IndexMap<String, Swimlane> = IndexMap::new();
    let mut issues = Vec::new();
    for (table, result) in results.into_iter().enumerate() {
        issues.extend(result.errors.into_iter().map(|issue| TableIssue { table, issue }));
        for lane in result.swimlanes {
            match merged.get_mut(&lane.name) {
                Some(existing) => existing.events.extend(lane.events),
                None => {
                    merged.insert(lane.name.clone(), lane);
                }
            }
        }
    }

    tracing::debug!(
        tables = region.len(),
        swimlanes = merged.len(),
        issues = issues.len(),
        "parsed document"
    );

    ParseReport {
        swimlanes: merged.into_values().collect(),
        issues,
    }
}

/// Parse every table of the region, logging issues instead of returning them
pub async fn parse(region: &DocumentRegion, options: &ParseOptions) -> Vec<Swimlane> {
    let report = parse_with_report(region, options).await;
    for issue in &report.issues {
        tracing::warn!(
            table = issue.table,
            row = issue.issue.row,
            "Failed to parse table content: {}",
            issue.issue.title
        );
    }
    report.swimlanes
}

/// Parse a static HTML fragment
pub async fn parse_html(html: &str, options: &ParseOptions) -> Result<Vec<Swimlane>, ParseError> {
    let region = DocumentRegion::from_html(html)?;
    Ok(parse(&region, options).await)
}

/// Parse an HTML file from disk
pub async fn parse_file(path: &Path, options: &ParseOptions) -> Result<ParseReport, ParseError> {
    let content = tokio::fs::read_to_string(path).await?;
    let region = DocumentRegion::from_html(&content)?;
    Ok(parse_with_report(&region, options).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TABLE: &str = "<table><tr><th>Swimlane</th><th>Title</th><th>Status</th><th>Start</th></tr>\
                         <tr><td>Backend</td><td>API</td><td>Green</td><td>2024-01-01</td></tr></table>";

    #[test]
    fn options_from_config() {
        let config = RoadmapConfig::from_toml_str(
            r#"
date_format = "yyyy-MM-dd"
language = "de"

[columns]
title = "Name, Summary"
"#,
        )
        .unwrap();
        let options = ParseOptions::from_config(&config);
        assert_eq!(options.date_format.chrono_pattern(), "%Y-%m-%d");
        assert_eq!(options.language, "de");
        assert_eq!(options.columns.title, vec!["name", "summary"]);
        assert_eq!(options.wait_timeout, None);
    }

    #[test]
    fn table_issue_display() {
        let issue = TableIssue {
            table: 2,
            issue: ParseIssue::row("Missing swimlane, title or status", 4),
        };
        assert_eq!(issue.to_string(), "table 2, row 4: Missing swimlane, title or status");

        let structural = TableIssue {
            table: 0,
            issue: ParseIssue::table("Missing title columns"),
        };
        assert_eq!(structural.to_string(), "table 0: Missing title columns");
    }

    #[tokio::test]
    async fn exact_case_merge_across_tables() {
        let html = format!(
            "{}{}{}",
            TABLE,
            TABLE,
            TABLE.replace("<td>Backend</td>", "<td>backend</td>")
        );
        let region = DocumentRegion::from_html(&html).unwrap();
        let report = parse_with_report(&region, &ParseOptions::default()).await;

        assert!(report.issues.is_empty());
        let names: Vec<&str> = report.swimlanes.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Backend", "backend"]);
        assert_eq!(report.swimlanes[0].events.len(), 2);
        assert_eq!(report.event_count(), 3);
    }

    #[tokio::test]
    async fn empty_static_table_is_a_table_issue() {
        let html = format!("{}<table><tbody></tbody></table>", TABLE);
        let region = DocumentRegion::from_html(&html).unwrap();
        let report = parse_with_report(&region, &ParseOptions::default()).await;

        assert_eq!(report.swimlanes.len(), 1);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].table, 1);
        assert!(report.issues[0].issue.is_structural());
    }
}
