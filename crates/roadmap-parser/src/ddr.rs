//! Event reconciliation
//!
//! Maps the rows of a [`TabularRecord`] onto [`TimelineEvent`]s grouped by
//! swimlane. Every row is handled on its own: a bad row becomes a
//! [`ParseIssue`] and the rest of the table still charts.

use regex::{Regex, RegexBuilder};
use roadmap_core::{
    timestamp_to_datetime, ColumnOptions, ColumnRole, ParseIssue, SwimlaneMap, TimelineEvent,
    Timestamp,
};

use crate::date::{parse_date, DateFormat};
use crate::dom::Element;
use crate::duration::{parse_duration, parse_number_prefix};
use crate::status::parse_status;
use crate::table::{normalize_space, TableRow, TabularRecord};

pub const MISSING_TITLE_COLUMNS: &str = "Table missing required columns: swimlane, title, or status";
pub const MISSING_DATE_COLUMNS: &str = "Table missing required columns: start date and end date";
pub const MISSING_REQUIRED_FIELD: &str = "Missing swimlane, title or status";
pub const NO_START_DATE: &str = "Failed to parse start date or no previous swimlane";
pub const BAD_EFFORT_PEOPLE: &str = "Failed to parse effort + people";
pub const END_BEFORE_START: &str = "End date is before start date";

/// Result of reconciling one table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DdrTable {
    pub errors: Vec<ParseIssue>,
    pub swimlanes: SwimlaneMap,
}

impl DdrTable {
    fn structural(title: &str) -> Self {
        Self {
            errors: vec![ParseIssue::table(title)],
            swimlanes: SwimlaneMap::new(),
        }
    }
}

/// Column lookup for one row, remembering which columns were consumed
struct RowReader<'a> {
    row: &'a TableRow,
    used: Vec<&'a str>,
}

impl<'a> RowReader<'a> {
    fn new(row: &'a TableRow) -> Self {
        Self {
            row,
            used: Vec::new(),
        }
    }

    fn get(&mut self, aliases: &'a [String]) -> Option<&'a Element> {
        for alias in aliases {
            if let Some(cell) = self.row.get(alias) {
                self.used.push(alias.as_str());
                return Some(cell);
            }
        }
        None
    }

    fn is_used(&self, column: &str) -> bool {
        self.used.iter().any(|c| *c == column)
    }
}

fn cell_text(cell: Option<&Element>) -> String {
    cell.map(|c| normalize_space(&c.text())).unwrap_or_default()
}

/// Aggregate swimlane patterns, matched as whole words ignoring case
struct Aggregates {
    patterns: Vec<Regex>,
}

impl Aggregates {
    fn new(names: &[String]) -> Self {
        let patterns = names
            .iter()
            .filter(|name| !name.is_empty())
            .filter_map(|name| {
                RegexBuilder::new(&format!(r"(^|\s)({})($|\s)", regex::escape(name)))
                    .case_insensitive(true)
                    .multi_line(true)
                    .build()
                    .ok()
            })
            .collect();
        Self { patterns }
    }

    /// The matched text inside `swimlane`, keeping the row's own casing
    fn matching<'s>(&self, swimlane: &'s str) -> Option<&'s str> {
        self.patterns
            .iter()
            .find_map(|re| re.captures(swimlane))
            .and_then(|caps| caps.get(2))
            .map(|m| m.as_str())
    }
}

/// Reconcile a table into swimlanes.
///
/// A table lacking the swimlane, title or status column, or lacking both
/// date columns, yields a single structural issue and no events.
pub fn parse_ddr_table(
    table: &TabularRecord,
    columns: &ColumnOptions,
    format: &DateFormat,
    language: &str,
) -> DdrTable {
    let has_any = |role: ColumnRole| columns.aliases(role).iter().any(|a| table.has_column(a));

    if !(has_any(ColumnRole::Swimlane) && has_any(ColumnRole::Title) && has_any(ColumnRole::Status)) {
        return DdrTable::structural(MISSING_TITLE_COLUMNS);
    }
    if !has_any(ColumnRole::StartDate) && !has_any(ColumnRole::EndDate) {
        return DdrTable::structural(MISSING_DATE_COLUMNS);
    }

    let aggregates = Aggregates::new(&columns.aggregate_swimlanes);
    let mut result = DdrTable::default();

    for (index, row) in table.rows.iter().enumerate() {
        match parse_row(row, index, table, columns, format, language, &result.swimlanes) {
            Ok(event) => {
                let lane = aggregates
                    .matching(&event.swimlane)
                    .unwrap_or(&event.swimlane)
                    .to_string();
                result.swimlanes.insert_case_insensitive(&lane, event);
            }
            Err(issue) => result.errors.push(issue),
        }
    }

    result
}

fn parse_row(
    row: &TableRow,
    index: usize,
    table: &TabularRecord,
    columns: &ColumnOptions,
    format: &DateFormat,
    language: &str,
    swimlanes: &SwimlaneMap,
) -> Result<TimelineEvent, ParseIssue> {
    let mut reader = RowReader::new(row);
    let swimlane_cell = reader.get(&columns.swimlane);
    let title_cell = reader.get(&columns.title);
    let start_cell = reader.get(&columns.start_date);
    let end_cell = reader.get(&columns.end_date);
    let effort_cell = reader.get(&columns.effort);
    let people_cell = reader.get(&columns.people);
    let status_cell = reader.get(&columns.status);

    let swimlane = cell_text(swimlane_cell);
    let title = cell_text(title_cell);
    let status_text = cell_text(status_cell);
    if swimlane.is_empty() || title.is_empty() || status_text.is_empty() {
        return Err(ParseIssue::row(MISSING_REQUIRED_FIELD, index));
    }

    let status_color = parse_status(status_cell);
    let mut start = parse_date(start_cell, format, language);
    let mut end = parse_date(end_cell, format, language);

    let effort = match cell_text(effort_cell) {
        text if text.is_empty() => None,
        text => Some(
            parse_duration(&text).ok_or_else(|| ParseIssue::row("Error parsing effort", index))?,
        ),
    };
    let people = match cell_text(people_cell) {
        text if text.is_empty() => None,
        text => Some(
            parse_number_prefix(&text).ok_or_else(|| ParseIssue::row("Error parsing people", index))?,
        ),
    };

    if start.is_none() && end.is_none() {
        let previous_end = swimlanes.get_exact(&swimlane).and_then(|lane| lane.last_event_end());
        match previous_end {
            Some(ts) => start = Some(ts),
            None => return Err(ParseIssue::row(NO_START_DATE, index)),
        }
    }

    if end.is_none() {
        end = infer_end(start, effort, people)
            .ok_or_else(|| ParseIssue::row(BAD_EFFORT_PEOPLE, index))?;
    }

    if let (Some(s), Some(e)) = (start, end) {
        if e < s {
            return Err(ParseIssue::row(END_BEFORE_START, index));
        }
    }

    let mut event = TimelineEvent::new(title)
        .status_color(status_color)
        .swimlane(swimlane)
        .property("Status", status_text);
    event.start = start;
    event.end = end;

    for name in &table.column_names {
        let key = name.to_lowercase();
        if name.is_empty() || reader.is_used(&key) {
            continue;
        }
        if let Some(cell) = row.get(&key) {
            event.properties.insert(name.clone(), cell.inner_html());
        }
    }

    Ok(event)
}

/// `start + effort / people` when both numbers are present and non-zero.
///
/// The outer `None` means the sum is not a date that can be charted.
fn infer_end(
    start: Option<Timestamp>,
    effort: Option<f64>,
    people: Option<f64>,
) -> Option<Option<Timestamp>> {
    let (Some(start), Some(effort), Some(people)) = (start, effort, people) else {
        return Some(None);
    };
    if effort == 0.0 || people == 0.0 {
        return Some(None);
    }
    let end = (start as f64 + effort / people).round();
    if !end.is_finite() || end < i64::MIN as f64 || end >= i64::MAX as f64 {
        return None;
    }
    let end = end as Timestamp;
    timestamp_to_datetime(end).map(|_| Some(end))
}
