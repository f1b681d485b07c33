//! # roadmap-core
//!
//! Core domain model and traits for data-driven roadmap charts.
//!
//! This crate provides:
//! - Domain types: `TimelineEvent`, `Swimlane`, `SwimlaneMap`, `ColumnOptions`
//! - Shared traits: `TextMetrics`
//! - Error types shared by the parser, layout and render crates
//!
//! ## Example
//!
//! ```rust
//! use roadmap_core::{date_to_timestamp, SwimlaneMap, TimelineEvent};
//! use chrono::NaiveDate;
//!
//! let start = date_to_timestamp(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
//! let mut lanes = SwimlaneMap::new();
//! lanes.insert_case_insensitive("Backend", TimelineEvent::new("Build API").start(start));
//! lanes.insert_case_insensitive("backend", TimelineEvent::new("Ship API").start(start));
//!
//! assert_eq!(lanes.len(), 1);
//! assert_eq!(lanes.iter().next().unwrap().name, "Backend");
//! ```

pub mod config;
pub mod status;

pub use config::{ChartOverrides, ColumnSpec, ConfigError, RoadmapConfig};
pub use status::{is_palette_color, BADGE_OUTCOMES, STATUS_PALETTE};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Time
// ============================================================================

/// Milliseconds since the Unix epoch (UTC)
pub type Timestamp = i64;

/// Midnight UTC of the given calendar date
pub fn date_to_timestamp(date: NaiveDate) -> Timestamp {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}

/// Convert a timestamp back into a UTC date-time
pub fn timestamp_to_datetime(ts: Timestamp) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ts).single()
}

/// Optional absolute bounds for the charted period.
///
/// `None` on either side means unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl DateWindow {
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    pub fn new(start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        Self { start, end }
    }

    /// Whether an event spanning `start..=end` is at least partially inside the window
    pub fn admits(&self, start: Timestamp, end: Timestamp) -> bool {
        if matches!(self.start, Some(ws) if end < ws) {
            return false;
        }
        if matches!(self.end, Some(we) if start > we) {
            return false;
        }
        true
    }
}

// ============================================================================
// Timeline events
// ============================================================================

/// One row of a roadmap table, ready to be charted.
///
/// Either side of the span may be missing straight out of the parser; see
/// [`TimelineEvent::normalized`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    /// Display title
    pub label: String,
    /// Semantic colour token, empty when unclassified
    pub status_color: String,
    /// Raw swimlane text of the originating row
    pub swimlane: String,
    /// Extra columns keyed by original column name (`Status` always present)
    pub properties: IndexMap<String, String>,
}

impl TimelineEvent {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            start: None,
            end: None,
            label: label.into(),
            status_color: String::new(),
            swimlane: String::new(),
            properties: IndexMap::new(),
        }
    }

    pub fn start(mut self, ts: Timestamp) -> Self {
        self.start = Some(ts);
        self
    }

    pub fn end(mut self, ts: Timestamp) -> Self {
        self.end = Some(ts);
        self
    }

    pub fn status_color(mut self, color: impl Into<String>) -> Self {
        self.status_color = color.into();
        self
    }

    pub fn swimlane(mut self, name: impl Into<String>) -> Self {
        self.swimlane = name.into();
        self
    }

    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Copy with a missing side filled from the other one.
    ///
    /// An event with only one date becomes a milestone.
    pub fn normalized(&self) -> Self {
        let mut event = self.clone();
        if event.start.is_none() {
            event.start = event.end;
        } else if event.end.is_none() {
            event.end = event.start;
        }
        event
    }

    /// Both sides of the span, after normalization
    pub fn span(&self) -> Option<(Timestamp, Timestamp)> {
        let start = self.start.or(self.end)?;
        let end = self.end.or(self.start)?;
        Some((start, end))
    }

    pub fn is_milestone(&self) -> bool {
        matches!(self.span(), Some((s, e)) if s == e)
    }
}

// ============================================================================
// Swimlanes
// ============================================================================

/// A named horizontal group of events
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Swimlane {
    pub name: String,
    pub events: Vec<TimelineEvent>,
}

impl Swimlane {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Vec::new(),
        }
    }

    pub fn with_events(mut self, events: Vec<TimelineEvent>) -> Self {
        self.events = events;
        self
    }

    /// End of the most recently added event (start for milestones)
    pub fn last_event_end(&self) -> Option<Timestamp> {
        self.events.last().and_then(|e| e.end.or(e.start))
    }
}

/// Swimlanes keyed by lower-cased name, keeping the first-seen display case.
///
/// Iteration follows insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SwimlaneMap {
    lanes: IndexMap<String, Swimlane>,
}

impl SwimlaneMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Append to the swimlane matching `name` ignoring case, or create one
    /// with `name` as its display case.
    pub fn insert_case_insensitive(&mut self, name: &str, event: TimelineEvent) {
        self.lanes
            .entry(name.to_lowercase())
            .or_insert_with(|| Swimlane::new(name))
            .events
            .push(event);
    }

    /// Lookup by exact display name
    pub fn get_exact(&self, name: &str) -> Option<&Swimlane> {
        self.lanes
            .get(&name.to_lowercase())
            .filter(|lane| lane.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Swimlane> {
        self.lanes.values()
    }

    pub fn into_vec(self) -> Vec<Swimlane> {
        self.lanes.into_values().collect()
    }
}

impl IntoIterator for SwimlaneMap {
    type Item = Swimlane;
    type IntoIter = indexmap::map::IntoValues<String, Swimlane>;

    fn into_iter(self) -> Self::IntoIter {
        self.lanes.into_values()
    }
}

// ============================================================================
// Column mapping
// ============================================================================

/// Logical field a table column can supply
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Swimlane,
    Title,
    Status,
    StartDate,
    EndDate,
    Effort,
    People,
}

impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Swimlane => "swimlane",
            ColumnRole::Title => "title",
            ColumnRole::Status => "status",
            ColumnRole::StartDate => "start date",
            ColumnRole::EndDate => "end date",
            ColumnRole::Effort => "effort",
            ColumnRole::People => "people",
        }
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accepted lower-cased header aliases per role; the first alias present wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnOptions {
    pub swimlane: Vec<String>,
    pub title: Vec<String>,
    pub status: Vec<String>,
    pub start_date: Vec<String>,
    pub end_date: Vec<String>,
    pub effort: Vec<String>,
    pub people: Vec<String>,
    /// Patterns that fold several raw swimlane names into one
    pub aggregate_swimlanes: Vec<String>,
}

impl Default for ColumnOptions {
    fn default() -> Self {
        Self {
            swimlane: aliases("swimlane"),
            title: aliases("title"),
            status: aliases("status"),
            start_date: aliases("start date, start"),
            end_date: aliases("end date, end, due date"),
            effort: aliases("effort"),
            people: aliases("people"),
            aggregate_swimlanes: Vec::new(),
        }
    }
}

impl ColumnOptions {
    pub fn aliases(&self, role: ColumnRole) -> &[String] {
        match role {
            ColumnRole::Swimlane => &self.swimlane,
            ColumnRole::Title => &self.title,
            ColumnRole::Status => &self.status,
            ColumnRole::StartDate => &self.start_date,
            ColumnRole::EndDate => &self.end_date,
            ColumnRole::Effort => &self.effort,
            ColumnRole::People => &self.people,
        }
    }

    /// Replace the aliases of a role from a comma separated host string
    pub fn with_aliases(mut self, role: ColumnRole, list: &str) -> Self {
        let parsed = aliases(list);
        match role {
            ColumnRole::Swimlane => self.swimlane = parsed,
            ColumnRole::Title => self.title = parsed,
            ColumnRole::Status => self.status = parsed,
            ColumnRole::StartDate => self.start_date = parsed,
            ColumnRole::EndDate => self.end_date = parsed,
            ColumnRole::Effort => self.effort = parsed,
            ColumnRole::People => self.people = parsed,
        }
        self
    }

    pub fn with_aggregate_swimlanes(mut self, list: &str) -> Self {
        self.aggregate_swimlanes = aliases(list);
        self
    }
}

/// Split a comma separated list into trimmed, lower-cased, non-empty entries
pub fn aliases(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

// ============================================================================
// Text measurement
// ============================================================================

/// Width estimate for rendered text.
///
/// Layout and rendering happen without a browser, so label extents come
/// from an implementation of this trait.
pub trait TextMetrics {
    fn text_width(&self, text: &str, font_size: f64) -> f64;
}

/// Average glyph advance model
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ApproxTextMetrics {
    /// Average advance as a fraction of the font size
    pub advance: f64,
}

impl Default for ApproxTextMetrics {
    fn default() -> Self {
        Self { advance: 0.56 }
    }
}

impl TextMetrics for ApproxTextMetrics {
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars()
            .map(|c| {
                if c.is_whitespace() {
                    0.5
                } else if c.is_uppercase() || c == 'm' || c == 'w' {
                    1.3
                } else if matches!(c, 'i' | 'l' | 'j' | '.' | ',' | '\'' | '|') {
                    0.5
                } else {
                    1.0
                }
            })
            .sum::<f64>()
            * self.advance
            * font_size
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A problem found while reading a table.
///
/// These are collected and logged; they never abort a parse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    /// Human readable cause
    pub title: String,
    /// Zero-based data row, `None` for whole-table problems
    pub row: Option<usize>,
}

impl ParseIssue {
    pub fn table(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            row: None,
        }
    }

    pub fn row(title: impl Into<String>, row: usize) -> Self {
        Self {
            title: title.into(),
            row: Some(row),
        }
    }

    pub fn is_structural(&self) -> bool {
        self.row.is_none()
    }
}

impl std::fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.row {
            Some(row) => write!(f, "row {}: {}", row, self.title),
            None => write!(f, "table: {}", self.title),
        }
    }
}

/// Geometry invariant violation
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("Non-finite value for {what}")]
    NonFinite { what: String },

    #[error("No events to lay out and no explicit date window")]
    EmptyDomain,

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(Timestamp),

    #[error("Date window starts after it ends: {start} > {end}")]
    InvertedWindow { start: Timestamp, end: Timestamp },
}

/// Check a computed coordinate, failing the whole pass on NaN or infinity
pub fn ensure_finite(value: f64, what: &str) -> Result<f64, LayoutError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LayoutError::NonFinite { what: what.into() })
    }
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        date_to_timestamp(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn timestamp_is_utc_midnight() {
        assert_eq!(ts(1970, 1, 2), 86_400_000);
        let dt = timestamp_to_datetime(ts(2024, 2, 1)).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-02-01T00:00:00+00:00");
    }

    #[test]
    fn normalization_fills_missing_side() {
        let only_end = TimelineEvent::new("Launch").end(ts(2024, 3, 1)).normalized();
        assert_eq!(only_end.start, Some(ts(2024, 3, 1)));
        assert!(only_end.is_milestone());

        let only_start = TimelineEvent::new("Kickoff").start(ts(2024, 1, 1)).normalized();
        assert_eq!(only_start.end, Some(ts(2024, 1, 1)));
    }

    #[test]
    fn normalization_is_idempotent() {
        let event = TimelineEvent::new("x").end(ts(2024, 3, 1));
        let once = event.normalized();
        assert_eq!(once.normalized(), once);
    }

    #[test]
    fn swimlane_map_merges_ignoring_case() {
        let mut map = SwimlaneMap::new();
        map.insert_case_insensitive("Backend", TimelineEvent::new("a"));
        map.insert_case_insensitive("BACKEND", TimelineEvent::new("b"));
        map.insert_case_insensitive("Frontend", TimelineEvent::new("c"));

        let lanes = map.into_vec();
        assert_eq!(lanes.len(), 2);
        assert_eq!(lanes[0].name, "Backend");
        assert_eq!(lanes[0].events.len(), 2);
    }

    #[test]
    fn get_exact_respects_case() {
        let mut map = SwimlaneMap::new();
        map.insert_case_insensitive("Backend", TimelineEvent::new("a"));
        assert!(map.get_exact("Backend").is_some());
        assert!(map.get_exact("backend").is_none());
    }

    #[test]
    fn column_aliases_are_trimmed_and_lowercased() {
        let opts = ColumnOptions::default().with_aliases(ColumnRole::Title, " Name , Summary,");
        assert_eq!(opts.title, vec!["name".to_string(), "summary".to_string()]);
        assert_eq!(opts.aliases(ColumnRole::StartDate)[1], "start");
    }

    #[test]
    fn window_admits_overlapping_events() {
        let window = DateWindow::new(Some(ts(2024, 1, 1)), Some(ts(2024, 6, 1)));
        assert!(window.admits(ts(2023, 12, 1), ts(2024, 1, 15)));
        assert!(!window.admits(ts(2023, 10, 1), ts(2023, 12, 31)));
        assert!(!window.admits(ts(2024, 6, 2), ts(2024, 7, 1)));
        assert!(DateWindow::unbounded().admits(0, 0));
    }

    #[test]
    fn ensure_finite_rejects_nan() {
        assert!(ensure_finite(1.5, "x").is_ok());
        assert_eq!(
            ensure_finite(f64::NAN, "bar width"),
            Err(LayoutError::NonFinite {
                what: "bar width".into()
            })
        );
    }

    #[test]
    fn approx_metrics_scale_with_font_size() {
        let m = ApproxTextMetrics::default();
        assert!(m.text_width("abc", 24.0) > m.text_width("abc", 12.0));
        assert_eq!(m.text_width("", 12.0), 0.0);
    }

    #[test]
    fn parse_issue_display() {
        assert_eq!(ParseIssue::row("Missing title", 3).to_string(), "row 3: Missing title");
        assert!(ParseIssue::table("Missing columns").is_structural());
    }
}
