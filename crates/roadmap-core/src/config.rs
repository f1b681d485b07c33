//! Roadmap configuration file
//!
//! Mirrors the host macro parameters: column aliases as comma separated
//! strings, the host date pattern, and optional chart overrides. Layers are
//! merged field by field, later layers winning.
//!
//! ```toml
//! date_format = "dd MMM yyyy"
//! start_date = "2024-01-01"
//!
//! [columns]
//! swimlane = "team, swimlane"
//! aggregate_swimlanes = "platform"
//!
//! [chart]
//! width = 1400
//! row_height = 36.0
//! ```

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{date_to_timestamp, ColumnOptions, ColumnRole, DateWindow};

pub const DEFAULT_DATE_FORMAT: &str = "dd MMM yyyy";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Top-level configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoadmapConfig {
    /// Host date pattern (Java `SimpleDateFormat` letters)
    pub date_format: Option<String>,
    pub language: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub columns: ColumnSpec,
    pub chart: ChartOverrides,
}

/// Column aliases as the host supplies them
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnSpec {
    pub swimlane: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub effort: Option<String>,
    pub people: Option<String>,
    pub aggregate_swimlanes: Option<String>,
}

/// Optional chart geometry overrides
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartOverrides {
    pub width: Option<u32>,
    pub swimlane_label_width: Option<f64>,
    pub right_padding: Option<f64>,
    pub row_height: Option<f64>,
    pub x_axis_height: Option<f64>,
    pub bar_height: Option<f64>,
    pub milestone_size: Option<f64>,
    pub today_label: Option<String>,
}

impl RoadmapConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Overlay `other` on top of `self`; set fields in `other` win
    pub fn layer(self, other: RoadmapConfig) -> Self {
        Self {
            date_format: other.date_format.or(self.date_format),
            language: other.language.or(self.language),
            start_date: other.start_date.or(self.start_date),
            end_date: other.end_date.or(self.end_date),
            columns: self.columns.layer(other.columns),
            chart: self.chart.layer(other.chart),
        }
    }

    pub fn date_format(&self) -> &str {
        self.date_format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT)
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn window(&self) -> DateWindow {
        DateWindow::new(
            self.start_date.map(date_to_timestamp),
            self.end_date.map(date_to_timestamp),
        )
    }

    pub fn column_options(&self) -> ColumnOptions {
        self.columns.to_options()
    }
}

impl ColumnSpec {
    fn layer(self, other: ColumnSpec) -> Self {
        Self {
            swimlane: other.swimlane.or(self.swimlane),
            title: other.title.or(self.title),
            status: other.status.or(self.status),
            start_date: other.start_date.or(self.start_date),
            end_date: other.end_date.or(self.end_date),
            effort: other.effort.or(self.effort),
            people: other.people.or(self.people),
            aggregate_swimlanes: other.aggregate_swimlanes.or(self.aggregate_swimlanes),
        }
    }

    /// Default aliases with the configured roles replaced
    pub fn to_options(&self) -> ColumnOptions {
        let roles = [
            (ColumnRole::Swimlane, &self.swimlane),
            (ColumnRole::Title, &self.title),
            (ColumnRole::Status, &self.status),
            (ColumnRole::StartDate, &self.start_date),
            (ColumnRole::EndDate, &self.end_date),
            (ColumnRole::Effort, &self.effort),
            (ColumnRole::People, &self.people),
        ];
        let mut options = roles
            .into_iter()
            .fold(ColumnOptions::default(), |opts, (role, list)| match list {
                Some(list) => opts.with_aliases(role, list),
                None => opts,
            });
        if let Some(list) = &self.aggregate_swimlanes {
            options = options.with_aggregate_swimlanes(list);
        }
        options
    }
}

impl ChartOverrides {
    fn layer(self, other: ChartOverrides) -> Self {
        Self {
            width: other.width.or(self.width),
            swimlane_label_width: other.swimlane_label_width.or(self.swimlane_label_width),
            right_padding: other.right_padding.or(self.right_padding),
            row_height: other.row_height.or(self.row_height),
            x_axis_height: other.x_axis_height.or(self.x_axis_height),
            bar_height: other.bar_height.or(self.bar_height),
            milestone_size: other.milestone_size.or(self.milestone_size),
            today_label: other.today_label.or(self.today_label),
        }
    }
}
