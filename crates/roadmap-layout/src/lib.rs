//! # roadmap-layout
//!
//! Timeline layout engine for roadmap charts.
//!
//! This crate provides:
//! - Date normalization and window filtering
//! - Month-rounded domain computation
//! - Adaptive week/month/year tick selection
//! - Greedy row packing per swimlane
//! - Truncation of events running past the rendered domain
//!
//! Nothing is kept between passes: every call to [`TimelineLayout::layout`]
//! recomputes the full geometry from the events and the chart width.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use roadmap_core::{date_to_timestamp, Swimlane, TimelineEvent};
//! use roadmap_layout::{TickUnit, TimelineLayout};
//!
//! let ts = |m| date_to_timestamp(NaiveDate::from_ymd_opt(2024, m, 1).unwrap());
//! let lanes = vec![Swimlane::new("Backend").with_events(vec![
//!     TimelineEvent::new("Build API").start(ts(1)).end(ts(3)),
//!     TimelineEvent::new("Ship").end(ts(6)),
//! ])];
//!
//! let chart = TimelineLayout::new().layout(&lanes, 860.0, ts(2)).unwrap();
//! assert_eq!(chart.tick_unit, TickUnit::Month);
//! assert_eq!(chart.lanes[0].row_count, 1);
//! assert!(chart.today_x.is_some());
//! ```

pub mod process;
pub mod rows;
pub mod scale;

pub use process::{process_data, requested_window};
pub use rows::{RowBox, RowMapper};
pub use scale::{compute_domain, suitable_tick_unit, TickUnit, TimeScale};

use roadmap_core::{
    ensure_finite, ApproxTextMetrics, ChartOverrides, DateWindow, LayoutError, Swimlane,
    TextMetrics, TimelineEvent, Timestamp,
};
use serde::Serialize;

/// Extra space reserved left of a milestone and added to its width
pub const MILESTONE_PACKING_PADDING: f64 = 10.0;

// ============================================================================
// Configuration
// ============================================================================

/// Chart geometry
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayoutConfig {
    /// Width of the swimlane label column
    pub swimlane_label_width: f64,
    pub right_padding: f64,
    pub row_height: f64,
    pub x_axis_height: f64,
    pub bar_height: f64,
    pub milestone_size: f64,
    /// Gap between a milestone marker and its label
    pub milestone_label_padding: f64,
    pub label_font_size: f64,
    /// Requested window; also the explicit domain bounds when set
    pub window: DateWindow,
    pub today_label: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            swimlane_label_width: 150.0,
            right_padding: 50.0,
            row_height: 40.0,
            x_axis_height: 50.0,
            bar_height: 25.0,
            milestone_size: 15.0,
            milestone_label_padding: 10.0,
            label_font_size: 12.0,
            window: DateWindow::unbounded(),
            today_label: "Today".to_string(),
        }
    }
}

impl LayoutConfig {
    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = window;
        self
    }

    /// Overlay the configured chart overrides
    pub fn apply(mut self, overrides: &ChartOverrides) -> Self {
        let set = |field: &mut f64, value: Option<f64>| {
            if let Some(v) = value {
                *field = v;
            }
        };
        set(&mut self.swimlane_label_width, overrides.swimlane_label_width);
        set(&mut self.right_padding, overrides.right_padding);
        set(&mut self.row_height, overrides.row_height);
        set(&mut self.x_axis_height, overrides.x_axis_height);
        set(&mut self.bar_height, overrides.bar_height);
        set(&mut self.milestone_size, overrides.milestone_size);
        if let Some(label) = &overrides.today_label {
            self.today_label = label.clone();
        }
        self
    }

    /// Vertical offset of bars inside a row
    pub fn bar_y(&self) -> f64 {
        (self.row_height - self.bar_height) / 2.0
    }

    /// Vertical offset of the milestone marker inside a row
    pub fn milestone_y(&self) -> f64 {
        (self.row_height - self.milestone_size) / 2.0
    }
}

// ============================================================================
// Layout output
// ============================================================================

/// Geometry of one event, relative to its row
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemShape {
    Bar {
        x: f64,
        width: f64,
        /// The event starts before the rendered domain
        start_truncated: bool,
        /// The event ends after the rendered domain
        end_truncated: bool,
    },
    Milestone {
        /// Marker center
        x: f64,
        label_x: f64,
        label_width: f64,
        /// Label flipped to the left to stay inside the range
        label_left: bool,
    },
}

/// An event with its assigned row and geometry
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlacedItem {
    pub event: TimelineEvent,
    pub row: usize,
    pub shape: ItemShape,
    /// Extent used for row packing
    pub bounds: RowBox,
}

/// One swimlane positioned on the chart
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LaneLayout {
    pub name: String,
    /// Top of the lane
    pub y: f64,
    pub row_count: usize,
    pub height: f64,
    pub items: Vec<PlacedItem>,
}

/// Everything the renderer needs for one pass
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartLayout {
    pub width: f64,
    pub scale: TimeScale,
    pub tick_unit: TickUnit,
    pub ticks: Vec<Timestamp>,
    pub lanes: Vec<LaneLayout>,
    /// Bottom of the last lane, where the bottom axis sits
    pub plot_height: f64,
    pub total_height: f64,
    /// Position of the "today" marker when today is inside the domain
    pub today_x: Option<f64>,
    pub config: LayoutConfig,
}

impl ChartLayout {
    pub fn item_count(&self) -> usize {
        self.lanes.iter().map(|l| l.items.len()).sum()
    }

    /// Grid bands as `(x, width)`, one per tick interval
    pub fn bands(&self) -> Vec<(f64, f64)> {
        let range_end = self.scale.range.1;
        self.ticks
            .iter()
            .enumerate()
            .map(|(i, &tick)| {
                let x = self.scale.project(tick);
                let end = self
                    .ticks
                    .get(i + 1)
                    .map(|&next| self.scale.project(next))
                    .unwrap_or(range_end);
                (x.floor(), (end - x).ceil())
            })
            .collect()
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Timeline layout engine
pub struct TimelineLayout<M: TextMetrics = ApproxTextMetrics> {
    pub config: LayoutConfig,
    pub metrics: M,
}

impl TimelineLayout {
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            config,
            metrics: ApproxTextMetrics::default(),
        }
    }
}

impl Default for TimelineLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: TextMetrics> TimelineLayout<M> {
    pub fn with_metrics<N: TextMetrics>(self, metrics: N) -> TimelineLayout<N> {
        TimelineLayout {
            config: self.config,
            metrics,
        }
    }

    /// Lay out `swimlanes` on a chart `width` pixels wide.
    ///
    /// `now` places the "today" marker. Fails on the first non-finite
    /// coordinate rather than producing corrupted geometry.
    pub fn layout(
        &self,
        swimlanes: &[Swimlane],
        width: f64,
        now: Timestamp,
    ) -> Result<ChartLayout, LayoutError> {
        let config = &self.config;
        ensure_finite(width, "chart width")?;

        let window = requested_window(&config.window)?;
        let data = process_data(swimlanes, &window);

        let domain = compute_domain(&data, config.window.start, config.window.end)?;
        let range = (
            ensure_finite(config.swimlane_label_width, "range start")?,
            ensure_finite(width - config.right_padding, "range end")?,
        );
        let scale = TimeScale::new(domain, range);
        let tick_unit = suitable_tick_unit(&scale)?;
        let ticks = scale.ticks(tick_unit)?;

        let mut lanes = Vec::with_capacity(data.len());
        let mut y = config.x_axis_height;
        for lane in data {
            let laid = self.layout_lane(lane, &scale, y)?;
            y += laid.height;
            lanes.push(laid);
        }
        let plot_height = ensure_finite(y, "plot height")?;

        let today_x = if scale.contains(now) {
            Some(ensure_finite(scale.project(now), "today marker")?)
        } else {
            None
        };

        Ok(ChartLayout {
            width,
            scale,
            tick_unit,
            ticks,
            lanes,
            plot_height,
            total_height: plot_height + config.x_axis_height,
            today_x,
            config: config.clone(),
        })
    }

    fn layout_lane(&self, lane: Swimlane, scale: &TimeScale, y: f64) -> Result<LaneLayout, LayoutError> {
        let mut mapper = RowMapper::new();
        let mut items = Vec::with_capacity(lane.events.len());

        for event in lane.events {
            let Some((start, end)) = event.span() else {
                continue;
            };
            let (shape, bounds) = if start == end {
                self.milestone_shape(&event, start, scale)?
            } else {
                bar_shape(start, end, scale)?
            };
            let row = mapper.place(bounds);
            items.push(PlacedItem {
                event,
                row,
                shape,
                bounds,
            });
        }

        let row_count = mapper.row_count();
        Ok(LaneLayout {
            name: lane.name,
            y,
            row_count,
            height: row_count as f64 * self.config.row_height,
            items,
        })
    }

    fn milestone_shape(
        &self,
        event: &TimelineEvent,
        at: Timestamp,
        scale: &TimeScale,
    ) -> Result<(ItemShape, RowBox), LayoutError> {
        let config = &self.config;
        let half = config.milestone_size / 2.0;
        let x = ensure_finite(scale.project(at), "milestone position")?;
        let label_width = ensure_finite(
            self.metrics.text_width(&event.label, config.label_font_size),
            "milestone label width",
        )?;

        let label_left = x + half + label_width > scale.range.1;
        let label_x = if label_left {
            x - half - label_width - config.milestone_label_padding
        } else {
            x + half + config.milestone_label_padding
        };

        // The marker is a square rotated by 45 degrees
        let reach = config.milestone_size * std::f64::consts::FRAC_1_SQRT_2;
        let left = (x - reach).min(label_x);
        let right = (x + reach).max(label_x + label_width);
        let bounds = RowBox::new(
            left - MILESTONE_PACKING_PADDING,
            right - left + MILESTONE_PACKING_PADDING,
        );

        Ok((
            ItemShape::Milestone {
                x,
                label_x,
                label_width,
                label_left,
            },
            bounds,
        ))
    }
}

fn bar_shape(start: Timestamp, end: Timestamp, scale: &TimeScale) -> Result<(ItemShape, RowBox), LayoutError> {
    let x0 = ensure_finite(scale.project(start).max(scale.range.0), "bar start")?;
    let x1 = ensure_finite(scale.project(end).min(scale.range.1), "bar end")?;
    let width = (x1 - x0).max(0.0);
    Ok((
        ItemShape::Bar {
            x: x0,
            width,
            start_truncated: scale.domain.0 > start,
            end_truncated: scale.domain.1 < end,
        },
        RowBox::new(x0, width),
    ))
}

/// Lay out with default geometry and text metrics
pub fn layout(swimlanes: &[Swimlane], width: f64, now: Timestamp) -> Result<ChartLayout, LayoutError> {
    TimelineLayout::new().layout(swimlanes, width, now)
}
