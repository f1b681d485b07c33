//! # roadmap-render
//!
//! Rendering backends for laid out roadmap charts.
//!
//! This crate provides:
//! - SVG chart rendering (swimlanes, bars, milestones, axes, grid bands)
//! - JSON export of the computed layout
//! - The [`Renderer`] trait for custom backends
//!
//! Renderers only paint a [`ChartLayout`]; row assignment and tick choice
//! come from the layout engine.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use roadmap_core::{date_to_timestamp, Swimlane, TimelineEvent};
//! use roadmap_render::{Renderer, SvgRoadmapRenderer};
//!
//! let ts = |m| date_to_timestamp(NaiveDate::from_ymd_opt(2024, m, 1).unwrap());
//! let lanes = vec![Swimlane::new("Backend").with_events(vec![
//!     TimelineEvent::new("Build API").start(ts(1)).end(ts(3)).status_color("green"),
//! ])];
//! let chart = roadmap_layout::layout(&lanes, 900.0, ts(2)).unwrap();
//!
//! let svg = SvgRoadmapRenderer::new().render(&chart).unwrap();
//! assert!(svg.contains("Backend"));
//! ```

pub mod text;
pub mod theme;

pub use theme::RoadmapTheme;

use roadmap_core::{
    timestamp_to_datetime, ApproxTextMetrics, RenderError, TextMetrics, TimelineEvent, Timestamp,
};
use roadmap_layout::{ChartLayout, ItemShape, LaneLayout, PlacedItem};
use svg::node::element::{Group, Line, Path, Rectangle, Text};
use svg::Document;

use crate::text::{bar_path, truncate_to_width, wrap_words};

/// Line height of wrapped swimlane labels, in em
const LABEL_LINE_HEIGHT: f64 = 1.5;
const TICK_SIZE: f64 = 6.0;

/// Output backend for a laid out chart
pub trait Renderer {
    type Output;

    fn render(&self, chart: &ChartLayout) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// SVG
// ============================================================================

/// SVG roadmap renderer
#[derive(Clone, Debug)]
pub struct SvgRoadmapRenderer<M: TextMetrics = ApproxTextMetrics> {
    pub theme: RoadmapTheme,
    pub metrics: M,
}

impl SvgRoadmapRenderer {
    pub fn new() -> Self {
        Self {
            theme: RoadmapTheme::default(),
            metrics: ApproxTextMetrics::default(),
        }
    }
}

impl Default for SvgRoadmapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: TextMetrics> SvgRoadmapRenderer<M> {
    pub fn theme(mut self, theme: RoadmapTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_metrics<N: TextMetrics>(self, metrics: N) -> SvgRoadmapRenderer<N> {
        SvgRoadmapRenderer {
            theme: self.theme,
            metrics,
        }
    }

    fn text(&self, content: impl Into<String>) -> Text {
        Text::new(content.into())
            .set("font-family", self.theme.font_family.as_str())
            .set("font-size", self.theme.font_size)
    }

    fn render_bands(&self, chart: &ChartLayout) -> Group {
        let config = &chart.config;
        let height = chart.plot_height - config.x_axis_height;
        let mut group = Group::new()
            .set("class", "grid-bands")
            .set("transform", format!("translate(0,{})", config.x_axis_height));

        for (i, (x, width)) in chart.bands().into_iter().enumerate() {
            let fill = if i % 2 == 0 {
                &self.theme.band_colors.0
            } else {
                &self.theme.band_colors.1
            };
            group = group.add(
                Rectangle::new()
                    .set("class", "x-band")
                    .set("x", x)
                    .set("y", 0)
                    .set("width", width)
                    .set("height", height)
                    .set("fill", fill.as_str()),
            );
        }
        group
    }

    /// Axis at `y`; tick labels above it when `top`
    fn render_axis(&self, chart: &ChartLayout, y: f64, top: bool) -> Group {
        let (class, direction) = if top {
            ("x-axis x-axis-top", -1.0)
        } else {
            ("x-axis x-axis-bottom", 1.0)
        };
        let mut group = Group::new()
            .set("class", class)
            .set("transform", format!("translate(0,{})", y));

        group = group.add(
            Line::new()
                .set("class", "domain")
                .set("x1", chart.scale.range.0)
                .set("x2", chart.scale.range.1)
                .set("y1", 0)
                .set("y2", 0)
                .set("stroke", self.theme.axis_color.as_str()),
        );

        let format = chart.tick_unit.label_format();
        for &tick in &chart.ticks {
            let x = chart.scale.project(tick);
            let Some(date) = timestamp_to_datetime(tick) else {
                continue;
            };
            let mut tick_group = Group::new()
                .set("class", "tick")
                .set("transform", format!("translate({},0)", x));
            tick_group = tick_group.add(
                Line::new()
                    .set("y2", direction * TICK_SIZE)
                    .set("stroke", self.theme.axis_color.as_str()),
            );
            tick_group = tick_group.add(
                self.text(date.format(format).to_string())
                    .set("y", direction * (TICK_SIZE + 3.0))
                    .set("dy", if top { "0em" } else { "0.71em" })
                    .set("text-anchor", "middle")
                    .set("fill", self.theme.text_color.as_str()),
            );
            group = group.add(tick_group);
        }
        group
    }

    fn render_today(&self, chart: &ChartLayout, x: f64) -> Group {
        Group::new()
            .set("class", "today")
            .add(
                Line::new()
                    .set("x1", x)
                    .set("y1", 0)
                    .set("x2", x)
                    .set("y2", chart.total_height)
                    .set("stroke", self.theme.today_color.as_str())
                    .set("stroke-width", 1),
            )
            .add(
                self.text(chart.config.today_label.as_str())
                    .set("x", x + 10.0)
                    .set("y", 10)
                    .set("dy", "1em")
                    .set("fill", self.theme.today_color.as_str()),
            )
    }

    fn render_lane(&self, chart: &ChartLayout, index: usize, lane: &LaneLayout) -> Group {
        let config = &chart.config;
        let mut group = Group::new()
            .set("class", "swimlane")
            .set("transform", format!("translate(0,{})", lane.y));

        if index > 0 {
            group = group.add(
                Line::new()
                    .set("class", "swimlane-divider")
                    .set("x1", 0)
                    .set("x2", chart.width)
                    .set("y1", 0)
                    .set("y2", 0)
                    .set("stroke", self.theme.divider_color.as_str()),
            );
        }

        let lines = wrap_words(
            &lane.name,
            config.swimlane_label_width,
            self.theme.font_size,
            &self.metrics,
        );
        let mut label = Group::new().set("class", "swimlane-label");
        for (n, line) in lines.into_iter().enumerate() {
            label = label.add(
                self.text(line)
                    .set("x", 0)
                    .set("y", config.row_height / 2.0)
                    .set("dy", format!("{}em", 0.3 + n as f64 * LABEL_LINE_HEIGHT))
                    .set("fill", self.theme.text_color.as_str()),
            );
        }
        group = group.add(label);

        for item in &lane.items {
            group = group.add(self.render_item(chart, item));
        }
        group
    }

    fn render_item(&self, chart: &ChartLayout, item: &PlacedItem) -> Group {
        let config = &chart.config;
        let event = &item.event;
        let fill = self.theme.status_fill(&event.status_color);
        let mut classes = Vec::new();

        let mut group = Group::new();
        match item.shape {
            ItemShape::Bar {
                x,
                width,
                start_truncated,
                end_truncated,
            } => {
                classes.push("duration");
                if start_truncated {
                    classes.push("start-truncated");
                }
                if end_truncated {
                    classes.push("end-truncated");
                }
                let y = config.bar_y();
                group = group.add(
                    Path::new()
                        .set(
                            "d",
                            bar_path(
                                x,
                                y,
                                width,
                                config.bar_height,
                                self.theme.bar_radius,
                                !start_truncated,
                                !end_truncated,
                            ),
                        )
                        .set("fill", fill),
                );
                let label = truncate_to_width(&event.label, width, self.theme.font_size, &self.metrics);
                if !label.is_empty() {
                    group = group.add(
                        self.text(label)
                            .set("x", x + width / 2.0)
                            .set("y", y + config.bar_height / 2.0)
                            .set("dy", "0.35em")
                            .set("text-anchor", "middle")
                            .set("fill", self.theme.bar_text_color.as_str()),
                    );
                }
            }
            ItemShape::Milestone { x, label_x, .. } => {
                classes.push("milestone");
                let size = config.milestone_size;
                let half = size / 2.0;
                let y = config.milestone_y();
                group = group
                    .add(
                        Rectangle::new()
                            .set("x", x - half)
                            .set("y", y)
                            .set("width", size)
                            .set("height", size)
                            .set("transform", format!("rotate(45,{},{})", x, y + half))
                            .set("fill", fill),
                    )
                    .add(
                        self.text(event.label.as_str())
                            .set("x", label_x)
                            .set("y", y + size - 4.0)
                            .set("fill", self.theme.text_color.as_str()),
                    );
            }
        }

        if !event.status_color.is_empty() {
            classes.push(event.status_color.as_str());
        }
        group = group
            .set("class", classes.join(" "))
            .set("transform", format!("translate(0,{})", item.row as f64 * config.row_height));
        data_attributes(group, event)
    }
}

fn iso_date(ts: Option<Timestamp>) -> String {
    ts.and_then(timestamp_to_datetime)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Attributes a host can read to show event details
fn data_attributes(group: Group, event: &TimelineEvent) -> Group {
    let details = serde_json::to_string(&event.properties).unwrap_or_default();
    group
        .set("data-label", htmlize::escape_attribute(event.label.as_str()).into_owned())
        .set("data-status", event.status_color.as_str())
        .set("data-start", iso_date(event.start))
        .set("data-end", iso_date(event.end))
        .set("data-details", htmlize::escape_attribute(details.as_str()).into_owned())
}

impl<M: TextMetrics> Renderer for SvgRoadmapRenderer<M> {
    type Output = String;

    fn render(&self, chart: &ChartLayout) -> Result<String, RenderError> {
        let width = chart.width;
        let height = chart.total_height;

        let mut document = Document::new()
            .set("width", width)
            .set("height", height)
            .set("viewBox", (0, 0, width, height))
            .set("xmlns", "http://www.w3.org/2000/svg")
            .set("class", "roadmap");

        document = document.add(
            Rectangle::new()
                .set("width", "100%")
                .set("height", "100%")
                .set("fill", self.theme.background_color.as_str()),
        );
        document = document.add(self.render_bands(chart));

        if let Some(x) = chart.today_x {
            document = document.add(self.render_today(chart, x));
        }

        document = document.add(self.render_axis(chart, chart.config.x_axis_height, true));
        for (index, lane) in chart.lanes.iter().enumerate() {
            document = document.add(self.render_lane(chart, index, lane));
        }
        document = document.add(self.render_axis(chart, chart.plot_height, false));

        let mut output = Vec::new();
        svg::write(&mut output, &document)
            .map_err(|e| RenderError::Format(format!("Failed to write SVG: {}", e)))?;

        String::from_utf8(output).map_err(|e| RenderError::Format(format!("Invalid UTF-8: {}", e)))
    }
}

// ============================================================================
// JSON
// ============================================================================

/// Pretty-printed JSON of the whole layout
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    type Output = String;

    fn render(&self, chart: &ChartLayout) -> Result<String, RenderError> {
        serde_json::to_string_pretty(chart).map_err(|e| RenderError::Format(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use roadmap_core::{date_to_timestamp, Swimlane};

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        date_to_timestamp(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn iso_dates() {
        assert_eq!(iso_date(Some(ts(2024, 2, 1))), "2024-02-01");
        assert_eq!(iso_date(None), "");
    }

    #[test]
    fn json_renderer_exports_layout() {
        let lanes = vec![Swimlane::new("Ops").with_events(vec![
            TimelineEvent::new("Audit").start(ts(2024, 1, 1)).end(ts(2024, 2, 1)),
        ])];
        let chart = roadmap_layout::layout(&lanes, 800.0, 0).unwrap();
        let json = JsonRenderer.render(&chart).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tick_unit"], "week");
        assert_eq!(value["lanes"][0]["name"], "Ops");
        assert_eq!(value["lanes"][0]["items"][0]["shape"]["kind"], "bar");
    }
}
