//! Layout properties over whole charts

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use roadmap_core::{date_to_timestamp, DateWindow, Swimlane, TimelineEvent, Timestamp};
use roadmap_layout::{layout, ItemShape, LayoutConfig, TickUnit, TimelineLayout};

fn ts(y: i32, m: u32, d: u32) -> Timestamp {
    date_to_timestamp(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn bar(label: &str, start: Timestamp, end: Timestamp) -> TimelineEvent {
    TimelineEvent::new(label).start(start).end(end)
}

fn busy_lanes() -> Vec<Swimlane> {
    vec![
        Swimlane::new("Backend").with_events(vec![
            bar("Design", ts(2024, 1, 1), ts(2024, 2, 1)),
            bar("Build", ts(2024, 1, 15), ts(2024, 4, 1)),
            bar("Load test", ts(2024, 2, 2), ts(2024, 3, 1)),
            TimelineEvent::new("Beta").end(ts(2024, 3, 1)),
            bar("Harden", ts(2024, 4, 1), ts(2024, 5, 1)),
        ]),
        Swimlane::new("Frontend").with_events(vec![
            bar("Wireframes", ts(2024, 1, 1), ts(2024, 1, 20)),
            TimelineEvent::new("Launch").start(ts(2024, 5, 15)),
        ]),
    ]
}

// =============================================================================
// Row packing
// =============================================================================

#[test]
fn rows_never_overlap() {
    let chart = layout(&busy_lanes(), 1200.0, 0).unwrap();

    for lane in &chart.lanes {
        for (i, a) in lane.items.iter().enumerate() {
            for b in &lane.items[i + 1..] {
                if a.row == b.row {
                    assert!(
                        !a.bounds.overlaps(&b.bounds),
                        "{} and {} share row {}",
                        a.event.label,
                        b.event.label,
                        a.row
                    );
                }
            }
        }
    }
}

#[test]
fn packing_is_greedy_and_reproducible() {
    let first = layout(&busy_lanes(), 1200.0, 0).unwrap();
    let second = layout(&busy_lanes(), 1200.0, 0).unwrap();
    assert_eq!(first, second);

    let rows: Vec<usize> = first.lanes[0].items.iter().map(|i| i.row).collect();
    // Design, Build overlap; Load test overlaps Build but fits after Design
    assert_eq!(rows[0], 0);
    assert_eq!(rows[1], 1);
    assert_eq!(rows[2], 0);
    assert_eq!(first.lanes[0].row_count, 1 + rows.iter().max().copied().unwrap_or(0));
}

#[test]
fn lane_heights_stack_below_the_axis() {
    let chart = layout(&busy_lanes(), 1200.0, 0).unwrap();
    let config = LayoutConfig::default();

    assert_eq!(chart.lanes[0].y, config.x_axis_height);
    assert_eq!(
        chart.lanes[1].y,
        config.x_axis_height + chart.lanes[0].row_count as f64 * config.row_height
    );
    assert_eq!(chart.plot_height, chart.lanes[1].y + chart.lanes[1].height);
    assert_eq!(chart.total_height, chart.plot_height + config.x_axis_height);
}

// =============================================================================
// Domain and ticks
// =============================================================================

#[test]
fn domain_is_month_rounded_around_events() {
    let chart = layout(&busy_lanes(), 1200.0, 0).unwrap();
    assert_eq!(chart.scale.domain, (ts(2024, 1, 1), ts(2024, 6, 1)));
    assert_eq!(chart.scale.range, (150.0, 1150.0));
}

#[test]
fn six_month_chart_uses_month_ticks() {
    let lanes = vec![Swimlane::new("a").with_events(vec![bar("x", ts(2024, 1, 1), ts(2024, 6, 10))])];
    // range = 860 - 150 - 50 = 660 pixels
    let chart = layout(&lanes, 860.0, 0).unwrap();
    assert_eq!(chart.tick_unit, TickUnit::Month);
    assert_eq!(chart.ticks.len(), 7);
}

#[test]
fn today_marker_only_inside_domain() {
    let inside = layout(&busy_lanes(), 1200.0, ts(2024, 3, 15)).unwrap();
    let x = inside.today_x.unwrap();
    assert!(x > 150.0 && x < 1150.0);

    let outside = layout(&busy_lanes(), 1200.0, ts(2025, 1, 1)).unwrap();
    assert_eq!(outside.today_x, None);
}

// =============================================================================
// Window and truncation
// =============================================================================

#[test]
fn window_filters_and_truncates() {
    let config = LayoutConfig::default().with_window(DateWindow::new(
        Some(ts(2024, 2, 10)),
        Some(ts(2024, 3, 10)),
    ));
    let chart = TimelineLayout::with_config(config).layout(&busy_lanes(), 1200.0, 0).unwrap();

    // Wireframes ends before February and Launch starts after March
    let names: Vec<&str> = chart.lanes.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Backend"]);
    assert_eq!(chart.scale.domain, (ts(2024, 2, 1), ts(2024, 4, 1)));

    let build = chart.lanes[0]
        .items
        .iter()
        .find(|i| i.event.label == "Build")
        .unwrap();
    match build.shape {
        ItemShape::Bar {
            x,
            start_truncated,
            end_truncated,
            ..
        } => {
            assert!(start_truncated);
            assert!(!end_truncated);
            assert_eq!(x, chart.scale.range.0);
        }
        ref other => panic!("expected bar, got {:?}", other),
    }

    let harden = chart.lanes[0].items.iter().find(|i| i.event.label == "Harden");
    match harden.map(|h| &h.shape) {
        Some(ItemShape::Bar { end_truncated, .. }) => assert!(*end_truncated),
        other => panic!("expected truncated bar, got {:?}", other),
    }
}

#[test]
fn empty_input_without_window_is_an_error() {
    assert!(layout(&[], 800.0, 0).is_err());
}
