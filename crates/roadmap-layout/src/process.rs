//! Date normalization and window filtering

use roadmap_core::{DateWindow, LayoutError, Swimlane};

use crate::scale::TickUnit;

/// Window widened to whole months: start floored to its month, end floored
/// and moved to the following month.
pub fn requested_window(window: &DateWindow) -> Result<DateWindow, LayoutError> {
    let start = window.start.map(|s| TickUnit::Month.floor(s)).transpose()?;
    let end = window
        .end
        .map(|e| TickUnit::Month.floor(e).and_then(|f| TickUnit::Month.offset(f, 1)))
        .transpose()?;
    Ok(DateWindow::new(start, end))
}

/// Fill in missing dates and drop what lies outside `window`.
///
/// Events with a single date become milestones. Swimlanes left without
/// events are removed. Applying this twice gives the same result.
pub fn process_data(swimlanes: &[Swimlane], window: &DateWindow) -> Vec<Swimlane> {
    swimlanes
        .iter()
        .filter_map(|lane| {
            let events: Vec<_> = lane
                .events
                .iter()
                .map(|e| e.normalized())
                .filter(|e| match e.span() {
                    Some((start, end)) => window.admits(start, end),
                    None => false,
                })
                .collect();
            (!events.is_empty()).then(|| Swimlane::new(lane.name.clone()).with_events(events))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use roadmap_core::{date_to_timestamp, TimelineEvent, Timestamp};

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        date_to_timestamp(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn lanes() -> Vec<Swimlane> {
        vec![
            Swimlane::new("Backend").with_events(vec![
                TimelineEvent::new("old").start(ts(2023, 1, 1)).end(ts(2023, 2, 1)),
                TimelineEvent::new("current").start(ts(2024, 1, 10)).end(ts(2024, 3, 1)),
                TimelineEvent::new("launch").end(ts(2024, 2, 1)),
            ]),
            Swimlane::new("Legacy").with_events(vec![
                TimelineEvent::new("sunset").start(ts(2022, 5, 1)),
            ]),
        ]
    }

    #[test]
    fn normalizes_single_dates_to_milestones() {
        let processed = process_data(&lanes(), &DateWindow::unbounded());
        let launch = &processed[0].events[2];
        assert_eq!(launch.start, Some(ts(2024, 2, 1)));
        assert!(launch.is_milestone());
        assert_eq!(processed[1].events[0].end, Some(ts(2022, 5, 1)));
    }

    #[test]
    fn filters_by_window_and_drops_empty_swimlanes() {
        let window = DateWindow::new(Some(ts(2024, 1, 1)), None);
        let processed = process_data(&lanes(), &window);

        assert_eq!(processed.len(), 1);
        let labels: Vec<&str> = processed[0].events.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["current", "launch"]);
    }

    #[test]
    fn window_end_excludes_later_starts() {
        let window = DateWindow::new(None, Some(ts(2023, 6, 1)));
        let processed = process_data(&lanes(), &window);
        let names: Vec<&str> = processed.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Backend", "Legacy"]);
        assert_eq!(processed[0].events.len(), 1);
    }

    #[test]
    fn processing_is_idempotent() {
        let window = DateWindow::new(Some(ts(2024, 1, 1)), Some(ts(2024, 12, 31)));
        let once = process_data(&lanes(), &window);
        let twice = process_data(&once, &window);
        assert_eq!(once, twice);
    }

    #[test]
    fn requested_window_covers_whole_months() {
        let window = DateWindow::new(Some(ts(2024, 1, 20)), Some(ts(2024, 3, 5)));
        assert_eq!(
            requested_window(&window).unwrap(),
            DateWindow::new(Some(ts(2024, 1, 1)), Some(ts(2024, 4, 1)))
        );
        assert_eq!(
            requested_window(&DateWindow::unbounded()).unwrap(),
            DateWindow::unbounded()
        );
    }
}
