//! Time scale and tick units
//!
//! Calendar arithmetic is done on UTC dates; weeks start on Sunday.

use chrono::{Datelike, Days, Months, NaiveDate};
use roadmap_core::{date_to_timestamp, timestamp_to_datetime, LayoutError, Swimlane, Timestamp};
use serde::Serialize;

/// Horizontal space one tick should ideally get
pub const IDEAL_SPACE_PER_TICK: f64 = 110.0;

/// Calendar granularity of the axis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TickUnit {
    Week,
    Month,
    Year,
}

impl TickUnit {
    /// Candidates in preference order for ties
    pub const ALL: [TickUnit; 3] = [TickUnit::Week, TickUnit::Month, TickUnit::Year];

    fn to_date(ts: Timestamp) -> Result<NaiveDate, LayoutError> {
        timestamp_to_datetime(ts)
            .map(|dt| dt.date_naive())
            .ok_or(LayoutError::InvalidTimestamp(ts))
    }

    fn floor_date(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            TickUnit::Week => {
                date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_sunday())))
            }
            TickUnit::Month => date.with_day(1),
            TickUnit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        }
    }

    fn offset_date(self, date: NaiveDate, step: u32) -> Option<NaiveDate> {
        match self {
            TickUnit::Week => date.checked_add_days(Days::new(7 * u64::from(step))),
            TickUnit::Month => date.checked_add_months(Months::new(step)),
            TickUnit::Year => date.checked_add_months(Months::new(12 * step)),
        }
    }

    /// Start of the unit containing `ts`
    pub fn floor(self, ts: Timestamp) -> Result<Timestamp, LayoutError> {
        let date = Self::to_date(ts)?;
        self.floor_date(date)
            .map(date_to_timestamp)
            .ok_or(LayoutError::InvalidTimestamp(ts))
    }

    /// `ts` moved forward by `step` units (calendar aware)
    pub fn offset(self, ts: Timestamp, step: u32) -> Result<Timestamp, LayoutError> {
        let dt = timestamp_to_datetime(ts).ok_or(LayoutError::InvalidTimestamp(ts))?;
        let time_of_day = ts - date_to_timestamp(dt.date_naive());
        self.offset_date(dt.date_naive(), step)
            .map(|d| date_to_timestamp(d) + time_of_day)
            .ok_or(LayoutError::InvalidTimestamp(ts))
    }

    /// Smallest unit boundary at or after `ts`
    pub fn ceil(self, ts: Timestamp) -> Result<Timestamp, LayoutError> {
        let floor = self.floor(ts)?;
        if floor == ts {
            Ok(floor)
        } else {
            self.offset(floor, 1)
        }
    }

    /// chrono format used for axis labels
    pub fn label_format(self) -> &'static str {
        match self {
            TickUnit::Week => "%d %b %y",
            TickUnit::Month | TickUnit::Year => "%b %Y",
        }
    }
}

/// Linear mapping from a time domain onto a pixel range
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TimeScale {
    pub domain: (Timestamp, Timestamp),
    pub range: (f64, f64),
}

impl TimeScale {
    pub fn new(domain: (Timestamp, Timestamp), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Pixel position of `ts`; not clamped to the range
    pub fn project(&self, ts: Timestamp) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let t = (ts as f64 - d0 as f64) / (d1 as f64 - d0 as f64);
        r0 + t * (r1 - r0)
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.domain.0 && ts <= self.domain.1
    }

    pub fn range_width(&self) -> f64 {
        (self.range.1 - self.range.0).abs()
    }

    /// Unit boundaries within the domain, both ends inclusive
    pub fn ticks(&self, unit: TickUnit) -> Result<Vec<Timestamp>, LayoutError> {
        let (d0, d1) = self.domain;
        let mut ticks = Vec::new();
        if d1 < d0 {
            return Ok(ticks);
        }
        let mut tick = unit.ceil(d0)?;
        while tick <= d1 {
            ticks.push(tick);
            tick = unit.offset(tick, 1)?;
        }
        Ok(ticks)
    }
}

/// Chart domain: explicit bounds where given, event extremes otherwise,
/// widened to whole months.
pub fn compute_domain(
    swimlanes: &[Swimlane],
    start: Option<Timestamp>,
    end: Option<Timestamp>,
) -> Result<(Timestamp, Timestamp), LayoutError> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(LayoutError::InvertedWindow { start, end });
        }
    }
    let spans = || swimlanes.iter().flat_map(|s| &s.events).filter_map(|e| e.span());
    let min = start
        .or_else(|| spans().map(|(s, e)| s.min(e)).min())
        .ok_or(LayoutError::EmptyDomain)?;
    let max = end
        .or_else(|| spans().map(|(s, e)| s.max(e)).max())
        .ok_or(LayoutError::EmptyDomain)?;

    let lower = TickUnit::Month.floor(min)?;
    let upper = TickUnit::Month.offset(TickUnit::Month.floor(max)?, 1)?;
    Ok((lower, upper))
}

/// Tick unit whose tick count over the domain is closest to the number of
/// ticks the pixel range fits.
pub fn suitable_tick_unit(scale: &TimeScale) -> Result<TickUnit, LayoutError> {
    let ideal_ticks = scale.range_width() / IDEAL_SPACE_PER_TICK;
    let (d0, d1) = scale.domain;

    let mut candidates = Vec::with_capacity(TickUnit::ALL.len());
    for unit in TickUnit::ALL {
        let start = unit.floor(d0)?;
        let millis = unit.offset(start, 1)? - start;
        let ticks = (d1 as f64 - d0 as f64) / millis as f64;
        candidates.push((unit, (ideal_ticks - ticks).abs()));
    }
    Ok(closest_unit(candidates).unwrap_or(TickUnit::Month))
}

/// Unit with the smallest variance; the first minimum wins.
fn closest_unit(candidates: impl IntoIterator<Item = (TickUnit, f64)>) -> Option<TickUnit> {
    let mut best: Option<(TickUnit, f64)> = None;
    for (unit, variance) in candidates {
        match best {
            Some((_, v)) if v <= variance => {}
            _ => best = Some((unit, variance)),
        }
    }
    best.map(|(unit, _)| unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use roadmap_core::TimelineEvent;

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        date_to_timestamp(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn week_floor_is_sunday() {
        // 2024-01-03 is a Wednesday
        assert_eq!(TickUnit::Week.floor(ts(2024, 1, 3)).unwrap(), ts(2023, 12, 31));
        assert_eq!(TickUnit::Week.floor(ts(2023, 12, 31)).unwrap(), ts(2023, 12, 31));
    }

    #[test]
    fn month_and_year_floor() {
        let noon = ts(2024, 3, 17) + 12 * 3_600_000;
        assert_eq!(TickUnit::Month.floor(noon).unwrap(), ts(2024, 3, 1));
        assert_eq!(TickUnit::Year.floor(noon).unwrap(), ts(2024, 1, 1));
    }

    #[test]
    fn offsets_follow_the_calendar() {
        assert_eq!(TickUnit::Month.offset(ts(2024, 1, 1), 1).unwrap(), ts(2024, 2, 1));
        assert_eq!(TickUnit::Month.offset(ts(2024, 12, 1), 1).unwrap(), ts(2025, 1, 1));
        assert_eq!(TickUnit::Year.offset(ts(2024, 1, 1), 2).unwrap(), ts(2026, 1, 1));
        assert_eq!(TickUnit::Week.offset(ts(2024, 1, 7), 1).unwrap(), ts(2024, 1, 14));
    }

    #[test]
    fn ceil_keeps_boundaries() {
        assert_eq!(TickUnit::Month.ceil(ts(2024, 2, 1)).unwrap(), ts(2024, 2, 1));
        assert_eq!(TickUnit::Month.ceil(ts(2024, 2, 2)).unwrap(), ts(2024, 3, 1));
    }

    #[test]
    fn projection_is_linear() {
        let scale = TimeScale::new((ts(2024, 1, 1), ts(2024, 1, 11)), (100.0, 200.0));
        assert_eq!(scale.project(ts(2024, 1, 1)), 100.0);
        assert_eq!(scale.project(ts(2024, 1, 6)), 150.0);
        assert_eq!(scale.project(ts(2024, 1, 11)), 200.0);
    }

    #[test]
    fn month_ticks_include_both_ends() {
        let scale = TimeScale::new((ts(2024, 1, 1), ts(2024, 4, 1)), (0.0, 300.0));
        assert_eq!(
            scale.ticks(TickUnit::Month).unwrap(),
            vec![ts(2024, 1, 1), ts(2024, 2, 1), ts(2024, 3, 1), ts(2024, 4, 1)]
        );
    }

    #[test]
    fn six_months_at_660_pixels_picks_months() {
        let scale = TimeScale::new((ts(2024, 1, 1), ts(2024, 7, 1)), (0.0, 660.0));
        assert_eq!(suitable_tick_unit(&scale).unwrap(), TickUnit::Month);
    }

    #[test]
    fn narrow_ranges_and_long_domains_pick_years() {
        let scale = TimeScale::new((ts(2020, 1, 1), ts(2026, 1, 1)), (0.0, 660.0));
        assert_eq!(suitable_tick_unit(&scale).unwrap(), TickUnit::Year);
    }

    #[test]
    fn wide_ranges_and_short_domains_pick_weeks() {
        let scale = TimeScale::new((ts(2024, 1, 1), ts(2024, 3, 1)), (0.0, 1000.0));
        assert_eq!(suitable_tick_unit(&scale).unwrap(), TickUnit::Week);
    }

    #[test]
    fn domain_rounds_to_months() {
        let lanes = vec![Swimlane::new("a").with_events(vec![
            TimelineEvent::new("x").start(ts(2024, 1, 15)).end(ts(2024, 2, 10)),
            TimelineEvent::new("y").end(ts(2024, 3, 20)),
        ])];
        assert_eq!(
            compute_domain(&lanes, None, None).unwrap(),
            (ts(2024, 1, 1), ts(2024, 4, 1))
        );
        assert_eq!(
            compute_domain(&lanes, Some(ts(2023, 11, 5)), None).unwrap(),
            (ts(2023, 11, 1), ts(2024, 4, 1))
        );
    }

    #[test]
    fn empty_domain() {
        assert_eq!(compute_domain(&[], None, None), Err(LayoutError::EmptyDomain));
        assert!(compute_domain(&[], Some(ts(2024, 1, 1)), Some(ts(2024, 2, 1))).is_ok());
    }

    #[test]
    fn equal_variances_keep_the_first_unit() {
        assert_eq!(
            closest_unit([(TickUnit::Week, 2.0), (TickUnit::Month, 2.0), (TickUnit::Year, 3.0)]),
            Some(TickUnit::Week)
        );
        assert_eq!(
            closest_unit([(TickUnit::Week, 4.0), (TickUnit::Month, 1.5), (TickUnit::Year, 1.5)]),
            Some(TickUnit::Month)
        );
        assert_eq!(closest_unit(Vec::new()), None);
    }

    #[test]
    fn inverted_window_is_rejected() {
        assert_eq!(
            compute_domain(&[], Some(ts(2024, 6, 1)), Some(ts(2024, 1, 1))),
            Err(LayoutError::InvertedWindow {
                start: ts(2024, 6, 1),
                end: ts(2024, 1, 1),
            })
        );
    }

    #[test]
    fn projection_spans_distant_timestamps() {
        let scale = TimeScale::new((ts(1960, 1, 1), ts(2030, 1, 1)), (0.0, 700.0));
        let far = scale.project(i64::MAX);
        assert!(far.is_finite());
        assert!(far > 700.0);
        assert!(scale.project(i64::MIN) < 0.0);
    }
}
