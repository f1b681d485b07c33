//! Free-text duration parsing
//!
//! Sums every `<number><unit>` token in the input, so `"1h 30m"` and
//! `"1 hour, 30 minutes"` read the same. A token with a unit the table does
//! not know counts as milliseconds.

use std::sync::OnceLock;

use regex::Regex;

const MS_PER_SECOND: f64 = 1000.0;
const MS_PER_MINUTE: f64 = MS_PER_SECOND * 60.0;
const MS_PER_HOUR: f64 = MS_PER_MINUTE * 60.0;
const MS_PER_DAY: f64 = MS_PER_HOUR * 24.0;
const MS_PER_WEEK: f64 = MS_PER_DAY * 7.0;
const MS_PER_YEAR: f64 = MS_PER_DAY * 365.25;
const MS_PER_MONTH: f64 = MS_PER_YEAR / 12.0;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(-?\d*\.?\d+(?:e[-+]?\d+)?)\s*([a-zμ]*)").expect("valid duration regex")
    })
}

/// Milliseconds per unit, `None` for unknown units
fn unit_multiplier(unit: &str) -> Option<f64> {
    let ms = match unit {
        "nanosecond" | "ns" => 1e-6,
        "μs" | "microsecond" => 1e-3,
        "millisecond" | "ms" => 1.0,
        "second" | "sec" | "s" => MS_PER_SECOND,
        "minute" | "min" | "m" => MS_PER_MINUTE,
        "hour" | "hr" | "h" => MS_PER_HOUR,
        "day" | "d" => MS_PER_DAY,
        "week" | "wk" | "w" => MS_PER_WEEK,
        "month" => MS_PER_MONTH,
        "year" | "yr" | "y" => MS_PER_YEAR,
        _ => return None,
    };
    Some(ms)
}

fn resolve_unit(unit: &str) -> f64 {
    if let Some(ms) = unit_multiplier(unit) {
        return ms;
    }
    let lower = unit.to_lowercase();
    let singular = lower.strip_suffix('s').unwrap_or(&lower);
    unit_multiplier(singular).unwrap_or(1.0)
}

/// Parse a duration such as `"2d"` or `"1h 30m"` into milliseconds.
///
/// Returns `None` when the text holds no numeric token at all.
pub fn parse_duration(text: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut matched = false;
    for caps in token_regex().captures_iter(text) {
        let Ok(value) = caps[1].parse::<f64>() else {
            continue;
        };
        matched = true;
        total += value * resolve_unit(&caps[2]);
    }
    matched.then_some(total)
}

/// Leading decimal number of `text`, ignoring anything after it
pub fn parse_number_prefix(text: &str) -> Option<f64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid number regex")
    });
    re.find(text.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
