//! Date cell parsing
//!
//! Three strategies, first success wins:
//! 1. a `<time datetime="YYYY-MM-DD">` marker inside the cell (strict)
//! 2. the cell text against the host date pattern
//! 3. a loose `D-M-Y` numeric pattern anywhere in the text (`1-6-2014`)

use std::sync::OnceLock;

use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::NaiveDate;
use regex::Regex;
use roadmap_core::{date_to_timestamp, Timestamp};

use crate::dom::Element;

/// A host date pattern translated to `chrono` syntax.
///
/// Hosts speak Java `SimpleDateFormat`: `dd MMM yyyy`, `yyyy-MM-dd`,
/// `EEE, d MMM yy` and so on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateFormat {
    host: String,
    chrono: String,
}

impl DateFormat {
    pub fn from_host(pattern: &str) -> Self {
        Self {
            host: pattern.to_string(),
            chrono: host_to_chrono(pattern),
        }
    }

    pub fn host_pattern(&self) -> &str {
        &self.host
    }

    pub fn chrono_pattern(&self) -> &str {
        &self.chrono
    }

    /// Strict parse: the whole text must match the pattern.
    ///
    /// Patterns without a day of month (`MMM yyyy`) resolve to the first.
    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        let mut parsed = Parsed::new();
        parse(&mut parsed, text, StrftimeItems::new(&self.chrono)).ok()?;
        parsed.to_naive_date().ok().or_else(|| {
            parsed.set_day(1).ok()?;
            parsed.to_naive_date().ok()
        })
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self::from_host(roadmap_core::config::DEFAULT_DATE_FORMAT)
    }
}

/// Translate a `SimpleDateFormat` pattern into a `chrono` format string
fn host_to_chrono(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            // Quoted literal, '' is an escaped quote
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    i += 1;
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            continue;
        }

        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        i += run;
        let spec = match (c, run) {
            ('y', 2) => "%y",
            ('y', _) => "%Y",
            ('M', 1 | 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', _) => "%d",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('H', _) => "%H",
            ('h', _) => "%I",
            ('m', _) => "%M",
            ('s', _) => "%S",
            ('a', _) => "%p",
            _ => {
                for _ in 0..run {
                    push_literal(&mut out, c);
                }
                continue;
            }
        };
        out.push_str(spec);
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn parse_time_marker(datetime: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(datetime.trim(), "%Y-%m-%d").ok()
}

/// Loose numeric fallback: day-month-year, or year-month-day when the first
/// group has four digits.
fn parse_day_month_year(text: &str) -> Option<NaiveDate> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(\d+)-(\d+)-(\d+)").expect("valid date regex"));
    let caps = re.captures(text)?;
    let first: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let last: i32 = caps[3].parse().ok()?;
    if caps[1].len() == 4 {
        NaiveDate::from_ymd_opt(i32::try_from(first).ok()?, month, u32::try_from(last).ok()?)
    } else {
        NaiveDate::from_ymd_opt(last, month, first)
    }
}

/// Resolve a date cell to a timestamp at UTC midnight.
///
/// `language` selects month and weekday names; only English names are
/// recognized for now, other languages fall through to the numeric pattern.
pub fn parse_date(cell: Option<&Element>, format: &DateFormat, language: &str) -> Option<Timestamp> {
    let cell = cell?;

    let date = if let Some(time) = cell.find(|e| e.is("time")) {
        time.attr("datetime").and_then(parse_time_marker)
    } else {
        let text = cell.text();
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            format.parse(text).or_else(|| {
                tracing::trace!(text, language, pattern = format.host_pattern(), "falling back to D-M-Y");
                parse_day_month_year(text)
            })
        }
    };

    date.map(date_to_timestamp)
}
