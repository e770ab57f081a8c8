//! Signal time extraction.
//!
//! Patterns are tried in order: `time:`-prefixed date-times, bare date-times,
//! then date-only forms. A pattern only wins if its match also parses under
//! the paired date format; otherwise the next pattern is tried. Times are
//! taken as already being UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

const TIME_PART: &str = r"(\d{1,2}:\d{2}(?::\d{2})?)";

struct TimePattern {
    regex: Regex,
    date_format: &'static str,
    has_time: bool,
}

/// (date regex, chrono date format)
const DATE_FORMS: &[(&str, &str)] = &[
    (r"\d{4}-\d{1,2}-\d{1,2}", "%Y-%m-%d"),
    (r"\d{4}/\d{1,2}/\d{1,2}", "%Y/%m/%d"),
    (r"\d{1,2}-[A-Za-z]{3}-\d{4}", "%d-%b-%Y"),
    (r"\d{1,2}/\d{1,2}/\d{4}", "%m/%d/%Y"),
    (r"\d{1,2}\.\d{1,2}\.\d{4}", "%d.%m.%Y"),
];

/// Date-only forms are limited to ISO and year-first slash dates.
const DATE_ONLY_FORMS: usize = 2;

static TIME_PATTERNS: LazyLock<Vec<TimePattern>> = LazyLock::new(|| {
    let mut patterns = Vec::new();
    for prefix in [r"time:\s*", ""] {
        for (date_re, fmt) in DATE_FORMS {
            patterns.push(TimePattern {
                regex: Regex::new(&format!(r"(?i){prefix}({date_re})\s*{TIME_PART}")).unwrap(),
                date_format: fmt,
                has_time: true,
            });
        }
    }
    for prefix in [r"time:\s*", ""] {
        for (date_re, fmt) in &DATE_FORMS[..DATE_ONLY_FORMS] {
            patterns.push(TimePattern {
                regex: Regex::new(&format!(r"(?i){prefix}({date_re})")).unwrap(),
                date_format: fmt,
                has_time: false,
            });
        }
    }
    patterns
});

pub fn extract_time(text: &str) -> Option<DateTime<Utc>> {
    TIME_PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.regex.captures(text)?;
        let date = normalize_month(caps.get(1)?.as_str());
        let naive = if pattern.has_time {
            parse_date_time(&date, caps.get(2)?.as_str(), pattern.date_format)?
        } else {
            NaiveDate::parse_from_str(&date, pattern.date_format)
                .ok()?
                .and_hms_opt(0, 0, 0)?
        };
        Some(naive.and_utc())
    })
}

/// Tries the format with seconds first, then without.
fn parse_date_time(date: &str, time: &str, date_format: &str) -> Option<NaiveDateTime> {
    let joined = format!("{date} {time}");
    NaiveDateTime::parse_from_str(&joined, &format!("{date_format} %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(&joined, &format!("{date_format} %H:%M")))
        .ok()
}

/// `15-NOV-2023` -> `15-Nov-2023`; numeric dates pass through unchanged.
fn normalize_month(date: &str) -> String {
    let mut out = String::with_capacity(date.len());
    let mut prev_alpha = false;
    for c in date.chars() {
        if c.is_ascii_alphabetic() {
            if prev_alpha {
                out.push(c.to_ascii_lowercase());
            } else {
                out.push(c.to_ascii_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn iso_with_and_without_seconds() {
        assert_eq!(
            extract_time("Time: 2023-11-15 08:00"),
            Some(utc(2023, 11, 15, 8, 0, 0))
        );
        assert_eq!(
            extract_time("time: 2023-11-15 08:00:30"),
            Some(utc(2023, 11, 15, 8, 0, 30))
        );
        assert_eq!(
            extract_time("posted 2024-1-5 7:05"),
            Some(utc(2024, 1, 5, 7, 5, 0))
        );
    }

    #[test]
    fn slash_month_name_us_and_dot_forms() {
        assert_eq!(
            extract_time("Time: 2023/12/01 12:00"),
            Some(utc(2023, 12, 1, 12, 0, 0))
        );
        assert_eq!(
            extract_time("Time: 15-Nov-2023 08:00"),
            Some(utc(2023, 11, 15, 8, 0, 0))
        );
        assert_eq!(
            extract_time("at 15-NOV-2023 08:00:15"),
            Some(utc(2023, 11, 15, 8, 0, 15))
        );
        assert_eq!(
            extract_time("sent 11/15/2023 08:00"),
            Some(utc(2023, 11, 15, 8, 0, 0))
        );
        assert_eq!(
            extract_time("sent 15.11.2023 08:00"),
            Some(utc(2023, 11, 15, 8, 0, 0))
        );
    }

    #[test]
    fn date_only_defaults_to_midnight() {
        assert_eq!(extract_time("Time: 2024-01-10"), Some(utc(2024, 1, 10, 0, 0, 0)));
        assert_eq!(extract_time("on 2024/01/10"), Some(utc(2024, 1, 10, 0, 0, 0)));
    }

    #[test]
    fn prefixed_time_wins_over_earlier_bare_time() {
        assert_eq!(
            extract_time("opened 2023-01-01 00:00, Time: 2023-11-15 08:00"),
            Some(utc(2023, 11, 15, 8, 0, 0))
        );
    }

    #[test]
    fn invalid_date_falls_through_to_next_pattern() {
        // month 13 fails ISO, the US form further on still parses
        assert_eq!(
            extract_time("Time: 2023-13-40 08:00 / 11/15/2023 09:30"),
            Some(utc(2023, 11, 15, 9, 30, 0))
        );
        assert_eq!(extract_time("Time: 2023-13-40 08:00"), None);
    }

    #[test]
    fn no_time_at_all() {
        assert_eq!(extract_time("BTC/USDT Buy at 35000"), None);
    }
}
