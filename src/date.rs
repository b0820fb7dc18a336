//! Resolves a publication timestamp for every post. Resolution tries, in
//! order: an explicit `published_at` front matter value, a date embedded in
//! the source file path, the file's creation time, and finally the time of
//! the build. The first three rules are pure given their inputs; the last one
//! exists only so that a post can never end up without a timestamp.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    /// `yyyy-mm-dd` or `yyyy-dd-mm`, with any non-digit separator.
    static ref YEAR_FIRST: Regex =
        Regex::new(r"(\d{4})\D(\d?\d)\D(\d?\d)").unwrap();

    /// `dd-mm-yyyy` or `mm-dd-yyyy`, with any non-digit separator.
    static ref YEAR_LAST: Regex =
        Regex::new(r"(\d?\d)\D(\d?\d)\D(\d{4})").unwrap();
}

/// Resolves the publication timestamp for a post. `explicit` is the raw
/// `published_at` front matter value if present, `path` is the source path
/// relative to the input root, and `ctime` is the file's creation time where
/// the filesystem reports one.
pub fn resolve(
    explicit: Option<&str>,
    path: &Path,
    ctime: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    if let Some(date) = explicit.and_then(parse_explicit) {
        return date;
    }
    if let Some(date) = from_path(path) {
        return date;
    }
    match ctime {
        Some(ctime) => ctime,
        None => Utc::now(),
    }
}

/// Parses an explicit `published_at` value. Accepts RFC 3339, a naive
/// datetime, or a bare date. Unparseable values are not an error; the caller
/// falls through to the next resolution rule.
fn parse_explicit(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}

/// Extracts a date from a file path, trying the year-first pattern before the
/// year-last pattern.
fn from_path(path: &Path) -> Option<DateTime<Utc>> {
    let path = path.to_string_lossy();
    if let Some(caps) = YEAR_FIRST.captures(&path) {
        if let Some(date) = build_date(&caps[1], &caps[2], &caps[3]) {
            return Some(date);
        }
    }
    if let Some(caps) = YEAR_LAST.captures(&path) {
        if let Some(date) = build_date(&caps[3], &caps[1], &caps[2]) {
            return Some(date);
        }
    }
    None
}

/// Disambiguates the two-digit pair: a value greater than 12 cannot be a
/// month, so it forces the other position to be interpreted as the month.
fn month_and_day(a: u32, b: u32) -> (u32, u32) {
    if a > 12 {
        (b, a)
    } else {
        (a, b)
    }
}

/// Builds a timestamp from captured digit groups. The day is applied as an
/// offset from the first of the month rather than validated against it, so a
/// structurally matching but impossible day like `2014-02-30` rolls over into
/// the next month instead of being rejected.
fn build_date(year: &str, a: &str, b: &str) -> Option<DateTime<Utc>> {
    let year: i32 = year.parse().ok()?;
    let a: u32 = a.parse().ok()?;
    let b: u32 = b.parse().ok()?;
    let (month, day) = month_and_day(a, b);
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let date = first + Duration::days(i64::from(day) - 1);
    date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_explicit_date_wins_over_path_and_ctime() {
        let resolved = resolve(
            Some("2014-01-30 11:26:04"),
            Path::new("2017-05-05-post.md"),
            Some(utc(2020, 6, 1)),
        );
        assert_eq!(
            resolved,
            Utc.with_ymd_and_hms(2014, 1, 30, 11, 26, 4).unwrap()
        );
    }

    #[test]
    fn test_explicit_bare_date() {
        let resolved = resolve(Some("2015-09-03"), Path::new("post.md"), None);
        assert_eq!(resolved, utc(2015, 9, 3));
    }

    #[test]
    fn test_malformed_explicit_falls_back_to_path() {
        let resolved =
            resolve(Some("soonish"), Path::new("2014-01-30-hello.md"), None);
        assert_eq!(resolved, utc(2014, 1, 30));
    }

    #[test]
    fn test_path_date_wins_over_ctime() {
        let resolved = resolve(
            None,
            Path::new("2014-01-30-hello.md"),
            Some(utc(2020, 6, 1)),
        );
        assert_eq!(resolved, utc(2014, 1, 30));
    }

    #[test]
    fn test_path_date_with_directory_separators() {
        let resolved = resolve(None, Path::new("2014/02/11/foo.md"), None);
        assert_eq!(resolved, utc(2014, 2, 11));
    }

    #[test]
    fn test_day_first_disambiguation() {
        // 30 cannot be a month, so it must be the day.
        let resolved = resolve(None, Path::new("30-04-2014-bar.md"), None);
        assert_eq!(resolved, utc(2014, 4, 30));
    }

    #[test]
    fn test_month_first_disambiguation() {
        let resolved = resolve(None, Path::new("04-30-2014-baz.md"), None);
        assert_eq!(resolved, utc(2014, 4, 30));
    }

    #[test]
    fn test_impossible_day_rolls_over() {
        // The matcher performs no day-range validation; day 30 in February is
        // carried past the end of the month rather than falling through to a
        // lower-precedence rule.
        let resolved = resolve(None, Path::new("2014/02/30/foo.md"), Some(utc(2020, 6, 1)));
        assert_eq!(resolved, utc(2014, 3, 2));
    }

    #[test]
    fn test_ctime_fallback() {
        let resolved = resolve(None, Path::new("undated.md"), Some(utc(2019, 7, 4)));
        assert_eq!(resolved, utc(2019, 7, 4));
    }

    #[test]
    fn test_now_fallback_still_produces_a_timestamp() {
        let before = Utc::now();
        let resolved = resolve(None, Path::new("undated.md"), None);
        assert!(resolved >= before);
    }
}
