// SPDX-License-Identifier: MIT

//! Shared helpers for date/time handling.

use chrono::{DateTime, Datelike, Duration, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Sunday of the week containing `date`.
pub fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date) + Duration::days(6)
}

/// True if `date` falls in the week starting at `start` (Monday).
pub fn in_week(date: NaiveDate, start: NaiveDate) -> bool {
    date >= start && date < start + Duration::days(7)
}

/// Extract the calendar day from a provider-local timestamp such as
/// `2025-03-10T07:12:33Z` or `2025-03-10T07:12:33`.
///
/// Providers report `start_date_local` already shifted into the athlete's
/// timezone, so the leading ten characters are the day the athlete saw.
pub fn local_day(timestamp: &str) -> Option<NaiveDate> {
    let day = timestamp.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_start_is_monday() {
        // 2025-03-12 is a Wednesday
        let wed = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        assert_eq!(week_start(wed), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        // Monday maps to itself
        let mon = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(week_start(mon), mon);
        // Sunday belongs to the preceding Monday's week
        let sun = NaiveDate::from_ymd_opt(2025, 3, 16).unwrap();
        assert_eq!(week_start(sun), mon);
    }

    #[test]
    fn test_in_week_bounds() {
        let mon = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert!(in_week(mon, mon));
        assert!(in_week(NaiveDate::from_ymd_opt(2025, 3, 16).unwrap(), mon));
        assert!(!in_week(NaiveDate::from_ymd_opt(2025, 3, 17).unwrap(), mon));
        assert!(!in_week(NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(), mon));
    }

    #[test]
    fn test_local_day_parses_prefix() {
        assert_eq!(
            local_day("2025-03-10T07:12:33Z"),
            NaiveDate::from_ymd_opt(2025, 3, 10)
        );
        assert_eq!(local_day("2025-03-10"), NaiveDate::from_ymd_opt(2025, 3, 10));
        assert_eq!(local_day("garbage"), None);
        assert_eq!(local_day(""), None);
    }
}
