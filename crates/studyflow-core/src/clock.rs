//! Day-boundary math in the product's fixed planning timezone.
//!
//! Plans are keyed by calendar date evaluated at UTC+9, regardless of where
//! the server runs. The engine never reads the wall clock itself: callers
//! pass an explicit date, and [`today`] exists only for CLI defaulting.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::ValidationError;

/// Offset of the fixed planning timezone, in hours east of UTC.
pub const PLAN_TZ_OFFSET_HOURS: i32 = 9;

/// The fixed planning timezone as a chrono offset.
pub fn plan_timezone() -> FixedOffset {
    FixedOffset::east_opt(PLAN_TZ_OFFSET_HOURS * 3600).unwrap()
}

/// A half-open UTC window `[start, end)` covering one planning day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Parse a `YYYY-MM-DD` plan date.
///
/// # Errors
/// Returns [`ValidationError::InvalidDate`] for anything that does not parse
/// as a real calendar date.
pub fn parse_plan_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        input: input.to_string(),
    })
}

/// UTC window covering `date` in the planning timezone.
pub fn day_window(date: NaiveDate) -> DayWindow {
    let midnight_local = date.and_time(NaiveTime::MIN);
    let start = Utc.from_utc_datetime(&(midnight_local - Duration::hours(PLAN_TZ_OFFSET_HOURS as i64)));
    DayWindow {
        start,
        end: start + Duration::days(1),
    }
}

/// UTC window covering the day before `date`, the pool carry-over
/// candidates are drawn from.
pub fn carry_over_window(date: NaiveDate) -> DayWindow {
    let day = day_window(date);
    DayWindow {
        start: day.start - Duration::days(1),
        end: day.start,
    }
}

/// Current calendar date in the planning timezone.
///
/// Used by the CLI to default the `--date` argument; the engine itself only
/// ever receives explicit dates.
pub fn today() -> NaiveDate {
    Utc::now().with_timezone(&plan_timezone()).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_date() {
        let date = parse_plan_date("2026-08-07").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 8, 7).unwrap());
    }

    #[test]
    fn trims_whitespace() {
        assert!(parse_plan_date(" 2026-08-07 ").is_ok());
    }

    #[test]
    fn rejects_malformed_dates() {
        for input in ["", "tomorrow", "2026-13-01", "2026-02-30", "08-07-2026"] {
            let err = parse_plan_date(input).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidDate { .. }), "{input}");
        }
    }

    #[test]
    fn day_window_starts_at_local_midnight() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let window = day_window(date);
        // Midnight at UTC+9 is 15:00 UTC the previous day.
        assert_eq!(window.start.to_rfc3339(), "2026-08-06T15:00:00+00:00");
        assert_eq!(window.end - window.start, Duration::days(1));
    }

    #[test]
    fn carry_over_window_is_previous_day() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let carry = carry_over_window(date);
        let day = day_window(date);
        assert_eq!(carry.end, day.start);
        assert_eq!(carry.end - carry.start, Duration::days(1));
    }
}
