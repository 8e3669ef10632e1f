//! Purpose: Stamp reports with the calendar date in California.
//! Exports: `pacific_offset`, `pacific_date`, `today_pacific`, `parse_date`, `format_date`.
//! Role: Timezone glue for the report assembler, kept free of a tz database dependency.
//! Invariants: DST follows the US rules in force since 2007 (second Sunday of March 02:00
//! standard time through first Sunday of November 02:00 daylight time).
use time::macros::{format_description, offset};
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::core::error::{Error, ErrorKind, Result};

const PACIFIC_STANDARD: UtcOffset = offset!(-8);
const PACIFIC_DAYLIGHT: UtcOffset = offset!(-7);

pub fn pacific_offset(instant: OffsetDateTime) -> UtcOffset {
    let utc = instant.to_offset(UtcOffset::UTC);
    let year = utc.year();
    // 02:00 PST is 10:00 UTC; 02:00 PDT is 09:00 UTC.
    let start = transition(year, Month::March, 2, 10);
    let end = transition(year, Month::November, 1, 9);
    match (start, end) {
        (Some(start), Some(end)) if utc >= start && utc < end => PACIFIC_DAYLIGHT,
        _ => PACIFIC_STANDARD,
    }
}

pub fn pacific_date(instant: OffsetDateTime) -> Date {
    instant.to_offset(pacific_offset(instant)).date()
}

pub fn today_pacific() -> Date {
    pacific_date(OffsetDateTime::now_utc())
}

pub fn parse_date(text: &str) -> Result<Date> {
    Date::parse(text.trim(), format_description!("[year]-[month]-[day]")).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid date `{text}`"))
            .with_hint("Use an ISO date like 2021-02-14.")
            .with_source(err)
    })
}

pub fn format_date(date: Date) -> Result<String> {
    date.format(format_description!("[year]-[month]-[day]"))
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to format date")
                .with_source(err)
        })
}

// Instant of the nth Sunday of `month` at `utc_hour`:00 UTC.
fn transition(year: i32, month: Month, nth: u8, utc_hour: u8) -> Option<OffsetDateTime> {
    let first = Date::from_calendar_date(year, month, 1).ok()?;
    let until_sunday = (7 - first.weekday().number_days_from_sunday()) % 7;
    let day = first.checked_add(Duration::days(i64::from(until_sunday + 7 * (nth - 1))))?;
    let time = Time::from_hms(utc_hour, 0, 0).ok()?;
    Some(PrimitiveDateTime::new(day, time).assume_utc())
}

#[cfg(test)]
mod tests {
    use super::{format_date, pacific_date, pacific_offset, parse_date};
    use crate::core::error::ErrorKind;
    use time::macros::{date, datetime, offset};

    #[test]
    fn evening_in_california_is_still_yesterday_in_utc_terms() {
        assert_eq!(pacific_date(datetime!(2021-02-15 02:53 UTC)), date!(2021-02-14));
        assert_eq!(pacific_date(datetime!(2021-02-15 08:00 UTC)), date!(2021-02-15));
    }

    #[test]
    fn daylight_time_starts_on_second_sunday_of_march() {
        assert_eq!(pacific_offset(datetime!(2021-03-14 09:59 UTC)), offset!(-8));
        assert_eq!(pacific_offset(datetime!(2021-03-14 10:00 UTC)), offset!(-7));
        assert_eq!(pacific_offset(datetime!(2024-03-10 10:00 UTC)), offset!(-7));
        assert_eq!(pacific_offset(datetime!(2024-03-03 12:00 UTC)), offset!(-8));
    }

    #[test]
    fn daylight_time_ends_on_first_sunday_of_november() {
        assert_eq!(pacific_offset(datetime!(2021-11-07 08:59 UTC)), offset!(-7));
        assert_eq!(pacific_offset(datetime!(2021-11-07 09:00 UTC)), offset!(-8));
    }

    #[test]
    fn summer_dates_use_daylight_offset() {
        assert_eq!(pacific_date(datetime!(2021-07-01 06:59 UTC)), date!(2021-06-30));
        assert_eq!(pacific_date(datetime!(2021-07-01 07:00 UTC)), date!(2021-07-01));
    }

    #[test]
    fn offset_input_is_normalized_first() {
        assert_eq!(pacific_date(datetime!(2021-02-15 03:53 +01:00)), date!(2021-02-14));
    }

    #[test]
    fn dates_parse_and_format_as_iso() {
        let date = parse_date("2021-02-14").expect("parse");
        assert_eq!(date, date!(2021-02-14));
        assert_eq!(format_date(date).expect("format"), "2021-02-14");
        let err = parse_date("02/14/2021").expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
