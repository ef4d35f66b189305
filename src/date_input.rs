//! Parsing for the day-first textual date formats used by submission forms.
//!
//! Entry dates arrive as `dd/mm/yyyy` and month buckets (balance months,
//! recurrence end months) as `mm/yyyy`. Both orders are day-first; month-first
//! inputs such as `01/31/2026` are rejected by range checks rather than
//! silently reinterpreted.

use time::{Date, Month};

use crate::Error;

/// Parse a `dd/mm/yyyy` string into a [Date].
///
/// Single-digit days and months are accepted (`5/1/2026`).
///
/// # Errors
/// Returns [Error::InvalidDateInput] if the string does not have three
/// `/`-separated numeric parts, or if the parts do not form a real calendar
/// date.
pub fn parse_day_month_year(input: &str) -> Result<Date, Error> {
    let parts: Vec<&str> = input.trim().split('/').collect();

    let [day, month, year] = parts.as_slice() else {
        return Err(invalid(input, "expected day/month/year"));
    };

    let day: u8 = day
        .parse()
        .map_err(|_| invalid(input, "day is not a number"))?;
    let month = parse_month(month, input)?;
    let year: i32 = year
        .parse()
        .map_err(|_| invalid(input, "year is not a number"))?;

    Date::from_calendar_date(year, month, day).map_err(|error| invalid(input, &error.to_string()))
}

/// Parse a `mm/yyyy` string into the first day of that month.
///
/// # Errors
/// Returns [Error::InvalidDateInput] if the string does not have two
/// `/`-separated numeric parts or the month is out of range.
pub fn parse_month_year(input: &str) -> Result<Date, Error> {
    let parts: Vec<&str> = input.trim().split('/').collect();

    let [month, year] = parts.as_slice() else {
        return Err(invalid(input, "expected month/year"));
    };

    let month = parse_month(month, input)?;
    let year: i32 = year
        .parse()
        .map_err(|_| invalid(input, "year is not a number"))?;

    Date::from_calendar_date(year, month, 1).map_err(|error| invalid(input, &error.to_string()))
}

/// Format a [Date] as a zero-padded `dd/mm/yyyy` string.
pub fn format_day_month_year(date: Date) -> String {
    format!(
        "{:02}/{:02}/{:04}",
        date.day(),
        u8::from(date.month()),
        date.year()
    )
}

/// The first day of `year`, for inclusive year-range queries.
pub fn year_start(year: i32) -> Date {
    Date::from_calendar_date(year, Month::January, 1).unwrap()
}

/// The last day of `year`, for inclusive year-range queries.
pub fn year_end(year: i32) -> Date {
    Date::from_calendar_date(year, Month::December, 31).unwrap()
}

fn parse_month(part: &str, input: &str) -> Result<Month, Error> {
    let month: u8 = part
        .parse()
        .map_err(|_| invalid(input, "month is not a number"))?;

    Month::try_from(month).map_err(|error| invalid(input, &error.to_string()))
}

fn invalid(input: &str, reason: &str) -> Error {
    Error::InvalidDateInput(reason.to_string(), input.to_string())
}
