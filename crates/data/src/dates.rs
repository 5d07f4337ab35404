//! Shared date math for birthday pipelines.

use chrono::{Datelike, NaiveDate};

/// Backend date format for birth dates (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a backend date string.
pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
}

/// Age in whole years on `today`.
///
/// Year difference, decremented by one when `(today.month, today.day)`
/// precedes `(birth.month, birth.day)` lexicographically. The comparison
/// is strict: on the birthday itself the new age already applies.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Sort key for chronological-within-the-year ordering.
pub fn month_day(date: NaiveDate) -> (u32, u32) {
    (date.month(), date.day())
}
