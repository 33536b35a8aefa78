//! Calendar date helpers for the `YYYY-MM-DD` strings stored in the
//! measurement table, and the one-year-back window start.

use time::{format_description::BorrowedFormatItem, macros::format_description, Date, Month};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("malformed date '{0}', expected YYYY-MM-DD")]
    Malformed(String),
    #[error("no valid date one year before {0}")]
    Invalid(String),
}

/// Parses exactly `YYYY-MM-DD`: no surrounding whitespace, no year sign.
pub fn parse_date(value: &str) -> Result<Date, DateError> {
    let malformed = || DateError::Malformed(value.to_owned());
    if value.len() != 10 || !value.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(malformed());
    }
    Date::parse(value, DATE_FORMAT).map_err(|_| malformed())
}

pub fn format_date(date: Date) -> String {
    // the format only contains numeric components, it cannot fail on a valid Date
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// Same month and day, one calendar year earlier.
///
/// February 29 rounds down to February 28 when the prior year is not a leap
/// year. Only a year outside the representable range is an error.
pub fn one_year_before(date: Date) -> Result<Date, DateError> {
    let invalid = || DateError::Invalid(format_date(date));
    let year = date.year().checked_sub(1).ok_or_else(invalid)?;

    match date.replace_year(year) {
        Ok(shifted) => Ok(shifted),
        Err(_) if date.month() == Month::February && date.day() == 29 => {
            Date::from_calendar_date(year, Month::February, 28).map_err(|_| invalid())
        }
        Err(_) => Err(invalid()),
    }
}
