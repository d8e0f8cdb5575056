use super::filename::date_token;
use time::{format_description::FormatItem, macros::format_description, Date, Month};

const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Two-digit years below this are in the 2000s, the rest in the 1900s (POSIX `%y`).
const CENTURY_PIVOT: u8 = 69;

/// A `DD_MM_YY` token either read as a calendar date or kept as-is when it isn't one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedDate {
    Parsed(Date),
    Fallback(String),
}

impl NormalizedDate {
    pub fn normalize(token: &str) -> NormalizedDate {
        date_token(token)
            .and_then(|(day, month, year)| to_date(day, month, year))
            .map(NormalizedDate::Parsed)
            .unwrap_or_else(|| NormalizedDate::Fallback(token.to_owned()))
    }
}

fn to_date(day: u8, month: u8, two_digit_year: u8) -> Option<Date> {
    let year = if two_digit_year < CENTURY_PIVOT {
        2000 + i32::from(two_digit_year)
    } else {
        1900 + i32::from(two_digit_year)
    };
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

impl std::fmt::Display for NormalizedDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizedDate::Parsed(date) => {
                let formatted = date.format(ISO_DATE).map_err(|_| std::fmt::Error)?;
                f.write_str(&formatted)
            }
            NormalizedDate::Fallback(raw) => f.write_str(raw),
        }
    }
}
