//! Calendar date handling shared by both loaders.
//!
//! Two string renderings exist for every date:
//!
//! - the **lookup** format `m/d/yy` without zero padding (`3/5/20`), which is how the
//!   outcome and covid tables write their `date` column;
//! - the **actual** format `YYYY/MM/DD` (`2020/03/05`), whose lexicographic order is
//!   calendar order and which the flight table uses for its column headers.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// `strftime` pattern of the lookup format
pub const LOOKUP_FORMAT: &str = "%-m/%-d/%y";

/// `strftime` pattern of the chronological format
pub const ACTUAL_FORMAT: &str = "%Y/%m/%d";

/// Metadata entry `[year_suffix, month, day]`, e.g. `[20, 3, 5]` for 2020-03-05.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateTriple(pub i32, pub u32, pub u32);

impl DateTriple {
    /// Resolve the triple to a calendar date.
    pub fn to_date(self) -> Result<NaiveDate> {
        from_triple(self.0, self.1, self.2)
    }
}

/// Build a date from a two-digit year suffix, month and day.
pub fn from_triple(year_suffix: i32, month: u32, day: u32) -> Result<NaiveDate> {
    if !(0..100).contains(&year_suffix) {
        return Err(Error::InvalidDate(format!(
            "year suffix {} is not two digits ([{}, {}, {}])",
            year_suffix, year_suffix, month, day
        )));
    }

    NaiveDate::from_ymd_opt(2000 + year_suffix, month, day).ok_or_else(|| {
        Error::InvalidDate(format!(
            "[{}, {}, {}] is not a calendar date",
            year_suffix, month, day
        ))
    })
}

/// Parse a lookup-format string such as `3/5/20` or `03/05/20`.
pub fn parse_lookup(s: &str) -> Result<NaiveDate> {
    let invalid = || Error::InvalidDate(format!("'{}' is not a m/d/yy date", s));

    let parts: Vec<&str> = s.trim().split('/').collect();
    if parts.len() != 3 {
        return Err(invalid());
    }

    let month: u32 = parts[0].parse().map_err(|_| invalid())?;
    let day: u32 = parts[1].parse().map_err(|_| invalid())?;
    let year: i32 = parts[2].parse().map_err(|_| invalid())?;

    from_triple(year, month, day)
}

/// Parse a chronological-format string such as `2020/03/05`.
pub fn parse_actual(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), ACTUAL_FORMAT)
        .map_err(|e| Error::InvalidDate(format!("'{}' is not a YYYY/MM/DD date: {}", s, e)))
}

/// Render a date in the lookup format.
pub fn lookup_string(date: NaiveDate) -> String {
    date.format(LOOKUP_FORMAT).to_string()
}

/// Render a date in the chronological format.
pub fn actual_string(date: NaiveDate) -> String {
    date.format(ACTUAL_FORMAT).to_string()
}
