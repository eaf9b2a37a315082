//! Time module for the simulation clock
//!
//! The resolver works on a single continuous time scalar: a Julian date in
//! days. Series evaluation uses Julian millennia from J2000 (`tau`), frame
//! models use Julian centuries. No distinction between TT, TDB and UTC is
//! made here; the scale is whatever the simulation clock supplies.

use crate::constants::{DAYS_PER_JULIAN_CENTURY, DAYS_PER_JULIAN_MILLENNIUM, DAY_S, J2000};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use thiserror::Error;

/// Julian date of the Unix epoch, 1970-01-01T00:00:00Z
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Error type for time operations
#[derive(Debug, Error, PartialEq)]
pub enum TimeError {
    #[error("Invalid calendar date: {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("Invalid time of day: {hour:02}:{minute:02}:{second}")]
    InvalidTimeOfDay { hour: u32, minute: u32, second: f64 },

    #[error("Julian date {0} is not finite")]
    NonFinite(f64),
}

/// Result type for time operations
pub type Result<T> = std::result::Result<T, TimeError>;

/// An instant on the continuous simulation timeline, as a Julian date
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JulianDate(f64);

impl JulianDate {
    /// The J2000.0 epoch (2000-01-01T12:00:00)
    pub const J2000: JulianDate = JulianDate(J2000);

    /// Wrap a raw Julian date
    pub const fn new(jd: f64) -> Self {
        JulianDate(jd)
    }

    /// Wrap a raw Julian date, rejecting NaN and infinities
    pub fn try_new(jd: f64) -> Result<Self> {
        if jd.is_finite() {
            Ok(JulianDate(jd))
        } else {
            Err(TimeError::NonFinite(jd))
        }
    }

    /// Build a Julian date from a proleptic Gregorian calendar date and time of day
    pub fn from_calendar(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
    ) -> Result<Self> {
        if NaiveDate::from_ymd_opt(year, month, day).is_none() {
            return Err(TimeError::InvalidDate { year, month, day });
        }
        // 60.x is allowed so that leap-second labels survive the conversion
        if hour > 23 || minute > 59 || !(0.0..61.0).contains(&second) {
            return Err(TimeError::InvalidTimeOfDay {
                hour,
                minute,
                second,
            });
        }

        let day_fraction = (hour as f64 + minute as f64 / 60.0 + second / 3600.0) / 24.0;
        let jd = compute_julian_day(year, month as i32, day as i32) as f64 - 0.5 + day_fraction;
        Ok(JulianDate(jd))
    }

    /// Build a Julian date from a UTC datetime
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let seconds = dt.timestamp() as f64 + dt.timestamp_subsec_nanos() as f64 * 1e-9;
        JulianDate(UNIX_EPOCH_JD + seconds / DAY_S)
    }

    /// Convert back to a UTC datetime, if representable
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let seconds = (self.0 - UNIX_EPOCH_JD) * DAY_S;
        if !seconds.is_finite() {
            return None;
        }
        let whole = seconds.floor();
        let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
        DateTime::from_timestamp(whole as i64, nanos)
    }

    /// Raw Julian date in days
    pub fn jd(&self) -> f64 {
        self.0
    }

    /// Days elapsed since J2000.0
    pub fn days_since_j2000(&self) -> f64 {
        self.0 - J2000
    }

    /// Julian centuries elapsed since J2000.0
    pub fn centuries(&self) -> f64 {
        (self.0 - J2000) / DAYS_PER_JULIAN_CENTURY
    }

    /// Julian millennia elapsed since J2000.0, the VSOP87 time argument
    pub fn tau(&self) -> f64 {
        (self.0 - J2000) / DAYS_PER_JULIAN_MILLENNIUM
    }

    /// Shift by a number of days
    pub fn add_days(&self, days: f64) -> Self {
        JulianDate(self.0 + days)
    }
}

impl Add<f64> for JulianDate {
    type Output = JulianDate;

    fn add(self, days: f64) -> JulianDate {
        self.add_days(days)
    }
}

impl Sub<f64> for JulianDate {
    type Output = JulianDate;

    fn sub(self, days: f64) -> JulianDate {
        self.add_days(-days)
    }
}

impl Sub for JulianDate {
    type Output = f64;

    /// Difference in days
    fn sub(self, other: JulianDate) -> f64 {
        self.0 - other.0
    }
}

impl From<DateTime<Utc>> for JulianDate {
    fn from(dt: DateTime<Utc>) -> Self {
        JulianDate::from_datetime(dt)
    }
}

impl fmt::Display for JulianDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "JD {:.6} ({})", self.0, dt.format("%Y-%m-%dT%H:%M:%SZ")),
            None => write!(f, "JD {:.6}", self.0),
        }
    }
}

/// Position of a date relative to a date-sorted sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bracket {
    /// Before the first entry
    Before,
    /// After the last entry
    After,
    /// Equal to the date of entry `i` (the last one, if several share it)
    Exact(usize),
    /// Strictly between entries `i` and `i + 1`
    Between(usize),
}

/// Locate `date` in a non-empty sequence sorted by `date_of`
pub(crate) fn bracket<T>(
    items: &[T],
    date: JulianDate,
    date_of: impl Fn(&T) -> JulianDate,
) -> Bracket {
    // First entry strictly after `date`
    let upper = items.partition_point(|item| date_of(item) <= date);
    if upper == 0 {
        return Bracket::Before;
    }
    let lower = upper - 1;
    if date_of(&items[lower]) == date {
        Bracket::Exact(lower)
    } else if upper == items.len() {
        Bracket::After
    } else {
        Bracket::Between(lower)
    }
}

/// Collapse runs of equal dates in a date-sorted sequence, keeping the last
/// entry of each run. Returns the number of entries removed.
pub(crate) fn keep_last_per_date<T>(
    items: &mut Vec<T>,
    date_of: impl Fn(&T) -> JulianDate,
) -> usize {
    let before = items.len();
    items.reverse();
    items.dedup_by(|later, earlier| date_of(later) == date_of(earlier));
    items.reverse();
    before - items.len()
}

/// Convert (year, month, day) to Julian day integer
///
/// Uses the proleptic Gregorian calendar.
pub fn compute_julian_day(year: i32, month: i32, day: i32) -> i32 {
    let janfeb = month < 3;

    1461 * (year + 4800 - if janfeb { 1 } else { 0 }) / 4
        + 367 * (month - 2 + if janfeb { 12 } else { 0 }) / 12
        - 3 * ((year + 4900 - if janfeb { 1 } else { 0 }) / 100) / 4
        - 32075
        + day
}
