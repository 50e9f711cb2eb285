//! Civil timestamps, UTC offsets and Julian dates.
//!
//! Dates are proleptic Gregorian. The Julian date of a timestamp is
//!   JD = 2400000.5 + MJD(date) + (3600·h + 60·m + s) / 86400
//! so 2000-01-01 12:00 UTC is JD 2451545.0.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{CoverError, Result};

/// Seconds in a day.
pub const DAY_SECONDS: f64 = 86_400.0;

/// Julian date of MJD 0 (1858-11-17 00:00).
const MJD_EPOCH: f64 = 2_400_000.5;

/// Offset from a modified Julian day number to the Julian day number of the same date.
const MJD_TO_JDN: i64 = 2_400_001;

/// Earliest year the day-count formula handles.
const MIN_YEAR: i32 = -4799;

/// Julian date range accepted by [`calendar_from_julian`].
const MIN_JD: f64 = -68_569.5;
const MAX_JD: f64 = 1e9;

const MONTH_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// UTC offsets in use worldwide, as written in site files.
pub const UTC_OFFSETS: [&str; 40] = [
    "UTC-12:00", "UTC-11:00", "UTC-10:00", "UTC-09:30", "UTC-09:00", "UTC-08:00",
    "UTC-07:00", "UTC-06:00", "UTC-05:00", "UTC-04:30", "UTC-04:00", "UTC-03:30",
    "UTC-03:00", "UTC-02:00", "UTC-01:00", "UTC+00:00", "UTC+01:00", "UTC+02:00",
    "UTC+03:00", "UTC+03:30", "UTC+04:00", "UTC+04:30", "UTC+05:00", "UTC+05:30",
    "UTC+05:45", "UTC+06:00", "UTC+06:30", "UTC+07:00", "UTC+08:00", "UTC+08:45",
    "UTC+09:00", "UTC+09:30", "UTC+10:00", "UTC+10:30", "UTC+11:00", "UTC+11:30",
    "UTC+12:00", "UTC+12:45", "UTC+13:00", "UTC+14:00",
];

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Length of `month` in `year`; 0 for a month outside 1-12.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        1..=12 => MONTH_DAYS[(month - 1) as usize],
        _ => 0,
    }
}

/// Fraction of the day elapsed at `hour:minute:sec`.
pub fn day_fraction(hour: u32, minute: u32, sec: f64) -> Result<f64> {
    check_time(hour, minute, sec)?;
    Ok((60.0 * (60.0 * hour as f64 + minute as f64) + sec) / DAY_SECONDS)
}

fn check_time(hour: u32, minute: u32, sec: f64) -> Result<()> {
    if hour > 23 {
        return Err(CoverError::Calendar(format!("hour {hour} outside 0-23")));
    }
    if minute > 59 {
        return Err(CoverError::Calendar(format!("minute {minute} outside 0-59")));
    }
    if !(0.0..60.0).contains(&sec) {
        return Err(CoverError::Calendar(format!("second {sec} outside [0, 60)")));
    }
    Ok(())
}

fn check_date(year: i32, month: u32, day: u32) -> Result<()> {
    if year < MIN_YEAR {
        return Err(CoverError::Calendar(format!("year {year} before {MIN_YEAR}")));
    }
    if !(1..=12).contains(&month) {
        return Err(CoverError::Calendar(format!("month {month} outside 1-12")));
    }
    let last = days_in_month(year, month);
    if day < 1 || day > last {
        return Err(CoverError::Calendar(format!("day {day} outside 1-{last} for {year}-{month:02}")));
    }
    Ok(())
}

/// Modified Julian day number of a Gregorian date. Integer divisions truncate.
fn mjd_of_date(year: i32, month: u32, day: u32) -> i64 {
    let month = month as i64;
    let my = (month - 14) / 12;
    let iypmy = year as i64 + my;
    (1461 * (iypmy + 4800)) / 4 + (367 * (month - 2 - 12 * my)) / 12
        - (3 * ((iypmy + 4900) / 100)) / 4
        + day as i64
        - 2_432_076
}

/// Gregorian date of a Julian day number (Fliegel & Van Flandern).
fn date_of_jdn(jdn: i64) -> (i32, u32, u32) {
    let mut l = jdn + 68_569;
    let n = (4 * l) / 146_097;
    l -= (146_097 * n + 3) / 4;
    let i = (4000 * (l + 1)) / 1_461_001;
    l -= (1461 * i) / 4 - 31;
    let k = (80 * l) / 2447;
    let day = l - (2447 * k) / 80;
    l = k / 11;
    let month = k + 2 - 12 * l;
    let year = 100 * (n - 49) + i + l;
    (year as i32, month as u32, day as u32)
}

/// Julian date of a Gregorian timestamp.
pub fn julian_date(year: i32, month: u32, day: u32, hour: u32, minute: u32, sec: f64) -> Result<f64> {
    check_date(year, month, day)?;
    let frac = day_fraction(hour, minute, sec)?;
    Ok(MJD_EPOCH + mjd_of_date(year, month, day) as f64 + frac)
}

/// Gregorian timestamp of a Julian date, rounded to the nearest second.
pub fn calendar_from_julian(jd: f64) -> Result<CivilTime> {
    if !(MIN_JD..=MAX_JD).contains(&jd) {
        return Err(CoverError::Calendar(format!("julian date {jd} outside [{MIN_JD}, {MAX_JD}]")));
    }
    let dj = jd - 0.5;
    let mut jdn = dj.floor() as i64 + 1;
    let mut secs = ((dj - dj.floor()) * DAY_SECONDS).round() as u32;
    if secs >= DAY_SECONDS as u32 {
        secs -= DAY_SECONDS as u32;
        jdn += 1;
    }
    let (year, month, day) = date_of_jdn(jdn);
    Ok(CivilTime { year, month, day, hour: secs / 3600, minute: secs / 60 % 60, second: secs % 60 })
}

/// A Gregorian date and time of day, whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct CivilTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl CivilTime {
    /// Build a validated timestamp.
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Result<Self> {
        check_date(year, month, day)?;
        check_time(hour, minute, second as f64)?;
        Ok(Self { year, month, day, hour, minute, second })
    }

    pub fn julian_date(&self) -> Result<f64> {
        julian_date(self.year, self.month, self.day, self.hour, self.minute, self.second as f64)
    }

    /// This timestamp moved by `minutes`, crossing day, month and year
    /// boundaries as needed.
    pub fn shifted_minutes(&self, minutes: i64) -> Self {
        let day_minutes = 24 * 60;
        let total = mjd_of_date(self.year, self.month, self.day) * day_minutes
            + (self.hour * 60 + self.minute) as i64
            + minutes;
        let mjd = total.div_euclid(day_minutes);
        let tod = total.rem_euclid(day_minutes) as u32;
        let (year, month, day) = date_of_jdn(mjd + MJD_TO_JDN);
        Self { year, month, day, hour: tod / 60, minute: tod % 60, second: self.second }
    }
}

impl fmt::Display for CivilTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Offset of a local time zone from UTC, in minutes (`UTC-06:00` → -360).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UtcOffset {
    minutes: i32,
}

impl UtcOffset {
    pub const UTC: UtcOffset = UtcOffset { minutes: 0 };

    /// Parse one of [`UTC_OFFSETS`], case-insensitively.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if !UTC_OFFSETS.iter().any(|o| o.eq_ignore_ascii_case(text)) {
            return Err(CoverError::Calendar(format!("unknown UTC offset '{text}'")));
        }
        // Listed offsets all have the shape UTC±HH:MM.
        let sign = if &text[3..4] == "-" { -1 } else { 1 };
        let hours: i32 = text[4..6].parse().map_err(|_| CoverError::Calendar(format!("bad hours in '{text}'")))?;
        let mins: i32 = text[7..9].parse().map_err(|_| CoverError::Calendar(format!("bad minutes in '{text}'")))?;
        Ok(Self { minutes: sign * (hours * 60 + mins) })
    }

    pub(crate) const fn from_minutes(minutes: i32) -> Self {
        Self { minutes }
    }

    pub fn minutes(&self) -> i32 {
        self.minutes
    }

    /// Convert a local timestamp in this zone to UTC.
    pub fn to_utc(&self, local: CivilTime) -> CivilTime {
        local.shifted_minutes(-(self.minutes as i64))
    }
}

/// Written as `UTC±HH:MM`, the form [`UtcOffset::parse`] reads.
impl Serialize for UtcOffset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minutes < 0 { '-' } else { '+' };
        let m = self.minutes.abs();
        write!(f, "UTC{sign}{:02}:{:02}", m / 60, m % 60)
    }
}
