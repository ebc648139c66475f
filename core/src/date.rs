//! Campaign date arithmetic.
//!
//! A campaign date is a `(day, second)` pair counted from the campaign
//! epoch. The calendar is a fixed 365-day year with the month table below;
//! leap years do not exist in the campaign calendar.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const SECONDS_PER_MINUTE: u32 = 60;
pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const SECONDS_PER_DAY: u32 = 86_400;
pub const DAYS_PER_YEAR: u32 = 365;
pub const MONTHS_PER_YEAR: usize = 12;

const MONTH_LENGTH: [u32; MONTHS_PER_YEAR] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

const MONTH_NAMES: [&str; MONTHS_PER_YEAR] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A point in campaign time.
///
/// Invariant after normalization: `0 <= sec < SECONDS_PER_DAY`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimDate {
    pub day: u32,
    pub sec: f64,
}

/// Human calendar view of a [`SimDate`]. Month and day are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDate {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl SimDate {
    /// Build a normalized date. Out-of-range seconds roll over into days.
    pub fn new(day: u32, sec: f64) -> Self {
        Self { day, sec: 0.0 }.add_seconds(sec)
    }

    /// Day number of `year`/`month`/`day` (month and day 1-based).
    pub fn from_calendar(year: u32, month: u32, day: u32) -> Self {
        debug_assert!((1..=12).contains(&month), "month out of range: {month}");
        let month = month.clamp(1, MONTHS_PER_YEAR as u32) as usize;
        let days_before_month: u32 = MONTH_LENGTH[..month - 1].iter().sum();
        let day_in_month = day.clamp(1, MONTH_LENGTH[month - 1]);
        Self {
            day: year * DAYS_PER_YEAR + days_before_month + day_in_month - 1,
            sec: 0.0,
        }
    }

    /// Add `delta` seconds and normalize.
    ///
    /// Deltas spanning several days are folded in one step; negative or
    /// non-finite deltas are rejected in debug builds and ignored otherwise.
    pub fn add_seconds(self, delta: f64) -> Self {
        debug_assert!(delta.is_finite() && delta >= 0.0, "invalid date delta: {delta}");
        let delta = if delta.is_finite() && delta > 0.0 { delta } else { 0.0 };

        let mut day = self.day;
        let mut sec = if self.sec.is_finite() { self.sec.max(0.0) } else { 0.0 } + delta;

        let per_day = f64::from(SECONDS_PER_DAY);
        let whole_days = (sec / per_day).floor();
        if whole_days >= 1.0 {
            day = day.saturating_add(whole_days as u32);
            sec -= whole_days * per_day;
        }
        // Float residue from the division above.
        if sec >= per_day {
            sec -= per_day;
            day = day.saturating_add(1);
        }
        // Deltas too large for f64 to resolve seconds leave garbage here.
        if !(0.0..per_day).contains(&sec) {
            sec = 0.0;
        }
        Self { day, sec }
    }

    /// Strictly later than `other`, comparing `(day, sec)` lexicographically.
    pub fn later_than(&self, other: &SimDate) -> bool {
        if self.day != other.day {
            return self.day > other.day;
        }
        self.sec > other.sec
    }

    /// Whole seconds into the current day.
    pub fn whole_seconds(&self) -> u64 {
        self.sec.max(0.0).floor() as u64
    }

    /// Minutes elapsed since the epoch.
    pub fn total_minutes(&self) -> u64 {
        u64::from(self.day) * u64::from(SECONDS_PER_DAY / SECONDS_PER_MINUTE)
            + self.whole_seconds() / u64::from(SECONDS_PER_MINUTE)
    }

    /// Hours elapsed since the epoch.
    pub fn total_hours(&self) -> u64 {
        u64::from(self.day) * u64::from(SECONDS_PER_DAY / SECONDS_PER_HOUR)
            + self.whole_seconds() / u64::from(SECONDS_PER_HOUR)
    }

    pub fn to_calendar(&self) -> CalendarDate {
        let year = self.day / DAYS_PER_YEAR;
        let mut d = self.day % DAYS_PER_YEAR;
        let mut month = 0;
        while month < MONTHS_PER_YEAR - 1 && d >= MONTH_LENGTH[month] {
            d -= MONTH_LENGTH[month];
            month += 1;
        }

        let secs = self.whole_seconds() as u32;
        CalendarDate {
            year,
            month: month as u32 + 1,
            day: d + 1,
            hour: secs / SECONDS_PER_HOUR,
            minute: (secs % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            second: secs % SECONDS_PER_MINUTE,
        }
    }
}

impl CalendarDate {
    pub fn month_name(&self) -> &'static str {
        let idx = (self.month.clamp(1, MONTHS_PER_YEAR as u32) - 1) as usize;
        MONTH_NAMES[idx]
    }
}

/// True when `new` lies in a later calendar month than `old`.
pub fn is_budget_due(old: &CalendarDate, new: &CalendarDate) -> bool {
    if old.year < new.year {
        return true;
    }
    old.year == new.year && old.month < new.month
}

impl fmt::Display for SimDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.to_calendar();
        write!(
            f,
            "{:04} {} {:02} {:02}:{:02}",
            c.year,
            c.month_name(),
            c.day,
            c.hour,
            c.minute
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_roundtrip_of_month_starts() {
        for month in 1..=12 {
            let date = SimDate::from_calendar(2084, month, 1);
            let cal = date.to_calendar();
            assert_eq!(cal.year, 2084);
            assert_eq!(cal.month, month);
            assert_eq!(cal.day, 1);
        }
    }

    #[test]
    fn last_day_of_year_stays_in_december() {
        let cal = SimDate::new(364, 0.0).to_calendar();
        assert_eq!(cal.month, 12);
        assert_eq!(cal.day, 31);
        assert_eq!(SimDate::new(365, 0.0).to_calendar().year, 1);
    }

    #[test]
    fn display_is_readable() {
        let date = SimDate::from_calendar(2084, 3, 5).add_seconds(14.0 * 3600.0 + 30.0 * 60.0);
        assert_eq!(date.to_string(), "2084 Mar 05 14:30");
    }
}
