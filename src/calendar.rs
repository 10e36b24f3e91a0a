//! Day-of-year arithmetic for the target year.
//!
//! Everything here works on local calendar dates. There is no timezone
//! conversion: an instant is truncated to its local date and compared at
//! midnight boundaries.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

pub const TARGET_YEAR: i32 = 2026;

/// Bounds of one calendar year.
///
/// `start <= end < next_start` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarYear {
    year: i32,
    start: NaiveDate,
    end: NaiveDate,
    next_start: NaiveDate,
}

impl CalendarYear {
    pub fn new(year: i32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
        let next_start = NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?;
        Some(Self {
            year,
            start,
            end,
            next_start,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn year_start(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::default())
    }

    pub fn next_year_start(&self) -> NaiveDateTime {
        self.next_start.and_time(NaiveTime::default())
    }

    /// 365, or 366 in a leap year.
    pub fn total_days(&self) -> u32 {
        (self.next_start - self.start).num_days() as u32
    }

    /// Whole days from the first of January to `date`.
    ///
    /// Dates outside the year give a negative index or one `>= total_days`;
    /// callers bounds-check with [`CalendarYear::checked_index`].
    pub fn date_to_index(&self, date: NaiveDate) -> i64 {
        (date - self.start).num_days()
    }

    pub fn checked_index(&self, date: NaiveDate) -> Option<u32> {
        let index = self.date_to_index(date);
        (0..i64::from(self.total_days()))
            .contains(&index)
            .then_some(index as u32)
    }

    pub fn index_to_date(&self, index: u32) -> Option<NaiveDate> {
        if index >= self.total_days() {
            return None;
        }
        self.start.checked_add_signed(TimeDelta::days(i64::from(index)))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        if date < self.start {
            self.start
        } else if date > self.end {
            self.end
        } else {
            date
        }
    }

    /// `date` moved by `delta` days, clamped to the year.
    pub fn offset(&self, date: NaiveDate, delta: i64) -> NaiveDate {
        let moved = TimeDelta::try_days(delta).and_then(|step| date.checked_add_signed(step));
        match moved {
            Some(moved) => self.clamp(moved),
            None if delta < 0 => self.start,
            None => self.end,
        }
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |date| *date <= self.end)
    }
}

pub fn start_of_day(instant: NaiveDateTime) -> NaiveDate {
    instant.date()
}

pub fn to_iso_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
