use crate::calendar::{CalendarYear, start_of_day};
use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use serde::Serialize;
use std::fmt;

/// Source of "now" as a local wall-clock reading.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearProgress {
    pub filled_dots: u32,
    pub days_left: u32,
    pub total_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayProgress {
    pub elapsed_fraction: f64,
    pub remaining: Countdown,
}

impl DayProgress {
    pub fn percent(&self) -> f64 {
        self.elapsed_fraction * 100.0
    }
}

pub fn year_progress(calendar: &CalendarYear, now: NaiveDateTime) -> YearProgress {
    let total_days = calendar.total_days();
    let filled_dots = if now < calendar.year_start() {
        0
    } else if now >= calendar.next_year_start() {
        total_days
    } else {
        let index = calendar.date_to_index(start_of_day(now));
        (index + 1).clamp(0, i64::from(total_days)) as u32
    };

    YearProgress {
        filled_dots,
        days_left: total_days - filled_dots,
        total_days,
    }
}

pub fn day_progress(now: NaiveDateTime) -> DayProgress {
    let day_start = start_of_day(now).and_time(NaiveTime::default());
    let day_end = day_start + TimeDelta::days(1);

    let span = (day_end - day_start).num_milliseconds() as f64;
    let elapsed = (now - day_start).num_milliseconds() as f64;
    let elapsed_fraction = (elapsed / span).clamp(0.0, 1.0);

    let remaining_secs = (day_end - now).num_seconds().max(0);
    DayProgress {
        elapsed_fraction,
        remaining: Countdown {
            hours: remaining_secs / 3600,
            minutes: (remaining_secs % 3600) / 60,
            seconds: remaining_secs % 60,
        },
    }
}

pub fn format_header(now: NaiveDateTime) -> String {
    format!("Today: {}", now.format("%a, %b %d, %Y, %H:%M:%S"))
}

pub fn format_days_left(calendar: &CalendarYear, progress: &YearProgress) -> String {
    format!("{} days left in {}", progress.days_left, calendar.year())
}
