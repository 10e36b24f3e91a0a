//! The two 1-second refresh loops.
//!
//! Each loop recomputes its view from the wall clock and publishes it on a
//! `watch` channel. They share nothing but the clock, so running them in any
//! order is fine.

use crate::calendar::CalendarYear;
use crate::clock::{
    Clock, DayProgress, YearProgress, day_progress, format_days_left, format_header,
    year_progress,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

pub const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderView {
    pub title: String,
    pub subtitle: String,
    pub year: YearProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayView {
    pub percent: f64,
    pub countdown: String,
    pub progress: DayProgress,
}

pub fn header_view(calendar: &CalendarYear, clock: &dyn Clock) -> HeaderView {
    let now = clock.now();
    let year = year_progress(calendar, now);
    HeaderView {
        title: format_header(now),
        subtitle: format_days_left(calendar, &year),
        year,
    }
}

pub fn day_view(clock: &dyn Clock) -> DayView {
    let progress = day_progress(clock.now());
    DayView {
        percent: progress.percent(),
        countdown: progress.remaining.to_string(),
        progress,
    }
}

/// Receivers for the latest header and day views.
#[derive(Clone)]
pub struct ClockFeeds {
    pub header: watch::Receiver<HeaderView>,
    pub day: watch::Receiver<DayView>,
}

pub struct Tickers {
    pub feeds: ClockFeeds,
    pub handles: [JoinHandle<()>; 2],
}

pub fn spawn_tickers(calendar: CalendarYear, clock: Arc<dyn Clock>) -> Tickers {
    let (header_tx, header_rx) = watch::channel(header_view(&calendar, clock.as_ref()));
    let (day_tx, day_rx) = watch::channel(day_view(clock.as_ref()));

    let header_clock = Arc::clone(&clock);
    let header = tokio::spawn(async move {
        let mut ticks = interval(TICK);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticks.tick().await;
            if header_tx
                .send(header_view(&calendar, header_clock.as_ref()))
                .is_err()
            {
                debug!("header feed closed");
                break;
            }
        }
    });

    let day = tokio::spawn(async move {
        let mut ticks = interval(TICK);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticks.tick().await;
            if day_tx.send(day_view(clock.as_ref())).is_err() {
                debug!("day feed closed");
                break;
            }
        }
    });

    Tickers {
        feeds: ClockFeeds {
            header: header_rx,
            day: day_rx,
        },
        handles: [header, day],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;

    #[tokio::test(start_paused = true)]
    async fn tickers_publish_views_from_the_clock() {
        let now = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        let calendar = CalendarYear::new(2026).unwrap();
        let tickers = spawn_tickers(calendar, Arc::new(FixedClock(now)));
        let mut header = tickers.feeds.header.clone();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        header.changed().await.ok();

        let view = tickers.feeds.header.borrow().clone();
        assert_eq!(view.year.filled_dots, 61);
        assert_eq!(view.subtitle, "304 days left in 2026");

        let day = tickers.feeds.day.borrow().clone();
        assert_eq!(day.countdown, "06:00:00");
        assert!((day.percent - 75.0).abs() < 1e-9);

        for handle in tickers.handles {
            handle.abort();
        }
    }
}
