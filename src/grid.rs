use crate::calendar::{CalendarYear, to_iso_date};
use crate::clock::year_progress;
use crate::models::{Dot, EntryMap, GridResponse, Mood, MoodTally};
use crate::navigator::OverlaySnapshot;
use chrono::NaiveDateTime;

pub fn build_grid_at(
    calendar: &CalendarYear,
    now: NaiveDateTime,
    overlay: &OverlaySnapshot,
) -> GridResponse {
    let progress = year_progress(calendar, now);

    let dots = calendar
        .dates()
        .enumerate()
        .map(|(index, date)| {
            let iso = to_iso_date(date);
            let mood = overlay.entries.get(&iso).map(|record| record.mood);
            Dot {
                index: index as u32,
                past: (index as u32) < progress.filled_dots,
                date: iso,
                mood,
            }
        })
        .collect();

    GridResponse {
        year: calendar.year(),
        total_days: progress.total_days,
        filled_dots: progress.filled_dots,
        days_left: progress.days_left,
        revision: overlay.revision,
        dots,
        tallies: mood_tallies(&overlay.entries),
    }
}

pub fn mood_tallies(entries: &EntryMap) -> Vec<MoodTally> {
    Mood::ALL
        .iter()
        .map(|&mood| MoodTally {
            mood,
            days: entries.values().filter(|record| record.mood == mood).count(),
        })
        .collect()
}
