//! Local copy of the signed-in user's entries for the target year.
//!
//! Network failures stop here: loads report a [`LoadOutcome`] and saves a
//! [`SyncResult`], both after logging.

use crate::calendar::{CalendarYear, parse_iso_date};
use crate::gateway::SyncGateway;
use crate::models::{DayRecord, EntryMap, RemoteRecord, SyncResult};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    SignedOut,
    Failed(String),
    /// A newer load finished first; this one was dropped.
    Superseded,
}

pub struct EntryStore<G> {
    gateway: G,
    calendar: CalendarYear,
    entries: EntryMap,
}

impl<G: SyncGateway> EntryStore<G> {
    pub fn new(gateway: G, calendar: CalendarYear) -> Self {
        Self {
            gateway,
            calendar,
            entries: EntryMap::new(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn entries(&self) -> &EntryMap {
        &self.entries
    }

    /// Replaces the map with the backend's view of the year.
    ///
    /// Signed out clears the map. A failed read keeps whatever was there.
    pub async fn load_all(&mut self) -> LoadOutcome {
        let fetched = self.load_job().run().await;
        self.apply(fetched)
    }

    /// A load that owns its inputs, so the fetch can run without borrowing
    /// the store. Hand the result back through [`EntryStore::apply`].
    pub fn load_job(&self) -> LoadJob<G> {
        LoadJob {
            gateway: self.gateway.clone(),
            calendar: self.calendar,
        }
    }

    pub fn apply(&mut self, fetched: Fetched) -> LoadOutcome {
        match fetched {
            Fetched::Entries(entries) => {
                let count = entries.len();
                self.entries = entries;
                LoadOutcome::Loaded(count)
            }
            Fetched::SignedOut => {
                self.entries.clear();
                LoadOutcome::SignedOut
            }
            Fetched::Failed(message) => LoadOutcome::Failed(message),
        }
    }

    pub fn get(&self, iso: &str) -> DayRecord {
        self.entries.get(iso).cloned().unwrap_or_default()
    }

    pub fn ensure(&mut self, iso: &str) -> &mut DayRecord {
        self.entries.entry(iso.to_string()).or_default()
    }

    /// A save that owns its inputs, so it can run without borrowing the store.
    pub fn save_job(&self, iso: impl Into<String>, record: DayRecord) -> SaveJob<G> {
        SaveJob {
            gateway: self.gateway.clone(),
            day: iso.into(),
            record,
        }
    }

    pub async fn save(&self, iso: &str, record: &DayRecord) -> SyncResult {
        self.save_job(iso, record.clone()).run().await
    }
}

/// What a [`LoadJob`] brought back from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Entries(EntryMap),
    SignedOut,
    Failed(String),
}

pub struct LoadJob<G> {
    gateway: G,
    calendar: CalendarYear,
}

impl<G: SyncGateway> LoadJob<G> {
    pub async fn run(self) -> Fetched {
        let identity = match self.gateway.current_user().await {
            Ok(Some(identity)) => identity,
            Ok(None) => return Fetched::SignedOut,
            Err(err) => {
                error!("failed to resolve current user: {err}");
                return Fetched::Failed(err.to_string());
            }
        };

        let rows = match self
            .gateway
            .load_range(&identity, self.calendar.start(), self.calendar.end())
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                error!(user = %identity.id, "failed to load entries: {err}");
                return Fetched::Failed(err.to_string());
            }
        };

        let mut entries = EntryMap::new();
        for row in rows {
            match parse_iso_date(&row.day) {
                Some(date) if self.calendar.contains(date) => {
                    entries.insert(
                        row.day,
                        DayRecord {
                            mood: row.mood,
                            reflection: row.reflection,
                        },
                    );
                }
                _ => warn!(day = %row.day, "skipping entry outside the target year"),
            }
        }

        info!(user = %identity.id, entries = entries.len(), "loaded entries");
        Fetched::Entries(entries)
    }
}

pub struct SaveJob<G> {
    gateway: G,
    day: String,
    record: DayRecord,
}

impl<G: SyncGateway> SaveJob<G> {
    pub fn day(&self) -> &str {
        &self.day
    }

    pub async fn run(self) -> SyncResult {
        let identity = match self.gateway.current_user().await {
            Ok(Some(identity)) => identity,
            Ok(None) => return SyncResult::not_signed_in(),
            Err(err) => {
                error!(day = %self.day, "failed to resolve current user: {err}");
                return SyncResult::failed();
            }
        };

        let row = RemoteRecord {
            day: self.day,
            mood: self.record.mood,
            reflection: self.record.reflection,
        };
        let day = row.day.clone();
        match self.gateway.upsert(&identity, row).await {
            Ok(()) => {
                info!(user = %identity.id, day = %day, "saved entry");
                SyncResult::saved()
            }
            Err(err) => {
                error!(user = %identity.id, day = %day, "failed to save entry: {err}");
                SyncResult::failed()
            }
        }
    }
}
