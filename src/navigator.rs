//! The day card controller.
//!
//! All card state lives in one [`Session`] behind an async mutex. Handlers,
//! the debounced save task and the auth listener each take the lock for short
//! synchronous steps. Loads and saves do their network round trips outside it.

use crate::calendar::{CalendarYear, to_iso_date};
use crate::gateway::{AuthEvent, SyncGateway};
use crate::models::{DayCard, EntryMap, Identity, Mood, SwipePoint, SyncResult};
use crate::store::{EntryStore, Fetched, LoadOutcome};
use crate::swipe::classify;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedIn(Identity),
}

impl AuthState {
    pub fn apply(&self, event: &AuthEvent) -> AuthState {
        match event {
            AuthEvent::SignedIn(identity) => AuthState::SignedIn(identity.clone()),
            AuthEvent::SignedOut => AuthState::SignedOut,
        }
    }
}

/// The one debounced save that may be waiting to fire.
///
/// Arming a new save aborts the previous one. A save that has fired settles
/// the slot first, so later arms never cancel it.
#[derive(Default)]
struct PendingSave {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl PendingSave {
    fn next(&mut self) -> u64 {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation += 1;
        self.generation
    }

    fn arm(&mut self, handle: JoinHandle<()>) {
        self.handle = Some(handle);
    }

    fn settle(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.handle = None;
        true
    }

    fn is_pending(&self) -> bool {
        self.handle.is_some()
    }
}

struct Session<G> {
    calendar: CalendarYear,
    selected: NaiveDate,
    store: EntryStore<G>,
    auth: AuthState,
    pending: PendingSave,
    last_sync: Option<SyncResult>,
    revision: u64,
    loads_issued: u64,
    loads_applied: u64,
}

impl<G: SyncGateway> Session<G> {
    fn issue_load(&mut self) -> u64 {
        self.loads_issued += 1;
        self.loads_issued
    }

    /// Installs a fetched snapshot unless a later-issued load already landed.
    fn finish_load(&mut self, ticket: u64, fetched: Fetched) -> LoadOutcome {
        if ticket < self.loads_applied {
            debug!(ticket, applied = self.loads_applied, "dropping stale load");
            return LoadOutcome::Superseded;
        }
        self.loads_applied = ticket;
        let outcome = self.store.apply(fetched);
        self.revision += 1;
        outcome
    }

    fn selected_iso(&self) -> String {
        to_iso_date(self.selected)
    }

    fn card(&self) -> DayCard {
        let iso = self.selected_iso();
        let record = self.store.get(&iso);
        DayCard {
            label: self.selected.format("%A, %B %-d, %Y").to_string(),
            date: iso,
            mood: record.mood,
            reflection: record.reflection,
            has_previous: self.selected > self.calendar.start(),
            has_next: self.selected < self.calendar.end(),
            status: self.last_sync.as_ref().map(|result| result.message.clone()),
        }
    }

    fn finish_save(&mut self, day: &str, result: SyncResult) {
        if result.ok {
            debug!(day, "save settled");
        } else {
            warn!(day, message = %result.message, "save did not complete");
        }
        self.last_sync = Some(result);
        self.revision += 1;
    }
}

/// Read-only snapshot used to draw the mood overlay.
#[derive(Debug, Clone)]
pub struct OverlaySnapshot {
    pub entries: EntryMap,
    pub revision: u64,
}

pub struct DayNavigator<G> {
    inner: Arc<Mutex<Session<G>>>,
    debounce: Duration,
}

impl<G> Clone for DayNavigator<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            debounce: self.debounce,
        }
    }
}

impl<G: SyncGateway> DayNavigator<G> {
    /// Starts on `today`, pinned into the store's year.
    pub fn new(
        calendar: CalendarYear,
        store: EntryStore<G>,
        today: NaiveDate,
        debounce: Duration,
    ) -> Self {
        let session = Session {
            calendar,
            selected: calendar.clamp(today),
            store,
            auth: AuthState::SignedOut,
            pending: PendingSave::default(),
            last_sync: None,
            revision: 0,
            loads_issued: 0,
            loads_applied: 0,
        };
        Self {
            inner: Arc::new(Mutex::new(session)),
            debounce,
        }
    }

    pub async fn card(&self) -> DayCard {
        self.inner.lock().await.card()
    }

    pub async fn selected(&self) -> NaiveDate {
        self.inner.lock().await.selected
    }

    pub async fn auth_state(&self) -> AuthState {
        self.inner.lock().await.auth.clone()
    }

    pub async fn has_pending_save(&self) -> bool {
        self.inner.lock().await.pending.is_pending()
    }

    pub async fn shift(&self, delta: i64) -> DayCard {
        let mut session = self.inner.lock().await;
        session.selected = session.calendar.offset(session.selected, delta);
        session.card()
    }

    pub async fn select(&self, date: NaiveDate) -> DayCard {
        let mut session = self.inner.lock().await;
        session.selected = session.calendar.clamp(date);
        session.card()
    }

    /// Applies a finished touch gesture. Returns `None` when it was not a swipe.
    pub async fn swipe(&self, points: &[SwipePoint]) -> Option<DayCard> {
        let direction = classify(points)?;
        Some(self.shift(direction.delta()).await)
    }

    pub async fn set_mood(&self, mood: Mood) -> DayCard {
        let mut session = self.inner.lock().await;
        let iso = session.selected_iso();
        session.store.ensure(&iso).mood = mood;
        self.schedule_save(&mut session);
        session.card()
    }

    pub async fn set_reflection(&self, reflection: impl Into<String>) -> DayCard {
        let mut session = self.inner.lock().await;
        let iso = session.selected_iso();
        session.store.ensure(&iso).reflection = reflection.into();
        self.schedule_save(&mut session);
        session.card()
    }

    /// Refetches every entry from the backend and replaces the local map.
    pub async fn reload(&self) -> LoadOutcome {
        let (ticket, job) = {
            let mut session = self.inner.lock().await;
            (session.issue_load(), session.store.load_job())
        };
        let fetched = job.run().await;
        self.inner.lock().await.finish_load(ticket, fetched)
    }

    /// Moves the auth state machine and reloads the snapshot for the new state.
    pub async fn apply_auth(&self, event: &AuthEvent) -> LoadOutcome {
        let (ticket, job) = {
            let mut session = self.inner.lock().await;
            let next = session.auth.apply(event);
            if next != session.auth {
                info!(from = ?session.auth, to = ?next, "auth state changed");
            }
            session.auth = next;
            (session.issue_load(), session.store.load_job())
        };
        let fetched = job.run().await;
        self.inner.lock().await.finish_load(ticket, fetched)
    }

    pub async fn overlay(&self) -> OverlaySnapshot {
        let session = self.inner.lock().await;
        OverlaySnapshot {
            entries: session.store.entries().clone(),
            revision: session.revision,
        }
    }

    fn schedule_save(&self, session: &mut Session<G>) {
        let generation = session.pending.next();
        let inner = Arc::clone(&self.inner);
        let delay = self.debounce;

        let handle = tokio::spawn(async move {
            sleep(delay).await;
            let job = {
                let mut session = inner.lock().await;
                if !session.pending.settle(generation) {
                    return;
                }
                let iso = session.selected_iso();
                let Some(record) = session.store.entries().get(&iso).cloned() else {
                    debug!(day = %iso, "selected day has no entry, nothing to save");
                    return;
                };
                session.store.save_job(iso, record)
            };
            let day = job.day().to_string();
            let result = job.run().await;
            inner.lock().await.finish_save(&day, result);
        });
        session.pending.arm(handle);
    }
}

/// Applies every auth notification from the gateway until the channel closes.
pub fn spawn_auth_listener<G: SyncGateway>(
    navigator: DayNavigator<G>,
    mut events: broadcast::Receiver<AuthEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let outcome = navigator.apply_auth(&event).await;
                    debug!(?outcome, "reloaded after auth change");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "missed auth events, reloading");
                    navigator.reload().await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
