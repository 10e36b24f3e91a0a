use super::{AuthEvent, SyncGateway, auth_channel};
use crate::errors::GatewayError;
use crate::models::{Identity, RemoteRecord};
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;

#[derive(Default)]
struct Inner {
    identity: Option<Identity>,
    rows: Vec<(Identity, RemoteRecord)>,
    upserts: Vec<(Identity, RemoteRecord)>,
    loads: usize,
    fail_reads: bool,
    fail_writes: bool,
    read_delay: Duration,
    write_delay: Duration,
}

/// In-memory gateway that records every call.
#[derive(Clone)]
pub(crate) struct RecordingGateway {
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<AuthEvent>,
}

impl RecordingGateway {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            events: auth_channel(),
        }
    }

    pub(crate) fn signed_in(id: &str) -> Self {
        let gateway = Self::new();
        gateway.inner.lock().unwrap().identity = Some(Identity::new(id));
        gateway
    }

    pub(crate) fn seed(&self, id: &str, record: RemoteRecord) {
        self.inner
            .lock()
            .unwrap()
            .rows
            .push((Identity::new(id), record));
    }

    pub(crate) fn upserts(&self) -> Vec<(Identity, RemoteRecord)> {
        self.inner.lock().unwrap().upserts.clone()
    }

    pub(crate) fn loads(&self) -> usize {
        self.inner.lock().unwrap().loads
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.inner.lock().unwrap().fail_reads = fail;
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_writes = fail;
    }

    /// Makes every `load_range` take `delay` before answering.
    pub(crate) fn slow_reads(&self, delay: Duration) {
        self.inner.lock().unwrap().read_delay = delay;
    }

    /// Makes every `upsert` take `delay` before it is recorded.
    pub(crate) fn slow_writes(&self, delay: Duration) {
        self.inner.lock().unwrap().write_delay = delay;
    }

    fn unavailable() -> GatewayError {
        GatewayError::Status {
            status: 503,
            body: "unavailable".to_string(),
        }
    }
}

impl SyncGateway for RecordingGateway {
    async fn current_user(&self) -> Result<Option<Identity>, GatewayError> {
        Ok(self.inner.lock().unwrap().identity.clone())
    }

    async fn has_session(&self) -> bool {
        self.inner.lock().unwrap().identity.is_some()
    }

    async fn load_range(
        &self,
        identity: &Identity,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RemoteRecord>, GatewayError> {
        let delay = self.inner.lock().unwrap().read_delay;
        if !delay.is_zero() {
            sleep(delay).await;
        }
        let mut inner = self.inner.lock().unwrap();
        inner.loads += 1;
        if inner.fail_reads {
            return Err(Self::unavailable());
        }
        let from = from.to_string();
        let to = to.to_string();
        Ok(inner
            .rows
            .iter()
            .filter(|(owner, row)| owner == identity && row.day >= from && row.day <= to)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn upsert(&self, identity: &Identity, record: RemoteRecord) -> Result<(), GatewayError> {
        let delay = self.inner.lock().unwrap().write_delay;
        if !delay.is_zero() {
            sleep(delay).await;
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(Self::unavailable());
        }
        inner.upserts.push((identity.clone(), record.clone()));
        inner
            .rows
            .retain(|(owner, row)| !(owner == identity && row.day == record.day));
        inner.rows.push((identity.clone(), record));
        Ok(())
    }

    async fn sign_in(&self, token: &str) -> Result<Identity, GatewayError> {
        let identity = Identity::new(token);
        self.inner.lock().unwrap().identity = Some(identity.clone());
        let _ = self.events.send(AuthEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) {
        self.inner.lock().unwrap().identity = None;
        let _ = self.events.send(AuthEvent::SignedOut);
    }

    fn authorize_url(&self, _redirect_to: &str) -> Option<String> {
        None
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
