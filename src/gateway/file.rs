use super::{AuthEvent, SyncGateway, auth_channel};
use crate::errors::GatewayError;
use crate::models::{DayRecord, Identity, RemoteRecord};
use crate::storage::{load_data, persist_data};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{debug, info};

/// On-disk layout: user id -> ISO day -> record.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendData {
    pub users: BTreeMap<String, BTreeMap<String, DayRecord>>,
}

/// A single-file backend. The signed-in user lives in memory only; a sign-in
/// token is taken verbatim as the user id.
#[derive(Clone)]
pub struct FileGateway {
    data_path: PathBuf,
    data: Arc<Mutex<BackendData>>,
    session: Arc<RwLock<Option<Identity>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl FileGateway {
    pub async fn open(data_path: PathBuf) -> Self {
        let data: BackendData = load_data(&data_path).await;
        info!(
            path = %data_path.display(),
            users = data.users.len(),
            "opened file backend"
        );
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            session: Arc::new(RwLock::new(None)),
            events: auth_channel(),
        }
    }
}

impl SyncGateway for FileGateway {
    async fn current_user(&self) -> Result<Option<Identity>, GatewayError> {
        Ok(self.session.read().await.clone())
    }

    async fn has_session(&self) -> bool {
        self.session.read().await.is_some()
    }

    async fn load_range(
        &self,
        identity: &Identity,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RemoteRecord>, GatewayError> {
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        let data = self.data.lock().await;
        let rows = data
            .users
            .get(&identity.id)
            .map(|days| {
                days.range(from..=to)
                    .map(|(day, record)| RemoteRecord {
                        day: day.clone(),
                        mood: record.mood,
                        reflection: record.reflection.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn upsert(&self, identity: &Identity, record: RemoteRecord) -> Result<(), GatewayError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        next.users.entry(identity.id.clone()).or_default().insert(
            record.day.clone(),
            DayRecord {
                mood: record.mood,
                reflection: record.reflection,
            },
        );
        // Memory only changes once the file has it.
        persist_data(&self.data_path, &next).await?;
        *data = next;
        debug!(user = %identity.id, day = %record.day, "stored entry");
        Ok(())
    }

    async fn sign_in(&self, token: &str) -> Result<Identity, GatewayError> {
        let id = token.trim();
        if id.is_empty() {
            return Err(GatewayError::InvalidToken);
        }
        let identity = Identity::new(id);
        *self.session.write().await = Some(identity.clone());
        let _ = self.events.send(AuthEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) {
        *self.session.write().await = None;
        let _ = self.events.send(AuthEvent::SignedOut);
    }

    fn authorize_url(&self, _redirect_to: &str) -> Option<String> {
        None
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
