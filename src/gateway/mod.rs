//! Authentication and remote persistence of day records.

mod file;
mod rest;
#[cfg(test)]
pub(crate) mod testing;

pub use file::FileGateway;
pub use rest::RestGateway;

use crate::config::BackendConfig;
use crate::errors::GatewayError;
use crate::models::{Identity, RemoteRecord};
use chrono::NaiveDate;
use std::future::Future;
use tokio::sync::broadcast;

/// Auth notifications delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
}

const AUTH_EVENT_CAPACITY: usize = 16;

pub(crate) fn auth_channel() -> broadcast::Sender<AuthEvent> {
    broadcast::channel(AUTH_EVENT_CAPACITY).0
}

/// The backend collaborator.
///
/// Records are keyed by `(identity, day)`; `upsert` overwrites an existing
/// row for the same key, so repeating it is harmless.
pub trait SyncGateway: Clone + Send + Sync + 'static {
    fn current_user(&self) -> impl Future<Output = Result<Option<Identity>, GatewayError>> + Send;

    fn has_session(&self) -> impl Future<Output = bool> + Send;

    fn load_range(
        &self,
        identity: &Identity,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = Result<Vec<RemoteRecord>, GatewayError>> + Send;

    fn upsert(
        &self,
        identity: &Identity,
        record: RemoteRecord,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn sign_in(&self, token: &str) -> impl Future<Output = Result<Identity, GatewayError>> + Send;

    fn sign_out(&self) -> impl Future<Output = ()> + Send;

    /// Where to send the browser for a provider sign-in, if the backend has one.
    fn authorize_url(&self, redirect_to: &str) -> Option<String>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// The gateway picked at startup.
#[derive(Clone)]
pub enum Backend {
    File(FileGateway),
    Rest(RestGateway),
}

impl Backend {
    pub async fn from_config(config: &BackendConfig) -> Self {
        match config {
            BackendConfig::File { data_path } => {
                Backend::File(FileGateway::open(data_path.clone()).await)
            }
            BackendConfig::Rest(rest) => Backend::Rest(RestGateway::new(rest.clone())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::File(_) => "file",
            Backend::Rest(_) => "rest",
        }
    }
}

impl SyncGateway for Backend {
    async fn current_user(&self) -> Result<Option<Identity>, GatewayError> {
        match self {
            Backend::File(gateway) => gateway.current_user().await,
            Backend::Rest(gateway) => gateway.current_user().await,
        }
    }

    async fn has_session(&self) -> bool {
        match self {
            Backend::File(gateway) => gateway.has_session().await,
            Backend::Rest(gateway) => gateway.has_session().await,
        }
    }

    async fn load_range(
        &self,
        identity: &Identity,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RemoteRecord>, GatewayError> {
        match self {
            Backend::File(gateway) => gateway.load_range(identity, from, to).await,
            Backend::Rest(gateway) => gateway.load_range(identity, from, to).await,
        }
    }

    async fn upsert(&self, identity: &Identity, record: RemoteRecord) -> Result<(), GatewayError> {
        match self {
            Backend::File(gateway) => gateway.upsert(identity, record).await,
            Backend::Rest(gateway) => gateway.upsert(identity, record).await,
        }
    }

    async fn sign_in(&self, token: &str) -> Result<Identity, GatewayError> {
        match self {
            Backend::File(gateway) => gateway.sign_in(token).await,
            Backend::Rest(gateway) => gateway.sign_in(token).await,
        }
    }

    async fn sign_out(&self) {
        match self {
            Backend::File(gateway) => gateway.sign_out().await,
            Backend::Rest(gateway) => gateway.sign_out().await,
        }
    }

    fn authorize_url(&self, redirect_to: &str) -> Option<String> {
        match self {
            Backend::File(gateway) => gateway.authorize_url(redirect_to),
            Backend::Rest(gateway) => gateway.authorize_url(redirect_to),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        match self {
            Backend::File(gateway) => gateway.subscribe(),
            Backend::Rest(gateway) => gateway.subscribe(),
        }
    }
}
