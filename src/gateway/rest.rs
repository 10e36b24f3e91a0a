//! Hosted backend reached over a PostgREST-style API.
//!
//! Auth lives under `/auth/v1`, tables under `/rest/v1/<table>`. A sign-in
//! token is the access token handed back by the provider redirect; it is
//! resolved to a user id once and kept for the session.

use super::{AuthEvent, SyncGateway, auth_channel};
use crate::config::RestConfig;
use crate::errors::GatewayError;
use crate::models::{Identity, Mood, RemoteRecord};
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct RestSession {
    access_token: String,
    identity: Identity,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct UpsertRow<'a> {
    user_id: &'a str,
    day: &'a str,
    mood: Mood,
    reflection: &'a str,
}

#[derive(Clone)]
pub struct RestGateway {
    client: Client,
    config: Arc<RestConfig>,
    session: Arc<RwLock<Option<RestSession>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl RestGateway {
    pub fn new(config: RestConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
            session: Arc::new(RwLock::new(None)),
            events: auth_channel(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.base_url, self.config.table)
    }

    fn authorized(&self, request: RequestBuilder, access_token: &str) -> RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(access_token)
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.access_token.clone())
            .ok_or(GatewayError::NotAuthenticated)
    }
}

async fn check(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}

impl SyncGateway for RestGateway {
    async fn current_user(&self) -> Result<Option<Identity>, GatewayError> {
        Ok(self
            .session
            .read()
            .await
            .as_ref()
            .map(|session| session.identity.clone()))
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
        let token = self.access_token().await?;
        let query = [
            ("select", "day,mood,reflection".to_string()),
            ("user_id", format!("eq.{}", identity.id)),
            ("day", format!("gte.{}", from.format("%Y-%m-%d"))),
            ("day", format!("lte.{}", to.format("%Y-%m-%d"))),
            ("order", "day.asc".to_string()),
        ];
        let request = self.client.get(self.table_url()).query(&query);
        let response = check(self.authorized(request, &token).send().await?).await?;
        let rows: Vec<RemoteRecord> = response.json().await?;
        debug!(user = %identity.id, rows = rows.len(), "fetched entries");
        Ok(rows)
    }

    async fn upsert(&self, identity: &Identity, record: RemoteRecord) -> Result<(), GatewayError> {
        let token = self.access_token().await?;
        let row = UpsertRow {
            user_id: &identity.id,
            day: &record.day,
            mood: record.mood,
            reflection: &record.reflection,
        };
        let request = self
            .client
            .post(self.table_url())
            .query(&[("on_conflict", "user_id,day")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row]);
        check(self.authorized(request, &token).send().await?).await?;
        Ok(())
    }

    async fn sign_in(&self, token: &str) -> Result<Identity, GatewayError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(GatewayError::InvalidToken);
        }
        let request = self
            .client
            .get(format!("{}/auth/v1/user", self.config.base_url));
        let response = self.authorized(request, token).send().await?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            warn!("backend rejected access token");
            return Err(GatewayError::InvalidToken);
        }
        let user: UserResponse = check(response).await?.json().await?;
        let identity = Identity::new(user.id);

        *self.session.write().await = Some(RestSession {
            access_token: token.to_string(),
            identity: identity.clone(),
        });
        let _ = self.events.send(AuthEvent::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) {
        *self.session.write().await = None;
        let _ = self.events.send(AuthEvent::SignedOut);
    }

    fn authorize_url(&self, redirect_to: &str) -> Option<String> {
        let base = format!("{}/auth/v1/authorize", self.config.base_url);
        Url::parse_with_params(
            &base,
            &[
                ("provider", self.config.provider.as_str()),
                ("redirect_to", redirect_to),
            ],
        )
        .ok()
        .map(String::from)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
