use axum::{
    Json, Router,
    extract::{RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use year_dots::calendar::CalendarYear;
use year_dots::config::RestConfig;
use year_dots::errors::GatewayError;
use year_dots::gateway::{AuthEvent, RestGateway, SyncGateway};
use year_dots::models::{Identity, Mood, RemoteRecord};
use year_dots::store::{EntryStore, LoadOutcome};

const GOOD_TOKEN: &str = "good-token";
const API_KEY: &str = "anon-key";

#[derive(Clone, Default)]
struct Backend {
    rows: Arc<Mutex<Vec<Value>>>,
    queries: Arc<Mutex<Vec<String>>>,
    prefer: Arc<Mutex<Vec<String>>>,
    fail_reads: Arc<Mutex<bool>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    let bearer = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(|value| value == format!("Bearer {GOOD_TOKEN}"))
        .unwrap_or(false);
    let key = headers
        .get("apikey")
        .and_then(|value| value.to_str().ok())
        .map(|value| value == API_KEY)
        .unwrap_or(false);
    bearer && key
}

async fn user(headers: HeaderMap) -> impl IntoResponse {
    if authorized(&headers) {
        (StatusCode::OK, Json(json!({ "id": "user-1" }))).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn select(
    State(backend): State<Backend>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if *backend.fail_reads.lock().unwrap() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    backend.queries.lock().unwrap().push(query.unwrap_or_default());
    let rows: Vec<Value> = backend
        .rows
        .lock()
        .unwrap()
        .iter()
        .map(|row| json!({ "day": row["day"], "mood": row["mood"], "reflection": row["reflection"] }))
        .collect();
    Json(rows).into_response()
}

async fn upsert(
    State(backend): State<Backend>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Json(body): Json<Vec<Value>>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    backend.queries.lock().unwrap().push(query.unwrap_or_default());
    if let Some(prefer) = headers.get("prefer").and_then(|value| value.to_str().ok()) {
        backend.prefer.lock().unwrap().push(prefer.to_string());
    }
    let mut rows = backend.rows.lock().unwrap();
    for row in body {
        rows.retain(|existing| {
            !(existing["user_id"] == row["user_id"] && existing["day"] == row["day"])
        });
        rows.push(row);
    }
    StatusCode::CREATED.into_response()
}

async fn spawn_backend() -> (String, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/auth/v1/user", get(user))
        .route("/rest/v1/entries", get(select).post(upsert))
        .with_state(backend.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), backend)
}

fn gateway(base_url: &str) -> RestGateway {
    RestGateway::new(RestConfig {
        base_url: base_url.to_string(),
        api_key: API_KEY.to_string(),
        table: "entries".to_string(),
        provider: "google".to_string(),
    })
}

fn year_bounds() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
    )
}

fn record(day: &str, mood: Mood, reflection: &str) -> RemoteRecord {
    RemoteRecord {
        day: day.to_string(),
        mood,
        reflection: reflection.to_string(),
    }
}

#[tokio::test]
async fn sign_in_upsert_and_load_round_trip() {
    let (base_url, backend) = spawn_backend().await;
    let gateway = gateway(&base_url);
    let mut events = gateway.subscribe();

    let identity = gateway.sign_in(GOOD_TOKEN).await.unwrap();
    assert_eq!(identity, Identity::new("user-1"));
    assert!(gateway.has_session().await);
    assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedIn(identity.clone()));

    gateway
        .upsert(&identity, record("2026-04-04", Mood::Down, "first"))
        .await
        .unwrap();
    gateway
        .upsert(&identity, record("2026-04-04", Mood::Fulfilling, "second"))
        .await
        .unwrap();
    assert_eq!(backend.rows.lock().unwrap().len(), 1);

    let (from, to) = year_bounds();
    let rows = gateway.load_range(&identity, from, to).await.unwrap();
    assert_eq!(rows, vec![record("2026-04-04", Mood::Fulfilling, "second")]);

    let queries = backend.queries.lock().unwrap().clone();
    assert!(queries.iter().any(|query| query.starts_with("on_conflict=")));
    let select = queries.last().unwrap();
    assert!(select.contains("user_id=eq.user-1"));
    assert!(select.contains("day=gte.2026-01-01"));
    assert!(select.contains("day=lte.2026-12-31"));

    let prefer = backend.prefer.lock().unwrap().clone();
    assert!(prefer.iter().all(|value| value.contains("resolution=merge-duplicates")));
}

#[tokio::test]
async fn rejected_token_leaves_session_empty() {
    let (base_url, _backend) = spawn_backend().await;
    let gateway = gateway(&base_url);

    let err = gateway.sign_in("stolen").await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidToken));
    assert_eq!(gateway.current_user().await.unwrap(), None);
    assert!(!gateway.has_session().await);
}

#[tokio::test]
async fn upsert_without_session_is_not_authenticated() {
    let (base_url, backend) = spawn_backend().await;
    let gateway = gateway(&base_url);

    let err = gateway
        .upsert(&Identity::new("user-1"), record("2026-01-01", Mood::Calm, ""))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotAuthenticated));
    assert!(backend.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn authorize_url_points_at_provider() {
    let gateway = gateway("https://backend.example");
    let url = gateway.authorize_url("http://localhost:8080/").unwrap();
    assert!(url.starts_with("https://backend.example/auth/v1/authorize?"));
    assert!(url.contains("provider=google"));
    assert!(url.contains("redirect_to=http%3A%2F%2Flocalhost%3A8080%2F"));
}

#[tokio::test]
async fn store_keeps_entries_when_backend_read_fails() {
    let (base_url, backend) = spawn_backend().await;
    let gateway = gateway(&base_url);
    gateway.sign_in(GOOD_TOKEN).await.unwrap();
    gateway
        .upsert(&Identity::new("user-1"), record("2026-08-08", Mood::Calm, "beach"))
        .await
        .unwrap();

    let mut store = EntryStore::new(gateway, CalendarYear::new(2026).unwrap());
    assert_eq!(store.load_all().await, LoadOutcome::Loaded(1));

    *backend.fail_reads.lock().unwrap() = true;
    assert!(matches!(store.load_all().await, LoadOutcome::Failed(_)));
    assert_eq!(store.get("2026-08-08").reflection, "beach");

    let saved = store.save("2026-08-09", &store.get("2026-08-09")).await;
    assert!(saved.ok);
}
