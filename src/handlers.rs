use crate::calendar::parse_iso_date;
use crate::errors::AppError;
use crate::gateway::SyncGateway;
use crate::grid::build_grid_at;
use crate::models::{
    DayCard, GridResponse, MoodRequest, ProgressResponse, ReflectionRequest, SelectRequest,
    SessionResponse, ShiftRequest, SignInRequest, SwipeRequest,
};
use crate::state::AppState;
use crate::ui::{PageView, render_index};
use axum::{
    extract::State,
    http::{HeaderMap, header::HOST},
    response::{Html, Redirect},
    Json,
};
use tracing::info;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let header = state.feeds.header.borrow().clone();
    let day = state.feeds.day.borrow().clone();
    let grid = grid_now(&state).await;
    let card = state.navigator.card().await;
    Html(render_index(&PageView {
        header: &header,
        day: &day,
        grid: &grid,
        card: &card,
    }))
}

pub async fn get_progress(State(state): State<AppState>) -> Json<ProgressResponse> {
    Json(ProgressResponse {
        header: state.feeds.header.borrow().clone(),
        day: state.feeds.day.borrow().clone(),
    })
}

pub async fn get_grid(State(state): State<AppState>) -> Json<GridResponse> {
    Json(grid_now(&state).await)
}

pub async fn get_card(State(state): State<AppState>) -> Json<DayCard> {
    Json(state.navigator.card().await)
}

pub async fn shift(
    State(state): State<AppState>,
    Json(payload): Json<ShiftRequest>,
) -> Json<DayCard> {
    Json(state.navigator.shift(payload.delta).await)
}

pub async fn select(
    State(state): State<AppState>,
    Json(payload): Json<SelectRequest>,
) -> Result<Json<DayCard>, AppError> {
    let date = parse_iso_date(&payload.date)
        .ok_or_else(|| AppError::bad_request("date must be YYYY-MM-DD"))?;
    Ok(Json(state.navigator.select(date).await))
}

pub async fn today(State(state): State<AppState>) -> Json<DayCard> {
    let today = state.clock.now().date();
    Json(state.navigator.select(today).await)
}

pub async fn set_mood(
    State(state): State<AppState>,
    Json(payload): Json<MoodRequest>,
) -> Json<DayCard> {
    Json(state.navigator.set_mood(payload.mood).await)
}

pub async fn set_reflection(
    State(state): State<AppState>,
    Json(payload): Json<ReflectionRequest>,
) -> Json<DayCard> {
    Json(state.navigator.set_reflection(payload.reflection).await)
}

pub async fn swipe(
    State(state): State<AppState>,
    Json(payload): Json<SwipeRequest>,
) -> Json<DayCard> {
    match state.navigator.swipe(&payload.points).await {
        Some(card) => Json(card),
        None => Json(state.navigator.card().await),
    }
}

pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, AppError> {
    let user = state.gateway.current_user().await?;
    Ok(Json(SessionResponse {
        signed_in: state.gateway.has_session().await,
        user_id: user.map(|identity| identity.id),
        login_url: state.gateway.authorize_url(&origin(&headers)),
    }))
}

pub async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let identity = state.gateway.sign_in(&payload.token).await?;
    info!(user = %identity.id, backend = state.gateway.name(), "signed in");
    Ok(Json(SessionResponse {
        signed_in: true,
        user_id: Some(identity.id),
        login_url: state.gateway.authorize_url(&origin(&headers)),
    }))
}

pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<SessionResponse> {
    state.gateway.sign_out().await;
    info!("signed out");
    Json(SessionResponse {
        signed_in: false,
        user_id: None,
        login_url: state.gateway.authorize_url(&origin(&headers)),
    })
}

pub async fn login(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    match state.gateway.authorize_url(&origin(&headers)) {
        Some(url) => Redirect::to(&url),
        None => Redirect::to("/"),
    }
}

async fn grid_now(state: &AppState) -> GridResponse {
    let overlay = state.navigator.overlay().await;
    build_grid_at(&state.calendar, state.clock.now(), &overlay)
}

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// The browser-facing origin, honouring a TLS-terminating proxy.
fn origin(headers: &HeaderMap) -> String {
    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get(FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| value == "https" || value == "http")
        .unwrap_or_else(|| "http".to_string());
    format!("{scheme}://{host}/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn origin_defaults_to_plain_http() {
        assert_eq!(
            origin(&headers(&[("host", "dots.local:8080")])),
            "http://dots.local:8080/"
        );
        assert_eq!(origin(&HeaderMap::new()), "http://localhost/");
    }

    #[test]
    fn origin_follows_forwarded_proto() {
        let behind_tls = headers(&[
            ("host", "dots.example"),
            ("x-forwarded-proto", "https, http"),
        ]);
        assert_eq!(origin(&behind_tls), "https://dots.example/");

        let bogus = headers(&[
            ("host", "dots.example"),
            ("x-forwarded-proto", "javascript"),
        ]);
        assert_eq!(origin(&bogus), "http://dots.example/");
    }
}
