use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/auth/login", get(handlers::login))
        .route("/api/progress", get(handlers::get_progress))
        .route("/api/grid", get(handlers::get_grid))
        .route("/api/card", get(handlers::get_card))
        .route("/api/card/shift", post(handlers::shift))
        .route("/api/card/select", post(handlers::select))
        .route("/api/card/today", post(handlers::today))
        .route("/api/card/mood", post(handlers::set_mood))
        .route("/api/card/reflection", post(handlers::set_reflection))
        .route("/api/card/swipe", post(handlers::swipe))
        .route("/api/session", get(handlers::get_session))
        .route("/api/auth/sign-in", post(handlers::sign_in))
        .route("/api/auth/sign-out", post(handlers::sign_out))
        .with_state(state)
}
