pub mod app;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod grid;
pub mod handlers;
pub mod models;
pub mod navigator;
pub mod state;
pub mod storage;
pub mod store;
pub mod swipe;
pub mod ticker;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
