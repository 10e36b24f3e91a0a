use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use year_dots::{
    AppState, Config,
    calendar::CalendarYear,
    clock::{Clock, SystemClock},
    gateway::{Backend, SyncGateway},
    navigator::{DayNavigator, spawn_auth_listener},
    router,
    store::EntryStore,
    ticker::spawn_tickers,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    let calendar = CalendarYear::new(config.year)
        .ok_or_else(|| format!("TARGET_YEAR {} is out of range", config.year))?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let gateway = Backend::from_config(&config.backend).await;
    info!(backend = gateway.name(), year = calendar.year(), "starting");

    let navigator = DayNavigator::new(
        calendar,
        EntryStore::new(gateway.clone(), calendar),
        clock.now().date(),
        config.save_debounce,
    );
    navigator.reload().await;
    spawn_auth_listener(navigator.clone(), gateway.subscribe());

    let tickers = spawn_tickers(calendar, Arc::clone(&clock));
    let state = AppState::new(calendar, clock, gateway, navigator, tickers.feeds);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
