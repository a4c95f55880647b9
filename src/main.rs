use routine_tracker::models::UserContext;
use routine_tracker::watcher::{ScheduleWatcher, log_transitions};
use routine_tracker::{AppState, Config, load_data, router};
use std::net::SocketAddr;
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let data = load_data(&config.data_path).await;
    info!(
        path = %config.data_path.display(),
        routines = data.routines.len(),
        logs = data.logs.len(),
        "loaded data"
    );
    let state = AppState::new(config.data_path.clone(), data).with_default_user(config.default_user_id);

    let watcher = ScheduleWatcher::spawn(
        state.clone(),
        UserContext::new(config.default_user_id),
        config.poll_interval,
    );
    tokio::spawn(log_transitions(watcher.subscribe()));

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    watcher.cancel();
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
