use expense_tracker::backend::Backend;
use expense_tracker::config::{Config, DEFAULT_MOCK_PORT, DEFAULT_PORT};
use expense_tracker::mock::MockBackend;
use expense_tracker::{AppState, LocalStore, mock_api, router};
use std::{env, net::SocketAddr};
use tokio::fs;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let (port, app) = match env::args().nth(1).as_deref() {
        Some("mock-backend") => {
            let config = Config::from_env(DEFAULT_MOCK_PORT);
            info!("serving the mock REST backend");
            return serve(config.port, mock_api::router(MockBackend::seeded(config.mock_delay))).await;
        }
        Some(other) => {
            error!("unknown command: {other}");
            return Err(format!("unknown command: {other} (expected `mock-backend`)").into());
        }
        None => {
            let config = Config::from_env(DEFAULT_PORT);
            if let Some(parent) = config.data_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            let store = LocalStore::open(config.data_path.clone()).await;
            let backend = Backend::from_config(&config, store.clone())?;
            (config.port, router(AppState::new(store, backend)))
        }
    };

    serve(port, app).await
}

async fn serve(port: u16, app: axum::Router) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
