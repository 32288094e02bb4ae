//! Live-reload server: static files from the working directory plus an
//! event stream that browsers listen on for `reload` signals.

use log::*;
use service::{config::Config, logging::Logger};
use sse::Broker;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use web::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::new();

    Logger::init_logger(&config);

    if config.subscribe_path() == config.trigger_path() {
        error!(
            "Subscribe and trigger paths must differ, both are {}",
            config.subscribe_path()
        );
        return ExitCode::FAILURE;
    }

    let broker = Arc::new(Broker::new());
    let app_state = AppState::new(config.clone(), &broker);

    match serve(&config, app_state, broker).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: &Config, app_state: AppState, broker: Arc<Broker>) -> std::io::Result<()> {
    let listen_address = config.listen_address();
    let listener = TcpListener::bind(&listen_address).await?;

    let display_host = match config.interface() {
        "0.0.0.0" | "::" => "localhost",
        host => host,
    };
    info!("starting on http://{display_host}:{}", config.port);
    info!(
        "send requests to http://{display_host}:{}{} to trigger reloads",
        config.port,
        config.trigger_path()
    );
    info!("Serving static files from {}", config.root_dir().display());

    let router = web::router::define_routes(app_state);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(broker))
    .await
}

/// Wait for Ctrl-C, then close every open event stream so the graceful
/// shutdown is not held up by clients that never disconnect.
async fn shutdown_signal(broker: Arc<Broker>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server...");
    broker.shutdown();
}
