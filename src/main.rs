use mcp_gateway::app::AppState;
use mcp_gateway::config::{Config, Environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    init_logging(config.server.environment);

    tracing::info!(
        port = config.server.http.port,
        environment = ?config.server.environment,
        "starting gateway"
    );

    let state = AppState::build(config.clone())
        .await
        .map_err(|e| -> Box<dyn std::error::Error> { e.into() })?;
    let app = state.router();

    let addr = format!("0.0.0.0:{}", config.server.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

fn init_logging(environment: Environment) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match environment {
        Environment::Production => subscriber.json().init(),
        Environment::Development => subscriber.init(),
    }
}

/// Waits for `SIGTERM` (the signal a container orchestrator sends on
/// rolling deploy) or `SIGINT` (interactive `Ctrl-C`), whichever comes
/// first, so `axum::serve`'s graceful shutdown can drain in-flight requests
/// before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
