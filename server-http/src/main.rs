use server_http::{build_router, AppState};
use shared::config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Graphite HTTP Server...");

    // Load environment variables from .env file (if exists)
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Cache enabled: {}, endpoint: {}, ttl: {}s",
        config.cache.enabled, config.cache.endpoint, config.cache.ttl.0
    );

    // Initialize state; an unreachable cache does not stop startup
    let state = AppState::from_config(&config).await;

    // Build router
    let router = build_router(state, &config);

    // Start server
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!("HTTP Server listening on http://{}", address);
    info!("Try: curl http://localhost:{}/api/products", config.port);

    // Graceful shutdown handler
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
