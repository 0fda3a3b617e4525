use crate::handlers;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use shared::config::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Build and configure the application router
pub fn build_router(state: AppState, config: &Config) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Read-through resources
        .route("/api/products", get(handlers::list_products))
        // Middleware
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET]);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}
