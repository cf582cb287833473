use super::handlers;
use super::state::AppState;
use crate::registry::RECORDINGS_PATH;
use axum::{
    routing::{get, MethodRouter},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

fn recordings_route() -> MethodRouter<AppState> {
    get(handlers::list_recordings)
        // `get` would otherwise answer HEAD as well
        .head(handlers::method_not_allowed)
        .post(handlers::append_recording)
        .fallback(handlers::method_not_allowed)
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recording registry
        .route(RECORDINGS_PATH, recordings_route())
        // Singular alias used by older front-ends
        .route("/api/recording", recordings_route())
        // Browser front-ends may live on another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
