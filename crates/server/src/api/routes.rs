use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::middleware::{ingest_rate_limit, metrics_middleware};
use super::{handlers, reels};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Only ingest is rate limited
    let ingest_routes = Router::new()
        .route("/reels/ingest", post(reels::ingest_reel))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            ingest_rate_limit,
        ));

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/queue", get(handlers::get_queue))
        // Reels
        .merge(ingest_routes)
        .route("/reels", get(reels::list_reels))
        .route("/reels/{id}", get(reels::get_reel).delete(reels::delete_reel))
        .route("/reels/{id}/status", get(reels::get_status))
        .route("/reels/{id}/retry", post(reels::retry_reel))
        .with_state(Arc::clone(&state));

    let cors = cors_layer(&state.config().server.cors_origin);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics).with_state(state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origin == "*" {
        return layer.allow_origin(AllowOrigin::any());
    }

    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!(origin = %origin, "Invalid CORS origin, cross-origin requests will be rejected");
            layer
        }
    }
}
