//! API Routes
//!
//! Configures the Axum router with all cache admin endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_text_handler, delete_object_handler, get_object_handler, get_text_handler,
    guarantee_handler, health_handler, put_object_handler, put_text_handler,
    reset_objects_handler, stats_handler, sweep_handler, text_age_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/objects", put(put_object_handler).delete(reset_objects_handler))
        .route(
            "/objects/:key",
            get(get_object_handler).delete(delete_object_handler),
        )
        .route("/objects/:key/guarantee", post(guarantee_handler))
        .route("/sweep", post(sweep_handler))
        .route("/text/:text_type", delete(clear_text_handler))
        .route(
            "/text/:text_type/:id",
            get(get_text_handler).put(put_text_handler),
        )
        .route("/text/:text_type/:id/age", get(text_age_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
