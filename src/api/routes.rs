use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Engine routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        // Recommendations
        .route("/recommendations", post(handlers::recommend))
        // Title search
        .route("/search", get(handlers::search_titles))
        // Offline evaluation
        .route("/evaluate", post(handlers::evaluate))
        // Catalog snapshot
        .route("/catalog", get(handlers::catalog_stats))
        .route("/catalog/rebuild", post(handlers::rebuild_catalog))
}
