use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::SharedState;

/// Build the Axum router with all routes and middleware.
pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check (outside /api prefix)
        .route("/health", get(handlers::health))
        // Share pages: redirect to the canonical code, else describe the position
        .route("/p", get(handlers::share_page_root))
        .route("/p/", get(handlers::share_page_root))
        .route("/p/{*code}", get(handlers::share_page))
        // Position queries
        .route("/api/positions", get(handlers::get_position_root))
        .route("/api/positions/{*code}", get(handlers::get_position))
        .route("/api/legal-moves", get(handlers::legal_moves))
        // Moves
        .route("/api/moves", post(handlers::make_move))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
