use axum::{Router, routing::get, routing::post};
use tower_http::cors::CorsLayer;

use super::api;
use crate::app::SharedState;

/// Create the axum router with all routes.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        // --- Core ---
        .route("/status", get(status_handler))
        // --- Commands ---
        .route("/api/commands", post(api::commands::run_command))
        // --- Events ---
        .route("/api/events/active", get(api::events::get_active_event))
        .route("/api/events/{key}/leaderboard", get(api::events::get_leaderboard))
        // --- Settings ---
        .route(
            "/api/settings",
            get(api::settings::get_settings).put(api::settings::update_settings),
        )
        // --- Middleware ---
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn status_handler() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
