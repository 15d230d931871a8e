//! Read-only event API:
//!   GET /api/events/active            – the running event, if any
//!   GET /api/events/{key}/leaderboard – top contributors (`?limit=`)

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::json;

use crate::app::SharedState;

use super::{ApiResult, err_json};

/// GET /api/events/active
pub async fn get_active_event(State(state): State<SharedState>) -> ApiResult {
    let event = state
        .run_engine(|engine| engine.events.get_active_event())
        .await
        .map_err(|e| err_json(500, &e.to_string()))?
        .map_err(|e| err_json(500, &e.to_string()))?;
    Ok(Json(json!({ "event": event })))
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

/// GET /api/events/{key}/leaderboard
pub async fn get_leaderboard(
    State(state): State<SharedState>,
    Path(key): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult {
    let default_limit = state.config().await.leaderboard_default_limit;
    let limit = query.limit.unwrap_or(default_limit).clamp(1, 100);

    let event_key = key.clone();
    let (event, entries) = state
        .run_engine(move |engine| {
            let event = engine.events.get_event(&event_key)?;
            let entries = engine.ledger.get_leaderboard(&event_key, limit)?;
            Ok::<_, season_engine::SeasonError>((event, entries))
        })
        .await
        .map_err(|e| err_json(500, &e.to_string()))?
        .map_err(|e| err_json(500, &e.to_string()))?;

    if event.is_none() && entries.is_empty() {
        return Err(err_json(404, &format!("event not found: {key}")));
    }
    Ok(Json(json!({ "event_key": key, "entries": entries })))
}
