//! Settings management API:
//!   GET /api/settings – all settings with defaults filled in
//!   PUT /api/settings – validate, store and reload

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use serde_json::json;

use crate::app::SharedState;
use crate::config::SettingsManager;

use super::{ApiResult, err_json};

/// GET /api/settings
pub async fn get_settings(State(state): State<SharedState>) -> ApiResult {
    let sm = SettingsManager::new(state.db().clone());
    let all = sm
        .get_all_settings()
        .map_err(|e| err_json(500, &format!("Failed to get settings: {e}")))?;
    Ok(Json(json!({ "settings": all })))
}

/// PUT /api/settings
pub async fn update_settings(
    State(state): State<SharedState>,
    Json(body): Json<BTreeMap<String, String>>,
) -> ApiResult {
    let sm = SettingsManager::new(state.db().clone());
    let updated = sm
        .set_settings(&body)
        .map_err(|e| err_json(400, &e.to_string()))?;

    state
        .reload_config()
        .await
        .map_err(|e| err_json(500, &format!("Failed to reload config: {e}")))?;

    let all = sm
        .get_all_settings()
        .map_err(|e| err_json(500, &format!("Failed to get settings: {e}")))?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Updated {updated} setting(s) successfully"),
        "settings": all,
    })))
}
