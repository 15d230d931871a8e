//! POST /api/commands – run a chat command on behalf of a user.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::json;

use crate::app::SharedState;
use crate::commands::{self, CommandContext};

use super::{ApiResult, err_json};

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    #[serde(flatten)]
    pub context: CommandContext,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// POST /api/commands
pub async fn run_command(
    State(state): State<SharedState>,
    Json(req): Json<CommandRequest>,
) -> ApiResult {
    if req.command.trim().is_empty() {
        return Err(err_json(400, "command is required"));
    }
    let reply = commands::dispatch(&state, &req.context, &req.command, &req.args).await;
    Ok(Json(json!(reply)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use event_db::Database;

    fn state() -> SharedState {
        let db = Database::open_in_memory().unwrap();
        SharedState::new(db, AppConfig::default(), std::path::PathBuf::from("."))
    }

    #[tokio::test]
    async fn request_body_is_flattened_context() {
        let req: CommandRequest = serde_json::from_value(json!({
            "user_id": 9,
            "is_admin": true,
            "command": "event_start",
            "args": ["winter", "100"]
        }))
        .unwrap();
        assert_eq!(req.context.user_id, 9);
        assert!(req.context.guild_id.is_none());

        let state = state();
        let Json(body) = run_command(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["data"]["event_key"], "winter");
    }

    #[tokio::test]
    async fn empty_command_is_bad_request() {
        let req = CommandRequest {
            context: CommandContext::default(),
            command: "  ".into(),
            args: Vec::new(),
        };
        let (status, _) = run_command(State(state()), Json(req)).await.unwrap_err();
        assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    }
}
