//! Background task loops.

use tokio::sync::broadcast::error::RecvError;

use crate::app::SharedState;

/// Log every milestone announcement until shutdown. Chat front-ends
/// subscribe to the same channel to post them.
pub async fn milestone_announcer_loop(state: SharedState) {
    let shutdown_token = state.shutdown_token().clone();
    let mut rx = state.subscribe_milestones();

    loop {
        let received = tokio::select! {
            _ = shutdown_token.cancelled() => {
                tracing::info!("Milestone announcer stopped (shutdown)");
                return;
            }
            received = rx.recv() => received,
        };

        match received {
            Ok(m) => tracing::info!(
                event_key = %m.event_key,
                milestone = m.milestone,
                total = m.total,
                "Announcing community milestone"
            ),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Milestone announcer lagged behind");
            }
            Err(RecvError::Closed) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use event_db::Database;

    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn announcer_stops_on_shutdown() {
        let db = Database::open_in_memory().unwrap();
        let state = SharedState::new(db, AppConfig::default(), PathBuf::from("."));
        let task = tokio::spawn(milestone_announcer_loop(state.clone()));

        state.publish_milestones("winter", &[100, 200], 210);
        state.shutdown_token().cancel();
        task.await.unwrap();
    }
}
