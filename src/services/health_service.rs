use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the game session loop is still accepting events.
pub fn health_status(state: &SharedState) -> HealthResponse {
    if state.is_session_running() {
        HealthResponse::ok()
    } else {
        warn!("game session loop is not running");
        HealthResponse::degraded()
    }
}
