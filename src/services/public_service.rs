//! Service helpers that expose read-only public projections of the game session.

use crate::{
    dto::game::{ChatEntryResponse, ChatHistoryResponse, GameSnapshotResponse, PlayerSummary},
    error::ServiceError,
    state::{SharedState, roster::PlayerId},
};

/// Return the phase, drawer and roster of the running session.
pub fn get_game(state: &SharedState) -> Result<GameSnapshotResponse, ServiceError> {
    ensure_session(state)?;
    Ok((&state.snapshot()).into())
}

/// Return a single connected player.
pub fn get_player(state: &SharedState, id: PlayerId) -> Result<PlayerSummary, ServiceError> {
    ensure_session(state)?;
    state
        .snapshot()
        .players
        .iter()
        .find(|player| player.id == id)
        .map(PlayerSummary::from)
        .ok_or_else(|| ServiceError::NotFound(format!("player `{id}` not found")))
}

/// Return the retained chat/guess history, oldest first.
pub fn get_chat(state: &SharedState) -> Result<ChatHistoryResponse, ServiceError> {
    ensure_session(state)?;
    let entries = state
        .snapshot()
        .chat
        .iter()
        .map(ChatEntryResponse::from)
        .collect();
    Ok(ChatHistoryResponse { entries })
}

fn ensure_session(state: &SharedState) -> Result<(), ServiceError> {
    if state.is_session_running() {
        Ok(())
    } else {
        Err(ServiceError::SessionClosed)
    }
}
