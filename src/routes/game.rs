use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::game::{ChatHistoryResponse, GameSnapshotResponse, PlayerSummary},
    error::AppError,
    services::public_service,
    state::SharedState,
};

/// Read-only endpoints exposing the running game.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game", get(get_game))
        .route("/game/players/{id}", get(get_player))
        .route("/game/chat", get(get_chat))
}

#[utoipa::path(
    get,
    path = "/game",
    tag = "game",
    responses(
        (status = 200, description = "Current phase, drawer and roster", body = GameSnapshotResponse),
        (status = 503, description = "Game session unavailable")
    )
)]
/// Return the current phase, drawer and roster.
pub async fn get_game(
    State(state): State<SharedState>,
) -> Result<Json<GameSnapshotResponse>, AppError> {
    let payload = public_service::get_game(&state)?;
    Ok(Json(payload))
}

#[utoipa::path(
    get,
    path = "/game/players/{id}",
    tag = "game",
    params(("id" = String, Path, description = "Connection identity of the player")),
    responses(
        (status = 200, description = "Connected player", body = PlayerSummary),
        (status = 404, description = "No such player")
    )
)]
/// Return a single connected player with their score.
pub async fn get_player(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerSummary>, AppError> {
    let payload = public_service::get_player(&state, id)?;
    Ok(Json(payload))
}

#[utoipa::path(
    get,
    path = "/game/chat",
    tag = "game",
    responses((status = 200, description = "Recent chat and guesses", body = ChatHistoryResponse))
)]
/// Return the recent chat and guess feed.
pub async fn get_chat(
    State(state): State<SharedState>,
) -> Result<Json<ChatHistoryResponse>, AppError> {
    let payload = public_service::get_chat(&state)?;
    Ok(Json(payload))
}
