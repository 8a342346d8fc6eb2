use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for Scribble Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::get_game,
        crate::routes::game::get_player,
        crate::routes::game::get_chat,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::GameSnapshotResponse,
            crate::dto::game::PlayerSummary,
            crate::dto::game::ChatHistoryResponse,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Read-only views of the running game"),
        (name = "players", description = "WebSocket protocol for players"),
    )
)]
pub struct ApiDoc;
