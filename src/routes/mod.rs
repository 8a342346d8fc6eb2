use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::state::SharedState;

pub mod docs;
pub mod game;
pub mod health;
pub mod websocket;

/// Compose all route trees, wiring in shared state, documentation and the web client.
///
/// Paths no route claims are served from the static directory, falling back
/// to its `index.html` so client-side routes resolve.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(websocket::router())
        .merge(game::router());

    let static_dir = state.config().static_dir().clone();
    let assets = ServeDir::new(&static_dir)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    api_router
        .merge(docs::router())
        .fallback_service(assets)
        .with_state(state)
}
