use serde::Serialize;
use utoipa::ToSchema;

use crate::state::scheduler::GamePhase;

/// Publicly visible game phase exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// No active game.
    Idle,
    /// One player is waiting for an opponent.
    Lobby,
    /// The drawer is picking a word.
    ChoosingWord,
    /// The drawer is drawing and others are guessing.
    Drawing,
    /// Between two turns.
    TurnEnded,
}

impl From<GamePhase> for VisibleGamePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Idle => VisibleGamePhase::Idle,
            GamePhase::Lobby => VisibleGamePhase::Lobby,
            GamePhase::TurnAnnounced => VisibleGamePhase::ChoosingWord,
            GamePhase::Drawing => VisibleGamePhase::Drawing,
            GamePhase::TurnEnded => VisibleGamePhase::TurnEnded,
        }
    }
}
