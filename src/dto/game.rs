use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{format_system_time, phase::VisibleGamePhase},
    state::{
        evaluator::ChatEntry,
        roster::Player,
        session::SessionSnapshot,
    },
};

/// Public view of a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Connection identity.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Avatar reference supplied at join.
    pub avatar: String,
    /// Points accumulated so far.
    pub score: u32,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            avatar: player.avatar.clone(),
            score: player.score,
        }
    }
}

/// Current state of the game as exposed by `GET /game`.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSnapshotResponse {
    /// Current game phase.
    pub phase: VisibleGamePhase,
    /// Serial of the current turn.
    pub turn: u64,
    /// Present while a game is running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drawer: Option<PlayerSummary>,
    /// Present while the drawer is drawing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_length: Option<usize>,
    /// Players in turn order.
    pub players: Vec<PlayerSummary>,
}

impl From<&SessionSnapshot> for GameSnapshotResponse {
    fn from(snapshot: &SessionSnapshot) -> Self {
        let drawer = snapshot
            .turn
            .drawer_index
            .and_then(|index| snapshot.players.get(index))
            .map(PlayerSummary::from);

        Self {
            phase: snapshot.turn.phase.into(),
            turn: snapshot.turn.turn,
            drawer,
            word_length: snapshot.turn.word_length,
            players: snapshot.players.iter().map(PlayerSummary::from).collect(),
        }
    }
}

/// A chat/guess log line.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatEntryResponse {
    /// Displayed text.
    pub text: String,
    /// Author of the line, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guesser: Option<Uuid>,
    /// Whether the line records a correct guess.
    pub correct: bool,
    /// RFC 3339 timestamp.
    pub sent_at: String,
}

impl From<&ChatEntry> for ChatEntryResponse {
    fn from(entry: &ChatEntry) -> Self {
        Self {
            text: entry.text.clone(),
            guesser: entry.guesser,
            correct: entry.correct,
            sent_at: format_system_time(entry.sent_at),
        }
    }
}

/// Recent chat history, oldest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatHistoryResponse {
    /// Retained entries.
    pub entries: Vec<ChatEntryResponse>,
}
