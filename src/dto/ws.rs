use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::dto::game::PlayerSummary;

/// Failure to turn a text frame into a [`ClientMessage`].
#[derive(Debug, Error)]
pub enum MessageError {
    /// The frame is not a recognised JSON message.
    #[error("malformed message: {0}")]
    Parse(#[from] serde_json::Error),
    /// The payload failed validation.
    #[error("invalid message: {0}")]
    Invalid(#[from] ValidationErrors),
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from player WebSocket clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Register on the roster with a display name and avatar.
    Join(JoinPayload),
    /// Submit a guess or chat line.
    Guess(GuessPayload),
    /// Drawer picks the secret word.
    ChooseWord(WordPayload),
    /// Stroke data to relay to the other players.
    Draw(DrawPayload),
    #[serde(other)]
    /// Any message type this server does not know.
    Unknown,
}

impl ClientMessage {
    /// Parse and validate a text frame.
    pub fn from_json_str(raw: &str) -> Result<Self, MessageError> {
        let message: Self = serde_json::from_str(raw)?;
        match &message {
            Self::Join(payload) => payload.validate()?,
            Self::Guess(payload) => payload.validate()?,
            Self::ChooseWord(payload) => payload.validate()?,
            Self::Draw(_) | Self::Unknown => {}
        }
        Ok(message)
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
/// Profile sent by a player when joining.
pub struct JoinPayload {
    /// Display name, 1 to 32 characters.
    #[validate(length(min = 1, max = 32))]
    pub name: String,
    /// Avatar URL or preset key.
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub avatar: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
/// Free text typed into the guess box.
pub struct GuessPayload {
    /// Guess or chat text, compared as typed.
    #[validate(length(max = 256))]
    pub text: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
/// Secret word picked by the drawer.
pub struct WordPayload {
    /// The word the others must find.
    #[validate(length(min = 1, max = 64))]
    pub word: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Opaque drawing data, relayed as is.
pub struct DrawPayload {
    /// Client-defined stroke description.
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
/// Result of a submitted guess, broadcast to every player.
pub struct GuessResult {
    /// Text as typed by the guesser.
    pub text: String,
    /// Player who sent the text.
    pub guesser: PlayerSummary,
    /// Whether the text matches the secret word; never set for the drawer.
    pub is_correct_now: bool,
    /// Roster with up-to-date scores.
    pub players: Vec<PlayerSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
/// Notifications pushed to player WebSocket clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Ask a fresh connection for its profile.
    RequestUserData,
    /// A second player arrived and the first turn begins.
    GameStarted,
    /// Too few players remain; the game is back to idle.
    GameStopped,
    /// The next drawer must pick a word.
    TurnAnnounced {
        /// Player who draws this turn.
        drawer: PlayerSummary,
    },
    /// The word is chosen and the countdown runs.
    DrawStarted {
        /// Player drawing.
        drawer: PlayerSummary,
    },
    /// The turn is over.
    TurnEnded {
        /// Player who drew the finished turn.
        drawer: PlayerSummary,
    },
    /// Someone joined or left.
    RosterUpdated {
        /// Players in turn order.
        players: Vec<PlayerSummary>,
    },
    /// Sent to a newcomer joining a game already in progress.
    AlreadyStarted,
    /// Length of the secret word, never the word itself.
    WordLength {
        /// Characters in the secret word.
        length: usize,
    },
    /// Outcome of a submitted guess.
    GuessResult(GuessResult),
    /// Every guesser found the word.
    AllGuessedCorrect,
    /// Sent to the departing connection.
    PlayerDisconnected,
    /// Stroke data relayed from the drawer.
    Drawing {
        /// Opaque stroke payload.
        #[schema(value_type = Object)]
        data: serde_json::Value,
    },
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn parses_join_message() {
        let message =
            ClientMessage::from_json_str(r#"{"type":"join","name":"ada","avatar":"fox"}"#)
                .unwrap();
        match message {
            ClientMessage::Join(payload) => {
                assert_eq!(payload.name, "ada");
                assert_eq!(payload.avatar, "fox");
            }
            other => panic!("expected join, got {other:?}"),
        }
    }

    #[test]
    fn avatar_is_optional() {
        let message = ClientMessage::from_json_str(r#"{"type":"join","name":"ada"}"#).unwrap();
        assert!(matches!(message, ClientMessage::Join(payload) if payload.avatar.is_empty()));
    }

    #[test]
    fn rejects_empty_name_and_word() {
        let err = ClientMessage::from_json_str(r#"{"type":"join","name":""}"#).unwrap_err();
        assert!(matches!(err, MessageError::Invalid(_)));

        let err = ClientMessage::from_json_str(r#"{"type":"choose_word","word":""}"#).unwrap_err();
        assert!(matches!(err, MessageError::Invalid(_)));
    }

    #[test]
    fn guess_text_is_kept_verbatim() {
        let message =
            ClientMessage::from_json_str(r#"{"type":"guess","text":"  Apple "}"#).unwrap();
        assert!(matches!(message, ClientMessage::Guess(payload) if payload.text == "  Apple "));
    }

    #[test]
    fn unknown_type_is_tolerated() {
        let message = ClientMessage::from_json_str(r#"{"type":"wave"}"#).unwrap();
        assert!(matches!(message, ClientMessage::Unknown));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = ClientMessage::from_json_str("not json").unwrap_err();
        assert!(matches!(err, MessageError::Parse(_)));
    }

    #[test]
    fn server_messages_are_tagged() {
        let drawer = PlayerSummary {
            id: Uuid::nil(),
            name: "ada".into(),
            avatar: String::new(),
            score: 0,
        };
        let value = serde_json::to_value(ServerMessage::TurnAnnounced { drawer }).unwrap();
        assert_eq!(value["type"], "turn_announced");
        assert_eq!(value["drawer"]["name"], "ada");

        let value = serde_json::to_value(ServerMessage::WordLength { length: 5 }).unwrap();
        assert_eq!(value, json!({ "type": "word_length", "length": 5 }));

        let value = serde_json::to_value(ServerMessage::AllGuessedCorrect).unwrap();
        assert_eq!(value, json!({ "type": "all_guessed_correct" }));
    }
}
