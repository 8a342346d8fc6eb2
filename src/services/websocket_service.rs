use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{ClientMessage, ServerMessage},
    services::session_service::send_message,
    state::{
        PlayerConnection, SharedState,
        roster::PlayerId,
        session::SessionEvent,
    },
};

/// Handle the full lifecycle of an individual player WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let id: PlayerId = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    state.connections().insert(
        id,
        PlayerConnection {
            id,
            tx: outbound_tx.clone(),
        },
    );
    info!(id = %id, "player connected");

    if !send_message(&outbound_tx, &ServerMessage::RequestUserData) {
        state.connections().remove(&id);
        finalize(writer_task, outbound_tx).await;
        return;
    }

    let reason = loop {
        let Some(message) = receiver.next().await else {
            break "stream ended".to_string();
        };

        match message {
            Ok(Message::Text(text)) => match ClientMessage::from_json_str(&text) {
                Ok(inbound) => {
                    let Some(event) = into_session_event(id, inbound) else {
                        warn!(id = %id, "ignoring unknown message type");
                        continue;
                    };
                    if let Err(err) = state.submit(event) {
                        warn!(id = %id, error = %err, "cannot forward player message");
                        break "session unavailable".to_string();
                    }
                }
                Err(err) => {
                    warn!(id = %id, error = %err, "failed to parse or validate player message");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                let reason = frame
                    .as_ref()
                    .map(|frame| frame.reason.as_str().to_owned())
                    .filter(|reason| !reason.is_empty())
                    .unwrap_or_else(|| "client closed".to_string());
                let _ = outbound_tx.send(Message::Close(frame));
                break reason;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(id = %id, error = %err, "websocket error");
                break err.to_string();
            }
        }
    };

    info!(id = %id, reason = %reason, "player disconnected");
    // The session loop unregisters the connection once the departure is handled.
    if let Err(err) = state.submit(SessionEvent::PlayerLeft { id, reason }) {
        warn!(id = %id, error = %err, "cannot report departure");
        state.connections().remove(&id);
    }

    finalize(writer_task, outbound_tx).await;
}

/// Map a client message to the session event it stands for.
fn into_session_event(id: PlayerId, message: ClientMessage) -> Option<SessionEvent> {
    let event = match message {
        ClientMessage::Join(payload) => SessionEvent::PlayerJoined {
            id,
            name: payload.name,
            avatar: payload.avatar,
        },
        ClientMessage::Guess(payload) => SessionEvent::GuessSubmitted {
            id,
            text: payload.text,
        },
        ClientMessage::ChooseWord(payload) => SessionEvent::WordChosen {
            id,
            word: payload.word,
        },
        ClientMessage::Draw(payload) => SessionEvent::StrokeDrawn {
            id,
            data: payload.data,
        },
        ClientMessage::Unknown => return None,
    };
    Some(event)
}

/// Ensure the writer task winds down before we return from the socket handler.
///
/// The writer drains whatever the session queued before unregistering the
/// connection, then stops once every sender is gone.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_map_to_session_events() {
        let id = Uuid::new_v4();
        let message = ClientMessage::from_json_str(r#"{"type":"guess","text":"Apple"}"#).unwrap();
        assert_eq!(
            into_session_event(id, message),
            Some(SessionEvent::GuessSubmitted {
                id,
                text: "Apple".into()
            })
        );

        let message =
            ClientMessage::from_json_str(r#"{"type":"choose_word","word":"apple"}"#).unwrap();
        assert_eq!(
            into_session_event(id, message),
            Some(SessionEvent::WordChosen {
                id,
                word: "apple".into()
            })
        );

        assert_eq!(into_session_event(id, ClientMessage::Unknown), None);
    }
}
