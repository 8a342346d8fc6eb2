use axum::extract::ws::{Message, Utf8Bytes};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::{
    PlayerConnection, SharedState,
    session::{Dispatch, GameSession, Recipient, SessionEvent, TimerCommand},
};

use super::turn_timer::TurnTimer;

/// Own the game session and process its events one at a time.
///
/// Each event is applied to completion, its messages are pushed to the
/// player sockets and the turn countdown is armed or cancelled before the
/// next event is taken from the channel. A departing connection is
/// unregistered only after its own departure notice was queued.
pub async fn run(state: SharedState, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
    let mut session = GameSession::new(state.config());
    let mut timer = TurnTimer::new(state.config().turn_duration(), state.event_sender());
    info!(
        turn_secs = state.config().turn_duration().as_secs(),
        "game session loop started"
    );

    while let Some(event) = events.recv().await {
        let departed = match &event {
            SessionEvent::PlayerLeft { id, .. } => Some(*id),
            _ => None,
        };
        let reaction = session.handle(event);

        match reaction.timer {
            Some(TimerCommand::Arm(ticket)) => timer.arm(ticket),
            Some(TimerCommand::Cancel) => timer.cancel(),
            None => {}
        }

        deliver(&state, reaction.dispatches);
        if let Some(id) = departed {
            state.connections().remove(&id);
        }
        state.publish_snapshot(session.snapshot());
    }

    timer.cancel();
    info!("game session loop stopped");
}

/// Push every dispatch to the sockets it is addressed to.
pub fn deliver(state: &SharedState, dispatches: Vec<Dispatch>) {
    for Dispatch { to, message } in dispatches {
        let payload: Utf8Bytes = match serde_json::to_string(&message) {
            Ok(payload) => payload.into(),
            Err(err) => {
                warn!(error = %err, "failed to serialize message `{message:?}`");
                continue;
            }
        };

        match to {
            Recipient::All => {
                for connection in state.connections().iter() {
                    send_text(connection.value(), &payload);
                }
            }
            Recipient::AllExcept(excluded) => {
                for connection in state.connections().iter() {
                    if *connection.key() != excluded {
                        send_text(connection.value(), &payload);
                    }
                }
            }
            Recipient::Only(id) => match state.connections().get(&id) {
                Some(connection) => send_text(connection.value(), &payload),
                None => debug!(id = %id, "no open connection for direct message"),
            },
        }
    }
}

/// Serialize a payload and push it onto the provided WebSocket sender.
pub fn send_message<T>(tx: &mpsc::UnboundedSender<Message>, value: &T) -> bool
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    match serde_json::to_string(value) {
        Ok(payload) => tx.send(Message::Text(payload.into())).is_ok(),
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            false
        }
    }
}

fn send_text(connection: &PlayerConnection, payload: &Utf8Bytes) {
    if connection.tx.send(Message::Text(payload.clone())).is_err() {
        debug!(id = %connection.id, "writer closed; message dropped");
    }
}
