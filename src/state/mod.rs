pub mod evaluator;
pub mod roster;
pub mod scheduler;
pub mod session;

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::{mpsc, watch};

use crate::{config::AppConfig, error::ServiceError};

use self::{
    roster::PlayerId,
    session::{GameSession, SessionEvent, SessionSnapshot},
};

/// Application state shared by every handler.
pub type SharedState = Arc<AppState>;

#[derive(Clone)]
/// Handle used to push messages to a connected player.
pub struct PlayerConnection {
    /// Identity assigned when the socket opened.
    pub id: PlayerId,
    /// Outbound queue drained by the socket writer task.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state: open connections and the channel into the game session.
///
/// The session itself is owned by the event loop in
/// [`crate::services::session_service`]; everything else only sees the
/// snapshot it publishes after each event.
pub struct AppState {
    config: AppConfig,
    connections: DashMap<PlayerId, PlayerConnection>,
    events: mpsc::UnboundedSender<SessionEvent>,
    snapshot: watch::Sender<SessionSnapshot>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The returned receiver must be handed to the session event loop.
    pub fn new(config: AppConfig) -> (SharedState, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let (snapshot, _rx) = watch::channel(GameSession::new(&config).snapshot());
        let state = Arc::new(Self {
            config,
            connections: DashMap::new(),
            events,
            snapshot,
        });
        (state, receiver)
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Registry of open player sockets keyed by connection identity.
    pub fn connections(&self) -> &DashMap<PlayerId, PlayerConnection> {
        &self.connections
    }

    /// Queue an event for the game session.
    pub fn submit(&self, event: SessionEvent) -> Result<(), ServiceError> {
        self.events
            .send(event)
            .map_err(|_| ServiceError::SessionClosed)
    }

    /// Sender side of the session channel, used by the turn timer.
    pub fn event_sender(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.events.clone()
    }

    /// Whether the session event loop is still consuming events.
    pub fn is_session_running(&self) -> bool {
        !self.events.is_closed()
    }

    /// Latest published session snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    pub fn snapshot_watcher(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    /// Replace the published snapshot.
    pub fn publish_snapshot(&self, snapshot: SessionSnapshot) {
        self.snapshot.send_replace(snapshot);
    }
}
