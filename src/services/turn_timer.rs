use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tracing::debug;

use crate::state::{scheduler::TimerTicket, session::SessionEvent};

/// The single cancellable countdown of the current drawing turn.
///
/// When the countdown runs out it posts [`SessionEvent::TimerExpired`] back
/// into the session channel; the session decides whether the ticket is still
/// current.
pub struct TurnTimer {
    duration: Duration,
    events: mpsc::UnboundedSender<SessionEvent>,
    pending: Option<(TimerTicket, JoinHandle<()>)>,
}

impl TurnTimer {
    /// Create a disarmed timer that fires after `duration` once armed.
    pub fn new(duration: Duration, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            duration,
            events,
            pending: None,
        }
    }

    /// Start a countdown for `ticket`, aborting any countdown already running.
    pub fn arm(&mut self, ticket: TimerTicket) {
        self.cancel();

        let events = self.events.clone();
        let duration = self.duration;
        let handle = tokio::spawn(async move {
            sleep(duration).await;
            let _ = events.send(SessionEvent::TimerExpired(ticket));
        });
        debug!(turn = ticket.turn(), secs = duration.as_secs(), "turn timer armed");
        self.pending = Some((ticket, handle));
    }

    /// Abort the running countdown, if any.
    pub fn cancel(&mut self) {
        if let Some((ticket, handle)) = self.pending.take() {
            handle.abort();
            debug!(turn = ticket.turn(), "turn timer cancelled");
        }
    }

    /// Ticket of the running countdown.
    pub fn armed(&self) -> Option<TimerTicket> {
        self.pending.as_ref().map(|(ticket, _)| *ticket)
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
