use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    dto::{
        game::PlayerSummary,
        ws::{GuessResult, ServerMessage},
    },
    error::SessionError,
    state::{
        evaluator::{ChatEntry, GuessEvaluator, Verdict},
        roster::{Player, PlayerId, Roster},
        scheduler::{self, NextTurn, TimerTicket, TurnEndReason, TurnScheduler},
    },
};

/// Inbound events the session reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A connection sent its profile.
    PlayerJoined {
        id: PlayerId,
        name: String,
        avatar: String,
    },
    /// A player typed something in the guess box.
    GuessSubmitted { id: PlayerId, text: String },
    /// A player picked the secret word.
    WordChosen { id: PlayerId, word: String },
    /// A player sent stroke data.
    StrokeDrawn {
        id: PlayerId,
        data: serde_json::Value,
    },
    /// A connection went away.
    PlayerLeft { id: PlayerId, reason: String },
    /// The turn countdown armed with this ticket ran out.
    TimerExpired(TimerTicket),
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::PlayerJoined { .. } => "player_joined",
            Self::GuessSubmitted { .. } => "guess_submitted",
            Self::WordChosen { .. } => "word_chosen",
            Self::StrokeDrawn { .. } => "stroke_drawn",
            Self::PlayerLeft { .. } => "player_left",
            Self::TimerExpired(_) => "timer_expired",
        }
    }
}

/// Who an outbound message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every connection.
    All,
    /// Every connection but one.
    AllExcept(PlayerId),
    /// A single connection.
    Only(PlayerId),
}

/// An outbound message and its audience.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Connections the message goes to.
    pub to: Recipient,
    /// Message to send.
    pub message: ServerMessage,
}

/// What the event loop must do with the turn countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Replace any running countdown with a fresh one for this ticket.
    Arm(TimerTicket),
    /// Abort the running countdown.
    Cancel,
}

/// Observable effect of handling one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reaction {
    /// Messages to deliver, in order.
    pub dispatches: Vec<Dispatch>,
    /// Countdown instruction, if any.
    pub timer: Option<TimerCommand>,
}

impl Reaction {
    fn broadcast(&mut self, message: ServerMessage) {
        self.push(Recipient::All, message);
    }

    fn send(&mut self, id: PlayerId, message: ServerMessage) {
        self.push(Recipient::Only(id), message);
    }

    fn push(&mut self, to: Recipient, message: ServerMessage) {
        self.dispatches.push(Dispatch { to, message });
    }

    /// Messages only, handy when the audience does not matter.
    pub fn messages(&self) -> impl Iterator<Item = &ServerMessage> {
        self.dispatches.iter().map(|dispatch| &dispatch.message)
    }
}

/// Read-only copy of the session published after every event.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Scheduler state.
    pub turn: scheduler::Snapshot,
    /// Roster in turn order.
    pub players: Vec<Player>,
    /// Retained chat/guess history, oldest first.
    pub chat: Vec<ChatEntry>,
}

/// The single game: roster, turn scheduler and guess evaluator.
///
/// Every inbound event is handled to completion by [`GameSession::handle`],
/// which never fails: events that do not fit the current state are logged
/// and dropped.
#[derive(Debug, Clone)]
pub struct GameSession {
    roster: Roster,
    scheduler: TurnScheduler,
    evaluator: GuessEvaluator,
}

impl GameSession {
    /// Create an empty, idle session.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            roster: Roster::new(),
            scheduler: TurnScheduler::new(),
            evaluator: GuessEvaluator::new(
                config.correct_guess_points(),
                config.chat_history_limit(),
            ),
        }
    }

    /// Connected players.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Turn state.
    pub fn scheduler(&self) -> &TurnScheduler {
        &self.scheduler
    }

    /// Guess evaluator and its chat history.
    pub fn evaluator(&self) -> &GuessEvaluator {
        &self.evaluator
    }

    /// Copy the state exposed to read-only consumers.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            turn: self.scheduler.snapshot(),
            players: self.roster.snapshot(),
            chat: self.evaluator.log().entries().cloned().collect(),
        }
    }

    /// Apply one event and return the messages and timer instruction it produces.
    pub fn handle(&mut self, event: SessionEvent) -> Reaction {
        let name = event.name();
        match self.apply(event) {
            Ok(reaction) => reaction,
            Err(err @ SessionError::UnknownPlayer(_)) => {
                debug!(event = name, error = %err, "dropping event");
                Reaction::default()
            }
            Err(err) => {
                warn!(event = name, error = %err, "dropping event");
                Reaction::default()
            }
        }
    }

    fn apply(&mut self, event: SessionEvent) -> Result<Reaction, SessionError> {
        match event {
            SessionEvent::PlayerJoined { id, name, avatar } => self.player_joined(id, name, avatar),
            SessionEvent::GuessSubmitted { id, text } => self.guess_submitted(id, text),
            SessionEvent::WordChosen { id, word } => self.word_chosen(id, word),
            SessionEvent::StrokeDrawn { id, data } => self.stroke_drawn(id, data),
            SessionEvent::PlayerLeft { id, reason } => self.player_left(id, &reason),
            SessionEvent::TimerExpired(ticket) => self.timer_expired(ticket),
        }
    }

    fn player_joined(
        &mut self,
        id: PlayerId,
        name: String,
        avatar: String,
    ) -> Result<Reaction, SessionError> {
        let player = self.roster.join(id, name, avatar)?;
        info!(
            id = %player.id,
            name = %player.name,
            players = self.roster.size(),
            "player joined"
        );

        let mut reaction = Reaction::default();
        reaction.broadcast(self.roster_updated());

        match self.roster.size() {
            1 => {
                if let Err(err) = self.scheduler.wait_for_players() {
                    debug!(error = %err, "lone player joined outside idle");
                }
            }
            2 => self.start_game(&mut reaction)?,
            _ => reaction.send(id, ServerMessage::AlreadyStarted),
        }

        Ok(reaction)
    }

    fn guess_submitted(&mut self, id: PlayerId, text: String) -> Result<Reaction, SessionError> {
        let evaluation = self
            .evaluator
            .evaluate(&mut self.roster, &mut self.scheduler, id, &text)?;

        if evaluation.verdict == Verdict::DrawerWord {
            debug!(id = %id, "drawer typed the secret word; relayed without credit");
        }

        let mut reaction = Reaction::default();
        let guesser = self.summary(&id)?;
        reaction.broadcast(ServerMessage::GuessResult(GuessResult {
            text,
            guesser,
            is_correct_now: evaluation.is_correct_now(),
            players: self.roster.all().map(PlayerSummary::from).collect(),
        }));

        if evaluation.turn_complete {
            info!(turn = self.scheduler.snapshot().turn, "every player found the word");
            reaction.broadcast(ServerMessage::AllGuessedCorrect);
            self.end_turn(TurnEndReason::AllGuessed, &mut reaction)?;
        }

        Ok(reaction)
    }

    fn word_chosen(&mut self, id: PlayerId, word: String) -> Result<Reaction, SessionError> {
        self.ensure_drawer(&id)?;

        let length = word.chars().count();
        let ticket = self.scheduler.choose_word(word)?;
        let drawer = self.current_drawer()?;
        info!(id = %id, length, turn = ticket.turn(), "word chosen");

        let mut reaction = Reaction::default();
        reaction.push(Recipient::AllExcept(id), ServerMessage::WordLength { length });
        reaction.broadcast(ServerMessage::DrawStarted { drawer });
        reaction.timer = Some(TimerCommand::Arm(ticket));
        Ok(reaction)
    }

    fn stroke_drawn(
        &mut self,
        id: PlayerId,
        data: serde_json::Value,
    ) -> Result<Reaction, SessionError> {
        self.ensure_drawer(&id)?;

        let mut reaction = Reaction::default();
        reaction.push(Recipient::AllExcept(id), ServerMessage::Drawing { data });
        Ok(reaction)
    }

    fn player_left(&mut self, id: PlayerId, reason: &str) -> Result<Reaction, SessionError> {
        let departure = self
            .roster
            .leave(&id)
            .ok_or(SessionError::UnknownPlayer(id))?;
        info!(id = %id, reason, players = self.roster.size(), "player left");

        let drawer_left = self.scheduler.player_removed(departure.index, &id);

        let mut reaction = Reaction::default();
        reaction.broadcast(self.roster_updated());
        reaction.send(id, ServerMessage::PlayerDisconnected);

        if self.roster.size() <= 1 {
            self.stop_game(&mut reaction);
            return Ok(reaction);
        }

        if drawer_left {
            reaction.broadcast(ServerMessage::TurnEnded {
                drawer: PlayerSummary::from(&departure.player),
            });
            self.advance(TurnEndReason::DrawerLeft, &mut reaction)?;
        } else if self.scheduler.all_guessed(self.roster.size()) {
            reaction.broadcast(ServerMessage::AllGuessedCorrect);
            self.end_turn(TurnEndReason::AllGuessed, &mut reaction)?;
        }

        Ok(reaction)
    }

    fn timer_expired(&mut self, ticket: TimerTicket) -> Result<Reaction, SessionError> {
        let mut reaction = Reaction::default();
        if !self.scheduler.is_armed(ticket) {
            debug!(turn = ticket.turn(), "ignoring stale turn timer");
            return Ok(reaction);
        }

        info!(turn = ticket.turn(), "turn timer expired");
        self.end_turn(TurnEndReason::TimeUp, &mut reaction)?;
        Ok(reaction)
    }

    fn start_game(&mut self, reaction: &mut Reaction) -> Result<(), SessionError> {
        self.scheduler.start()?;
        info!("game started");
        reaction.broadcast(ServerMessage::GameStarted);
        self.announce(reaction)
    }

    fn stop_game(&mut self, reaction: &mut Reaction) {
        let disarmed = self.scheduler.stop();
        info!(disarmed = disarmed.is_some(), "game stopped");
        reaction.broadcast(ServerMessage::GameStopped);
        reaction.timer = Some(TimerCommand::Cancel);
    }

    fn end_turn(
        &mut self,
        reason: TurnEndReason,
        reaction: &mut Reaction,
    ) -> Result<(), SessionError> {
        let drawer = self.current_drawer()?;
        reaction.broadcast(ServerMessage::TurnEnded { drawer });
        self.advance(reason, reaction)
    }

    fn advance(
        &mut self,
        reason: TurnEndReason,
        reaction: &mut Reaction,
    ) -> Result<(), SessionError> {
        reaction.timer = Some(TimerCommand::Cancel);
        match self.scheduler.finish_turn(reason, self.roster.size())? {
            NextTurn::Announced { .. } => self.announce(reaction),
            NextTurn::Idle => {
                warn!(error = %SessionError::DegenerateRoster, "game back to idle");
                reaction.broadcast(ServerMessage::GameStopped);
                Ok(())
            }
        }
    }

    fn announce(&self, reaction: &mut Reaction) -> Result<(), SessionError> {
        let drawer = self.current_drawer()?;
        debug!(id = %drawer.id, turn = self.scheduler.snapshot().turn, "turn announced");
        reaction.broadcast(ServerMessage::TurnAnnounced { drawer });
        Ok(())
    }

    /// Reject the action unless `id` is registered and, while a game runs, is the drawer.
    fn ensure_drawer(&self, id: &PlayerId) -> Result<(), SessionError> {
        let position = self
            .roster
            .position(id)
            .ok_or(SessionError::UnknownPlayer(*id))?;
        if self.scheduler.is_running() && position != self.scheduler.drawer_index() {
            return Err(SessionError::NotDrawer(*id));
        }
        Ok(())
    }

    fn current_drawer(&self) -> Result<PlayerSummary, SessionError> {
        self.roster
            .at(self.scheduler.drawer_index())
            .map(PlayerSummary::from)
            .ok_or(SessionError::DegenerateRoster)
    }

    fn summary(&self, id: &PlayerId) -> Result<PlayerSummary, SessionError> {
        self.roster
            .find(id)
            .map(PlayerSummary::from)
            .ok_or(SessionError::UnknownPlayer(*id))
    }

    fn roster_updated(&self) -> ServerMessage {
        ServerMessage::RosterUpdated {
            players: self.roster.all().map(PlayerSummary::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::state::scheduler::GamePhase;

    fn session() -> GameSession {
        GameSession::new(&AppConfig::default())
    }

    fn join(session: &mut GameSession, name: &str) -> (PlayerId, Reaction) {
        let id = Uuid::new_v4();
        let reaction = session.handle(SessionEvent::PlayerJoined {
            id,
            name: name.into(),
            avatar: String::new(),
        });
        (id, reaction)
    }

    #[test]
    fn single_player_waits_in_lobby() {
        let mut session = session();
        let (_, reaction) = join(&mut session, "ada");

        assert_eq!(session.scheduler().phase(), GamePhase::Lobby);
        assert!(matches!(
            reaction.messages().collect::<Vec<_>>()[..],
            [ServerMessage::RosterUpdated { .. }]
        ));
    }

    #[test]
    fn second_player_starts_the_game() {
        let mut session = session();
        let (a, _) = join(&mut session, "ada");
        let (_, reaction) = join(&mut session, "bob");

        let messages: Vec<_> = reaction.messages().cloned().collect();
        assert!(matches!(messages[0], ServerMessage::RosterUpdated { .. }));
        assert_eq!(messages[1], ServerMessage::GameStarted);
        assert!(matches!(&messages[2], ServerMessage::TurnAnnounced { drawer } if drawer.id == a));
        assert_eq!(session.scheduler().phase(), GamePhase::TurnAnnounced);
    }

    #[test]
    fn duplicate_join_is_dropped() {
        let mut session = session();
        let (a, _) = join(&mut session, "ada");
        let reaction = session.handle(SessionEvent::PlayerJoined {
            id: a,
            name: "ada again".into(),
            avatar: String::new(),
        });

        assert_eq!(reaction, Reaction::default());
        assert_eq!(session.roster().size(), 1);
    }

    #[test]
    fn only_the_drawer_may_choose_the_word() {
        let mut session = session();
        join(&mut session, "ada");
        let (b, _) = join(&mut session, "bob");

        let reaction = session.handle(SessionEvent::WordChosen {
            id: b,
            word: "apple".into(),
        });
        assert_eq!(reaction, Reaction::default());
        assert_eq!(session.scheduler().phase(), GamePhase::TurnAnnounced);
    }

    #[test]
    fn word_choice_arms_timer_and_hides_word() {
        let mut session = session();
        let (a, _) = join(&mut session, "ada");
        join(&mut session, "bob");

        let reaction = session.handle(SessionEvent::WordChosen {
            id: a,
            word: "apple".into(),
        });
        assert_eq!(
            reaction.dispatches[0],
            Dispatch {
                to: Recipient::AllExcept(a),
                message: ServerMessage::WordLength { length: 5 },
            }
        );
        assert!(matches!(
            &reaction.dispatches[1].message,
            ServerMessage::DrawStarted { drawer } if drawer.id == a
        ));
        assert!(matches!(reaction.timer, Some(TimerCommand::Arm(_))));
    }

    #[test]
    fn guess_without_word_is_plain_chat() {
        let mut session = session();
        join(&mut session, "ada");
        let (b, _) = join(&mut session, "bob");

        let reaction = session.handle(SessionEvent::GuessSubmitted {
            id: b,
            text: "hi".into(),
        });
        assert!(matches!(
            reaction.messages().collect::<Vec<_>>()[..],
            [ServerMessage::GuessResult(GuessResult { is_correct_now: false, .. })]
        ));
        assert_eq!(session.scheduler().phase(), GamePhase::TurnAnnounced);
    }

    #[test]
    fn strokes_are_relayed_from_the_drawer_only() {
        let mut session = session();
        let (a, _) = join(&mut session, "ada");
        let (b, _) = join(&mut session, "bob");

        let reaction = session.handle(SessionEvent::StrokeDrawn {
            id: a,
            data: json!({ "x": 1, "y": 2 }),
        });
        assert_eq!(
            reaction.dispatches,
            vec![Dispatch {
                to: Recipient::AllExcept(a),
                message: ServerMessage::Drawing {
                    data: json!({ "x": 1, "y": 2 })
                },
            }]
        );

        let reaction = session.handle(SessionEvent::StrokeDrawn {
            id: b,
            data: json!({}),
        });
        assert!(reaction.dispatches.is_empty());
    }

    #[test]
    fn lobby_doodles_are_relayed() {
        let mut session = session();
        let (a, _) = join(&mut session, "ada");

        let reaction = session.handle(SessionEvent::StrokeDrawn {
            id: a,
            data: json!([1, 2, 3]),
        });
        assert_eq!(reaction.dispatches.len(), 1);
    }

    #[test]
    fn unknown_leave_is_noop() {
        let mut session = session();
        join(&mut session, "ada");
        let reaction = session.handle(SessionEvent::PlayerLeft {
            id: Uuid::new_v4(),
            reason: "transport close".into(),
        });
        assert_eq!(reaction, Reaction::default());
        assert_eq!(session.roster().size(), 1);
    }

    #[test]
    fn timer_for_unarmed_turn_is_ignored() {
        let mut session = session();
        let (a, _) = join(&mut session, "ada");
        join(&mut session, "bob");
        let arm = session.handle(SessionEvent::WordChosen {
            id: a,
            word: "apple".into(),
        });
        let Some(TimerCommand::Arm(ticket)) = arm.timer else {
            panic!("expected an armed timer");
        };

        let first = session.handle(SessionEvent::TimerExpired(ticket));
        assert!(!first.dispatches.is_empty());

        let second = session.handle(SessionEvent::TimerExpired(ticket));
        assert_eq!(second, Reaction::default());
    }
}
