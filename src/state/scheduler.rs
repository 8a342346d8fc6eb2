use std::collections::HashSet;

use thiserror::Error;

use crate::state::roster::PlayerId;

/// High-level phases a drawing game goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// No game is running.
    Idle,
    /// A single player is connected and waiting for an opponent.
    Lobby,
    /// The drawer has been designated and must pick a word.
    TurnAnnounced,
    /// The word is chosen and the countdown is running.
    Drawing,
    /// The turn is over; the next drawer is about to be announced.
    TurnEnded,
}

/// Why a turn came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEndReason {
    /// The countdown expired.
    TimeUp,
    /// Every player except the drawer found the word.
    AllGuessed,
    /// The drawer disconnected mid-turn.
    DrawerLeft,
}

/// Events that can be applied to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    /// First player arrived; wait for a second one.
    PlayerWaiting,
    /// Two players are present; announce the first drawer.
    StartGame,
    /// The drawer picked the secret word.
    WordChosen,
    /// The current turn is over.
    TurnFinished(TurnEndReason),
    /// Hand the pencil to the next drawer.
    NextTurn,
}

/// Error returned when an event cannot be applied in the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the scheduler was in when the event arrived.
    pub from: GamePhase,
    /// The rejected event.
    pub event: TurnEvent,
}

/// Identifies one armed turn countdown.
///
/// The ticket carries the turn serial it was armed for, so an expiry that
/// belongs to an older turn can be told apart from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerTicket {
    turn: u64,
}

impl TimerTicket {
    /// Turn serial this ticket was armed for.
    pub fn turn(&self) -> u64 {
        self.turn
    }
}

/// Result of closing a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextTurn {
    /// A new drawer has been announced.
    Announced {
        /// Roster index of the new drawer.
        drawer_index: usize,
    },
    /// Nobody is left to draw; the scheduler went back to idle.
    Idle,
}

/// Read-only view of the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: GamePhase,
    /// Serial of the current turn (increments on every announcement).
    pub turn: u64,
    /// Roster index of the drawer while a game is running.
    pub drawer_index: Option<usize>,
    /// Length of the secret word while drawing.
    pub word_length: Option<usize>,
}

/// Owns whose turn it is, the secret word and the armed countdown.
#[derive(Debug, Clone)]
pub struct TurnScheduler {
    phase: GamePhase,
    drawer_index: usize,
    word: Option<String>,
    guessed: HashSet<PlayerId>,
    turn: u64,
    armed: Option<TimerTicket>,
}

impl Default for TurnScheduler {
    fn default() -> Self {
        Self {
            phase: GamePhase::Idle,
            drawer_index: 0,
            word: None,
            guessed: HashSet::new(),
            turn: 0,
            armed: None,
        }
    }
}

impl TurnScheduler {
    /// Create a scheduler in the idle phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Whether a game is in progress.
    pub fn is_running(&self) -> bool {
        matches!(
            self.phase,
            GamePhase::TurnAnnounced | GamePhase::Drawing | GamePhase::TurnEnded
        )
    }

    /// Roster index of the current drawer.
    pub fn drawer_index(&self) -> usize {
        self.drawer_index
    }

    /// Secret word of the current turn, present only while drawing.
    pub fn word(&self) -> Option<&str> {
        self.word.as_deref()
    }

    /// Number of characters in the secret word.
    pub fn word_length(&self) -> Option<usize> {
        self.word.as_ref().map(|word| word.chars().count())
    }

    /// Whether `ticket` is the countdown armed for the live turn.
    pub fn is_armed(&self, ticket: TimerTicket) -> bool {
        self.phase == GamePhase::Drawing && self.armed == Some(ticket)
    }

    /// Snapshot the scheduler state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            turn: self.turn,
            drawer_index: self.is_running().then_some(self.drawer_index),
            word_length: self.word_length(),
        }
    }

    /// Move from idle to the lobby while a lone player waits.
    pub fn wait_for_players(&mut self) -> Result<(), InvalidTransition> {
        self.transition(TurnEvent::PlayerWaiting).map(|_| ())
    }

    /// Start a game: the first player in turn order becomes the drawer.
    pub fn start(&mut self) -> Result<usize, InvalidTransition> {
        self.transition(TurnEvent::StartGame)?;
        self.drawer_index = 0;
        self.begin_turn();
        Ok(self.drawer_index)
    }

    /// Record the drawer's word and arm the countdown for this turn.
    pub fn choose_word(&mut self, word: String) -> Result<TimerTicket, InvalidTransition> {
        self.transition(TurnEvent::WordChosen)?;
        self.word = Some(word);
        let ticket = TimerTicket { turn: self.turn };
        self.armed = Some(ticket);
        Ok(ticket)
    }

    /// Close the current turn and announce the next drawer.
    ///
    /// The armed countdown is disarmed, so a late expiry for this turn no
    /// longer matches [`Self::is_armed`]. With an empty roster the scheduler
    /// falls back to idle instead of picking a drawer.
    pub fn finish_turn(
        &mut self,
        reason: TurnEndReason,
        roster_size: usize,
    ) -> Result<NextTurn, InvalidTransition> {
        self.transition(TurnEvent::TurnFinished(reason))?;
        self.word = None;
        self.guessed.clear();
        self.armed = None;

        if roster_size == 0 {
            self.stop();
            return Ok(NextTurn::Idle);
        }

        // The departed drawer's slot is already taken by the next player.
        self.drawer_index = match reason {
            TurnEndReason::DrawerLeft => self.drawer_index % roster_size,
            TurnEndReason::TimeUp | TurnEndReason::AllGuessed => {
                (self.drawer_index + 1) % roster_size
            }
        };

        self.transition(TurnEvent::NextTurn)?;
        self.begin_turn();
        Ok(NextTurn::Announced {
            drawer_index: self.drawer_index,
        })
    }

    /// Return to idle from any phase, disarming the countdown.
    ///
    /// Scores and roster are not touched. Returns the ticket that was armed.
    pub fn stop(&mut self) -> Option<TimerTicket> {
        self.phase = GamePhase::Idle;
        self.drawer_index = 0;
        self.word = None;
        self.guessed.clear();
        self.armed.take()
    }

    /// Mark `player` as having found the word. Returns `false` if already credited.
    pub fn record_correct(&mut self, player: PlayerId) -> bool {
        self.guessed.insert(player)
    }

    /// Whether `player` already found the word this turn.
    pub fn has_guessed(&self, player: &PlayerId) -> bool {
        self.guessed.contains(player)
    }

    /// Number of players that found the word this turn.
    pub fn guessed_count(&self) -> usize {
        self.guessed.len()
    }

    /// Whether every non-drawer of a roster of `roster_size` found the word.
    pub fn all_guessed(&self, roster_size: usize) -> bool {
        self.phase == GamePhase::Drawing
            && roster_size > 1
            && self.guessed.len() >= roster_size - 1
    }

    /// Account for the removal of the player that sat at roster `index`.
    ///
    /// Keeps the drawer index pointing at the same player when someone
    /// before them leaves. Returns `true` if the drawer itself left.
    pub fn player_removed(&mut self, index: usize, player: &PlayerId) -> bool {
        self.guessed.remove(player);
        if !self.is_running() {
            return false;
        }

        match index.cmp(&self.drawer_index) {
            std::cmp::Ordering::Less => {
                self.drawer_index -= 1;
                false
            }
            std::cmp::Ordering::Equal => true,
            std::cmp::Ordering::Greater => false,
        }
    }

    fn begin_turn(&mut self) {
        self.turn += 1;
        self.word = None;
        self.guessed.clear();
        self.armed = None;
    }

    fn transition(&mut self, event: TurnEvent) -> Result<GamePhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: TurnEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (GamePhase::Idle, TurnEvent::PlayerWaiting) => GamePhase::Lobby,
            (GamePhase::Idle | GamePhase::Lobby, TurnEvent::StartGame) => {
                GamePhase::TurnAnnounced
            }
            (GamePhase::TurnAnnounced, TurnEvent::WordChosen) => GamePhase::Drawing,
            (
                GamePhase::Drawing,
                TurnEvent::TurnFinished(TurnEndReason::TimeUp | TurnEndReason::AllGuessed),
            ) => GamePhase::TurnEnded,
            (
                GamePhase::TurnAnnounced | GamePhase::Drawing,
                TurnEvent::TurnFinished(TurnEndReason::DrawerLeft),
            ) => GamePhase::TurnEnded,
            (GamePhase::TurnEnded, TurnEvent::NextTurn) => GamePhase::TurnAnnounced,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn drawing(word: &str) -> (TurnScheduler, TimerTicket) {
        let mut scheduler = TurnScheduler::new();
        scheduler.start().unwrap();
        let ticket = scheduler.choose_word(word.into()).unwrap();
        (scheduler, ticket)
    }

    #[test]
    fn initial_state_is_idle() {
        let scheduler = TurnScheduler::new();
        assert_eq!(scheduler.phase(), GamePhase::Idle);
        assert_eq!(scheduler.snapshot().drawer_index, None);
    }

    #[test]
    fn full_turn_cycle() {
        let mut scheduler = TurnScheduler::new();
        scheduler.wait_for_players().unwrap();
        assert_eq!(scheduler.phase(), GamePhase::Lobby);

        assert_eq!(scheduler.start().unwrap(), 0);
        assert_eq!(scheduler.phase(), GamePhase::TurnAnnounced);
        assert_eq!(scheduler.word(), None);

        let ticket = scheduler.choose_word("Apple".into()).unwrap();
        assert_eq!(scheduler.phase(), GamePhase::Drawing);
        assert_eq!(scheduler.word_length(), Some(5));
        assert!(scheduler.is_armed(ticket));

        let next = scheduler.finish_turn(TurnEndReason::TimeUp, 3).unwrap();
        assert_eq!(next, NextTurn::Announced { drawer_index: 1 });
        assert_eq!(scheduler.phase(), GamePhase::TurnAnnounced);
        assert_eq!(scheduler.word(), None);
        assert!(!scheduler.is_armed(ticket));
    }

    #[test]
    fn drawer_index_wraps_around() {
        let mut scheduler = TurnScheduler::new();
        scheduler.start().unwrap();
        for expected in [1, 0, 1, 0] {
            scheduler.choose_word("cat".into()).unwrap();
            let next = scheduler.finish_turn(TurnEndReason::TimeUp, 2).unwrap();
            assert_eq!(next, NextTurn::Announced { drawer_index: expected });
            assert!(scheduler.drawer_index() < 2);
        }
    }

    #[test]
    fn empty_roster_degrades_to_idle() {
        let (mut scheduler, ticket) = drawing("cat");
        let next = scheduler.finish_turn(TurnEndReason::TimeUp, 0).unwrap();
        assert_eq!(next, NextTurn::Idle);
        assert_eq!(scheduler.phase(), GamePhase::Idle);
        assert!(!scheduler.is_armed(ticket));
    }

    #[test]
    fn word_can_only_be_chosen_once_per_turn() {
        let (mut scheduler, _) = drawing("cat");
        let err = scheduler.choose_word("dog".into()).unwrap_err();
        assert_eq!(err.from, GamePhase::Drawing);
        assert_eq!(err.event, TurnEvent::WordChosen);
        assert_eq!(scheduler.word(), Some("cat"));
    }

    #[test]
    fn time_up_is_rejected_outside_drawing() {
        let mut scheduler = TurnScheduler::new();
        scheduler.start().unwrap();
        let err = scheduler
            .finish_turn(TurnEndReason::TimeUp, 2)
            .unwrap_err();
        assert_eq!(err.from, GamePhase::TurnAnnounced);
    }

    #[test]
    fn stale_ticket_is_not_armed_after_next_turn() {
        let (mut scheduler, first) = drawing("cat");
        scheduler.finish_turn(TurnEndReason::AllGuessed, 2).unwrap();
        let second = scheduler.choose_word("dog".into()).unwrap();

        assert_ne!(first, second);
        assert!(!scheduler.is_armed(first));
        assert!(scheduler.is_armed(second));
    }

    #[test]
    fn stop_resets_turn_state_from_any_phase() {
        let (mut scheduler, ticket) = drawing("cat");
        scheduler.record_correct(Uuid::new_v4());

        let c = Uuid::new_v4();
        scheduler.record_correct(c);

        assert_eq!(scheduler.stop(), Some(ticket));
        assert!(!scheduler.has_guessed(&c));
        assert_eq!(scheduler.phase(), GamePhase::Idle);
        assert_eq!(scheduler.drawer_index(), 0);
        assert_eq!(scheduler.word(), None);
        assert_eq!(scheduler.guessed_count(), 0);

        assert_eq!(scheduler.stop(), None);
        assert_eq!(scheduler.phase(), GamePhase::Idle);
    }

    #[test]
    fn all_guessed_counts_non_drawers() {
        let (mut scheduler, _) = drawing("cat");
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        assert!(scheduler.record_correct(b));
        assert!(!scheduler.record_correct(b));
        assert!(scheduler.has_guessed(&b));
        assert!(!scheduler.has_guessed(&c));
        assert!(!scheduler.all_guessed(3));
        assert!(scheduler.record_correct(c));
        assert!(scheduler.all_guessed(3));
    }

    #[test]
    fn departed_guesser_is_forgotten() {
        let (mut scheduler, _) = drawing("cat");
        let b = Uuid::new_v4();
        scheduler.record_correct(b);

        assert!(!scheduler.player_removed(1, &b));
        assert!(!scheduler.has_guessed(&b));
        assert_eq!(scheduler.guessed_count(), 0);
    }

    #[test]
    fn removal_before_drawer_keeps_same_drawer() {
        let mut scheduler = TurnScheduler::new();
        scheduler.start().unwrap();
        scheduler.choose_word("cat".into()).unwrap();
        scheduler.finish_turn(TurnEndReason::TimeUp, 3).unwrap();
        scheduler.choose_word("dog".into()).unwrap();
        scheduler.finish_turn(TurnEndReason::TimeUp, 3).unwrap();
        assert_eq!(scheduler.drawer_index(), 2);

        assert!(!scheduler.player_removed(0, &Uuid::new_v4()));
        assert_eq!(scheduler.drawer_index(), 1);
    }

    #[test]
    fn drawer_leaving_hands_turn_to_next_slot() {
        let (mut scheduler, ticket) = drawing("cat");
        let drawer = Uuid::new_v4();

        assert!(scheduler.player_removed(0, &drawer));
        let next = scheduler.finish_turn(TurnEndReason::DrawerLeft, 2).unwrap();
        assert_eq!(next, NextTurn::Announced { drawer_index: 0 });
        assert!(!scheduler.is_armed(ticket));
    }

    #[test]
    fn last_slot_drawer_leaving_wraps_to_first() {
        let mut scheduler = TurnScheduler::new();
        scheduler.start().unwrap();
        scheduler.choose_word("cat".into()).unwrap();
        scheduler.finish_turn(TurnEndReason::TimeUp, 3).unwrap();
        scheduler.choose_word("dog".into()).unwrap();
        scheduler.finish_turn(TurnEndReason::TimeUp, 3).unwrap();

        assert!(scheduler.player_removed(2, &Uuid::new_v4()));
        let next = scheduler.finish_turn(TurnEndReason::DrawerLeft, 2).unwrap();
        assert_eq!(next, NextTurn::Announced { drawer_index: 0 });
    }
}
