use std::{collections::VecDeque, time::SystemTime};

use crate::{
    error::SessionError,
    state::{
        roster::{PlayerId, Roster},
        scheduler::TurnScheduler,
    },
};

/// One line of the chat/guess feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    /// Message text as it should be displayed.
    pub text: String,
    /// Player the entry originates from.
    pub guesser: Option<PlayerId>,
    /// Whether the entry records a correct guess.
    pub correct: bool,
    /// When the entry was appended.
    pub sent_at: SystemTime,
}

/// Append-only chat/guess history bounded to the most recent entries.
#[derive(Debug, Clone)]
pub struct ChatLog {
    entries: VecDeque<ChatEntry>,
    capacity: usize,
}

impl ChatLog {
    /// Create a log keeping at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest one when full.
    pub fn push(&mut self, entry: ChatEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries from oldest to newest.
    pub fn entries(&self) -> impl Iterator<Item = &ChatEntry> {
        self.entries.iter()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been logged yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How a submitted message was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No word is in play; the message is plain chat.
    Chat,
    /// The message does not match the secret word.
    Incorrect,
    /// First correct guess of this player for the current turn.
    Correct,
    /// The player already found the word this turn.
    AlreadyCredited,
    /// The drawer typed their own word; relayed but never credited.
    DrawerWord,
}

/// Outcome of evaluating one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// How the message was judged.
    pub verdict: Verdict,
    /// Every non-drawer has now found the word.
    pub turn_complete: bool,
}

impl Evaluation {
    fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            turn_complete: false,
        }
    }

    /// The message matches the secret word.
    pub fn is_correct_now(&self) -> bool {
        matches!(self.verdict, Verdict::Correct | Verdict::AlreadyCredited)
    }

    /// The guesser had already been credited earlier in the turn.
    pub fn already_credited(&self) -> bool {
        self.verdict == Verdict::AlreadyCredited
    }
}

/// Judges guesses against the secret word and credits points.
#[derive(Debug, Clone)]
pub struct GuessEvaluator {
    points: u32,
    log: ChatLog,
}

impl GuessEvaluator {
    /// Build an evaluator awarding `points` per correct guess.
    pub fn new(points: u32, history_limit: usize) -> Self {
        Self {
            points,
            log: ChatLog::new(history_limit),
        }
    }

    /// Chat/guess history.
    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    /// Judge `text` sent by `guesser`.
    ///
    /// Matching is case-insensitive and exact; surrounding whitespace is
    /// significant. A player is credited at most once per turn and the
    /// drawer is never credited. Every message except a repeated or first
    /// correct guess is logged verbatim.
    pub fn evaluate(
        &mut self,
        roster: &mut Roster,
        scheduler: &mut TurnScheduler,
        guesser: PlayerId,
        text: &str,
    ) -> Result<Evaluation, SessionError> {
        let position = roster
            .position(&guesser)
            .ok_or(SessionError::UnknownPlayer(guesser))?;

        let Some(correct) = scheduler.word().map(|word| words_match(word, text)) else {
            self.log.push(chat_entry(text.to_string(), guesser, false));
            return Ok(Evaluation::new(Verdict::Chat));
        };

        if !correct {
            self.log.push(chat_entry(text.to_string(), guesser, false));
            return Ok(Evaluation::new(Verdict::Incorrect));
        }

        if position == scheduler.drawer_index() {
            self.log.push(chat_entry(text.to_string(), guesser, false));
            return Ok(Evaluation::new(Verdict::DrawerWord));
        }

        if !scheduler.record_correct(guesser) {
            return Ok(Evaluation::new(Verdict::AlreadyCredited));
        }

        roster.award_points(&guesser, self.points);
        let name = roster
            .find(&guesser)
            .map(|player| player.name.as_str())
            .unwrap_or_default();
        self.log.push(chat_entry(
            format!("{name} guessed the right word"),
            guesser,
            true,
        ));

        Ok(Evaluation {
            verdict: Verdict::Correct,
            turn_complete: scheduler.all_guessed(roster.size()),
        })
    }
}

fn chat_entry(text: String, guesser: PlayerId, correct: bool) -> ChatEntry {
    ChatEntry {
        text,
        guesser: Some(guesser),
        correct,
        sent_at: SystemTime::now(),
    }
}

fn words_match(word: &str, guess: &str) -> bool {
    word.to_lowercase() == guess.to_lowercase()
}
