use indexmap::IndexMap;
use uuid::Uuid;

use crate::error::SessionError;

/// Opaque identifier of a connected player (one per WebSocket connection).
pub type PlayerId = Uuid;

/// Player tracked by the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Connection identity the player joined with.
    pub id: PlayerId,
    /// Display name chosen by the player.
    pub name: String,
    /// Avatar reference supplied by the client (URL or preset key).
    pub avatar: String,
    /// Accumulated score, never decreases while the player stays connected.
    pub score: u32,
}

/// A player removed from the roster together with the slot it occupied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// Turn-order index the player had before removal.
    pub index: usize,
    /// The removed player.
    pub player: Player,
}

/// Ordered set of connected players. Insertion order is turn order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: IndexMap<PlayerId, Player>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new player with a zero score.
    pub fn join(
        &mut self,
        id: PlayerId,
        name: String,
        avatar: String,
    ) -> Result<Player, SessionError> {
        if self.players.contains_key(&id) {
            return Err(SessionError::DuplicateIdentity(id));
        }

        let player = Player {
            id,
            name,
            avatar,
            score: 0,
        };
        self.players.insert(id, player.clone());
        Ok(player)
    }

    /// Remove the player with `id`, compacting the turn order.
    ///
    /// Returns `None` when nobody with that identity is registered.
    pub fn leave(&mut self, id: &PlayerId) -> Option<Departure> {
        self.players
            .shift_remove_full(id)
            .map(|(index, _, player)| Departure { index, player })
    }

    /// Look a player up by identity.
    pub fn find(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Turn-order position of the player with `id`.
    pub fn position(&self, id: &PlayerId) -> Option<usize> {
        self.players.get_index_of(id)
    }

    /// Player sitting at turn-order position `index`.
    pub fn at(&self, index: usize) -> Option<&Player> {
        self.players.get_index(index).map(|(_, player)| player)
    }

    /// Number of connected players.
    pub fn size(&self) -> usize {
        self.players.len()
    }

    /// Whether the roster has no players.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players in turn order.
    pub fn all(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Owned copy of every player, in turn order.
    pub fn snapshot(&self) -> Vec<Player> {
        self.players.values().cloned().collect()
    }

    /// Add `amount` to the player's score. Unknown identities are ignored.
    pub fn award_points(&mut self, id: &PlayerId, amount: u32) {
        if let Some(player) = self.players.get_mut(id) {
            player.score = player.score.saturating_add(amount);
        }
    }
}
