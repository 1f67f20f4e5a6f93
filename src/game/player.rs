//! Player roster entries.

use serde::{Deserialize, Serialize};

use crate::game::Card;

/// Seat index of a player in the roster.
pub type PlayerId = u8;

/// Minimum number of players in a game.
pub const MIN_PLAYERS: usize = 2;

/// Maximum number of players in a game.
pub const MAX_PLAYERS: usize = 8;

/// Default seat colours, cycled when no custom colour is given.
pub const PLAYER_COLORS: [&str; MAX_PLAYERS] = [
    "#e74c3c", "#3498db", "#2ecc71", "#f1c40f", "#9b59b6", "#e67e22", "#1abc9c", "#95a5a6",
];

/// State for a single player.
///
/// Eliminated players stay in the roster with `alive == false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Seat index; equals the player's position in the roster.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Display colour.
    pub color: String,
    /// Whether a human drives this seat.
    pub is_human: bool,
    /// Whether the player still owns at least one territory.
    pub alive: bool,
    /// Cards in hand, in the order they were received.
    pub cards: Vec<Card>,
}

impl Player {
    /// Create a new, living player with an empty hand.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>, color: impl Into<String>, is_human: bool) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            is_human,
            alive: true,
            cards: Vec::new(),
        }
    }

    /// Palette colour for a seat.
    #[must_use]
    pub fn default_color(seat: usize) -> &'static str {
        PLAYER_COLORS[seat % PLAYER_COLORS.len()]
    }

    /// Whether an AI drives this seat.
    #[must_use]
    pub const fn is_ai(&self) -> bool {
        !self.is_human
    }

    /// Eliminate this player.
    pub fn eliminate(&mut self) {
        self.alive = false;
    }

    /// Remove and return the whole hand.
    pub fn take_cards(&mut self) -> Vec<Card> {
        std::mem::take(&mut self.cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::CardKind;

    #[test]
    fn test_player_creation() {
        let player = Player::new(1, "Ada", "#fff", true);
        assert_eq!(player.id, 1);
        assert!(player.alive);
        assert!(player.is_human);
        assert!(!player.is_ai());
        assert!(player.cards.is_empty());
    }

    #[test]
    fn test_player_eliminate() {
        let mut player = Player::new(0, "Bot", "#000", false);
        player.eliminate();
        assert!(!player.alive);
    }

    #[test]
    fn test_take_cards_empties_hand() {
        let mut player = Player::new(0, "Bot", "#000", false);
        player.cards.push(Card::wild());
        player.cards.push(Card::new(CardKind::Cavalry, Some("peru".to_string())));

        let taken = player.take_cards();
        assert_eq!(taken.len(), 2);
        assert!(player.cards.is_empty());
    }

    #[test]
    fn test_default_color_cycles() {
        assert_eq!(Player::default_color(0), PLAYER_COLORS[0]);
        assert_eq!(Player::default_color(MAX_PLAYERS), PLAYER_COLORS[0]);
    }
}
