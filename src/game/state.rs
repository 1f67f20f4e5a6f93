//! Game state data.
//!
//! [`GameState`] is the complete, serialisable record of a game in progress.
//! It holds no reference to the map; rules that need adjacency or continents
//! live on [`crate::game::Game`], which pairs a state with its map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::GameSettings;
use crate::game::{BattleResult, Card, History, MapDefinition, Player, PlayerId};
use crate::rng::{AI_STREAM, GameRng};

/// Top-level phase of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No game initialised yet.
    Setup,
    /// Sequential-mode claiming and reserve distribution.
    Placement,
    /// Reinforcement.
    Draft,
    /// Combat.
    Attack,
    /// One transfer, then the turn ends.
    Fortify,
}

/// Sub-stage of [`Phase::Placement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementStage {
    /// Players take turns claiming neutral territories.
    Claim,
    /// Players spend their reserves on territories they own.
    Distribute,
}

/// Dynamic state of one territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritoryState {
    /// Territory id.
    pub id: String,
    /// Owning player; `None` is neutral.
    pub owner: Option<PlayerId>,
    /// Armies stationed here.
    pub armies: u32,
}

impl TerritoryState {
    /// A neutral, empty territory.
    #[must_use]
    pub fn neutral(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner: None,
            armies: 0,
        }
    }

    /// Whether `player` owns this territory.
    #[must_use]
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }
}

/// Complete game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Id of the map this game is played on.
    pub selected_map: String,
    /// Roster in seating order; index equals [`Player::id`].
    pub players: Vec<Player>,
    /// Territory states keyed by id (iteration is lexicographic).
    pub territories: BTreeMap<String, TerritoryState>,
    /// Current phase.
    pub phase: Phase,
    /// Placement sub-stage; `None` outside [`Phase::Placement`].
    pub placement_stage: Option<PlacementStage>,
    /// Seat whose turn it is.
    pub current_player_index: usize,
    /// Turn counter. 0 during placement, 1 for the first full round.
    pub turn: u32,
    /// Armies left to place in the current draft (or reserve during distribution).
    pub draft_armies: u32,
    /// Selected attacking territory.
    pub attack_from: Option<String>,
    /// Selected defending territory.
    pub attack_to: Option<String>,
    /// Most recent dice round.
    pub last_battle_result: Option<BattleResult>,
    /// Selected fortify source.
    pub fortify_from: Option<String>,
    /// Selected fortify destination.
    pub fortify_to: Option<String>,
    /// Undrawn cards; the top of the deck is the end of the vector.
    pub cards_deck: Vec<Card>,
    /// Whether the current player conquered anything this turn.
    pub conquest_made_this_turn: bool,
    /// Whether the current player has placed a draft army this turn.
    pub draft_has_placed: bool,
    /// Game configuration.
    pub settings: GameSettings,
    /// Action log.
    pub history: History,
    /// Per-seat armies still to place during sequential placement.
    pub placement_reserves: Vec<u32>,
    /// Seed every random stream was derived from.
    pub seed: u64,
    /// Rules random stream (dice, shuffles).
    pub rng: GameRng,
    /// AI choice stream.
    pub ai_rng: GameRng,
    /// Bumped whenever phase, placement stage, current player or turn changes.
    pub generation: u64,
}

impl GameState {
    /// Fresh setup-phase state for `map`: every territory neutral and empty.
    #[must_use]
    pub fn new(map: &MapDefinition, settings: GameSettings, seed: u64) -> Self {
        Self {
            selected_map: map.id().to_string(),
            players: Vec::new(),
            territories: neutral_territories(map),
            phase: Phase::Setup,
            placement_stage: None,
            current_player_index: 0,
            turn: 0,
            draft_armies: 0,
            attack_from: None,
            attack_to: None,
            last_battle_result: None,
            fortify_from: None,
            fortify_to: None,
            cards_deck: Vec::new(),
            conquest_made_this_turn: false,
            draft_has_placed: false,
            settings,
            history: History::default(),
            placement_reserves: Vec::new(),
            seed,
            rng: GameRng::seeded(seed),
            ai_rng: GameRng::stream(seed, AI_STREAM),
            generation: 0,
        }
    }

    /// Get a player by id.
    #[must_use]
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(usize::from(id))
    }

    /// Get a mutable reference to a player by id.
    #[must_use]
    pub fn get_player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(usize::from(id))
    }

    /// The player whose turn it is.
    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    /// Id of the player whose turn it is.
    #[must_use]
    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.current_player().map(|p| p.id)
    }

    /// Get all alive players.
    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.alive)
    }

    /// Territory state by id.
    #[must_use]
    pub fn territory(&self, id: &str) -> Option<&TerritoryState> {
        self.territories.get(id)
    }

    /// Territories owned by `player`, in id order.
    pub fn territories_owned_by(&self, player: PlayerId) -> impl Iterator<Item = &TerritoryState> {
        self.territories
            .values()
            .filter(move |t| t.is_owned_by(player))
    }

    /// Number of territories owned by `player`.
    #[must_use]
    pub fn count_territories(&self, player: PlayerId) -> usize {
        self.territories_owned_by(player).count()
    }

    /// Sum of armies across `player`'s territories.
    #[must_use]
    pub fn total_armies(&self, player: PlayerId) -> u32 {
        self.territories_owned_by(player).map(|t| t.armies).sum()
    }

    /// Neutral territories, in id order.
    pub fn neutral_territories(&self) -> impl Iterator<Item = &TerritoryState> {
        self.territories.values().filter(|t| t.owner.is_none())
    }

    /// Whether a conquering round is waiting for its conquest move.
    #[must_use]
    pub fn conquest_pending(&self) -> bool {
        self.attack_to.is_some()
            && self
                .last_battle_result
                .as_ref()
                .is_some_and(|r| r.conquered)
    }

    /// Clear every attack and fortify selection.
    pub fn clear_selections(&mut self) {
        self.attack_from = None;
        self.attack_to = None;
        self.last_battle_result = None;
        self.fortify_from = None;
        self.fortify_to = None;
    }
}

/// Neutral, empty state for every territory on a map.
#[must_use]
pub fn neutral_territories(map: &MapDefinition) -> BTreeMap<String, TerritoryState> {
    map.territories()
        .iter()
        .map(|t| (t.id.clone(), TerritoryState::neutral(t.id.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::duel_map;

    #[test]
    fn test_game_state_creation() {
        let map = duel_map().unwrap();
        let state = GameState::new(&map, GameSettings::default(), 1);

        assert_eq!(state.phase, Phase::Setup);
        assert_eq!(state.turn, 0);
        assert_eq!(state.territories.len(), 8);
        assert!(state.territories.values().all(|t| t.owner.is_none() && t.armies == 0));
        assert!(state.current_player().is_none());
        assert!(!state.conquest_pending());
    }

    #[test]
    fn test_territories_iterate_sorted() {
        let map = duel_map().unwrap();
        let state = GameState::new(&map, GameSettings::default(), 1);
        let ids: Vec<&str> = state.territories.keys().map(String::as_str).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_ownership_queries() {
        let map = duel_map().unwrap();
        let mut state = GameState::new(&map, GameSettings::default(), 1);
        state.players.push(Player::new(0, "A", "#f00", true));

        for id in ["harbor", "mill"] {
            let t = state.territories.get_mut(id).unwrap();
            t.owner = Some(0);
            t.armies = 3;
        }

        assert_eq!(state.count_territories(0), 2);
        assert_eq!(state.total_armies(0), 6);
        assert_eq!(state.neutral_territories().count(), 6);
    }

    #[test]
    fn test_snapshot_field_names() {
        let map = duel_map().unwrap();
        let state = GameState::new(&map, GameSettings::default(), 1);
        let json = serde_json::to_value(&state).unwrap();

        for key in [
            "selectedMap",
            "players",
            "territories",
            "phase",
            "currentPlayerIndex",
            "turn",
            "draftArmies",
            "attackFrom",
            "attackTo",
            "lastBattleResult",
            "fortifyFrom",
            "fortifyTo",
            "cardsDeck",
            "conquestMadeThisTurn",
            "draftHasPlaced",
            "settings",
            "history",
            "placementReserves",
            "placementStage",
        ] {
            assert!(json.get(key).is_some(), "missing snapshot field {key}");
        }
    }
}
