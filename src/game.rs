//! Game layer.
//!
//! Implements the rules of territorial conquest:
//! - Maps of territories grouped into bonus-carrying continents
//! - Players, their card hands and elimination
//! - Phase state machine (placement, draft, attack, fortify)
//! - Dice combat and card redemption
//! - Win detection and consistency checks

mod cards;
mod catalog;
mod combat;
mod command;
mod history;
pub mod invariants;
mod map;
mod player;
mod rules;
mod state;
mod victory;

pub use cards::{
    Card, CardKind, CardSet, FORCED_REDEMPTION_HAND, MAX_FORCED_REDEMPTIONS,
    WILD_CARDS_PER_DECK, best_set, build_deck, draw, redeem, shuffled_deck,
};
pub use catalog::{MapCatalog, classic_map, duel_map};
pub use combat::{
    BattleOutcome, BattleResult, MAX_ATTACKER_DICE, MAX_DEFENDER_DICE, MAX_INSTANT_ROUNDS,
    attacker_dice_count, compare_dice, defender_dice_count, resolve_battle, roll_dice,
    settle_round,
};
pub use command::{Command, reduce};
pub use history::{History, HistoryAction, HistoryEntry};
pub use invariants::{InvariantViolation, check_invariants, check_map_consistency};
pub use map::{Continent, MapDefinition, Territory};
pub use player::{MAX_PLAYERS, MIN_PLAYERS, PLAYER_COLORS, Player, PlayerId};
pub use rules::{Game, MIN_DRAFT_ARMIES, OPENING_DRAFT, SEQUENTIAL_RESERVE, TERRITORIES_PER_ARMY};
pub use state::{GameState, Phase, PlacementStage, TerritoryState, neutral_territories};
pub use victory::{check_win_condition, refresh_liveness, sole_owner};
