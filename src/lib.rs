// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Conquest: a deterministic rules engine for turn-based territorial conquest.
//!
//! This crate provides:
//! - Map definitions with continents and validated adjacency
//! - A phase state machine (placement, draft, attack, fortify)
//! - Dice combat, card sets and forced redemption
//! - A rule-following AI that issues ordinary commands
//! - Snapshots, command recordings and step-through replay
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Engine (scheduling, save/load)    │
//! ├─────────────────────────────────────┤
//! │     AI policy   │   Replay          │
//! ├─────────────────────────────────────┤
//! │   Game rules (commands -> state)    │
//! └─────────────────────────────────────┘
//! ```
//!
//! Every random draw comes from a seeded stream stored in the game state, so
//! a seed plus the accepted commands reproduce a game exactly.

pub mod ai;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod persistence;
pub mod replay;
pub mod rng;
pub mod schedule;

pub use config::{AttackMode, GameSettings, GameSetup, PlacementMode, ResourceLevel};
pub use engine::Engine;
pub use error::{ConfigError, MapError, PersistenceError, ReplayError, SetupError};

// Re-export key game types at crate root for convenience
pub use game::{
    Command, Game, GameState, MapCatalog, MapDefinition, Phase, Player, PlayerId, TerritoryState,
};
pub use replay::{Recording, ReplayEngine};
