//! Public engine surface.
//!
//! [`Engine`] is what a UI drives. It owns the map catalog, the live
//! [`Game`], the queue of deferred AI steps and the journal of accepted
//! commands. Rule violations come back as `false`; configuration and
//! persistence failures are logged and also come back as `false`, leaving the
//! engine as it was.

use std::sync::Arc;

use crate::ai::{self, CommandSink};
use crate::config::{GameSettings, GameSetup};
use crate::error::MapError;
use crate::game::{Command, Game, GameState, HistoryEntry, MapCatalog, PlayerId, TerritoryState};
use crate::persistence::{self, SaveStore};
use crate::replay::Recording;
use crate::rng::GameRng;
use crate::schedule::{Task, TaskQueue};

/// Game engine with deferred AI scheduling.
#[derive(Debug)]
pub struct Engine {
    catalog: MapCatalog,
    game: Game,
    tasks: TaskQueue,
    journal: Vec<Command>,
    setup: Option<GameSetup>,
    /// Settings the current game was created with, before any setup override.
    base_settings: GameSettings,
}

/// Sink that journals what the AI submits.
struct JournalingSink<'a> {
    game: &'a mut Game,
    journal: &'a mut Vec<Command>,
}

impl CommandSink for JournalingSink<'_> {
    fn game(&self) -> &Game {
        self.game
    }

    fn submit(&mut self, command: Command) -> bool {
        let accepted = self.game.apply(&command);
        if accepted {
            self.journal.push(command);
        }
        accepted
    }

    fn ai_rng(&mut self) -> &mut GameRng {
        self.game.ai_rng_mut()
    }
}

impl Engine {
    /// Engine on the map named by `settings.map_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::UnknownMap`] if the catalog has no such map.
    pub fn new(catalog: MapCatalog, settings: GameSettings, seed: u64) -> Result<Self, MapError> {
        let map = catalog
            .get_map_by_id(&settings.map_id)
            .ok_or_else(|| MapError::UnknownMap(settings.map_id.clone()))?;
        Ok(Self {
            catalog,
            game: Game::new(map, settings.clone(), seed),
            tasks: TaskQueue::new(),
            journal: Vec::new(),
            setup: None,
            base_settings: settings,
        })
    }

    /// Engine over the built-in maps.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::UnknownMap`] if `settings.map_id` is not built in.
    pub fn with_builtin_maps(settings: GameSettings, seed: u64) -> Result<Self, MapError> {
        Self::new(MapCatalog::builtin(), settings, seed)
    }

    /// The map catalog.
    #[must_use]
    pub fn catalog(&self) -> &MapCatalog {
        &self.catalog
    }

    /// The live game.
    #[must_use]
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// The live state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        self.game.state()
    }

    /// Seed of the current game.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.game.state().seed
    }

    /// Commands accepted since the game started.
    #[must_use]
    pub fn journal(&self) -> &[Command] {
        &self.journal
    }

    /// Number of deferred tasks waiting.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Switch to another map, discarding the current game.
    ///
    /// Unknown ids are logged and leave the engine untouched.
    pub fn set_map(&mut self, map_id: &str) -> bool {
        let Some(map) = self.catalog.get_map_by_id(map_id) else {
            tracing::warn!(target: "conquest::engine", map_id, "engine.unknown_map");
            return false;
        };
        self.base_settings.map_id = map_id.to_string();
        self.replace_game(Game::new(map, self.base_settings.clone(), self.seed()));
        tracing::info!(target: "conquest::engine", map_id, "engine.map_selected");
        true
    }

    /// Use a different seed for the next game.
    pub fn set_seed(&mut self, seed: u64) {
        let map = Arc::clone(self.game.map_handle());
        self.replace_game(Game::new(map, self.base_settings.clone(), seed));
    }

    /// Start a game.
    ///
    /// An invalid setup is logged and leaves the engine untouched.
    pub fn init_game(&mut self, setup: &GameSetup) -> bool {
        let map = Arc::clone(self.game.map_handle());
        let mut game = Game::new(map, self.base_settings.clone(), self.seed());
        if let Err(err) = game.init_game(setup) {
            tracing::warn!(target: "conquest::engine", error = %err, "engine.invalid_setup");
            return false;
        }
        self.replace_game(game);
        self.setup = Some(setup.clone());
        self.schedule_ai();
        true
    }

    /// Return to the setup phase, cancelling pending work.
    pub fn reset(&mut self) {
        let dropped = self.tasks.cancel_all();
        self.game.reset();
        self.journal.clear();
        self.setup = None;
        tracing::debug!(target: "conquest::engine", dropped, "engine.reset");
    }

    fn replace_game(&mut self, game: Game) {
        let dropped = self.tasks.cancel_all();
        if dropped > 0 {
            tracing::debug!(target: "conquest::engine", dropped, "schedule.cancelled");
        }
        self.game = game;
        self.journal.clear();
        self.setup = None;
    }

    /// Apply a command, journal it and schedule any AI follow-up.
    pub fn dispatch(&mut self, command: Command) -> bool {
        let accepted = self.game.apply(&command);
        if accepted {
            self.journal.push(command);
            self.schedule_ai();
        }
        accepted
    }

    fn schedule_ai(&mut self) {
        if !self.game.is_ai_turn() {
            return;
        }
        if let Some(player) = self.game.state().current_player_id() {
            self.tasks
                .schedule(Task::AiStep { player }, self.game.generation());
        }
    }

    // Commands.

    /// Claim, reinforce or draft one army, depending on phase.
    pub fn place_army(&mut self, territory: &str) -> bool {
        self.dispatch(Command::PlaceArmy {
            territory: territory.to_string(),
        })
    }

    /// Draft one army; accepted only during the draft phase.
    pub fn place_draft_army(&mut self, territory: &str) -> bool {
        self.state().phase == crate::game::Phase::Draft && self.place_army(territory)
    }

    /// Redeem the best card set before placing any draft army.
    pub fn redeem_cards(&mut self) -> bool {
        self.dispatch(Command::RedeemCards)
    }

    /// Choose the attacking territory.
    pub fn select_attack_from(&mut self, territory: &str) -> bool {
        self.dispatch(Command::SelectAttackFrom {
            territory: territory.to_string(),
        })
    }

    /// Choose the defending territory.
    pub fn select_attack_to(&mut self, territory: &str) -> bool {
        self.dispatch(Command::SelectAttackTo {
            territory: territory.to_string(),
        })
    }

    /// Roll for the selected attack.
    pub fn execute_attack(&mut self, attacker_dice: u32, defender_dice: u32) -> bool {
        self.dispatch(Command::Attack {
            attacker_dice,
            defender_dice,
        })
    }

    /// Move armies into the territory just conquered.
    pub fn conquest_move(&mut self, armies: u32) -> bool {
        self.dispatch(Command::ConquestMove { armies })
    }

    /// Stop attacking.
    pub fn end_attack_phase(&mut self) -> bool {
        self.dispatch(Command::EndAttack)
    }

    /// Choose the fortify source.
    pub fn select_fortify_from(&mut self, territory: &str) -> bool {
        self.dispatch(Command::SelectFortifyFrom {
            territory: territory.to_string(),
        })
    }

    /// Choose the fortify destination.
    pub fn select_fortify_to(&mut self, territory: &str) -> bool {
        self.dispatch(Command::SelectFortifyTo {
            territory: territory.to_string(),
        })
    }

    /// Fortify and end the turn.
    pub fn execute_fortify(&mut self, armies: u32) -> bool {
        self.dispatch(Command::Fortify { armies })
    }

    // AI.

    /// Let the current AI player handle its decision point now.
    pub fn play_ai_turn(&mut self) -> bool {
        let mut sink = JournalingSink {
            game: &mut self.game,
            journal: &mut self.journal,
        };
        let progressed = ai::play_turn(&mut sink);
        if progressed {
            self.schedule_ai();
        }
        progressed
    }

    /// Run up to `limit` deferred AI steps.
    ///
    /// Stale tasks and tasks whose preconditions no longer hold are dropped
    /// without counting against the limit. Returns the steps executed.
    pub fn run_pending(&mut self, limit: usize) -> usize {
        let mut executed = 0;
        while executed < limit {
            let Some(scheduled) = self.tasks.pop() else {
                break;
            };
            let generation = self.game.generation();
            if scheduled.generation != generation {
                tracing::debug!(
                    target: "conquest::engine",
                    task = ?scheduled.task,
                    scheduled = scheduled.generation,
                    live = generation,
                    "schedule.stale_task_dropped"
                );
                continue;
            }
            match scheduled.task {
                Task::AiStep { player } => {
                    if !self.game.is_ai_turn()
                        || self.game.state().current_player_id() != Some(player)
                    {
                        tracing::debug!(target: "conquest::engine", player, "schedule.task_invalid");
                        continue;
                    }
                    executed += 1;
                    if !self.play_ai_turn() {
                        tracing::warn!(
                            target: "conquest::engine",
                            player,
                            phase = ?self.game.state().phase,
                            "ai.no_progress"
                        );
                    }
                }
            }
        }
        executed
    }

    // Persistence.

    /// Save the live game to `slot`.
    pub fn save<S: SaveStore + ?Sized>(&self, store: &mut S, slot: &str) -> bool {
        match persistence::save_game(store, slot, &self.game) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(target: "conquest::engine", slot, error = %err, "engine.save_failed");
                false
            }
        }
    }

    /// Replace the live game with the one saved in `slot`.
    ///
    /// On any failure the live game is untouched.
    pub fn load<S: SaveStore + ?Sized>(&mut self, store: &S, slot: &str) -> bool {
        match persistence::load_game(store, slot, &self.catalog) {
            Ok(game) => {
                self.base_settings = game.state().settings.clone();
                self.base_settings.map_id = game.map().id().to_string();
                self.replace_game(game);
                self.schedule_ai();
                tracing::info!(target: "conquest::engine", slot, "engine.loaded");
                true
            }
            Err(err) => {
                tracing::warn!(target: "conquest::engine", slot, error = %err, "engine.load_failed");
                false
            }
        }
    }

    /// Recording of the current game, if it was started with [`Engine::init_game`].
    ///
    /// Games restored with [`Engine::load`] have no recording.
    #[must_use]
    pub fn recording(&self) -> Option<Recording> {
        let setup = self.setup.clone()?;
        Some(Recording {
            seed: self.seed(),
            setup,
            settings: self.base_settings.clone(),
            commands: self.journal.clone(),
        })
    }

    // Queries.

    /// Draft owed to the current player.
    #[must_use]
    pub fn calculate_draft_armies(&self) -> u32 {
        self.game.calculate_draft_armies()
    }

    /// Dynamic state of a territory.
    #[must_use]
    pub fn get_territory_state(&self, id: &str) -> Option<&TerritoryState> {
        self.game.get_territory_state(id)
    }

    /// Ids of territories owned by `player`.
    #[must_use]
    pub fn get_player_territories(&self, player: PlayerId) -> Vec<String> {
        self.game.get_player_territories(player)
    }

    /// Enemy neighbours of a territory.
    #[must_use]
    pub fn get_adjacent_enemy_territories(&self, id: &str) -> Vec<String> {
        self.game.get_adjacent_enemy_territories(id)
    }

    /// Refresh liveness and report the winner.
    pub fn check_win_condition(&mut self) -> Option<PlayerId> {
        self.game.check_win_condition()
    }

    /// The winner, if the game is over.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.game.winner()
    }

    /// Newest history entry.
    #[must_use]
    pub fn last_action(&self) -> Option<&HistoryEntry> {
        self.game.last_action()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlacementMode;
    use crate::game::Phase;
    use crate::persistence::MemoryStore;

    fn duel_engine(seed: u64) -> Engine {
        let settings = GameSettings {
            map_id: "duel".to_string(),
            ..GameSettings::default()
        };
        Engine::with_builtin_maps(settings, seed).unwrap()
    }

    #[test]
    fn test_unknown_map_is_rejected() {
        let mut engine = duel_engine(1);
        assert!(!engine.set_map("atlantis"));
        assert_eq!(engine.game().map().id(), "duel");
        assert!(engine.set_map("classic"));
        assert_eq!(engine.state().territories.len(), 42);

        let settings = GameSettings {
            map_id: "atlantis".to_string(),
            ..GameSettings::default()
        };
        assert!(Engine::with_builtin_maps(settings, 1).is_err());
    }

    #[test]
    fn test_invalid_setup_leaves_engine_untouched() {
        let mut engine = duel_engine(1);
        assert!(!engine.init_game(&GameSetup::numbered_ai(1)));
        assert_eq!(engine.state().phase, Phase::Setup);
        assert!(engine.recording().is_none());
    }

    #[test]
    fn test_ai_turn_is_deferred() {
        let mut engine = duel_engine(2);
        assert!(engine.init_game(&GameSetup::numbered_ai(2)));
        assert_eq!(engine.pending_tasks(), 1);
        assert_eq!(engine.state().current_player_index, 0);

        assert_eq!(engine.run_pending(1), 1);
        assert_eq!(engine.state().current_player_index, 1);
        assert!(!engine.journal().is_empty());
    }

    #[test]
    fn test_stale_task_is_dropped() {
        let mut engine = duel_engine(3);
        let setup = GameSetup {
            human_count: 1,
            ..GameSetup::numbered_ai(2)
        };
        assert!(engine.init_game(&setup));
        assert_eq!(engine.pending_tasks(), 0, "human moves first");

        // Queue a step for the AI, then let the human's turn move on under it.
        engine.tasks.schedule(Task::AiStep { player: 1 }, engine.game().generation());
        let own = engine.get_player_territories(0);
        while engine.state().current_player_index == 0 {
            assert!(engine.place_draft_army(&own[0]));
        }
        assert_eq!(engine.pending_tasks(), 2);

        assert_eq!(engine.run_pending(10), 1, "only the fresh task runs");
        assert_eq!(engine.state().current_player_index, 0);
    }

    #[test]
    fn test_reset_cancels_pending_tasks() {
        let mut engine = duel_engine(4);
        assert!(engine.init_game(&GameSetup::numbered_ai(2)));
        assert_eq!(engine.pending_tasks(), 1);

        engine.reset();
        assert_eq!(engine.pending_tasks(), 0);
        assert_eq!(engine.state().phase, Phase::Setup);
        assert_eq!(engine.run_pending(10), 0);
    }

    #[test]
    fn test_load_failure_keeps_state() {
        let mut engine = duel_engine(5);
        assert!(engine.init_game(&GameSetup::numbered_ai(2)));
        engine.run_pending(3);
        let before = engine.state().clone();

        let mut store = MemoryStore::new();
        store.write("broken", b"{\"version\":1}").unwrap();
        assert!(!engine.load(&store, "broken"));
        assert!(!engine.load(&store, "missing"));
        assert_eq!(engine.state(), &before);

        assert!(engine.save(&mut store, "good"));
        engine.run_pending(5);
        assert!(engine.load(&store, "good"));
        assert_eq!(engine.state(), &before);
        assert!(engine.recording().is_none());
    }

    #[test]
    fn test_sequential_engine_runs_placement() {
        let mut engine = duel_engine(6);
        let setup = GameSetup {
            placement_override: Some(PlacementMode::Sequential),
            ..GameSetup::numbered_ai(2)
        };
        assert!(engine.init_game(&setup));
        engine.run_pending(100);
        assert_ne!(engine.state().phase, Phase::Placement);
        let recording = engine.recording().unwrap();
        assert_eq!(recording.setup.placement_override, Some(PlacementMode::Sequential));
    }

    #[test]
    fn test_win_check_during_claim_keeps_seats() {
        let mut engine = duel_engine(6);
        let setup = GameSetup {
            placement_override: Some(PlacementMode::Sequential),
            ..GameSetup::numbered_ai(2)
        };
        assert!(engine.init_game(&setup));
        assert_eq!(engine.check_win_condition(), None);
        assert!(engine.state().players.iter().all(|p| p.alive));
        assert_eq!(engine.pending_tasks(), 1);

        assert!(engine.run_pending(500) > 0);
        assert_ne!(engine.state().phase, Phase::Placement);
        assert!(engine.state().territories.values().all(|t| t.owner.is_some()));
    }
}
