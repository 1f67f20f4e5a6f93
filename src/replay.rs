//! Game recording and replay.
//!
//! Games are deterministic given a seed, so a recording only needs:
//! - `seed: u64` - seeds dice, shuffles and AI choices
//! - `setup` and `settings` - what `init_game` was called with
//! - `commands` - every accepted command, AI moves included
//!
//! No state deltas are stored. To view command N, re-run from the start.
//! AI decisions are replayed as the commands they produced, so the AI never
//! runs during a replay and the AI random stream is not advanced.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{GameSettings, GameSetup};
use crate::error::{MapError, ReplayError};
use crate::game::{Command, Game, GameState, MapCatalog, MapDefinition};

/// Everything needed to reproduce a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    /// Game seed.
    pub seed: u64,
    /// Roster and placement override.
    pub setup: GameSetup,
    /// Settings the game was created with.
    pub settings: GameSettings,
    /// Accepted commands, in order.
    pub commands: Vec<Command>,
}

impl Recording {
    /// Save the recording as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ReplayError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a recording saved with [`Recording::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Replay every command and return the final game.
    ///
    /// # Errors
    ///
    /// Returns an error if the map is unknown, the setup is rejected, or a
    /// recorded command is rejected.
    pub fn replay(&self, catalog: &MapCatalog) -> Result<Game, ReplayError> {
        let mut engine = ReplayEngine::new(self.clone(), catalog)?;
        engine.run_to_end()?;
        Ok(engine.game)
    }
}

/// Steps through a recording.
#[derive(Debug)]
pub struct ReplayEngine {
    recording: Recording,
    map: Arc<MapDefinition>,
    game: Game,
    position: usize,
}

impl ReplayEngine {
    /// Start a replay just after `init_game`.
    ///
    /// # Errors
    ///
    /// Returns an error if the map is unknown or the setup is rejected.
    pub fn new(recording: Recording, catalog: &MapCatalog) -> Result<Self, ReplayError> {
        let map = catalog
            .get_map_by_id(&recording.settings.map_id)
            .ok_or_else(|| MapError::UnknownMap(recording.settings.map_id.clone()))?;
        let game = Self::initial_game(&recording, &map)?;
        Ok(Self {
            recording,
            map,
            game,
            position: 0,
        })
    }

    fn initial_game(recording: &Recording, map: &Arc<MapDefinition>) -> Result<Game, ReplayError> {
        let mut game = Game::new(Arc::clone(map), recording.settings.clone(), recording.seed);
        game.init_game(&recording.setup)?;
        Ok(game)
    }

    /// The recording.
    #[must_use]
    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// The game as of the current position.
    #[must_use]
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// The state as of the current position.
    #[must_use]
    pub fn state(&self) -> &GameState {
        self.game.state()
    }

    /// Commands applied so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether every command has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.position >= self.recording.commands.len()
    }

    /// Apply the next command. Returns `false` at the end of the recording.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Diverged`] if the command is rejected.
    pub fn step_forward(&mut self) -> Result<bool, ReplayError> {
        let Some(command) = self.recording.commands.get(self.position) else {
            return Ok(false);
        };
        if !self.game.apply(command) {
            return Err(ReplayError::Diverged {
                index: self.position,
                command: format!("{command:?}"),
            });
        }
        self.position += 1;
        Ok(true)
    }

    /// Apply every remaining command.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Diverged`] if a command is rejected.
    pub fn run_to_end(&mut self) -> Result<(), ReplayError> {
        while self.step_forward()? {}
        Ok(())
    }

    /// Rewind to just after `init_game`.
    ///
    /// # Errors
    ///
    /// Returns an error if the recorded setup is rejected.
    pub fn rewind(&mut self) -> Result<(), ReplayError> {
        self.game = Self::initial_game(&self.recording, &self.map)?;
        self.position = 0;
        Ok(())
    }

    /// Re-run from the start until `position` commands have been applied.
    ///
    /// # Errors
    ///
    /// Returns an error if a command is rejected on the way.
    pub fn goto(&mut self, position: usize) -> Result<(), ReplayError> {
        if position < self.position {
            self.rewind()?;
        }
        while self.position < position && self.step_forward()? {}
        Ok(())
    }

    /// Re-run from the start until the game reaches `turn` or the recording ends.
    ///
    /// # Errors
    ///
    /// Returns an error if a command is rejected on the way.
    pub fn goto_turn(&mut self, turn: u32) -> Result<(), ReplayError> {
        self.rewind()?;
        while self.game.state().turn < turn && self.step_forward()? {}
        Ok(())
    }
}
