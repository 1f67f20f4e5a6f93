//! CLI command implementations for Conquest.

pub(crate) mod maps;
pub(crate) mod replay;
pub(crate) mod run;
pub(crate) mod tournament;

mod output;

use clap::ValueEnum;
use conquest::game::{MAX_PLAYERS, MIN_PLAYERS};
use conquest::{AttackMode, GameSettings, GameSetup, PlacementMode};
use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Output format for the `run` and `replay` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `tournament` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TournamentFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// Placement mode flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum PlacementArg {
    /// Deal territories at random.
    Random,
    /// Claim territories one at a time.
    Sequential,
}

impl From<PlacementArg> for PlacementMode {
    fn from(arg: PlacementArg) -> Self {
        match arg {
            PlacementArg::Random => Self::Random,
            PlacementArg::Sequential => Self::Sequential,
        }
    }
}

/// Attack mode flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum AttackArg {
    /// One dice round per attack.
    Single,
    /// Fight each battle to the end.
    Instant,
}

impl From<AttackArg> for AttackMode {
    fn from(arg: AttackArg) -> Self {
        match arg {
            AttackArg::Single => Self::Single,
            AttackArg::Instant => Self::Instant,
        }
    }
}

/// Options shared by every command that starts games.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GameOptions {
    /// Number of AI players (2-8)
    #[arg(short, long, default_value = "4")]
    pub(crate) players: usize,

    /// Map id (default: from settings, else classic)
    #[arg(short, long)]
    pub(crate) map: Option<String>,

    /// Initial placement mode
    #[arg(long)]
    pub(crate) placement: Option<PlacementArg>,

    /// Attack resolution mode
    #[arg(long)]
    pub(crate) attack_mode: Option<AttackArg>,

    /// Settings file (.json); flags override its values
    #[arg(long)]
    pub(crate) settings: Option<PathBuf>,
}

impl GameOptions {
    /// Resolve the settings file and flags into settings and an all-AI setup.
    pub(crate) fn resolve(&self) -> Result<(GameSettings, GameSetup), CliError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.players) {
            return Err(CliError::new(format!(
                "Player count must be between {MIN_PLAYERS} and {MAX_PLAYERS}, got {}",
                self.players
            )));
        }

        let mut settings = match &self.settings {
            Some(path) => GameSettings::from_json_file(path)?,
            None => GameSettings::default(),
        };
        if let Some(map) = &self.map {
            settings.map_id.clone_from(map);
        }
        if let Some(placement) = self.placement {
            settings.placement_mode = placement.into();
        }
        if let Some(attack) = self.attack_mode {
            settings.attack_mode = attack.into();
        }

        Ok((settings, GameSetup::numbered_ai(self.players)))
    }
}

/// Seed from the clock, for runs that did not ask for one.
pub(crate) fn clock_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()))
        .unwrap_or(42)
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}

impl From<conquest::MapError> for CliError {
    fn from(e: conquest::MapError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<conquest::ConfigError> for CliError {
    fn from(e: conquest::ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<conquest::ReplayError> for CliError {
    fn from(e: conquest::ReplayError) -> Self {
        Self::new(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(players: usize) -> GameOptions {
        GameOptions {
            players,
            map: Some("duel".to_string()),
            placement: Some(PlacementArg::Sequential),
            attack_mode: None,
            settings: None,
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let (settings, setup) = options(3).resolve().unwrap();
        assert_eq!(settings.map_id, "duel");
        assert_eq!(settings.placement_mode, PlacementMode::Sequential);
        assert_eq!(settings.attack_mode, AttackMode::Single);
        assert_eq!(setup.names.len(), 3);
    }

    #[test]
    fn test_player_count_checked() {
        assert!(options(1).resolve().is_err());
        assert!(options(9).resolve().is_err());
    }
}
