//! Game settings and setup records.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Map used when nothing else is selected.
pub const DEFAULT_MAP_ID: &str = "classic";

/// How territories are assigned at game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementMode {
    /// Shuffle territories and deal them round-robin with one army each.
    #[default]
    Random,
    /// Players claim neutrals one at a time, then spend a fixed reserve.
    Sequential,
}

/// How far a single `execute_attack` call resolves a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackMode {
    /// One dice round per call.
    #[default]
    Single,
    /// Keep rolling until the defender falls or the attacker is down to one army.
    Instant,
}

/// Resource level preference. Stored and persisted; no rule reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceLevel {
    /// Scarce.
    Low,
    /// Default.
    #[default]
    Standard,
    /// Plentiful.
    High,
}

/// User-facing game configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameSettings {
    /// Initial distribution mode.
    pub placement_mode: PlacementMode,
    /// Attack resolution speed.
    pub attack_mode: AttackMode,
    /// Resource level preference.
    pub resource_level: ResourceLevel,
    /// Selected map variant.
    pub map_id: String,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            placement_mode: PlacementMode::default(),
            attack_mode: AttackMode::default(),
            resource_level: ResourceLevel::default(),
            map_id: DEFAULT_MAP_ID.to_string(),
        }
    }
}

impl GameSettings {
    /// Parse settings from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON.
    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(data)?)
    }

    /// Read settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid settings JSON.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }
}

/// Arguments to `init_game`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameSetup {
    /// Player names in seating order.
    pub names: Vec<String>,
    /// The first `human_count` seats are human; the rest are AI.
    pub human_count: usize,
    /// Overrides the settings' placement mode for this game.
    pub placement_override: Option<PlacementMode>,
    /// Per-seat colour overrides; `None` keeps the palette colour.
    pub custom_colors: Vec<Option<String>>,
}

impl GameSetup {
    /// Setup with the given names, all AI-controlled.
    #[must_use]
    pub fn ai_only(names: Vec<String>) -> Self {
        Self {
            names,
            ..Self::default()
        }
    }

    /// Setup with `count` AI players named `AI 1`, `AI 2`, ...
    #[must_use]
    pub fn numbered_ai(count: usize) -> Self {
        Self::ai_only((1..=count).map(|i| format!("AI {i}")).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = GameSettings::default();
        assert_eq!(settings.placement_mode, PlacementMode::Random);
        assert_eq!(settings.attack_mode, AttackMode::Single);
        assert_eq!(settings.map_id, "classic");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings =
            GameSettings::from_json_str(r#"{"placementMode":"sequential","mapId":"duel"}"#)
                .unwrap();
        assert_eq!(settings.placement_mode, PlacementMode::Sequential);
        assert_eq!(settings.attack_mode, AttackMode::Single);
        assert_eq!(settings.resource_level, ResourceLevel::Standard);
        assert_eq!(settings.map_id, "duel");
    }

    #[test]
    fn test_malformed_json() {
        let err = GameSettings::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = GameSettings::from_json_file(Path::new("/nonexistent/settings.json"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_numbered_ai() {
        let setup = GameSetup::numbered_ai(3);
        assert_eq!(setup.names, vec!["AI 1", "AI 2", "AI 3"]);
        assert_eq!(setup.human_count, 0);
        assert!(setup.placement_override.is_none());
    }
}
