//! Error types for map data, setup, configuration and persistence.
//!
//! Illegal player actions are not errors: rule operations reject them by
//! returning `false` without touching state. The types here cover the
//! failures that happen at the engine's boundaries.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Problems with a territory graph definition.
#[derive(Debug, Error)]
pub enum MapError {
    /// No map with this identifier is registered.
    #[error("unknown map id `{0}`")]
    UnknownMap(String),
    /// The map has no territories.
    #[error("map `{0}` has no territories")]
    Empty(String),
    /// Two territories share an identifier.
    #[error("duplicate territory id `{0}`")]
    DuplicateTerritory(String),
    /// Two continents share an identifier.
    #[error("duplicate continent id `{0}`")]
    DuplicateContinent(String),
    /// A territory lists a neighbour that does not exist.
    #[error("territory `{territory}` lists unknown neighbour `{neighbor}`")]
    UnknownNeighbor {
        /// Territory holding the bad reference.
        territory: String,
        /// The missing neighbour id.
        neighbor: String,
    },
    /// A territory lists itself as a neighbour.
    #[error("territory `{0}` is adjacent to itself")]
    SelfAdjacent(String),
    /// Adjacency is only declared in one direction.
    #[error("`{from}` borders `{to}` but not the other way round")]
    AsymmetricAdjacency {
        /// Territory declaring the border.
        from: String,
        /// Territory missing the reverse border.
        to: String,
    },
    /// A territory belongs to a continent that is not declared.
    #[error("territory `{territory}` belongs to unknown continent `{continent}`")]
    UnknownContinent {
        /// Territory holding the bad reference.
        territory: String,
        /// The missing continent id.
        continent: String,
    },
    /// A continent has no territories.
    #[error("continent `{0}` has no territories")]
    EmptyContinent(String),
    /// Map JSON could not be parsed.
    #[error("failed to parse map definition: {0}")]
    Parse(#[from] serde_json::Error),
    /// Map file could not be read.
    #[error("failed to read map definition from {path:?}: {source}")]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Reasons `init_game` refuses a setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SetupError {
    /// Player count outside the supported range.
    #[error("unsupported player count {count} (expected {min}..={max})")]
    PlayerCount {
        /// Requested player count.
        count: usize,
        /// Minimum supported.
        min: usize,
        /// Maximum supported.
        max: usize,
    },
    /// A player name is blank.
    #[error("player {0} has an empty name")]
    EmptyName(usize),
    /// The map cannot give every player a territory.
    #[error("map has {territories} territories, too few for {players} players")]
    TooFewTerritories {
        /// Territories on the selected map.
        territories: usize,
        /// Requested players.
        players: usize,
    },
}

/// Problems loading game settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings JSON could not be parsed.
    #[error("failed to parse game settings: {0}")]
    Parse(#[from] serde_json::Error),
    /// Settings file could not be read.
    #[error("failed to read game settings from {path:?}: {source}")]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Save/load failures at the persistence boundary.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Storage could not be read or written.
    #[error("storage error for slot `{slot}`: {source}")]
    Io {
        /// Save slot involved.
        slot: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Nothing is stored under this slot.
    #[error("no snapshot stored in slot `{0}`")]
    MissingSlot(String),
    /// Slot names must be short identifiers.
    #[error("invalid slot name `{0}`")]
    InvalidSlot(String),
    /// Snapshot bytes are not a valid snapshot.
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Snapshot was written by an incompatible format version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    Version {
        /// Version found in the snapshot.
        found: u32,
        /// Version this build writes.
        expected: u32,
    },
    /// Snapshot refers to a map the catalog does not know.
    #[error(transparent)]
    Map(#[from] MapError),
    /// Snapshot decoded but describes an impossible game.
    #[error("inconsistent snapshot: {0}")]
    Inconsistent(String),
}

/// Failures while replaying a recorded command journal.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Recording file could not be read or written.
    #[error("recording I/O failed: {0}")]
    Io(#[from] io::Error),
    /// Recording JSON is malformed.
    #[error("malformed recording: {0}")]
    Parse(#[from] serde_json::Error),
    /// Recording names a map the catalog does not know.
    #[error(transparent)]
    Map(#[from] MapError),
    /// Recorded setup is no longer accepted.
    #[error("recorded setup rejected: {0}")]
    Setup(#[from] SetupError),
    /// A recorded command was rejected, so the replay diverged.
    #[error("command #{index} ({command}) was rejected during replay")]
    Diverged {
        /// Position of the command in the journal.
        index: usize,
        /// Debug rendering of the command.
        command: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_error_display() {
        let err = MapError::AsymmetricAdjacency {
            from: "alaska".to_string(),
            to: "kamchatka".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "`alaska` borders `kamchatka` but not the other way round"
        );
    }

    #[test]
    fn test_setup_error_display() {
        let err = SetupError::PlayerCount {
            count: 1,
            min: 2,
            max: 8,
        };
        assert!(err.to_string().contains("unsupported player count 1"));
    }
}
