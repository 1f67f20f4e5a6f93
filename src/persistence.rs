//! Saving and loading games.
//!
//! A snapshot is the whole [`GameState`] (RNG position, seed and generation
//! included) wrapped with a format version and written as JSON. Loading is
//! all-or-nothing: the bytes are parsed, the map is resolved and the
//! invariants are checked before a [`Game`] is handed back.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MapError, PersistenceError};
use crate::game::{Game, GameState, MapCatalog, check_invariants, check_map_consistency};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Longest accepted slot name.
pub const MAX_SLOT_LEN: usize = 64;

/// Serialised game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version.
    pub version: u32,
    /// The game state.
    pub state: GameState,
}

impl Snapshot {
    /// Snapshot of a game's current state.
    #[must_use]
    pub fn of(game: &Game) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            state: game.state().clone(),
        }
    }
}

/// Byte storage keyed by slot name.
pub trait SaveStore {
    /// Bytes stored under `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::MissingSlot`] if nothing is stored there,
    /// or another error if storage is unavailable.
    fn read(&self, slot: &str) -> Result<Vec<u8>, PersistenceError>;

    /// Replace whatever is stored under `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error if storage is unavailable or the slot name is invalid.
    fn write(&mut self, slot: &str, bytes: &[u8]) -> Result<(), PersistenceError>;
}

/// Slot names are short identifiers so they map safely to file names.
fn validate_slot(slot: &str) -> Result<(), PersistenceError> {
    let valid = !slot.is_empty()
        && slot.len() <= MAX_SLOT_LEN
        && slot
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::InvalidSlot(slot.to_string()))
    }
}

/// A directory of `<slot>.json` files.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`, created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidSlot`] for unusable slot names.
    pub fn slot_path(&self, slot: &str) -> Result<PathBuf, PersistenceError> {
        validate_slot(slot)?;
        Ok(self.dir.join(format!("{slot}.json")))
    }
}

impl SaveStore for FileStore {
    fn read(&self, slot: &str) -> Result<Vec<u8>, PersistenceError> {
        let path = self.slot_path(slot)?;
        fs::read(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                PersistenceError::MissingSlot(slot.to_string())
            } else {
                PersistenceError::Io {
                    slot: slot.to_string(),
                    source,
                }
            }
        })
    }

    fn write(&mut self, slot: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        let path = self.slot_path(slot)?;
        let io_err = |source| PersistenceError::Io {
            slot: slot.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        // Write beside the target then rename so a crash never leaves half a save.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)
    }
}

/// In-memory store, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored slot names, sorted.
    #[must_use]
    pub fn slots(&self) -> Vec<&str> {
        let mut slots: Vec<&str> = self.slots.keys().map(String::as_str).collect();
        slots.sort_unstable();
        slots
    }
}

impl SaveStore for MemoryStore {
    fn read(&self, slot: &str) -> Result<Vec<u8>, PersistenceError> {
        validate_slot(slot)?;
        self.slots
            .get(slot)
            .cloned()
            .ok_or_else(|| PersistenceError::MissingSlot(slot.to_string()))
    }

    fn write(&mut self, slot: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        validate_slot(slot)?;
        self.slots.insert(slot.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Serialise a game.
///
/// # Errors
///
/// Returns an error if serialisation fails.
pub fn encode(game: &Game) -> Result<Vec<u8>, PersistenceError> {
    Ok(serde_json::to_vec_pretty(&Snapshot::of(game))?)
}

/// Parse and validate snapshot bytes into a game.
///
/// # Errors
///
/// Returns an error if the bytes are malformed, the version is unsupported,
/// the map is unknown, or the state breaks an invariant.
pub fn decode(bytes: &[u8], catalog: &MapCatalog) -> Result<Game, PersistenceError> {
    let snapshot: Snapshot = serde_json::from_slice(bytes)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(PersistenceError::Version {
            found: snapshot.version,
            expected: SNAPSHOT_VERSION,
        });
    }

    let state = snapshot.state;
    let map = catalog
        .get_map_by_id(&state.selected_map)
        .ok_or_else(|| MapError::UnknownMap(state.selected_map.clone()))?;

    let mut violations = check_map_consistency(&state, &map);
    violations.extend(check_invariants(&state));
    if !violations.is_empty() {
        let messages: Vec<String> = violations.iter().map(|v| v.message.clone()).collect();
        return Err(PersistenceError::Inconsistent(messages.join("; ")));
    }

    Ok(Game::from_parts(map, state))
}

/// Write `game` to `slot`.
///
/// # Errors
///
/// Returns an error if serialisation or storage fails.
pub fn save_game<S: SaveStore + ?Sized>(
    store: &mut S,
    slot: &str,
    game: &Game,
) -> Result<(), PersistenceError> {
    let bytes = encode(game)?;
    store.write(slot, &bytes)?;
    tracing::debug!(target: "conquest::persistence", slot, bytes = bytes.len(), "persistence.saved");
    Ok(())
}

/// Read and validate the game stored in `slot`.
///
/// # Errors
///
/// Returns an error if the slot is missing or unreadable, or the snapshot
/// fails to decode or validate.
pub fn load_game<S: SaveStore + ?Sized>(
    store: &S,
    slot: &str,
    catalog: &MapCatalog,
) -> Result<Game, PersistenceError> {
    let bytes = store.read(slot)?;
    let game = decode(&bytes, catalog)?;
    tracing::debug!(target: "conquest::persistence", slot, turn = game.state().turn, "persistence.loaded");
    Ok(game)
}
