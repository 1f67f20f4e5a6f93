//! Replay command implementation.

use super::output::{GameSummary, format_text};
use super::{CliError, OutputFormat};
use conquest::{MapCatalog, Recording, ReplayEngine};
use std::path::PathBuf;

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if the recording cannot be loaded or diverges.
pub(crate) fn execute(
    recording_path: PathBuf,
    turn: Option<u32>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let recording = Recording::load(&recording_path).map_err(|e| {
        CliError::new(format!("Failed to load recording {}: {e}", recording_path.display()))
    })?;
    let seed = recording.seed;

    let mut engine = ReplayEngine::new(recording, &MapCatalog::builtin())?;
    match turn {
        Some(target) => engine.goto_turn(target)?,
        None => engine.run_to_end()?,
    }

    let summary = GameSummary::from_game(engine.game(), seed, engine.position());
    match format {
        OutputFormat::Text => {
            print!("{}", format_text(&summary));
            if let Some(entry) = engine.state().history.last() {
                println!();
                println!("Last action (turn {}): {}", entry.turn, entry.result);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}
