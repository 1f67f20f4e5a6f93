//! Run command implementation.

use super::output::{GameSummary, format_text};
use super::{CliError, GameOptions, OutputFormat, clock_seed};
use conquest::Engine;
use conquest::persistence::FileStore;
use std::path::PathBuf;

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the game cannot be set up or its outputs cannot be written.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    options: &GameOptions,
    seed: Option<u64>,
    max_steps: usize,
    format: OutputFormat,
    save: Option<PathBuf>,
    snapshot_dir: Option<PathBuf>,
    slot: &str,
    quiet: bool,
) -> Result<(), CliError> {
    let (settings, setup) = options.resolve()?;
    let seed = seed.unwrap_or_else(clock_seed);

    if !quiet {
        println!("Running game with seed {seed} on map {}...", settings.map_id);
        println!("Players: {}", setup.names.join(", "));
        println!();
    }

    let mut engine = Engine::with_builtin_maps(settings, seed)?;
    if !engine.init_game(&setup) {
        return Err(CliError::new("Game setup was rejected"));
    }

    let steps = engine.run_pending(max_steps);
    if engine.winner().is_none() && !quiet {
        println!("Stopped after {steps} AI steps without a winner.");
        println!();
    }

    // Save recording if requested
    if let Some(save_path) = save {
        let recording = engine
            .recording()
            .ok_or_else(|| CliError::new("No recording available"))?;
        recording
            .save(&save_path)
            .map_err(|e| CliError::new(format!("Failed to save recording: {e}")))?;
        if !quiet {
            println!("Recording saved to: {}", save_path.display());
        }
    }

    if let Some(dir) = snapshot_dir {
        let mut store = FileStore::new(dir);
        if !engine.save(&mut store, slot) {
            return Err(CliError::new(format!("Failed to save snapshot to slot {slot}")));
        }
        if !quiet {
            println!("Snapshot saved to: {}", store.dir().display());
        }
    }

    let summary = GameSummary::from_game(engine.game(), seed, engine.journal().len());
    match format {
        OutputFormat::Text => print!("{}", format_text(&summary)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}
