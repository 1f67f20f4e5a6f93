//! Tournament command implementation.

use super::output::{
    GameOutcome, JsonTournamentResult, TournamentStats, format_tournament_csv,
    format_tournament_text,
};
use super::{CliError, GameOptions, TournamentFormat, clock_seed};
use conquest::{Engine, GameSettings, GameSetup, MapCatalog};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::time::Instant;

/// Play one all-AI game to completion or the step limit.
fn play_game(
    catalog: &MapCatalog,
    settings: &GameSettings,
    setup: &GameSetup,
    seed: u64,
    max_steps: usize,
) -> GameOutcome {
    let engine = Engine::new(catalog.clone(), settings.clone(), seed);
    let Ok(mut engine) = engine else {
        return GameOutcome {
            winner: None,
            turns: 0,
        };
    };
    if engine.init_game(setup) {
        engine.run_pending(max_steps);
    }
    GameOutcome {
        winner: engine.winner(),
        turns: engine.state().turn,
    }
}

/// Execute the tournament command.
///
/// # Errors
///
/// Returns an error if the options are invalid or output fails.
pub(crate) fn execute(
    options: &GameOptions,
    games: u64,
    seed: Option<u64>,
    threads: Option<usize>,
    max_steps: usize,
    format: TournamentFormat,
    progress: bool,
) -> Result<(), CliError> {
    let (settings, setup) = options.resolve()?;
    let catalog = MapCatalog::builtin();
    if catalog.get_map_by_id(&settings.map_id).is_none() {
        return Err(CliError::new(format!("Unknown map: {}", settings.map_id)));
    }

    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = seed.unwrap_or_else(clock_seed);

    let pb = if progress {
        let pb = ProgressBar::new(games);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
            .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let num_players = setup.names.len();

    // Each thread accumulates into its own stats, merged at the end
    let stats = (0..games)
        .into_par_iter()
        .fold(
            || TournamentStats::new(num_players),
            |mut local_stats, i| {
                let game_seed = base_seed.wrapping_add(i);
                local_stats.add_result(play_game(&catalog, &settings, &setup, game_seed, max_steps));
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                local_stats
            },
        )
        .reduce(
            || TournamentStats::new(num_players),
            |mut a, b| {
                a.merge(&b);
                a
            },
        );

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    #[allow(clippy::cast_precision_loss)]
    let games_per_sec = if duration.as_secs_f64() > 0.0 {
        stats.games_played as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    match format {
        TournamentFormat::Text => {
            println!();
            print!("{}", format_tournament_text(&stats));
            println!();
            println!("Duration: {:.2}s ({:.0} games/sec)", duration.as_secs_f64(), games_per_sec);
        }
        TournamentFormat::Json => {
            let json_result = JsonTournamentResult::from_stats(&stats);
            println!("{}", serde_json::to_string_pretty(&json_result)?);
        }
        TournamentFormat::Csv => {
            print!("{}", format_tournament_csv(&stats));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use conquest::PlacementMode;

    #[test]
    fn test_same_seed_same_outcome() {
        let catalog = MapCatalog::builtin();
        let settings = GameSettings {
            map_id: "duel".to_string(),
            placement_mode: PlacementMode::Random,
            ..GameSettings::default()
        };
        let setup = GameSetup::numbered_ai(2);

        let a = play_game(&catalog, &settings, &setup, 77, 3_000);
        let b = play_game(&catalog, &settings, &setup, 77, 3_000);
        assert_eq!(a.winner, b.winner);
        assert_eq!(a.turns, b.turns);
    }
}
