//! Output formatting utilities for CLI.

use conquest::{Game, Phase};
use serde::Serialize;
use std::fmt::Write as _;

/// JSON-serializable summary of one game.
#[derive(Debug, Serialize)]
pub(super) struct GameSummary {
    /// Random seed used.
    pub(super) seed: u64,
    /// Map the game was played on.
    pub(super) map: String,
    /// Winner seat (null if unfinished).
    pub(super) winner: Option<u8>,
    /// Turn the game stopped on.
    pub(super) turn: u32,
    /// Phase the game stopped in.
    pub(super) phase: Phase,
    /// Commands applied.
    pub(super) commands: usize,
    /// Per-player results.
    pub(super) players: Vec<PlayerSummary>,
}

/// JSON-serializable player result.
#[derive(Debug, Serialize)]
pub(super) struct PlayerSummary {
    /// Seat (0-based).
    pub(super) id: u8,
    /// Display name.
    pub(super) name: String,
    /// Still in the game.
    pub(super) alive: bool,
    /// Territories owned.
    pub(super) territories: usize,
    /// Armies on the board.
    pub(super) armies: u32,
    /// Cards in hand.
    pub(super) cards: usize,
}

impl GameSummary {
    /// Summarise `game` after `commands` accepted commands.
    pub(super) fn from_game(game: &Game, seed: u64, commands: usize) -> Self {
        let state = game.state();
        Self {
            seed,
            map: game.map().id().to_string(),
            winner: game.winner(),
            turn: state.turn,
            phase: state.phase,
            commands,
            players: state
                .players
                .iter()
                .map(|p| PlayerSummary {
                    id: p.id,
                    name: p.name.clone(),
                    alive: p.alive,
                    territories: state.count_territories(p.id),
                    armies: state.total_armies(p.id),
                    cards: p.cards.len(),
                })
                .collect(),
        }
    }
}

/// Format a game summary as human-readable text.
pub(super) fn format_text(summary: &GameSummary) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Game Result (seed: {}, map: {})", summary.seed, summary.map);
    match summary.winner.and_then(|w| summary.players.get(usize::from(w))) {
        Some(winner) => {
            let _ = writeln!(output, "  Winner: Player {} ({})", winner.id, winner.name);
        }
        None => {
            let _ = writeln!(output, "  Winner: none ({:?} phase)", summary.phase);
        }
    }
    let _ = writeln!(output, "  Turns: {}", summary.turn);
    let _ = writeln!(output, "  Commands: {}\n", summary.commands);

    for player in &summary.players {
        let _ = write!(
            output,
            "  Player {}: {} territories, {} armies, {} cards ({})",
            player.id, player.territories, player.armies, player.cards, player.name
        );
        if !player.alive {
            output.push_str(" [eliminated]");
        }
        output.push('\n');
    }

    output
}

/// Outcome of one tournament game.
#[derive(Debug, Clone, Copy)]
pub(super) struct GameOutcome {
    /// Winner seat, if the game finished.
    pub(super) winner: Option<u8>,
    /// Turn the game stopped on.
    pub(super) turns: u32,
}

/// Tournament statistics for aggregated results.
#[derive(Debug, Default)]
pub(super) struct TournamentStats {
    /// Total games played.
    pub(super) games_played: u64,
    /// Win count per seat.
    pub(super) wins: Vec<u64>,
    /// Games that hit the step limit or failed to start.
    pub(super) unfinished: u64,
    /// Total turns across all games.
    total_turns: u64,
}

impl TournamentStats {
    /// Create new stats for n players.
    pub(super) fn new(num_players: usize) -> Self {
        Self {
            wins: vec![0; num_players],
            ..Self::default()
        }
    }

    /// Add a game outcome to the stats.
    pub(super) fn add_result(&mut self, outcome: GameOutcome) {
        self.games_played += 1;
        self.total_turns += u64::from(outcome.turns);

        match outcome.winner.and_then(|w| self.wins.get_mut(usize::from(w))) {
            Some(wins) => *wins += 1,
            None => self.unfinished += 1,
        }
    }

    /// Merge another stats object into this one.
    pub(super) fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.unfinished += other.unfinished;
        self.total_turns += other.total_turns;
        for (mine, theirs) in self.wins.iter_mut().zip(&other.wins) {
            *mine += theirs;
        }
    }

    /// Get win rate for a seat (0.0-1.0).
    #[allow(clippy::cast_precision_loss)]
    pub(super) fn win_rate(&self, seat: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins.get(seat).copied().unwrap_or(0) as f64 / self.games_played as f64
    }

    /// Get average game length.
    #[allow(clippy::cast_precision_loss)]
    pub(super) fn avg_turns(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_turns as f64 / self.games_played as f64
    }
}

/// JSON-serializable tournament result.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentResult {
    /// Total games played.
    games_played: u64,
    /// Per-seat statistics.
    players: Vec<JsonTournamentPlayer>,
    /// Games without a winner.
    unfinished: u64,
    /// Average game length in turns.
    avg_turns: f64,
}

/// JSON-serializable per-seat tournament stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentPlayer {
    /// Seat (0-based).
    seat: usize,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
}

impl JsonTournamentResult {
    /// Create from stats.
    pub(super) fn from_stats(stats: &TournamentStats) -> Self {
        let players = stats
            .wins
            .iter()
            .enumerate()
            .map(|(seat, &wins)| JsonTournamentPlayer {
                seat,
                wins,
                win_rate: stats.win_rate(seat),
            })
            .collect();

        Self {
            games_played: stats.games_played,
            players,
            unfinished: stats.unfinished,
            avg_turns: stats.avg_turns(),
        }
    }
}

/// Format tournament results as human-readable text.
pub(super) fn format_tournament_text(stats: &TournamentStats) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Tournament Results ({} games)", stats.games_played);
    let _ = writeln!(output, "  Average length: {:.1} turns", stats.avg_turns());
    let _ = writeln!(output, "  Unfinished: {}\n", stats.unfinished);

    for (seat, wins) in stats.wins.iter().enumerate() {
        let _ = writeln!(
            output,
            "  Seat {seat}: {wins} wins ({:.1}%)",
            stats.win_rate(seat) * 100.0
        );
    }

    output
}

/// Format tournament results as CSV.
pub(super) fn format_tournament_csv(stats: &TournamentStats) -> String {
    let mut output = String::from("seat,wins,win_rate,games,unfinished,avg_turns\n");
    for (seat, wins) in stats.wins.iter().enumerate() {
        let _ = writeln!(
            output,
            "{seat},{wins},{:.4},{},{},{:.2}",
            stats.win_rate(seat),
            stats.games_played,
            stats.unfinished,
            stats.avg_turns()
        );
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_merge() {
        let mut a = TournamentStats::new(2);
        a.add_result(GameOutcome {
            winner: Some(0),
            turns: 10,
        });
        let mut b = TournamentStats::new(2);
        b.add_result(GameOutcome {
            winner: Some(1),
            turns: 20,
        });
        b.add_result(GameOutcome {
            winner: None,
            turns: 30,
        });

        a.merge(&b);
        assert_eq!(a.games_played, 3);
        assert_eq!(a.wins, vec![1, 1]);
        assert_eq!(a.unfinished, 1);
        assert!((a.avg_turns() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_csv_has_row_per_seat() {
        let mut stats = TournamentStats::new(3);
        stats.add_result(GameOutcome {
            winner: Some(2),
            turns: 7,
        });
        let csv = format_tournament_csv(&stats);
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.lines().nth(3).unwrap().starts_with("2,1,1.0000"));
    }
}
