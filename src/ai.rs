//! AI decision policy.
//!
//! The AI keeps no state of its own. Each call reads the live game, handles
//! the decision point the current player is at, and issues the same
//! [`Command`]s a human would through a [`CommandSink`].
//!
//! # Determinism
//!
//! In sequential placement mode the AI always takes the first eligible
//! candidate in id order. Otherwise it picks uniformly from the game's AI
//! random stream, which is seeded with the game, so a seed still fixes the
//! whole game.

use crate::config::PlacementMode;
use crate::game::{
    Command, Game, MAX_ATTACKER_DICE, MAX_DEFENDER_DICE, Phase, PlacementStage, PlayerId,
};
use crate::rng::GameRng;

/// Draft placements attempted per decision point before giving up.
pub const MAX_DRAFT_STEPS: usize = 200;

/// Attack attempts per turn.
pub const MAX_ATTACK_ATTEMPTS: usize = 3;

/// Where AI commands go.
///
/// [`Game`] applies them directly; the engine also journals them.
pub trait CommandSink {
    /// The live game.
    fn game(&self) -> &Game;

    /// Apply a command, returning whether it was accepted.
    fn submit(&mut self, command: Command) -> bool;

    /// Random stream for AI choices.
    fn ai_rng(&mut self) -> &mut GameRng;
}

impl CommandSink for Game {
    fn game(&self) -> &Game {
        self
    }

    fn submit(&mut self, command: Command) -> bool {
        self.apply(&command)
    }

    fn ai_rng(&mut self) -> &mut GameRng {
        self.ai_rng_mut()
    }
}

/// Play the decision point the current AI player is at.
///
/// Returns whether any command was accepted. Does nothing when the player to
/// move is human, eliminated, or the game is over.
pub fn play_turn<S: CommandSink>(sink: &mut S) -> bool {
    let game = sink.game();
    if !game.is_ai_turn() {
        return false;
    }
    let state = game.state();
    let Some(player) = state.current_player_id() else {
        return false;
    };
    tracing::trace!(
        target: "conquest::ai",
        player,
        phase = ?state.phase,
        turn = state.turn,
        "ai.step"
    );

    match (state.phase, state.placement_stage) {
        (Phase::Placement, Some(PlacementStage::Claim)) => claim(sink),
        (Phase::Placement, Some(PlacementStage::Distribute)) => distribute(sink, player),
        (Phase::Draft, _) => draft(sink, player),
        (Phase::Attack, _) => attack(sink, player),
        (Phase::Fortify, _) => sink.submit(Command::Fortify { armies: 0 }),
        _ => false,
    }
}

/// Pick one of `candidates`, which must be in id order.
fn choose<S: CommandSink>(sink: &mut S, candidates: &[String]) -> Option<String> {
    if sink.game().state().settings.placement_mode == PlacementMode::Sequential {
        return candidates.first().cloned();
    }
    let index = sink.ai_rng().pick_index(candidates.len())?;
    candidates.get(index).cloned()
}

fn claim<S: CommandSink>(sink: &mut S) -> bool {
    let neutrals: Vec<String> = sink
        .game()
        .state()
        .neutral_territories()
        .map(|t| t.id.clone())
        .collect();
    match choose(sink, &neutrals) {
        Some(territory) => sink.submit(Command::PlaceArmy { territory }),
        None => false,
    }
}

fn distribute<S: CommandSink>(sink: &mut S, player: PlayerId) -> bool {
    let owned = sink.game().get_player_territories(player);
    match choose(sink, &owned) {
        Some(territory) => sink.submit(Command::PlaceArmy { territory }),
        None => false,
    }
}

fn draft<S: CommandSink>(sink: &mut S, player: PlayerId) -> bool {
    let turn = sink.game().state().turn;
    let mut placed = 0;
    for _ in 0..MAX_DRAFT_STEPS {
        let state = sink.game().state();
        if state.phase != Phase::Draft
            || state.turn != turn
            || state.current_player_id() != Some(player)
            || state.draft_armies == 0
        {
            break;
        }
        let owned = sink.game().get_player_territories(player);
        let Some(territory) = choose(sink, &owned) else {
            break;
        };
        if !sink.submit(Command::PlaceArmy { territory }) {
            break;
        }
        placed += 1;
    }
    tracing::debug!(target: "conquest::ai", player, placed, "ai.drafted");
    placed > 0
}

/// Territories `player` can attack from, in id order.
fn attack_sources(game: &Game, player: PlayerId) -> Vec<String> {
    game.state()
        .territories_owned_by(player)
        .filter(|t| t.armies > 1 && !game.get_adjacent_enemy_territories(&t.id).is_empty())
        .map(|t| t.id.clone())
        .collect()
}

fn armies(game: &Game, territory: &str) -> u32 {
    game.get_territory_state(territory).map_or(0, |t| t.armies)
}

/// Settle a pending conquest by moving half the attacking stack.
fn occupy<S: CommandSink>(sink: &mut S, player: PlayerId) -> bool {
    let state = sink.game().state();
    let (Some(from), Some(to)) = (state.attack_from.clone(), state.attack_to.clone()) else {
        return false;
    };
    let moved = (armies(sink.game(), &from) / 2).max(1);
    let accepted = sink.submit(Command::ConquestMove { armies: moved });
    if accepted {
        tracing::debug!(target: "conquest::ai", player, from = %from, to = %to, moved, "ai.conquered");
    }
    accepted
}

fn attack<S: CommandSink>(sink: &mut S, player: PlayerId) -> bool {
    // A pending conquest blocks every other attack command.
    let mut progressed = sink.game().state().conquest_pending() && occupy(sink, player);

    if sink.game().state().turn > 1 {
        let attempts = attack_sources(sink.game(), player)
            .len()
            .min(MAX_ATTACK_ATTEMPTS);
        for _ in 0..attempts {
            let sources = attack_sources(sink.game(), player);
            let Some(from) = choose(sink, &sources) else {
                break;
            };
            let targets = sink.game().get_adjacent_enemy_territories(&from);
            let Some(to) = choose(sink, &targets) else {
                break;
            };

            let attacker_dice = armies(sink.game(), &from)
                .saturating_sub(1)
                .min(MAX_ATTACKER_DICE);
            let defender_dice = armies(sink.game(), &to).min(MAX_DEFENDER_DICE);
            if !(sink.submit(Command::SelectAttackFrom {
                territory: from.clone(),
            }) && sink.submit(Command::SelectAttackTo {
                territory: to.clone(),
            }) && sink.submit(Command::Attack {
                attacker_dice,
                defender_dice,
            })) {
                break;
            }
            progressed = true;

            if sink.game().state().conquest_pending() {
                occupy(sink, player);
            }
            if sink.game().winner().is_some() {
                break;
            }
        }
    }

    if sink.submit(Command::EndAttack) {
        return true;
    }
    tracing::warn!(
        target: "conquest::ai",
        player,
        pending = sink.game().state().conquest_pending(),
        "ai.end_attack_rejected"
    );
    progressed
}
