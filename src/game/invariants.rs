//! Game invariants - sanity checks that detect bugs.
//!
//! A state produced by the rules should never trip these. They run after
//! loading a snapshot and throughout the property tests.

use std::collections::BTreeSet;

use crate::game::{GameState, MapDefinition, Phase, PlacementStage};

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl InvariantViolation {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check that `state` describes a game on `map`.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_map_consistency(state: &GameState, map: &MapDefinition) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    if state.selected_map != map.id() {
        violations.push(InvariantViolation::new(format!(
            "state is for map {} but map is {}",
            state.selected_map,
            map.id()
        )));
    }

    let expected: BTreeSet<&str> = map.territories().iter().map(|t| t.id.as_str()).collect();
    let actual: BTreeSet<&str> = state.territories.keys().map(String::as_str).collect();
    for missing in expected.difference(&actual) {
        violations.push(InvariantViolation::new(format!("territory {missing} has no state")));
    }
    for unknown in actual.difference(&expected) {
        violations.push(InvariantViolation::new(format!("territory {unknown} is not on the map")));
    }

    for id in [
        &state.attack_from,
        &state.attack_to,
        &state.fortify_from,
        &state.fortify_to,
    ]
    .into_iter()
    .flatten()
    {
        if !map.contains(id) {
            violations.push(InvariantViolation::new(format!("selection {id} is not on the map")));
        }
    }

    violations
}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
/// These are bug detectors, not gameplay limits.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let in_play = matches!(state.phase, Phase::Draft | Phase::Attack | Phase::Fortify);

    for (key, territory) in &state.territories {
        if key != &territory.id {
            violations.push(InvariantViolation::new(format!(
                "territory keyed {key} has id {}",
                territory.id
            )));
        }
        match territory.owner {
            None if territory.armies > 0 => violations.push(InvariantViolation::new(format!(
                "neutral territory {key} holds {} armies",
                territory.armies
            ))),
            Some(owner) if state.get_player(owner).is_none() => violations.push(
                InvariantViolation::new(format!("territory {key} owned by unknown player {owner}")),
            ),
            Some(_) if territory.armies == 0 => {
                let pending_target =
                    state.conquest_pending() && state.attack_to.as_deref() == Some(key.as_str());
                if !pending_target {
                    violations.push(InvariantViolation::new(format!(
                        "owned territory {key} has no armies"
                    )));
                }
            }
            _ => {}
        }
        if in_play && territory.owner.is_none() {
            violations.push(InvariantViolation::new(format!(
                "territory {key} is neutral during play"
            )));
        }
    }

    for (seat, player) in state.players.iter().enumerate() {
        if usize::from(player.id) != seat {
            violations.push(InvariantViolation::new(format!(
                "player at seat {seat} has id {}",
                player.id
            )));
        }
        let owned = state.count_territories(player.id);
        if !player.alive && owned > 0 {
            violations.push(InvariantViolation::new(format!(
                "dead player {} still owns {owned} territories",
                player.id
            )));
        }
        if in_play && player.alive && owned == 0 {
            violations.push(InvariantViolation::new(format!(
                "alive player {} owns nothing",
                player.id
            )));
        }
    }

    if state.phase != Phase::Setup {
        match state.current_player() {
            None => violations.push(InvariantViolation::new(format!(
                "current player index {} out of range",
                state.current_player_index
            ))),
            Some(player) if in_play && !player.alive => violations.push(InvariantViolation::new(
                format!("current player {} is eliminated", player.id),
            )),
            Some(_) => {}
        }
        if state.placement_reserves.len() != state.players.len() {
            violations.push(InvariantViolation::new(format!(
                "{} reserves for {} players",
                state.placement_reserves.len(),
                state.players.len()
            )));
        }
    }

    match (state.phase, state.placement_stage) {
        (Phase::Placement, None) => {
            violations.push(InvariantViolation::new("placement phase without a stage"));
        }
        (Phase::Placement, Some(PlacementStage::Distribute)) => {
            if state.neutral_territories().next().is_some() {
                violations.push(InvariantViolation::new("distributing while territories are unclaimed"));
            }
        }
        (Phase::Placement, Some(PlacementStage::Claim)) => {}
        (phase, Some(stage)) => violations.push(InvariantViolation::new(format!(
            "placement stage {stage:?} outside placement (phase {phase:?})"
        ))),
        (_, None) => {}
    }

    if state.phase != Phase::Attack && (state.attack_from.is_some() || state.attack_to.is_some()) {
        violations.push(InvariantViolation::new("attack selection outside the attack phase"));
    }
    if state.phase != Phase::Fortify && (state.fortify_from.is_some() || state.fortify_to.is_some())
    {
        violations.push(InvariantViolation::new("fortify selection outside the fortify phase"));
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &GameState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &GameState) {}
