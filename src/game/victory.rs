//! Liveness and win detection.
//!
//! Run after every ownership transfer during play. A player is alive while
//! they own at least one territory; the game is won once one player owns
//! every territory. Not meaningful during placement, when seats may still
//! hold nothing.

use std::collections::HashSet;

use crate::game::{GameState, Phase, PlayerId};

/// Recompute every player's alive flag from territory ownership.
pub fn refresh_liveness(state: &mut GameState) {
    let owners: HashSet<PlayerId> = state.territories.values().filter_map(|t| t.owner).collect();
    for player in &mut state.players {
        player.alive = owners.contains(&player.id);
    }
}

/// The single owner of every territory, if there is one.
///
/// A neutral territory counts as a distinct owner, so this is `None`
/// while any neutral territory remains.
#[must_use]
pub fn sole_owner(state: &GameState) -> Option<PlayerId> {
    let mut owners = state.territories.values().map(|t| t.owner);
    let first = owners.next()??;
    owners.all(|owner| owner == Some(first)).then_some(first)
}

/// Refresh liveness and report the winner, if any.
///
/// When a winner exists, they are the only player left alive. Does nothing
/// before play starts, since unclaimed seats would be marked dead.
pub fn check_win_condition(state: &mut GameState) -> Option<PlayerId> {
    if matches!(state.phase, Phase::Setup | Phase::Placement) {
        return None;
    }
    refresh_liveness(state);
    let winner = sole_owner(state)?;
    for player in &mut state.players {
        player.alive = player.id == winner;
    }
    Some(winner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameSettings;
    use crate::game::Player;
    use crate::game::catalog::duel_map;

    fn state_with_players(count: u8) -> GameState {
        let map = duel_map().unwrap();
        let mut state = GameState::new(&map, GameSettings::default(), 5);
        state.players = (0..count)
            .map(|id| Player::new(id, format!("P{id}"), "#000", false))
            .collect();
        state.phase = Phase::Draft;
        state
    }

    fn assign_all(state: &mut GameState, owner: PlayerId) {
        for territory in state.territories.values_mut() {
            territory.owner = Some(owner);
            territory.armies = 1;
        }
    }

    #[test]
    fn test_no_winner_while_neutral_remains() {
        let mut state = state_with_players(2);
        assert_eq!(sole_owner(&state), None);

        assign_all(&mut state, 0);
        state.territories.get_mut("quarry").unwrap().owner = None;
        assert_eq!(sole_owner(&state), None);
    }

    #[test]
    fn test_sole_owner_wins() {
        let mut state = state_with_players(3);
        assign_all(&mut state, 1);

        assert_eq!(check_win_condition(&mut state), Some(1));
        let alive: Vec<bool> = state.players.iter().map(|p| p.alive).collect();
        assert_eq!(alive, vec![false, true, false]);
    }

    #[test]
    fn test_liveness_tracks_ownership() {
        let mut state = state_with_players(3);
        assign_all(&mut state, 0);
        state.territories.get_mut("keep").unwrap().owner = Some(2);

        assert_eq!(check_win_condition(&mut state), None);
        let alive: Vec<bool> = state.players.iter().map(|p| p.alive).collect();
        assert_eq!(alive, vec![true, false, true]);
    }

    #[test]
    fn test_placement_leaves_liveness_alone() {
        let mut state = state_with_players(2);
        state.phase = Phase::Placement;
        state.territories.get_mut("keep").unwrap().owner = Some(0);

        assert_eq!(check_win_condition(&mut state), None);
        assert!(state.players.iter().all(|p| p.alive));

        assign_all(&mut state, 0);
        assert_eq!(check_win_condition(&mut state), None);
        assert!(state.players.iter().all(|p| p.alive));
    }
}
