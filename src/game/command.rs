//! Player commands.
//!
//! Every mutating rule operation is expressed as a [`Command`], so a game can
//! be driven through a single entry point, journaled, and replayed.

use serde::{Deserialize, Serialize};

use crate::game::Game;

/// A mutating operation issued by a human or AI player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Claim, reinforce, or draft one army onto a territory.
    PlaceArmy {
        /// Target territory.
        territory: String,
    },
    /// Trade the best available card set for armies.
    RedeemCards,
    /// Choose the attacking territory.
    SelectAttackFrom {
        /// Attacking territory.
        territory: String,
    },
    /// Choose the defending territory.
    SelectAttackTo {
        /// Defending territory.
        territory: String,
    },
    /// Roll dice for the selected attack.
    Attack {
        /// Dice the attacker asks for.
        attacker_dice: u32,
        /// Dice the defender asks for.
        defender_dice: u32,
    },
    /// Move armies into a just-conquered territory.
    ConquestMove {
        /// Armies to move.
        armies: u32,
    },
    /// Finish attacking and draw a card if anything was conquered.
    EndAttack,
    /// Choose the fortify source.
    SelectFortifyFrom {
        /// Source territory.
        territory: String,
    },
    /// Choose the fortify destination.
    SelectFortifyTo {
        /// Destination territory.
        territory: String,
    },
    /// Move armies between the selected territories and end the turn.
    Fortify {
        /// Armies to move; 0 ends the turn without moving.
        armies: u32,
    },
}

/// Apply a command to a copy of `game`.
///
/// Returns the successor game and whether the command was accepted. A
/// rejected command yields a game equal to the input.
#[must_use]
pub fn reduce(game: &Game, command: &Command) -> (Game, bool) {
    let mut next = game.clone();
    let accepted = next.apply(command);
    if accepted {
        (next, true)
    } else {
        (game.clone(), false)
    }
}
