//! Dice combat resolution.
//!
//! Each round the attacker rolls up to three dice and the defender up to two.
//! Both sides sort descending and the highest dice are compared pairwise.
//! The attacker wins a pair only on a strictly higher roll; ties go to the
//! defender.
//!
//! The attacking territory is never reduced below one army by a round, even
//! if the pairing would remove more.

use serde::{Deserialize, Serialize};

use crate::rng::GameRng;

/// Most dice an attacker may roll.
pub const MAX_ATTACKER_DICE: u32 = 3;

/// Most dice a defender may roll.
pub const MAX_DEFENDER_DICE: u32 = 2;

/// Round limit for one instant-mode battle.
pub const MAX_INSTANT_ROUNDS: u32 = 200;

/// Outcome of one dice round, kept as the most recent result for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleResult {
    /// Armies removed from the attacking territory.
    pub attacker_losses: u32,
    /// Armies removed from the defending territory.
    pub defender_losses: u32,
    /// Whether the defender was wiped out.
    pub conquered: bool,
    /// Attacker dice, sorted descending.
    pub attacker_dice: Vec<u8>,
    /// Defender dice, sorted descending.
    pub defender_dice: Vec<u8>,
}

/// A round's result plus the army counts it leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleOutcome {
    /// Round result.
    pub result: BattleResult,
    /// Armies left on the attacking territory (never below 1).
    pub attacker_remaining: u32,
    /// Armies left on the defending territory (0 when conquered).
    pub defender_remaining: u32,
}

/// Dice the attacker actually rolls: `[1, 3]`, and at most `armies - 1`.
#[must_use]
pub fn attacker_dice_count(requested: u32, armies: u32) -> u32 {
    requested
        .clamp(1, MAX_ATTACKER_DICE)
        .min(armies.saturating_sub(1))
        .max(1)
}

/// Dice the defender actually rolls: `[1, 2]`, and at most `armies`.
#[must_use]
pub fn defender_dice_count(requested: u32, armies: u32) -> u32 {
    requested.clamp(1, MAX_DEFENDER_DICE).min(armies).max(1)
}

/// Roll `count` dice and sort them descending.
pub fn roll_dice(count: u32, rng: &mut GameRng) -> Vec<u8> {
    let mut dice: Vec<u8> = (0..count).map(|_| rng.roll_die()).collect();
    dice.sort_unstable_by(|a, b| b.cmp(a));
    dice
}

/// Compare sorted dice pairwise.
///
/// Returns `(attacker_losses, defender_losses)`. Their sum is always the
/// length of the shorter slice.
#[must_use]
pub fn compare_dice(attacker: &[u8], defender: &[u8]) -> (u32, u32) {
    attacker
        .iter()
        .zip(defender)
        .fold((0, 0), |(att_losses, def_losses), (a, d)| {
            if a > d {
                (att_losses, def_losses + 1)
            } else {
                (att_losses + 1, def_losses)
            }
        })
}

/// Apply already-rolled dice to the two army counts.
#[must_use]
pub fn settle_round(
    attacker_armies: u32,
    defender_armies: u32,
    attacker_dice: Vec<u8>,
    defender_dice: Vec<u8>,
) -> BattleOutcome {
    let (attacker_losses, defender_losses) = compare_dice(&attacker_dice, &defender_dice);

    let conquered = defender_armies <= defender_losses;
    let defender_remaining = defender_armies.saturating_sub(defender_losses);
    let attacker_remaining = attacker_armies.saturating_sub(attacker_losses).max(1);

    BattleOutcome {
        result: BattleResult {
            attacker_losses,
            defender_losses,
            conquered,
            attacker_dice,
            defender_dice,
        },
        attacker_remaining,
        defender_remaining,
    }
}

/// Resolve one dice round.
///
/// Requested dice counts are clamped to the legal range for each side's
/// current army count before rolling.
pub fn resolve_battle(
    attacker_armies: u32,
    defender_armies: u32,
    attacker_dice_requested: u32,
    defender_dice_requested: u32,
    rng: &mut GameRng,
) -> BattleOutcome {
    let attacker_count = attacker_dice_count(attacker_dice_requested, attacker_armies);
    let defender_count = defender_dice_count(defender_dice_requested, defender_armies);

    let attacker_dice = roll_dice(attacker_count, rng);
    let defender_dice = roll_dice(defender_count, rng);

    settle_round(attacker_armies, defender_armies, attacker_dice, defender_dice)
}
