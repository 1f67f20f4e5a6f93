#![no_main]

use arbitrary::Arbitrary;
use conquest::game::{MAX_ATTACKER_DICE, MAX_DEFENDER_DICE, resolve_battle};
use conquest::rng::GameRng;
use libfuzzer_sys::fuzz_target;

/// Structured input for combat fuzzing.
#[derive(Arbitrary, Debug)]
struct CombatInput {
    /// Armies on the attacking territory.
    attacker_armies: u32,
    /// Armies on the defending territory.
    defender_armies: u32,
    /// Dice the attacker asks for.
    attacker_dice: u32,
    /// Dice the defender asks for.
    defender_dice: u32,
    /// Seed for the dice.
    seed: u64,
}

fuzz_target!(|input: CombatInput| {
    // An attack needs a spare army and a defender
    if input.attacker_armies < 2 || input.defender_armies == 0 {
        return;
    }

    let mut rng = GameRng::seeded(input.seed);
    let outcome = resolve_battle(
        input.attacker_armies,
        input.defender_armies,
        input.attacker_dice,
        input.defender_dice,
        &mut rng,
    );
    let result = &outcome.result;

    let rolled_att = result.attacker_dice.len() as u32;
    let rolled_def = result.defender_dice.len() as u32;
    assert!((1..=MAX_ATTACKER_DICE).contains(&rolled_att));
    assert!((1..=MAX_DEFENDER_DICE).contains(&rolled_def));
    assert!(rolled_att < input.attacker_armies);
    assert!(rolled_def <= input.defender_armies);

    // One army lost per compared pair
    assert_eq!(
        result.attacker_losses + result.defender_losses,
        rolled_att.min(rolled_def)
    );

    // Armies never increase, and the attacker always keeps one
    assert!(outcome.attacker_remaining >= 1);
    assert!(outcome.attacker_remaining <= input.attacker_armies);
    assert!(outcome.defender_remaining <= input.defender_armies);
    assert_eq!(result.conquered, outcome.defender_remaining == 0);
});
