#![no_main]

//! Command sequence fuzzer.
//!
//! Starts a duel game and feeds it arbitrary commands, interleaved with AI
//! moves, checking after every step that:
//! 1. Rejected commands leave the game untouched
//! 2. The state invariants hold
//! 3. A snapshot of the state loads back to the same state

use arbitrary::Arbitrary;
use conquest::game::{check_invariants, reduce};
use conquest::persistence::{decode, encode};
use conquest::{Command, Engine, GameSettings, GameSetup, MapCatalog, PlacementMode};
use libfuzzer_sys::fuzz_target;

const TERRITORIES: [&str; 8] = [
    "ford", "harbor", "keep", "marsh", "mill", "orchard", "quarry", "ridge",
];

/// A fuzzer-generated command.
#[derive(Arbitrary, Debug, Clone)]
enum FuzzCommand {
    Place(u8),
    Redeem,
    AttackFrom(u8),
    AttackTo(u8),
    Attack(u8, u8),
    Occupy(u8),
    EndAttack,
    FortifyFrom(u8),
    FortifyTo(u8),
    Fortify(u8),
    /// Let the AI play the current decision point.
    Ai,
}

fn territory(index: u8) -> String {
    TERRITORIES[usize::from(index) % TERRITORIES.len()].to_string()
}

impl FuzzCommand {
    fn to_command(&self) -> Option<Command> {
        Some(match *self {
            Self::Place(t) => Command::PlaceArmy { territory: territory(t) },
            Self::Redeem => Command::RedeemCards,
            Self::AttackFrom(t) => Command::SelectAttackFrom { territory: territory(t) },
            Self::AttackTo(t) => Command::SelectAttackTo { territory: territory(t) },
            Self::Attack(a, d) => Command::Attack {
                attacker_dice: u32::from(a % 5),
                defender_dice: u32::from(d % 4),
            },
            Self::Occupy(n) => Command::ConquestMove { armies: u32::from(n % 8) },
            Self::EndAttack => Command::EndAttack,
            Self::FortifyFrom(t) => Command::SelectFortifyFrom { territory: territory(t) },
            Self::FortifyTo(t) => Command::SelectFortifyTo { territory: territory(t) },
            Self::Fortify(n) => Command::Fortify { armies: u32::from(n % 8) },
            Self::Ai => return None,
        })
    }
}

/// Structured input for command fuzzing.
#[derive(Arbitrary, Debug)]
struct CommandInput {
    seed: u64,
    sequential: bool,
    commands: Vec<FuzzCommand>,
}

fuzz_target!(|input: CommandInput| {
    let settings = GameSettings {
        placement_mode: if input.sequential {
            PlacementMode::Sequential
        } else {
            PlacementMode::Random
        },
        map_id: "duel".to_string(),
        ..GameSettings::default()
    };
    let catalog = MapCatalog::builtin();
    let Ok(mut engine) = Engine::new(catalog.clone(), settings, input.seed) else {
        return;
    };
    if !engine.init_game(&GameSetup::numbered_ai(2)) {
        return;
    }

    for fuzz_command in input.commands.iter().take(200) {
        match fuzz_command.to_command() {
            Some(command) => {
                let (next, accepted) = reduce(engine.game(), &command);
                if !accepted {
                    assert_eq!(next.state(), engine.state());
                }
                let dispatched = engine.dispatch(command);
                assert_eq!(dispatched, accepted);
                assert_eq!(next.state(), engine.state());
            }
            None => {
                engine.play_ai_turn();
            }
        }

        let violations = check_invariants(engine.state());
        assert!(violations.is_empty(), "Invariants violated: {violations:?}");
    }

    let bytes = encode(engine.game()).expect("snapshot encodes");
    let loaded = decode(&bytes, &catalog).expect("snapshot decodes");
    assert_eq!(loaded.state(), engine.state());
});
