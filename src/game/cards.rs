//! Card economy: deck building, draws, and set redemption.
//!
//! # Sets
//!
//! A hand is scanned for the best available set, highest award first:
//!
//! | Set                  | Award |
//! |----------------------|-------|
//! | one of each type     | 10    |
//! | three artillery      | 8     |
//! | three cavalry        | 6     |
//! | three infantry       | 4     |
//!
//! Wild cards stand in for any missing card. Redemption consumes named cards
//! first and only spends wilds to cover a shortfall.

use serde::{Deserialize, Serialize};

use crate::game::MapDefinition;
use crate::rng::GameRng;

/// Hand size at which redemption becomes mandatory.
pub const FORCED_REDEMPTION_HAND: usize = 5;

/// Upper bound on forced redemptions in a row.
pub const MAX_FORCED_REDEMPTIONS: usize = 5;

/// Wild cards added to a fresh deck.
pub const WILD_CARDS_PER_DECK: usize = 2;

/// Card type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    /// Infantry.
    Infantry,
    /// Cavalry.
    Cavalry,
    /// Artillery.
    Artillery,
    /// Substitutes for any type.
    Wild,
}

/// The three named (non-wild) kinds, in deck-building order.
const NAMED_KINDS: [CardKind; 3] = [CardKind::Infantry, CardKind::Cavalry, CardKind::Artillery];

/// A reinforcement card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Card type.
    pub kind: CardKind,
    /// Territory pictured on the card, if any.
    pub territory: Option<String>,
}

impl Card {
    /// Create a card.
    #[must_use]
    pub const fn new(kind: CardKind, territory: Option<String>) -> Self {
        Self { kind, territory }
    }

    /// A wild card with no territory.
    #[must_use]
    pub const fn wild() -> Self {
        Self::new(CardKind::Wild, None)
    }
}

/// A redeemable combination of three cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardSet {
    /// Infantry + cavalry + artillery.
    OneOfEach,
    /// Three artillery.
    ThreeArtillery,
    /// Three cavalry.
    ThreeCavalry,
    /// Three infantry.
    ThreeInfantry,
}

impl CardSet {
    /// Sets in priority order.
    pub const PRIORITY: [CardSet; 4] = [
        CardSet::OneOfEach,
        CardSet::ThreeArtillery,
        CardSet::ThreeCavalry,
        CardSet::ThreeInfantry,
    ];

    /// Armies awarded for redeeming this set.
    #[must_use]
    pub const fn award(self) -> u32 {
        match self {
            CardSet::OneOfEach => 10,
            CardSet::ThreeArtillery => 8,
            CardSet::ThreeCavalry => 6,
            CardSet::ThreeInfantry => 4,
        }
    }

    /// The named kinds this set requires, one entry per card.
    const fn requirement(self) -> [CardKind; 3] {
        match self {
            CardSet::OneOfEach => NAMED_KINDS,
            CardSet::ThreeArtillery => [CardKind::Artillery; 3],
            CardSet::ThreeCavalry => [CardKind::Cavalry; 3],
            CardSet::ThreeInfantry => [CardKind::Infantry; 3],
        }
    }
}

/// Per-kind card counts for a hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct HandCounts {
    infantry: usize,
    cavalry: usize,
    artillery: usize,
    wild: usize,
}

impl HandCounts {
    fn of(hand: &[Card]) -> Self {
        let mut counts = Self::default();
        for card in hand {
            match card.kind {
                CardKind::Infantry => counts.infantry += 1,
                CardKind::Cavalry => counts.cavalry += 1,
                CardKind::Artillery => counts.artillery += 1,
                CardKind::Wild => counts.wild += 1,
            }
        }
        counts
    }

    const fn named(&self, kind: CardKind) -> usize {
        match kind {
            CardKind::Infantry => self.infantry,
            CardKind::Cavalry => self.cavalry,
            CardKind::Artillery => self.artillery,
            CardKind::Wild => self.wild,
        }
    }

    fn can_form(&self, set: CardSet) -> bool {
        let shortfall = match set {
            CardSet::OneOfEach => NAMED_KINDS.iter().filter(|&&k| self.named(k) == 0).count(),
            _ => 3usize.saturating_sub(self.named(set.requirement()[0])),
        };
        shortfall <= self.wild
    }
}

/// Build an unshuffled deck for a map.
///
/// One card per territory, kinds cycling infantry, cavalry, artillery in
/// map order, followed by [`WILD_CARDS_PER_DECK`] wilds.
#[must_use]
pub fn build_deck(map: &MapDefinition) -> Vec<Card> {
    let mut deck: Vec<Card> = map
        .territories()
        .iter()
        .zip(NAMED_KINDS.iter().cycle())
        .map(|(territory, &kind)| Card::new(kind, Some(territory.id.clone())))
        .collect();
    deck.extend(std::iter::repeat_with(Card::wild).take(WILD_CARDS_PER_DECK));
    deck
}

/// Build and shuffle a deck for a map.
#[must_use]
pub fn shuffled_deck(map: &MapDefinition, rng: &mut GameRng) -> Vec<Card> {
    let mut deck = build_deck(map);
    rng.shuffle(&mut deck);
    deck
}

/// Draw the top card, or mint a wild if the deck is exhausted.
pub fn draw(deck: &mut Vec<Card>) -> Card {
    deck.pop().unwrap_or_else(Card::wild)
}

/// The highest-priority set this hand can form.
#[must_use]
pub fn best_set(hand: &[Card]) -> Option<CardSet> {
    let counts = HandCounts::of(hand);
    CardSet::PRIORITY
        .into_iter()
        .find(|&set| counts.can_form(set))
}

/// Remove the best available set from `hand`.
///
/// Returns the redeemed set, or `None` (hand untouched) if no set qualifies.
pub fn redeem(hand: &mut Vec<Card>) -> Option<CardSet> {
    let set = best_set(hand)?;

    for kind in set.requirement() {
        let position = hand
            .iter()
            .position(|card| card.kind == kind)
            .or_else(|| hand.iter().position(|card| card.kind == CardKind::Wild));
        if let Some(position) = position {
            hand.remove(position);
        }
    }

    Some(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::classic_map;

    fn hand(kinds: &[CardKind]) -> Vec<Card> {
        kinds.iter().map(|&kind| Card::new(kind, None)).collect()
    }

    use super::CardKind::{Artillery as A, Cavalry as C, Infantry as I, Wild as W};

    #[test]
    fn test_deck_composition() {
        let map = classic_map().unwrap();
        let deck = build_deck(&map);

        assert_eq!(deck.len(), 44);
        let counts = HandCounts::of(&deck);
        assert_eq!(counts.infantry, 14);
        assert_eq!(counts.cavalry, 14);
        assert_eq!(counts.artillery, 14);
        assert_eq!(counts.wild, 2);
        assert!(deck[..42].iter().all(|c| c.territory.is_some()));
    }

    #[test]
    fn test_shuffled_deck_is_permutation() {
        let map = classic_map().unwrap();
        let mut rng = GameRng::seeded(3);
        let deck = shuffled_deck(&map, &mut rng);
        assert_eq!(deck.len(), 44);
        assert_eq!(HandCounts::of(&deck), HandCounts::of(&build_deck(&map)));
    }

    #[test]
    fn test_draw_from_empty_deck_is_wild() {
        let mut deck = Vec::new();
        assert_eq!(draw(&mut deck), Card::wild());
    }

    #[test]
    fn test_set_awards() {
        assert_eq!(CardSet::OneOfEach.award(), 10);
        assert_eq!(CardSet::ThreeArtillery.award(), 8);
        assert_eq!(CardSet::ThreeCavalry.award(), 6);
        assert_eq!(CardSet::ThreeInfantry.award(), 4);
    }

    #[test]
    fn test_one_of_each_beats_triples() {
        assert_eq!(best_set(&hand(&[I, C, A])), Some(CardSet::OneOfEach));
        assert_eq!(best_set(&hand(&[I, I, I, C, A])), Some(CardSet::OneOfEach));
        assert_eq!(best_set(&hand(&[A, C, W, W])), Some(CardSet::OneOfEach));
    }

    #[test]
    fn test_triples_in_priority_order() {
        assert_eq!(best_set(&hand(&[A, A, A])), Some(CardSet::ThreeArtillery));
        assert_eq!(best_set(&hand(&[A, A, A, W])), Some(CardSet::ThreeArtillery));
        assert_eq!(best_set(&hand(&[C, C, C])), Some(CardSet::ThreeCavalry));
        assert_eq!(best_set(&hand(&[I, I, I])), Some(CardSet::ThreeInfantry));
        assert_eq!(best_set(&hand(&[I, I, W])), Some(CardSet::ThreeInfantry));
    }

    #[test]
    fn test_no_set() {
        assert_eq!(best_set(&hand(&[])), None);
        assert_eq!(best_set(&hand(&[I, C])), None);
        assert_eq!(best_set(&hand(&[I, I, C, C])), None);
    }

    #[test]
    fn test_wild_fills_one_of_each() {
        assert_eq!(best_set(&hand(&[I, C, W])), Some(CardSet::OneOfEach));
        assert_eq!(best_set(&hand(&[I, W, W])), Some(CardSet::OneOfEach));
        assert_eq!(best_set(&hand(&[W, W, W])), Some(CardSet::OneOfEach));
    }

    #[test]
    fn test_redeem_prefers_named_cards() {
        let mut cards = hand(&[W, I, C, A, W]);
        assert_eq!(redeem(&mut cards), Some(CardSet::OneOfEach));
        assert_eq!(cards, hand(&[W, W]));
    }

    #[test]
    fn test_redeem_spends_wild_for_shortfall() {
        let mut cards = hand(&[C, C, W, I]);
        assert_eq!(redeem(&mut cards), Some(CardSet::OneOfEach));
        assert_eq!(cards, hand(&[C]));
    }

    #[test]
    fn test_redeem_triple_leaves_rest() {
        let mut cards = hand(&[C, C, I, C, I]);
        assert_eq!(redeem(&mut cards), Some(CardSet::ThreeCavalry));
        assert_eq!(cards, hand(&[I, I]));
    }

    #[test]
    fn test_redeem_without_set_leaves_hand() {
        let mut cards = hand(&[I, C]);
        assert_eq!(redeem(&mut cards), None);
        assert_eq!(cards.len(), 2);
    }
}
