//! The phase state machine.
//!
//! [`Game`] pairs a [`GameState`] with its map and owns every rule. All
//! mutation goes through [`Game::apply`]; the named operations are thin
//! wrappers that build the matching [`Command`]. Rejected operations return
//! `false` and leave the state untouched.
//!
//! Phase advances the rules force (the turn-1 fortify skip, draft
//! recomputation, forced card redemption) happen inside the accepting
//! command, so a command always leaves the game in a settled state.

use std::sync::Arc;

use crate::config::{AttackMode, GameSettings, GameSetup, PlacementMode};
use crate::error::SetupError;
use crate::game::cards::{self, CardSet, FORCED_REDEMPTION_HAND, MAX_FORCED_REDEMPTIONS};
use crate::game::combat::{self, MAX_INSTANT_ROUNDS};
use crate::game::victory;
use crate::game::{
    Command, GameState, HistoryAction, HistoryEntry, MAX_PLAYERS, MIN_PLAYERS, MapDefinition,
    Phase, PlacementStage, Player, PlayerId, TerritoryState,
};
use crate::rng::GameRng;

/// Reserve each seat distributes after sequential claiming.
pub const SEQUENTIAL_RESERVE: u32 = 6;

/// Draft given to the first player after random placement.
pub const OPENING_DRAFT: u32 = 6;

/// Floor of the per-turn draft.
pub const MIN_DRAFT_ARMIES: u32 = 3;

/// Owned territories per draft army.
pub const TERRITORIES_PER_ARMY: usize = 3;

/// Everything that, when changed, invalidates scheduled work.
type TurnMarker = (Phase, Option<PlacementStage>, usize, u32);

fn seat_id(seat: usize) -> PlayerId {
    PlayerId::try_from(seat).unwrap_or(PlayerId::MAX)
}

/// A game in progress: its state plus the map it is played on.
#[derive(Debug, Clone)]
pub struct Game {
    map: Arc<MapDefinition>,
    state: GameState,
}

impl Game {
    /// A setup-phase game on `map`.
    #[must_use]
    pub fn new(map: Arc<MapDefinition>, settings: GameSettings, seed: u64) -> Self {
        let state = GameState::new(&map, settings, seed);
        Self { map, state }
    }

    /// Rebuild a game from a state that was already validated against `map`.
    #[must_use]
    pub fn from_parts(map: Arc<MapDefinition>, state: GameState) -> Self {
        Self { map, state }
    }

    /// The map.
    #[must_use]
    pub fn map(&self) -> &MapDefinition {
        &self.map
    }

    /// Shared handle to the map.
    #[must_use]
    pub fn map_handle(&self) -> &Arc<MapDefinition> {
        &self.map
    }

    /// The state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Consume the game, keeping its state.
    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    /// Current scheduling generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    /// Random stream reserved for AI choices.
    pub fn ai_rng_mut(&mut self) -> &mut GameRng {
        &mut self.state.ai_rng
    }

    /// Discard the game and return to the setup phase on the same map.
    ///
    /// Settings and seed are kept. The generation keeps counting so work
    /// scheduled against the old game is recognisably stale.
    pub fn reset(&mut self) {
        let generation = self.state.generation + 1;
        let settings = self.state.settings.clone();
        self.state = GameState::new(&self.map, settings, self.state.seed);
        self.state.generation = generation;
        tracing::debug!(target: "conquest::rules", generation, "rules.reset");
    }

    /// Start a game with the given roster.
    ///
    /// Everything is validated before anything changes, so an error leaves
    /// the game as it was.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the roster is too small or too large, a name
    /// is blank, or the map has fewer territories than players.
    pub fn init_game(&mut self, setup: &GameSetup) -> Result<(), SetupError> {
        let count = setup.names.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return Err(SetupError::PlayerCount {
                count,
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
            });
        }
        if let Some(seat) = setup.names.iter().position(|n| n.trim().is_empty()) {
            return Err(SetupError::EmptyName(seat));
        }
        let territories = self.map.territories().len();
        if territories < count {
            return Err(SetupError::TooFewTerritories {
                territories,
                players: count,
            });
        }

        let mut settings = self.state.settings.clone();
        if let Some(mode) = setup.placement_override {
            settings.placement_mode = mode;
        }
        let generation = self.state.generation + 1;
        let mut state = GameState::new(&self.map, settings, self.state.seed);
        state.generation = generation;

        let human_count = setup.human_count.min(count);
        state.players = setup
            .names
            .iter()
            .enumerate()
            .map(|(seat, name)| {
                let color = setup
                    .custom_colors
                    .get(seat)
                    .cloned()
                    .flatten()
                    .unwrap_or_else(|| Player::default_color(seat).to_string());
                Player::new(seat_id(seat), name.trim(), color, seat < human_count)
            })
            .collect();
        state.cards_deck = cards::shuffled_deck(&self.map, &mut state.rng);

        match state.settings.placement_mode {
            PlacementMode::Sequential => {
                state.phase = Phase::Placement;
                state.placement_stage = Some(PlacementStage::Claim);
                state.placement_reserves = vec![SEQUENTIAL_RESERVE; count];
                state.turn = 0;
            }
            PlacementMode::Random => {
                let mut ids: Vec<String> = state.territories.keys().cloned().collect();
                state.rng.shuffle(&mut ids);
                for (i, id) in ids.iter().enumerate() {
                    if let Some(territory) = state.territories.get_mut(id) {
                        territory.owner = Some(seat_id(i % count));
                        territory.armies = 1;
                    }
                }
                state.placement_reserves = vec![0; count];
                state.phase = Phase::Draft;
                state.turn = 1;
                state.draft_armies = OPENING_DRAFT;
            }
        }

        self.state = state;
        self.record(
            HistoryAction::GameStarted,
            None,
            format!("{count} players on {}", self.map.name()),
        );
        tracing::info!(
            target: "conquest::rules",
            map = self.map.id(),
            players = count,
            humans = human_count,
            placement = ?self.state.settings.placement_mode,
            "rules.game_started"
        );
        Ok(())
    }

    /// Apply a command, returning whether it was accepted.
    pub fn apply(&mut self, command: &Command) -> bool {
        let before = self.marker();
        let accepted = match command {
            Command::PlaceArmy { territory } => self.place(territory),
            Command::RedeemCards => self.redeem_at_will(),
            Command::SelectAttackFrom { territory } => self.pick_attack_from(territory),
            Command::SelectAttackTo { territory } => self.pick_attack_to(territory),
            Command::Attack {
                attacker_dice,
                defender_dice,
            } => self.attack(*attacker_dice, *defender_dice),
            Command::ConquestMove { armies } => self.occupy(*armies),
            Command::EndAttack => self.close_attack_phase(),
            Command::SelectFortifyFrom { territory } => self.pick_fortify_from(territory),
            Command::SelectFortifyTo { territory } => self.pick_fortify_to(territory),
            Command::Fortify { armies } => self.fortify(*armies),
        };

        if accepted {
            tracing::trace!(target: "conquest::rules", ?command, "rules.command_accepted");
            if self.marker() != before {
                self.state.generation += 1;
                tracing::debug!(
                    target: "conquest::rules",
                    phase = ?self.state.phase,
                    player = self.state.current_player_index,
                    turn = self.state.turn,
                    generation = self.state.generation,
                    "rules.phase_changed"
                );
            }
        } else {
            tracing::debug!(target: "conquest::rules", ?command, phase = ?self.state.phase, "rules.command_rejected");
        }
        accepted
    }

    // Named operations.

    /// Claim, reinforce or draft one army onto `territory`, depending on phase.
    pub fn place_army(&mut self, territory: &str) -> bool {
        self.apply(&Command::PlaceArmy {
            territory: territory.to_string(),
        })
    }

    fn place(&mut self, territory: &str) -> bool {
        match (self.state.phase, self.state.placement_stage) {
            (Phase::Placement, Some(PlacementStage::Claim)) => self.claim(territory),
            (Phase::Placement, Some(PlacementStage::Distribute)) => self.distribute(territory),
            (Phase::Draft, _) => self.draft(territory),
            _ => false,
        }
    }

    /// Draft one army; accepted only during the draft phase.
    pub fn place_draft_army(&mut self, territory: &str) -> bool {
        self.state.phase == Phase::Draft
            && self.apply(&Command::PlaceArmy {
                territory: territory.to_string(),
            })
    }

    /// Redeem the best card set before placing any draft army.
    pub fn redeem_cards(&mut self) -> bool {
        self.apply(&Command::RedeemCards)
    }

    /// Choose the attacking territory.
    pub fn select_attack_from(&mut self, territory: &str) -> bool {
        self.apply(&Command::SelectAttackFrom {
            territory: territory.to_string(),
        })
    }

    /// Choose the defending territory.
    pub fn select_attack_to(&mut self, territory: &str) -> bool {
        self.apply(&Command::SelectAttackTo {
            territory: territory.to_string(),
        })
    }

    /// Roll for the selected attack.
    pub fn execute_attack(&mut self, attacker_dice: u32, defender_dice: u32) -> bool {
        self.apply(&Command::Attack {
            attacker_dice,
            defender_dice,
        })
    }

    /// Move `armies` into the territory just conquered.
    pub fn conquest_move(&mut self, armies: u32) -> bool {
        self.apply(&Command::ConquestMove { armies })
    }

    /// Stop attacking and move on to fortify.
    pub fn end_attack_phase(&mut self) -> bool {
        self.apply(&Command::EndAttack)
    }

    /// Choose the fortify source.
    pub fn select_fortify_from(&mut self, territory: &str) -> bool {
        self.apply(&Command::SelectFortifyFrom {
            territory: territory.to_string(),
        })
    }

    /// Choose the fortify destination.
    pub fn select_fortify_to(&mut self, territory: &str) -> bool {
        self.apply(&Command::SelectFortifyTo {
            territory: territory.to_string(),
        })
    }

    /// Move `armies` along the fortify selection and end the turn.
    pub fn execute_fortify(&mut self, armies: u32) -> bool {
        self.apply(&Command::Fortify { armies })
    }

    // Queries.

    /// The player whose turn it is.
    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.state.current_player()
    }

    /// Whether the player to move is an alive AI and the game is live.
    #[must_use]
    pub fn is_ai_turn(&self) -> bool {
        self.state.phase != Phase::Setup
            && self.winner().is_none()
            && self.current_player().is_some_and(|p| p.alive && p.is_ai())
    }

    /// Dynamic state of a territory.
    #[must_use]
    pub fn get_territory_state(&self, id: &str) -> Option<&TerritoryState> {
        self.state.territory(id)
    }

    /// Ids of territories owned by `player`, in id order.
    #[must_use]
    pub fn get_player_territories(&self, player: PlayerId) -> Vec<String> {
        self.state
            .territories_owned_by(player)
            .map(|t| t.id.clone())
            .collect()
    }

    /// Neighbours of `id` owned by someone other than its owner, in id order.
    #[must_use]
    pub fn get_adjacent_enemy_territories(&self, id: &str) -> Vec<String> {
        let Some(owner) = self.state.territory(id).map(|t| t.owner) else {
            return Vec::new();
        };
        let mut enemies: Vec<String> = self
            .map
            .neighbors(id)
            .iter()
            .filter(|n| self.state.territory(n).is_some_and(|t| t.owner != owner))
            .cloned()
            .collect();
        enemies.sort_unstable();
        enemies
    }

    /// Whether `player` owns every territory of `continent`.
    #[must_use]
    pub fn owns_continent(&self, player: PlayerId, continent: &str) -> bool {
        self.map
            .continent_territories(continent)
            .all(|t| self.state.territory(&t.id).is_some_and(|s| s.is_owned_by(player)))
    }

    /// Draft the current player is owed at the start of a turn.
    #[must_use]
    pub fn calculate_draft_armies(&self) -> u32 {
        self.state
            .current_player_id()
            .map_or(0, |player| self.draft_armies_for(player))
    }

    /// `max(3, owned / 3)` plus the bonus of every fully owned continent.
    #[must_use]
    pub fn draft_armies_for(&self, player: PlayerId) -> u32 {
        let owned = self.state.count_territories(player) / TERRITORIES_PER_ARMY;
        let base = u32::try_from(owned)
            .unwrap_or(u32::MAX)
            .max(MIN_DRAFT_ARMIES);
        let bonus: u32 = self
            .map
            .continents()
            .iter()
            .filter(|c| self.owns_continent(player, &c.id))
            .map(|c| c.bonus)
            .sum();
        base.saturating_add(bonus)
    }

    /// Refresh liveness and report the winner, if any.
    pub fn check_win_condition(&mut self) -> Option<PlayerId> {
        let winner = victory::check_win_condition(&mut self.state)?;
        if self.state.history.last_of(HistoryAction::Victory).is_none() {
            let name = self
                .state
                .get_player(winner)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            self.record(HistoryAction::Victory, None, format!("{name} wins"));
            tracing::info!(target: "conquest::rules", winner, turn = self.state.turn, "rules.victory");
        }
        Some(winner)
    }

    /// The player owning every territory, if any.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        victory::sole_owner(&self.state)
    }

    /// Most recent history entry.
    #[must_use]
    pub fn last_action(&self) -> Option<&HistoryEntry> {
        self.state.history.last()
    }

    // Placement.

    fn claim(&mut self, id: &str) -> bool {
        let Some(player) = self.state.current_player_id() else {
            return false;
        };
        let Some(territory) = self.state.territories.get_mut(id) else {
            return false;
        };
        if territory.owner.is_some() {
            return false;
        }
        territory.owner = Some(player);
        territory.armies = 1;
        self.record(HistoryAction::Claim, Some(id), "claimed");

        let count = self.state.players.len();
        self.state.current_player_index = (self.state.current_player_index + 1) % count;

        if self.state.neutral_territories().next().is_none() {
            self.state.placement_stage = Some(PlacementStage::Distribute);
            match self.next_with_reserve(self.state.current_player_index) {
                Some(seat) => {
                    self.state.current_player_index = seat;
                    self.state.draft_armies = self.reserve_of(seat);
                }
                None => self.finish_placement(),
            }
            tracing::debug!(target: "conquest::rules", "rules.claims_complete");
        }
        true
    }

    fn distribute(&mut self, id: &str) -> bool {
        let seat = self.state.current_player_index;
        let Some(player) = self.state.current_player_id() else {
            return false;
        };
        if self.reserve_of(seat) == 0
            || !self.state.territory(id).is_some_and(|t| t.is_owned_by(player))
        {
            return false;
        }

        self.add_armies(id, 1);
        if let Some(reserve) = self.state.placement_reserves.get_mut(seat) {
            *reserve -= 1;
        }
        self.record(HistoryAction::Reinforce, Some(id), "+1");

        let count = self.state.players.len();
        match self.next_with_reserve((seat + 1) % count) {
            Some(next) => {
                self.state.current_player_index = next;
                self.state.draft_armies = self.reserve_of(next);
            }
            None => self.finish_placement(),
        }
        true
    }

    fn reserve_of(&self, seat: usize) -> u32 {
        self.state.placement_reserves.get(seat).copied().unwrap_or(0)
    }

    /// First seat at or after `start` (wrapping) with reserve left.
    fn next_with_reserve(&self, start: usize) -> Option<usize> {
        let count = self.state.players.len();
        (0..count)
            .map(|offset| (start + offset) % count)
            .find(|&seat| self.reserve_of(seat) > 0)
    }

    fn finish_placement(&mut self) {
        self.state.phase = Phase::Draft;
        self.state.placement_stage = None;
        self.state.turn = 1;
        self.state.current_player_index = 0;
        self.state.draft_has_placed = false;
        self.state.draft_armies = self.calculate_draft_armies();
        self.force_redemption();
        tracing::info!(target: "conquest::rules", "rules.placement_complete");
    }

    // Draft.

    fn draft(&mut self, id: &str) -> bool {
        let Some(player) = self.state.current_player_id() else {
            return false;
        };
        if !self.state.territory(id).is_some_and(|t| t.is_owned_by(player)) {
            return false;
        }
        if !self.state.draft_has_placed {
            if self.hand_after_forced_redemption() >= FORCED_REDEMPTION_HAND {
                return false;
            }
            self.force_redemption();
        }
        if self.state.draft_armies == 0 {
            return false;
        }

        self.add_armies(id, 1);
        self.state.draft_armies -= 1;
        self.state.draft_has_placed = true;
        self.record(HistoryAction::Draft, Some(id), "+1");

        if self.state.draft_armies == 0 {
            if self.state.turn <= 1 {
                self.end_turn();
            } else {
                self.state.phase = Phase::Attack;
            }
        }
        true
    }

    fn redeem_at_will(&mut self) -> bool {
        self.state.phase == Phase::Draft
            && !self.state.draft_has_placed
            && self.redeem_for_current().is_some()
    }

    fn hand_size(&self) -> usize {
        self.current_player().map_or(0, |p| p.cards.len())
    }

    fn redeem_for_current(&mut self) -> Option<CardSet> {
        let seat = self.state.current_player_index;
        let player = self.state.players.get_mut(seat)?;
        let set = cards::redeem(&mut player.cards)?;
        self.state.draft_armies += set.award();
        self.record(
            HistoryAction::Redeem,
            None,
            format!("{set:?} for {}", set.award()),
        );
        tracing::debug!(target: "conquest::rules", seat, set = ?set, award = set.award(), "rules.cards_redeemed");
        Some(set)
    }

    /// Hand size the current player would hold once forced redemption ran.
    fn hand_after_forced_redemption(&self) -> usize {
        let mut hand = self.current_player().map(|p| p.cards.clone()).unwrap_or_default();
        let mut redeemed = 0;
        while redeemed < MAX_FORCED_REDEMPTIONS
            && hand.len() >= FORCED_REDEMPTION_HAND
            && cards::redeem(&mut hand).is_some()
        {
            redeemed += 1;
        }
        hand.len()
    }

    /// Redeem while the hand is at the forced size, up to the cap.
    fn force_redemption(&mut self) -> usize {
        let mut redeemed = 0;
        while redeemed < MAX_FORCED_REDEMPTIONS
            && self.hand_size() >= FORCED_REDEMPTION_HAND
            && self.redeem_for_current().is_some()
        {
            redeemed += 1;
        }
        redeemed
    }

    // Attack.

    fn can_attack_from(&self, id: &str) -> bool {
        let Some(player) = self.state.current_player_id() else {
            return false;
        };
        self.state
            .territory(id)
            .is_some_and(|t| t.is_owned_by(player) && t.armies > 1)
    }

    fn is_attack_target(&self, from: &str, to: &str) -> bool {
        let Some(player) = self.state.current_player_id() else {
            return false;
        };
        self.map.are_adjacent(from, to)
            && self.state.territory(to).is_some_and(|t| !t.is_owned_by(player))
    }

    fn attack_window_open(&self) -> bool {
        self.state.phase == Phase::Attack && !self.state.conquest_pending()
    }

    fn pick_attack_from(&mut self, id: &str) -> bool {
        if !self.attack_window_open() || !self.can_attack_from(id) {
            return false;
        }
        self.state.attack_from = Some(id.to_string());
        self.state.attack_to = None;
        self.state.last_battle_result = None;
        true
    }

    fn pick_attack_to(&mut self, id: &str) -> bool {
        if !self.attack_window_open() {
            return false;
        }
        let Some(from) = self.state.attack_from.as_deref() else {
            return false;
        };
        if !self.is_attack_target(from, id) {
            return false;
        }
        self.state.attack_to = Some(id.to_string());
        true
    }

    fn attack(&mut self, attacker_dice: u32, defender_dice: u32) -> bool {
        if !self.attack_window_open() {
            return false;
        }
        let (Some(from), Some(to)) = (self.state.attack_from.clone(), self.state.attack_to.clone())
        else {
            return false;
        };
        if !self.can_attack_from(&from) || !self.is_attack_target(&from, &to) {
            return false;
        }

        let max_rounds = match self.state.settings.attack_mode {
            AttackMode::Single => 1,
            AttackMode::Instant => MAX_INSTANT_ROUNDS,
        };
        let mut rounds = 0;
        let mut attacker_losses = 0;
        let mut defender_losses = 0;
        let mut conquered = false;
        while rounds < max_rounds && self.armies(&from) > 1 {
            let outcome = combat::resolve_battle(
                self.armies(&from),
                self.armies(&to),
                attacker_dice,
                defender_dice,
                &mut self.state.rng,
            );
            self.set_armies(&from, outcome.attacker_remaining);
            self.set_armies(&to, outcome.defender_remaining);
            rounds += 1;
            attacker_losses += outcome.result.attacker_losses;
            defender_losses += outcome.result.defender_losses;
            conquered = outcome.result.conquered;
            self.state.last_battle_result = Some(outcome.result);
            if conquered {
                self.state.conquest_made_this_turn = true;
                break;
            }
        }

        let summary = if conquered {
            format!("{from} took {to} (-{attacker_losses}/-{defender_losses})")
        } else {
            format!("{from} vs {to} (-{attacker_losses}/-{defender_losses})")
        };
        self.record(HistoryAction::Attack, Some(&to), summary);
        tracing::debug!(
            target: "conquest::combat",
            from = %from,
            to = %to,
            rounds,
            attacker_losses,
            defender_losses,
            conquered,
            "combat.resolved"
        );
        true
    }

    fn occupy(&mut self, armies: u32) -> bool {
        if self.state.phase != Phase::Attack || !self.state.conquest_pending() {
            return false;
        }
        let (Some(from), Some(to)) = (self.state.attack_from.clone(), self.state.attack_to.clone())
        else {
            return false;
        };
        let Some(player) = self.state.current_player_id() else {
            return false;
        };
        let source = self.armies(&from);
        if armies < 1 || armies >= source {
            return false;
        }

        let defeated = self.state.territory(&to).and_then(|t| t.owner);
        if let Some(territory) = self.state.territories.get_mut(&to) {
            territory.owner = Some(player);
            territory.armies = armies;
        }
        self.set_armies(&from, source - armies);
        self.state.attack_from = None;
        self.state.attack_to = None;
        self.state.last_battle_result = None;
        self.record(HistoryAction::Conquest, Some(&to), format!("moved {armies}"));

        if let Some(defeated) = defeated.filter(|&d| d != player) {
            self.eliminate_if_empty(defeated, player);
        }
        self.check_win_condition();
        true
    }

    /// Knock `defeated` out if they own nothing, handing their cards to `victor`.
    fn eliminate_if_empty(&mut self, defeated: PlayerId, victor: PlayerId) {
        if self.state.count_territories(defeated) > 0 {
            return;
        }
        let Some(loser) = self.state.get_player_mut(defeated) else {
            return;
        };
        loser.eliminate();
        let spoils = loser.take_cards();
        let name = loser.name.clone();
        let card_count = spoils.len();
        if let Some(winner) = self.state.get_player_mut(victor) {
            winner.cards.extend(spoils);
        }
        self.record(
            HistoryAction::Elimination,
            None,
            format!("{name} eliminated, {card_count} cards taken"),
        );
        tracing::info!(target: "conquest::rules", defeated, victor, cards = card_count, "rules.player_eliminated");
    }

    fn close_attack_phase(&mut self) -> bool {
        if !self.attack_window_open() {
            return false;
        }
        if self.state.conquest_made_this_turn {
            let card = cards::draw(&mut self.state.cards_deck);
            let kind = card.kind;
            if let Some(player) = self.state.players.get_mut(self.state.current_player_index) {
                player.cards.push(card);
            }
            self.record(HistoryAction::CardDrawn, None, format!("{kind:?}"));
        }
        self.state.clear_selections();
        self.state.phase = Phase::Fortify;
        true
    }

    // Fortify.

    fn owned_by_current(&self, id: &str) -> bool {
        self.state
            .current_player_id()
            .is_some_and(|player| self.state.territory(id).is_some_and(|t| t.is_owned_by(player)))
    }

    fn pick_fortify_from(&mut self, id: &str) -> bool {
        if self.state.phase != Phase::Fortify || !self.owned_by_current(id) {
            return false;
        }
        self.state.fortify_from = Some(id.to_string());
        self.state.fortify_to = None;
        true
    }

    fn pick_fortify_to(&mut self, id: &str) -> bool {
        if self.state.phase != Phase::Fortify {
            return false;
        }
        let Some(from) = self.state.fortify_from.as_deref() else {
            return false;
        };
        if from == id || !self.owned_by_current(id) || !self.map.are_adjacent(from, id) {
            return false;
        }
        self.state.fortify_to = Some(id.to_string());
        true
    }

    fn fortify(&mut self, armies: u32) -> bool {
        if self.state.phase != Phase::Fortify {
            return false;
        }
        let selection = self.state.fortify_from.clone().zip(self.state.fortify_to.clone());
        if armies > 0
            && let Some((from, to)) = selection
        {
            let source = self.armies(&from);
            if armies >= source
                || !self.owned_by_current(&from)
                || !self.owned_by_current(&to)
                || !self.map.are_adjacent(&from, &to)
            {
                return false;
            }
            self.set_armies(&from, source - armies);
            self.add_armies(&to, armies);
            self.record(HistoryAction::Fortify, Some(&to), format!("{armies} from {from}"));
        }
        self.end_turn();
        true
    }

    /// Pass play to the next alive player and open their draft.
    fn end_turn(&mut self) {
        let count = self.state.players.len();
        if count == 0 {
            return;
        }
        self.record(HistoryAction::EndTurn, None, "turn ended");

        let current = self.state.current_player_index;
        let next = (1..=count)
            .map(|offset| (current + offset) % count)
            .find(|&seat| self.state.players.get(seat).is_some_and(|p| p.alive))
            .unwrap_or(current);
        let first_alive = self.state.players.iter().position(|p| p.alive).unwrap_or(0);
        if next == first_alive {
            self.state.turn += 1;
        }

        self.state.current_player_index = next;
        self.state.phase = Phase::Draft;
        self.state.clear_selections();
        self.state.conquest_made_this_turn = false;
        self.state.draft_has_placed = false;
        self.state.draft_armies = self.calculate_draft_armies();
        self.force_redemption();
    }

    // Helpers.

    fn armies(&self, id: &str) -> u32 {
        self.state.territory(id).map_or(0, |t| t.armies)
    }

    fn set_armies(&mut self, id: &str, armies: u32) {
        if let Some(territory) = self.state.territories.get_mut(id) {
            territory.armies = armies;
        }
    }

    fn add_armies(&mut self, id: &str, armies: u32) {
        if let Some(territory) = self.state.territories.get_mut(id) {
            territory.armies += armies;
        }
    }

    fn record(&mut self, action: HistoryAction, territory: Option<&str>, result: impl Into<String>) {
        let player = self.state.current_player_id();
        let turn = self.state.turn;
        self.state.history.record(turn, player, action, territory, result);
    }

    fn marker(&self) -> TurnMarker {
        (
            self.state.phase,
            self.state.placement_stage,
            self.state.current_player_index,
            self.state.turn,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::{classic_map, duel_map};
    use crate::game::{Card, CardKind, check_invariants};

    fn duel(mode: PlacementMode, seed: u64) -> Game {
        let settings = GameSettings {
            placement_mode: mode,
            map_id: "duel".to_string(),
            ..GameSettings::default()
        };
        let mut game = Game::new(Arc::new(duel_map().unwrap()), settings, seed);
        game.init_game(&GameSetup::numbered_ai(2)).unwrap();
        game
    }

    /// Duel map split west/east with fixed armies; player 0 to draft on turn 2.
    fn split_duel() -> Game {
        let mut game = duel(PlacementMode::Random, 1);
        for territory in game.state.territories.values_mut() {
            let west = ["harbor", "mill", "ridge", "ford"].contains(&territory.id.as_str());
            territory.owner = Some(if west { 0 } else { 1 });
            territory.armies = 3;
        }
        game.state.turn = 2;
        game.state.current_player_index = 0;
        game.state.draft_armies = game.calculate_draft_armies();
        game
    }

    fn into_attack(game: &mut Game) {
        while game.state.phase == Phase::Draft {
            assert!(game.place_draft_army("ford"));
        }
        assert_eq!(game.state.phase, Phase::Attack);
    }

    #[test]
    fn test_init_rejects_bad_rosters() {
        let mut game = Game::new(Arc::new(duel_map().unwrap()), GameSettings::default(), 1);
        let before = game.state.clone();

        assert_eq!(
            game.init_game(&GameSetup::numbered_ai(1)),
            Err(SetupError::PlayerCount {
                count: 1,
                min: 2,
                max: 8
            })
        );
        assert_eq!(
            game.init_game(&GameSetup::ai_only(vec!["A".into(), "  ".into()])),
            Err(SetupError::EmptyName(1))
        );
        assert!(matches!(
            game.init_game(&GameSetup::numbered_ai(9)),
            Err(SetupError::PlayerCount { .. })
        ));
        assert_eq!(game.state, before);
    }

    #[test]
    fn test_random_init_deals_everything() {
        let game = duel(PlacementMode::Random, 3);
        let state = game.state();

        assert_eq!(state.phase, Phase::Draft);
        assert_eq!(state.turn, 1);
        assert_eq!(state.draft_armies, OPENING_DRAFT);
        assert_eq!(state.current_player_index, 0);
        assert!(state.territories.values().all(|t| t.owner.is_some() && t.armies == 1));
        assert_eq!(state.count_territories(0), 4);
        assert_eq!(state.count_territories(1), 4);
        assert_eq!(state.cards_deck.len(), 8 + cards::WILD_CARDS_PER_DECK);
        assert!(check_invariants(state).is_empty());
    }

    #[test]
    fn test_placement_override_and_humans() {
        let mut game = Game::new(Arc::new(duel_map().unwrap()), GameSettings::default(), 1);
        let setup = GameSetup {
            names: vec!["Ann".into(), "Bot".into()],
            human_count: 1,
            placement_override: Some(PlacementMode::Sequential),
            custom_colors: vec![None, Some("#123456".into())],
        };
        game.init_game(&setup).unwrap();

        assert_eq!(game.state.phase, Phase::Placement);
        assert_eq!(game.state.settings.placement_mode, PlacementMode::Sequential);
        assert!(game.state.players[0].is_human);
        assert!(game.state.players[1].is_ai());
        assert_eq!(game.state.players[1].color, "#123456");
        assert_eq!(game.state.players[0].color, Player::default_color(0));
    }

    #[test]
    fn test_sequential_placement_flow() {
        let mut game = duel(PlacementMode::Sequential, 2);
        assert_eq!(game.state.placement_stage, Some(PlacementStage::Claim));
        assert_eq!(game.state.turn, 0);

        let ids: Vec<String> = game.state.territories.keys().cloned().collect();
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(game.state.current_player_index, i % 2);
            assert!(game.place_army(id));
            assert!(!game.place_army(id), "claimed twice");
        }
        assert_eq!(game.state.placement_stage, Some(PlacementStage::Distribute));
        assert_eq!(game.state.draft_armies, SEQUENTIAL_RESERVE);

        let mut placed = 0;
        while game.state.phase == Phase::Placement {
            let player = game.state.current_player_id().unwrap();
            let own = game.get_player_territories(player);
            let enemy = game.get_player_territories(1 - player);
            assert!(!game.place_army(&enemy[0]));
            assert!(game.place_army(&own[0]));
            placed += 1;
        }
        assert_eq!(placed, 2 * SEQUENTIAL_RESERVE);
        assert_eq!(game.state.phase, Phase::Draft);
        assert_eq!(game.state.turn, 1);
        assert_eq!(game.state.current_player_index, 0);
        assert_eq!(game.state.draft_armies, MIN_DRAFT_ARMIES);
        assert_eq!(game.state.total_armies(0) + game.state.total_armies(1), 8 + 12);
    }

    #[test]
    fn test_turn_one_skips_attack_and_fortify() {
        let mut game = duel(PlacementMode::Random, 4);
        let own = game.get_player_territories(0);
        for _ in 0..OPENING_DRAFT {
            assert!(game.place_draft_army(&own[0]));
        }
        assert_eq!(game.state.phase, Phase::Draft);
        assert_eq!(game.state.current_player_index, 1);
        assert_eq!(game.state.turn, 1);
        assert_eq!(game.state.draft_armies, game.draft_armies_for(1));

        let own = game.get_player_territories(1);
        while game.state.current_player_index == 1 {
            assert!(game.place_draft_army(&own[0]));
        }
        assert_eq!(game.state.current_player_index, 0);
        assert_eq!(game.state.turn, 2);
    }

    #[test]
    fn test_draft_formula_with_continent_bonus() {
        let game = split_duel();
        let west_bonus = game
            .map()
            .continents()
            .iter()
            .find(|c| c.id == "westmarch")
            .unwrap()
            .bonus;
        assert!(game.owns_continent(0, "westmarch"));
        assert!(!game.owns_continent(0, "eastmarch"));
        assert_eq!(game.draft_armies_for(0), MIN_DRAFT_ARMIES + west_bonus);
    }

    #[test]
    fn test_classic_draft_floor() {
        let map = Arc::new(classic_map().unwrap());
        let mut game = Game::new(map, GameSettings::default(), 11);
        game.init_game(&GameSetup::numbered_ai(3)).unwrap();
        // 14 territories each, no full continent guaranteed: at least 4.
        assert!(game.draft_armies_for(0) >= 4);
    }

    #[test]
    fn test_attack_requires_selection_and_adjacency() {
        let mut game = split_duel();
        assert!(!game.execute_attack(3, 2));
        into_attack(&mut game);

        assert!(!game.select_attack_from("keep"), "enemy territory");
        assert!(game.select_attack_from("ford"));
        assert!(!game.select_attack_to("mill"), "own territory");
        assert!(!game.select_attack_to("quarry"), "not adjacent");
        assert!(game.select_attack_to("keep"));
        assert!(game.execute_attack(3, 2));
        assert!(game.state.last_battle_result.is_some());
    }

    #[test]
    fn test_conquest_move_bounds_and_elimination() {
        let mut game = split_duel();
        into_attack(&mut game);
        for id in ["keep", "marsh", "orchard"] {
            let territory = game.state.territories.get_mut(id).unwrap();
            territory.owner = Some(0);
        }
        game.state.territories.get_mut("quarry").unwrap().armies = 1;
        game.state.players[1].cards = vec![Card::wild(), Card::new(CardKind::Infantry, None)];
        game.state.territories.get_mut("orchard").unwrap().armies = 50;
        game.state.settings.attack_mode = AttackMode::Instant;

        assert!(game.select_attack_from("orchard"));
        assert!(game.select_attack_to("quarry"));
        assert!(game.execute_attack(3, 2));
        assert!(game.state.conquest_pending());

        let source = game.get_territory_state("orchard").unwrap().armies;
        assert!(!game.select_attack_from("keep"), "pending conquest blocks reselection");
        assert!(!game.end_attack_phase(), "pending conquest blocks ending");
        assert!(!game.conquest_move(0));
        assert!(!game.conquest_move(source));
        assert!(game.conquest_move(source - 1));

        assert_eq!(game.get_territory_state("quarry").unwrap().owner, Some(0));
        assert!(!game.state.players[1].alive);
        assert_eq!(game.state.players[0].cards.len(), 2);
        assert_eq!(game.winner(), Some(0));
        assert_eq!(game.check_win_condition(), Some(0));
        assert_eq!(
            game.state.history.last_of(HistoryAction::Victory).unwrap().result,
            "AI 1 wins"
        );
    }

    #[test]
    fn test_play_continues_after_victory() {
        let mut game = split_duel();
        into_attack(&mut game);
        for territory in game.state.territories.values_mut() {
            territory.owner = Some(if territory.id == "keep" { 1 } else { 0 });
        }
        game.state.territories.get_mut("keep").unwrap().armies = 1;
        game.state.territories.get_mut("ford").unwrap().armies = 20;
        game.state.settings.attack_mode = AttackMode::Instant;

        assert!(game.select_attack_from("ford"));
        assert!(game.select_attack_to("keep"));
        assert!(game.execute_attack(3, 1));
        assert!(game.conquest_move(1));
        assert_eq!(game.winner(), Some(0));
        assert_eq!(game.state.phase, Phase::Attack);

        assert!(game.end_attack_phase());
        assert_eq!(game.state.phase, Phase::Fortify);
        assert!(game.execute_fortify(0));
        assert_eq!(game.state.phase, Phase::Draft);
        assert_eq!(game.state.current_player_index, 0);
        assert_eq!(game.state.turn, 3);
        assert!(!game.is_ai_turn());
        assert!(check_invariants(game.state()).is_empty());
    }

    #[test]
    fn test_end_attack_draws_after_conquest() {
        let mut game = split_duel();
        into_attack(&mut game);
        let deck = game.state.cards_deck.len();

        game.state.conquest_made_this_turn = true;
        assert!(game.end_attack_phase());
        assert_eq!(game.state.phase, Phase::Fortify);
        assert_eq!(game.state.players[0].cards.len(), 1);
        assert_eq!(game.state.cards_deck.len(), deck - 1);
    }

    #[test]
    fn test_fortify_moves_and_ends_turn() {
        let mut game = split_duel();
        into_attack(&mut game);
        assert!(game.end_attack_phase());

        assert!(game.select_fortify_from("ford"));
        assert!(!game.select_fortify_to("keep"), "enemy territory");
        assert!(!game.select_fortify_to("ford"), "same territory");
        assert!(game.select_fortify_to("ridge"));
        let source = game.get_territory_state("ford").unwrap().armies;
        assert!(!game.execute_fortify(source), "must leave one behind");
        assert!(game.execute_fortify(2));

        assert_eq!(game.get_territory_state("ridge").unwrap().armies, 5);
        assert_eq!(game.state.phase, Phase::Draft);
        assert_eq!(game.state.current_player_index, 1);
    }

    #[test]
    fn test_fortify_zero_ends_turn() {
        let mut game = split_duel();
        into_attack(&mut game);
        assert!(game.end_attack_phase());
        let before = game.generation();
        assert!(game.execute_fortify(0));
        assert_eq!(game.state.current_player_index, 1);
        assert!(game.generation() > before);
    }

    #[test]
    fn test_turn_rotation_skips_eliminated() {
        let map = Arc::new(duel_map().unwrap());
        let mut game = Game::new(map, GameSettings::default(), 9);
        game.init_game(&GameSetup::numbered_ai(3)).unwrap();
        for territory in game.state.territories.values_mut() {
            territory.owner = Some(if territory.id == "keep" { 2 } else { 0 });
            territory.armies = 2;
        }
        game.state.players[1].eliminate();
        game.state.turn = 3;
        game.state.phase = Phase::Fortify;

        assert!(game.execute_fortify(0));
        assert_eq!(game.state.current_player_index, 2);
        assert_eq!(game.state.turn, 3);

        game.state.phase = Phase::Fortify;
        assert!(game.execute_fortify(0));
        assert_eq!(game.state.current_player_index, 0);
        assert_eq!(game.state.turn, 4);
    }

    #[test]
    fn test_forced_redemption_at_turn_start() {
        let mut game = split_duel();
        into_attack(&mut game);
        assert!(game.end_attack_phase());
        game.state.players[1].cards = vec![
            Card::new(CardKind::Infantry, None),
            Card::new(CardKind::Infantry, None),
            Card::new(CardKind::Infantry, None),
            Card::new(CardKind::Cavalry, None),
            Card::new(CardKind::Cavalry, None),
        ];
        let base = game.draft_armies_for(1);
        assert!(game.execute_fortify(0));

        assert_eq!(game.state.players[1].cards.len(), 2);
        assert_eq!(game.state.draft_armies, base + CardSet::ThreeInfantry.award());
        assert!(!game.redeem_cards(), "nothing left to redeem");
    }

    #[test]
    fn test_five_wilds_redeem_once_at_turn_start() {
        let mut game = split_duel();
        into_attack(&mut game);
        assert!(game.end_attack_phase());
        game.state.players[1].cards = vec![Card::wild(); 5];
        let base = game.draft_armies_for(1);
        assert!(game.execute_fortify(0));

        assert_eq!(game.state.current_player_index, 1);
        assert_eq!(game.state.players[1].cards.len(), 2);
        assert_eq!(game.state.draft_armies, base + CardSet::OneOfEach.award());
        let redeemed = game
            .state
            .history
            .entries()
            .iter()
            .filter(|e| e.action == HistoryAction::Redeem)
            .count();
        assert_eq!(redeemed, 1);
    }

    #[test]
    fn test_oversized_hand_blocks_drafting() {
        let mut game = split_duel();
        let cap = MAX_FORCED_REDEMPTIONS * 3 + FORCED_REDEMPTION_HAND;
        game.state.players[0].cards = vec![Card::wild(); cap];
        let before = game.state.clone();

        assert!(!game.place_draft_army("ford"));
        assert_eq!(game.state, before);

        assert!(game.redeem_cards());
        let draft = game.state.draft_armies;
        assert!(game.place_draft_army("ford"));
        assert_eq!(game.state.players[0].cards.len(), 2);
        assert_eq!(
            game.state.draft_armies,
            draft + 5 * CardSet::OneOfEach.award() - 1
        );
    }

    #[test]
    fn test_voluntary_redemption_only_before_placing() {
        let mut game = split_duel();
        game.state.players[0].cards = vec![
            Card::new(CardKind::Infantry, None),
            Card::new(CardKind::Cavalry, None),
            Card::new(CardKind::Artillery, None),
        ];
        let draft = game.state.draft_armies;
        assert!(game.redeem_cards());
        assert_eq!(game.state.draft_armies, draft + CardSet::OneOfEach.award());

        game.state.players[0].cards = vec![Card::wild(), Card::wild(), Card::wild()];
        assert!(game.place_draft_army("ford"));
        assert!(!game.redeem_cards());
    }

    #[test]
    fn test_generation_tracks_phase_changes() {
        let mut game = split_duel();
        let start = game.generation();
        assert!(game.place_draft_army("ford"));
        assert_eq!(game.generation(), start, "same phase");
        into_attack(&mut game);
        assert_eq!(game.generation(), start + 1);

        game.reset();
        assert_eq!(game.state.phase, Phase::Setup);
        assert!(game.generation() > start + 1);
    }

    #[test]
    fn test_adjacent_enemies_sorted() {
        let game = split_duel();
        assert_eq!(game.get_adjacent_enemy_territories("ford"), vec!["keep".to_string()]);
        assert!(game.get_adjacent_enemy_territories("harbor").is_empty());
        assert!(game.get_adjacent_enemy_territories("nowhere").is_empty());
    }
}
