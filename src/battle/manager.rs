//! Turn protocol
//!
//! `Setup` (assigning characters) -> `InProgress` (turns) -> `Over` (one or
//! zero fighters left). The manager owns the roster, the turn counter and
//! the special-move RNG, and knows nothing about transports: a caller pulls
//! the current player, ticks its status effects, applies one action and
//! advances the turn.

use crate::battle::character::Character;
use crate::battle::events::BattleEvent;
use crate::battle::factory::CharacterFactory;
use crate::battle::status::{StatusEffect, StatusTick};
use crate::battle::action::{Action, SpecialOutcome};
use crate::core::config::ServerConfig;
use crate::core::error::{BattleError, Result};
use crate::core::types::{Hp, Turn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Fewest fighters a battle can start with
pub const MIN_FIGHTERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattlePhase {
    Setup,
    InProgress,
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Attack,
    Defend,
    Special,
}

impl ActionKind {
    /// Attack is single-target; defend and special pick their own targets
    pub fn needs_target(&self) -> bool {
        matches!(self, ActionKind::Attack)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattleOutcome {
    #[default]
    Undecided,
    Victory(String),
    /// Nobody left standing
    Draw,
}

impl BattleOutcome {
    pub fn winner(&self) -> Option<&str> {
        match self {
            BattleOutcome::Victory(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoisonSnapshot {
    pub active: bool,
    pub damage: Hp,
    pub duration: Turn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub name: String,
    pub hp: Hp,
    pub alive: bool,
    pub defense: Hp,
    pub poison: PoisonSnapshot,
    pub stunned: bool,
    pub special_ready: bool,
}

/// Read-only view of the battle, sent to clients after every action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub turn: Turn,
    pub phase: BattlePhase,
    pub current: Option<String>,
    pub players: Vec<PlayerSnapshot>,
}

pub struct BattleManager {
    /// Characters not yet picked, in offer order
    available: Vec<Character>,
    /// Picked characters, in turn order
    roster: Vec<Character>,
    capacity: usize,
    phase: BattlePhase,
    turn: Turn,
    turn_index: usize,
    /// Slot whose turn is being played, pinned when the turn begins
    acting: Option<usize>,
    previously_alive: Vec<bool>,
    rng: ChaCha8Rng,
}

impl BattleManager {
    pub fn new(available: Vec<Character>, capacity: usize, rng: ChaCha8Rng) -> Self {
        Self {
            available,
            roster: Vec::new(),
            capacity,
            phase: BattlePhase::Setup,
            turn: 0,
            turn_index: 0,
            acting: None,
            previously_alive: Vec::new(),
            rng,
        }
    }

    pub fn seeded(available: Vec<Character>, capacity: usize, seed: u64) -> Self {
        Self::new(available, capacity, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Build the offered characters from the config's roster keys
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let available = CharacterFactory::create_roster(&config.roster)?;
        let seed = config.seed.unwrap_or_else(rand::random);
        tracing::debug!("Battle RNG seed: {}", seed);
        Ok(Self::seeded(available, config.max_players, seed))
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn turn_number(&self) -> Turn {
        self.turn
    }

    pub fn available(&self) -> &[Character] {
        &self.available
    }

    pub fn available_characters(&self) -> Vec<&str> {
        self.available.iter().map(|c| c.name()).collect()
    }

    pub fn roster(&self) -> &[Character] {
        &self.roster
    }

    fn expect_phase(&self, expected: BattlePhase) -> Result<()> {
        if self.phase != expected {
            return Err(BattleError::InvalidPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    // === SETUP ===

    /// Move a character from the offer list into the roster
    pub fn assign_character(&mut self, name: &str) -> Result<&Character> {
        self.expect_phase(BattlePhase::Setup)?;

        if self.roster.len() >= self.capacity {
            return Err(BattleError::RosterFull(self.capacity));
        }

        let pos = self
            .available
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| BattleError::CharacterUnavailable(name.to_string()))?;

        let character = self.available.remove(pos);
        tracing::debug!("Assigned {} to roster slot {}", character.name(), self.roster.len());
        self.roster.push(character);

        let slot = self.roster.len() - 1;
        Ok(&self.roster[slot])
    }

    pub fn is_battle_ready(&self) -> bool {
        self.roster.len() >= MIN_FIGHTERS
    }

    pub fn start_battle(&mut self) -> Result<()> {
        self.expect_phase(BattlePhase::Setup)?;

        if !self.is_battle_ready() {
            return Err(BattleError::NotEnoughPlayers {
                required: MIN_FIGHTERS,
                assigned: self.roster.len(),
            });
        }

        self.turn = 0;
        self.turn_index = 0;
        self.acting = None;
        self.previously_alive = self.roster.iter().map(|c| c.is_alive()).collect();
        self.phase = BattlePhase::InProgress;
        tracing::info!("Battle started with {} fighters", self.roster.len());

        self.refresh_phase();
        Ok(())
    }

    // === TURNS ===

    pub fn is_battle_over(&self) -> bool {
        self.roster.iter().filter(|c| c.is_alive()).count() <= 1
    }

    /// Roster slot of the next living character, scanning forward from the
    /// turn index and wrapping. `None` once nobody is alive.
    pub fn current_player_index(&self) -> Option<usize> {
        let n = self.roster.len();
        (0..n)
            .map(|offset| (self.turn_index + offset) % n)
            .find(|&i| self.roster[i].is_alive())
    }

    pub fn current_player(&self) -> Option<&Character> {
        self.current_player_index().map(|i| &self.roster[i])
    }

    /// Start-of-turn maintenance: drop defense boost, tick poison, tick stun.
    ///
    /// `skip_turn` is set when the character is stunned or the poison
    /// finished it off. Marks `index` as the slot whose turn is running.
    pub fn handle_status_effects(&mut self, index: usize) -> StatusTick {
        let Some(character) = self.roster.get_mut(index) else {
            return StatusTick::default();
        };
        self.acting = Some(index);

        character.handle_defense_boost();
        let mut tick = character.handle_poison();
        if character.is_alive() {
            tick.merge(character.handle_stun());
        }

        self.refresh_phase();
        tick
    }

    /// Apply one action for the character in slot `actor`.
    ///
    /// Errors leave the battle untouched; the caller should ask again
    /// without advancing the turn.
    pub fn apply_action(
        &mut self,
        actor: usize,
        action: ActionKind,
        target: Option<usize>,
    ) -> Result<Vec<BattleEvent>> {
        self.expect_phase(BattlePhase::InProgress)?;

        let actor_name = self
            .roster
            .get(actor)
            .map(|c| c.name().to_string())
            .ok_or_else(|| BattleError::InvalidTarget(format!("slot {}", actor)))?;

        if !self.roster[actor].is_alive() {
            return Err(BattleError::ActorDefeated(actor_name));
        }
        if self.current_player_index() != Some(actor) {
            return Err(BattleError::OutOfTurn(actor_name));
        }

        let events = match action {
            ActionKind::Attack => {
                let target = target.ok_or(BattleError::TargetRequired)?;
                self.validate_target(actor, target)?;
                let (attacker, defender) = pair_mut(&mut self.roster, actor, target);
                attacker.attack(defender)
            }
            ActionKind::Defend => self.roster[actor].defend(),
            ActionKind::Special => {
                let turn = self.turn;
                let (before, rest) = self.roster.split_at_mut(actor);
                let (caster, after) = rest
                    .split_first_mut()
                    .ok_or_else(|| BattleError::InvalidTarget(format!("slot {}", actor)))?;
                let mut targets: Vec<&mut Character> = before
                    .iter_mut()
                    .chain(after.iter_mut())
                    .filter(|c| c.is_alive())
                    .collect();

                match caster.special(&mut targets, turn, &mut self.rng) {
                    SpecialOutcome::Used(events) => events,
                    SpecialOutcome::OnCooldown { ready_in, .. } => {
                        return Err(BattleError::SpecialOnCooldown {
                            name: caster.special_move().name().to_string(),
                            ready_in,
                        });
                    }
                }
            }
        };

        tracing::debug!("Turn {}: {} used {:?}", self.turn, actor_name, action);
        self.refresh_phase();
        Ok(events)
    }

    fn validate_target(&self, actor: usize, target: usize) -> Result<()> {
        let Some(character) = self.roster.get(target) else {
            return Err(BattleError::InvalidTarget(format!("slot {}", target)));
        };
        if target == actor {
            return Err(BattleError::InvalidTarget(format!(
                "{} cannot target themselves",
                character.name()
            )));
        }
        if !character.is_alive() {
            return Err(BattleError::InvalidTarget(format!(
                "{} is already defeated",
                character.name()
            )));
        }
        Ok(())
    }

    /// Close the current turn slot and move to the slot after the one that
    /// just played, even if that character died during its own turn.
    ///
    /// Returns a `Fallen` event for everyone who died since the last advance.
    pub fn advance_turn(&mut self) -> Vec<BattleEvent> {
        let n = self.roster.len();
        if n == 0 {
            return Vec::new();
        }

        let actor = self
            .acting
            .take()
            .or_else(|| self.current_player_index())
            .unwrap_or(self.turn_index);
        self.turn += 1;
        self.turn_index = (actor + 1) % n;

        let fallen = self
            .roster
            .iter()
            .zip(&self.previously_alive)
            .filter(|&(c, &was_alive)| was_alive && !c.is_alive())
            .map(|(c, _)| BattleEvent::Fallen {
                name: c.name().to_string(),
            })
            .collect();
        self.previously_alive = self.roster.iter().map(|c| c.is_alive()).collect();

        self.refresh_phase();
        fallen
    }

    /// Remove a character from play (its player left)
    pub fn forfeit(&mut self, index: usize) -> Vec<BattleEvent> {
        if self.acting.is_none() && self.current_player_index() == Some(index) {
            self.acting = Some(index);
        }
        let events = self
            .roster
            .get_mut(index)
            .map(Character::forfeit)
            .unwrap_or_default();
        self.refresh_phase();
        events
    }

    fn refresh_phase(&mut self) {
        if self.phase == BattlePhase::InProgress && self.is_battle_over() {
            self.phase = BattlePhase::Over;
            match self.outcome() {
                BattleOutcome::Victory(name) => tracing::info!("Battle over: {} wins", name),
                _ => tracing::info!("Battle over: draw"),
            }
        }
    }

    // === QUERIES ===

    /// Names of living characters other than `exclude`
    pub fn alive_targets(&self, exclude: Option<usize>) -> Vec<&str> {
        self.roster
            .iter()
            .enumerate()
            .filter(|(i, c)| Some(*i) != exclude && c.is_alive())
            .map(|(_, c)| c.name())
            .collect()
    }

    /// Roster slot of a living character by name
    pub fn target_by_name(&self, name: &str) -> Option<usize> {
        self.roster
            .iter()
            .position(|c| c.name() == name && c.is_alive())
    }

    pub fn winner(&self) -> Option<&Character> {
        if self.phase != BattlePhase::Over {
            return None;
        }
        self.roster.iter().find(|c| c.is_alive())
    }

    pub fn outcome(&self) -> BattleOutcome {
        if self.phase != BattlePhase::Over {
            return BattleOutcome::Undecided;
        }
        match self.winner() {
            Some(c) => BattleOutcome::Victory(c.name().to_string()),
            None => BattleOutcome::Draw,
        }
    }

    pub fn roster_snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            turn: self.turn,
            phase: self.phase,
            current: match self.phase {
                BattlePhase::InProgress => self.current_player().map(|c| c.name().to_string()),
                _ => None,
            },
            players: self
                .roster
                .iter()
                .map(|c| PlayerSnapshot {
                    name: c.name().to_string(),
                    hp: c.hp(),
                    alive: c.is_alive(),
                    defense: c.defense(),
                    poison: PoisonSnapshot {
                        active: c.poison().is_active(),
                        damage: c.poison().damage,
                        duration: c.poison().duration(),
                    },
                    stunned: c.stun().is_active(),
                    special_ready: c.special_move().is_available(self.turn),
                })
                .collect(),
        }
    }
}

fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    if a < b {
        let (lo, hi) = items.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::action::{Attack, Defend, SpecialEffect, SpecialMove};
    use proptest::prelude::*;

    fn fighter(name: &str, hp: Hp, damage: Hp, defense: Hp) -> Character {
        Character::new(
            name,
            hp,
            Attack::new("Hit", "", "", damage),
            Defend::new("Guard", "", defense, 5),
            SpecialMove::new(
                "Burst",
                "",
                "",
                2,
                SpecialEffect::Strike {
                    damage: 4,
                    pierce: true,
                    heal: 0,
                },
            ),
        )
    }

    fn started(fighters: Vec<Character>) -> BattleManager {
        let names: Vec<String> = fighters.iter().map(|c| c.name().to_string()).collect();
        let mut manager = BattleManager::seeded(fighters, names.len(), 11);
        for name in &names {
            manager.assign_character(name).unwrap();
        }
        manager.start_battle().unwrap();
        manager
    }

    #[test]
    fn test_assignment_moves_between_lists() {
        let mut manager = BattleManager::seeded(
            vec![fighter("A", 10, 1, 0), fighter("B", 10, 1, 0), fighter("C", 10, 1, 0)],
            2,
            1,
        );

        assert_eq!(manager.assign_character("B").unwrap().name(), "B");
        assert_eq!(manager.available_characters(), vec!["A", "C"]);
        assert!(matches!(
            manager.assign_character("B"),
            Err(BattleError::CharacterUnavailable(_))
        ));
        assert!(matches!(
            manager.assign_character("Zed"),
            Err(BattleError::CharacterUnavailable(_))
        ));

        manager.assign_character("A").unwrap();
        assert!(matches!(
            manager.assign_character("C"),
            Err(BattleError::RosterFull(2))
        ));
        assert_eq!(manager.roster().len(), 2);
        assert_eq!(manager.available_characters(), vec!["C"]);
    }

    #[test]
    fn test_start_needs_two_fighters() {
        let mut manager = BattleManager::seeded(vec![fighter("A", 10, 1, 0)], 2, 1);
        manager.assign_character("A").unwrap();
        assert!(matches!(
            manager.start_battle(),
            Err(BattleError::NotEnoughPlayers {
                required: 2,
                assigned: 1
            })
        ));
        assert_eq!(manager.phase(), BattlePhase::Setup);
    }

    #[test]
    fn test_no_assignment_after_start() {
        let mut manager = BattleManager::seeded(
            vec![fighter("A", 10, 1, 0), fighter("B", 10, 1, 0), fighter("C", 10, 1, 0)],
            3,
            1,
        );
        manager.assign_character("A").unwrap();
        manager.assign_character("B").unwrap();
        manager.start_battle().unwrap();
        assert!(matches!(
            manager.assign_character("C"),
            Err(BattleError::InvalidPhase { .. })
        ));
    }

    #[test]
    fn test_two_fighter_duel() {
        let mut manager = started(vec![fighter("A", 10, 10, 0), fighter("B", 30, 12, 2)]);

        assert_eq!(manager.current_player_index(), Some(0));
        manager.apply_action(0, ActionKind::Attack, Some(1)).unwrap();
        assert_eq!(manager.roster()[1].hp(), 22);
        assert!(!manager.is_battle_over());
        assert!(manager.advance_turn().is_empty());

        assert_eq!(manager.current_player_index(), Some(1));
        let events = manager.apply_action(1, ActionKind::Attack, Some(0)).unwrap();
        assert!(events.contains(&BattleEvent::Defeated { name: "A".into() }));
        assert_eq!(manager.roster()[0].hp(), -2);
        assert!(!manager.roster()[0].is_alive());
        assert!(manager.is_battle_over());
        assert_eq!(manager.phase(), BattlePhase::Over);
        assert_eq!(manager.outcome(), BattleOutcome::Victory("B".into()));

        assert_eq!(
            manager.advance_turn(),
            vec![BattleEvent::Fallen { name: "A".into() }]
        );
    }

    #[test]
    fn test_illegal_moves_leave_state_untouched() {
        let mut manager = started(vec![fighter("A", 10, 10, 0), fighter("B", 30, 12, 2)]);

        assert!(matches!(
            manager.apply_action(1, ActionKind::Attack, Some(0)),
            Err(BattleError::OutOfTurn(_))
        ));
        assert!(matches!(
            manager.apply_action(0, ActionKind::Attack, None),
            Err(BattleError::TargetRequired)
        ));
        assert!(matches!(
            manager.apply_action(0, ActionKind::Attack, Some(0)),
            Err(BattleError::InvalidTarget(_))
        ));
        assert!(matches!(
            manager.apply_action(0, ActionKind::Attack, Some(9)),
            Err(BattleError::InvalidTarget(_))
        ));
        assert_eq!(manager.roster()[0].hp(), 10);
        assert_eq!(manager.roster()[1].hp(), 30);
        assert_eq!(manager.turn_number(), 0);
        assert_eq!(manager.current_player_index(), Some(0));
    }

    #[test]
    fn test_stunned_turn_is_skipped_once() {
        let mut b = fighter("B", 30, 5, 0);
        b.inflict_stun(1);
        let mut manager = started(vec![fighter("A", 30, 5, 0), b]);

        manager.apply_action(0, ActionKind::Defend, None).unwrap();
        manager.advance_turn();

        let tick = manager.handle_status_effects(1);
        assert!(tick.skip_turn);
        assert_eq!(manager.roster()[1].stun().duration(), 0);
        manager.advance_turn();

        // A's boost from last turn expires at the start of A's turn
        assert_eq!(manager.roster()[0].defense(), 5);
        manager.handle_status_effects(0);
        assert_eq!(manager.roster()[0].defense(), 0);
        manager.apply_action(0, ActionKind::Attack, Some(1)).unwrap();
        manager.advance_turn();

        let tick = manager.handle_status_effects(1);
        assert!(!tick.skip_turn);
        assert!(manager.apply_action(1, ActionKind::Attack, Some(0)).is_ok());
    }

    #[test]
    fn test_poison_can_finish_a_fighter() {
        let mut b = fighter("B", 5, 5, 0);
        b.inflict_poison(2);
        let mut manager = started(vec![fighter("A", 30, 5, 0), b]);

        manager.apply_action(0, ActionKind::Defend, None).unwrap();
        manager.advance_turn();

        let tick = manager.handle_status_effects(1);
        assert!(tick.skip_turn);
        assert!(tick
            .events
            .contains(&BattleEvent::EliminatedByPoison { name: "B".into() }));
        assert_eq!(manager.phase(), BattlePhase::Over);
        assert_eq!(manager.winner().map(|c| c.name()), Some("A"));
    }

    #[test]
    fn test_special_respects_global_turn_cooldown() {
        let mut manager = started(vec![fighter("A", 30, 5, 0), fighter("B", 30, 5, 0)]);

        let events = manager.apply_action(0, ActionKind::Special, None).unwrap();
        assert!(events.contains(&BattleEvent::SpecialHit {
            target: "B".into(),
            special: "Burst".into(),
            damage: 4
        }));
        manager.advance_turn();
        manager.apply_action(1, ActionKind::Defend, None).unwrap();
        manager.advance_turn();

        // Turn 2: cooldown 2 has elapsed since turn 0
        assert!(manager.apply_action(0, ActionKind::Special, None).is_ok());
        manager.advance_turn();
        manager.apply_action(1, ActionKind::Defend, None).unwrap();
        manager.advance_turn();
        manager.apply_action(0, ActionKind::Defend, None).unwrap();
        manager.advance_turn();
        manager.apply_action(1, ActionKind::Defend, None).unwrap();
        manager.advance_turn();

        // Turn 6 is fine; then immediately again at turn 6 is not
        assert!(manager.apply_action(0, ActionKind::Special, None).is_ok());
        assert!(matches!(
            manager.apply_action(0, ActionKind::Special, None),
            Err(BattleError::SpecialOnCooldown { ready_in: 2, .. })
        ));
    }

    #[test]
    fn test_special_cooldown_rejection_changes_nothing() {
        let mut manager = started(vec![fighter("A", 30, 5, 0), fighter("B", 30, 5, 0)]);
        manager.apply_action(0, ActionKind::Special, None).unwrap();
        manager.advance_turn();
        manager.apply_action(1, ActionKind::Special, None).unwrap();
        manager.advance_turn();
        manager.apply_action(0, ActionKind::Defend, None).unwrap();
        manager.advance_turn();

        // B used it at turn 1; turn 3 - 1 = 2 is enough
        assert!(manager.apply_action(1, ActionKind::Special, None).is_ok());
        let before = manager.roster_snapshot();
        assert!(manager.apply_action(1, ActionKind::Special, None).is_err());
        assert_eq!(manager.roster_snapshot(), before);
    }

    #[test]
    fn test_special_hits_every_other_living_fighter() {
        let mut dead = fighter("C", 1, 5, 0);
        dead.take_damage(1);
        let mut manager = BattleManager::seeded(
            vec![fighter("A", 30, 5, 0), fighter("B", 30, 5, 0), dead, fighter("D", 30, 5, 3)],
            4,
            5,
        );
        for name in ["A", "B", "C", "D"] {
            manager.assign_character(name).unwrap();
        }
        manager.start_battle().unwrap();

        manager.apply_action(0, ActionKind::Special, None).unwrap();
        let hp: Vec<Hp> = manager.roster().iter().map(|c| c.hp()).collect();
        assert_eq!(hp, vec![30, 26, 0, 26]);
    }

    #[test]
    fn test_turns_skip_the_dead_and_wrap() {
        let mut manager = started(vec![
            fighter("A", 30, 50, 0),
            fighter("B", 30, 5, 0),
            fighter("C", 30, 5, 0),
        ]);

        manager.apply_action(0, ActionKind::Attack, Some(1)).unwrap();
        assert_eq!(
            manager.advance_turn(),
            vec![BattleEvent::Fallen { name: "B".into() }]
        );
        assert_eq!(manager.current_player().map(|c| c.name()), Some("C"));
        manager.apply_action(2, ActionKind::Defend, None).unwrap();
        manager.advance_turn();
        assert_eq!(manager.current_player().map(|c| c.name()), Some("A"));
        assert_eq!(manager.turn_number(), 2);
        assert_eq!(manager.alive_targets(Some(0)), vec!["C"]);
        assert_eq!(manager.target_by_name("B"), None);
        assert_eq!(manager.target_by_name("C"), Some(2));
    }

    #[test]
    fn test_poison_death_passes_turn_to_next_slot() {
        let mut b = fighter("B", 5, 5, 0);
        b.inflict_poison(2);
        let mut manager = started(vec![
            fighter("A", 30, 5, 0),
            b,
            fighter("C", 30, 5, 0),
            fighter("D", 30, 5, 0),
        ]);

        manager.handle_status_effects(0);
        manager.apply_action(0, ActionKind::Defend, None).unwrap();
        manager.advance_turn();

        let tick = manager.handle_status_effects(1);
        assert!(tick.skip_turn);
        assert!(!manager.roster()[1].is_alive());
        assert_eq!(
            manager.advance_turn(),
            vec![BattleEvent::Fallen { name: "B".into() }]
        );
        assert_eq!(manager.current_player().map(|c| c.name()), Some("C"));
        assert_eq!(manager.turn_number(), 2);
    }

    #[test]
    fn test_forfeit_on_own_turn_passes_to_next_slot() {
        let mut manager = started(vec![
            fighter("A", 30, 5, 0),
            fighter("B", 30, 5, 0),
            fighter("C", 30, 5, 0),
        ]);

        // Without a status tick first
        manager.forfeit(0);
        manager.advance_turn();
        assert_eq!(manager.current_player().map(|c| c.name()), Some("B"));

        // Mid-turn, after the status tick
        manager.handle_status_effects(1);
        manager.forfeit(1);
        assert_eq!(manager.phase(), BattlePhase::Over);
        manager.advance_turn();
        assert_eq!(manager.current_player().map(|c| c.name()), Some("C"));
    }

    #[test]
    fn test_forfeit_off_turn_keeps_order() {
        let mut manager = started(vec![
            fighter("A", 30, 5, 0),
            fighter("B", 30, 5, 0),
            fighter("C", 30, 5, 0),
            fighter("D", 30, 5, 0),
        ]);

        manager.forfeit(1);
        manager.handle_status_effects(0);
        manager.apply_action(0, ActionKind::Defend, None).unwrap();
        manager.advance_turn();
        assert_eq!(manager.current_player().map(|c| c.name()), Some("C"));
    }

    #[test]
    fn test_forfeit_ends_duel() {
        let mut manager = started(vec![fighter("A", 30, 5, 0), fighter("B", 30, 5, 0)]);
        let events = manager.forfeit(0);
        assert_eq!(events, vec![BattleEvent::Forfeited { name: "A".into() }]);
        assert_eq!(manager.outcome(), BattleOutcome::Victory("B".into()));
        assert!(manager.forfeit(0).is_empty());
    }

    #[test]
    fn test_double_knockout_is_a_draw() {
        let mut manager = started(vec![fighter("A", 30, 5, 0), fighter("B", 30, 5, 0)]);
        manager.roster[0].take_damage(30);
        manager.roster[1].take_damage(30);
        manager.refresh_phase();
        assert_eq!(manager.outcome(), BattleOutcome::Draw);
        assert!(manager.winner().is_none());
        assert_eq!(manager.current_player_index(), None);
    }

    #[test]
    fn test_snapshot_reflects_status() {
        let mut b = fighter("B", 30, 5, 0);
        b.inflict_poison(2);
        b.inflict_stun(1);
        let manager = started(vec![fighter("A", 30, 5, 0), b]);

        let snapshot = manager.roster_snapshot();
        assert_eq!(snapshot.turn, 0);
        assert_eq!(snapshot.phase, BattlePhase::InProgress);
        assert_eq!(snapshot.current.as_deref(), Some("A"));
        let b = &snapshot.players[1];
        assert!(b.poison.active);
        assert_eq!(b.poison.duration, 2);
        assert_eq!(b.poison.damage, 10);
        assert!(b.stunned);
        assert!(b.special_ready);
    }

    #[test]
    fn test_from_default_config_offers_all_five() {
        let config = ServerConfig {
            seed: Some(3),
            ..ServerConfig::default()
        };
        let manager = BattleManager::from_config(&config).unwrap();
        assert_eq!(manager.available().len(), 5);
        assert_eq!(manager.phase(), BattlePhase::Setup);
    }

    proptest! {
        #[test]
        fn prop_turn_cycling_never_picks_the_dead(
            dead in proptest::collection::vec(any::<bool>(), 2..7),
            advances in 0usize..20,
        ) {
            let fighters: Vec<Character> = (0..dead.len())
                .map(|i| fighter(&format!("F{}", i), 30, 5, 0))
                .collect();
            let mut manager = started(fighters);
            for (i, is_dead) in dead.iter().enumerate() {
                if *is_dead {
                    manager.roster[i].take_damage(100);
                }
            }

            for _ in 0..advances {
                match manager.current_player_index() {
                    Some(i) => prop_assert!(manager.roster()[i].is_alive()),
                    None => prop_assert!(dead.iter().all(|d| *d)),
                }
                manager.advance_turn();
            }

            let alive = dead.iter().filter(|d| !**d).count();
            prop_assert_eq!(manager.is_battle_over(), alive <= 1);
        }
    }
}
