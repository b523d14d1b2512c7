//! Battle characters
//!
//! A character is alive while `hp > 0`. Dead characters stay in the roster
//! for reporting; the battle loop simply stops giving them turns.

use crate::battle::action::{Action, Attack, Defend, SpecialMove, SpecialOutcome};
use crate::battle::events::BattleEvent;
use crate::battle::status::{Poison, StatusEffect, StatusTick, Stun};
use crate::core::types::{Hp, Turn};
use rand::Rng;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    name: String,
    hp: Hp,
    attack_move: Attack,
    defense_move: Defend,
    special_move: SpecialMove,
    stun: Stun,
    poison: Poison,
}

impl Character {
    pub fn new(
        name: impl Into<String>,
        hp: Hp,
        attack_move: Attack,
        defense_move: Defend,
        special_move: SpecialMove,
    ) -> Self {
        Self {
            name: name.into(),
            hp,
            attack_move,
            defense_move,
            special_move,
            stun: Stun::default(),
            poison: Poison::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hp(&self) -> Hp {
        self.hp
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Effective defense right now (base, or base + boost while defending)
    pub fn defense(&self) -> Hp {
        self.defense_move.current_defense()
    }

    pub fn attack_move(&self) -> &Attack {
        &self.attack_move
    }

    pub fn defense_move(&self) -> &Defend {
        &self.defense_move
    }

    pub fn special_move(&self) -> &SpecialMove {
        &self.special_move
    }

    pub fn stun(&self) -> &Stun {
        &self.stun
    }

    pub fn poison(&self) -> &Poison {
        &self.poison
    }

    /// Subtract `amount` from hp, returning what is left
    pub fn take_damage(&mut self, amount: Hp) -> Hp {
        self.hp -= amount;
        self.hp
    }

    pub fn heal(&mut self, amount: Hp) {
        self.hp += amount;
    }

    pub fn inflict_stun(&mut self, turns: Turn) {
        self.stun.set_duration(turns);
    }

    pub fn inflict_poison(&mut self, turns: Turn) {
        self.poison.set_duration(turns);
    }

    /// Leave the battle for good (hp drops to zero)
    pub fn forfeit(&mut self) -> Vec<BattleEvent> {
        if !self.is_alive() {
            return Vec::new();
        }
        self.hp = 0;
        vec![BattleEvent::Forfeited {
            name: self.name.clone(),
        }]
    }

    pub fn attack(&self, target: &mut Character) -> Vec<BattleEvent> {
        let mut events = vec![BattleEvent::Voiceline {
            speaker: self.name.clone(),
            line: self.attack_move.voiceline().to_string(),
        }];
        events.extend(self.attack_move.apply(&self.name, target));
        events
    }

    pub fn defend(&mut self) -> Vec<BattleEvent> {
        if self.defense_move.apply() {
            vec![BattleEvent::DefenseRaised {
                name: self.name.clone(),
                boost: self.defense_move.boost(),
            }]
        } else {
            vec![BattleEvent::AlreadyDefending {
                name: self.name.clone(),
            }]
        }
    }

    /// Use the special move on `targets`; the caster's own heal is applied here
    pub fn special<R: Rng + ?Sized>(
        &mut self,
        targets: &mut [&mut Character],
        turn: Turn,
        rng: &mut R,
    ) -> SpecialOutcome {
        match self.special_move.apply(&self.name, targets, turn, rng) {
            SpecialOutcome::Used(mut events) => {
                let heal = self.special_move.effect().caster_heal();
                if heal > 0 {
                    self.heal(heal);
                    events.push(BattleEvent::Healed {
                        name: self.name.clone(),
                        amount: heal,
                    });
                }
                SpecialOutcome::Used(events)
            }
            on_cooldown => on_cooldown,
        }
    }

    /// Defense boosts last until the owner's next turn begins
    pub fn handle_defense_boost(&mut self) -> bool {
        self.defense_move.reset()
    }

    pub fn handle_poison(&mut self) -> StatusTick {
        self.poison.handle(&self.name, &mut self.hp)
    }

    pub fn handle_stun(&mut self) -> StatusTick {
        self.stun.handle(&self.name)
    }

    /// Multi-line block shown on the selection screen
    pub fn description(&self) -> String {
        format!(
            "{}\n\
             Attack: {}\n  - {}\n  - Damage: {} HP\n\
             Defense: {}\n  - {}\n  - Base: {} HP\n  - Boost: {} HP\n\
             Special Move: {}\n  - {}\n  - Cooldown: {} turns\n",
            self,
            self.attack_move.name(),
            self.attack_move.description().trim(),
            self.attack_move.damage(),
            self.defense_move.name(),
            self.defense_move.description().trim(),
            self.defense_move.base_defense(),
            self.defense_move.boost(),
            self.special_move.name(),
            self.special_move.description().trim(),
            self.special_move.cooldown(),
        )
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (HP: {})", self.name, self.hp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::action::SpecialEffect;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fighter(name: &str, hp: Hp) -> Character {
        Character::new(
            name,
            hp,
            Attack::new("Punch", "A plain punch.", "Take this!", 20),
            Defend::new("Guard", "Arms up.", 5, 10),
            SpecialMove::new(
                "Mend",
                "Hits everyone and heals.",
                "Here goes.",
                2,
                SpecialEffect::Strike {
                    damage: 10,
                    pierce: true,
                    heal: 15,
                },
            ),
        )
    }

    #[test]
    fn test_alive_tracks_hp() {
        let mut c = fighter("A", 10);
        assert!(c.is_alive());
        c.take_damage(10);
        assert!(!c.is_alive());
        c.take_damage(5);
        assert_eq!(c.hp(), -5);
        assert!(!c.is_alive());
    }

    #[test]
    fn test_attack_speaks_then_hits() {
        let a = fighter("A", 100);
        let mut b = fighter("B", 100);
        let events = a.attack(&mut b);
        assert_eq!(b.hp(), 85);
        assert_eq!(
            events[0],
            BattleEvent::Voiceline {
                speaker: "A".into(),
                line: "Take this!".into()
            }
        );
    }

    #[test]
    fn test_defend_twice_reports_already_defending() {
        let mut c = fighter("A", 100);
        assert_eq!(
            c.defend(),
            vec![BattleEvent::DefenseRaised {
                name: "A".into(),
                boost: 10
            }]
        );
        assert_eq!(c.defense(), 15);
        assert_eq!(
            c.defend(),
            vec![BattleEvent::AlreadyDefending { name: "A".into() }]
        );
        assert_eq!(c.defense(), 15);

        assert!(c.handle_defense_boost());
        assert_eq!(c.defense(), 5);
        assert!(!c.handle_defense_boost());
    }

    #[test]
    fn test_boosted_defense_reduces_attack() {
        let a = fighter("A", 100);
        let mut b = fighter("B", 100);
        b.defend();
        a.attack(&mut b);
        assert_eq!(b.hp(), 95);
    }

    #[test]
    fn test_special_heals_caster_only_when_used() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut a = fighter("A", 50);
        let mut b = fighter("B", 50);

        let outcome = a.special(&mut [&mut b], 0, &mut rng);
        assert!(outcome.was_used());
        assert_eq!(a.hp(), 65);
        assert_eq!(b.hp(), 40);

        let outcome = a.special(&mut [&mut b], 1, &mut rng);
        assert!(!outcome.was_used());
        assert_eq!(a.hp(), 65);
        assert_eq!(b.hp(), 40);
    }

    #[test]
    fn test_stun_then_poison_ticks() {
        let mut c = fighter("A", 100);
        c.inflict_poison(1);
        c.inflict_stun(1);

        let poison = c.handle_poison();
        assert_eq!(c.hp(), 90);
        assert!(!poison.skip_turn);

        let stun = c.handle_stun();
        assert!(stun.skip_turn);
        assert!(!c.stun().is_active());
        assert!(!c.handle_stun().skip_turn);
    }

    #[test]
    fn test_forfeit_is_final() {
        let mut c = fighter("A", 100);
        assert_eq!(c.forfeit(), vec![BattleEvent::Forfeited { name: "A".into() }]);
        assert_eq!(c.hp(), 0);
        assert!(!c.is_alive());
        assert!(c.forfeit().is_empty());
    }

    #[test]
    fn test_description_lists_every_move() {
        let c = fighter("A", 100);
        let text = c.description();
        assert!(text.starts_with("A (HP: 100)\n"));
        assert!(text.contains("Attack: Punch\n  - A plain punch.\n  - Damage: 20 HP\n"));
        assert!(text.contains("Defense: Guard\n  - Arms up.\n  - Base: 5 HP\n  - Boost: 10 HP\n"));
        assert!(text.contains("Special Move: Mend\n  - Hits everyone and heals.\n  - Cooldown: 2 turns\n"));
    }
}
