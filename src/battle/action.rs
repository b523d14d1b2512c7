//! Move categories: attack, defend, special
//!
//! Every character owns exactly one of each. Attack and Defend are plain
//! stat blocks; SpecialMove carries a cooldown and a tagged effect.

use crate::battle::character::Character;
use crate::battle::events::BattleEvent;
use crate::core::types::{Hp, Turn};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Common surface of all move categories
pub trait Action {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// Line spoken when the move is used (may be empty)
    fn voiceline(&self) -> &str;
}

// ============================================================================
// Attack
// ============================================================================

/// Single-target damage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attack {
    name: String,
    description: String,
    voiceline: String,
    damage: Hp,
}

impl Attack {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        voiceline: impl Into<String>,
        damage: Hp,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            voiceline: voiceline.into(),
            damage,
        }
    }

    pub fn damage(&self) -> Hp {
        self.damage
    }

    /// Damage dealt through the given defense (never negative)
    pub fn damage_against(&self, defense: Hp) -> Hp {
        (self.damage - defense).max(0)
    }

    /// Hit `defender` once, reducing damage by its current defense
    pub fn apply(&self, attacker: &str, defender: &mut Character) -> Vec<BattleEvent> {
        let damage = self.damage_against(defender.defense());
        let remaining_hp = defender.take_damage(damage);

        let mut events = vec![BattleEvent::Attacked {
            attacker: attacker.to_string(),
            defender: defender.name().to_string(),
            damage,
            remaining_hp,
        }];
        if !defender.is_alive() {
            events.push(BattleEvent::Defeated {
                name: defender.name().to_string(),
            });
        }
        events
    }
}

impl Action for Attack {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn voiceline(&self) -> &str {
        &self.voiceline
    }
}

// ============================================================================
// Defend
// ============================================================================

/// Flat damage reduction with a one-turn boost
///
/// `current_defense` is always either `base_defense` or
/// `base_defense + boost`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defend {
    name: String,
    description: String,
    base_defense: Hp,
    boost: Hp,
    current_defense: Hp,
}

impl Defend {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        base_defense: Hp,
        boost: Hp,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            base_defense,
            boost,
            current_defense: base_defense,
        }
    }

    pub fn base_defense(&self) -> Hp {
        self.base_defense
    }

    pub fn boost(&self) -> Hp {
        self.boost
    }

    pub fn current_defense(&self) -> Hp {
        self.current_defense
    }

    pub fn is_boost_active(&self) -> bool {
        self.current_defense > self.base_defense
    }

    /// Raise defense by the boost. Returns false if the boost was already up.
    pub fn apply(&mut self) -> bool {
        if self.is_boost_active() {
            return false;
        }
        self.current_defense = self.base_defense + self.boost;
        true
    }

    /// Drop an active boost back to base. Returns true if one was dropped.
    pub fn reset(&mut self) -> bool {
        if !self.is_boost_active() {
            return false;
        }
        self.current_defense = self.base_defense;
        true
    }
}

impl Action for Defend {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn voiceline(&self) -> &str {
        ""
    }
}

// ============================================================================
// Special moves
// ============================================================================

/// Closed set of special-move behaviors
///
/// Every kind hits all other living characters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpecialEffect {
    /// Fixed damage to each target; `pierce` ignores defense.
    /// The caster heals `heal` afterwards.
    Strike { damage: Hp, pierce: bool, heal: Hp },
    /// Damage through defense, then an independent stun roll per survivor
    StrikeThenStun { damage: Hp, stun_chance: f64 },
    /// Per target: stun with `stun_chance`, otherwise damage through defense
    StunOrStrike { damage: Hp, stun_chance: f64 },
    /// Poison each target for a uniform number of turns in `min_turns..=max_turns`
    Poison { min_turns: Turn, max_turns: Turn },
}

impl SpecialEffect {
    /// Hp restored to the caster after a successful use
    pub fn caster_heal(&self) -> Hp {
        match self {
            SpecialEffect::Strike { heal, .. } => *heal,
            _ => 0,
        }
    }

    fn apply<R: Rng + ?Sized>(
        &self,
        special: &str,
        targets: &mut [&mut Character],
        rng: &mut R,
    ) -> Vec<BattleEvent> {
        let mut events = Vec::new();

        match *self {
            SpecialEffect::Strike { damage, pierce, .. } => {
                for target in targets.iter_mut() {
                    let dealt = if pierce {
                        damage
                    } else {
                        (damage - target.defense()).max(0)
                    };
                    events.push(hit(target, special, dealt));
                }
            }
            SpecialEffect::StrikeThenStun {
                damage,
                stun_chance,
            } => {
                for target in targets.iter_mut() {
                    let dealt = (damage - target.defense()).max(0);
                    events.push(hit(target, special, dealt));
                }
                for target in targets.iter_mut().filter(|t| t.is_alive()) {
                    if rng.gen_bool(stun_chance) {
                        target.inflict_stun(1);
                        events.push(BattleEvent::Stunned {
                            target: target.name().to_string(),
                            special: special.to_string(),
                        });
                    }
                }
            }
            SpecialEffect::StunOrStrike {
                damage,
                stun_chance,
            } => {
                for target in targets.iter_mut() {
                    if rng.gen_bool(stun_chance) {
                        target.inflict_stun(1);
                        events.push(BattleEvent::Stunned {
                            target: target.name().to_string(),
                            special: special.to_string(),
                        });
                    } else {
                        let dealt = (damage - target.defense()).max(0);
                        events.push(hit(target, special, dealt));
                    }
                }
            }
            SpecialEffect::Poison {
                min_turns,
                max_turns,
            } => {
                for target in targets.iter_mut() {
                    let turns = rng.gen_range(min_turns..=max_turns);
                    target.inflict_poison(turns);
                    events.push(BattleEvent::Poisoned {
                        target: target.name().to_string(),
                        special: special.to_string(),
                        turns,
                    });
                }
            }
        }

        events
    }
}

fn hit(target: &mut Character, special: &str, damage: Hp) -> BattleEvent {
    target.take_damage(damage);
    if target.is_alive() {
        BattleEvent::SpecialHit {
            target: target.name().to_string(),
            special: special.to_string(),
            damage,
        }
    } else {
        BattleEvent::EliminatedBy {
            target: target.name().to_string(),
            special: special.to_string(),
        }
    }
}

/// Result of trying to use a special move
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialOutcome {
    Used(Vec<BattleEvent>),
    /// Nothing happened; the move is ready in `ready_in` turns
    OnCooldown { ready_in: Turn, event: BattleEvent },
}

impl SpecialOutcome {
    pub fn was_used(&self) -> bool {
        matches!(self, SpecialOutcome::Used(_))
    }
}

/// Cooldown-gated special move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialMove {
    name: String,
    description: String,
    voiceline: String,
    cooldown: Turn,
    /// Turn of the last successful use; `None` until first use
    last_used: Option<Turn>,
    effect: SpecialEffect,
}

impl SpecialMove {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        voiceline: impl Into<String>,
        cooldown: Turn,
        effect: SpecialEffect,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            voiceline: voiceline.into(),
            cooldown,
            last_used: None,
            effect,
        }
    }

    pub fn cooldown(&self) -> Turn {
        self.cooldown
    }

    pub fn last_used(&self) -> Option<Turn> {
        self.last_used
    }

    pub fn effect(&self) -> &SpecialEffect {
        &self.effect
    }

    pub fn is_available(&self, turn: Turn) -> bool {
        self.turns_until_ready(turn) == 0
    }

    pub fn turns_until_ready(&self, turn: Turn) -> Turn {
        match self.last_used {
            None => 0,
            Some(last) => self.cooldown.saturating_sub(turn.saturating_sub(last)),
        }
    }

    /// Use the move against `targets` if its cooldown has elapsed
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        caster: &str,
        targets: &mut [&mut Character],
        turn: Turn,
        rng: &mut R,
    ) -> SpecialOutcome {
        let ready_in = self.turns_until_ready(turn);
        if ready_in > 0 {
            return SpecialOutcome::OnCooldown {
                ready_in,
                event: BattleEvent::SpecialOnCooldown {
                    name: caster.to_string(),
                    special: self.name.clone(),
                },
            };
        }

        let mut events = vec![
            BattleEvent::Voiceline {
                speaker: caster.to_string(),
                line: self.voiceline.clone(),
            },
            BattleEvent::SpecialUsed {
                name: caster.to_string(),
                special: self.name.clone(),
            },
        ];
        events.extend(self.effect.apply(&self.name, targets, rng));
        self.last_used = Some(turn);

        SpecialOutcome::Used(events)
    }
}

impl Action for SpecialMove {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn voiceline(&self) -> &str {
        &self.voiceline
    }
}
