//! Timed status effects (poison, stun)
//!
//! Each effect counts down once per tick while active. Ticking an inactive
//! effect is a no-op, so callers may tick unconditionally.

use crate::battle::events::BattleEvent;
use crate::core::types::{Hp, Turn};
use serde::{Deserialize, Serialize};

/// Damage a character's poison deals per tick unless configured otherwise
pub const DEFAULT_POISON_DAMAGE: Hp = 10;

/// Shared duration contract for status effects
pub trait StatusEffect {
    /// Remaining ticks
    fn duration(&self) -> Turn;

    /// Overwrite the remaining ticks (re-applying replaces, never stacks)
    fn set_duration(&mut self, turns: Turn);

    fn is_active(&self) -> bool {
        self.duration() > 0
    }
}

/// Result of ticking a status effect at the start of a character's turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusTick {
    /// The owner's action phase must be skipped this turn
    pub skip_turn: bool,
    pub events: Vec<BattleEvent>,
}

impl StatusTick {
    pub fn merge(&mut self, other: StatusTick) {
        self.skip_turn |= other.skip_turn;
        self.events.extend(other.events);
    }
}

/// Damage over time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poison {
    pub damage: Hp,
    duration: Turn,
}

impl Poison {
    pub fn new(damage: Hp, duration: Turn) -> Self {
        Self { damage, duration }
    }

    /// Apply one tick of poison to the named character's hp
    pub fn handle(&mut self, name: &str, hp: &mut Hp) -> StatusTick {
        let mut tick = StatusTick::default();
        if !self.is_active() {
            return tick;
        }

        *hp -= self.damage;
        tick.events.push(BattleEvent::PoisonTick {
            name: name.to_string(),
            damage: self.damage,
        });

        if *hp <= 0 {
            tick.skip_turn = true;
            tick.events.push(BattleEvent::EliminatedByPoison {
                name: name.to_string(),
            });
        }

        self.duration -= 1;
        if self.duration == 0 {
            tick.events.push(BattleEvent::PoisonWoreOff {
                name: name.to_string(),
            });
        }

        tick
    }
}

impl Default for Poison {
    fn default() -> Self {
        Self::new(DEFAULT_POISON_DAMAGE, 0)
    }
}

impl StatusEffect for Poison {
    fn duration(&self) -> Turn {
        self.duration
    }

    fn set_duration(&mut self, turns: Turn) {
        self.duration = turns;
    }
}

/// Lost turns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stun {
    duration: Turn,
}

impl Stun {
    pub fn new(duration: Turn) -> Self {
        Self { duration }
    }

    /// Consume one tick of stun; an active stun skips the owner's turn
    pub fn handle(&mut self, name: &str) -> StatusTick {
        let mut tick = StatusTick::default();
        if !self.is_active() {
            return tick;
        }

        tick.skip_turn = true;
        tick.events.push(BattleEvent::StunSkip {
            name: name.to_string(),
        });

        self.duration -= 1;
        if self.duration == 0 {
            tick.events.push(BattleEvent::StunWoreOff {
                name: name.to_string(),
            });
        }

        tick
    }
}

impl StatusEffect for Stun {
    fn duration(&self) -> Turn {
        self.duration
    }

    fn set_duration(&mut self, turns: Turn) {
        self.duration = turns;
    }
}
