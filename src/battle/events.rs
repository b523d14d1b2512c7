//! Battle notifications
//!
//! Every state change a player should hear about is returned as a
//! `BattleEvent` from the operation that caused it. The transport decides
//! where the events go; `Display` gives the line shown to players.

use crate::core::types::{Hp, Turn};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BattleEvent {
    Voiceline { speaker: String, line: String },
    Attacked {
        attacker: String,
        defender: String,
        damage: Hp,
        remaining_hp: Hp,
    },
    Defeated { name: String },
    DefenseRaised { name: String, boost: Hp },
    AlreadyDefending { name: String },
    SpecialUsed { name: String, special: String },
    SpecialOnCooldown { name: String, special: String },
    SpecialHit {
        target: String,
        special: String,
        damage: Hp,
    },
    EliminatedBy { target: String, special: String },
    Healed { name: String, amount: Hp },
    Stunned { target: String, special: String },
    Poisoned {
        target: String,
        special: String,
        turns: Turn,
    },
    PoisonTick { name: String, damage: Hp },
    EliminatedByPoison { name: String },
    PoisonWoreOff { name: String },
    StunSkip { name: String },
    StunWoreOff { name: String },
    Forfeited { name: String },
    /// Death noticed when the turn advanced
    Fallen { name: String },
}

impl BattleEvent {
    /// Does this event mark a character leaving the fight?
    pub fn is_elimination(&self) -> bool {
        matches!(
            self,
            BattleEvent::Defeated { .. }
                | BattleEvent::EliminatedBy { .. }
                | BattleEvent::EliminatedByPoison { .. }
                | BattleEvent::Forfeited { .. }
        )
    }
}

impl fmt::Display for BattleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleEvent::Voiceline { speaker, line } => write!(f, "{}: \"{}\"", speaker, line),
            BattleEvent::Attacked {
                attacker,
                defender,
                damage,
                remaining_hp,
            } => write!(
                f,
                "{} attacks {} for {} damage! {} has {} HP remaining.",
                attacker, defender, damage, defender, remaining_hp
            ),
            BattleEvent::Defeated { name } => write!(f, "{} has been defeated!", name),
            BattleEvent::DefenseRaised { name, boost } => write!(
                f,
                "{} strengthens themselves, adding {} defense.",
                name, boost
            ),
            BattleEvent::AlreadyDefending { name } => {
                write!(f, "{} is already defending this turn.", name)
            }
            BattleEvent::SpecialUsed { name, special } => write!(f, "{} uses {}!", name, special),
            BattleEvent::SpecialOnCooldown { special, .. } => {
                write!(f, "{} is on cooldown! Choose another action.", special)
            }
            BattleEvent::SpecialHit {
                target, damage, ..
            } => write!(f, "{} was damaged for {} damage.", target, damage),
            BattleEvent::EliminatedBy { target, special } => {
                write!(f, "{} was eliminated by {}.", target, special)
            }
            BattleEvent::Healed { name, amount } => write!(f, "{} heals {} HP.", name, amount),
            BattleEvent::Stunned { target, special } => {
                write!(f, "{} was stunned by {}.", target, special)
            }
            BattleEvent::Poisoned {
                target,
                special,
                turns,
            } => write!(
                f,
                "{} was poisoned by {} for {} turns.",
                target, special, turns
            ),
            BattleEvent::PoisonTick { name, damage } => {
                write!(f, "{} is poisoned! They take {} damage.", name, damage)
            }
            BattleEvent::EliminatedByPoison { name } => {
                write!(f, "{} was eliminated by poison!", name)
            }
            BattleEvent::PoisonWoreOff { name } => write!(f, "{} is no longer poisoned!", name),
            BattleEvent::StunSkip { name } => {
                write!(f, "{} is stunned and their turn is skipped!", name)
            }
            BattleEvent::StunWoreOff { name } => write!(f, "{} is no longer stunned!", name),
            BattleEvent::Forfeited { name } => write!(f, "{} has left the battle.", name),
            BattleEvent::Fallen { name } => write!(f, "{} has fallen.", name),
        }
    }
}
