//! Battle system - turn-based sorcerer duels
//!
//! Pieces, bottom-up:
//! - Status effects tick at the start of their owner's turn
//! - Actions (attack, defend, special) mutate characters and emit events
//! - The factory builds the fixed roster
//! - The manager drives SETUP -> IN_PROGRESS -> OVER
//!
//! Nothing in here touches the network; the server drives the manager.

pub mod action;
pub mod character;
pub mod events;
pub mod factory;
pub mod manager;
pub mod status;

// Re-exports for convenient access
pub use action::{Action, Attack, Defend, SpecialEffect, SpecialMove, SpecialOutcome};
pub use character::Character;
pub use events::BattleEvent;
pub use factory::{CharacterFactory, CharacterTemplate};
pub use manager::{
    ActionKind, BattleManager, BattleOutcome, BattlePhase, BattleSnapshot, PlayerSnapshot,
    PoisonSnapshot, MIN_FIGHTERS,
};
pub use status::{Poison, StatusEffect, StatusTick, Stun, DEFAULT_POISON_DAMAGE};
