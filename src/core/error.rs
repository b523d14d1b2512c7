use thiserror::Error;

use crate::battle::manager::BattlePhase;
use crate::core::types::Turn;

#[derive(Error, Debug)]
pub enum BattleError {
    #[error("Character '{0}' does not exist in the factory")]
    UnknownCharacter(String),

    #[error("Character not available: {0}")]
    CharacterUnavailable(String),

    #[error("Roster is full ({0} players)")]
    RosterFull(usize),

    #[error("Not enough players: {assigned} assigned, {required} required")]
    NotEnoughPlayers { required: usize, assigned: usize },

    #[error("Invalid phase: expected {expected:?}, battle is {actual:?}")]
    InvalidPhase {
        expected: BattlePhase,
        actual: BattlePhase,
    },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Attack requires a target")]
    TargetRequired,

    #[error("{name} is on cooldown for {ready_in} more turn(s)! Choose another action.")]
    SpecialOnCooldown { name: String, ready_in: Turn },

    #[error("{0} has been defeated and cannot act")]
    ActorDefeated(String),

    #[error("It is not {0}'s turn")]
    OutOfTurn(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BattleError>;
