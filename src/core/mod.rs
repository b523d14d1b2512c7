pub mod config;
pub mod error;
pub mod types;

pub use config::ServerConfig;
pub use error::{BattleError, Result};
pub use types::{ConnectionId, Hp, Turn};
