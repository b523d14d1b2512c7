//! JJK Arena - turn-based sorcerer battles over TCP

pub mod battle;
pub mod core;
pub mod server;
