//! TCP transport for the battle core
//!
//! Newline-delimited JSON over TCP. Reader tasks feed a shared mailbox;
//! a single game loop owns the battle and all socket writes.

pub mod connection;
pub mod game;
pub mod mailbox;
pub mod protocol;

pub use connection::{ConnectionWriter, Envelope, Inbound, LineReader};
pub use game::GameServer;
pub use mailbox::Mailbox;
pub use protocol::{ClientMessage, ClientMessageKind, ProtocolError, ServerMessage};
