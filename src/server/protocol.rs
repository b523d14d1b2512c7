//! Wire protocol
//!
//! Newline-delimited UTF-8 JSON. Every object carries a `"type"` tag.

use crate::battle::events::BattleEvent;
use crate::battle::manager::{ActionKind, BattleSnapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("line is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client -> server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Join { player_name: String },
    Start,
    CharacterChoice { character: String },
    Action { action: ActionKind },
    Target { target: String },
}

/// Tag of a [`ClientMessage`], for "wait for a message of this kind"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientMessageKind {
    Join,
    Start,
    CharacterChoice,
    Action,
    Target,
}

impl ClientMessage {
    pub fn kind(&self) -> ClientMessageKind {
        match self {
            ClientMessage::Join { .. } => ClientMessageKind::Join,
            ClientMessage::Start => ClientMessageKind::Start,
            ClientMessage::CharacterChoice { .. } => ClientMessageKind::CharacterChoice,
            ClientMessage::Action { .. } => ClientMessageKind::Action,
            ClientMessage::Target { .. } => ClientMessageKind::Target,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDescription {
    pub name: String,
    pub description: String,
}

/// One battle notification, rendered and structured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub text: String,
    pub event: BattleEvent,
}

impl From<BattleEvent> for LogEntry {
    fn from(event: BattleEvent) -> Self {
        Self {
            text: event.to_string(),
            event,
        }
    }
}

/// Server -> client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once on connect; `seat` is the accept-order slot
    Welcome { seat: u32 },
    Status { msg: String },
    CharacterSelection { descriptions: Vec<CharacterDescription> },
    ActionSelection,
    TargetSelection { targets: Vec<String> },
    GameState { state: BattleSnapshot },
    BattleLog { events: Vec<LogEntry> },
    /// `winner` is null on a draw
    BattleOver { winner: Option<String> },
    Error { reason: String },
    System { msg: String },
}

impl ServerMessage {
    pub fn status(msg: impl Into<String>) -> Self {
        ServerMessage::Status { msg: msg.into() }
    }

    pub fn error(reason: impl ToString) -> Self {
        ServerMessage::Error {
            reason: reason.to_string(),
        }
    }

    pub fn system(msg: impl Into<String>) -> Self {
        ServerMessage::System { msg: msg.into() }
    }

    pub fn battle_log(events: Vec<BattleEvent>) -> Self {
        ServerMessage::BattleLog {
            events: events.into_iter().map(LogEntry::from).collect(),
        }
    }
}

/// Parse one line (without its terminator)
pub fn decode_line(line: &[u8]) -> Result<ClientMessage, ProtocolError> {
    let text = std::str::from_utf8(line)?;
    Ok(serde_json::from_str(text.trim())?)
}

/// Serialize a message with its trailing newline
pub fn encode(message: &ServerMessage) -> Result<String, ProtocolError> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}
