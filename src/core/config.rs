//! Server configuration
//!
//! Loaded from an optional TOML file; every field has a default so a file
//! only needs to name what it changes.

use crate::battle::factory::CharacterFactory;
use crate::core::error::{BattleError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Configuration for a battle server session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to listen on
    pub host: String,

    /// TCP port (0 lets the OS pick one)
    pub port: u16,

    /// Connections accepted before the join window closes on its own
    pub max_players: usize,

    /// Connections required before a `start` request is honored
    ///
    /// A battle needs at least two fighters.
    pub min_players: usize,

    /// Seed for special-move randomness (stun and poison rolls)
    ///
    /// `None` draws a fresh seed per session.
    pub seed: Option<u64>,

    /// Factory keys of the characters offered for selection, in offer order
    pub roster: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5555,
            max_players: 5,
            min_players: 2,
            seed: None,
            roster: CharacterFactory::keys().iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file on disk
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse a config from TOML text
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: ServerConfig =
            toml::from_str(content).map_err(|e| BattleError::Config(e.to_string()))?;
        Ok(config)
    }

    /// `host:port` string for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.min_players < 2 {
            return Err(BattleError::Config(format!(
                "min_players ({}) must be at least 2",
                self.min_players
            )));
        }

        if self.max_players < self.min_players {
            return Err(BattleError::Config(format!(
                "max_players ({}) should be >= min_players ({})",
                self.max_players, self.min_players
            )));
        }

        if self.max_players > self.roster.len() {
            return Err(BattleError::Config(format!(
                "max_players ({}) exceeds roster size ({})",
                self.max_players,
                self.roster.len()
            )));
        }

        let mut seen = HashSet::new();
        for key in &self.roster {
            if !CharacterFactory::contains(key) {
                return Err(BattleError::UnknownCharacter(key.clone()));
            }
            // Keys match case-insensitively, so "Gojo" and "gojo" are one character
            if !seen.insert(key.to_ascii_lowercase()) {
                return Err(BattleError::Config(format!(
                    "roster lists {} more than once",
                    key
                )));
            }
        }

        Ok(())
    }
}
