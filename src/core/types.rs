//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Battle turn counter (increments once per completed turn slot)
pub type Turn = u32;

/// Hit points. Signed: a blow can push hp below zero before the
/// character is reported as defeated.
pub type Hp = i32;

/// Identifier for an accepted connection, assigned in accept order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

impl ConnectionId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_ids_order_by_accept_order() {
        let first = ConnectionId::new(1);
        let second = ConnectionId::new(2);
        assert!(first < second);
        assert_eq!(first.to_string(), "conn#1");
    }
}
