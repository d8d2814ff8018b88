//! Protocol versioning for backward compatibility.

use std::fmt;

/// Generation of the agent wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    /// V1: `game_start` frames, bare `valid_actions` lists and `check`/`bet`
    V1,
    /// V2: explicit `hand_start` frames and action descriptors
    V2,
}

impl ProtocolVersion {
    /// Get the version this client speaks
    pub fn current() -> Self {
        ProtocolVersion::V2
    }

    /// The literal marker carried in every payload this client encodes.
    pub fn wire_marker(&self) -> &'static str {
        match self {
            ProtocolVersion::V1 => "1",
            ProtocolVersion::V2 => "2",
        }
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "v{}", self.wire_marker())
    }
}
