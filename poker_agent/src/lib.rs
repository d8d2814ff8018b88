//! # Poker Agent
//!
//! Client-side engine connecting a decision-making agent to a remote
//! Texas Hold'em server.
//!
//! The server speaks MessagePack over a WebSocket, in either of two protocol
//! generations. This library decodes both into one closed set of messages,
//! reconstructs the betting state of the hand from deltas, snapshots and the
//! agent's own actions, and drives a blocking loop that asks the agent for a
//! decision exactly when the server requests one.
//!
//! ## Core Modules
//!
//! - [`net`]: wire codec, transport, session loop and message log
//! - [`game`]: entities, betting state and the state tracker
//! - [`config`]: environment-driven agent configuration
//!
//! ## Example
//!
//! ```
//! use poker_agent::{Tracker, codec, messages::Message};
//!
//! let frame = [0x81, 0xa4, b't', b'y', b'p', b'e', 0xa4, b'p', b'i', b'n', b'g'];
//! let message = codec::decode(&frame).unwrap();
//! assert_eq!(message, Message::NoOp);
//!
//! let mut tracker = Tracker::new();
//! tracker.apply(&message).unwrap();
//! ```

/// Environment-driven configuration.
pub mod config;

/// Table entities and state tracking.
pub mod game;

/// Networking components for the agent-server protocol.
pub mod net;

pub use game::{
    BettingState, GameState, HistoryLogger, LogHistory, Tracker, TrackerError,
    entities::{self, ActionKind, Card, Chips, Player, PlayerActionKind, Seat, Street},
};
pub use net::{
    codec,
    errors::{CodecError, SessionError, StopSession, TransportError},
    message_log::{Direction, JsonlMessageLog, MessageSink},
    messages::{self, ConnectRequest, OutgoingAction},
    protocol_version::ProtocolVersion,
    session::{Agent, Session, SessionOutcome, SessionReport},
    transport::{Frame, Transport, WsTransport},
};
