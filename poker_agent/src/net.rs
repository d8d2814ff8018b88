//! Networking layer between an agent and the game server.
//!
//! Frames are MessagePack maps carried over a WebSocket. This module decodes
//! them into typed messages, encodes the agent's replies and runs the
//! session loop that ties both to the tracker.

/// MessagePack decoding and encoding of wire messages.
pub mod codec;

/// Error types for the codec, transport and session.
pub mod errors;

/// Newline-delimited JSON log of wire traffic.
pub mod message_log;

/// Typed wire messages.
pub mod messages;

/// Protocol versioning for backward compatibility.
pub mod protocol_version;

mod reader;

/// The request/decide/respond loop.
pub mod session;

/// Message channel abstraction and its WebSocket implementation.
pub mod transport;
