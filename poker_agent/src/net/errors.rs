//! Network error types for the wire codec, transport and session loop.

use thiserror::Error;

use super::super::game::errors::TrackerError;

/// Errors that can occur while decoding or encoding wire messages
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The frame isn't a well-formed map, is truncated, or has no type tag
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// A field the detected message type can't do without is absent
    #[error("Missing field '{field}' in {message_type} message")]
    MissingField {
        message_type: &'static str,
        field: &'static str,
    },

    /// A card wasn't a valid two-character rank/suit token
    #[error("Invalid card token: {0:?}")]
    InvalidCardToken(String),

    /// An outgoing action carried an unusable amount
    #[error("Invalid amount {amount:?} for {action}")]
    InvalidActionAmount {
        action: &'static str,
        amount: Option<i64>,
    },

    /// Failed to write a payload
    #[error("Failed to encode message: {0}")]
    Encode(String),
}

impl CodecError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedFrame(detail.into())
    }
}

/// Errors raised by the underlying message channel
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported URL scheme '{0}', expected ws or wss")]
    UnsupportedScheme(String),

    #[error("Couldn't connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("WebSocket handshake failed: {0}")]
    Handshake(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("Connection already closed")]
    Closed,
}

/// Errors that end a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server reported an error and the session can't continue
    #[error("Server error{}: {message}", code_suffix(.code))]
    Server {
        message: String,
        code: Option<String>,
    },

    /// Agent callback failed
    #[error("Agent error: {0}")]
    Agent(anyhow::Error),
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default()
}

/// Returned from an agent callback to end the session cleanly.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("session stop requested")]
pub struct StopSession;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;
