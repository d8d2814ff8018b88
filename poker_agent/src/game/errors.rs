//! Errors raised while reconciling table state.

use thiserror::Error;

use super::entities::Seat;

/// Errors that invalidate the tracked state for the rest of the hand
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// The server named a street this client doesn't know
    #[error("Invalid street label: {0:?}")]
    InvalidStreetLabel(String),

    /// The hero's seat isn't part of the seating list
    #[error("Hero seat {0} is not in the seating list")]
    HeroNotSeated(Seat),
}
