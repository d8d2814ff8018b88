//! Table state as seen from the hero's seat.
//!
//! This module provides:
//! - Card, street, action and player entities
//! - Derived betting figures for the pending decision
//! - A tracker that reconciles server events with the hero's own actions

pub mod betting;
pub mod entities;
pub mod errors;
pub mod state;
pub mod tracker;

pub use betting::BettingState;
pub use errors::TrackerError;
pub use state::{ActiveSeats, GameState};
pub use tracker::{HistoryLogger, LogHistory, Tracker};
