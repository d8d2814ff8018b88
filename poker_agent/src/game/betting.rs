use std::fmt;

use super::entities::{Chips, Street};

/// Betting figures derived for the hero's pending decision.
///
/// `to_call` is what the hero still owes against the highest bet seen on the
/// street. The `*_before_last_raise` snapshots are reconstructed from the
/// pot and to-call values around a raise and may drift from the server's
/// accounting once side pots form.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BettingState {
    pub pot: Chips,
    pub to_call: Chips,
    /// Increment of the most recent raise over the previous bet level.
    pub last_raise_delta: Chips,
    pub pot_before_last_raise: Chips,
    pub to_call_before_last_raise: Chips,
    pub street: Street,
}

impl BettingState {
    /// Seed a hand straight from the blinds.
    pub fn preflop(small_blind: Chips, big_blind: Chips) -> Self {
        Self {
            pot: small_blind.saturating_add(big_blind),
            to_call: big_blind,
            last_raise_delta: big_blind,
            pot_before_last_raise: 0,
            to_call_before_last_raise: 0,
            street: Street::Preflop,
        }
    }

    /// Zero-to-call baseline at the start of a postflop street.
    pub fn street_baseline(pot: Chips, big_blind: Chips, street: Street) -> Self {
        Self {
            pot,
            to_call: 0,
            last_raise_delta: big_blind,
            pot_before_last_raise: pot,
            to_call_before_last_raise: 0,
            street,
        }
    }

    /// Fraction of the pot the hero has to put in to continue.
    pub fn call_ratio(&self) -> f64 {
        if self.pot <= 0 {
            return 0.0;
        }
        self.to_call as f64 / self.pot as f64
    }

    /// Smallest street total a re-raise may legally reach.
    pub fn min_raise_total(&self) -> Chips {
        self.to_call.saturating_add(self.last_raise_delta)
    }
}

impl fmt::Display for BettingState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}] pot ${}, to call ${}, last raise ${}",
            self.street, self.pot, self.to_call, self.last_raise_delta
        )
    }
}
