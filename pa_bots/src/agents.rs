//! Sample agents. Neither plays well, they exist to exercise the session.

use std::{
    fmt,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::Error;
use log::debug;
use poker_agent::{
    ActionKind, Agent, GameState, OutgoingAction, StopSession,
    messages::{ActionRequest, GameCompleted, HandResult},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AgentKind {
    #[default]
    Caller,
    Random,
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "caller" => Ok(Self::Caller),
            "random" => Ok(Self::Random),
            other => Err(format!("unknown agent '{other}', expected caller or random")),
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Caller => "caller",
            Self::Random => "random",
        };
        write!(f, "{repr}")
    }
}

/// Checks or calls whenever it can and never folds voluntarily.
#[derive(Debug, Default)]
pub struct CallerAgent;

impl Agent for CallerAgent {
    fn decide(&mut self, request: &ActionRequest, _state: &GameState) -> Result<OutgoingAction, Error> {
        let action = if request.allows(ActionKind::Call) {
            OutgoingAction::call()
        } else if request.allows(ActionKind::AllIn) {
            OutgoingAction::all_in()
        } else {
            OutgoingAction::fold()
        };
        Ok(action)
    }
}

/// Picks uniformly among the legal actions. Raises go to the smallest legal
/// total.
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    fn raise_total(request: &ActionRequest, state: &GameState) -> Option<i64> {
        let descriptor = request.descriptor(ActionKind::Raise)?;
        let hero_bet = state.hero().map_or(0, |p| p.bet);
        let floor = descriptor
            .min_amount
            .unwrap_or_else(|| hero_bet.saturating_add(state.betting.min_raise_total()));
        let total = descriptor.max_amount.map_or(floor, |max| floor.min(max));
        (total > 0).then_some(total)
    }
}

impl Agent for RandomAgent {
    fn decide(&mut self, request: &ActionRequest, state: &GameState) -> Result<OutgoingAction, Error> {
        if request.legal_actions.is_empty() {
            return Ok(OutgoingAction::fold());
        }
        let choice = self.rng.random_range(0..request.legal_actions.len());
        let action = match request.legal_actions[choice].kind {
            ActionKind::Fold => OutgoingAction::fold(),
            ActionKind::Call => OutgoingAction::call(),
            ActionKind::AllIn => OutgoingAction::all_in(),
            ActionKind::Raise => match Self::raise_total(request, state) {
                Some(total) => OutgoingAction::raise_to(total),
                None => OutgoingAction::call(),
            },
        };
        Ok(action)
    }

    fn on_hand_complete(&mut self, result: &HandResult, state: &GameState) -> Result<(), Error> {
        for winner in &result.winners {
            debug!("hand {}: seat {} won ${}", state.hand_id, winner.seat, winner.amount);
        }
        Ok(())
    }
}

/// Ends the session at the next callback once `stop` is raised.
pub struct Interruptible<A> {
    inner: A,
    stop: Arc<AtomicBool>,
}

impl<A: Agent> Interruptible<A> {
    pub fn new(inner: A, stop: Arc<AtomicBool>) -> Self {
        Self { inner, stop }
    }

    fn check(&self) -> Result<(), Error> {
        if self.stop.load(Ordering::Relaxed) {
            return Err(StopSession.into());
        }
        Ok(())
    }
}

impl<A: Agent> Agent for Interruptible<A> {
    fn decide(&mut self, request: &ActionRequest, state: &GameState) -> Result<OutgoingAction, Error> {
        self.check()?;
        self.inner.decide(request, state)
    }

    fn on_hand_start(&mut self, state: &GameState) -> Result<(), Error> {
        self.check()?;
        self.inner.on_hand_start(state)
    }

    fn on_update(&mut self, state: &GameState) -> Result<(), Error> {
        self.check()?;
        self.inner.on_update(state)
    }

    fn on_street_change(&mut self, state: &GameState) -> Result<(), Error> {
        self.check()?;
        self.inner.on_street_change(state)
    }

    fn on_hand_complete(&mut self, result: &HandResult, state: &GameState) -> Result<(), Error> {
        self.inner.on_hand_complete(result, state)?;
        self.check()
    }

    fn on_game_completed(&mut self, summary: &GameCompleted) -> Result<(), Error> {
        self.inner.on_game_completed(summary)
    }
}
