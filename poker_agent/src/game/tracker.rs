//! Reconciles server events and the hero's own decisions into one view of
//! the hand.
//!
//! Three sources feed the tracker: per-action deltas (`player_action`),
//! periodic full snapshots (`game_update`, `action_request`) and the hero's
//! decisions, which are applied before the server confirms them. Each hero
//! decision leaves a pending credit so the server's echo of it is consumed
//! instead of being applied a second time.

use log::{debug, warn};

use super::{
    super::net::messages::{
        ActionRequest, GameUpdate, HandResult, HandStart, Message, OutgoingAction, PlayerAction,
        StreetChange,
    },
    betting::BettingState,
    entities::{ActionKind, Chips, HistoryEntry, Player, PlayerActionKind, Street},
    errors::TrackerError,
    state::{ActiveSeats, GameState},
};

/// Receives every history entry as it is appended.
pub trait HistoryLogger {
    fn appended(&self, entry: &HistoryEntry, state: &GameState);
}

/// Forwards history entries to the `log` facade at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogHistory;

impl HistoryLogger for LogHistory {
    fn appended(&self, entry: &HistoryEntry, state: &GameState) {
        debug!("hand {}: {entry}", state.hand_id);
    }
}

pub struct Tracker {
    state: GameState,
    logger: Option<Box<dyn HistoryLogger>>,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker {
    pub fn new() -> Self {
        Self::with_logger(Some(Box::new(LogHistory)))
    }

    pub fn with_logger(logger: Option<Box<dyn HistoryLogger>>) -> Self {
        Self {
            state: GameState::new(),
            logger,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Route a decoded message to its handler.
    pub fn apply(&mut self, message: &Message) -> Result<(), TrackerError> {
        match message {
            Message::HandStart(msg) => self.hand_start(msg)?,
            Message::ActionRequest(msg) => self.action_request(msg),
            Message::GameUpdate(msg) => self.game_update(msg),
            Message::PlayerAction(msg) => self.player_action(msg),
            Message::StreetChange(msg) => self.street_change(msg)?,
            Message::HandResult(msg) => self.hand_result(msg),
            Message::GameCompleted(_) | Message::Error(_) | Message::NoOp => {}
        }
        Ok(())
    }

    pub fn hand_start(&mut self, msg: &HandStart) -> Result<(), TrackerError> {
        self.state.reset();
        let state = &mut self.state;

        state.players = msg
            .seats
            .iter()
            .map(|seat| Player::new(seat.seat, seat.name.clone(), seat.chips))
            .collect();
        state.hero_index = Some(
            state
                .index_of_seat(msg.hero_seat)
                .ok_or(TrackerError::HeroNotSeated(msg.hero_seat))?,
        );
        state.active = ActiveSeats::all(state.players.len());

        state.hand_id = msg.hand_id.clone();
        state.hero_seat = msg.hero_seat;
        state.button = msg.button;
        state.small_blind = msg.small_blind;
        state.big_blind = msg.big_blind;
        state.hole_cards = msg.hole_cards.clone();
        state.version = msg.version;

        state.betting = BettingState::preflop(msg.small_blind, msg.big_blind);
        state.pot = state.betting.pot;
        state.to_call = state.betting.to_call;
        state.street_max_bet = msg.big_blind;
        Ok(())
    }

    /// Take the server's figures for the hero's decision. A to-call above
    /// the known bet level means someone raised in a way no delta reported.
    pub fn action_request(&mut self, msg: &ActionRequest) {
        let hero_bet = self.state.hero().map_or(0, |p| p.bet);
        let level = hero_bet.saturating_add(msg.to_call);
        if level > self.state.street_max_bet {
            let previous_to_call = self.state.to_call;
            self.reconcile_raise(level, msg.pot.saturating_sub(msg.to_call), previous_to_call);
        }
        self.state.pot = msg.pot;
        self.state.to_call = msg.to_call;
        self.state.sync_betting();
    }

    pub fn game_update(&mut self, msg: &GameUpdate) {
        let state = &mut self.state;
        let (previous_pot, previous_to_call) = (state.pot, state.to_call);

        for (i, snapshot) in msg.players.iter().enumerate() {
            let by_name = (!snapshot.name.is_empty())
                .then(|| state.players.iter().position(|p| p.name == snapshot.name))
                .flatten();
            let index = match by_name {
                Some(index) => index,
                // Legacy seating lists carry no names
                None if state.players.get(i).is_some_and(|p| p.name.is_empty()) => {
                    state.players[i].name = snapshot.name.clone();
                    i
                }
                None => {
                    warn!("game update names unknown player {:?}", snapshot.name);
                    continue;
                }
            };
            let player = &mut state.players[index];
            player.chips = snapshot.chips;
            player.bet = snapshot.bet;
            player.folded = snapshot.folded;
            player.all_in = snapshot.all_in;
        }
        state.refresh_active();

        if let Some(board) = &msg.board {
            state.board = board.clone();
        }
        state.pot = msg.pot;

        let max_bet = state.players.iter().map(|p| p.bet).max().unwrap_or(0);
        if max_bet > state.street_max_bet {
            self.reconcile_raise(max_bet, previous_pot, previous_to_call);
            self.state.to_call = self.state.hero_shortfall();
        } else if msg.pot > previous_pot {
            self.state.to_call = self.state.hero_shortfall();
        }
        self.state.sync_betting();
    }

    pub fn player_action(&mut self, msg: &PlayerAction) {
        let kind = PlayerActionKind::classify(&msg.action);
        let Some(index) = self.state.index_of_seat(msg.seat) else {
            warn!("{} reported for unknown seat {}", msg.action, msg.seat);
            if let Some(pot) = msg.pot {
                self.state.pot = pot;
                self.state.sync_betting();
            }
            return;
        };

        if self.state.hero_index == Some(index) && self.state.pending_hero_actions > 0 {
            self.confirm_hero_action(index, msg);
            return;
        }

        let state = &mut self.state;
        let (previous_pot, previous_to_call) = (state.pot, state.to_call);
        let player = &mut state.players[index];
        let paid = msg
            .amount_paid
            .or_else(|| msg.player_bet.map(|bet| bet.saturating_sub(player.bet).max(0)))
            .unwrap_or(0);

        player.bet = msg.player_bet.unwrap_or(player.bet.saturating_add(paid));
        player.chips = msg.player_chips.unwrap_or(player.chips.saturating_sub(paid));
        if player.chips <= 0 || kind == PlayerActionKind::AllIn {
            player.all_in = true;
        }
        if kind.is_fold() {
            player.folded = true;
        }
        if player.name.is_empty() {
            if let Some(name) = &msg.name {
                player.name = name.clone();
            }
        }
        let (seat, total_bet) = (player.seat, player.bet);

        state.pot = match msg.pot {
            Some(pot) => pot,
            // Blinds are already in the pot seeded at hand start
            None if kind.is_blind() => state.pot,
            None => state.pot.saturating_add(paid),
        };

        if total_bet > state.street_max_bet {
            if kind.is_blind() {
                state.street_max_bet = total_bet;
            } else {
                self.reconcile_raise(total_bet, previous_pot, previous_to_call);
            }
        }
        self.state.to_call = self.state.hero_shortfall();

        if !kind.is_blind() {
            self.push_history(HistoryEntry {
                seat,
                street: self.state.street,
                kind,
                amount: paid,
                total_bet,
            });
        }
        self.finish_action(kind);
    }

    /// The server's echo of a hero action already applied locally.
    fn confirm_hero_action(&mut self, index: usize, msg: &PlayerAction) {
        let state = &mut self.state;
        state.pending_hero_actions -= 1;

        let player = &mut state.players[index];
        if let Some(bet) = msg.player_bet {
            player.bet = bet;
        }
        if let Some(chips) = msg.player_chips {
            player.chips = chips;
            player.all_in |= chips <= 0;
        }
        let bet = player.bet;
        if let Some(pot) = msg.pot {
            state.pot = pot;
        }
        state.street_max_bet = state.street_max_bet.max(bet);
        state.to_call = state.hero_shortfall();
        state.sync_betting();
    }

    pub fn street_change(&mut self, msg: &StreetChange) -> Result<(), TrackerError> {
        let street = Street::from_label(&msg.street)
            .ok_or_else(|| TrackerError::InvalidStreetLabel(msg.street.clone()))?;
        let state = &mut self.state;

        state.raise_count = 0;
        state.street_max_bet = 0;
        state.to_call = 0;
        state.pending_hero_actions = 0;
        state.board = msg.board.clone();
        for player in &mut state.players {
            player.bet = 0;
        }
        if let Some(pot) = msg.pot {
            state.pot = pot;
        }
        state.street = street;
        state.betting = BettingState::street_baseline(state.pot, state.big_blind, street);
        Ok(())
    }

    pub fn hand_result(&mut self, msg: &HandResult) {
        if let Some(board) = &msg.board {
            self.state.board = board.clone();
        }
        self.state.street = Street::Showdown;
        self.state.sync_betting();
    }

    /// Apply the hero's decision ahead of the server's confirmation.
    ///
    /// Does nothing when no hero is seated.
    pub fn record_hero_action(&mut self, action: &OutgoingAction) {
        let Some(index) = self.state.hero_index else {
            warn!("hero action {action} recorded with no hero seated");
            return;
        };
        let state = &mut self.state;
        let (previous_pot, previous_to_call) = (state.pot, state.to_call);
        let to_call = state.to_call;
        let player = &mut state.players[index];

        let (kind, paid): (PlayerActionKind, Chips) = match action.kind {
            ActionKind::Fold => (PlayerActionKind::Fold, 0),
            ActionKind::Call if to_call == 0 => (PlayerActionKind::Check, 0),
            ActionKind::Call => (PlayerActionKind::Call, to_call.min(player.chips).max(0)),
            ActionKind::Raise => {
                let target = action.amount.unwrap_or(player.bet);
                (PlayerActionKind::Raise, target.saturating_sub(player.bet).clamp(0, player.chips.max(0)))
            }
            ActionKind::AllIn => (PlayerActionKind::AllIn, player.chips.max(0)),
        };

        player.bet = player.bet.saturating_add(paid);
        player.chips -= paid;
        if kind == PlayerActionKind::Fold {
            player.folded = true;
        } else if kind == PlayerActionKind::AllIn || (paid > 0 && player.chips <= 0) {
            player.all_in = true;
        }
        let (seat, total_bet) = (player.seat, player.bet);
        state.pot = state.pot.saturating_add(paid);

        if total_bet > state.street_max_bet {
            self.reconcile_raise(total_bet, previous_pot, previous_to_call);
        }
        self.state.to_call = self.state.hero_shortfall();

        self.push_history(HistoryEntry {
            seat,
            street: self.state.street,
            kind,
            amount: paid,
            total_bet,
        });
        self.finish_action(kind);
        self.state.pending_hero_actions += 1;
    }

    /// Record a new bet level along with the figures leading up to it.
    fn reconcile_raise(&mut self, level: Chips, pot_before: Chips, to_call_before: Chips) {
        let state = &mut self.state;
        state.betting.pot_before_last_raise = pot_before;
        state.betting.to_call_before_last_raise = to_call_before;
        state.betting.last_raise_delta = level.saturating_sub(state.street_max_bet);
        state.street_max_bet = level;
    }

    fn finish_action(&mut self, kind: PlayerActionKind) {
        if kind.is_fold() {
            self.state.refresh_active();
        }
        if kind.is_aggressive() {
            self.state.raise_count += 1;
        }
        self.state.sync_betting();
    }

    fn push_history(&mut self, entry: HistoryEntry) {
        if let Some(logger) = &self.logger {
            logger.appended(&entry, &self.state);
        }
        self.state.history.push(entry);
    }
}
