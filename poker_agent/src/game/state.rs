use super::{
    super::net::protocol_version::ProtocolVersion,
    betting::BettingState,
    entities::{Card, Chips, HistoryEntry, Player, Seat, Street},
};

/// Which players are still in the hand, indexed by player-list position.
///
/// Grows on demand. Positions past the end read as inactive.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ActiveSeats(Vec<bool>);

impl ActiveSeats {
    pub fn all(len: usize) -> Self {
        Self(vec![true; len])
    }

    pub fn from_players(players: &[Player]) -> Self {
        Self(players.iter().map(Player::is_active).collect())
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    pub fn remove(&mut self, index: usize) {
        if let Some(active) = self.0.get_mut(index) {
            *active = false;
        }
    }

    pub fn len(&self) -> usize {
        self.0.iter().filter(|&&active| active).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, &active)| active.then_some(index))
    }
}

/// Everything known about the hand in progress.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GameState {
    pub hand_id: String,
    pub hero_seat: Seat,
    pub button: Seat,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub hole_cards: Vec<Card>,
    pub street: Street,
    pub pot: Chips,
    pub to_call: Chips,
    pub board: Vec<Card>,
    /// Seating order as the server listed it.
    pub players: Vec<Player>,
    pub history: Vec<HistoryEntry>,
    pub active: ActiveSeats,
    /// Highest street total committed by anyone on this street.
    pub street_max_bet: Chips,
    /// Bets, raises and all-ins recorded on this street.
    pub raise_count: u32,
    /// Hero actions recorded locally whose server echo hasn't arrived yet.
    pub pending_hero_actions: u32,
    /// Position of the hero in `players`.
    pub hero_index: Option<usize>,
    pub betting: BettingState,
    pub version: ProtocolVersion,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything a hand accumulates.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn index_of_seat(&self, seat: Seat) -> Option<usize> {
        self.players.iter().position(|p| p.seat == seat)
    }

    pub fn player_by_seat(&self, seat: Seat) -> Option<&Player> {
        self.players.iter().find(|p| p.seat == seat)
    }

    pub fn hero(&self) -> Option<&Player> {
        self.hero_index.and_then(|index| self.players.get(index))
    }

    pub fn hero_stack(&self) -> Option<Chips> {
        self.hero().map(|p| p.chips)
    }

    pub fn active_players(&self) -> Vec<&Player> {
        self.active
            .iter()
            .filter_map(|index| self.players.get(index))
            .collect()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn raise_depth(&self) -> u32 {
        self.raise_count
    }

    /// Seat of the most recent bet, raise or all-in in the hand.
    pub fn last_aggressor(&self) -> Option<Seat> {
        self.history
            .iter()
            .rev()
            .find(|entry| entry.kind.is_aggressive())
            .map(|entry| entry.seat)
    }

    /// Offset of `seat` from the button, counted over active players in
    /// seating order. Zero is the button itself.
    pub fn seat_to_button(&self, seat: Seat) -> Option<usize> {
        let active = self.active.len();
        if active == 0 {
            return None;
        }
        let seat_index = self.index_of_seat(seat)?;
        let button_index = self.index_of_seat(self.button)?;
        let rank = |index: usize| self.active.iter().take_while(|&i| i < index).count();
        let offset = rank(seat_index) as isize - rank(button_index) as isize;
        Some(offset.rem_euclid(active as isize) as usize)
    }

    /// What the hero still owes against the street's highest bet.
    pub fn hero_shortfall(&self) -> Chips {
        let hero_bet = self.hero().map_or(0, |p| p.bet);
        self.street_max_bet.saturating_sub(hero_bet).max(0)
    }

    pub(crate) fn refresh_active(&mut self) {
        self.active = ActiveSeats::from_players(&self.players);
    }

    pub(crate) fn sync_betting(&mut self) {
        self.betting.pot = self.pot;
        self.betting.to_call = self.to_call;
        self.betting.street = self.street;
    }
}
