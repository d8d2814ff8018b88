use std::fmt;

/// Chip quantities. Signed so that reconciliation arithmetic can dip below
/// zero without wrapping.
pub type Chips = i64;

/// Position of a seat at the table as numbered by the server.
pub type Seat = usize;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Suit {
    Club,
    Diamond,
    Heart,
    Spade,
}

impl Suit {
    const ALL: [Suit; 4] = [Suit::Club, Suit::Diamond, Suit::Heart, Suit::Spade];

    /// Offset of this suit's block in the compact card index.
    pub fn block(self) -> u8 {
        match self {
            Self::Club => 0,
            Self::Diamond => 13,
            Self::Heart => 26,
            Self::Spade => 39,
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            'c' => Some(Self::Club),
            'd' => Some(Self::Diamond),
            'h' => Some(Self::Heart),
            's' => Some(Self::Spade),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Self::Club => 'c',
            Self::Diamond => 'd',
            Self::Heart => 'h',
            Self::Spade => 's',
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Diamond => "♦",
            Self::Heart => "♥",
            Self::Spade => "♠",
        };
        write!(f, "{repr}")
    }
}

const RANKS: &[u8; 13] = b"23456789TJQKA";

/// A card stored as a compact index in `0..52`.
///
/// The index is `rank + suit.block()` where ranks run `2..A` as `0..12`.
/// On the wire a card is a two-character token such as `"Ah"` or `"Tc"`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Card(u8);

impl Card {
    pub fn new(index: u8) -> Option<Self> {
        (index < 52).then_some(Self(index))
    }

    pub fn from_parts(rank: u8, suit: Suit) -> Option<Self> {
        (rank < 13).then(|| Self(rank + suit.block()))
    }

    /// Parse a two-character rank/suit token. Anything other than an
    /// uppercase rank from `23456789TJQKA` followed by a lowercase suit
    /// from `cdhs` is rejected.
    pub fn from_token(token: &str) -> Option<Self> {
        let mut chars = token.chars();
        let (rank, suit) = match (chars.next(), chars.next(), chars.next()) {
            (Some(rank), Some(suit), None) => (rank, suit),
            _ => return None,
        };
        let rank = RANKS.iter().position(|&r| char::from(r) == rank)? as u8;
        let suit = Suit::from_char(suit)?;
        Self::from_parts(rank, suit)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Rank in `0..13`, deuce first.
    pub fn rank(self) -> u8 {
        self.0 % 13
    }

    pub fn suit(self) -> Suit {
        Suit::ALL[usize::from(self.0 / 13)]
    }

    pub fn token(self) -> String {
        let mut token = String::with_capacity(2);
        token.push(char::from(RANKS[usize::from(self.rank())]));
        token.push(self.suit().as_char());
        token
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Actions an agent can send under protocol v2.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ActionKind {
    Fold,
    Call,
    Raise,
    AllIn,
}

impl ActionKind {
    /// Map a wire action name to an agent action. Legacy `check` and `bet`
    /// fold into `Call` and `Raise`.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "fold" => Some(Self::Fold),
            "call" | "check" => Some(Self::Call),
            "raise" | "bet" => Some(Self::Raise),
            "allin" | "all_in" | "all-in" => Some(Self::AllIn),
            _ => None,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Fold => "fold",
            Self::Call => "call",
            Self::Raise => "raise",
            Self::AllIn => "allin",
        }
    }

    pub fn requires_amount(self) -> bool {
        matches!(self, Self::Raise)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Fold => "folds",
            Self::Call => "calls",
            Self::Raise => "raises",
            Self::AllIn => "all-ins",
        };
        write!(f, "{repr}")
    }
}

/// Classification of an action reported by the server for any seat.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PlayerActionKind {
    Fold,
    TimeoutFold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
    PostSmallBlind,
    PostBigBlind,
    Unknown,
}

impl PlayerActionKind {
    pub fn classify(name: &str) -> Self {
        match name {
            "fold" => Self::Fold,
            "timeout_fold" | "timeout" => Self::TimeoutFold,
            "check" => Self::Check,
            "call" => Self::Call,
            "bet" => Self::Bet,
            "raise" => Self::Raise,
            "allin" | "all_in" | "all-in" => Self::AllIn,
            "post_small_blind" | "small_blind" => Self::PostSmallBlind,
            "post_big_blind" | "big_blind" => Self::PostBigBlind,
            _ => Self::Unknown,
        }
    }

    pub fn is_aggressive(self) -> bool {
        matches!(self, Self::Bet | Self::Raise | Self::AllIn)
    }

    pub fn is_fold(self) -> bool {
        matches!(self, Self::Fold | Self::TimeoutFold)
    }

    pub fn is_blind(self) -> bool {
        matches!(self, Self::PostSmallBlind | Self::PostBigBlind)
    }
}

impl fmt::Display for PlayerActionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Fold => "folds",
            Self::TimeoutFold => "times out",
            Self::Check => "checks",
            Self::Call => "calls",
            Self::Bet => "bets",
            Self::Raise => "raises",
            Self::AllIn => "all-ins",
            Self::PostSmallBlind => "posts the small blind",
            Self::PostBigBlind => "posts the big blind",
            Self::Unknown => "does something unknown",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Street {
    #[default]
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Street {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "preflop" => Some(Self::Preflop),
            "flop" => Some(Self::Flop),
            "turn" => Some(Self::Turn),
            "river" => Some(Self::River),
            "showdown" => Some(Self::Showdown),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A seat as tracked across a hand.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Player {
    pub seat: Seat,
    pub name: String,
    pub chips: Chips,
    /// Chips committed on the current street.
    pub bet: Chips,
    pub folded: bool,
    pub all_in: bool,
}

impl Player {
    pub fn new(seat: Seat, name: String, chips: Chips) -> Self {
        Self {
            seat,
            name,
            chips,
            bet: 0,
            folded: false,
            all_in: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.folded
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = if self.name.is_empty() {
            "<unnamed>"
        } else {
            &self.name
        };
        write!(f, "seat {} {name} (${})", self.seat, self.chips)
    }
}

/// One recorded betting action.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HistoryEntry {
    pub seat: Seat,
    pub street: Street,
    pub kind: PlayerActionKind,
    /// Chips the action moved into the pot.
    pub amount: Chips,
    /// The player's street total after the action.
    pub total_bet: Chips,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}] seat {} {} ${} (street total ${})",
            self.street, self.seat, self.kind, self.amount, self.total_bet
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_index_layout() {
        assert_eq!(Card::from_token("2c").map(Card::index), Some(0));
        assert_eq!(Card::from_token("Ac").map(Card::index), Some(12));
        assert_eq!(Card::from_token("2d").map(Card::index), Some(13));
        assert_eq!(Card::from_token("Ah").map(Card::index), Some(38));
        assert_eq!(Card::from_token("Ts").map(Card::index), Some(47));
        assert_eq!(Card::from_token("As").map(Card::index), Some(51));
    }

    #[test]
    fn card_rejects_malformed_tokens() {
        for token in ["", "A", "Ahh", "1h", "ah", "AH", "Ax", "10h"] {
            assert!(Card::from_token(token).is_none(), "accepted {token:?}");
        }
    }

    #[test]
    fn card_token_survives_every_index() {
        for i in 0..52 {
            let card = Card::new(i).unwrap();
            assert_eq!(Card::from_token(&card.token()), Some(card));
        }
        assert!(Card::new(52).is_none());
    }

    #[test]
    fn card_rank_and_suit() {
        let card = Card::from_token("Kd").unwrap();
        assert_eq!(card.rank(), 11);
        assert_eq!(card.suit(), Suit::Diamond);
        assert_eq!(card.to_string(), "Kd");
    }

    #[test]
    fn action_kind_normalizes_legacy_names() {
        assert_eq!(ActionKind::from_wire("check"), Some(ActionKind::Call));
        assert_eq!(ActionKind::from_wire("bet"), Some(ActionKind::Raise));
        assert_eq!(ActionKind::from_wire("all_in"), Some(ActionKind::AllIn));
        assert_eq!(ActionKind::from_wire("muck"), None);
    }

    #[test]
    fn player_action_classification() {
        assert_eq!(PlayerActionKind::classify("timeout_fold"), PlayerActionKind::TimeoutFold);
        assert_eq!(
            PlayerActionKind::classify("post_big_blind"),
            PlayerActionKind::PostBigBlind
        );
        assert_eq!(PlayerActionKind::classify("dance"), PlayerActionKind::Unknown);
        assert!(PlayerActionKind::AllIn.is_aggressive());
        assert!(!PlayerActionKind::Call.is_aggressive());
        assert!(PlayerActionKind::TimeoutFold.is_fold());
    }

    #[test]
    fn street_labels() {
        assert_eq!(Street::from_label("turn"), Some(Street::Turn));
        assert_eq!(Street::from_label("Turn"), None);
        assert_eq!(Street::River.to_string(), "river");
    }
}
