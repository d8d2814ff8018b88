use std::fmt;

use super::{
    super::game::entities::{ActionKind, Card, Chips, Seat},
    protocol_version::ProtocolVersion,
};

/// A legal move offered by the server for the pending decision.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActionDescriptor {
    pub kind: ActionKind,
    /// Lowest legal street total for sized actions, when known.
    pub min_amount: Option<Chips>,
    pub max_amount: Option<Chips>,
}

impl ActionDescriptor {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            min_amount: None,
            max_amount: None,
        }
    }
}

impl fmt::Display for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind.as_wire())?;
        match (self.min_amount, self.max_amount) {
            (Some(min), Some(max)) => write!(f, " (${min}..=${max})"),
            (Some(min), None) => write!(f, " (>= ${min})"),
            (None, Some(max)) => write!(f, " (<= ${max})"),
            (None, None) => Ok(()),
        }
    }
}

/// Static seating snapshot sent with the start of a hand.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SeatInfo {
    pub seat: Seat,
    pub name: String,
    pub chips: Chips,
}

/// One player's entry in a full game update. Matched to tracked players
/// by name since seat numbering isn't stable across updates.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerSnapshot {
    pub name: String,
    pub chips: Chips,
    pub bet: Chips,
    pub folded: bool,
    pub all_in: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HandStart {
    pub hand_id: String,
    pub hero_seat: Seat,
    pub button: Seat,
    pub hole_cards: Vec<Card>,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub seats: Vec<SeatInfo>,
    /// Protocol generation the frame was written in.
    pub version: ProtocolVersion,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActionRequest {
    pub hand_id: Option<String>,
    pub pot: Chips,
    pub to_call: Chips,
    pub legal_actions: Vec<ActionDescriptor>,
    pub street: Option<String>,
    pub time_remaining_ms: Option<u64>,
    pub version: ProtocolVersion,
}

impl ActionRequest {
    pub fn descriptor(&self, kind: ActionKind) -> Option<&ActionDescriptor> {
        self.legal_actions.iter().find(|d| d.kind == kind)
    }

    pub fn allows(&self, kind: ActionKind) -> bool {
        self.descriptor(kind).is_some()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameUpdate {
    pub pot: Chips,
    pub players: Vec<PlayerSnapshot>,
    pub board: Option<Vec<Card>>,
    pub street: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerAction {
    pub seat: Seat,
    pub name: Option<String>,
    /// Raw action name, classified by the tracker.
    pub action: String,
    pub amount_paid: Option<Chips>,
    pub player_bet: Option<Chips>,
    pub player_chips: Option<Chips>,
    pub pot: Option<Chips>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreetChange {
    /// Raw street label, parsed by the tracker.
    pub street: String,
    pub board: Vec<Card>,
    pub pot: Option<Chips>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Winner {
    pub seat: Seat,
    pub name: Option<String>,
    pub amount: Chips,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ShowdownHand {
    pub seat: Seat,
    pub hole_cards: Vec<Card>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HandResult {
    pub board: Option<Vec<Card>>,
    pub pot: Option<Chips>,
    pub winners: Vec<Winner>,
    pub showdown: Vec<ShowdownHand>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameCompleted {
    pub hands_completed: Option<u64>,
    pub reason: Option<String>,
    /// Statistics payload, carried through in its wire shape.
    pub stats: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ErrorMessage {
    pub message: String,
    pub code: Option<String>,
}

/// A decoded server frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    HandStart(HandStart),
    ActionRequest(ActionRequest),
    GameUpdate(GameUpdate),
    PlayerAction(PlayerAction),
    StreetChange(StreetChange),
    HandResult(HandResult),
    GameCompleted(GameCompleted),
    Error(ErrorMessage),
    /// A frame with a type this client doesn't act on.
    NoOp,
}

impl Message {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::HandStart(_) => "hand_start",
            Self::ActionRequest(_) => "action_request",
            Self::GameUpdate(_) => "game_update",
            Self::PlayerAction(_) => "player_action",
            Self::StreetChange(_) => "street_change",
            Self::HandResult(_) => "hand_result",
            Self::GameCompleted(_) => "game_completed",
            Self::Error(_) => "error",
            Self::NoOp => "noop",
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::HandStart(msg) => write!(
                f,
                "hand {} started (seat {}, button {}, blinds ${}/{})",
                msg.hand_id, msg.hero_seat, msg.button, msg.small_blind, msg.big_blind
            ),
            Self::ActionRequest(msg) => write!(
                f,
                "action requested (pot ${}, to call ${}, {} options)",
                msg.pot,
                msg.to_call,
                msg.legal_actions.len()
            ),
            Self::GameUpdate(msg) => write!(
                f,
                "game update (pot ${}, {} players)",
                msg.pot,
                msg.players.len()
            ),
            Self::PlayerAction(msg) => write!(f, "seat {} {}", msg.seat, msg.action),
            Self::StreetChange(msg) => write!(f, "street changed to {}", msg.street),
            Self::HandResult(msg) => write!(f, "hand finished ({} winners)", msg.winners.len()),
            Self::GameCompleted(_) => write!(f, "game completed"),
            Self::Error(msg) => write!(f, "server error: {}", msg.message),
            Self::NoOp => write!(f, "no-op"),
        }
    }
}

/// A decision ready to be sent to the server.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OutgoingAction {
    pub kind: ActionKind,
    /// Street total to raise to. Ignored for every other kind.
    pub amount: Option<Chips>,
}

impl OutgoingAction {
    pub fn fold() -> Self {
        Self {
            kind: ActionKind::Fold,
            amount: None,
        }
    }

    pub fn call() -> Self {
        Self {
            kind: ActionKind::Call,
            amount: None,
        }
    }

    pub fn raise_to(amount: Chips) -> Self {
        Self {
            kind: ActionKind::Raise,
            amount: Some(amount),
        }
    }

    pub fn all_in() -> Self {
        Self {
            kind: ActionKind::AllIn,
            amount: None,
        }
    }
}

impl fmt::Display for OutgoingAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.kind, self.amount) {
            (ActionKind::Raise, Some(amount)) => write!(f, "raises to ${amount}"),
            (kind, _) => write!(f, "{kind}"),
        }
    }
}

/// The first payload sent after the socket opens.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConnectRequest {
    pub name: String,
    pub game: Option<String>,
    pub auth_token: Option<String>,
}
