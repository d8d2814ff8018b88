//! Decoding of server frames and encoding of client payloads.
//!
//! Frames are MessagePack maps tagged by a `type` string. Both protocol
//! generations are accepted on the way in; only v2 is written on the way out.

use std::fmt::Debug;

use log::debug;
use rmp::encode;

use super::{
    super::game::entities::{ActionKind, Card, Chips},
    errors::{CodecError, Result},
    messages::{
        ActionDescriptor, ActionRequest, ConnectRequest, ErrorMessage, GameCompleted, GameUpdate,
        HandResult, HandStart, Message, OutgoingAction, PlayerAction, PlayerSnapshot, SeatInfo,
        ShowdownHand, StreetChange, Winner,
    },
    protocol_version::ProtocolVersion,
    reader::Reader,
};

/// Maximum accepted frame size. [`WsTransport`](super::transport::WsTransport)
/// enforces the same limit on inbound messages.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Decode one binary frame into a message.
///
/// # Errors
///
/// - [`CodecError::MalformedFrame`] if the frame isn't a map, is truncated,
///   or carries no `type` field.
/// - [`CodecError::MissingField`] if the detected type lacks a required field.
/// - [`CodecError::InvalidCardToken`] if a card isn't a two-character token.
pub fn decode(frame: &[u8]) -> Result<Message> {
    if frame.len() > MAX_FRAME_SIZE {
        return Err(CodecError::malformed(format!(
            "frame size {} exceeds maximum {MAX_FRAME_SIZE}",
            frame.len()
        )));
    }
    let message_type = read_type(frame)?;
    let message = match message_type {
        "hand_start" | "game_start" => Message::HandStart(decode_hand_start(frame, message_type)?),
        "action_request" => Message::ActionRequest(decode_action_request(frame)?),
        "game_update" => Message::GameUpdate(decode_game_update(frame)?),
        "player_action" => Message::PlayerAction(decode_player_action(frame)?),
        "street_change" => Message::StreetChange(decode_street_change(frame)?),
        "hand_result" => Message::HandResult(decode_hand_result(frame)?),
        "game_completed" => Message::GameCompleted(decode_game_completed(frame)?),
        "error" => Message::Error(decode_error(frame)?),
        "hand_complete" => Message::NoOp,
        other => {
            debug!("ignoring frame of unknown type {other:?}");
            Message::NoOp
        }
    };
    Ok(message)
}

/// Scan the top-level pairs for the `type` tag, skipping every other value.
pub fn read_type(frame: &[u8]) -> Result<&str> {
    let mut message_type = None;
    each_field(frame, |key, r| {
        if key == "type" && message_type.is_none() {
            message_type = Some(r.str()?);
        } else {
            r.skip()?;
        }
        Ok(())
    })?;
    message_type.ok_or_else(|| CodecError::malformed("frame has no type field"))
}

/// Render a frame as JSON for diagnostics.
pub fn frame_to_json(frame: &[u8]) -> Result<serde_json::Value> {
    Reader::new(frame).json()
}

/// Walk the top-level map, handing each string key and a reader positioned
/// at its value to `visit`. The visitor must consume the value exactly once.
/// Pairs whose key isn't a string are skipped.
fn each_field<'a>(
    frame: &'a [u8],
    mut visit: impl FnMut(&'a str, &mut Reader<'a>) -> Result<()>,
) -> Result<()> {
    let mut reader = Reader::new(frame);
    let len = reader
        .map_len()
        .map_err(|e| CodecError::malformed(format!("top-level value: {}", detail(&e))))?;
    for _ in 0..len {
        if !reader.is_str()? {
            reader.skip()?;
            reader.skip()?;
            continue;
        }
        let key = reader.str()?;
        visit(key, &mut reader).map_err(|e| in_field(e, key))?;
    }
    Ok(())
}

/// Walk a nested map the same way [`each_field`] walks the frame.
fn each_entry<'a>(
    r: &mut Reader<'a>,
    mut visit: impl FnMut(&'a str, &mut Reader<'a>) -> Result<()>,
) -> Result<()> {
    let len = r.map_len()?;
    for _ in 0..len {
        if !r.is_str()? {
            r.skip()?;
            r.skip()?;
            continue;
        }
        let key = r.str()?;
        visit(key, r).map_err(|e| in_field(e, key))?;
    }
    Ok(())
}

fn each_item<'a>(r: &mut Reader<'a>, mut visit: impl FnMut(usize, &mut Reader<'a>) -> Result<()>) -> Result<()> {
    let len = r.array_len()?;
    for i in 0..len {
        visit(i, r)?;
    }
    Ok(())
}

fn detail(err: &CodecError) -> String {
    match err {
        CodecError::MalformedFrame(detail) => detail.clone(),
        other => other.to_string(),
    }
}

fn in_field(err: CodecError, key: &str) -> CodecError {
    match err {
        CodecError::MalformedFrame(detail) => CodecError::malformed(format!("field '{key}': {detail}")),
        other => other,
    }
}

fn require<T>(value: Option<T>, message_type: &'static str, field: &'static str) -> Result<T> {
    value.ok_or(CodecError::MissingField { message_type, field })
}

fn card(r: &mut Reader<'_>) -> Result<Card> {
    let token = r.str()?;
    Card::from_token(token).ok_or_else(|| CodecError::InvalidCardToken(token.to_string()))
}

fn cards(r: &mut Reader<'_>) -> Result<Vec<Card>> {
    let mut out = Vec::new();
    each_item(r, |_, r| {
        out.push(card(r)?);
        Ok(())
    })?;
    Ok(out)
}

fn chips(r: &mut Reader<'_>) -> Result<Chips> {
    r.int()
}

fn chip_list(r: &mut Reader<'_>) -> Result<Vec<Chips>> {
    let mut out = Vec::new();
    each_item(r, |_, r| {
        out.push(r.int()?);
        Ok(())
    })?;
    Ok(out)
}

fn seat_info(r: &mut Reader<'_>, i: usize) -> Result<SeatInfo> {
    let (mut seat, mut name, mut stack) = (None, None, None);
    each_entry(r, |key, r| {
        match key {
            "seat" => seat = r.optional(Reader::index)?,
            "name" => name = r.optional(Reader::string)?,
            "chips" | "stack" => stack = r.optional(chips)?,
            _ => r.skip()?,
        }
        Ok(())
    })?;
    Ok(SeatInfo {
        seat: seat.unwrap_or(i),
        name: name.unwrap_or_default(),
        chips: require(stack, "hand_start", "seats.chips")?,
    })
}

fn decode_hand_start(frame: &[u8], message_type: &str) -> Result<HandStart> {
    const TYPE: &str = "hand_start";

    let mut hand_id = None;
    let mut game_id = None;
    let mut your_seat = None;
    let mut player_index = None;
    let mut button = None;
    let mut hole_cards = None;
    let mut small_blind = None;
    let mut big_blind = None;
    let mut blinds = None;
    let mut seats = None;
    let mut stack_sizes = None;

    each_field(frame, |key, r| {
        match key {
            "hand_id" => hand_id = r.optional(Reader::id)?,
            "game_id" => game_id = r.optional(Reader::id)?,
            "your_seat" => your_seat = r.optional(Reader::index)?,
            "player_index" => player_index = r.optional(Reader::index)?,
            "button" => button = r.optional(Reader::index)?,
            "hole_cards" | "cards" => hole_cards = r.optional(cards)?,
            "small_blind" => small_blind = r.optional(chips)?,
            "big_blind" => big_blind = r.optional(chips)?,
            "blinds" => blinds = r.optional(chip_list)?,
            "seats" | "players" => {
                seats = r.optional(|r| {
                    let mut out = Vec::new();
                    each_item(r, |i, r| {
                        out.push(seat_info(r, i)?);
                        Ok(())
                    })?;
                    Ok(out)
                })?
            }
            "stack_sizes" => stack_sizes = r.optional(chip_list)?,
            _ => r.skip()?,
        }
        Ok(())
    })?;

    let legacy = message_type == "game_start" || (hand_id.is_none() && game_id.is_some());
    let version = if legacy {
        ProtocolVersion::V1
    } else {
        ProtocolVersion::V2
    };

    let (legacy_small, legacy_big) = match blinds.as_deref() {
        Some([small, big, ..]) => (Some(*small), Some(*big)),
        _ => (None, None),
    };

    let seats = match (seats, stack_sizes) {
        (Some(seats), _) => seats,
        (None, Some(stacks)) => stacks
            .into_iter()
            .enumerate()
            .map(|(seat, chips)| SeatInfo {
                seat,
                name: String::new(),
                chips,
            })
            .collect(),
        (None, None) => return Err(CodecError::MissingField { message_type: TYPE, field: "seats" }),
    };

    Ok(HandStart {
        hand_id: require(hand_id.or(game_id), TYPE, "hand_id")?,
        hero_seat: require(your_seat.or(player_index), TYPE, "your_seat")?,
        button: require(button, TYPE, "button")?,
        hole_cards: hole_cards.unwrap_or_default(),
        small_blind: require(small_blind.or(legacy_small), TYPE, "small_blind")?,
        big_blind: require(big_blind.or(legacy_big), TYPE, "big_blind")?,
        seats,
        version,
    })
}

/// Add a descriptor, merging into an earlier one of the same kind. Order
/// is kept by first appearance and the first amount present wins.
fn push_descriptor(out: &mut Vec<ActionDescriptor>, descriptor: ActionDescriptor) {
    match out.iter_mut().find(|d| d.kind == descriptor.kind) {
        Some(existing) => {
            existing.min_amount = existing.min_amount.or(descriptor.min_amount);
            existing.max_amount = existing.max_amount.or(descriptor.max_amount);
        }
        None => out.push(descriptor),
    }
}

fn explicit_descriptors(r: &mut Reader<'_>) -> Result<Vec<ActionDescriptor>> {
    let mut out = Vec::new();
    each_item(r, |_, r| {
        // Tolerate a bare name in place of a descriptor map.
        if r.is_str()? {
            let name = r.str()?;
            match ActionKind::from_wire(name) {
                Some(kind) => push_descriptor(&mut out, ActionDescriptor::new(kind)),
                None => debug!("skipping unknown action {name:?}"),
            }
            return Ok(());
        }
        let (mut name, mut min_amount, mut max_amount) = (None, None, None);
        each_entry(r, |key, r| {
            match key {
                "action_type" | "action" | "type" => name = r.optional(Reader::str)?,
                "min_amount" | "min" => min_amount = r.optional(chips)?,
                "max_amount" | "max" => max_amount = r.optional(chips)?,
                _ => r.skip()?,
            }
            Ok(())
        })?;
        let name = require(name, "action_request", "legal_actions.action_type")?;
        match ActionKind::from_wire(name) {
            Some(kind) => push_descriptor(
                &mut out,
                ActionDescriptor {
                    kind,
                    min_amount,
                    max_amount,
                },
            ),
            None => debug!("skipping unknown action {name:?}"),
        }
        Ok(())
    })?;
    Ok(out)
}

/// Build descriptors from a v1 bare name list.
///
/// `bet` is floored at `min_bet`; `raise` at `min_bet`, else at
/// `to_call + min_raise`, else left open. Nothing else carries a floor.
fn synthesize_descriptors(
    names: &[&str],
    to_call: Chips,
    min_bet: Option<Chips>,
    min_raise: Option<Chips>,
) -> Vec<ActionDescriptor> {
    let mut out = Vec::new();
    for &name in names {
        let Some(kind) = ActionKind::from_wire(name) else {
            debug!("skipping unknown legacy action {name:?}");
            continue;
        };
        let min_amount = match name {
            "bet" => min_bet,
            "raise" => min_bet.or_else(|| min_raise.map(|r| to_call.saturating_add(r))),
            _ => None,
        };
        push_descriptor(
            &mut out,
            ActionDescriptor {
                kind,
                min_amount,
                max_amount: None,
            },
        );
    }
    out
}

fn decode_action_request(frame: &[u8]) -> Result<ActionRequest> {
    const TYPE: &str = "action_request";

    let mut hand_id = None;
    let mut pot = None;
    let mut to_call = None;
    let mut legal_actions = None;
    let mut valid_actions: Option<Vec<&str>> = None;
    let mut min_bet = None;
    let mut min_raise = None;
    let mut street = None;
    let mut time_remaining_ms = None;

    each_field(frame, |key, r| {
        match key {
            "hand_id" | "game_id" => hand_id = r.optional(Reader::id)?,
            "pot" => pot = r.optional(chips)?,
            "to_call" => to_call = r.optional(chips)?,
            "legal_actions" => legal_actions = r.optional(explicit_descriptors)?,
            "valid_actions" => {
                valid_actions = r.optional(|r| {
                    let mut names = Vec::new();
                    each_item(r, |_, r| {
                        names.push(r.str()?);
                        Ok(())
                    })?;
                    Ok(names)
                })?
            }
            "min_bet" => min_bet = r.optional(chips)?,
            "min_raise" => min_raise = r.optional(chips)?,
            "street" => street = r.optional(Reader::string)?,
            "time_remaining_ms" => time_remaining_ms = r.optional(Reader::uint)?,
            _ => r.skip()?,
        }
        Ok(())
    })?;

    let to_call = require(to_call, TYPE, "to_call")?;
    let (legal_actions, version) = match (legal_actions, valid_actions) {
        (Some(descriptors), _) => (descriptors, ProtocolVersion::V2),
        (None, Some(names)) => (
            synthesize_descriptors(&names, to_call, min_bet, min_raise),
            ProtocolVersion::V1,
        ),
        (None, None) => {
            return Err(CodecError::MissingField {
                message_type: TYPE,
                field: "legal_actions",
            });
        }
    };

    Ok(ActionRequest {
        hand_id,
        pot: require(pot, TYPE, "pot")?,
        to_call,
        legal_actions,
        street,
        time_remaining_ms,
        version,
    })
}

fn player_snapshot(r: &mut Reader<'_>) -> Result<PlayerSnapshot> {
    const TYPE: &str = "game_update";

    let (mut name, mut stack, mut bet, mut folded, mut all_in) = (None, None, None, None, None);
    each_entry(r, |key, r| {
        match key {
            "name" => name = r.optional(Reader::string)?,
            "chips" | "stack" => stack = r.optional(chips)?,
            "bet" => bet = r.optional(chips)?,
            "folded" => folded = r.optional(Reader::bool)?,
            "all_in" | "allin" => all_in = r.optional(Reader::bool)?,
            _ => r.skip()?,
        }
        Ok(())
    })?;
    Ok(PlayerSnapshot {
        name: require(name, TYPE, "players.name")?,
        chips: require(stack, TYPE, "players.chips")?,
        bet: bet.unwrap_or(0),
        folded: folded.unwrap_or(false),
        all_in: all_in.unwrap_or(false),
    })
}

fn decode_game_update(frame: &[u8]) -> Result<GameUpdate> {
    const TYPE: &str = "game_update";

    let (mut pot, mut players, mut board, mut street) = (None, None, None, None);
    each_field(frame, |key, r| {
        match key {
            "pot" => pot = r.optional(chips)?,
            "players" => {
                players = r.optional(|r| {
                    let mut out = Vec::new();
                    each_item(r, |_, r| {
                        out.push(player_snapshot(r)?);
                        Ok(())
                    })?;
                    Ok(out)
                })?
            }
            "board" => board = r.optional(cards)?,
            "street" => street = r.optional(Reader::string)?,
            _ => r.skip()?,
        }
        Ok(())
    })?;

    Ok(GameUpdate {
        pot: require(pot, TYPE, "pot")?,
        players: require(players, TYPE, "players")?,
        board,
        street,
    })
}

fn decode_player_action(frame: &[u8]) -> Result<PlayerAction> {
    const TYPE: &str = "player_action";

    let mut seat = None;
    let mut name = None;
    let mut action = None;
    let mut amount_paid = None;
    let mut player_bet = None;
    let mut player_chips = None;
    let mut pot = None;

    each_field(frame, |key, r| {
        match key {
            "seat" => seat = r.optional(Reader::index)?,
            "name" => name = r.optional(Reader::string)?,
            "action" => action = r.optional(Reader::string)?,
            "amount_paid" | "amount" => amount_paid = r.optional(chips)?,
            "player_bet" => player_bet = r.optional(chips)?,
            "player_chips" | "chips" => player_chips = r.optional(chips)?,
            "pot" => pot = r.optional(chips)?,
            _ => r.skip()?,
        }
        Ok(())
    })?;

    Ok(PlayerAction {
        seat: require(seat, TYPE, "seat")?,
        name,
        action: require(action, TYPE, "action")?,
        amount_paid,
        player_bet,
        player_chips,
        pot,
    })
}

fn decode_street_change(frame: &[u8]) -> Result<StreetChange> {
    const TYPE: &str = "street_change";

    let (mut street, mut board, mut pot) = (None, None, None);
    each_field(frame, |key, r| {
        match key {
            "street" => street = r.optional(Reader::string)?,
            "board" => board = r.optional(cards)?,
            "pot" => pot = r.optional(chips)?,
            _ => r.skip()?,
        }
        Ok(())
    })?;

    Ok(StreetChange {
        street: require(street, TYPE, "street")?,
        board: require(board, TYPE, "board")?,
        pot,
    })
}

fn winner(r: &mut Reader<'_>) -> Result<Winner> {
    let (mut seat, mut name, mut amount) = (None, None, None);
    each_entry(r, |key, r| {
        match key {
            "seat" => seat = r.optional(Reader::index)?,
            "name" => name = r.optional(Reader::string)?,
            "amount" | "won" => amount = r.optional(chips)?,
            _ => r.skip()?,
        }
        Ok(())
    })?;
    Ok(Winner {
        seat: require(seat, "hand_result", "winners.seat")?,
        name,
        amount: amount.unwrap_or(0),
    })
}

fn showdown_hand(r: &mut Reader<'_>) -> Result<ShowdownHand> {
    let (mut seat, mut hole_cards) = (None, None);
    each_entry(r, |key, r| {
        match key {
            "seat" => seat = r.optional(Reader::index)?,
            "hole_cards" | "cards" => hole_cards = r.optional(cards)?,
            _ => r.skip()?,
        }
        Ok(())
    })?;
    Ok(ShowdownHand {
        seat: require(seat, "hand_result", "showdown.seat")?,
        hole_cards: hole_cards.unwrap_or_default(),
    })
}

fn decode_hand_result(frame: &[u8]) -> Result<HandResult> {
    let (mut board, mut pot, mut winners, mut showdown) = (None, None, Vec::new(), Vec::new());
    each_field(frame, |key, r| {
        match key {
            "board" => board = r.optional(cards)?,
            "pot" => pot = r.optional(chips)?,
            "winners" => {
                if !r.nil()? {
                    each_item(r, |_, r| {
                        winners.push(winner(r)?);
                        Ok(())
                    })?;
                }
            }
            "showdown" => {
                if !r.nil()? {
                    each_item(r, |_, r| {
                        showdown.push(showdown_hand(r)?);
                        Ok(())
                    })?;
                }
            }
            _ => r.skip()?,
        }
        Ok(())
    })?;

    Ok(HandResult {
        board,
        pot,
        winners,
        showdown,
    })
}

fn decode_game_completed(frame: &[u8]) -> Result<GameCompleted> {
    let (mut hands_completed, mut reason, mut stats) = (None, None, None);
    each_field(frame, |key, r| {
        match key {
            "hands_completed" | "hands_played" => hands_completed = r.optional(Reader::uint)?,
            "reason" => reason = r.optional(Reader::string)?,
            "stats" => stats = r.optional(Reader::json)?,
            _ => r.skip()?,
        }
        Ok(())
    })?;

    Ok(GameCompleted {
        hands_completed,
        reason,
        stats,
    })
}

fn decode_error(frame: &[u8]) -> Result<ErrorMessage> {
    let (mut message, mut code) = (None, None);
    each_field(frame, |key, r| {
        match key {
            "message" | "error" => message = r.optional(Reader::string)?,
            "code" => code = r.optional(Reader::id)?,
            _ => r.skip()?,
        }
        Ok(())
    })?;

    Ok(ErrorMessage {
        message: require(message, "error", "message")?,
        code,
    })
}

fn encode_err(err: impl Debug) -> CodecError {
    CodecError::Encode(format!("{err:?}"))
}

fn write_pair(buf: &mut Vec<u8>, key: &str, value: &str) -> Result<()> {
    encode::write_str(buf, key).map_err(encode_err)?;
    encode::write_str(buf, value).map_err(encode_err)
}

/// Check an outgoing action before anything is put on the wire.
pub fn validate_action(action: &OutgoingAction) -> Result<u64> {
    let invalid = || CodecError::InvalidActionAmount {
        action: action.kind.as_wire(),
        amount: action.amount,
    };
    match (action.kind.requires_amount(), action.amount) {
        (true, None | Some(0)) => Err(invalid()),
        (_, Some(amount)) if amount < 0 => Err(invalid()),
        (true, Some(amount)) => Ok(amount as u64),
        (false, _) => Ok(0),
    }
}

/// Encode a decision as `{type, action, amount, protocol_version}`.
///
/// # Errors
///
/// Returns [`CodecError::InvalidActionAmount`] for a raise without a
/// positive amount, or for any negative amount.
pub fn encode_action(action: &OutgoingAction) -> Result<Vec<u8>> {
    let amount = validate_action(action)?;
    let mut buf = Vec::with_capacity(64);
    encode::write_map_len(&mut buf, 4).map_err(encode_err)?;
    write_pair(&mut buf, "type", "action")?;
    write_pair(&mut buf, "action", action.kind.as_wire())?;
    encode::write_str(&mut buf, "amount").map_err(encode_err)?;
    encode::write_uint(&mut buf, amount).map_err(encode_err)?;
    write_pair(&mut buf, "protocol_version", ProtocolVersion::current().wire_marker())?;
    Ok(buf)
}

/// Encode the handshake sent as the first message of a session. Optional
/// fields are left out when absent.
pub fn encode_connect(request: &ConnectRequest) -> Result<Vec<u8>> {
    let optional = [
        ("game", request.game.as_deref()),
        ("auth_token", request.auth_token.as_deref()),
    ];
    let len = 3 + optional.iter().filter(|(_, v)| v.is_some()).count();

    let mut buf = Vec::with_capacity(128);
    encode::write_map_len(&mut buf, len as u32).map_err(encode_err)?;
    write_pair(&mut buf, "type", "connect")?;
    write_pair(&mut buf, "name", &request.name)?;
    for (key, value) in optional {
        if let Some(value) = value {
            write_pair(&mut buf, key, value)?;
        }
    }
    write_pair(&mut buf, "protocol_version", ProtocolVersion::current().wire_marker())?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn frame(value: serde_json::Value) -> Vec<u8> {
        rmp_serde::to_vec_named(&value).unwrap()
    }

    fn hand_start_v2() -> serde_json::Value {
        json!({
            "type": "hand_start",
            "hand_id": "h-1",
            "your_seat": 0,
            "button": 1,
            "hole_cards": ["Ah", "Kd"],
            "small_blind": 50,
            "big_blind": 100,
            "seats": [
                {"seat": 0, "name": "hero", "chips": 10_000},
                {"seat": 1, "name": "villain", "chips": 10_000},
            ],
        })
    }

    #[test]
    fn decodes_v2_hand_start() {
        let Message::HandStart(hs) = decode(&frame(hand_start_v2())).unwrap() else {
            panic!("expected hand start");
        };
        assert_eq!(hs.hand_id, "h-1");
        assert_eq!(hs.hero_seat, 0);
        assert_eq!(hs.button, 1);
        assert_eq!(hs.hole_cards, vec![Card::from_token("Ah").unwrap(), Card::from_token("Kd").unwrap()]);
        assert_eq!(hs.big_blind, 100);
        assert_eq!(hs.seats[1].name, "villain");
        assert_eq!(hs.version, ProtocolVersion::V2);
    }

    #[test]
    fn decodes_legacy_game_start_from_stack_sizes() {
        let bytes = frame(json!({
            "type": "game_start",
            "game_id": 77,
            "player_index": 2,
            "button": 0,
            "stack_sizes": [500, 400, 300],
            "blinds": [5, 10],
            "cards": ["2c", "2d"],
        }));
        let Message::HandStart(hs) = decode(&bytes).unwrap() else {
            panic!("expected hand start");
        };
        assert_eq!(hs.hand_id, "77");
        assert_eq!(hs.hero_seat, 2);
        assert_eq!(hs.small_blind, 5);
        assert_eq!(hs.big_blind, 10);
        assert_eq!(hs.seats.len(), 3);
        assert_eq!(hs.seats[2], SeatInfo { seat: 2, name: String::new(), chips: 300 });
        assert_eq!(hs.version, ProtocolVersion::V1);
    }

    #[test]
    fn legacy_game_start_without_blinds_is_missing_field() {
        let bytes = frame(json!({
            "type": "game_start",
            "game_id": "g",
            "player_index": 0,
            "button": 0,
            "stack_sizes": [100, 100],
        }));
        assert_eq!(
            decode(&bytes),
            Err(CodecError::MissingField {
                message_type: "hand_start",
                field: "small_blind"
            })
        );
    }

    #[test]
    fn hand_start_missing_button() {
        let mut value = hand_start_v2();
        value.as_object_mut().unwrap().remove("button");
        assert_eq!(
            decode(&frame(value)),
            Err(CodecError::MissingField {
                message_type: "hand_start",
                field: "button"
            })
        );
    }

    #[test]
    fn rejects_bad_card_tokens() {
        let mut value = hand_start_v2();
        value["hole_cards"] = json!(["Ah", "1x"]);
        assert_eq!(
            decode(&frame(value)),
            Err(CodecError::InvalidCardToken("1x".to_string()))
        );
    }

    #[test]
    fn frame_without_type_is_malformed() {
        let bytes = frame(json!({"pot": 10}));
        assert!(matches!(decode(&bytes), Err(CodecError::MalformedFrame(_))));
    }

    #[test]
    fn non_map_frame_is_malformed() {
        let bytes = frame(json!(["type", "hand_start"]));
        assert!(matches!(decode(&bytes), Err(CodecError::MalformedFrame(_))));
        assert!(matches!(decode(&[]), Err(CodecError::MalformedFrame(_))));
    }

    #[test]
    fn unknown_type_with_nested_fields_is_noop() {
        let bytes = frame(json!({
            "type": "reconnect_ack",
            "session": {"resume": [1, 2, {"x": [null, true, 1.5]}], "token": "abc"},
            "ts": 1_700_000_000_000u64,
        }));
        assert_eq!(decode(&bytes), Ok(Message::NoOp));
    }

    #[test]
    fn legacy_hand_complete_is_noop() {
        assert_eq!(decode(&frame(json!({"type": "hand_complete", "winner": 1}))), Ok(Message::NoOp));
    }

    #[test]
    fn type_tag_found_after_unknown_fields() {
        let bytes = frame(json!({
            "aaa": {"nested": [1, 2, 3]},
            "zzz": "trailing",
            "type": "error",
            "message": "boom",
        }));
        assert_eq!(read_type(&bytes).unwrap(), "error");
    }

    #[test]
    fn decodes_explicit_descriptors() {
        let bytes = frame(json!({
            "type": "action_request",
            "pot": 150,
            "to_call": 100,
            "legal_actions": [
                {"action_type": "fold"},
                {"action_type": "call", "min_amount": 100},
                {"action_type": "raise", "min_amount": 200, "max_amount": 10_000},
                {"action_type": "straddle"},
            ],
        }));
        let Message::ActionRequest(req) = decode(&bytes).unwrap() else {
            panic!("expected action request");
        };
        assert_eq!(req.legal_actions.len(), 3);
        assert_eq!(req.descriptor(ActionKind::Call).unwrap().min_amount, Some(100));
        let raise = req.descriptor(ActionKind::Raise).unwrap();
        assert_eq!((raise.min_amount, raise.max_amount), (Some(200), Some(10_000)));
        assert_eq!(req.version, ProtocolVersion::V2);
    }

    #[test]
    fn legacy_raise_floor_prefers_min_bet() {
        let bytes = frame(json!({
            "type": "action_request",
            "pot": 30,
            "to_call": 5,
            "valid_actions": ["fold", "call", "raise"],
            "min_bet": 20,
            "min_raise": 10,
        }));
        let Message::ActionRequest(req) = decode(&bytes).unwrap() else {
            panic!("expected action request");
        };
        assert_eq!(req.descriptor(ActionKind::Raise).unwrap().min_amount, Some(20));
        assert_eq!(req.descriptor(ActionKind::Fold).unwrap().min_amount, None);
        assert_eq!(req.version, ProtocolVersion::V1);
    }

    #[test]
    fn legacy_raise_floor_falls_back_to_min_raise() {
        let bytes = frame(json!({
            "type": "action_request",
            "pot": 30,
            "to_call": 5,
            "valid_actions": ["check", "bet", "raise", "allin"],
            "min_raise": 10,
        }));
        let Message::ActionRequest(req) = decode(&bytes).unwrap() else {
            panic!("expected action request");
        };
        let kinds: Vec<_> = req.legal_actions.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Call, ActionKind::Raise, ActionKind::AllIn]);
        // `bet` has no min_bet to use, so the later `raise` supplies the floor
        assert_eq!(req.descriptor(ActionKind::Raise).unwrap().min_amount, Some(15));

        let bytes = frame(json!({
            "type": "action_request",
            "pot": 30,
            "to_call": 5,
            "valid_actions": ["fold", "raise"],
            "min_raise": 10,
        }));
        let Message::ActionRequest(req) = decode(&bytes).unwrap() else {
            panic!("expected action request");
        };
        assert_eq!(req.descriptor(ActionKind::Raise).unwrap().min_amount, Some(15));
    }

    #[test]
    fn explicit_amounts_pass_through_for_every_kind() {
        let bytes = frame(json!({
            "type": "action_request",
            "pot": 300,
            "to_call": 100,
            "legal_actions": [
                {"action_type": "call", "min_amount": 100, "max_amount": 100},
                {"action_type": "allin", "min_amount": 9_800, "max_amount": 9_800},
            ],
        }));
        let Message::ActionRequest(req) = decode(&bytes).unwrap() else {
            panic!("expected action request");
        };
        assert_eq!(
            req.legal_actions,
            vec![
                ActionDescriptor { kind: ActionKind::Call, min_amount: Some(100), max_amount: Some(100) },
                ActionDescriptor { kind: ActionKind::AllIn, min_amount: Some(9_800), max_amount: Some(9_800) },
            ]
        );
    }

    #[test]
    fn duplicate_descriptors_keep_first_amounts() {
        let bytes = frame(json!({
            "type": "action_request",
            "pot": 300,
            "to_call": 100,
            "legal_actions": [
                {"action_type": "bet"},
                {"action_type": "raise", "min_amount": 200, "max_amount": 5_000},
                {"action_type": "raise", "min_amount": 400, "max_amount": 9_000},
            ],
        }));
        let Message::ActionRequest(req) = decode(&bytes).unwrap() else {
            panic!("expected action request");
        };
        assert_eq!(req.legal_actions.len(), 1);
        let raise = req.descriptor(ActionKind::Raise).unwrap();
        assert_eq!((raise.min_amount, raise.max_amount), (Some(200), Some(5_000)));
    }

    #[test]
    fn legacy_raise_floor_survives_bet_listed_first() {
        let bytes = frame(json!({
            "type": "action_request",
            "pot": 30,
            "to_call": 5,
            "valid_actions": ["fold", "bet", "raise"],
            "min_raise": 10,
        }));
        let Message::ActionRequest(req) = decode(&bytes).unwrap() else {
            panic!("expected action request");
        };
        assert_eq!(req.descriptor(ActionKind::Raise).unwrap().min_amount, Some(15));
    }

    #[test]
    fn action_request_without_actions_is_missing_field() {
        let bytes = frame(json!({"type": "action_request", "pot": 1, "to_call": 0}));
        assert_eq!(
            decode(&bytes),
            Err(CodecError::MissingField {
                message_type: "action_request",
                field: "legal_actions"
            })
        );
    }

    #[test]
    fn decodes_player_action_aliases() {
        let bytes = frame(json!({
            "type": "player_action",
            "seat": 1,
            "action": "raise",
            "amount": 200,
            "player_bet": 300,
            "pot": 450,
            "comment": {"ignored": true},
        }));
        let Message::PlayerAction(pa) = decode(&bytes).unwrap() else {
            panic!("expected player action");
        };
        assert_eq!(pa.amount_paid, Some(200));
        assert_eq!(pa.player_bet, Some(300));
        assert_eq!(pa.player_chips, None);
        assert_eq!(pa.pot, Some(450));
    }

    #[test]
    fn nil_optional_fields_are_absent() {
        let bytes = frame(json!({
            "type": "player_action",
            "seat": 1,
            "action": "fold",
            "pot": null,
        }));
        let Message::PlayerAction(pa) = decode(&bytes).unwrap() else {
            panic!("expected player action");
        };
        assert_eq!(pa.pot, None);
    }

    #[test]
    fn wrong_field_type_names_the_field() {
        let bytes = frame(json!({"type": "player_action", "seat": "one", "action": "fold"}));
        let Err(CodecError::MalformedFrame(detail)) = decode(&bytes) else {
            panic!("expected malformed frame");
        };
        assert!(detail.contains("seat"), "{detail}");
    }

    #[test]
    fn decodes_game_update_players() {
        let bytes = frame(json!({
            "type": "game_update",
            "pot": 600,
            "players": [
                {"name": "hero", "chips": 9_700, "bet": 300},
                {"name": "villain", "chips": 0, "bet": 300, "all_in": true, "avatar": "x.png"},
            ],
        }));
        let Message::GameUpdate(update) = decode(&bytes).unwrap() else {
            panic!("expected game update");
        };
        assert!(!update.players[0].folded);
        assert!(update.players[1].all_in);
        assert_eq!(update.board, None);
    }

    #[test]
    fn street_change_requires_board() {
        let bytes = frame(json!({"type": "street_change", "street": "flop"}));
        assert_eq!(
            decode(&bytes),
            Err(CodecError::MissingField {
                message_type: "street_change",
                field: "board"
            })
        );
    }

    #[test]
    fn decodes_hand_result_detail() {
        let bytes = frame(json!({
            "type": "hand_result",
            "board": ["Ah", "Kh", "Qh", "Jh", "Th"],
            "winners": [{"seat": 1, "amount": 900, "hand": "royal flush"}],
            "showdown": [{"seat": 1, "hole_cards": ["2c", "3c"]}],
        }));
        let Message::HandResult(result) = decode(&bytes).unwrap() else {
            panic!("expected hand result");
        };
        assert_eq!(result.board.as_ref().map(Vec::len), Some(5));
        assert_eq!(result.winners[0].amount, 900);
        assert_eq!(result.showdown[0].hole_cards.len(), 2);
    }

    #[test]
    fn game_completed_carries_stats() {
        let bytes = frame(json!({
            "type": "game_completed",
            "hands_played": 40,
            "stats": {"bb_per_100": 12.5, "seats": [1, 2]},
        }));
        let Message::GameCompleted(done) = decode(&bytes).unwrap() else {
            panic!("expected game completed");
        };
        assert_eq!(done.hands_completed, Some(40));
        assert_eq!(done.stats.unwrap()["seats"], json!([1, 2]));
    }

    #[test]
    fn decodes_error_message() {
        let bytes = frame(json!({"type": "error", "error": "bad token", "code": 401}));
        assert_eq!(
            decode(&bytes),
            Ok(Message::Error(ErrorMessage {
                message: "bad token".to_string(),
                code: Some("401".to_string()),
            }))
        );
    }

    #[test]
    fn encodes_action_payload() {
        let bytes = encode_action(&OutgoingAction::raise_to(300)).unwrap();
        let value = frame_to_json(&bytes).unwrap();
        assert_eq!(
            value,
            json!({"type": "action", "action": "raise", "amount": 300, "protocol_version": "2"})
        );

        let bytes = encode_action(&OutgoingAction::call()).unwrap();
        assert_eq!(frame_to_json(&bytes).unwrap()["amount"], json!(0));
    }

    #[test]
    fn rejects_raise_without_amount() {
        for amount in [None, Some(0), Some(-5)] {
            let action = OutgoingAction {
                kind: ActionKind::Raise,
                amount,
            };
            assert_eq!(
                encode_action(&action),
                Err(CodecError::InvalidActionAmount {
                    action: "raise",
                    amount
                })
            );
        }
        assert!(encode_action(&OutgoingAction::fold()).is_ok());
        assert!(encode_action(&OutgoingAction::all_in()).is_ok());
    }

    #[test]
    fn encodes_connect_handshake() {
        let request = ConnectRequest {
            name: "bot".to_string(),
            game: Some("g-9".to_string()),
            auth_token: None,
        };
        let value = frame_to_json(&encode_connect(&request).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "connect", "name": "bot", "game": "g-9", "protocol_version": "2"})
        );
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let bytes = vec![0x80; MAX_FRAME_SIZE + 1];
        assert!(matches!(decode(&bytes), Err(CodecError::MalformedFrame(_))));
    }
}
