//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;

use poker_agent::{Frame, Transport, TransportError};
use serde_json::{Value, json};

/// Pack a JSON value into a MessagePack frame.
pub fn pack(value: Value) -> Vec<u8> {
    rmp_serde::to_vec_named(&value).unwrap()
}

/// Replays scripted inbound frames and records everything written.
/// Reports a close once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pub inbound: VecDeque<Frame>,
    pub written: Vec<Vec<u8>>,
    pub pongs: usize,
    pub closed: bool,
}

impl ScriptedTransport {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            inbound: frames.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn binary(values: impl IntoIterator<Item = Value>) -> Self {
        Self::new(values.into_iter().map(|v| Frame::Binary(pack(v))))
    }

    /// Written payloads rendered as JSON.
    pub fn written_json(&self) -> Vec<Value> {
        self.written
            .iter()
            .map(|bytes| poker_agent::codec::frame_to_json(bytes).unwrap())
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn read_frame(&mut self) -> Result<Frame, TransportError> {
        Ok(self.inbound.pop_front().unwrap_or(Frame::Close))
    }

    fn write_frame(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.written.push(payload.to_vec());
        Ok(())
    }

    fn reply_pong(&mut self, _payload: &[u8]) -> Result<(), TransportError> {
        self.pongs += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        Ok(())
    }
}

/// Heads-up hand start: hero in seat 0, button seat 1, blinds 50/100.
pub fn hand_start(hand_id: &str) -> Value {
    json!({
        "type": "hand_start",
        "hand_id": hand_id,
        "your_seat": 0,
        "button": 1,
        "hole_cards": ["Ah", "Kh"],
        "small_blind": 50,
        "big_blind": 100,
        "seats": [
            {"seat": 0, "name": "hero", "chips": 10_000},
            {"seat": 1, "name": "villain", "chips": 10_000},
        ],
    })
}

pub fn action_request(pot: i64, to_call: i64) -> Value {
    json!({
        "type": "action_request",
        "pot": pot,
        "to_call": to_call,
        "legal_actions": [
            {"action_type": "fold"},
            {"action_type": "call"},
            {"action_type": "raise", "min_amount": to_call * 2, "max_amount": 10_000},
        ],
    })
}

pub fn hand_result() -> Value {
    json!({
        "type": "hand_result",
        "board": ["2c", "7d", "9s", "Jc", "Qd"],
        "pot": 400,
        "winners": [{"seat": 0, "amount": 400}],
    })
}
